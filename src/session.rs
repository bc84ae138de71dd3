use std::rc::Rc;

use crate::{
    effects::{Look, apply_effects},
    error::{LomoError, LomoResult},
    machine::{Action, Machine, State},
    raster::Painter,
    store::{Bus, StateStore},
    surface::Surface,
};

/// Drives the whole workflow: owns the working surface, the untouched
/// original, a painter, and the state store wired to a shared bus.
///
/// The embedding UI calls methods; observers watch the bus. Pixels are only
/// mutated after the corresponding transition has been validated, so a
/// rejected call never leaves a half-filtered surface behind. Filters are
/// never unapplied: every look is re-derived from the original snapshot.
#[derive(Debug)]
pub struct Darkroom {
    surface: Option<Surface>,
    original: Option<Surface>,
    painter: Painter,
    store: StateStore,
    bus: Rc<Bus>,
}

impl Darkroom {
    pub fn new(bus: Rc<Bus>) -> Self {
        let store = StateStore::new(Machine::lifecycle()).with_bus(bus.clone());
        Self {
            surface: None,
            original: None,
            painter: Painter::new(),
            store,
            bus,
        }
    }

    pub fn state(&self) -> State {
        self.store.state()
    }

    /// The working surface, present once a photo is loaded.
    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    /// The untouched snapshot taken at load time.
    pub fn original(&self) -> Option<&Surface> {
        self.original.as_ref()
    }

    pub fn valid_actions(&self) -> Vec<Action> {
        self.store.valid_actions()
    }

    pub fn bus(&self) -> &Rc<Bus> {
        &self.bus
    }

    /// Feeds in the host environment's capability-check result.
    pub fn boot(&mut self, supported: bool) -> LomoResult<State> {
        let action = if supported {
            Action::BrowserSupportSuccess
        } else {
            Action::BrowserSupportFailure
        };
        self.store.set_state(self.store.state(), action)
    }

    /// Loads a photo: enters upload, then either installs the surface and
    /// snapshots the original, or records the failure. A failed load keeps
    /// whatever photo was loaded before.
    #[tracing::instrument(level = "debug", skip(self, surface))]
    pub fn load_photo(&mut self, surface: Surface) -> LomoResult<State> {
        self.store.set_state(self.store.state(), Action::ImageUpload)?;

        if surface.is_empty() {
            self.store
                .set_state(self.store.state(), Action::ImageUploadFailure)?;
            return Err(LomoError::surface_unavailable(
                "uploaded surface has zero area",
            ));
        }

        self.original = Some(surface.clone());
        self.surface = Some(surface);
        self.store
            .set_state(self.store.state(), Action::ImageUploadSuccess)
    }

    /// Applies a look: restores the working surface from the original
    /// snapshot, runs the look's effect stack, then records the transition.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn apply_look(&mut self, look: Look) -> LomoResult<State> {
        let action = match look {
            Look::BlackWhite => Action::ApplyBwFilter,
            Look::Color => Action::ApplyColorFilter,
        };

        let Some(original) = self.original.as_ref() else {
            return Err(LomoError::surface_unavailable("no photo loaded"));
        };
        if !self.store.can_transition(action) {
            return Err(LomoError::InvalidTransition {
                state: self.store.state(),
                action,
            });
        }

        let mut working = original.clone();
        apply_effects(&look.effects(), &mut working, &mut self.painter)?;
        self.surface = Some(working);

        self.store.set_state(self.store.state(), action)
    }

    /// Drops the active filter by restoring the original snapshot.
    pub fn remove_filter(&mut self) -> LomoResult<State> {
        let Some(original) = self.original.as_ref() else {
            return Err(LomoError::surface_unavailable("no photo loaded"));
        };
        if !self.store.can_transition(Action::RemoveFilter) {
            return Err(LomoError::InvalidTransition {
                state: self.store.state(),
                action: Action::RemoveFilter,
            });
        }

        self.surface = Some(original.clone());
        self.store.set_state(self.store.state(), Action::RemoveFilter)
    }

    /// Advances the lifecycle to saved and exposes the pixels for the
    /// embedder to persist; encoding and IO stay outside the core.
    pub fn save(&mut self) -> LomoResult<&Surface> {
        self.store.set_state(self.store.state(), Action::SaveImage)?;
        self.surface
            .as_ref()
            .ok_or_else(|| LomoError::surface_unavailable("no rendered surface to save"))
    }

    /// Clears the canvas: both the working surface and the original snapshot
    /// are dropped, so the next photo starts fresh.
    pub fn clear(&mut self) -> LomoResult<State> {
        let next = self.store.set_state(self.store.state(), Action::ClearCanvas)?;
        self.surface = None;
        self.original = None;
        Ok(next)
    }

    /// From the error state, go back to waiting for an upload.
    pub fn retry_upload(&mut self) -> LomoResult<State> {
        self.store.set_state(self.store.state(), Action::RetryUpload)
    }

    /// From the error state, restart from scratch. Buffers are dropped.
    pub fn reset_app(&mut self) -> LomoResult<State> {
        let next = self.store.set_state(self.store.state(), Action::ResetApp)?;
        self.surface = None;
        self.original = None;
        Ok(next)
    }
}
