use std::rc::Rc;

use serde::Serialize;

use crate::{
    error::{LomoError, LomoResult},
    machine::{Action, Machine, State},
    pubsub::PubSub,
};

/// Topic for successful transitions.
pub const STATE_CHANGED: &str = "STATE_CHANGED";
/// Topic for forced resets, published only when the store is configured to
/// notify on reset.
pub const STORE_RESET: &str = "STORE_RESET";

/// Payload of a successful transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StateChange {
    pub previous: State,
    pub current: State,
    pub action: Action,
}

/// Everything the store publishes on its bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Notice {
    StateChanged(StateChange),
    StoreReset { previous: State, current: State },
}

/// The bus type the store publishes on.
pub type Bus = PubSub<Notice>;

/// Holds the current lifecycle state and guards every change through the
/// transition table. Constructed explicitly and handed to consumers; there is
/// no global instance.
#[derive(Debug)]
pub struct StateStore {
    current: State,
    machine: Machine,
    bus: Option<Rc<Bus>>,
    notify_on_reset: bool,
}

impl StateStore {
    /// A store at the machine's initial state, with no bus attached.
    pub fn new(machine: Machine) -> Self {
        let current = machine.initial_state();
        Self {
            current,
            machine,
            bus: None,
            notify_on_reset: false,
        }
    }

    /// Attaches the bus that transition notifications are published on.
    pub fn with_bus(mut self, bus: Rc<Bus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Starts the store somewhere other than the machine's initial state.
    pub fn with_initial(mut self, state: State) -> Self {
        self.current = state;
        self
    }

    /// When enabled, [`reset`](Self::reset) publishes on [`STORE_RESET`].
    /// Off by default: a reset has no driving action, so it never masquerades
    /// as a STATE_CHANGED.
    pub fn notify_on_reset(mut self, notify: bool) -> Self {
        self.notify_on_reset = notify;
        self
    }

    pub fn state(&self) -> State {
        self.current
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Compare-and-set transition: `expected` must match the current state,
    /// and `action` must be mapped from it. On success the state is mutated
    /// and one `StateChanged` notice is published synchronously before
    /// returning; on failure nothing is mutated and nothing is published.
    ///
    /// A caller holding a stale `expected` gets [`LomoError::StateMismatch`]
    /// and recovers by re-reading [`state`](Self::state) and retrying.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn set_state(&mut self, expected: State, action: Action) -> LomoResult<State> {
        if expected != self.current {
            return Err(LomoError::StateMismatch {
                expected: self.current,
                found: expected,
            });
        }
        let Some(next) = self.machine.next_state(self.current, action) else {
            return Err(LomoError::InvalidTransition {
                state: self.current,
                action,
            });
        };

        let previous = self.current;
        self.current = next;
        tracing::debug!(%previous, current = %next, %action, "state transition");

        if let Some(bus) = &self.bus {
            bus.publish(
                STATE_CHANGED,
                &Notice::StateChanged(StateChange {
                    previous,
                    current: next,
                    action,
                }),
            );
        }
        Ok(next)
    }

    /// Forces the state, bypassing the table. With no target this returns to
    /// the machine's initial state. Silent unless
    /// [`notify_on_reset`](Self::notify_on_reset) was enabled.
    pub fn reset(&mut self, to: Option<State>) {
        let previous = self.current;
        self.current = to.unwrap_or_else(|| self.machine.initial_state());
        tracing::debug!(%previous, current = %self.current, "store reset");

        if self.notify_on_reset
            && let Some(bus) = &self.bus
        {
            bus.publish(
                STORE_RESET,
                &Notice::StoreReset {
                    previous,
                    current: self.current,
                },
            );
        }
    }

    pub fn can_transition(&self, action: Action) -> bool {
        self.machine.is_valid_transition(self.current, action)
    }

    pub fn valid_actions(&self) -> Vec<Action> {
        self.machine.valid_actions(self.current)
    }
}
