use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// An app lifecycle state. Display and serde forms are the lowercase names
/// used in error messages and notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Start,
    Idle,
    Upload,
    Photo,
    Filtered,
    Saved,
    Cleared,
    Error,
}

impl State {
    pub const ALL: [State; 8] = [
        State::Start,
        State::Idle,
        State::Upload,
        State::Photo,
        State::Filtered,
        State::Saved,
        State::Cleared,
        State::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Idle => "idle",
            Self::Upload => "upload",
            Self::Photo => "photo",
            Self::Filtered => "filtered",
            Self::Saved => "saved",
            Self::Cleared => "cleared",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transition token. Display and serde forms are the SCREAMING_SNAKE names
/// used in error messages and notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    BrowserSupportSuccess,
    BrowserSupportFailure,
    ImageUpload,
    ImageUploadSuccess,
    ImageUploadFailure,
    ApplyBwFilter,
    ApplyColorFilter,
    RemoveFilter,
    ClearCanvas,
    SaveImage,
    RetryUpload,
    ResetApp,
}

impl Action {
    pub const ALL: [Action; 12] = [
        Action::BrowserSupportSuccess,
        Action::BrowserSupportFailure,
        Action::ImageUpload,
        Action::ImageUploadSuccess,
        Action::ImageUploadFailure,
        Action::ApplyBwFilter,
        Action::ApplyColorFilter,
        Action::RemoveFilter,
        Action::ClearCanvas,
        Action::SaveImage,
        Action::RetryUpload,
        Action::ResetApp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BrowserSupportSuccess => "BROWSER_SUPPORT_SUCCESS",
            Self::BrowserSupportFailure => "BROWSER_SUPPORT_FAILURE",
            Self::ImageUpload => "IMAGE_UPLOAD",
            Self::ImageUploadSuccess => "IMAGE_UPLOAD_SUCCESS",
            Self::ImageUploadFailure => "IMAGE_UPLOAD_FAILURE",
            Self::ApplyBwFilter => "APPLY_BW_FILTER",
            Self::ApplyColorFilter => "APPLY_COLOR_FILTER",
            Self::RemoveFilter => "REMOVE_FILTER",
            Self::ClearCanvas => "CLEAR_CANVAS",
            Self::SaveImage => "SAVE_IMAGE",
            Self::RetryUpload => "RETRY_UPLOAD",
            Self::ResetApp => "RESET_APP",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transition table: an initial state plus `state -> action -> state` rows.
/// Immutable once built; lookups for unmapped pairs return `None` rather than
/// panicking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Machine {
    initial: State,
    edges: BTreeMap<State, BTreeMap<Action, State>>,
}

impl Machine {
    /// An empty table with the given initial state.
    pub fn new(initial: State) -> Self {
        Self {
            initial,
            edges: BTreeMap::new(),
        }
    }

    /// Adds one row. A later row for the same (from, action) pair replaces
    /// the earlier one.
    pub fn edge(mut self, from: State, action: Action, to: State) -> Self {
        self.edges.entry(from).or_default().insert(action, to);
        self
    }

    /// The app lifecycle table. The error state is recoverable: RETRY_UPLOAD
    /// goes back to idle, RESET_APP restarts from scratch.
    pub fn lifecycle() -> Self {
        use Action::*;
        use State::*;

        Self::new(Start)
            .edge(Start, BrowserSupportSuccess, Idle)
            .edge(Start, BrowserSupportFailure, Error)
            .edge(Idle, ImageUpload, Upload)
            .edge(Upload, ImageUploadSuccess, Photo)
            .edge(Upload, ImageUploadFailure, Error)
            .edge(Photo, ApplyBwFilter, Filtered)
            .edge(Photo, ApplyColorFilter, Filtered)
            .edge(Photo, ImageUpload, Upload)
            .edge(Photo, ClearCanvas, Cleared)
            .edge(Filtered, SaveImage, Saved)
            .edge(Filtered, ClearCanvas, Cleared)
            .edge(Filtered, RemoveFilter, Photo)
            .edge(Filtered, ImageUpload, Upload)
            .edge(Saved, SaveImage, Saved)
            .edge(Saved, ClearCanvas, Cleared)
            .edge(Saved, RemoveFilter, Photo)
            .edge(Saved, ImageUpload, Upload)
            .edge(Cleared, ImageUpload, Upload)
            .edge(Error, RetryUpload, Idle)
            .edge(Error, ResetApp, Start)
    }

    pub fn initial_state(&self) -> State {
        self.initial
    }

    /// Where `action` leads from `from`, if the table maps it.
    pub fn next_state(&self, from: State, action: Action) -> Option<State> {
        self.edges.get(&from).and_then(|row| row.get(&action)).copied()
    }

    pub fn is_valid_transition(&self, from: State, action: Action) -> bool {
        self.next_state(from, action).is_some()
    }

    /// The actions mapped from `from`, in declaration order. Empty when the
    /// state has no outgoing rows.
    pub fn valid_actions(&self, from: State) -> Vec<Action> {
        self.edges
            .get(&from)
            .map(|row| row.keys().copied().collect())
            .unwrap_or_default()
    }
}
