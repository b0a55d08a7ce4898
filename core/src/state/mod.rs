//! Per-screen state holders.
//!
//! # Design
//! Each holder is the single writer of its screen state and publishes every
//! change through a `tokio::sync::watch` channel; the presentation layer
//! subscribes and renders. At most one repository call is in flight per
//! holder: a new load/submit while `Loading` is ignored, not queued. The call
//! runs on a spawned Tokio task that is aborted when the holder is dropped,
//! so a torn-down screen never receives a late update.

pub mod book_list;
pub mod login;

#[cfg(test)]
pub(crate) mod testing;

pub use book_list::{BookListUiEvent, BookListUiState, BookListViewModel};
pub use login::{FieldError, LoginUiEvent, LoginUiState, LoginViewModel};

/// Where a screen is in its request lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed(String),
}

impl Phase {
    pub fn is_loading(&self) -> bool {
        matches!(self, Phase::Loading)
    }

    pub fn is_successful(&self) -> bool {
        matches!(self, Phase::Succeeded)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Phase::Failed(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Phase::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Dismiss a visible error; any other phase is left alone.
    pub(crate) fn dismiss_error(&mut self) {
        if self.is_error() {
            *self = Phase::Idle;
        }
    }
}
