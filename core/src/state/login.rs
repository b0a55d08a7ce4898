//! Login screen state holder.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::Phase;
use crate::repository::BookRepository;
use crate::types::LogInParams;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z].*@.+\..+$").expect("email pattern is a valid regex")
});

/// User intents forwarded by the login screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginUiEvent {
    EmailChanged(String),
    PasswordChanged(String),
    CloseBannerErrorMessage,
    Submit,
}

/// Validation failure attached to a single form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Email is required")]
    EmptyEmail,
    #[error("Email address is not valid")]
    InvalidEmail,
    #[error("Password is required")]
    EmptyPassword,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginUiState {
    pub phase: Phase,
    pub email_error: Option<FieldError>,
    pub password_error: Option<FieldError>,
}

pub struct LoginViewModel {
    repository: Arc<dyn BookRepository>,
    state: Arc<watch::Sender<LoginUiState>>,
    email: String,
    password: String,
    in_flight: Option<JoinHandle<()>>,
}

impl LoginViewModel {
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        let (state, _) = watch::channel(LoginUiState::default());
        Self {
            repository,
            state: Arc::new(state),
            email: String::new(),
            password: String::new(),
            in_flight: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LoginUiState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> LoginUiState {
        self.state.borrow().clone()
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Must be called from within a Tokio runtime: `Submit` spawns the login.
    pub fn on_event(&mut self, event: LoginUiEvent) {
        match event {
            LoginUiEvent::EmailChanged(value) => {
                self.email = value;
                self.state.send_modify(|s| s.email_error = None);
            }
            LoginUiEvent::PasswordChanged(value) => {
                self.password = value;
                self.state.send_modify(|s| s.password_error = None);
            }
            LoginUiEvent::CloseBannerErrorMessage => {
                self.state.send_modify(|s| s.phase.dismiss_error());
            }
            LoginUiEvent::Submit => self.submit(),
        }
    }

    fn submit(&mut self) {
        if self.state.borrow().phase.is_loading() {
            return;
        }
        if !self.verify_fields() {
            return;
        }
        self.state.send_modify(|s| s.phase = Phase::Loading);

        let params = LogInParams {
            login: self.email.clone(),
            password: self.password.clone(),
        };
        let repository = Arc::clone(&self.repository);
        let state = Arc::clone(&self.state);
        self.in_flight = Some(tokio::spawn(async move {
            let phase = match repository.log_in(params).await {
                Ok(_) => Phase::Succeeded,
                Err(err) => {
                    tracing::warn!(%err, "login failed");
                    Phase::Failed(err.to_string())
                }
            };
            state.send_modify(|s| s.phase = phase);
        }));
    }

    /// Checks both fields so each gets its own error in one pass.
    fn verify_fields(&self) -> bool {
        let email_error = validate_email(&self.email);
        let password_error = validate_password(&self.password);
        self.state.send_modify(|s| {
            s.email_error = email_error;
            s.password_error = password_error;
        });
        email_error.is_none() && password_error.is_none()
    }
}

impl Drop for LoginViewModel {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

pub fn validate_email(email: &str) -> Option<FieldError> {
    if email.trim().is_empty() {
        return Some(FieldError::EmptyEmail);
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Some(FieldError::InvalidEmail);
    }
    None
}

pub fn validate_password(password: &str) -> Option<FieldError> {
    if password.trim().is_empty() {
        return Some(FieldError::EmptyPassword);
    }
    None
}
