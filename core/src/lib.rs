//! Client core for the Timetonic book list app.
//!
//! # Overview
//! Logs a user in through the three-step key handshake (app key, OAuth key,
//! session key), persists the resulting credentials, and fetches the user's
//! books. Screens sit on top as state holders that publish their state
//! through `watch` channels.
//!
//! # Design
//! - `TimetonicClient` is stateless and split into `build_*` / `parse_*`
//!   (host-does-IO), so a mobile host or a C caller can run the HTTP
//!   round-trip itself.
//! - `Transport` executes those requests when the core owns the I/O;
//!   `ReqwestTransport` is the production implementation.
//! - `SessionStore` persists the four credentials and exposes them as
//!   observable values.
//! - `TimetonicRepository` sequences the handshake and the listing; every
//!   failure comes back as an `ApiError` value.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod repository;
pub mod session;
pub mod state;
pub mod transport;
pub mod types;

pub use client::TimetonicClient;
pub use config::ClientConfig;
pub use error::{ApiError, SessionError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use repository::{BookRepository, TimetonicRepository};
pub use session::{FileStorage, MemoryStorage, SessionKey, SessionManager, SessionStorage, SessionStore};
pub use state::{
    BookListUiEvent, BookListUiState, BookListViewModel, FieldError, LoginUiEvent, LoginUiState,
    LoginViewModel, Phase,
};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    AllBooksResponse, AppKeyResponse, Book, BookItem, Credentials, GetAllBooksParams, LogInParams,
    OauthKeyResponse, SessKeyResponse,
};
