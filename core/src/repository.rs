//! Login handshake and book listing on top of the client, a transport and
//! the session store.
//!
//! # Design
//! Login is three dependent calls: app key, then OAuth key and user id, then
//! session key. Each step only runs if the previous one succeeded and its
//! output was persisted; the first failure is returned untouched and nothing
//! is retried. Every attempt starts over from the app key, so a stale
//! credential from an earlier partial run is never reused.

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::TimetonicClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::session::{SessionManager, SessionStore};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{BookItem, GetAllBooksParams, LogInParams, SessKeyResponse};

/// What the screens need from the data layer.
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn log_in(&self, params: LogInParams) -> Result<SessKeyResponse, ApiError>;

    /// Requires a prior successful [`BookRepository::log_in`].
    async fn get_all_books(&self, params: GetAllBooksParams) -> Result<Vec<BookItem>, ApiError>;
}

pub struct TimetonicRepository<T> {
    client: TimetonicClient,
    transport: T,
    session: Arc<dyn SessionManager>,
}

impl<T: Transport> TimetonicRepository<T> {
    pub fn new(client: TimetonicClient, transport: T, session: Arc<dyn SessionManager>) -> Self {
        Self {
            client,
            transport,
            session,
        }
    }

    pub fn session(&self) -> &Arc<dyn SessionManager> {
        &self.session
    }
}

impl TimetonicRepository<ReqwestTransport> {
    /// Wire the production transport and the file-backed session store.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config.connect_timeout)?;
        let session = SessionStore::open(config.session_file())?;
        Ok(Self::new(
            TimetonicClient::from_config(config),
            transport,
            Arc::new(session),
        ))
    }
}

#[async_trait]
impl<T: Transport> BookRepository for TimetonicRepository<T> {
    async fn log_in(&self, params: LogInParams) -> Result<SessKeyResponse, ApiError> {
        let request = self.client.build_create_app_key()?;
        let app_key = self
            .client
            .parse_create_app_key(self.transport.execute(request).await?)?;
        if let Some(key) = &app_key.app_key {
            self.session.save_app_key(key)?;
        }
        tracing::info!("app key obtained");

        let request = self
            .client
            .build_create_oauth_key(&params, &self.session.app_key())?;
        let oauth = self
            .client
            .parse_create_oauth_key(self.transport.execute(request).await?)?;
        if let Some(key) = &oauth.oauth_key {
            self.session.save_oauth_key(key)?;
        }
        if let Some(user_id) = &oauth.oauth_user_id {
            self.session.save_oauth_user_id(user_id)?;
        }
        tracing::info!("oauth key obtained");

        let request = self
            .client
            .build_create_sess_key(&self.session.oauth_user_id(), &self.session.oauth_key())?;
        let sess = self
            .client
            .parse_create_sess_key(self.transport.execute(request).await?)?;
        if let Some(key) = &sess.sess_key {
            self.session.save_sess_key(key)?;
        }
        tracing::info!("session key obtained");

        Ok(sess)
    }

    async fn get_all_books(&self, params: GetAllBooksParams) -> Result<Vec<BookItem>, ApiError> {
        let request = self.client.build_get_all_books(
            &self.session.oauth_user_id(),
            &self.session.sess_key(),
            &params,
        )?;
        let response = self
            .client
            .parse_get_all_books(self.transport.execute(request).await?)?;
        let items = self.client.book_items(&response);
        tracing::debug!(count = items.len(), "books fetched");
        Ok(items)
    }
}
