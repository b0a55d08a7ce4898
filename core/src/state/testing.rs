//! Repository doubles shared by the screen state holder tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::error::ApiError;
use crate::repository::BookRepository;
use crate::types::{BookItem, GetAllBooksParams, LogInParams, Outcome, SessKeyResponse};

/// Repository double with canned results. With a gate, every call parks
/// until a permit is added, which lets tests observe the `Loading` phase.
pub(crate) struct FakeRepository {
    pub login: Result<SessKeyResponse, ApiError>,
    pub books: Result<Vec<BookItem>, ApiError>,
    pub gate: Option<Arc<Semaphore>>,
    pub calls: AtomicUsize,
}

impl FakeRepository {
    pub fn succeeding() -> Self {
        Self {
            login: Ok(SessKeyResponse {
                outcome: Outcome::ok(),
                sess_key: Some("sk-1".to_string()),
            }),
            books: Ok(vec![book("Recipes")]),
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(err: ApiError) -> Self {
        Self {
            login: Err(err.clone()),
            books: Err(err),
            ..Self::succeeding()
        }
    }

    pub fn gated(mut self, gate: &Arc<Semaphore>) -> Self {
        self.gate = Some(Arc::clone(gate));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn pass_gate(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

#[async_trait]
impl BookRepository for FakeRepository {
    async fn log_in(&self, _params: LogInParams) -> Result<SessKeyResponse, ApiError> {
        self.pass_gate().await;
        self.login.clone()
    }

    async fn get_all_books(&self, _params: GetAllBooksParams) -> Result<Vec<BookItem>, ApiError> {
        self.pass_gate().await;
        self.books.clone()
    }
}

pub(crate) fn book(title: &str) -> BookItem {
    BookItem {
        title: title.to_string(),
        image_url: None,
    }
}
