//! Book list screen state holder.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::Phase;
use crate::repository::BookRepository;
use crate::types::{BookItem, GetAllBooksParams};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookListUiEvent {
    /// Pull-to-refresh or the refresh button.
    LoadBooks,
    CloseBannerErrorMessage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookListUiState {
    pub phase: Phase,
    pub books: Vec<BookItem>,
}

pub struct BookListViewModel {
    repository: Arc<dyn BookRepository>,
    state: Arc<watch::Sender<BookListUiState>>,
    in_flight: Option<JoinHandle<()>>,
}

impl BookListViewModel {
    /// Opening the screen starts the first load, so this must run inside a
    /// Tokio runtime.
    pub fn new(repository: Arc<dyn BookRepository>) -> Self {
        let (state, _) = watch::channel(BookListUiState::default());
        let mut vm = Self {
            repository,
            state: Arc::new(state),
            in_flight: None,
        };
        vm.load_books();
        vm
    }

    pub fn subscribe(&self) -> watch::Receiver<BookListUiState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> BookListUiState {
        self.state.borrow().clone()
    }

    pub fn on_event(&mut self, event: BookListUiEvent) {
        match event {
            BookListUiEvent::LoadBooks => self.load_books(),
            BookListUiEvent::CloseBannerErrorMessage => {
                self.state.send_modify(|s| s.phase.dismiss_error());
            }
        }
    }

    fn load_books(&mut self) {
        if self.state.borrow().phase.is_loading() {
            return;
        }
        self.state.send_modify(|s| {
            s.phase = Phase::Loading;
            s.books.clear();
        });

        let repository = Arc::clone(&self.repository);
        let state = Arc::clone(&self.state);
        self.in_flight = Some(tokio::spawn(async move {
            match repository.get_all_books(GetAllBooksParams::default()).await {
                Ok(books) => state.send_modify(|s| {
                    s.books = books;
                    s.phase = Phase::Succeeded;
                }),
                Err(err) => {
                    tracing::warn!(%err, "loading books failed");
                    state.send_modify(|s| s.phase = Phase::Failed(err.to_string()));
                }
            }
        }));
    }
}

impl Drop for BookListViewModel {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::Semaphore;

    use super::*;
    use crate::error::ApiError;
    use crate::state::testing::{book, FakeRepository};

    async fn settled(vm: &BookListViewModel) -> BookListUiState {
        let mut rx = vm.subscribe();
        let state = rx.wait_for(|s| !s.phase.is_loading()).await.unwrap().clone();
        state
    }

    #[tokio::test]
    async fn opening_the_screen_loads_books() {
        let repository = Arc::new(FakeRepository::succeeding());
        let vm = BookListViewModel::new(repository.clone());

        let state = settled(&vm).await;

        assert_eq!(state.phase, Phase::Succeeded);
        assert_eq!(state.books, vec![book("Recipes")]);
        assert_eq!(repository.calls(), 1);
    }

    #[tokio::test]
    async fn failure_becomes_error_phase_and_can_be_dismissed() {
        let repository = Arc::new(FakeRepository::failing(ApiError::Transport(
            "connection reset".to_string(),
        )));
        let mut vm = BookListViewModel::new(repository);

        let state = settled(&vm).await;
        assert_eq!(
            state.phase.error_message(),
            Some("network error: connection reset")
        );
        assert!(state.books.is_empty());

        vm.on_event(BookListUiEvent::CloseBannerErrorMessage);
        assert_eq!(vm.state().phase, Phase::Idle);
    }

    #[tokio::test]
    async fn refresh_clears_list_and_ignores_overlapping_loads() {
        let gate = Arc::new(Semaphore::new(1));
        let repository = Arc::new(FakeRepository::succeeding().gated(&gate));
        let mut vm = BookListViewModel::new(repository.clone());
        assert_eq!(settled(&vm).await.books.len(), 1);

        vm.on_event(BookListUiEvent::LoadBooks);
        let loading = vm.state();
        assert!(loading.phase.is_loading());
        assert!(loading.books.is_empty());

        vm.on_event(BookListUiEvent::LoadBooks);
        gate.add_permits(2);

        assert_eq!(settled(&vm).await.books, vec![book("Recipes")]);
        assert_eq!(repository.calls(), 2);
    }
}
