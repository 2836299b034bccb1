//! Application state for the web layer.

use std::sync::Arc;

use crate::board::SignBoard;

/// Shared application state.
pub struct AppState<S> {
    /// Arrival service for the configured rows
    pub board: Arc<SignBoard<S>>,
}

impl<S> AppState<S> {
    pub fn new(board: SignBoard<S>) -> Self {
        Self {
            board: Arc::new(board),
        }
    }
}

// Manual impl: the source itself needn't be `Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            board: Arc::clone(&self.board),
        }
    }
}
