//! Web layer for the sign server.
//!
//! Provides the JSON endpoints polled by the sign display and used to set
//! it up.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::create_router;
pub use state::AppState;
