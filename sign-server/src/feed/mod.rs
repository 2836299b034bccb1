//! Realtime feed sources.
//!
//! A feed is a GTFS-realtime `FeedMessage` published per subway sub-network
//! (e.g. the ACE lines). Sources fetch one feed per call and decode it into
//! a [`FeedSnapshot`]; they never cache or retry.

mod client;
mod error;
mod mock;
mod snapshot;

pub use client::{FeedBackend, FeedClientConfig, FeedSource, HttpFeedSource};
pub use error::FetchError;
pub use mock::MockFeedSource;
pub use snapshot::{FeedSnapshot, RawTime, StopTimeUpdate, TripUpdateEntity};
