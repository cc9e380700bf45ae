//! Event lifecycle state and upcoming-event prediction.

pub mod tracker;
pub mod upcoming;

pub use tracker::LifecycleTracker;
pub use upcoming::{predict, time_string_to_unix};
