//! Row change messages carried by the change feeds.

pub mod event;

pub use event::{ChangeEvent, ChangeKind, FeedMessage};
