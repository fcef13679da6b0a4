//! Channel identifiers.

pub mod spec;
pub mod tables;

pub use geliom_cache::Scope;
pub use spec::ChannelSpec;
