//! Core type definitions used across the Geliom workspace.

pub mod id;

pub use id::*;
