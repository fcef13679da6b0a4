//! # geliom-entity
//!
//! Domain entity models for Geliom. Structs in this crate are either rows
//! read from the hosted database (deriving `sqlx::FromRow`), results of
//! stored procedure calls, or transient value objects such as the
//! notification payload.

pub mod group;
pub mod notification;
pub mod presence;
pub mod profile;
