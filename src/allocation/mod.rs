//! Capacity and table allocation for sittings.
//!
//! Everything here is pure: callers load sittings, tables and their
//! reservations first and pass them in.

pub mod availability;
pub mod lifecycle;
pub mod model;
pub mod slots;
pub mod tables;
