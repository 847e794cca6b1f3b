//! Data models for the coffee shop scheduling backend.
//!
//! Wire format is camelCase JSON with the shop's own day, shift and role labels.

mod datastore;
mod shift;
mod staff;
mod week;

pub use datastore::*;
pub use shift::*;
pub use staff::*;
pub use week::*;
