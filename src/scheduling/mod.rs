//! Weekly shift scheduling: requirements, the schedule store, generator
//! contract and validation, and coverage evaluation.

mod coverage;
mod generator;
mod greedy;
mod remote;
mod requirements;
mod service;
mod store;
mod validation;

#[cfg(test)]
pub mod testing;

pub use coverage::*;
pub use generator::*;
pub use greedy::*;
pub use remote::*;
pub use requirements::*;
pub use service::*;
pub use store::*;
pub use validation::*;
