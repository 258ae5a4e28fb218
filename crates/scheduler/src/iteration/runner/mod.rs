//! Iteration runner -- drives one run over a normalized entry list.
//!
//! Split into focused submodules:
//! - `core`: Iteration struct, builder methods and accessors
//! - `execution`: the async run loop and the spawned callback variant
//! - `scheduling`: the not-yet-started worklist and in-flight window

mod core;
mod execution;
mod scheduling;

pub use self::core::Iteration;
