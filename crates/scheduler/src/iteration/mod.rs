//! The iteration scheduler.
//!
//! An [`Iteration`] visits every entry of a normalized collection with a
//! caller-supplied [`Operation`], starting entries in visitation order under
//! a [`Policy`](fanout_core::Policy), merging successful results into a
//! caller-owned container and resolving exactly once: after every entry
//! succeeded, or at the first failure.

pub mod metrics;
pub mod operation;
pub mod runner;

pub use metrics::RunMetrics;
pub use operation::{from_async, from_visitor, with_context, Operation, Visitor};
pub use runner::Iteration;
