pub mod combinators;
pub mod done;
pub mod guard;
pub mod iteration;
pub mod loop_driver;
pub mod spawned;
pub mod violation;

pub use combinators::{each, filter, map, map_values, omit, pick, reduce, reject};
pub use done::{ElementDone, Outcome};
pub use fanout_core::{
    Collection, Entries, Entry, FanoutConfig, Failure, IterError, Key, Policy, Shape, Site,
    Violation,
};
pub use guard::CompletionGuard;
pub use iteration::{
    from_async, from_visitor, with_context, Iteration, Operation, RunMetrics, Visitor,
};
pub use loop_driver::{LoopDone, LoopDriver, LoopState};
pub use spawned::Spawned;
pub use violation::ViolationReporter;
