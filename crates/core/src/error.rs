use std::fmt;

use thiserror::Error;

use crate::collection::Key;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum FanoutError {
    #[error("config error: {0}")]
    Config(String),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("invalid concurrency policy: {0}")]
    InvalidPolicy(String),
}

/// Where a completion callback lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Site {
    /// The per-entry callback of an iteration run.
    Element(Key),
    /// The per-round callback of a loop driver, counted from zero.
    Round(usize),
    /// The overall completion callback of a run or loop.
    Completion,
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Site::Element(key) => write!(f, "element {}", key),
            Site::Round(n) => write!(f, "round {}", n),
            Site::Completion => write!(f, "completion"),
        }
    }
}

/// Misuse of a completion callback.
///
/// Violations are never delivered as a run's result. They go to the
/// reporter the run was configured with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("callback for {0} was already called")]
    AlreadyCalled(Site),

    #[error("callback for {0} was dropped without being called")]
    Dropped(Site),
}

impl Violation {
    pub fn site(&self) -> &Site {
        match self {
            Violation::AlreadyCalled(site) | Violation::Dropped(site) => site,
        }
    }
}

/// Why a single entry or loop round did not succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Failure<E> {
    /// The operation reported an error.
    #[error("{0}")]
    Failed(E),

    /// The completion handle was dropped without being called.
    #[error("completion handle dropped without a result")]
    Abandoned,
}

impl<E> Failure<E> {
    /// The operation's own error, if it reported one.
    pub fn into_error(self) -> Option<E> {
        match self {
            Failure::Failed(e) => Some(e),
            Failure::Abandoned => None,
        }
    }

    pub fn is_abandoned(&self) -> bool {
        matches!(self, Failure::Abandoned)
    }
}

/// A run that stopped at its first failing entry.
///
/// `partial` holds exactly the results merged before the failure was
/// observed.
#[derive(Error, Debug)]
#[error("iteration aborted at {key}: {failure}")]
pub struct IterError<C, E> {
    pub key: Key,
    pub failure: Failure<E>,
    pub partial: C,
}

impl<C, E> IterError<C, E> {
    pub fn into_parts(self) -> (Key, Failure<E>, C) {
        (self.key, self.failure, self.partial)
    }

    /// Convert the partial container, keeping key and failure.
    pub fn map_partial<D>(self, f: impl FnOnce(C) -> D) -> IterError<D, E> {
        IterError {
            key: self.key,
            failure: self.failure,
            partial: f(self.partial),
        }
    }

    /// The operation's own error, if the entry did not just drop its handle.
    pub fn error(&self) -> Option<&E> {
        match &self.failure {
            Failure::Failed(e) => Some(e),
            Failure::Abandoned => None,
        }
    }
}
