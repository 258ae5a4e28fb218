use std::fmt;
use std::str::FromStr;

use crate::error::FanoutError;

/// How many entries of one run may be in flight at the same time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Start every entry without waiting for any to finish.
    #[default]
    Unbounded,
    /// Start the next entry only after the previous one succeeded.
    Series,
    /// Keep at most `n` entries in flight. `Limited(0)` visits nothing.
    Limited(usize),
}

impl Policy {
    /// Policy for a limit that may be missing, fractional or infinite.
    ///
    /// Missing, NaN and values below one admit nothing; positive infinity
    /// is the same as [`Policy::Unbounded`].
    pub fn from_limit(limit: Option<f64>) -> Self {
        match limit {
            Some(n) if n == f64::INFINITY => Policy::Unbounded,
            Some(n) if n >= 1.0 => Policy::Limited(n.floor().min(usize::MAX as f64) as usize),
            _ => Policy::Limited(0),
        }
    }

    /// Number of entries that may be in flight for a run over `total` entries.
    pub fn window(&self, total: usize) -> usize {
        match self {
            Policy::Unbounded => total,
            Policy::Series => total.min(1),
            Policy::Limited(n) => total.min(*n),
        }
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Unbounded => write!(f, "unbounded"),
            Policy::Series => write!(f, "series"),
            Policy::Limited(n) => write!(f, "limit:{}", n),
        }
    }
}

impl FromStr for Policy {
    type Err = FanoutError;

    /// Accepts `unbounded`/`parallel`, `series`, `limit:N`, a bare `N`,
    /// and `infinity`/`inf`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "unbounded" | "parallel" | "infinity" | "inf" => return Ok(Policy::Unbounded),
            "series" | "serial" => return Ok(Policy::Series),
            _ => {}
        }
        let limit = s.strip_prefix("limit:").unwrap_or(&s);
        if limit == "infinity" || limit == "inf" {
            return Ok(Policy::Unbounded);
        }
        limit
            .parse::<usize>()
            .map(Policy::Limited)
            .map_err(|_| FanoutError::InvalidPolicy(s.clone()))
    }
}
