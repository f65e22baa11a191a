//! Explicit run configuration, threaded down from a driver rather than read
//! from ambient global state.

use crate::machine::Word;
use crate::ports::DEFAULT_POLLING_INTERVAL;
use std::time::Duration;

/// Tunables a driver (the CLI, a test harness) passes down to the ports and
/// switch it constructs. There is no implicit default instance beyond
/// [`RunConfig::default`]; every field is set explicitly by whoever builds
/// the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    /// How long a blocking port wait sleeps between rechecking its
    /// predicates. Must be strictly positive.
    pub polling_interval: Duration,
    /// Optional instruction budget for [`crate::Machine::run_with_step_limit`],
    /// used by tests and fuzzing harnesses to bound a runaway program.
    pub step_limit: Option<u64>,
    /// The switch address reserved for the NAT pseudo-node.
    pub nat_address: Word,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            polling_interval: DEFAULT_POLLING_INTERVAL,
            step_limit: None,
            nat_address: 255,
        }
    }
}

impl RunConfig {
    /// A config with the default polling interval and NAT address, bounded
    /// to `limit` steps.
    #[must_use]
    pub fn with_step_limit(limit: u64) -> Self {
        Self {
            step_limit: Some(limit),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_the_documented_nat_address() {
        assert_eq!(RunConfig::default().nat_address, 255);
        assert_eq!(RunConfig::default().step_limit, None);
    }
}
