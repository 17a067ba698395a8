//! Stage timing
//!
//! An explicitly constructed timer context, passed to the orchestrator
//! instead of living as process-global state so the pipeline stays testable
//! in isolation.

use std::time::Instant;
use tracing::info;

/// Times named pipeline stages and logs their duration.
#[derive(Debug, Default, Clone, Copy)]
pub struct StageClock;

impl StageClock {
    pub fn new() -> Self {
        StageClock
    }

    /// Run `f`, logging how long the stage took.
    pub fn time<T>(&self, stage: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        info!(stage, elapsed_secs = start.elapsed().as_secs_f64(), "stage finished");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_returns_closure_result() {
        let clock = StageClock::new();
        let result = clock.time("add", || 2 + 2);
        assert_eq!(result, 4);
    }

    #[test]
    fn test_time_propagates_results() {
        let clock = StageClock::new();
        let result: anyhow::Result<u32> = clock.time("fail", || anyhow::bail!("boom"));
        assert!(result.is_err());
    }
}
