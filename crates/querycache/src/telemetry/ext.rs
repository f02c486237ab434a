// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Timing helpers.

use std::time::Duration;

use tick::Clock;

/// Result of a timed async operation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TimedResult<R> {
    pub result: R,
    pub duration: Duration,
}

pub(crate) trait ClockExt {
    /// Runs `f` and measures how long it took on this clock.
    fn timed_async<F, R>(&self, f: F) -> impl Future<Output = TimedResult<R>>
    where
        F: Future<Output = R>;
}

impl ClockExt for Clock {
    async fn timed_async<F, R>(&self, f: F) -> TimedResult<R>
    where
        F: Future<Output = R>,
    {
        let start = self.instant();
        let result = f.await;
        TimedResult {
            result,
            duration: self.instant().saturating_duration_since(start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_async_measures_clock_time() {
        futures::executor::block_on(async {
            let control = tick::ClockControl::new();
            let clock = control.to_clock();

            let timed = clock
                .timed_async(async {
                    control.advance(Duration::from_millis(250));
                    "rows"
                })
                .await;

            assert_eq!(timed.result, "rows");
            assert_eq!(timed.duration, Duration::from_millis(250));
        });
    }
}
