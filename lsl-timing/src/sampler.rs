//! Cooperative fixed-period repeating task.
//!
//! Nothing runs in the background: the owner polls [`IntervalSampler::due`] from its
//! event loop and receives every tick timestamp that has come due since the last poll.
//! [`IntervalSampler::stop`] takes the sampler by value, so a stopped sampler can never
//! fire again and every started sampler is stopped at most once.

use std::time::Duration;

#[derive(Debug)]
pub struct IntervalSampler {
    period_ns: u64,
    started_ns: u64,
    next_due_ns: u64,
    fired: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerStats {
    pub fired: u64,
    pub started_ns: u64,
    pub stopped_ns: u64,
}

impl IntervalSampler {
    /// First tick is due one full period after `now_ns`.
    pub fn start(period: Duration, now_ns: u64) -> Self {
        let period_ns = (period.as_nanos() as u64).max(1);
        Self {
            period_ns,
            started_ns: now_ns,
            next_due_ns: now_ns.saturating_add(period_ns),
            fired: 0,
        }
    }

    pub fn period(&self) -> Duration {
        Duration::from_nanos(self.period_ns)
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Yields the timestamp of each tick due at or before `now_ns`, oldest first.
    pub fn due(&mut self, now_ns: u64) -> impl Iterator<Item = u64> + '_ {
        std::iter::from_fn(move || {
            if self.next_due_ns > now_ns {
                return None;
            }
            let tick = self.next_due_ns;
            self.next_due_ns = self.next_due_ns.saturating_add(self.period_ns);
            self.fired += 1;
            Some(tick)
        })
    }

    pub fn stop(self, now_ns: u64) -> SamplerStats {
        SamplerStats {
            fired: self.fired,
            started_ns: self.started_ns,
            stopped_ns: now_ns,
        }
    }
}
