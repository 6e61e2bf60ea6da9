//! Condition polling.
//!
//! ```text
//! INITIAL ──(no conditions)──────────────────────────▶ SATISFIED
//!    │
//!    ▼
//! POLLING ──(all hold on one snapshot)───────────────▶ SATISFIED
//!    │  ▲
//!    │  └──(elapsed < budget: sleep min(interval, remaining))
//!    ▼
//! TIMED_OUT ─▶ ResolveError::ConditionsNotMet
//! ```
//!
//! Every attempt works on a fresh snapshot; conditions are never checked
//! against fields gathered at different times.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use obsimg_schema::version::compare_versions;
use obsimg_schema::{Condition, PackageCondition, PackageMap, ResolvedArtifact};
use tracing::{debug, info, warn};

use crate::{Reporter, ResolveError};

/// Source of elapsed time and waits for the poller.
pub trait Clock {
    /// Monotonic time since an arbitrary fixed origin.
    fn now(&self) -> Duration;

    /// Block for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by [`Instant`] and [`std::thread::sleep`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// A clock that only moves when slept on. Used for deterministic tests.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct ManualClock {
    now: std::cell::Cell<Duration>,
    sleeps: std::cell::Cell<u32>,
}

#[cfg(any(test, feature = "test-util"))]
impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sleeps performed so far.
    pub fn sleeps(&self) -> u32 {
        self.sleeps.get()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
        self.sleeps.set(self.sleeps.get() + 1);
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Artifact and manifest observed at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub artifact: ResolvedArtifact,
    pub packages: PackageMap,
}

/// Whether `condition` holds on `snapshot`.
pub fn is_satisfied(condition: &Condition, snapshot: &Snapshot) -> bool {
    match condition {
        Condition::Image(c) => {
            compare_versions(&snapshot.artifact.version, &c.image) == Ordering::Equal
        }
        Condition::Package(c) => package_satisfied(c, &snapshot.packages),
    }
}

fn package_satisfied(condition: &PackageCondition, packages: &PackageMap) -> bool {
    let Some(record) = packages.get(&condition.package_name) else {
        return false;
    };

    let ord = match (&condition.version, &condition.release) {
        (None, None) => return true,
        (Some(version), release) => {
            let ord = compare_versions(&record.version, version);
            match release {
                Some(release) if ord == Ordering::Equal => {
                    compare_versions(&record.release, release)
                }
                _ => ord,
            }
        }
        (None, Some(release)) => compare_versions(&record.release, release),
    };

    condition.condition.holds(ord)
}

/// Conditions of `conditions` that do not hold on `snapshot`, rendered.
pub fn unmet(conditions: &[Condition], snapshot: &Snapshot) -> Vec<String> {
    conditions
        .iter()
        .filter(|c| !is_satisfied(c, snapshot))
        .map(ToString::to_string)
        .collect()
}

/// Bounded-retry loop gating a download on readiness conditions.
#[derive(Debug)]
pub struct ConditionPoller<'a, C: Clock> {
    conditions: &'a [Condition],
    budget: Duration,
    interval: Duration,
    clock: C,
}

impl<'a, C: Clock> ConditionPoller<'a, C> {
    pub fn new(conditions: &'a [Condition], budget: Duration, interval: Duration, clock: C) -> Self {
        Self {
            conditions,
            budget,
            interval,
            clock,
        }
    }

    /// Poll until every condition holds on one snapshot or the budget runs out.
    ///
    /// Returns `Ok(None)` without calling `fetch_snapshot` when there are no
    /// conditions, otherwise the snapshot that satisfied them. A budget of
    /// zero means exactly one attempt. Network and not-found failures of an
    /// attempt count as unmet while budget remains; the last such failure is
    /// returned once it is exhausted.
    ///
    /// # Errors
    ///
    /// [`ResolveError::ConditionsNotMet`] when the budget is exhausted, or
    /// any non-retryable error from `fetch_snapshot`.
    pub fn poll<S, R>(&self, mut fetch_snapshot: S, reporter: &R) -> Result<Option<Snapshot>, ResolveError>
    where
        S: FnMut() -> Result<Snapshot, ResolveError>,
        R: Reporter + ?Sized,
    {
        if self.conditions.is_empty() {
            debug!("No image conditions, skipping poll");
            return Ok(None);
        }

        let start = self.clock.now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            debug!("Checking image conditions, attempt {attempts}");

            let failure = match fetch_snapshot() {
                Ok(snapshot) => {
                    let unmet = unmet(self.conditions, &snapshot);
                    if unmet.is_empty() {
                        info!("Image conditions met on attempt {attempts}");
                        return Ok(Some(snapshot));
                    }
                    ResolveError::ConditionsNotMet { attempts, unmet }
                }
                Err(e @ (ResolveError::Network { .. } | ResolveError::NotFound { .. })) => {
                    warn!("Attempt {attempts} failed: {e}");
                    e
                }
                Err(e) => return Err(e),
            };

            let elapsed = self.clock.now().saturating_sub(start);
            if elapsed >= self.budget {
                return Err(failure);
            }

            let pause = self.interval.min(self.budget - elapsed);
            match &failure {
                ResolveError::ConditionsNotMet { unmet, .. } => {
                    reporter.waiting(attempts, pause, unmet);
                }
                other => reporter.waiting(attempts, pause, &[other.to_string()]),
            }
            self.clock.sleep(pause);
        }
    }
}
