use std::ops::Add;
use std::time::Duration;

/// Coarse monotonic timestamp used by the disambiguation state machine.
///
/// Measured from an arbitrary per-device epoch (runtime start, fixture
/// origin); only ordering and differences are meaningful.
#[derive(
    Debug, Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash, derive_more::Display,
)]
#[display("{}ms", _0.as_millis())]
pub struct MonotonicTime(Duration);

impl MonotonicTime {
    /// Creates a timestamp at `millis` past the epoch.
    ///
    /// ```
    /// use tuyadp::MonotonicTime;
    ///
    /// let at = MonotonicTime::from_millis(500);
    /// assert_eq!(500, at.as_millis());
    /// ```
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    /// Creates a timestamp from a duration past the epoch.
    #[must_use]
    pub const fn from_elapsed(elapsed: Duration) -> Self {
        Self(elapsed)
    }

    /// Returns whole milliseconds past the epoch.
    #[must_use]
    pub fn as_millis(self) -> u128 {
        self.0.as_millis()
    }

    /// Returns the elapsed duration past the epoch.
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        self.0
    }

    /// Returns the duration elapsed since `earlier`, saturating at zero.
    ///
    /// ```
    /// use std::time::Duration;
    /// use tuyadp::MonotonicTime;
    ///
    /// let press = MonotonicTime::from_millis(100);
    /// let release = MonotonicTime::from_millis(250);
    /// assert_eq!(Duration::from_millis(150), release.saturating_since(press));
    /// assert_eq!(Duration::ZERO, press.saturating_since(release));
    /// ```
    #[must_use]
    pub fn saturating_since(self, earlier: Self) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<Duration> for MonotonicTime {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs))
    }
}
