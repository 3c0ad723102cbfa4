//! Reading and result types shared by the analysis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Single CGM sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Instant of the sample, (de)serialized as an RFC 3339 string.
    pub timestamp: DateTime<Utc>,
    /// Glucose value in the configured units.
    pub value: f64,
}

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// A window whose end does not come after its start holds nothing.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Partition of a series into readings kept for analysis and readings left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterResult {
    pub data: Vec<Reading>,
    pub excluded: Vec<Reading>,
}

/// Outcome of a statistic that needs a minimum amount of data.
///
/// `Insufficient` replaces the NaN sentinel: it means "not enough readings
/// to trust this value", never a computation error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Stat<T> {
    Insufficient,
    Computed(T),
}

impl<T> Stat<T> {
    pub fn is_insufficient(&self) -> bool {
        matches!(self, Stat::Insufficient)
    }

    pub fn computed(self) -> Option<T> {
        match self {
            Stat::Insufficient => None,
            Stat::Computed(val) => Some(val),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Stat<U> {
        match self {
            Stat::Insufficient => Stat::Insufficient,
            Stat::Computed(val) => Stat::Computed(f(val)),
        }
    }
}

impl Stat<f64> {
    /// Value with the NaN convention: NaN when insufficient.
    pub fn value(self) -> f64 {
        self.computed().unwrap_or(f64::NAN)
    }
}

impl Stat<Breakdown> {
    /// Breakdown with the NaN convention: every field NaN when insufficient.
    pub fn fields(self) -> Breakdown {
        self.computed().unwrap_or(Breakdown {
            low: f64::NAN,
            target: f64::NAN,
            high: f64::NAN,
            total: f64::NAN,
        })
    }
}

/// Low / target / high shares of a set of readings.
///
/// Holds either counts or percentages of `total`; `total` is always the
/// number of readings classified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Breakdown {
    pub low: f64,
    pub target: f64,
    pub high: f64,
    pub total: f64,
}

impl Breakdown {
    /// Convert counts to percentages of `total`.
    pub fn to_percentages(self) -> Self {
        if self.total <= 0.0 {
            return self;
        }
        let pct = |count: f64| 100.0 * count / self.total;
        Self {
            low: pct(self.low),
            target: pct(self.target),
            high: pct(self.high),
            total: self.total,
        }
    }
}

/// Mean and dispersion of glucose values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Spread {
    pub n_vals: usize,
    pub mean: f64,
    pub std_dev: f64,
    /// Coefficient of variation in percent, `None` for a zero mean.
    pub cv: Option<f64>,
}

/// Completeness of one day bucket of a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayCoverage {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub count: usize,
    pub threshold: usize,
}

impl DayCoverage {
    pub fn is_complete(&self) -> bool {
        self.count >= self.threshold
    }
}
