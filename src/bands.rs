use crate::model::Breakdown;
use serde::{Deserialize, Serialize};

/// Glucose range cut points.
///
/// A value below `very_low` is very low, below `low` is low, up to and
/// including `target` is in range, up to and including `high` is high, and
/// anything above `high` is very high.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bands {
    pub very_low: f64,
    pub low: f64,
    pub target: f64,
    pub high: f64,
}

impl Default for Bands {
    fn default() -> Self {
        Self {
            very_low: 54.0,
            low: 70.0,
            target: 180.0,
            high: 250.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    VeryLow,
    Low,
    Target,
    High,
    VeryHigh,
}

impl Bands {
    pub fn classify(&self, value: f64) -> Band {
        if value < self.very_low {
            Band::VeryLow
        } else if value < self.low {
            Band::Low
        } else if value <= self.target {
            Band::Target
        } else if value <= self.high {
            Band::High
        } else {
            Band::VeryHigh
        }
    }

    pub fn count<I: IntoIterator<Item = f64>>(&self, values: I) -> BandCounts {
        let mut counts = BandCounts::default();
        for val in values {
            counts.add(self.classify(val));
        }
        counts
    }
}

/// Number of readings in each of the five bands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BandCounts {
    pub very_low: usize,
    pub low: usize,
    pub target: usize,
    pub high: usize,
    pub very_high: usize,
}

impl BandCounts {
    pub fn add(&mut self, band: Band) {
        match band {
            Band::VeryLow => self.very_low += 1,
            Band::Low => self.low += 1,
            Band::Target => self.target += 1,
            Band::High => self.high += 1,
            Band::VeryHigh => self.very_high += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.very_low + self.low + self.target + self.high + self.very_high
    }

    /// Fold the outer bands into low and high.
    pub fn collapse(&self) -> Breakdown {
        Breakdown {
            low: (self.very_low + self.low) as f64,
            target: self.target as f64,
            high: (self.high + self.very_high) as f64,
            total: self.total() as f64,
        }
    }
}
