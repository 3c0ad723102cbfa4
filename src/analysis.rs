use crate::bands::{BandCounts, Bands};
use crate::model::{Breakdown, DayCoverage, FilterResult, Reading, Spread, Stat, Window};
use crate::stats::Accumulator;
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// How readings inside a window are grouped into days for the completeness check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayAnchor {
    /// 24-hour periods counted from the window start.
    #[default]
    Window,
    /// UTC calendar days.
    Midnight,
}

/// Expected device cadence and the share of expected readings a span needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Adequacy {
    pub cadence_mins: u32,
    pub min_fraction: f64,
    pub day_anchor: DayAnchor,
}

impl Default for Adequacy {
    fn default() -> Self {
        Self {
            cadence_mins: 5,
            min_fraction: 0.75,
            day_anchor: DayAnchor::Window,
        }
    }
}

impl Adequacy {
    pub fn cadence(&self) -> TimeDelta {
        TimeDelta::minutes(self.cadence_mins.into())
    }

    /// Minimum number of readings needed to trust a statistic over `[start, end)`.
    ///
    /// `floor(min_fraction * span / cadence)`; zero for empty or reversed spans.
    pub fn threshold(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> usize {
        let span_ms = (end - start).num_milliseconds();
        let cadence_ms = self.cadence().num_milliseconds();
        if span_ms <= 0 || cadence_ms <= 0 {
            return 0;
        }
        let n_intervals = span_ms as f64 / cadence_ms as f64;
        (self.min_fraction * n_intervals).floor() as usize
    }

    /// Bounds of the whole day bucket holding `timestamp`.
    ///
    /// The bucket is never clipped to `window`, so a day the window only
    /// partly covers still has to reach the full-day requirement.
    fn day_bounds(
        &self,
        window: Window,
        timestamp: DateTime<Utc>,
    ) -> (DateTime<Utc>, DateTime<Utc>) {
        let one_day = TimeDelta::days(1);
        let start = match self.day_anchor {
            DayAnchor::Window => {
                let n_days =
                    (timestamp - window.start).num_milliseconds() / one_day.num_milliseconds();
                window.start + TimeDelta::days(n_days)
            }
            DayAnchor::Midnight => timestamp.date_naive().and_time(NaiveTime::MIN).and_utc(),
        };
        let end = start
            .checked_add_signed(one_day)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        (start, end)
    }
}

/// Completeness-aware statistics over one sorted CGM series.
///
/// The series is sorted by timestamp and deduplicated once at construction
/// and never mutated afterwards, so every query is a pure function of the
/// series and its arguments.
#[derive(Debug, Clone)]
pub struct SeriesAnalyzer {
    readings: Vec<Reading>,
    endpoints: Option<(DateTime<Utc>, DateTime<Utc>)>,
    adequacy: Adequacy,
}

/// Everything known about one window after strict filtering.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub window: Window,
    pub threshold: usize,
    pub n_in_window: usize,
    pub n_data: usize,
    pub days: Vec<DayCoverage>,
    pub average: Stat<f64>,
    pub spread: Stat<Spread>,
    pub breakdown: Stat<Breakdown>,
    pub band_counts: Stat<BandCounts>,
}

impl SeriesAnalyzer {
    pub fn new(mut readings: Vec<Reading>, adequacy: Adequacy) -> Self {
        readings.sort_by_key(|reading| reading.timestamp);

        let n_read = readings.len();
        readings.dedup_by_key(|reading| reading.timestamp);
        let n_dup = n_read - readings.len();
        if n_dup > 0 {
            log::warn!("dropped {n_dup} readings with duplicate timestamps");
        }

        let endpoints = readings
            .first()
            .zip(readings.last())
            .map(|(first, last)| (first.timestamp, last.timestamp));

        Self {
            readings,
            endpoints,
            adequacy,
        }
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    /// First and last timestamp of the series, `None` when it is empty.
    pub fn endpoints(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.endpoints
    }

    pub fn adequacy_threshold(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> usize {
        self.adequacy.threshold(start, end)
    }

    pub fn threshold(&self, window: Window) -> usize {
        self.adequacy_threshold(window.start, window.end)
    }

    /// Split the series by whether each reading falls inside `window`.
    ///
    /// Without a window every reading is kept.
    pub fn filter_loose(&self, window: Option<Window>) -> FilterResult {
        let Some(window) = window else {
            return FilterResult {
                data: self.readings.clone(),
                excluded: Vec::new(),
            };
        };

        let range = self.bracket(window);
        let mut excluded = Vec::with_capacity(self.readings.len() - range.len());
        excluded.extend_from_slice(&self.readings[..range.start]);
        excluded.extend_from_slice(&self.readings[range.end..]);

        FilterResult {
            data: self.readings[range].to_vec(),
            excluded,
        }
    }

    /// Like [`filter_loose`](Self::filter_loose), but also excludes every
    /// reading of an incomplete day.
    ///
    /// Without a window nothing is kept.
    pub fn filter_strict(&self, window: Option<Window>) -> FilterResult {
        let Some(window) = window else {
            return FilterResult {
                data: Vec::new(),
                excluded: self.readings.clone(),
            };
        };

        let range = self.bracket(window);
        let mut data = Vec::with_capacity(range.len());
        let mut excluded = Vec::with_capacity(self.readings.len() - range.len());
        excluded.extend_from_slice(&self.readings[..range.start]);

        for (day, readings) in self.day_groups(window, range.clone()) {
            if day.is_complete() {
                data.extend_from_slice(readings);
            } else {
                log::debug!(
                    "excluding day starting {}: {} of {} required readings",
                    day.start,
                    day.count,
                    day.threshold
                );
                excluded.extend_from_slice(readings);
            }
        }

        excluded.extend_from_slice(&self.readings[range.end..]);

        FilterResult { data, excluded }
    }

    /// Counts and requirements of the occupied day buckets of `window`.
    pub fn day_coverage(&self, window: Window) -> Vec<DayCoverage> {
        self.day_groups(window, self.bracket(window))
            .into_iter()
            .map(|(day, _)| day)
            .collect()
    }

    /// Whether `readings` are numerous enough for the span they cover.
    ///
    /// The span runs from the earliest reading to one cadence past the
    /// latest, so a full day of readings covers exactly 24 hours.
    pub fn is_adequate(&self, readings: &[Reading]) -> bool {
        match self.reading_span(readings) {
            Some((start, end)) => readings.len() >= self.adequacy.threshold(start, end),
            None => false,
        }
    }

    pub fn average(&self, readings: &[Reading]) -> Stat<f64> {
        if !self.is_adequate(readings) {
            return Stat::Insufficient;
        }
        let acc: Accumulator = readings.iter().map(|reading| reading.value).collect();
        Stat::Computed(acc.report().mean)
    }

    /// Mean, standard deviation and coefficient of variation.
    ///
    /// Needs at least two readings on top of the adequacy rule. The
    /// coefficient of variation is left out when the mean is zero.
    pub fn spread(&self, readings: &[Reading]) -> Stat<Spread> {
        if readings.len() < 2 || !self.is_adequate(readings) {
            return Stat::Insufficient;
        }
        let acc: Accumulator = readings.iter().map(|reading| reading.value).collect();
        let report = acc.report();
        let cv = (report.mean != 0.0).then(|| 100.0 * report.std_dev / report.mean.abs());
        Stat::Computed(Spread {
            n_vals: report.n_vals,
            mean: report.mean,
            std_dev: report.std_dev,
            cv,
        })
    }

    pub fn band_counts(&self, readings: &[Reading], bands: &Bands) -> Stat<BandCounts> {
        if !self.is_adequate(readings) {
            return Stat::Insufficient;
        }
        Stat::Computed(bands.count(readings.iter().map(|reading| reading.value)))
    }

    /// Low / target / high counts.
    pub fn range_counts(&self, readings: &[Reading], bands: &Bands) -> Stat<Breakdown> {
        self.band_counts(readings, bands).map(|counts| counts.collapse())
    }

    /// Low / target / high percentages of all readings.
    pub fn range_breakdown(&self, readings: &[Reading], bands: &Bands) -> Stat<Breakdown> {
        self.range_counts(readings, bands).map(Breakdown::to_percentages)
    }

    pub fn summarize(&self, window: Window, bands: &Bands) -> Summary {
        let n_in_window = self.bracket(window).len();
        let filtered = self.filter_strict(Some(window));
        let data = &filtered.data;

        Summary {
            window,
            threshold: self.threshold(window),
            n_in_window,
            n_data: data.len(),
            days: self.day_coverage(window),
            average: self.average(data),
            spread: self.spread(data),
            breakdown: self.range_breakdown(data, bands),
            band_counts: self.band_counts(data, bands),
        }
    }

    /// Index range of the readings inside `window`.
    fn bracket(&self, window: Window) -> Range<usize> {
        if window.is_empty() {
            return 0..0;
        }
        let lo = self
            .readings
            .partition_point(|reading| reading.timestamp < window.start);
        let hi = self
            .readings
            .partition_point(|reading| reading.timestamp < window.end);
        lo..hi
    }

    /// Group the in-window readings of `range` into whole day buckets.
    fn day_groups(&self, window: Window, range: Range<usize>) -> Vec<(DayCoverage, &[Reading])> {
        let mut groups = Vec::new();
        let mut rest = &self.readings[range];

        while let Some(first) = rest.first() {
            let (start, end) = self.adequacy.day_bounds(window, first.timestamp);
            let len = rest.partition_point(|reading| reading.timestamp < end);
            let (day, tail) = rest.split_at(len);

            let coverage = DayCoverage {
                start,
                end,
                count: day.len(),
                threshold: self.adequacy.threshold(start, end),
            };
            groups.push((coverage, day));
            rest = tail;
        }

        groups
    }

    fn reading_span(&self, readings: &[Reading]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = readings.iter().map(|reading| reading.timestamp).min()?;
        let last = readings.iter().map(|reading| reading.timestamp).max()?;
        let end = last
            .checked_add_signed(self.adequacy.cadence())
            .unwrap_or(last);
        Some((first, end))
    }
}
