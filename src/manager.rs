use crate::analysis::SeriesAnalyzer;
use crate::config::Config;
use crate::data::{read_readings, write_report};
use crate::model::Window;
use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    fs::File,
    io::{self, BufWriter},
    path::{Path, PathBuf},
};

/// Binds one readings file and one configuration to an analyzer and
/// writes the result of each command as a JSON report.
pub struct Manager {
    cfg: Config,
    analyzer: SeriesAnalyzer,
    output: Option<PathBuf>,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(
        readings_file: P,
        config_file: Option<P>,
        output: Option<PathBuf>,
    ) -> Result<Self> {
        let cfg = match config_file {
            Some(file) => Config::from_file(file).context("failed to construct cfg")?,
            None => Config::default(),
        };
        log::info!("{cfg:#?}");

        let readings = read_readings(readings_file).context("failed to load readings")?;
        let analyzer = SeriesAnalyzer::new(readings, cfg.adequacy);
        match analyzer.endpoints() {
            Some((first, last)) => log::info!(
                "series of {} readings spans {first} to {last}",
                analyzer.readings().len()
            ),
            None => log::warn!("series is empty"),
        }

        Ok(Self {
            cfg,
            analyzer,
            output,
        })
    }

    pub fn filter(&self, window: Option<Window>, strict: bool) -> Result<()> {
        let res = if strict {
            self.analyzer.filter_strict(window)
        } else {
            self.analyzer.filter_loose(window)
        };
        log::info!("kept {} readings, excluded {}", res.data.len(), res.excluded.len());

        self.emit(&serde_json::json!({
            "window": window,
            "strict": strict,
            "n_data": res.data.len(),
            "n_excluded": res.excluded.len(),
            "data": res.data,
        }))
    }

    pub fn coverage(&self, window: Window) -> Result<()> {
        let days: Vec<_> = self
            .analyzer
            .day_coverage(window)
            .into_iter()
            .map(|day| {
                serde_json::json!({
                    "start": day.start,
                    "end": day.end,
                    "count": day.count,
                    "threshold": day.threshold,
                    "complete": day.is_complete(),
                })
            })
            .collect();

        self.emit(&serde_json::json!({ "window": window, "days": days }))
    }

    pub fn threshold(&self, window: Window) -> Result<()> {
        let threshold = self.analyzer.threshold(window);
        self.emit(&serde_json::json!({ "window": window, "threshold": threshold }))
    }

    /// Average of the strictly filtered window.
    ///
    /// With `plain` the value is a bare number, `null` when insufficient.
    pub fn average(&self, window: Window, plain: bool) -> Result<()> {
        let res = self.analyzer.filter_strict(Some(window));
        let average = self.analyzer.average(&res.data);
        if average.is_insufficient() {
            log::warn!("{} readings are not enough for an average", res.data.len());
        }
        let average = if plain {
            serde_json::json!(average.value())
        } else {
            serde_json::json!(average)
        };
        self.emit(&serde_json::json!({
            "window": window,
            "units": self.cfg.units,
            "n_data": res.data.len(),
            "average": average,
        }))
    }

    /// Breakdown of the strictly filtered window.
    ///
    /// With `plain` the fields are bare numbers, all `null` when insufficient.
    pub fn breakdown(&self, window: Window, counts: bool, plain: bool) -> Result<()> {
        let res = self.analyzer.filter_strict(Some(window));
        let breakdown = if counts {
            self.analyzer.range_counts(&res.data, &self.cfg.bands)
        } else {
            self.analyzer.range_breakdown(&res.data, &self.cfg.bands)
        };
        let breakdown = if plain {
            serde_json::json!(breakdown.fields())
        } else {
            serde_json::json!(breakdown)
        };
        self.emit(&serde_json::json!({
            "window": window,
            "bands": self.cfg.bands,
            "units": self.cfg.units,
            "counts": counts,
            "breakdown": breakdown,
        }))
    }

    pub fn summary(&self, window: Window) -> Result<()> {
        let summary = self.analyzer.summarize(window, &self.cfg.bands);
        self.emit(&serde_json::json!({
            "units": self.cfg.units,
            "bands": self.cfg.bands,
            "summary": summary,
        }))
    }

    fn emit<T: Serialize>(&self, report: &T) -> Result<()> {
        match &self.output {
            Some(file) => {
                let handle =
                    File::create(file).with_context(|| format!("failed to create {file:?}"))?;
                write_report(BufWriter::new(handle), report)?;
                log::info!("wrote report to {file:?}");
            }
            None => write_report(io::stdout().lock(), report)?,
        }
        Ok(())
    }
}
