use crate::analysis::Adequacy;
use crate::bands::Bands;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Analysis configuration.
///
/// Loaded from a TOML file and validated before use. Every key is optional;
/// missing keys take the values of [`Config::default`].
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Unit label of glucose values and band cut points.
    pub units: String,

    /// Range classification cut points.
    pub bands: Bands,

    /// Expected cadence and required coverage.
    pub adequacy: Adequacy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            units: "mg/dL".to_string(),
            bands: Bands::default(),
            adequacy: Adequacy::default(),
        }
    }
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.units.trim().is_empty() {
            bail!("units must not be empty");
        }

        check_bands(&self.bands).context("invalid bands")?;

        check_num(self.adequacy.cadence_mins, 1..=60).context("invalid cadence")?;
        check_num(self.adequacy.min_fraction, 0.0..=1.0).context("invalid minimum fraction")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_bands(bands: &Bands) -> Result<()> {
    let cuts = [
        ("very_low", bands.very_low),
        ("low", bands.low),
        ("target", bands.target),
        ("high", bands.high),
    ];
    for (name, cut) in cuts {
        if !cut.is_finite() || cut <= 0.0 {
            bail!("{name} cut point must be finite and positive, but is {cut}");
        }
    }
    // Cut points must be strictly increasing.
    for pair in cuts.windows(2) {
        let (name_a, cut_a) = pair[0];
        let (name_b, cut_b) = pair[1];
        if cut_a >= cut_b {
            bail!("{name_a} ({cut_a}) must be below {name_b} ({cut_b})");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DayAnchor;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.adequacy.cadence_mins, 5);
        assert_eq!(config.adequacy.min_fraction, 0.75);
    }

    #[test]
    fn partial_file_overrides() {
        let config = Config::from_toml(
            "units = \"mmol/L\"\n\
             [bands]\n\
             very_low = 3.0\n\
             low = 3.9\n\
             target = 10.0\n\
             high = 13.9\n\
             [adequacy]\n\
             day_anchor = \"midnight\"\n",
        )
        .unwrap();
        assert_eq!(config.units, "mmol/L");
        assert_eq!(config.bands.low, 3.9);
        assert_eq!(config.adequacy.day_anchor, DayAnchor::Midnight);
        assert_eq!(config.adequacy.cadence_mins, 5);
    }

    #[test]
    fn rejects_unordered_bands() {
        let err = Config::from_toml("[bands]\nlow = 200.0\n").unwrap_err();
        assert!(format!("{err:#}").contains("low (200) must be below target (180)"));
    }

    #[test]
    fn rejects_bad_adequacy() {
        assert!(Config::from_toml("[adequacy]\ncadence_mins = 0\n").is_err());
        assert!(Config::from_toml("[adequacy]\nmin_fraction = 1.5\n").is_err());
        assert!(Config::from_toml("unknown = 1\n").is_err());
    }
}
