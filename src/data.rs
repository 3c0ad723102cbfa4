use crate::model::Reading;
use anyhow::{Context, Result, bail};
use rmp_serde::decode;
use serde::Serialize;
use std::{
    fs::File,
    io::{BufReader, Read, Write},
    path::Path,
};

/// Encoding of a readings file, picked from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    MessagePack,
}

impl Format {
    pub fn from_path(file: &Path) -> Result<Self> {
        let ext = file
            .extension()
            .and_then(|ext| ext.to_str())
            .with_context(|| format!("{file:?} has no extension"))?;
        match ext.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "msgpack" | "mpk" => Ok(Format::MessagePack),
            _ => bail!("unsupported readings format {ext:?} (expected json or msgpack)"),
        }
    }
}

/// Read a sequence of readings from a JSON or MessagePack file.
pub fn read_readings<P: AsRef<Path>>(file: P) -> Result<Vec<Reading>> {
    let file = file.as_ref();
    let format = Format::from_path(file)?;
    let handle = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
    let reader = BufReader::new(handle);

    let readings = decode_readings(reader, format)
        .with_context(|| format!("failed to read readings from {file:?}"))?;
    log::info!("read {} readings from {file:?}", readings.len());

    Ok(readings)
}

pub fn decode_readings<R: Read>(reader: R, format: Format) -> Result<Vec<Reading>> {
    let readings = match format {
        Format::Json => {
            serde_json::from_reader(reader).context("failed to deserialize JSON readings")?
        }
        Format::MessagePack => {
            decode::from_read(reader).context("failed to deserialize MessagePack readings")?
        }
    };
    Ok(readings)
}

/// Write a report as pretty-printed JSON followed by a newline.
pub fn write_report<W: Write, T: Serialize>(mut writer: W, report: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, report).context("failed to serialize report")?;
    writeln!(writer).context("failed to write report")?;
    writer.flush().context("failed to flush writer stream")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn sample() -> Vec<Reading> {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        vec![
            Reading {
                timestamp: t,
                value: 110.0,
            },
            Reading {
                timestamp: t + chrono::TimeDelta::minutes(5),
                value: 112.5,
            },
        ]
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::from_path(&PathBuf::from("a.json")).unwrap(), Format::Json);
        assert_eq!(
            Format::from_path(&PathBuf::from("a.MSGPACK")).unwrap(),
            Format::MessagePack
        );
        assert!(Format::from_path(&PathBuf::from("a.csv")).is_err());
        assert!(Format::from_path(&PathBuf::from("readings")).is_err());
    }

    #[test]
    fn decode_json_timestamps() {
        let json = r#"[
            { "timestamp": "2024-03-01T08:00:00Z", "value": 110 },
            { "timestamp": "2024-03-01T09:05:00+01:00", "value": 112.5 }
        ]"#;
        let readings = decode_readings(json.as_bytes(), Format::Json).unwrap();
        assert_eq!(readings, sample());
    }

    #[test]
    fn decode_msgpack() {
        let bytes = rmp_serde::to_vec(&sample()).unwrap();
        let readings = decode_readings(bytes.as_slice(), Format::MessagePack).unwrap();
        assert_eq!(readings, sample());
    }

    #[test]
    fn rejects_malformed_json() {
        let json = r#"[{ "timestamp": "yesterday", "value": 1 }]"#;
        assert!(decode_readings(json.as_bytes(), Format::Json).is_err());
    }

    #[test]
    fn report_is_pretty_json() {
        let mut out = Vec::new();
        write_report(&mut out, &serde_json::json!({ "threshold": 216 })).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "{\n  \"threshold\": 216\n}\n");
    }
}
