//! Rate test report and export

use crate::engine::Engine;
use crate::error::ReportError;
use crate::measure::{self, MeasurementResult, ResultStatus, TestResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A finished rate test plus the settings it ran with
#[derive(Debug, Clone, Serialize)]
pub struct RateReport {
    pub metadata: ReportMetadata,
    pub settings: ReportSettings,
    pub result: MeasurementResult,
    pub summary: Vec<ResultEntry>,
}

/// Report metadata
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Report generation timestamp
    pub generated_at: String,
    /// Application version
    pub version: String,
}

/// Engine settings at export time
#[derive(Debug, Clone, Serialize)]
pub struct ReportSettings {
    pub hotkey: String,
    pub output: String,
    pub mode: String,
    pub target_rate: u32,
    pub humanize: bool,
    pub jitter: f64,
    pub micro_pause: bool,
}

/// Single result entry
#[derive(Debug, Clone, Serialize)]
pub struct ResultEntry {
    pub label: String,
    pub value: String,
    pub status: String,
}

impl From<&TestResult> for ResultEntry {
    fn from(result: &TestResult) -> Self {
        let status = match result.status {
            ResultStatus::Ok => "ok",
            ResultStatus::Warning => "warning",
            ResultStatus::Error => "error",
            ResultStatus::Info => "info",
        };
        Self {
            label: result.label.clone(),
            value: result.value.clone(),
            status: status.to_string(),
        }
    }
}

impl RateReport {
    /// Build a report from the engine's last finished test
    pub fn from_engine(engine: &Engine) -> Result<Self, ReportError> {
        let result = engine.last_result().ok_or(ReportError::NoResult)?;
        Ok(Self::new(engine, result, Utc::now()))
    }

    pub fn new(engine: &Engine, result: MeasurementResult, now: DateTime<Utc>) -> Self {
        let cadence = engine.cadence();
        let summary = measure::result_rows(&result, cadence.rate())
            .iter()
            .map(ResultEntry::from)
            .collect();

        Self {
            metadata: ReportMetadata {
                generated_at: now.to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            settings: ReportSettings {
                hotkey: engine.hotkey_display(),
                output: engine.output_display(),
                mode: engine.mode().name().to_string(),
                target_rate: cadence.rate(),
                humanize: cadence.humanize.enabled,
                jitter: cadence.humanize.jitter,
                micro_pause: cadence.humanize.micro_pause,
            },
            result,
            summary,
        }
    }

    /// Timestamped file name, e.g. `pulsekey-rate-20240101-120000.json`
    pub fn default_file_name(now: DateTime<Utc>) -> PathBuf {
        PathBuf::from(format!("pulsekey-rate-{}.json", now.format("%Y%m%d-%H%M%S")))
    }

    /// Export report to JSON file
    pub fn export_json(&self, path: &Path) -> Result<(), ReportError> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Export report to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::input::InputCapabilities;
    use chrono::TimeZone;

    fn engine() -> Engine {
        Engine::with_capabilities(&Config::default(), InputCapabilities::full())
    }

    #[test]
    fn no_result_is_an_error() {
        assert!(matches!(
            RateReport::from_engine(&engine()),
            Err(ReportError::NoResult)
        ));
    }

    #[test]
    fn report_serializes_settings_and_series() {
        let engine = engine();
        let offsets: Vec<f64> = (0..10).map(|i| i as f64 * 0.1 + 0.05).collect();
        let result = measure::stats::summarize(&offsets, 1.0, 0.1);
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let report = RateReport::new(&engine, result, now);

        let json = report.to_json().unwrap();
        assert!(json.contains("\"hotkey\": \"F1\""));
        assert!(json.contains("\"target_rate\": 100"));
        assert!(json.contains("\"bin_rates\""));
        assert!(json.contains("2024-03-01T12:30:00"));
        assert_eq!(
            RateReport::default_file_name(now),
            PathBuf::from("pulsekey-rate-20240301-123000.json")
        );
    }

    #[test]
    fn export_writes_file() {
        let engine = engine();
        let result = measure::stats::summarize(&[], 5.0, 0.1);
        let report = RateReport::new(&engine, result, Utc::now());
        let path = std::env::temp_dir().join(format!("pulsekey-report-{}.json", std::process::id()));
        report.export_json(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"total_events\": 0"));
        let _ = std::fs::remove_file(&path);
    }
}
