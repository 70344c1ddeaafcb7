use super::CliError;
use anyhow::Context;
use platescan_core::calibration::{
    CalibratedSample, DispersionError, DispersionSummary, InferenceKind, ReferenceLine,
    ReferencePeak,
};
use platescan_core::domain::{EngineResult, ExtractionSettings, Rectangle};
use platescan_core::raster::PixelBuffer;
use platescan_core::recalculation::{AnalysisCache, RecalculationSnapshot, UpdatedSpectrum};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(tag = "encoding", rename_all = "camelCase")]
pub(super) enum RasterInput {
    Gray {
        width: usize,
        height: usize,
        samples: Vec<f32>,
    },
    Gray8 {
        width: usize,
        height: usize,
        bytes: Vec<u8>,
    },
    Rgba8 {
        width: usize,
        height: usize,
        bytes: Vec<u8>,
    },
}

impl RasterInput {
    pub(super) fn into_buffer(self) -> EngineResult<PixelBuffer> {
        let buffer = match self {
            Self::Gray {
                width,
                height,
                samples,
            } => PixelBuffer::from_gray(width, height, samples)?,
            Self::Gray8 {
                width,
                height,
                bytes,
            } => PixelBuffer::from_gray8(width, height, &bytes)?,
            Self::Rgba8 {
                width,
                height,
                bytes,
            } => PixelBuffer::from_rgba8(width, height, &bytes)?,
        };
        Ok(buffer)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ExtractionJob {
    pub raster: RasterInput,
    pub rectangles: Vec<Rectangle>,
    #[serde(default)]
    pub settings: ExtractionSettings,
}

/// Session state carried between `extract` runs.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SessionState {
    #[serde(default)]
    pub snapshot: Option<RecalculationSnapshot>,
    #[serde(default)]
    pub cache: AnalysisCache,
}

#[derive(Debug, Serialize)]
pub(super) struct ExtractionReport {
    pub updated: Vec<UpdatedSpectrum>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CalibrationMarks {
    #[serde(default)]
    pub kind: InferenceKind,
    #[serde(default)]
    pub degree: Option<usize>,
    pub lamp_pixels: Vec<f64>,
    pub material_wavelengths: Vec<f64>,
    #[serde(default)]
    pub intensities: Option<Vec<f64>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CalibrationReport {
    pub dispersion_errors: Vec<DispersionError>,
    pub summary: Option<DispersionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibrated: Option<Vec<CalibratedSample>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct LinesReport<'a> {
    pub lines: Vec<&'a ReferenceLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak: Option<ReferencePeak>,
}

pub(super) fn read_json<T: DeserializeOwned>(path: &Path, label: &str) -> Result<T, CliError> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {label} '{}'", path.display()))?;
    serde_json::from_str(&text).map_err(|error| {
        CliError::InvalidInput(format!(
            "failed to parse {label} '{}': {error}",
            path.display()
        ))
    })
}

pub(super) fn read_text(path: &Path, label: &str) -> Result<String, CliError> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {label} '{}'", path.display()))?;
    Ok(text)
}

/// Writes pretty JSON to `path`, or to stdout when no path is given.
pub(super) fn write_json<T: Serialize>(
    path: Option<&Path>,
    value: &T,
    label: &str,
) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|error| CliError::Internal(format!("failed to serialize {label}: {error}")))?;
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create directory '{}'", parent.display())
                })?;
            }
            fs::write(path, format!("{rendered}\n"))
                .with_context(|| format!("failed to write {label} '{}'", path.display()))?;
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

pub(super) fn load_session_state(path: Option<&Path>) -> Result<SessionState, CliError> {
    match path {
        Some(path) if path.exists() => read_json(path, "session state"),
        _ => Ok(SessionState::default()),
    }
}

pub(super) fn validate_settings(settings: &ExtractionSettings) -> Result<(), CliError> {
    settings.validate().map_err(CliError::from)
}
