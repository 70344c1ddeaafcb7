use super::CliError;
use super::helpers::*;
use platescan_core::calibration::{
    DEFAULT_PEAK_WINDOW_FRACTION, DispersionSummary, build_inference_function,
    calibrate_intensities, dispersion_errors, filter_reference_lines, pair_marks,
    parse_reference_lines, snap_to_peak,
};
use platescan_core::recalculation::RecalculationCoordinator;
use std::path::PathBuf;
use tracing::info;

#[derive(clap::Args)]
pub(super) struct ExtractArgs {
    /// Extraction job: raster, rectangles and settings
    #[arg(long)]
    job: PathBuf,

    /// Session state (snapshot and cache), read if present and rewritten
    #[arg(long)]
    state: Option<PathBuf>,

    /// Report output path (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct CalibrateArgs {
    /// Calibration marks file
    #[arg(long)]
    marks: PathBuf,

    /// Report output path (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct LinesArgs {
    /// Whitespace separated reference line list
    #[arg(long)]
    file: PathBuf,

    /// Keep only lines of this material
    #[arg(long)]
    material: Option<String>,

    /// Lower wavelength bound
    #[arg(long)]
    min: Option<f64>,

    /// Upper wavelength bound
    #[arg(long)]
    max: Option<f64>,

    /// Snap this wavelength to the most intense nearby line
    #[arg(long)]
    snap: Option<f64>,

    /// Snap window as a fraction of the listed wavelength span
    #[arg(long, default_value_t = DEFAULT_PEAK_WINDOW_FRACTION)]
    window: f64,

    /// Report output path (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(super) fn run_extract_command(args: ExtractArgs) -> Result<i32, CliError> {
    let job: ExtractionJob = read_json(&args.job, "extraction job")?;
    validate_settings(&job.settings)?;
    let buffer = job.raster.into_buffer()?;
    let state = load_session_state(args.state.as_deref())?;

    let mut coordinator = match state.snapshot {
        Some(snapshot) => RecalculationCoordinator::with_snapshot(snapshot),
        None => RecalculationCoordinator::new(),
    };
    let result = coordinator.recalculate(&buffer, &job.rectangles, &job.settings, &state.cache)?;
    info!(
        updated = result.updated.len(),
        cached = result.cache.len(),
        "extraction pass finished"
    );

    if let Some(state_path) = args.state.as_deref() {
        let next_state = SessionState {
            snapshot: Some(result.snapshot),
            cache: result.cache,
        };
        write_json(Some(state_path), &next_state, "session state")?;
    }
    write_json(
        args.output.as_deref(),
        &ExtractionReport {
            updated: result.updated,
        },
        "extraction report",
    )?;
    Ok(0)
}

pub(super) fn run_calibrate_command(args: CalibrateArgs) -> Result<i32, CliError> {
    let marks: CalibrationMarks = read_json(&args.marks, "calibration marks")?;
    let pairs = pair_marks(&marks.lamp_pixels, &marks.material_wavelengths);
    let function = build_inference_function(marks.kind, &pairs, marks.degree)?;

    let errors = dispersion_errors(&function, &pairs);
    let report = CalibrationReport {
        summary: DispersionSummary::from_errors(&errors),
        dispersion_errors: errors,
        calibrated: marks
            .intensities
            .as_deref()
            .map(|intensities| calibrate_intensities(&function, intensities)),
    };
    write_json(args.output.as_deref(), &report, "calibration report")?;
    Ok(0)
}

pub(super) fn run_lines_command(args: LinesArgs) -> Result<i32, CliError> {
    if !(args.window > 0.0) {
        return Err(CliError::Usage(format!(
            "--window must be greater than zero, got {}",
            args.window
        )));
    }
    let text = read_text(&args.file, "reference line list")?;
    let lines = parse_reference_lines(&text);
    let selected = filter_reference_lines(
        &lines,
        args.material.as_deref(),
        args.min.unwrap_or(f64::NEG_INFINITY),
        args.max.unwrap_or(f64::INFINITY),
    );

    let peak = args.snap.map(|wavelength| {
        let candidates: Vec<_> = selected.iter().map(|line| (*line).clone()).collect();
        snap_to_peak(&candidates, wavelength, args.window)
    });
    write_json(
        args.output.as_deref(),
        &LinesReport {
            lines: selected,
            peak,
        },
        "line report",
    )?;
    Ok(0)
}
