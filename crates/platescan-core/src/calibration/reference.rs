//! Laboratory reference line lists for comparison lamps.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PEAK_WINDOW_FRACTION: f64 = 0.01;
const UNNAMED_MATERIAL: &str = "-";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    pub wavelength: f64,
    pub material: String,
    pub intensity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferencePeak {
    pub wavelength: f64,
    pub intensity: f64,
}

/// Parse a whitespace separated line list.
///
/// Accepted rows are a bare `wavelength` (empty material, intensity 0),
/// `wavelength intensity` (material `-`) and
/// `wavelength material intensity [...]`. Blank rows, `#` comments and rows
/// whose numbers do not parse are skipped.
pub fn parse_reference_lines(text: &str) -> Vec<ReferenceLine> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_row)
        .collect()
}

fn parse_row(line: &str) -> Option<ReferenceLine> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let (wavelength, material, intensity) = match fields.as_slice() {
        [] => return None,
        [wavelength] => (wavelength, String::new(), 0.0),
        [wavelength, intensity] => (
            wavelength,
            UNNAMED_MATERIAL.to_string(),
            parse_number(intensity)?,
        ),
        [wavelength, material, intensity, ..] => {
            (wavelength, material.to_string(), parse_number(intensity)?)
        }
    };

    Some(ReferenceLine {
        wavelength: parse_number(wavelength)?,
        material,
        intensity,
    })
}

fn parse_number(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|value| !value.is_nan())
}

/// Lines of `material` (any material when `None`) inside `[min, max]`.
pub fn filter_reference_lines<'a>(
    lines: &'a [ReferenceLine],
    material: Option<&str>,
    min: f64,
    max: f64,
) -> Vec<&'a ReferenceLine> {
    lines
        .iter()
        .filter(|line| material.is_none_or(|material| line.material == material))
        .filter(|line| line.wavelength >= min && line.wavelength <= max)
        .collect()
}

/// Most intense line strictly within `delta_fraction * span` of
/// `wavelength`, where `span` is the wavelength range of `lines`. With no
/// candidate the query itself comes back with zero intensity.
pub fn snap_to_peak(lines: &[ReferenceLine], wavelength: f64, delta_fraction: f64) -> ReferencePeak {
    let fallback = ReferencePeak {
        wavelength,
        intensity: 0.0,
    };
    if lines.is_empty() {
        return fallback;
    }
    let min = lines.iter().map(|line| line.wavelength).fold(f64::INFINITY, f64::min);
    let max = lines
        .iter()
        .map(|line| line.wavelength)
        .fold(f64::NEG_INFINITY, f64::max);

    let delta = (max - min) * delta_fraction;
    lines
        .iter()
        .filter(|line| (line.wavelength - wavelength).abs() < delta)
        .fold(None::<&ReferenceLine>, |best, line| match best {
            Some(best) if best.intensity >= line.intensity => Some(best),
            _ => Some(line),
        })
        .map_or(fallback, |line| ReferencePeak {
            wavelength: line.wavelength,
            intensity: line.intensity,
        })
}
