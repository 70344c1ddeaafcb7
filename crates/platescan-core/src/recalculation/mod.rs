//! Incremental recalculation of every spectrum drawn on one plate.
//!
//! A pass diffs the current rectangles and settings against the previous
//! snapshot, masks the still-valid spectra out of a fresh copy of the raster
//! and re-extracts only what changed: the principal first, then the lamps in
//! input order, masking each result out before the next extraction.

pub mod cache;
pub mod diff;

pub use cache::{AnalysisCache, AnalysisCacheEntry};
pub use diff::{
    FullReprocessReason, RecalculationSnapshot, ReprocessPlan, full_reprocess_reason,
    plan_reprocess,
};

use crate::domain::{EngineError, EngineResult, ExtractionSettings, Rectangle};
use crate::extraction::{SpectrumTrace, extract_trace, extract_trace_reusing};
use crate::raster::{PixelBuffer, erase_patch};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecalculationPhase {
    Idle,
    Diffing,
    ReprocessPrincipal,
    ReprocessOthers,
}

impl RecalculationPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Diffing => "diffing",
            Self::ReprocessPrincipal => "reprocess-principal",
            Self::ReprocessOthers => "reprocess-others",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedSpectrum {
    pub id: String,
    pub intensities: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recalculation {
    /// Only the spectra that were extracted in this pass, principal first.
    pub updated: Vec<UpdatedSpectrum>,
    pub cache: AnalysisCache,
    pub snapshot: RecalculationSnapshot,
}

impl Recalculation {
    pub fn updated_ids(&self) -> impl Iterator<Item = &str> {
        self.updated.iter().map(|spectrum| spectrum.id.as_str())
    }
}

/// Owns the snapshot of the previous pass. Passes take `&mut self`, so at
/// most one can be in flight.
#[derive(Debug, Clone, Default)]
pub struct RecalculationCoordinator {
    snapshot: Option<RecalculationSnapshot>,
}

impl RecalculationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: RecalculationSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
        }
    }

    pub fn snapshot(&self) -> Option<&RecalculationSnapshot> {
        self.snapshot.as_ref()
    }

    /// Runs one pass. On failure the coordinator keeps its previous snapshot.
    pub fn recalculate(
        &mut self,
        buffer: &PixelBuffer,
        rectangles: &[Rectangle],
        settings: &ExtractionSettings,
        cache: &AnalysisCache,
    ) -> EngineResult<Recalculation> {
        let result =
            recalculate_spectra(buffer, rectangles, self.snapshot.as_ref(), settings, cache)?;
        self.snapshot = Some(result.snapshot.clone());
        Ok(result)
    }
}

/// One recalculation pass.
///
/// `cache` is only read; the returned [`Recalculation`] carries the merged
/// cache (entries for ids no longer present are dropped) and the snapshot to
/// pass as `previous` next time.
pub fn recalculate_spectra(
    buffer: &PixelBuffer,
    rectangles: &[Rectangle],
    previous: Option<&RecalculationSnapshot>,
    settings: &ExtractionSettings,
    cache: &AnalysisCache,
) -> EngineResult<Recalculation> {
    settings.validate()?;
    let principal = find_principal(rectangles)?;

    enter(RecalculationPhase::Diffing);
    let plan = plan_reprocess(previous, rectangles, principal, settings, cache);
    debug!(
        full = plan.full.map_or("no", |reason| reason.as_str()),
        reprocess = plan.reprocess.len(),
        total = rectangles.len(),
        "recalculation plan"
    );

    let mut next_cache = cache.clone();
    next_cache.evict_missing(rectangles.iter().map(|r| r.id.as_str()));
    let mut working = buffer.clone();
    for rectangle in rectangles.iter().filter(|r| !plan.needs(&r.id)) {
        if let Some(entry) = next_cache.get(&rectangle.id) {
            working = erase_patch(&working, rectangle, &entry.mask_patch, settings.mask_fill);
        }
    }

    let mut updated = Vec::with_capacity(plan.reprocess.len());

    enter(RecalculationPhase::ReprocessPrincipal);
    let principal_trace: Arc<AnalysisCacheEntry> = if plan.needs(&principal.id) {
        let trace = extract_trace(&working, principal, settings)?;
        let entry = Arc::new(AnalysisCacheEntry::new(principal.clone(), trace));
        working = erase_patch(&working, principal, &entry.mask_patch, settings.mask_fill);
        updated.push(updated_spectrum(&entry.id, &entry.trace));
        next_cache.insert(Arc::clone(&entry));
        entry
    } else {
        next_cache
            .get(&principal.id)
            .cloned()
            .ok_or(EngineError::NoPrincipalSpectrum)?
    };

    enter(RecalculationPhase::ReprocessOthers);
    for rectangle in rectangles
        .iter()
        .filter(|r| r.id != principal.id && plan.needs(&r.id))
    {
        let trace = if settings.reuse_mode {
            extract_trace_reusing(&working, rectangle, &principal_trace.trace)?
        } else {
            extract_trace(&working, rectangle, settings)?
        };
        let entry = Arc::new(AnalysisCacheEntry::new(rectangle.clone(), trace));
        working = erase_patch(&working, rectangle, &entry.mask_patch, settings.mask_fill);
        updated.push(updated_spectrum(&entry.id, &entry.trace));
        next_cache.insert(entry);
    }
    drop(working);

    enter(RecalculationPhase::Idle);
    Ok(Recalculation {
        updated,
        cache: next_cache,
        snapshot: RecalculationSnapshot::capture(rectangles, &principal.id, settings),
    })
}

fn enter(phase: RecalculationPhase) {
    debug!(phase = phase.as_str(), "recalculation phase");
}

fn updated_spectrum(id: &str, trace: &SpectrumTrace) -> UpdatedSpectrum {
    UpdatedSpectrum {
        id: id.to_string(),
        intensities: trace.transversal_averages.clone(),
    }
}

/// Checks geometry and id uniqueness, then returns the single science
/// rectangle.
fn find_principal(rectangles: &[Rectangle]) -> EngineResult<&Rectangle> {
    let mut seen = HashSet::with_capacity(rectangles.len());
    for rectangle in rectangles {
        if !rectangle.is_finite() {
            return Err(EngineError::NonFiniteRectangle {
                id: rectangle.id.clone(),
            });
        }
        if !seen.insert(rectangle.id.as_str()) {
            return Err(EngineError::DuplicateSpectrumId {
                id: rectangle.id.clone(),
            });
        }
    }

    let principals: Vec<&Rectangle> = rectangles.iter().filter(|r| r.is_principal()).collect();
    match principals.as_slice() {
        [] => Err(EngineError::NoPrincipalSpectrum),
        [principal] => Ok(principal),
        many => Err(EngineError::MultiplePrincipalSpectra {
            ids: many.iter().map(|r| r.id.clone()).collect(),
        }),
    }
}
