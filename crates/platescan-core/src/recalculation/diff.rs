use super::cache::AnalysisCache;
use crate::domain::{ExtractionSettings, Rectangle};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What the previous recalculation pass saw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculationSnapshot {
    pub checkpoint_count: usize,
    pub aperture_coefficient: f64,
    pub principal_id: String,
    pub rectangles: Vec<Rectangle>,
}

impl RecalculationSnapshot {
    pub fn capture(
        rectangles: &[Rectangle],
        principal_id: &str,
        settings: &ExtractionSettings,
    ) -> Self {
        Self {
            checkpoint_count: settings.checkpoint_count,
            aperture_coefficient: settings.aperture_coefficient,
            principal_id: principal_id.to_string(),
            rectangles: rectangles.to_vec(),
        }
    }

    pub fn rectangle(&self, id: &str) -> Option<&Rectangle> {
        self.rectangles.iter().find(|rectangle| rectangle.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullReprocessReason {
    NoPreviousPass,
    CheckpointCountChanged,
    ApertureCoefficientChanged,
    PrincipalChanged,
    PrincipalMoved,
}

impl FullReprocessReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoPreviousPass => "no previous pass",
            Self::CheckpointCountChanged => "checkpoint count changed",
            Self::ApertureCoefficientChanged => "aperture coefficient changed",
            Self::PrincipalChanged => "principal spectrum changed",
            Self::PrincipalMoved => "principal rectangle changed",
        }
    }
}

/// Ids of the spectra a pass has to extract again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReprocessPlan {
    pub full: Option<FullReprocessReason>,
    pub reprocess: BTreeSet<String>,
}

impl ReprocessPlan {
    pub fn needs(&self, id: &str) -> bool {
        self.reprocess.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.reprocess.is_empty()
    }
}

pub fn full_reprocess_reason(
    previous: Option<&RecalculationSnapshot>,
    principal: &Rectangle,
    settings: &ExtractionSettings,
) -> Option<FullReprocessReason> {
    let Some(previous) = previous else {
        return Some(FullReprocessReason::NoPreviousPass);
    };
    if previous.checkpoint_count != settings.checkpoint_count {
        return Some(FullReprocessReason::CheckpointCountChanged);
    }
    if previous.aperture_coefficient != settings.aperture_coefficient {
        return Some(FullReprocessReason::ApertureCoefficientChanged);
    }
    if previous.principal_id != principal.id {
        return Some(FullReprocessReason::PrincipalChanged);
    }
    match previous.rectangle(&principal.id) {
        Some(before) if before.same_geometry(principal) => None,
        _ => Some(FullReprocessReason::PrincipalMoved),
    }
}

/// Decide which spectra need extracting.
///
/// Without a full reprocess, a spectrum is reprocessed when it is new, its
/// rectangle moved or resized, or the cache holds nothing for it.
pub fn plan_reprocess(
    previous: Option<&RecalculationSnapshot>,
    rectangles: &[Rectangle],
    principal: &Rectangle,
    settings: &ExtractionSettings,
    cache: &AnalysisCache,
) -> ReprocessPlan {
    let full = full_reprocess_reason(previous, principal, settings);
    let reprocess = rectangles
        .iter()
        .filter(|rectangle| {
            full.is_some()
                || !cache.contains(&rectangle.id)
                || previous
                    .and_then(|snapshot| snapshot.rectangle(&rectangle.id))
                    .is_none_or(|before| !before.same_geometry(rectangle))
        })
        .map(|rectangle| rectangle.id.clone())
        .collect();

    ReprocessPlan { full, reprocess }
}
