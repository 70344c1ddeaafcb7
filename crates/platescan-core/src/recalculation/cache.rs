use crate::domain::Rectangle;
use crate::extraction::SpectrumTrace;
use crate::raster::MaskPatch;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Everything a later pass needs to skip re-extracting one spectrum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisCacheEntry {
    pub id: String,
    pub rectangle: Rectangle,
    pub trace: SpectrumTrace,
    pub mask_patch: MaskPatch,
}

impl AnalysisCacheEntry {
    pub fn new(rectangle: Rectangle, trace: SpectrumTrace) -> Self {
        let mask_patch = trace.mask_patch();
        Self {
            id: rectangle.id.clone(),
            rectangle,
            trace,
            mask_patch,
        }
    }
}

/// Per-session store of extracted traces, keyed by spectrum id.
///
/// Entries are shared, so carrying unchanged spectra into the next cache
/// only bumps reference counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<AnalysisCacheEntry>", into = "Vec<AnalysisCacheEntry>")]
pub struct AnalysisCache {
    entries: BTreeMap<String, Arc<AnalysisCacheEntry>>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<AnalysisCacheEntry>> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Arc<AnalysisCacheEntry>> {
        self.entries.values()
    }

    /// Replaces any previous entry with the same id.
    pub fn insert(&mut self, entry: Arc<AnalysisCacheEntry>) {
        self.entries.insert(entry.id.clone(), entry);
    }

    /// Drops every entry whose id is not in `live_ids`.
    pub fn evict_missing<'a>(&mut self, live_ids: impl IntoIterator<Item = &'a str>) {
        let live: HashSet<&str> = live_ids.into_iter().collect();
        self.entries.retain(|id, _| live.contains(id.as_str()));
    }
}

impl From<Vec<AnalysisCacheEntry>> for AnalysisCache {
    fn from(entries: Vec<AnalysisCacheEntry>) -> Self {
        let mut cache = Self::new();
        for entry in entries {
            cache.insert(Arc::new(entry));
        }
        cache
    }
}

impl From<AnalysisCache> for Vec<AnalysisCacheEntry> {
    fn from(cache: AnalysisCache) -> Self {
        cache
            .entries
            .into_values()
            .map(Arc::unwrap_or_clone)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{AnalysisCache, AnalysisCacheEntry};
    use crate::domain::Rectangle;
    use crate::extraction::{MediaFunction, SpectrumTrace};
    use crate::numerics::fitting::{FittedCurve, LinearFit};
    use std::sync::Arc;

    fn entry(id: &str) -> AnalysisCacheEntry {
        let trace = SpectrumTrace {
            media_points: Vec::new(),
            media_function: MediaFunction::Fitted {
                curve: FittedCurve::Linear(LinearFit {
                    slope: 0.0,
                    intercept: 2.0,
                }),
            },
            avg_opening: 2.0,
            transversal_averages: vec![1.0, 2.0, 3.0],
            width: 3,
            height: 5,
        };
        AnalysisCacheEntry::new(Rectangle::lamp(id, 0.0, 0.0, 3.0, 5.0), trace)
    }

    #[test]
    fn entry_derives_its_mask_patch_from_the_trace() {
        let entry = entry("l");
        assert_eq!(entry.id, "l");
        assert_eq!(entry.mask_patch.bands(), [(1, 3); 3]);
    }

    #[test]
    fn insert_replaces_entries_with_the_same_id() {
        let mut cache = AnalysisCache::new();
        cache.insert(Arc::new(entry("a")));
        let mut replacement = entry("a");
        replacement.trace.avg_opening = 4.0;
        cache.insert(Arc::new(replacement));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").expect("entry").trace.avg_opening, 4.0);
    }

    #[test]
    fn eviction_keeps_only_live_ids() {
        let mut cache = AnalysisCache::new();
        for id in ["a", "b", "c"] {
            cache.insert(Arc::new(entry(id)));
        }
        cache.evict_missing(["c", "a", "z"]);

        assert_eq!(cache.ids().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn cache_serializes_as_an_entry_list() {
        let mut cache = AnalysisCache::new();
        cache.insert(Arc::new(entry("b")));
        cache.insert(Arc::new(entry("a")));

        let value = serde_json::to_value(&cache).expect("serialize");
        let ids: Vec<&str> = value
            .as_array()
            .expect("array")
            .iter()
            .map(|entry| entry["id"].as_str().expect("id"))
            .collect();
        assert_eq!(ids, ["a", "b"]);

        let decoded: AnalysisCache = serde_json::from_value(value).expect("deserialize");
        assert_eq!(decoded.len(), 2);
        assert!(decoded.contains("b"));
    }
}
