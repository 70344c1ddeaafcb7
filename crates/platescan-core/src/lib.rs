pub mod calibration;
pub mod domain;
pub mod extraction;
pub mod geometry;
pub mod numerics;
pub mod raster;
pub mod recalculation;

pub use calibration::{
    CalibrationPointPair, DispersionError, DispersionSummary, FittingError, InferenceFunction,
    InferenceKind, build_inference_function, dispersion_errors, pair_marks,
};
pub use domain::{
    EngineError, EngineResult, ErrorCategory, ExtractionSettings, PixelBounds, Rectangle,
    SpectrumKind, TraceFit,
};
pub use extraction::{SpectrumTrace, extract_trace};
pub use raster::{PixelBuffer, RasterError};
pub use recalculation::{
    AnalysisCache, AnalysisCacheEntry, Recalculation, RecalculationCoordinator,
    RecalculationSnapshot, UpdatedSpectrum, recalculate_spectra,
};
