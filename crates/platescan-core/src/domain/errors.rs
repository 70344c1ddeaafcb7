use crate::numerics::fitting::FitError;
use crate::raster::RasterError;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    InputValidation,
    IoSystem,
    Computation,
    Internal,
}

impl ErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidation => 2,
            Self::IoSystem => 3,
            Self::Computation => 4,
            Self::Internal => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InputValidation => "InputValidationError",
            Self::IoSystem => "IoSystemError",
            Self::Computation => "ComputationError",
            Self::Internal => "InternalError",
        }
    }
}

/// Failures that abort an extraction or recalculation pass.
///
/// None of these carry partial results: a caller that receives one keeps
/// whatever cache and persisted arrays it had before the call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("no rectangle is tagged as the science (principal) spectrum")]
    NoPrincipalSpectrum,
    #[error("only one science spectrum is allowed per group, found {}", .ids.join(", "))]
    MultiplePrincipalSpectra { ids: Vec<String> },
    #[error("spectrum id '{id}' appears more than once")]
    DuplicateSpectrumId { id: String },
    #[error("rectangle '{id}' has a non-finite coordinate or size")]
    NonFiniteRectangle { id: String },
    #[error("rectangle '{id}' does not overlap the {width}x{height} raster")]
    RectangleOutsideRaster { id: String, width: usize, height: usize },
    #[error("invalid extraction setting '{field}': {reason}")]
    InvalidSettings { field: &'static str, reason: String },
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error("centerline fit failed: {0}")]
    Fit(#[from] FitError),
}

impl EngineError {
    pub fn invalid_settings(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSettings {
            field,
            reason: reason.into(),
        }
    }

    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NoPrincipalSpectrum
            | Self::MultiplePrincipalSpectra { .. }
            | Self::DuplicateSpectrumId { .. }
            | Self::NonFiniteRectangle { .. }
            | Self::RectangleOutsideRaster { .. }
            | Self::InvalidSettings { .. }
            | Self::Raster(_) => ErrorCategory::InputValidation,
            Self::Fit(_) => ErrorCategory::Computation,
        }
    }

    pub const fn placeholder(&self) -> &'static str {
        match self {
            Self::NoPrincipalSpectrum => "INPUT.NO_PRINCIPAL",
            Self::MultiplePrincipalSpectra { .. } => "INPUT.MULTIPLE_PRINCIPAL",
            Self::DuplicateSpectrumId { .. } => "INPUT.DUPLICATE_ID",
            Self::NonFiniteRectangle { .. } => "INPUT.RECTANGLE_GEOMETRY",
            Self::RectangleOutsideRaster { .. } => "INPUT.RECTANGLE_BOUNDS",
            Self::InvalidSettings { .. } => "INPUT.SETTINGS",
            Self::Raster(_) => "INPUT.RASTER",
            Self::Fit(_) => "RUN.TRACE_FIT",
        }
    }

    pub const fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder(), self)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}
