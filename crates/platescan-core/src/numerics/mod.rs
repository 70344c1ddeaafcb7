pub mod fitting;
pub mod linalg;

pub use fitting::{CurveFunction, CurveKind, FitError, FittedCurve, fit};
pub use linalg::{DenseMatrix, LuDecomposition, LuError, lu_factorize, lu_solve};
