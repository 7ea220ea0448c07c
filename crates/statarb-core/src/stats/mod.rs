//! Numerical building blocks shared by the pipeline stages.

pub mod adf;
pub mod descriptive;
pub mod regression;

pub use adf::{adf_test, mackinnon_pvalue, AdfResult, CriticalValues};
pub use descriptive::{mean, pearson_correlation, sample_std};
pub use regression::{least_squares, ols_through_origin, ols_with_intercept, LeastSquaresFit, OlsFit};
