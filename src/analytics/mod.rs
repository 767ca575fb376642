//! Pairwise return analytics.
//!
//! This module turns paired return observations into covariance and
//! correlation summaries with a statistical confidence estimate.
//!
//! # Overview
//!
//! - **Covariance summary**: sample covariance, variances, correlation,
//!   standard error of the correlation and a significance flag
//! - **Exponential weighting**: optional decay so recent observations
//!   dominate the estimate
//! - **Rolling windows**: a lazy, restartable sequence of summaries over
//!   fixed-size windows of the history
//!
//! # Example
//!
//! ```rust
//! use covariance_hedge_rs::analytics::{
//!     CovarianceConfig, HistoricalDataPoint, calculate_covariance_matrix,
//! };
//! use covariance_hedge_rs::dec;
//!
//! let data = vec![
//!     HistoricalDataPoint::new(1, dec!(0.01), dec!(0.02)),
//!     HistoricalDataPoint::new(2, dec!(0.02), dec!(0.03)),
//!     HistoricalDataPoint::new(3, dec!(-0.01), dec!(-0.01)),
//! ];
//!
//! let result = calculate_covariance_matrix(&data, &CovarianceConfig::default()).unwrap();
//! assert_eq!(result.sample_size, 3);
//! assert!(!result.is_significant); // far below the default 30 samples
//! ```

/// Pairwise covariance and correlation summary.
pub mod covariance;

/// Rolling-window covariance.
pub mod rolling;

pub use covariance::{
    CovarianceConfig, CovarianceMatrixResult, HistoricalDataPoint, calculate_covariance_matrix,
};
pub use rolling::{
    RollingCovariance, RollingCovarianceIter, RollingWindow, calculate_rolling_covariance,
};
