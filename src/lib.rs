//! # covariance-hedge-rs
//!
//! Pairwise covariance analysis and minimum-variance hedge ratios for
//! paired return series.
//!
//! Given historical return observations for two instruments, the crate
//! computes sample covariance, correlation, variances and a significance
//! estimate for the correlation, then derives the hedge ratio that minimizes
//! the variance of the combined position. Rolling-window and multi-asset
//! variants are provided for monitoring how the relationship evolves and for
//! principal-component style risk decomposition.
//!
//! # Modules
//!
//! - [`analytics`]: pairwise covariance summaries and rolling windows
//! - [`risk`]: hedge ratio optimization and portfolio covariance matrices
//! - [`calculator`]: stateless service bundling the configuration
//! - [`synthetic`]: seeded generators of correlated return series
//! - [`types`]: error type and checked `Decimal` math
//!
//! # Example
//!
//! ```rust
//! use covariance_hedge_rs::prelude::*;
//!
//! let data = vec![
//!     HistoricalDataPoint::new(1_000, dec!(0.010), dec!(0.012)),
//!     HistoricalDataPoint::new(2_000, dec!(-0.004), dec!(-0.003)),
//!     HistoricalDataPoint::new(3_000, dec!(0.007), dec!(0.009)),
//!     HistoricalDataPoint::new(4_000, dec!(0.002), dec!(0.001)),
//! ];
//!
//! let calculator = CovarianceHedgeCalculator::default();
//! let covariance = calculator.calculate_covariance_matrix(&data).unwrap();
//! let hedge = calculator.calculate_optimal_hedge_ratio(&covariance).unwrap();
//!
//! assert!(covariance.correlation > dec!(0.9));
//! assert!(hedge.risk_reduction > dec!(0.8));
//! ```
//!
//! # Features
//!
//! - `serde`: `Serialize`/`Deserialize` on all configuration and result
//!   types, plus `to_json()` helpers on results.

pub mod analytics;
pub mod calculator;
pub mod risk;
pub mod synthetic;
pub mod types;

pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Commonly used types, re-exported for convenience.
pub mod prelude {
    pub use crate::analytics::covariance::{
        CovarianceConfig, CovarianceMatrixResult, HistoricalDataPoint, calculate_covariance_matrix,
    };
    pub use crate::analytics::rolling::{
        RollingCovariance, RollingWindow, calculate_rolling_covariance,
    };
    pub use crate::calculator::{CovarianceHedgeCalculator, PairAnalysis};
    pub use crate::risk::{
        HedgeConfig, HedgeRatioResult, calculate_optimal_hedge_ratio, hedged_variance,
    };
    pub use crate::risk::portfolio::{
        AssetId, CorrelationMatrix, CovarianceMatrix, MarketSeries, PortfolioCovarianceResult,
        calculate_portfolio_covariance,
    };
    pub use crate::synthetic::SyntheticPairGenerator;
    pub use crate::types::error::{HedgeError, HedgeResult};
    pub use crate::{Decimal, dec};
}
