//! Hedging and multi-asset risk decomposition.
//!
//! This module turns covariance summaries into hedge recommendations and
//! extends the analysis to portfolios of more than two markets.
//!
//! # Overview
//!
//! A position in one instrument can be hedged with a correlated second
//! instrument. This module provides:
//!
//! - **Minimum-Variance Hedge**: the ratio `cov / var₂` that minimizes the
//!   variance of the hedged position
//! - **Preference Adjustment**: risk aversion and transaction costs applied
//!   on top of the minimum-variance ratio
//! - **Portfolio Matrices**: N×N covariance and correlation matrices with
//!   eigenvalues for principal-component reporting
//!
//! # Example
//!
//! ```rust
//! use covariance_hedge_rs::analytics::{
//!     CovarianceConfig, HistoricalDataPoint, calculate_covariance_matrix,
//! };
//! use covariance_hedge_rs::risk::{HedgeConfig, calculate_optimal_hedge_ratio};
//! use covariance_hedge_rs::dec;
//!
//! let data = vec![
//!     HistoricalDataPoint::new(1, dec!(0.010), dec!(0.008)),
//!     HistoricalDataPoint::new(2, dec!(-0.006), dec!(-0.004)),
//!     HistoricalDataPoint::new(3, dec!(0.004), dec!(0.005)),
//!     HistoricalDataPoint::new(4, dec!(-0.002), dec!(-0.003)),
//! ];
//!
//! let covariance = calculate_covariance_matrix(&data, &CovarianceConfig::default()).unwrap();
//! let hedge = calculate_optimal_hedge_ratio(&covariance, &HedgeConfig::default()).unwrap();
//!
//! // Hedging never increases variance at the minimum-variance ratio
//! assert!(hedge.risk_reduction >= dec!(0));
//! assert_eq!(hedge.optimal_hedge_ratio, hedge.min_variance_hedge_ratio);
//! ```

mod hedge;

/// Multi-asset covariance and correlation matrices.
pub mod portfolio;

pub use hedge::{HedgeConfig, HedgeRatioResult, calculate_optimal_hedge_ratio, hedged_variance};
pub use portfolio::{
    AssetId, CorrelationMatrix, CovarianceMatrix, MarketSeries, PortfolioCovarianceResult,
    calculate_portfolio_covariance,
};
