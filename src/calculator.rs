//! Stateless service bundling covariance and hedge configuration.
//!
//! [`CovarianceHedgeCalculator`] carries no state between calls: each
//! operation reads its input and allocates a fresh result, so one instance
//! can be shared freely across threads.
//!
//! # Example
//!
//! ```rust
//! use covariance_hedge_rs::calculator::CovarianceHedgeCalculator;
//! use covariance_hedge_rs::analytics::CovarianceConfig;
//! use covariance_hedge_rs::risk::HedgeConfig;
//! use covariance_hedge_rs::synthetic::SyntheticPairGenerator;
//! use covariance_hedge_rs::dec;
//!
//! let calculator = CovarianceHedgeCalculator::new(
//!     CovarianceConfig::new(dec!(0.95), 50, false).unwrap(),
//!     HedgeConfig::new(dec!(0.6), dec!(0.001)).unwrap(),
//! )
//! .unwrap();
//!
//! let data = SyntheticPairGenerator::new(dec!(0.8))
//!     .unwrap()
//!     .with_seed(7)
//!     .generate(250)
//!     .unwrap();
//!
//! let analysis = calculator.analyze_pair(&data).unwrap();
//! assert!(analysis.is_actionable());
//! assert!(analysis.hedge.risk_reduction > dec!(0.4));
//! ```

use crate::analytics::covariance::{
    CovarianceConfig, CovarianceMatrixResult, HistoricalDataPoint, calculate_covariance_matrix,
};
use crate::analytics::rolling::{RollingCovariance, calculate_rolling_covariance};
use crate::risk::portfolio::{
    MarketSeries, PortfolioCovarianceResult, calculate_portfolio_covariance,
};
use crate::risk::{HedgeConfig, HedgeRatioResult, calculate_optimal_hedge_ratio};
use crate::types::error::HedgeResult;
use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Covariance summary and hedge recommendation for one pair.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PairAnalysis {
    /// Covariance summary of the pair.
    pub covariance: CovarianceMatrixResult,
    /// Hedge recommendation derived from the summary.
    pub hedge: HedgeRatioResult,
}

impl PairAnalysis {
    /// True when the underlying estimate is statistically significant.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        self.covariance.is_significant
    }
}

/// Covariance and hedge-ratio calculator.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CovarianceHedgeCalculator {
    covariance_config: CovarianceConfig,
    hedge_config: HedgeConfig,
}

impl CovarianceHedgeCalculator {
    /// Creates a calculator from validated configurations.
    ///
    /// # Errors
    ///
    /// Returns `HedgeError::InvalidConfiguration` if either config is invalid.
    pub fn new(
        covariance_config: CovarianceConfig,
        hedge_config: HedgeConfig,
    ) -> HedgeResult<Self> {
        covariance_config.validate()?;
        hedge_config.validate()?;
        Ok(Self {
            covariance_config,
            hedge_config,
        })
    }

    /// Replaces the covariance configuration.
    ///
    /// # Errors
    ///
    /// Returns `HedgeError::InvalidConfiguration` if `config` is invalid.
    pub fn with_covariance_config(mut self, config: CovarianceConfig) -> HedgeResult<Self> {
        config.validate()?;
        self.covariance_config = config;
        Ok(self)
    }

    /// Replaces the hedge configuration.
    ///
    /// # Errors
    ///
    /// Returns `HedgeError::InvalidConfiguration` if `config` is invalid.
    pub fn with_hedge_config(mut self, config: HedgeConfig) -> HedgeResult<Self> {
        config.validate()?;
        self.hedge_config = config;
        Ok(self)
    }

    /// Returns the covariance configuration.
    #[must_use]
    pub fn covariance_config(&self) -> &CovarianceConfig {
        &self.covariance_config
    }

    /// Returns the hedge configuration.
    #[must_use]
    pub fn hedge_config(&self) -> &HedgeConfig {
        &self.hedge_config
    }

    /// See [`calculate_covariance_matrix`].
    pub fn calculate_covariance_matrix(
        &self,
        data: &[HistoricalDataPoint],
    ) -> HedgeResult<CovarianceMatrixResult> {
        calculate_covariance_matrix(data, &self.covariance_config)
    }

    /// See [`calculate_optimal_hedge_ratio`].
    pub fn calculate_optimal_hedge_ratio(
        &self,
        covariance: &CovarianceMatrixResult,
    ) -> HedgeResult<HedgeRatioResult> {
        calculate_optimal_hedge_ratio(covariance, &self.hedge_config)
    }

    /// See [`calculate_rolling_covariance`].
    pub fn calculate_rolling_covariance<'a>(
        &self,
        data: &'a [HistoricalDataPoint],
        window_size: usize,
        step_size: usize,
    ) -> HedgeResult<RollingCovariance<'a>> {
        calculate_rolling_covariance(data, window_size, step_size, &self.covariance_config)
    }

    /// See [`calculate_portfolio_covariance`].
    pub fn calculate_portfolio_covariance(
        &self,
        markets: &[MarketSeries],
    ) -> HedgeResult<PortfolioCovarianceResult> {
        calculate_portfolio_covariance(markets)
    }

    /// Computes the covariance summary and the hedge recommendation in one
    /// call.
    ///
    /// A low-confidence estimate is still returned; check
    /// [`PairAnalysis::is_actionable`] before acting on it.
    ///
    /// # Errors
    ///
    /// Propagates `InsufficientData` and `DegenerateVariance` from the
    /// underlying calculations.
    pub fn analyze_pair(&self, data: &[HistoricalDataPoint]) -> HedgeResult<PairAnalysis> {
        let covariance = self.calculate_covariance_matrix(data)?;
        let hedge = self.calculate_optimal_hedge_ratio(&covariance)?;

        if covariance.is_low_confidence() {
            warn!(
                sample_size = covariance.sample_size,
                confidence = %covariance.confidence,
                "hedge recommendation based on a low-confidence estimate"
            );
        }

        Ok(PairAnalysis { covariance, hedge })
    }
}
