//! Minimum-variance hedge ratio optimization.
//!
//! A position long one unit of instrument 1 and short `h` units of
//! instrument 2 has variance
//!
//! ```text
//! σ²(h) = σ₁² + h²σ₂² − 2h·cov
//! ```
//!
//! which is minimized at `h* = cov / σ₂²`. At that ratio the variance
//! reduction versus the unhedged position equals `ρ²`.
//!
//! The recommended ratio adjusts `h*` for the hedger's preferences:
//!
//! - `risk_aversion` below 0.5 shrinks the ratio towards no hedge, above 0.5
//!   pulls it towards a full one-for-one hedge; at exactly 0.5 it is `h*`
//! - `transaction_costs` scale the ratio down by `(1 − costs)`
//! - the result is clamped to `±max_abs_hedge_ratio`

use crate::Decimal;
use crate::analytics::covariance::CovarianceMatrixResult;
use crate::types::decimal::{
    checked_add, checked_div, checked_mul, checked_sub, clamp, clamp_unit, decimal_sqrt,
};
use crate::types::error::{HedgeError, HedgeResult};
use rust_decimal_macros::dec;
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Options for [`calculate_optimal_hedge_ratio`].
///
/// # Example
///
/// ```rust
/// use covariance_hedge_rs::risk::HedgeConfig;
/// use covariance_hedge_rs::dec;
///
/// let config = HedgeConfig::new(dec!(0.7), dec!(0.001))
///     .unwrap()
///     .with_target_risk_reduction(dec!(0.6))
///     .unwrap();
/// assert_eq!(config.target_risk_reduction, Some(dec!(0.6)));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HedgeConfig {
    /// Preference for risk reduction in \[0, 1\]; 0.5 is neutral.
    pub risk_aversion: Decimal,

    /// Proportional cost of carrying the hedge in \[0, 1\].
    pub transaction_costs: Decimal,

    /// Desired variance reduction in \[0, 1\], used for the efficiency score.
    pub target_risk_reduction: Option<Decimal>,

    /// Bound on the absolute hedge ratio to avoid pathological leverage.
    pub max_abs_hedge_ratio: Decimal,
}

impl Default for HedgeConfig {
    fn default() -> Self {
        Self {
            risk_aversion: dec!(0.5),
            transaction_costs: Decimal::ZERO,
            target_risk_reduction: None,
            max_abs_hedge_ratio: Decimal::TWO,
        }
    }
}

impl HedgeConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `HedgeError::InvalidConfiguration` if `risk_aversion` or
    /// `transaction_costs` is outside \[0, 1\].
    pub fn new(risk_aversion: Decimal, transaction_costs: Decimal) -> HedgeResult<Self> {
        let config = Self {
            risk_aversion,
            transaction_costs,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the target risk reduction used to score hedge efficiency.
    ///
    /// # Errors
    ///
    /// Returns `HedgeError::InvalidConfiguration` if `target` is outside
    /// \[0, 1\].
    pub fn with_target_risk_reduction(mut self, target: Decimal) -> HedgeResult<Self> {
        self.target_risk_reduction = Some(target);
        self.validate()?;
        Ok(self)
    }

    /// Sets the bound on the absolute hedge ratio.
    ///
    /// # Errors
    ///
    /// Returns `HedgeError::InvalidConfiguration` if `max` is not positive.
    pub fn with_max_abs_hedge_ratio(mut self, max: Decimal) -> HedgeResult<Self> {
        self.max_abs_hedge_ratio = max;
        self.validate()?;
        Ok(self)
    }

    /// Checks every field against its valid range.
    ///
    /// # Errors
    ///
    /// Returns `HedgeError::InvalidConfiguration` describing the first
    /// invalid field.
    pub fn validate(&self) -> HedgeResult<()> {
        if self.risk_aversion < Decimal::ZERO || self.risk_aversion > Decimal::ONE {
            return Err(HedgeError::InvalidConfiguration(format!(
                "risk_aversion must be in [0, 1], got {}",
                self.risk_aversion
            )));
        }

        if self.transaction_costs < Decimal::ZERO || self.transaction_costs > Decimal::ONE {
            return Err(HedgeError::InvalidConfiguration(format!(
                "transaction_costs must be in [0, 1], got {}",
                self.transaction_costs
            )));
        }

        if let Some(target) = self.target_risk_reduction {
            if target < Decimal::ZERO || target > Decimal::ONE {
                return Err(HedgeError::InvalidConfiguration(format!(
                    "target_risk_reduction must be in [0, 1], got {}",
                    target
                )));
            }
        }

        if self.max_abs_hedge_ratio <= Decimal::ZERO {
            return Err(HedgeError::InvalidConfiguration(format!(
                "max_abs_hedge_ratio must be positive, got {}",
                self.max_abs_hedge_ratio
            )));
        }

        Ok(())
    }
}

/// Hedge recommendation derived from a covariance summary.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HedgeRatioResult {
    /// Recommended units of instrument 2 to short per unit of instrument 1.
    pub optimal_hedge_ratio: Decimal,
    /// Ratio minimizing the combined variance, `cov / var2`.
    pub min_variance_hedge_ratio: Decimal,
    /// Variance reduction at the recommended ratio, in \[0, 1\].
    pub risk_reduction: Decimal,
    /// Variance reduction at the minimum-variance ratio (equals `ρ²`).
    pub min_variance_risk_reduction: Decimal,
    /// Variance of the hedged position at the recommended ratio.
    pub hedged_variance: Decimal,
    /// Expected return of the hedged position, `mean1 − h·mean2`.
    pub expected_hedge_return: Decimal,
    /// Share of the targeted risk reduction achieved, in \[0, 1\].
    pub hedge_efficiency: Decimal,
    /// Covariance confidence discounted by transaction costs.
    pub confidence: Decimal,
}

impl HedgeRatioResult {
    /// Standard deviation of the hedged position.
    pub fn residual_volatility(&self) -> HedgeResult<Decimal> {
        decimal_sqrt(self.hedged_variance)
    }

    /// Serializes the result to a JSON string.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> HedgeResult<String> {
        serde_json::to_string(self).map_err(|e| HedgeError::Serialization(e.to_string()))
    }
}

/// Variance of a position long instrument 1 and short `hedge_ratio` units
/// of instrument 2.
///
/// Floored at zero to absorb rounding on near-perfect hedges.
///
/// # Errors
///
/// Returns `HedgeError::NumericalError` if the variance overflows `Decimal`.
pub fn hedged_variance(
    covariance: &CovarianceMatrixResult,
    hedge_ratio: Decimal,
) -> HedgeResult<Decimal> {
    let hedge_leg = checked_mul(hedge_ratio, checked_mul(hedge_ratio, covariance.variance2)?)?;
    let cross = checked_mul(Decimal::TWO, checked_mul(hedge_ratio, covariance.covariance)?)?;
    let variance = checked_sub(checked_add(covariance.variance1, hedge_leg)?, cross)?;
    Ok(variance.max(Decimal::ZERO))
}

/// Computes the hedge recommendation for a covariance summary.
///
/// # Arguments
///
/// * `covariance` - Summary of the instrument (1) and hedge (2) returns
/// * `config` - Risk preferences and costs
///
/// # Errors
///
/// - `HedgeError::DegenerateVariance` if the hedge instrument has zero variance
/// - `HedgeError::InvalidConfiguration` if `config` is invalid
///
/// # Example
///
/// ```rust
/// use covariance_hedge_rs::analytics::{
///     CovarianceConfig, HistoricalDataPoint, calculate_covariance_matrix,
/// };
/// use covariance_hedge_rs::risk::{HedgeConfig, calculate_optimal_hedge_ratio};
/// use covariance_hedge_rs::dec;
///
/// let data = vec![
///     HistoricalDataPoint::new(1, dec!(0.02), dec!(0.01)),
///     HistoricalDataPoint::new(2, dec!(0.04), dec!(0.02)),
///     HistoricalDataPoint::new(3, dec!(0.00), dec!(0.00)),
/// ];
/// let covariance = calculate_covariance_matrix(&data, &CovarianceConfig::default()).unwrap();
/// let hedge = calculate_optimal_hedge_ratio(&covariance, &HedgeConfig::default()).unwrap();
///
/// assert_eq!(hedge.min_variance_hedge_ratio, dec!(2));
/// assert_eq!(hedge.optimal_hedge_ratio, dec!(2));
/// assert_eq!(hedge.risk_reduction, dec!(1));
/// ```
pub fn calculate_optimal_hedge_ratio(
    covariance: &CovarianceMatrixResult,
    config: &HedgeConfig,
) -> HedgeResult<HedgeRatioResult> {
    config.validate()?;

    if covariance.variance2 <= Decimal::ZERO {
        warn!(
            sample_size = covariance.sample_size,
            "hedge instrument has zero variance, no hedge ratio exists"
        );
        return Err(HedgeError::DegenerateVariance(
            "hedge instrument (market 2) has zero variance".to_string(),
        ));
    }

    let min_variance_hedge_ratio = checked_div(covariance.covariance, covariance.variance2)?;
    let optimal_hedge_ratio = blend_hedge_ratio(min_variance_hedge_ratio, config);

    let hedged = hedged_variance(covariance, optimal_hedge_ratio)?;
    let risk_reduction = risk_reduction(covariance, hedged);
    let min_variance_risk_reduction = risk_reduction_at(covariance, min_variance_hedge_ratio)?;

    let expected_hedge_return = covariance.mean1 - optimal_hedge_ratio * covariance.mean2;

    let hedge_efficiency = match config.target_risk_reduction {
        Some(target) if target > Decimal::ZERO => clamp_unit(risk_reduction / target),
        _ => risk_reduction,
    };

    let confidence =
        clamp_unit(covariance.confidence * (Decimal::ONE - config.transaction_costs));

    debug!(
        min_variance_hedge_ratio = %min_variance_hedge_ratio,
        optimal_hedge_ratio = %optimal_hedge_ratio,
        risk_reduction = %risk_reduction,
        "computed hedge ratio"
    );

    Ok(HedgeRatioResult {
        optimal_hedge_ratio,
        min_variance_hedge_ratio,
        risk_reduction,
        min_variance_risk_reduction,
        hedged_variance: hedged,
        expected_hedge_return,
        hedge_efficiency,
        confidence,
    })
}

/// Applies risk aversion, transaction costs and the leverage bound.
fn blend_hedge_ratio(min_variance_ratio: Decimal, config: &HedgeConfig) -> Decimal {
    let half = dec!(0.5);

    let risk_adjusted = if config.risk_aversion <= half {
        // 0 → unhedged, 0.5 → minimum variance
        min_variance_ratio * (Decimal::TWO * config.risk_aversion)
    } else {
        // 0.5 → minimum variance, 1 → full one-for-one hedge
        let full_hedge = if min_variance_ratio.is_zero() {
            Decimal::ZERO
        } else if min_variance_ratio.is_sign_negative() {
            Decimal::NEGATIVE_ONE
        } else {
            Decimal::ONE
        };
        let pull = Decimal::TWO * config.risk_aversion - Decimal::ONE;
        min_variance_ratio + pull * (full_hedge - min_variance_ratio)
    };

    let cost_adjusted = risk_adjusted * (Decimal::ONE - config.transaction_costs);

    clamp(
        cost_adjusted,
        -config.max_abs_hedge_ratio,
        config.max_abs_hedge_ratio,
    )
}

fn risk_reduction(covariance: &CovarianceMatrixResult, hedged: Decimal) -> Decimal {
    if covariance.variance1 <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    clamp_unit(Decimal::ONE - hedged / covariance.variance1)
}

fn risk_reduction_at(
    covariance: &CovarianceMatrixResult,
    hedge_ratio: Decimal,
) -> HedgeResult<Decimal> {
    Ok(risk_reduction(covariance, hedged_variance(covariance, hedge_ratio)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(
        covariance: Decimal,
        variance1: Decimal,
        variance2: Decimal,
    ) -> CovarianceMatrixResult {
        CovarianceMatrixResult {
            covariance,
            variance1,
            variance2,
            correlation: Decimal::ZERO,
            mean1: dec!(0.001),
            mean2: dec!(0.0008),
            sample_size: 100,
            effective_sample_size: dec!(100),
            standard_error: dec!(0.05),
            confidence: dec!(0.9),
            is_significant: false,
        }
    }

    // ρ = 0.5, h* = 0.5, ρ² = 0.25
    fn half_correlated() -> CovarianceMatrixResult {
        summary(dec!(0.0002), dec!(0.0004), dec!(0.0004))
    }

    // HedgeConfig tests
    #[test]
    fn test_config_default() {
        let config = HedgeConfig::default();
        assert_eq!(config.risk_aversion, dec!(0.5));
        assert_eq!(config.transaction_costs, Decimal::ZERO);
        assert_eq!(config.target_risk_reduction, None);
        assert_eq!(config.max_abs_hedge_ratio, dec!(2));
    }

    #[test]
    fn test_config_validation() {
        assert!(HedgeConfig::new(dec!(-0.1), dec!(0)).is_err());
        assert!(HedgeConfig::new(dec!(1.1), dec!(0)).is_err());
        assert!(HedgeConfig::new(dec!(0.5), dec!(-0.01)).is_err());
        assert!(HedgeConfig::new(dec!(0.5), dec!(1.5)).is_err());
        assert!(
            HedgeConfig::default()
                .with_target_risk_reduction(dec!(1.2))
                .is_err()
        );
        assert!(
            HedgeConfig::default()
                .with_max_abs_hedge_ratio(dec!(0))
                .is_err()
        );
        assert!(HedgeConfig::new(dec!(1), dec!(1)).is_ok());
    }

    // calculate_optimal_hedge_ratio tests
    #[test]
    fn test_textbook_ratio_with_defaults() {
        let result =
            calculate_optimal_hedge_ratio(&half_correlated(), &HedgeConfig::default()).unwrap();

        assert_eq!(result.min_variance_hedge_ratio, dec!(0.5));
        assert_eq!(result.optimal_hedge_ratio, dec!(0.5));
        // σ²(0.5) = 0.0004 + 0.25 × 0.0004 − 2 × 0.5 × 0.0002 = 0.0003
        assert_eq!(result.hedged_variance, dec!(0.0003));
        assert_eq!(result.risk_reduction, dec!(0.25));
        assert_eq!(result.min_variance_risk_reduction, dec!(0.25));
        assert_eq!(result.hedge_efficiency, dec!(0.25));
        assert_eq!(result.confidence, dec!(0.9));
        // 0.001 − 0.5 × 0.0008
        assert_eq!(result.expected_hedge_return, dec!(0.0006));
    }

    #[test]
    fn test_risk_aversion_interpolation() {
        let cov = half_correlated();
        let ratio = |ra: Decimal| {
            let config = HedgeConfig::new(ra, Decimal::ZERO).unwrap();
            calculate_optimal_hedge_ratio(&cov, &config)
                .unwrap()
                .optimal_hedge_ratio
        };

        assert_eq!(ratio(dec!(0)), dec!(0));
        assert_eq!(ratio(dec!(0.25)), dec!(0.25));
        assert_eq!(ratio(dec!(0.5)), dec!(0.5));
        assert_eq!(ratio(dec!(0.75)), dec!(0.75));
        assert_eq!(ratio(dec!(1)), dec!(1));
    }

    #[test]
    fn test_unhedged_has_no_risk_reduction() {
        let config = HedgeConfig::new(dec!(0), dec!(0)).unwrap();
        let result = calculate_optimal_hedge_ratio(&half_correlated(), &config).unwrap();

        assert_eq!(result.optimal_hedge_ratio, Decimal::ZERO);
        assert_eq!(result.risk_reduction, Decimal::ZERO);
        assert_eq!(result.expected_hedge_return, dec!(0.001));
        // The minimum-variance benchmark is unaffected by preferences
        assert_eq!(result.min_variance_risk_reduction, dec!(0.25));
    }

    #[test]
    fn test_negative_correlation_full_hedge() {
        let cov = summary(dec!(-0.0002), dec!(0.0004), dec!(0.0004));
        let config = HedgeConfig::new(dec!(1), dec!(0)).unwrap();
        let result = calculate_optimal_hedge_ratio(&cov, &config).unwrap();

        assert_eq!(result.min_variance_hedge_ratio, dec!(-0.5));
        assert_eq!(result.optimal_hedge_ratio, dec!(-1));
    }

    #[test]
    fn test_transaction_costs_shrink_ratio_and_confidence() {
        let config = HedgeConfig::new(dec!(0.5), dec!(0.1)).unwrap();
        let result = calculate_optimal_hedge_ratio(&half_correlated(), &config).unwrap();

        assert_eq!(result.optimal_hedge_ratio, dec!(0.45));
        assert_eq!(result.min_variance_hedge_ratio, dec!(0.5));
        assert_eq!(result.confidence, dec!(0.81));
        assert!(result.risk_reduction < result.min_variance_risk_reduction);
    }

    #[test]
    fn test_ratio_clamped() {
        // ρ ≈ 0.95, h* = 3
        let cov = summary(dec!(0.003), dec!(0.01), dec!(0.001));
        let result = calculate_optimal_hedge_ratio(&cov, &HedgeConfig::default()).unwrap();

        assert_eq!(result.min_variance_hedge_ratio, dec!(3));
        assert_eq!(result.optimal_hedge_ratio, dec!(2));

        let wide = HedgeConfig::default()
            .with_max_abs_hedge_ratio(dec!(5))
            .unwrap();
        let result = calculate_optimal_hedge_ratio(&cov, &wide).unwrap();
        assert_eq!(result.optimal_hedge_ratio, dec!(3));
    }

    #[test]
    fn test_degenerate_variance() {
        let cov = summary(dec!(0), dec!(0.0004), dec!(0));
        let result = calculate_optimal_hedge_ratio(&cov, &HedgeConfig::default());

        assert!(matches!(result, Err(HedgeError::DegenerateVariance(_))));
    }

    #[test]
    fn test_zero_variance_target_instrument() {
        let cov = summary(dec!(0), dec!(0), dec!(0.0004));
        let result = calculate_optimal_hedge_ratio(&cov, &HedgeConfig::default()).unwrap();

        assert_eq!(result.min_variance_hedge_ratio, Decimal::ZERO);
        assert_eq!(result.risk_reduction, Decimal::ZERO);
    }

    #[test]
    fn test_hedge_efficiency_against_target() {
        let cov = half_correlated();

        let config = HedgeConfig::default()
            .with_target_risk_reduction(dec!(0.5))
            .unwrap();
        let result = calculate_optimal_hedge_ratio(&cov, &config).unwrap();
        assert_eq!(result.hedge_efficiency, dec!(0.5));

        let easy = HedgeConfig::default()
            .with_target_risk_reduction(dec!(0.2))
            .unwrap();
        let result = calculate_optimal_hedge_ratio(&cov, &easy).unwrap();
        assert_eq!(result.hedge_efficiency, Decimal::ONE);

        let zero_target = HedgeConfig::default()
            .with_target_risk_reduction(dec!(0))
            .unwrap();
        let result = calculate_optimal_hedge_ratio(&cov, &zero_target).unwrap();
        assert_eq!(result.hedge_efficiency, result.risk_reduction);
    }

    #[test]
    fn test_min_variance_property() {
        let cov = half_correlated();
        let result = calculate_optimal_hedge_ratio(&cov, &HedgeConfig::default()).unwrap();
        let h = result.min_variance_hedge_ratio;

        let at_min = hedged_variance(&cov, h).unwrap();
        assert!(at_min <= hedged_variance(&cov, h + dec!(0.1)).unwrap());
        assert!(at_min <= hedged_variance(&cov, h - dec!(0.1)).unwrap());
    }

    #[test]
    fn test_residual_volatility() {
        let result =
            calculate_optimal_hedge_ratio(&half_correlated(), &HedgeConfig::default()).unwrap();
        let vol = result.residual_volatility().unwrap();

        assert!((vol * vol - dec!(0.0003)).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_hedged_variance_floor() {
        // Perfect hedge: σ²(1) = 0
        let cov = summary(dec!(0.0004), dec!(0.0004), dec!(0.0004));
        assert_eq!(hedged_variance(&cov, Decimal::ONE).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_extreme_summary_reports_overflow() {
        // h* ≈ 9.2e27 and h*² · var2 is far outside the Decimal range
        let large = Decimal::from(i64::MAX);
        let cov = summary(large, large, dec!(0.000000001));
        let result = calculate_optimal_hedge_ratio(&cov, &HedgeConfig::default());
        assert!(matches!(result, Err(HedgeError::NumericalError(_))));

        let unrepresentable = summary(Decimal::MAX, dec!(1), dec!(0.1));
        let result = calculate_optimal_hedge_ratio(&unrepresentable, &HedgeConfig::default());
        assert!(matches!(result, Err(HedgeError::NumericalError(_))));
    }
}
