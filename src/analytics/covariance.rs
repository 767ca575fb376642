//! Pairwise covariance, correlation and significance estimation.
//!
//! # Formulas
//!
//! With equal weights (the default):
//!
//! ```text
//! cov(x, y) = Σ (xᵢ − x̄)(yᵢ − ȳ) / (n − 1)
//! ρ         = cov(x, y) / √(var(x) · var(y))
//! SE(ρ)     = √((1 − ρ²) / (n − 2))
//! ```
//!
//! With exponential weighting, observation `i` (of `n`, last is most recent)
//! gets weight `wᵢ ∝ λ^(n−1−i)`, normalised to sum to one, and the unbiased
//! weighted estimator is used:
//!
//! ```text
//! cov(x, y) = Σ wᵢ (xᵢ − x̄_w)(yᵢ − ȳ_w) / (1 − Σ wᵢ²)
//! ```
//!
//! # Confidence
//!
//! The confidence score is the two-sided significance of the correlation
//! estimate under a normal approximation of `t = ρ / SE(ρ)`:
//!
//! ```text
//! confidence = 2Φ(|t|) − 1 = erf(|t| / √2)
//! ```
//!
//! It grows with sample size and shrinks with standard error, and is
//! bounded to `[0, 1]`.
//!
//! `n` in `SE(ρ)` and in the minimum sample size gate is the effective
//! sample size `1 / Σ wᵢ²`. With equal weights this is the observation
//! count; with exponential weighting it is roughly `(1 + λ) / (1 − λ)` for
//! long histories.

use crate::Decimal;
use crate::types::decimal::{
    checked_add, checked_div, checked_mul, checked_sub, checked_sum, clamp, clamp_unit,
    decimal_norm_cdf, decimal_sqrt,
};
use crate::types::error::{HedgeError, HedgeResult};
use rust_decimal_macros::dec;
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Minimum number of observations for any covariance estimate.
pub const MIN_OBSERVATIONS: usize = 2;

/// Default decay factor for exponential weighting (RiskMetrics daily value).
pub const DEFAULT_DECAY_FACTOR: Decimal = dec!(0.94);

/// A pair of returns for two instruments observed at the same instant.
///
/// Returns are fractional: `0.01` is a 1% move.
///
/// # Example
///
/// ```rust
/// use covariance_hedge_rs::analytics::HistoricalDataPoint;
/// use covariance_hedge_rs::dec;
///
/// let point = HistoricalDataPoint::new(1_700_000_000_000, dec!(0.012), dec!(0.009));
/// assert_eq!(point.swapped().market1_return, dec!(0.009));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistoricalDataPoint {
    /// Observation timestamp in milliseconds.
    pub timestamp: u64,
    /// Return of instrument 1.
    pub market1_return: Decimal,
    /// Return of instrument 2.
    pub market2_return: Decimal,
}

impl HistoricalDataPoint {
    /// Creates a new observation.
    #[must_use]
    pub fn new(timestamp: u64, market1_return: Decimal, market2_return: Decimal) -> Self {
        Self {
            timestamp,
            market1_return,
            market2_return,
        }
    }

    /// Returns the same observation with the two instruments exchanged.
    #[must_use]
    pub fn swapped(&self) -> Self {
        Self {
            timestamp: self.timestamp,
            market1_return: self.market2_return,
            market2_return: self.market1_return,
        }
    }
}

/// Options for [`calculate_covariance_matrix`].
///
/// # Example
///
/// ```rust
/// use covariance_hedge_rs::analytics::CovarianceConfig;
/// use covariance_hedge_rs::dec;
///
/// let config = CovarianceConfig::new(dec!(0.99), 60, false).unwrap();
/// assert_eq!(config.min_sample_size, 60);
///
/// let weighted = CovarianceConfig::default()
///     .with_exponential_weighting(dec!(0.97))
///     .unwrap();
/// assert!(weighted.use_exponential_weighting);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CovarianceConfig {
    /// Confidence required for a result to be significant, in (0, 1).
    pub confidence_level: Decimal,

    /// Minimum sample size for a result to be significant.
    pub min_sample_size: usize,

    /// Weight recent observations more heavily.
    pub use_exponential_weighting: bool,

    /// Per-observation decay λ used when exponential weighting is on.
    pub decay_factor: Decimal,
}

impl Default for CovarianceConfig {
    fn default() -> Self {
        Self {
            confidence_level: dec!(0.95),
            min_sample_size: 30,
            use_exponential_weighting: false,
            decay_factor: DEFAULT_DECAY_FACTOR,
        }
    }
}

impl CovarianceConfig {
    /// Creates a validated configuration using the default decay factor.
    ///
    /// # Errors
    ///
    /// Returns `HedgeError::InvalidConfiguration` if `confidence_level` is not
    /// in (0, 1) or `min_sample_size` is below 2.
    pub fn new(
        confidence_level: Decimal,
        min_sample_size: usize,
        use_exponential_weighting: bool,
    ) -> HedgeResult<Self> {
        let config = Self {
            confidence_level,
            min_sample_size,
            use_exponential_weighting,
            decay_factor: DEFAULT_DECAY_FACTOR,
        };
        config.validate()?;
        Ok(config)
    }

    /// Enables exponential weighting with the given decay factor.
    ///
    /// # Errors
    ///
    /// Returns `HedgeError::InvalidConfiguration` if `decay_factor` is not in
    /// (0, 1).
    pub fn with_exponential_weighting(mut self, decay_factor: Decimal) -> HedgeResult<Self> {
        self.use_exponential_weighting = true;
        self.decay_factor = decay_factor;
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
        if self.confidence_level <= Decimal::ZERO || self.confidence_level >= Decimal::ONE {
            return Err(HedgeError::InvalidConfiguration(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }

        if self.min_sample_size < MIN_OBSERVATIONS {
            return Err(HedgeError::InvalidConfiguration(format!(
                "min_sample_size must be at least {}, got {}",
                MIN_OBSERVATIONS, self.min_sample_size
            )));
        }

        if self.decay_factor <= Decimal::ZERO || self.decay_factor >= Decimal::ONE {
            return Err(HedgeError::InvalidConfiguration(format!(
                "decay_factor must be in (0, 1), got {}",
                self.decay_factor
            )));
        }

        Ok(())
    }
}

/// Covariance and correlation summary of two return series.
///
/// Immutable value object; holds no reference to the input data.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CovarianceMatrixResult {
    /// Sample covariance between the two series.
    pub covariance: Decimal,
    /// Sample variance of instrument 1.
    pub variance1: Decimal,
    /// Sample variance of instrument 2.
    pub variance2: Decimal,
    /// Correlation in \[-1, 1\]; zero when either variance is zero.
    pub correlation: Decimal,
    /// Mean return of instrument 1.
    pub mean1: Decimal,
    /// Mean return of instrument 2.
    pub mean2: Decimal,
    /// Number of observations used.
    pub sample_size: usize,
    /// Kish effective sample size `1 / Σwᵢ²`; equals `sample_size` with
    /// equal weights.
    pub effective_sample_size: Decimal,
    /// Standard error of the correlation estimate.
    pub standard_error: Decimal,
    /// Statistical reliability score in \[0, 1\].
    pub confidence: Decimal,
    /// `confidence >= confidence_level` and
    /// `effective_sample_size >= min_sample_size`.
    pub is_significant: bool,
}

impl CovarianceMatrixResult {
    /// Standard deviation of instrument 1.
    pub fn std_dev1(&self) -> HedgeResult<Decimal> {
        decimal_sqrt(self.variance1)
    }

    /// Standard deviation of instrument 2.
    pub fn std_dev2(&self) -> HedgeResult<Decimal> {
        decimal_sqrt(self.variance2)
    }

    /// Regression slope of instrument 1 on instrument 2 (`cov / var2`).
    ///
    /// `None` when instrument 2 has zero variance.
    #[must_use]
    pub fn beta(&self) -> Option<Decimal> {
        if self.variance2.is_zero() {
            None
        } else {
            self.covariance.checked_div(self.variance2)
        }
    }

    /// True when the estimate should not be acted upon.
    #[must_use]
    pub fn is_low_confidence(&self) -> bool {
        !self.is_significant
    }

    /// Serializes the result to a JSON string.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> HedgeResult<String> {
        serde_json::to_string(self).map_err(|e| HedgeError::Serialization(e.to_string()))
    }
}

/// Weighted first and second moments of a paired series.
#[derive(Debug, Clone, Copy)]
struct Moments {
    mean1: Decimal,
    mean2: Decimal,
    covariance: Decimal,
    variance1: Decimal,
    variance2: Decimal,
    effective_sample_size: Decimal,
}

/// Computes the covariance summary of a paired return series.
///
/// # Arguments
///
/// * `data` - Paired observations, at least 2
/// * `config` - Significance thresholds and weighting options
///
/// # Errors
///
/// - `HedgeError::InsufficientData` if fewer than 2 observations are given
/// - `HedgeError::InvalidConfiguration` if `config` is invalid
/// - `HedgeError::NumericalError` if the sums overflow `Decimal`
///
/// # Example
///
/// ```rust
/// use covariance_hedge_rs::analytics::{
///     CovarianceConfig, HistoricalDataPoint, calculate_covariance_matrix,
/// };
/// use covariance_hedge_rs::dec;
///
/// let data = vec![
///     HistoricalDataPoint::new(1, dec!(0.01), dec!(0.02)),
///     HistoricalDataPoint::new(2, dec!(0.03), dec!(0.06)),
/// ];
///
/// let result = calculate_covariance_matrix(&data, &CovarianceConfig::default()).unwrap();
/// assert_eq!(result.covariance, dec!(0.0004));
/// assert_eq!(result.confidence, dec!(0));
/// ```
pub fn calculate_covariance_matrix(
    data: &[HistoricalDataPoint],
    config: &CovarianceConfig,
) -> HedgeResult<CovarianceMatrixResult> {
    config.validate()?;

    if data.len() < MIN_OBSERVATIONS {
        return Err(HedgeError::InsufficientData {
            required: MIN_OBSERVATIONS,
            actual: data.len(),
        });
    }

    let moments = if config.use_exponential_weighting {
        exponentially_weighted_moments(data, config.decay_factor)?
    } else {
        equal_weighted_moments(data)?
    };

    let sample_size = data.len();
    let effective_sample_size = moments.effective_sample_size;
    let correlation = correlation_from(moments.covariance, moments.variance1, moments.variance2)?;
    let standard_error = correlation_standard_error(correlation, effective_sample_size)?;
    let confidence = correlation_confidence(correlation, standard_error, effective_sample_size)?;
    let is_significant = confidence >= config.confidence_level
        && effective_sample_size >= Decimal::from(config.min_sample_size);

    debug!(
        sample_size,
        effective_sample_size = %effective_sample_size,
        correlation = %correlation,
        confidence = %confidence,
        is_significant,
        "computed covariance summary"
    );

    Ok(CovarianceMatrixResult {
        covariance: moments.covariance,
        variance1: moments.variance1,
        variance2: moments.variance2,
        correlation,
        mean1: moments.mean1,
        mean2: moments.mean2,
        sample_size,
        effective_sample_size,
        standard_error,
        confidence,
        is_significant,
    })
}

fn equal_weighted_moments(data: &[HistoricalDataPoint]) -> HedgeResult<Moments> {
    let n = Decimal::from(data.len());

    let mean1 = checked_div(checked_sum(data.iter().map(|p| p.market1_return))?, n)?;
    let mean2 = checked_div(checked_sum(data.iter().map(|p| p.market2_return))?, n)?;

    let mut cov = Decimal::ZERO;
    let mut var1 = Decimal::ZERO;
    let mut var2 = Decimal::ZERO;

    for point in data {
        let d1 = checked_sub(point.market1_return, mean1)?;
        let d2 = checked_sub(point.market2_return, mean2)?;
        cov = checked_add(cov, checked_mul(d1, d2)?)?;
        var1 = checked_add(var1, checked_mul(d1, d1)?)?;
        var2 = checked_add(var2, checked_mul(d2, d2)?)?;
    }

    // Bessel's correction
    let denominator = n - Decimal::ONE;

    Ok(Moments {
        mean1,
        mean2,
        covariance: cov / denominator,
        variance1: var1 / denominator,
        variance2: var2 / denominator,
        effective_sample_size: n,
    })
}

fn exponentially_weighted_moments(
    data: &[HistoricalDataPoint],
    decay_factor: Decimal,
) -> HedgeResult<Moments> {
    let first = data.first().copied().ok_or(HedgeError::InsufficientData {
        required: MIN_OBSERVATIONS,
        actual: 0,
    })?;

    // Raw weights λ^(n-1-i), built from the most recent observation backwards
    let mut weights = vec![Decimal::ZERO; data.len()];
    let mut weight = Decimal::ONE;
    for slot in weights.iter_mut().rev() {
        *slot = weight;
        weight *= decay_factor;
    }

    let total: Decimal = weights.iter().copied().sum();
    for w in &mut weights {
        *w /= total;
    }

    // Means are offset from the first observation so a constant leg keeps
    // exactly zero deviation whatever the weight rounding
    let mut shift1 = Decimal::ZERO;
    let mut shift2 = Decimal::ZERO;
    for (point, w) in data.iter().zip(&weights) {
        let offset1 = checked_sub(point.market1_return, first.market1_return)?;
        let offset2 = checked_sub(point.market2_return, first.market2_return)?;
        shift1 = checked_add(shift1, checked_mul(*w, offset1)?)?;
        shift2 = checked_add(shift2, checked_mul(*w, offset2)?)?;
    }
    let mean1 = checked_add(first.market1_return, shift1)?;
    let mean2 = checked_add(first.market2_return, shift2)?;

    let mut cov = Decimal::ZERO;
    let mut var1 = Decimal::ZERO;
    let mut var2 = Decimal::ZERO;
    let mut sum_sq_weights = Decimal::ZERO;

    for (point, w) in data.iter().zip(&weights) {
        let d1 = checked_sub(point.market1_return, mean1)?;
        let d2 = checked_sub(point.market2_return, mean2)?;
        cov = checked_add(cov, checked_mul(*w, checked_mul(d1, d2)?)?)?;
        var1 = checked_add(var1, checked_mul(*w, checked_mul(d1, d1)?)?)?;
        var2 = checked_add(var2, checked_mul(*w, checked_mul(d2, d2)?)?)?;
        sum_sq_weights += *w * *w;
    }

    let denominator = unbiased_weight_denominator(sum_sq_weights)?;

    Ok(Moments {
        mean1,
        mean2,
        covariance: checked_div(cov, denominator)?,
        variance1: checked_div(var1, denominator)?,
        variance2: checked_div(var2, denominator)?,
        // Kish effective sample size
        effective_sample_size: checked_div(Decimal::ONE, sum_sq_weights)?,
    })
}

/// Denominator `1 − Σwᵢ²` of the unbiased weighted estimator.
fn unbiased_weight_denominator(sum_sq_weights: Decimal) -> HedgeResult<Decimal> {
    let denominator = Decimal::ONE - sum_sq_weights;
    if denominator <= Decimal::ZERO {
        return Err(HedgeError::NumericalError(
            "Effective sample size collapsed under exponential weighting".to_string(),
        ));
    }
    Ok(denominator)
}

/// Pearson correlation from covariance and variances, clamped to \[-1, 1\].
///
/// Returns zero when either variance is zero (correlation undefined). The
/// standard deviations are taken separately so small variances do not
/// underflow the `Decimal` scale when multiplied.
pub(crate) fn correlation_from(
    covariance: Decimal,
    variance1: Decimal,
    variance2: Decimal,
) -> HedgeResult<Decimal> {
    if variance1 <= Decimal::ZERO || variance2 <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }

    let denominator = checked_mul(decimal_sqrt(variance1)?, decimal_sqrt(variance2)?)?;
    if denominator.is_zero() {
        return Ok(Decimal::ZERO);
    }

    // Clamp to absorb rounding drift
    Ok(clamp(
        checked_div(covariance, denominator)?,
        Decimal::NEGATIVE_ONE,
        Decimal::ONE,
    ))
}

/// Standard error of a correlation estimate, `√((1 − ρ²) / (n − 2))`.
///
/// `n` is the effective sample size. Undefined for `n <= 2`, reported as the
/// maximal value 1.
pub(crate) fn correlation_standard_error(
    correlation: Decimal,
    effective_sample_size: Decimal,
) -> HedgeResult<Decimal> {
    let min_observations = Decimal::from(MIN_OBSERVATIONS);
    if effective_sample_size <= min_observations {
        return Ok(Decimal::ONE);
    }

    let unexplained = (Decimal::ONE - correlation * correlation).max(Decimal::ZERO);
    decimal_sqrt(unexplained / (effective_sample_size - min_observations))
}

/// Two-sided significance `2Φ(|t|) − 1` of a correlation estimate, in
/// \[0, 1\].
pub(crate) fn correlation_confidence(
    correlation: Decimal,
    standard_error: Decimal,
    effective_sample_size: Decimal,
) -> HedgeResult<Decimal> {
    if effective_sample_size <= Decimal::from(MIN_OBSERVATIONS) || correlation.is_zero() {
        return Ok(Decimal::ZERO);
    }
    if standard_error.is_zero() {
        return Ok(Decimal::ONE);
    }

    let t_statistic = checked_div(correlation.abs(), standard_error)?;
    let significance = Decimal::TWO * decimal_norm_cdf(t_statistic)? - Decimal::ONE;
    Ok(clamp_unit(significance))
}
