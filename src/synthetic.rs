//! Seeded generators of correlated return series.
//!
//! Paired returns are drawn from a bivariate normal with a target
//! correlation:
//!
//! ```text
//! r₁ = μ₁ + σ₁ z₁
//! r₂ = μ₂ + σ₂ (ρ z₁ + √(1 − ρ²) z₂),   z₁, z₂ ~ N(0, 1) independent
//! ```
//!
//! Multi-asset series follow a one-factor model where each asset loads on a
//! shared market factor. Generation is deterministic for a given seed.

use crate::Decimal;
use crate::analytics::covariance::HistoricalDataPoint;
use crate::risk::portfolio::MarketSeries;
use crate::types::decimal::{from_f64, to_f64};
use crate::types::error::{HedgeError, HedgeResult};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};
use rust_decimal_macros::dec;

/// Decimal places kept on generated returns.
const RETURN_PRECISION: u32 = 10;

/// Generator of paired returns with a target correlation.
///
/// # Example
///
/// ```rust
/// use covariance_hedge_rs::synthetic::SyntheticPairGenerator;
/// use covariance_hedge_rs::dec;
///
/// let data = SyntheticPairGenerator::new(dec!(0.6))
///     .unwrap()
///     .with_volatilities(dec!(0.02), dec!(0.03))
///     .unwrap()
///     .with_seed(1)
///     .generate(100)
///     .unwrap();
///
/// assert_eq!(data.len(), 100);
/// assert!(data.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticPairGenerator {
    correlation: Decimal,
    volatility1: Decimal,
    volatility2: Decimal,
    drift1: Decimal,
    drift2: Decimal,
    start_timestamp: u64,
    interval_ms: u64,
    seed: u64,
}

impl SyntheticPairGenerator {
    /// Creates a generator with 1% volatility, zero drift, one-minute spacing
    /// and seed 42.
    ///
    /// # Errors
    ///
    /// Returns `HedgeError::InvalidConfiguration` if `correlation` is outside
    /// \[-1, 1\].
    pub fn new(correlation: Decimal) -> HedgeResult<Self> {
        if correlation < Decimal::NEGATIVE_ONE || correlation > Decimal::ONE {
            return Err(HedgeError::InvalidConfiguration(format!(
                "correlation must be in [-1, 1], got {}",
                correlation
            )));
        }

        Ok(Self {
            correlation,
            volatility1: dec!(0.01),
            volatility2: dec!(0.01),
            drift1: Decimal::ZERO,
            drift2: Decimal::ZERO,
            start_timestamp: 0,
            interval_ms: 60_000,
            seed: 42,
        })
    }

    /// Sets the per-observation volatility of each leg.
    ///
    /// # Errors
    ///
    /// Returns `HedgeError::InvalidConfiguration` if either volatility is
    /// negative.
    pub fn with_volatilities(
        mut self,
        volatility1: Decimal,
        volatility2: Decimal,
    ) -> HedgeResult<Self> {
        if volatility1 < Decimal::ZERO || volatility2 < Decimal::ZERO {
            return Err(HedgeError::InvalidConfiguration(
                "volatilities must be non-negative".to_string(),
            ));
        }
        self.volatility1 = volatility1;
        self.volatility2 = volatility2;
        Ok(self)
    }

    /// Sets the mean return of each leg.
    #[must_use]
    pub fn with_drifts(mut self, drift1: Decimal, drift2: Decimal) -> Self {
        self.drift1 = drift1;
        self.drift2 = drift2;
        self
    }

    /// Sets the first timestamp and the spacing between observations.
    #[must_use]
    pub fn with_timestamps(mut self, start_timestamp: u64, interval_ms: u64) -> Self {
        self.start_timestamp = start_timestamp;
        self.interval_ms = interval_ms;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Target correlation.
    #[must_use]
    pub fn correlation(&self) -> Decimal {
        self.correlation
    }

    /// Generates `observations` paired returns.
    ///
    /// # Errors
    ///
    /// Returns `HedgeError::NumericalError` if a parameter cannot be
    /// represented as `f64` or a draw cannot be represented as `Decimal`.
    pub fn generate(&self, observations: usize) -> HedgeResult<Vec<HistoricalDataPoint>> {
        let rho = to_f64(self.correlation)?;
        let residual = (1.0 - rho * rho).max(0.0).sqrt();
        let (vol1, vol2) = (to_f64(self.volatility1)?, to_f64(self.volatility2)?);
        let (mu1, mu2) = (to_f64(self.drift1)?, to_f64(self.drift2)?);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut data = Vec::with_capacity(observations);
        let mut timestamp = self.start_timestamp;

        for _ in 0..observations {
            let z1: f64 = StandardNormal.sample(&mut rng);
            let z2: f64 = StandardNormal.sample(&mut rng);

            let r1 = mu1 + vol1 * z1;
            let r2 = mu2 + vol2 * (rho * z1 + residual * z2);

            data.push(HistoricalDataPoint::new(
                timestamp,
                from_f64(r1)?.round_dp(RETURN_PRECISION),
                from_f64(r2)?.round_dp(RETURN_PRECISION),
            ));
            timestamp = timestamp.saturating_add(self.interval_ms);
        }

        Ok(data)
    }
}

/// Generates one return series per asset from a one-factor model.
///
/// Each asset's return is `σ (βᵢ f + √(1 − βᵢ²) εᵢ)` with a shared factor
/// `f`, so the pairwise correlation between assets `i` and `j` is `βᵢ βⱼ`.
///
/// # Arguments
///
/// * `loadings` - Asset names and factor loadings in \[-1, 1\]
/// * `volatility` - Per-observation volatility shared by all assets
/// * `observations` - Number of returns per asset
/// * `seed` - Random seed
///
/// # Errors
///
/// Returns `HedgeError::InvalidConfiguration` for a loading outside
/// \[-1, 1\] or a non-positive volatility.
pub fn generate_factor_markets(
    loadings: &[(&str, f64)],
    volatility: f64,
    observations: usize,
    seed: u64,
) -> HedgeResult<Vec<MarketSeries>> {
    if !(volatility > 0.0 && volatility.is_finite()) {
        return Err(HedgeError::InvalidConfiguration(format!(
            "volatility must be positive, got {}",
            volatility
        )));
    }
    if let Some((name, beta)) = loadings.iter().find(|(_, b)| !(-1.0..=1.0).contains(b)) {
        return Err(HedgeError::InvalidConfiguration(format!(
            "loading for {} must be in [-1, 1], got {}",
            name, beta
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut returns: Vec<Vec<Decimal>> = vec![Vec::with_capacity(observations); loadings.len()];

    for _ in 0..observations {
        let factor: f64 = StandardNormal.sample(&mut rng);
        for (series, (_, beta)) in returns.iter_mut().zip(loadings) {
            let idiosyncratic: f64 = StandardNormal.sample(&mut rng);
            let r = volatility * (beta * factor + (1.0 - beta * beta).sqrt() * idiosyncratic);
            series.push(from_f64(r)?.round_dp(RETURN_PRECISION));
        }
    }

    Ok(loadings
        .iter()
        .zip(returns)
        .map(|((name, _), series)| MarketSeries::new(*name, series))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::covariance::{CovarianceConfig, calculate_covariance_matrix};
    use crate::risk::portfolio::{AssetId, calculate_portfolio_covariance};

    #[test]
    fn test_invalid_correlation() {
        assert!(SyntheticPairGenerator::new(dec!(1.01)).is_err());
        assert!(SyntheticPairGenerator::new(dec!(-1.01)).is_err());
        assert!(SyntheticPairGenerator::new(dec!(-1)).is_ok());
    }

    #[test]
    fn test_invalid_volatility() {
        let result = SyntheticPairGenerator::new(dec!(0.5))
            .unwrap()
            .with_volatilities(dec!(-0.01), dec!(0.01));
        assert!(result.is_err());
    }

    #[test]
    fn test_deterministic_for_seed() {
        let generator = SyntheticPairGenerator::new(dec!(0.5)).unwrap().with_seed(99);
        assert_eq!(generator.generate(50).unwrap(), generator.generate(50).unwrap());

        let other = generator.clone().with_seed(100);
        assert_ne!(generator.generate(50).unwrap(), other.generate(50).unwrap());
    }

    #[test]
    fn test_timestamps() {
        let data = SyntheticPairGenerator::new(dec!(0))
            .unwrap()
            .with_timestamps(1_000, 500)
            .generate(4)
            .unwrap();

        let stamps: Vec<u64> = data.iter().map(|p| p.timestamp).collect();
        assert_eq!(stamps, vec![1_000, 1_500, 2_000, 2_500]);
    }

    #[test]
    fn test_perfect_correlation() {
        let data = SyntheticPairGenerator::new(dec!(1))
            .unwrap()
            .with_seed(5)
            .generate(50)
            .unwrap();

        // Same volatility and drift: both legs are the same draw
        assert!(data.iter().all(|p| p.market1_return == p.market2_return));
    }

    #[test]
    fn test_drift_shifts_mean() {
        let data = SyntheticPairGenerator::new(dec!(0.3))
            .unwrap()
            .with_drifts(dec!(0.01), dec!(-0.01))
            .with_seed(8)
            .generate(2000)
            .unwrap();

        let result = calculate_covariance_matrix(&data, &CovarianceConfig::default()).unwrap();
        assert!((result.mean1 - dec!(0.01)).abs() < dec!(0.002));
        assert!((result.mean2 + dec!(0.01)).abs() < dec!(0.002));
    }

    #[test]
    fn test_factor_markets_structure() {
        let markets =
            generate_factor_markets(&[("BTC", 0.95), ("ETH", 0.9), ("GOLD", 0.0)], 0.02, 500, 17)
                .unwrap();

        assert_eq!(markets.len(), 3);
        assert!(markets.iter().all(|m| m.len() == 500));

        let result = calculate_portfolio_covariance(&markets).unwrap();
        let corr = result.correlation_matrix();
        let btc = AssetId::new("BTC");
        let eth = AssetId::new("ETH");
        let gold = AssetId::new("GOLD");

        // βᵢβⱼ: 0.855 for BTC/ETH, 0 for anything with GOLD
        assert!(corr.get_correlation(&btc, &eth).unwrap() > dec!(0.75));
        assert!(corr.get_correlation(&btc, &gold).unwrap().abs() < dec!(0.2));
        assert_eq!(result.find_best_hedge(&btc).unwrap().0, eth);
    }

    #[test]
    fn test_factor_markets_validation() {
        assert!(generate_factor_markets(&[("A", 1.5)], 0.01, 10, 1).is_err());
        assert!(generate_factor_markets(&[("A", 0.5)], 0.0, 10, 1).is_err());
        assert!(generate_factor_markets(&[("A", 0.5)], f64::NAN, 10, 1).is_err());
    }
}
