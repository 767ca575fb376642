//! Multi-asset covariance and correlation matrices.
//!
//! This module extends the pairwise calculator to `N` named return series,
//! producing the full covariance matrix, the correlation matrix and the
//! eigenvalues of the covariance matrix for principal-component style risk
//! decomposition.
//!
//! # Components
//!
//! - [`AssetId`]: Unique identifier for assets
//! - [`MarketSeries`]: A named return series
//! - [`CovarianceMatrix`]: Symmetric covariance matrix
//! - [`CorrelationMatrix`]: Symmetric correlation matrix with validation
//! - [`PortfolioCovarianceResult`]: Matrices, eigenvalues and hedge lookup
//!
//! # Mathematical Background
//!
//! ## Sample Covariance
//!
//! ```text
//! Σᵢⱼ = Σₜ (rᵢₜ − r̄ᵢ)(rⱼₜ − r̄ⱼ) / (T − 1)
//! ```
//!
//! ## Correlation
//!
//! ```text
//! ρᵢⱼ = Σᵢⱼ / √(Σᵢᵢ Σⱼⱼ)
//! ```
//!
//! ## Eigen Decomposition
//!
//! ```text
//! Σ = Q Λ Qᵀ,   λₖ ≥ 0,   Σₖ λₖ = Σᵢ Σᵢᵢ
//! ```
//!
//! # Example
//!
//! ```rust
//! use covariance_hedge_rs::risk::portfolio::{
//!     AssetId, MarketSeries, calculate_portfolio_covariance,
//! };
//! use covariance_hedge_rs::dec;
//!
//! let markets = vec![
//!     MarketSeries::new("BTC", vec![dec!(0.01), dec!(-0.02), dec!(0.03), dec!(0.00)]),
//!     MarketSeries::new("ETH", vec![dec!(0.02), dec!(-0.03), dec!(0.04), dec!(-0.01)]),
//!     MarketSeries::new("SOL", vec![dec!(-0.01), dec!(0.01), dec!(0.02), dec!(0.01)]),
//! ];
//!
//! let result = calculate_portfolio_covariance(&markets).unwrap();
//! assert_eq!(result.eigenvalues().len(), 3);
//!
//! let btc = AssetId::new("BTC");
//! let (best, _ratio) = result.find_best_hedge(&btc).unwrap();
//! assert_eq!(best, AssetId::new("ETH"));
//! ```

use crate::Decimal;
use crate::analytics::covariance::{MIN_OBSERVATIONS, correlation_from};
use crate::types::decimal::{
    checked_div, checked_mul, checked_sub, checked_sum, decimal_sqrt, from_f64, to_f64,
};
use crate::types::error::{HedgeError, HedgeResult};
use nalgebra::{DMatrix, SymmetricEigen};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Unique identifier for an asset.
///
/// Used to identify assets in covariance and correlation matrices.
///
/// # Example
///
/// ```rust
/// use covariance_hedge_rs::risk::portfolio::AssetId;
///
/// let btc = AssetId::new("BTC");
/// let eth = AssetId::from("ETH");
///
/// assert_ne!(btc, eth);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AssetId(pub String);

impl AssetId {
    /// Creates a new asset ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the asset ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AssetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A named return series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MarketSeries {
    /// Asset the returns belong to.
    pub asset: AssetId,
    /// Fractional returns, oldest first.
    pub returns: Vec<Decimal>,
}

impl MarketSeries {
    /// Creates a new series.
    #[must_use]
    pub fn new(asset: impl Into<AssetId>, returns: Vec<Decimal>) -> Self {
        Self {
            asset: asset.into(),
            returns,
        }
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.returns.len()
    }

    /// True when the series has no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }
}

/// Flat index of (i, j) in an upper-triangle layout of an `n × n` matrix.
/// Index formula: i * n - i * (i + 1) / 2 + j for i <= j
fn upper_index(i: usize, j: usize, n: usize) -> usize {
    let (row, col) = if i <= j { (i, j) } else { (j, i) };
    row * n - row * (row + 1) / 2 + col
}

fn position_of(assets: &[AssetId], asset: &AssetId) -> Option<usize> {
    assets.iter().position(|a| a == asset)
}

/// Symmetric covariance matrix for multiple assets.
///
/// Only the upper triangle is stored, so `cov(A, B) == cov(B, A)` holds by
/// construction.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CovarianceMatrix {
    assets: Vec<AssetId>,
    values: Vec<Decimal>,
}

impl CovarianceMatrix {
    /// Creates a zero covariance matrix.
    #[must_use]
    pub fn new(assets: Vec<AssetId>) -> Self {
        let n = assets.len();
        Self {
            assets,
            values: vec![Decimal::ZERO; n * (n + 1) / 2],
        }
    }

    /// Returns the number of assets in the matrix.
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Returns the list of assets.
    #[must_use]
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    /// Gets the covariance between two assets.
    ///
    /// Returns `None` if either asset is not in the matrix.
    #[must_use]
    pub fn get_covariance(&self, asset1: &AssetId, asset2: &AssetId) -> Option<Decimal> {
        let i = position_of(&self.assets, asset1)?;
        let j = position_of(&self.assets, asset2)?;
        Some(self.values[upper_index(i, j, self.assets.len())])
    }

    /// Gets the variance of an asset.
    #[must_use]
    pub fn get_variance(&self, asset: &AssetId) -> Option<Decimal> {
        self.get_covariance(asset, asset)
    }

    /// Sets the covariance between two assets.
    ///
    /// # Errors
    ///
    /// Returns error if either asset is not in the matrix or a variance
    /// (diagonal entry) is negative.
    pub fn set_covariance(
        &mut self,
        asset1: &AssetId,
        asset2: &AssetId,
        covariance: Decimal,
    ) -> HedgeResult<()> {
        let i = position_of(&self.assets, asset1)
            .ok_or_else(|| HedgeError::InvalidInput(format!("Asset {} not in matrix", asset1)))?;
        let j = position_of(&self.assets, asset2)
            .ok_or_else(|| HedgeError::InvalidInput(format!("Asset {} not in matrix", asset2)))?;

        if i == j && covariance < Decimal::ZERO {
            return Err(HedgeError::InvalidInput(format!(
                "Variance of {} cannot be negative, got {}",
                asset1, covariance
            )));
        }

        let idx = upper_index(i, j, self.assets.len());
        self.values[idx] = covariance;
        Ok(())
    }

    /// Entry at (row, column) by position.
    fn at(&self, i: usize, j: usize) -> Decimal {
        self.values[upper_index(i, j, self.assets.len())]
    }

    /// Sum of the variances (trace of the matrix).
    #[must_use]
    pub fn trace(&self) -> Decimal {
        (0..self.assets.len()).map(|i| self.at(i, i)).sum()
    }

    /// Returns the covariance matrix as a 2D vector.
    #[must_use]
    pub fn to_matrix(&self) -> Vec<Vec<Decimal>> {
        let n = self.assets.len();
        let mut matrix = vec![vec![Decimal::ZERO; n]; n];

        for (i, row) in matrix.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = self.at(i, j);
            }
        }

        matrix
    }
}

/// Symmetric correlation matrix for multiple assets.
///
/// Stores correlations between pairs of assets efficiently using
/// only the upper triangle of the matrix.
///
/// # Invariants
///
/// - Diagonal elements are always 1.0 (self-correlation)
/// - Off-diagonal elements are in range \[-1, 1\]
/// - Matrix is symmetric: ρ(A,B) = ρ(B,A)
///
/// # Example
///
/// ```rust
/// use covariance_hedge_rs::risk::portfolio::{AssetId, CorrelationMatrix};
/// use covariance_hedge_rs::dec;
///
/// let btc = AssetId::new("BTC");
/// let eth = AssetId::new("ETH");
///
/// let mut matrix = CorrelationMatrix::new(vec![btc.clone(), eth.clone()]);
/// matrix.set_correlation(&btc, &eth, dec!(0.8)).unwrap();
///
/// assert_eq!(matrix.get_correlation(&eth, &btc), Some(dec!(0.8)));
/// assert_eq!(matrix.get_correlation(&btc, &btc), Some(dec!(1.0)));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CorrelationMatrix {
    assets: Vec<AssetId>,
    correlations: Vec<Decimal>,
}

impl CorrelationMatrix {
    /// Creates a new correlation matrix initialized to identity.
    ///
    /// All self-correlations are 1.0, all cross-correlations are 0.0.
    #[must_use]
    pub fn new(assets: Vec<AssetId>) -> Self {
        let n = assets.len();
        let mut correlations = vec![Decimal::ZERO; n * (n + 1) / 2];

        for i in 0..n {
            correlations[upper_index(i, i, n)] = Decimal::ONE;
        }

        Self {
            assets,
            correlations,
        }
    }

    /// Derives the correlation matrix from a covariance matrix.
    ///
    /// Pairs involving a zero-variance asset get correlation 0.
    pub fn from_covariance(covariance: &CovarianceMatrix) -> HedgeResult<Self> {
        let n = covariance.asset_count();
        let mut matrix = Self::new(covariance.assets().to_vec());

        for i in 0..n {
            for j in (i + 1)..n {
                let correlation = correlation_from(
                    covariance.at(i, j),
                    covariance.at(i, i),
                    covariance.at(j, j),
                )?;
                matrix.correlations[upper_index(i, j, n)] = correlation;
            }
        }

        Ok(matrix)
    }

    /// Returns the number of assets in the matrix.
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Returns the list of assets.
    #[must_use]
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    /// Gets the correlation between two assets.
    ///
    /// Returns `None` if either asset is not in the matrix.
    #[must_use]
    pub fn get_correlation(&self, asset1: &AssetId, asset2: &AssetId) -> Option<Decimal> {
        let i = position_of(&self.assets, asset1)?;
        let j = position_of(&self.assets, asset2)?;
        Some(self.correlations[upper_index(i, j, self.assets.len())])
    }

    /// Sets the correlation between two assets.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Either asset is not in the matrix
    /// - Correlation is outside \[-1, 1\]
    /// - Trying to set self-correlation to non-1.0 value
    pub fn set_correlation(
        &mut self,
        asset1: &AssetId,
        asset2: &AssetId,
        correlation: Decimal,
    ) -> HedgeResult<()> {
        if correlation < Decimal::NEGATIVE_ONE || correlation > Decimal::ONE {
            return Err(HedgeError::InvalidInput(format!(
                "Correlation must be in [-1, 1], got {}",
                correlation
            )));
        }

        let i = position_of(&self.assets, asset1)
            .ok_or_else(|| HedgeError::InvalidInput(format!("Asset {} not in matrix", asset1)))?;
        let j = position_of(&self.assets, asset2)
            .ok_or_else(|| HedgeError::InvalidInput(format!("Asset {} not in matrix", asset2)))?;

        if i == j && correlation != Decimal::ONE {
            return Err(HedgeError::InvalidInput(
                "Self-correlation must be 1.0".to_string(),
            ));
        }

        let idx = upper_index(i, j, self.assets.len());
        self.correlations[idx] = correlation;
        Ok(())
    }

    /// Validates that the matrix is properly formed.
    ///
    /// Checks:
    /// - All diagonal elements are 1.0
    /// - All off-diagonal elements are in \[-1, 1\]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let n = self.assets.len();

        for i in 0..n {
            for j in i..n {
                let corr = self.correlations[upper_index(i, j, n)];
                if i == j {
                    if corr != Decimal::ONE {
                        return false;
                    }
                } else if corr < Decimal::NEGATIVE_ONE || corr > Decimal::ONE {
                    return false;
                }
            }
        }

        true
    }

    /// Returns the correlation matrix as a 2D vector.
    #[must_use]
    pub fn to_matrix(&self) -> Vec<Vec<Decimal>> {
        let n = self.assets.len();
        let mut matrix = vec![vec![Decimal::ZERO; n]; n];

        for (i, row) in matrix.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = self.correlations[upper_index(i, j, n)];
            }
        }

        matrix
    }
}

/// Covariance structure of a set of markets.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PortfolioCovarianceResult {
    covariance_matrix: CovarianceMatrix,
    correlation_matrix: CorrelationMatrix,
    eigenvalues: Vec<Decimal>,
    sample_size: usize,
}

impl PortfolioCovarianceResult {
    /// The N×N sample covariance matrix.
    #[must_use]
    pub fn covariance_matrix(&self) -> &CovarianceMatrix {
        &self.covariance_matrix
    }

    /// The N×N correlation matrix (unit diagonal).
    #[must_use]
    pub fn correlation_matrix(&self) -> &CorrelationMatrix {
        &self.correlation_matrix
    }

    /// Eigenvalues of the covariance matrix, largest first, all ≥ 0.
    #[must_use]
    pub fn eigenvalues(&self) -> &[Decimal] {
        &self.eigenvalues
    }

    /// Number of observations per market.
    #[must_use]
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Assets in matrix order.
    #[must_use]
    pub fn assets(&self) -> &[AssetId] {
        self.covariance_matrix.assets()
    }

    /// Total variance across all principal components.
    #[must_use]
    pub fn total_variance(&self) -> Decimal {
        self.eigenvalues.iter().copied().sum()
    }

    /// Share of total variance explained by each principal component.
    ///
    /// All zeros when the total variance is zero.
    #[must_use]
    pub fn explained_variance_ratio(&self) -> Vec<Decimal> {
        let total = self.total_variance();
        if total.is_zero() {
            return vec![Decimal::ZERO; self.eigenvalues.len()];
        }
        self.eigenvalues.iter().map(|e| *e / total).collect()
    }

    /// Ratio of the largest to the smallest eigenvalue.
    ///
    /// `None` for a singular matrix.
    #[must_use]
    pub fn condition_number(&self) -> Option<Decimal> {
        let largest = *self.eigenvalues.first()?;
        let smallest = *self.eigenvalues.last()?;
        if smallest.is_zero() {
            None
        } else {
            Some(largest / smallest)
        }
    }

    /// Finds the best hedge for `target` among the other assets.
    ///
    /// Returns the asset with the highest absolute correlation to `target`
    /// and its minimum-variance hedge ratio `cov(target, hedge) / var(hedge)`.
    /// Assets with zero variance are skipped.
    #[must_use]
    pub fn find_best_hedge(&self, target: &AssetId) -> Option<(AssetId, Decimal)> {
        let mut best: Option<(AssetId, Decimal, Decimal)> = None; // (asset, |ρ|, ratio)

        for hedge in self.assets() {
            if hedge == target {
                continue;
            }

            let hedge_var = self.covariance_matrix.get_variance(hedge)?;
            if hedge_var.is_zero() {
                continue;
            }

            let abs_corr = self
                .correlation_matrix
                .get_correlation(target, hedge)?
                .abs();
            let covariance = self.covariance_matrix.get_covariance(target, hedge)?;

            match &best {
                Some((_, best_corr, _)) if abs_corr <= *best_corr => {}
                _ => best = Some((hedge.clone(), abs_corr, covariance / hedge_var)),
            }
        }

        best.map(|(asset, _, ratio)| (asset, ratio))
    }

    /// Volatility of `target` left after hedging with `hedge` at the
    /// minimum-variance ratio.
    ///
    /// Formula: σ_residual = σ_target × √(1 − ρ²)
    ///
    /// # Errors
    ///
    /// Returns error if either asset is not in the result.
    pub fn residual_volatility(&self, target: &AssetId, hedge: &AssetId) -> HedgeResult<Decimal> {
        let missing = |a: &AssetId| HedgeError::InvalidInput(format!("Asset {} not in matrix", a));

        let correlation = self
            .correlation_matrix
            .get_correlation(target, hedge)
            .ok_or_else(|| missing(hedge))?;
        let target_var = self
            .covariance_matrix
            .get_variance(target)
            .ok_or_else(|| missing(target))?;

        let one_minus_rho_sq = Decimal::ONE - correlation * correlation;
        if one_minus_rho_sq <= Decimal::ZERO {
            return Ok(Decimal::ZERO); // Perfect hedge
        }

        Ok(decimal_sqrt(target_var)? * decimal_sqrt(one_minus_rho_sq)?)
    }

    /// Serializes the result to a JSON string.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> HedgeResult<String> {
        serde_json::to_string(self).map_err(|e| HedgeError::Serialization(e.to_string()))
    }
}

/// Computes covariance, correlation and eigenvalues for `N ≥ 2` markets.
///
/// # Errors
///
/// - `HedgeError::InvalidInput` for fewer than 2 markets, duplicate assets or
///   series of different lengths
/// - `HedgeError::InsufficientData` if the series have fewer than 2 returns
/// - `HedgeError::NumericalError` if the sums overflow `Decimal` or the
///   eigen decomposition fails
pub fn calculate_portfolio_covariance(
    markets: &[MarketSeries],
) -> HedgeResult<PortfolioCovarianceResult> {
    if markets.len() < 2 {
        return Err(HedgeError::InvalidInput(format!(
            "Need at least 2 markets, got {}",
            markets.len()
        )));
    }

    let mut seen = HashSet::new();
    for market in markets {
        if !seen.insert(&market.asset) {
            return Err(HedgeError::InvalidInput(format!(
                "Duplicate asset {}",
                market.asset
            )));
        }
    }

    let sample_size = markets[0].len();
    if let Some(mismatch) = markets.iter().find(|m| m.len() != sample_size) {
        return Err(HedgeError::InvalidInput(format!(
            "Return series must have the same length: {} has {}, expected {}",
            mismatch.asset,
            mismatch.len(),
            sample_size
        )));
    }

    if sample_size < MIN_OBSERVATIONS {
        return Err(HedgeError::InsufficientData {
            required: MIN_OBSERVATIONS,
            actual: sample_size,
        });
    }

    let n_obs = Decimal::from(sample_size);
    let deviations = markets
        .iter()
        .map(|m| {
            let mean = checked_div(checked_sum(m.returns.iter().copied())?, n_obs)?;
            m.returns
                .iter()
                .map(|r| checked_sub(*r, mean))
                .collect::<HedgeResult<Vec<Decimal>>>()
        })
        .collect::<HedgeResult<Vec<_>>>()?;

    let assets: Vec<AssetId> = markets.iter().map(|m| m.asset.clone()).collect();
    let n = assets.len();
    let mut covariance_matrix = CovarianceMatrix::new(assets);
    let denominator = n_obs - Decimal::ONE;

    for i in 0..n {
        for j in i..n {
            let products = deviations[i]
                .iter()
                .zip(&deviations[j])
                .map(|(a, b)| checked_mul(*a, *b))
                .collect::<HedgeResult<Vec<Decimal>>>()?;
            covariance_matrix.values[upper_index(i, j, n)] = checked_sum(products)? / denominator;
        }
    }

    let correlation_matrix = CorrelationMatrix::from_covariance(&covariance_matrix)?;
    let eigenvalues = symmetric_eigenvalues(&covariance_matrix)?;

    debug!(
        markets = n,
        sample_size,
        largest_eigenvalue = %eigenvalues.first().copied().unwrap_or_default(),
        "computed portfolio covariance"
    );

    Ok(PortfolioCovarianceResult {
        covariance_matrix,
        correlation_matrix,
        eigenvalues,
        sample_size,
    })
}

/// Eigenvalues of a symmetric matrix, sorted descending and floored at zero.
fn symmetric_eigenvalues(matrix: &CovarianceMatrix) -> HedgeResult<Vec<Decimal>> {
    let n = matrix.asset_count();
    let mut flat = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            flat.push(to_f64(matrix.at(i, j))?);
        }
    }

    let decomposition = SymmetricEigen::new(DMatrix::from_row_slice(n, n, &flat));

    let mut eigenvalues = Vec::with_capacity(n);
    for value in decomposition.eigenvalues.iter() {
        if *value < 0.0 {
            // PSD by construction; negatives are rounding residue
            if value.abs() > 1e-12 {
                warn!(eigenvalue = *value, "clamping negative eigenvalue to zero");
            }
            eigenvalues.push(Decimal::ZERO);
        } else {
            eigenvalues.push(from_f64(*value)?);
        }
    }

    eigenvalues.sort_by(|a, b| b.cmp(a));
    Ok(eigenvalues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn approx(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
        (a - b).abs() <= tolerance
    }

    fn base_returns() -> Vec<Decimal> {
        vec![dec!(0.01), dec!(0.02), dec!(0.03), dec!(0.04), dec!(0.05)]
    }

    // AssetId tests
    #[test]
    fn test_asset_id_new() {
        let asset = AssetId::new("BTC");
        assert_eq!(asset.as_str(), "BTC");
        assert_eq!(asset.to_string(), "BTC");
    }

    #[test]
    fn test_asset_id_from() {
        let asset1: AssetId = "ETH".into();
        let asset2: AssetId = String::from("SOL").into();

        assert_eq!(asset1.as_str(), "ETH");
        assert_eq!(asset2.as_str(), "SOL");
    }

    // CovarianceMatrix tests
    #[test]
    fn test_covariance_matrix_set_get() {
        let btc = AssetId::new("BTC");
        let eth = AssetId::new("ETH");

        let mut matrix = CovarianceMatrix::new(vec![btc.clone(), eth.clone()]);
        matrix.set_covariance(&btc, &btc, dec!(0.0004)).unwrap();
        matrix.set_covariance(&btc, &eth, dec!(0.0002)).unwrap();

        assert_eq!(matrix.get_variance(&btc), Some(dec!(0.0004)));
        assert_eq!(matrix.get_covariance(&eth, &btc), Some(dec!(0.0002)));
        assert_eq!(matrix.get_covariance(&btc, &AssetId::new("SOL")), None);
        assert_eq!(matrix.trace(), dec!(0.0004));
    }

    #[test]
    fn test_covariance_matrix_negative_variance() {
        let btc = AssetId::new("BTC");
        let mut matrix = CovarianceMatrix::new(vec![btc.clone()]);

        assert!(matrix.set_covariance(&btc, &btc, dec!(-0.1)).is_err());
    }

    // CorrelationMatrix tests
    #[test]
    fn test_correlation_matrix_new() {
        let btc = AssetId::new("BTC");
        let eth = AssetId::new("ETH");

        let matrix = CorrelationMatrix::new(vec![btc.clone(), eth.clone()]);

        assert_eq!(matrix.asset_count(), 2);
        assert_eq!(matrix.get_correlation(&btc, &btc), Some(Decimal::ONE));
        assert_eq!(matrix.get_correlation(&btc, &eth), Some(Decimal::ZERO));
        assert!(matrix.is_valid());
    }

    #[test]
    fn test_correlation_matrix_invalid_range() {
        let btc = AssetId::new("BTC");
        let eth = AssetId::new("ETH");

        let mut matrix = CorrelationMatrix::new(vec![btc.clone(), eth.clone()]);

        assert!(matrix.set_correlation(&btc, &eth, dec!(1.5)).is_err());
        assert!(matrix.set_correlation(&btc, &eth, dec!(-1.5)).is_err());
        assert!(matrix.set_correlation(&btc, &btc, dec!(0.5)).is_err());
    }

    #[test]
    fn test_correlation_matrix_to_matrix() {
        let btc = AssetId::new("BTC");
        let eth = AssetId::new("ETH");

        let mut matrix = CorrelationMatrix::new(vec![btc.clone(), eth.clone()]);
        matrix.set_correlation(&btc, &eth, dec!(0.7)).unwrap();

        let m = matrix.to_matrix();
        assert_eq!(m[0][0], Decimal::ONE);
        assert_eq!(m[1][1], Decimal::ONE);
        assert_eq!(m[0][1], dec!(0.7));
        assert_eq!(m[1][0], dec!(0.7));
    }

    // calculate_portfolio_covariance tests
    #[test]
    fn test_portfolio_known_covariances() {
        let doubled: Vec<Decimal> = base_returns().iter().map(|r| *r * dec!(2)).collect();
        let markets = vec![
            MarketSeries::new("A", base_returns()),
            MarketSeries::new("B", doubled),
        ];

        let result = calculate_portfolio_covariance(&markets).unwrap();
        let cov = result.covariance_matrix();
        let a = AssetId::new("A");
        let b = AssetId::new("B");

        assert_eq!(result.sample_size(), 5);
        assert_eq!(cov.get_variance(&a), Some(dec!(0.00025)));
        assert_eq!(cov.get_variance(&b), Some(dec!(0.001)));
        assert_eq!(cov.get_covariance(&a, &b), Some(dec!(0.0005)));
    }

    #[test]
    fn test_portfolio_matrices_symmetric() {
        let markets = vec![
            MarketSeries::new("A", vec![dec!(0.01), dec!(-0.02), dec!(0.015), dec!(0.003)]),
            MarketSeries::new("B", vec![dec!(0.02), dec!(-0.01), dec!(0.005), dec!(-0.004)]),
            MarketSeries::new("C", vec![dec!(-0.01), dec!(0.03), dec!(0.002), dec!(0.001)]),
        ];

        let result = calculate_portfolio_covariance(&markets).unwrap();
        let cov = result.covariance_matrix().to_matrix();
        let corr = result.correlation_matrix().to_matrix();

        for i in 0..3 {
            assert_eq!(corr[i][i], Decimal::ONE);
            for j in 0..3 {
                assert_eq!(cov[i][j], cov[j][i]);
                assert_eq!(corr[i][j], corr[j][i]);
                assert!(corr[i][j] >= Decimal::NEGATIVE_ONE && corr[i][j] <= Decimal::ONE);
            }
        }
        assert!(result.correlation_matrix().is_valid());
    }

    #[test]
    fn test_eigenvalues_of_perfectly_correlated_pair() {
        let markets = vec![
            MarketSeries::new("A", base_returns()),
            MarketSeries::new("B", base_returns()),
        ];

        let result = calculate_portfolio_covariance(&markets).unwrap();
        let eigen = result.eigenvalues();

        // [[v, v], [v, v]] has eigenvalues 2v and 0
        assert_eq!(eigen.len(), 2);
        assert!(approx(eigen[0], dec!(0.0005), dec!(0.000000000001)));
        assert!(eigen[1] >= Decimal::ZERO);
        assert!(eigen[1] < dec!(0.000000000001));
        assert!(approx(
            result.explained_variance_ratio()[0],
            Decimal::ONE,
            dec!(0.000001)
        ));
    }

    #[test]
    fn test_eigenvalues_sum_to_trace() {
        let markets = vec![
            MarketSeries::new(
                "A",
                vec![dec!(0.01), dec!(-0.02), dec!(0.015), dec!(0.003), dec!(0.007)],
            ),
            MarketSeries::new(
                "B",
                vec![dec!(0.02), dec!(-0.01), dec!(0.005), dec!(-0.004), dec!(0.001)],
            ),
            MarketSeries::new(
                "C",
                vec![dec!(-0.01), dec!(0.03), dec!(0.002), dec!(0.001), dec!(-0.006)],
            ),
        ];

        let result = calculate_portfolio_covariance(&markets).unwrap();
        let eigen = result.eigenvalues();

        assert!(eigen.windows(2).all(|w| w[0] >= w[1]));
        assert!(eigen.iter().all(|e| *e >= Decimal::ZERO));
        assert!(approx(
            result.total_variance(),
            result.covariance_matrix().trace(),
            dec!(0.000000001)
        ));
        assert!(result.condition_number().unwrap() >= Decimal::ONE);
    }

    #[test]
    fn test_find_best_hedge() {
        let a = base_returns();
        let close: Vec<Decimal> =
            vec![dec!(0.012), dec!(0.019), dec!(0.031), dec!(0.038), dec!(0.051)];
        let loose: Vec<Decimal> = vec![dec!(0.03), dec!(0.01), dec!(0.02), dec!(0.05), dec!(0.04)];

        let markets = vec![
            MarketSeries::new("BTC", a),
            MarketSeries::new("ETH", close),
            MarketSeries::new("SOL", loose),
        ];
        let result = calculate_portfolio_covariance(&markets).unwrap();

        let btc = AssetId::new("BTC");
        let (best, ratio) = result.find_best_hedge(&btc).unwrap();
        assert_eq!(best, AssetId::new("ETH"));
        assert!(ratio > dec!(0.9) && ratio < dec!(1.1));
    }

    #[test]
    fn test_find_best_hedge_skips_flat_assets() {
        let markets = vec![
            MarketSeries::new("BTC", base_returns()),
            MarketSeries::new("USD", vec![Decimal::ZERO; 5]),
        ];
        let result = calculate_portfolio_covariance(&markets).unwrap();

        assert!(result.find_best_hedge(&AssetId::new("BTC")).is_none());
        assert_eq!(
            result
                .correlation_matrix()
                .get_correlation(&AssetId::new("BTC"), &AssetId::new("USD")),
            Some(Decimal::ZERO)
        );
        assert_eq!(result.condition_number(), None);
    }

    #[test]
    fn test_residual_volatility_perfect_correlation() {
        let markets = vec![
            MarketSeries::new("A", base_returns()),
            MarketSeries::new("B", base_returns()),
        ];
        let result = calculate_portfolio_covariance(&markets).unwrap();

        let residual = result
            .residual_volatility(&AssetId::new("A"), &AssetId::new("B"))
            .unwrap();
        assert!(residual < dec!(0.000001));
        assert!(
            result
                .residual_volatility(&AssetId::new("A"), &AssetId::new("Z"))
                .is_err()
        );
    }

    #[test]
    fn test_tiny_identical_returns_fully_correlated() {
        let tiny: Vec<Decimal> = (0..40)
            .map(|i| Decimal::new(((i * 7) % 11) as i64 - 5, 8))
            .collect();
        let markets = vec![
            MarketSeries::new("A", tiny.clone()),
            MarketSeries::new("B", tiny),
        ];

        let result = calculate_portfolio_covariance(&markets).unwrap();
        let correlation = result
            .correlation_matrix()
            .get_correlation(&AssetId::new("A"), &AssetId::new("B"))
            .unwrap();

        assert!(result.covariance_matrix().trace() > Decimal::ZERO);
        assert!(approx(correlation, Decimal::ONE, dec!(0.000000001)));
    }

    #[test]
    fn test_overflowing_returns_are_reported() {
        let large = Decimal::from(1_000_000_000_000_000i64);
        let markets = vec![
            MarketSeries::new("A", vec![large, -large, large]),
            MarketSeries::new("B", vec![dec!(0.01), dec!(0.02), dec!(0.03)]),
        ];

        assert!(matches!(
            calculate_portfolio_covariance(&markets),
            Err(HedgeError::NumericalError(_))
        ));
    }

    #[test]
    fn test_portfolio_input_validation() {
        let single = vec![MarketSeries::new("A", base_returns())];
        assert!(matches!(
            calculate_portfolio_covariance(&single),
            Err(HedgeError::InvalidInput(_))
        ));

        let duplicate = vec![
            MarketSeries::new("A", base_returns()),
            MarketSeries::new("A", base_returns()),
        ];
        assert!(matches!(
            calculate_portfolio_covariance(&duplicate),
            Err(HedgeError::InvalidInput(_))
        ));

        let mismatched = vec![
            MarketSeries::new("A", base_returns()),
            MarketSeries::new("B", vec![dec!(0.01)]),
        ];
        assert!(matches!(
            calculate_portfolio_covariance(&mismatched),
            Err(HedgeError::InvalidInput(_))
        ));

        let short = vec![
            MarketSeries::new("A", vec![dec!(0.01)]),
            MarketSeries::new("B", vec![dec!(0.02)]),
        ];
        assert!(matches!(
            calculate_portfolio_covariance(&short),
            Err(HedgeError::InsufficientData { actual: 1, .. })
        ));
    }
}
