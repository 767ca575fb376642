//! Rolling-window covariance over a timestamp-ordered history.
//!
//! Windows hold `window_size` consecutive observations and advance by
//! `step_size` observations. Each window covers the time range
//! `[window_start, window_end]` spanned by its first and last observation,
//! and every observation whose timestamp falls in that range is included.
//!
//! The sequence is lazy: nothing is computed until the iterator is advanced,
//! and [`RollingCovariance::iter`] can be called any number of times to
//! restart from the first window.

use crate::analytics::covariance::{
    CovarianceConfig, CovarianceMatrixResult, HistoricalDataPoint, MIN_OBSERVATIONS,
    calculate_covariance_matrix,
};
use crate::types::error::{HedgeError, HedgeResult};
use tracing::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Covariance summary for one window of the history.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RollingWindow {
    /// Timestamp of the first observation in the window.
    pub window_start: u64,
    /// Timestamp of the last observation in the window.
    pub window_end: u64,
    /// Timestamp the window is reported at (its end).
    pub timestamp: u64,
    /// Covariance summary of the observations in the window.
    pub covariance: CovarianceMatrixResult,
}

/// Restartable view of the rolling windows over a borrowed history.
///
/// # Example
///
/// ```rust
/// use covariance_hedge_rs::analytics::{
///     CovarianceConfig, HistoricalDataPoint, calculate_rolling_covariance,
/// };
/// use covariance_hedge_rs::{Decimal, dec};
///
/// let data: Vec<_> = (0..10u64)
///     .map(|i| {
///         let r = dec!(0.001) * Decimal::from(i % 3);
///         HistoricalDataPoint::new(i * 60_000, r, r * dec!(2))
///     })
///     .collect();
///
/// let config = CovarianceConfig::default();
/// let rolling = calculate_rolling_covariance(&data, 4, 2, &config).unwrap();
/// assert_eq!(rolling.len(), 4);
///
/// for window in rolling.iter() {
///     let window = window.unwrap();
///     assert!(window.window_start <= window.window_end);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RollingCovariance<'a> {
    data: &'a [HistoricalDataPoint],
    window_size: usize,
    step_size: usize,
    config: CovarianceConfig,
}

impl<'a> RollingCovariance<'a> {
    /// Number of windows the sequence yields.
    #[must_use]
    pub fn len(&self) -> usize {
        if self.data.len() < self.window_size {
            0
        } else {
            (self.data.len() - self.window_size) / self.step_size + 1
        }
    }

    /// True when the history is shorter than one window.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Window size in observations.
    #[must_use]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Step between consecutive windows in observations.
    #[must_use]
    pub fn step_size(&self) -> usize {
        self.step_size
    }

    /// Returns a fresh iterator starting at the first window.
    #[must_use]
    pub fn iter(&self) -> RollingCovarianceIter<'a> {
        RollingCovarianceIter {
            data: self.data,
            window_size: self.window_size,
            step_size: self.step_size,
            config: self.config.clone(),
            next_start: 0,
        }
    }
}

impl<'a> IntoIterator for &RollingCovariance<'a> {
    type Item = HedgeResult<RollingWindow>;
    type IntoIter = RollingCovarianceIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over rolling windows.
#[derive(Debug, Clone)]
pub struct RollingCovarianceIter<'a> {
    data: &'a [HistoricalDataPoint],
    window_size: usize,
    step_size: usize,
    config: CovarianceConfig,
    next_start: usize,
}

impl Iterator for RollingCovarianceIter<'_> {
    type Item = HedgeResult<RollingWindow>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_start;
        let last = start.checked_add(self.window_size)?.checked_sub(1)?;
        if last >= self.data.len() {
            return None;
        }
        self.next_start = start.saturating_add(self.step_size);

        let window_start = self.data[start].timestamp;
        let window_end = self.data[last].timestamp;

        // Sorted input: every point with a timestamp in range is contiguous
        let lo = self.data.partition_point(|p| p.timestamp < window_start);
        let hi = self.data.partition_point(|p| p.timestamp <= window_end);
        let points = &self.data[lo..hi];

        trace!(
            window_start,
            window_end,
            points = points.len(),
            "evaluating rolling window"
        );

        Some(
            calculate_covariance_matrix(points, &self.config).map(|covariance| RollingWindow {
                window_start,
                window_end,
                timestamp: window_end,
                covariance,
            }),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self.next_start.checked_add(self.window_size) {
            Some(end) if end <= self.data.len() => {
                (self.data.len() - end) / self.step_size + 1
            }
            _ => 0,
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RollingCovarianceIter<'_> {}

/// Builds the rolling covariance sequence over `data`.
///
/// A history shorter than `window_size` yields an empty sequence.
///
/// # Arguments
///
/// * `data` - Observations sorted by timestamp ascending
/// * `window_size` - Observations per window, at least 2
/// * `step_size` - Observations to advance between windows, at least 1
/// * `config` - Covariance options applied to every window
///
/// # Errors
///
/// - `HedgeError::InvalidConfiguration` for a bad window/step size or config
/// - `HedgeError::InvalidInput` if `data` is not sorted by timestamp
pub fn calculate_rolling_covariance<'a>(
    data: &'a [HistoricalDataPoint],
    window_size: usize,
    step_size: usize,
    config: &CovarianceConfig,
) -> HedgeResult<RollingCovariance<'a>> {
    if window_size < MIN_OBSERVATIONS {
        return Err(HedgeError::InvalidConfiguration(format!(
            "window_size must be at least {}, got {}",
            MIN_OBSERVATIONS, window_size
        )));
    }

    if step_size == 0 {
        return Err(HedgeError::InvalidConfiguration(
            "step_size must be at least 1".to_string(),
        ));
    }

    config.validate()?;

    if let Some(idx) = data
        .windows(2)
        .position(|pair| pair[1].timestamp < pair[0].timestamp)
    {
        return Err(HedgeError::InvalidInput(format!(
            "data must be sorted by timestamp, found {} after {} at index {}",
            data[idx + 1].timestamp,
            data[idx].timestamp,
            idx + 1
        )));
    }

    Ok(RollingCovariance {
        data,
        window_size,
        step_size,
        config: config.clone(),
    })
}
