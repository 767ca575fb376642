//! Hedge Ratio Example
//!
//! This example walks through a full hedging analysis on generated data.
//!
//! Features demonstrated:
//! - Generating correlated return series with a known correlation
//! - Computing the covariance summary and its significance
//! - Comparing hedge recommendations across risk preferences
//! - Tracking the relationship with rolling windows
//! - Decomposing a multi-asset portfolio and finding the best hedge
//!
//! Run with: `RUST_LOG=debug cargo run --example hedge_ratio`

use covariance_hedge_rs::prelude::*;
use covariance_hedge_rs::synthetic::generate_factor_markets;
use tracing_subscriber::EnvFilter;

fn main() -> HedgeResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== Covariance Hedge Example ===\n");

    // BTC-like leg hedged with a less volatile, correlated instrument
    let data = SyntheticPairGenerator::new(dec!(0.75))?
        .with_volatilities(dec!(0.03), dec!(0.02))?
        .with_drifts(dec!(0.0005), dec!(0.0003))
        .with_seed(2024)
        .generate(500)?;

    let calculator = CovarianceHedgeCalculator::default();
    let covariance = calculator.calculate_covariance_matrix(&data)?;
    display_covariance(&covariance);

    compare_risk_preferences(&covariance)?;
    display_rolling(&calculator, &data)?;
    display_portfolio()?;

    println!("\n=== Example Complete ===");
    Ok(())
}

/// Prints the pairwise covariance summary.
fn display_covariance(covariance: &CovarianceMatrixResult) {
    println!("--- Covariance Summary ---\n");
    println!("Observations:    {}", covariance.sample_size);
    println!("Effective size:  {:.1}", covariance.effective_sample_size);
    println!("Covariance:      {:.8}", covariance.covariance);
    println!("Variance (1/2):  {:.8} / {:.8}", covariance.variance1, covariance.variance2);
    println!("Correlation:     {:.4}", covariance.correlation);
    println!("Standard error:  {:.4}", covariance.standard_error);
    println!("Confidence:      {:.4}", covariance.confidence);
    println!("Significant:     {}\n", covariance.is_significant);
}

/// Shows how risk aversion and costs move the recommendation.
fn compare_risk_preferences(covariance: &CovarianceMatrixResult) -> HedgeResult<()> {
    println!("--- Hedge Ratio by Risk Preference ---\n");
    println!("{:>6} {:>8} {:>10} {:>10} {:>10}", "RA", "Cost", "Ratio", "RiskRed", "ExpRet");

    for (risk_aversion, cost) in [
        (dec!(0.0), dec!(0.0)),
        (dec!(0.25), dec!(0.0)),
        (dec!(0.5), dec!(0.0)),
        (dec!(0.5), dec!(0.01)),
        (dec!(0.75), dec!(0.0)),
        (dec!(1.0), dec!(0.0)),
    ] {
        let config = HedgeConfig::new(risk_aversion, cost)?.with_target_risk_reduction(dec!(0.5))?;
        let hedge = calculate_optimal_hedge_ratio(covariance, &config)?;
        println!(
            "{:>6} {:>8} {:>10.4} {:>10.4} {:>10.6}",
            risk_aversion,
            cost,
            hedge.optimal_hedge_ratio,
            hedge.risk_reduction,
            hedge.expected_hedge_return
        );
    }

    Ok(())
}

/// Prints every fifth rolling window.
fn display_rolling(
    calculator: &CovarianceHedgeCalculator,
    data: &[HistoricalDataPoint],
) -> HedgeResult<()> {
    println!("\n--- Rolling Correlation (window 60, step 20) ---\n");

    let rolling = calculator.calculate_rolling_covariance(data, 60, 20)?;
    println!("{} windows", rolling.len());

    for window in rolling.iter().step_by(5) {
        let window = window?;
        println!(
            "  [{:>9} .. {:>9}] corr {:>7.4} conf {:.4}",
            window.window_start,
            window.window_end,
            window.covariance.correlation,
            window.covariance.confidence
        );
    }

    Ok(())
}

/// Decomposes a four-asset portfolio and picks a hedge for the first one.
fn display_portfolio() -> HedgeResult<()> {
    println!("\n--- Portfolio Decomposition ---\n");

    let markets = generate_factor_markets(
        &[("BTC", 0.9), ("ETH", 0.85), ("SOL", 0.6), ("GOLD", -0.2)],
        0.02,
        365,
        7,
    )?;
    let result = calculate_portfolio_covariance(&markets)?;

    for (i, ratio) in result.explained_variance_ratio().iter().enumerate() {
        println!("  PC{}: {:.2}%", i + 1, *ratio * dec!(100));
    }

    if let Some(condition) = result.condition_number() {
        println!("  Condition number: {:.2}", condition);
    }

    let btc = AssetId::new("BTC");
    if let Some((hedge, ratio)) = result.find_best_hedge(&btc) {
        let residual = result.residual_volatility(&btc, &hedge)?;
        println!(
            "\nBest hedge for {}: {} at ratio {:.4} (residual vol {:.4})",
            btc, hedge, ratio, residual
        );
    }

    Ok(())
}
