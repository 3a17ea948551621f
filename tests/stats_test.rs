//! Descriptive statistics and accuracy tests

use pulse_analytics::ml::metrics::evaluate_forecast_accuracy;
use pulse_analytics::stats::{
    self, bivariate_correlation, concentration_ratio, gini_coefficient, trivariate_analysis,
    CorrelationMethod, Strength,
};
use pulse_analytics::time_series::{analyze_trend, TrendDirection};
use pulse_analytics::{Error, FeatureTable, Result};

fn dense(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

#[test]
fn test_accuracy_scenario() -> Result<()> {
    let accuracy = evaluate_forecast_accuracy(&[100.0, 200.0, 300.0], &[110.0, 190.0, 300.0])?;
    assert!((accuracy.mae - 6.67).abs() < 0.005);
    assert!(accuracy.mape.is_finite() && accuracy.mape > 0.0);
    assert!((accuracy.rmse * accuracy.rmse - accuracy.mse).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_accuracy_mape_skips_zero_actuals() -> Result<()> {
    // the zero-enrolment month contributes to MAE but not to MAPE
    let accuracy = evaluate_forecast_accuracy(&[0.0, 200.0, 400.0], &[10.0, 180.0, 440.0])?;
    assert!((accuracy.mape - 10.0).abs() < 1e-12);
    assert!((accuracy.mae - 70.0 / 3.0).abs() < 1e-12);

    let accuracy = evaluate_forecast_accuracy(&[0.0, 0.0], &[1.0, 2.0])?;
    assert!(accuracy.mape.is_nan());
    Ok(())
}

#[test]
fn test_accuracy_length_mismatch_fails_loudly() {
    assert!(matches!(
        evaluate_forecast_accuracy(&[1.0, 2.0, 3.0], &[1.0, 2.0]),
        Err(Error::DimensionMismatch(_))
    ));
}

#[test]
fn test_two_row_correlation_is_insufficient() -> Result<()> {
    for method in [
        CorrelationMethod::Pearson,
        CorrelationMethod::Spearman,
        CorrelationMethod::Kendall,
    ] {
        let result = bivariate_correlation(&dense(&[1.0, 2.0]), &dense(&[3.0, 5.0]), method)?;
        assert_eq!(result.interpretation, "Insufficient data");
        assert!(result.correlation.is_nan());
        assert!(result.strength.is_none());
    }
    Ok(())
}

#[test]
fn test_missing_pairs_are_dropped() -> Result<()> {
    let x = [Some(1.0), None, Some(3.0), Some(4.0)];
    let y = [Some(2.0), Some(9.0), None, Some(8.0)];
    let result = bivariate_correlation(&x, &y, CorrelationMethod::Pearson)?;
    assert_eq!(result.n, 2);
    assert_eq!(result.interpretation, "Insufficient data");
    Ok(())
}

#[test]
fn test_rank_correlations() -> Result<()> {
    let x: Vec<f64> = (1..=6).map(|i| i as f64).collect();
    let y: Vec<f64> = x.iter().map(|v| v * v * v).collect();

    let spearman = bivariate_correlation(&dense(&x), &dense(&y), CorrelationMethod::Spearman)?;
    assert!((spearman.correlation - 1.0).abs() < 1e-12);
    assert_eq!(spearman.strength, Some(Strength::Strong));
    assert_eq!(spearman.interpretation, "Strong positive correlation (significant)");

    let reversed: Vec<f64> = y.iter().rev().copied().collect();
    let kendall =
        bivariate_correlation(&dense(&x), &dense(&reversed), CorrelationMethod::Kendall)?;
    assert!((kendall.correlation + 1.0).abs() < 1e-12);
    // untied six pairs: exact p = 2 / 6!
    assert!((kendall.p_value - 2.0 / 720.0).abs() < 1e-12);
    assert_eq!(kendall.significant, Some(true));

    let method: CorrelationMethod = "Kendall".parse()?;
    assert_eq!(method, CorrelationMethod::Kendall);
    assert!("cosine".parse::<CorrelationMethod>().is_err());
    Ok(())
}

#[test]
fn test_constant_column_correlation() -> Result<()> {
    let result = bivariate_correlation(
        &dense(&[4.0, 4.0, 4.0, 4.0]),
        &dense(&[1.0, 2.0, 3.0, 4.0]),
        CorrelationMethod::Pearson,
    )?;
    assert_eq!(result.interpretation, "Constant input");
    assert!(result.correlation.is_nan());
    Ok(())
}

#[test]
fn test_zero_column_coefficient_of_variation() -> Result<()> {
    let summary = stats::univariate_analysis(&[0.0; 8])?;
    assert_eq!(summary.coefficient_of_variation, 0.0);
    assert_eq!(summary.mean, 0.0);
    assert_eq!(summary.std, 0.0);
    Ok(())
}

#[test]
fn test_single_value_summary() -> Result<()> {
    let summary = stats::univariate_analysis(&[42.0])?;
    assert_eq!(summary.count, 1);
    assert_eq!(summary.std, 0.0);
    assert_eq!(summary.coefficient_of_variation, 0.0);
    assert_eq!(summary.median, 42.0);
    assert_eq!(summary.iqr, 0.0);
    Ok(())
}

#[test]
fn test_describe_table_column() -> Result<()> {
    let mut table = FeatureTable::new(["Bihar", "Kerala", "Goa", "Assam"]);
    table.add_column("updates", vec![Some(10_u32), None, Some(30), Some(20)])?;

    let summary = table.describe("updates")?;
    assert_eq!(summary.count, 3);
    assert_eq!(summary.median, 20.0);
    assert!((summary.coefficient_of_variation - 50.0).abs() < 1e-9);
    assert!(table.describe("biometric").is_err());
    Ok(())
}

#[test]
fn test_trivariate_and_inequality() -> Result<()> {
    let x = dense(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let y = dense(&[2.0, 1.0, 4.0, 3.0, 6.0, 5.0]);
    let z = dense(&[1.0, 3.0, 2.0, 2.0, 4.0, 3.0]);
    let result = trivariate_analysis(&x, &y, &z)?;
    assert_eq!(result.n, 6);
    assert!((result.correlation_xy - 0.8285714285714286).abs() < 1e-12);
    assert!((result.partial_correlation_xy_given_z - 0.7370277311900888).abs() < 1e-9);

    assert!((gini_coefficient(&[0.0, 0.0, 0.0, 100.0]) - 0.75).abs() < 1e-12);
    assert_eq!(gini_coefficient(&[5.0, 5.0, 5.0]), 0.0);
    assert!((concentration_ratio(&[20.0, 50.0, 30.0], 1) - 0.5).abs() < 1e-12);
    Ok(())
}

#[test]
fn test_trend_of_dashboard_series() {
    let outcome = analyze_trend(&[100.0, 110.0, 105.0, 120.0, 130.0, 125.0]);
    let analysis = outcome.analysis().unwrap();
    assert_eq!(analysis.direction, TrendDirection::Increasing);
    assert!(analysis.slope > 0.0);
}
