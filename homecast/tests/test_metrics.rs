use approx::assert_relative_eq;
use homecast::metrics::forecast_accuracy;

#[test]
fn test_forecast_accuracy() {
    let forecast = vec![101.0, 99.0, 103.0, 100.0];
    let actual = vec![100.0, 100.0, 100.0, 100.0];

    let accuracy = forecast_accuracy(&forecast, &actual).unwrap();

    assert_relative_eq!(accuracy.mae, 1.25);
    assert_relative_eq!(accuracy.mse, 2.75);
    assert_relative_eq!(accuracy.rmse, 2.75_f64.sqrt());
    assert_relative_eq!(accuracy.mape, 1.25);
}

#[test]
fn test_perfect_forecast() {
    let values = vec![98.0, 100.0, 102.5];
    let accuracy = forecast_accuracy(&values, &values).unwrap();

    assert_relative_eq!(accuracy.mae, 0.0);
    assert_relative_eq!(accuracy.rmse, 0.0);
    assert_relative_eq!(accuracy.mape, 0.0);
}

#[test]
fn test_mape_ignores_zero_actuals() {
    let forecast = vec![1.0, 110.0];
    let actual = vec![0.0, 100.0];

    let accuracy = forecast_accuracy(&forecast, &actual).unwrap();
    assert_relative_eq!(accuracy.mape, 10.0);
    assert_relative_eq!(accuracy.mae, 5.5);
}

#[test]
fn test_mismatched_lengths() {
    assert!(forecast_accuracy(&[1.0, 2.0], &[1.0]).is_err());
    assert!(forecast_accuracy(&[], &[]).is_err());
}

#[test]
fn test_accuracy_display() {
    let accuracy = forecast_accuracy(&[101.0], &[100.0]).unwrap();
    let text = accuracy.to_string();

    assert!(text.contains("MAE:   1.0000"));
    assert!(text.contains("MAPE:  1.0000%"));
}
