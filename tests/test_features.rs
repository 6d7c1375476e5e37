use chrono::NaiveDate;
use retail_forecast::features::{normalize_state_holiday, CalendarFeatures, LAG_WINDOW};
use retail_forecast::{FeatureEnricher, HistoricalRecord, SalesHistory};
use rstest::rstest;

fn record(store: u32, date: &str, sales: Option<f64>) -> HistoricalRecord {
    HistoricalRecord {
        store,
        date: date.parse().unwrap(),
        sales,
        promo: Some(0.0),
        state_holiday: Some("0".to_string()),
        school_holiday: Some(0.0),
        store_type: Some("a".to_string()),
        assortment: Some("basic".to_string()),
        competition_distance: Some(100.0),
        competition_open_since_month: None,
        competition_open_since_year: None,
        promo2: Some(0.0),
        promo2_since_week: None,
        promo2_since_year: None,
        promo_interval: None,
    }
}

fn daily_series(store: u32, start: &str, sales: &[f64]) -> Vec<HistoricalRecord> {
    let start_date: NaiveDate = start.parse().unwrap();
    sales
        .iter()
        .enumerate()
        .map(|(i, &value)| {
            let mut r = record(store, start, Some(value));
            r.date = start_date + chrono::Duration::days(i as i64);
            r
        })
        .collect()
}

#[test]
fn test_enrichment_drops_records_without_a_full_lag_window() {
    let sales: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
    let history = SalesHistory::from_records(daily_series(1, "2023-01-01", &sales));

    let enriched = FeatureEnricher::enrich(&history).unwrap();

    // 10 records, 7-lag window: exactly 3 survive
    assert_eq!(enriched.store_records(1).len(), 3);
    assert_eq!(enriched.len(), history.len() - LAG_WINDOW);
}

#[test]
fn test_short_history_produces_no_enriched_records() {
    let sales = [100.0; 7];
    let history = SalesHistory::from_records(daily_series(1, "2023-01-01", &sales));

    let enriched = FeatureEnricher::enrich(&history).unwrap();
    assert!(enriched.store_records(1).is_empty());
    assert!(enriched.is_empty());
}

#[test]
fn test_lag_values_follow_store_history() {
    let sales = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0];
    let history = SalesHistory::from_records(daily_series(1, "2023-01-01", &sales));

    let enriched = FeatureEnricher::enrich(&history).unwrap();
    let records = enriched.store_records(1);
    assert_eq!(records.len(), 2);

    // lag_1 is the immediately preceding sales value, lag_7 the oldest
    assert_eq!(records[0].lags, [70.0, 60.0, 50.0, 40.0, 30.0, 20.0, 10.0]);
    assert_eq!(records[1].lags, [80.0, 70.0, 60.0, 50.0, 40.0, 30.0, 20.0]);
}

#[test]
fn test_null_sales_break_the_lag_chain() {
    let mut records = daily_series(1, "2023-01-01", &[1.0; 13]);
    records[4].sales = None;
    let history = SalesHistory::from_records(records);

    let enriched = FeatureEnricher::enrich(&history).unwrap();

    // Records whose window covers the null day are dropped; the chain
    // recovers once the window has moved past it
    let dates: Vec<NaiveDate> = enriched.store_records(1).iter().map(|r| r.date).collect();
    assert_eq!(dates, vec!["2023-01-13".parse().unwrap()]);
}

#[test]
fn test_competition_distance_imputed_with_global_median() {
    let mut records = daily_series(1, "2023-01-01", &[1.0; 9]);
    for r in &mut records {
        r.competition_distance = Some(50.0);
    }
    let mut other = daily_series(2, "2023-01-01", &[1.0; 9]);
    for r in &mut other {
        r.competition_distance = None;
    }
    other[0].competition_distance = Some(250.0);
    records.extend(other);
    let history = SalesHistory::from_records(records);

    let enriched = FeatureEnricher::enrich(&history).unwrap();

    // Median over the entire input set, not per store
    assert_eq!(enriched.competition_distance_median(), 50.0);
    assert_eq!(enriched.imputed_competition_rows(), 8);
    for record in enriched.store_records(2) {
        assert_eq!(record.competition_distance, 50.0);
    }
}

#[test]
fn test_promo_interval_gets_the_sentinel_category() {
    let history = SalesHistory::from_records(daily_series(1, "2023-01-01", &[1.0; 8]));

    let enriched = FeatureEnricher::enrich(&history).unwrap();
    assert_eq!(enriched.store_records(1)[0].promo_interval, "None");
}

#[test]
fn test_calendar_features() {
    // 2023-01-07 was a Saturday
    let saturday = CalendarFeatures::from_date("2023-01-07".parse().unwrap());
    assert_eq!(saturday.year, 2023);
    assert_eq!(saturday.month, 1);
    assert_eq!(saturday.day, 7);
    assert_eq!(saturday.day_of_week, 5);
    assert_eq!(saturday.week_of_year, 1);
    assert!(saturday.is_weekend);

    let monday = CalendarFeatures::from_date("2023-01-09".parse().unwrap());
    assert_eq!(monday.day_of_week, 0);
    assert_eq!(monday.week_of_year, 2);
    assert!(!monday.is_weekend);
}

#[rstest]
#[case(None, "0")]
#[case(Some(""), "0")]
#[case(Some("0"), "0")]
#[case(Some("0.0"), "0")]
#[case(Some("a"), "a")]
#[case(Some("B"), "b")]
#[case(Some(" c "), "c")]
fn test_normalize_state_holiday(#[case] raw: Option<&str>, #[case] expected: &str) {
    assert_eq!(normalize_state_holiday(raw), expected);
}
