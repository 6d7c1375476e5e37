use retail_forecast::{ForecastError, HistoryStore, StoreProfile};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

fn sample_sales_file() -> NamedTempFile {
    write_file(&[
        "Date,Store,Sales,Promo,StateHoliday,SchoolHoliday",
        "2023-01-02,1,110,0,0,0",
        "2023-01-01,1,100,1,0,0",
        "2023-01-01,2,200,0,a,1",
        "2023-01-02,2,210,0,0,0",
        "2023-01-01,3,300,0,0,0",
    ])
}

fn sample_stores_file() -> NamedTempFile {
    write_file(&[
        "Store,StoreType,Assortment,CompetitionDistance,Promo2,PromoInterval",
        "1,a,basic,1200,0,\"Jan,Apr,Jul,Oct\"",
        "2,c,extended,90,1,",
    ])
}

#[test]
fn test_load_and_join_from_csv() {
    let sales = sample_sales_file();
    let stores = sample_stores_file();

    let history =
        HistoryStore::from_csv(sales.path(), stores.path()).unwrap();

    assert_eq!(history.store_ids(), vec![1, 2, 3]);
    assert_eq!(history.len(), 5);

    let first = &history.store_records(1)[0];
    assert_eq!(first.date, "2023-01-01".parse().unwrap());
    assert_eq!(first.sales, Some(100.0));
    assert_eq!(first.promo, Some(1.0));
    assert_eq!(first.store_type.as_deref(), Some("a"));
    assert_eq!(first.competition_distance, Some(1200.0));
    assert_eq!(first.promo_interval.as_deref(), Some("Jan,Apr,Jul,Oct"));
}

#[test]
fn test_left_join_keeps_unmatched_stores() {
    let sales = sample_sales_file();
    let stores = sample_stores_file();

    let history =
        HistoryStore::from_csv(sales.path(), stores.path()).unwrap();

    // Store 3 has no attribute row but its transactions survive with nulls
    let record = &history.store_records(3)[0];
    assert_eq!(record.sales, Some(300.0));
    assert_eq!(record.store_type, None);
    assert_eq!(record.competition_distance, None);
    assert_eq!(record.promo_interval, None);
}

#[test]
fn test_records_sorted_by_date_within_store() {
    let sales = sample_sales_file();
    let stores = sample_stores_file();

    let history =
        HistoryStore::from_csv(sales.path(), stores.path()).unwrap();

    let dates: Vec<_> = history.store_records(1).iter().map(|r| r.date).collect();
    assert_eq!(
        dates,
        vec![
            "2023-01-01".parse().unwrap(),
            "2023-01-02".parse().unwrap()
        ]
    );
}

#[test]
fn test_missing_join_key_is_a_data_source_error() {
    let sales = sample_sales_file();
    let stores = write_file(&["StoreType,Assortment", "a,basic"]);

    let result = HistoryStore::from_csv(sales.path(), stores.path());
    assert!(matches!(
        result.unwrap_err(),
        ForecastError::DataSourceError(_)
    ));
}

#[test]
fn test_unreadable_source_is_a_data_source_error() {
    let stores = sample_stores_file();

    let result = HistoryStore::from_csv("/nonexistent/train.csv", stores.path());
    assert!(matches!(
        result.unwrap_err(),
        ForecastError::DataSourceError(_)
    ));
}

#[test]
fn test_non_numeric_values_become_unknown() {
    let sales = sample_sales_file();
    let stores = write_file(&[
        "Store,StoreType,Assortment,CompetitionDistance,Promo2,PromoInterval",
        "1,a,basic,n/a,0,",
        "2,c,extended,90,1,",
    ]);

    let history =
        HistoryStore::from_csv(sales.path(), stores.path()).unwrap();

    // "n/a" is unknown, not zero
    assert_eq!(history.store_records(1)[0].competition_distance, None);
    assert_eq!(history.store_records(2)[0].competition_distance, Some(90.0));
}

#[test]
fn test_null_sales_survive_loading() {
    let sales = write_file(&[
        "Date,Store,Sales,Promo,StateHoliday,SchoolHoliday",
        "2023-01-01,1,100,0,0,0",
        "2023-01-02,1,,0,0,0",
    ]);
    let stores = sample_stores_file();

    let history =
        HistoryStore::from_csv(sales.path(), stores.path()).unwrap();

    let records = history.store_records(1);
    assert_eq!(records[0].sales, Some(100.0));
    assert_eq!(records[1].sales, None);
}

#[test]
fn test_store_profile_from_latest_record() {
    let sales = sample_sales_file();
    let stores = sample_stores_file();

    let history =
        HistoryStore::from_csv(sales.path(), stores.path()).unwrap();

    let profile = StoreProfile::latest(&history, 2).unwrap();
    assert_eq!(profile.store, 2);
    assert_eq!(profile.store_type.as_deref(), Some("c"));
    assert_eq!(profile.promo2, Some(1.0));

    let missing = StoreProfile::latest(&history, 99);
    assert!(matches!(
        missing.unwrap_err(),
        ForecastError::EmptyHistoryError { store: 99 }
    ));
}
