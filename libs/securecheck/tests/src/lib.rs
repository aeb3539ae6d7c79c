#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};
    use std::io::Write;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use chrono::{NaiveDate, NaiveTime};
    use securecheck::config::SourceConfig;
    use securecheck::{
        Config, DEFAULT_TABLE, DataAccessError, DataStore, Dashboard, Dialect, FrameStore,
        QueryExecutionError, StopRecord, Summary, Table, store, web,
    };
    use tower::ServiceExt;

    const TOP_10: &str = "Top 10 Drug-Related Vehicle Numbers";

    fn init_tracing() {
        let subscriber = tracing_subscriber::FmtSubscriber::new();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    struct CountingStore {
        inner: FrameStore,
        loads: AtomicUsize,
        executions: AtomicUsize,
    }

    impl CountingStore {
        fn new(records: &[StopRecord]) -> Arc<Self> {
            Arc::new(CountingStore {
                inner: FrameStore::from_records(records, DEFAULT_TABLE).unwrap(),
                loads: AtomicUsize::new(0),
                executions: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl DataStore for CountingStore {
        fn dialect(&self) -> Dialect {
            self.inner.dialect()
        }

        fn table_name(&self) -> &str {
            self.inner.table_name()
        }

        async fn load_all(&self) -> Result<Table, DataAccessError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load_all().await
        }

        async fn execute(&self, sql: &str) -> Result<Table, QueryExecutionError> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            self.inner.execute(sql).await
        }
    }

    fn stop(vehicle: &str, violation: &str) -> StopRecord {
        StopRecord {
            country_name: Some("India".to_string()),
            stop_date: NaiveDate::from_ymd_opt(2023, 5, 14),
            stop_time: NaiveTime::from_hms_opt(14, 5, 0),
            driver_gender: Some("F".to_string()),
            driver_age_raw: Some(29),
            driver_age: Some(29),
            driver_race: Some("Hispanic".to_string()),
            violation_raw: Some(violation.to_string()),
            violation: Some(violation.to_string()),
            search_conducted: Some(false),
            search_type: None,
            stop_outcome: Some("Warning".to_string()),
            is_arrested: Some(false),
            stop_duration: Some(10.0),
            drugs_related_stop: Some(false),
            vehicle_number: Some(vehicle.to_string()),
        }
    }

    /// 15 rows, 12 drug-related across V1..V10 (V1 and V2 twice each).
    fn drug_fixture() -> Vec<StopRecord> {
        let mut records = vec![
            stop("V1", "Drug possession"),
            stop("V2", "Drugs"),
            stop("V11", "Speeding"),
            stop("V1", "DRUG trafficking"),
            stop("V2", "Drug possession"),
            stop("V12", "Seatbelt"),
        ];
        for i in 3..=10 {
            records.push(stop(&format!("V{i}"), "Drugs"));
        }
        records.push(stop("V1", "Signal"));
        records
    }

    async fn body_text(res: axum::response::Response) -> String {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_two_renders_one_load() {
        init_tracing();
        let store = CountingStore::new(&drug_fixture());
        let app = web::router(Arc::new(Dashboard::new(store.clone()))).unwrap();
        for uri in ["/", "/?query=Most+Frequently+Searched+Vehicles"] {
            let res = app
                .clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::OK);
        }
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
        assert_eq!(store.executions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_refresh_reloads() {
        let store = CountingStore::new(&drug_fixture());
        let dashboard = Dashboard::new(store.clone());
        dashboard.page(None).await.unwrap();
        dashboard.on_refresh().await;
        dashboard.page(None).await.unwrap();
        assert_eq!(store.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_top_10_drug_vehicles() {
        let store = CountingStore::new(&drug_fixture());
        let dashboard = Dashboard::new(store.clone());
        let table = dashboard.on_run(Some(TOP_10)).await.unwrap();
        assert!(table.len() <= 10);
        assert_eq!(table.columns, vec!["vehicle_number", "count"]);

        let counts: Vec<u64> = table
            .rows
            .iter()
            .map(|row| row[1].as_deref().unwrap().parse().unwrap())
            .collect();
        assert!(counts.windows(2).all(|w| w[0] >= w[1]), "{counts:?}");
        assert_eq!(counts.iter().sum::<u64>(), 12);

        let vehicles: BTreeSet<&str> = table
            .rows
            .iter()
            .map(|row| row[0].as_deref().unwrap())
            .collect();
        let expected: BTreeSet<String> = (1..=10).map(|i| format!("V{i}")).collect();
        assert_eq!(
            vehicles,
            expected.iter().map(String::as_str).collect::<BTreeSet<_>>()
        );
        assert!(!vehicles.contains("V11"));
        assert!(!vehicles.contains("V12"));
        assert_eq!(store.executions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_top_10_cuts_at_limit() {
        // V0..V11 with 12..1 drug stops each, plus non-drug noise on every vehicle
        let mut records = Vec::new();
        for i in 0..12 {
            let vehicle = format!("V{i}");
            for _ in 0..(12 - i) {
                records.push(stop(&vehicle, "Drugs"));
            }
            records.push(stop(&vehicle, "Speeding"));
        }
        let mut expected: BTreeMap<String, u64> = BTreeMap::new();
        for record in &records {
            let violation = record.violation.as_deref().unwrap();
            if violation.to_lowercase().contains("drug") {
                *expected
                    .entry(record.vehicle_number.clone().unwrap())
                    .or_default() += 1;
            }
        }
        assert_eq!(expected.len(), 12);

        let store = CountingStore::new(&records);
        let dashboard = Dashboard::new(store);
        let table = dashboard.on_run(Some(TOP_10)).await.unwrap();
        assert_eq!(table.len(), 10);

        let returned: BTreeMap<&str, u64> = table
            .rows
            .iter()
            .map(|row| {
                (
                    row[0].as_deref().unwrap(),
                    row[1].as_deref().unwrap().parse().unwrap(),
                )
            })
            .collect();
        assert_eq!(returned.len(), 10);
        for (vehicle, count) in &returned {
            assert_eq!(expected.get(*vehicle), Some(count));
        }
        let smallest_returned = returned.values().min().copied().unwrap();
        let largest_excluded = expected
            .iter()
            .filter(|(vehicle, _)| !returned.contains_key(vehicle.as_str()))
            .map(|(_, count)| *count)
            .max()
            .unwrap();
        assert!(
            smallest_returned >= largest_excluded,
            "{smallest_returned} < {largest_excluded}"
        );
    }

    #[tokio::test]
    async fn test_query_error_renders_inline() {
        let batch = StopRecord::as_record_batch(&drug_fixture()).unwrap();
        let schema = batch.schema();
        let keep: Vec<usize> = (0..schema.fields().len())
            .filter(|&i| schema.field(i).name() != "vehicle_number")
            .collect();
        let batch = batch.project(&keep).unwrap();
        let store = FrameStore::from_batches(batch.schema(), vec![batch], DEFAULT_TABLE).unwrap();
        let app = web::router(Arc::new(Dashboard::new(Arc::new(store)))).unwrap();

        let req = Request::post("/run")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("query={}", TOP_10.replace(' ', "+"))))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let html = body_text(res).await;
        assert!(html.contains("<p class=\"error\">Error running query:"));
        assert!(html.contains("<th>violation</th>"));
        assert!(html.contains("Drug possession"));
        assert!(!html.contains("<th>vehicle_number</th>"));
    }

    #[tokio::test]
    async fn test_empty_table_warns() {
        let store = CountingStore::new(&[]);
        let app = web::router(Arc::new(Dashboard::new(store))).unwrap();
        let res = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let html = body_text(res).await;
        assert!(html.contains("No police logs found."));
        assert!(html.contains("Available Columns: country_name, stop_date"));
    }

    #[tokio::test]
    async fn test_summary_matches_first_row() {
        for (search, drugs) in [(true, false), (false, true)] {
            let mut first = stop("V1", "Speeding");
            first.search_conducted = Some(search);
            first.drugs_related_stop = Some(drugs);
            let mut second = stop("V2", "Speeding");
            second.search_conducted = Some(!search);
            second.drugs_related_stop = Some(!drugs);
            let dashboard = Dashboard::new(CountingStore::new(&[first, second]));
            let Summary::Stop(summary) = dashboard.summary().await.unwrap() else {
                panic!("expected a stop summary");
            };
            assert_eq!(summary.search_conducted, search);
            assert_eq!(summary.drugs_related_stop, drugs);
            assert_eq!(
                summary.headline(),
                "A 29-year-old F driver was stopped for Speeding at 14:05:00."
            );
        }
    }

    #[tokio::test]
    async fn test_data_access_error_page() {
        let store = FrameStore::new(Default::default(), DEFAULT_TABLE);
        let app = web::router(Arc::new(Dashboard::new(Arc::new(store)))).unwrap();
        let res = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = body_text(res).await;
        assert!(html.contains("failed to load police logs"));
    }

    #[tokio::test]
    async fn test_api_run() {
        let app = web::router(Arc::new(Dashboard::new(CountingStore::new(&drug_fixture())))).unwrap();
        let body = serde_json::json!({ "label": "Countries with Most Drug-Related Stops" });
        let req = Request::post("/api/run")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let table: serde_json::Value = serde_json::from_str(&body_text(res).await).unwrap();
        assert_eq!(table["columns"], serde_json::json!(["country_name", "drug_stops"]));
        assert_eq!(table["rows"], serde_json::json!([["India", "12"]]));
    }

    #[tokio::test]
    async fn test_open_csv_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("logs.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "country_name,stop_date,stop_time,driver_gender,driver_age_raw,driver_age,driver_race,\
             violation_raw,violation,search_conducted,search_type,stop_outcome,is_arrested,\
             stop_duration,drugs_related_stop,vehicle_number"
        )
        .unwrap();
        writeln!(
            file,
            "Canada,2020-02-11,23:40:00,M,52,52,White,DUI,DUI,True,Vehicle Search,Arrest,True,35,True,ON77"
        )
        .unwrap();
        drop(file);

        let config = Config {
            source: Some(SourceConfig::Csv { path }),
            ..Default::default()
        };
        let store = store::open(&config).await.unwrap();
        assert_eq!(store.table_name(), DEFAULT_TABLE);
        let dashboard = Dashboard::new(store);
        let Summary::Stop(summary) = dashboard.summary().await.unwrap() else {
            panic!("expected a stop summary");
        };
        assert!(summary.search_conducted);
        assert!(summary.drugs_related_stop);
        let table = dashboard
            .on_run(Some("Nighttime Stops Leading to Arrest"))
            .await
            .unwrap();
        assert_eq!(table.rows, vec![vec![Some("1".to_string())]]);
    }
}
