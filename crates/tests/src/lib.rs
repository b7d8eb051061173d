//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约测试 (配置 -> 校验后的运行参数)
//! - e2e 测试：通知信封 -> 对象存储 -> 记录提取 -> 分批 -> fan-out -> HTTP 端点
//! - 失败隔离回归

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use dispatcher::FanOutConfig;

    #[test]
    fn test_config_to_fan_out_settings() {
        let config = ConfigLoader::load_from_str(
            r#"
            [target]
            url = "http://127.0.0.1:8080/ingest"
            enrich = true

            [dispatch]
            bulk_count = 25
            max_concurrency = 8
            "#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let fan_out = FanOutConfig::from(&config);
        assert_eq!(config.batch_size.get(), 25);
        assert_eq!(fan_out.max_concurrency.get(), 8);
        assert!(fan_out.enrich);
    }

    #[test]
    fn test_missing_batch_size_is_rejected() {
        let err = ConfigLoader::load_from_str(
            r#"{"target": {"url": "http://127.0.0.1:8080/ingest"}}"#,
            ConfigFormat::Json,
        )
        .unwrap_err();
        assert!(err.to_string().contains("bulk_count"));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::num::NonZeroUsize;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::extract::RawQuery;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use contracts::{DispatchSummary, ObjectStore};
    use dispatcher::{partition, FanOut, FanOutConfig, HttpSender};
    use ingestion::{extract_records, LocalFsObjectStore, NotificationEvent};

    type Seen = Arc<Mutex<Vec<Option<String>>>>;

    /// In-process endpoint: 500 for any query containing `fail_on`, 200 otherwise
    async fn endpoint(fail_on: Option<&'static str>) -> (String, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let handler_seen = Arc::clone(&seen);
        let app = Router::new().route(
            "/ingest",
            get(move |RawQuery(query): RawQuery| {
                let seen = Arc::clone(&handler_seen);
                async move {
                    let failed = matches!(
                        (&query, fail_on),
                        (Some(q), Some(needle)) if q.contains(needle)
                    );
                    seen.lock().unwrap().push(query);
                    if failed {
                        StatusCode::INTERNAL_SERVER_ERROR
                    } else {
                        StatusCode::OK
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/ingest"), seen)
    }

    fn notification(bucket: &str, escaped_key: &str) -> String {
        let message = serde_json::json!({
            "Records": [{"s3": {"bucket": {"name": bucket}, "object": {"key": escaped_key}}}]
        });
        serde_json::json!({
            "Records": [{"Sns": {"MessageId": "e2e-1", "Message": message.to_string()}}]
        })
        .to_string()
    }

    /// Envelope -> store -> extract -> partition -> fan-out, as the run loop does it
    async fn relay(
        event: &str,
        store: &impl ObjectStore,
        fan_out: &FanOut<HttpSender>,
        batch_size: usize,
    ) -> DispatchSummary {
        let event = NotificationEvent::from_json(event).unwrap();
        let object = event.records[0].object_ref().unwrap();
        let bytes = store.get(&object.bucket, &object.key).await.unwrap();

        let extraction = extract_records(&bytes);
        assert!(extraction.truncated.is_none());

        let batches = partition(extraction.records, NonZeroUsize::new(batch_size).unwrap());
        fan_out.dispatch(batches).await
    }

    fn fan_out(url: &str, enrich: bool) -> FanOut<HttpSender> {
        let sender = HttpSender::new(url, Duration::from_secs(5)).unwrap();
        FanOut::new(
            sender,
            FanOutConfig {
                max_concurrency: NonZeroUsize::new(3).unwrap(),
                enrich,
            },
        )
    }

    fn write_object(root: &std::path::Path, bucket: &str, key: &str, body: &str) {
        let path = root.join(bucket).join(key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    /// End-to-end: ten lines, batch size 3 -> four batches, ten GETs
    #[tokio::test]
    async fn test_e2e_every_line_reaches_endpoint() {
        let root = tempfile::tempdir().unwrap();
        let body: String = (0..10).map(|i| format!("{{\"id\":{i}}}\n")).collect();
        write_object(root.path(), "uploads", "daily/part 1.jsonl", &body);

        let (url, seen) = endpoint(None).await;
        let store = LocalFsObjectStore::new(root.path());

        let summary = relay(
            &notification("uploads", "daily/part%201.jsonl"),
            &store,
            &fan_out(&url, false),
            3,
        )
        .await;

        assert_eq!(summary.batches, 4);
        assert_eq!(summary.records, 10);
        assert_eq!(summary.delivered, 10);
        assert!(summary.all_delivered());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 10);
        assert!(seen.iter().all(Option::is_none), "no enrichment by default");
    }

    /// A 500 on one record does not stop the rest of its batch or other batches
    #[tokio::test]
    async fn test_e2e_failure_is_isolated() {
        let root = tempfile::tempdir().unwrap();
        let body: String = (0..7).map(|i| format!("{{\"id\":{i}}}\n")).collect();
        write_object(root.path(), "uploads", "events.jsonl", &body);

        let (url, seen) = endpoint(Some("id=1")).await;
        let store = LocalFsObjectStore::new(root.path());

        let summary = relay(
            &notification("uploads", "events.jsonl"),
            &store,
            &fan_out(&url, true),
            4,
        )
        .await;

        assert_eq!(summary.records, 7);
        assert_eq!(summary.status_failed, 1);
        assert_eq!(summary.delivered, 6);
        assert_eq!(seen.lock().unwrap().len(), 7);

        let mut ids: Vec<String> = seen
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .cloned()
            .collect();
        ids.sort();
        assert_eq!(ids.first().map(String::as_str), Some("id=0"));
        assert_eq!(ids.len(), 7);
    }

    /// Undecodable and blank lines are still sent
    #[tokio::test]
    async fn test_e2e_undecodable_lines_are_sent() {
        let root = tempfile::tempdir().unwrap();
        write_object(
            root.path(),
            "uploads",
            "mixed.txt",
            "{\"id\":1}\r\nplain text\n\n{\"id\":2}",
        );

        let (url, seen) = endpoint(None).await;
        let store = LocalFsObjectStore::new(root.path());

        let summary = relay(
            &notification("uploads", "mixed.txt"),
            &store,
            &fan_out(&url, false),
            2,
        )
        .await;

        assert_eq!(summary.records, 4);
        assert_eq!(summary.decode_failed, 2);
        assert_eq!(summary.delivered, 2);
        assert!(summary.all_delivered());
        assert_eq!(seen.lock().unwrap().len(), 4);
    }

    /// Empty object: zero batches, no request, immediate completion
    #[tokio::test]
    async fn test_e2e_empty_object() {
        let root = tempfile::tempdir().unwrap();
        write_object(root.path(), "uploads", "empty.jsonl", "");

        let (url, seen) = endpoint(None).await;
        let store = LocalFsObjectStore::new(root.path());

        let summary = tokio::time::timeout(
            Duration::from_secs(1),
            relay(
                &notification("uploads", "empty.jsonl"),
                &store,
                &fan_out(&url, false),
                5,
            ),
        )
        .await
        .unwrap();

        assert_eq!(summary, DispatchSummary::default());
        assert!(seen.lock().unwrap().is_empty());
    }

    /// Unreachable endpoint: every record fails, every record is still attempted
    #[tokio::test]
    async fn test_e2e_unreachable_endpoint() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let root = tempfile::tempdir().unwrap();
        write_object(root.path(), "uploads", "a.jsonl", "{}\n{}\n{}\n");
        let store = LocalFsObjectStore::new(root.path());

        let summary = relay(
            &notification("uploads", "a.jsonl"),
            &store,
            &fan_out(&format!("http://{addr}/ingest"), false),
            2,
        )
        .await;

        assert_eq!(summary.records, 3);
        assert_eq!(summary.transport_failed, 3);
        assert_eq!(summary.failed(), 3);
    }
}
