// End-to-end outlet loop: mocked POS API, real delivery pipeline, fake uploader.

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use httpmock::prelude::*;
use serde_json::json;

use mallfeed_cli::delivery::{DeliveryError, DeliveryPolicy, Uploader};
use mallfeed_cli::run::{run_outlets, OutletError, OutletStatus};
use mallfeed_core::Tenant;
use mallfeed_pos_client::window::default_timezone;
use mallfeed_pos_client::{ApiConfig, PosClient, PosError};

#[derive(Default)]
struct RecordingUploader {
    pushed: RefCell<Vec<(String, String)>>,
}

impl Uploader for RecordingUploader {
    fn upload(&self, local_path: &Path, remote_path: &str) -> Result<(), DeliveryError> {
        let content = fs::read_to_string(local_path)
            .map_err(|e| DeliveryError::Transfer(e.to_string()))?;
        self.pushed.borrow_mut().push((remote_path.to_string(), content));
        Ok(())
    }
}

fn client(server: &MockServer) -> PosClient {
    let mut config = ApiConfig::new("tok").with_api_base(server.base_url());
    config.max_retries = 0;
    config.backoff = Duration::from_millis(1);
    PosClient::new(config)
}

fn christmas() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()
}

fn mock_stores(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/stores");
        then.status(200).json_body(json!({
            "stores": [
                {"id": "st-a", "name": "Store A", "deleted_at": null},
                {"id": "st-b", "name": "Store B", "deleted_at": null},
                {"id": "st-old", "name": "Store A", "deleted_at": "2023-01-01T00:00:00Z"}
            ]
        }));
    });
}

#[test]
fn store_a_submitted_and_cleaned_up() {
    let server = MockServer::start();
    mock_stores(&server);
    let page1 = server.mock(|when, then| {
        when.method(GET)
            .path("/receipts")
            .query_param("store_id", "st-a")
            .query_param_missing("cursor");
        then.status(200).json_body(json!({
            "receipts": [
                {"receipt_number": "1-1001", "receipt_type": "SALE", "total_money": 50.00},
                {"receipt_number": "1-1002", "receipt_type": "SALE", "total_money": 25.50}
            ],
            "cursor": "c1"
        }));
    });
    let page2 = server.mock(|when, then| {
        when.method(GET)
            .path("/receipts")
            .query_param("store_id", "st-a")
            .query_param("cursor", "c1");
        then.status(200).json_body(json!({
            "receipts": [
                {"receipt_number": "1-1003", "receipt_type": "REFUND", "total_money": 10.00}
            ],
            "cursor": null
        }));
    });

    let dir = tempfile::tempdir().unwrap();
    let policy = DeliveryPolicy {
        work_dir: dir.path().to_path_buf(),
        remote_dir: Some("/upload".into()),
        remove_after: true,
    };
    let uploader = RecordingUploader::default();

    let summary = run_outlets(
        &[Tenant::new("Store A", "LOT001")],
        christmas(),
        default_timezone(),
        &client(&server),
        Some(&uploader),
        &policy,
    );

    page1.assert_calls(1);
    page2.assert_calls(1);
    assert_eq!(summary.submitted(), 1);
    assert_eq!(
        *uploader.pushed.borrow(),
        vec![("/upload/LOT001_25122024.txt".to_string(), "LOT001|25122024|65.50".to_string())]
    );
    assert!(!dir.path().join("LOT001_25122024.txt").exists());
}

#[test]
fn failed_page_skips_outlet_but_not_the_next() {
    let server = MockServer::start();
    mock_stores(&server);
    server.mock(|when, then| {
        when.method(GET)
            .path("/receipts")
            .query_param("store_id", "st-a")
            .query_param_missing("cursor");
        then.status(200).json_body(json!({
            "receipts": [{"receipt_number": "1-1001", "receipt_type": "SALE", "total_money": 50.0}],
            "cursor": "c1"
        }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/receipts")
            .query_param("store_id", "st-a")
            .query_param("cursor", "c1");
        then.status(502).body("bad gateway");
    });
    server.mock(|when, then| {
        when.method(GET).path("/receipts").query_param("store_id", "st-b");
        then.status(200).json_body(json!({"receipts": [], "cursor": null}));
    });

    let dir = tempfile::tempdir().unwrap();
    let policy = DeliveryPolicy {
        work_dir: dir.path().to_path_buf(),
        remote_dir: None,
        remove_after: true,
    };

    let summary = run_outlets(
        &[Tenant::new("Store A", "LOT001"), Tenant::new("Store B", "LOT002")],
        christmas(),
        default_timezone(),
        &client(&server),
        None,
        &policy,
    );

    assert!(matches!(
        summary.outlets[0].status,
        OutletStatus::Failed(OutletError::Fetch(PosError::Http(502, _)))
    ));
    assert!(!dir.path().join("LOT001_25122024.txt").exists());

    assert!(matches!(summary.outlets[1].status, OutletStatus::Generated));
    assert_eq!(
        fs::read_to_string(dir.path().join("LOT002_25122024.txt")).unwrap(),
        "LOT002|25122024|0.00"
    );
}
