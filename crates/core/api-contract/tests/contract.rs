use api_contract::{DataRecordDto, DeviceQuery, FieldValueDto, MetricsSnapshotDto};
use indexmap::IndexMap;
use serde_json::{Value, json};

#[test]
fn data_record_serializes_plain_values_in_order() {
    let mut data = IndexMap::new();
    data.insert("Joint".to_string(), FieldValueDto::Float32List(vec![1.5, -2.0]));
    data.insert(
        "DI".to_string(),
        FieldValueDto::BitString("1010000000000000".to_string()),
    );
    data.insert("Block".to_string(), FieldValueDto::Bytes(vec![0, 255]));
    let record = DataRecordDto {
        ip: "192.168.1.20".to_string(),
        data: Some(data),
        timestamp: "2024-05-01 08:00:00".to_string(),
    };

    let text = serde_json::to_string(&record).expect("serialize");
    assert_eq!(
        text,
        r#"{"ip":"192.168.1.20","data":{"Joint":[1.5,-2.0],"DI":"1010000000000000","Block":[0,255]},"timestamp":"2024-05-01 08:00:00"}"#
    );
}

#[test]
fn unavailable_record_has_null_data() {
    let record = DataRecordDto {
        ip: "10.0.0.1".to_string(),
        data: None,
        timestamp: "2024-05-01 08:00:00".to_string(),
    };
    let value = serde_json::to_value(record).expect("serialize");
    assert_eq!(value.get("data"), Some(&Value::Null));
}

#[test]
fn device_query_ip_is_optional() {
    let query: DeviceQuery = serde_json::from_value(json!({})).expect("parse");
    assert!(query.ip.is_none());
    let query: DeviceQuery = serde_json::from_value(json!({ "ip": "10.0.0.1" })).expect("parse");
    assert_eq!(query.ip.as_deref(), Some("10.0.0.1"));
}

#[test]
fn metrics_snapshot_is_camel_case() {
    let snapshot = MetricsSnapshotDto {
        polls: 3,
        poll_success: 2,
        device_unreachable: 1,
        protocol_failure: 0,
        cache_hits: 4,
        cache_misses: 3,
        fanout_failure: 0,
        poll_latency_ms_total: 120,
        poll_latency_ms_count: 3,
    };
    let value = serde_json::to_value(snapshot).expect("serialize");
    assert!(value.get("pollSuccess").is_some());
    assert!(value.get("cacheHits").is_some());
    assert!(value.get("poll_success").is_none());
}
