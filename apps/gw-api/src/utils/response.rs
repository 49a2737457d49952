//! HTTP 响应辅助函数和 DTO 转换
//!
//! - 错误响应：bad_request_error, not_found_error
//! - DTO 转换：record_to_dto, metrics_to_dto
//!
//! 错误统一使用 ApiResponse 封装；设备快照直接返回 DTO。

use api_contract::{ApiResponse, DataRecordDto, FieldValueDto, MetricsSnapshotDto};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::{DataRecord, FieldValue};
use gw_telemetry::MetricsSnapshot;

/// 错误请求响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error("INVALID.REQUEST", message.into())),
    )
        .into_response()
}

/// 资源未找到错误响应
pub fn not_found_error() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("RESOURCE.NOT_FOUND", "not found")),
    )
        .into_response()
}

/// DataRecord 转 DataRecordDto
pub fn record_to_dto(record: DataRecord) -> DataRecordDto {
    DataRecordDto {
        ip: record.ip,
        data: record.data.map(|data| {
            data.into_iter()
                .map(|(tag, value)| (tag, field_value_to_dto(value)))
                .collect()
        }),
        timestamp: record.timestamp,
    }
}

fn field_value_to_dto(value: FieldValue) -> FieldValueDto {
    match value {
        FieldValue::Int16List(values) => FieldValueDto::Int16List(values),
        FieldValue::Uint16List(values) => FieldValueDto::Uint16List(values),
        FieldValue::BoolList(values) => FieldValueDto::BoolList(values),
        FieldValue::Float32List(values) => FieldValueDto::Float32List(values),
        FieldValue::Float64List(values) => FieldValueDto::Float64List(values),
        FieldValue::IntList(values) => FieldValueDto::IntList(values),
        FieldValue::BitString(bits) => FieldValueDto::BitString(bits),
        FieldValue::Bytes(bytes) => FieldValueDto::Bytes(bytes),
    }
}

/// MetricsSnapshot 转 MetricsSnapshotDto
pub fn metrics_to_dto(snapshot: MetricsSnapshot) -> MetricsSnapshotDto {
    MetricsSnapshotDto {
        polls: snapshot.polls,
        poll_success: snapshot.poll_success,
        device_unreachable: snapshot.device_unreachable,
        protocol_failure: snapshot.protocol_failure,
        cache_hits: snapshot.cache_hits,
        cache_misses: snapshot.cache_misses,
        fanout_failure: snapshot.fanout_failure,
        poll_latency_ms_total: snapshot.poll_latency_ms_total,
        poll_latency_ms_count: snapshot.poll_latency_ms_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn record_keeps_tag_order_and_values() {
        let mut data = IndexMap::new();
        data.insert("REAL".to_string(), FieldValue::Float32List(vec![1.0]));
        data.insert("INT".to_string(), FieldValue::Int16List(vec![-1, 7]));
        let dto = record_to_dto(DataRecord::success("10.0.0.1", data));

        let data = dto.data.expect("data");
        let tags: Vec<&str> = data.keys().map(String::as_str).collect();
        assert_eq!(tags, vec!["REAL", "INT"]);
        assert_eq!(data["INT"], FieldValueDto::Int16List(vec![-1, 7]));
    }

    #[test]
    fn unavailable_record_maps_to_null_data() {
        let dto = record_to_dto(DataRecord::unavailable("10.0.0.2"));
        assert_eq!(dto.ip, "10.0.0.2");
        assert!(dto.data.is_none());
    }
}
