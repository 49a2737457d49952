//! 稳定的 DTO 与 API 响应契约。

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 标准 API 响应封装（错误与指标接口）。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 设备查询参数：`?ip=` 缺省时返回全部设备。
#[derive(Debug, Default, Deserialize)]
pub struct DeviceQuery {
    pub ip: Option<String>,
}

/// 字段值：序列化为普通数组或字符串。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValueDto {
    Int16List(Vec<i16>),
    Uint16List(Vec<u16>),
    BoolList(Vec<bool>),
    Float32List(Vec<f32>),
    Float64List(Vec<f64>),
    IntList(Vec<i32>),
    BitString(String),
    Bytes(Vec<u8>),
}

/// 设备数据快照。`data` 为 null 表示设备不可达或采集失败。
#[derive(Debug, Clone, Serialize)]
pub struct DataRecordDto {
    pub ip: String,
    pub data: Option<IndexMap<String, FieldValueDto>>,
    pub timestamp: String,
}

/// 采集指标快照。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshotDto {
    pub polls: u64,
    pub poll_success: u64,
    pub device_unreachable: u64,
    pub protocol_failure: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub fanout_failure: u64,
    pub poll_latency_ms_total: u64,
    pub poll_latency_ms_count: u64,
}
