//! 设备数据 handlers
//!
//! 每个设备族一个资源，资源名即配置文件中的节名（忽略大小写）：
//! - GET /api/{family}?ip={ip} - 单个设备快照
//! - GET /api/{family} - 该族全部设备快照（按完成顺序）
//!
//! 未知或未启用的设备族返回 404；`ip` 为空返回 400。
//! 设备不可达或采集失败时仍返回 200，快照的 `data` 为 null。

use crate::AppState;
use crate::utils::normalize_required;
use crate::utils::response::{not_found_error, record_to_dto};
use api_contract::{DataRecordDto, DeviceQuery};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gw_telemetry::RequestIds;
use tracing::{debug, info};

/// 读取设备族数据
///
/// 带 `ip` 参数时返回单个 `DataRecordDto`，否则返回该族所有已配置设备的数组。
pub async fn get_family_data(
    State(state): State<AppState>,
    Extension(ids): Extension<RequestIds>,
    Path(family): Path<String>,
    Query(query): Query<DeviceQuery>,
) -> Response {
    let Some(poller) = state.poller(&family) else {
        debug!(request_id = %ids.request_id, family = %family, "unknown or disabled device family");
        return not_found_error();
    };
    info!(
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        family = %poller.family(),
        ip = query.ip.as_deref().unwrap_or("*"),
        "device data requested"
    );

    match query.ip {
        Some(ip) => {
            let ip = match normalize_required(&ip, "ip") {
                Ok(ip) => ip,
                Err(response) => return response,
            };
            let record = poller.get_one(&ip).await;
            (StatusCode::OK, Json(record_to_dto(record))).into_response()
        }
        None => {
            let records: Vec<DataRecordDto> = poller
                .get_all()
                .await
                .into_iter()
                .map(record_to_dto)
                .collect();
            (StatusCode::OK, Json(records)).into_response()
        }
    }
}
