//! 采集指标快照。
//!
//! - GET /metrics

use crate::utils::response::metrics_to_dto;
use api_contract::ApiResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gw_telemetry::metrics;

pub async fn get_metrics() -> Response {
    let snapshot = metrics().snapshot();
    (
        StatusCode::OK,
        Json(ApiResponse::success(metrics_to_dto(snapshot))),
    )
        .into_response()
}
