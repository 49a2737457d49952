//! 路由定义
//!
//! - 健康检查：/health
//! - 指标快照：/metrics
//! - 设备数据：/api/{family}[?ip=]

use super::AppState;
use super::handlers::*;
use super::middleware::request_context;
use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

/// 创建 API 路由
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
        .route("/api/:family", get(get_family_data))
}

/// 组装完整应用：路由 + 状态 + 请求上下文 + HTTP 追踪
pub fn build_app(state: AppState) -> Router {
    create_api_router()
        .with_state(state)
        .layer(middleware::from_fn(request_context))
        .layer(TraceLayer::new_for_http())
}
