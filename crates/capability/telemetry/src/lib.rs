//! 追踪、请求 ID 与采集指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 采集指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
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

/// 采集指标。
pub struct TelemetryMetrics {
    polls: AtomicU64,
    poll_success: AtomicU64,
    device_unreachable: AtomicU64,
    protocol_failure: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    fanout_failure: AtomicU64,
    poll_latency_ms_total: AtomicU64,
    poll_latency_ms_count: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            polls: AtomicU64::new(0),
            poll_success: AtomicU64::new(0),
            device_unreachable: AtomicU64::new(0),
            protocol_failure: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            fanout_failure: AtomicU64::new(0),
            poll_latency_ms_total: AtomicU64::new(0),
            poll_latency_ms_count: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            polls: self.polls.load(Ordering::Relaxed),
            poll_success: self.poll_success.load(Ordering::Relaxed),
            device_unreachable: self.device_unreachable.load(Ordering::Relaxed),
            protocol_failure: self.protocol_failure.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            fanout_failure: self.fanout_failure.load(Ordering::Relaxed),
            poll_latency_ms_total: self.poll_latency_ms_total.load(Ordering::Relaxed),
            poll_latency_ms_count: self.poll_latency_ms_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录一次设备采集（缓存未命中后真正访问设备）。
pub fn record_poll() {
    metrics().polls.fetch_add(1, Ordering::Relaxed);
}

/// 记录采集成功次数。
pub fn record_poll_success() {
    metrics().poll_success.fetch_add(1, Ordering::Relaxed);
}

/// 记录存活探测失败次数。
pub fn record_device_unreachable() {
    metrics().device_unreachable.fetch_add(1, Ordering::Relaxed);
}

/// 记录连接 / 读取 / 解码失败次数。
pub fn record_protocol_failure() {
    metrics().protocol_failure.fetch_add(1, Ordering::Relaxed);
}

pub fn record_cache_hit() {
    metrics().cache_hits.fetch_add(1, Ordering::Relaxed);
}

pub fn record_cache_miss() {
    metrics().cache_misses.fetch_add(1, Ordering::Relaxed);
}

/// 记录并发汇总本身失败的次数。
pub fn record_fanout_failure() {
    metrics().fanout_failure.fetch_add(1, Ordering::Relaxed);
}

/// 记录单设备采集耗时（毫秒，探测 + 会话 + 读取 + 解码）。
pub fn record_poll_latency_ms(latency_ms: u64) {
    let metrics = metrics();
    metrics
        .poll_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics
        .poll_latency_ms_count
        .fetch_add(1, Ordering::Relaxed);
}
