//! 设备快照缓存
//!
//! 每个 IP 只写入一次：第一次采集的结果（无论成功还是失败）在进程生命周期内保留，
//! 之后的请求直接返回该快照，不再访问设备。
//!
//! 每个 IP 对应一个 `tokio::sync::OnceCell`，同一 IP 的并发首次请求只会执行一次采集，
//! 所有调用方得到同一条记录。

use domain::DataRecord;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::OnceCell;
use tracing::debug;

/// 设备快照缓存（IP → DataRecord）
#[derive(Default)]
pub struct DeviceCache {
    entries: RwLock<HashMap<String, Arc<OnceCell<DataRecord>>>>,
}

impl DeviceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回 IP 的快照；首次调用时执行 `compute` 并永久保存结果。
    pub async fn get_or_compute<F, Fut>(&self, ip: &str, compute: F) -> DataRecord
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DataRecord>,
    {
        let cell = self.cell(ip);
        if let Some(record) = cell.get() {
            gw_telemetry::record_cache_hit();
            debug!(ip, "device cache hit");
            return record.clone();
        }

        let mut computed = false;
        let record = cell
            .get_or_init(|| {
                computed = true;
                compute()
            })
            .await
            .clone();

        if computed {
            gw_telemetry::record_cache_miss();
            debug!(ip, available = record.is_available(), "device snapshot stored");
        } else {
            // 并发首次请求中由其他调用方完成了采集
            gw_telemetry::record_cache_hit();
        }
        record
    }

    /// 已缓存的快照（不触发采集）。
    pub fn get(&self, ip: &str) -> Option<DataRecord> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(ip).and_then(|cell| cell.get().cloned())
    }

    /// 已写入快照的 IP 数量。
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.values().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell(&self, ip: &str) -> Arc<OnceCell<DataRecord>> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cell) = entries.get(ip) {
                return cell.clone();
            }
        }
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(ip.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }
}
