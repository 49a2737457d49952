//! # 采集编排能力模块
//!
//! 一个设备族对应一个 [`DevicePoller`]：持有该族的地址表、协议适配器、存活探测和快照缓存。
//!
//! ```text
//! get_one(ip)
//!   └─ cache.get_or_compute(ip)
//!        └─ acquire: probe ──false──▶ Unreachable
//!                      │true
//!                      ▼
//!                 adapter.open(ip)
//!                      │
//!                 for (tag, spec): field_rule → read → decode
//!                      │
//!                 session.close()（所有退出路径）
//!                      ▼
//!                 Outcome ──▶ DataRecord
//!
//! get_all()
//!   └─ JoinSet：每个 IP 一个任务，任一任务 join 失败 → 全部返回空数据记录
//!      调用方取消时任务分离继续运行，不随之中止
//! ```

use domain::{AddressMap, DataRecord, DeviceFamily, FieldAddresses, FieldValue};
use gw_cache::DeviceCache;
use gw_decode::{DecodeError, decode, field_rule};
use gw_protocol::{DeviceSession, LivenessProbe, ProtocolAdapter, ProtocolError};
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// 单设备采集错误（只出现在日志中，对外表现为 `data == null`）。
#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("decode {tag}: {source}")]
    Decode {
        tag: String,
        #[source]
        source: DecodeError,
    },
}

/// 单设备采集结果。
#[derive(Debug)]
pub enum Outcome {
    Success(IndexMap<String, FieldValue>),
    Unreachable,
    Failed(AcquisitionError),
}

impl Outcome {
    /// 折叠为对外的数据记录：非成功一律 `data == null`。
    pub fn into_record(self, ip: &str) -> DataRecord {
        match self {
            Outcome::Success(data) => DataRecord::success(ip, data),
            Outcome::Unreachable | Outcome::Failed(_) => DataRecord::unavailable(ip),
        }
    }
}

/// 释放时分离而非中止剩余任务的 `JoinSet`。
struct DetachedTasks<T: 'static>(JoinSet<T>);

impl<T: 'static> Drop for DetachedTasks<T> {
    fn drop(&mut self) {
        self.0.detach_all();
    }
}

/// 设备族采集器
pub struct DevicePoller {
    family: DeviceFamily,
    address_map: Arc<AddressMap>,
    adapter: Arc<dyn ProtocolAdapter>,
    probe: Arc<dyn LivenessProbe>,
    cache: DeviceCache,
}

impl DevicePoller {
    pub fn new(
        address_map: Arc<AddressMap>,
        adapter: Arc<dyn ProtocolAdapter>,
        probe: Arc<dyn LivenessProbe>,
    ) -> Self {
        Self {
            family: address_map.family(),
            address_map,
            adapter,
            probe,
            cache: DeviceCache::new(),
        }
    }

    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    /// 配置顺序的 IP 列表。
    pub fn ips(&self) -> Vec<String> {
        self.address_map.ips().map(str::to_string).collect()
    }

    pub fn cache(&self) -> &DeviceCache {
        &self.cache
    }

    /// 读取单个设备的快照。
    ///
    /// 未配置的 IP 直接返回空数据记录，不写缓存、不访问网络。
    pub async fn get_one(&self, ip: &str) -> DataRecord {
        let Some(fields) = self.address_map.fields(ip) else {
            debug!(family = %self.family, ip, "ip not configured for family");
            return DataRecord::unavailable(ip);
        };
        self.cache
            .get_or_compute(ip, || async { self.acquire(ip, fields).await.into_record(ip) })
            .await
    }

    /// 并发读取该族全部设备，结果按完成顺序返回。
    ///
    /// 调用方被取消（例如 HTTP 客户端断开）时，已派发的设备任务继续运行到结束，
    /// 结果照常写入缓存。
    pub async fn get_all(self: &Arc<Self>) -> Vec<DataRecord> {
        let ips = self.ips();
        let mut tasks = DetachedTasks(JoinSet::new());
        for ip in ips.iter().cloned() {
            let poller = Arc::clone(self);
            tasks.0.spawn(async move { poller.get_one(&ip).await });
        }

        let mut records = Vec::with_capacity(ips.len());
        let mut fanout_failed = false;
        while let Some(joined) = tasks.0.join_next().await {
            match joined {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(family = %self.family, error = %err, "polling task failed");
                    fanout_failed = true;
                }
            }
        }

        if fanout_failed {
            gw_telemetry::record_fanout_failure();
            return ips.iter().map(DataRecord::unavailable).collect();
        }
        records
    }

    async fn acquire(&self, ip: &str, fields: &FieldAddresses) -> Outcome {
        let started = Instant::now();
        gw_telemetry::record_poll();

        let outcome = self.acquire_inner(ip, fields).await;
        gw_telemetry::record_poll_latency_ms(started.elapsed().as_millis() as u64);

        match &outcome {
            Outcome::Success(data) => {
                gw_telemetry::record_poll_success();
                info!(family = %self.family, ip, fields = data.len(), "device polled");
            }
            Outcome::Unreachable => {
                gw_telemetry::record_device_unreachable();
                warn!(family = %self.family, ip, "device unreachable");
            }
            Outcome::Failed(err) => {
                gw_telemetry::record_protocol_failure();
                warn!(family = %self.family, ip, error = %err, "device poll failed");
            }
        }
        outcome
    }

    async fn acquire_inner(&self, ip: &str, fields: &FieldAddresses) -> Outcome {
        if !self.probe.probe(ip).await {
            return Outcome::Unreachable;
        }

        let mut session = match self.adapter.open(ip).await {
            Ok(session) => session,
            Err(err) => return Outcome::Failed(err.into()),
        };

        let result = self.read_fields(session.as_mut(), fields).await;
        if let Err(err) = session.close().await {
            warn!(family = %self.family, ip, error = %err, "session close failed");
        }

        match result {
            Ok(data) => Outcome::Success(data),
            Err(err) => Outcome::Failed(err),
        }
    }

    async fn read_fields(
        &self,
        session: &mut dyn DeviceSession,
        fields: &FieldAddresses,
    ) -> Result<IndexMap<String, FieldValue>, AcquisitionError> {
        let mut data = IndexMap::with_capacity(fields.len());
        for (tag, spec) in fields {
            let Some(rule) = field_rule(self.family, tag) else {
                debug!(family = %self.family, tag = %tag, "no rule for tag, skipped");
                continue;
            };
            let raw = session.read(rule.primitive, spec).await?;
            let value = decode(rule.decoding, &raw).map_err(|source| AcquisitionError::Decode {
                tag: tag.clone(),
                source,
            })?;
            data.insert(tag.clone(), value);
        }
        Ok(data)
    }
}
