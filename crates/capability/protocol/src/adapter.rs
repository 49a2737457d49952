//! 协议适配器与设备会话抽象。

use crate::error::ProtocolError;
use crate::modbus_tcp::{ModbusTcpAdapter, ModbusTcpConfig};
use crate::robot_rpc::{RobotRpcAdapter, RobotRpcConfig};
use crate::s7::{S7Adapter, S7Config};
use async_trait::async_trait;
use domain::{AddressSpec, DeviceFamily, RawField, ReadPrimitive, Transport};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// 设备会话：一次采集期间独占的传输 / RPC 句柄。
#[async_trait]
pub trait DeviceSession: Send {
    /// 执行一个读取原语。
    async fn read(
        &mut self,
        primitive: ReadPrimitive,
        spec: &AddressSpec,
    ) -> Result<RawField, ProtocolError>;

    /// 释放会话。调用方保证每条退出路径都会调用一次。
    async fn close(&mut self) -> Result<(), ProtocolError>;
}

/// 协议适配器：为一个 IP 建立会话。
#[async_trait]
pub trait ProtocolAdapter: Send + Sync {
    async fn open(&self, ip: &str) -> Result<Box<dyn DeviceSession>, ProtocolError>;
}

/// 适配器公共参数。
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub modbus_unit_id: u8,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            modbus_unit_id: 1,
            connect_timeout: Duration::from_millis(5000),
            read_timeout: Duration::from_millis(3000),
        }
    }
}

/// 按设备族的传输协议创建适配器。
pub fn adapter_for(family: DeviceFamily, config: &AdapterConfig) -> Arc<dyn ProtocolAdapter> {
    match family.transport() {
        Transport::ModbusTcp => Arc::new(ModbusTcpAdapter::new(ModbusTcpConfig {
            unit_id: config.modbus_unit_id,
            connect_timeout: config.connect_timeout,
            read_timeout: config.read_timeout,
            ..ModbusTcpConfig::default()
        })),
        Transport::S7 => Arc::new(S7Adapter::new(S7Config {
            connect_timeout: config.connect_timeout,
            read_timeout: config.read_timeout,
            ..S7Config::default()
        })),
        Transport::RobotRpc => Arc::new(RobotRpcAdapter::new(RobotRpcConfig {
            connect_timeout: config.connect_timeout,
            read_timeout: config.read_timeout,
            ..RobotRpcConfig::default()
        })),
    }
}

/// `[offset, count]` 形式的地址参数。
pub(crate) fn offset_count(spec: &AddressSpec) -> Result<(u16, u16), ProtocolError> {
    let offset = spec.offset().ok_or(ProtocolError::MissingParameter("offset"))?;
    let count = spec.count().ok_or(ProtocolError::MissingParameter("count"))?;
    Ok((offset, count))
}

/// 给协议操作加上超时。
pub(crate) async fn with_timeout<T, F>(
    duration: Duration,
    what: &str,
    fut: F,
) -> Result<T, ProtocolError>
where
    F: Future<Output = Result<T, ProtocolError>>,
{
    tokio::time::timeout(duration, fut)
        .await
        .map_err(|_| ProtocolError::Timeout(format!("{} after {}ms", what, duration.as_millis())))?
}
