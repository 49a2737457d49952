//! Modbus TCP 适配器
//!
//! 每次采集建立一个 TCP 会话，按读取原语调用对应功能码。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let adapter = ModbusTcpAdapter::new(ModbusTcpConfig::default());
//! let mut session = adapter.open("192.168.1.100").await?;
//! let raw = session.read(ReadPrimitive::HoldingRegisters, &spec).await?;
//! session.close().await?;
//! ```

use crate::adapter::{offset_count, with_timeout, DeviceSession, ProtocolAdapter};
use crate::error::ProtocolError;
use async_trait::async_trait;
use domain::{AddressSpec, RawField, ReadPrimitive};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio_modbus::client::Context;
use tokio_modbus::prelude::*;
use tracing::debug;

/// Modbus TCP 配置
#[derive(Debug, Clone)]
pub struct ModbusTcpConfig {
    /// Modbus 服务器端口（默认 502）
    pub port: u16,
    /// 从站 ID
    pub unit_id: u8,
    /// 连接超时
    pub connect_timeout: Duration,
    /// 读取超时
    pub read_timeout: Duration,
}

impl Default for ModbusTcpConfig {
    fn default() -> Self {
        Self {
            port: 502,
            unit_id: 1,
            connect_timeout: Duration::from_millis(5000),
            read_timeout: Duration::from_millis(3000),
        }
    }
}

/// Modbus TCP 适配器
pub struct ModbusTcpAdapter {
    config: ModbusTcpConfig,
}

impl ModbusTcpAdapter {
    /// 创建新的 Modbus TCP 适配器
    pub fn new(config: ModbusTcpConfig) -> Self {
        Self { config }
    }

    fn socket_addr(&self, ip: &str) -> Result<SocketAddr, ProtocolError> {
        let ip: IpAddr = ip
            .parse()
            .map_err(|e| ProtocolError::Connection(format!("invalid address {}: {}", ip, e)))?;
        Ok(SocketAddr::new(ip, self.config.port))
    }
}

#[async_trait]
impl ProtocolAdapter for ModbusTcpAdapter {
    async fn open(&self, ip: &str) -> Result<Box<dyn DeviceSession>, ProtocolError> {
        let addr = self.socket_addr(ip)?;
        let slave = Slave(self.config.unit_id);
        let ctx = with_timeout(self.config.connect_timeout, "modbus connect", async {
            tcp::connect_slave(addr, slave)
                .await
                .map_err(|e| ProtocolError::Connection(e.to_string()))
        })
        .await?;

        debug!(%addr, unit = self.config.unit_id, "connected to modbus server");

        Ok(Box::new(ModbusSession {
            ctx: Some(ctx),
            read_timeout: self.config.read_timeout,
        }))
    }
}

/// Modbus TCP 会话
struct ModbusSession {
    ctx: Option<Context>,
    read_timeout: Duration,
}

impl ModbusSession {
    fn ctx(&mut self) -> Result<&mut Context, ProtocolError> {
        self.ctx.as_mut().ok_or(ProtocolError::SessionClosed)
    }
}

#[async_trait]
impl DeviceSession for ModbusSession {
    async fn read(
        &mut self,
        primitive: ReadPrimitive,
        spec: &AddressSpec,
    ) -> Result<RawField, ProtocolError> {
        let (offset, count) = offset_count(spec)?;
        let read_timeout = self.read_timeout;
        let ctx = self.ctx()?;

        let raw = with_timeout(read_timeout, "modbus read", async {
            let raw = match primitive {
                ReadPrimitive::Coils => RawField::Bits(
                    ctx.read_coils(offset, count)
                        .await
                        .map_err(|e| ProtocolError::Modbus(e.to_string()))?
                        .map_err(|e| ProtocolError::Modbus(format!("exception: {:?}", e)))?,
                ),
                ReadPrimitive::DiscreteInputs => RawField::Bits(
                    ctx.read_discrete_inputs(offset, count)
                        .await
                        .map_err(|e| ProtocolError::Modbus(e.to_string()))?
                        .map_err(|e| ProtocolError::Modbus(format!("exception: {:?}", e)))?,
                ),
                ReadPrimitive::HoldingRegisters => RawField::Registers(
                    ctx.read_holding_registers(offset, count)
                        .await
                        .map_err(|e| ProtocolError::Modbus(e.to_string()))?
                        .map_err(|e| ProtocolError::Modbus(format!("exception: {:?}", e)))?,
                ),
                ReadPrimitive::InputRegisters => RawField::Registers(
                    ctx.read_input_registers(offset, count)
                        .await
                        .map_err(|e| ProtocolError::Modbus(e.to_string()))?
                        .map_err(|e| ProtocolError::Modbus(format!("exception: {:?}", e)))?,
                ),
                other => {
                    return Err(ProtocolError::Unsupported(format!(
                        "{:?} over modbus tcp",
                        other
                    )));
                }
            };
            Ok(raw)
        })
        .await?;

        debug!(?primitive, offset, count, ?raw, "read modbus data");
        Ok(raw)
    }

    async fn close(&mut self) -> Result<(), ProtocolError> {
        if let Some(mut ctx) = self.ctx.take() {
            ctx.disconnect()
                .await
                .map_err(|e| ProtocolError::Modbus(e.to_string()))?;
        }
        Ok(())
    }
}
