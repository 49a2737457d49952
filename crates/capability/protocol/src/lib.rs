//! # 协议通信能力模块
//!
//! 为采集编排提供设备访问能力：
//! - **存活探测**：建立会话前用 ICMP echo 快速排除离线设备
//! - **Modbus TCP**：线圈、离散输入、保持寄存器、输入寄存器
//! - **S7**：西门子 PLC DB 区字节块
//! - **机器人 RPC**：XML-RPC 读取关节角与数字输入
//!
//! ## 架构设计
//!
//! ```text
//! DeviceFamily ──adapter_for──▶ Arc<dyn ProtocolAdapter>
//!                                      │ open(ip)
//!                                      ▼
//!                              Box<dyn DeviceSession>
//!                                      │ read(primitive, spec) × N
//!                                      │ close()
//!                                      ▼
//!                                   RawField
//! ```
//!
//! 会话只执行读取原语，字段标签 → 原语 / 解码规则的映射在 `gw-decode`。
//!
//! ## 端口
//!
//! | 协议 | 端口 |
//! |------|------|
//! | Modbus TCP | 502 |
//! | S7 (ISO-on-TCP) | 102 |
//! | 机器人 XML-RPC | 20003 |

mod adapter;
mod error;
mod liveness;
mod modbus_tcp;
mod robot_rpc;
mod s7;

pub use adapter::{adapter_for, AdapterConfig, DeviceSession, ProtocolAdapter};
pub use error::ProtocolError;
pub use liveness::{IcmpProbe, LivenessProbe, SkipProbe};
pub use modbus_tcp::{ModbusTcpAdapter, ModbusTcpConfig};
pub use robot_rpc::{RobotRpcAdapter, RobotRpcConfig};
pub use s7::{S7Adapter, S7Config};
