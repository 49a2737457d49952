//! 协议错误类型定义

/// 协议通信错误
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// 连接错误
    #[error("connection error: {0}")]
    Connection(String),

    /// IO 错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Modbus 错误
    #[error("modbus error: {0}")]
    Modbus(String),

    /// S7 错误
    #[error("s7 error: {0}")]
    S7(String),

    /// 机器人 RPC 错误
    #[error("rpc error: {0}")]
    Rpc(String),

    /// 地址参数不足
    #[error("address spec missing parameter: {0}")]
    MissingParameter(&'static str),

    /// 会话不支持的读取原语
    #[error("unsupported read: {0}")]
    Unsupported(String),

    /// 数据解析错误
    #[error("data parse error: {0}")]
    DataParse(String),

    /// 超时错误
    #[error("timeout: {0}")]
    Timeout(String),

    /// 会话已关闭
    #[error("session closed")]
    SessionClosed,
}
