//! 应用运行配置加载：环境变量 + INI 设备地址表。

mod devices;

pub use devices::{DeviceConfig, load_device_config};

use std::env;
use std::time::Duration;

/// 配置加载错误。
///
/// 均为启动期致命错误，不在请求处理中捕获。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
    #[error("ini error: {0}")]
    Ini(String),
    #[error("missing section for device {0}")]
    MissingSection(String),
    #[error("invalid address [{section}] {key} = {value}")]
    InvalidAddress {
        section: String,
        key: String,
        value: String,
    },
    #[error("duplicate key [{section}] {key}")]
    DuplicateKey { section: String, key: String },
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub device_config_path: String,
    pub liveness_probe_enabled: bool,
    pub ping_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub modbus_unit_id: u8,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_addr = env::var("GW_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let device_config_path =
            env::var("GW_DEVICE_CONFIG").unwrap_or_else(|_| "config.ini".to_string());
        let liveness_probe_enabled = read_bool_with_default("GW_LIVENESS_PROBE", true);
        let ping_timeout_ms = read_u64_with_default("GW_PING_TIMEOUT_MS", 100)?;
        let connect_timeout_ms = read_u64_with_default("GW_CONNECT_TIMEOUT_MS", 5000)?;
        let read_timeout_ms = read_u64_with_default("GW_READ_TIMEOUT_MS", 3000)?;
        let modbus_unit_id = read_u8_with_default("GW_MODBUS_UNIT_ID", 1)?;

        Ok(Self {
            http_addr,
            device_config_path,
            liveness_probe_enabled,
            ping_timeout_ms,
            connect_timeout_ms,
            read_timeout_ms,
            modbus_unit_id,
        })
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

fn read_u8_with_default(key: &str, default: u8) -> Result<u8, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u8>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}
