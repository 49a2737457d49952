//! 设备采集网关 HTTP 服务
//!
//! 启动流程：
//! 1. 加载 .env 与环境变量配置
//! 2. 读取 INI 设备地址表（失败即退出）
//! 3. 为每个已启用的设备族创建采集器（地址表 + 协议适配器 + 存活探测 + 快照缓存）
//! 4. 启动 axum 服务

mod handlers;
mod middleware;
mod routes;
mod utils;

use domain::DeviceFamily;
use gw_config::{AppConfig, load_device_config};
use gw_poller::DevicePoller;
use gw_protocol::{AdapterConfig, IcmpProbe, LivenessProbe, SkipProbe, adapter_for};
use gw_telemetry::init_tracing;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// 应用状态：每个设备族一个采集器。
#[derive(Clone)]
pub struct AppState {
    pollers: Arc<HashMap<DeviceFamily, Arc<DevicePoller>>>,
}

impl AppState {
    pub fn new(pollers: HashMap<DeviceFamily, Arc<DevicePoller>>) -> Self {
        Self {
            pollers: Arc::new(pollers),
        }
    }

    /// 按资源名（节名，忽略大小写）查找已启用的采集器。
    pub fn poller(&self, name: &str) -> Option<Arc<DevicePoller>> {
        let family = DeviceFamily::from_section(name)?;
        self.pollers.get(&family).cloned()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    // 设备地址表：缺节、非法地址均为启动期致命错误
    let devices = load_device_config(&config.device_config_path)?;

    let adapter_config = AdapterConfig {
        modbus_unit_id: config.modbus_unit_id,
        connect_timeout: config.connect_timeout(),
        read_timeout: config.read_timeout(),
    };
    let probe: Arc<dyn LivenessProbe> = if config.liveness_probe_enabled {
        Arc::new(IcmpProbe::new(config.ping_timeout()))
    } else {
        warn!("liveness probe disabled, every device is treated as reachable");
        Arc::new(SkipProbe)
    };

    let mut pollers = HashMap::new();
    for (family, map) in devices.into_maps() {
        info!(family = %family, devices = map.len(), "device poller ready");
        let poller = DevicePoller::new(
            Arc::new(map),
            adapter_for(family, &adapter_config),
            probe.clone(),
        );
        pollers.insert(family, Arc::new(poller));
    }

    let app = routes::build_app(AppState::new(pollers));

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(addr = %config.http_addr, "gateway listening");
    axum::serve(listener, app).await?;
    Ok(())
}
