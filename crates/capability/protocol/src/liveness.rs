//! 设备存活探测。

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

/// 存活探测：建立协议会话前判断设备是否可达。
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn probe(&self, ip: &str) -> bool;
}

/// ICMP echo 探测，单次发送，不重试。
#[derive(Debug, Clone)]
pub struct IcmpProbe {
    timeout: Duration,
}

impl IcmpProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for IcmpProbe {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

#[async_trait]
impl LivenessProbe for IcmpProbe {
    async fn probe(&self, ip: &str) -> bool {
        let Ok(addr) = ip.parse::<IpAddr>() else {
            debug!(ip, "unparsable ip, treated as unreachable");
            return false;
        };
        let payload = [0u8; 8];
        match tokio::time::timeout(self.timeout, surge_ping::ping(addr, &payload)).await {
            Ok(Ok((_, rtt))) => {
                debug!(ip, rtt_us = rtt.as_micros() as u64, "icmp echo ok");
                true
            }
            Ok(Err(err)) => {
                debug!(ip, error = %err, "icmp echo failed");
                false
            }
            Err(_) => {
                debug!(ip, timeout_ms = self.timeout.as_millis() as u64, "icmp echo timed out");
                false
            }
        }
    }
}

/// 跳过探测（无 raw socket 权限的宿主机）。
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipProbe;

#[async_trait]
impl LivenessProbe for SkipProbe {
    async fn probe(&self, _ip: &str) -> bool {
        true
    }
}
