//! 机器人 XML-RPC 适配器
//!
//! 控制器在 `http://<ip>:20003/RPC2` 提供 XML-RPC 服务，
//! 每个返回值都是数组，首元素为错误码（0 表示成功）。
//!
//! | 原语 | 方法 | 返回 |
//! |------|------|------|
//! | RobotJointDegrees | `GetActualJointPosDegree(0)` | `[err, j1..j6]` |
//! | RobotDigitalInputs | `GetDI(id, 0)`，逐个 id 调用 | `[err, level]` |

use crate::adapter::{offset_count, with_timeout, DeviceSession, ProtocolAdapter};
use crate::error::ProtocolError;
use async_trait::async_trait;
use domain::{AddressSpec, RawField, ReadPrimitive};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// 机器人 RPC 配置
#[derive(Debug, Clone)]
pub struct RobotRpcConfig {
    /// XML-RPC 端口（默认 20003）
    pub port: u16,
    /// RPC 路径
    pub path: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for RobotRpcConfig {
    fn default() -> Self {
        Self {
            port: 20003,
            path: "/RPC2".to_string(),
            connect_timeout: Duration::from_millis(5000),
            read_timeout: Duration::from_millis(3000),
        }
    }
}

/// 机器人 RPC 适配器
pub struct RobotRpcAdapter {
    config: RobotRpcConfig,
}

impl RobotRpcAdapter {
    pub fn new(config: RobotRpcConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ProtocolAdapter for RobotRpcAdapter {
    async fn open(&self, ip: &str) -> Result<Box<dyn DeviceSession>, ProtocolError> {
        let ip_addr: IpAddr = ip
            .parse()
            .map_err(|e| ProtocolError::Connection(format!("invalid address {}: {}", ip, e)))?;
        let addr = SocketAddr::new(ip_addr, self.config.port);

        // 先确认 RPC 端口可连，HTTP 客户端本身是惰性连接
        with_timeout(self.config.connect_timeout, "rpc connect", async {
            TcpStream::connect(addr)
                .await
                .map(drop)
                .map_err(|e| ProtocolError::Connection(e.to_string()))
        })
        .await?;

        let client = reqwest::Client::builder()
            .connect_timeout(self.config.connect_timeout)
            .build()
            .map_err(|e| ProtocolError::Connection(e.to_string()))?;

        debug!(%addr, "connected to robot rpc");

        Ok(Box::new(RobotRpcSession {
            client: Some(client),
            url: format!("http://{}{}", addr, self.config.path),
            read_timeout: self.config.read_timeout,
        }))
    }
}

/// 机器人 RPC 会话
struct RobotRpcSession {
    client: Option<reqwest::Client>,
    url: String,
    read_timeout: Duration,
}

impl RobotRpcSession {
    async fn call(&self, method: &str, args: &[i32]) -> Result<Vec<f64>, ProtocolError> {
        let client = self.client.as_ref().ok_or(ProtocolError::SessionClosed)?;
        let body = method_call(method, args);

        let text = with_timeout(self.read_timeout, method, async {
            let response = client
                .post(&self.url)
                .header(reqwest::header::CONTENT_TYPE, "text/xml")
                .body(body)
                .send()
                .await
                .map_err(|e| ProtocolError::Rpc(e.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(ProtocolError::Rpc(format!("{} returned http {}", method, status)));
            }
            response
                .text()
                .await
                .map_err(|e| ProtocolError::Rpc(e.to_string()))
        })
        .await?;

        parse_method_response(method, &text)
    }
}

#[async_trait]
impl DeviceSession for RobotRpcSession {
    async fn read(
        &mut self,
        primitive: ReadPrimitive,
        spec: &AddressSpec,
    ) -> Result<RawField, ProtocolError> {
        match primitive {
            ReadPrimitive::RobotJointDegrees => {
                let joints = self.call("GetActualJointPosDegree", &[0]).await?;
                debug!(?joints, "read robot joints");
                Ok(RawField::Floats(joints))
            }
            ReadPrimitive::RobotDigitalInputs => {
                let (offset, count) = offset_count(spec)?;
                let start = offset as u32;
                let mut levels = Vec::with_capacity(count as usize);
                for id in start..start + count as u32 {
                    let reply = self.call("GetDI", &[id as i32, 0]).await?;
                    let level = reply.first().copied().ok_or_else(|| {
                        ProtocolError::DataParse(format!("GetDI({}) returned no level", id))
                    })?;
                    levels.push(level as i32);
                }
                debug!(offset, count, ?levels, "read robot digital inputs");
                Ok(RawField::Ints(levels))
            }
            other => Err(ProtocolError::Unsupported(format!("{:?} over robot rpc", other))),
        }
    }

    async fn close(&mut self) -> Result<(), ProtocolError> {
        self.client.take();
        Ok(())
    }
}

fn method_call(method: &str, args: &[i32]) -> String {
    let mut body = String::from("<?xml version=\"1.0\"?><methodCall><methodName>");
    body.push_str(method);
    body.push_str("</methodName><params>");
    for arg in args {
        body.push_str(&format!("<param><value><int>{}</int></value></param>", arg));
    }
    body.push_str("</params></methodCall>");
    body
}

/// 解析返回数组：校验首元素错误码，返回其余元素。
fn parse_method_response(method: &str, body: &str) -> Result<Vec<f64>, ProtocolError> {
    let reply = parse_reply(body)?;
    if reply.fault {
        let code = reply.values.first().copied().unwrap_or_default();
        return Err(ProtocolError::Rpc(format!("{} fault {}", method, code)));
    }
    let (code, rest) = reply
        .values
        .split_first()
        .ok_or_else(|| ProtocolError::DataParse(format!("{} returned empty reply", method)))?;
    if *code != 0.0 {
        return Err(ProtocolError::Rpc(format!(
            "{} returned error code {}",
            method, code
        )));
    }
    Ok(rest.to_vec())
}

/// XML-RPC 文档中的数值标量（文档顺序），以及是否为 `<fault>` 回复。
#[derive(Debug, Default)]
struct Reply {
    fault: bool,
    values: Vec<f64>,
}

fn parse_reply(body: &str) -> Result<Reply, ProtocolError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut reply = Reply::default();
    // 当前尚未读到文本的数值标签
    let mut pending: Option<String> = None;
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(start) => match start.name().as_ref() {
                b"fault" => reply.fault = true,
                tag if is_scalar_tag(tag) => {
                    pending = Some(String::from_utf8_lossy(tag).into_owned());
                }
                _ => {}
            },
            Event::Empty(empty) if is_scalar_tag(empty.name().as_ref()) => {
                let tag = String::from_utf8_lossy(empty.name().as_ref()).into_owned();
                return Err(ProtocolError::DataParse(format!("empty <{}>", tag)));
            }
            Event::Text(text) => {
                if let Some(tag) = pending.take() {
                    let text = text.unescape().map_err(xml_error)?;
                    let value = text.trim().parse::<f64>().map_err(|_| {
                        ProtocolError::DataParse(format!("invalid <{}> value: {}", tag, text))
                    })?;
                    reply.values.push(value);
                }
            }
            Event::End(_) => {
                if let Some(tag) = pending.take() {
                    return Err(ProtocolError::DataParse(format!("empty <{}>", tag)));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(reply)
}

fn xml_error(e: impl std::fmt::Display) -> ProtocolError {
    ProtocolError::DataParse(format!("invalid xml-rpc document: {}", e))
}

fn is_scalar_tag(tag: &[u8]) -> bool {
    matches!(tag, b"i4" | b"i8" | b"int" | b"double" | b"boolean")
}
