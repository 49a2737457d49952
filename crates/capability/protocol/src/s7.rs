//! Siemens S7 适配器（ISO-on-TCP）
//!
//! 仅实现采集需要的最小子集：
//! - TPKT + COTP 连接请求（本地 TSAP 0x0100，远端 TSAP 由机架 / 槽位决定）
//! - S7 Setup Communication 协商 PDU 大小
//! - DB 区字节块读取（按 PDU 大小分片）
//!
//! 地址参数格式：`[db 编号, 起始字节, 字节长度]`。

use crate::adapter::{with_timeout, DeviceSession, ProtocolAdapter};
use crate::error::ProtocolError;
use async_trait::async_trait;
use domain::{AddressSpec, RawField, ReadPrimitive};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

const TPKT_HEADER_LEN: usize = 4;
const MAX_FRAME_LEN: usize = 4096;
/// 读响应中除数据外的固定开销
const READ_OVERHEAD: usize = 18;
const AREA_DB: u8 = 0x84;
const COTP_CONNECTION_CONFIRM: u8 = 0xD0;
const ITEM_OK: u8 = 0xFF;

/// S7 配置
#[derive(Debug, Clone)]
pub struct S7Config {
    /// ISO-on-TCP 端口（默认 102）
    pub port: u16,
    pub rack: u8,
    pub slot: u8,
    /// 连接超时（含 COTP 与 Setup Communication）
    pub connect_timeout: Duration,
    /// 单次读取超时
    pub read_timeout: Duration,
    /// 请求的 PDU 大小
    pub requested_pdu: u16,
}

impl Default for S7Config {
    fn default() -> Self {
        Self {
            port: 102,
            rack: 0,
            slot: 1,
            connect_timeout: Duration::from_millis(5000),
            read_timeout: Duration::from_millis(3000),
            requested_pdu: 480,
        }
    }
}

/// S7 适配器
pub struct S7Adapter {
    config: S7Config,
}

impl S7Adapter {
    pub fn new(config: S7Config) -> Self {
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
impl ProtocolAdapter for S7Adapter {
    async fn open(&self, ip: &str) -> Result<Box<dyn DeviceSession>, ProtocolError> {
        let addr = self.socket_addr(ip)?;
        let config = self.config.clone();

        let session = with_timeout(config.connect_timeout, "s7 connect", async move {
            let mut stream = TcpStream::connect(addr)
                .await
                .map_err(|e| ProtocolError::Connection(e.to_string()))?;
            stream.set_nodelay(true)?;

            stream
                .write_all(&connection_request(config.rack, config.slot))
                .await?;
            let confirm = read_frame(&mut stream).await?;
            if confirm.get(5) != Some(&COTP_CONNECTION_CONFIRM) {
                return Err(ProtocolError::Connection(
                    "iso connection refused by plc".to_string(),
                ));
            }

            stream
                .write_all(&setup_communication_request(config.requested_pdu))
                .await?;
            let ack = read_frame(&mut stream).await?;
            let pdu_size = negotiated_pdu(&ack)?;

            debug!(%addr, rack = config.rack, slot = config.slot, pdu_size, "connected to s7 plc");

            Ok(S7Session {
                stream: Some(stream),
                pdu_size,
                pdu_ref: 0,
                read_timeout: config.read_timeout,
            })
        })
        .await?;

        Ok(Box::new(session))
    }
}

/// S7 会话
struct S7Session {
    stream: Option<TcpStream>,
    pdu_size: u16,
    pdu_ref: u16,
    read_timeout: Duration,
}

impl S7Session {
    fn next_ref(&mut self) -> u16 {
        self.pdu_ref = self.pdu_ref.wrapping_add(1);
        self.pdu_ref
    }

    async fn read_db(&mut self, db: u16, start: u16, length: u16) -> Result<Vec<u8>, ProtocolError> {
        let length = length as usize;
        let chunk_max = (self.pdu_size as usize).saturating_sub(READ_OVERHEAD).max(1);
        let mut out = Vec::with_capacity(length);

        while out.len() < length {
            let chunk = (length - out.len()).min(chunk_max);
            let request = read_var_request(
                self.next_ref(),
                db,
                start as u32 + out.len() as u32,
                chunk as u16,
            );
            let stream = self.stream.as_mut().ok_or(ProtocolError::SessionClosed)?;
            stream.write_all(&request).await?;
            let frame = read_frame(stream).await?;
            let data = parse_read_response(&frame)?;
            if data.len() != chunk {
                return Err(ProtocolError::DataParse(format!(
                    "expected {} bytes, plc returned {}",
                    chunk,
                    data.len()
                )));
            }
            out.extend_from_slice(data);
        }
        Ok(out)
    }
}

#[async_trait]
impl DeviceSession for S7Session {
    async fn read(
        &mut self,
        primitive: ReadPrimitive,
        spec: &AddressSpec,
    ) -> Result<RawField, ProtocolError> {
        if primitive != ReadPrimitive::DataBlockBytes {
            return Err(ProtocolError::Unsupported(format!("{:?} over s7", primitive)));
        }
        let db = spec.param(0).ok_or(ProtocolError::MissingParameter("db"))?;
        let start = spec.param(1).ok_or(ProtocolError::MissingParameter("start"))?;
        let length = spec
            .param(2)
            .ok_or(ProtocolError::MissingParameter("length"))?;

        let read_timeout = self.read_timeout;
        let bytes = with_timeout(read_timeout, "s7 read", self.read_db(db, start, length)).await?;

        debug!(db, start, length, "read s7 data block");
        Ok(RawField::Bytes(bytes))
    }

    async fn close(&mut self) -> Result<(), ProtocolError> {
        if let Some(mut stream) = self.stream.take() {
            stream.shutdown().await?;
        }
        Ok(())
    }
}

/// TPKT + COTP 连接请求。
fn connection_request(rack: u8, slot: u8) -> [u8; 22] {
    let remote_tsap = (rack << 5) | (slot & 0x1F);
    [
        0x03, 0x00, 0x00, 0x16, // TPKT
        0x11, 0xE0, 0x00, 0x00, 0x00, 0x01, 0x00, // COTP CR
        0xC0, 0x01, 0x0A, // TPDU size 1024
        0xC1, 0x02, 0x01, 0x00, // 本地 TSAP
        0xC2, 0x02, 0x01, remote_tsap, // 远端 TSAP
    ]
}

fn setup_communication_request(pdu: u16) -> [u8; 25] {
    let [hi, lo] = pdu.to_be_bytes();
    [
        0x03, 0x00, 0x00, 0x19, // TPKT
        0x02, 0xF0, 0x80, // COTP DT
        0x32, 0x01, 0x00, 0x00, 0x04, 0x00, 0x00, 0x08, 0x00, 0x00, // S7 header
        0xF0, 0x00, 0x00, 0x01, 0x00, 0x01, hi, lo,
    ]
}

/// DB 区读请求，`start` 为字节地址。
fn read_var_request(pdu_ref: u16, db: u16, start: u32, length: u16) -> [u8; 31] {
    let [ref_hi, ref_lo] = pdu_ref.to_be_bytes();
    let [len_hi, len_lo] = length.to_be_bytes();
    let [db_hi, db_lo] = db.to_be_bytes();
    let bit_address = start * 8;
    [
        0x03, 0x00, 0x00, 0x1F, // TPKT
        0x02, 0xF0, 0x80, // COTP DT
        0x32, 0x01, 0x00, 0x00, ref_hi, ref_lo, 0x00, 0x0E, 0x00, 0x00, // S7 header
        0x04, 0x01, // read var, 1 item
        0x12, 0x0A, 0x10, 0x02, len_hi, len_lo, db_hi, db_lo, AREA_DB,
        (bit_address >> 16) as u8,
        (bit_address >> 8) as u8,
        bit_address as u8,
    ]
}

async fn read_frame<R>(reader: &mut R) -> Result<Vec<u8>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; TPKT_HEADER_LEN];
    reader.read_exact(&mut header).await?;
    if header[0] != 0x03 {
        return Err(ProtocolError::DataParse(format!(
            "invalid tpkt version 0x{:02X}",
            header[0]
        )));
    }
    let length = u16::from_be_bytes([header[2], header[3]]) as usize;
    if !(7..=MAX_FRAME_LEN).contains(&length) {
        return Err(ProtocolError::DataParse(format!(
            "invalid tpkt length {}",
            length
        )));
    }
    let mut frame = vec![0u8; length];
    frame[..TPKT_HEADER_LEN].copy_from_slice(&header);
    reader.read_exact(&mut frame[TPKT_HEADER_LEN..]).await?;
    Ok(frame)
}

fn check_header_error(frame: &[u8]) -> Result<(), ProtocolError> {
    let class = *frame
        .get(17)
        .ok_or_else(|| ProtocolError::DataParse("short s7 ack".to_string()))?;
    let code = *frame
        .get(18)
        .ok_or_else(|| ProtocolError::DataParse("short s7 ack".to_string()))?;
    if class != 0 || code != 0 {
        return Err(ProtocolError::S7(format!(
            "error class 0x{:02X} code 0x{:02X}",
            class, code
        )));
    }
    Ok(())
}

fn negotiated_pdu(frame: &[u8]) -> Result<u16, ProtocolError> {
    check_header_error(frame)?;
    let bytes = frame
        .get(25..27)
        .ok_or_else(|| ProtocolError::DataParse("short setup communication ack".to_string()))?;
    let pdu = u16::from_be_bytes([bytes[0], bytes[1]]);
    if pdu == 0 {
        return Err(ProtocolError::S7("negotiated pdu size is zero".to_string()));
    }
    Ok(pdu)
}

fn parse_read_response(frame: &[u8]) -> Result<&[u8], ProtocolError> {
    if frame.get(7) != Some(&0x32) {
        return Err(ProtocolError::DataParse("not an s7 frame".to_string()));
    }
    check_header_error(frame)?;
    let item = frame
        .get(21..25)
        .ok_or_else(|| ProtocolError::DataParse("short read response".to_string()))?;
    if item[0] != ITEM_OK {
        return Err(ProtocolError::S7(format!(
            "read item return code 0x{:02X}",
            item[0]
        )));
    }
    let raw_len = u16::from_be_bytes([item[2], item[3]]) as usize;
    // BYTE/WORD/DWORD 与 INTEGER 传输类型以位计长度
    let byte_len = match item[1] {
        0x04 | 0x05 => raw_len / 8,
        _ => raw_len,
    };
    frame
        .get(25..25 + byte_len)
        .ok_or_else(|| ProtocolError::DataParse("truncated read response".to_string()))
}
