use indexmap::IndexMap;

/// 会话读取到的原始数据（未解码）。
#[derive(Debug, Clone, PartialEq)]
pub enum RawField {
    /// 16 位寄存器
    Registers(Vec<u16>),
    /// 线圈 / 离散输入
    Bits(Vec<bool>),
    /// S7 DB 字节块
    Bytes(Vec<u8>),
    /// 机器人 RPC 返回的浮点数组
    Floats(Vec<f64>),
    /// 机器人 RPC 返回的整数数组
    Ints(Vec<i32>),
}

impl RawField {
    pub fn kind(&self) -> &'static str {
        match self {
            RawField::Registers(_) => "registers",
            RawField::Bits(_) => "bits",
            RawField::Bytes(_) => "bytes",
            RawField::Floats(_) => "floats",
            RawField::Ints(_) => "ints",
        }
    }
}

/// 解码后的字段值。
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int16List(Vec<i16>),
    Uint16List(Vec<u16>),
    BoolList(Vec<bool>),
    Float32List(Vec<f32>),
    Float64List(Vec<f64>),
    IntList(Vec<i32>),
    /// 按通道顺序展开的数字量位串，通道 0 在第 0 位
    BitString(String),
    Bytes(Vec<u8>),
}

/// 设备数据快照。
///
/// `data` 为 `None` 表示设备不可达或采集失败；
/// 否则包含该 IP 地址表中所有可识别的字段标签。
#[derive(Debug, Clone, PartialEq)]
pub struct DataRecord {
    pub ip: String,
    pub data: Option<IndexMap<String, FieldValue>>,
    pub timestamp: String,
}

impl DataRecord {
    pub fn success(ip: impl Into<String>, data: IndexMap<String, FieldValue>) -> Self {
        Self {
            ip: ip.into(),
            data: Some(data),
            timestamp: now_timestamp(),
        }
    }

    /// 空数据快照（离线、协议错误或汇总失败）。
    pub fn unavailable(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            data: None,
            timestamp: now_timestamp(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.data.is_some()
    }
}

/// 当前本地时间（`%Y-%m-%d %H:%M:%S`）。
pub fn now_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
