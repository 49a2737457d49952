//! 地址表模型。

use crate::family::DeviceFamily;
use indexmap::IndexMap;
use indexmap::map::Entry;

/// 地址参数非法。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidAddressSpec {
    #[error("address spec is empty")]
    Empty,
    #[error("address count must be greater than zero")]
    ZeroCount,
}

/// 单个字段的地址参数。
///
/// 通常为 `[offset, count]`，S7 字节块读取为 `[db, start, len]`。
/// 参数的具体含义由设备族和字段标签决定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSpec(Vec<u16>);

impl AddressSpec {
    /// `[offset, count, ...]` 形式，下标 1 为数量。
    pub fn new(params: Vec<u16>) -> Result<Self, InvalidAddressSpec> {
        Self::with_count_at(params, 1)
    }

    /// 按设备族的参数布局校验数量参数。
    pub fn for_family(family: DeviceFamily, params: Vec<u16>) -> Result<Self, InvalidAddressSpec> {
        Self::with_count_at(params, family.count_index())
    }

    fn with_count_at(params: Vec<u16>, count_index: usize) -> Result<Self, InvalidAddressSpec> {
        if params.is_empty() {
            return Err(InvalidAddressSpec::Empty);
        }
        if params.get(count_index) == Some(&0) {
            return Err(InvalidAddressSpec::ZeroCount);
        }
        Ok(Self(params))
    }

    pub fn params(&self) -> &[u16] {
        &self.0
    }

    pub fn param(&self, index: usize) -> Option<u16> {
        self.0.get(index).copied()
    }

    pub fn offset(&self) -> Option<u16> {
        self.param(0)
    }

    pub fn count(&self) -> Option<u16> {
        self.param(1)
    }
}

/// 单个 IP 的字段标签 → 地址参数（保持配置顺序）。
pub type FieldAddresses = IndexMap<String, AddressSpec>;

/// 设备族地址表：IP → 字段标签 → 地址参数。
///
/// 启动时构建一次，之后只读共享。
#[derive(Debug, Clone)]
pub struct AddressMap {
    family: DeviceFamily,
    devices: IndexMap<String, FieldAddresses>,
}

impl AddressMap {
    pub fn new(family: DeviceFamily) -> Self {
        Self {
            family,
            devices: IndexMap::new(),
        }
    }

    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    /// 插入一个设备的字段表；IP 已存在时保留原值并返回 false。
    pub fn insert_device(&mut self, ip: impl Into<String>, fields: FieldAddresses) -> bool {
        match self.devices.entry(ip.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(fields);
                true
            }
        }
    }

    pub fn fields(&self, ip: &str) -> Option<&FieldAddresses> {
        self.devices.get(ip)
    }

    pub fn contains(&self, ip: &str) -> bool {
        self.devices.contains_key(ip)
    }

    /// 按配置顺序返回全部 IP。
    pub fn ips(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
