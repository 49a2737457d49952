//! 采集网关领域模型：设备族、地址表、原始读数与设备数据快照。

pub mod address;
pub mod data;
pub mod family;

pub use address::{AddressMap, AddressSpec, FieldAddresses, InvalidAddressSpec};
pub use data::{DataRecord, FieldValue, RawField, now_timestamp};
pub use family::{DeviceFamily, ReadPrimitive, Transport};
