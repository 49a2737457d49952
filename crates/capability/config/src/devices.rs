//! INI 设备地址表加载。
//!
//! ```ini
//! [Elite]
//! IP = 192.168.1.20,192.168.1.21
//!
//! [192.168.1.20]
//! Joint = 0,6
//! DI = 100,2
//! ```

use crate::ConfigError;
use domain::{AddressMap, AddressSpec, DeviceFamily, FieldAddresses};
use indexmap::IndexSet;
use ini::{Ini, Properties};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// 各设备族的地址表。
///
/// 配置文件中缺少的设备族不会出现在这里。
#[derive(Debug, Clone, Default)]
pub struct DeviceConfig {
    maps: HashMap<DeviceFamily, AddressMap>,
}

impl DeviceConfig {
    /// 从 INI 文本解析。
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|err| ConfigError::Ini(err.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut maps = HashMap::new();
        for family in DeviceFamily::ALL {
            let Some(section) = ini.section(Some(family.section())) else {
                warn!(family = %family, "device family section not found, family disabled");
                continue;
            };
            let map = load_family(ini, family, section)?;
            info!(family = %family, devices = map.len(), "device family loaded");
            maps.insert(family, map);
        }
        Ok(Self { maps })
    }

    pub fn address_map(&self, family: DeviceFamily) -> Option<&AddressMap> {
        self.maps.get(&family)
    }

    /// 已启用的设备族（按固定顺序）。
    pub fn families(&self) -> Vec<DeviceFamily> {
        DeviceFamily::ALL
            .into_iter()
            .filter(|family| self.maps.contains_key(family))
            .collect()
    }

    pub fn into_maps(self) -> HashMap<DeviceFamily, AddressMap> {
        self.maps
    }
}

/// 读取 INI 设备配置文件。
pub fn load_device_config(path: impl AsRef<Path>) -> Result<DeviceConfig, ConfigError> {
    let path = path.as_ref();
    let ini = Ini::load_from_file(path)
        .map_err(|err| ConfigError::Ini(format!("{}: {}", path.display(), err)))?;
    DeviceConfig::from_ini(&ini)
}

fn load_family(
    ini: &Ini,
    family: DeviceFamily,
    section: &Properties,
) -> Result<AddressMap, ConfigError> {
    let mut map = AddressMap::new(family);
    let Some(ip_list) = section.get("IP") else {
        warn!(family = %family, "device family has no IP key");
        return Ok(map);
    };

    for ip in parse_ip_list(ip_list) {
        let device_section = ini
            .section(Some(ip.as_str()))
            .ok_or_else(|| ConfigError::MissingSection(ip.clone()))?;
        let fields = parse_fields(family, &ip, device_section)?;
        map.insert_device(ip, fields);
    }
    Ok(map)
}

/// 逗号分隔的 IP 列表：去空白、去空项、去重（保留首次出现顺序）。
fn parse_ip_list(value: &str) -> Vec<String> {
    let mut seen = IndexSet::new();
    for entry in strip_comment(value).split(',') {
        let entry = entry.trim();
        if !entry.is_empty() {
            seen.insert(entry.to_string());
        }
    }
    seen.into_iter().collect()
}

fn parse_fields(
    family: DeviceFamily,
    section_name: &str,
    section: &Properties,
) -> Result<FieldAddresses, ConfigError> {
    let mut fields = FieldAddresses::new();
    for (key, value) in section.iter() {
        let spec = parse_address(family, section_name, key, value)?;
        if fields.insert(key.to_string(), spec).is_some() {
            return Err(ConfigError::DuplicateKey {
                section: section_name.to_string(),
                key: key.to_string(),
            });
        }
    }
    Ok(fields)
}

fn parse_address(
    family: DeviceFamily,
    section: &str,
    key: &str,
    value: &str,
) -> Result<AddressSpec, ConfigError> {
    let invalid = || ConfigError::InvalidAddress {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    };
    let params = strip_comment(value)
        .split(',')
        .map(|part| part.trim().parse::<u16>())
        .collect::<Result<Vec<u16>, _>>()
        .map_err(|_| invalid())?;
    AddressSpec::for_family(family, params).map_err(|_| invalid())
}

/// 去掉 `#` / `;` 开始的行内注释。
fn strip_comment(value: &str) -> &str {
    match value.find(['#', ';']) {
        Some(index) => &value[..index],
        None => value,
    }
}
