//! 设备族与读取原语。

/// 设备族。
///
/// 每个设备族对应配置文件中的一个节（section），
/// 共享同一种协议适配器和同一张字段解码规则表。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceFamily {
    /// 遨博协作机器人（Modbus TCP，变体 A）
    Aubo,
    /// 艾利特协作机器人（Modbus TCP，变体 B）
    Elite,
    /// 信捷 PLC（Modbus TCP，REAL/INT 寄存器）
    XinJie,
    /// 通用 Modbus TCP 设备
    ModbusTcp,
    /// 西门子 S7-1200 PLC
    Siemens1200,
    /// 法奥协作机器人（XML-RPC）
    Fairino,
}

/// 设备族使用的传输协议。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    ModbusTcp,
    S7,
    RobotRpc,
}

impl DeviceFamily {
    pub const ALL: [DeviceFamily; 6] = [
        DeviceFamily::Aubo,
        DeviceFamily::Elite,
        DeviceFamily::XinJie,
        DeviceFamily::ModbusTcp,
        DeviceFamily::Siemens1200,
        DeviceFamily::Fairino,
    ];

    /// 配置文件中的节名，同时也是 HTTP 资源名。
    pub fn section(&self) -> &'static str {
        match self {
            DeviceFamily::Aubo => "Aubo",
            DeviceFamily::Elite => "Elite",
            DeviceFamily::XinJie => "XinJie",
            DeviceFamily::ModbusTcp => "ModbusTCP",
            DeviceFamily::Siemens1200 => "Siemens1200",
            DeviceFamily::Fairino => "Fairino",
        }
    }

    /// 按节名查找设备族（忽略大小写）。
    pub fn from_section(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|family| family.section().eq_ignore_ascii_case(name))
    }

    pub fn transport(&self) -> Transport {
        match self {
            DeviceFamily::Aubo
            | DeviceFamily::Elite
            | DeviceFamily::XinJie
            | DeviceFamily::ModbusTcp => Transport::ModbusTcp,
            DeviceFamily::Siemens1200 => Transport::S7,
            DeviceFamily::Fairino => Transport::RobotRpc,
        }
    }

    /// 地址参数中“数量”所在下标：S7 为 `[db, start, len]`，其余为 `[offset, count]`。
    pub fn count_index(&self) -> usize {
        match self {
            DeviceFamily::Siemens1200 => 2,
            _ => 1,
        }
    }
}

impl std::fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.section())
    }
}

/// 会话读取原语。
///
/// 字段标签 → 原语的映射由解码规则表决定，会话只负责执行原语。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadPrimitive {
    /// Modbus 0x01
    Coils,
    /// Modbus 0x02
    DiscreteInputs,
    /// Modbus 0x03
    HoldingRegisters,
    /// Modbus 0x04
    InputRegisters,
    /// S7 DB 块字节读取，参数 `[db, start, len]`
    DataBlockBytes,
    /// 机器人实际关节位置（度）
    RobotJointDegrees,
    /// 机器人数字输入，`[offset, offset+count)` 逐个读取
    RobotDigitalInputs,
}
