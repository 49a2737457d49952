//! (设备族, 字段标签) → 读取原语 + 解码规则。

use crate::Decoding;
use domain::{DeviceFamily, ReadPrimitive};

/// 一个字段的读取与解码规则。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub primitive: ReadPrimitive,
    pub decoding: Decoding,
}

impl FieldRule {
    const fn new(primitive: ReadPrimitive, decoding: Decoding) -> Self {
        Self {
            primitive,
            decoding,
        }
    }
}

/// 查找字段规则；未识别的标签返回 `None`（跳过，不视为错误）。
pub fn field_rule(family: DeviceFamily, tag: &str) -> Option<FieldRule> {
    use Decoding::*;
    use ReadPrimitive::*;

    let rule = match (family, tag) {
        (DeviceFamily::Aubo, "Joint") => FieldRule::new(InputRegisters, Signed16),
        // DO 与 DI 一样走离散输入读取
        (DeviceFamily::Aubo, "DI" | "DO") => FieldRule::new(DiscreteInputs, Bools),
        (DeviceFamily::Aubo, "AO") => FieldRule::new(HoldingRegisters, Unsigned16),

        (DeviceFamily::Elite, "Joint") => FieldRule::new(HoldingRegisters, AngleDegrees),
        (DeviceFamily::Elite, "DI" | "DO") => FieldRule::new(HoldingRegisters, BitString),

        (DeviceFamily::XinJie, "REAL") => FieldRule::new(HoldingRegisters, Float32LowHigh),
        (DeviceFamily::XinJie, "INT") => FieldRule::new(HoldingRegisters, Signed16),

        (DeviceFamily::ModbusTcp, "ReadCoils") => FieldRule::new(Coils, Bools),
        (DeviceFamily::ModbusTcp, "ReadInputs") => FieldRule::new(DiscreteInputs, Bools),
        (DeviceFamily::ModbusTcp, "ReadHoldingRegisters") => {
            FieldRule::new(HoldingRegisters, Signed16)
        }
        (DeviceFamily::ModbusTcp, "ReadInputRegisters") => {
            FieldRule::new(InputRegisters, Signed16)
        }

        // S7 的任意标签都是 DB 字节块
        (DeviceFamily::Siemens1200, _) => FieldRule::new(DataBlockBytes, Bytes),

        (DeviceFamily::Fairino, "Joint") => FieldRule::new(RobotJointDegrees, RobotFloats),
        (DeviceFamily::Fairino, "DI") => FieldRule::new(RobotDigitalInputs, RobotInts),

        _ => return None,
    };
    Some(rule)
}
