//! # 寄存器解码能力模块
//!
//! 将会话读取到的原始数据（[`RawField`]）按设备族与字段标签解码为 [`FieldValue`]。
//!
//! ```text
//! (DeviceFamily, tag) ──field_rule──▶ FieldRule { primitive, decoding }
//!                                          │            │
//!                              session.read(primitive)  │
//!                                          ▼            ▼
//!                                      RawField ──decode──▶ FieldValue
//! ```
//!
//! 所有解码函数都是纯函数：不修改输入，相同输入得到相同输出。

mod registers;
mod rules;

pub use registers::{angle_degrees, bit_string, float32_low_high, signed16};
pub use rules::{FieldRule, field_rule};

use domain::{FieldValue, RawField};

/// 解码错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// 浮点重组需要成对寄存器
    #[error("odd register count for 32-bit decode: {0}")]
    OddRegisterCount(usize),

    /// 原始数据形态与解码规则不匹配
    #[error("unexpected raw shape: expected {expected}, got {actual}")]
    UnexpectedShape {
        expected: &'static str,
        actual: &'static str,
    },
}

/// 解码规则。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoding {
    /// 寄存器按补码重解释为 i16
    Signed16,
    /// 寄存器原值
    Unsigned16,
    /// i16 / 5000.0 弧度 → 度
    AngleDegrees,
    /// 数字量按通道顺序展开为位串
    BitString,
    /// 相邻两个寄存器（低位在前）重组为 f32
    Float32LowHigh,
    /// 线圈 / 离散输入
    Bools,
    /// S7 字节块
    Bytes,
    /// 机器人浮点数组（收窄为 f32）
    RobotFloats,
    /// 机器人整数数组
    RobotInts,
}

/// 按解码规则解码一个字段。
pub fn decode(decoding: Decoding, raw: &RawField) -> Result<FieldValue, DecodeError> {
    match (decoding, raw) {
        (Decoding::Signed16, RawField::Registers(words)) => {
            Ok(FieldValue::Int16List(signed16(words)))
        }
        (Decoding::Unsigned16, RawField::Registers(words)) => {
            Ok(FieldValue::Uint16List(words.clone()))
        }
        (Decoding::AngleDegrees, RawField::Registers(words)) => {
            Ok(FieldValue::Float64List(angle_degrees(words)))
        }
        (Decoding::BitString, RawField::Registers(words)) => {
            Ok(FieldValue::BitString(bit_string(words)))
        }
        (Decoding::Float32LowHigh, RawField::Registers(words)) => {
            float32_low_high(words).map(FieldValue::Float32List)
        }
        (Decoding::Bools, RawField::Bits(bits)) => Ok(FieldValue::BoolList(bits.clone())),
        (Decoding::Bytes, RawField::Bytes(bytes)) => Ok(FieldValue::Bytes(bytes.clone())),
        (Decoding::RobotFloats, RawField::Floats(values)) => Ok(FieldValue::Float32List(
            values.iter().map(|value| *value as f32).collect(),
        )),
        (Decoding::RobotInts, RawField::Ints(values)) => Ok(FieldValue::IntList(values.clone())),
        (decoding, raw) => Err(DecodeError::UnexpectedShape {
            expected: decoding.expected_kind(),
            actual: raw.kind(),
        }),
    }
}

impl Decoding {
    fn expected_kind(&self) -> &'static str {
        match self {
            Decoding::Signed16
            | Decoding::Unsigned16
            | Decoding::AngleDegrees
            | Decoding::BitString
            | Decoding::Float32LowHigh => "registers",
            Decoding::Bools => "bits",
            Decoding::Bytes => "bytes",
            Decoding::RobotFloats => "floats",
            Decoding::RobotInts => "ints",
        }
    }
}
