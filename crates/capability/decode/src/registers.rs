//! 寄存器级解码函数。

use crate::DecodeError;

/// 艾利特关节寄存器的弧度缩放系数。
const RADIAN_SCALE: f64 = 5000.0;

/// 每个寄存器展开的通道数。
const CHANNELS_PER_WORD: usize = 16;

/// 将每个寄存器按补码重解释为 i16。
pub fn signed16(words: &[u16]) -> Vec<i16> {
    words.iter().map(|word| *word as i16).collect()
}

/// 关节寄存器 → 角度（度）：`i16 / 5000.0 * 180 / π`。
pub fn angle_degrees(words: &[u16]) -> Vec<f64> {
    words
        .iter()
        .map(|word| *word as i16 as f64 / RADIAN_SCALE * 180.0 / std::f64::consts::PI)
        .collect()
}

/// 数字量寄存器 → 通道位串。
///
/// 每个寄存器先转为二进制串（高位在前，无前导零）；不足 16 位时左侧补 0，
/// 然后整体反转，使通道 0 落在第 0 位。按寄存器顺序拼接。
pub fn bit_string(words: &[u16]) -> String {
    let mut out = String::with_capacity(words.len() * CHANNELS_PER_WORD);
    for word in words {
        let binary = format!("{word:b}");
        let padded = if binary.len() >= CHANNELS_PER_WORD {
            binary
        } else {
            format!("{binary:0>width$}", width = CHANNELS_PER_WORD)
        };
        out.extend(padded.chars().rev());
    }
    out
}

/// 相邻寄存器对 → f32。
///
/// `words[i]` 为低 16 位、`words[i + 1]` 为高 16 位，
/// 按小端字节序解释，与主机字节序无关。
pub fn float32_low_high(words: &[u16]) -> Result<Vec<f32>, DecodeError> {
    if words.len() % 2 != 0 {
        return Err(DecodeError::OddRegisterCount(words.len()));
    }
    Ok(words
        .chunks_exact(2)
        .map(|pair| {
            let combined = ((pair[1] as u32) << 16) | pair[0] as u32;
            f32::from_le_bytes(combined.to_le_bytes())
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_string_reverses_each_word() {
        assert_eq!(bit_string(&[0b1]), "1000000000000000");
        assert_eq!(bit_string(&[0x8000]), "0000000000000001");
        assert_eq!(bit_string(&[0]), "0000000000000000");
    }

    #[test]
    fn bit_string_concatenates_in_register_order() {
        assert_eq!(
            bit_string(&[0b10, 0b1]),
            "01000000000000001000000000000000"
        );
        assert!(bit_string(&[]).is_empty());
    }

    #[test]
    fn float32_negative_and_multiple_pairs() {
        // -2.5f32 = 0xC020_0000
        let values = float32_low_high(&[0x0000, 0xC020, 0x0000, 0x4000]).unwrap();
        assert_eq!(values, vec![-2.5, 2.0]);
    }

    #[test]
    fn angle_degrees_negative() {
        let values = angle_degrees(&[(-5000i16) as u16]);
        assert!((values[0] + 180.0 / std::f64::consts::PI).abs() < 1e-9);
    }
}
