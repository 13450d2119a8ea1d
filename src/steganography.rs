//! # LSB 位打包模块
//!
//! 每个像素字节只承载 1 bit，写在它的最低有效位上，高位先行 (MSB-first)。
//! 字节需要 8 个像素字节，`u32` 长度字段需要 32 个。宽度由数组类型保证，
//! 因此这里没有错误路径。

use crate::constants::{BITS_PER_BYTE, BITS_PER_LENGTH};

/// 把 `value` 的低 `carrier.len()` 位按高位先行写入各像素字节的最低位。
fn pack_bits(value: u32, carrier: &mut [u8]) {
    let width = carrier.len();
    for (j, byte) in carrier.iter_mut().enumerate() {
        let bit = ((value >> (width - 1 - j)) & 1) as u8;
        *byte = (*byte & 0xFE) | bit;
    }
}

fn unpack_bits(carrier: &[u8]) -> u32 {
    let width = carrier.len();
    carrier
        .iter()
        .enumerate()
        .fold(0u32, |acc, (j, &byte)| acc | (u32::from(byte & 1) << (width - 1 - j)))
}

/// 将一个字节隐写进 8 个像素字节。
pub fn pack_u8(value: u8, carrier: &mut [u8; BITS_PER_BYTE]) {
    pack_bits(u32::from(value), carrier);
}

/// 将一个 32 位长度字段隐写进 32 个像素字节。
pub fn pack_u32(value: u32, carrier: &mut [u8; BITS_PER_LENGTH]) {
    pack_bits(value, carrier);
}

/// 从 8 个像素字节中恢复一个字节，是 [`pack_u8`] 的逆运算。
pub fn unpack_u8(carrier: &[u8; BITS_PER_BYTE]) -> u8 {
    // 只读了 8 位，结果必然落在 u8 范围内
    unpack_bits(carrier) as u8
}

/// 从 32 个像素字节中恢复一个 32 位长度字段，是 [`pack_u32`] 的逆运算。
pub fn unpack_u32(carrier: &[u8; BITS_PER_LENGTH]) -> u32 {
    unpack_bits(carrier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_byte_value_round_trips() {
        for value in 0..=u8::MAX {
            let mut carrier = [0xA5u8; BITS_PER_BYTE];
            pack_u8(value, &mut carrier);
            assert_eq!(unpack_u8(&carrier), value);
        }
    }

    #[test]
    fn representative_u32_values_round_trip() {
        let values = [
            0,
            1,
            2,
            0x80,
            0xFF,
            0x100,
            0xDEAD_BEEF,
            0x7FFF_FFFF,
            0x8000_0000,
            0xFFFF_FFFE,
            u32::MAX,
        ];
        for value in values {
            let mut carrier = [0x5Au8; BITS_PER_LENGTH];
            pack_u32(value, &mut carrier);
            assert_eq!(unpack_u32(&carrier), value, "value {value:#x}");
        }
    }

    #[test]
    fn msb_lands_in_first_carrier_byte() {
        let mut carrier = [0u8; BITS_PER_BYTE];
        pack_u8(b'#', &mut carrier); // 0b0010_0011
        assert_eq!(carrier, [0, 0, 1, 0, 0, 0, 1, 1]);

        let mut carrier = [0u8; BITS_PER_LENGTH];
        pack_u32(0x8000_0001, &mut carrier);
        assert_eq!(carrier[0], 1);
        assert_eq!(carrier[31], 1);
        assert!(carrier[1..31].iter().all(|&b| b == 0));
    }

    #[test]
    fn upper_seven_bits_are_untouched() {
        let original = [0xFFu8, 0xFE, 0x00, 0x01, 0x80, 0x7F, 0x42, 0x43];
        let mut carrier = original;
        pack_u8(0b1010_0101, &mut carrier);
        for (before, after) in original.iter().zip(carrier.iter()) {
            assert_eq!(before & 0xFE, after & 0xFE);
        }
    }

    #[test]
    fn unpack_ignores_upper_bits() {
        let carrier = [0xFEu8, 0xFF, 0xFE, 0xFF, 0xFE, 0xFF, 0xFE, 0xFF];
        assert_eq!(unpack_u8(&carrier), 0b0101_0101);
    }
}
