//! # 容量规划模块
//!
//! 在改动任何像素字节之前判断载体能否容纳整个帧。
//! 每 1 bit 明文占用 1 个像素字节。

use crate::constants::{
    BITS_PER_BYTE, BMP_HEADER_SIZE, BYTES_PER_PIXEL, HEIGHT_OFFSET, MARKER, MAX_EXTENSION_LEN,
    WIDTH_OFFSET,
};
use crate::error::EmbedError;

const LENGTH_FIELD_BYTES: usize = size_of::<u32>();

/// 从 BMP 头部读出的图像尺寸。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarrierGeometry {
    pub width: u32,
    pub height: u32,
}

impl CarrierGeometry {
    /// 读取偏移 18 (宽) 与 22 (高) 处的小端 4 字节字段。
    ///
    /// 自上而下存储的 BMP 高度为负数，这里取其绝对值。
    pub fn from_header(header: &[u8; BMP_HEADER_SIZE]) -> Self {
        let field = |offset: usize| {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&header[offset..offset + 4]);
            i32::from_le_bytes(raw).unsigned_abs()
        };
        Self {
            width: field(WIDTH_OFFSET),
            height: field(HEIGHT_OFFSET),
        }
    }

    /// 头部声明的像素数据大小：宽 × 高 × 3。
    pub fn pixel_bytes(&self) -> u64 {
        u64::from(self.width)
            .saturating_mul(u64::from(self.height))
            .saturating_mul(BYTES_PER_PIXEL)
    }

    /// 实际可用于隐写的像素字节数。
    ///
    /// 头部声明的区域与文件中头部之后真实存在的字节数取较小者，
    /// 这样头部虚报尺寸的文件会在写入前就被拒绝。
    pub fn available_bytes(&self, carrier_len: u64) -> u64 {
        self.pixel_bytes()
            .min(carrier_len.saturating_sub(BMP_HEADER_SIZE as u64))
    }
}

/// 帧占用的像素字节数：`(2 + 4 + 扩展名长度 + 4 + 载荷长度) * 8`。
pub fn frame_cost(extension_len: usize, payload_len: u32) -> u64 {
    let metadata = (MARKER.len() + LENGTH_FIELD_BYTES + extension_len + LENGTH_FIELD_BYTES) as u64;
    (metadata + u64::from(payload_len)) * BITS_PER_BYTE as u64
}

/// 在给定的可用区域内，指定扩展名长度下能容纳的最大载荷字节数。
pub fn max_payload(available: u64, extension_len: usize) -> u64 {
    let overhead = frame_cost(extension_len, 0);
    (available.saturating_sub(overhead) / BITS_PER_BYTE as u64).min(u64::from(u32::MAX))
}

/// 容量检查通过后的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPlan {
    /// 载荷长度，已确认可放进 32 位长度字段。
    pub payload_len: u32,
    /// 帧需要的像素字节数。
    pub required: u64,
    /// 载体可用的像素字节数。
    pub available: u64,
}

impl CapacityPlan {
    /// 帧写完后仍未使用的像素字节数。
    pub fn spare(&self) -> u64 {
        self.available - self.required
    }
}

/// 判断帧能否放进载体。
///
/// 检查顺序：空载荷、长度字段溢出、扩展名长度、容量。
/// 帧恰好填满可用区域时视为可行。
///
/// # Errors
///
/// * [`EmbedError::EmptyPayload`] - 载荷长度为 0。
/// * [`EmbedError::PayloadTooLarge`] - 载荷长度超出 `u32` 范围。
/// * [`EmbedError::ExtensionTooLong`] - 扩展名超过上限。
/// * [`EmbedError::CapacityInsufficient`] - 帧所需字节数超过可用区域。
pub fn plan(available: u64, extension_len: usize, payload_len: u64) -> Result<CapacityPlan, EmbedError> {
    if payload_len == 0 {
        return Err(EmbedError::EmptyPayload);
    }
    let payload_len =
        u32::try_from(payload_len).map_err(|_| EmbedError::PayloadTooLarge { len: payload_len })?;
    if extension_len > MAX_EXTENSION_LEN {
        return Err(EmbedError::ExtensionTooLong {
            len: extension_len,
            max: MAX_EXTENSION_LEN,
        });
    }

    let required = frame_cost(extension_len, payload_len);
    tracing::debug!(required, available, "capacity check");
    if required > available {
        return Err(EmbedError::CapacityInsufficient {
            required,
            available,
        });
    }

    Ok(CapacityPlan {
        payload_len,
        required,
        available,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_with(width: i32, height: i32) -> [u8; BMP_HEADER_SIZE] {
        let mut header = [0u8; BMP_HEADER_SIZE];
        header[WIDTH_OFFSET..WIDTH_OFFSET + 4].copy_from_slice(&width.to_le_bytes());
        header[HEIGHT_OFFSET..HEIGHT_OFFSET + 4].copy_from_slice(&height.to_le_bytes());
        header
    }

    #[test]
    fn geometry_reads_little_endian_fields() {
        let geometry = CarrierGeometry::from_header(&header_with(640, 480));
        assert_eq!(geometry, CarrierGeometry { width: 640, height: 480 });
        assert_eq!(geometry.pixel_bytes(), 640 * 480 * 3);
    }

    #[test]
    fn top_down_height_uses_magnitude() {
        let geometry = CarrierGeometry::from_header(&header_with(16, -8));
        assert_eq!(geometry.height, 8);
        assert_eq!(geometry.pixel_bytes(), 16 * 8 * 3);
    }

    #[test]
    fn available_is_bounded_by_file_length() {
        let geometry = CarrierGeometry::from_header(&header_with(100, 100));
        assert_eq!(geometry.available_bytes(54 + 30_000), 30_000);
        assert_eq!(geometry.available_bytes(54 + 1_000), 1_000);
        assert_eq!(geometry.available_bytes(54 + 40_000), 30_000);
        assert_eq!(geometry.available_bytes(10), 0);
    }

    #[test]
    fn frame_cost_matches_layout() {
        assert_eq!(frame_cost(4, 100), (2 + 4 + 4 + 4 + 100) * 8);
        assert_eq!(frame_cost(0, 1), (2 + 4 + 4 + 1) * 8);
    }

    #[test]
    fn exact_fit_is_accepted() -> anyhow::Result<()> {
        let available = frame_cost(4, 50);
        let plan = plan(available, 4, 50)?;
        assert_eq!(plan.required, available);
        assert_eq!(plan.spare(), 0);
        assert_eq!(plan.payload_len, 50);
        Ok(())
    }

    #[test]
    fn one_byte_over_is_rejected() {
        let available = frame_cost(4, 50);
        let err = plan(available, 4, 51).unwrap_err();
        assert!(matches!(
            err,
            EmbedError::CapacityInsufficient { required, available: a }
                if required == available + 8 && a == available
        ));
    }

    #[test]
    fn empty_payload_is_rejected_first() {
        assert!(matches!(plan(0, 4, 0), Err(EmbedError::EmptyPayload)));
        assert!(matches!(plan(u64::MAX, 4, 0), Err(EmbedError::EmptyPayload)));
    }

    #[test]
    fn payload_beyond_u32_is_rejected() {
        let len = u64::from(u32::MAX) + 1;
        assert!(matches!(
            plan(u64::MAX, 4, len),
            Err(EmbedError::PayloadTooLarge { len: l }) if l == len
        ));
    }

    #[test]
    fn overlong_extension_is_rejected() {
        assert!(matches!(
            plan(u64::MAX, MAX_EXTENSION_LEN + 1, 1),
            Err(EmbedError::ExtensionTooLong { .. })
        ));
    }

    #[test]
    fn max_payload_inverts_frame_cost() -> anyhow::Result<()> {
        let available = 30_000;
        let max = max_payload(available, 4);
        plan(available, 4, max)?;
        assert!(plan(available, 4, max + 1).is_err());
        assert_eq!(max_payload(10, 4), 0);
        Ok(())
    }
}
