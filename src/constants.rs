//! # 常量模块
//!
//! 编码端与解码端共享的线格式常量。两端必须使用同一份定义，
//! 否则读出的数据会悄无声息地错位。

/// BMP 文件的标准头部大小 (字节)。
/// 隐写操作将跳过这个头部，从像素数据开始。
pub const BMP_HEADER_SIZE: usize = 54;

/// 头部中图像宽度字段 (小端 4 字节) 的偏移量。
pub const WIDTH_OFFSET: usize = 18;

/// 头部中图像高度字段 (小端 4 字节) 的偏移量。
pub const HEIGHT_OFFSET: usize = 22;

/// 每个像素占用的字节数 (24 位 RGB)。
pub const BYTES_PER_PIXEL: u64 = 3;

/// 帧起始处的魔数签名。
pub const MARKER: &[u8; 2] = b"#*";

/// 隐写一个字节所需的像素字节数：每个像素字节只承载 1 bit。
pub const BITS_PER_BYTE: usize = 8;

/// 隐写一个 `u32` 长度字段所需的像素字节数。
pub const BITS_PER_LENGTH: usize = 32;

/// 扩展名长度的合理上限，超过即视为非隐写图像或数据已损坏。
pub const MAX_EXTENSION_LEN: usize = 255;

/// 载体图像必须具有的扩展名。
pub const CARRIER_EXTENSION: &str = "bmp";

/// 未指定输出路径时，隐写结果图像的默认文件名。
pub const DEFAULT_STEGO_NAME: &str = "stego.bmp";

/// 未指定输出名时，恢复文件的默认基础名 (扩展名从图像中解出)。
pub const DEFAULT_DECODED_NAME: &str = "decoded_secret";
