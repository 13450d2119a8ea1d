//! # bmp_stego 库
//!
//! 本库包含 BMP 图像 LSB 隐写工具的核心逻辑：位打包、帧编解码、
//! 容量规划以及隐写/恢复流程。

// 声明库包含的所有模块。

pub mod capacity;
pub mod cli;
pub mod constants;
pub mod error;
pub mod frame;
pub mod handler;
pub mod logging;
pub mod pipeline;
pub mod steganography;

pub use error::{EmbedError, ExtractError, Field};
pub use pipeline::{CapacityReport, Embedded, Extracted, OutputPolicy, embed, extract, inspect_capacity};
