//! # 错误类型模块
//!
//! 隐写 ([`EmbedError`]) 与恢复 ([`ExtractError`]) 各自的错误分类。
//! 所有错误都会终止当前操作，不做内部重试。

use std::fmt;
use std::io;
use std::path::PathBuf;

/// 帧中的字段，用于指出数据流在哪个字段处中断。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Marker,
    ExtensionLength,
    Extension,
    PayloadLength,
    Payload,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Marker => "marker",
            Field::ExtensionLength => "extension length",
            Field::Extension => "extension",
            Field::PayloadLength => "payload length",
            Field::Payload => "payload",
        };
        f.write_str(name)
    }
}

/// 扩展名字符串不合格的原因，编码与解码两端共用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExtensionFault {
    #[error("extension is {len} bytes long, maximum is {max}")]
    TooLong { len: usize, max: usize },
    #[error("extension is not a printable ASCII file extension")]
    Malformed,
}

/// 隐写操作可能出现的错误。
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("unable to open carrier image {}", .path.display())]
    CarrierOpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to open payload file {}", .path.display())]
    PayloadOpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to create output file {}", .path.display())]
    OutputCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("output file already exists: {}", .path.display())]
    OutputExists { path: PathBuf },

    #[error("carrier is {actual} bytes, shorter than the {expected}-byte header")]
    HeaderTooShort { actual: u64, expected: usize },

    #[error("not enough capacity: frame needs {required} carrier bytes, {available} available")]
    CapacityInsufficient { required: u64, available: u64 },

    #[error("payload file is empty")]
    EmptyPayload,

    #[error("payload of {len} bytes does not fit a 32-bit length field")]
    PayloadTooLarge { len: u64 },

    #[error("payload ended after {actual} of {expected} bytes")]
    PayloadTruncated { expected: u32, actual: u64 },

    #[error("extension is {len} bytes long, maximum is {max}")]
    ExtensionTooLong { len: usize, max: usize },

    #[error("payload extension is not a printable ASCII file extension")]
    InvalidExtension,

    /// 容量检查通过后载体仍被耗尽，说明内部状态不一致。
    #[error("carrier exhausted while writing the {field} field")]
    CarrierExhausted { field: Field },

    #[error("I/O failure during embedding")]
    Io(#[from] io::Error),
}

/// 恢复操作可能出现的错误。
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unable to open carrier image {}", .path.display())]
    CarrierOpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to create output file {}", .path.display())]
    OutputCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("output file already exists: {}", .path.display())]
    OutputExists { path: PathBuf },

    #[error("carrier is {actual} bytes, shorter than the {expected}-byte header")]
    HeaderTooShort { actual: u64, expected: usize },

    /// 载体中没有本工具写入的帧。这是正常结果，不代表数据损坏。
    #[error("no hidden data: marker {found:?} does not match {expected:?}")]
    MarkerMismatch { found: [u8; 2], expected: [u8; 2] },

    #[error("carrier ended while reading the {field} field")]
    UnexpectedEndOfCarrier { field: Field },

    #[error("decoded extension length {len} exceeds the maximum of {max}")]
    ExtensionTooLong { len: usize, max: usize },

    #[error("decoded extension is not a printable ASCII file extension")]
    InvalidExtension,

    #[error("I/O failure during extraction")]
    Io(#[from] io::Error),
}

impl From<ExtensionFault> for EmbedError {
    fn from(fault: ExtensionFault) -> Self {
        match fault {
            ExtensionFault::TooLong { len, max } => EmbedError::ExtensionTooLong { len, max },
            ExtensionFault::Malformed => EmbedError::InvalidExtension,
        }
    }
}

impl From<ExtensionFault> for ExtractError {
    fn from(fault: ExtensionFault) -> Self {
        match fault {
            ExtensionFault::TooLong { len, max } => ExtractError::ExtensionTooLong { len, max },
            ExtensionFault::Malformed => ExtractError::InvalidExtension,
        }
    }
}
