//! # 隐写流程模块
//!
//! 负责按顺序调度各个步骤，本身不包含任何位级逻辑。
//!
//! * 隐写：容量检查 → 原样拷贝 54 字节头部 → 写入帧 → 原样拷贝剩余像素与尾部数据。
//! * 恢复：跳过头部 → 读取帧头 → 按解出的扩展名创建输出文件 → 流式写出载荷。
//!
//! 输出先写入目标目录中的临时文件，只有整个流程成功后才改名为最终文件。
//! 任何一步失败，临时文件都会随作用域结束被删除，不会留下残缺的输出。

use crate::capacity::{self, CarrierGeometry};
use crate::constants::{BMP_HEADER_SIZE, DEFAULT_DECODED_NAME, DEFAULT_STEGO_NAME};
use crate::error::{EmbedError, ExtractError};
use crate::frame::{FrameHeader, FrameReader, FrameWriter, validate_extension};
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// 目标文件已存在时的处理方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputPolicy {
    /// 拒绝覆盖，返回 `OutputExists` 错误。
    #[default]
    Refuse,
    /// 直接替换已有文件。
    Overwrite,
}

impl OutputPolicy {
    pub fn from_force(force: bool) -> Self {
        if force { Self::Overwrite } else { Self::Refuse }
    }
}

/// 隐写成功后的摘要。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embedded {
    pub output: PathBuf,
    pub extension: String,
    pub payload_len: u32,
    /// 帧占用的像素字节数。
    pub frame_bytes: u64,
    /// 载体可用的像素字节数。
    pub available: u64,
}

/// 恢复成功后的摘要。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub output: PathBuf,
    pub extension: String,
    pub payload_len: u64,
}

/// 载体容量的查询结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityReport {
    pub geometry: CarrierGeometry,
    /// 可用于隐写的像素字节数。
    pub available: u64,
    /// 在给定扩展名长度下能隐藏的最大载荷字节数。
    pub max_payload: u64,
}

/// 将 `payload_path` 的内容隐藏进 `carrier_path`。
///
/// 未指定 `output_path` 时，结果写到载体所在目录下的 `stego.bmp`。
/// 载荷的扩展名 (如 `.txt`) 会一并写入帧中，恢复时用于还原文件名。
///
/// # Errors
///
/// 任一步骤失败都会终止整个操作，并且不会留下输出文件。详见 [`EmbedError`]。
pub fn embed(
    carrier_path: &Path,
    payload_path: &Path,
    output_path: Option<&Path>,
    policy: OutputPolicy,
) -> Result<Embedded, EmbedError> {
    let output = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| sibling(carrier_path, DEFAULT_STEGO_NAME));

    run_embed(carrier_path, payload_path, output, policy).inspect_err(|e| {
        tracing::warn!(error = %e, carrier = %carrier_path.display(), "embedding aborted, no output written");
    })
}

fn run_embed(
    carrier_path: &Path,
    payload_path: &Path,
    output: PathBuf,
    policy: OutputPolicy,
) -> Result<Embedded, EmbedError> {
    if policy == OutputPolicy::Refuse && output.exists() {
        return Err(EmbedError::OutputExists { path: output });
    }
    let extension = payload_extension(payload_path)?;

    let (carrier_file, carrier_len) =
        open_sized(carrier_path).map_err(|source| EmbedError::CarrierOpenFailed {
            path: carrier_path.to_path_buf(),
            source,
        })?;
    let (payload_file, payload_len) =
        open_sized(payload_path).map_err(|source| EmbedError::PayloadOpenFailed {
            path: payload_path.to_path_buf(),
            source,
        })?;
    tracing::info!(
        carrier = %carrier_path.display(),
        payload = %payload_path.display(),
        carrier_len,
        payload_len,
        "opened input files"
    );

    if carrier_len < BMP_HEADER_SIZE as u64 {
        return Err(EmbedError::HeaderTooShort {
            actual: carrier_len,
            expected: BMP_HEADER_SIZE,
        });
    }
    let mut carrier = BufReader::new(carrier_file);
    let header = read_bmp_header(&mut carrier)?;

    let geometry = CarrierGeometry::from_header(&header);
    let available = geometry.available_bytes(carrier_len);
    let plan = capacity::plan(available, extension.len(), payload_len)?;
    let frame = FrameHeader::new(extension, plan.payload_len)?;
    tracing::debug!(
        width = geometry.width,
        height = geometry.height,
        required = plan.required,
        spare = plan.spare(),
        "capacity ok"
    );

    let staged = stage_output(&output).map_err(|source| EmbedError::OutputCreateFailed {
        path: output.clone(),
        source,
    })?;
    let mut out = BufWriter::new(staged);

    out.write_all(&header)?;
    tracing::info!("copied image header");

    let mut writer = FrameWriter::new(carrier, out);
    writer.write_frame(&frame, BufReader::new(payload_file))?;
    tracing::info!(consumed = writer.consumed(), "frame written");

    let (mut carrier, mut out) = writer.into_inner();
    let tail = io::copy(&mut carrier, &mut out)?;
    tracing::info!(tail, "copied remaining image data");

    let staged = out.into_inner().map_err(|e| e.into_error())?;
    persist(staged, &output, policy).map_err(|source| match source.kind() {
        ErrorKind::AlreadyExists => EmbedError::OutputExists {
            path: output.clone(),
        },
        _ => EmbedError::OutputCreateFailed {
            path: output.clone(),
            source,
        },
    })?;
    tracing::info!(output = %output.display(), "stego image saved");

    Ok(Embedded {
        output,
        extension: frame.extension().to_owned(),
        payload_len: frame.payload_len(),
        frame_bytes: plan.required,
        available,
    })
}

/// 从 `carrier_path` 中恢复隐藏的文件。
///
/// 输出文件名为 `output_base` (默认是载体所在目录下的 `decoded_secret`)
/// 加上从帧中解出的扩展名。
///
/// # Errors
///
/// * [`ExtractError::MarkerMismatch`] - 图像中没有隐藏数据，此时不会创建任何文件。
/// * [`ExtractError::UnexpectedEndOfCarrier`] - 魔数匹配之后数据不完整，即数据已损坏。
/// * 其余情况详见 [`ExtractError`]。
pub fn extract(
    carrier_path: &Path,
    output_base: Option<&Path>,
    policy: OutputPolicy,
) -> Result<Extracted, ExtractError> {
    let base = output_base
        .map(Path::to_path_buf)
        .unwrap_or_else(|| sibling(carrier_path, DEFAULT_DECODED_NAME));

    run_extract(carrier_path, &base, policy).inspect_err(|e| match e {
        ExtractError::MarkerMismatch { .. } => {
            tracing::info!(carrier = %carrier_path.display(), "no hidden data found");
        }
        _ => {
            tracing::warn!(error = %e, carrier = %carrier_path.display(), "extraction aborted, no output written");
        }
    })
}

fn run_extract(carrier_path: &Path, base: &Path, policy: OutputPolicy) -> Result<Extracted, ExtractError> {
    let (carrier_file, carrier_len) =
        open_sized(carrier_path).map_err(|source| ExtractError::CarrierOpenFailed {
            path: carrier_path.to_path_buf(),
            source,
        })?;
    tracing::info!(carrier = %carrier_path.display(), carrier_len, "opened carrier image");

    if carrier_len < BMP_HEADER_SIZE as u64 {
        return Err(ExtractError::HeaderTooShort {
            actual: carrier_len,
            expected: BMP_HEADER_SIZE,
        });
    }
    let mut carrier = BufReader::new(carrier_file);
    read_bmp_header(&mut carrier)?;

    let mut reader = FrameReader::new(carrier);
    let frame = reader.read_header()?;
    tracing::info!(extension = frame.extension(), payload_len = frame.payload_len(), "marker matched");

    let output = with_extension(base, frame.extension());
    if policy == OutputPolicy::Refuse && output.exists() {
        return Err(ExtractError::OutputExists { path: output });
    }
    let staged = stage_output(&output).map_err(|source| ExtractError::OutputCreateFailed {
        path: output.clone(),
        source,
    })?;
    let mut out = BufWriter::new(staged);

    let payload_len = reader.copy_payload(&frame, &mut out)?;
    let staged = out.into_inner().map_err(|e| e.into_error())?;
    persist(staged, &output, policy).map_err(|source| match source.kind() {
        ErrorKind::AlreadyExists => ExtractError::OutputExists {
            path: output.clone(),
        },
        _ => ExtractError::OutputCreateFailed {
            path: output.clone(),
            source,
        },
    })?;
    tracing::info!(output = %output.display(), payload_len, "payload recovered");

    Ok(Extracted {
        output,
        extension: frame.extension().to_owned(),
        payload_len,
    })
}

/// 查询载体的隐写容量。
///
/// `extension_len` 是计划隐藏的载荷扩展名长度 (含开头的 `.`)。
pub fn inspect_capacity(carrier_path: &Path, extension_len: usize) -> Result<CapacityReport, EmbedError> {
    let (carrier_file, carrier_len) =
        open_sized(carrier_path).map_err(|source| EmbedError::CarrierOpenFailed {
            path: carrier_path.to_path_buf(),
            source,
        })?;
    if carrier_len < BMP_HEADER_SIZE as u64 {
        return Err(EmbedError::HeaderTooShort {
            actual: carrier_len,
            expected: BMP_HEADER_SIZE,
        });
    }
    let header = read_bmp_header(&mut BufReader::new(carrier_file))?;

    let geometry = CarrierGeometry::from_header(&header);
    let available = geometry.available_bytes(carrier_len);
    Ok(CapacityReport {
        geometry,
        available,
        max_payload: capacity::max_payload(available, extension_len),
    })
}

/// 载荷文件的扩展名，包含开头的 `.`；没有扩展名时为空字符串。
fn payload_extension(path: &Path) -> Result<String, EmbedError> {
    let Some(ext) = path.extension() else {
        return Ok(String::new());
    };
    let ext = ext.to_str().ok_or(EmbedError::InvalidExtension)?;
    let ext = format!(".{ext}");
    validate_extension(ext.as_bytes())?;
    Ok(ext)
}

/// 打开一个普通文件并返回其长度。目录等非普通文件在打开阶段就被拒绝，
/// 而不是等到第一次读取时才失败。
fn open_sized(path: &Path) -> io::Result<(File, u64)> {
    let file = File::open(path)?;
    let metadata = file.metadata()?;
    if !metadata.is_file() {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            "The path does not refer to a regular file.",
        ));
    }
    Ok((file, metadata.len()))
}

fn read_bmp_header<R: Read>(carrier: &mut R) -> io::Result<[u8; BMP_HEADER_SIZE]> {
    let mut header = [0u8; BMP_HEADER_SIZE];
    carrier.read_exact(&mut header)?;
    Ok(header)
}

/// 与载体位于同一目录下的默认输出路径。
fn sibling(carrier_path: &Path, name: &str) -> PathBuf {
    carrier_path
        .parent()
        .map(|dir| dir.join(name))
        .unwrap_or_else(|| PathBuf::from(name))
}

fn with_extension(base: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(extension);
    PathBuf::from(name)
}

/// 在目标目录中创建临时文件，保证之后的改名不会跨文件系统。
fn stage_output(output: &Path) -> io::Result<NamedTempFile> {
    let dir = output
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    tempfile::Builder::new()
        .prefix(".bmp_stego-")
        .tempfile_in(dir)
}

fn persist(staged: NamedTempFile, output: &Path, policy: OutputPolicy) -> io::Result<()> {
    let persisted = match policy {
        OutputPolicy::Refuse => staged.persist_noclobber(output),
        OutputPolicy::Overwrite => staged.persist(output),
    };
    persisted.map(drop).map_err(|e| e.error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_extension_includes_dot() -> anyhow::Result<()> {
        assert_eq!(payload_extension(Path::new("dir/secret.txt"))?, ".txt");
        assert_eq!(payload_extension(Path::new("script.sh"))?, ".sh");
        assert_eq!(payload_extension(Path::new("archive.tar.gz"))?, ".gz");
        assert_eq!(payload_extension(Path::new("README"))?, "");
        Ok(())
    }

    #[test]
    fn payload_extension_rejects_spaces() {
        assert!(matches!(
            payload_extension(Path::new("secret.t t")),
            Err(EmbedError::InvalidExtension)
        ));
    }

    #[test]
    fn defaults_live_next_to_the_carrier() {
        assert_eq!(
            sibling(Path::new("images/cover.bmp"), DEFAULT_STEGO_NAME),
            PathBuf::from("images/stego.bmp")
        );
        assert_eq!(
            sibling(Path::new("cover.bmp"), DEFAULT_STEGO_NAME),
            PathBuf::from("stego.bmp")
        );
    }

    #[test]
    fn extension_is_appended_to_base() {
        assert_eq!(
            with_extension(Path::new("out/decoded_secret"), ".txt"),
            PathBuf::from("out/decoded_secret.txt")
        );
        assert_eq!(with_extension(Path::new("plain"), ""), PathBuf::from("plain"));
    }

    #[test]
    fn open_sized_rejects_directories() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let err = open_sized(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        Ok(())
    }

    #[test]
    fn policy_from_force_flag() {
        assert_eq!(OutputPolicy::from_force(true), OutputPolicy::Overwrite);
        assert_eq!(OutputPolicy::from_force(false), OutputPolicy::Refuse);
        assert_eq!(OutputPolicy::default(), OutputPolicy::Refuse);
    }
}
