//! # 命令处理逻辑模块
//!
//! 包含处理 `embed`、`extract` 和 `capacity` 子命令的高级业务逻辑。
//! 本模块负责调用隐写流程，把类型化的错误翻译成面向用户的信息，并报告结果。

use crate::cli::{CapacityArgs, EmbedArgs, ExtractArgs};
use crate::error::{EmbedError, ExtractError};
use crate::pipeline::{self, OutputPolicy};
use anyhow::{Context, Result};
use colored::Colorize;

/// 处理 'Embed' 命令的执行逻辑。
///
/// 检查图像容量后，将载荷文件连同其扩展名隐藏进图像的像素数据，
/// 并将结果写入目标图像文件。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径的 `EmbedArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取输入的图像或载荷文件。
/// * 载荷文件为空，或图像没有足够的空间来隐藏它。
/// * 目标文件已存在且未指定 `--force`。
/// * 无法写入到目标图像文件。
pub fn handle_embed(args: EmbedArgs) -> Result<()> {
    let policy = OutputPolicy::from_force(args.force);

    let embedded = pipeline::embed(&args.image, &args.payload, args.dest.as_deref(), policy)
        .map_err(|e| {
            let hint = match &e {
                EmbedError::CapacityInsufficient { .. } => {
                    "Not enough space in the image to hide the payload. \nTry a larger image."
                }
                EmbedError::EmptyPayload => "There is nothing to hide.",
                EmbedError::OutputExists { .. } => {
                    "Output file already exists. \nUse --force to overwrite it."
                }
                _ => "The image file may be corrupt or write-protected.",
            };
            anyhow::Error::new(e).context(format!(
                "Failed to hide '{}' in '{}'. \n{}",
                args.payload.to_string_lossy().red().bold(),
                args.image.to_string_lossy().red().bold(),
                hint
            ))
        })?;

    println!(
        "The payload has been successfully hidden and saved: {}",
        embedded.output.to_string_lossy().green().bold()
    );
    println!(
        "Used {} of {} available carrier bytes.",
        embedded.frame_bytes.to_string().green(),
        embedded.available.to_string().green()
    );

    Ok(())
}

/// 处理 'Extract' 命令的执行逻辑。
///
/// 校验图像中的魔数后解出扩展名，将隐藏的文件恢复到
/// `基础名 + 扩展名` 路径下。
///
/// # Arguments
///
/// * `args` - 包含输入路径与可选输出基础名的 `ExtractArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 无法读取输入的图像文件。
/// * 图像中没有隐藏数据，或隐藏数据已损坏。
/// * 目标文件已存在且未指定 `--force`。
/// * 无法写入到目标文件。
pub fn handle_extract(args: ExtractArgs) -> Result<()> {
    let policy = OutputPolicy::from_force(args.force);

    let extracted = pipeline::extract(&args.image, args.output.as_deref(), policy).map_err(|e| {
        let hint = match &e {
            ExtractError::MarkerMismatch { .. } => "The image does not contain hidden data.",
            ExtractError::UnexpectedEndOfCarrier { .. }
            | ExtractError::ExtensionTooLong { .. }
            | ExtractError::InvalidExtension => "The hidden data appears to be corrupted.",
            ExtractError::OutputExists { .. } => {
                "Output file already exists. \nUse --force to overwrite it."
            }
            _ => "The image file may be corrupt or unreadable.",
        };
        anyhow::Error::new(e).context(format!(
            "Failed to recover hidden data from '{}'. \n{}",
            args.image.to_string_lossy().red().bold(),
            hint
        ))
    })?;

    println!(
        "The hidden file has been successfully recovered and saved: {}",
        extracted.output.to_string_lossy().green().bold()
    );
    Ok(())
}

/// 处理 'Capacity' 命令的执行逻辑，打印图像尺寸与可隐藏的最大载荷。
pub fn handle_capacity(args: CapacityArgs) -> Result<()> {
    let report = pipeline::inspect_capacity(&args.image, args.extension.len()).with_context(|| {
        format!(
            "Unable to read image file: {}",
            args.image.to_string_lossy().red().bold()
        )
    })?;

    println!(
        "Image: {} x {} pixels, {} usable carrier bytes",
        report.geometry.width,
        report.geometry.height,
        report.available.to_string().green()
    );
    println!(
        "Maximum payload: {} bytes",
        report.max_payload.to_string().green().bold()
    );
    Ok(())
}
