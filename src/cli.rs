//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 所有用户通过命令行与程序交互的入口点都在此模块中定义，
//! 文件扩展名等参数校验也在这一层完成。

use crate::constants::CARRIER_EXTENSION;
use crate::frame::validate_extension;
use crate::logging::{LogFormat, LogLevel};
use clap::Parser;
use std::path::PathBuf;

/// 一款基于 LSB (最低有效位) 隐写术的命令行工具，可将任意文件隐藏在 24 位 BMP 图像的像素数据中，并原样恢复。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "一款基于 LSB (最低有效位) 隐写术的命令行工具，可将任意文件隐藏在 24 位 BMP 图像的像素数据中，并原样恢复。"
)]
pub struct Cli {
    /// 日志输出格式 (写到 stderr)。
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// 最低日志级别 (写到 stderr)。
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令：embed (隐藏)、extract (恢复) 和 capacity (容量查询)。
#[derive(Parser, Debug)]
pub enum Commands {
    /// 将文件隐藏到 BMP 图像中。
    #[command(visible_alias = "hide")]
    Embed(EmbedArgs),

    /// 从经过隐写的 BMP 图像中恢复隐藏的文件。
    #[command(visible_alias = "recover")]
    Extract(ExtractArgs),

    /// 查看 BMP 图像能容纳的最大载荷。
    Capacity(CapacityArgs),
}

/// 'embed' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct EmbedArgs {
    /// 用于隐写的输入 BMP 图像路径。
    #[arg(short, long, value_parser = bmp_path)]
    pub image: PathBuf,

    /// 要隐藏的文件路径，其扩展名会一并写入图像。
    #[arg(short, long)]
    pub payload: PathBuf,

    /// 结果图像的输出路径，默认为输入图像所在目录下的 stego.bmp。
    #[arg(short, long, value_parser = bmp_path)]
    pub dest: Option<PathBuf>,

    /// 目标文件已存在时直接覆盖。
    #[arg(short, long)]
    pub force: bool,
}

/// 'extract' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// 已隐藏数据的 BMP 图像路径。
    #[arg(short, long, value_parser = bmp_path)]
    pub image: PathBuf,

    /// 恢复文件的基础名 (不含扩展名，扩展名从图像中解出)，默认为 decoded_secret。
    #[arg(short, long, value_parser = base_name)]
    pub output: Option<PathBuf>,

    /// 目标文件已存在时直接覆盖。
    #[arg(short, long)]
    pub force: bool,
}

/// 'capacity' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct CapacityArgs {
    /// 要查询的 BMP 图像路径。
    #[arg(short, long, value_parser = bmp_path)]
    pub image: PathBuf,

    /// 计划隐藏的文件扩展名，如 `.txt`，会计入帧开销。
    #[arg(short, long, default_value = "", value_parser = extension)]
    pub extension: String,
}

fn bmp_path(arg: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(arg);
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case(CARRIER_EXTENSION) => Ok(path),
        _ => Err(format!("{arg} is not a .{CARRIER_EXTENSION} file")),
    }
}

fn base_name(arg: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(arg);
    if path.extension().is_some() {
        return Err(format!(
            "{arg} should not contain an extension, the extension is recovered from the image"
        ));
    }
    Ok(path)
}

fn extension(arg: &str) -> Result<String, String> {
    let ext = match arg {
        "" => String::new(),
        _ if arg.starts_with('.') => arg.to_owned(),
        _ => format!(".{arg}"),
    };
    validate_extension(ext.as_bytes()).map_err(|e| e.to_string())?;
    Ok(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_embed_with_defaults() {
        let cli = Cli::try_parse_from(["bmp_stego", "embed", "-i", "cover.bmp", "-p", "note.txt"])
            .expect("embed args should parse");
        let Commands::Embed(args) = cli.command else {
            panic!("expected embed subcommand");
        };
        assert_eq!(args.image, PathBuf::from("cover.bmp"));
        assert_eq!(args.payload, PathBuf::from("note.txt"));
        assert!(args.dest.is_none());
        assert!(!args.force);
    }

    #[test]
    fn hide_alias_maps_to_embed() {
        let cli = Cli::try_parse_from(["bmp_stego", "hide", "-i", "a.BMP", "-p", "x", "-d", "b.bmp", "-f"])
            .expect("alias should parse");
        assert!(matches!(cli.command, Commands::Embed(EmbedArgs { force: true, .. })));
    }

    #[test]
    fn rejects_non_bmp_carrier() {
        let err = Cli::try_parse_from(["bmp_stego", "embed", "-i", "cover.png", "-p", "note.txt"])
            .expect_err("png carrier should be rejected");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn rejects_non_bmp_destination() {
        let err = Cli::try_parse_from([
            "bmp_stego", "embed", "-i", "cover.bmp", "-p", "note.txt", "-d", "out.jpg",
        ])
        .expect_err("jpg destination should be rejected");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn extract_base_name_must_not_have_extension() {
        let err = Cli::try_parse_from(["bmp_stego", "extract", "-i", "stego.bmp", "-o", "secret.txt"])
            .expect_err("base name with extension should be rejected");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let cli = Cli::try_parse_from(["bmp_stego", "recover", "-i", "stego.bmp", "-o", "secret"])
            .expect("base name without extension should parse");
        assert!(matches!(cli.command, Commands::Extract(ExtractArgs { output: Some(_), .. })));
    }

    #[test]
    fn capacity_extension_is_normalised() {
        assert_eq!(extension("txt").as_deref(), Ok(".txt"));
        assert_eq!(extension(".sh").as_deref(), Ok(".sh"));
        assert_eq!(extension("").as_deref(), Ok(""));
        assert!(extension("a/b").is_err());
    }

    #[test]
    fn global_logging_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "bmp_stego", "capacity", "-i", "c.bmp", "--log-level", "debug", "--log-format", "json",
        ])
        .expect("global flags should parse");
        assert!(matches!(cli.log_level, LogLevel::Debug));
        assert!(matches!(cli.log_format, LogFormat::Json));
    }
}
