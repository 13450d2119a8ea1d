//! # 日志模块
//!
//! 诊断日志统一写到 stderr，stdout 只留给面向用户的结果信息。
//!
//! 文本格式只在 stderr 是终端且未设置 `NO_COLOR` 时输出 ANSI 颜色，
//! 重定向到文件或管道时得到的是纯文本。JSON 格式从不带颜色。

use clap::ValueEnum;
use std::ffi::OsStr;
use std::io::IsTerminal;
use tracing::level_filters::LevelFilter;

/// 日志的输出格式，对应 `--log-format`。
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// 供人阅读的单行文本。
    Text,
    /// 每条事件一行 JSON，便于机器采集。
    Json,
}

/// 日志的最低级别，对应 `--log-level`。默认只显示警告和错误。
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    /// 显示每个流程步骤 (打开文件、拷贝头部、写入帧等)。
    Info,
    /// 额外显示容量计算和帧字段的细节。
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// 判断文本日志是否应带 ANSI 颜色。`NO_COLOR` 只要非空就关闭颜色。
fn wants_ansi(stderr_is_terminal: bool, no_color: Option<&OsStr>) -> bool {
    stderr_is_terminal && no_color.is_none_or(OsStr::is_empty)
}

/// 初始化全局日志订阅者。重复调用时静默忽略。
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let no_color = std::env::var_os("NO_COLOR");
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level.as_filter())
        .with_target(false);

    match format {
        LogFormat::Text => {
            let ansi = wants_ansi(std::io::stderr().is_terminal(), no_color.as_deref());
            let _ = builder.with_ansi(ansi).try_init();
        }
        LogFormat::Json => {
            let _ = builder.with_ansi(false).json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_map_to_filters() {
        assert_eq!(LogLevel::Error.as_filter(), LevelFilter::ERROR);
        assert_eq!(LogLevel::Warn.as_filter(), LevelFilter::WARN);
        assert_eq!(LogLevel::Trace.as_filter(), LevelFilter::TRACE);
    }

    #[test]
    fn ansi_only_on_a_terminal_without_no_color() {
        assert!(wants_ansi(true, None));
        assert!(wants_ansi(true, Some(OsStr::new(""))));
        assert!(!wants_ansi(true, Some(OsStr::new("1"))));
        assert!(!wants_ansi(false, None));
    }

    #[test]
    fn second_init_is_ignored() {
        init_logging(LogFormat::Json, LogLevel::Error);
        init_logging(LogFormat::Text, LogLevel::Trace);
    }
}
