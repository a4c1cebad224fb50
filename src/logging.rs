//! # Logging モジュール
//!
//! シミュレーションのログ管理機能を提供します。
//!
//! tracing-appender による非同期ファイル出力とコンソール出力を組み合わせ、
//! ティック処理の速度に影響を与えずにイベントログを記録します。
//!
//! ## 設定可能な出力先
//!
//! - `Console`: コンソールのみ（compact形式）
//! - `File`: ファイルのみ（JSON形式、logs/towersim.YYYY-MM-DD）
//! - `Both`: コンソールとファイルの両方

use std::str::FromStr;
use tracing::Level;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// ログ出力先の設定
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogOutput {
    /// コンソールのみ
    Console,
    /// ファイルのみ
    File,
    /// コンソールとファイルの両方
    Both,
}

impl LogOutput {
    fn writes_console(&self) -> bool {
        matches!(self, LogOutput::Console | LogOutput::Both)
    }

    fn writes_file(&self) -> bool {
        matches!(self, LogOutput::File | LogOutput::Both)
    }
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" | "stdout" => Ok(LogOutput::Console),
            "file" => Ok(LogOutput::File),
            "both" | "all" => Ok(LogOutput::Both),
            _ => Err(format!("無効な出力先: {}. 利用可能: console, file, both", s)),
        }
    }
}

/// ログ設定構造体
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// ログレベル
    pub level: Level,
    /// 出力先
    pub output: LogOutput,
    /// ログファイルのディレクトリ（Fileまたは Bothの場合）
    pub log_dir: String,
    /// ログファイル名のプレフィックス
    pub file_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            output: LogOutput::Console,
            log_dir: "logs".to_string(),
            file_prefix: "towersim".to_string(),
        }
    }
}

impl LogConfig {
    /// `-v` の指定回数からログレベルを決める（明示指定がない場合）
    pub fn level_for_verbosity(verbose_level: u8) -> Level {
        match verbose_level {
            0 | 1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

/// ログシステムを初期化
///
/// 指定された設定に基づいてtracing-subscriberを設定します。
/// ファイル出力を行う場合は非同期書き込みのガードを返すので、
/// プロセス終了まで保持してください（破棄するとバッファが書き出されて停止します）。
///
/// # 例
///
/// ```no_run
/// use towersim::logging::{LogConfig, LogOutput, init_logging};
/// use tracing::Level;
///
/// let config = LogConfig {
///     level: Level::DEBUG,
///     output: LogOutput::Both,
///     log_dir: "logs".to_string(),
///     file_prefix: "towersim".to_string(),
/// };
///
/// let _guard = init_logging(config).expect("ログ初期化に失敗");
/// ```
pub fn init_logging(config: LogConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    // 環境変数 (RUST_LOG) を優先し、なければconfigのレベル
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.to_string()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = config.output.writes_console().then(|| {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .boxed()
    });

    let mut guard = None;
    let file_layer = if config.output.writes_file() {
        ensure_log_directory(&config.log_dir)?;
        let file_appender = rolling::daily(&config.log_dir, &config.file_prefix);
        let (non_blocking_appender, worker_guard) = non_blocking(file_appender);
        guard = Some(worker_guard);
        Some(
            fmt::layer()
                .with_writer(non_blocking_appender)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json()
                .boxed(),
        )
    } else {
        None
    };

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

/// ログレベルを文字列から解析
///
/// 無効な場合はINFO
pub fn parse_log_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!("警告: 無効なログレベル '{}'. INFOを使用します", level_str);
            Level::INFO
        }
    }
}

/// ログディレクトリを作成
pub fn ensure_log_directory(log_dir: &str) -> Result<(), std::io::Error> {
    std::fs::create_dir_all(log_dir)?;
    Ok(())
}
