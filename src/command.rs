//! ffmpeg 进程调用：超时、重试和 stderr 采集

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{ChapterError, ChapterResult};

/// 默认超时（30 分钟，长视频的检测滤镜需要完整解码）
pub const DEFAULT_TIMEOUT_SECS: u64 = 1800;
/// 默认重试次数（不含首次执行）
pub const DEFAULT_RETRIES: u32 = 1;

/// 外部工具配置，由调用方注入
#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig {
    /// ffmpeg 可执行文件路径
    pub ffmpeg: PathBuf,
    /// 单次执行超时
    pub timeout: Duration,
    /// 失败后的重试次数
    pub retries: u32,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retries: DEFAULT_RETRIES,
        }
    }
}

/// 一次 ffmpeg 执行的结果
#[derive(Debug, Clone)]
pub struct FfmpegRun {
    pub status: ExitStatus,
    pub stderr: String,
}

impl FfmpegRun {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// 执行一次 ffmpeg，超时后子进程会被杀掉
pub async fn run_ffmpeg(tool: &ToolConfig, args: &[OsString]) -> ChapterResult<FfmpegRun> {
    debug!("执行 ffmpeg: {} {:?}", tool.ffmpeg.display(), args);

    let child = Command::new(&tool.ffmpeg)
        .arg("-hide_banner")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(tool.timeout, child).await {
        Ok(result) => result.map_err(|e| {
            ChapterError::ffmpeg_failed(format!("无法启动 {}: {}", tool.ffmpeg.display(), e), None, None)
        })?,
        Err(_) => return Err(ChapterError::Timeout(tool.timeout.as_secs())),
    };

    Ok(FfmpegRun {
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// 按配置重试执行 ffmpeg
///
/// `accept` 判断一次执行结果是否可用，不可用的结果按 `FfmpegFailed` 处理并参与重试。
async fn run_with_retry<F>(tool: &ToolConfig, args: &[OsString], accept: F) -> ChapterResult<FfmpegRun>
where
    F: Fn(&FfmpegRun) -> bool,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        let result = run_ffmpeg(tool, args).await.and_then(|run| {
            if accept(&run) {
                Ok(run)
            } else {
                Err(ChapterError::ffmpeg_failed(
                    "ffmpeg 返回非零退出码",
                    Some(truncate_diagnostics(&run.stderr, DIAGNOSTICS_LIMIT)),
                    run.status.code(),
                ))
            }
        });

        match result {
            Ok(run) => return Ok(run),
            Err(e) if e.is_retryable() && attempt <= tool.retries => {
                warn!("⚠️  ffmpeg 第 {} 次执行失败，准备重试: {}", attempt, e);
            }
            Err(e) => return Err(e),
        }
    }
}

/// 执行 ffmpeg 并要求退出码为 0，失败时按配置重试
pub async fn run_ffmpeg_checked(tool: &ToolConfig, args: &[OsString]) -> ChapterResult<String> {
    run_with_retry(tool, args, FfmpegRun::success).await.map(|run| run.stderr)
}

/// 执行 ffmpeg 并接受任意退出码，只对超时和启动失败重试
pub async fn run_ffmpeg_retrying(tool: &ToolConfig, args: &[OsString]) -> ChapterResult<FfmpegRun> {
    run_with_retry(tool, args, |_| true).await
}

/// 诊断信息截断长度（字符）
pub const DIAGNOSTICS_LIMIT: usize = 500;

/// 截断诊断输出，保证不会切断 UTF-8 字符
pub fn truncate_diagnostics(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
