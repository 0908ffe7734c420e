//! 章节处理的错误类型

use std::path::PathBuf;
use thiserror::Error;

pub type ChapterResult<T> = Result<T, ChapterError>;

#[derive(Debug, Error)]
pub enum ChapterError {
    /// 无法获取视频时长，该文件的处理终止
    #[error("无法获取视频时长: {}", .path.display())]
    ProbeFailed { path: PathBuf },

    #[error("ffmpeg 执行失败: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    /// 重新封装失败，原文件保持不变
    #[error("写入章节失败 (exit code: {exit_code:?}): {diagnostics}")]
    RemuxFailed {
        exit_code: Option<i32>,
        diagnostics: String,
    },

    #[error("ffmpeg 执行超时（{0} 秒）")]
    Timeout(u64),

    #[error("文件不存在: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChapterError {
    pub fn ffmpeg_failed(message: impl Into<String>, stderr: Option<String>, exit_code: Option<i32>) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// 超时或 ffmpeg 异常退出，可以重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::FfmpegFailed { .. })
    }
}
