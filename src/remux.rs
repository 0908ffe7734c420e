use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::chapters::ChapterDocument;
use crate::command::{run_ffmpeg, truncate_diagnostics, ToolConfig, DIAGNOSTICS_LIMIT};
use crate::error::{ChapterError, ChapterResult};

/// 章节写入接口：把章节文档封装进视频容器
#[async_trait]
pub trait ChapterMuxer: Send + Sync {
    /// 写入章节，返回输出文件路径
    async fn write_chapters(&self, video: &Path, document: &ChapterDocument, overwrite: bool) -> ChapterResult<PathBuf>;
}

/// 非覆盖模式下的输出路径：`<base>.chapters<ext>`
pub fn chapters_output_path(video: &Path) -> PathBuf {
    sibling_with_suffix(video, "chapters")
}

/// 在文件名和扩展名之间插入后缀，扩展名保持在最后（ffmpeg 依赖扩展名选择容器）
fn sibling_with_suffix(video: &Path, suffix: &str) -> PathBuf {
    let stem = video.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match video.extension() {
        Some(ext) => format!("{}.{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}.{}", stem, suffix),
    };
    video.with_file_name(name)
}

/// 删除失败或超时后 ffmpeg 留下的半成品输出
async fn discard_partial_output(target: &Path) {
    match tokio::fs::remove_file(target).await {
        Ok(()) => debug!("已删除不完整的输出: {}", target.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("⚠️  删除不完整的输出失败: {} - {}", target.display(), e),
    }
}

/// 基于 ffmpeg 的章节写入（流复制，不重新编码）
#[derive(Debug, Clone)]
pub struct FfmpegMuxer {
    tool: ToolConfig,
}

impl FfmpegMuxer {
    pub fn new(tool: ToolConfig) -> Self {
        Self { tool }
    }

    fn remux_args(video: &Path, metadata: &Path, output: &Path) -> Vec<OsString> {
        let mut args = vec![
            OsString::from("-i"),
            video.as_os_str().to_os_string(),
            OsString::from("-i"),
            metadata.as_os_str().to_os_string(),
        ];
        args.extend(
            ["-map", "0", "-map_metadata", "0", "-map_chapters", "1", "-c", "copy", "-y"]
                .iter()
                .map(OsString::from),
        );
        args.push(output.as_os_str().to_os_string());
        args
    }
}

#[async_trait]
impl ChapterMuxer for FfmpegMuxer {
    async fn write_chapters(&self, video: &Path, document: &ChapterDocument, overwrite: bool) -> ChapterResult<PathBuf> {
        if !video.exists() {
            return Err(ChapterError::FileNotFound(video.to_path_buf()));
        }

        let token = uuid::Uuid::new_v4().simple().to_string();
        let stem = video.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let metadata_path = video.with_file_name(format!("{}.{}.ffmetadata", stem, token));
        // 覆盖模式先写临时文件，成功后再替换原文件
        let target = if overwrite {
            sibling_with_suffix(video, &token)
        } else {
            chapters_output_path(video)
        };

        tokio::fs::write(&metadata_path, document.to_ffmetadata()).await?;
        debug!("章节元数据已写入: {}", metadata_path.display());

        let args = Self::remux_args(video, &metadata_path, &target);
        let result = run_ffmpeg(&self.tool, &args).await;

        if let Err(e) = tokio::fs::remove_file(&metadata_path).await {
            warn!("⚠️  删除临时元数据文件失败: {} - {}", metadata_path.display(), e);
        }

        let failure = match result {
            Ok(run) if run.success() => None,
            Ok(run) => Some(ChapterError::RemuxFailed {
                exit_code: run.status.code(),
                diagnostics: truncate_diagnostics(&run.stderr, DIAGNOSTICS_LIMIT),
            }),
            Err(e) => Some(e),
        };
        if let Some(e) = failure {
            discard_partial_output(&target).await;
            return Err(e);
        }

        let output = if overwrite {
            if let Err(e) = tokio::fs::rename(&target, video).await {
                discard_partial_output(&target).await;
                return Err(e.into());
            }
            video.to_path_buf()
        } else {
            target
        };

        info!("✅ [章节写入] 已写入 {} 个章节: {}", document.len(), output.display());
        Ok(output)
    }
}
