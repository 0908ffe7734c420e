use serde::Serialize;
use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::chapters::Chapter;
use crate::signals::BreakPoint;

/// 单个视频的处理报告（写入 `<base>.chapters.json`）
#[derive(Debug, Clone, Serialize)]
pub struct ChapterReport {
    /// 输入视频文件路径
    pub input_video: String,
    /// 视频总时长（秒）
    pub total_duration: f64,
    /// 最大章节间隔（秒）
    pub max_gap_seconds: f64,
    /// 各类信号数量
    pub signals: SignalCounts,
    /// 断点列表
    pub breaks: Vec<BreakPoint>,
    /// 章节列表
    pub chapters: Vec<Chapter>,
    /// 生成时间（RFC 3339）
    pub generated_at: String,
}

/// 各类信号的数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SignalCounts {
    /// ffmpeg 检测到的黑场数
    pub blacks_detected: usize,
    /// 片头片尾过滤后保留的黑场数
    pub blacks_kept: usize,
    pub silences: usize,
    pub scenes: usize,
}

/// 报告文件路径：`<base>.chapters.json`
pub fn report_path(video: &Path) -> PathBuf {
    let stem = video.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    video.with_file_name(format!("{}.chapters.json", stem))
}

/// `m:ss` 格式，分钟不进位到小时
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// 渲染断点表格
pub fn render_break_table(breaks: &[BreakPoint]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>4}  {:>9}  {:<6}  {}", "#", "Timestamp", "Type", "Confidence");
    let _ = writeln!(out, "{}", "-".repeat(36));

    if breaks.is_empty() {
        let _ = writeln!(out, "{:>4}  {:>9}  (no breaks)", "-", "-");
        return out;
    }

    for (i, bp) in breaks.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:>9}  {:<6}  {}",
            i + 1,
            format_timestamp(bp.timestamp),
            bp.kind.as_str(),
            bp.confidence.as_str()
        );
    }

    out
}
