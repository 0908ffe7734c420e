use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// 支持的视频扩展名
pub const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "mov", "wmv", "flv", "webm", "m4v"];

/// 是否为支持的视频文件（扩展名不区分大小写）
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// 递归收集目录下的所有视频文件，按路径排序
///
/// 已经带章节的输出文件（`*.chapters.<ext>`）会被跳过，避免重复处理。
pub fn collect_video_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("⚠️  无法读取目录项: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_video_file(path) && !is_chapters_output(path))
        .collect();

    files.sort();
    files
}

fn is_chapters_output(path: &Path) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.ends_with(".chapters"))
        .unwrap_or(false)
}
