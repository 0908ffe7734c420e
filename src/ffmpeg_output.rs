//! ffmpeg 诊断输出（stderr）解析
//!
//! ffmpeg 的滤镜结果只以日志文本形式输出，这里把文本转换为强类型的信号事件。
//! 无法解析的行直接忽略，解析结果可能为空。

use std::sync::LazyLock;

use regex::Regex;

use crate::signals::{BlackInterval, SceneCut, SilenceInterval};

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Duration: (\d+):(\d+):(\d+(?:\.\d+)?)").expect("duration regex"));

/// 解析 `ffmpeg -i` 输出中的 `Duration: HH:MM:SS.ss`，返回秒数
///
/// 输出中没有时长（例如 `Duration: N/A`）时返回 `None`。
pub fn parse_duration(stderr: &str) -> Option<f64> {
    stderr
        .lines()
        .filter(|line| line.contains("Duration:"))
        .find_map(|line| {
            let caps = DURATION_RE.captures(line)?;
            let hours: f64 = caps[1].parse().ok()?;
            let minutes: f64 = caps[2].parse().ok()?;
            let seconds: f64 = caps[3].parse().ok()?;
            Some(hours * 3600.0 + minutes * 60.0 + seconds)
        })
}

/// 解析 blackdetect 输出
///
/// `[blackdetect @ 0x...] black_start:12.5 black_end:14.2 black_duration:1.7`
pub fn parse_black_intervals(stderr: &str) -> Vec<BlackInterval> {
    stderr
        .lines()
        .filter(|line| line.contains("black_start"))
        .filter_map(|line| {
            let start = value_after(line, "black_start:")?;
            let end = value_after(line, "black_end:")?;
            Some(BlackInterval::new(start, end))
        })
        .collect()
}

/// 解析 silencedetect 输出
///
/// `silence_start` 与 `silence_end` 分两行输出，按顺序配对；
/// 没有对应开始时间的结束行被忽略。
pub fn parse_silence_intervals(stderr: &str) -> Vec<SilenceInterval> {
    let mut silences = Vec::new();
    let mut pending_start: Option<f64> = None;

    for line in stderr.lines() {
        if line.contains("silence_start") {
            pending_start = value_after(line, "silence_start:");
        } else if line.contains("silence_end") {
            if let (Some(start), Some(end)) = (pending_start, value_after(line, "silence_end:")) {
                silences.push(SilenceInterval::new(start, end));
                pending_start = None;
            }
        }
    }

    silences
}

/// 解析 showinfo 输出中的 `pts_time:`
pub fn parse_scene_cuts(stderr: &str) -> Vec<SceneCut> {
    stderr
        .lines()
        .filter_map(|line| value_after(line, "pts_time:"))
        .map(SceneCut::new)
        .collect()
}

/// 读取 `key` 之后的第一个数值（允许 key 与数值之间有空格）
fn value_after(line: &str, key: &str) -> Option<f64> {
    let idx = line.find(key)?;
    line[idx + key.len()..].split_whitespace().next()?.parse().ok()
}
