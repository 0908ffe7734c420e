use serde::Serialize;
use std::fmt::Write;

use crate::signals::BreakPoint;

/// 写入 ffmetadata 的 encoder 字段
const ENCODER: &str = "video-chapter";

/// 单个章节
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chapter {
    /// 章节编号（从 1 开始）
    pub index: usize,
    /// 开始时间（秒）
    pub start: f64,
    /// 结束时间（秒）
    pub end: f64,
    /// 章节标题
    pub title: String,
}

impl Chapter {
    /// 开始时间（毫秒，向下取整）
    pub fn start_ms(&self) -> i64 {
        to_millis(self.start)
    }

    /// 结束时间（毫秒，向下取整）
    pub fn end_ms(&self) -> i64 {
        to_millis(self.end)
    }
}

/// 章节元数据文档
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChapterDocument {
    pub chapters: Vec<Chapter>,
}

impl ChapterDocument {
    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// 渲染为 FFMETADATA1 文本（时间基 1/1000）
    pub fn to_ffmetadata(&self) -> String {
        let mut out = String::new();
        out.push_str(";FFMETADATA1\n");
        let _ = writeln!(out, "encoder={}", ENCODER);

        for chapter in &self.chapters {
            out.push_str("\n[CHAPTER]\n");
            out.push_str("TIMEBASE=1/1000\n");
            let _ = writeln!(out, "START={}", chapter.start_ms());
            let _ = writeln!(out, "END={}", chapter.end_ms());
            let _ = writeln!(out, "title={}", chapter.title);
        }

        out
    }
}

/// 根据断点列表生成章节文档
///
/// N 个断点生成 N+1 个章节：第 i 个章节从上一个断点（第一个章节从 0）
/// 到第 i 个断点，最后一个章节从最后一个断点到视频结尾。
pub fn build_chapter_document(breaks: &[BreakPoint], duration: f64) -> ChapterDocument {
    let mut chapters = Vec::with_capacity(breaks.len() + 1);
    let mut prev = 0.0;

    for (i, bp) in breaks.iter().enumerate() {
        chapters.push(Chapter {
            index: i + 1,
            start: prev,
            end: bp.timestamp,
            title: format!("Chapter {}", i + 1),
        });
        prev = bp.timestamp;
    }

    chapters.push(Chapter {
        index: breaks.len() + 1,
        start: prev,
        end: duration,
        title: format!("Chapter {}", breaks.len() + 1),
    });

    ChapterDocument { chapters }
}

fn to_millis(seconds: f64) -> i64 {
    (seconds * 1000.0).floor() as i64
}
