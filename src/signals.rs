use serde::{Deserialize, Serialize};

/// 黑场区间（blackdetect 输出）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlackInterval {
    /// 开始时间（秒）
    pub start: f64,
    /// 结束时间（秒）
    pub end: f64,
}

impl BlackInterval {
    /// 创建黑场区间，start 与 end 颠倒时自动交换
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    /// 区间中点
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }
}

/// 静音区间（silencedetect 输出）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SilenceInterval {
    pub start: f64,
    pub end: f64,
}

impl SilenceInterval {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// 镜头切换点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneCut {
    pub timestamp: f64,
}

impl SceneCut {
    pub fn new(timestamp: f64) -> Self {
        Self { timestamp }
    }
}

/// 断点来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakKind {
    Black,
    Scene,
}

impl BreakKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakKind::Black => "black",
            BreakKind::Scene => "scene",
        }
    }
}

/// 断点置信度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
        }
    }
}

/// 章节断点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakPoint {
    /// 断点时间（秒）
    pub timestamp: f64,
    /// 断点来源
    pub kind: BreakKind,
    /// 置信度
    pub confidence: Confidence,
}

impl BreakPoint {
    /// 黑场断点（高置信度）
    pub fn black(timestamp: f64) -> Self {
        Self {
            timestamp,
            kind: BreakKind::Black,
            confidence: Confidence::High,
        }
    }

    /// 镜头切换补位断点（中置信度）
    pub fn scene(timestamp: f64) -> Self {
        Self {
            timestamp,
            kind: BreakKind::Scene,
            confidence: Confidence::Medium,
        }
    }
}
