use crate::signals::{BlackInterval, BreakPoint, SceneCut, SilenceInterval};

/// 补位镜头切换点距离空档边界的最小距离（秒）
pub const SCENE_EDGE_MARGIN: f64 = 30.0;

/// 断点选择器，根据黑场和镜头切换信号推断章节断点
///
/// 黑场断点直接采信（高置信度）；镜头切换点只用于填补黑场断点之间
/// 过长的空档（中置信度），避免出现过长的章节。
#[derive(Debug, Clone)]
pub struct BreakSelector {
    /// 两个断点之间允许的最大间隔（秒）
    max_gap_seconds: f64,
    /// 空档内部边距（秒）
    edge_margin: f64,
}

impl BreakSelector {
    pub fn new(max_gap_seconds: f64) -> Self {
        Self {
            max_gap_seconds,
            edge_margin: SCENE_EDGE_MARGIN,
        }
    }

    /// 以分钟为单位创建（命令行参数 `--max-gap` 的单位）
    pub fn from_minutes(max_gap_minutes: u32) -> Self {
        Self::new(f64::from(max_gap_minutes) * 60.0)
    }

    pub fn max_gap_seconds(&self) -> f64 {
        self.max_gap_seconds
    }

    /// 计算最终断点列表
    ///
    /// `blacks` 应当已经过 [`crate::cleaner::clean_black_intervals`] 过滤。
    /// 静音区间目前不参与断点推断，保留参数以便后续扩展。
    pub fn select_breaks(
        &self,
        duration: f64,
        blacks: &[BlackInterval],
        _silences: &[SilenceInterval],
        scenes: &[SceneCut],
    ) -> Vec<BreakPoint> {
        let mut breaks: Vec<BreakPoint> = blacks.iter().map(|b| BreakPoint::black(b.center())).collect();
        sort_by_timestamp(&mut breaks);

        let gaps = self.find_gaps(duration, &breaks);

        for (gap_start, gap_end) in gaps {
            if let Some(scene) = self.pick_scene(gap_start, gap_end, scenes) {
                breaks.push(BreakPoint::scene(scene.timestamp));
            }
        }

        sort_by_timestamp(&mut breaks);
        breaks
    }

    /// 找出高置信度断点覆盖不到的空档
    ///
    /// 只检查开头空档和相邻断点之间的空档，最后一个断点到结尾之间不检查。
    pub fn find_gaps(&self, duration: f64, anchors: &[BreakPoint]) -> Vec<(f64, f64)> {
        let (first, rest) = match anchors.split_first() {
            Some(split) => split,
            None => return vec![(0.0, duration)],
        };

        let mut gaps = Vec::new();
        if first.timestamp > self.max_gap_seconds {
            gaps.push((0.0, first.timestamp));
        }

        let mut prev = first;
        for next in rest {
            if next.timestamp - prev.timestamp > self.max_gap_seconds {
                gaps.push((prev.timestamp, next.timestamp));
            }
            prev = next;
        }

        gaps
    }

    /// 在空档内选出最靠近中点的镜头切换点，距离相同时取输入顺序中靠前的
    fn pick_scene<'a>(&self, gap_start: f64, gap_end: f64, scenes: &'a [SceneCut]) -> Option<&'a SceneCut> {
        let center = (gap_start + gap_end) / 2.0;
        let lower = gap_start + self.edge_margin;
        let upper = gap_end - self.edge_margin;

        let mut best: Option<&SceneCut> = None;
        for scene in scenes.iter().filter(|s| lower < s.timestamp && s.timestamp < upper) {
            let is_closer = match best {
                Some(current) => (scene.timestamp - center).abs() < (current.timestamp - center).abs(),
                None => true,
            };
            if is_closer {
                best = Some(scene);
            }
        }
        best
    }
}

fn sort_by_timestamp(breaks: &mut [BreakPoint]) {
    breaks.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
}
