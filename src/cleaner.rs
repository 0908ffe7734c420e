use crate::signals::BlackInterval;

/// 片头边距默认值（秒）
pub const DEFAULT_START_MARGIN: f64 = 20.0;
/// 片尾边距默认值（秒）
pub const DEFAULT_END_MARGIN: f64 = 10.0;

/// 过滤片头片尾附近的黑场
///
/// 片头/片尾的黑场几乎都是开场或结束画面，不能当作章节断点。
/// 仅保留 `start > start_margin` 且 `end < duration - end_margin` 的区间。
pub fn clean_black_intervals(
    blacks: &[BlackInterval],
    duration: f64,
    start_margin: f64,
    end_margin: f64,
) -> Vec<BlackInterval> {
    blacks
        .iter()
        .filter(|b| b.start > start_margin && b.end < duration - end_margin)
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_interior_interval() {
        let blacks = vec![BlackInterval::new(100.0, 102.0)];
        let cleaned = clean_black_intervals(&blacks, 3600.0, DEFAULT_START_MARGIN, DEFAULT_END_MARGIN);
        assert_eq!(cleaned, blacks);
    }

    #[test]
    fn test_drops_intro_and_outro_blacks() {
        let blacks = vec![
            BlackInterval::new(5.0, 6.0),
            BlackInterval::new(300.0, 301.0),
            BlackInterval::new(3595.0, 3599.0),
        ];
        let cleaned = clean_black_intervals(&blacks, 3600.0, DEFAULT_START_MARGIN, DEFAULT_END_MARGIN);
        assert_eq!(cleaned, vec![BlackInterval::new(300.0, 301.0)]);
    }

    #[test]
    fn test_margins_are_strict() {
        // start == 20 和 end == duration - 10 都不满足严格不等式
        let blacks = vec![
            BlackInterval::new(20.0, 25.0),
            BlackInterval::new(500.0, 590.0),
        ];
        let cleaned = clean_black_intervals(&blacks, 600.0, DEFAULT_START_MARGIN, DEFAULT_END_MARGIN);
        assert!(cleaned.is_empty());
    }

    #[test]
    fn test_clean_is_idempotent() {
        let blacks = vec![
            BlackInterval::new(1.0, 2.0),
            BlackInterval::new(40.0, 41.0),
            BlackInterval::new(95.0, 99.0),
        ];
        let once = clean_black_intervals(&blacks, 100.0, 20.0, 10.0);
        let twice = clean_black_intervals(&once, 100.0, 20.0, 10.0);
        assert_eq!(once, twice);
    }
}
