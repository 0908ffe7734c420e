use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::break_selector::BreakSelector;
use crate::chapters::{build_chapter_document, ChapterDocument};
use crate::cleaner::{clean_black_intervals, DEFAULT_END_MARGIN, DEFAULT_START_MARGIN};
use crate::command::ToolConfig;
use crate::error::{ChapterError, ChapterResult};
use crate::probe::{DetectionConfig, MediaProbe};
use crate::remux::ChapterMuxer;
use crate::report::{report_path, ChapterReport, SignalCounts};
use crate::signals::BreakPoint;

/// 章节处理配置
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessConfig {
    /// 最大章节间隔（分钟）
    pub max_gap_minutes: u32,
    /// 片头边距（秒）
    pub start_margin: f64,
    /// 片尾边距（秒）
    pub end_margin: f64,
    /// 是否把章节写入视频
    pub write_chapters: bool,
    /// 是否覆盖原文件（否则输出 `<base>.chapters<ext>`）
    pub overwrite: bool,
    /// 是否输出 JSON 报告
    pub report: bool,
    /// 检测参数
    pub detection: DetectionConfig,
    /// ffmpeg 配置
    pub tool: ToolConfig,
}

impl ProcessConfig {
    pub fn max_gap_seconds(&self) -> f64 {
        f64::from(self.max_gap_minutes) * 60.0
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            max_gap_minutes: 12,
            start_margin: DEFAULT_START_MARGIN,
            end_margin: DEFAULT_END_MARGIN,
            write_chapters: false,
            overwrite: false,
            report: false,
            detection: DetectionConfig::default(),
            tool: ToolConfig::default(),
        }
    }
}

/// 单个视频的处理结果
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub input: PathBuf,
    /// 视频时长（秒）
    pub duration: f64,
    pub breaks: Vec<BreakPoint>,
    pub document: ChapterDocument,
    pub signals: SignalCounts,
    /// 写入章节后的视频路径
    pub chaptered_file: Option<PathBuf>,
    /// JSON 报告路径
    pub report_file: Option<PathBuf>,
}

/// 处理单个视频：探测 → 过滤黑场 → 选择断点 → 写入章节
pub async fn process_video<P, M>(
    input: impl AsRef<Path>,
    config: &ProcessConfig,
    probe: &P,
    muxer: &M,
) -> ChapterResult<ProcessOutput>
where
    P: MediaProbe + ?Sized,
    M: ChapterMuxer + ?Sized,
{
    let input = input.as_ref();
    let total_start = Instant::now();
    info!("🎬 [视频处理] 开始处理视频: {}", input.display());

    // 1. 获取视频时长，失败或时长为 0 则终止
    let duration = match probe.duration(input).await? {
        Some(duration) if duration > 0.0 => duration,
        _ => {
            error!("❌ [视频处理] 无法获取视频时长: {}", input.display());
            return Err(ChapterError::ProbeFailed {
                path: input.to_path_buf(),
            });
        }
    };
    info!("  • 视频时长: {:.2}秒", duration);

    // 2. 三路信号检测互不依赖，并发执行
    let detect_start = Instant::now();
    info!("⏳ [视频处理] 正在检测黑场、静音和镜头切换...");
    let (blacks, silences, scenes) = tokio::join!(
        probe.black_intervals(input),
        probe.silence_intervals(input),
        probe.scene_cuts(input),
    );
    let blacks = degrade_to_empty("黑场检测", blacks);
    let silences = degrade_to_empty("静音检测", silences);
    let scenes = degrade_to_empty("镜头切换检测", scenes);
    info!(
        "✅ [视频处理] 信号检测完成，耗时: {:.2}秒 (黑场 {} / 静音 {} / 镜头切换 {})",
        detect_start.elapsed().as_secs_f64(),
        blacks.len(),
        silences.len(),
        scenes.len()
    );

    // 3. 过滤片头片尾黑场并选择断点
    let cleaned = clean_black_intervals(&blacks, duration, config.start_margin, config.end_margin);
    debug!("黑场过滤: {} -> {}", blacks.len(), cleaned.len());

    let selector = BreakSelector::from_minutes(config.max_gap_minutes);
    let breaks = selector.select_breaks(duration, &cleaned, &silences, &scenes);
    let document = build_chapter_document(&breaks, duration);
    info!("✅ [视频处理] 断点选择完成: {} 个断点, {} 个章节", breaks.len(), document.len());

    let signals = SignalCounts {
        blacks_detected: blacks.len(),
        blacks_kept: cleaned.len(),
        silences: silences.len(),
        scenes: scenes.len(),
    };

    // 4. 写入章节（可选）
    let chaptered_file = if config.write_chapters {
        info!("⏳ [视频处理] 正在写入章节...");
        Some(muxer.write_chapters(input, &document, config.overwrite).await?)
    } else {
        None
    };

    let mut output = ProcessOutput {
        input: input.to_path_buf(),
        duration,
        breaks,
        document,
        signals,
        chaptered_file,
        report_file: None,
    };

    // 5. 生成报告（可选）
    if config.report {
        let path = report_path(input);
        let report = build_report(&output, config.max_gap_seconds());
        // 章节可能已经写入，报告失败不影响本文件的结果
        match write_report(&path, &report).await {
            Ok(()) => {
                info!("  • 报告文件: {}", path.display());
                output.report_file = Some(path);
            }
            Err(e) => warn!("⚠️  [视频处理] 报告写入失败: {} - {}", path.display(), e),
        }
    }

    info!(
        "🎉 [视频处理] 处理完成！总耗时: {:.2}秒",
        total_start.elapsed().as_secs_f64()
    );
    Ok(output)
}

/// 逐个处理多个视频，每个文件的结果互不影响
pub async fn process_batch<P, M>(
    files: &[PathBuf],
    config: &ProcessConfig,
    probe: &P,
    muxer: &M,
) -> Vec<(PathBuf, ChapterResult<ProcessOutput>)>
where
    P: MediaProbe + ?Sized,
    M: ChapterMuxer + ?Sized,
{
    let mut results = Vec::with_capacity(files.len());
    for (i, file) in files.iter().enumerate() {
        info!("📁 [批量处理] ({}/{}) {}", i + 1, files.len(), file.display());
        let result = process_video(file, config, probe, muxer).await;
        if let Err(e) = &result {
            error!("❌ [批量处理] {} 处理失败: {}", file.display(), e);
        }
        results.push((file.clone(), result));
    }
    results
}

async fn write_report(path: &Path, report: &ChapterReport) -> ChapterResult<()> {
    let json = serde_json::to_string_pretty(report)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

/// 生成 JSON 报告
pub fn build_report(output: &ProcessOutput, max_gap_seconds: f64) -> ChapterReport {
    ChapterReport {
        input_video: output.input.to_string_lossy().to_string(),
        total_duration: output.duration,
        max_gap_seconds,
        signals: output.signals,
        breaks: output.breaks.clone(),
        chapters: output.document.chapters.clone(),
        generated_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// 信号检测失败不影响整体流程，按空信号处理
fn degrade_to_empty<T>(stage: &str, result: ChapterResult<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!("⚠️  [视频处理] {}失败，按无信号处理: {}", stage, e);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{BlackInterval, SceneCut, SilenceInterval};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 返回固定数据的探测器
    #[derive(Default)]
    struct FixtureProbe {
        duration: Option<f64>,
        blacks: Vec<BlackInterval>,
        silences: Vec<SilenceInterval>,
        scenes: Vec<SceneCut>,
        fail_scenes: bool,
    }

    #[async_trait]
    impl MediaProbe for FixtureProbe {
        async fn duration(&self, _path: &Path) -> ChapterResult<Option<f64>> {
            Ok(self.duration)
        }

        async fn black_intervals(&self, _path: &Path) -> ChapterResult<Vec<BlackInterval>> {
            Ok(self.blacks.clone())
        }

        async fn silence_intervals(&self, _path: &Path) -> ChapterResult<Vec<SilenceInterval>> {
            Ok(self.silences.clone())
        }

        async fn scene_cuts(&self, _path: &Path) -> ChapterResult<Vec<SceneCut>> {
            if self.fail_scenes {
                return Err(ChapterError::Timeout(1800));
            }
            Ok(self.scenes.clone())
        }
    }

    /// 记录调用参数的章节写入器
    #[derive(Default)]
    struct RecordingMuxer {
        calls: Mutex<Vec<(PathBuf, usize, bool)>>,
        fail: bool,
    }

    #[async_trait]
    impl ChapterMuxer for RecordingMuxer {
        async fn write_chapters(&self, video: &Path, document: &ChapterDocument, overwrite: bool) -> ChapterResult<PathBuf> {
            self.calls.lock().unwrap().push((video.to_path_buf(), document.len(), overwrite));
            if self.fail {
                return Err(ChapterError::RemuxFailed {
                    exit_code: Some(1),
                    diagnostics: "Invalid data found when processing input".to_string(),
                });
            }
            Ok(crate::remux::chapters_output_path(video))
        }
    }

    #[tokio::test]
    async fn test_unknown_duration_aborts() {
        let probe = FixtureProbe::default();
        let muxer = RecordingMuxer::default();
        let config = ProcessConfig {
            write_chapters: true,
            ..ProcessConfig::default()
        };

        let err = process_video("broken.mkv", &config, &probe, &muxer).await.unwrap_err();
        assert!(matches!(err, ChapterError::ProbeFailed { .. }));

        let zero_length = FixtureProbe {
            duration: Some(0.0),
            ..FixtureProbe::default()
        };
        let err = process_video("empty.mkv", &config, &zero_length, &muxer).await.unwrap_err();
        assert!(matches!(err, ChapterError::ProbeFailed { .. }));
        assert!(muxer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pipeline_cleans_blacks_and_fills_gaps() {
        let probe = FixtureProbe {
            duration: Some(3600.0),
            blacks: vec![
                BlackInterval::new(0.0, 2.0),
                BlackInterval::new(1799.0, 1801.0),
                BlackInterval::new(3595.0, 3600.0),
            ],
            silences: vec![SilenceInterval::new(900.0, 901.0)],
            scenes: vec![SceneCut::new(880.0), SceneCut::new(1000.0), SceneCut::new(2700.0)],
            ..FixtureProbe::default()
        };
        let muxer = RecordingMuxer::default();
        let config = ProcessConfig::default();

        let output = process_video("show.mkv", &config, &probe, &muxer).await.unwrap();

        // 开头空档 (0, 1800) 中点 900，选 880；结尾空档不补位
        assert_eq!(output.breaks, vec![BreakPoint::scene(880.0), BreakPoint::black(1800.0)]);
        assert_eq!(output.document.len(), 3);
        assert_eq!(
            output.signals,
            SignalCounts {
                blacks_detected: 3,
                blacks_kept: 1,
                silences: 1,
                scenes: 3,
            }
        );
        assert!(output.chaptered_file.is_none());
        assert!(muxer.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_detection_degrades_to_empty() {
        let probe = FixtureProbe {
            duration: Some(100.0),
            scenes: vec![SceneCut::new(50.0)],
            fail_scenes: true,
            ..FixtureProbe::default()
        };
        let muxer = RecordingMuxer::default();

        let output = process_video("clip.mp4", &ProcessConfig::default(), &probe, &muxer).await.unwrap();
        assert!(output.breaks.is_empty());
        assert_eq!(output.document.len(), 1);
    }

    #[tokio::test]
    async fn test_write_chapters_forwards_overwrite_flag() {
        let probe = FixtureProbe {
            duration: Some(100.0),
            scenes: vec![SceneCut::new(50.0)],
            ..FixtureProbe::default()
        };
        let muxer = RecordingMuxer::default();
        let config = ProcessConfig {
            max_gap_minutes: 1,
            write_chapters: true,
            overwrite: true,
            ..ProcessConfig::default()
        };

        let output = process_video("clip.mp4", &config, &probe, &muxer).await.unwrap();
        assert_eq!(output.breaks, vec![BreakPoint::scene(50.0)]);
        assert_eq!(output.chaptered_file, Some(PathBuf::from("clip.chapters.mp4")));
        assert_eq!(*muxer.calls.lock().unwrap(), vec![(PathBuf::from("clip.mp4"), 2, true)]);
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let probe = FixtureProbe {
            duration: Some(600.0),
            ..FixtureProbe::default()
        };
        let muxer = RecordingMuxer {
            fail: true,
            ..RecordingMuxer::default()
        };
        let config = ProcessConfig {
            write_chapters: true,
            ..ProcessConfig::default()
        };
        let files = vec![PathBuf::from("a.mkv"), PathBuf::from("b.mkv")];

        let results = process_batch(&files, &config, &probe, &muxer).await;
        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|(_, r)| matches!(r, Err(ChapterError::RemuxFailed { .. }))));
        assert_eq!(muxer.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_report_is_written_next_to_video() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("talk.mkv");
        let probe = FixtureProbe {
            duration: Some(120.0),
            blacks: vec![BlackInterval::new(59.0, 61.0)],
            ..FixtureProbe::default()
        };
        let config = ProcessConfig {
            report: true,
            ..ProcessConfig::default()
        };

        let output = process_video(&video, &config, &probe, &RecordingMuxer::default()).await.unwrap();
        let report_file = output.report_file.unwrap();
        assert_eq!(report_file, dir.path().join("talk.chapters.json"));

        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&report_file).unwrap()).unwrap();
        assert_eq!(json["total_duration"], 120.0);
        assert_eq!(json["max_gap_seconds"], 720.0);
        assert_eq!(json["breaks"][0]["timestamp"], 60.0);
        assert_eq!(json["breaks"][0]["kind"], "black");
        assert_eq!(json["chapters"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_report_failure_keeps_chapters_result() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("talk.mkv");
        // 报告路径被目录占用，写入必然失败
        std::fs::create_dir(dir.path().join("talk.chapters.json")).unwrap();
        let probe = FixtureProbe {
            duration: Some(120.0),
            blacks: vec![BlackInterval::new(59.0, 61.0)],
            ..FixtureProbe::default()
        };
        let muxer = RecordingMuxer::default();
        let config = ProcessConfig {
            write_chapters: true,
            report: true,
            ..ProcessConfig::default()
        };

        let output = process_video(&video, &config, &probe, &muxer).await.unwrap();
        assert!(output.report_file.is_none());
        assert!(output.chaptered_file.is_some());
        assert_eq!(output.breaks.len(), 1);
    }
}
