use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tracing::debug;

use crate::command::{run_ffmpeg_checked, run_ffmpeg_retrying, ToolConfig};
use crate::error::{ChapterError, ChapterResult};
use crate::ffmpeg_output;
use crate::signals::{BlackInterval, SceneCut, SilenceInterval};

/// 信号检测参数（对应 ffmpeg 滤镜参数）
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// blackdetect 最短黑场时长（秒）
    pub black_min_duration: f64,
    /// blackdetect 像素阈值
    pub black_pixel_threshold: f64,
    /// silencedetect 噪声阈值
    pub silence_noise: String,
    /// silencedetect 最短静音时长（秒）
    pub silence_min_duration: f64,
    /// 镜头切换阈值 (0.0-1.0)
    pub scene_threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            black_min_duration: 0.1,
            black_pixel_threshold: 0.10,
            silence_noise: "-30dB".to_string(),
            silence_min_duration: 0.3,
            scene_threshold: 0.4,
        }
    }
}

/// 媒体探测接口
///
/// 提供时长和三类原始信号。测试中用固定数据实现，不依赖真实的 ffmpeg。
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// 视频时长（秒），无法确定时返回 `None`
    async fn duration(&self, path: &Path) -> ChapterResult<Option<f64>>;

    async fn black_intervals(&self, path: &Path) -> ChapterResult<Vec<BlackInterval>>;

    async fn silence_intervals(&self, path: &Path) -> ChapterResult<Vec<SilenceInterval>>;

    async fn scene_cuts(&self, path: &Path) -> ChapterResult<Vec<SceneCut>>;
}

/// 基于 ffmpeg 命令行的探测实现
#[derive(Debug, Clone)]
pub struct FfmpegProbe {
    tool: ToolConfig,
    detection: DetectionConfig,
}

impl FfmpegProbe {
    pub fn new(tool: ToolConfig, detection: DetectionConfig) -> Self {
        Self { tool, detection }
    }

    /// `ffmpeg -i <file> <filter args> -f null -`
    fn filter_args(path: &Path, filter: &[&str]) -> Vec<OsString> {
        let mut args = vec![OsString::from("-i"), path.as_os_str().to_os_string()];
        args.extend(filter.iter().map(OsString::from));
        args.extend(["-f", "null", "-"].iter().map(OsString::from));
        args
    }

    fn black_filter(&self) -> String {
        format!(
            "blackdetect=d={}:pix_th={}",
            self.detection.black_min_duration, self.detection.black_pixel_threshold
        )
    }

    fn silence_filter(&self) -> String {
        format!(
            "silencedetect=noise={}:d={}",
            self.detection.silence_noise, self.detection.silence_min_duration
        )
    }

    fn scene_filter(&self) -> String {
        format!("select=gt(scene\\,{}),showinfo", self.detection.scene_threshold)
    }
}

#[async_trait]
impl MediaProbe for FfmpegProbe {
    async fn duration(&self, path: &Path) -> ChapterResult<Option<f64>> {
        if !path.exists() {
            return Err(ChapterError::FileNotFound(path.to_path_buf()));
        }

        // 没有指定输出文件时 ffmpeg 总是返回非零退出码，这里只看 stderr
        let args = vec![OsString::from("-i"), path.as_os_str().to_os_string()];
        let run = run_ffmpeg_retrying(&self.tool, &args).await?;
        let duration = ffmpeg_output::parse_duration(&run.stderr);
        debug!("时长探测结果: {:?}", duration);
        Ok(duration)
    }

    async fn black_intervals(&self, path: &Path) -> ChapterResult<Vec<BlackInterval>> {
        let filter = self.black_filter();
        let args = Self::filter_args(path, &["-vf", filter.as_str(), "-an"]);
        let stderr = run_ffmpeg_checked(&self.tool, &args).await?;
        Ok(ffmpeg_output::parse_black_intervals(&stderr))
    }

    async fn silence_intervals(&self, path: &Path) -> ChapterResult<Vec<SilenceInterval>> {
        let filter = self.silence_filter();
        let args = Self::filter_args(path, &["-vn", "-af", filter.as_str()]);
        let stderr = run_ffmpeg_checked(&self.tool, &args).await?;
        Ok(ffmpeg_output::parse_silence_intervals(&stderr))
    }

    async fn scene_cuts(&self, path: &Path) -> ChapterResult<Vec<SceneCut>> {
        let filter = self.scene_filter();
        let args = Self::filter_args(path, &["-vf", filter.as_str(), "-an"]);
        let stderr = run_ffmpeg_checked(&self.tool, &args).await?;
        Ok(ffmpeg_output::parse_scene_cuts(&stderr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe() -> FfmpegProbe {
        FfmpegProbe::new(ToolConfig::default(), DetectionConfig::default())
    }

    #[test]
    fn test_default_filters() {
        let probe = probe();
        assert_eq!(probe.black_filter(), "blackdetect=d=0.1:pix_th=0.1");
        assert_eq!(probe.silence_filter(), "silencedetect=noise=-30dB:d=0.3");
        assert_eq!(probe.scene_filter(), "select=gt(scene\\,0.4),showinfo");
    }

    #[test]
    fn test_black_threshold_keeps_precision() {
        let probe = FfmpegProbe::new(
            ToolConfig::default(),
            DetectionConfig {
                black_pixel_threshold: 0.125,
                ..DetectionConfig::default()
            },
        );
        assert_eq!(probe.black_filter(), "blackdetect=d=0.1:pix_th=0.125");
    }

    #[test]
    fn test_filter_args_layout() {
        let args = FfmpegProbe::filter_args(Path::new("/videos/a.mkv"), &["-vf", "blackdetect"]);
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["-i", "/videos/a.mkv", "-vf", "blackdetect", "-f", "null", "-"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_duration_retries_after_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("lecture.mkv");
        std::fs::write(&video, b"").unwrap();
        let log = dir.path().join("attempts.log");
        let marker = dir.path().join("slow-once");

        // 第一次执行卡住直到超时，第二次正常输出时长（退出码非零，和真实 ffmpeg 一致）
        let body = format!(
            "echo run >> '{log}'\n\
             if [ ! -e '{marker}' ]; then touch '{marker}'; sleep 5; fi\n\
             echo '  Duration: 00:01:40.00, start: 0.000000, bitrate: 1200 kb/s' >&2\n\
             exit 1\n",
            log = log.display(),
            marker = marker.display(),
        );
        let stub = crate::command::tests::write_stub(dir.path(), "slow-ffmpeg.sh", &body);
        let probe = FfmpegProbe::new(
            ToolConfig {
                ffmpeg: stub,
                timeout: std::time::Duration::from_secs(1),
                retries: 1,
            },
            DetectionConfig::default(),
        );

        assert_eq!(probe.duration(&video).await.unwrap(), Some(100.0));
        assert_eq!(std::fs::read_to_string(&log).unwrap().lines().count(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_probed() {
        let err = probe().duration(Path::new("/nonexistent/video.mkv")).await.unwrap_err();
        assert!(matches!(err, ChapterError::FileNotFound(_)));
    }
}
