use anyhow::{Context, Result};
use configparser::ini::Ini;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::processor::ProcessConfig;

/// 默认配置文件名
const CONFIG_FILE_NAME: &str = "video-chapter.ini";

/// 命令行覆盖项（未指定的字段为 `None`）
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub max_gap_minutes: Option<u32>,
    pub ffmpeg_path: Option<PathBuf>,
    pub write_chapters: bool,
    pub overwrite: bool,
    pub report: bool,
}

/// 加载后的完整配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub process: ProcessConfig,
    /// 日志级别（trace, debug, info, warn, error）
    pub log_level: String,
}

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从多个源加载配置，优先级：命令行参数 > 环境变量 > 配置文件 > 默认值
    pub fn load_config(config_file: Option<&Path>, cli: &CliOverrides) -> Result<AppConfig> {
        // 显式指定的配置文件必须可读，默认位置的配置文件可以不存在
        let ini = match config_file {
            Some(path) => Some(Self::load_ini(path)?),
            None => Self::find_default_config().map(|path| Self::load_ini(&path)).transpose()?,
        };

        let mut process = match &ini {
            Some(ini) => Self::process_from_ini(ini),
            None => ProcessConfig::default(),
        };
        let mut log_level = ini
            .as_ref()
            .and_then(|ini| ini.get("logging", "level"))
            .unwrap_or_else(|| "info".to_string());

        // 环境变量
        if let Some(minutes) = env::var("VIDEO_CHAPTER_MAX_GAP").ok().and_then(|v| v.parse().ok()) {
            process.max_gap_minutes = minutes;
        }
        if let Some(path) = env::var_os("VIDEO_CHAPTER_FFMPEG").filter(|v| !v.is_empty()) {
            process.tool.ffmpeg = PathBuf::from(path);
        }
        if let Some(secs) = env::var("VIDEO_CHAPTER_TIMEOUT").ok().and_then(|v| v.parse().ok()) {
            process.tool.timeout = Duration::from_secs(secs);
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            log_level = level;
        }

        Self::apply_cli(&mut process, cli);

        Ok(AppConfig { process, log_level })
    }

    /// 命令行参数覆盖（开关类参数只能打开，不能关闭配置文件中的设置）
    fn apply_cli(process: &mut ProcessConfig, cli: &CliOverrides) {
        if let Some(minutes) = cli.max_gap_minutes {
            process.max_gap_minutes = minutes;
        }
        if let Some(path) = &cli.ffmpeg_path {
            process.tool.ffmpeg = path.clone();
        }
        process.write_chapters |= cli.write_chapters;
        process.overwrite |= cli.overwrite;
        process.report |= cli.report;
    }

    fn load_ini(path: &Path) -> Result<Ini> {
        if !path.exists() {
            anyhow::bail!("配置文件不存在: {}", path.display());
        }
        let mut ini = Ini::new();
        ini.load(path)
            .map_err(|e| anyhow::anyhow!("读取配置文件失败: {}: {}", path.display(), e))?;
        Ok(ini)
    }

    /// 从 INI 读取处理配置，缺失或无法解析的字段使用默认值
    fn process_from_ini(ini: &Ini) -> ProcessConfig {
        let defaults = ProcessConfig::default();
        let get_f64 = |section: &str, key: &str| ini.get(section, key).and_then(|v| v.parse::<f64>().ok());
        let get_bool = |section: &str, key: &str| ini.getbool(section, key).ok().flatten();

        let mut process = ProcessConfig {
            max_gap_minutes: ini
                .get("video_chapter", "max_gap_minutes")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_gap_minutes),
            start_margin: get_f64("detect", "start_margin").unwrap_or(defaults.start_margin),
            end_margin: get_f64("detect", "end_margin").unwrap_or(defaults.end_margin),
            write_chapters: get_bool("video_chapter", "write_chapters").unwrap_or(defaults.write_chapters),
            overwrite: get_bool("video_chapter", "overwrite").unwrap_or(defaults.overwrite),
            report: get_bool("video_chapter", "report").unwrap_or(defaults.report),
            ..defaults
        };

        let detection = &mut process.detection;
        if let Some(v) = get_f64("detect", "black_min_duration") {
            detection.black_min_duration = v;
        }
        if let Some(v) = get_f64("detect", "black_pixel_threshold") {
            detection.black_pixel_threshold = v;
        }
        if let Some(v) = ini.get("detect", "silence_noise").filter(|v| !v.is_empty()) {
            detection.silence_noise = v;
        }
        if let Some(v) = get_f64("detect", "silence_min_duration") {
            detection.silence_min_duration = v;
        }
        if let Some(v) = get_f64("detect", "scene_threshold") {
            detection.scene_threshold = v;
        }

        let tool = &mut process.tool;
        if let Some(path) = ini.get("ffmpeg", "path").filter(|v| !v.is_empty()) {
            tool.ffmpeg = PathBuf::from(path);
        }
        if let Some(secs) = ini.get("ffmpeg", "timeout_secs").and_then(|v| v.parse().ok()) {
            tool.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = ini.get("ffmpeg", "retries").and_then(|v| v.parse().ok()) {
            tool.retries = retries;
        }

        process
    }

    /// 按顺序查找默认配置文件
    fn find_default_config() -> Option<PathBuf> {
        let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME), PathBuf::from(format!(".{}", CONFIG_FILE_NAME))];
        if let Some(home) = env::var_os("HOME") {
            candidates.push(PathBuf::from(home).join(format!(".{}", CONFIG_FILE_NAME)));
        }
        candidates.push(PathBuf::from("/etc").join(CONFIG_FILE_NAME));

        candidates.into_iter().find(|path| path.exists())
    }

    /// 创建默认配置文件
    pub fn create_default_config(config_path: &Path) -> Result<()> {
        let defaults = ProcessConfig::default();
        let mut ini = Ini::new();
        ini.set("video_chapter", "max_gap_minutes", Some(defaults.max_gap_minutes.to_string()));
        ini.set("video_chapter", "write_chapters", Some("false".to_string()));
        ini.set("video_chapter", "overwrite", Some("false".to_string()));
        ini.set("video_chapter", "report", Some("false".to_string()));
        ini.set("detect", "start_margin", Some(defaults.start_margin.to_string()));
        ini.set("detect", "end_margin", Some(defaults.end_margin.to_string()));
        ini.set("detect", "black_min_duration", Some(defaults.detection.black_min_duration.to_string()));
        ini.set("detect", "black_pixel_threshold", Some(defaults.detection.black_pixel_threshold.to_string()));
        ini.set("detect", "silence_noise", Some(defaults.detection.silence_noise.clone()));
        ini.set("detect", "silence_min_duration", Some(defaults.detection.silence_min_duration.to_string()));
        ini.set("detect", "scene_threshold", Some(defaults.detection.scene_threshold.to_string()));
        ini.set("ffmpeg", "path", Some(defaults.tool.ffmpeg.to_string_lossy().into_owned()));
        ini.set("ffmpeg", "timeout_secs", Some(defaults.tool.timeout.as_secs().to_string()));
        ini.set("ffmpeg", "retries", Some(defaults.tool.retries.to_string()));
        ini.set("logging", "level", Some("info".to_string()));

        ini.write(config_path)
            .with_context(|| format!("写入配置文件失败: {}", config_path.display()))?;

        Ok(())
    }
}
