pub mod signals;
pub mod cleaner;
pub mod break_selector;
pub mod chapters;
pub mod ffmpeg_output;
pub mod command;
pub mod probe;
pub mod remux;
pub mod report;
pub mod scanner;
pub mod processor;
pub mod config;
pub mod error;

pub use signals::{BlackInterval, BreakKind, BreakPoint, Confidence, SceneCut, SilenceInterval};
pub use cleaner::clean_black_intervals;
pub use break_selector::BreakSelector;
pub use chapters::{build_chapter_document, Chapter, ChapterDocument};
pub use command::ToolConfig;
pub use probe::{DetectionConfig, FfmpegProbe, MediaProbe};
pub use remux::{ChapterMuxer, FfmpegMuxer};
pub use report::{render_break_table, ChapterReport};
pub use scanner::collect_video_files;
pub use processor::{process_batch, process_video, ProcessConfig, ProcessOutput};
pub use config::{AppConfig, CliOverrides, ConfigLoader};
pub use error::{ChapterError, ChapterResult};
