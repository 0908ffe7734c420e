use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use video_chapter::{
    collect_video_files, process_batch, process_video, render_break_table, AppConfig, CliOverrides, ConfigLoader,
    FfmpegMuxer, FfmpegProbe, ProcessOutput,
};

/// 视频章节工具 - 根据黑场和镜头切换推断章节断点并写入视频
#[derive(Parser, Debug)]
#[command(name = "video-chapter")]
#[command(about = "检测黑场、静音和镜头切换，自动生成视频章节", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 处理单个视频文件
    Process {
        /// 输入视频文件路径
        #[arg(short, long)]
        file: PathBuf,

        #[command(flatten)]
        options: ProcessOptions,
    },
    /// 递归处理目录下的所有视频文件
    Scan {
        /// 视频目录
        #[arg(short, long)]
        dir: PathBuf,

        #[command(flatten)]
        options: ProcessOptions,
    },
    /// 生成默认配置文件
    InitConfig {
        /// 配置文件路径
        #[arg(default_value = "video-chapter.ini")]
        path: PathBuf,
    },
}

#[derive(ClapArgs, Debug)]
struct ProcessOptions {
    /// 把章节写入视频（默认只输出断点表格）
    #[arg(long)]
    write_chapters: bool,

    /// 覆盖原文件（默认输出 <name>.chapters.<ext>）
    #[arg(long)]
    overwrite: bool,

    /// 最大章节间隔（分钟），默认 12
    /// 可通过环境变量 VIDEO_CHAPTER_MAX_GAP 或配置文件设置
    #[arg(long)]
    max_gap: Option<u32>,

    /// 输出 JSON 报告（<name>.chapters.json）
    #[arg(long)]
    report: bool,

    /// ffmpeg 可执行文件路径
    /// 可通过环境变量 VIDEO_CHAPTER_FFMPEG 或配置文件设置
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// 配置文件路径（可选，支持 .ini 格式）
    /// 优先级：命令行参数 > 环境变量 > 配置文件 > 默认值
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ProcessOptions {
    fn load(&self) -> Result<AppConfig> {
        let overrides = CliOverrides {
            max_gap_minutes: self.max_gap,
            ffmpeg_path: self.ffmpeg.clone(),
            write_chapters: self.write_chapters,
            overwrite: self.overwrite,
            report: self.report,
        };
        ConfigLoader::load_config(self.config.as_deref(), &overrides).context("加载配置失败")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Process { file, options } => {
            let config = options.load()?;
            init_logging(&config.log_level);

            let probe = FfmpegProbe::new(config.process.tool.clone(), config.process.detection.clone());
            let muxer = FfmpegMuxer::new(config.process.tool.clone());

            let output = process_video(&file, &config.process, &probe, &muxer)
                .await
                .with_context(|| format!("处理视频失败: {}", file.display()))?;
            print_output(&output);
        }
        Commands::Scan { dir, options } => {
            let config = options.load()?;
            init_logging(&config.log_level);

            let files = collect_video_files(&dir);
            if files.is_empty() {
                println!("目录中没有视频文件: {}", dir.display());
                return Ok(());
            }

            let probe = FfmpegProbe::new(config.process.tool.clone(), config.process.detection.clone());
            let muxer = FfmpegMuxer::new(config.process.tool.clone());

            let results = process_batch(&files, &config.process, &probe, &muxer).await;
            let mut failed = 0;
            for (file, result) in &results {
                match result {
                    Ok(output) => print_output(output),
                    Err(e) => {
                        failed += 1;
                        println!("\n✗ {}: {}", file.display(), e);
                    }
                }
            }
            println!("\n完成: {} 成功, {} 失败", results.len() - failed, failed);
        }
        Commands::InitConfig { path } => {
            ConfigLoader::create_default_config(&path)?;
            println!("已生成配置文件: {}", path.display());
        }
    }

    Ok(())
}

/// 初始化日志，RUST_LOG 优先于配置中的日志级别
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_output(output: &ProcessOutput) {
    println!("\n{} ({} 个章节)", output.input.display(), output.document.len());
    print!("{}", render_break_table(&output.breaks));

    if let Some(path) = &output.chaptered_file {
        println!("✓ 章节已写入: {}", path.display());
    }
    if let Some(path) = &output.report_file {
        println!("✓ 报告: {}", path.display());
    }
}
