use anyhow::Result;
use clap::Parser;
use console::style;
use log::{error, info};
use mvtb::cli::CliArgs;
use mvtb::component::contact_sheet_generator::{TerminalProgress, print_summary};
use mvtb::component::ContactSheetGenerator;
use mvtb::config::{SheetConfig, UserSettings};
use mvtb::init;
use mvtb::signal::setup_shutdown_signal;
use mvtb::tools::{FfmpegFrameSource, collect_video_files};
use std::process::ExitCode;

/// 設定錯誤的結束碼
const EXIT_CONFIGURATION: u8 = 2;

fn main() -> Result<ExitCode> {
    let args = CliArgs::parse();
    init::init(args.verbose);

    let config = match UserSettings::load(args.settings.as_deref())
        .and_then(|settings| SheetConfig::from_args(&args, settings))
    {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            eprintln!("{} {e}", style("錯誤:").red().bold());
            return Ok(ExitCode::from(EXIT_CONFIGURATION));
        }
    };

    let files = match collect_video_files(&config.source, &config.extensions) {
        Ok(files) => files,
        Err(e) => {
            error!("{e}");
            eprintln!("{} {e}", style("錯誤:").red().bold());
            return Ok(ExitCode::from(EXIT_CONFIGURATION));
        }
    };

    if files.is_empty() {
        println!("{}", style("找不到任何符合副檔名的影片檔案").yellow());
        return Ok(ExitCode::SUCCESS);
    }

    let shutdown_signal = setup_shutdown_signal()?;
    let source = FfmpegFrameSource::new(config.command_timeout, shutdown_signal.clone());
    let progress = TerminalProgress::new(files.len(), config.shape.tile_count());

    info!("開始處理 {} 個影片檔案", files.len());
    let generator = ContactSheetGenerator::new(&config, &source, shutdown_signal);
    let report = generator.run(&files, &progress);

    print_summary(&report);

    if report.all_succeeded() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
