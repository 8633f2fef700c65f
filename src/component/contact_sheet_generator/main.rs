use super::label_renderer::LabelRenderer;
use super::progress::BatchProgress;
use super::sheet_builder::{LabelSupport, SheetBuilder};
use crate::config::SheetConfig;
use crate::error::FileOutcome;
use crate::tools::FrameSource;
use console::style;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 批次處理結果，依輸入順序保存每個檔案的結果
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
    /// 是否因中斷信號而提前結束
    pub cancelled: bool,
}

impl BatchReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

/// 影片預覽圖批次產生器
///
/// 逐一處理每個檔案；單一檔案失敗不影響其他檔案。
pub struct ContactSheetGenerator<'a> {
    config: &'a SheetConfig,
    source: &'a dyn FrameSource,
    shutdown_signal: Arc<AtomicBool>,
}

impl<'a> ContactSheetGenerator<'a> {
    #[must_use]
    pub const fn new(
        config: &'a SheetConfig,
        source: &'a dyn FrameSource,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            source,
            shutdown_signal,
        }
    }

    pub fn run(&self, files: &[PathBuf], progress: &dyn BatchProgress) -> BatchReport {
        let mut report = BatchReport::default();

        if files.is_empty() {
            info!("沒有符合條件的影片檔案");
            progress.batch_finished();
            return report;
        }

        let needs_text = self.config.show_labels || self.config.show_header;
        let font = needs_text.then(|| LabelRenderer::load(self.config.font_path.as_deref()));
        let font_error = match &font {
            Some(Err(e)) => {
                warn!("{e}");
                Some(e.to_string())
            }
            _ => None,
        };
        let labels = match (&font, &font_error) {
            (Some(Ok(renderer)), _) => LabelSupport::Ready(renderer),
            (_, Some(reason)) => LabelSupport::Unavailable(reason),
            _ => LabelSupport::Disabled,
        };

        let builder = SheetBuilder::new(self.config, self.source, labels);

        for (index, file) in files.iter().enumerate() {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                warn!("收到中斷信號，停止處理剩餘 {} 個檔案", files.len() - index);
                report.cancelled = true;
                break;
            }

            let file_name = file
                .file_name()
                .map_or_else(|| file.display().to_string(), |n| n.to_string_lossy().to_string());
            progress.file_started(index, &file_name);

            let outcome = builder.run(file, progress);
            progress.file_finished(index + 1, &outcome);
            report.outcomes.push(outcome);
        }

        progress.batch_finished();

        info!(
            "預覽圖生成完成 - 成功: {}, 失敗: {}",
            report.succeeded(),
            report.failed()
        );

        report
    }
}

pub fn print_summary(report: &BatchReport) {
    println!();
    println!("{}", style("=== 預覽圖生成摘要 ===").cyan().bold());
    println!("  總計: {} 個影片", report.outcomes.len());
    println!("  成功: {} 個", style(report.succeeded()).green());

    if report.failed() > 0 {
        println!("  失敗: {} 個", style(report.failed()).red());
        for outcome in &report.outcomes {
            if let FileOutcome::Failed {
                input,
                stage,
                reason,
            } = outcome
            {
                println!("    {} [{stage}] {reason}", input.display());
            }
        }
    }

    if report.cancelled {
        println!("  {}", style("已中斷，部分檔案未處理").yellow());
    }
}
