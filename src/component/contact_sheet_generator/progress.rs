use crate::error::FileOutcome;
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// 批次處理的進度回報
///
/// 所有方法預設不做任何事，測試時可直接使用 [`SilentProgress`]。
pub trait BatchProgress {
    fn file_started(&self, _index: usize, _file_name: &str) {}

    fn frame_extracted(&self) {}

    /// `completed` 為已處理完成（含失敗）的檔案數，單調遞增
    fn file_finished(&self, _completed: usize, _outcome: &FileOutcome) {}

    fn batch_finished(&self) {}
}

pub struct SilentProgress;

impl BatchProgress for SilentProgress {}

/// 終端機進度條：資料夾模式顯示總進度與單檔畫格進度，單檔模式只顯示畫格進度
pub struct TerminalProgress {
    multi: MultiProgress,
    overall: Option<ProgressBar>,
    frames: ProgressBar,
}

impl TerminalProgress {
    #[must_use]
    pub fn new(total_files: usize, frames_per_file: usize) -> Self {
        let multi = MultiProgress::new();

        let overall = (total_files > 1).then(|| {
            let bar = multi.add(ProgressBar::new(total_files as u64));
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .expect("Invalid progress bar template")
                    .progress_chars("#>-"),
            );
            bar.set_message("ALL");
            bar
        });

        let frames = multi.add(ProgressBar::new(frames_per_file as u64));
        frames.set_style(
            ProgressStyle::default_bar()
                .template("  [{bar:40.green/white}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("#>-"),
        );

        Self {
            multi,
            overall,
            frames,
        }
    }
}

impl BatchProgress for TerminalProgress {
    fn file_started(&self, _index: usize, file_name: &str) {
        self.frames.reset();
        self.frames.set_message(file_name.to_string());
    }

    fn frame_extracted(&self) {
        self.frames.inc(1);
    }

    fn file_finished(&self, completed: usize, outcome: &FileOutcome) {
        let line = match outcome {
            FileOutcome::Success { output, .. } => {
                format!("  {} {}", style("✓").green(), output.display())
            }
            FileOutcome::Failed {
                input,
                stage,
                reason,
            } => format!(
                "  {} FAIL: {} [{stage}] {reason}",
                style("✗").red(),
                input.display()
            ),
        };
        let _ = self.multi.println(line);

        if let Some(overall) = &self.overall {
            overall.set_position(completed as u64);
        }
    }

    fn batch_finished(&self) {
        self.frames.finish_and_clear();
        if let Some(overall) = &self.overall {
            overall.finish();
        }
    }
}
