use crate::error::SheetError;
use crate::tools::ffprobe_info::get_video_info;
use crate::tools::process_runner::run_with_timeout;
use image::RgbaImage;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// 兩段式 seek 的前置緩衝時間（秒）
const SEEK_MARGIN: f64 = 2.0;

/// 解碼後的畫格與其取樣時間
///
/// `index` 是在取樣排程中的位置，也就是預覽圖上的格子編號；
/// 中間有時間點擷取失敗時，後面的畫格仍放在原本的格子。
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: RgbaImage,
    pub timestamp: f64,
    pub index: usize,
}

/// 畫格擷取請求
#[derive(Debug, Clone, Copy)]
pub enum ExtractionRequest<'a> {
    /// 在每個時間點各擷取一張
    Instants(&'a [f64]),
    /// 以固定頻率擷取 `count` 張
    Rate { fps: f64, count: usize },
}

impl ExtractionRequest<'_> {
    #[must_use]
    pub const fn expected_count(&self) -> usize {
        match self {
            Self::Instants(instants) => instants.len(),
            Self::Rate { count, .. } => *count,
        }
    }
}

/// 影片畫格來源
///
/// 正式環境由 [`FfmpegFrameSource`] 呼叫外部工具，測試可以替換成記憶體中的假來源。
pub trait FrameSource {
    fn probe_duration(&self, video: &Path) -> Result<f64, SheetError>;

    /// 依序回傳畫格；`scratch` 是本次處理專用的暫存目錄，
    /// 每完成一張畫格呼叫一次 `on_frame`
    fn extract_frames(
        &self,
        video: &Path,
        request: &ExtractionRequest<'_>,
        scratch: &Path,
        on_frame: &mut dyn FnMut(),
    ) -> Result<Vec<Frame>, SheetError>;
}

pub struct FfmpegFrameSource {
    timeout: Option<Duration>,
    shutdown_signal: Arc<AtomicBool>,
}

impl FfmpegFrameSource {
    #[must_use]
    pub const fn new(timeout: Option<Duration>, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            timeout,
            shutdown_signal,
        }
    }

    fn extract_at_instants(
        &self,
        video: &Path,
        instants: &[f64],
        scratch: &Path,
        on_frame: &mut dyn FnMut(),
    ) -> Result<Vec<Frame>, SheetError> {
        let width = instants.len().to_string().len();
        let mut frames = Vec::with_capacity(instants.len());

        for (index, &timestamp) in instants.iter().enumerate() {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                warn!("收到中斷信號，停止擷取畫格");
                return Err(SheetError::Cancelled);
            }

            let output_path = scratch.join(format!("frame_{:0width$}.png", index + 1));
            let mut command = Command::new("ffmpeg");
            command.args(build_seek_args(video, timestamp, &output_path));

            let output = run_with_timeout(command, self.timeout)
                .map_err(|e| SheetError::Decode(e.to_string()))?;

            if !output.status.success() {
                return Err(SheetError::Decode(format!(
                    "ffmpeg 擷取 {timestamp:.3}s 失敗: {}",
                    output.stderr_text()
                )));
            }

            // seek 超過最後一個畫格時 ffmpeg 會成功結束但不產生檔案
            if !output_path.exists() {
                warn!("時間點 {timestamp:.3}s 沒有產生畫格: {}", video.display());
                continue;
            }

            frames.push(Frame {
                image: load_frame(&output_path)?,
                timestamp,
                index,
            });
            on_frame();
        }

        Ok(frames)
    }

    fn extract_at_rate(
        &self,
        video: &Path,
        fps: f64,
        count: usize,
        scratch: &Path,
        on_frame: &mut dyn FnMut(),
    ) -> Result<Vec<Frame>, SheetError> {
        let mut command = Command::new("ffmpeg");
        command.args(build_rate_args(video, fps, count, scratch));

        let output = run_with_timeout(command, self.timeout)
            .map_err(|e| SheetError::Decode(e.to_string()))?;

        if !output.status.success() {
            return Err(SheetError::Decode(format!(
                "ffmpeg 批次擷取失敗: {}",
                output.stderr_text()
            )));
        }

        let mut frames = Vec::with_capacity(count);
        for (index, path) in rate_output_paths(scratch, count).into_iter().enumerate() {
            if !path.exists() {
                break;
            }
            frames.push(Frame {
                image: load_frame(&path)?,
                timestamp: index as f64 / fps,
                index,
            });
            on_frame();
        }

        Ok(frames)
    }
}

impl FrameSource for FfmpegFrameSource {
    fn probe_duration(&self, video: &Path) -> Result<f64, SheetError> {
        get_video_info(video, self.timeout).map(|info| info.duration_seconds)
    }

    fn extract_frames(
        &self,
        video: &Path,
        request: &ExtractionRequest<'_>,
        scratch: &Path,
        on_frame: &mut dyn FnMut(),
    ) -> Result<Vec<Frame>, SheetError> {
        match *request {
            ExtractionRequest::Instants(instants) => {
                self.extract_at_instants(video, instants, scratch, on_frame)
            }
            ExtractionRequest::Rate { fps, count } => {
                self.extract_at_rate(video, fps, count, scratch, on_frame)
            }
        }
    }
}

fn load_frame(path: &Path) -> Result<RgbaImage, SheetError> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|e| SheetError::Decode(format!("無法讀取畫格 {}: {e}", path.display())))
}

/// 兩段式 seek：
/// 1. `-ss` 在 `-i` 前：快速跳轉到最近的關鍵幀
/// 2. `-ss` 在 `-i` 後：精準解碼到目標時間點
fn build_seek_args(video: &Path, timestamp: f64, output_path: &Path) -> Vec<String> {
    let t0 = (timestamp - SEEK_MARGIN).max(0.0);
    let delta = timestamp - t0;

    debug!("擷取畫格: timestamp={timestamp:.3}s, seek={t0:.3}s+{delta:.3}s");

    let mut args = vec![
        "-hide_banner".to_string(),
        "-nostdin".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
    ];

    if t0 > 0.0 {
        args.push("-ss".to_string());
        args.push(format!("{t0:.3}"));
    }

    args.push("-i".to_string());
    args.push(video.to_string_lossy().to_string());

    if delta > 0.0 {
        args.push("-ss".to_string());
        args.push(format!("{delta:.3}"));
    }

    args.extend([
        "-frames:v".to_string(),
        "1".to_string(),
        "-an".to_string(),
        "-sn".to_string(),
        "-dn".to_string(),
        "-f".to_string(),
        "image2".to_string(),
        "-y".to_string(),
        output_path.to_string_lossy().to_string(),
    ]);

    args
}

fn build_rate_args(video: &Path, fps: f64, count: usize, scratch: &Path) -> Vec<String> {
    let pattern = scratch.join("frame_%05d.png");
    vec![
        "-hide_banner".to_string(),
        "-nostdin".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        video.to_string_lossy().to_string(),
        "-vf".to_string(),
        format!("fps={fps:.6}"),
        "-frames:v".to_string(),
        count.to_string(),
        "-an".to_string(),
        "-sn".to_string(),
        "-dn".to_string(),
        "-y".to_string(),
        pattern.to_string_lossy().to_string(),
    ]
}

fn rate_output_paths(scratch: &Path, count: usize) -> Vec<PathBuf> {
    (1..=count)
        .map(|i| scratch.join(format!("frame_{i:05}.png")))
        .collect()
}
