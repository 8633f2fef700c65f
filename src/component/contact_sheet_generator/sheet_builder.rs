use super::grid_composer::{Header, compose};
use super::label_renderer::LabelRenderer;
use super::progress::BatchProgress;
use crate::config::{ExtractionMode, SheetConfig};
use crate::error::{FileOutcome, SheetError, Stage};
use crate::tools::{
    ExtractionRequest, Frame, FrameSource, SampleSchedule, ScratchDir, format_timestamp, schedule,
};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use log::{debug, error, info, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// 預覽圖固定輸出格式
pub const OUTPUT_EXTENSION: &str = "jpg";

/// 文字繪製的可用狀態
///
/// 字型只在批次開始時載入一次；載入失敗時每個需要文字的檔案各自失敗，不中斷整個批次。
#[derive(Clone, Copy)]
pub enum LabelSupport<'a> {
    Disabled,
    Ready(&'a LabelRenderer),
    Unavailable(&'a str),
}

impl<'a> LabelSupport<'a> {
    fn renderer(&self) -> Result<&'a LabelRenderer, SheetError> {
        match *self {
            Self::Ready(renderer) => Ok(renderer),
            Self::Unavailable(reason) => Err(SheetError::FontUnavailable(reason.to_string())),
            Self::Disabled => Err(SheetError::FontUnavailable("未載入字型".to_string())),
        }
    }
}

/// 單一檔案處理流程的狀態
enum SheetState {
    Probing,
    Extracting {
        duration: f64,
    },
    Composing {
        duration: f64,
        frames: Vec<Frame>,
    },
    Encoding {
        canvas: RgbaImage,
    },
    Done(PathBuf),
    Failed {
        stage: Stage,
        reason: SheetError,
    },
}

/// 預覽圖的輸出路徑：與影片同資料夾、同檔名，副檔名改為 jpg
#[must_use]
pub fn output_path_for(input: &Path) -> PathBuf {
    input.with_extension(OUTPUT_EXTENSION)
}

/// 單一影片的預覽圖生成流程
///
/// `Probing -> Extracting -> Composing -> Encoding -> Done`，
/// 任一階段失敗即進入 `Failed`。暫存目錄在進入 `Extracting` 時建立，
/// 不論成功或失敗都會在離開前刪除。
pub struct SheetBuilder<'a> {
    config: &'a SheetConfig,
    source: &'a dyn FrameSource,
    labels: LabelSupport<'a>,
}

impl<'a> SheetBuilder<'a> {
    #[must_use]
    pub const fn new(
        config: &'a SheetConfig,
        source: &'a dyn FrameSource,
        labels: LabelSupport<'a>,
    ) -> Self {
        Self {
            config,
            source,
            labels,
        }
    }

    pub fn run(&self, input: &Path, progress: &dyn BatchProgress) -> FileOutcome {
        let mut scratch: Option<ScratchDir> = None;
        let mut state = SheetState::Probing;

        loop {
            state = match state {
                SheetState::Probing => self.probe(input),
                SheetState::Extracting { duration } => {
                    self.extract(input, duration, &mut scratch, progress)
                }
                SheetState::Composing { duration, frames } => {
                    self.compose_sheet(input, duration, &frames)
                }
                SheetState::Encoding { canvas } => self.encode(input, canvas),
                SheetState::Done(output) => {
                    drop(scratch.take());
                    info!("預覽圖已建立: {}", output.display());
                    return FileOutcome::Success {
                        input: input.to_path_buf(),
                        output,
                    };
                }
                SheetState::Failed { stage, reason } => {
                    drop(scratch.take());
                    error!("處理影片失敗 {} [{stage}]: {reason}", input.display());
                    return FileOutcome::Failed {
                        input: input.to_path_buf(),
                        stage,
                        reason,
                    };
                }
            };
        }
    }

    fn probe(&self, input: &Path) -> SheetState {
        match self.source.probe_duration(input) {
            Ok(duration) if duration.is_finite() && duration >= 0.0 => {
                debug!("{} 長度 {duration:.3}s", input.display());
                SheetState::Extracting { duration }
            }
            Ok(duration) => failed(
                Stage::Probing,
                SheetError::Probe(format!("無效的影片長度: {duration}")),
            ),
            Err(reason) => failed(Stage::Probing, reason),
        }
    }

    fn extract(
        &self,
        input: &Path,
        duration: f64,
        scratch: &mut Option<ScratchDir>,
        progress: &dyn BatchProgress,
    ) -> SheetState {
        // 尺寸超出上限時在擷取任何畫格前就失敗
        if let Err(reason) = self.config.shape.check_limits(self.config.tile_width) {
            return failed(Stage::Extracting, reason);
        }

        let plan = match schedule(duration, self.config.shape) {
            Ok(plan) => plan,
            Err(reason) => return failed(Stage::Extracting, reason),
        };

        let scratch_dir = match ScratchDir::create(&self.config.scratch_root) {
            Ok(dir) => scratch.insert(dir),
            Err(e) => {
                return failed(
                    Stage::Extracting,
                    SheetError::Decode(format!("無法建立暫存目錄: {e}")),
                );
            }
        };

        let request = self.extraction_request(&plan);
        let mut on_frame = || progress.frame_extracted();
        let frames = match self.source.extract_frames(
            input,
            &request,
            scratch_dir.path(),
            &mut on_frame,
        ) {
            Ok(frames) => frames,
            Err(reason) => return failed(Stage::Extracting, reason),
        };

        if frames.is_empty() {
            return failed(
                Stage::Extracting,
                SheetError::Decode("沒有擷取到任何畫格".to_string()),
            );
        }

        if frames.len() < request.expected_count() {
            warn!(
                "{} 只擷取到 {}/{} 張畫格，其餘格子保持空白",
                input.display(),
                frames.len(),
                request.expected_count()
            );
        }

        SheetState::Composing { duration, frames }
    }

    fn extraction_request<'p>(&self, plan: &'p SampleSchedule) -> ExtractionRequest<'p> {
        match (self.config.extraction_mode, plan.sampling_rate()) {
            (ExtractionMode::Rate, Some(fps)) => ExtractionRequest::Rate {
                fps,
                count: plan.tile_count(),
            },
            (ExtractionMode::Rate, None) => {
                warn!("影片長度為 0，改用逐一時間點擷取");
                ExtractionRequest::Instants(plan.instants())
            }
            (ExtractionMode::Instant, _) => ExtractionRequest::Instants(plan.instants()),
        }
    }

    fn compose_sheet(&self, input: &Path, duration: f64, frames: &[Frame]) -> SheetState {
        match self.compose_canvas(input, duration, frames) {
            Ok(canvas) => SheetState::Encoding { canvas },
            Err(reason) => failed(Stage::Composing, reason),
        }
    }

    fn compose_canvas(
        &self,
        input: &Path,
        duration: f64,
        frames: &[Frame],
    ) -> Result<RgbaImage, SheetError> {
        let config = self.config;

        let labels = if config.show_labels {
            let renderer = self.labels.renderer()?;
            let rendered = frames
                .iter()
                .map(|frame| {
                    let text = format_timestamp(frame.timestamp, config.time_precision)?;
                    Ok(renderer.render(&text, config.tile_width, config.label_font_size))
                })
                .collect::<Result<Vec<_>, SheetError>>()?;
            Some(rendered)
        } else {
            None
        };

        let header_lines: Vec<RgbaImage> = if config.show_header {
            let renderer = self.labels.renderer()?;
            let sheet_width = config
                .tile_width
                .checked_mul(config.shape.columns())
                .ok_or_else(|| {
                    SheetError::Composition(format!(
                        "預覽圖寬度 {}x{} 超出範圍",
                        config.tile_width,
                        config.shape.columns()
                    ))
                })?;
            header_text(input, duration, frames, config)?
                .iter()
                .map(|line| renderer.render(line, sheet_width, config.header_font_size))
                .collect()
        } else {
            Vec::new()
        };

        // 很小的字型加上底色邊距後可能比固定行高還高
        let line_height = header_lines
            .iter()
            .map(RgbaImage::height)
            .fold(config.header_line_height(), u32::max);
        let header = Header {
            lines: &header_lines,
            line_height,
        };

        compose(
            frames,
            labels.as_deref(),
            config.shape,
            config.tile_width,
            header,
        )
    }

    fn encode(&self, input: &Path, canvas: RgbaImage) -> SheetState {
        let output = output_path_for(input);
        match write_jpeg(canvas, &output, self.config.jpeg_quality, input) {
            Ok(()) => SheetState::Done(output),
            Err(reason) => failed(Stage::Encoding, reason),
        }
    }
}

const fn failed(stage: Stage, reason: SheetError) -> SheetState {
    SheetState::Failed { stage, reason }
}

/// 標頭文字：檔名，以及長度、解析度與網格配置
fn header_text(
    input: &Path,
    duration: f64,
    frames: &[Frame],
    config: &SheetConfig,
) -> Result<Vec<String>, SheetError> {
    let name = input
        .file_name()
        .map_or_else(|| input.display().to_string(), |n| n.to_string_lossy().to_string());
    let (width, height) = frames
        .first()
        .map_or((0, 0), |frame| frame.image.dimensions());

    Ok(vec![
        name,
        format!(
            "Duration: {} | {width}x{height} | {}x{}",
            format_timestamp(duration, config.time_precision)?,
            config.shape.rows(),
            config.shape.columns()
        ),
    ])
}

fn write_jpeg(canvas: RgbaImage, output: &Path, quality: u8, input: &Path) -> Result<(), SheetError> {
    if output == input {
        return Err(SheetError::write(output, "輸出路徑與輸入檔案相同"));
    }
    if output.is_dir() {
        return Err(SheetError::write(output, "輸出路徑是資料夾"));
    }

    let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
    let file = File::create(output).map_err(|e| SheetError::write(output, e))?;
    let mut writer = BufWriter::new(file);

    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, quality))
        .map_err(|e| SheetError::write(output, e))?;
    writer.flush().map_err(|e| SheetError::write(output, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::contact_sheet_generator::progress::SilentProgress;
    use crate::config::{GridShape, InputSource};
    use image::{GenericImageView, Rgba};
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    /// 記憶體中的畫格來源，回傳固定尺寸的單色畫格
    struct FakeSource {
        duration: Result<f64, String>,
        fail_extract: bool,
        frame_limit: Option<usize>,
        scratch_seen: RefCell<Option<PathBuf>>,
        requested: RefCell<Option<String>>,
    }

    impl FakeSource {
        fn new(duration: f64) -> Self {
            Self {
                duration: Ok(duration),
                fail_extract: false,
                frame_limit: None,
                scratch_seen: RefCell::new(None),
                requested: RefCell::new(None),
            }
        }
    }

    impl FrameSource for FakeSource {
        fn probe_duration(&self, _video: &Path) -> Result<f64, SheetError> {
            self.duration.clone().map_err(SheetError::Probe)
        }

        fn extract_frames(
            &self,
            _video: &Path,
            request: &ExtractionRequest<'_>,
            scratch: &Path,
            on_frame: &mut dyn FnMut(),
        ) -> Result<Vec<Frame>, SheetError> {
            *self.scratch_seen.borrow_mut() = Some(scratch.to_path_buf());
            fs::write(scratch.join("frame_1.png"), b"placeholder").unwrap();

            *self.requested.borrow_mut() = Some(match request {
                ExtractionRequest::Instants(_) => "instants".to_string(),
                ExtractionRequest::Rate { .. } => "rate".to_string(),
            });

            if self.fail_extract {
                return Err(SheetError::Decode("boom".to_string()));
            }

            let timestamps: Vec<f64> = match request {
                ExtractionRequest::Instants(instants) => instants.to_vec(),
                ExtractionRequest::Rate { fps, count } => {
                    (0..*count).map(|i| i as f64 / fps).collect()
                }
            };
            let limit = self.frame_limit.unwrap_or(timestamps.len());

            Ok(timestamps
                .into_iter()
                .take(limit)
                .enumerate()
                .map(|(index, timestamp)| {
                    on_frame();
                    Frame {
                        image: RgbaImage::from_pixel(64, 36, Rgba([200, 100, 50, 255])),
                        timestamp,
                        index,
                    }
                })
                .collect())
        }
    }

    fn config(scratch_root: &Path, rows: i64, columns: i64) -> SheetConfig {
        let mut config = SheetConfig::new(
            InputSource::File(PathBuf::from("unused.mp4")),
            GridShape::new(rows, columns).unwrap(),
        );
        config.tile_width = 32;
        config.show_labels = false;
        config.scratch_root = scratch_root.to_path_buf();
        config
    }

    fn scratch_entries(root: &Path) -> usize {
        fs::read_dir(root).unwrap().count()
    }

    #[test]
    fn test_output_path_for() {
        assert_eq!(
            output_path_for(Path::new("/videos/movie.mp4")),
            PathBuf::from("/videos/movie.jpg")
        );
        assert_eq!(
            output_path_for(Path::new("/videos/a.b.c.avi")),
            PathBuf::from("/videos/a.b.c.jpg")
        );
    }

    #[test]
    fn test_successful_run_writes_sheet() {
        let videos = TempDir::new().unwrap();
        let scratch_root = TempDir::new().unwrap();
        let input = videos.path().join("clip.mp4");
        fs::write(&input, b"").unwrap();

        let config = config(scratch_root.path(), 2, 3);
        let source = FakeSource::new(60.0);
        let builder = SheetBuilder::new(&config, &source, LabelSupport::Disabled);

        let outcome = builder.run(&input, &SilentProgress);
        let FileOutcome::Success { output, .. } = outcome else {
            panic!("expected success: {outcome:?}");
        };
        assert_eq!(output, videos.path().join("clip.jpg"));

        let sheet = image::open(&output).unwrap();
        // 64x36 -> 32x18，2 列 3 欄
        assert_eq!(sheet.dimensions(), (96, 36));

        let scratch = source.scratch_seen.borrow().clone().unwrap();
        assert!(!scratch.exists());
        assert_eq!(scratch_entries(scratch_root.path()), 0);
    }

    #[test]
    fn test_probe_failure() {
        let scratch_root = TempDir::new().unwrap();
        let config = config(scratch_root.path(), 1, 1);
        let source = FakeSource {
            duration: Err("not numeric".to_string()),
            ..FakeSource::new(0.0)
        };
        let builder = SheetBuilder::new(&config, &source, LabelSupport::Disabled);

        let outcome = builder.run(Path::new("/videos/broken.mp4"), &SilentProgress);
        assert!(matches!(
            outcome,
            FileOutcome::Failed {
                stage: Stage::Probing,
                reason: SheetError::Probe(_),
                ..
            }
        ));
        // 讀取資訊階段不會建立暫存目錄
        assert!(source.scratch_seen.borrow().is_none());
        assert_eq!(scratch_entries(scratch_root.path()), 0);
    }

    #[test]
    fn test_decode_failure_cleans_scratch() {
        let scratch_root = TempDir::new().unwrap();
        let config = config(scratch_root.path(), 2, 2);
        let source = FakeSource {
            fail_extract: true,
            ..FakeSource::new(10.0)
        };
        let builder = SheetBuilder::new(&config, &source, LabelSupport::Disabled);

        let outcome = builder.run(Path::new("/videos/a.mp4"), &SilentProgress);
        assert!(matches!(
            outcome,
            FileOutcome::Failed {
                stage: Stage::Extracting,
                reason: SheetError::Decode(_),
                ..
            }
        ));
        let scratch = source.scratch_seen.borrow().clone().unwrap();
        assert!(!scratch.exists());
    }

    #[test]
    fn test_zero_frames_is_decode_error() {
        let scratch_root = TempDir::new().unwrap();
        let config = config(scratch_root.path(), 2, 2);
        let source = FakeSource {
            frame_limit: Some(0),
            ..FakeSource::new(10.0)
        };
        let builder = SheetBuilder::new(&config, &source, LabelSupport::Disabled);

        let outcome = builder.run(Path::new("/videos/a.mp4"), &SilentProgress);
        assert!(matches!(
            outcome,
            FileOutcome::Failed {
                stage: Stage::Extracting,
                reason: SheetError::Decode(_),
                ..
            }
        ));
    }

    #[test]
    fn test_undershoot_still_succeeds() {
        let videos = TempDir::new().unwrap();
        let scratch_root = TempDir::new().unwrap();
        let input = videos.path().join("short.mp4");

        let config = config(scratch_root.path(), 2, 2);
        let source = FakeSource {
            frame_limit: Some(3),
            ..FakeSource::new(1.0)
        };
        let builder = SheetBuilder::new(&config, &source, LabelSupport::Disabled);

        let outcome = builder.run(&input, &SilentProgress);
        assert!(outcome.is_success());

        let sheet = image::open(videos.path().join("short.jpg")).unwrap().to_rgb8();
        // 第四格沒有畫格，保持黑色（JPEG 有些許失真）
        let pixel = sheet.get_pixel(48, 27);
        assert!(pixel.0.iter().all(|c| *c < 16));
    }

    #[test]
    fn test_rate_mode_with_zero_duration_falls_back() {
        let videos = TempDir::new().unwrap();
        let scratch_root = TempDir::new().unwrap();
        let mut config = config(scratch_root.path(), 1, 2);
        config.extraction_mode = ExtractionMode::Rate;

        let source = FakeSource::new(0.0);
        let builder = SheetBuilder::new(&config, &source, LabelSupport::Disabled);
        let outcome = builder.run(&videos.path().join("still.mp4"), &SilentProgress);

        assert!(outcome.is_success());
        assert_eq!(source.requested.borrow().as_deref(), Some("instants"));
    }

    #[test]
    fn test_rate_mode_requests_rate() {
        let videos = TempDir::new().unwrap();
        let scratch_root = TempDir::new().unwrap();
        let mut config = config(scratch_root.path(), 1, 2);
        config.extraction_mode = ExtractionMode::Rate;

        let source = FakeSource::new(20.0);
        let builder = SheetBuilder::new(&config, &source, LabelSupport::Disabled);
        let outcome = builder.run(&videos.path().join("clip.mp4"), &SilentProgress);

        assert!(outcome.is_success());
        assert_eq!(source.requested.borrow().as_deref(), Some("rate"));
    }

    #[test]
    fn test_missing_font_fails_composing() {
        let scratch_root = TempDir::new().unwrap();
        let mut config = config(scratch_root.path(), 1, 1);
        config.show_labels = true;

        let source = FakeSource::new(5.0);
        let builder = SheetBuilder::new(&config, &source, LabelSupport::Unavailable("no font"));
        let outcome = builder.run(Path::new("/videos/a.mp4"), &SilentProgress);

        assert!(matches!(
            outcome,
            FileOutcome::Failed {
                stage: Stage::Composing,
                reason: SheetError::FontUnavailable(_),
                ..
            }
        ));
        let scratch = source.scratch_seen.borrow().clone().unwrap();
        assert!(!scratch.exists());
    }

    #[test]
    fn test_write_failure_into_missing_directory() {
        let scratch_root = TempDir::new().unwrap();
        let config = config(scratch_root.path(), 1, 1);
        let source = FakeSource::new(5.0);
        let builder = SheetBuilder::new(&config, &source, LabelSupport::Disabled);

        let input = scratch_root.path().join("missing-dir").join("a.mp4");
        let outcome = builder.run(&input, &SilentProgress);
        assert!(matches!(
            outcome,
            FileOutcome::Failed {
                stage: Stage::Encoding,
                reason: SheetError::Write { .. },
                ..
            }
        ));
        assert_eq!(scratch_entries(scratch_root.path()), 0);
    }

    #[test]
    fn test_output_collision_with_directory() {
        let videos = TempDir::new().unwrap();
        let scratch_root = TempDir::new().unwrap();
        fs::create_dir(videos.path().join("clip.jpg")).unwrap();

        let config = config(scratch_root.path(), 1, 1);
        let source = FakeSource::new(5.0);
        let builder = SheetBuilder::new(&config, &source, LabelSupport::Disabled);

        let outcome = builder.run(&videos.path().join("clip.mp4"), &SilentProgress);
        assert!(matches!(
            outcome,
            FileOutcome::Failed {
                stage: Stage::Encoding,
                ..
            }
        ));
    }

    #[test]
    fn test_oversized_grid_fails_before_extraction() {
        let scratch_root = TempDir::new().unwrap();
        let mut config = config(scratch_root.path(), 1, 1);
        config.shape = GridShape::new(300, 300).unwrap();
        config.tile_width = 250;

        let source = FakeSource::new(60.0);
        let builder = SheetBuilder::new(&config, &source, LabelSupport::Disabled);
        let outcome = builder.run(Path::new("/videos/a.mp4"), &SilentProgress);

        assert!(matches!(
            outcome,
            FileOutcome::Failed {
                stage: Stage::Extracting,
                reason: SheetError::Configuration(_),
                ..
            }
        ));
        assert!(source.requested.borrow().is_none());
        assert_eq!(scratch_entries(scratch_root.path()), 0);
    }

    #[test]
    fn test_overflowing_header_width_does_not_panic() {
        let scratch_root = TempDir::new().unwrap();
        let mut config = config(scratch_root.path(), 1, 1);
        config.shape = GridShape::new(1, 70_000).unwrap();
        config.tile_width = 70_000;
        config.show_header = true;

        let source = FakeSource::new(60.0);
        let builder = SheetBuilder::new(&config, &source, LabelSupport::Unavailable("no font"));
        let outcome = builder.run(Path::new("/videos/a.mp4"), &SilentProgress);

        assert!(matches!(
            outcome,
            FileOutcome::Failed {
                stage: Stage::Extracting,
                reason: SheetError::Configuration(_),
                ..
            }
        ));
        assert!(source.requested.borrow().is_none());
    }

    #[test]
    fn test_small_header_font_keeps_lines_apart() {
        let Some(renderer) = crate::component::contact_sheet_generator::find_default_font()
            .and_then(|path| LabelRenderer::from_file(&path).ok())
        else {
            println!("跳過測試：找不到系統字型");
            return;
        };

        let videos = TempDir::new().unwrap();
        let scratch_root = TempDir::new().unwrap();
        let mut config = config(scratch_root.path(), 1, 2);
        config.show_header = true;
        config.header_font_size = 2;
        assert_eq!(config.header_line_height(), 3);

        let source = FakeSource::new(60.0);
        let builder = SheetBuilder::new(&config, &source, LabelSupport::Ready(&renderer));
        let input = videos.path().join("movie.mp4");
        assert!(builder.run(&input, &SilentProgress).is_success());

        // 每行至少包含上下底色邊距，兩行標頭高於 2 * 3
        let (_, height) = image::image_dimensions(videos.path().join("movie.jpg")).unwrap();
        assert!(height >= 18 + 2 * 5, "height {height}");
    }

    #[test]
    fn test_header_text() {
        let mut config = config(Path::new("/tmp"), 4, 4);
        config.time_precision = crate::config::TimePrecision::Seconds;
        let frames = vec![Frame {
            image: RgbaImage::new(640, 360),
            timestamp: 0.0,
            index: 0,
        }];

        let lines = header_text(Path::new("/videos/movie.mp4"), 3661.5, &frames, &config).unwrap();
        assert_eq!(lines[0], "movie.mp4");
        assert_eq!(lines[1], "Duration: 01:01:01 | 640x360 | 4x4");
    }
}
