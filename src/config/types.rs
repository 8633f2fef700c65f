use crate::config::file_type::ExtensionFilter;
use crate::error::SheetError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ROWS: f64 = 4.0;
pub const DEFAULT_COLUMNS: f64 = 4.0;
pub const DEFAULT_TILE_WIDTH: u32 = 250;
pub const DEFAULT_EXTENSIONS: &str = "avi|wmv|mp4|mov|rmvb";

/// JPEG 的單邊尺寸上限
pub const MAX_CANVAS_DIMENSION: u64 = 65_535;

/// 單張預覽圖的格數上限，每一格都需要一次 ffmpeg 擷取
pub const MAX_TILE_COUNT: usize = 2_500;

/// 網格配置：列數 x 欄數，兩者皆至少為 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    rows: u32,
    columns: u32,
}

impl GridShape {
    pub fn new(rows: i64, columns: i64) -> Result<Self, SheetError> {
        match (u32::try_from(rows), u32::try_from(columns)) {
            (Ok(r), Ok(c)) if r >= 1 && c >= 1 => Ok(Self { rows: r, columns: c }),
            _ => Err(SheetError::InvalidShape { rows, columns }),
        }
    }

    /// 接受非整數的輸入，先無條件進位再驗證
    pub fn from_requested(rows: f64, columns: f64) -> Result<Self, SheetError> {
        Self::new(ceil_to_i64(rows), ceil_to_i64(columns))
    }

    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    #[must_use]
    pub const fn tile_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    /// 檢查只由設定決定的尺寸限制，不需要讀取任何影片
    pub fn check_limits(&self, tile_width: u32) -> Result<(), SheetError> {
        if self.tile_count() > MAX_TILE_COUNT {
            return Err(SheetError::Configuration(format!(
                "網格 {}x{} 共 {} 格，超過上限 {MAX_TILE_COUNT}",
                self.rows,
                self.columns,
                self.tile_count()
            )));
        }

        let canvas_width = u64::from(tile_width) * u64::from(self.columns);
        if canvas_width > MAX_CANVAS_DIMENSION {
            return Err(SheetError::Configuration(format!(
                "預覽圖寬度 {tile_width}x{} = {canvas_width} 超過上限 {MAX_CANVAS_DIMENSION}",
                self.columns
            )));
        }

        Ok(())
    }
}

fn ceil_to_i64(value: f64) -> i64 {
    if value.is_finite() {
        // `as` 會把超出範圍的值飽和到 i64 的上下限
        value.ceil() as i64
    } else {
        0
    }
}

/// 畫格擷取策略
///
/// `Instant` 在每個取樣時間點各執行一次 ffmpeg，畫格與標籤時間完全一致；
/// `Rate` 以固定頻率一次擷取，速度較快但畫格的實際時間可能與標籤略有偏差。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    #[default]
    Instant,
    Rate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimePrecision {
    #[default]
    Seconds,
    Millis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Directory(PathBuf),
}

/// 選用的 JSON 設定檔內容，所有欄位都有預設值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub font_path: Option<PathBuf>,
    pub label_font_size: u32,
    pub header_font_size: u32,
    pub jpeg_quality: u8,
    pub command_timeout_secs: u64,
    pub extraction_mode: ExtractionMode,
    pub time_precision: TimePrecision,
    pub show_labels: bool,
    pub show_header: bool,
    pub scratch_root: Option<PathBuf>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            font_path: None,
            label_font_size: 20,
            header_font_size: 18,
            jpeg_quality: 85,
            command_timeout_secs: 120,
            extraction_mode: ExtractionMode::Instant,
            time_precision: TimePrecision::Seconds,
            show_labels: true,
            show_header: false,
            scratch_root: None,
        }
    }
}

/// 一次執行的完整設定，建立後不再變動
#[derive(Debug, Clone)]
pub struct SheetConfig {
    pub source: InputSource,
    pub extensions: ExtensionFilter,
    pub shape: GridShape,
    pub tile_width: u32,
    pub extraction_mode: ExtractionMode,
    pub time_precision: TimePrecision,
    pub show_labels: bool,
    pub show_header: bool,
    pub label_font_size: u32,
    pub header_font_size: u32,
    pub font_path: Option<PathBuf>,
    pub jpeg_quality: u8,
    pub command_timeout: Option<Duration>,
    pub scratch_root: PathBuf,
}

impl SheetConfig {
    /// 以預設值建立設定，主要給程式內部與測試使用
    #[must_use]
    pub fn new(source: InputSource, shape: GridShape) -> Self {
        let settings = UserSettings::default();
        Self {
            source,
            extensions: ExtensionFilter::default(),
            shape,
            tile_width: DEFAULT_TILE_WIDTH,
            extraction_mode: settings.extraction_mode,
            time_precision: settings.time_precision,
            show_labels: settings.show_labels,
            show_header: settings.show_header,
            label_font_size: settings.label_font_size,
            header_font_size: settings.header_font_size,
            font_path: settings.font_path,
            jpeg_quality: settings.jpeg_quality,
            command_timeout: Some(Duration::from_secs(settings.command_timeout_secs)),
            scratch_root: std::env::temp_dir(),
        }
    }

    /// 標頭每一行的固定高度
    #[must_use]
    pub fn header_line_height(&self) -> u32 {
        (self.header_font_size as f32 * 1.5).ceil() as u32
    }
}
