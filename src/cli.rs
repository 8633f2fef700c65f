use crate::config::types::{
    DEFAULT_COLUMNS, DEFAULT_EXTENSIONS, DEFAULT_ROWS, DEFAULT_TILE_WIDTH, ExtractionMode,
    TimePrecision,
};
use clap::Parser;
use std::path::PathBuf;

/// MoVie ThumBnail generator
#[derive(Debug, Clone, Parser)]
#[command(name = "mvtb", version, about = "MoVie ThumBnail generator")]
pub struct CliArgs {
    /// 影片檔案
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// 影片資料夾（不遞迴）
    #[arg(short = 'd', long)]
    pub directory: Option<PathBuf>,

    /// 副檔名清單，以 | 分隔
    #[arg(short = 'e', long, default_value = DEFAULT_EXTENSIONS)]
    pub ext: String,

    /// 縮圖列數
    #[arg(short = 'R', long, default_value_t = DEFAULT_ROWS, allow_negative_numbers = true)]
    pub row: f64,

    /// 縮圖欄數
    #[arg(short = 'C', long, default_value_t = DEFAULT_COLUMNS, allow_negative_numbers = true)]
    pub column: f64,

    /// 單張縮圖寬度（像素），高度依影片比例計算
    #[arg(short = 'W', long, default_value_t = DEFAULT_TILE_WIDTH)]
    pub width: u32,

    /// 畫格擷取策略
    #[arg(long, value_enum)]
    pub mode: Option<ExtractionMode>,

    /// 時間標籤精度
    #[arg(long, value_enum)]
    pub precision: Option<TimePrecision>,

    /// 不在縮圖上標示時間
    #[arg(long)]
    pub no_labels: bool,

    /// 在預覽圖上方加入檔名與長度
    #[arg(long)]
    pub header: bool,

    /// 字型檔路徑
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// ffmpeg / ffprobe 逾時秒數，0 表示不限制
    #[arg(long)]
    pub timeout: Option<u64>,

    /// JSON 設定檔路徑
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// 顯示除錯訊息
    #[arg(short = 'v', long)]
    pub verbose: bool,
}
