//! 影片預覽圖生成元件
//!
//! 每個檔案依序經過四個階段：
//! A. 讀取影片長度（ffprobe）
//! B. 依網格格數平均取樣並擷取畫格
//! C. 縮放、排列並加上時間標籤
//! D. 輸出 JPEG 到影片旁邊

mod grid_composer;
mod label_renderer;
mod main;
mod progress;
mod sheet_builder;

pub use grid_composer::{GridLayout, Header, TileDimensions, compose};
pub use label_renderer::{LabelRenderer, find_default_font};
pub use main::{BatchReport, ContactSheetGenerator, print_summary};
pub use progress::{BatchProgress, SilentProgress, TerminalProgress};
pub use sheet_builder::{LabelSupport, OUTPUT_EXTENSION, SheetBuilder, output_path_for};
