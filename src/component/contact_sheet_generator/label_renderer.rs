use crate::error::SheetError;
use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use fontdue::{Font, FontSettings};
use image::imageops::{self, FilterType};
use image::{Pixel, Rgba, RgbaImage};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// 未指定字型時依序嘗試的系統字型
const FONT_CANDIDATES: &[&str] = &[
    // Linux
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    // macOS
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    // Windows
    "C:/Windows/Fonts/arial.ttf",
    "C:/Windows/Fonts/segoeui.ttf",
];

const PADDING: u32 = 2;
const FOREGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 128]);

/// 尋找第一個存在的候選字型
#[must_use]
pub fn find_default_font() -> Option<PathBuf> {
    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
}

/// 將文字繪製成獨立的圖層（時間標籤、標頭）
pub struct LabelRenderer {
    font: Font,
}

impl LabelRenderer {
    /// 載入指定字型；未指定時搜尋系統字型
    pub fn load(font_path: Option<&Path>) -> Result<Self, SheetError> {
        match font_path {
            Some(path) => Self::from_file(path),
            None => {
                let path = find_default_font().ok_or_else(|| {
                    SheetError::FontUnavailable("系統中找不到任何候選字型，請用 --font 指定".to_string())
                })?;
                Self::from_file(&path)
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, SheetError> {
        let bytes = fs::read(path).map_err(|e| {
            SheetError::FontUnavailable(format!("無法讀取字型 {}: {e}", path.display()))
        })?;
        debug!("使用字型: {}", path.display());
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, SheetError> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| SheetError::FontUnavailable(format!("無法解析字型: {e}")))?;
        Ok(Self { font })
    }

    /// 繪製單行文字，寬度超過 `max_width` 時等比例縮小
    ///
    /// 只限制寬度，高度超出時不處理，呼叫端需自行選擇合適的字型大小。
    #[must_use]
    pub fn render(&self, text: &str, max_width: u32, font_size: u32) -> RgbaImage {
        let px = font_size.max(1) as f32;
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings {
            x: PADDING as f32,
            y: PADDING as f32,
            ..LayoutSettings::default()
        });
        layout.append(&[&self.font], &TextStyle::new(text, px, 0));

        let text_right = layout
            .glyphs()
            .iter()
            .map(|glyph| glyph.x + glyph.width as f32)
            .fold(PADDING as f32, f32::max);
        let width = text_right.ceil() as u32 + PADDING;
        let height = layout.height().ceil().max(1.0) as u32 + PADDING * 2;
        let mut overlay = RgbaImage::from_pixel(width, height, BACKGROUND);

        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let (_, bitmap) = self.font.rasterize_config(glyph.key);
            draw_glyph(
                &mut overlay,
                &bitmap,
                glyph.width,
                glyph.x.round() as i64,
                glyph.y.round() as i64,
            );
        }

        fit_to_width(overlay, max_width)
    }
}

/// 以覆蓋率作為透明度，將白色文字疊到底色上
fn draw_glyph(overlay: &mut RgbaImage, bitmap: &[u8], glyph_width: usize, left: i64, top: i64) {
    let (width, height) = (i64::from(overlay.width()), i64::from(overlay.height()));
    for (offset, &coverage) in bitmap.iter().enumerate() {
        let x = left + (offset % glyph_width) as i64;
        let y = top + (offset / glyph_width) as i64;
        if coverage == 0 || x < 0 || y < 0 || x >= width || y >= height {
            continue;
        }
        overlay
            .get_pixel_mut(x as u32, y as u32)
            .blend(&Rgba([FOREGROUND[0], FOREGROUND[1], FOREGROUND[2], coverage]));
    }
}

/// 寬度超過上限時依比例縮小，否則原樣回傳
fn fit_to_width(overlay: RgbaImage, max_width: u32) -> RgbaImage {
    let max_width = max_width.max(1);
    let (width, height) = overlay.dimensions();
    if width <= max_width {
        return overlay;
    }

    let scaled_height =
        ((u64::from(height) * u64::from(max_width)).div_ceil(u64::from(width))).max(1) as u32;
    imageops::resize(&overlay, max_width, scaled_height, FilterType::Triangle)
}
