use crate::config::{GridShape, MAX_CANVAS_DIMENSION};
use crate::error::SheetError;
use crate::tools::Frame;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::debug;

const CANVAS_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileDimensions {
    pub width: u32,
    pub height: u32,
}

/// 預覽圖的版面：所有縮圖共用同一個尺寸，由第一張畫格的比例決定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    shape: GridShape,
    tile: TileDimensions,
    header_height: u32,
}

impl GridLayout {
    pub fn new(
        shape: GridShape,
        tile_width: u32,
        frame_width: u32,
        frame_height: u32,
        header_height: u32,
    ) -> Result<Self, SheetError> {
        if tile_width == 0 {
            return Err(SheetError::Composition("縮圖寬度必須大於 0".to_string()));
        }
        if frame_width == 0 || frame_height == 0 {
            return Err(SheetError::Composition(format!(
                "無效的畫格尺寸 {frame_width}x{frame_height}"
            )));
        }

        let tile_height =
            (u64::from(tile_width) * u64::from(frame_height)).div_ceil(u64::from(frame_width));

        let canvas_width = u64::from(tile_width) * u64::from(shape.columns());
        let canvas_height = tile_height * u64::from(shape.rows()) + u64::from(header_height);
        if canvas_width > MAX_CANVAS_DIMENSION || canvas_height > MAX_CANVAS_DIMENSION {
            return Err(SheetError::Composition(format!(
                "預覽圖尺寸 {canvas_width}x{canvas_height} 超過上限 {MAX_CANVAS_DIMENSION}"
            )));
        }

        Ok(Self {
            shape,
            tile: TileDimensions {
                width: tile_width,
                // 上面已確認不超過 MAX_CANVAS_DIMENSION
                height: tile_height as u32,
            },
            header_height,
        })
    }

    #[must_use]
    pub const fn tile(&self) -> TileDimensions {
        self.tile
    }

    #[must_use]
    pub const fn header_height(&self) -> u32 {
        self.header_height
    }

    #[must_use]
    pub const fn canvas_size(&self) -> (u32, u32) {
        (
            self.tile.width * self.shape.columns(),
            self.tile.height * self.shape.rows() + self.header_height,
        )
    }

    /// 第 `index` 張縮圖的左上角座標（由左至右、由上至下）
    #[must_use]
    pub const fn tile_origin(&self, index: usize) -> (u32, u32) {
        let columns = self.shape.columns() as usize;
        let left = (index % columns) as u32 * self.tile.width;
        let top = self.header_height + (index / columns) as u32 * self.tile.height;
        (left, top)
    }
}

/// 標頭文字，每行佔固定高度
#[derive(Debug, Clone, Copy)]
pub struct Header<'a> {
    pub lines: &'a [RgbaImage],
    pub line_height: u32,
}

impl Header<'_> {
    #[must_use]
    pub const fn none() -> Header<'static> {
        Header {
            lines: &[],
            line_height: 0,
        }
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.lines.len() as u32 * self.line_height
    }
}

/// 將畫格與標籤合成到一張黑底的預覽圖
///
/// 每張畫格放在 `frame.index` 指定的格子，`labels[i]` 對應 `frames[i]`。
/// 沒有畫格的格子保持背景色；超出格數的畫格忽略。
pub fn compose(
    frames: &[Frame],
    labels: Option<&[RgbaImage]>,
    shape: GridShape,
    tile_width: u32,
    header: Header<'_>,
) -> Result<RgbaImage, SheetError> {
    let first = frames
        .first()
        .ok_or_else(|| SheetError::Composition("沒有可用的畫格".to_string()))?;

    let layout = GridLayout::new(
        shape,
        tile_width,
        first.image.width(),
        first.image.height(),
        header.height(),
    )?;
    let (canvas_width, canvas_height) = layout.canvas_size();
    let tile = layout.tile();

    debug!(
        "合成 {} 張畫格: 縮圖 {}x{}, 預覽圖 {canvas_width}x{canvas_height}",
        frames.len(),
        tile.width,
        tile.height
    );

    let mut canvas = RgbaImage::from_pixel(canvas_width, canvas_height, CANVAS_BACKGROUND);

    for (line_index, line) in header.lines.iter().enumerate() {
        let top = line_index as u32 * header.line_height;
        imageops::overlay(&mut canvas, line, 0, i64::from(top));
    }

    for (position, frame) in frames.iter().enumerate() {
        if frame.index >= shape.tile_count() {
            continue;
        }
        let (left, top) = layout.tile_origin(frame.index);

        if frame.image.dimensions() == (tile.width, tile.height) {
            imageops::replace(&mut canvas, &frame.image, i64::from(left), i64::from(top));
        } else {
            let resized = imageops::resize(&frame.image, tile.width, tile.height, FilterType::Triangle);
            imageops::replace(&mut canvas, &resized, i64::from(left), i64::from(top));
        }

        if let Some(label) = labels.and_then(|labels| labels.get(position)) {
            let x = left + tile.width.saturating_sub(label.width());
            let y = top + tile.height.saturating_sub(label.height());
            imageops::overlay(&mut canvas, label, i64::from(x), i64::from(y));
        }
    }

    Ok(canvas)
}
