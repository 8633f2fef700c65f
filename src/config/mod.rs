pub mod file_type;
pub mod load;
pub mod types;

pub use file_type::ExtensionFilter;
pub use types::{
    ExtractionMode, GridShape, InputSource, MAX_CANVAS_DIMENSION, MAX_TILE_COUNT, SheetConfig,
    TimePrecision, UserSettings,
};
