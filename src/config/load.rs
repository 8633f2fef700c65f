use crate::cli::CliArgs;
use crate::config::file_type::ExtensionFilter;
use crate::config::types::{GridShape, InputSource, SheetConfig, UserSettings};
use crate::error::SheetError;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 未指定 `--settings` 時，工作目錄下的預設設定檔
const DEFAULT_SETTINGS_FILE: &str = "mvtb.json";

impl UserSettings {
    /// 讀取設定檔；未指定路徑且預設檔不存在時使用預設值
    pub fn load(path: Option<&Path>) -> Result<Self, SheetError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
        };

        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            SheetError::Configuration(format!("無法讀取設定檔 {}: {e}", path.display()))
        })?;

        let settings = serde_json::from_str(&content).map_err(|e| {
            SheetError::Configuration(format!("無法解析設定檔 {}: {e}", path.display()))
        })?;

        debug!("已載入設定檔: {}", path.display());
        Ok(settings)
    }
}

impl SheetConfig {
    /// 合併命令列參數與設定檔，命令列優先
    pub fn from_args(args: &CliArgs, settings: UserSettings) -> Result<Self, SheetError> {
        let shape = GridShape::from_requested(args.row, args.column)?;

        if args.width == 0 {
            return Err(SheetError::Configuration("縮圖寬度必須大於 0".to_string()));
        }
        shape.check_limits(args.width)?;

        let source = match (&args.file, &args.directory) {
            (Some(file), _) => InputSource::File(file.clone()),
            (None, Some(directory)) => InputSource::Directory(directory.clone()),
            (None, None) => {
                return Err(SheetError::Configuration(
                    "請指定影片檔案 (--file) 或資料夾 (--directory)".to_string(),
                ));
            }
        };

        let extensions = ExtensionFilter::parse(&args.ext)?;

        if settings.label_font_size == 0 || settings.header_font_size == 0 {
            return Err(SheetError::Configuration("字型大小必須大於 0".to_string()));
        }

        let timeout_secs = args.timeout.unwrap_or(settings.command_timeout_secs);
        let command_timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

        Ok(Self {
            source,
            extensions,
            shape,
            tile_width: args.width,
            extraction_mode: args.mode.unwrap_or(settings.extraction_mode),
            time_precision: args.precision.unwrap_or(settings.time_precision),
            show_labels: settings.show_labels && !args.no_labels,
            show_header: settings.show_header || args.header,
            label_font_size: settings.label_font_size,
            header_font_size: settings.header_font_size,
            font_path: args.font.clone().or(settings.font_path),
            jpeg_quality: settings.jpeg_quality.clamp(1, 100),
            command_timeout,
            scratch_root: settings.scratch_root.unwrap_or_else(std::env::temp_dir),
        })
    }
}
