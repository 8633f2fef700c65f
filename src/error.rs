//! 預覽圖生成的錯誤分類
//!
//! 除了設定錯誤之外，所有錯誤都只影響目前處理中的檔案，
//! 由 `SheetBuilder` 轉成 [`FileOutcome::Failed`] 往上回報。

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("無效的網格配置 {rows}x{columns}：列數與欄數都必須是正整數")]
    InvalidShape { rows: i64, columns: i64 },

    #[error("設定錯誤: {0}")]
    Configuration(String),

    #[error("無效的時間長度: {0}")]
    InvalidDuration(f64),

    #[error("讀取影片資訊失敗: {0}")]
    Probe(String),

    #[error("擷取畫格失敗: {0}")]
    Decode(String),

    #[error("找不到可用的字型: {0}")]
    FontUnavailable(String),

    #[error("合成預覽圖失敗: {0}")]
    Composition(String),

    #[error("寫入預覽圖失敗 {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    #[error("操作已取消")]
    Cancelled,
}

impl SheetError {
    /// 設定錯誤會在處理任何檔案前終止整個執行
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidShape { .. } | Self::Configuration(_))
    }

    pub fn write(path: &Path, reason: impl fmt::Display) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// 單一檔案處理流程的階段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Probing,
    Extracting,
    Composing,
    Encoding,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Probing => "讀取資訊",
            Self::Extracting => "擷取畫格",
            Self::Composing => "合成",
            Self::Encoding => "輸出",
        };
        f.write_str(name)
    }
}

/// 單一檔案的處理結果
#[derive(Debug)]
pub enum FileOutcome {
    Success {
        input: PathBuf,
        output: PathBuf,
    },
    Failed {
        input: PathBuf,
        stage: Stage,
        reason: SheetError,
    },
}

impl FileOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub fn input(&self) -> &Path {
        match self {
            Self::Success { input, .. } | Self::Failed { input, .. } => input,
        }
    }
}
