use crate::config::types::DEFAULT_EXTENSIONS;
use crate::error::SheetError;
use regex::{Regex, RegexBuilder};
use std::path::Path;
use std::sync::LazyLock;

static DEFAULT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(&format!(r"\.({DEFAULT_EXTENSIONS})$"))
        .case_insensitive(true)
        .build()
        .expect("Invalid regex")
});

/// 副檔名白名單，不分大小寫，以 `|` 分隔
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    pattern: Regex,
}

impl ExtensionFilter {
    pub fn parse(list: &str) -> Result<Self, SheetError> {
        let extensions: Vec<String> = list
            .split('|')
            .map(|ext| ext.trim().trim_start_matches('.'))
            .filter(|ext| !ext.is_empty())
            .map(regex::escape)
            .collect();

        if extensions.is_empty() {
            return Err(SheetError::Configuration(format!(
                "副檔名清單是空的: {list:?}"
            )));
        }

        let pattern = RegexBuilder::new(&format!(r"\.({})$", extensions.join("|")))
            .case_insensitive(true)
            .build()
            .map_err(|e| SheetError::Configuration(format!("無效的副檔名清單: {e}")))?;

        Ok(Self { pattern })
    }

    /// 隱藏檔（以 `.` 開頭）一律排除
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| !name.starts_with('.') && self.pattern.is_match(name))
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.clone(),
        }
    }
}
