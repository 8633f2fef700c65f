use crate::error::SheetError;
use std::path::Path;

pub fn validate_directory_exists(path: &Path) -> Result<(), SheetError> {
    if !path.exists() {
        return Err(SheetError::Configuration(format!(
            "路徑不存在: {}",
            path.display()
        )));
    }
    if !path.is_dir() {
        return Err(SheetError::Configuration(format!(
            "路徑不是資料夾: {}",
            path.display()
        )));
    }
    Ok(())
}
