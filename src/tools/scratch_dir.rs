use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// 單一檔案處理期間的暫存目錄，離開作用域時一定會刪除
///
/// 刪除失敗只記錄警告，不影響該檔案的處理結果。
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// 在 `root` 下建立名稱唯一的暫存目錄
    pub fn create(root: &Path) -> io::Result<Self> {
        let path = root.join(format!("mvtb-{}", Uuid::new_v4().simple()));
        fs::create_dir_all(&path)?;
        debug!("建立暫存目錄: {}", path.display());
        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!("已清理暫存目錄: {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("無法清理暫存目錄 {}: {e}", self.path.display()),
        }
    }
}
