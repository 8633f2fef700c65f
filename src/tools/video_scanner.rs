use crate::config::{ExtensionFilter, InputSource};
use crate::error::SheetError;
use crate::tools::path_validator::validate_directory_exists;
use log::debug;
use std::path::PathBuf;
use walkdir::WalkDir;

/// 依輸入來源列出要處理的影片
///
/// 資料夾模式只掃描第一層，依檔名排序，確保批次順序固定。
pub fn collect_video_files(
    source: &InputSource,
    filter: &ExtensionFilter,
) -> Result<Vec<PathBuf>, SheetError> {
    let directory = match source {
        InputSource::File(file) => return Ok(vec![file.clone()]),
        InputSource::Directory(directory) => directory,
    };

    validate_directory_exists(directory)?;

    let files: Vec<PathBuf> = WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| filter.matches(entry.path()))
        .map(walkdir::DirEntry::into_path)
        .collect();

    debug!("{} 找到 {} 個影片檔案", directory.display(), files.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_single_file_passthrough() {
        let source = InputSource::File(PathBuf::from("/videos/a.mkv"));
        let files = collect_video_files(&source, &ExtensionFilter::default()).unwrap();
        assert_eq!(files, vec![PathBuf::from("/videos/a.mkv")]);
    }

    #[test]
    fn test_directory_filter_and_order() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "c.MP4");
        touch(temp_dir.path(), "a.avi");
        touch(temp_dir.path(), "b.txt");
        touch(temp_dir.path(), ".hidden.mp4");
        fs::create_dir(temp_dir.path().join("nested.mp4")).unwrap();
        touch(&temp_dir.path().join("nested.mp4"), "inner.mp4");

        let source = InputSource::Directory(temp_dir.path().to_path_buf());
        let files = collect_video_files(&source, &ExtensionFilter::default()).unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.avi", "c.MP4"]);
    }

    #[test]
    fn test_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let source = InputSource::Directory(temp_dir.path().to_path_buf());
        let files = collect_video_files(&source, &ExtensionFilter::default()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_missing_directory() {
        let source = InputSource::Directory(PathBuf::from("/definitely/not/here"));
        let err = collect_video_files(&source, &ExtensionFilter::default()).unwrap_err();
        assert!(err.is_configuration());
    }
}
