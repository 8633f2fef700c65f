use crate::error::SheetError;
use crate::tools::process_runner::run_with_timeout;
use serde::Deserialize;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub duration_seconds: f64,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

/// 使用 ffprobe 取得影片資訊
pub fn get_video_info(path: &Path, timeout: Option<Duration>) -> Result<VideoInfo, SheetError> {
    let mut command = Command::new("ffprobe");
    command
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path);

    let output = run_with_timeout(command, timeout).map_err(|e| SheetError::Probe(e.to_string()))?;

    if !output.status.success() {
        return Err(SheetError::Probe(format!(
            "ffprobe 執行失敗 ({}): {}",
            output.status,
            output.stderr_text()
        )));
    }

    parse_ffprobe_output(&String::from_utf8_lossy(&output.stdout))
}

/// 解析 ffprobe 的 JSON 輸出；長度優先取 format，其次取視訊串流
fn parse_ffprobe_output(json: &str) -> Result<VideoInfo, SheetError> {
    let probe: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| SheetError::Probe(format!("無法解析 ffprobe 輸出: {e}")))?;

    let video_stream = probe.streams.as_ref().and_then(|streams| {
        streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
    });

    let format_duration = probe.format.as_ref().and_then(|f| f.duration.as_deref());
    let stream_duration = video_stream.and_then(|s| s.duration.as_deref());

    let duration_seconds = format_duration
        .and_then(parse_duration)
        .or_else(|| stream_duration.and_then(parse_duration))
        .ok_or_else(|| match format_duration.or(stream_duration) {
            Some(raw) => SheetError::Probe(format!("無效的影片長度: {raw:?}")),
            None => SheetError::Probe("無法取得影片長度".to_string()),
        })?;

    Ok(VideoInfo {
        duration_seconds,
        width: video_stream.and_then(|s| s.width),
        height: video_stream.and_then(|s| s.height),
    })
}

/// `N/A` 或負數視為無法使用
fn parse_duration(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
}
