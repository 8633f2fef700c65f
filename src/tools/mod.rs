mod ffprobe_info;
mod frame_source;
mod path_validator;
mod process_runner;
mod sample_scheduler;
mod scratch_dir;
mod time_formatter;
mod video_scanner;

pub use ffprobe_info::{VideoInfo, get_video_info};
pub use frame_source::{ExtractionRequest, FfmpegFrameSource, Frame, FrameSource};
pub use path_validator::validate_directory_exists;
pub use process_runner::{CommandError, CommandOutput, run_with_timeout};
pub use sample_scheduler::{SampleSchedule, sampling_rate, schedule};
pub use scratch_dir::ScratchDir;
pub use time_formatter::format_timestamp;
pub use video_scanner::collect_video_files;
