mod command;
mod ffmpeg;
mod ffprobe;

pub use ffmpeg::{Ffmpeg, TranscodeRequest, Transcoder, FFMPEG};
pub use ffprobe::{attach_video_info, Ffprobe, FFPROBE};
