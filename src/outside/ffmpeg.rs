use std::{
    ffi::OsString,
    fmt::Debug,
    path::{Path, PathBuf},
    sync::atomic::AtomicBool,
};

use crate::{
    result::{CommandError, TranscodeError},
    types::{AspectRatio, Target, Timestamp, VolumeModifier},
};

use super::command::{assert_success_command, run_cancellable, Capture, FFXXX_DEFAULT_ARGS};

pub const FFMPEG: &str = "ffmpeg";

const AUDIO_BITRATE: &str = "320k";

/// Everything needed to produce one target of a song
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeRequest {
    pub input: PathBuf,
    pub target: Target,
    pub start: Timestamp,
    pub end: Timestamp,
    pub audio_track: u32,
    pub video_track: u32,
    /// Pad the picture to this ratio instead of keeping the source one
    pub aspect_ratio: Option<AspectRatio>,
    pub volume: Option<VolumeModifier>,
}

pub trait Transcoder: Send + Sync + Debug {
    /// Produce the requested excerpt into `output`.
    ///
    /// Implementations must stop as soon as possible once `cancel` is raised,
    /// the content of `output` is then unspecified.
    fn transcode(
        &self,
        request: &TranscodeRequest,
        output: &Path,
        cancel: &AtomicBool,
    ) -> Result<(), TranscodeError>;
}

/// Interface for the [ffmpeg](https://ffmpeg.org) program
#[derive(Debug)]
pub struct Ffmpeg {
    program: String,
}

impl Ffmpeg {
    /// Verify that the `ffmpeg` binary is reachable
    pub fn new(program: impl Into<String>) -> Result<Self, CommandError> {
        let program = program.into();
        assert_success_command(&program, |cmd| cmd.arg("-version"), Capture::empty())?;

        Ok(Self { program })
    }

    /// Build the ffmpeg arguments for a request, without the program name
    pub fn build_args(request: &TranscodeRequest, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = FFXXX_DEFAULT_ARGS.iter().map(OsString::from).collect();
        let mut push = |values: &[&str]| args.extend(values.iter().map(OsString::from));

        // Seeking on the input is fast and frame accurate when transcoding
        let length = Timestamp::from(request.end.saturating_sub(*request.start));
        push(&["-y"]);
        push(&["-ss", &request.start.to_ffmpeg_arg()]);
        push(&["-t", &length.to_ffmpeg_arg()]);
        args.push("-i".into());
        args.push(request.input.clone().into());

        let mut push = |values: &[&str]| args.extend(values.iter().map(OsString::from));
        let audio_map = format!("0:a:{}", request.audio_track);
        push(&["-map_metadata", "-1", "-map_chapters", "-1", "-sn", "-dn"]);

        match request.target.height() {
            None => {
                push(&["-vn", "-map", &audio_map]);
                push(&["-c:a", "libmp3lame", "-b:a", AUDIO_BITRATE, "-ac", "2"]);
            }
            Some(height) => {
                let video_map = format!("0:v:{}", request.video_track);
                push(&["-map", &video_map, "-map", &audio_map]);
                push(&["-vf", &video_filter(height, request.aspect_ratio)]);
                push(&["-c:v", "libvpx-vp9", "-b:v", "0", "-crf", "20"]);
                push(&["-pix_fmt", "yuv420p", "-deadline", "good", "-cpu-used", "1"]);
                push(&["-row-mt", "1"]);
                push(&["-c:a", "libopus", "-b:a", AUDIO_BITRATE, "-ac", "2"]);
                push(&["-shortest"]);
            }
        }

        if let Some(volume) = request.volume {
            push(&["-af", &volume.to_filter()]);
        }

        let format = if request.target.is_audio_only() {
            "mp3"
        } else {
            "webm"
        };
        push(&["-f", format]);
        args.push(output.as_os_str().to_owned());

        args
    }
}

/// Scale the picture to the target height, or fit it inside a frame of the
/// overridden ratio and pad the rest
fn video_filter(height: u32, aspect_ratio: Option<AspectRatio>) -> String {
    match aspect_ratio {
        None => format!("scale=-2:{height},setsar=1"),
        Some(ratio) => {
            let width = ratio.width_for_height(height);
            format!(
                "scale={width}:{height}:force_original_aspect_ratio=decrease,\
                pad={width}:{height}:(ow-iw)/2:(oh-ih)/2,\
                setsar=1"
            )
        }
    }
}

impl Transcoder for Ffmpeg {
    fn transcode(
        &self,
        request: &TranscodeRequest,
        output: &Path,
        cancel: &AtomicBool,
    ) -> Result<(), TranscodeError> {
        let args = Self::build_args(request, output);
        run_cancellable(&self.program, |cmd| cmd.args(&args), cancel)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(target: Target) -> TranscodeRequest {
        TranscodeRequest {
            input: PathBuf::from("/anime/source.mkv"),
            target,
            start: Timestamp::from_secs(60),
            end: Timestamp::from_millis(90_500),
            audio_track: 1,
            video_track: 0,
            aspect_ratio: None,
            volume: None,
        }
    }

    fn args_string(request: &TranscodeRequest) -> String {
        Ffmpeg::build_args(request, Path::new("/out/clip"))
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_mp3_args() {
        let args = args_string(&request(Target::Mp3));

        assert!(args.contains("-ss 60.000 -t 30.500 -i /anime/source.mkv"));
        assert!(args.contains("-vn -map 0:a:1"));
        assert!(args.contains("-c:a libmp3lame"));
        assert!(!args.contains("-vf"));
        assert!(args.ends_with("-f mp3 /out/clip"));
    }

    #[test]
    fn test_video_args() {
        let args = args_string(&request(Target::Res720));

        assert!(args.contains("-map 0:v:0 -map 0:a:1"));
        assert!(args.contains("-vf scale=-2:720,setsar=1"));
        assert!(args.contains("-c:v libvpx-vp9"));
        assert!(args.ends_with("-f webm /out/clip"));
    }

    #[test]
    fn test_overrides() {
        let mut request = request(Target::Res480);
        request.aspect_ratio = AspectRatio::new(16, 9);
        request.volume = Some(VolumeModifier::from_decibels(-2.0));
        let args = args_string(&request);

        assert!(args.contains(
            "-vf scale=854:480:force_original_aspect_ratio=decrease,pad=854:480:(ow-iw)/2:(oh-ih)/2,setsar=1"
        ));
        assert!(args.contains("-af volume=-2dB"));
    }
}
