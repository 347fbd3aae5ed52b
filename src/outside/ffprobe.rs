use std::{ffi::OsStr, fmt::Debug, path::Path};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    result::{CommandError, ProbeError},
    types::{AspectRatio, Show, VideoInfo},
};

use super::command::{assert_success_command, Capture, FFXXX_DEFAULT_ARGS};

pub const FFPROBE: &str = "ffprobe";

/// Interface for inspecting source videos
pub trait SourceProber: Sync + Debug {
    /// Extract the intrinsic properties of the first video stream of the file
    fn probe(&self, source: &Path) -> Result<VideoInfo, ProbeError>;
}

/// Interface for the [ffprobe](https://ffmpeg.org) program
#[derive(Debug)]
pub struct Ffprobe {
    program: String,
}

impl Ffprobe {
    /// Verify that the `ffprobe` binary is reachable
    pub fn new(program: impl Into<String>) -> Result<Self, CommandError> {
        let program = program.into();
        assert_success_command(&program, |cmd| cmd.arg("-version"), Capture::empty())?;

        Ok(Self { program })
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    sample_aspect_ratio: Option<String>,
    display_aspect_ratio: Option<String>,
}

impl SourceProber for Ffprobe {
    fn probe(&self, source: &Path) -> Result<VideoInfo, ProbeError> {
        if !source.is_file() {
            return Err(ProbeError::MissingSource(source.to_path_buf()));
        }

        let res = assert_success_command(
            &self.program,
            |cmd| {
                cmd.args(FFXXX_DEFAULT_ARGS)
                    .args(["-select_streams", "v:0"])
                    .args([
                        "-show_entries",
                        "stream=width,height,sample_aspect_ratio,display_aspect_ratio",
                    ])
                    .args(["-of", "json"])
                    .arg(OsStr::new(source))
            },
            Capture::STDOUT,
        )?;

        parse_probe_output(source, &String::from_utf8_lossy(&res.stdout))
    }
}

fn parse_probe_output(source: &Path, output: &str) -> Result<VideoInfo, ProbeError> {
    let malformed = |reason: String| ProbeError::Malformed {
        path: source.to_path_buf(),
        reason,
    };

    let output: ProbeOutput =
        serde_json::from_str(output).map_err(|err| malformed(err.to_string()))?;
    let stream = output
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| malformed("No video stream".to_owned()))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(malformed("Missing or zero video dimensions".to_owned())),
    };

    // ffprobe reports "0:1" or "N/A" when it does not know the ratio
    let ratio = |s: Option<String>| s.and_then(|s| s.parse::<AspectRatio>().ok());

    Ok(VideoInfo {
        width,
        height,
        sar: ratio(stream.sample_aspect_ratio),
        dar: ratio(stream.display_aspect_ratio),
    })
}

/// Probe the show's source video and attach the result.
///
/// Failures are logged and leave the show without video information.
pub fn attach_video_info(prober: &dyn SourceProber, show: &mut Show) {
    let Some(source) = show.source_path() else {
        debug!("Show {} has no source video, skip probing", show.id);
        show.video_info = None;
        return;
    };

    show.video_info = match prober.probe(&source) {
        Ok(info) => {
            debug!("Show {}: {info}", show.id);
            Some(info)
        }
        Err(err) => {
            warn!("Could not probe the source of show {}: {err}", show.id);
            None
        }
    };
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use indoc::indoc;

    use super::*;

    #[derive(Debug)]
    struct FailingProber;

    impl SourceProber for FailingProber {
        fn probe(&self, source: &Path) -> Result<VideoInfo, ProbeError> {
            Err(ProbeError::MissingSource(source.to_path_buf()))
        }
    }

    #[test]
    fn test_parse_output() {
        let output = indoc! {r#"
            {
                "programs": [],
                "streams": [
                    {
                        "width": 1440,
                        "height": 1080,
                        "sample_aspect_ratio": "4:3",
                        "display_aspect_ratio": "16:9"
                    }
                ]
            }
        "#};

        let info = parse_probe_output(Path::new("a.mkv"), output).unwrap();
        assert_eq!(info.width, 1440);
        assert_eq!(info.height, 1080);
        assert_eq!(info.sar, AspectRatio::new(4, 3));
        assert_eq!(info.dar, AspectRatio::new(16, 9));
    }

    #[test]
    fn test_unknown_ratios_are_absent() {
        let output = r#"{ "streams": [ { "width": 640, "height": 480, "sample_aspect_ratio": "0:1" } ] }"#;

        let info = parse_probe_output(Path::new("a.mkv"), output).unwrap();
        assert_eq!(info.sar, None);
        assert_eq!(info.dar, None);
    }

    #[test]
    fn test_malformed_output() {
        let no_stream = parse_probe_output(Path::new("a.mkv"), r#"{ "streams": [] }"#);
        assert!(matches!(no_stream, Err(ProbeError::Malformed { .. })));

        let not_json = parse_probe_output(Path::new("a.mkv"), "garbage");
        assert!(matches!(not_json, Err(ProbeError::Malformed { .. })));

        let no_size = parse_probe_output(Path::new("a.mkv"), r#"{ "streams": [ {} ] }"#);
        assert!(matches!(no_size, Err(ProbeError::Malformed { .. })));
    }

    #[test]
    fn test_probe_failure_is_not_fatal() {
        let mut show = Show::new(1, "x", 2000);
        show.source = Some(PathBuf::from("missing.mkv"));
        show.video_info = Some(VideoInfo {
            width: 1,
            height: 1,
            sar: None,
            dar: None,
        });

        attach_video_info(&FailingProber, &mut show);
        assert_eq!(show.video_info, None);
    }
}
