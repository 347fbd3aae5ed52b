use std::fmt::Display;

use clap::ValueEnum;

use super::Status;

/// One producible artifact of a song
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Target {
    #[value(name = "mp3")]
    Mp3,
    #[value(name = "480")]
    Res480,
    #[value(name = "720")]
    Res720,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::Mp3, Target::Res480, Target::Res720];

    /// The status bit set once this target has been produced
    pub fn status(self) -> Status {
        match self {
            Target::Mp3 => Status::MP3,
            Target::Res480 => Status::RES_480,
            Target::Res720 => Status::RES_720,
        }
    }

    /// Return the file name suffix with the leading dot.
    /// e.g. ".480p.webm"
    pub fn with_dot(self) -> &'static str {
        match self {
            Target::Mp3 => ".mp3",
            Target::Res480 => ".480p.webm",
            Target::Res720 => ".720p.webm",
        }
    }

    /// Output frame height, `None` for audio-only targets
    pub fn height(self) -> Option<u32> {
        match self {
            Target::Mp3 => None,
            Target::Res480 => Some(480),
            Target::Res720 => Some(720),
        }
    }

    pub fn is_audio_only(self) -> bool {
        self.height().is_none()
    }

    /// Build the union of the status bits of the given targets
    pub fn statuses<'a>(targets: impl IntoIterator<Item = &'a Target>) -> Status {
        targets
            .into_iter()
            .fold(Status::empty(), |acc, target| acc | target.status())
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Mp3 => write!(f, "mp3"),
            Target::Res480 => write!(f, "480p"),
            Target::Res720 => write!(f, "720p"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statuses() {
        assert_eq!(Target::statuses(&Target::ALL), Status::COMPLETED);
        assert_eq!(Target::statuses(&[]), Status::empty());
        assert_eq!(
            Target::statuses(&[Target::Mp3, Target::Res720]),
            Status::MP3 | Status::RES_720
        );
    }

    #[test]
    fn test_only_mp3_is_audio() {
        assert!(Target::Mp3.is_audio_only());
        assert!(!Target::Res480.is_audio_only());
        assert_eq!(Target::Res720.height(), Some(720));
    }
}
