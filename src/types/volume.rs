use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A loudness adjustment in decibels, added to the source level
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VolumeModifier {
    decibels: f64,
}

impl VolumeModifier {
    #[cfg(test)]
    pub fn from_decibels(decibels: f64) -> Self {
        Self { decibels }
    }

    /// Value for the ffmpeg `volume` audio filter
    pub fn to_filter(self) -> String {
        format!("volume={}dB", self.decibels)
    }
}

impl Display for VolumeModifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}dB", self.decibels)
    }
}
