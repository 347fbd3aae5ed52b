use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A width:height ratio, e.g. `16:9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    /// Return `None` when either side is zero
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    pub fn ratio(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Width of a frame with this ratio and the given height, rounded to an
    /// even number as most encoders require it
    pub fn width_for_height(self, height: u32) -> u32 {
        let width = (f64::from(height) * self.ratio()).round() as u32;
        width + width % 2
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    /// Accept both `W:H` and `W/H`, ffprobe uses the former and ffmpeg filters the latter
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once([':', '/'])
            .ok_or_else(|| format!("Aspect ratio '{s}' is not of the form W:H"))?;

        let parse = |n: &str| {
            n.trim()
                .parse::<u32>()
                .map_err(|_| format!("Invalid aspect ratio part '{n}' in '{s}'"))
        };

        AspectRatio::new(parse(w)?, parse(h)?)
            .ok_or_else(|| format!("Aspect ratio '{s}' has a zero side"))
    }
}

impl Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

impl Serialize for AspectRatio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AspectRatio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let ratio: AspectRatio = "16:9".parse().unwrap();
        assert_eq!(ratio, AspectRatio { width: 16, height: 9 });
        assert_eq!("4/3".parse::<AspectRatio>().unwrap().to_string(), "4:3");
        assert!("0:1".parse::<AspectRatio>().is_err());
        assert!("N/A".parse::<AspectRatio>().is_err());
        assert!("169".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_width_for_height() {
        let wide = AspectRatio::new(16, 9).unwrap();
        assert_eq!(wide.width_for_height(720), 1280);
        assert_eq!(wide.width_for_height(480), 854);

        let old = AspectRatio::new(4, 3).unwrap();
        assert_eq!(old.width_for_height(480), 640);
    }
}
