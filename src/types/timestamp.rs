use std::{fmt::Display, ops::Deref, str::FromStr, time::Duration};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A position inside a media stream.
///
/// Written as `HH:MM:SS` with an optional `.fff` fraction, and read from any
/// `[[H:]M:]S[.f]` form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(Duration);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(Duration::ZERO);

    #[cfg(test)]
    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    #[cfg(test)]
    pub fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    /// Format for the `-ss`/`-t` arguments of ffmpeg, in seconds
    pub fn to_ffmpeg_arg(self) -> String {
        format!("{}.{:03}", self.0.as_secs(), self.0.subsec_millis())
    }
}

impl From<Duration> for Timestamp {
    fn from(value: Duration) -> Self {
        Self(value)
    }
}

impl Deref for Timestamp {
    type Target = Duration;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for Timestamp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Empty timestamp".to_owned());
        }

        let (whole, fraction) = match s.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (s, None),
        };

        let parts: Vec<&str> = whole.split(':').collect();
        if parts.len() > 3 {
            return Err(format!("Too many ':' separated parts in '{s}'"));
        }

        let mut secs = 0u64;
        for part in parts {
            let n: u64 = part
                .parse()
                .map_err(|_| format!("Invalid number '{part}' in '{s}'"))?;
            secs = secs
                .checked_mul(60)
                .and_then(|secs| secs.checked_add(n))
                .ok_or_else(|| format!("Timestamp '{s}' is out of range"))?;
        }

        let millis = match fraction {
            Some(fraction)
                if !fraction.is_empty() && fraction.chars().all(|c| c.is_ascii_digit()) =>
            {
                // Keep millisecond precision, pad or truncate the digits
                let digits: String = fraction.chars().chain("000".chars()).take(3).collect();
                digits.parse::<u64>().map_err(|e| e.to_string())?
            }
            Some(fraction) => return Err(format!("Invalid fraction '{fraction}' in '{s}'")),
            None => 0,
        };

        Duration::from_secs(secs)
            .checked_add(Duration::from_millis(millis))
            .map(Self)
            .ok_or_else(|| format!("Timestamp '{s}' is out of range"))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total = self.0.as_secs();
        let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
        write!(f, "{h:02}:{m:02}:{s:02}")?;

        let millis = self.0.subsec_millis();
        if millis != 0 {
            write!(f, ".{millis:03}")?;
        }
        Ok(())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!("90".parse::<Timestamp>().unwrap(), Timestamp::from_secs(90));
        assert_eq!("1:30".parse::<Timestamp>().unwrap(), Timestamp::from_secs(90));
        assert_eq!(
            "01:01:30".parse::<Timestamp>().unwrap(),
            Timestamp::from_secs(3690)
        );
        assert_eq!(
            "00:01:30.5".parse::<Timestamp>().unwrap(),
            Timestamp::from_millis(90_500)
        );
        assert_eq!(
            "00:01:30.1234567".parse::<Timestamp>().unwrap(),
            Timestamp::from_millis(90_123)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Timestamp>().is_err());
        assert!("1:2:3:4".parse::<Timestamp>().is_err());
        assert!("ab:cd".parse::<Timestamp>().is_err());
        assert!("1:30.x".parse::<Timestamp>().is_err());
    }

    #[test]
    fn test_parse_rejects_overflow() {
        let err = "307445734561825861:0".parse::<Timestamp>().unwrap_err();
        assert!(err.contains("out of range"), "{err}");

        let max = u64::MAX.to_string();
        assert!(format!("{max}.999").parse::<Timestamp>().is_err());
        assert!(format!("1:{max}").parse::<Timestamp>().is_err());
        assert_eq!(
            max.parse::<Timestamp>().unwrap(),
            Timestamp::from(Duration::from_secs(u64::MAX))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Timestamp::from_secs(90).to_string(), "00:01:30");
        assert_eq!(Timestamp::from_millis(3_690_250).to_string(), "01:01:30.250");
        assert_eq!(Timestamp::from_millis(90_500).to_ffmpeg_arg(), "90.500");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Timestamp::from_secs(60)).unwrap();
        assert_eq!(json, "\"00:01:00\"");

        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Timestamp::from_secs(60));
    }
}
