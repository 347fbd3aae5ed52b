use std::fmt::Display;

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Production state of a song.
    ///
    /// The empty set means the song has not been submitted yet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Status: u32 {
        const SUBMITTED = 1 << 0;
        const MP3 = 1 << 1;
        const RES_480 = 1 << 2;
        const RES_720 = 1 << 3;
    }
}

impl Status {
    /// Every artifact bit, i.e. what a fully produced song has
    pub const COMPLETED: Status = Status::MP3.union(Status::RES_480).union(Status::RES_720);

    pub fn is_missing(self, flag: Status) -> bool {
        !self.contains(flag)
    }

    pub fn is_unsubmitted(self) -> bool {
        self.is_empty()
    }

    pub fn is_completed(self) -> bool {
        self.contains(Self::COMPLETED)
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "NotSubmitted");
        }

        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        write!(f, "{}", names.join(" | "))
    }
}

// Stored as the raw integer, unknown bits are dropped on read
impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.bits())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Ok(Status::from_bits_truncate(bits))
    }
}
