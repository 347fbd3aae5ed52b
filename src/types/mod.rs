mod aspect_ratio;
mod filter;
mod show;
mod song;
mod status;
mod target;
mod timestamp;
mod volume;

pub use aspect_ratio::AspectRatio;
pub use filter::{SearchTerms, SongVisibility};
pub use show::{Show, VideoInfo};
pub use song::{Song, SongType, SongTypeAndPosition};
pub use status::Status;
pub use target::Target;
pub use timestamp::Timestamp;
pub use volume::VolumeModifier;
