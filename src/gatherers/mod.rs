mod ann;
mod theme;

pub use ann::AnimeNewsNetwork;

use crate::{result::GatherError, types::Show};

/// Which song categories a gatherer keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatherOptions {
    /// Songs the catalog does not classify as opening, ending or insert
    pub include_songs: bool,
    pub include_openings: bool,
    pub include_endings: bool,
    pub include_inserts: bool,
}

impl Default for GatherOptions {
    fn default() -> Self {
        Self {
            include_songs: true,
            include_openings: true,
            include_endings: true,
            include_inserts: true,
        }
    }
}

/// Interface for seeding new shows out of a remote catalog
pub trait Gatherer: Send + Sync {
    /// Display name of the catalog, used to select the gatherer
    fn name(&self) -> &str;

    /// Build a show out of the catalog entry with the given id.
    ///
    /// Every returned song **must** be unsubmitted and have unset times.
    fn fetch(&self, id: u32, options: &GatherOptions) -> Result<Show, GatherError>;
}

/// The gatherers available at a call site, selected by name
#[derive(Default)]
pub struct Gatherers {
    gatherers: Vec<Box<dyn Gatherer>>,
}

impl Gatherers {
    pub fn new(gatherers: Vec<Box<dyn Gatherer>>) -> Self {
        Self { gatherers }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.gatherers.iter().map(|gatherer| gatherer.name())
    }

    /// Find a gatherer by its case-insensitive name
    pub fn get(&self, name: &str) -> Result<&dyn Gatherer, GatherError> {
        self.gatherers
            .iter()
            .find(|gatherer| gatherer.name().eq_ignore_ascii_case(name))
            .map(|gatherer| &**gatherer)
            .ok_or_else(|| GatherError::UnknownGatherer(name.to_owned()))
    }
}
