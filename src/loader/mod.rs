mod json;

use std::path::{Path, PathBuf};

pub use json::JsonLoader;

use crate::{result::PersistenceError, types::Show};

/// What to do when creating the record of a new show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveNewOptions {
    /// Replace an existing record at the target path
    pub allow_overwrite: bool,

    /// When not overwriting, write to the first free `<id> (<n>)` path
    /// instead of failing
    pub create_duplicate_on_collision: bool,

    /// Put the record in a sub-directory named after the show
    pub add_show_name_directory: bool,
}

impl Default for SaveNewOptions {
    fn default() -> Self {
        Self {
            allow_overwrite: false,
            create_duplicate_on_collision: true,
            add_show_name_directory: true,
        }
    }
}

/// A trait for persisting shows, one record per show.
///
/// A record lives in the show directory, next to the show media files.
/// Loading a record sets the show `directory` to the record parent directory.
pub trait ShowLoader: Send + Sync {
    /// The file extension of the records, without the leading dot
    fn extension(&self) -> &str;

    /// Create the record of a show that has never been saved.
    ///
    /// Return the path of the written record, which is also stored in
    /// the show along with its new directory.
    ///
    /// When a record already exists at the target path and the options
    /// do not allow overwriting nor duplicating, [PersistenceError::Conflict]
    /// **must** be returned without anything being written.
    fn save_new(
        &self,
        base: &Path,
        show: &mut Show,
        options: SaveNewOptions,
    ) -> Result<PathBuf, PersistenceError>;

    /// Rewrite the record of a previously saved show with its full current state.
    fn save(&self, show: &Show) -> Result<(), PersistenceError>;

    /// Read the record at the given path.
    fn load(&self, path: &Path) -> Result<Show, PersistenceError>;

    /// Load every record found under the directory, recursively.
    ///
    /// A record that cannot be loaded does not prevent the others from
    /// being loaded.
    fn load_all(&self, dir: &Path) -> Vec<Result<Show, PersistenceError>>;
}
