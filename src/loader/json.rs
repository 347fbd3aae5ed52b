use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::{
    io::{find_unused_path, sanitize_file_name, write_atomically},
    result::PersistenceError,
    types::Show,
};

use super::{SaveNewOptions, ShowLoader};

pub const RECORD_EXTENSION: &str = "amq";

/// Store each show as a pretty-printed JSON record named `<id>.amq`
#[derive(Debug, Default)]
pub struct JsonLoader;

impl JsonLoader {
    pub fn new() -> Self {
        Self
    }

    /// Serialize the show, making sure a song never lists its own show
    /// in `also_in`
    fn to_bytes(show: &Show, path: &Path) -> Result<Vec<u8>, PersistenceError> {
        let has_self_reference = show
            .songs
            .iter()
            .any(|song| song.also_in.contains(&show.id));

        let res = if has_self_reference {
            let mut show = show.clone();
            show.strip_self_references();
            serde_json::to_vec_pretty(&show)
        } else {
            serde_json::to_vec_pretty(show)
        };

        let mut bytes = res.map_err(|source| PersistenceError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn target_directory(base: &Path, show: &Show, options: SaveNewOptions) -> PathBuf {
        if !options.add_show_name_directory {
            return base.to_path_buf();
        }

        let name = sanitize_file_name(&show.name);
        if name.is_empty() {
            base.join(show.id.to_string())
        } else {
            base.join(name)
        }
    }
}

impl ShowLoader for JsonLoader {
    fn extension(&self) -> &str {
        RECORD_EXTENSION
    }

    fn save_new(
        &self,
        base: &Path,
        show: &mut Show,
        options: SaveNewOptions,
    ) -> Result<PathBuf, PersistenceError> {
        let dir = Self::target_directory(base, show, options);
        let stem = show.id.to_string();
        let dot_ext = format!(".{}", self.extension());
        let mut path = dir.join(format!("{stem}{dot_ext}"));

        // Serialize first so a failure cannot leave anything on disk
        let bytes = Self::to_bytes(show, &path)?;

        fs::create_dir_all(&dir).map_err(PersistenceError::io(&dir))?;

        if path.exists() && !options.allow_overwrite {
            if options.create_duplicate_on_collision {
                path = find_unused_path(&dir, &stem, &dot_ext);
                debug!("Record already exists, duplicating to {}", path.display());
            } else {
                return Err(PersistenceError::Conflict(path));
            }
        }

        match write_atomically(&path, &bytes, options.allow_overwrite) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(PersistenceError::Conflict(path))
            }
            Err(source) => return Err(PersistenceError::Io { path, source }),
        }

        info!("Created record of show {} at {}", show.id, path.display());
        show.directory = dir;
        show.record_path = Some(path.clone());
        Ok(path)
    }

    fn save(&self, show: &Show) -> Result<(), PersistenceError> {
        let path = show
            .record_path
            .as_deref()
            .ok_or(PersistenceError::NotSaved(show.id))?;

        let bytes = Self::to_bytes(show, path)?;
        write_atomically(path, &bytes, true).map_err(PersistenceError::io(path))?;

        debug!("Saved show {} to {}", show.id, path.display());
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<Show, PersistenceError> {
        let bytes = fs::read(path).map_err(PersistenceError::io(path))?;
        let mut show: Show =
            serde_json::from_slice(&bytes).map_err(|source| PersistenceError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        show.directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        show.record_path = Some(path.to_path_buf());
        show.strip_self_references();

        debug!("Loaded show {} from {}", show.id, path.display());
        Ok(show)
    }

    fn load_all(&self, dir: &Path) -> Vec<Result<Show, PersistenceError>> {
        let extension = self.extension();

        WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => {
                    let is_record = entry.file_type().is_file()
                        && entry.path().extension().and_then(|ext| ext.to_str())
                            == Some(extension);
                    is_record.then(|| self.load(entry.path()))
                }
                Err(err) => {
                    let path = err.path().unwrap_or(dir).to_path_buf();
                    Some(Err(PersistenceError::Io {
                        path,
                        source: err.into(),
                    }))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::types::{Song, SongType, Status, Timestamp};

    fn bebop() -> Show {
        let mut show = Show::new(5, "Cowboy Bebop", 1998);
        show.songs.push(
            Song::new("Tank!", "Seatbelts")
                .with_type(SongType::Opening, Some(1))
                .with_times(Timestamp::from_secs(60), Timestamp::from_secs(90)),
        );
        show.songs.push(
            Song::new("The Real Folk Blues", "Mai Yamane").with_type(SongType::Ending, Some(1)),
        );
        show
    }

    #[test]
    fn test_save_new_in_show_directory() {
        let base = tempfile::tempdir().unwrap();
        let mut show = bebop();

        let path = JsonLoader
            .save_new(base.path(), &mut show, SaveNewOptions::default())
            .unwrap();

        assert_eq!(path, base.path().join("Cowboy Bebop").join("5.amq"));
        assert_eq!(show.directory, base.path().join("Cowboy Bebop"));
        assert_eq!(show.record_path.as_deref(), Some(path.as_path()));
        assert!(path.starts_with(&show.directory));
    }

    #[test]
    fn test_save_new_duplicates_on_collision() {
        let base = tempfile::tempdir().unwrap();
        let options = SaveNewOptions {
            allow_overwrite: false,
            create_duplicate_on_collision: true,
            add_show_name_directory: false,
        };

        let mut first = bebop();
        let first_path = JsonLoader.save_new(base.path(), &mut first, options).unwrap();
        let original_bytes = fs::read(&first_path).unwrap();

        let mut second = bebop();
        second.name = "Changed".to_owned();
        let second_path = JsonLoader.save_new(base.path(), &mut second, options).unwrap();

        assert_ne!(first_path, second_path);
        assert_eq!(second_path, base.path().join("5 (1).amq"));
        assert_eq!(fs::read(&first_path).unwrap(), original_bytes);
    }

    #[test]
    fn test_save_new_conflict_writes_nothing() {
        let base = tempfile::tempdir().unwrap();
        let options = SaveNewOptions {
            allow_overwrite: false,
            create_duplicate_on_collision: false,
            add_show_name_directory: false,
        };

        let mut show = bebop();
        let path = JsonLoader.save_new(base.path(), &mut show, options).unwrap();
        let original_bytes = fs::read(&path).unwrap();

        let mut other = bebop();
        other.name = "Changed".to_owned();
        let err = JsonLoader.save_new(base.path(), &mut other, options).unwrap_err();

        assert!(matches!(err, PersistenceError::Conflict(p) if p == path));
        assert_eq!(fs::read(&path).unwrap(), original_bytes);
        assert_eq!(fs::read_dir(base.path()).unwrap().count(), 1);
        assert_eq!(other.record_path, None);
    }

    #[test]
    fn test_save_new_overwrite() {
        let base = tempfile::tempdir().unwrap();
        let options = SaveNewOptions {
            allow_overwrite: true,
            create_duplicate_on_collision: false,
            add_show_name_directory: false,
        };

        let mut show = bebop();
        let path = JsonLoader.save_new(base.path(), &mut show, options).unwrap();

        let mut other = bebop();
        other.name = "Changed".to_owned();
        let other_path = JsonLoader.save_new(base.path(), &mut other, options).unwrap();

        assert_eq!(path, other_path);
        assert_eq!(JsonLoader.load(&path).unwrap().name, "Changed");
    }

    #[test]
    fn test_save_requires_record_path() {
        let err = JsonLoader.save(&bebop()).unwrap_err();
        assert!(matches!(err, PersistenceError::NotSaved(5)));
    }

    #[test]
    fn test_round_trip_keeps_order_and_state() {
        let base = tempfile::tempdir().unwrap();
        let mut show = bebop();
        show.source = Some(PathBuf::from("bebop.mkv"));
        JsonLoader
            .save_new(base.path(), &mut show, SaveNewOptions::default())
            .unwrap();

        show.songs.swap(0, 1);
        show.songs[0].status = Status::SUBMITTED | Status::MP3;
        show.songs[0].also_in.extend([5, 9]);
        JsonLoader.save(&show).unwrap();

        let loaded = JsonLoader.load(show.record_path.as_deref().unwrap()).unwrap();
        assert_eq!(loaded.songs[0].name, "The Real Folk Blues");
        assert_eq!(loaded.songs[1].name, "Tank!");
        assert_eq!(loaded.songs[0].status, Status::SUBMITTED | Status::MP3);
        assert_eq!(loaded.songs[0].also_in.iter().copied().collect::<Vec<_>>(), [9]);
        assert_eq!(loaded.directory, show.directory);
        assert_eq!(loaded.source_path(), show.source_path());
    }

    #[test]
    fn test_load_ignores_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("12.amq");
        fs::write(
            &path,
            indoc! {r#"
                {
                    "id": 12,
                    "name": "Angel Links",
                    "year": 1999,
                    "comment": "not a known field",
                    "songs": [
                        {
                            "name": "All my soul",
                            "artist": "Ayumi Hamasaki",
                            "type": "Opening",
                            "start": "00:00:10",
                            "end": "00:01:40.5",
                            "status": 3,
                            "rating": 5
                        }
                    ]
                }
            "#},
        )
        .unwrap();

        let show = JsonLoader.load(&path).unwrap();
        assert_eq!(show.id, 12);
        assert_eq!(show.directory, dir.path());
        assert_eq!(show.songs[0].end, Timestamp::from_millis(100_500));
        assert_eq!(show.songs[0].status, Status::SUBMITTED | Status::MP3);
    }

    #[test]
    fn test_load_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.amq");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            JsonLoader.load(&path),
            Err(PersistenceError::Malformed { .. })
        ));
        assert!(matches!(
            JsonLoader.load(&dir.path().join("missing.amq")),
            Err(PersistenceError::Io { .. })
        ));
    }

    #[test]
    fn test_load_all_is_recursive_and_isolates_failures() {
        let base = tempfile::tempdir().unwrap();
        let mut show = bebop();
        JsonLoader
            .save_new(base.path(), &mut show, SaveNewOptions::default())
            .unwrap();
        fs::write(base.path().join("broken.amq"), "[]").unwrap();
        fs::write(base.path().join("notes.txt"), "not a record").unwrap();

        let results = JsonLoader.load_all(base.path());
        assert_eq!(results.len(), 2);
        assert_eq!(results.iter().filter(|res| res.is_err()).count(), 1);
        assert!(results.iter().any(|res| matches!(res, Ok(show) if show.id == 5)));
    }
}
