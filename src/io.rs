use std::{
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

/// Characters that are not allowed in a file name on at least one platform
const INVALID_FILE_NAME_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Remove the characters that cannot be part of a file name and collapse
/// the remaining whitespace
pub fn sanitize_file_name(name: &str) -> String {
    name.split(|c: char| INVALID_FILE_NAME_CHARS.contains(&c) || c.is_control())
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches('.')
        .to_owned()
}

/// Find the first path of the form `<stem><ext>` or `<stem> (<n>)<ext>`
/// that does not exist yet, with n starting at 1
pub fn find_unused_path(dir: &Path, stem: &str, dot_ext: &str) -> PathBuf {
    let mut output = dir.join(format!("{stem}{dot_ext}"));
    if !output.exists() {
        return output;
    }

    // Format for duplicates: <stem> (<count>)<ext>
    let mut n = 1u32;
    loop {
        output.set_file_name(format!("{stem} ({n}){dot_ext}"));
        if !output.exists() {
            return output;
        }
        n += 1;
    }
}

/// Create a named temporary file next to its final destination, so that
/// persisting it is a simple rename.
///
/// The file is deleted when the handle is dropped.
/// **As such, one must not simply get the file path and drop the handle.**
pub fn sibling_tempfile(dir: &Path, suffix: &str) -> std::io::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(".amqclip-")
        .suffix(suffix)
        .tempfile_in(dir)
}

/// Write the bytes to a temporary file then move it to `path`.
///
/// When `overwrite` is false and `path` already exists, nothing is written
/// and an `AlreadyExists` error is returned.
pub fn write_atomically(path: &Path, bytes: &[u8], overwrite: bool) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = sibling_tempfile(dir, ".tmp")?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    if overwrite {
        tmp.persist(path).map_err(|err| err.error)?;
    } else {
        tmp.persist_noclobber(path).map_err(|err| err.error)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("Fate/Zero"), "Fate Zero");
        assert_eq!(sanitize_file_name("  What?  If:  "), "What If");
        assert_eq!(sanitize_file_name("K-On!!"), "K-On!!");
        assert_eq!(sanitize_file_name("Trailing..."), "Trailing");
    }

    #[test]
    fn test_find_unused_path() {
        let dir = tempfile::tempdir().unwrap();

        let first = find_unused_path(dir.path(), "5", ".amq");
        assert_eq!(first, dir.path().join("5.amq"));
        std::fs::write(&first, "").unwrap();

        let second = find_unused_path(dir.path(), "5", ".amq");
        assert_eq!(second, dir.path().join("5 (1).amq"));
        std::fs::write(&second, "").unwrap();
        std::fs::write(dir.path().join("5 (3).amq"), "").unwrap();

        assert_eq!(
            find_unused_path(dir.path(), "5", ".amq"),
            dir.path().join("5 (2).amq")
        );
    }

    #[test]
    fn test_write_atomically_no_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record");

        write_atomically(&path, b"first", false).unwrap();
        let err = write_atomically(&path, b"second", false).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read(&path).unwrap(), b"first");

        write_atomically(&path, b"third", true).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"third");

        // No temporary file is left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
