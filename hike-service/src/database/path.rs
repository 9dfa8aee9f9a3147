use std::{
    fs,
    path::{Component, Path},
};

use thiserror::Error;

pub const MEMORY_DB: &str = ":memory:";

#[derive(Error, Debug, PartialEq)]
pub enum DbPathError {
    #[error("empty database path")]
    Empty,
    #[error("control characters are not allowed in the database path")]
    ControlCharacters,
    #[error("parent directory traversal is not allowed in the database path")]
    ParentTraversal,
    #[error("database path must name a file")]
    NoFileName,
    #[error("database path must not be a symlink")]
    Symlink,
    #[error("database path points to a directory")]
    Directory,
}

/// Reject database paths that could escape the working area or alias
/// another file. `:memory:` is always allowed.
pub fn validate_db_path(db_path: &str) -> Result<(), DbPathError> {
    if db_path == MEMORY_DB {
        return Ok(());
    }
    if db_path.is_empty() {
        return Err(DbPathError::Empty);
    }
    if db_path.chars().any(char::is_control) {
        return Err(DbPathError::ControlCharacters);
    }

    let path = Path::new(db_path);
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(DbPathError::ParentTraversal);
    }
    if path.file_name().is_none() {
        return Err(DbPathError::NoFileName);
    }

    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => Err(DbPathError::Symlink),
        Ok(meta) if meta.is_dir() => Err(DbPathError::Directory),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{distributions::Alphanumeric, Rng};
    use std::{env, path::PathBuf};

    fn scratch(prefix: &str) -> PathBuf {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect();
        env::temp_dir().join(format!("{prefix}{suffix}"))
    }

    #[test]
    fn accepts_memory_and_relative_files() {
        assert_eq!(validate_db_path(":memory:"), Ok(()));
        assert_eq!(validate_db_path("data/hikes.db"), Ok(()));
    }

    #[test]
    fn rejects_malformed_paths() {
        assert_eq!(validate_db_path(""), Err(DbPathError::Empty));
        assert_eq!(
            validate_db_path("bad\nname.db"),
            Err(DbPathError::ControlCharacters)
        );
        assert_eq!(
            validate_db_path("bad\0name.db"),
            Err(DbPathError::ControlCharacters)
        );
        assert_eq!(
            validate_db_path("dir/../hikes.db"),
            Err(DbPathError::ParentTraversal)
        );
    }

    #[test]
    fn rejects_directory() {
        let dir = scratch("hikes_dir_");
        fs::create_dir_all(&dir).unwrap();
        assert_eq!(
            validate_db_path(dir.to_str().unwrap()),
            Err(DbPathError::Directory)
        );
        fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn rejects_symlink() {
        use std::os::unix::fs::symlink;

        let base = scratch("hikes_sym_");
        fs::create_dir_all(&base).unwrap();
        let target = base.join("target.db");
        fs::write(&target, b"test").unwrap();
        let link = base.join("link.db");
        symlink(&target, &link).unwrap();

        assert_eq!(
            validate_db_path(link.to_str().unwrap()),
            Err(DbPathError::Symlink)
        );

        fs::remove_dir_all(&base).ok();
    }
}
