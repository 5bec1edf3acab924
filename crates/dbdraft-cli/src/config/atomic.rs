use std::fs::{OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{ConfigError, ConfigResult};

/// Write `data` to a sibling temp file and rename it over `path`.
pub fn write_bytes_atomic(path: &Path, data: &[u8]) -> ConfigResult<()> {
    let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
    if let Some(parent) = parent {
        create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    std::fs::rename(&tmp_path, path)?;
    if let Some(parent) = parent {
        sync_dir(parent)?;
    }

    Ok(())
}

fn temp_path(path: &Path) -> ConfigResult<PathBuf> {
    let file_name = path
        .file_name()
        .ok_or_else(|| ConfigError::Invalid("invalid path for atomic write".to_string()))?;
    let tmp_name = format!("{}.tmp", file_name.to_string_lossy());
    Ok(path.with_file_name(tmp_name))
}

fn sync_dir(path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(path)?;
    dir.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::temp_dir;

    #[test]
    fn replaces_the_target_and_leaves_no_temp_file() {
        let dir = temp_dir("atomic");
        let path = dir.join("nested").join("out.sql");

        write_bytes_atomic(&path, b"first").expect("first write");
        write_bytes_atomic(&path, b"second").expect("second write");

        assert_eq!(std::fs::read_to_string(&path).expect("read"), "second");
        assert!(!dir.join("nested").join("out.sql.tmp").exists());
    }

    #[test]
    fn rejects_paths_without_a_file_name() {
        let error = write_bytes_atomic(Path::new("/"), b"x").expect_err("no file name");
        assert!(matches!(error, ConfigError::Invalid(_)));
    }
}
