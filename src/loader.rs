//! This module provides the `MachineLoader` struct, responsible for loading machine
//! descriptions from files, directories and strings.

use crate::parser::parse;
use crate::types::{Machine, RtmError};
use std::fs;
use std::path::{Path, PathBuf};

/// File extension of machine description files.
pub const MACHINE_EXTENSION: &str = "rtm";

/// `MachineLoader` is a utility struct for loading machine descriptions.
pub struct MachineLoader;

impl MachineLoader {
    /// Loads a single machine description from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Machine)` if the file is successfully read and parsed.
    /// * `Err(RtmError::FileError)` if the file cannot be read.
    /// * `Err(RtmError::ParseError)` or `Err(RtmError::ValidationError)` if the content is invalid.
    pub fn load_machine(path: &Path) -> Result<Machine, RtmError> {
        let content = fs::read_to_string(path).map_err(|e| {
            RtmError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        parse(&content)
    }

    /// Loads a single machine description from the provided string content.
    pub fn load_machine_from_string(content: &str) -> Result<Machine, RtmError> {
        parse(content)
    }

    /// Loads every `.rtm` file in a directory.
    ///
    /// Subdirectories and files with other extensions are skipped. Each element of the result
    /// is either the path and machine of a file that loaded, or the error for one that did not.
    pub fn load_machines(directory: &Path) -> Vec<Result<(PathBuf, Machine), RtmError>> {
        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(RtmError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut results: Vec<_> = entries
            .filter_map(|entry| {
                let path = match entry {
                    Ok(entry) => entry.path(),
                    Err(e) => {
                        return Some(Err(RtmError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                if path.is_dir() || path.extension().map_or(true, |ext| ext != MACHINE_EXTENSION) {
                    return None;
                }

                Some(Self::load_machine(&path).map(|machine| (path, machine)))
            })
            .collect();

        // Directory order is platform dependent.
        results.sort_by_key(|result| result.as_ref().ok().map(|(path, _)| path.clone()));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const FLIP: &str = "2 2 3 1\n0 1\n0 1\n0 1 B\n(0,0)=(1,1,R)\n0\n";

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_valid_machine() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "flip.rtm", FLIP);

        let machine = MachineLoader::load_machine(&path).unwrap();
        assert_eq!(machine.start_state, "0");
        assert_eq!(machine.accept_state, "1");
        assert_eq!(machine.rules.len(), 1);
    }

    #[test]
    fn test_load_invalid_machine() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "invalid.rtm", "This is not a valid machine");

        assert!(MachineLoader::load_machine(&path).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let error = MachineLoader::load_machine(&dir.path().join("missing.rtm")).unwrap_err();

        assert!(matches!(error, RtmError::FileError(_)));
    }

    #[test]
    fn test_load_from_string() {
        let machine = MachineLoader::load_machine_from_string(FLIP).unwrap();
        assert_eq!(machine.input, "0");
    }

    #[test]
    fn test_load_machines_from_directory() {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "valid.rtm", FLIP);
        write_file(dir.path(), "invalid.rtm", "not a machine");
        write_file(dir.path(), "ignored.txt", FLIP);
        fs::create_dir(dir.path().join("nested.rtm")).unwrap();

        let results = MachineLoader::load_machines(dir.path());
        assert_eq!(results.len(), 2);

        let loaded: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].0.ends_with("valid.rtm"));
    }

    #[test]
    fn test_load_machines_missing_directory() {
        let results = MachineLoader::load_machines(Path::new("/nonexistent/rtm-machines"));

        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(RtmError::FileError(_))));
    }
}
