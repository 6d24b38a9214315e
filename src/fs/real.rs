use super::{DirEntry, FileSystem, FileType};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).context(format!("Failed to read file {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let entries = fs::read_dir(path).context(format!("Failed to read directory {:?}", path))?;

        let mut result = Vec::new();
        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            let file_type = if path.is_dir() {
                FileType::Directory
            } else if path.is_file() {
                FileType::File
            } else {
                FileType::Other
            };

            result.push(DirEntry {
                path,
                name,
                file_type,
            });
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_apps_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let base = dir.path();

        fs::create_dir_all(base.join("radarr/ci")).unwrap();
        fs::write(base.join("radarr/ci/metadata.yaml"), "app: radarr\n").unwrap();
        fs::write(base.join("radarr/Dockerfile"), "FROM scratch\n").unwrap();
        fs::write(base.join("README.md"), "apps").unwrap();

        dir
    }

    #[test]
    fn test_exists_and_kinds() {
        let temp = create_apps_tree();
        let fs = RealFileSystem::new();

        assert!(fs.exists(&temp.path().join("radarr")));
        assert!(fs.is_dir(&temp.path().join("radarr")));
        assert!(fs.is_file(&temp.path().join("radarr/Dockerfile")));
        assert!(!fs.is_file(&temp.path().join("radarr/ci")));
        assert!(!fs.exists(&temp.path().join("sonarr")));
    }

    #[test]
    fn test_read_to_string() {
        let temp = create_apps_tree();
        let fs = RealFileSystem::new();

        let content = fs
            .read_to_string(&temp.path().join("radarr/ci/metadata.yaml"))
            .unwrap();
        assert_eq!(content, "app: radarr\n");
    }

    #[test]
    fn test_read_to_string_missing_file_mentions_path() {
        let temp = create_apps_tree();
        let fs = RealFileSystem::new();

        let err = fs
            .read_to_string(&temp.path().join("sonarr/ci/metadata.yaml"))
            .unwrap_err();
        assert!(err.to_string().contains("sonarr"));
    }

    #[test]
    fn test_read_dir_reports_types() {
        let temp = create_apps_tree();
        let fs = RealFileSystem::new();

        let entries = fs.read_dir(temp.path()).unwrap();
        let radarr = entries.iter().find(|e| e.file_name() == "radarr").unwrap();
        let readme = entries.iter().find(|e| e.file_name() == "README.md").unwrap();

        assert!(radarr.is_dir());
        assert_eq!(readme.file_type, FileType::File);
    }

    #[test]
    fn test_read_dir_missing_directory_fails() {
        let fs = RealFileSystem::new();
        assert!(fs.read_dir(Path::new("/nonexistent/apps/12345")).is_err());
    }
}
