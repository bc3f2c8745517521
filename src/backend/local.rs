//! Local filesystem backend.
//!
//! Folders and files are plain directories and files below a root directory.
//! A filesystem cannot hold two siblings with the same name, so every by-name
//! lookup yields at most one entry. Symbolic links are never followed: a link
//! is neither a folder nor a file, so lookups cannot leave the root through one.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{validate_name, BackendError, HierarchicalStore};

/// A backend rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open a store at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!("Opened local store at {:?}", root);
        Ok(Self { root })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root
    }

    fn entry(parent: &Path, name: &str, want_dir: bool) -> Result<Option<PathBuf>, BackendError> {
        validate_name(name)?;
        let candidate = parent.join(name);
        match fs::symlink_metadata(&candidate) {
            Ok(meta) if meta.file_type().is_symlink() => Ok(None),
            Ok(meta) if meta.is_dir() == want_dir => Ok(Some(candidate)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn ensure_vacant(path: &Path) -> Result<(), BackendError> {
        match fs::symlink_metadata(path) {
            Ok(_) => Err(BackendError::AlreadyExists(path.display().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name_of(path: &Path) -> Result<String, BackendError> {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| BackendError::StaleHandle(path.display().to_string()))
    }
}

impl HierarchicalStore for LocalStore {
    type Folder = PathBuf;
    type File = PathBuf;
    type Folders = std::option::IntoIter<PathBuf>;
    type Files = std::option::IntoIter<PathBuf>;

    fn root_folder(&self) -> Result<PathBuf, BackendError> {
        Ok(self.root.clone())
    }

    fn folders_by_name(&self, parent: &PathBuf, name: &str) -> Result<Self::Folders, BackendError> {
        Ok(Self::entry(parent, name, true)?.into_iter())
    }

    fn files_by_name(&self, parent: &PathBuf, name: &str) -> Result<Self::Files, BackendError> {
        Ok(Self::entry(parent, name, false)?.into_iter())
    }

    fn create_folder(&self, parent: &PathBuf, name: &str) -> Result<PathBuf, BackendError> {
        validate_name(name)?;
        let path = parent.join(name);
        match fs::create_dir(&path) {
            Ok(()) => Ok(path),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(BackendError::AlreadyExists(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn create_file(
        &self,
        parent: &PathBuf,
        name: &str,
        content: &[u8],
    ) -> Result<PathBuf, BackendError> {
        validate_name(name)?;
        let path = parent.join(name);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(BackendError::AlreadyExists(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(content)?;
        file.flush()?;
        Ok(path)
    }

    fn move_to(&self, file: PathBuf, folder: &PathBuf) -> Result<PathBuf, BackendError> {
        let target = folder.join(Self::name_of(&file)?);
        if target == file {
            return Ok(file);
        }
        Self::ensure_vacant(&target)?;
        fs::rename(&file, &target)?;
        Ok(target)
    }

    fn set_name(&self, file: PathBuf, name: &str) -> Result<PathBuf, BackendError> {
        validate_name(name)?;
        let target = file.with_file_name(name);
        if target == file {
            return Ok(file);
        }
        Self::ensure_vacant(&target)?;
        fs::rename(&file, &target)?;
        Ok(target)
    }

    fn folder_name(&self, folder: &PathBuf) -> Result<String, BackendError> {
        Self::name_of(folder)
    }

    fn file_name(&self, file: &PathBuf) -> Result<String, BackendError> {
        Self::name_of(file)
    }

    fn read_file(&self, file: &PathBuf) -> Result<Vec<u8>, BackendError> {
        Ok(fs::read(file)?)
    }

    fn file_size(&self, file: &PathBuf) -> Result<u64, BackendError> {
        Ok(fs::symlink_metadata(file)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{PathStorage, StorageError};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn test_store(temp_dir: &TempDir) -> LocalStore {
        LocalStore::open(temp_dir.path().join("drive")).unwrap()
    }

    #[test]
    fn test_open_creates_root() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        assert!(store.root_dir().is_dir());
        assert_eq!(store.root_folder().unwrap(), temp_dir.path().join("drive"));
    }

    #[test]
    fn test_lookup_distinguishes_files_and_folders() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let root = store.root_folder().unwrap();
        store.create_folder(&root, "docs").unwrap();
        store.create_file(&root, "notes.txt", b"hi").unwrap();

        assert_eq!(store.folders_by_name(&root, "docs").unwrap().count(), 1);
        assert_eq!(store.files_by_name(&root, "docs").unwrap().count(), 0);
        assert_eq!(store.files_by_name(&root, "notes.txt").unwrap().count(), 1);
        assert_eq!(store.folders_by_name(&root, "notes.txt").unwrap().count(), 0);
        assert_eq!(store.folders_by_name(&root, "missing").unwrap().count(), 0);
    }

    #[test]
    fn test_create_existing_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let root = store.root_folder().unwrap();
        store.create_folder(&root, "docs").unwrap();
        store.create_file(&root, "a.txt", b"").unwrap();

        assert!(matches!(
            store.create_folder(&root, "docs"),
            Err(BackendError::AlreadyExists(_))
        ));
        assert!(matches!(
            store.create_file(&root, "a.txt", b"again"),
            Err(BackendError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_move_then_rename() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let root = store.root_folder().unwrap();
        let docs = store.create_folder(&root, "docs").unwrap();
        let file = store.create_file(&root, "draft.txt", b"body").unwrap();

        let moved = store.move_to(file, &docs).unwrap();
        assert_eq!(moved, docs.join("draft.txt"));
        assert!(!root.join("draft.txt").exists());

        let renamed = store.set_name(moved, "final.txt").unwrap();
        assert_eq!(store.file_name(&renamed).unwrap(), "final.txt");
        assert_eq!(store.read_file(&renamed).unwrap(), b"body".to_vec());
    }

    #[test]
    fn test_move_refuses_to_clobber() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let root = store.root_folder().unwrap();
        let docs = store.create_folder(&root, "docs").unwrap();
        store.create_file(&docs, "a.txt", b"kept").unwrap();
        let file = store.create_file(&root, "a.txt", b"incoming").unwrap();

        assert!(matches!(
            store.move_to(file, &docs),
            Err(BackendError::AlreadyExists(_))
        ));
        assert_eq!(fs::read(docs.join("a.txt")).unwrap(), b"kept".to_vec());
    }

    #[test]
    fn test_lookup_rejects_path_like_names() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let root = store.root_folder().unwrap();

        assert!(matches!(
            store.folders_by_name(&root, ".."),
            Err(BackendError::InvalidName(_))
        ));
    }

    #[test]
    fn test_file_size_reads_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let root = store.root_folder().unwrap();
        let file = store.create_file(&root, "sized.bin", &[0u8; 42]).unwrap();

        assert_eq!(store.file_size(&file).unwrap(), 42);
    }

    #[cfg(unix)]
    #[test]
    fn test_lookup_does_not_follow_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let outside = temp_dir.path().join("outside");
        fs::create_dir(&outside).unwrap();
        fs::write(outside.join("secret.txt"), b"nope").unwrap();
        fs::write(temp_dir.path().join("loose.txt"), b"nope").unwrap();

        let store = test_store(&temp_dir);
        let root = store.root_folder().unwrap();
        std::os::unix::fs::symlink(&outside, root.join("escape")).unwrap();
        std::os::unix::fs::symlink(temp_dir.path().join("loose.txt"), root.join("link.txt"))
            .unwrap();

        assert_eq!(store.folders_by_name(&root, "escape").unwrap().count(), 0);
        assert_eq!(store.files_by_name(&root, "escape").unwrap().count(), 0);
        assert_eq!(store.files_by_name(&root, "link.txt").unwrap().count(), 0);

        let storage = PathStorage::new(store);
        assert!(!storage.file_exists("escape/secret.txt").unwrap());
        assert!(matches!(
            storage.file("escape/secret.txt"),
            Err(StorageError::NotFound(ref name)) if name == "escape"
        ));
    }

    fn root_entries(store: &LocalStore) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(store.root_dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_path_storage_scenario_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let store = test_store(&temp_dir);
        let root = store.root_folder().unwrap();
        let a = store.create_folder(&root, "A").unwrap();
        let b = store.create_folder(&a, "B").unwrap();
        let f = store.create_file(&b, "f.txt", b"contents").unwrap();
        let storage = PathStorage::new(store);

        assert_eq!(storage.file("A/B/f.txt").unwrap(), f);
        let err = storage.file("A/B/missing.txt").unwrap_err();
        assert!(matches!(err, StorageError::FileNotFound(_)));
        assert!(err.to_string().contains("A/B/missing.txt"));

        assert_eq!(storage.create_folder_recursively("A/B").unwrap(), b);
        assert_eq!(storage.create_folder_recursively("A/B").unwrap(), b);

        let d = storage.create_folder_recursively("A/C/D").unwrap();
        assert_eq!(d, a.join("C").join("D"));
        assert!(d.is_dir());

        assert!(storage.file_exists("A/B/f.txt").unwrap());
        assert!(!storage.file_exists("A/X/f.txt").unwrap());
        assert_eq!(storage.folder_for_file("f.txt").unwrap(), root);
        assert_eq!(storage.folder_for_file("A/B/f.txt").unwrap(), b);
    }

    #[test]
    fn test_path_storage_create_then_move_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let storage = PathStorage::new(test_store(&temp_dir));
        let root = storage.store().root_folder().unwrap();
        storage.create_folder_recursively("A/B").unwrap();

        let created = storage.create_file("A/B/f.txt", "content3").unwrap();
        assert_eq!(created, root.join("A").join("B").join("f.txt"));
        assert_eq!(fs::read(&created).unwrap(), b"content3".to_vec());
        assert_eq!(root_entries(storage.store()), vec!["A".to_string()]);

        let moved = storage.move_file("A/B/f.txt", "A/g.txt").unwrap();
        assert_eq!(moved, root.join("A").join("g.txt"));
        assert!(!created.exists());
        assert_eq!(storage.store().read_file(&moved).unwrap(), b"content3".to_vec());
        assert!(!storage.file_exists("A/B/f.txt").unwrap());
        assert!(storage.file_exists("A/g.txt").unwrap());

        assert!(root_entries(storage.store())
            .iter()
            .all(|name| !name.starts_with("__tmp_")));
    }

    #[test]
    fn test_path_storage_create_into_missing_folder_leaves_temp_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let storage = PathStorage::new(test_store(&temp_dir));

        assert!(matches!(
            storage.create_file("nowhere/f.txt", "x"),
            Err(StorageError::NotFound(_))
        ));

        let entries = root_entries(storage.store());
        assert_eq!(entries.len(), 1);
        assert!(entries[0].starts_with("__tmp_"));
    }
}
