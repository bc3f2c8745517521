//! Path resolution against a backend folder tree.

use tracing::{debug, info, warn};

use super::{StorageError, StorageOptions, StoragePath, TempNameGenerator};
use crate::backend::HierarchicalStore;

/// Path-addressed view over a [`HierarchicalStore`].
///
/// Every call is a fresh sequence of backend requests: nothing is cached
/// between calls and multi-step operations are not transactional. Where the
/// backend holds several same-named entries, the first one it enumerates wins.
pub struct PathStorage<S> {
    store: S,
    options: StorageOptions,
    names: TempNameGenerator,
}

impl<S: HierarchicalStore> PathStorage<S> {
    pub fn new(store: S) -> Self {
        Self::with_options(store, StorageOptions::default())
    }

    /// Build a resolver with explicit options.
    ///
    /// A `temp_name_attempts` of zero is raised to one, so
    /// [`temp_file_name`](Self::temp_file_name) always checks at least one
    /// candidate.
    pub fn with_options(store: S, mut options: StorageOptions) -> Self {
        if options.temp_name_attempts == 0 {
            warn!("temp_name_attempts is 0, using 1");
            options.temp_name_attempts = 1;
        }
        let names = TempNameGenerator::new(options.temp_prefix.clone());
        Self {
            store,
            options,
            names,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &StorageOptions {
        &self.options
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Find the child folder `name` of `parent`.
    pub fn sub_folder(&self, parent: &S::Folder, name: &str) -> Result<S::Folder, StorageError> {
        self.store
            .folders_by_name(parent, name)?
            .next()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    /// Find the folder that directly contains the leaf of `path`.
    ///
    /// A single-segment path resolves to the root without any lookup.
    pub fn folder_for_file(&self, path: &str) -> Result<S::Folder, StorageError> {
        let path = StoragePath::parse(path)?;
        self.resolve_parent(&path)
    }

    /// Walk from the root through every segment of `path`, creating the
    /// folders that are missing, and return the last one.
    ///
    /// Existing folders are reused, so repeating a call creates nothing new.
    /// Two callers racing on the same path can still produce duplicates if the
    /// backend allows same-named siblings.
    pub fn create_folder_recursively(&self, path: &str) -> Result<S::Folder, StorageError> {
        let path = StoragePath::parse(path)?;

        let mut folder = self.store.root_folder()?;
        for name in path.segments() {
            let existing = self.store.folders_by_name(&folder, name)?.next();
            folder = match existing {
                Some(found) => found,
                None => {
                    info!("Creating folder {:?} under {:?}", name, folder);
                    self.store.create_folder(&folder, name)?
                }
            };
        }

        Ok(folder)
    }

    /// Find the file at `path`.
    pub fn file(&self, path: &str) -> Result<S::File, StorageError> {
        let path = StoragePath::parse(path)?;
        self.lookup_file(&path)
    }

    /// Find the file at `path` together with the folder that holds it.
    pub fn locate(&self, path: &str) -> Result<(S::Folder, S::File), StorageError> {
        let path = StoragePath::parse(path)?;
        let folder = self.resolve_parent(&path)?;
        let file = self.file_in(&folder, &path)?;
        Ok((folder, file))
    }

    /// Whether a file exists at `path`.
    ///
    /// A missing intermediate folder and a missing leaf both report `false`.
    /// Invalid paths and backend failures are still errors.
    pub fn file_exists(&self, path: &str) -> Result<bool, StorageError> {
        let path = StoragePath::parse(path)?;
        let folder = match self.resolve_parent(&path) {
            Ok(folder) => folder,
            Err(StorageError::NotFound(name)) => {
                debug!("Folder {:?} missing while checking {}", name, path);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        Ok(self.store.files_by_name(&folder, path.leaf())?.next().is_some())
    }

    /// Pick a name no root-level file currently has.
    ///
    /// Gives up with [`StorageError::ResourceExhausted`] after the configured
    /// number of attempts. The name is only free at the moment of the check.
    pub fn temp_file_name(&self) -> Result<String, StorageError> {
        let root = self.store.root_folder()?;

        for _ in 0..self.options.temp_name_attempts {
            let candidate = self.names.candidate();
            if self.store.files_by_name(&root, &candidate)?.next().is_none() {
                debug!("Random file name {}", candidate);
                return Ok(candidate);
            }
            debug!("Temp name {} already taken", candidate);
        }

        Err(StorageError::ResourceExhausted(
            self.options.temp_name_attempts,
        ))
    }

    /// Move the file at `from` so that it lives at `to`.
    ///
    /// The destination folder must already exist. The backend move and the
    /// rename are separate calls: if the rename fails, the file stays in the
    /// destination folder under its old name.
    pub fn move_file(&self, from: &str, to: &str) -> Result<S::File, StorageError> {
        let from = StoragePath::parse(from)?;
        let to = StoragePath::parse(to)?;

        let source = self.lookup_file(&from)?;
        let destination = self.resolve_parent(&to)?;
        let moved = self.store.move_to(source, &destination)?;
        let renamed = self.store.set_name(moved, to.leaf())?;

        info!("Moved {} to {}", from, to);
        Ok(renamed)
    }

    /// Create a file with `content` at `path`.
    ///
    /// The content is first written to a temporary root-level file and then
    /// moved into place with [`move_file`](Self::move_file). If anything fails
    /// after the write, the temporary file is left at the root.
    pub fn create_file(
        &self,
        path: &str,
        content: impl AsRef<[u8]>,
    ) -> Result<S::File, StorageError> {
        let target = StoragePath::parse(path)?;
        let temp_name = self.temp_file_name()?;

        let root = self.store.root_folder()?;
        self.store.create_file(&root, &temp_name, content.as_ref())?;

        self.move_file(&temp_name, target.as_str())
    }

    fn resolve_parent(&self, path: &StoragePath) -> Result<S::Folder, StorageError> {
        let mut folder = self.store.root_folder()?;
        for name in path.parents() {
            folder = self.sub_folder(&folder, name)?;
        }
        Ok(folder)
    }

    fn lookup_file(&self, path: &StoragePath) -> Result<S::File, StorageError> {
        let folder = self.resolve_parent(path)?;
        self.file_in(&folder, path)
    }

    fn file_in(&self, folder: &S::Folder, path: &StoragePath) -> Result<S::File, StorageError> {
        self.store
            .files_by_name(folder, path.leaf())?
            .next()
            .ok_or_else(|| StorageError::FileNotFound(path.to_string()))
    }
}
