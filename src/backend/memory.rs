//! In-memory backend.
//!
//! Children keep insertion order and duplicate names are allowed, so lookups
//! by name can yield more than one entry. Every trait call is counted, and a
//! single failure can be armed per operation to exercise error paths.

use parking_lot::Mutex;
use tracing::debug;

use super::{validate_name, BackendError, HierarchicalStore};

/// Handle to a folder in a [`MemoryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FolderId(usize);

/// Handle to a file in a [`MemoryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(usize);

/// Backend operations that can be made to fail once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    RootFolder,
    FoldersByName,
    FilesByName,
    CreateFolder,
    CreateFile,
    MoveTo,
    SetName,
}

impl Operation {
    fn label(&self) -> &'static str {
        match self {
            Operation::RootFolder => "root_folder",
            Operation::FoldersByName => "folders_by_name",
            Operation::FilesByName => "files_by_name",
            Operation::CreateFolder => "create_folder",
            Operation::CreateFile => "create_file",
            Operation::MoveTo => "move_to",
            Operation::SetName => "set_name",
        }
    }
}

/// Call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub folder_lookups: usize,
    pub file_lookups: usize,
    pub folders_created: usize,
    pub files_created: usize,
    pub moves: usize,
    pub renames: usize,
}

#[derive(Debug)]
struct FolderNode {
    name: String,
    folders: Vec<FolderId>,
    files: Vec<FileId>,
}

#[derive(Debug)]
struct FileNode {
    name: String,
    parent: FolderId,
    content: Vec<u8>,
}

#[derive(Debug)]
struct Tree {
    folders: Vec<FolderNode>,
    files: Vec<FileNode>,
    stats: StoreStats,
    armed: Vec<Operation>,
}

impl Tree {
    fn folder(&self, id: FolderId) -> Result<&FolderNode, BackendError> {
        self.folders
            .get(id.0)
            .ok_or_else(|| BackendError::StaleHandle(format!("{:?}", id)))
    }

    fn folder_mut(&mut self, id: FolderId) -> Result<&mut FolderNode, BackendError> {
        self.folders
            .get_mut(id.0)
            .ok_or_else(|| BackendError::StaleHandle(format!("{:?}", id)))
    }

    fn file(&self, id: FileId) -> Result<&FileNode, BackendError> {
        self.files
            .get(id.0)
            .ok_or_else(|| BackendError::StaleHandle(format!("{:?}", id)))
    }

    fn file_mut(&mut self, id: FileId) -> Result<&mut FileNode, BackendError> {
        self.files
            .get_mut(id.0)
            .ok_or_else(|| BackendError::StaleHandle(format!("{:?}", id)))
    }

    /// Consume an armed failure for `op`, if any.
    fn trip(&mut self, op: Operation) -> Result<(), BackendError> {
        if let Some(pos) = self.armed.iter().position(|armed| *armed == op) {
            self.armed.remove(pos);
            debug!("Injected failure for {}", op.label());
            return Err(BackendError::Unavailable(format!(
                "injected failure: {}",
                op.label()
            )));
        }
        Ok(())
    }
}

/// A folder tree held entirely in memory.
#[derive(Debug)]
pub struct MemoryStore {
    tree: Mutex<Tree>,
}

impl MemoryStore {
    /// Create a store holding only an empty root folder named `root`.
    pub fn new() -> Self {
        Self {
            tree: Mutex::new(Tree {
                folders: vec![FolderNode {
                    name: "root".to_string(),
                    folders: Vec::new(),
                    files: Vec::new(),
                }],
                files: Vec::new(),
                stats: StoreStats::default(),
                armed: Vec::new(),
            }),
        }
    }

    pub fn root(&self) -> FolderId {
        FolderId(0)
    }

    pub fn stats(&self) -> StoreStats {
        self.tree.lock().stats
    }

    pub fn reset_stats(&self) {
        self.tree.lock().stats = StoreStats::default();
    }

    /// Make the next call of `op` fail with [`BackendError::Unavailable`].
    pub fn fail_next(&self, op: Operation) {
        self.tree.lock().armed.push(op);
    }

    /// Child folders of `folder`, in creation order.
    pub fn list_folders(&self, folder: FolderId) -> Result<Vec<FolderId>, BackendError> {
        Ok(self.tree.lock().folder(folder)?.folders.clone())
    }

    /// Files directly inside `folder`, in the order they arrived there.
    pub fn list_files(&self, folder: FolderId) -> Result<Vec<FileId>, BackendError> {
        Ok(self.tree.lock().folder(folder)?.files.clone())
    }

    /// The folder currently containing `file`.
    pub fn parent_of(&self, file: FileId) -> Result<FolderId, BackendError> {
        Ok(self.tree.lock().file(file)?.parent)
    }

    /// Total number of folders, root included.
    pub fn folder_count(&self) -> usize {
        self.tree.lock().folders.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchicalStore for MemoryStore {
    type Folder = FolderId;
    type File = FileId;
    type Folders = std::vec::IntoIter<FolderId>;
    type Files = std::vec::IntoIter<FileId>;

    fn root_folder(&self) -> Result<FolderId, BackendError> {
        self.tree.lock().trip(Operation::RootFolder)?;
        Ok(self.root())
    }

    fn folders_by_name(
        &self,
        parent: &FolderId,
        name: &str,
    ) -> Result<Self::Folders, BackendError> {
        let mut tree = self.tree.lock();
        tree.trip(Operation::FoldersByName)?;
        tree.stats.folder_lookups += 1;

        let node = tree.folder(*parent)?;
        let matches: Vec<FolderId> = node
            .folders
            .iter()
            .copied()
            .filter(|id| tree.folders[id.0].name == name)
            .collect();
        Ok(matches.into_iter())
    }

    fn files_by_name(&self, parent: &FolderId, name: &str) -> Result<Self::Files, BackendError> {
        let mut tree = self.tree.lock();
        tree.trip(Operation::FilesByName)?;
        tree.stats.file_lookups += 1;

        let node = tree.folder(*parent)?;
        let matches: Vec<FileId> = node
            .files
            .iter()
            .copied()
            .filter(|id| tree.files[id.0].name == name)
            .collect();
        Ok(matches.into_iter())
    }

    fn create_folder(&self, parent: &FolderId, name: &str) -> Result<FolderId, BackendError> {
        validate_name(name)?;
        let mut tree = self.tree.lock();
        tree.trip(Operation::CreateFolder)?;
        tree.folder(*parent)?;

        let id = FolderId(tree.folders.len());
        tree.folders.push(FolderNode {
            name: name.to_string(),
            folders: Vec::new(),
            files: Vec::new(),
        });
        tree.folder_mut(*parent)?.folders.push(id);
        tree.stats.folders_created += 1;
        Ok(id)
    }

    fn create_file(
        &self,
        parent: &FolderId,
        name: &str,
        content: &[u8],
    ) -> Result<FileId, BackendError> {
        validate_name(name)?;
        let mut tree = self.tree.lock();
        tree.trip(Operation::CreateFile)?;
        tree.folder(*parent)?;

        let id = FileId(tree.files.len());
        tree.files.push(FileNode {
            name: name.to_string(),
            parent: *parent,
            content: content.to_vec(),
        });
        tree.folder_mut(*parent)?.files.push(id);
        tree.stats.files_created += 1;
        Ok(id)
    }

    fn move_to(&self, file: FileId, folder: &FolderId) -> Result<FileId, BackendError> {
        let mut tree = self.tree.lock();
        tree.trip(Operation::MoveTo)?;
        tree.folder(*folder)?;

        let from = tree.file(file)?.parent;
        tree.folder_mut(from)?.files.retain(|id| *id != file);
        tree.folder_mut(*folder)?.files.push(file);
        tree.file_mut(file)?.parent = *folder;
        tree.stats.moves += 1;
        Ok(file)
    }

    fn set_name(&self, file: FileId, name: &str) -> Result<FileId, BackendError> {
        validate_name(name)?;
        let mut tree = self.tree.lock();
        tree.trip(Operation::SetName)?;

        tree.file_mut(file)?.name = name.to_string();
        tree.stats.renames += 1;
        Ok(file)
    }

    fn folder_name(&self, folder: &FolderId) -> Result<String, BackendError> {
        Ok(self.tree.lock().folder(*folder)?.name.clone())
    }

    fn file_name(&self, file: &FileId) -> Result<String, BackendError> {
        Ok(self.tree.lock().file(*file)?.name.clone())
    }

    fn read_file(&self, file: &FileId) -> Result<Vec<u8>, BackendError> {
        Ok(self.tree.lock().file(*file)?.content.clone())
    }

    fn file_size(&self, file: &FileId) -> Result<u64, BackendError> {
        Ok(self.tree.lock().file(*file)?.content.len() as u64)
    }
}
