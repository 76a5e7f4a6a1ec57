use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub path: Option<PathBuf>,
    #[serde(skip)]
    pub contents: Option<Arc<[u8]>>,
}

impl FileEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn content_type(mut self, value: impl Into<String>) -> Self {
        self.content_type = Some(value.into());
        self
    }

    pub fn path(mut self, value: impl Into<PathBuf>) -> Self {
        self.path = Some(value.into());
        self
    }

    pub fn contents(mut self, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        self.size = bytes.len() as u64;
        self.contents = Some(bytes);
        self
    }

    pub fn size(mut self, value: u64) -> Self {
        self.size = value;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct FileList(Arc<[FileEntry]>);

impl FileList {
    pub fn new(entries: impl IntoIterator<Item = FileEntry>) -> Self {
        Self(entries.into_iter().collect())
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|entry| entry.name.clone()).collect()
    }
}

impl Deref for FileList {
    type Target = [FileEntry];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for FileList {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

impl Eq for FileList {}

impl From<Vec<FileEntry>> for FileList {
    fn from(entries: Vec<FileEntry>) -> Self {
        Self(entries.into())
    }
}

impl FromIterator<FileEntry> for FileList {
    fn from_iter<I: IntoIterator<Item = FileEntry>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FileInputEvent {
    pub value: String,
    pub files: Option<FileList>,
}

impl FileInputEvent {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            files: None,
        }
    }

    pub fn with_files(mut self, files: impl Into<FileList>) -> Self {
        self.files = Some(files.into());
        self
    }
}
