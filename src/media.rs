//! Filename-keyed index of extracted media files.
//!
//! Exports ship attachments as loose files next to the chat text. Extracting
//! them is someone else's job; this index only maps each file's lower-cased
//! name to the URI where it ended up, so messages can be linked to it.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::parsing::media_key;

/// Lower-cased filename → media URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaIndex {
    entries: HashMap<String, String>,
}

impl MediaIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records where `filename` was extracted to.
    pub fn insert(&mut self, filename: &str, uri: impl Into<String>) {
        self.entries.insert(media_key(filename), uri.into());
    }

    /// Looks up a filename, ignoring case.
    pub fn resolve(&self, filename: &str) -> Option<&str> {
        self.entries.get(&media_key(filename)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indexes every file under `dir`, recursively, by its file name.
    ///
    /// The URI is the file's path. When two files share a name the one
    /// visited last wins.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut index = Self::new();
        index.scan(dir.as_ref())?;
        Ok(index)
    }

    fn scan(&mut self, dir: &Path) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                self.scan(&path)?;
            } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                self.insert(name, path.to_string_lossy());
            }
        }
        Ok(())
    }
}

impl<S: AsRef<str>, U: Into<String>> FromIterator<(S, U)> for MediaIndex {
    fn from_iter<I: IntoIterator<Item = (S, U)>>(iter: I) -> Self {
        let mut index = Self::new();
        for (name, uri) in iter {
            index.insert(name.as_ref(), uri);
        }
        index
    }
}
