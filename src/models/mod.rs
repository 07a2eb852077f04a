//! The course structure tree and its JSON snapshot encoding.
//!
//! A snapshot is a single JSON document. Every object carries a `node_type`
//! discriminant (`directory`, `file` or `link`) next to its own fields, and
//! directories nest their children in document order:
//!
//! ```json
//! {
//!   "node_type": "directory",
//!   "name": "Week 1",
//!   "description": null,
//!   "children": [
//!     { "node_type": "file", "name": "Slides", "description": null, "file": "Week 1/slides.pdf" },
//!     { "node_type": "link", "name": "External", "description": null, "url": "https://example.com/" }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{CmsError, Result};

/// File name of the snapshot written at every course root.
pub const SNAPSHOT_FILE: &str = "course_structure.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "node_type", rename_all = "lowercase")]
pub enum Node {
    Directory(Directory),
    File(File),
    Link(Link),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Directory,
    File,
    Link,
}

/// A module: a real directory on disk holding its children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub children: Vec<Node>,
}

/// A downloaded resource. `file` points at where the bytes were written;
/// nothing guarantees they are still there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub file: PathBuf,
}

/// An external reference, kept as an absolute URL and never fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: Url,
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Directory(d) => &d.name,
            Node::File(f) => &f.name,
            Node::Link(l) => &l.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Node::Directory(d) => d.description.as_deref(),
            Node::File(f) => f.description.as_deref(),
            Node::Link(l) => l.description.as_deref(),
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Directory(_) => NodeType::Directory,
            Node::File(_) => NodeType::File,
            Node::Link(_) => NodeType::Link,
        }
    }

    /// Encode this node and its whole subtree as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode a node, reconstructing the exact variant named by `node_type`.
    ///
    /// A missing or unknown discriminant, a missing field or a relative
    /// `url` is a [`CmsError::Schema`].
    pub fn from_json(text: &str) -> Result<Node> {
        serde_json::from_str(text).map_err(|e| CmsError::Schema(e.to_string()))
    }

    /// Write the snapshot to `path`, replacing any previous one.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;
        debug!(path = %path.display(), "Saved snapshot");
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Node> {
        let text = fs::read_to_string(path)?;
        Node::from_json(&text)
    }
}

impl Directory {
    pub fn new(name: impl Into<String>, description: Option<String>, children: Vec<Node>) -> Self {
        Self {
            name: name.into(),
            description,
            children,
        }
    }
}

impl From<Directory> for Node {
    fn from(dir: Directory) -> Self {
        Node::Directory(dir)
    }
}

impl From<File> for Node {
    fn from(file: File) -> Self {
        Node::File(file)
    }
}

impl From<Link> for Node {
    fn from(link: Link) -> Self {
        Node::Link(link)
    }
}
