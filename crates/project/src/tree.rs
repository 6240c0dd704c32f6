use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::expansion::ExpansionSet;
use crate::language::LanguageTag;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier assigned to each node in the file tree.  
/// 檔案樹中每個節點的唯一識別碼。
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    pub fn new() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Makes sure ids handed out later never collide with `self`.
    fn reserve(self) {
        NEXT_NODE_ID.fetch_max(self.0.saturating_add(1), Ordering::Relaxed);
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Payload that distinguishes files from folders.  
/// 區分檔案與資料夾的節點內容。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileNodeKind {
    File {
        #[serde(default)]
        language: LanguageTag,
        #[serde(default)]
        content: String,
    },
    Folder {
        #[serde(default)]
        children: Vec<Arc<FileNode>>,
    },
}

/// Immutable node stored inside the tree. Children are shared between
/// successive tree revisions whenever a mutation leaves them untouched.  
/// 樹中的不可變節點；未變動的子節點在各版本間共用。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub id: NodeId,
    pub name: String,
    pub path: String,
    #[serde(flatten)]
    pub kind: FileNodeKind,
}

impl FileNode {
    pub fn file(
        name: impl Into<String>,
        path: impl Into<String>,
        language: LanguageTag,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            path: path.into(),
            kind: FileNodeKind::File {
                language,
                content: content.into(),
            },
        }
    }

    pub fn folder(
        name: impl Into<String>,
        path: impl Into<String>,
        children: impl IntoIterator<Item = FileNode>,
    ) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            path: path.into(),
            kind: FileNodeKind::Folder {
                children: children.into_iter().map(Arc::new).collect(),
            },
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, FileNodeKind::Folder { .. })
    }

    pub fn is_file(&self) -> bool {
        !self.is_folder()
    }

    pub fn language(&self) -> Option<&LanguageTag> {
        match &self.kind {
            FileNodeKind::File { language, .. } => Some(language),
            FileNodeKind::Folder { .. } => None,
        }
    }

    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            FileNodeKind::File { content, .. } => Some(content),
            FileNodeKind::Folder { .. } => None,
        }
    }

    /// Children in display order; always empty for files.
    pub fn children(&self) -> &[Arc<FileNode>] {
        match &self.kind {
            FileNodeKind::Folder { children } => children,
            FileNodeKind::File { .. } => &[],
        }
    }

    fn with_children(&self, children: Vec<Arc<FileNode>>) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            path: self.path.clone(),
            kind: FileNodeKind::Folder { children },
        }
    }
}

/// Names and language used when synthesising new nodes.  
/// 建立新節點時使用的預設名稱與語言。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDefaults {
    pub file_name: String,
    pub folder_name: String,
    pub language: LanguageTag,
}

impl Default for NodeDefaults {
    fn default() -> Self {
        Self {
            file_name: "newfile.txt".to_string(),
            folder_name: "New Folder".to_string(),
            language: LanguageTag::TEXT,
        }
    }
}

impl NodeDefaults {
    pub fn file_draft(&self) -> NodeDraft {
        NodeDraft::file(self.file_name.clone()).with_language(self.language.clone())
    }

    pub fn folder_draft(&self) -> NodeDraft {
        NodeDraft::folder(self.folder_name.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum DraftKind {
    File {
        #[serde(default)]
        language: Option<LanguageTag>,
        #[serde(default)]
        content: String,
    },
    Folder,
}

/// A node that has not been placed in the tree yet. Its id and path are
/// assigned when it is inserted under a parent folder.  
/// 尚未放入樹中的節點草稿。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDraft {
    name: String,
    #[serde(flatten)]
    kind: DraftKind,
}

impl NodeDraft {
    /// File draft; the language is inferred from the extension unless set.
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DraftKind::File {
                language: None,
                content: String::new(),
            },
        }
    }

    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DraftKind::Folder,
        }
    }

    pub fn with_language(mut self, tag: LanguageTag) -> Self {
        if let DraftKind::File { language, .. } = &mut self.kind {
            *language = Some(tag);
        }
        self
    }

    pub fn with_content(mut self, text: impl Into<String>) -> Self {
        if let DraftKind::File { content, .. } = &mut self.kind {
            *content = text.into();
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, DraftKind::Folder)
    }

    fn build(self, parent: &FileNode) -> Option<FileNode> {
        let base = self.name.trim();
        if base.is_empty() || base.contains('/') {
            return None;
        }
        let taken: HashSet<&str> = parent
            .children()
            .iter()
            .map(|child| child.path.as_str())
            .collect();

        let mut attempt = 1usize;
        loop {
            let name = if attempt == 1 {
                base.to_string()
            } else {
                numbered_name(base, attempt, self.is_folder())
            };
            let path = match self.kind {
                DraftKind::File { .. } => format!("{}{}", parent.path, name),
                DraftKind::Folder => format!("{}{}/", parent.path, name.replace(' ', "")),
            };
            if !taken.contains(path.as_str()) {
                return Some(self.into_node(name, path));
            }
            attempt += 1;
        }
    }

    fn into_node(self, name: String, path: String) -> FileNode {
        match self.kind {
            DraftKind::File { language, content } => {
                let language = language
                    .or_else(|| LanguageTag::from_file_name(&name))
                    .unwrap_or_default();
                FileNode::file(name, path, language, content)
            }
            DraftKind::Folder => FileNode::folder(name, path, Vec::new()),
        }
    }
}

/// `newfile.txt` -> `newfile-2.txt`, `New Folder` -> `New Folder 2`.
fn numbered_name(base: &str, n: usize, folder: bool) -> String {
    if folder {
        return format!("{base} {n}");
    }
    match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{n}.{ext}"),
        _ => format!("{base}-{n}"),
    }
}

/// Records which nodes a mutation touched.  
/// 紀錄一次變動影響的節點。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTreeDiff {
    pub added: Vec<NodeId>,
    /// Folders rebuilt by the mutation, innermost first.
    pub updated: Vec<NodeId>,
}

impl FileTreeDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty()
    }
}

/// Violations reported by [`FileTree::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeInvariantError {
    #[error("root node {0} is not a folder")]
    RootNotFolder(String),
    #[error("path {0} appears more than once")]
    DuplicatePath(String),
    #[error("folder path {0} does not end with '/'")]
    FolderPathWithoutSlash(String),
    #[error("path {child} is not nested under parent {parent}")]
    DetachedPath { parent: String, child: String },
}

/// Row of the flattened tree produced by [`FileTree::visible_rows`].  
/// 攤平樹狀檢視中的一列。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeRow<'a> {
    pub depth: usize,
    pub node: &'a FileNode,
    pub expanded: bool,
}

/// Persistent file tree. Every mutation returns a new tree; the receiver is
/// left untouched and shares unchanged subtrees with the result.  
/// 持久化檔案樹：每次變動回傳新樹，未變動的子樹與舊版本共用。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileTree {
    revision: u64,
    root: Arc<FileNode>,
}

impl FileTree {
    /// Wraps an existing root folder (for example one restored by a host).
    pub fn from_root(root: FileNode) -> Self {
        let tree = Self {
            revision: 0,
            root: Arc::new(root),
        };
        for node in tree.iter() {
            node.id.reserve();
        }
        tree
    }

    /// Constructs a tree with an empty root folder at `/`.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::from_root(FileNode::folder(name, "/", Vec::new()))
    }

    pub fn root(&self) -> &FileNode {
        &self.root
    }

    /// Shared handle to the root, for hosts doing pointer-equality change detection.
    pub fn root_arc(&self) -> &Arc<FileNode> {
        &self.root
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Pre-order depth-first lookup; the first node with `path` wins.  
    /// 以前序深度優先搜尋路徑，回傳第一個符合的節點。
    pub fn find_by_path(&self, path: &str) -> Option<&FileNode> {
        self.iter().find(|node| node.path == path)
    }

    /// Finds a node by identifier.
    pub fn find(&self, id: NodeId) -> Option<&FileNode> {
        self.iter().find(|node| node.id == id)
    }

    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            stack: vec![self.root.as_ref()],
        }
    }

    /// Appends `node` to the first folder (pre-order) whose path equals
    /// `parent_path`. When no such folder exists the tree is returned as is.
    pub fn insert_under(&self, parent_path: &str, node: FileNode) -> (Self, FileTreeDiff) {
        let mut diff = FileTreeDiff::default();
        let node_id = node.id;
        let child = Arc::new(node);
        match insert_recursive(&self.root, parent_path, &child, &mut diff) {
            Some(root) => {
                diff.added.push(node_id);
                let next = Self {
                    revision: self.revision.wrapping_add(1),
                    root,
                };
                debug!(
                    parent = parent_path,
                    path = %child.path,
                    revision = next.revision,
                    "inserted node"
                );
                (next, diff)
            }
            None => {
                debug!(parent = parent_path, "no folder matches parent path; insert ignored");
                (self.clone(), FileTreeDiff::default())
            }
        }
    }

    /// Creates a file named after `defaults.file_name` under `parent_path`.
    pub fn create_file(&self, parent_path: &str, defaults: &NodeDefaults) -> (Self, FileTreeDiff) {
        self.create_named(parent_path, defaults.file_draft())
    }

    /// Creates an empty folder named after `defaults.folder_name` under `parent_path`.
    pub fn create_folder(
        &self,
        parent_path: &str,
        defaults: &NodeDefaults,
    ) -> (Self, FileTreeDiff) {
        self.create_named(parent_path, defaults.folder_draft())
    }

    /// Places `draft` under `parent_path`. Sibling names may repeat, but a
    /// numeric suffix is added when the synthesised path is already taken.
    /// Blank names and unknown parents leave the tree unchanged.
    pub fn create_named(&self, parent_path: &str, draft: NodeDraft) -> (Self, FileTreeDiff) {
        let Some(parent) = self.find_folder(parent_path) else {
            debug!(parent = parent_path, "no folder matches parent path; create ignored");
            return (self.clone(), FileTreeDiff::default());
        };
        let requested = draft.name().to_string();
        let Some(node) = draft.build(parent) else {
            debug!(parent = parent_path, name = %requested, "rejected node name");
            return (self.clone(), FileTreeDiff::default());
        };
        self.insert_under(parent_path, node)
    }

    /// Flattens the tree for display, descending only into expanded folders.
    pub fn visible_rows(&self, expansion: &ExpansionSet) -> Vec<TreeRow<'_>> {
        let mut rows = Vec::new();
        collect_rows(&self.root, 0, expansion, &mut rows);
        rows
    }

    /// Checks the structural invariants that mutations assume.
    pub fn validate(&self) -> Result<(), TreeInvariantError> {
        if !self.root.is_folder() {
            return Err(TreeInvariantError::RootNotFolder(self.root.path.clone()));
        }
        let mut seen = HashSet::new();
        validate_recursive(&self.root, &mut seen)
    }

    fn find_folder(&self, path: &str) -> Option<&FileNode> {
        self.iter().find(|node| node.is_folder() && node.path == path)
    }
}

/// Pre-order iterator over every node of a [`FileTree`].
pub struct PreOrder<'a> {
    stack: Vec<&'a FileNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a FileNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack
            .extend(node.children().iter().rev().map(|child| child.as_ref()));
        Some(node)
    }
}

fn insert_recursive(
    current: &Arc<FileNode>,
    parent_path: &str,
    new_child: &Arc<FileNode>,
    diff: &mut FileTreeDiff,
) -> Option<Arc<FileNode>> {
    let FileNodeKind::Folder { children } = &current.kind else {
        return None;
    };

    if current.path == parent_path {
        let mut next = children.clone();
        next.push(Arc::clone(new_child));
        diff.updated.push(current.id);
        return Some(Arc::new(current.with_children(next)));
    }

    for (index, child) in children.iter().enumerate() {
        if let Some(rebuilt) = insert_recursive(child, parent_path, new_child, diff) {
            let mut next = children.clone();
            next[index] = rebuilt;
            diff.updated.push(current.id);
            return Some(Arc::new(current.with_children(next)));
        }
    }
    None
}

fn collect_rows<'a>(
    node: &'a FileNode,
    depth: usize,
    expansion: &ExpansionSet,
    rows: &mut Vec<TreeRow<'a>>,
) {
    let expanded = node.is_folder() && expansion.contains(node.id);
    rows.push(TreeRow {
        depth,
        node,
        expanded,
    });
    if expanded {
        for child in node.children() {
            collect_rows(child, depth + 1, expansion, rows);
        }
    }
}

fn validate_recursive<'a>(
    node: &'a FileNode,
    seen: &mut HashSet<&'a str>,
) -> Result<(), TreeInvariantError> {
    if !seen.insert(node.path.as_str()) {
        return Err(TreeInvariantError::DuplicatePath(node.path.clone()));
    }
    if node.is_folder() && !node.path.ends_with('/') {
        return Err(TreeInvariantError::FolderPathWithoutSlash(node.path.clone()));
    }
    for child in node.children() {
        if !child.path.starts_with(&node.path) || child.path.len() <= node.path.len() {
            return Err(TreeInvariantError::DetachedPath {
                parent: node.path.clone(),
                child: child.path.clone(),
            });
        }
        validate_recursive(child, seen)?;
    }
    Ok(())
}
