use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::language::LanguageTag;
use crate::tree::{FileNode, FileNodeKind, NodeId};

static NEXT_TAB_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of one open tab. Reopening a closed file yields a new id.  
/// 分頁識別碼；重新開啟已關閉的檔案會取得新的識別碼。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(u64);

impl TabId {
    pub fn new() -> Self {
        Self(NEXT_TAB_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Makes sure ids handed out later never collide with `self`.
    fn reserve(self) {
        NEXT_TAB_ID.fetch_max(self.0.saturating_add(1), Ordering::Relaxed);
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab_{}", self.0)
    }
}

/// Which property of a file decides that a tab for it is already open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabIdentity {
    /// Display name only. Two `index.html` files in different folders share
    /// one tab under this policy.
    Name,
    #[default]
    Path,
    NodeId,
}

/// An open view onto a file: a detached copy of its content taken when the
/// tab was opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabEntry {
    pub id: TabId,
    pub node_id: NodeId,
    pub path: String,
    pub name: String,
    pub language: LanguageTag,
    pub content: String,
    pub modified: bool,
    pub active: bool,
}

impl TabEntry {
    fn open(node: &FileNode, language: &LanguageTag, content: &str) -> Self {
        Self {
            id: TabId::new(),
            node_id: node.id,
            path: node.path.clone(),
            name: node.name.clone(),
            language: language.clone(),
            content: content.to_string(),
            modified: false,
            active: true,
        }
    }

    fn shows(&self, node: &FileNode, identity: TabIdentity) -> bool {
        match identity {
            TabIdentity::Name => self.name == node.name,
            TabIdentity::Path => self.path == node.path,
            TabIdentity::NodeId => self.node_id == node.id,
        }
    }
}

/// Ordered list of open tabs. Exactly one tab is active whenever the list is
/// non-empty; the active tab is always read back from the entries.  
/// 已開啟分頁的有序清單；清單非空時恰有一個作用中分頁。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredSession")]
pub struct TabSession {
    tabs: Vec<TabEntry>,
    identity: TabIdentity,
}

/// Wire form of a [`TabSession`]; every load goes through [`TabSession::restore`].
#[derive(Deserialize)]
struct StoredSession {
    #[serde(default)]
    tabs: Vec<TabEntry>,
    #[serde(default)]
    identity: TabIdentity,
}

impl From<StoredSession> for TabSession {
    fn from(stored: StoredSession) -> Self {
        TabSession::restore(stored.tabs, stored.identity)
    }
}

impl TabSession {
    pub fn new(identity: TabIdentity) -> Self {
        Self {
            tabs: Vec::new(),
            identity,
        }
    }

    /// Rebuilds a session from tabs saved by a host.
    ///
    /// Restored ids are reserved so new tabs never reuse them, repeated ids
    /// are dropped, and exactly one tab ends up active: the first flagged
    /// one, otherwise the first tab.  
    /// 由主程式保存的分頁重建工作階段，並保留既有識別碼。
    pub fn restore(tabs: Vec<TabEntry>, identity: TabIdentity) -> Self {
        let mut seen = HashSet::new();
        let mut tabs: Vec<TabEntry> = tabs
            .into_iter()
            .filter(|tab| {
                let fresh = seen.insert(tab.id);
                if !fresh {
                    debug!(tab_id = %tab.id, "dropped repeated tab id on restore");
                }
                fresh
            })
            .collect();
        for tab in &tabs {
            tab.id.reserve();
        }
        let active = tabs.iter().position(|tab| tab.active).unwrap_or(0);
        for (index, tab) in tabs.iter_mut().enumerate() {
            tab.active = index == active;
        }
        debug!(tabs = tabs.len(), "restored tab session");
        Self { tabs, identity }
    }

    pub fn identity(&self) -> TabIdentity {
        self.identity
    }

    pub fn tabs(&self) -> &[TabEntry] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn get(&self, id: TabId) -> Option<&TabEntry> {
        self.tabs.iter().find(|tab| tab.id == id)
    }

    pub fn active(&self) -> Option<&TabEntry> {
        self.tabs.iter().find(|tab| tab.active)
    }

    pub fn active_id(&self) -> Option<TabId> {
        self.active().map(|tab| tab.id)
    }

    pub fn modified_count(&self) -> usize {
        self.tabs.iter().filter(|tab| tab.modified).count()
    }

    /// Opens `file`, or activates the tab already showing it. Folders are
    /// never opened. Returns the id of the tab that ends up active.
    pub fn select_file(&mut self, file: &FileNode) -> Option<TabId> {
        let FileNodeKind::File { language, content } = &file.kind else {
            debug!(path = %file.path, "folders do not open tabs");
            return None;
        };

        if let Some(existing) = self
            .tabs
            .iter()
            .find(|tab| tab.shows(file, self.identity))
            .map(|tab| tab.id)
        {
            self.activate(existing);
            return Some(existing);
        }

        for tab in &mut self.tabs {
            tab.active = false;
        }
        let entry = TabEntry::open(file, language, content);
        let id = entry.id;
        debug!(tab_id = %id, path = %file.path, "opened tab");
        self.tabs.push(entry);
        Some(id)
    }

    /// Makes `id` the only active tab. Unknown ids change nothing.
    pub fn activate(&mut self, id: TabId) {
        if self.get(id).is_none() {
            debug!(tab_id = %id, "activate ignored; no such tab");
            return;
        }
        for tab in &mut self.tabs {
            tab.active = tab.id == id;
        }
    }

    /// Removes `id`. When the active tab goes away the first remaining tab
    /// becomes active.
    pub fn close(&mut self, id: TabId) {
        let Some(index) = self.tabs.iter().position(|tab| tab.id == id) else {
            debug!(tab_id = %id, "close ignored; no such tab");
            return;
        };
        let removed = self.tabs.remove(index);
        debug!(tab_id = %id, remaining = self.tabs.len(), "closed tab");
        if removed.active {
            if let Some(first) = self.tabs.first_mut() {
                first.active = true;
            }
        }
    }

    /// Replaces the working copy of `id` and marks it modified.
    pub fn edit(&mut self, id: TabId, content: impl Into<String>) {
        let Some(tab) = self.tabs.iter_mut().find(|tab| tab.id == id) else {
            debug!(tab_id = %id, "edit ignored; no such tab");
            return;
        };
        tab.content = content.into();
        tab.modified = true;
    }
}
