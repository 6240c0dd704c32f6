use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::expansion::ExpansionSet;
use crate::language::LanguageTag;
use crate::seed;
use crate::session::{TabEntry, TabId, TabIdentity, TabSession};
use crate::tree::{FileNode, FileTree, FileTreeDiff, NodeDefaults, NodeDraft, NodeId};

/// Host-tunable behaviour of a [`Workspace`].  
/// 主程式可調整的工作區行為。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceOptions {
    #[serde(default)]
    pub defaults: NodeDefaults,
    #[serde(default)]
    pub tab_identity: TabIdentity,
    #[serde(default = "default_true")]
    pub open_seed_tab: bool,
}

fn default_true() -> bool {
    true
}

impl Default for WorkspaceOptions {
    fn default() -> Self {
        Self {
            defaults: NodeDefaults::default(),
            tab_identity: TabIdentity::default(),
            open_seed_tab: true,
        }
    }
}

/// Refers to a node either by id or by path.  
/// 以識別碼或路徑指向節點。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeRef {
    Id(NodeId),
    Path(String),
}

/// Refers to a tab either by id or by the path of the file it shows.  
/// 以識別碼或檔案路徑指向分頁。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TabRef {
    Id(TabId),
    Path(String),
}

/// One user action, as delivered by the host.  
/// 由主程式傳入的單一使用者操作。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    SelectFile { file: NodeRef },
    CreateFile { parent: String },
    CreateFolder { parent: String },
    CreateNamed { parent: String, draft: NodeDraft },
    ToggleExpansion { folder: NodeRef },
    ActivateTab { tab: TabRef },
    CloseTab { tab: TabRef },
    EditTab { tab: TabRef, content: String },
}

impl Command {
    /// Parses a JSON array of commands.
    pub fn parse_script(json: &str) -> Result<Vec<Command>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// What the status bar shows for the current session.  
/// 狀態列針對目前工作階段顯示的內容。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub active_name: Option<String>,
    pub language: LanguageTag,
    pub open_tabs: usize,
    pub modified_tabs: usize,
    pub no_file_open: bool,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.active_name {
            Some(name) => write!(f, "{name} [{}]", self.language)?,
            None => write!(f, "No file open [{}]", self.language)?,
        }
        write!(
            f,
            " | {} open, {} modified",
            self.open_tabs, self.modified_tabs
        )
    }
}

/// Serializable view of the whole workspace at one point in time.  
/// 某一時間點整個工作區的可序列化檢視。
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceSnapshot<'a> {
    pub revision: u64,
    pub root: &'a FileNode,
    pub expanded: &'a ExpansionSet,
    pub tabs: &'a [TabEntry],
    pub active_tab: Option<TabId>,
    pub status: StatusLine,
}

/// File tree, folder expansion and open tabs of one editing session.
///
/// Commands run to completion through `&mut self`, so observers never see a
/// half-applied command; cloning yields a consistent snapshot.  
/// 單一編輯工作階段的檔案樹、資料夾展開狀態與分頁。
#[derive(Debug, Clone)]
pub struct Workspace {
    tree: FileTree,
    expansion: ExpansionSet,
    tabs: TabSession,
    defaults: NodeDefaults,
}

impl Workspace {
    /// Workspace over `tree` with no open tabs and every folder collapsed.
    pub fn new(tree: FileTree, options: WorkspaceOptions) -> Self {
        Self {
            tree,
            expansion: ExpansionSet::new(),
            tabs: TabSession::new(options.tab_identity),
            defaults: options.defaults,
        }
    }

    /// Workspace over the reference project, optionally with `index.html` open.
    pub fn seeded(options: WorkspaceOptions) -> Self {
        let open_seed_tab = options.open_seed_tab;
        let mut workspace = Self::new(seed::project_tree(), options);
        if open_seed_tab {
            workspace.select_path(seed::SEED_TAB_PATH);
        }
        workspace
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn expansion(&self) -> &ExpansionSet {
        &self.expansion
    }

    pub fn tabs(&self) -> &TabSession {
        &self.tabs
    }

    pub fn defaults(&self) -> &NodeDefaults {
        &self.defaults
    }

    pub fn active_tab_id(&self) -> Option<TabId> {
        self.tabs.active_id()
    }

    pub fn active_tab(&self) -> Option<&TabEntry> {
        self.tabs.active()
    }

    pub fn select_file(&mut self, file: &FileNode) -> Option<TabId> {
        self.tabs.select_file(file)
    }

    /// Resolves `path` in the tree and opens it; unknown paths and folders
    /// leave the session unchanged.
    pub fn select_path(&mut self, path: &str) -> Option<TabId> {
        match self.tree.find_by_path(path) {
            Some(node) => self.tabs.select_file(node),
            None => {
                debug!(path, "select ignored; no such node");
                None
            }
        }
    }

    pub fn create_file(&mut self, parent_path: &str) -> Option<NodeId> {
        let (tree, diff) = self.tree.create_file(parent_path, &self.defaults);
        self.commit(tree, diff)
    }

    pub fn create_folder(&mut self, parent_path: &str) -> Option<NodeId> {
        let (tree, diff) = self.tree.create_folder(parent_path, &self.defaults);
        self.commit(tree, diff)
    }

    pub fn create_named(&mut self, parent_path: &str, draft: NodeDraft) -> Option<NodeId> {
        let (tree, diff) = self.tree.create_named(parent_path, draft);
        self.commit(tree, diff)
    }

    /// Returns whether `folder` is expanded afterwards.
    pub fn toggle_expansion(&mut self, folder: NodeId) -> bool {
        let expanded = self.expansion.toggle(folder);
        debug!(folder = %folder, expanded, "toggled folder");
        expanded
    }

    pub fn activate_tab(&mut self, id: TabId) {
        self.tabs.activate(id);
    }

    pub fn close_tab(&mut self, id: TabId) {
        self.tabs.close(id);
    }

    pub fn edit_tab(&mut self, id: TabId, content: impl Into<String>) {
        self.tabs.edit(id, content);
    }

    /// Dispatches one host command.
    pub fn apply(&mut self, command: Command) {
        debug!(?command, "applying command");
        match command {
            Command::SelectFile { file } => {
                if let Some(node) = self.resolve_node(&file).cloned() {
                    self.select_file(&node);
                }
            }
            Command::CreateFile { parent } => {
                self.create_file(&parent);
            }
            Command::CreateFolder { parent } => {
                self.create_folder(&parent);
            }
            Command::CreateNamed { parent, draft } => {
                self.create_named(&parent, draft);
            }
            Command::ToggleExpansion { folder } => {
                if let Some(id) = self.resolve_node(&folder).map(|node| node.id) {
                    self.toggle_expansion(id);
                }
            }
            Command::ActivateTab { tab } => {
                if let Some(id) = self.resolve_tab(&tab) {
                    self.activate_tab(id);
                }
            }
            Command::CloseTab { tab } => {
                if let Some(id) = self.resolve_tab(&tab) {
                    self.close_tab(id);
                }
            }
            Command::EditTab { tab, content } => {
                if let Some(id) = self.resolve_tab(&tab) {
                    self.edit_tab(id, content);
                }
            }
        }
    }

    pub fn status(&self) -> StatusLine {
        let active = self.tabs.active();
        StatusLine {
            active_name: active.map(|tab| tab.name.clone()),
            language: active
                .map(|tab| tab.language.clone())
                .unwrap_or_default(),
            open_tabs: self.tabs.len(),
            modified_tabs: self.tabs.modified_count(),
            no_file_open: active.is_none(),
        }
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot<'_> {
        WorkspaceSnapshot {
            revision: self.tree.revision(),
            root: self.tree.root(),
            expanded: &self.expansion,
            tabs: self.tabs.tabs(),
            active_tab: self.tabs.active_id(),
            status: self.status(),
        }
    }

    fn commit(&mut self, tree: FileTree, diff: FileTreeDiff) -> Option<NodeId> {
        self.tree = tree;
        diff.added.first().copied()
    }

    fn resolve_node(&self, node: &NodeRef) -> Option<&FileNode> {
        let found = match node {
            NodeRef::Id(id) => self.tree.find(*id),
            NodeRef::Path(path) => self.tree.find_by_path(path),
        };
        if found.is_none() {
            debug!(?node, "unresolved node reference");
        }
        found
    }

    fn resolve_tab(&self, tab: &TabRef) -> Option<TabId> {
        let found = match tab {
            TabRef::Id(id) => self.tabs.get(*id).map(|entry| entry.id),
            TabRef::Path(path) => self
                .tabs
                .tabs()
                .iter()
                .find(|entry| &entry.path == path)
                .map(|entry| entry.id),
        };
        if found.is_none() {
            debug!(?tab, "unresolved tab reference");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_workspace_opens_index_html() {
        let workspace = Workspace::seeded(WorkspaceOptions::default());
        let tab = workspace.active_tab().unwrap();
        assert_eq!(tab.name, "index.html");
        assert_eq!(tab.language, LanguageTag::HTML);
        assert_eq!(tab.content, seed::INDEX_HTML);
        assert!(!tab.modified);
        assert_eq!(workspace.tabs().len(), 1);
        assert!(workspace.expansion().is_empty());
    }

    #[test]
    fn seeded_workspace_can_start_without_tabs() {
        let options = WorkspaceOptions {
            open_seed_tab: false,
            ..WorkspaceOptions::default()
        };
        let workspace = Workspace::seeded(options);
        assert!(workspace.tabs().is_empty());
        let status = workspace.status();
        assert!(status.no_file_open);
        assert_eq!(status.language, LanguageTag::TEXT);
        assert_eq!(status.to_string(), "No file open [text] | 0 open, 0 modified");
    }

    #[test]
    fn select_path_ignores_folders_and_unknown_paths() {
        let mut workspace = Workspace::seeded(WorkspaceOptions::default());
        assert_eq!(workspace.select_path("/"), None);
        assert_eq!(workspace.select_path("/missing.txt"), None);
        assert_eq!(workspace.tabs().len(), 1);

        let id = workspace.select_path("/app.js").unwrap();
        assert_eq!(workspace.active_tab_id(), Some(id));
    }

    #[test]
    fn created_files_can_be_opened() {
        let mut workspace = Workspace::seeded(WorkspaceOptions::default());
        let node = workspace.create_file("/").unwrap();
        let path = workspace.tree().find(node).unwrap().path.clone();
        assert_eq!(path, "/newfile.txt");

        let tab = workspace.select_path(&path).unwrap();
        let entry = workspace.tabs().get(tab).unwrap();
        assert_eq!(entry.content, "");
        assert_eq!(entry.language, LanguageTag::TEXT);
        assert_eq!(workspace.create_file("/nowhere/"), None);
    }

    #[test]
    fn custom_defaults_name_new_nodes() {
        let options = WorkspaceOptions {
            defaults: NodeDefaults {
                file_name: "untitled.md".into(),
                folder_name: "pkg".into(),
                language: LanguageTag::new("markdown"),
            },
            ..WorkspaceOptions::default()
        };
        let mut workspace = Workspace::seeded(options);
        workspace.create_folder("/").unwrap();
        workspace.create_file("/pkg/").unwrap();
        let node = workspace.tree().find_by_path("/pkg/untitled.md").unwrap();
        assert_eq!(node.language().map(LanguageTag::as_str), Some("markdown"));
    }

    #[test]
    fn apply_dispatches_script_commands() {
        let script = r#"[
            {"command": "create_folder", "parent": "/"},
            {"command": "create_named", "parent": "/NewFolder/", "draft": {"name": "main.py", "type": "file", "content": "print(1)"}},
            {"command": "toggle_expansion", "folder": "/"},
            {"command": "select_file", "file": "/NewFolder/main.py"},
            {"command": "edit_tab", "tab": "/NewFolder/main.py", "content": "print(2)"},
            {"command": "close_tab", "tab": "/index.html"}
        ]"#;
        let commands = Command::parse_script(script).unwrap();
        assert_eq!(commands.len(), 6);

        let mut workspace = Workspace::seeded(WorkspaceOptions::default());
        for command in commands {
            workspace.apply(command);
        }

        assert!(workspace.expansion().contains(workspace.tree().root().id));
        let tab = workspace.active_tab().unwrap();
        assert_eq!(tab.path, "/NewFolder/main.py");
        assert_eq!(tab.language.as_str(), "python");
        assert_eq!(tab.content, "print(2)");
        assert!(tab.modified);
        assert_eq!(workspace.tabs().len(), 1);
        // Tab edits never flow back into the tree.
        let node = workspace.tree().find_by_path("/NewFolder/main.py").unwrap();
        assert_eq!(node.content(), Some("print(1)"));
    }

    #[test]
    fn tab_refs_accept_numeric_ids() {
        let mut workspace = Workspace::seeded(WorkspaceOptions::default());
        let first = workspace.active_tab_id().unwrap();
        workspace.select_path("/styles.css");
        let json = format!(r#"{{"command": "activate_tab", "tab": {}}}"#, first.as_u64());
        let command: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(command, Command::ActivateTab { tab: TabRef::Id(first) });
        workspace.apply(command);
        assert_eq!(workspace.active_tab_id(), Some(first));
    }

    #[test]
    fn snapshot_serializes_query_surface() {
        let mut workspace = Workspace::seeded(WorkspaceOptions::default());
        let root = workspace.tree().root().id;
        workspace.toggle_expansion(root);
        let value = serde_json::to_value(workspace.snapshot()).unwrap();
        assert_eq!(value["root"]["name"], "Project");
        assert_eq!(value["expanded"][0], root.as_u64());
        assert_eq!(value["tabs"][0]["name"], "index.html");
        assert_eq!(value["status"]["no_file_open"], false);
        assert_eq!(value["active_tab"], workspace.active_tab_id().unwrap().as_u64());
    }
}
