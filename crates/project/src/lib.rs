//! In-memory project model for CodeNest: a persistent file tree, folder
//! expansion state, and the editor tab session layered on top of it.

pub mod expansion;
pub mod language;
pub mod seed;
pub mod session;
pub mod tree;
pub mod workspace;

pub use expansion::ExpansionSet;
pub use language::LanguageTag;
pub use session::{TabEntry, TabId, TabIdentity, TabSession};
pub use tree::{
    FileNode, FileNodeKind, FileTree, FileTreeDiff, NodeDefaults, NodeDraft, NodeId, PreOrder,
    TreeInvariantError, TreeRow,
};
pub use workspace::{
    Command, NodeRef, StatusLine, TabRef, Workspace, WorkspaceOptions, WorkspaceSnapshot,
};
