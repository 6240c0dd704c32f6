//! Reference project loaded when a workspace starts without host data.

use crate::language::LanguageTag;
use crate::tree::{FileNode, FileTree};

pub const INDEX_HTML: &str =
    "<!DOCTYPE html>\n<html>\n<head>\n<title>MoityaNest</title>\n</head>\n<body>\n</body>\n</html>";
pub const STYLES_CSS: &str = "body { margin: 0; }";
pub const APP_JS: &str = "console.log(\"Hello MoityaNest\");";

/// Path of the file opened by a freshly seeded workspace.
pub const SEED_TAB_PATH: &str = "/index.html";

/// Root folder `Project` at `/` holding `index.html`, `styles.css` and `app.js`.
pub fn project_tree() -> FileTree {
    FileTree::from_root(FileNode::folder(
        "Project",
        "/",
        vec![
            FileNode::file("index.html", "/index.html", LanguageTag::HTML, INDEX_HTML),
            FileNode::file("styles.css", "/styles.css", LanguageTag::CSS, STYLES_CSS),
            FileNode::file("app.js", "/app.js", LanguageTag::JAVASCRIPT, APP_JS),
        ],
    ))
}
