use codenest_project::{
    seed, FileNode, FileTree, LanguageTag, NodeDefaults, TabIdentity, TabSession, Workspace,
    WorkspaceOptions,
};

#[test]
fn editing_seed_tab_marks_it_modified() {
    let mut workspace = Workspace::seeded(WorkspaceOptions::default());
    let t1 = workspace.active_tab_id().expect("seed tab");
    assert_eq!(workspace.active_tab().unwrap().name, "index.html");
    assert!(!workspace.active_tab().unwrap().modified);

    workspace.edit_tab(t1, "<p>hi</p>");

    let tab = workspace.tabs().get(t1).unwrap();
    assert_eq!(tab.content, "<p>hi</p>");
    assert!(tab.modified);
    assert!(tab.active);
    assert_eq!(workspace.status().modified_tabs, 1);
    assert_eq!(
        workspace.tree().find_by_path("/index.html").unwrap().content(),
        Some(seed::INDEX_HTML)
    );
}

#[test]
fn closing_first_active_tab_promotes_next_in_order() {
    let mut workspace = Workspace::seeded(WorkspaceOptions::default());
    let t1 = workspace.active_tab_id().unwrap();
    let t2 = workspace.select_path("/styles.css").unwrap();
    let t3 = workspace.select_path("/app.js").unwrap();
    workspace.activate_tab(t1);

    workspace.close_tab(t1);

    let tabs: Vec<_> = workspace
        .tabs()
        .tabs()
        .iter()
        .map(|tab| (tab.id, tab.active))
        .collect();
    assert_eq!(tabs, vec![(t2, true), (t3, false)]);
}

#[test]
fn closing_only_tab_reports_no_file_open() {
    let mut workspace = Workspace::seeded(WorkspaceOptions::default());
    let t1 = workspace.active_tab_id().unwrap();

    workspace.close_tab(t1);

    assert!(workspace.tabs().is_empty());
    assert_eq!(workspace.active_tab_id(), None);
    let status = workspace.status();
    assert!(status.no_file_open);
    assert_eq!(status.active_name, None);
}

#[test]
fn create_file_twice_under_src_appends_two_files() {
    let tree = FileTree::from_root(FileNode::folder(
        "Project",
        "/",
        vec![FileNode::folder("src", "/src/", Vec::new())],
    ));
    let defaults = NodeDefaults::default();

    let (tree, _) = tree.create_file("/src/", &defaults);
    let src = tree.find_by_path("/src/").unwrap();
    assert_eq!(src.children().len(), 1);
    let first = &src.children()[0];
    assert!(first.is_file());
    assert_eq!(first.name, defaults.file_name);
    assert_eq!(first.content(), Some(""));
    assert_eq!(first.language(), Some(&LanguageTag::TEXT));
    let first_id = first.id;

    let (tree, _) = tree.create_file("/src/", &defaults);
    let src = tree.find_by_path("/src/").unwrap();
    assert_eq!(src.children().len(), 2);
    assert_eq!(src.children()[0].id, first_id);
    assert_ne!(src.children()[1].id, first_id);
    assert!(tree.validate().is_ok());
}

#[test]
fn name_based_dedup_is_flagged_as_lossy() {
    // Two distinct files named `index.html`: only path or id identity keeps both open.
    let tree = FileTree::from_root(FileNode::folder(
        "Project",
        "/",
        vec![
            FileNode::file("index.html", "/index.html", LanguageTag::HTML, "a"),
            FileNode::folder(
                "site",
                "/site/",
                vec![FileNode::file(
                    "index.html",
                    "/site/index.html",
                    LanguageTag::HTML,
                    "b",
                )],
            ),
        ],
    ));

    for (identity, expected) in [
        (TabIdentity::Name, 1),
        (TabIdentity::Path, 2),
        (TabIdentity::NodeId, 2),
    ] {
        let mut workspace = Workspace::new(
            tree.clone(),
            WorkspaceOptions {
                tab_identity: identity,
                ..WorkspaceOptions::default()
            },
        );
        workspace.select_path("/index.html");
        workspace.select_path("/site/index.html");
        assert_eq!(workspace.tabs().len(), expected, "{identity:?}");
    }
}

#[test]
fn snapshot_clone_is_isolated_from_later_commands() {
    let mut workspace = Workspace::seeded(WorkspaceOptions::default());
    let before = workspace.clone();

    workspace.create_folder("/");
    let t = workspace.select_path("/app.js").unwrap();
    workspace.edit_tab(t, "changed");

    assert_eq!(before.tabs().len(), 1);
    assert_eq!(before.tree().root().children().len(), 3);
    assert_eq!(workspace.tree().root().children().len(), 4);
    assert_eq!(TabSession::default().identity(), TabIdentity::Path);
}
