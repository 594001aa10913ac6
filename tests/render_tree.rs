use treelink::render::render;
use treelink::tree::TreeNode;

#[test]
fn renders_linked_file_under_nested_directory_exactly() {
    let mut file = TreeNode::file("x.txt", "/src/A/x.txt");
    file.source_path = None;
    file.url = Some("/assets/x.txt".to_string());
    let tree = vec![TreeNode::directory("A", vec![file])];

    let markup = render(&tree, "Root");
    assert_eq!(
        markup,
        "- 📁 **Root**\n  - 📁 **A**\n    - [x.txt](/assets/x.txt)\n"
    );
}

#[test]
fn unlinked_file_renders_as_code_span() {
    let mut file = TreeNode::file("failed.bin", "/src/failed.bin");
    file.source_path = None;
    let markup = render(&[file], "Root");
    assert_eq!(markup, "- 📁 **Root**\n  - `failed.bin`\n");
}

#[test]
fn symlink_renders_inert_with_literal_target() {
    let tree = vec![
        TreeNode::symlink("y", Some("/tmp/y".to_string())),
        TreeNode::symlink("dangling", None),
    ];
    let markup = render(&tree, "Root");
    assert_eq!(
        markup,
        "- 📁 **Root**\n  - y → `/tmp/y`\n  - dangling → `unknown target`\n"
    );
}

#[test]
fn empty_directory_emits_only_its_header_line() {
    let tree = vec![TreeNode::directory("empty", Vec::new())];
    let markup = render(&tree, "Root");
    assert_eq!(markup, "- 📁 **Root**\n  - 📁 **empty**\n");
}

#[test]
fn rendering_is_preorder_and_deterministic() {
    let mut linked = TreeNode::file("a.txt", "/r/d/a.txt");
    linked.source_path = None;
    linked.url = Some("/assets/a.txt".to_string());
    let mut plain = TreeNode::file("b.txt", "/r/b.txt");
    plain.source_path = None;
    let tree = vec![TreeNode::directory("d", vec![linked]), plain];

    let first = render(&tree, "r");
    let second = render(&tree, "r");
    assert_eq!(first, second);
    let lines: Vec<&str> = first.lines().collect();
    assert_eq!(
        lines,
        vec![
            "- 📁 **r**",
            "  - 📁 **d**",
            "    - [a.txt](/assets/a.txt)",
            "  - `b.txt`",
        ]
    );
}
