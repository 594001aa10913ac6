use crate::tree::{NodeKind, TreeNode};

/// Renders the completed tree as markdown: one bulleted line per node in
/// pre-order, two-space indents per level, the root line at depth 0 labeled
/// with the uploaded folder's own name.
///
/// Directories render as a bold label behind a folder glyph; files render as
/// `[name](url)` when a URL is present and as a bare code span otherwise;
/// symlinks render inert with an arrow and the literal target. No node is
/// ever omitted — failure is represented by the code-span fallback, not by
/// deletion. Pure and deterministic.
pub fn render(tree: &[TreeNode], root_name: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("- 📁 **{root_name}**\n"));
    for node in tree {
        render_node(node, 1, &mut out);
    }
    out
}

fn render_node(node: &TreeNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match node.kind {
        NodeKind::Directory => {
            out.push_str(&format!("{indent}- 📁 **{}**\n", node.name));
            for child in &node.children {
                render_node(child, depth + 1, out);
            }
        }
        NodeKind::File => match &node.url {
            Some(url) => out.push_str(&format!("{indent}- [{}]({url})\n", node.name)),
            None => out.push_str(&format!("{indent}- `{}`\n", node.name)),
        },
        NodeKind::Symlink => {
            let target = node.link_target.as_deref().unwrap_or("unknown target");
            out.push_str(&format!("{indent}- {} → `{target}`\n", node.name));
        }
    }
}
