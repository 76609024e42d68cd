use mettakg_explorer::FlatNode;
use mettakg_explorer::NodePath;
use mettakg_explorer::Notice;
use mettakg_explorer::NoticeSeverity;
use std::collections::HashSet;

/// Renders visible rows as an indented outline, one row per line.
///
/// `-` marks an expanded node, `+` a collapsed expandable one, and terminal
/// nodes get no marker.
pub fn render_tree(rows: &[FlatNode], expanded: &HashSet<NodePath>) -> String {
    let mut out = String::new();
    for row in rows {
        let marker = if expanded.contains(&row.path) {
            "- "
        } else if row.node.is_expandable() {
            "+ "
        } else {
            "  "
        };
        out.push_str(&"  ".repeat(row.depth));
        out.push_str(marker);
        out.push_str(&row.node.label);
        out.push('\n');
    }
    out
}

/// Header line naming the atoms every root shares, e.g. `(edge city ...)`.
pub fn render_prefix(prefix: &[String]) -> Option<String> {
    if prefix.is_empty() {
        return None;
    }
    Some(format!("({} ...)", prefix.join(" ")))
}

pub fn render_notice(notice: &Notice) -> String {
    let level = match notice.severity {
        NoticeSeverity::Info => "info",
        NoticeSeverity::Destructive => "error",
    };
    format!("[{level}] {}: {}", notice.title, notice.description)
}
