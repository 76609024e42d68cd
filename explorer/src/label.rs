//! Display labels for one level of explore results.
//!
//! Siblings returned by a single explore call usually share a long common
//! prefix (the part of the expression the trie has already matched). The
//! label of each sibling is the first atom where it diverges from the others.

use crate::node::ExploreEntry;
use crate::node::Node;

const MAX_LABEL_CHARS: usize = 50;
const TRUNCATED_LABEL_CHARS: usize = 20;
const ARTIFACT_MIN_CHARS: usize = 20;

/// Nodes of one explore level plus the atoms every sibling shares.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExploreLevel {
    pub nodes: Vec<Node>,
    pub prefix: Vec<String>,
}

pub fn nodes_from_entries(entries: Vec<ExploreEntry>) -> ExploreLevel {
    if entries.is_empty() {
        return ExploreLevel::default();
    }
    let atoms: Vec<Vec<String>> = entries
        .iter()
        .map(|entry| match split_atoms(&entry.expr) {
            Some(atoms) => atoms
                .into_iter()
                .filter(|atom| !is_encoding_artifact(atom))
                .collect(),
            None => vec![entry.expr.clone()],
        })
        .collect();

    let (prefix, labels) = diverging_labels(&atoms);
    let nodes = entries
        .into_iter()
        .zip(labels)
        .map(|(entry, label)| {
            let label = label
                .map(|raw| shorten(strip_quotes(&raw)))
                .unwrap_or_else(|| entry.expr.clone());
            Node {
                expr: entry.expr,
                token: entry.token,
                label,
            }
        })
        .collect();
    ExploreLevel { nodes, prefix }
}

fn diverging_labels(atoms: &[Vec<String>]) -> (Vec<String>, Vec<Option<String>>) {
    let width = atoms.iter().map(Vec::len).max().unwrap_or(0);
    let mut prefix = Vec::new();
    for column in 0..width {
        let first = atoms[0].get(column);
        let shared = first.is_some() && atoms.iter().all(|row| row.get(column) == first);
        if shared {
            if let Some(atom) = first {
                prefix.push(atom.clone());
            }
            continue;
        }
        let labels = atoms.iter().map(|row| row.get(column).cloned()).collect();
        return (prefix, labels);
    }

    // Every column agrees: label by the last atom and leave it out of the
    // prefix.
    let labels = atoms.iter().map(|row| row.last().cloned()).collect();
    if !prefix.is_empty() {
        prefix.pop();
    }
    (prefix, labels)
}

/// Splits an expression into atoms. Parentheses only separate; quoted strings
/// stay whole with their quotes. `None` for unbalanced input.
fn split_atoms(expr: &str) -> Option<Vec<String>> {
    let mut atoms = Vec::new();
    let mut current = String::new();
    let mut depth: usize = 0;
    let mut chars = expr.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '(' | ')' => {
                flush(&mut current, &mut atoms);
                if ch == '(' {
                    depth += 1;
                } else {
                    depth = depth.checked_sub(1)?;
                }
            }
            '"' => {
                flush(&mut current, &mut atoms);
                let mut quoted = String::from('"');
                let mut closed = false;
                while let Some(inner) = chars.next() {
                    quoted.push(inner);
                    if inner == '\\' {
                        if let Some(escaped) = chars.next() {
                            quoted.push(escaped);
                        }
                        continue;
                    }
                    if inner == '"' {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return None;
                }
                atoms.push(quoted);
            }
            ch if ch.is_whitespace() => flush(&mut current, &mut atoms),
            ch => current.push(ch),
        }
    }
    flush(&mut current, &mut atoms);
    (depth == 0).then_some(atoms)
}

fn flush(current: &mut String, atoms: &mut Vec<String>) {
    if !current.is_empty() {
        atoms.push(std::mem::take(current));
    }
}

/// Hash-like identifiers (long runs of letters/digits ending in hex and
/// dashes) carry no meaning for a human reader.
fn is_encoding_artifact(atom: &str) -> bool {
    if atom.chars().count() <= ARTIFACT_MIN_CHARS {
        return false;
    }
    let bytes = atom.as_bytes();
    let hex_or_dash = |b: &u8| b.is_ascii_hexdigit() || *b == b'-';
    let tail_start = bytes
        .iter()
        .rposition(|b| !hex_or_dash(b))
        .map_or(0, |pos| pos + 1);
    if tail_start >= bytes.len() {
        return false;
    }
    let head_end = tail_start.max(1);
    bytes[..head_end].iter().all(u8::is_ascii_alphanumeric)
}

fn strip_quotes(raw: &str) -> &str {
    let raw = raw
        .strip_prefix('"')
        .or_else(|| raw.strip_prefix('\''))
        .unwrap_or(raw);
    raw.strip_suffix('"')
        .or_else(|| raw.strip_suffix('\''))
        .unwrap_or(raw)
}

fn shorten(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_CHARS {
        return label.to_string();
    }
    let mut parts = label.split('-');
    if let Some(head) = parts.next()
        && !head.is_empty()
        && parts.next().is_some()
    {
        return format!("{head}...");
    }
    let head: String = label.chars().take(TRUNCATED_LABEL_CHARS).collect();
    format!("{head}...")
}
