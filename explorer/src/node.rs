use serde::Deserialize;
use serde::Serialize;
use std::fmt;

/// Byte value marking a token that cannot be explored further.
pub const SENTINEL_BYTE: u8 = 0xFF;

/// Opaque navigation handle passed back to the explore endpoint to fetch the
/// next level of children.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NavToken(Vec<u8>);

impl NavToken {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The token that explores from the root of a scope.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Empty tokens and tokens made only of sentinel bytes lead nowhere.
    pub fn is_terminal(&self) -> bool {
        self.0.iter().all(|byte| *byte == SENTINEL_BYTE)
    }

    /// Decimal bytes joined by commas, e.g. `4,17,255`.
    pub fn key(&self) -> String {
        self.0
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl From<Vec<u8>> for NavToken {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for NavToken {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

/// One validated `(expression, token)` pair returned by the explore endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreEntry {
    pub expr: String,
    pub token: NavToken,
}

impl ExploreEntry {
    pub fn new(expr: impl Into<String>, token: impl Into<NavToken>) -> Self {
        Self {
            expr: expr.into(),
            token: token.into(),
        }
    }
}

/// A node of the materialized tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub expr: String,
    pub token: NavToken,
    pub label: String,
}

impl Node {
    pub fn new(
        expr: impl Into<String>,
        token: impl Into<NavToken>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            expr: expr.into(),
            token: token.into(),
            label: label.into(),
        }
    }

    pub fn is_expandable(&self) -> bool {
        !self.token.is_terminal()
    }

    /// Token key when the token is present, label otherwise. Only used to
    /// build paths; tokens are not stable identities across fetches.
    pub fn key(&self) -> String {
        if self.token.is_empty() {
            self.label.clone()
        } else {
            self.token.key()
        }
    }
}

/// Position of a node in the materialized tree.
///
/// Built as `parent/key#index`; the ordinal index keeps siblings with the
/// same key apart.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodePath(String);

impl NodePath {
    pub fn root(node: &Node, index: usize) -> Self {
        Self(format!("{}#{index}", node.key()))
    }

    pub fn child(&self, node: &Node, index: usize) -> Self {
        Self(format!("{}/{}#{index}", self.0, node.key()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodePath {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodePath {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
