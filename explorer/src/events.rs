use crate::error::ExploreError;
use crate::node::Node;
use tokio::sync::mpsc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeSeverity {
    Info,
    Destructive,
}

/// A user-facing message, rendered by whatever toast system hosts the
/// explorer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub severity: NoticeSeverity,
}

impl Notice {
    fn info(title: &str, description: String) -> Self {
        Self {
            title: title.to_string(),
            description,
            severity: NoticeSeverity::Info,
        }
    }

    fn destructive(title: &str, description: String) -> Self {
        Self {
            title: title.to_string(),
            description,
            severity: NoticeSeverity::Destructive,
        }
    }

    /// Notice for a failed single-node expansion.
    pub fn expand_failed(err: &ExploreError) -> Self {
        if err.is_missing_credential() {
            return Self::destructive(
                "Token not set",
                "Please set the token in the Tokens page.".to_string(),
            );
        }
        Self::destructive("Error", format!("Failed to expand node: {err}"))
    }

    pub fn expansion_limit(max_nodes: usize) -> Self {
        Self::info(
            "Expansion limit",
            format!("Stopped expanding after {max_nodes} nodes."),
        )
    }

    pub fn expansion_failed(err: &ExploreError) -> Self {
        if err.is_missing_credential() {
            return Self::expand_failed(err);
        }
        Self::destructive(
            "Expansion error",
            format!("Failed to expand recursively: {err}"),
        )
    }

    pub fn roots_loaded(count: usize) -> Self {
        Self::info("Success", format!("Loaded {count} nodes."))
    }

    pub fn load_failed(err: &ExploreError) -> Self {
        if err.is_missing_credential() {
            return Self::destructive(
                "Token not set",
                "No token found, please add one in the Tokens page.".to_string(),
            );
        }
        Self::destructive("Error", format!("Failed to load space data: {err}"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExplorerEvent {
    /// The cache or root set changed; re-flatten.
    Changed { revision: u64 },
    Notice(Notice),
    /// A terminal node was activated.
    LeafSelected(Node),
}

#[derive(Clone)]
pub(crate) struct EventSender {
    tx: mpsc::UnboundedSender<ExplorerEvent>,
}

impl EventSender {
    pub(crate) fn new(tx: mpsc::UnboundedSender<ExplorerEvent>) -> Self {
        Self { tx }
    }

    pub(crate) fn send(&self, event: ExplorerEvent) {
        // Nobody listening is fine: the explorer works headless.
        let _ = self.tx.send(event);
    }

    pub(crate) fn notice(&self, notice: Notice) {
        self.send(ExplorerEvent::Notice(notice));
    }
}
