//! Incremental, lazily expanded view over the MeTTa-KG explore endpoint.
//!
//! The remote trie is only ever materialized one level at a time: a
//! [`TreeExplorer`] fetches children on demand through an
//! [`ExploreClient`], keeps them in an [`ExpansionCache`] and renders the
//! visible part as a flat list of rows.

mod cache;
mod client;
mod config;
mod error;
mod events;
mod explorer;
mod flatten;
mod label;
mod node;
mod pull_up;

pub use cache::BatchUpdate;
pub use cache::ExpansionCache;
pub use client::ExploreClient;
pub use config::DEFAULT_BATCH_SIZE;
pub use config::DEFAULT_MAX_NODES;
pub use config::DEFAULT_MAX_PULL_DEPTH;
pub use config::DEFAULT_MAX_STALE_ATTEMPTS;
pub use config::DEFAULT_ROW_HEIGHT_PX;
pub use config::ExplorerConfig;
pub use error::ConfigError;
pub use error::ExploreError;
pub use events::ExplorerEvent;
pub use events::Notice;
pub use events::NoticeSeverity;
pub use explorer::ExplorerSnapshot;
pub use explorer::FillOutcome;
pub use explorer::FillStop;
pub use explorer::LeafExpansion;
pub use explorer::ToggleOutcome;
pub use explorer::TreeExplorer;
pub use flatten::FlatNode;
pub use flatten::flatten;
pub use label::ExploreLevel;
pub use label::nodes_from_entries;
pub use node::ExploreEntry;
pub use node::NavToken;
pub use node::Node;
pub use node::NodePath;
pub use node::SENTINEL_BYTE;
pub use pull_up::FetchContext;
pub use pull_up::fetch_children;
pub use pull_up::pull_up_duplicates;
