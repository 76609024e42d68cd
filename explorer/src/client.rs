use crate::error::ExploreError;
use crate::node::ExploreEntry;
use crate::node::NavToken;
use async_trait::async_trait;

/// One level of the remote trie: given a scope, a match pattern and a
/// navigation token, returns the children below that token.
///
/// An empty result means "no children" and is distinct from a terminal
/// token. Calls are expected to be idempotent.
#[async_trait]
pub trait ExploreClient: Send + Sync {
    async fn explore(
        &self,
        scope: &str,
        pattern: &str,
        token: &NavToken,
    ) -> Result<Vec<ExploreEntry>, ExploreError>;
}
