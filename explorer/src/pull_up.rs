//! Child fetching shared by every expansion path.
//!
//! The trie behind the explore endpoint sometimes answers with a child whose
//! expression is identical to its parent's: an edge that has not diverged
//! yet. Such echoes are replaced by their own children ("pulled up") before
//! anything reaches the cache.

use crate::client::ExploreClient;
use crate::error::ExploreError;
use crate::label::nodes_from_entries;
use crate::node::Node;
use tracing::debug;
use tracing::warn;

/// Where and how a level is being fetched.
#[derive(Clone, Copy)]
pub struct FetchContext<'a> {
    pub client: &'a dyn ExploreClient,
    pub scope: &'a str,
    pub pattern: &'a str,
    pub max_pull_depth: usize,
}

/// Fetches the children of `node`, with echoes of `node` pulled up.
pub async fn fetch_children(
    ctx: FetchContext<'_>,
    node: &Node,
) -> Result<Vec<Node>, ExploreError> {
    let entries = ctx
        .client
        .explore(ctx.scope, ctx.pattern, &node.token)
        .await?;
    if entries.is_empty() {
        return Ok(Vec::new());
    }
    let level = nodes_from_entries(entries);
    Ok(pull_up_duplicates(ctx, &node.expr, level.nodes).await)
}

/// Replaces a leading child that repeats `parent_expr` with that child's own
/// children, repeatedly, at most `max_pull_depth` times.
///
/// A failed fetch drops the echo and keeps the siblings.
pub async fn pull_up_duplicates(
    ctx: FetchContext<'_>,
    parent_expr: &str,
    mut nodes: Vec<Node>,
) -> Vec<Node> {
    let mut depth = 0;
    while depth < ctx.max_pull_depth && nodes.first().is_some_and(|n| n.expr == parent_expr) {
        let echo = nodes.remove(0);
        let siblings = nodes;
        let grandchildren = match ctx
            .client
            .explore(ctx.scope, ctx.pattern, &echo.token)
            .await
        {
            Ok(entries) => nodes_from_entries(entries).nodes,
            Err(err) => {
                warn!("pull-up fetch for {parent_expr:?} failed, dropping echo: {err}");
                return siblings;
            }
        };
        if grandchildren.is_empty() {
            return siblings;
        }
        // An echo that explores to itself again would repeat forever.
        if grandchildren.len() == 1
            && grandchildren[0].expr == echo.expr
            && grandchildren[0].token == echo.token
        {
            debug!("pull-up for {parent_expr:?} hit a self-loop, dropping echo");
            return siblings;
        }

        let sibling_count = siblings.len();
        nodes = grandchildren;
        nodes.extend(siblings);
        if nodes.len() <= sibling_count {
            break;
        }
        depth += 1;
    }
    nodes
}
