use crate::cache::BatchUpdate;
use crate::cache::ExpansionCache;
use crate::client::ExploreClient;
use crate::config::ExplorerConfig;
use crate::error::ExploreError;
use crate::events::EventSender;
use crate::events::ExplorerEvent;
use crate::events::Notice;
use crate::flatten::FlatNode;
use crate::label::ExploreLevel;
use crate::label::nodes_from_entries;
use crate::node::NavToken;
use crate::node::Node;
use crate::node::NodePath;
use crate::pull_up::FetchContext;
use crate::pull_up::fetch_children;
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::info;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    Collapsed,
    Expanded { children: usize },
    /// The node is terminal; a [`ExplorerEvent::LeafSelected`] was emitted.
    LeafSelected,
    /// The scope changed while the fetch was in flight.
    Discarded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillStop {
    TargetReached,
    NoCandidates,
    Stalled,
    MissingCredential,
    ScopeChanged,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FillOutcome {
    pub visible: usize,
    pub expanded: usize,
    pub batches: usize,
    pub stop: FillStop,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeafExpansion {
    /// Another full expansion holds the lock.
    Busy,
    Completed { expanded: usize },
    Truncated { expanded: usize },
    Failed { error: ExploreError },
    /// The scope changed underneath; nothing was committed.
    Discarded,
}

/// Read-only copy of the explorer state.
#[derive(Clone, Debug)]
pub struct ExplorerSnapshot {
    pub scope: String,
    pub generation: u64,
    pub roots: Vec<Node>,
    /// Atoms shared by every root node.
    pub root_prefix: Vec<String>,
    pub cache: ExpansionCache,
}

struct ExplorerState {
    scope: String,
    generation: u64,
    revision: u64,
    roots: Vec<Node>,
    root_prefix: Vec<String>,
    cache: ExpansionCache,
}

impl ExplorerState {
    fn flatten(&self) -> Vec<FlatNode> {
        self.cache.flatten(&self.roots)
    }

    fn epoch(&self) -> Epoch {
        Epoch {
            scope: self.scope.clone(),
            generation: self.generation,
        }
    }

    fn invalidate(&mut self) {
        self.cache.reset();
        self.generation += 1;
    }

    /// Keeps the cursor on a visible row after the row list shrank.
    fn clamp_cursor(&mut self) {
        let last = self.flatten().len().saturating_sub(1);
        if self.cache.cursor() > last {
            self.cache.set_cursor(last);
        }
    }
}

/// Scope and generation a piece of work was started under. Results tagged
/// with an older generation are dropped instead of merged.
struct Epoch {
    scope: String,
    generation: u64,
}

/// Everything gathered by one expand-to-leaf walk.
#[derive(Default)]
struct SubtreeWalk {
    fetched: HashMap<NodePath, Vec<Node>>,
    reexpand: Vec<NodePath>,
    failures: usize,
    last_error: Option<ExploreError>,
    aborted: bool,
}

/// Clears the viewport-fill flag when a fill ends, including when its future
/// is dropped before completion. A reset in between already cleared it.
struct FillFlag<'a> {
    explorer: &'a TreeExplorer,
    generation: u64,
}

impl Drop for FillFlag<'_> {
    fn drop(&mut self) {
        let mut state = self.explorer.state.lock();
        if state.generation == self.generation {
            state.cache.set_expanding(false);
            state.cache.mark_initial_expansion_done();
            self.explorer.changed(&mut state);
        }
    }
}

/// Releases the expand-to-leaf lock if the walk is abandoned before it
/// commits. Disarmed once the walk releases the lock itself.
struct LeafLock<'a> {
    explorer: &'a TreeExplorer,
    generation: u64,
    armed: bool,
}

impl LeafLock<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for LeafLock<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.explorer.state.lock();
        if state.generation == self.generation {
            debug!("expand-to-leaf dropped before finishing, releasing lock");
            state.cache.release_lock();
            self.explorer.changed(&mut state);
        }
    }
}

/// Lazily materialized view of one scope of the remote trie.
///
/// Owns the expansion cache for that scope. All methods take `&self`; the
/// state lock is never held across an `.await`, so a reset can interleave
/// with an expansion in flight.
pub struct TreeExplorer {
    client: Arc<dyn ExploreClient>,
    config: ExplorerConfig,
    state: Mutex<ExplorerState>,
    events: EventSender,
}

impl TreeExplorer {
    pub fn new(
        client: Arc<dyn ExploreClient>,
        scope: impl Into<String>,
        config: ExplorerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ExplorerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let explorer = Self {
            client,
            config,
            state: Mutex::new(ExplorerState {
                scope: scope.into(),
                generation: 0,
                revision: 0,
                roots: Vec::new(),
                root_prefix: Vec::new(),
                cache: ExpansionCache::new(),
            }),
            events: EventSender::new(tx),
        };
        (explorer, rx)
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    fn fetch_context<'a>(&'a self, scope: &'a str, pattern: &'a str) -> FetchContext<'a> {
        FetchContext {
            client: self.client.as_ref(),
            scope,
            pattern,
            max_pull_depth: self.config.max_pull_depth,
        }
    }

    fn changed(&self, state: &mut ExplorerState) {
        state.clamp_cursor();
        state.revision += 1;
        self.events.send(ExplorerEvent::Changed {
            revision: state.revision,
        });
    }

    pub async fn scope(&self) -> String {
        self.state.lock().scope.clone()
    }

    pub async fn roots(&self) -> Vec<Node> {
        self.state.lock().roots.clone()
    }

    pub async fn root_prefix(&self) -> Vec<String> {
        self.state.lock().root_prefix.clone()
    }

    pub async fn flatten(&self) -> Vec<FlatNode> {
        self.state.lock().flatten()
    }

    pub async fn is_expanding(&self) -> bool {
        self.state.lock().cache.is_expanding()
    }

    pub async fn expanding_lock(&self) -> Option<NodePath> {
        self.state.lock().cache.expanding_lock().cloned()
    }

    pub async fn snapshot(&self) -> ExplorerSnapshot {
        let state = self.state.lock();
        ExplorerSnapshot {
            scope: state.scope.clone(),
            generation: state.generation,
            roots: state.roots.clone(),
            root_prefix: state.root_prefix.clone(),
            cache: state.cache.clone(),
        }
    }

    /// Installs root nodes obtained elsewhere. Cached children stay valid
    /// for the paths they were fetched under.
    pub async fn set_roots(&self, roots: Vec<Node>) {
        let mut state = self.state.lock();
        state.roots = roots;
        self.changed(&mut state);
    }

    /// Explores the scope from its root and installs the result. This is the
    /// explicit refresh: the cache is reset together with the new roots.
    pub async fn load_roots(&self, pattern: &str) -> Result<usize, ExploreError> {
        let epoch = self.state.lock().epoch();
        let entries = match self
            .client
            .explore(&epoch.scope, pattern, &NavToken::root())
            .await
        {
            Ok(entries) => entries,
            Err(err) => {
                warn!("loading roots of {} failed: {err}", epoch.scope);
                self.events.notice(Notice::load_failed(&err));
                return Err(err);
            }
        };
        let ExploreLevel { nodes, prefix } = nodes_from_entries(entries);
        let count = nodes.len();

        {
            let mut state = self.state.lock();
            if state.generation != epoch.generation {
                debug!("dropping roots loaded for stale scope {}", epoch.scope);
                return Ok(0);
            }
            state.invalidate();
            state.roots = nodes;
            state.root_prefix = prefix;
            self.changed(&mut state);
        }

        info!("loaded {count} root nodes for {}", epoch.scope);
        self.events.notice(Notice::roots_loaded(count));
        Ok(count)
    }

    /// Expands or collapses a single node.
    pub async fn toggle(
        &self,
        path: &NodePath,
        node: &Node,
        pattern: &str,
    ) -> Result<ToggleOutcome, ExploreError> {
        let epoch = {
            let mut state = self.state.lock();
            if state.cache.collapse(path) {
                self.changed(&mut state);
                return Ok(ToggleOutcome::Collapsed);
            }
            if !node.is_expandable() {
                drop(state);
                self.events.send(ExplorerEvent::LeafSelected(node.clone()));
                return Ok(ToggleOutcome::LeafSelected);
            }
            if state.cache.expand(path) {
                let children = state.cache.children_of(path).map_or(0, <[Node]>::len);
                self.changed(&mut state);
                return Ok(ToggleOutcome::Expanded { children });
            }
            state.epoch()
        };

        let children = match fetch_children(self.fetch_context(&epoch.scope, pattern), node).await {
            Ok(children) => children,
            Err(err) => {
                warn!("expanding {path} failed: {err}");
                self.events.notice(Notice::expand_failed(&err));
                return Err(err);
            }
        };

        let mut state = self.state.lock();
        if state.generation != epoch.generation {
            debug!("dropping children of {path} fetched for stale scope {}", epoch.scope);
            return Ok(ToggleOutcome::Discarded);
        }
        let count = children.len();
        state.cache.insert_expanded(path.clone(), children);
        self.changed(&mut state);
        Ok(ToggleOutcome::Expanded { children: count })
    }

    /// Opens every path that has non-empty cached children. No fetches.
    pub async fn expand_all(&self) {
        let mut state = self.state.lock();
        state.cache.expand_all();
        self.changed(&mut state);
    }

    /// Closes everything; cached children are kept.
    pub async fn collapse_to_root(&self) {
        let mut state = self.state.lock();
        state.cache.collapse_to_root();
        self.changed(&mut state);
    }

    /// Drops all cached state for the current scope. Work started before the
    /// reset will not merge its results.
    pub async fn reset(&self) {
        let mut state = self.state.lock();
        state.invalidate();
        self.changed(&mut state);
    }

    /// Switches to another scope. Returns `false` when `scope` is already
    /// active.
    pub async fn set_scope(&self, scope: impl Into<String>) -> bool {
        let scope = scope.into();
        let mut state = self.state.lock();
        if state.scope == scope {
            return false;
        }
        state.invalidate();
        state.roots.clear();
        state.root_prefix.clear();
        state.scope = scope;
        self.changed(&mut state);
        true
    }

    pub async fn cursor(&self) -> usize {
        self.state.lock().cache.cursor()
    }

    /// Moves the cursor to `line`, clamped to the visible rows.
    pub async fn set_cursor(&self, line: usize) -> usize {
        let mut state = self.state.lock();
        self.place_cursor(&mut state, line)
    }

    pub async fn move_cursor(&self, delta: isize) -> usize {
        let mut state = self.state.lock();
        let line = state.cache.cursor().saturating_add_signed(delta);
        self.place_cursor(&mut state, line)
    }

    fn place_cursor(&self, state: &mut ExplorerState, line: usize) -> usize {
        state.cache.set_cursor(line);
        self.changed(state);
        state.cache.cursor()
    }

    /// Expands visible nodes, a batch at a time, until at least `target`
    /// rows are visible or nothing more can usefully be expanded.
    pub async fn expand_to_fill_viewport(&self, target: usize, pattern: &str) -> FillOutcome {
        let epoch = {
            let mut state = self.state.lock();
            state.cache.set_expanding(true);
            self.changed(&mut state);
            state.epoch()
        };
        let flag = FillFlag {
            explorer: self,
            generation: epoch.generation,
        };

        let outcome = self.fill_viewport(target, pattern, &epoch).await;
        drop(flag);

        info!(
            "viewport fill stopped ({:?}): {} rows visible, {} nodes expanded in {} batches",
            outcome.stop, outcome.visible, outcome.expanded, outcome.batches
        );
        outcome
    }

    async fn fill_viewport(&self, target: usize, pattern: &str, epoch: &Epoch) -> FillOutcome {
        let mut visible = self.state.lock().flatten().len();
        let mut stale_attempts = 0;
        let mut outcome = FillOutcome {
            visible,
            expanded: 0,
            batches: 0,
            stop: FillStop::TargetReached,
        };

        loop {
            if visible >= target {
                outcome.stop = FillStop::TargetReached;
                break;
            }
            if stale_attempts >= self.config.max_stale_attempts {
                outcome.stop = FillStop::Stalled;
                break;
            }

            let mut update = BatchUpdate::default();
            let mut to_fetch = Vec::new();
            {
                let state = self.state.lock();
                if state.generation != epoch.generation {
                    outcome.stop = FillStop::ScopeChanged;
                    break;
                }
                let candidates = state
                    .flatten()
                    .into_iter()
                    .filter(|row| row.node.is_expandable() && !state.cache.is_expanded(&row.path))
                    .take(self.config.batch_size);
                for row in candidates {
                    if state.cache.has_children(&row.path) {
                        update.reexpand.push(row.path);
                    } else {
                        to_fetch.push(row);
                    }
                }
            }
            if to_fetch.is_empty() && update.reexpand.is_empty() {
                outcome.stop = FillStop::NoCandidates;
                break;
            }

            outcome.batches += 1;
            let ctx = self.fetch_context(&epoch.scope, pattern);
            let results = join_all(to_fetch.iter().map(|row| async move {
                (row.path.clone(), fetch_children(ctx, &row.node).await)
            }))
            .await;

            let mut failures = 0;
            let mut missing_credential = false;
            for (path, result) in results {
                match result {
                    Ok(children) => update.children.push((path, children)),
                    Err(err) => {
                        debug!("viewport fill could not expand {path}: {err}");
                        missing_credential |= err.is_missing_credential();
                        failures += 1;
                    }
                }
            }

            if update.is_empty() {
                if missing_credential && failures == to_fetch.len() {
                    self.events
                        .notice(Notice::expand_failed(&ExploreError::MissingCredential));
                    outcome.stop = FillStop::MissingCredential;
                    break;
                }
                stale_attempts += 1;
                continue;
            }

            let now = {
                let mut state = self.state.lock();
                if state.generation != epoch.generation {
                    debug!("dropping viewport batch for stale scope {}", epoch.scope);
                    outcome.stop = FillStop::ScopeChanged;
                    break;
                }
                outcome.expanded += update.children.len() + update.reexpand.len();
                state.cache.merge(update);
                self.changed(&mut state);
                state.flatten().len()
            };

            if now == visible {
                stale_attempts += 1;
            } else {
                stale_attempts = 0;
                visible = now;
            }
        }

        outcome.visible = visible;
        outcome
    }

    /// Expands the whole subtree below `start`, breadth first, up to
    /// `max_nodes` fetched nodes. Only one such walk runs at a time.
    pub async fn expand_to_leaf(
        &self,
        start: &NodePath,
        node: &Node,
        pattern: &str,
    ) -> LeafExpansion {
        let epoch = {
            let mut state = self.state.lock();
            if !state.cache.try_lock(start) {
                debug!("expand-to-leaf for {start} skipped, another walk is running");
                return LeafExpansion::Busy;
            }
            self.changed(&mut state);
            state.epoch()
        };
        let lock = LeafLock {
            explorer: self,
            generation: epoch.generation,
            armed: true,
        };

        let walk = self.walk_subtree(start, node, pattern, &epoch).await;

        let expanded = walk.fetched.len();
        {
            let mut state = self.state.lock();
            if walk.aborted || state.generation != epoch.generation {
                // The reset already released the lock; a newer walk may own it now.
                debug!("dropping expand-to-leaf results for stale scope {}", epoch.scope);
                drop(state);
                drop(lock);
                return LeafExpansion::Discarded;
            }
            state.cache.release_lock();
            lock.disarm();
            state.cache.merge(BatchUpdate {
                children: walk.fetched.into_iter().collect(),
                reexpand: walk.reexpand,
            });
            self.changed(&mut state);
        }

        if expanded >= self.config.max_nodes {
            info!("expand-to-leaf from {start} stopped at {expanded} nodes");
            self.events
                .notice(Notice::expansion_limit(self.config.max_nodes));
            return LeafExpansion::Truncated { expanded };
        }
        if expanded == 0
            && let Some(error) = walk.last_error
        {
            warn!(
                "expand-to-leaf from {start} made no progress ({} failures): {error}",
                walk.failures
            );
            self.events.notice(Notice::expansion_failed(&error));
            return LeafExpansion::Failed { error };
        }
        info!("expand-to-leaf from {start} expanded {expanded} nodes");
        LeafExpansion::Completed { expanded }
    }

    async fn walk_subtree(
        &self,
        start: &NodePath,
        node: &Node,
        pattern: &str,
        epoch: &Epoch,
    ) -> SubtreeWalk {
        let mut walk = SubtreeWalk::default();
        let mut queue: VecDeque<(NodePath, Node)> = VecDeque::new();
        queue.push_back((start.clone(), node.clone()));
        let ctx = self.fetch_context(&epoch.scope, pattern);

        while !queue.is_empty() && walk.fetched.len() < self.config.max_nodes {
            let take = self.config.leaf_batch_size.min(queue.len());
            let batch: Vec<(NodePath, Node)> = queue.drain(..take).collect();
            let mut to_fetch = Vec::new();
            {
                let state = self.state.lock();
                if state.generation != epoch.generation {
                    walk.aborted = true;
                    return walk;
                }
                for (path, node) in batch {
                    if !node.is_expandable() {
                        continue;
                    }
                    let cached = state
                        .cache
                        .children_of(&path)
                        .or_else(|| walk.fetched.get(&path).map(Vec::as_slice));
                    match cached {
                        Some(children) => {
                            enqueue_children(&mut queue, &path, children);
                            walk.reexpand.push(path);
                        }
                        None => to_fetch.push((path, node)),
                    }
                }
            }
            if to_fetch.is_empty() {
                continue;
            }
            let budget = self.config.max_nodes - walk.fetched.len();
            to_fetch.truncate(budget);

            let results = join_all(to_fetch.into_iter().map(|(path, node)| async move {
                let result = fetch_children(ctx, &node).await;
                (path, result)
            }))
            .await;

            for (path, result) in results {
                match result {
                    Ok(children) => {
                        enqueue_children(&mut queue, &path, &children);
                        walk.fetched.insert(path, children);
                    }
                    Err(err) => {
                        debug!("expand-to-leaf could not expand {path}: {err}");
                        walk.failures += 1;
                        walk.last_error = Some(err);
                    }
                }
            }
        }
        walk
    }
}

fn enqueue_children(queue: &mut VecDeque<(NodePath, Node)>, parent: &NodePath, children: &[Node]) {
    for (index, child) in children.iter().enumerate() {
        queue.push_back((parent.child(child, index), child.clone()));
    }
}
