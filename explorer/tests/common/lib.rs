//! Scripted explore backend and helpers for the explorer integration suite.

use async_trait::async_trait;
use mettakg_explorer::ExploreClient;
use mettakg_explorer::ExploreEntry;
use mettakg_explorer::ExploreError;
use mettakg_explorer::ExplorerConfig;
use mettakg_explorer::ExplorerEvent;
use mettakg_explorer::FlatNode;
use mettakg_explorer::NavToken;
use mettakg_explorer::TreeExplorer;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::sync::watch;

/// One recorded `explore` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub scope: String,
    pub pattern: String,
    pub token: Vec<u8>,
}

/// In-memory trie keyed by navigation token.
///
/// Unknown tokens answer with no children. A space built with
/// [`FakeSpace::branching`] instead invents `fanout` children for every
/// token, so it never runs out of nodes.
pub struct FakeSpace {
    levels: HashMap<Vec<u8>, Vec<ExploreEntry>>,
    failures: Mutex<HashMap<Vec<u8>, ExploreError>>,
    fail_all: Option<ExploreError>,
    fanout: Option<u8>,
    calls: Mutex<Vec<Call>>,
    seen: watch::Sender<usize>,
    held_at: Mutex<usize>,
    gate: watch::Sender<bool>,
}

impl Default for FakeSpace {
    fn default() -> Self {
        let (gate, _) = watch::channel(true);
        let (seen, _) = watch::channel(0);
        Self {
            levels: HashMap::new(),
            failures: Mutex::new(HashMap::new()),
            fail_all: None,
            fanout: None,
            calls: Mutex::new(Vec::new()),
            seen,
            held_at: Mutex::new(0),
            gate,
        }
    }
}

impl FakeSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Children returned when exploring `token`.
    pub fn level(mut self, token: &[u8], entries: Vec<ExploreEntry>) -> Self {
        self.levels.insert(token.to_vec(), entries);
        self
    }

    pub fn fail(self, token: &[u8], err: ExploreError) -> Self {
        self.failures.lock().unwrap().insert(token.to_vec(), err);
        self
    }

    /// Lets a previously failing token answer normally.
    pub fn heal(&self, token: &[u8]) {
        self.failures.lock().unwrap().remove(token);
    }

    pub fn fail_everything(mut self, err: ExploreError) -> Self {
        self.fail_all = Some(err);
        self
    }

    pub fn branching(mut self, fanout: u8) -> Self {
        self.fanout = Some(fanout);
        self
    }

    /// Makes every subsequent call wait until [`FakeSpace::release`].
    pub fn hold(&self) {
        *self.held_at.lock().unwrap() = *self.seen.borrow();
        self.gate.send_replace(false);
    }

    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Resolves once a call made after [`FakeSpace::hold`] has reached the
    /// backend.
    pub async fn wait_for_call(&self) {
        let held_at = *self.held_at.lock().unwrap();
        let mut seen = self.seen.subscribe();
        let _ = seen.wait_for(|count| *count > held_at).await;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, token: &[u8]) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.token == token)
            .count()
    }

    fn answer(&self, token: &[u8]) -> Result<Vec<ExploreEntry>, ExploreError> {
        if let Some(err) = &self.fail_all {
            return Err(err.clone());
        }
        if let Some(err) = self.failures.lock().unwrap().get(token) {
            return Err(err.clone());
        }
        if let Some(entries) = self.levels.get(token) {
            return Ok(entries.clone());
        }
        let Some(fanout) = self.fanout else {
            return Ok(Vec::new());
        };
        Ok((0..fanout)
            .map(|index| {
                let mut child = token.to_vec();
                child.push(index);
                ExploreEntry::new(format!("(node {})", key(&child)), child)
            })
            .collect())
    }
}

#[async_trait]
impl ExploreClient for FakeSpace {
    async fn explore(
        &self,
        scope: &str,
        pattern: &str,
        token: &NavToken,
    ) -> Result<Vec<ExploreEntry>, ExploreError> {
        self.calls.lock().unwrap().push(Call {
            scope: scope.to_string(),
            pattern: pattern.to_string(),
            token: token.as_bytes().to_vec(),
        });
        self.seen.send_modify(|count| *count += 1);

        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;
        self.answer(token.as_bytes())
    }
}

fn key(token: &[u8]) -> String {
    token
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join("-")
}

/// A child that can be explored further through `token`.
pub fn branch(expr: &str, token: &[u8]) -> ExploreEntry {
    ExploreEntry::new(expr, token.to_vec())
}

/// A child with a terminal token.
pub fn leaf(expr: &str) -> ExploreEntry {
    ExploreEntry::new(expr, vec![0xFF])
}

pub struct TestExplorer {
    pub explorer: Arc<TreeExplorer>,
    pub space: Arc<FakeSpace>,
    pub events: mpsc::UnboundedReceiver<ExplorerEvent>,
}

impl TestExplorer {
    pub fn drain_events(&mut self) -> Vec<ExplorerEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    /// Notices only, in emission order.
    pub fn drain_notices(&mut self) -> Vec<mettakg_explorer::Notice> {
        self.drain_events()
            .into_iter()
            .filter_map(|event| match event {
                ExplorerEvent::Notice(notice) => Some(notice),
                _ => None,
            })
            .collect()
    }
}

pub fn test_explorer(space: FakeSpace) -> TestExplorer {
    test_explorer_with_config(space, ExplorerConfig::default())
}

pub fn test_explorer_with_config(space: FakeSpace, config: ExplorerConfig) -> TestExplorer {
    let space = Arc::new(space);
    let (explorer, events) = TreeExplorer::new(space.clone(), "/", config);
    TestExplorer {
        explorer: Arc::new(explorer),
        space,
        events,
    }
}

/// Rows as `depth` spaces followed by the expression.
pub fn render(rows: &[FlatNode]) -> Vec<String> {
    rows.iter()
        .map(|row| format!("{}{}", "  ".repeat(row.depth), row.node.expr))
        .collect()
}
