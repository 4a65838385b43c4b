//! Test fixtures: stores, contexts and fake external APIs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::canvas::{CanvasKey, Edge, EdgeId, Node, NodeId};
use crate::engine::GraphContext;
use crate::provider::{CompletionApi, CompletionOutput, CompletionRequest, Paper, SearchApi};
use crate::store::{CanvasSnapshot, DocumentSnapshot, DocumentStore, InMemoryStore, StoreEvent};
use crate::{Error, Result};

/// Id of the root canvas used by fixtures.
pub const CANVAS: &str = "main";

/// Creates a store holding an empty root canvas.
pub fn store() -> Arc<InMemoryStore> {
    store_with(Vec::new(), Vec::new())
}

/// Creates a store whose root canvas holds `nodes` and `edges`.
pub fn store_with(nodes: Vec<Node>, edges: Vec<Edge>) -> Arc<InMemoryStore> {
    let mut snapshot = DocumentSnapshot::default();
    snapshot
        .canvases
        .insert(CANVAS.to_owned(), CanvasSnapshot { nodes, edges });
    Arc::new(InMemoryStore::from_snapshot(snapshot))
}

/// Writes the nested canvas of `owner`.
pub async fn put_nested(store: &InMemoryStore, owner: &NodeId, nodes: Vec<Node>) {
    store
        .insert_canvas(
            CanvasKey::nested(owner),
            CanvasSnapshot {
                nodes,
                edges: Vec::new(),
            },
        )
        .await;
}

/// Creates a context for the fixture root canvas.
pub async fn graph_context(store: Arc<InMemoryStore>) -> GraphContext {
    let canvas = CanvasKey::root(CANVAS);
    debug_assert!(store.has_canvas(&canvas).await.unwrap_or(false));
    GraphContext::new(store, canvas)
}

/// Completion API replaying canned responses and recording requests.
#[derive(Debug, Default)]
pub struct FakeCompletion {
    responses: Mutex<VecDeque<Result<Value>>>,
    fallback: Option<Value>,
    requests: Mutex<Vec<CompletionRequest>>,
    cancel_on_call: Option<CancellationToken>,
}

impl FakeCompletion {
    /// Answers every request with `value`.
    pub fn always(value: Value) -> Self {
        Self {
            fallback: Some(value),
            ..Self::default()
        }
    }

    /// Answers requests with `responses` in order, then fails.
    pub fn sequence(responses: impl IntoIterator<Item = Result<Value>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Cancels `token` whenever a request arrives.
    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel_on_call = Some(token);
        self
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionApi for FakeCompletion {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionOutput> {
        self.requests.lock().unwrap().push(request);
        if let Some(token) = &self.cancel_on_call {
            token.cancel();
        }
        let next = self.responses.lock().unwrap().pop_front();
        match (next, &self.fallback) {
            (Some(response), _) => response.map(CompletionOutput::Object),
            (None, Some(value)) => Ok(CompletionOutput::Object(value.clone())),
            (None, None) => Err(Error::Completion("no canned response left".into())),
        }
    }
}

/// Search API returning fixed papers and recording queries.
#[derive(Debug, Default)]
pub struct FakeSearch {
    papers: Vec<Paper>,
    queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    /// Answers every query with `papers`.
    pub fn returning(papers: Vec<Paper>) -> Self {
        Self {
            papers,
            queries: Mutex::default(),
        }
    }

    /// Returns the queries received so far.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchApi for FakeSearch {
    async fn search(&self, query: &str) -> Result<Vec<Paper>> {
        self.queries.lock().unwrap().push(query.to_owned());
        Ok(self.papers.clone())
    }
}

/// Store wrapper recording node writes, optionally failing nested writes.
#[derive(Debug)]
pub struct SpyStore {
    inner: Arc<InMemoryStore>,
    nested_writes_left: Option<AtomicUsize>,
    unreadable: Option<CanvasKey>,
    writes: Mutex<Vec<(CanvasKey, Node)>>,
}

impl SpyStore {
    /// Wraps `inner`, passing every call through.
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            nested_writes_left: None,
            unreadable: None,
            writes: Mutex::default(),
        }
    }

    /// Lets `count` nested node writes succeed, then rejects the rest.
    pub fn failing_nested_after(mut self, count: usize) -> Self {
        self.nested_writes_left = Some(AtomicUsize::new(count));
        self
    }

    /// Fails every read of the canvas nested inside `owner`.
    pub fn failing_nested_reads_of(mut self, owner: impl Into<NodeId>) -> Self {
        self.unreadable = Some(CanvasKey::Nested(owner.into()));
        self
    }

    /// Returns the versions of node `id` written to `canvas`, in order.
    pub fn writes_of(&self, canvas: &CanvasKey, id: &NodeId) -> Vec<Node> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, node)| key == canvas && &node.id == id)
            .map(|(_, node)| node.clone())
            .collect()
    }
}

#[async_trait]
impl DocumentStore for SpyStore {
    async fn has_canvas(&self, canvas: &CanvasKey) -> Result<bool> {
        self.inner.has_canvas(canvas).await
    }

    async fn nodes(&self, canvas: &CanvasKey) -> Result<Vec<Node>> {
        if self.unreadable.as_ref() == Some(canvas) {
            return Err(Error::store("read rejected"));
        }
        self.inner.nodes(canvas).await
    }

    async fn edges(&self, canvas: &CanvasKey) -> Result<Vec<Edge>> {
        self.inner.edges(canvas).await
    }

    async fn get_node(&self, canvas: &CanvasKey, id: &NodeId) -> Result<Option<Node>> {
        self.inner.get_node(canvas, id).await
    }

    async fn set_node(&self, canvas: &CanvasKey, node: Node) -> Result<()> {
        if let (CanvasKey::Nested(_), Some(left)) = (canvas, &self.nested_writes_left) {
            let remaining = left.load(Ordering::SeqCst);
            if remaining == 0 {
                return Err(Error::store("write rejected"));
            }
            left.store(remaining - 1, Ordering::SeqCst);
        }
        self.writes
            .lock()
            .unwrap()
            .push((canvas.clone(), node.clone()));
        self.inner.set_node(canvas, node).await
    }

    async fn delete_node(&self, canvas: &CanvasKey, id: &NodeId) -> Result<()> {
        self.inner.delete_node(canvas, id).await
    }

    async fn set_edge(&self, canvas: &CanvasKey, edge: Edge) -> Result<()> {
        self.inner.set_edge(canvas, edge).await
    }

    async fn delete_edge(&self, canvas: &CanvasKey, id: &EdgeId) -> Result<()> {
        self.inner.delete_edge(canvas, id).await
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.subscribe()
    }
}
