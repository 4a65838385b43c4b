//! In-memory document store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};

use super::{Change, DocumentStore, StoreEvent};
use crate::Result;
use crate::canvas::{CanvasKey, CollectionKey, Edge, EdgeId, Node, NodeId};

/// Tracing target for store operations.
const TRACING_TARGET: &str = "promptcanvas_runtime::store";

/// Capacity of the change notification channel.
const EVENT_CAPACITY: usize = 1024;

/// Node and edge collections of one canvas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasSnapshot {
    /// Nodes in document order.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Edges in document order.
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// Serializable snapshot of a whole document.
///
/// `nested` maps an owner node id to the canvas nested inside it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Top-level canvases by id.
    #[serde(default)]
    pub canvases: BTreeMap<String, CanvasSnapshot>,
    /// Nested canvases by owner node id.
    #[serde(default)]
    pub nested: BTreeMap<NodeId, CanvasSnapshot>,
}

/// Document store kept entirely in memory.
#[derive(Debug)]
pub struct InMemoryStore {
    canvases: RwLock<BTreeMap<CanvasKey, CanvasSnapshot>>,
    events: broadcast::Sender<StoreEvent>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            canvases: RwLock::new(BTreeMap::new()),
            events,
        }
    }

    /// Creates a store holding the canvases of a snapshot.
    pub fn from_snapshot(snapshot: DocumentSnapshot) -> Self {
        let canvases = snapshot
            .canvases
            .into_iter()
            .map(|(id, canvas)| (CanvasKey::Root(id), canvas))
            .chain(
                snapshot
                    .nested
                    .into_iter()
                    .map(|(owner, canvas)| (CanvasKey::Nested(owner), canvas)),
            )
            .collect();

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            canvases: RwLock::new(canvases),
            events,
        }
    }

    /// Replaces (or creates) a whole canvas.
    pub async fn insert_canvas(&self, canvas: CanvasKey, content: CanvasSnapshot) {
        self.canvases.write().await.insert(canvas, content);
    }

    /// Exports the current state as a snapshot.
    pub async fn snapshot(&self) -> DocumentSnapshot {
        let canvases = self.canvases.read().await;
        let mut snapshot = DocumentSnapshot::default();
        for (key, canvas) in canvases.iter() {
            match key {
                CanvasKey::Root(id) => {
                    snapshot.canvases.insert(id.clone(), canvas.clone());
                }
                CanvasKey::Nested(owner) => {
                    snapshot.nested.insert(owner.clone(), canvas.clone());
                }
            }
        }
        snapshot
    }

    fn notify(&self, key: CollectionKey, id: String, change: Change) {
        tracing::trace!(
            target: TRACING_TARGET,
            collection = %key,
            id = %id,
            ?change,
            "collection changed"
        );
        // No receivers is fine: nobody is observing.
        let _ = self.events.send(StoreEvent { key, id, change });
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn has_canvas(&self, canvas: &CanvasKey) -> Result<bool> {
        Ok(self.canvases.read().await.contains_key(canvas))
    }

    async fn nodes(&self, canvas: &CanvasKey) -> Result<Vec<Node>> {
        let canvases = self.canvases.read().await;
        Ok(canvases
            .get(canvas)
            .map(|c| c.nodes.clone())
            .unwrap_or_default())
    }

    async fn edges(&self, canvas: &CanvasKey) -> Result<Vec<Edge>> {
        let canvases = self.canvases.read().await;
        Ok(canvases
            .get(canvas)
            .map(|c| c.edges.clone())
            .unwrap_or_default())
    }

    async fn get_node(&self, canvas: &CanvasKey, id: &NodeId) -> Result<Option<Node>> {
        let canvases = self.canvases.read().await;
        Ok(canvases
            .get(canvas)
            .and_then(|c| c.nodes.iter().find(|n| &n.id == id))
            .cloned())
    }

    async fn set_node(&self, canvas: &CanvasKey, node: Node) -> Result<()> {
        let id = node.id.to_string();
        {
            let mut canvases = self.canvases.write().await;
            let nodes = &mut canvases.entry(canvas.clone()).or_default().nodes;
            match nodes.iter_mut().find(|n| n.id == node.id) {
                Some(existing) => *existing = node,
                None => nodes.push(node),
            }
        }
        self.notify(canvas.nodes(), id, Change::Set);
        Ok(())
    }

    async fn delete_node(&self, canvas: &CanvasKey, id: &NodeId) -> Result<()> {
        let removed = {
            let mut canvases = self.canvases.write().await;
            match canvases.get_mut(canvas) {
                Some(c) => {
                    let before = c.nodes.len();
                    c.nodes.retain(|n| &n.id != id);
                    c.nodes.len() != before
                }
                None => false,
            }
        };
        if removed {
            self.notify(canvas.nodes(), id.to_string(), Change::Deleted);
        }
        Ok(())
    }

    async fn set_edge(&self, canvas: &CanvasKey, edge: Edge) -> Result<()> {
        let id = edge.id.to_string();
        {
            let mut canvases = self.canvases.write().await;
            let edges = &mut canvases.entry(canvas.clone()).or_default().edges;
            match edges.iter_mut().find(|e| e.id == edge.id) {
                Some(existing) => *existing = edge,
                None => edges.push(edge),
            }
        }
        self.notify(canvas.edges(), id, Change::Set);
        Ok(())
    }

    async fn delete_edge(&self, canvas: &CanvasKey, id: &EdgeId) -> Result<()> {
        let removed = {
            let mut canvases = self.canvases.write().await;
            match canvases.get_mut(canvas) {
                Some(c) => {
                    let before = c.edges.len();
                    c.edges.retain(|e| &e.id != id);
                    c.edges.len() != before
                }
                None => false,
            }
        };
        if removed {
            self.notify(canvas.edges(), id.to_string(), Change::Deleted);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::NodeRole;

    #[tokio::test]
    async fn set_node_overwrites_in_place() {
        let store = InMemoryStore::new();
        let canvas = CanvasKey::root("main");

        store
            .set_node(&canvas, Node::new("a", NodeRole::Prompt).with_title("one"))
            .await
            .unwrap();
        store
            .set_node(&canvas, Node::new("b", NodeRole::Default))
            .await
            .unwrap();
        store
            .set_node(&canvas, Node::new("a", NodeRole::Prompt).with_title("two"))
            .await
            .unwrap();

        let nodes = store.nodes(&canvas).await.unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].title(), "two");
    }

    #[tokio::test]
    async fn missing_nested_canvas_reads_empty() {
        let store = InMemoryStore::new();
        let canvas = CanvasKey::nested(&NodeId::from("owner"));

        assert!(!store.has_canvas(&canvas).await.unwrap());
        assert!(store.nodes(&canvas).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mutations_are_observable() {
        let store = InMemoryStore::new();
        let canvas = CanvasKey::nested(&NodeId::from("owner"));
        let mut events = store.subscribe();

        store
            .set_node(&canvas, Node::new("x", NodeRole::Default))
            .await
            .unwrap();
        store.delete_node(&canvas, &NodeId::from("x")).await.unwrap();

        let set = events.recv().await.unwrap();
        assert_eq!(set.key.to_string(), "owner-canvas-nodes");
        assert_eq!(set.change, Change::Set);
        assert_eq!(events.recv().await.unwrap().change, Change::Deleted);
    }

    #[tokio::test]
    async fn snapshot_round_trips_nested_canvases() {
        let owner = NodeId::from("owner");
        let store = InMemoryStore::new();
        store
            .set_node(&CanvasKey::root("main"), Node::new("owner", NodeRole::ResponseMultiple))
            .await
            .unwrap();
        store
            .set_node(&CanvasKey::nested(&owner), Node::new("child", NodeRole::Default))
            .await
            .unwrap();

        let snapshot = store.snapshot().await;
        assert!(snapshot.canvases.contains_key("main"));
        assert_eq!(snapshot.nested[&owner].nodes.len(), 1);

        let restored = InMemoryStore::from_snapshot(snapshot);
        assert!(restored.has_canvas(&CanvasKey::nested(&owner)).await.unwrap());
    }
}
