//! Document snapshot files.

use std::path::Path;

use anyhow::Context;
use promptcanvas_runtime::store::DocumentSnapshot;

use crate::TRACING_TARGET_SNAPSHOT;

/// Reads a document snapshot from a JSON file.
pub async fn load(path: &Path) -> anyhow::Result<DocumentSnapshot> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let snapshot: DocumentSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("invalid snapshot {}", path.display()))?;

    tracing::debug!(
        target: TRACING_TARGET_SNAPSHOT,
        path = %path.display(),
        canvases = snapshot.canvases.len(),
        nested = snapshot.nested.len(),
        "Snapshot loaded"
    );
    Ok(snapshot)
}

/// Writes a document snapshot as pretty-printed JSON.
pub async fn save(path: &Path, snapshot: &DocumentSnapshot) -> anyhow::Result<()> {
    let raw = serde_json::to_string_pretty(snapshot).context("failed to serialize snapshot")?;
    tokio::fs::write(path, raw)
        .await
        .with_context(|| format!("failed to write snapshot {}", path.display()))?;

    tracing::debug!(
        target: TRACING_TARGET_SNAPSHOT,
        path = %path.display(),
        "Snapshot written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use promptcanvas_runtime::canvas::{Node, NodeRole};
    use promptcanvas_runtime::store::CanvasSnapshot;

    use super::*;

    #[tokio::test]
    async fn saved_snapshot_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");

        let mut snapshot = DocumentSnapshot::default();
        snapshot.canvases.insert(
            "main".into(),
            CanvasSnapshot {
                nodes: vec![Node::new("p", NodeRole::Prompt).with_title("Ask")],
                edges: Vec::new(),
            },
        );

        save(&path, &snapshot).await.unwrap();
        assert_eq!(load(&path).await.unwrap(), snapshot);
    }

    #[tokio::test]
    async fn missing_file_has_context() {
        let error = load(Path::new("/nonexistent/doc.json")).await.unwrap_err();
        assert!(error.to_string().contains("failed to read snapshot"));
    }
}
