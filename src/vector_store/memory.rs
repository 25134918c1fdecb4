//! In-memory vector store used by tests and offline runs.

use super::{Namespace, QueryMatch, VectorRecord, VectorStore};
use anyhow::Result;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryVectorStore {
    inner: RwLock<HashMap<Namespace, HashMap<String, VectorRecord>>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, namespace: Namespace) -> usize {
        self.inner
            .read()
            .map(|map| map.get(&namespace).map_or(0, |ns| ns.len()))
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        Namespace::ALL.iter().map(|ns| self.count(*ns)).sum()
    }

    /// Sorted ids currently stored in a namespace
    pub fn ids(&self, namespace: Namespace) -> Vec<String> {
        let mut ids = self
            .inner
            .read()
            .map(|map| {
                map.get(&namespace)
                    .map_or_else(Vec::new, |ns| ns.keys().cloned().collect())
            })
            .unwrap_or_default();
        ids.sort();
        ids
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait::async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, namespace: Namespace, records: Vec<VectorRecord>) -> Result<usize> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| anyhow::anyhow!("vector store lock poisoned"))?;
        let entries = map.entry(namespace).or_default();
        let count = records.len();
        for record in records {
            entries.insert(record.id.clone(), record);
        }
        Ok(count)
    }

    async fn query(
        &self,
        namespace: Namespace,
        vector: Vec<f32>,
        top_k: usize,
    ) -> Result<Vec<QueryMatch>> {
        let map = self
            .inner
            .read()
            .map_err(|_| anyhow::anyhow!("vector store lock poisoned"))?;
        let mut matches: Vec<QueryMatch> = map
            .get(&namespace)
            .map(|entries| {
                entries
                    .values()
                    .map(|record| QueryMatch {
                        id: record.id.clone(),
                        score: cosine_similarity(&vector, &record.values),
                        metadata: record.metadata.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn delete_ids(&self, namespace: Namespace, ids: &[String]) -> Result<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| anyhow::anyhow!("vector store lock poisoned"))?;
        if let Some(entries) = map.get_mut(&namespace) {
            for id in ids {
                entries.remove(id);
            }
        }
        Ok(())
    }

    async fn delete_all(&self, namespace: Namespace) -> Result<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| anyhow::anyhow!("vector store lock poisoned"))?;
        map.remove(&namespace);
        Ok(())
    }
}
