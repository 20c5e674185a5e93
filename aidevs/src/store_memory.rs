//! In-process [`VectorStore`] with brute-force similarity search.
//!
//! Used by tests and for dry runs that should not touch a Qdrant cluster.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::error::{Error, Result};
use crate::store_qdrant::{Distance, Point, ScoredPoint, VectorStore};

struct Collection {
    size: usize,
    distance: Distance,
    points: BTreeMap<u64, Point>,
}

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self, name: &str) -> Vec<Point> {
        self.collections
            .read()
            .map(|c| {
                c.get(name)
                    .map(|col| col.points.values().cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::Io(std::io::Error::other("memory store lock poisoned"))
}

fn missing(name: &str) -> Error {
    Error::network(Some(404), format!("collection {} not found", name))
}

fn score(distance: Distance, a: &[f32], b: &[f32]) -> f32 {
    match distance {
        Distance::Cosine => cosine_sim(a, b),
        Distance::Dot => a.iter().zip(b).map(|(x, y)| x * y).sum(),
        Distance::Euclid => -a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
    }
}

pub fn cosine_sim(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

impl VectorStore for MemoryStore {
    fn recreate_collection(&self, name: &str, size: usize, distance: Distance) -> Result<()> {
        let mut collections = self.collections.write().map_err(poisoned)?;
        collections.insert(
            name.to_string(),
            Collection {
                size,
                distance,
                points: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn upsert(&self, name: &str, points: &[Point]) -> Result<()> {
        let mut collections = self.collections.write().map_err(poisoned)?;
        let col = collections.get_mut(name).ok_or_else(|| missing(name))?;
        for point in points {
            if point.vector.len() != col.size {
                return Err(Error::InvalidInput(format!(
                    "point {} has {} dimensions, collection {} expects {}",
                    point.id,
                    point.vector.len(),
                    name,
                    col.size
                )));
            }
            col.points.insert(point.id, point.clone());
        }
        Ok(())
    }

    fn query(&self, name: &str, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
        let collections = self.collections.read().map_err(poisoned)?;
        let col = collections.get(name).ok_or_else(|| missing(name))?;
        let mut scored: Vec<ScoredPoint> = col
            .points
            .values()
            .map(|p| ScoredPoint {
                id: p.id,
                score: score(col.distance, vector, &p.vector),
                payload: p.payload.clone(),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(limit);
        Ok(scored)
    }

    fn count(&self, name: &str) -> Result<usize> {
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections.get(name).map(|c| c.points.len()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point(id: u64, vector: Vec<f32>) -> Point {
        Point {
            id,
            vector,
            payload: json!({ "filename": format!("{id}.txt") }),
        }
    }

    #[test]
    fn query_ranks_by_cosine_similarity() {
        let store = MemoryStore::new();
        store.recreate_collection("c", 2, Distance::Cosine).expect("create");
        store
            .upsert("c", &[point(1, vec![1.0, 0.0]), point(2, vec![0.0, 1.0])])
            .expect("upsert");
        let hits = store.query("c", &[0.1, 0.9], 1).expect("query");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 2);
    }

    #[test]
    fn recreate_discards_existing_points() {
        let store = MemoryStore::new();
        store.recreate_collection("c", 2, Distance::Cosine).expect("create");
        store.upsert("c", &[point(1, vec![1.0, 0.0])]).expect("upsert");
        store.recreate_collection("c", 2, Distance::Cosine).expect("recreate");
        assert_eq!(store.count("c").expect("count"), 0);
    }

    #[test]
    fn rejects_wrong_dimensions() {
        let store = MemoryStore::new();
        store.recreate_collection("c", 3, Distance::Cosine).expect("create");
        let err = store.upsert("c", &[point(1, vec![1.0])]).expect_err("size mismatch");
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
