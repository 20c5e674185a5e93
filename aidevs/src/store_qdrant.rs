use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{require, Config};
use crate::error::{Error, Result};
use crate::http::{post_json, put_json, HttpRequest, Method, Transport};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distance {
    Cosine,
    Dot,
    Euclid,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: Value,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ScoredPoint {
    pub id: u64,
    pub score: f32,
    #[serde(default)]
    pub payload: Value,
}

/// Collection-oriented vector store.
pub trait VectorStore: Send + Sync {
    /// Drops the collection if it exists and creates it empty.
    fn recreate_collection(&self, name: &str, size: usize, distance: Distance) -> Result<()>;

    /// Inserts or overwrites points by id.
    fn upsert(&self, name: &str, points: &[Point]) -> Result<()>;

    /// Nearest neighbours of `vector`, best first.
    fn query(&self, name: &str, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>>;

    fn count(&self, name: &str) -> Result<usize>;
}

#[derive(Serialize)]
struct CreateCollection {
    vectors: VectorParams,
}

#[derive(Serialize)]
struct VectorParams {
    size: usize,
    distance: Distance,
}

#[derive(Serialize)]
struct UpsertPoints<'a> {
    points: &'a [Point],
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Serialize)]
struct CountRequest {
    exact: bool,
}

#[derive(Deserialize)]
struct QdrantResponse<T> {
    result: Option<T>,
}

#[derive(Deserialize)]
struct QueryResult {
    #[serde(default)]
    points: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct CountResult {
    count: usize,
}

pub struct QdrantStore {
    transport: Arc<dyn Transport>,
    url: String,
    api_key: Option<String>,
}

impl QdrantStore {
    pub fn new(transport: Arc<dyn Transport>, url: &str, api_key: Option<String>) -> Self {
        Self {
            transport,
            url: url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Both `QDRANT_URL` and `QDRANT_API_KEY` are required, as for the hosted
    /// cluster the tasks run against.
    pub fn from_config(cfg: &Config, transport: Arc<dyn Transport>) -> Result<Self> {
        let url = require(&cfg.qdrant_url, "QDRANT_URL")?;
        let key = require(&cfg.qdrant_api_key, "QDRANT_API_KEY")?;
        Ok(Self::new(transport, url, Some(key.to_string())))
    }

    fn request(&self, method: Method, path: &str) -> HttpRequest {
        let req = HttpRequest::new(method, format!("{}{}", self.url, path));
        match &self.api_key {
            Some(key) => req.header("api-key", key.as_str()),
            None => req,
        }
    }
}

impl VectorStore for QdrantStore {
    fn recreate_collection(&self, name: &str, size: usize, distance: Distance) -> Result<()> {
        let path = format!("/collections/{}", name);
        match self.transport.execute(&self.request(Method::Delete, &path)) {
            Ok(_) => debug!(collection = name, "dropped collection"),
            Err(Error::Network {
                status: Some(404), ..
            }) => {}
            Err(err) => return Err(err),
        }
        let body = CreateCollection {
            vectors: VectorParams { size, distance },
        };
        let _ = put_json::<QdrantResponse<Value>, _>(
            self.transport.as_ref(),
            self.request(Method::Put, &path),
            &body,
        )?;
        info!(collection = name, size, ?distance, "collection created");
        Ok(())
    }

    fn upsert(&self, name: &str, points: &[Point]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let path = format!("/collections/{}/points?wait=true", name);
        let body = UpsertPoints { points };
        let _ = put_json::<QdrantResponse<Value>, _>(
            self.transport.as_ref(),
            self.request(Method::Put, &path),
            &body,
        )?;
        Ok(())
    }

    fn query(&self, name: &str, vector: &[f32], limit: usize) -> Result<Vec<ScoredPoint>> {
        if vector.is_empty() {
            return Ok(vec![]);
        }
        let path = format!("/collections/{}/points/query", name);
        let req = QueryRequest {
            query: vector,
            limit,
            with_payload: true,
        };
        let res = post_json::<QdrantResponse<QueryResult>, _>(
            self.transport.as_ref(),
            self.request(Method::Post, &path),
            &req,
        )?;
        Ok(res.result.map(|r| r.points).unwrap_or_default())
    }

    fn count(&self, name: &str) -> Result<usize> {
        let path = format!("/collections/{}/points/count", name);
        let res = post_json::<QdrantResponse<CountResult>, _>(
            self.transport.as_ref(),
            self.request(Method::Post, &path),
            &CountRequest { exact: true },
        )?;
        res.result
            .map(|r| r.count)
            .ok_or_else(|| Error::Parse("count response has no result".to_string()))
    }
}
