use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{require, Config};
use crate::error::{Error, Result};
use crate::http::{post_json, HttpRequest, Method, Transport};

#[derive(Serialize)]
struct QueryBody<'a> {
    task: &'a str,
    apikey: &'a str,
    query: &'a str,
}

/// SQL-over-HTTP endpoint used by the database tasks.
pub struct ApiDbClient {
    transport: Arc<dyn Transport>,
    url: Option<String>,
    api_key: Option<String>,
}

impl ApiDbClient {
    pub fn new(transport: Arc<dyn Transport>, url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            transport,
            url,
            api_key,
        }
    }

    pub fn from_config(cfg: &Config, transport: Arc<dyn Transport>) -> Self {
        Self::new(transport, cfg.apidb_url.clone(), cfg.api_key.clone())
    }

    pub fn query(&self, task: &str, query: &str) -> Result<Value> {
        let url = require(&self.url, "APIDB_URL")?;
        let apikey = require(&self.api_key, "AIDEVS3_API_KEY")?;
        info!(task, query, "running apidb query");
        let body = QueryBody { task, apikey, query };
        let res: Value = post_json(self.transport.as_ref(), HttpRequest::new(Method::Post, url), &body)?;
        debug!(response = %res, "apidb response");
        Ok(res)
    }

    /// Rows of the `reply` array.
    pub fn reply_rows(&self, task: &str, query: &str) -> Result<Vec<Value>> {
        let res = self.query(task, query)?;
        match res.get("reply") {
            Some(Value::Array(rows)) => Ok(rows.clone()),
            _ => Err(Error::Parse(format!("apidb response has no reply array: {}", res))),
        }
    }

    /// DDL of `table` from `show create table`.
    pub fn show_create_table(&self, task: &str, table: &str) -> Result<String> {
        let rows = self.reply_rows(task, &format!("show create table {}", table))?;
        rows.first()
            .and_then(|row| row.get("Create Table"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::Parse(format!("no 'Create Table' for {}", table)))
    }
}
