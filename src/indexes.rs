//! Document indexes for retrieval.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::constants::indexes::{
    ADD_DOCUMENT_SEGMENT, DEFAULT_TOP_K, INDEXES_ENDPOINT, QUERY_SEGMENT,
};
use crate::core::{HttpClient, IndexRef, OpperError};
use crate::types::{Document, Filter, Index, RetrievalResponse};

/// Client for the index endpoints. Obtained from [`crate::Opper::indexes`].
#[derive(Debug, Clone)]
pub struct Indexes {
    http: Arc<HttpClient>,
}

/// A retrieval query against one index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    #[serde(rename = "q")]
    pub text: String,
    pub k: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            k: DEFAULT_TOP_K,
            filters: Vec::new(),
        }
    }

    /// Number of hits to return.
    pub fn top_k(mut self, k: u32) -> Self {
        self.k = k;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }
}

impl Indexes {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn create(&self, name: &str) -> Result<Index, OpperError> {
        if name.trim().is_empty() {
            return Err(OpperError::invalid_argument("name", "must not be empty"));
        }
        self.http
            .post_json(INDEXES_ENDPOINT, &json!({ "name": name }))
            .await
    }

    /// Looks up an index. Names are resolved against [`Indexes::list`].
    #[tracing::instrument(skip(self), err)]
    pub async fn get(&self, index: IndexRef) -> Result<Index, OpperError> {
        match index {
            IndexRef::ById(id) => self.http.get_json(&format!("{INDEXES_ENDPOINT}/{id}")).await,
            IndexRef::ByName(name) => self
                .list()
                .await?
                .into_iter()
                .find(|index| index.name == name)
                .ok_or_else(|| OpperError::NotFound {
                    message: format!("No index named `{name}`"),
                }),
        }
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn list(&self) -> Result<Vec<Index>, OpperError> {
        self.http.get_json(INDEXES_ENDPOINT).await
    }

    /// Returns `false` when the index did not exist.
    #[tracing::instrument(skip(self), err)]
    pub async fn delete(&self, id: u64) -> Result<bool, OpperError> {
        self.http.delete(&format!("{INDEXES_ENDPOINT}/{id}")).await
    }

    /// Adds a document and returns it as stored by the server.
    #[tracing::instrument(skip(self, document), fields(key = ?document.key), err)]
    pub async fn add(&self, id: u64, document: Document) -> Result<Document, OpperError> {
        if document.content().is_none() {
            return Err(OpperError::invalid_argument(
                "content",
                "must contain at least one character",
            ));
        }
        self.http
            .post_json(&format!("{INDEXES_ENDPOINT}/{id}{ADD_DOCUMENT_SEGMENT}"), &document)
            .await
    }

    #[tracing::instrument(
        skip(self, query),
        fields(k = query.k, filters = query.filters.len()),
        err
    )]
    pub async fn query(&self, id: u64, query: Query) -> Result<Vec<RetrievalResponse>, OpperError> {
        if query.k == 0 {
            return Err(OpperError::invalid_argument("k", "must be at least 1"));
        }
        let hits: Vec<RetrievalResponse> = self
            .http
            .post_json(&format!("{INDEXES_ENDPOINT}/{id}{QUERY_SEGMENT}"), &query)
            .await?;
        debug!(hits = hits.len(), "Index queried");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FilterOp;

    #[test]
    fn test_query_wire_format() {
        let query = Query::new("what is rust")
            .top_k(5)
            .filter(Filter::new("lang", FilterOp::Eq, "en").unwrap());
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "q": "what is rust",
                "k": 5,
                "filters": [{ "key": "lang", "operation": "=", "value": "en" }]
            })
        );
    }

    #[test]
    fn test_query_defaults_to_three_hits_without_filters() {
        assert_eq!(
            serde_json::to_value(Query::new("x")).unwrap(),
            json!({ "q": "x", "k": 3 })
        );
    }
}
