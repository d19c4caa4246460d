//! Document store collaborator: typed regulatory-document records, a query
//! builder, document-type standardization, and an in-memory reference
//! implementation.
//!
//! The assistant core only ever talks to the [`DocumentStore`] trait, so a
//! relational backend can be dropped in without touching the dispatcher or the
//! orchestrator. [`InMemoryDocumentStore`] backs the test suite and small
//! deployments.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use tokio::sync::RwLock;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Default number of documents returned when a query does not set a limit.
pub const DEFAULT_QUERY_LIMIT: usize = 10;

/// Canonical document-type identifier for records that could not be classified.
pub const UNSPECIFIED_TYPE: &str = "unspecified";

/// A government document as stored and served to the model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub document_number: String,
    pub title: String,
    pub publication_date: NaiveDate,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
}

/// Search criteria forwarded to the store.
///
/// All filters are optional; an empty query returns the most recent documents
/// up to `limit`.
#[derive(Clone, Debug)]
pub struct DocumentQuery {
    pub keywords: Option<String>,
    pub document_type: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: usize,
}

impl Default for DocumentQuery {
    fn default() -> Self {
        DocumentQuery {
            keywords: None,
            document_type: None,
            start_date: None,
            end_date: None,
            limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl DocumentQuery {
    /// Create an unconstrained query with the default limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict results to documents whose title or abstract mentions any of
    /// the whitespace-separated terms.
    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    /// Restrict results to a document type (standardized before matching).
    pub fn with_document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = Some(document_type.into());
        self
    }

    /// Restrict results to publication dates in `[start, end]` (inclusive,
    /// either bound optional).
    pub fn with_date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// Cap the number of returned documents.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Publication-date bounds of the stored corpus.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub min: Option<NaiveDate>,
    pub max: Option<NaiveDate>,
}

/// Aggregate statistics served by the statistics tool.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseStats {
    pub total_documents: u64,
    pub document_types: BTreeMap<String, u64>,
    pub date_range: DateRange,
    pub last_update: Option<DateTime<Utc>>,
}

/// Counts reported by [`InMemoryDocumentStore::insert_documents`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct IngestSummary {
    pub added: usize,
    pub updated: usize,
}

/// Read-only query collaborator consumed by the tool handlers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Return documents matching `query`, newest first.
    async fn query(&self, query: &DocumentQuery) -> StoreResult<Vec<Document>>;

    /// Return aggregate statistics over the stored corpus.
    async fn statistics(&self) -> StoreResult<DatabaseStats>;
}

/// Map a free-text or missing document classification onto the canonical set.
///
/// Missing, `"null"`, `"none"`, and `"unspecified"` values fall back to title
/// inference via [`infer_document_type`]. Known spelling variations collapse
/// onto their canonical identifier; anything else passes through lowercased.
/// Standardizing an already-canonical value returns it unchanged.
pub fn standardize_document_type(document_type: Option<&str>, title: &str) -> String {
    let raw = document_type.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return infer_document_type(title).to_string();
    }

    let lowered = raw.to_lowercase();
    match lowered.as_str() {
        "null" | "none" | "unspecified" => infer_document_type(title).to_string(),
        "executive_order" | "eo" | "executive order" | "e.o." => "executive_order".to_string(),
        "notice" | "notices" => "notice".to_string(),
        "proposed_rule" | "proposed rule" | "proposed rules" => "proposed_rule".to_string(),
        "rule" | "rules" | "final rule" => "rule".to_string(),
        "presidential_document" | "presidential document" | "presidential documents" => {
            "presidential_document".to_string()
        }
        _ => lowered,
    }
}

/// Infer a document type from its title using ordered keyword heuristics.
///
/// A title mentioning both "rule" and "proposed" classifies as a proposed rule
/// before the plain-rule check runs, so "Proposed Rule on ..." never lands in
/// `rule`.
pub fn infer_document_type(title: &str) -> &'static str {
    let title = title.to_lowercase();
    if title.contains("executive order") || title.starts_with("eo") {
        "executive_order"
    } else if title.contains("notice") {
        "notice"
    } else if title.contains("rule") && title.contains("proposed") {
        "proposed_rule"
    } else if title.contains("rule") {
        "rule"
    } else if title.contains("presidential") {
        "presidential_document"
    } else {
        UNSPECIFIED_TYPE
    }
}

/// Clean one raw listing-API record into a [`Document`].
///
/// Records without a document number are dropped. Missing titles default to
/// "Untitled Document"; an absent or malformed publication date falls back to
/// `default_date`.
pub fn normalize_api_record(
    record: &serde_json::Value,
    default_date: NaiveDate,
) -> Option<Document> {
    let document_number = record
        .get("document_number")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())?
        .to_string();

    let title = record
        .get("title")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("Untitled Document")
        .to_string();

    let publication_date = record
        .get("publication_date")
        .and_then(|v| v.as_str())
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .unwrap_or(default_date);

    let field = |name: &str| {
        record
            .get(name)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Some(Document {
        document_number,
        title,
        publication_date,
        document_type: field("document_type"),
        abstract_text: field("abstract"),
        html_url: field("html_url"),
        pdf_url: field("pdf_url"),
    })
}

/// In-memory [`DocumentStore`] keyed by document number.
///
/// Keyword search approximates the production backend's natural-language
/// full-text match: a document qualifies when any whitespace-separated term
/// appears in its title or abstract, case-insensitively.
pub struct InMemoryDocumentStore {
    documents: RwLock<Vec<Document>>,
    last_update: RwLock<Option<DateTime<Utc>>>,
}

impl InMemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        InMemoryDocumentStore {
            documents: RwLock::new(Vec::new()),
            last_update: RwLock::new(None),
        }
    }

    /// Upsert a batch of documents by document number.
    ///
    /// Document types are standardized on the way in. The last-update stamp
    /// only moves when the batch actually changed something.
    pub async fn insert_documents(&self, documents: Vec<Document>) -> IngestSummary {
        let mut summary = IngestSummary::default();
        {
            let mut store = self.documents.write().await;
            for mut doc in documents {
                doc.document_type = Some(standardize_document_type(
                    doc.document_type.as_deref(),
                    &doc.title,
                ));
                match store
                    .iter_mut()
                    .find(|existing| existing.document_number == doc.document_number)
                {
                    Some(existing) => {
                        *existing = doc;
                        summary.updated += 1;
                    }
                    None => {
                        store.push(doc);
                        summary.added += 1;
                    }
                }
            }
        }

        if summary.added > 0 || summary.updated > 0 {
            let mut last_update = self.last_update.write().await;
            *last_update = Some(Utc::now());
        }

        log::info!(
            "Added {} new documents, updated {} documents",
            summary.added,
            summary.updated
        );
        summary
    }

    fn matches_keywords(doc: &Document, keywords: &str) -> bool {
        let title = doc.title.to_lowercase();
        let abstract_text = doc
            .abstract_text
            .as_deref()
            .unwrap_or("")
            .to_lowercase();
        keywords
            .split_whitespace()
            .map(str::to_lowercase)
            .any(|term| title.contains(&term) || abstract_text.contains(&term))
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn query(&self, query: &DocumentQuery) -> StoreResult<Vec<Document>> {
        let wanted_type = query
            .document_type
            .as_deref()
            .map(|t| standardize_document_type(Some(t), ""));

        let store = self.documents.read().await;
        let mut results: Vec<Document> = store
            .iter()
            .filter(|doc| match &query.keywords {
                Some(keywords) => Self::matches_keywords(doc, keywords),
                None => true,
            })
            .filter(|doc| match &wanted_type {
                Some(wanted) => {
                    standardize_document_type(doc.document_type.as_deref(), &doc.title) == *wanted
                }
                None => true,
            })
            .filter(|doc| query.start_date.map_or(true, |d| doc.publication_date >= d))
            .filter(|doc| query.end_date.map_or(true, |d| doc.publication_date <= d))
            .cloned()
            .collect();

        results.sort_by(|a, b| b.publication_date.cmp(&a.publication_date));
        results.truncate(query.limit);
        Ok(results)
    }

    async fn statistics(&self) -> StoreResult<DatabaseStats> {
        let store = self.documents.read().await;

        let mut document_types: BTreeMap<String, u64> = BTreeMap::new();
        for doc in store.iter() {
            let doc_type = standardize_document_type(doc.document_type.as_deref(), &doc.title);
            *document_types.entry(doc_type).or_insert(0) += 1;
        }

        let date_range = DateRange {
            min: store.iter().map(|d| d.publication_date).min(),
            max: store.iter().map(|d| d.publication_date).max(),
        };

        Ok(DatabaseStats {
            total_documents: store.len() as u64,
            document_types,
            date_range,
            last_update: *self.last_update.read().await,
        })
    }
}
