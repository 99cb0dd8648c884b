//! Title search over a corpus fetched once per controller.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::{
    error::{Error, ErrorKind, ProviderResult},
    model::SearchDocument,
    store::Store,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    #[default]
    Idle,
    Loading,
    Active,
    Error,
}

/// Folds full-width forms and case, and collapses runs of whitespace.
pub fn normalize_query(input: &str) -> String {
    let folded: String = input.nfkc().collect::<String>().to_lowercase();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

struct Indexed {
    key: String,
    document: SearchDocument,
}

/// Controller-local search state. Dropping the controller drops its corpus.
pub struct TitleSearchController {
    store: Option<Arc<dyn Store>>,
    input: String,
    applied_query: String,
    status: SearchStatus,
    results: Vec<SearchDocument>,
    error: Option<ErrorKind>,
    corpus: Option<Vec<Indexed>>,
}

impl TitleSearchController {
    pub fn new(store: Option<Arc<dyn Store>>) -> Self {
        Self {
            store,
            input: String::new(),
            applied_query: String::new(),
            status: SearchStatus::Idle,
            results: Vec::new(),
            error: None,
            corpus: None,
        }
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn applied_query(&self) -> &str {
        &self.applied_query
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn results(&self) -> &[SearchDocument] {
        &self.results
    }

    pub fn error(&self) -> Option<ErrorKind> {
        self.error
    }

    /// Clears input and results. The cached corpus stays.
    pub fn clear(&mut self) {
        self.input.clear();
        self.reset();
    }

    fn reset(&mut self) {
        self.applied_query.clear();
        self.status = SearchStatus::Idle;
        self.results.clear();
        self.error = None;
    }

    /// Applies the current input. The corpus is fetched on the first
    /// non-empty query only; a failed fetch is retried on the next apply.
    #[tracing::instrument(name = "apply title search", skip(self), fields(input = %self.input))]
    pub async fn apply_search(&mut self) -> ProviderResult<&[SearchDocument]> {
        let query = normalize_query(&self.input);
        if query.is_empty() {
            self.reset();
            return Ok(&self.results);
        }

        self.applied_query = query;
        self.error = None;

        if self.corpus.is_none() {
            self.status = SearchStatus::Loading;

            match self.fetch_corpus().await {
                Ok(corpus) => self.corpus = Some(corpus),
                Err(error) => {
                    let kind = ErrorKind::from(error);
                    self.status = SearchStatus::Error;
                    self.error = Some(kind);
                    self.results.clear();
                    return Err(kind);
                }
            }
        }

        let query = &self.applied_query;
        self.results = self
            .corpus
            .iter()
            .flatten()
            .filter(|indexed| indexed.key.contains(query.as_str()))
            .map(|indexed| indexed.document.clone())
            .collect();
        self.status = SearchStatus::Active;

        tracing::debug!(result_count = self.results.len(), "Search applied");

        Ok(&self.results)
    }

    async fn fetch_corpus(&self) -> Result<Vec<Indexed>, Error> {
        let store = self.store.as_deref().ok_or(Error::NotConfigured)?;

        Ok(store
            .search_corpus()
            .await?
            .into_iter()
            .map(|document| Indexed {
                key: normalize_query(&document.title),
                document,
            })
            .collect())
    }
}

impl std::fmt::Debug for TitleSearchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TitleSearchController")
            .field("applied_query", &self.applied_query)
            .field("status", &self.status)
            .field("results", &self.results.len())
            .field("corpus", &self.corpus.as_ref().map(Vec::len))
            .finish()
    }
}
