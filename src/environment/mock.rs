use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::model::{ApiError, Resource, ResourceApi, ResourceKey, SearchPage};
use crate::search::codec::{parse_page, SearchParams, PAGE_KEY};

/// In-memory catalogue implementing [`ResourceApi`]. Counts calls and can be
/// told to delay or fail individual calls.
#[derive(Debug, Default)]
pub struct MockResourceApi {
    catalogue: Vec<Resource>,
    suggestions: Vec<String>,
    search_delays: Mutex<VecDeque<Duration>>,
    search_failures: Mutex<VecDeque<ApiError>>,
    lookup_failures: Mutex<VecDeque<ApiError>>,
    autocomplete_failures: Mutex<VecDeque<ApiError>>,
    autocomplete_texts: Mutex<Vec<String>>,
    pub search_calls: AtomicUsize,
    pub lookup_calls: AtomicUsize,
    pub autocomplete_calls: AtomicUsize,
}

impl MockResourceApi {
    pub fn new(catalogue: Vec<Resource>) -> Self {
        Self {
            catalogue,
            ..Default::default()
        }
    }

    /// `count` numbered datasets titled `Resource {n}`
    pub fn numbered(count: u64) -> Self {
        Self::new(
            (1..=count)
                .map(|n| Resource::new(n, "dataset", &format!("Resource {n}")))
                .collect(),
        )
    }

    pub fn with_suggestions(mut self, suggestions: &[&str]) -> Self {
        self.suggestions = suggestions.iter().map(|e| e.to_string()).collect();
        self
    }

    /// Delay the next search calls, one entry per call
    pub fn delay_searches(&self, delays: &[Duration]) {
        if let Ok(mut queue) = self.search_delays.lock() {
            queue.extend(delays.iter().copied());
        }
    }

    pub fn fail_next_search(&self, error: ApiError) {
        if let Ok(mut queue) = self.search_failures.lock() {
            queue.push_back(error);
        }
    }

    pub fn fail_next_lookup(&self, error: ApiError) {
        if let Ok(mut queue) = self.lookup_failures.lock() {
            queue.push_back(error);
        }
    }

    pub fn fail_next_autocomplete(&self, error: ApiError) {
        if let Ok(mut queue) = self.autocomplete_failures.lock() {
            queue.push_back(error);
        }
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn autocomplete_calls(&self) -> usize {
        self.autocomplete_calls.load(Ordering::SeqCst)
    }

    pub fn autocomplete_texts(&self) -> Vec<String> {
        self.autocomplete_texts
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    fn matching(&self, params: &SearchParams) -> Vec<&Resource> {
        let needle = params
            .get("q")
            .and_then(|q| q.first())
            .map(str::to_lowercase);
        self.catalogue
            .iter()
            .filter(|resource| match (&needle, &resource.title) {
                (Some(needle), Some(title)) => title.to_lowercase().contains(needle),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .collect()
    }
}

#[async_trait]
impl ResourceApi for MockResourceApi {
    async fn search(&self, params: &SearchParams, page_size: u32) -> Result<SearchPage, ApiError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.search_delays.lock().ok().and_then(|mut q| q.pop_front());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.search_failures.lock().ok().and_then(|mut q| q.pop_front());
        if let Some(error) = failure {
            return Err(error);
        }

        let page = params.get(PAGE_KEY).and_then(parse_page).unwrap_or(1) as usize;
        let page_size = page_size as usize;
        let matching = self.matching(params);
        let start = (page - 1) * page_size;
        let resources: Vec<Resource> = matching
            .iter()
            .skip(start)
            .take(page_size)
            .map(|e| (*e).clone())
            .collect();
        Ok(SearchPage {
            is_next_page_available: matching.len() > start + page_size,
            resources,
        })
    }

    async fn get_by_key(&self, pk: &ResourceKey) -> Result<Resource, ApiError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        let failure = self.lookup_failures.lock().ok().and_then(|mut q| q.pop_front());
        if let Some(error) = failure {
            return Err(error);
        }
        self.catalogue
            .iter()
            .find(|resource| &resource.pk == pk)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(pk.clone()))
    }

    async fn autocomplete(&self, text: &str) -> Result<Vec<String>, ApiError> {
        self.autocomplete_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut texts) = self.autocomplete_texts.lock() {
            texts.push(text.to_string());
        }
        let failure = self.autocomplete_failures.lock().ok().and_then(|mut q| q.pop_front());
        if let Some(error) = failure {
            return Err(error);
        }
        let text = text.to_lowercase();
        Ok(self
            .suggestions
            .iter()
            .filter(|e| e.to_lowercase().starts_with(&text))
            .cloned()
            .collect())
    }
}
