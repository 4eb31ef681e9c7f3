//! Mock collaborators for testing.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use papertrail_ingest::{FetchedFile, Fetcher, IngestError, RecordExtractor, Source};

use crate::catalog::{Catalog, NewEntry};
use crate::confirm::ConfirmPolicy;
use crate::doi_url;
use crate::refs::ReferenceSource;

/// In-memory [`Catalog`] that tracks created entries and answers duplicate
/// checks from them, so idempotence behaves like the real store.
pub struct MockCatalog {
    titles: Mutex<HashSet<String>>,
    doi_urls: Mutex<HashSet<String>>,
    created: Mutex<Vec<NewEntry>>,
    query_count: AtomicUsize,
    fail_create: Option<String>,
    fail_create_titles: HashSet<String>,
    fail_query: Option<String>,
}

impl MockCatalog {
    pub fn empty() -> Self {
        Self {
            titles: Mutex::new(HashSet::new()),
            doi_urls: Mutex::new(HashSet::new()),
            created: Mutex::new(Vec::new()),
            query_count: AtomicUsize::new(0),
            fail_create: None,
            fail_create_titles: HashSet::new(),
            fail_query: None,
        }
    }

    /// A catalog that already contains entries with the given titles.
    pub fn with_titles(titles: impl IntoIterator<Item = &'static str>) -> Self {
        let catalog = Self::empty();
        catalog
            .titles
            .lock()
            .unwrap()
            .extend(titles.into_iter().map(String::from));
        catalog
    }

    /// A catalog whose create calls fail with the given message.
    pub fn failing(message: &str) -> Self {
        Self {
            fail_create: Some(message.to_string()),
            ..Self::empty()
        }
    }

    /// Make create calls fail for entries with the given title only.
    pub fn failing_create_for(mut self, title: &str) -> Self {
        self.fail_create_titles.insert(title.to_string());
        self
    }

    /// A catalog whose duplicate queries fail with the given message.
    pub fn failing_query(message: &str) -> Self {
        Self {
            fail_query: Some(message.to_string()),
            ..Self::empty()
        }
    }

    /// Entries created so far.
    pub fn created(&self) -> Vec<NewEntry> {
        self.created.lock().unwrap().clone()
    }

    /// How many duplicate checks ran.
    pub fn queries(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }
}

impl Catalog for MockCatalog {
    fn find_duplicate<'a>(
        &'a self,
        title: &'a str,
        doi: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<bool, String>> + Send + 'a>> {
        Box::pin(async move {
            self.query_count.fetch_add(1, Ordering::SeqCst);
            if let Some(ref msg) = self.fail_query {
                return Err(msg.clone());
            }
            let by_title = self.titles.lock().unwrap().contains(title);
            let by_doi =
                !doi.is_empty() && self.doi_urls.lock().unwrap().contains(&doi_url(doi));
            Ok(by_title || by_doi)
        })
    }

    fn create_entry<'a>(
        &'a self,
        entry: &'a NewEntry,
    ) -> Pin<Box<dyn Future<Output = Result<(), String>> + Send + 'a>> {
        Box::pin(async move {
            if let Some(ref msg) = self.fail_create {
                return Err(msg.clone());
            }
            if self.fail_create_titles.contains(&entry.title) {
                return Err(format!("create failed for '{}'", entry.title));
            }
            self.titles.lock().unwrap().insert(entry.title.clone());
            if let Some(ref url) = entry.doi_url {
                self.doi_urls.lock().unwrap().insert(url.clone());
            }
            self.created.lock().unwrap().push(entry.clone());
            Ok(())
        })
    }
}

/// Confirmation policy answering from a fixed script (false once exhausted).
pub struct ScriptedConfirm {
    answers: Mutex<Vec<bool>>,
    asked: AtomicUsize,
}

impl ScriptedConfirm {
    pub fn new(mut answers: Vec<bool>) -> Self {
        // Reverse so we can pop() from the front cheaply.
        answers.reverse();
        Self {
            answers: Mutex::new(answers),
            asked: AtomicUsize::new(0),
        }
    }

    /// How many times the gate was consulted.
    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl ConfirmPolicy for ScriptedConfirm {
    fn confirm(&self, _question: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answers.lock().unwrap().pop().unwrap_or(false)
    }
}

/// Fetcher that never touches the network: every source resolves to a
/// local path carrying the source string, except those scripted to fail.
pub struct MockFetcher {
    fail: HashSet<String>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            fail: HashSet::new(),
        }
    }

    /// Mark a source (by its display string) as unreachable.
    pub fn failing_on(mut self, target: &str) -> Self {
        self.fail.insert(target.to_string());
        self
    }
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for MockFetcher {
    fn fetch<'a>(
        &'a self,
        source: &'a Source,
    ) -> Pin<Box<dyn Future<Output = Result<FetchedFile, IngestError>> + Send + 'a>> {
        Box::pin(async move {
            let target = source.to_string();
            if self.fail.contains(&target) {
                return Err(IngestError::Retrieval {
                    url: target,
                    reason: "HTTP 404".to_string(),
                });
            }
            Ok(FetchedFile::Local(PathBuf::from(target)))
        })
    }
}

/// Extractor mapping input paths to canned record text.
pub struct MockExtractor {
    records: HashMap<String, String>,
    calls: AtomicUsize,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Register the record text returned for a given input path.
    pub fn with_record(mut self, path: &str, raw: &str) -> Self {
        self.records.insert(path.to_string(), raw.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordExtractor for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    fn extract<'a>(
        &'a self,
        path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self.records.get(path.to_string_lossy().as_ref()).cloned();
        Box::pin(async move { result })
    }
}

/// Reference source answering from a fixed citation graph.
pub struct MockReferenceSource {
    edges: HashMap<String, Vec<String>>,
    fail: HashSet<String>,
    lookups: Mutex<Vec<String>>,
}

impl MockReferenceSource {
    pub fn new() -> Self {
        Self {
            edges: HashMap::new(),
            fail: HashSet::new(),
            lookups: Mutex::new(Vec::new()),
        }
    }

    /// Declare that `doi` cites the given DOIs.
    pub fn citing(mut self, doi: &str, cited: impl IntoIterator<Item = &'static str>) -> Self {
        self.edges
            .insert(doi.to_string(), cited.into_iter().map(String::from).collect());
        self
    }

    /// Make lookups for `doi` fail.
    pub fn failing_on(mut self, doi: &str) -> Self {
        self.fail.insert(doi.to_string());
        self
    }

    /// The DOIs looked up, in order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

impl Default for MockReferenceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceSource for MockReferenceSource {
    fn name(&self) -> &str {
        "mock"
    }

    fn references<'a>(
        &'a self,
        doi: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>, String>> + Send + 'a>> {
        Box::pin(async move {
            self.lookups.lock().unwrap().push(doi.to_string());
            if self.fail.contains(doi) {
                return Err("lookup failed".to_string());
            }
            Ok(self.edges.get(doi).cloned().unwrap_or_default())
        })
    }
}
