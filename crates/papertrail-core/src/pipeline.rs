//! Per-reference ingest flow: fetch → extract → parse → duplicate check →
//! catalog write.

use papertrail_bib::{BibRecord, parse_record};
use papertrail_ingest::{Fetcher, RecordExtractor, Source};

use crate::catalog::Catalog;
use crate::confirm::ConfirmPolicy;
use crate::writer::{self, WriteOutcome, WriteRequest};
use crate::{Config, IngestEvent};

/// What happened to one reference.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    /// The reference could not be fetched, or no record was extractable.
    /// Scoped to this reference; siblings in a traversal continue.
    Unavailable,
    /// A record was parsed and the write policy ran.
    Decided {
        record: BibRecord,
        outcome: WriteOutcome,
    },
}

/// The collaborators one ingest run wires together.
pub struct Pipeline<'a> {
    pub fetcher: &'a dyn Fetcher,
    pub extractor: &'a dyn RecordExtractor,
    pub catalog: &'a dyn Catalog,
    pub confirm: &'a dyn ConfirmPolicy,
    pub config: &'a Config,
    pub on_event: &'a (dyn Fn(IngestEvent) + Send + Sync),
}

impl Pipeline<'_> {
    fn emit(&self, event: IngestEvent) {
        (self.on_event)(event);
    }

    /// Run one reference through the full flow.
    ///
    /// Fetch and extraction failures resolve to
    /// [`PipelineOutcome::Unavailable`]; a catalog query or write failure is
    /// returned as an error for the caller to scope.
    pub async fn process(&self, source: &Source) -> Result<PipelineOutcome, String> {
        let target = source.to_string();
        self.emit(IngestEvent::Fetching {
            target: target.clone(),
        });

        let fetched = match self.fetcher.fetch(source).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!(reference = %target, error = %e, "retrieval failed");
                self.emit(IngestEvent::FetchFailed {
                    target,
                    error: e.to_string(),
                });
                return Ok(PipelineOutcome::Unavailable);
            }
        };

        self.emit(IngestEvent::Extracting {
            file: fetched.path().display().to_string(),
        });
        let raw = self.extractor.extract(fetched.path()).await;
        // A downloaded temp file has served its purpose once extraction
        // returns; drop it here so it is gone before any network call below.
        drop(fetched);

        let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
            self.emit(IngestEvent::NoRecord { target });
            return Ok(PipelineOutcome::Unavailable);
        };

        let record = parse_record(&raw);
        self.emit(IngestEvent::CheckingDuplicate {
            title: record.title.clone(),
        });

        // The raw, possibly-empty title goes into the duplicate check; the
        // "Untitled" placeholder exists only in stored entries.
        let duplicate = self
            .catalog
            .find_duplicate(&record.title, &record.doi)
            .await?;

        let outcome = writer::write_record(
            self.catalog,
            self.confirm,
            WriteRequest {
                record: &record,
                duplicate,
                force: self.config.force,
                source_url: source.url(),
            },
        )
        .await?;

        match outcome {
            WriteOutcome::Written => self.emit(IngestEvent::Written {
                title: display_title(&record),
            }),
            WriteOutcome::DuplicateSkip => self.emit(IngestEvent::DuplicateSkip {
                title: display_title(&record),
            }),
            WriteOutcome::Declined => self.emit(IngestEvent::Declined {
                target: source.to_string(),
            }),
        }

        Ok(PipelineOutcome::Decided { record, outcome })
    }
}

fn display_title(record: &BibRecord) -> String {
    if record.title.is_empty() {
        "Untitled".to_string()
    } else {
        record.title.clone()
    }
}
