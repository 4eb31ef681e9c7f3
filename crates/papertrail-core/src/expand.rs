//! Citation-graph expansion.
//!
//! Walks the references of a written record depth-first through the full
//! ingest pipeline. The walk is an explicit worklist (a stack of pending
//! DOIs) rather than call-stack recursion, so arbitrarily deep citation
//! chains cannot overflow, and it shares one visited set across the whole
//! run so a work cited by several papers is processed at most once. Every
//! metadata lookup goes through the pacer.

use std::collections::HashSet;

use crate::pipeline::{Pipeline, PipelineOutcome};
use crate::rate_limit::FetchPacer;
use crate::refs::ReferenceSource;
use crate::writer::WriteOutcome;
use crate::{IngestEvent, RunSummary, Source, doi_url};

/// DOIs already processed in this run.
///
/// Keys are case-folded: DOI resolvers treat `10.1/ABC` and `10.1/abc` as
/// the same work, and reference lists mix cases freely.
#[derive(Debug, Default)]
pub struct VisitedSet {
    dois: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(doi: &str) -> String {
        doi.trim().to_ascii_lowercase()
    }

    pub fn contains(&self, doi: &str) -> bool {
        self.dois.contains(&Self::key(doi))
    }

    /// Mark a DOI as processed; true when it was not already present.
    pub fn insert(&mut self, doi: &str) -> bool {
        self.dois.insert(Self::key(doi))
    }

    pub fn len(&self) -> usize {
        self.dois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dois.is_empty()
    }
}

/// Drives the traversal over one pipeline.
pub struct Expander<'a> {
    pipeline: &'a Pipeline<'a>,
    source: &'a dyn ReferenceSource,
    pacer: &'a FetchPacer,
    visited: VisitedSet,
    /// Pending cited DOIs, deepest discoveries on top.
    stack: Vec<String>,
}

impl<'a> Expander<'a> {
    pub fn new(
        pipeline: &'a Pipeline<'a>,
        source: &'a dyn ReferenceSource,
        pacer: &'a FetchPacer,
    ) -> Self {
        Self {
            pipeline,
            source,
            pacer,
            visited: VisitedSet::new(),
            stack: Vec::new(),
        }
    }

    /// Expand from a record that was just written under `root_doi`.
    ///
    /// Per-reference failures (retrieval, extraction, catalog) are reported
    /// and skipped; they never abort the remaining branches.
    pub async fn run(&mut self, root_doi: &str, summary: &mut RunSummary) {
        if root_doi.is_empty() || !self.visited.insert(root_doi) {
            return;
        }
        self.push_references(root_doi).await;

        while let Some(doi) = self.stack.pop() {
            if self.visited.contains(&doi) {
                (self.pipeline.on_event)(IngestEvent::AlreadyVisited { doi });
                continue;
            }

            let source = Source::Url(doi_url(&doi));
            let outcome = match self.pipeline.process(&source).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    tracing::warn!(%doi, %error, "catalog failure while expanding, skipping");
                    (self.pipeline.on_event)(IngestEvent::CatalogFailed {
                        target: source.to_string(),
                        error,
                    });
                    self.visited.insert(&doi);
                    summary.failed += 1;
                    continue;
                }
            };
            self.visited.insert(&doi);
            summary.note(&outcome);

            // Only records that actually landed in the catalog pull their
            // own references in; a record without a DOI has nothing to look
            // up and ends its branch.
            if let PipelineOutcome::Decided {
                record,
                outcome: WriteOutcome::Written,
            } = outcome
                && !record.doi.is_empty()
            {
                let newly = record.doi.eq_ignore_ascii_case(&doi)
                    || self.visited.insert(&record.doi);
                if newly {
                    self.push_references(&record.doi).await;
                }
            }
        }
    }

    /// Fetch the DOIs cited by `doi` and schedule the new ones.
    ///
    /// A failed lookup degrades to an empty reference list so sibling
    /// branches keep going.
    async fn push_references(&mut self, doi: &str) {
        self.pacer.acquire().await;
        let refs = match self.source.references(doi).await {
            Ok(refs) => refs,
            Err(error) => {
                tracing::warn!(doi, source = self.source.name(), %error, "reference lookup failed");
                (self.pipeline.on_event)(IngestEvent::ReferenceLookupFailed {
                    doi: doi.to_string(),
                    error,
                });
                return;
            }
        };

        (self.pipeline.on_event)(IngestEvent::Expanding {
            doi: doi.to_string(),
            count: refs.len(),
        });

        // Reversed so the stack pops siblings in citation order.
        for cited in refs.into_iter().rev() {
            self.stack.push(cited);
        }
    }
}

/// Ingest one input and, when enabled, expand its citation graph.
///
/// The root reference's catalog errors are returned to the caller;
/// everything discovered during expansion is handled per-reference.
pub async fn run_ingest(
    pipeline: &Pipeline<'_>,
    refs: &dyn ReferenceSource,
    pacer: &FetchPacer,
    input: &Source,
) -> Result<RunSummary, String> {
    let outcome = pipeline.process(input).await?;

    let mut summary = RunSummary::default();
    summary.note(&outcome);

    if pipeline.config.recursive
        && let PipelineOutcome::Decided {
            record,
            outcome: WriteOutcome::Written,
        } = outcome
        && !record.doi.is_empty()
    {
        let mut expander = Expander::new(pipeline, refs, pacer);
        expander.run(&record.doi, &mut summary).await;
    }

    Ok(summary)
}
