//! Sequential run over every chapter identifier.
//!
//! The runner owns no page: the caller passes the one shared
//! [`PageAcquirer`] by `&mut`, which makes "one chapter at a time" a
//! property of the borrow rather than a convention.

use tracing::{info, instrument};

use crate::acquire::PageAcquirer;
use crate::chapter::{ChapterIdentifier, ChapterResolver, ChapterTarget};
use crate::orchestrator::{ChapterOrchestrator, ChapterOutcome};

/// Result for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterReport {
    /// The target that was processed.
    pub target: ChapterTarget,
    /// How it ended.
    pub outcome: ChapterOutcome,
}

impl ChapterReport {
    /// Summary line: `<folder>: <outcome>`.
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!("{}: {}", self.target.folder_name, self.outcome)
    }
}

/// Results of a whole run, in visiting order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    chapters: Vec<ChapterReport>,
}

impl HarvestReport {
    /// Per-target reports in visiting order.
    #[must_use]
    pub fn chapters(&self) -> &[ChapterReport] {
        &self.chapters
    }

    /// Targets that downloaded.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.chapters.iter().filter(|c| c.outcome.is_downloaded()).count()
    }

    /// Targets skipped as missing.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.chapters.iter().filter(|c| c.outcome.is_skipped()).count()
    }

    /// Targets that exhausted their attempts.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.chapters.iter().filter(|c| c.outcome.is_failed()).count()
    }

    /// Assets written across all downloaded chapters.
    #[must_use]
    pub fn assets_written(&self) -> usize {
        self.batch_totals().0
    }

    /// Assets that failed across all downloaded chapters.
    #[must_use]
    pub fn assets_failed(&self) -> usize {
        self.batch_totals().1
    }

    fn batch_totals(&self) -> (usize, usize) {
        self.chapters
            .iter()
            .filter_map(|c| match &c.outcome {
                ChapterOutcome::Downloaded { report, .. } => {
                    Some((report.succeeded(), report.failed()))
                }
                _ => None,
            })
            .fold((0, 0), |(w, f), (sw, sf)| (w + sw, f + sf))
    }
}

/// Visits every identifier's targets in order on one shared page.
#[derive(Debug, Clone)]
pub struct HarvestRunner {
    resolver: ChapterResolver,
    orchestrator: ChapterOrchestrator,
}

impl HarvestRunner {
    /// Creates a runner.
    #[must_use]
    pub fn new(resolver: ChapterResolver, orchestrator: ChapterOrchestrator) -> Self {
        Self {
            resolver,
            orchestrator,
        }
    }

    /// Returns the resolver.
    #[must_use]
    pub fn resolver(&self) -> &ChapterResolver {
        &self.resolver
    }

    /// Processes every target of every identifier, in order. Never fails.
    #[instrument(skip_all, fields(identifiers = identifiers.len()))]
    pub async fn run<A>(&self, acquirer: &mut A, identifiers: &[ChapterIdentifier]) -> HarvestReport
    where
        A: PageAcquirer + ?Sized,
    {
        let mut report = HarvestReport::default();

        for identifier in identifiers {
            for target in self.resolver.resolve(identifier) {
                info!(chapter = %target, url = %target.request_url, "processing chapter");
                let outcome = self.orchestrator.process(acquirer, &target).await;
                report.chapters.push(ChapterReport { target, outcome });
            }
        }

        info!(
            downloaded = report.downloaded(),
            skipped = report.skipped(),
            failed = report.failed(),
            assets_written = report.assets_written(),
            assets_failed = report.assets_failed(),
            "run complete"
        );
        report
    }
}
