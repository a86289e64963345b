use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::domain::{DedupReport, ErrorReport, LocationPage, Page, Record};

const ARRAY_OPEN: &[u8] = b"{\"data\": [ ";
const ARRAY_CLOSE: &[u8] = b" ] } ";
const SEPARATOR: &[u8] = b",\n";

/// Keeps the first record seen for each identity and drops the rest.
///
/// The seen set is not synchronized. It is only ever touched from
/// [`DedupFilter::run`], which consumes both the filter and the single page
/// receiver, so there is exactly one writer for the whole run.
pub struct DedupFilter {
    identity_field: String,
    diagnostics: bool,
    seen: HashSet<String>,
    duplicates: HashMap<String, u64>,
}

/// Whether a record made it to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Duplicate,
}

impl DedupFilter {
    pub fn new(identity_field: impl Into<String>) -> Self {
        Self {
            identity_field: identity_field.into(),
            diagnostics: false,
            seen: HashSet::with_capacity(16384),
            duplicates: HashMap::new(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Record `identity` as seen. The first call for an identity keeps it;
    /// later calls count a duplicate.
    pub fn check(&mut self, identity: &str) -> Verdict {
        if self.seen.insert(identity.to_string()) {
            Verdict::Keep
        } else {
            *self.duplicates.entry(identity.to_string()).or_insert(0) += 1;
            Verdict::Duplicate
        }
    }

    /// Consume pages until every producer has dropped its sender, streaming the
    /// surviving records to `output` as one JSON document. Dropping `output` on
    /// return tells the sink it has everything.
    pub async fn run(
        mut self,
        mut pages: mpsc::Receiver<Page>,
        errors: mpsc::Sender<ErrorReport>,
        output: mpsc::Sender<Vec<u8>>,
    ) -> DedupReport {
        let mut report = DedupReport::default();
        let mut need_comma = false;
        let mut sink_open = send_chunk(&output, ARRAY_OPEN.to_vec()).await;

        while let Some(page) = pages.recv().await {
            report.pages += 1;

            let parsed = match LocationPage::parse(&page.body) {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!(source = %page.source, error = %e, "error parsing JSON");
                    report.parse_errors += 1;
                    report_error(&errors, ErrorReport::new(e.to_string(), page.body)).await;
                    continue;
                }
            };

            for value in parsed.data {
                report.records += 1;

                let identity = match Record::identity_of(&value, &self.identity_field) {
                    Ok(identity) => identity,
                    Err(e) => {
                        warn!(source = %page.source, error = %e, "error reading record");
                        report.parse_errors += 1;
                        let raw = serde_json::to_vec(&value).unwrap_or_default();
                        report_error(&errors, ErrorReport::new(e.to_string(), raw)).await;
                        continue;
                    }
                };
                let record = Record { identity, value };

                if self.check(&record.identity) == Verdict::Duplicate {
                    continue;
                }

                let json = match record.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(identity = %record.identity, error = %e, "error marshalling record");
                        report.marshal_errors += 1;
                        continue;
                    }
                };

                if need_comma {
                    sink_open &= send_chunk(&output, SEPARATOR.to_vec()).await;
                } else {
                    need_comma = true;
                }
                sink_open &= send_chunk(&output, json).await;
                report.forwarded += 1;
            }
        }

        sink_open &= send_chunk(&output, ARRAY_CLOSE.to_vec()).await;
        if !sink_open {
            warn!("Output sink closed early; output is incomplete");
        }
        drop(output);

        report.duplicates = self.duplicates;
        if self.diagnostics {
            log_duplicates(&report);
        }
        report
    }
}

async fn send_chunk(output: &mpsc::Sender<Vec<u8>>, chunk: Vec<u8>) -> bool {
    output.send(chunk).await.is_ok()
}

async fn report_error(errors: &mpsc::Sender<ErrorReport>, report: ErrorReport) {
    if errors.send(report).await.is_err() {
        warn!("Error channel closed; dropping error report");
    }
}

fn log_duplicates(report: &DedupReport) {
    info!(
        duplicates = report.duplicate_count(),
        identities = report.duplicates.len(),
        forwarded = report.forwarded,
        "duplicate station count"
    );
    for chunk in report.duplicated_identities().chunks(5) {
        info!("duplicates: {}", chunk.join(" "));
    }
}
