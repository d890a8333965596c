//! Batch classification over tabular records
//!
//! Applies the verification gate and the scorer to every row of a
//! `RecordBatch`, annotates each row with BOT and EMAIL_STATUS labels,
//! partitions the rows into clean and bot views, and derives the
//! aggregate summary. Row order is preserved everywhere: the partitions
//! are stable filters over the input, never re-sorted.

use crate::dns::MxLookup;
use crate::pipeline::DetectionPipeline;
use crate::{BotLabel, DetectionConfig, DetectionError, EmailStatus, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Column name for the bot label added to annotated rows.
pub const BOT_COLUMN: &str = "BOT";
/// Column name for the email status added to annotated rows.
pub const EMAIL_STATUS_COLUMN: &str = "EMAIL_STATUS";

/// Upper bound on batch size; larger inputs are a caller error.
pub const MAX_BATCH_ROWS: usize = 1_000_000;

/// An ordered tabular dataset: a header row plus data rows.
///
/// Rows are plain string cells addressed by header position; missing
/// trailing cells read as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBatch {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RecordBatch {
    /// Create a batch, rejecting rows wider than the header.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let width = headers.len();
        for (index, row) in rows.iter().enumerate() {
            if row.len() > width {
                return Err(DetectionError::MalformedBatch(format!(
                    "row {} has {} cells but the header has {}",
                    index,
                    row.len(),
                    width
                )));
            }
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name, exact match.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn cell<'a>(row: &'a [String], index: usize) -> &'a str {
        row.get(index).map(String::as_str).unwrap_or("")
    }
}

/// Caller-supplied column identifiers for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Column containing email addresses
    pub email: String,
    /// Optional column containing first names
    pub first_name: Option<String>,
    /// Optional column containing last names
    pub last_name: Option<String>,
}

impl ColumnMapping {
    pub fn email_only(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            first_name: None,
            last_name: None,
        }
    }
}

/// Aggregate counts for a completed batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub total_rows: usize,
    pub rows_with_email: usize,
    pub rows_without_email: usize,
    pub bots_count: usize,
    pub clean_count: usize,
    pub valid_emails: usize,
    pub invalid_syntax_emails: usize,
    pub no_mx_emails: usize,
    pub unknown_emails: usize,
    /// When the run completed (RFC 3339)
    pub timestamp: String,
    /// Echo of the configuration the run used
    pub detection_config: DetectionConfig,
}

/// The three views plus the summary produced by a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    /// Rows with BOT != TRUE, input order preserved
    pub clean: RecordBatch,
    /// Rows with BOT = TRUE, input order preserved
    pub bots: RecordBatch,
    /// Every row with both labels attached, input order preserved
    pub annotated: RecordBatch,
    pub summary: Summary,
}

impl<M: MxLookup> DetectionPipeline<M> {
    /// Classify every row of a batch.
    ///
    /// Rows whose email cell is missing, empty, or all-whitespace are
    /// labeled `BOT=UNKNOWN` / `EMAIL_STATUS=unknown` and land in the
    /// clean partition; unknown is never treated as bot. All other rows
    /// get both labels from one observed verification status, so the
    /// recorded EMAIL_STATUS always matches what the bot decision saw.
    #[instrument(skip(self, batch), fields(rows = batch.len()))]
    pub async fn classify_batch(
        &self,
        batch: &RecordBatch,
        columns: &ColumnMapping,
    ) -> Result<BatchOutcome> {
        if batch.is_empty() {
            return Err(DetectionError::EmptyBatch);
        }
        if batch.len() > MAX_BATCH_ROWS {
            return Err(DetectionError::BatchTooLarge {
                rows: batch.len(),
                limit: MAX_BATCH_ROWS,
            });
        }

        let email_index = batch
            .column_index(&columns.email)
            .ok_or_else(|| DetectionError::MissingColumn(columns.email.clone()))?;
        let first_name_index = columns
            .first_name
            .as_deref()
            .map(|name| {
                batch
                    .column_index(name)
                    .ok_or_else(|| DetectionError::MissingColumn(name.to_string()))
            })
            .transpose()?;
        let last_name_index = columns
            .last_name
            .as_deref()
            .map(|name| {
                batch
                    .column_index(name)
                    .ok_or_else(|| DetectionError::MissingColumn(name.to_string()))
            })
            .transpose()?;

        let mut annotated_headers = batch.headers().to_vec();
        annotated_headers.push(BOT_COLUMN.to_string());
        annotated_headers.push(EMAIL_STATUS_COLUMN.to_string());

        let mut annotated_rows = Vec::with_capacity(batch.len());
        let mut clean_rows = Vec::new();
        let mut bot_rows = Vec::new();

        let mut rows_with_email = 0usize;
        let mut status_counts = [0usize; 4]; // valid, invalid_syntax, no_mx, unknown

        for row in batch.rows() {
            let email = RecordBatch::cell(row, email_index);
            let first_name = first_name_index
                .map(|i| RecordBatch::cell(row, i))
                .filter(|s| !s.trim().is_empty());
            let last_name = last_name_index
                .map(|i| RecordBatch::cell(row, i))
                .filter(|s| !s.trim().is_empty());

            let (bot_label, status) = if email.trim().is_empty() {
                (BotLabel::Unknown, EmailStatus::Unknown)
            } else {
                rows_with_email += 1;
                let status = self.classify_status(email).await;
                let verdict = self.decide(email, status, first_name, last_name);
                let label = if verdict.is_bot {
                    BotLabel::True
                } else {
                    BotLabel::False
                };
                (label, status)
            };

            status_counts[status_slot(status)] += 1;

            let mut annotated = row.clone();
            annotated.resize(batch.headers().len(), String::new());
            annotated.push(bot_label.as_str().to_string());
            annotated.push(status.as_str().to_string());

            if bot_label == BotLabel::True {
                bot_rows.push(annotated.clone());
            } else {
                clean_rows.push(annotated.clone());
            }
            annotated_rows.push(annotated);
        }

        let total_rows = batch.len();
        let bots_count = bot_rows.len();
        let clean_count = clean_rows.len();

        let summary = Summary {
            total_rows,
            rows_with_email,
            rows_without_email: total_rows - rows_with_email,
            bots_count,
            clean_count,
            valid_emails: status_counts[0],
            invalid_syntax_emails: status_counts[1],
            no_mx_emails: status_counts[2],
            unknown_emails: status_counts[3],
            timestamp: Utc::now().to_rfc3339(),
            detection_config: self.config().clone(),
        };

        debug_assert_eq!(summary.bots_count + summary.clean_count, total_rows);
        debug_assert_eq!(
            summary.rows_with_email + summary.rows_without_email,
            total_rows
        );

        info!(
            "Batch classified: {} rows, {} bots, {} clean, {} without email",
            total_rows, bots_count, clean_count, summary.rows_without_email
        );
        debug!(
            "Status counts - valid: {}, invalid_syntax: {}, no_mx: {}, unknown: {}",
            summary.valid_emails,
            summary.invalid_syntax_emails,
            summary.no_mx_emails,
            summary.unknown_emails
        );

        Ok(BatchOutcome {
            clean: RecordBatch {
                headers: annotated_headers.clone(),
                rows: clean_rows,
            },
            bots: RecordBatch {
                headers: annotated_headers.clone(),
                rows: bot_rows,
            },
            annotated: RecordBatch {
                headers: annotated_headers,
                rows: annotated_rows,
            },
            summary,
        })
    }
}

fn status_slot(status: EmailStatus) -> usize {
    match status {
        EmailStatus::Valid => 0,
        EmailStatus::InvalidSyntax => 1,
        EmailStatus::NoMx => 2,
        EmailStatus::Unknown => 3,
    }
}
