//! CSV batch classification route handler
//!
//! Accepts a multipart CSV upload, runs the batch classifier, and
//! returns the summary plus (optionally) the annotated partitions,
//! either as JSON or as a CSV rendering of the annotated view.

use crate::api_handler::ApiError;
use crate::AppState;
use axum::{
    extract::{Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use botsift_core::{BatchOutcome, ColumnMapping, RecordBatch, Summary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Query parameters for the batch endpoint
#[derive(Debug, Deserialize)]
pub struct BatchQuery {
    /// Column containing email addresses
    pub email_column: String,
    /// Optional column containing first names
    pub first_name_column: Option<String>,
    /// Optional column containing last names
    pub last_name_column: Option<String>,
    /// Optional threshold override for this run
    pub bot_threshold: Option<f64>,
    /// Include the annotated partitions in the JSON response
    #[serde(default)]
    pub include_rows: bool,
    /// Response format: "json" (default) or "csv" (annotated view)
    pub format: Option<String>,
}

/// JSON response for a batch run
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub request_id: String,
    pub summary: Summary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean: Option<RecordBatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bots: Option<RecordBatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated: Option<RecordBatch>,
}

/// POST /v1/batch?email_column=...
///
/// Multipart body with a single `file` part holding CSV data with a
/// header row. Classification runs with the configured defaults plus
/// any per-run overrides from the query string.
#[instrument(skip(state, multipart), fields(request_id))]
pub async fn batch_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BatchQuery>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    tracing::Span::current().record("request_id", &request_id);

    let file = read_file_part(multipart, state.config.server.max_upload_bytes).await?;
    let batch = parse_csv(&file)?;

    info!(
        "Batch upload received: {} rows, {} columns",
        batch.len(),
        batch.headers().len()
    );

    let columns = ColumnMapping {
        email: query.email_column.clone(),
        first_name: query.first_name_column.clone(),
        last_name: query.last_name_column.clone(),
    };

    let pipeline = crate::pipeline_for_request(&state, query.bot_threshold)?;
    let outcome = pipeline.classify_batch(&batch, &columns).await?;

    info!(
        "Batch classified: {} bots, {} clean of {} rows",
        outcome.summary.bots_count, outcome.summary.clean_count, outcome.summary.total_rows
    );

    match query.format.as_deref() {
        Some("csv") => csv_response(&outcome),
        Some("json") | None => Ok(json_response(outcome, request_id, query.include_rows)),
        Some(other) => Err(ApiError::InvalidRequest(format!(
            "unsupported format '{}', expected 'json' or 'csv'",
            other
        ))),
    }
}

/// Extract the `file` part from the multipart body, enforcing the
/// configured size limit.
async fn read_file_part(mut multipart: Multipart, max_bytes: usize) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("failed to read upload: {}", e)))?;
        if data.len() > max_bytes {
            warn!("Upload of {} bytes exceeds limit of {}", data.len(), max_bytes);
            return Err(ApiError::UploadTooLarge);
        }
        return Ok(data.to_vec());
    }

    Err(ApiError::InvalidRequest(
        "multipart body must contain a 'file' part".to_string(),
    ))
}

/// Parse CSV bytes (header row required) into a record batch.
fn parse_csv(data: &[u8]) -> Result<RecordBatch, ApiError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ApiError::InvalidRequest(format!("invalid CSV header: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| ApiError::InvalidRequest(format!("invalid CSV row: {}", e)))?;
        rows.push(record.iter().map(|c| c.to_string()).collect());
    }

    RecordBatch::new(headers, rows).map_err(ApiError::from)
}

/// Render a record batch back to CSV text.
fn write_csv(batch: &RecordBatch) -> Result<String, ApiError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(batch.headers())
        .map_err(|e| ApiError::InternalError(format!("CSV write failed: {}", e)))?;
    for row in batch.rows() {
        writer
            .write_record(row)
            .map_err(|e| ApiError::InternalError(format!("CSV write failed: {}", e)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ApiError::InternalError(format!("CSV write failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| ApiError::InternalError(e.to_string()))
}

fn json_response(outcome: BatchOutcome, request_id: String, include_rows: bool) -> Response {
    let response = if include_rows {
        BatchResponse {
            request_id,
            summary: outcome.summary,
            clean: Some(outcome.clean),
            bots: Some(outcome.bots),
            annotated: Some(outcome.annotated),
        }
    } else {
        BatchResponse {
            request_id,
            summary: outcome.summary,
            clean: None,
            bots: None,
            annotated: None,
        }
    };
    Json(response).into_response()
}

fn csv_response(outcome: &BatchOutcome) -> Result<Response, ApiError> {
    let body = write_csv(&outcome.annotated)?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"annotated.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn csv_parse_round_trip() {
        let input = "email,first,last\nalice@gmail.com,Alice,Smith\nbot@mailinator.com,,\n";
        let batch = parse_csv(input.as_bytes()).unwrap();

        assert_eq!(batch.headers(), &["email", "first", "last"]);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.rows()[0][0], "alice@gmail.com");
        assert_eq!(batch.rows()[1][1], "");

        let rendered = write_csv(&batch).unwrap();
        assert_eq!(rendered, input);
    }

    #[test]
    fn csv_parse_accepts_short_rows() {
        let input = "email,first\nalice@gmail.com\n";
        let batch = parse_csv(input.as_bytes()).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.rows()[0].len(), 1);
    }

    #[test]
    fn csv_parse_rejects_non_utf8_input() {
        let input = b"email\n\xff\xfe@example.com\n";
        assert!(parse_csv(input).is_err());
    }
}
