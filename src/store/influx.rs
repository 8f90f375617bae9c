//! InfluxDB v2 sample store.
//!
//! Queries are written in Flux and posted to `/api/v2/query`; the response
//! is annotated CSV, projected down to `_time`, `_field` and `_value`.

use csv::{ReaderBuilder, StringRecord};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::store::{RawSample, SampleQuery, SampleStore};
use crate::temporal::parse_rfc3339_utc;

/// Build the Flux query for a sample query against `bucket`
pub fn build_flux_query(bucket: &str, query: &SampleQuery) -> String {
    let fields_filter = query
        .fields()
        .iter()
        .map(|f| format!("r._field == \"{}\"", escape_flux(f)))
        .collect::<Vec<_>>()
        .join(" or ");

    format!(
        "from(bucket: \"{}\")\n  |> range(start: -{}d)\n  |> filter(fn: (r) => r._measurement == \"{}\")\n  |> filter(fn: (r) => {})\n",
        escape_flux(bucket),
        query.lookback_days(),
        escape_flux(query.measurement()),
        fields_filter
    )
}

fn escape_flux(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[derive(Clone, Copy)]
enum TableHeader {
    Samples { time: usize, field: usize, value: usize },
    Error { message: usize },
}

fn position(record: &StringRecord, name: &str) -> Option<usize> {
    record.iter().position(|cell| cell.trim() == name)
}

/// Recognise a table header row. `Ok(None)` means a data row.
fn table_header(record: &StringRecord) -> Result<Option<TableHeader>> {
    let (time, field, value) = (
        position(record, "_time"),
        position(record, "_field"),
        position(record, "_value"),
    );
    match (time, field, value) {
        (Some(time), Some(field), Some(value)) => {
            Ok(Some(TableHeader::Samples { time, field, value }))
        }
        (None, None, None) => Ok(position(record, "error")
            .map(|message| TableHeader::Error { message })),
        _ => Err(Error::StoreQuery(
            "response table lacks one of the _time, _field or _value columns".into(),
        )),
    }
}

/// Parse an annotated CSV query response into samples.
///
/// Annotation rows (`#group`, `#datatype`, `#default`) and blank separator
/// lines are skipped, and every table may carry its own header row.
/// Timestamps are normalised to UTC. Rows whose `_value` is not numeric
/// are dropped.
pub fn parse_annotated_csv(body: &str) -> Result<Vec<RawSample>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(body.as_bytes());

    let mut header: Option<TableHeader> = None;
    let mut samples = Vec::new();
    let mut skipped = 0usize;

    for result in rdr.records() {
        let record =
            result.map_err(|e| Error::StoreQuery(format!("malformed query response: {}", e)))?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        if let Some(found) = table_header(&record)? {
            header = Some(found);
            continue;
        }

        match header {
            Some(TableHeader::Samples { time, field, value }) => {
                let (ts, variable, raw) = match (record.get(time), record.get(field), record.get(value)) {
                    (Some(ts), Some(variable), Some(raw)) => (ts, variable, raw),
                    _ => {
                        skipped += 1;
                        continue;
                    }
                };
                let timestamp = parse_rfc3339_utc(ts)
                    .map_err(|e| Error::StoreQuery(format!("bad _time in response: {}", e)))?;
                match raw.trim().parse::<f64>() {
                    Ok(v) => samples.push(RawSample::new(timestamp, variable.trim(), v)),
                    Err(_) => skipped += 1,
                }
            }
            Some(TableHeader::Error { message }) => {
                let message = record.get(message).unwrap_or("unknown error").trim();
                return Err(Error::StoreQuery(message.to_string()));
            }
            None => {
                return Err(Error::StoreQuery(
                    "query response has a data row before any header".into(),
                ))
            }
        }
    }

    if skipped > 0 {
        log::debug!("skipped {} rows without a numeric _value", skipped);
    }
    Ok(samples)
}

/// Pull a readable message out of an error response body
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Store backed by the InfluxDB v2 HTTP query API
#[derive(Debug)]
pub struct InfluxStore {
    config: StoreConfig,
    query_url: Url,
    client: Client,
}

impl InfluxStore {
    /// Create a store from explicit connection settings
    pub fn new(config: StoreConfig) -> Result<Self> {
        let mut base = Url::parse(&config.url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let mut query_url = base.join("api/v2/query")?;
        query_url.query_pairs_mut().append_pair("org", &config.org);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(InfluxStore {
            config,
            query_url,
            client,
        })
    }

    /// Endpoint queries are posted to
    pub fn query_url(&self) -> &Url {
        &self.query_url
    }
}

impl SampleStore for InfluxStore {
    fn fetch(&self, query: &SampleQuery) -> Result<Vec<RawSample>> {
        let flux = build_flux_query(&self.config.bucket, query);
        log::debug!("querying {} for {}", self.query_url, query);

        let response = self
            .client
            .post(self.query_url.clone())
            .header(AUTHORIZATION, format!("Token {}", self.config.token))
            .header(ACCEPT, "application/csv")
            .header(CONTENT_TYPE, "application/vnd.flux")
            .body(flux)
            .send()?;

        let status = response.status();
        let body = response.text()?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::StoreConnection(format!(
                "credentials rejected ({}): {}",
                status,
                error_message(&body)
            )));
        }
        if !status.is_success() {
            return Err(Error::StoreQuery(format!(
                "query failed ({}): {}",
                status,
                error_message(&body)
            )));
        }

        let samples = parse_annotated_csv(&body)?;
        log::info!("fetched {} samples for {}", samples.len(), query);
        Ok(samples)
    }
}
