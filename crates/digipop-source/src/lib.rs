// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use digipop_app::{Dataset, Record};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Clone)]
enum Source {
    Http { url: Url, http: HttpClient },
    File(PathBuf),
    Demo,
    Empty,
}

/// Fetches the candidate records once at startup.
#[derive(Debug, Clone)]
pub struct Loader {
    source: Source,
}

impl Loader {
    pub fn http(url: &str, timeout: Duration, headers: &[(String, String)]) -> Result<Self> {
        let url = Url::parse(url).with_context(|| format!("invalid dataset url {url:?}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "dataset url {url} must use http or https; use dataset.path for local files"
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .default_headers(header_map(headers)?)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            source: Source::Http { url, http },
        })
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(path.into()),
        }
    }

    pub fn demo() -> Self {
        Self {
            source: Source::Demo,
        }
    }

    /// No dataset configured: every query matches nothing.
    pub fn empty() -> Self {
        Self {
            source: Source::Empty,
        }
    }

    /// Treats `http://` and `https://` locations as URLs and anything else as
    /// a file path.
    pub fn from_location(
        location: &str,
        timeout: Duration,
        headers: &[(String, String)],
    ) -> Result<Self> {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::http(location, timeout, headers)
        } else {
            Ok(Self::file(location))
        }
    }

    pub fn describe(&self) -> String {
        match &self.source {
            Source::Http { url, .. } => url.to_string(),
            Source::File(path) => path.display().to_string(),
            Source::Demo => "built-in demo records".to_owned(),
            Source::Empty => "no dataset configured".to_owned(),
        }
    }

    pub fn load(&self) -> Result<Dataset> {
        self.load_outcome().map(|outcome| outcome.dataset)
    }

    /// Like [`Loader::load`], also counting the rows that were skipped.
    pub fn load_outcome(&self) -> Result<LoadOutcome> {
        match &self.source {
            Source::Http { url, http } => fetch(http, url),
            Source::File(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("read dataset file {}", path.display()))?;
                parse_rows(&raw).with_context(|| format!("parse dataset {}", path.display()))
            }
            Source::Demo => Ok(LoadOutcome::complete(demo_dataset())),
            Source::Empty => Ok(LoadOutcome::complete(Dataset::empty())),
        }
    }

    /// Loads once; any failure is logged and yields an empty dataset.
    pub fn load_or_empty(&self) -> Dataset {
        match self.load() {
            Ok(dataset) => {
                info!(
                    source = %self.describe(),
                    records = dataset.len(),
                    "dataset loaded"
                );
                dataset
            }
            Err(error) => {
                warn!(source = %self.describe(), "dataset load failed: {error:#}");
                Dataset::empty()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub dataset: Dataset,
    pub skipped: usize,
}

impl LoadOutcome {
    fn complete(dataset: Dataset) -> Self {
        Self {
            dataset,
            skipped: 0,
        }
    }
}

fn fetch(http: &HttpClient, url: &Url) -> Result<LoadOutcome> {
    let response = http
        .get(url.clone())
        .send()
        .map_err(|error| connection_error(url, error))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(clean_error_response(status, &body));
    }

    let raw = response.text().context("read dataset response")?;
    parse_rows(&raw).with_context(|| format!("parse dataset from {url}"))
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .with_context(|| format!("invalid dataset header name {name:?}"))?;
        let header_value = HeaderValue::from_str(value)
            .with_context(|| format!("invalid value for dataset header {name:?}"))?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

fn connection_error(url: &Url, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach dataset at {} -- check dataset.url and network access ({})",
        url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        return anyhow!("dataset server error ({}): {}", status.as_u16(), body.trim());
    }
    anyhow!("dataset server returned {}", status.as_u16())
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    id: Option<RawId>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

impl RawId {
    fn to_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Text(value) => value.trim().parse().ok(),
        }
    }
}

/// Decodes a JSON array of `{ "id", "title" }` objects. Rows whose id is
/// missing or not integer-like are skipped.
pub fn parse_records(raw: &str) -> Result<Dataset> {
    parse_rows(raw).map(|outcome| outcome.dataset)
}

fn parse_rows(raw: &str) -> Result<LoadOutcome> {
    let rows: Vec<serde_json::Value> = serde_json::from_str(raw)
        .context("decode records; expected a JSON array of {\"id\", \"title\"} objects")?;

    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0;
    for (index, row) in rows.into_iter().enumerate() {
        let parsed = match serde_json::from_value::<RawRecord>(row) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(row = index, "skipping malformed record: {error}");
                skipped += 1;
                continue;
            }
        };
        let Some(id) = parsed.id.as_ref().and_then(RawId::to_i64) else {
            warn!(row = index, "skipping record without an integer id");
            skipped += 1;
            continue;
        };
        records.push(Record::new(id, parsed.title.unwrap_or_default()));
    }
    Ok(LoadOutcome {
        dataset: Dataset::new(records),
        skipped,
    })
}

pub fn demo_dataset() -> Dataset {
    const DEMO: [(i64, &str); 12] = [
        (1, "Mounting bracket"),
        (12, "Door hinge, brass"),
        (13, "Gasket set"),
        (101, "Ball valve 1/2\""),
        (117, "Bearing 6203"),
        (1245, "Widget"),
        (1250, "Widget, heavy duty"),
        (2001, "Relay module"),
        (2040, "Pressure sensor"),
        (3310, "Drive pulley"),
        (4512, "Return spring"),
        (90210, "Spare latch"),
    ];
    Dataset::new(
        DEMO.iter()
            .map(|(id, title)| Record::new(*id, *title))
            .collect(),
    )
}
