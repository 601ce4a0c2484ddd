//! HTTP backend for the managed relational store (PostgREST dialect).
//!
//! Reads go to `GET {base}/rest/v1/{table}` with filters encoded as query parameters
//! (`status=eq.Ocupado`, `or=(name.ilike.*ana*,cpf.ilike.*ana*)`, ...). Counts use
//! `HEAD` with `Prefer: count=exact` and read the total from `Content-Range`.

use super::{Filter, Query, RecordStore, Table};
use crate::constants::REST_PATH_PREFIX;
use crate::error::{WardError, WardResult};
use async_trait::async_trait;
use records::Row;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use reqwest::StatusCode;
use serde_json::Value;

#[derive(Clone)]
pub struct PostgrestStore {
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for PostgrestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestStore")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl PostgrestStore {
    /// Create a client for the project at `base_url`, authenticating with the project key.
    ///
    /// `access_token` is the signed-in user's session token when one exists; without it the
    /// project key is sent as the bearer token.
    pub fn new(
        base_url: impl Into<String>,
        api_key: &str,
        access_token: Option<&str>,
    ) -> WardResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(WardError::InvalidConfig(
                "record store URL cannot be empty".into(),
            ));
        }
        if api_key.trim().is_empty() {
            return Err(WardError::InvalidConfig(
                "record store key cannot be empty".into(),
            ));
        }

        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(api_key)?);
        let bearer = format!("Bearer {}", access_token.unwrap_or(api_key));
        headers.insert(AUTHORIZATION, header_value(&bearer)?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, table: Table) -> String {
        format!("{}/{}/{}", self.base_url, REST_PATH_PREFIX, table.as_str())
    }
}

fn header_value(value: &str) -> WardResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| WardError::InvalidConfig("credentials contain invalid characters".into()))
}

/// Render a scalar as a PostgREST literal.
fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Quote a literal when it contains characters reserved inside `or=(...)` and `in.(...)`.
fn quoted(raw: String) -> String {
    if raw.contains([',', '.', ':', '(', ')', '"', ' ']) {
        format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        raw
    }
}

/// `ilike` pattern matching `needle` anywhere, with its characters taken literally.
///
/// `%`, `_` and `\` are escaped for LIKE. PostgREST turns every `*` into `%` and has no
/// escape for it, so a literal `*` becomes `_`: it matches any single character there, a
/// little broader than the in-memory store.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('*');
    for c in needle.chars() {
        match c {
            '%' | '_' | '\\' => {
                pattern.push('\\');
                pattern.push(c);
            }
            '*' => pattern.push('_'),
            other => pattern.push(other),
        }
    }
    pattern.push('*');
    pattern
}

/// Operator and operand of a single-column filter, e.g. `eq.Ativa`.
fn operator(filter: &Filter, nested: bool) -> Option<(&'static str, String)> {
    let scalar = |v: &Value| {
        let raw = literal(v);
        if nested {
            quoted(raw)
        } else {
            raw
        }
    };
    match filter {
        Filter::Eq(column, v) => Some((*column, format!("eq.{}", scalar(v)))),
        Filter::Gte(column, v) => Some((*column, format!("gte.{}", scalar(v)))),
        Filter::Lt(column, v) => Some((*column, format!("lt.{}", scalar(v)))),
        Filter::In(column, values) => {
            let items: Vec<String> = values.iter().map(|v| quoted(literal(v))).collect();
            Some((*column, format!("in.({})", items.join(","))))
        }
        Filter::Contains(column, needle) => {
            let pattern = contains_pattern(needle);
            let pattern = if nested { quoted(pattern) } else { pattern };
            Some((*column, format!("ilike.{}", pattern)))
        }
        Filter::Any(_) => None,
    }
}

/// Encode filters as query parameters.
fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .filter_map(|filter| match filter {
            Filter::Any(inner) => {
                let parts: Vec<String> = inner
                    .iter()
                    .filter_map(|f| operator(f, true))
                    .map(|(column, op)| format!("{column}.{op}"))
                    .collect();
                Some(("or".to_owned(), format!("({})", parts.join(","))))
            }
            single => operator(single, false).map(|(column, op)| (column.to_owned(), op)),
        })
        .collect()
}

fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_owned(), "*".to_owned())];
    params.extend(filter_params(&query.filters));
    if let Some(order) = query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_owned(), format!("{}.{}", order.column, direction)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_owned(), limit.to_string()));
    }
    params
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

async fn check_status(response: reqwest::Response) -> WardResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(WardError::Unauthorized {
            status: status.as_u16(),
            message,
        }),
        _ => Err(WardError::Backend {
            status: status.as_u16(),
            message,
        }),
    }
}

#[async_trait]
impl RecordStore for PostgrestStore {
    async fn query(&self, table: Table, query: &Query) -> WardResult<Vec<Row>> {
        let response = self
            .client
            .get(self.endpoint(table))
            .query(&query_params(query))
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;
        let rows: Vec<Row> = serde_json::from_str(&body)?;
        tracing::debug!("fetched {} rows from {}", rows.len(), table);
        Ok(rows)
    }

    async fn count(&self, table: Table, filters: &[Filter]) -> WardResult<u64> {
        let mut params = vec![("select".to_owned(), "*".to_owned())];
        params.extend(filter_params(filters));
        let response = self
            .client
            .head(self.endpoint(table))
            .query(&params)
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = check_status(response).await?;
        let status = response.status().as_u16();
        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| WardError::Backend {
                status,
                message: format!("missing or invalid content-range counting {}", table),
            })
    }
}
