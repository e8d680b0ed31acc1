//! Query-string overrides supplied alongside a query.
//!
//! `endpoint` bypasses routing, `site` and `num_results` are forwarded to the
//! tool, and every other key is forwarded verbatim as a string argument.

use crate::core::orchestrator::QueryOptions;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

pub const ENDPOINT_PARAM: &str = "endpoint";
pub const SITE_PARAM: &str = "site";
pub const NUM_RESULTS_PARAM: &str = "num_results";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub endpoint: Option<String>,
    pub site: Option<String>,
    pub num_results: Option<i64>,
    pub extra: BTreeMap<String, String>,
}

impl QueryParams {
    /// Parses `endpoint=..&site=..&num_results=5&k=v`. A leading `?` and a
    /// full URL (only its query part is read) are both accepted.
    pub fn from_query_string(input: &str) -> Self {
        let input = input.trim();
        let query = match url::Url::parse(input) {
            Ok(parsed) if parsed.has_host() => parsed.query().unwrap_or_default().to_string(),
            _ => input.trim_start_matches('?').to_string(),
        };
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()).into_owned())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            params.set(key.into(), value.into());
        }
        params
    }

    /// Later values for the same key replace earlier ones. Blank values
    /// clear `endpoint` and `site`.
    pub fn set(&mut self, key: String, value: String) {
        match key.as_str() {
            ENDPOINT_PARAM => self.endpoint = non_blank(value),
            SITE_PARAM => self.site = non_blank(value),
            NUM_RESULTS_PARAM => match value.trim().parse::<i64>() {
                Ok(count) => self.num_results = Some(count),
                Err(_) => {
                    warn!(value = %value, "Ignoring non-integer num_results");
                }
            },
            _ => {
                self.extra.insert(key, value);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.endpoint.is_none()
            && self.site.is_none()
            && self.num_results.is_none()
            && self.extra.is_empty()
    }

    /// Auxiliary tool arguments, excluding the routing override.
    pub fn tool_args(&self) -> Map<String, Value> {
        let mut args = Map::new();
        if let Some(site) = &self.site {
            args.insert(SITE_PARAM.to_string(), Value::String(site.clone()));
        }
        if let Some(count) = self.num_results {
            args.insert(NUM_RESULTS_PARAM.to_string(), Value::from(count));
        }
        for (key, value) in &self.extra {
            args.insert(key.clone(), Value::String(value.clone()));
        }
        args
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl From<&QueryParams> for QueryOptions {
    fn from(params: &QueryParams) -> Self {
        QueryOptions {
            endpoint_override: params.endpoint.clone(),
            tool_args: params.tool_args(),
        }
    }
}
