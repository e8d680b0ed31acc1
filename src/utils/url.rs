//! Endpoint URL helpers.
//!
//! Endpoints arrive from config, routing replies, and the command line, with
//! or without trailing slashes. Everything that appends a path goes through
//! [`construct_api_url`].

/// Strip trailing slashes from an endpoint base URL.
///
/// ```
/// use nlweb_chat::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:8000/"), "http://localhost:8000");
/// assert_eq!(normalize_base_url("https://recipes.example/nlweb//"), "https://recipes.example/nlweb");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join an endpoint base URL and a path with exactly one slash.
///
/// ```
/// use nlweb_chat::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:8000/", "/mcp"),
///     "http://localhost:8000/mcp"
/// );
/// ```
pub fn construct_api_url(base_url: &str, path: &str) -> String {
    let base = normalize_base_url(base_url);
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

/// Accepts absolute `http`/`https` URLs with a host.
pub fn validate_endpoint(endpoint: &str) -> Result<(), String> {
    let parsed = url::Url::parse(endpoint.trim())
        .map_err(|err| format!("Invalid endpoint URL '{endpoint}': {err}"))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(()),
        "http" | "https" => Err(format!("Endpoint URL '{endpoint}' has no host")),
        scheme => Err(format!(
            "Endpoint URL '{endpoint}' must use http or https, not {scheme}"
        )),
    }
}
