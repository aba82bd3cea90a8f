use std::thread;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.loyverse.com/v1.0";
pub(crate) const USER_AGENT: &str = concat!("mallfeed/", env!("CARGO_PKG_VERSION"));

/// Connection settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API base URL, no trailing slash (e.g. "https://api.loyverse.com/v1.0")
    pub api_base: String,
    /// Bearer token
    pub token: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Extra attempts for 429 / 5xx / network errors. Zero by default: a
    /// failed page aborts the fetch on the first non-success answer.
    pub max_retries: u32,
    /// First backoff delay, doubled after every retry
    pub backoff: Duration,
}

impl ApiConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
            timeout: Duration::from_secs(30),
            max_retries: 0,
            backoff: Duration::from_secs(1),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

/// Error type for POS API operations.
#[derive(Debug)]
pub enum PosError {
    /// No store carries the tenant's name
    StoreNotFound(String),
    /// More than one store carries the tenant's name
    StoreAmbiguous { name: String, matches: usize },
    /// Token rejected (401/403)
    Auth(u16, String),
    /// Non-success HTTP status
    Http(u16, String),
    /// Connection / timeout error
    Network(String),
    /// Response body is not what the endpoint documents
    Parse(String),
    /// Cursor repeated itself
    PaginationStuck(String),
}

impl std::fmt::Display for PosError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PosError::StoreNotFound(name) => write!(f, "no store named {:?}", name),
            PosError::StoreAmbiguous { name, matches } => {
                write!(f, "{} stores named {:?}", matches, name)
            }
            PosError::Auth(code, msg) => write!(f, "auth failed ({}): {}", code, msg),
            PosError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            PosError::Network(msg) => write!(f, "Network error: {}", msg),
            PosError::Parse(msg) => write!(f, "Parse error: {}", msg),
            PosError::PaginationStuck(cursor) => {
                write!(f, "pagination stuck: cursor {} repeated", cursor)
            }
        }
    }
}

impl std::error::Error for PosError {}

/// POS API client (blocking).
pub struct PosClient {
    pub(crate) http: reqwest::blocking::Client,
    pub(crate) config: ApiConfig,
}

impl PosClient {
    pub fn new(config: ApiConfig) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build HTTP client");

        Self { http, config }
    }

    /// GET `{api_base}/{resource}` with retry + exponential backoff.
    ///
    /// Auth errors and other 4xx fail immediately. 429 (honouring
    /// `Retry-After`), 5xx and network errors are retried up to
    /// `max_retries` times; the last failure is returned as-is.
    pub(crate) fn get_json(
        &self,
        resource: &str,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value, PosError> {
        let url = format!("{}/{}", self.config.api_base, resource);
        let mut backoff = self.config.backoff;

        for attempt in 0..=self.config.max_retries {
            let last_attempt = attempt == self.config.max_retries;
            let result = self
                .http
                .get(&url)
                .bearer_auth(&self.config.token)
                .query(params)
                .send();

            let resp = match result {
                Ok(resp) => resp,
                Err(e) => {
                    if last_attempt {
                        return Err(PosError::Network(format!("GET {}: {}", resource, e)));
                    }
                    tracing::warn!(
                        "retry {}/{} in {:?} (GET {}: {})",
                        attempt + 1,
                        self.config.max_retries,
                        backoff,
                        resource,
                        e,
                    );
                    thread::sleep(backoff);
                    backoff *= 2;
                    continue;
                }
            };

            let status = resp.status().as_u16();

            if status == 401 || status == 403 {
                let body: serde_json::Value = resp.json().unwrap_or(serde_json::Value::Null);
                return Err(PosError::Auth(status, extract_error(&body, status)));
            }

            if (400..500).contains(&status) && status != 429 {
                let body: serde_json::Value = resp.json().unwrap_or(serde_json::Value::Null);
                return Err(PosError::Http(status, extract_error(&body, status)));
            }

            if status == 429 || status >= 500 {
                if last_attempt {
                    let body: serde_json::Value = resp.json().unwrap_or(serde_json::Value::Null);
                    return Err(PosError::Http(status, extract_error(&body, status)));
                }

                let wait = if status == 429 {
                    resp.headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .map(Duration::from_secs)
                        .unwrap_or(backoff)
                } else {
                    backoff
                };

                tracing::warn!(
                    "retry {}/{} in {:?} (GET {} returned HTTP {})",
                    attempt + 1,
                    self.config.max_retries,
                    wait,
                    resource,
                    status,
                );
                thread::sleep(wait);
                backoff *= 2;
                continue;
            }

            let text = resp
                .text()
                .map_err(|e| PosError::Network(format!("reading {} response: {}", resource, e)))?;
            return serde_json::from_str(&text).map_err(|e| {
                PosError::Parse(format!(
                    "{} response is not JSON: {} (body: {})",
                    resource,
                    e,
                    text.chars().take(200).collect::<String>(),
                ))
            });
        }

        unreachable!()
    }
}

/// Pull a readable message out of an error body.
///
/// The API answers `{"errors": [{"code": "...", "details": "..."}]}`.
fn extract_error(body: &serde_json::Value, status: u16) -> String {
    let first = &body["errors"][0];
    match (first["code"].as_str(), first["details"].as_str()) {
        (Some(code), Some(details)) => format!("{}: {}", code, details),
        (Some(code), None) => code.to_string(),
        (None, Some(details)) => details.to_string(),
        (None, None) => format!("HTTP {}", status),
    }
}
