#[derive(Clone, Debug)]
pub struct Config {
    pub api_base: String,
    pub http_timeout_secs: u64,
    pub retry_max: u32,
    pub retry_base_ms: u64,
    pub retry_max_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            api_base: std::env::var("API_BASE")
                .unwrap_or_else(|_| "http://127.0.0.1:8000/api".to_string()),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            retry_max: std::env::var("RETRY_MAX")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            retry_base_ms: std::env::var("RETRY_BASE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
            retry_max_ms: std::env::var("RETRY_MAX_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
        }
    }

    /// Full URL for an endpoint name, tolerating a trailing slash on the base.
    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:8000/api".to_string(),
            http_timeout_secs: 10,
            retry_max: 3,
            retry_base_ms: 100,
            retry_max_ms: 5000,
        }
    }
}
