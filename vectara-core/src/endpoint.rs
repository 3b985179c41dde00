//! # Endpoints
//!
//! The platform exposes three logical endpoints. Older deployments give each its own
//! hostname (`admin.vectara.io`, `indexing.vectara.io`, `serving.vectara.io`) and serve
//! REST from an `h.`-prefixed twin of that host; newer ones answer everything on a single
//! unified host (`api.vectara.io`).
//!
//! Hosts are stored bare (no scheme, no trailing slash). Each transport derives its own
//! address from them: `https://[h.]{host}{path}` for REST and `https://{host}:443` for gRPC.
use std::fmt;

pub const DEFAULT_UNIFIED_HOST: &str = "api.vectara.io";
pub const HTTP_HOST_PREFIX: &str = "h.";
const GRPC_TLS_PORT: u16 = 443;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Admin,
    Indexing,
    Serving,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Admin => f.write_str("admin"),
            Endpoint::Indexing => f.write_str("indexing"),
            Endpoint::Serving => f.write_str("serving"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    admin: String,
    indexing: String,
    serving: String,
    http_prefix: bool,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::unified(DEFAULT_UNIFIED_HOST)
    }
}

impl Endpoints {
    /// One host answers admin, indexing and serving calls.
    pub fn unified(host: impl AsRef<str>) -> Self {
        let host = normalize_host(host.as_ref());
        Self {
            admin: host.clone(),
            indexing: host.clone(),
            serving: host,
            http_prefix: false,
        }
    }

    pub fn per_function(
        admin: impl AsRef<str>,
        indexing: impl AsRef<str>,
        serving: impl AsRef<str>,
    ) -> Self {
        Self {
            admin: normalize_host(admin.as_ref()),
            indexing: normalize_host(indexing.as_ref()),
            serving: normalize_host(serving.as_ref()),
            http_prefix: false,
        }
    }

    /// Enables the `h.` host prefix for REST calls. gRPC addresses are never prefixed.
    pub fn with_http_prefix(mut self, enabled: bool) -> Self {
        self.http_prefix = enabled;
        self
    }

    pub fn host(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Admin => &self.admin,
            Endpoint::Indexing => &self.indexing,
            Endpoint::Serving => &self.serving,
        }
    }

    /// Base url for REST calls, e.g. `https://h.indexing.vectara.io`.
    pub fn rest_base(&self, endpoint: Endpoint) -> String {
        let prefix = if self.http_prefix {
            HTTP_HOST_PREFIX
        } else {
            ""
        };
        format!("https://{prefix}{}", self.host(endpoint))
    }

    /// Full REST target, e.g. `https://indexing.vectara.io/upload`.
    pub fn rest_url(&self, endpoint: Endpoint, path: &str) -> String {
        join_url(&self.rest_base(endpoint), path)
    }

    /// Address of the gRPC channel for `endpoint`, always over TLS.
    pub fn grpc_uri(&self, endpoint: Endpoint) -> String {
        let host = self.host(endpoint);
        if host.contains(':') {
            format!("https://{host}")
        } else {
            format!("https://{host}:{GRPC_TLS_PORT}")
        }
    }

    /// Hosts that are empty after normalisation.
    pub fn missing(&self) -> Vec<Endpoint> {
        [Endpoint::Admin, Endpoint::Indexing, Endpoint::Serving]
            .into_iter()
            .filter(|e| self.host(*e).is_empty())
            .collect()
    }
}

/// Joins a base url and an absolute path with exactly one `/` between them.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn normalize_host(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    without_scheme.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_url_has_scheme_and_single_slash() {
        let endpoints =
            Endpoints::per_function("admin.example.com", "indexing.example.com", "serving.example.com");

        assert_eq!(
            endpoints.rest_url(Endpoint::Indexing, "/upload"),
            "https://indexing.example.com/upload"
        );
    }

    #[test]
    fn http_prefix_only_applies_to_rest() {
        let endpoints = Endpoints::unified("indexing.example.com").with_http_prefix(true);

        assert_eq!(
            endpoints.rest_url(Endpoint::Indexing, "/upload"),
            "https://h.indexing.example.com/upload"
        );
        assert_eq!(
            endpoints.grpc_uri(Endpoint::Indexing),
            "https://indexing.example.com:443"
        );
    }

    #[test]
    fn hosts_are_normalized() {
        let endpoints = Endpoints::unified(" https://api.example.com/ ");

        assert_eq!(endpoints.host(Endpoint::Serving), "api.example.com");
        assert_eq!(
            endpoints.rest_url(Endpoint::Serving, "v1/query"),
            "https://api.example.com/v1/query"
        );
        assert_eq!(endpoints.grpc_uri(Endpoint::Admin), "https://api.example.com:443");
    }

    #[test]
    fn explicit_port_is_kept_for_grpc() {
        let endpoints = Endpoints::unified("localhost:8443");
        assert_eq!(endpoints.grpc_uri(Endpoint::Admin), "https://localhost:8443");
    }

    #[test]
    fn reports_missing_hosts() {
        let endpoints = Endpoints::per_function("", "indexing.example.com", "/");
        assert_eq!(endpoints.missing(), vec![Endpoint::Admin, Endpoint::Serving]);
    }
}
