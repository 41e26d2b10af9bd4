//! Which browser origins may connect.
//!
//! Browsers do not apply CORS to WebSocket upgrades, so the upgrade handler
//! checks the `Origin` header itself. Clients that send no `Origin` (anything
//! that is not a browser) are let through.

use axum::http::{header::ORIGIN, HeaderMap, HeaderValue, Method};
use procwatch_core::ServerConfig;
use std::fmt;
use tower_http::cors::{AllowOrigin, CorsLayer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPolicy {
    Any,
    List(Vec<String>),
}

impl OriginPolicy {
    /// Build a policy from configured origins. `*` anywhere allows everything.
    pub fn from_origins(origins: &[String]) -> Self {
        let origins: Vec<String> = origins
            .iter()
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();

        if origins.iter().any(|o| o == ServerConfig::ANY_ORIGIN) {
            OriginPolicy::Any
        } else {
            OriginPolicy::List(origins)
        }
    }

    pub fn allows(&self, origin: &str) -> bool {
        match self {
            OriginPolicy::Any => true,
            OriginPolicy::List(list) => list.iter().any(|o| o == origin),
        }
    }

    /// Check the request's `Origin` header. A header that is not valid UTF-8 is refused.
    pub fn allows_request(&self, headers: &HeaderMap) -> bool {
        match headers.get(ORIGIN) {
            None => true,
            Some(value) => value.to_str().map(|o| self.allows(o)).unwrap_or(false),
        }
    }

    /// CORS layer for the plain HTTP endpoints.
    pub fn cors_layer(&self) -> anyhow::Result<CorsLayer> {
        let allow_origin = match self {
            OriginPolicy::Any => AllowOrigin::any(),
            OriginPolicy::List(list) => {
                let values = list
                    .iter()
                    .map(|o| HeaderValue::from_str(o))
                    .collect::<Result<Vec<_>, _>>()?;
                AllowOrigin::list(values)
            }
        };

        Ok(CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST]))
    }
}

impl fmt::Display for OriginPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginPolicy::Any => write!(f, "*"),
            OriginPolicy::List(list) if list.is_empty() => write!(f, "(none)"),
            OriginPolicy::List(list) => write!(f, "{}", list.join(", ")),
        }
    }
}
