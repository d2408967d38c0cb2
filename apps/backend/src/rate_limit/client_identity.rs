use std::net::SocketAddr;
use std::str::FromStr;

use actix_web::http::header::HeaderMap;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// How the rate limiter keys a request to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientIdentity {
    /// First `X-Forwarded-For` hop, falling back to the peer address.
    /// Only safe behind a proxy that overwrites the header.
    #[default]
    Forwarded,
    /// Peer address only.
    Peer,
}

impl ClientIdentity {
    pub fn resolve(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        if *self == ClientIdentity::Forwarded {
            if let Some(first) = first_forwarded_hop(headers) {
                return first;
            }
        }

        peer.map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

fn first_forwarded_hop(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(X_FORWARDED_FOR)?.to_str().ok()?;
    let first = value.split(',').next()?.trim();
    if first.is_empty() {
        None
    } else {
        Some(first.to_string())
    }
}

impl FromStr for ClientIdentity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forwarded" => Ok(ClientIdentity::Forwarded),
            "peer" => Ok(ClientIdentity::Peer),
            other => Err(format!(
                "unknown client identity strategy: {other} (expected forwarded or peer)"
            )),
        }
    }
}
