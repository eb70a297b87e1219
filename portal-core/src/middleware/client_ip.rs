use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, Extensions, HeaderMap},
};
use std::{convert::Infallible, net::IpAddr, net::SocketAddr};

/// Resolve the client address from `x-forwarded-for` (first hop) or, failing
/// that, from the connection info axum attached to the request.
pub fn resolve_client_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok());

    forwarded.or_else(|| {
        extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    })
}

/// Extractor handing the resolved client address to handlers that key
/// throttling state per caller.
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub Option<IpAddr>);

impl ClientIp {
    /// Stable string form for composite throttle keys. Requests whose origin
    /// cannot be determined share one bucket.
    pub fn as_key(&self) -> String {
        match self.0 {
            Some(ip) => ip.to_string(),
            None => "unknown".to_string(),
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientIp(resolve_client_ip(&parts.headers, &parts.extensions)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.1.2.3, 172.16.0.1"));
        let extensions = Extensions::new();

        let ip = resolve_client_ip(&headers, &extensions);
        assert_eq!(ip, Some("10.1.2.3".parse().unwrap()));
    }

    #[test]
    fn falls_back_to_connect_info() {
        let headers = HeaderMap::new();
        let mut extensions = Extensions::new();
        let addr: SocketAddr = "192.168.1.9:4431".parse().unwrap();
        extensions.insert(ConnectInfo(addr));

        let ip = resolve_client_ip(&headers, &extensions);
        assert_eq!(ip, Some("192.168.1.9".parse().unwrap()));
    }

    #[test]
    fn unknown_origin_shares_a_bucket() {
        assert_eq!(ClientIp(None).as_key(), "unknown");
    }
}
