use axum::http::HeaderMap;
use std::net::IpAddr;

const UNKNOWN_PEER: IpAddr = IpAddr::V4(std::net::Ipv4Addr::LOCALHOST);

/// Client IP for a request arriving from `peer`.
///
/// Proxy headers are only believed when `peer` is one of `trusted_proxies`;
/// then `X-Forwarded-For` (first hop) wins over `X-Real-IP`. Otherwise the
/// peer address is the client. Without a transport address (in-process
/// services) every request counts as loopback.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trusted_proxies: &[IpAddr]) -> IpAddr {
    let Some(peer) = peer else {
        return UNKNOWN_PEER;
    };
    if !trusted_proxies.contains(&peer) {
        return peer;
    }
    forwarded_ip(headers).unwrap_or(peer)
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let first_hop = headers
        .get("x-forwarded-for")
        .and_then(|hv| hv.to_str().ok())
        .and_then(|h| h.split(',').next())
        .and_then(|first| first.trim().parse().ok());
    first_hop.or_else(|| {
        headers.get("x-real-ip").and_then(|hv| hv.to_str().ok()).and_then(|h| h.trim().parse().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const PROXY: IpAddr = IpAddr::V4(std::net::Ipv4Addr::new(10, 0, 0, 1));

    fn forwarded() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        headers
    }

    #[test]
    fn test_trusted_proxy_forwarded_for_first_hop() {
        assert_eq!(client_ip(&forwarded(), Some(PROXY), &[PROXY]), IpAddr::from([203, 0, 113, 7]));
    }

    #[test]
    fn test_trusted_proxy_real_ip_then_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers, Some(PROXY), &[PROXY]), IpAddr::from([198, 51, 100, 2]));

        headers.insert("x-real-ip", HeaderValue::from_static("garbage"));
        assert_eq!(client_ip(&headers, Some(PROXY), &[PROXY]), PROXY);
    }

    #[test]
    fn test_untrusted_peer_headers_ignored() {
        let peer = IpAddr::from([192, 0, 2, 9]);
        assert_eq!(client_ip(&forwarded(), Some(peer), &[PROXY]), peer);
        assert_eq!(client_ip(&forwarded(), Some(peer), &[]), peer);
    }

    #[test]
    fn test_missing_peer_is_loopback() {
        assert_eq!(client_ip(&forwarded(), None, &[PROXY]), IpAddr::from([127, 0, 0, 1]));
    }
}
