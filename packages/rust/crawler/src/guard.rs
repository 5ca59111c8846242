//! Outbound URL validation (SSRF protection).

use std::net::IpAddr;

use url::{Host, Url};

use seoscribe_shared::{Result, SeoscribeError};

/// Parse `raw` and reject anything the fetcher must not touch.
///
/// Non-HTTP schemes are always refused. Loopback, private-range and
/// `localhost`/`.local`/`.internal` hosts are refused unless `allow_private`.
pub fn validate_target(raw: &str, allow_private: bool) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| SeoscribeError::validation(format!("invalid URL {raw:?}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(SeoscribeError::validation(format!(
            "unsupported scheme {:?} in {url}",
            url.scheme()
        )));
    }

    if url.host().is_none() {
        return Err(SeoscribeError::validation(format!("missing host in {url}")));
    }

    if !allow_private && is_internal_target(&url) {
        return Err(SeoscribeError::validation(format!(
            "refusing to fetch internal address {url}"
        )));
    }

    Ok(url)
}

/// True if the URL points at this machine or a private network.
pub fn is_internal_target(url: &Url) -> bool {
    match url.host() {
        Some(Host::Ipv4(v4)) => is_private_ip(&IpAddr::V4(v4)),
        Some(Host::Ipv6(v6)) => is_private_ip(&IpAddr::V6(v6)),
        Some(Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            domain == "localhost"
                || domain.ends_with(".localhost")
                || domain.ends_with(".local")
                || domain.ends_with(".internal")
        }
        None => true,
    }
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, c, _] = v4.octets();
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10 carrier-grade NAT
                || (a == 100 && (b & 0xC0) == 64)
                || (a == 192 && b == 0 && c == 0)
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique local, fe80::/10 link local
                || (first & 0xFE00) == 0xFC00
                || (first & 0xFFC0) == 0xFE80
                || v6.to_ipv4_mapped().is_some_and(|v4| is_private_ip(&IpAddr::V4(v4)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_non_http_schemes() {
        assert!(validate_target("file:///etc/passwd", true).is_err());
        assert!(validate_target("ftp://acme.example/", true).is_err());
    }

    #[test]
    fn blocks_private_addresses() {
        for raw in [
            "http://192.168.1.1/admin",
            "http://10.0.0.1/",
            "http://127.0.0.1:8080/",
            "http://100.64.0.1/",
            "http://[::1]/",
            "http://[fd00::1]/",
            "http://localhost:3000/api",
            "http://printer.local/",
            "http://metadata.google.internal/",
        ] {
            let err = validate_target(raw, false).unwrap_err();
            assert!(
                err.to_string().contains("internal address"),
                "{raw} should be blocked"
            );
        }
    }

    #[test]
    fn allows_public_hosts() {
        let url = validate_target("  https://acme.example/about ", false).unwrap();
        assert_eq!(url.as_str(), "https://acme.example/about");
    }

    #[test]
    fn private_hosts_allowed_when_opted_in() {
        assert!(validate_target("http://127.0.0.1:8080/", true).is_ok());
    }

    #[test]
    fn rejects_garbage() {
        let err = validate_target("not a url", false).unwrap_err();
        assert!(matches!(err, SeoscribeError::Validation { .. }));
    }
}
