//! SSRF validation for media URLs
//!
//! Blocks fetches that would reach internal infrastructure:
//! - IPv4 private ranges (10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16)
//! - loopback, link-local, CGNAT, test nets, multicast, reserved
//! - IPv6 loopback, unspecified, ULA, link-local, multicast, documentation
//! - IPv4-mapped IPv6 addresses (checked against the IPv4 rules)
//! - cloud metadata endpoints (169.254.169.254, fd00:ec2::254, hostnames)
//!
//! URL validation alone is not sufficient: DNS may resolve a public-looking
//! hostname to a private address. Callers must also run every resolved IP
//! through [`validate_resolved_ip`] and pin the validated address for the
//! actual connection.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use thiserror::Error;

/// Reasons a URL or resolved address is refused
#[derive(Error, Debug, Clone)]
pub enum SsrfError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("protocol not allowed: {0}")]
    ProtocolNotAllowed(String),

    #[error("blocked address: {0}")]
    Blocked(String),
}

/// Validate the literal URL: scheme allow-list plus host checks.
pub fn validate_url(url: &str) -> Result<(), SsrfError> {
    let parsed = url::Url::parse(url).map_err(|e| SsrfError::InvalidUrl(format!("{url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(SsrfError::ProtocolNotAllowed(scheme.to_string())),
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| SsrfError::InvalidUrl("URL has no host".to_string()))?;

    if is_localhost(host) {
        return Err(SsrfError::Blocked(format!("localhost address: {host}")));
    }
    if is_metadata_endpoint(host) {
        return Err(SsrfError::Blocked(format!(
            "cloud metadata endpoint: {host}"
        )));
    }
    if let Some(ip) = parse_host_ip(host) {
        if is_private_ip(&ip) {
            return Err(SsrfError::Blocked(format!("private IP address: {ip}")));
        }
    }

    Ok(())
}

/// Validate an IP returned by DNS resolution, before connecting.
pub fn validate_resolved_ip(ip: &IpAddr, original_host: &str) -> Result<(), SsrfError> {
    if is_private_ip(ip) {
        return Err(SsrfError::Blocked(format!(
            "DNS {original_host} resolved to private IP: {ip}"
        )));
    }
    Ok(())
}

/// Parse a host as an IP literal, handling bracketed IPv6 (`[fc00::1]`).
fn parse_host_ip(host: &str) -> Option<IpAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Some(ip);
    }
    let inner = host.strip_prefix('[')?.strip_suffix(']')?;
    inner.parse::<Ipv6Addr>().ok().map(IpAddr::V6)
}

fn is_localhost(host: &str) -> bool {
    let lowered = host.to_lowercase();
    if lowered == "localhost"
        || lowered == "localhost.localdomain"
        || lowered.ends_with(".localhost")
    {
        return true;
    }
    match parse_host_ip(host) {
        Some(IpAddr::V4(ip)) => ip.octets()[0] == 127,
        Some(IpAddr::V6(ip)) => ip == Ipv6Addr::LOCALHOST,
        None => false,
    }
}

fn is_metadata_endpoint(host: &str) -> bool {
    // AWS/GCP/Azure IPv4 metadata endpoint, AWS IPv6 variant
    host == "169.254.169.254"
        || host == "fd00:ec2::254"
        || host == "[fd00:ec2::254]"
        || host == "instance-data"
        || host.ends_with(".internal")
        || host == "metadata.google.internal"
        || host == "metadata"
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_ipv4(v4),
        IpAddr::V6(v6) => is_private_ipv6(v6),
    }
}

fn is_private_ipv4(ip: &Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();
    // 10/8, 172.16/12, 192.168/16, 127/8 loopback, 169.254/16 link-local,
    // 0/8, 100.64/10 CGNAT, IETF + TEST-NET blocks, multicast, reserved
    a == 10
        || (a == 172 && (16..=31).contains(&b))
        || (a == 192 && b == 168)
        || a == 127
        || (a == 169 && b == 254)
        || a == 0
        || (a == 100 && (64..=127).contains(&b))
        || (a == 192 && b == 0 && c == 0)
        || (a == 192 && b == 0 && c == 2)
        || (a == 198 && b == 51 && c == 100)
        || (a == 203 && b == 0 && c == 113)
        || a >= 224
}

fn is_private_ipv6(ip: &Ipv6Addr) -> bool {
    if *ip == Ipv6Addr::LOCALHOST || *ip == Ipv6Addr::UNSPECIFIED {
        return true;
    }
    let segments = ip.segments();
    // fc00::/7 ULA, fe80::/10 link-local, ff00::/8 multicast, 2001:db8::/32 docs
    if (segments[0] & 0xfe00) == 0xfc00
        || (segments[0] & 0xffc0) == 0xfe80
        || (segments[0] & 0xff00) == 0xff00
        || (segments[0] == 0x2001 && segments[1] == 0x0db8)
    {
        return true;
    }
    // IPv4-mapped: ::ffff:a.b.c.d
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_private_ipv4(&v4);
    }
    false
}
