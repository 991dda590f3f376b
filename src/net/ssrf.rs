//! Pre-dial SSRF gate: rejects destinations in private, loopback, or
//! link-local ranges before a socket is ever opened.

use crate::error::{Error, Result};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, ToSocketAddrs};

/// Whether the SSRF gate is applied before dialing. On by default; a host
/// embedding this crate for a trusted, fully-internal network may disable
/// it explicitly.
#[derive(Debug, Clone, Copy)]
pub struct SsrfFilter {
    enabled: bool,
}

impl Default for SsrfFilter {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl SsrfFilter {
    /// Builds a filter with the gate off. Only for hosts that have already
    /// made an informed decision to allow private-network destinations.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Resolves `hostname` and checks every resulting address, plus the
    /// literal hostname itself, against the private/loopback/link-local
    /// denylist.
    ///
    /// # Errors
    /// Returns a policy error whose message contains `"private"` if the
    /// destination is denied, or a validation error if `hostname:port` does
    /// not resolve at all.
    pub fn check(&self, hostname: &str, port: u16) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        check_destination(hostname, port)
    }
}

/// Standalone version of [`SsrfFilter::check`] for callers that already know
/// they want the gate applied.
///
/// # Errors
/// See [`SsrfFilter::check`].
pub fn check_destination(hostname: &str, port: u16) -> Result<()> {
    let host_lower = hostname.to_ascii_lowercase();
    if host_lower == "localhost" || host_lower.ends_with(".localhost") {
        return Err(Error::policy(format!(
            "destination '{hostname}' resolves to a private address (localhost)"
        )));
    }

    if let Ok(ip) = hostname.parse::<IpAddr>() {
        return reject_if_private(ip, hostname);
    }

    let addrs = (hostname, port)
        .to_socket_addrs()
        .map_err(|e| Error::validation(format!("could not resolve '{hostname}': {e}")))?;
    let mut saw_any = false;
    for addr in addrs {
        saw_any = true;
        reject_if_private(addr.ip(), hostname)?;
    }
    if !saw_any {
        return Err(Error::validation(format!(
            "'{hostname}' resolved to no addresses"
        )));
    }
    Ok(())
}

fn reject_if_private(ip: IpAddr, hostname: &str) -> Result<()> {
    if is_private_address(ip) {
        return Err(Error::policy(format!(
            "destination '{hostname}' ({ip}) resolves to a private address"
        )));
    }
    Ok(())
}

/// True for loopback, RFC 1918, link-local (including the cloud metadata
/// address `169.254.169.254`), and IPv6 loopback ranges.
#[must_use]
pub fn is_private_address(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => is_private_v6(v6),
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    ip.is_loopback()
        || octets[0] == 0 // 0.0.0.0/8
        || octets[0] == 10 // 10.0.0.0/8
        || (octets[0] == 172 && (16..=31).contains(&octets[1])) // 172.16.0.0/12
        || (octets[0] == 192 && octets[1] == 168) // 192.168.0.0/16
        || (octets[0] == 169 && octets[1] == 254) // 169.254.0.0/16
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    ip.is_loopback() || ip.to_ipv4_mapped().is_some_and(is_private_v4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ipv4_loopback() {
        let err = check_destination("127.0.0.1", 8080).unwrap_err();
        assert!(err.script_message().contains("private"));
    }

    #[test]
    fn rejects_rfc1918() {
        assert!(check_destination("10.0.0.1", 80).unwrap_err().script_message().contains("private"));
        assert!(check_destination("172.16.0.5", 80).unwrap_err().script_message().contains("private"));
        assert!(check_destination("192.168.1.1", 80).unwrap_err().script_message().contains("private"));
    }

    #[test]
    fn rejects_link_local_metadata_address() {
        let err = check_destination("169.254.169.254", 80).unwrap_err();
        assert!(err.script_message().contains("private"));
    }

    #[test]
    fn rejects_localhost_hostname_and_subdomains() {
        assert!(check_destination("localhost", 80).is_err());
        assert!(check_destination("api.localhost", 80).is_err());
    }

    #[test]
    fn rejects_ipv6_loopback() {
        let err = check_destination("::1", 80).unwrap_err();
        assert!(err.script_message().contains("private"));
    }

    #[test]
    fn allows_public_address() {
        assert!(check_destination("93.184.215.14", 80).is_ok());
    }

    #[test]
    fn disabled_filter_allows_everything() {
        let filter = SsrfFilter::disabled();
        assert!(filter.check("127.0.0.1", 80).is_ok());
    }
}
