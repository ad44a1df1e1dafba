use crate::TraceError;
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::result::Result;

/// Name resolution as seen by the tracer.
pub trait NameLookup {
    fn lookup_host(&self, hostname: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolves through the platform resolver (`getaddrinfo`).
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemLookup;

impl NameLookup for SystemLookup {
    fn lookup_host(&self, hostname: &str) -> io::Result<Vec<IpAddr>> {
        dns_lookup::lookup_host(hostname)
    }
}

/// Turns `target` into the address to trace.
///
/// A literal IPv4 address is returned as is. Anything else is looked up exactly once and the
/// first IPv4 address of the answer, in the resolver's order, is used.
pub fn resolve_target<L>(target: &str, lookup: &L) -> Result<Ipv4Addr, TraceError>
where
    L: NameLookup + ?Sized,
{
    let target = target.trim();
    if target.is_empty() {
        return Err(TraceError::ResolutionFailed { target: target.to_owned(), reason: "empty target".to_owned() });
    }
    if let Ok(ipv4) = target.parse::<Ipv4Addr>() {
        return Ok(ipv4);
    }

    tracing::trace!(host = target, "looking up host");
    let ips = lookup
        .lookup_host(target)
        .map_err(|e| TraceError::ResolutionFailed { target: target.to_owned(), reason: e.to_string() })?;
    ips.into_iter()
        .find_map(|ip| match ip {
            IpAddr::V4(ipv4) => Some(ipv4),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| TraceError::ResolutionFailed {
            target: target.to_owned(),
            reason: "no IPv4 address".to_owned(),
        })
}

/// Reverse lookup of a hop address, for display only. A failure here never affects a trace.
pub fn lookup_addr(ip: Ipv4Addr) -> io::Result<String> {
    dns_lookup::lookup_addr(&IpAddr::V4(ip))
}
