#![warn(rust_2018_idioms)]
#![warn(clippy::pedantic)]

//! Sequential ICMP traceroute.
//!
//! Each TTL from 1 to `max_hops` is probed with one ICMP echo request on a socket of its own.
//! The first answer is classified as the target's echo reply, a router's time exceeded
//! notification, an unexpected message, a timeout or a transport error.
//!
//! Raw ICMP sockets need `CAP_NET_RAW` (or root).

pub use hop::*;
pub use resolver::{lookup_addr, resolve_target, NameLookup, SystemLookup};
pub use trace_error::{GenericError, TraceError, TraceResult};
pub use trace_fox::*;
pub use tracer::Tracer;

pub mod icmp;

mod hop;
mod hop_prober;
mod records;
mod resolver;
mod trace_error;
mod trace_fox;
mod tracer;
