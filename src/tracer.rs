use crate::hop::{HopKind, HopRecord, TraceReport};
use crate::hop_prober::HopProber;
use crate::icmp::v4::{RawSocketFactory, TSocketFactory, Ttl};
use crate::resolver::{resolve_target, NameLookup};
use crate::{TraceFoxConfig, TraceResult};
use std::net::Ipv4Addr;

/// Probes TTL 1, 2, ... up to `max_hops`, one hop at a time.
pub struct Tracer<F = RawSocketFactory> {
    hop_prober: HopProber<F>,
    max_hops: u8,
    stop_at_target: bool,
}

impl<F> Tracer<F>
where
    F: TSocketFactory,
{
    pub(crate) fn new(config: &TraceFoxConfig, socket_factory: F) -> Self {
        Tracer {
            hop_prober: HopProber::new(socket_factory, config.identifier, config.timeout),
            max_hops: config.max_hops,
            stop_at_target: config.stop_at_target,
        }
    }

    pub fn trace(&self, target: Ipv4Addr) -> TraceReport {
        self.trace_with(target, |_| {})
    }

    /// Like [`Tracer::trace`], calling `on_hop` as soon as each hop is known.
    pub fn trace_with<C>(&self, target: Ipv4Addr, mut on_hop: C) -> TraceReport
    where
        C: FnMut(&HopRecord),
    {
        tracing::info!(%target, max_hops = self.max_hops, "trace started");
        let mut hops = Vec::with_capacity(usize::from(self.max_hops));
        for ttl in 1..=self.max_hops {
            let record = self.hop_prober.probe(target, Ttl(ttl));
            on_hop(&record);
            let reached_target = record.kind() == HopKind::EchoReplyFromTarget;
            hops.push(record);
            if reached_target && self.stop_at_target {
                break;
            }
        }
        let report = TraceReport { target, hops };
        tracing::info!(%target, hops = report.hops.len(), reached_target = report.reached_target(), "trace finished");
        report
    }

    /// Resolves `target` once, then traces it. Nothing is probed when resolution fails.
    pub fn resolve_and_trace<L, C>(&self, target: &str, lookup: &L, on_hop: C) -> TraceResult<TraceReport>
    where
        L: NameLookup + ?Sized,
        C: FnMut(&HopRecord),
    {
        let target = resolve_target(target, lookup)?;
        Ok(self.trace_with(target, on_hop))
    }
}
