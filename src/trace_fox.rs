use crate::icmp::v4::{Identifier, RawSocketFactory, TSocketFactory};
use crate::resolver::SystemLookup;
use crate::{HopRecord, TraceError, TraceReport, TraceResult, Tracer};
use std::time::Duration;

#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug)]
pub struct TraceFoxConfig {
    /// Highest TTL probed. At least 1.
    pub max_hops: u8,
    /// Per-hop receive deadline.
    pub timeout: Duration,
    /// Echo identifier of every probe of the trace.
    pub identifier: Identifier,
    /// Stop as soon as the target itself answers instead of probing up to `max_hops`.
    pub stop_at_target: bool,
}

impl Default for TraceFoxConfig {
    fn default() -> Self {
        TraceFoxConfig {
            max_hops: 32,
            timeout: Duration::from_secs(2),
            identifier: Identifier::from_process(),
            stop_at_target: true,
        }
    }
}

impl TraceFoxConfig {
    pub fn validate(&self) -> TraceResult<()> {
        if self.max_hops == 0 {
            return Err(TraceError::InvalidConfig("max_hops must be at least 1".to_owned()));
        }
        if self.timeout.is_zero() {
            return Err(TraceError::InvalidConfig("timeout must not be zero".to_owned()));
        }
        Ok(())
    }
}

/// A tracer on raw ICMP sockets.
pub fn create(config: &TraceFoxConfig) -> TraceResult<Tracer> {
    create_with_socket_factory(config, RawSocketFactory)
}

/// A tracer on any packet transport.
pub fn create_with_socket_factory<F>(config: &TraceFoxConfig, socket_factory: F) -> TraceResult<Tracer<F>>
where
    F: TSocketFactory,
{
    config.validate()?;
    Ok(Tracer::new(config, socket_factory))
}

/// Resolves `target` with the system resolver and traces it on raw ICMP sockets.
pub fn trace<C>(config: &TraceFoxConfig, target: &str, on_hop: C) -> TraceResult<TraceReport>
where
    C: FnMut(&HopRecord),
{
    create(config)?.resolve_and_trace(target, &SystemLookup, on_hop)
}
