use crate::icmp::v4::Ttl;
use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Classified result of one hop attempt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HopOutcome {
    /// The target answered our echo request: the path is complete.
    EchoReplyFromTarget { responder: Ipv4Addr, round_trip: Duration },
    /// A router discarded the probe because its TTL ran out.
    TimeExceededFromIntermediate { responder: Ipv4Addr, round_trip: Duration },
    /// A valid ICMP message that is not an answer to our probe.
    UnexpectedMessage { responder: Ipv4Addr, icmp_type: u8, icmp_code: u8, round_trip: Duration },
    Timeout,
    TransportError { responder: Option<Ipv4Addr>, message: String },
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HopKind {
    EchoReplyFromTarget,
    TimeExceededFromIntermediate,
    UnexpectedMessage,
    Timeout,
    TransportError,
}

impl HopOutcome {
    #[must_use]
    pub fn kind(&self) -> HopKind {
        match self {
            HopOutcome::EchoReplyFromTarget { .. } => HopKind::EchoReplyFromTarget,
            HopOutcome::TimeExceededFromIntermediate { .. } => HopKind::TimeExceededFromIntermediate,
            HopOutcome::UnexpectedMessage { .. } => HopKind::UnexpectedMessage,
            HopOutcome::Timeout => HopKind::Timeout,
            HopOutcome::TransportError { .. } => HopKind::TransportError,
        }
    }

    #[must_use]
    pub fn responder(&self) -> Option<Ipv4Addr> {
        match self {
            HopOutcome::EchoReplyFromTarget { responder, .. }
            | HopOutcome::TimeExceededFromIntermediate { responder, .. }
            | HopOutcome::UnexpectedMessage { responder, .. } => Some(*responder),
            HopOutcome::Timeout => None,
            HopOutcome::TransportError { responder, .. } => *responder,
        }
    }

    #[must_use]
    pub fn round_trip(&self) -> Option<Duration> {
        match self {
            HopOutcome::EchoReplyFromTarget { round_trip, .. }
            | HopOutcome::TimeExceededFromIntermediate { round_trip, .. }
            | HopOutcome::UnexpectedMessage { round_trip, .. } => Some(*round_trip),
            HopOutcome::Timeout | HopOutcome::TransportError { .. } => None,
        }
    }

    /// Diagnostic text for outcomes that are not a regular hop.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            HopOutcome::EchoReplyFromTarget { .. } | HopOutcome::TimeExceededFromIntermediate { .. } => None,
            HopOutcome::UnexpectedMessage { icmp_type, icmp_code, .. } => {
                Some(format!("unexpected ICMP type {icmp_type} code {icmp_code}"))
            }
            HopOutcome::Timeout => Some("no reply".to_owned()),
            HopOutcome::TransportError { message, .. } => Some(message.clone()),
        }
    }
}

/// The outcome of probing one TTL.
#[derive(Clone, Debug, Eq, PartialEq)]
#[allow(clippy::module_name_repetitions)]
pub struct HopRecord {
    pub ttl: Ttl,
    pub outcome: HopOutcome,
}

impl HopRecord {
    #[must_use]
    pub fn kind(&self) -> HopKind {
        self.outcome.kind()
    }

    #[must_use]
    pub fn responder(&self) -> Option<Ipv4Addr> {
        self.outcome.responder()
    }

    #[must_use]
    pub fn round_trip(&self) -> Option<Duration> {
        self.outcome.round_trip()
    }

    #[must_use]
    pub fn detail(&self) -> Option<String> {
        self.outcome.detail()
    }
}

impl fmt::Display for HopRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>2}  ", self.ttl.0)?;
        match self.responder() {
            Some(responder) => write!(f, "{responder}")?,
            None => write!(f, "*")?,
        }
        if let Some(round_trip) = self.round_trip() {
            write!(f, "  {:.3} ms", round_trip.as_secs_f64() * 1000.0)?;
        }
        match &self.outcome {
            HopOutcome::UnexpectedMessage { .. } | HopOutcome::TransportError { .. } => {
                if let Some(detail) = self.detail() {
                    write!(f, "  ({detail})")?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Hops of one trace, in ascending TTL order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TraceReport {
    pub target: Ipv4Addr,
    pub hops: Vec<HopRecord>,
}

impl TraceReport {
    /// Whether the last recorded hop is the target's echo reply.
    #[must_use]
    pub fn reached_target(&self) -> bool {
        self.hops.last().map(HopRecord::kind) == Some(HopKind::EchoReplyFromTarget)
    }
}
