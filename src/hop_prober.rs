use crate::hop::{HopOutcome, HopRecord};
use crate::icmp::v4::{EchoRequest, IcmpMessage, Identifier, SequenceNumber, TSocket, TSocketFactory, Ttl};
use crate::records::{ProbeReceiveRecord, ProbeReceiveRecordData, ProbeSendRecord};
use crate::{TraceError, TraceResult};
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::{Duration, Instant};

const RECV_BUFFER_SIZE: usize = 1500;

/// Runs one send/receive/classify cycle per call, each on its own socket.
pub(crate) struct HopProber<F> {
    socket_factory: F,
    identifier: Identifier,
    timeout: Duration,
}

impl<F> HopProber<F>
where
    F: TSocketFactory,
{
    pub(crate) fn new(socket_factory: F, identifier: Identifier, timeout: Duration) -> Self {
        HopProber { socket_factory, identifier, timeout }
    }

    /// Probes `target` with `ttl`. Never fails: transport problems become `TransportError`.
    pub(crate) fn probe(&self, target: Ipv4Addr, ttl: Ttl) -> HopRecord {
        let outcome = self.probe_aux(target, ttl).unwrap_or_else(|e| {
            tracing::warn!(%ttl, error = %e, "hop attempt failed");
            HopOutcome::TransportError { responder: None, message: e.to_string() }
        });
        tracing::debug!(%ttl, ?outcome, "hop attempt done");
        HopRecord { ttl, outcome }
    }

    fn probe_aux(&self, target: Ipv4Addr, ttl: Ttl) -> TraceResult<HopOutcome> {
        // (1) Open a socket for this hop only. It is closed when `socket` goes out of scope.
        let socket = self.socket_factory.open().map_err(TraceError::ChannelOpen)?;

        // (2) Limit the probe's lifetime.
        socket.set_ttl(ttl).map_err(TraceError::SetTtl)?;

        // (3) Send the echo request.
        let send_record = self.send_to(&socket, target, ttl)?;

        // (4) Wait for an answer until `timeout` after the send. A copy of our own probe
        // looped back to this host is not an answer, so keep waiting for the same deadline.
        let deadline = send_record.send_time + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(HopOutcome::Timeout);
            }
            socket.set_read_timeout(remaining).map_err(TraceError::SetReadTimeout)?;
            let data = match Self::try_receive(&socket)? {
                ProbeReceiveRecord::Timeout => return Ok(HopOutcome::Timeout),
                ProbeReceiveRecord::Data(data) => data,
            };
            let message = IcmpMessage::parse(&data.package);
            if self.is_own_probe(&message) {
                tracing::trace!(%ttl, "skipped own echo request");
                continue;
            }
            return Ok(self.classify(&send_record, &data, message));
        }
    }

    fn is_own_probe(&self, message: &TraceResult<IcmpMessage>) -> bool {
        matches!(message, Ok(IcmpMessage::EchoRequest { identifier, .. }) if *identifier == self.identifier)
    }

    fn send_to(&self, socket: &F::Socket, ipv4: Ipv4Addr, ttl: Ttl) -> TraceResult<ProbeSendRecord> {
        let sequence_number = SequenceNumber::from(ttl);
        let package = EchoRequest::new(self.identifier, sequence_number).to_bytes()?;
        let addr: socket2::SockAddr = SocketAddrV4::new(ipv4, 0).into();

        let send_time = Instant::now();
        socket.send_to(&package, &addr).map_err(TraceError::Send)?;
        tracing::trace!(%ipv4, %ttl, "icmpv4 sent");

        Ok(ProbeSendRecord { package_size: package.len(), ip_addr: ipv4, sequence_number, send_time })
    }

    fn try_receive(socket: &F::Socket) -> TraceResult<ProbeReceiveRecord> {
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        match socket.recv_from(&mut buf) {
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(ProbeReceiveRecord::Timeout)
            }
            Err(e) => Err(TraceError::Receive(e)),
            Ok((n, ip_addr, ttl)) => {
                let receive_time = Instant::now();
                tracing::trace!(%ip_addr, n, "icmpv4 received");
                Ok(ProbeReceiveRecord::Data(ProbeReceiveRecordData {
                    package: buf[..n].to_vec(),
                    ip_addr,
                    ttl,
                    receive_time,
                }))
            }
        }
    }

    fn classify(
        &self,
        sent: &ProbeSendRecord,
        received: &ProbeReceiveRecordData,
        message: TraceResult<IcmpMessage>,
    ) -> HopOutcome {
        let responder = received.ip_addr;
        let round_trip = received.receive_time.saturating_duration_since(sent.send_time);
        tracing::trace!(
            probe_to = %sent.ip_addr,
            sequence_number = sent.sequence_number.0,
            package_size = sent.package_size,
            reply_ttl = %received.ttl,
            "classifying reply"
        );
        match message {
            Err(e) => {
                tracing::warn!(%responder, error = %e, "could not parse reply");
                HopOutcome::TransportError { responder: Some(responder), message: e.to_string() }
            }
            Ok(IcmpMessage::EchoReply { identifier, .. }) if identifier == self.identifier => {
                HopOutcome::EchoReplyFromTarget { responder, round_trip }
            }
            Ok(IcmpMessage::TimeExceeded { .. }) => HopOutcome::TimeExceededFromIntermediate { responder, round_trip },
            Ok(message) => HopOutcome::UnexpectedMessage {
                responder,
                icmp_type: message.icmp_type(),
                icmp_code: message.icmp_code(),
                round_trip,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hop::HopKind;
    use crate::icmp::v4::socket::tests::{HopScript, OnReceive, SocketFactoryMock};
    use crate::icmp::v4::PAYLOAD;

    use more_asserts as ma;

    const IDENTIFIER: u16 = 0xABCD;

    fn target() -> Ipv4Addr {
        Ipv4Addr::new(8, 8, 8, 8)
    }

    fn router() -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, 1)
    }

    fn hop_prober(socket_factory: &SocketFactoryMock) -> HopProber<SocketFactoryMock> {
        HopProber::new(socket_factory.clone(), Identifier(IDENTIFIER), Duration::from_millis(20))
    }

    #[test]
    fn time_exceeded_yields_intermediate_hop() {
        let socket_factory = SocketFactoryMock::new(vec![HopScript::time_exceeded(router())]);

        let record = hop_prober(&socket_factory).probe(target(), Ttl(1));

        assert_eq!(Ttl(1), record.ttl);
        assert_eq!(HopKind::TimeExceededFromIntermediate, record.kind());
        assert_eq!(Some(router()), record.responder());
    }

    #[test]
    fn matching_echo_reply_yields_target() {
        let socket_factory = SocketFactoryMock::new(vec![HopScript::echo_reply(target(), IDENTIFIER, 3)]);

        let record = hop_prober(&socket_factory).probe(target(), Ttl(3));

        assert_eq!(HopKind::EchoReplyFromTarget, record.kind());
        assert_eq!(Some(target()), record.responder());
    }

    #[test]
    fn foreign_echo_reply_yields_unexpected_message() {
        let socket_factory = SocketFactoryMock::new(vec![HopScript::echo_reply(target(), 0x1111, 3)]);

        let record = hop_prober(&socket_factory).probe(target(), Ttl(3));

        assert!(matches!(
            record.outcome,
            HopOutcome::UnexpectedMessage { icmp_type: 0, icmp_code: 0, .. }
        ));
        assert_eq!(Some(target()), record.responder());
    }

    #[test]
    fn other_message_yields_unexpected_message() {
        let socket_factory = SocketFactoryMock::new(vec![HopScript::receive(OnReceive::Reply(
            router(),
            IcmpMessage::Other { icmp_type: 3, icmp_code: 13 },
        ))]);

        let record = hop_prober(&socket_factory).probe(target(), Ttl(2));

        assert!(matches!(
            record.outcome,
            HopOutcome::UnexpectedMessage { icmp_type: 3, icmp_code: 13, .. }
        ));
        assert_eq!(Some(router()), record.responder());
    }

    #[test]
    fn own_looped_back_echo_request_is_skipped() {
        let socket_factory = SocketFactoryMock::new(vec![HopScript::receive_in_order(vec![
            OnReceive::Reply(
                target(),
                IcmpMessage::EchoRequest { identifier: Identifier(IDENTIFIER), sequence_number: SequenceNumber(1) },
            ),
            OnReceive::Reply(
                target(),
                IcmpMessage::EchoReply { identifier: Identifier(IDENTIFIER), sequence_number: SequenceNumber(1) },
            ),
        ])]);

        let record = hop_prober(&socket_factory).probe(target(), Ttl(1));

        assert_eq!(HopKind::EchoReplyFromTarget, record.kind());
        assert_eq!(Some(target()), record.responder());
        let read_timeouts = socket_factory.read_timeouts();
        assert_eq!(2, read_timeouts.len());
        ma::assert_le!(read_timeouts[1], read_timeouts[0]);
        ma::assert_le!(read_timeouts[0], Duration::from_millis(20));
    }

    #[test]
    fn skipping_own_echo_request_keeps_the_deadline() {
        let socket_factory = SocketFactoryMock::new(vec![HopScript::receive(OnReceive::DelayedReply(
            Duration::from_millis(5),
            target(),
            IcmpMessage::EchoRequest { identifier: Identifier(IDENTIFIER), sequence_number: SequenceNumber(1) },
        ))]);
        let hop_prober = hop_prober(&socket_factory);

        let start = Instant::now();
        let record = hop_prober.probe(target(), Ttl(1));
        let elapsed = start.elapsed();

        assert_eq!(HopOutcome::Timeout, record.outcome);
        ma::assert_ge!(elapsed, Duration::from_millis(20));
        let read_timeouts = socket_factory.read_timeouts();
        assert_eq!(2, read_timeouts.len());
        ma::assert_le!(read_timeouts[1], Duration::from_millis(15));
    }

    #[test]
    fn foreign_echo_request_yields_unexpected_message() {
        let socket_factory = SocketFactoryMock::new(vec![HopScript::receive(OnReceive::Reply(
            router(),
            IcmpMessage::EchoRequest { identifier: Identifier(0x1111), sequence_number: SequenceNumber(1) },
        ))]);

        let record = hop_prober(&socket_factory).probe(target(), Ttl(1));

        assert!(matches!(
            record.outcome,
            HopOutcome::UnexpectedMessage { icmp_type: 8, icmp_code: 0, .. }
        ));
    }

    #[test]
    fn set_read_timeout_failure_yields_transport_error() {
        let socket_factory = SocketFactoryMock::new(vec![HopScript::fail_set_read_timeout()]);

        let record = hop_prober(&socket_factory).probe(target(), Ttl(1));

        assert_eq!(HopKind::TransportError, record.kind());
        assert!(record.detail().unwrap().contains("could not set receive timeout"));
        socket_factory.should_send_number_of_messages(1).should_have_closed_every_socket();
    }

    #[test]
    fn silence_yields_timeout_after_full_deadline() {
        let socket_factory = SocketFactoryMock::new(vec![HopScript::timeout()]);
        let hop_prober = hop_prober(&socket_factory);

        let start = Instant::now();
        let record = hop_prober.probe(target(), Ttl(2));
        let elapsed = start.elapsed();

        assert_eq!(HopOutcome::Timeout, record.outcome);
        ma::assert_ge!(elapsed, Duration::from_millis(20));
    }

    #[test]
    fn malformed_reply_yields_transport_error_with_sender() {
        let socket_factory =
            SocketFactoryMock::new(vec![HopScript::receive(OnReceive::Bytes(router(), vec![11, 0, 0xFF, 0xFF]))]);

        let record = hop_prober(&socket_factory).probe(target(), Ttl(1));

        assert_eq!(HopKind::TransportError, record.kind());
        assert_eq!(Some(router()), record.responder());
    }

    #[test]
    fn open_failure_yields_transport_error() {
        let socket_factory = SocketFactoryMock::new(vec![HopScript::fail_open()]);

        let record = hop_prober(&socket_factory).probe(target(), Ttl(1));

        assert_eq!(HopKind::TransportError, record.kind());
        assert_eq!(None, record.responder());
        socket_factory.should_open_number_of_sockets(0).should_send_number_of_messages(0);
    }

    #[test]
    fn send_failure_yields_transport_error() {
        let socket_factory = SocketFactoryMock::new(vec![HopScript::fail_send()]);

        let record = hop_prober(&socket_factory).probe(target(), Ttl(1));

        assert_eq!(HopKind::TransportError, record.kind());
        socket_factory.should_open_number_of_sockets(1).should_have_closed_every_socket();
    }

    #[test]
    fn receive_failure_yields_transport_error() {
        let socket_factory = SocketFactoryMock::new(vec![HopScript::receive(OnReceive::ReturnErr)]);

        let record = hop_prober(&socket_factory).probe(target(), Ttl(1));

        assert_eq!(HopKind::TransportError, record.kind());
        assert!(record.detail().unwrap().contains("could not receive"));
    }

    #[test]
    fn probe_carries_ttl_identifier_and_marker() {
        let socket_factory = SocketFactoryMock::new(vec![HopScript::time_exceeded(router())]);

        hop_prober(&socket_factory).probe(target(), Ttl(7));

        socket_factory.should_send_number_of_messages(1).should_send_to_address(&target());
        let sent = socket_factory.sent();
        assert_eq!(Some(Ttl(7)), sent[0].ttl);
        assert_eq!(7, sent[0].sequence_number());
        assert_eq!(IDENTIFIER, sent[0].identifier());
        assert!(sent[0].buf.ends_with(PAYLOAD));
    }

    #[test]
    fn round_trip_spans_send_to_receive() {
        let delay = Duration::from_millis(15);
        let socket_factory = SocketFactoryMock::new(vec![HopScript::receive(OnReceive::DelayedReply(
            delay,
            router(),
            IcmpMessage::TimeExceeded { icmp_code: 0 },
        ))]);
        let hop_prober = hop_prober(&socket_factory);

        let start = Instant::now();
        let record = hop_prober.probe(target(), Ttl(1));
        let elapsed = start.elapsed();

        let round_trip = record.round_trip().unwrap();
        ma::assert_ge!(round_trip, delay);
        ma::assert_le!(round_trip, elapsed);
    }

    #[test]
    fn socket_is_closed_on_every_path() {
        let socket_factory = SocketFactoryMock::new(vec![
            HopScript::time_exceeded(router()),
            HopScript::timeout(),
            HopScript::fail_send(),
            HopScript::receive(OnReceive::ReturnErr),
            HopScript::receive(OnReceive::Bytes(router(), vec![0])),
        ]);
        let hop_prober = hop_prober(&socket_factory);

        for ttl in 1..=5 {
            hop_prober.probe(target(), Ttl(ttl));
            socket_factory.should_have_closed_every_socket();
        }
        socket_factory.should_open_number_of_sockets(5).should_never_hold_more_than_one_socket();
    }
}
