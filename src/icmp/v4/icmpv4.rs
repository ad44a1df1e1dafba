use super::{Identifier, SequenceNumber};
use crate::TraceError;
use pnet_packet::icmp::{
    echo_reply::EchoReplyPacket,
    echo_request::{EchoRequestPacket, MutableEchoRequestPacket},
    IcmpCode, IcmpPacket, IcmpType, IcmpTypes, MutableIcmpPacket,
};
use pnet_packet::Packet;

/// Marker payload carried by every probe.
pub const PAYLOAD: &[u8] = b"traceroute";

const ICMP_HEADER_SIZE: usize = 8;

/// An outbound ICMPv4 echo request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EchoRequest<'a> {
    pub identifier: Identifier,
    pub sequence_number: SequenceNumber,
    pub payload: &'a [u8],
}

impl EchoRequest<'static> {
    /// A probe carrying the marker payload.
    #[must_use]
    pub fn new(identifier: Identifier, sequence_number: SequenceNumber) -> Self {
        EchoRequest { identifier, sequence_number, payload: PAYLOAD }
    }
}

impl EchoRequest<'_> {
    /// Size of the ICMP message on the wire, without the IPv4 header.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        EchoRequestPacket::minimum_packet_size() + self.payload.len()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, TraceError> {
        let buf = vec![0u8; self.wire_len()];
        let mut package = MutableEchoRequestPacket::owned(buf)
            .ok_or_else(|| TraceError::MalformedPacket("could not create ICMP package".to_owned()))?;
        package.set_icmp_type(IcmpTypes::EchoRequest);
        package.set_icmp_code(IcmpCode::new(0));
        package.set_identifier(self.identifier.into());
        package.set_sequence_number(self.sequence_number.into());
        package.set_payload(self.payload);

        package.set_checksum(0_u16);
        let checksum = pnet_packet::icmp::checksum(
            &IcmpPacket::new(package.packet())
                .ok_or_else(|| TraceError::MalformedPacket("could not view ICMP package".to_owned()))?,
        );
        package.set_checksum(checksum);
        Ok(package.packet().to_vec())
    }
}

/// An inbound ICMPv4 message, reduced to what classification needs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IcmpMessage {
    EchoReply { identifier: Identifier, sequence_number: SequenceNumber },
    /// Seen on a raw socket when a probe loops back to this host.
    EchoRequest { identifier: Identifier, sequence_number: SequenceNumber },
    TimeExceeded { icmp_code: u8 },
    Other { icmp_type: u8, icmp_code: u8 },
}

impl IcmpMessage {
    /// Parses an ICMP message (IPv4 header already stripped) and verifies its checksum.
    pub fn parse(buf: &[u8]) -> Result<IcmpMessage, TraceError> {
        let packet = IcmpPacket::new(buf).ok_or_else(|| {
            TraceError::MalformedPacket(format!("{} bytes is too short for an ICMP header", buf.len()))
        })?;
        let expected = pnet_packet::icmp::checksum(&packet);
        if packet.get_checksum() != expected {
            return Err(TraceError::MalformedPacket(format!(
                "bad ICMP checksum {:#06x}, expected {expected:#06x}",
                packet.get_checksum()
            )));
        }

        let icmp_code = packet.get_icmp_code().0;
        match packet.get_icmp_type() {
            IcmpTypes::EchoReply => {
                let echo_reply = EchoReplyPacket::new(buf).ok_or_else(|| {
                    TraceError::MalformedPacket(format!("{} bytes is too short for an echo reply", buf.len()))
                })?;
                Ok(IcmpMessage::EchoReply {
                    identifier: echo_reply.get_identifier().into(),
                    sequence_number: echo_reply.get_sequence_number().into(),
                })
            }
            IcmpTypes::EchoRequest => {
                let echo_request = EchoRequestPacket::new(buf).ok_or_else(|| {
                    TraceError::MalformedPacket(format!("{} bytes is too short for an echo request", buf.len()))
                })?;
                Ok(IcmpMessage::EchoRequest {
                    identifier: echo_request.get_identifier().into(),
                    sequence_number: echo_request.get_sequence_number().into(),
                })
            }
            IcmpTypes::TimeExceeded => Ok(IcmpMessage::TimeExceeded { icmp_code }),
            IcmpType(icmp_type) => Ok(IcmpMessage::Other { icmp_type, icmp_code }),
        }
    }

    #[must_use]
    pub fn icmp_type(&self) -> u8 {
        match self {
            IcmpMessage::EchoReply { .. } => IcmpTypes::EchoReply.0,
            IcmpMessage::EchoRequest { .. } => IcmpTypes::EchoRequest.0,
            IcmpMessage::TimeExceeded { .. } => IcmpTypes::TimeExceeded.0,
            IcmpMessage::Other { icmp_type, .. } => *icmp_type,
        }
    }

    #[must_use]
    pub fn icmp_code(&self) -> u8 {
        match self {
            IcmpMessage::EchoReply { .. } | IcmpMessage::EchoRequest { .. } => 0,
            IcmpMessage::TimeExceeded { icmp_code } | IcmpMessage::Other { icmp_code, .. } => *icmp_code,
        }
    }

    /// Encodes this message as the 8 byte ICMP header, checksum included, such that
    /// [`IcmpMessage::parse`] gives back the same value.
    ///
    /// This is the encoder for [`TSocket`](super::TSocket) implementations that synthesize
    /// replies, e.g. scripted transports in tests. Time exceeded messages are written
    /// without the quoted datagram, echo messages without payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TraceError> {
        let rest_of_header: [u8; 4] = match self {
            IcmpMessage::EchoReply { identifier, sequence_number }
            | IcmpMessage::EchoRequest { identifier, sequence_number } => {
                let mut rest = [0u8; 4];
                rest[..2].copy_from_slice(&identifier.0.to_be_bytes());
                rest[2..].copy_from_slice(&sequence_number.0.to_be_bytes());
                rest
            }
            IcmpMessage::TimeExceeded { .. } | IcmpMessage::Other { .. } => [0u8; 4],
        };

        let mut package = MutableIcmpPacket::owned(vec![0u8; ICMP_HEADER_SIZE])
            .ok_or_else(|| TraceError::MalformedPacket("could not create ICMP package".to_owned()))?;
        package.set_icmp_type(IcmpType::new(self.icmp_type()));
        package.set_icmp_code(IcmpCode::new(self.icmp_code()));
        package.set_payload(&rest_of_header);
        package.set_checksum(0_u16);
        let checksum = pnet_packet::icmp::checksum(&package.to_immutable());
        package.set_checksum(checksum);
        Ok(package.packet().to_vec())
    }
}
