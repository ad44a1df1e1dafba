use crate::icmp::v4::{SequenceNumber, Ttl};
use std::net::Ipv4Addr;
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ProbeSendRecord {
    pub package_size: usize,
    pub ip_addr: Ipv4Addr,
    pub sequence_number: SequenceNumber,
    /// Taken immediately before the probe was handed to the socket.
    pub send_time: Instant,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ProbeReceiveRecord {
    Timeout,
    Data(ProbeReceiveRecordData),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ProbeReceiveRecordData {
    pub package: Vec<u8>,
    pub ip_addr: Ipv4Addr,
    pub ttl: Ttl,
    /// Taken immediately after the socket returned data.
    pub receive_time: Instant,
}
