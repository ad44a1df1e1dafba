use std::{error::Error, io};

pub type GenericError = Box<dyn Error + Send + Sync + 'static>;

pub type TraceResult<T> = std::result::Result<T, TraceError>;

#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    /// The target could not be turned into an IPv4 address. No hop is probed.
    #[error("could not resolve {target}: {reason}")]
    ResolutionFailed { target: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("could not open ICMP channel: {0}")]
    ChannelOpen(#[source] io::Error),

    #[error("could not set TTL: {0}")]
    SetTtl(#[source] io::Error),

    #[error("could not set receive timeout: {0}")]
    SetReadTimeout(#[source] io::Error),

    #[error("could not send ICMP echo request: {0}")]
    Send(#[source] io::Error),

    #[error("could not receive ICMP message: {0}")]
    Receive(#[source] io::Error),

    #[error("malformed ICMP message: {0}")]
    MalformedPacket(String),
}
