mod icmpv4;
pub use icmpv4::{EchoRequest, IcmpMessage, PAYLOAD};

mod identifier;
pub use identifier::Identifier;

mod sequence_number;
pub use sequence_number::SequenceNumber;

mod ttl;
pub use ttl::Ttl;

pub(crate) mod socket;
pub use socket::raw_socket::{RawSocket, RawSocketFactory};
pub use socket::{TSocket, TSocketFactory};
