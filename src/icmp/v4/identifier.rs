type IdentifierInnerType = u16;

/// ICMP echo identifier shared by all probes of one trace.
///
/// Replies are matched against it, so echo replies that belong to other ICMP traffic on the
/// host are not mistaken for our own.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct Identifier(pub IdentifierInnerType);

impl Identifier {
    /// The conventional identifier: the low 16 bits of the process id.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_process() -> Identifier {
        Identifier((std::process::id() & 0xFFFF) as IdentifierInnerType)
    }
}

impl From<IdentifierInnerType> for Identifier {
    fn from(value: IdentifierInnerType) -> Self {
        Identifier(value)
    }
}

impl From<Identifier> for IdentifierInnerType {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}
