use crate::types::AddressFamily;

//------------ PrefixId ------------------------------------------------------

// The internal prefix type, cut to size for an AF, unlike the inetnum
// Prefix. We use the latter on the public API only; everything below the
// `RoutingTable` surface deals in `PrefixId`s.

#[derive(Hash, Eq, PartialEq, Debug, Copy, Clone)]
pub(crate) struct PrefixId<A: AddressFamily> {
    len: u8,
    bits: A,
}

impl<A: AddressFamily> PrefixId<A> {
    pub(crate) fn new(bits: A, len: u8) -> Self {
        PrefixId { len, bits }
    }

    pub(crate) fn bits(&self) -> A {
        self.bits
    }

    pub(crate) fn len(&self) -> u8 {
        self.len
    }

    // A prefix is canonical if no bits are set beyond its length. The trie
    // relies on this: the octets of a prefix double as the descent path.
    pub(crate) fn is_canonical(&self) -> bool {
        self.bits.truncate_to_len(self.len) == self.bits
    }

    pub(crate) fn truncate_to_len(self, len: u8) -> Self {
        Self {
            bits: self.bits.truncate_to_len(len),
            len,
        }
    }

    /// Does this prefix cover `other`?
    pub(crate) fn contains(&self, other: &Self) -> bool {
        self.len <= other.len
            && other.bits.truncate_to_len(self.len) == self.bits
    }

    /// Does this prefix cover the address `addr`?
    pub(crate) fn covers(&self, addr: A) -> bool {
        addr.truncate_to_len(self.len) == self.bits
    }
}

// There is no reasonable way for this to panic: every PrefixId in the trie
// is canonical, and inetnum's Prefix represents the same data in a slightly
// different way.
#[allow(clippy::unwrap_used)]
impl<A: AddressFamily> From<PrefixId<A>> for inetnum::addr::Prefix {
    fn from(value: PrefixId<A>) -> Self {
        Self::new(value.bits().into_ipaddr(), value.len()).unwrap()
    }
}
