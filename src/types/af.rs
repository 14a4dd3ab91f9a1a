use std::net::IpAddr;

use zerocopy::{NetworkEndian, U128, U32};

//------------ AddressFamily (trait) ----------------------------------------

/// The address family of an IP address as a trait.
///
/// Each family gets its own exactly-fitting type, so that a v4 trie never
/// pays for v6-sized addresses. The trie engine only ever looks at an
/// address one octet at a time; the network-endian byte-order types give us
/// that octet view for free through `as_bytes`.
pub trait AddressFamily:
    std::fmt::Debug
    + std::hash::Hash
    + Eq
    + Copy
    + zerocopy::IntoBytes
    + zerocopy::Immutable
{
    /// The number of bits in the byte representation of the family.
    const BITS: u8;

    /// The number of octets consumed by a full traversal, i.e. `BITS / 8`.
    const STRIDES: usize;

    type Addr;

    fn zero() -> Self;

    fn from_addr(addr: Self::Addr) -> Self;

    /// Build an address from the first `STRIDES` bytes of an octet buffer.
    fn from_octets(octets: &[u8; 16]) -> Self;

    /// Clean out all bits that are set beyond `len`.
    fn truncate_to_len(self, len: u8) -> Self;

    fn into_ipaddr(self) -> IpAddr;
}

//-------------- Ipv4 Type --------------------------------------------------

/// Exactly fitting IPv4 bytes (4 octets).
pub type IPv4 = U32<NetworkEndian>;

impl AddressFamily for IPv4 {
    const BITS: u8 = 32;
    const STRIDES: usize = 4;

    type Addr = std::net::Ipv4Addr;

    fn zero() -> Self {
        U32::new(0)
    }

    fn from_addr(addr: Self::Addr) -> Self {
        IPv4::from(addr.octets())
    }

    fn from_octets(octets: &[u8; 16]) -> Self {
        let mut bytes = [0_u8; 4];
        bytes.copy_from_slice(&octets[..4]);
        IPv4::from(bytes)
    }

    fn truncate_to_len(self, len: u8) -> Self {
        match len {
            0 => U32::new(0),
            1..=31 => {
                (self >> U32::from(32 - len as u32))
                    << U32::from(32 - len as u32)
            }
            32 => self,
            len => panic!("Can't truncate to more than 32 bits: {}", len),
        }
    }

    fn into_ipaddr(self) -> IpAddr {
        IpAddr::V4(std::net::Ipv4Addr::from(u32::from(self)))
    }
}

//-------------- Ipv6 Type --------------------------------------------------

/// Exactly fitting IPv6 bytes (16 octets).
pub type IPv6 = U128<NetworkEndian>;

impl AddressFamily for IPv6 {
    const BITS: u8 = 128;
    const STRIDES: usize = 16;

    type Addr = std::net::Ipv6Addr;

    fn zero() -> Self {
        U128::new(0)
    }

    fn from_addr(addr: Self::Addr) -> Self {
        IPv6::from(addr.octets())
    }

    fn from_octets(octets: &[u8; 16]) -> Self {
        IPv6::from(*octets)
    }

    fn truncate_to_len(self, len: u8) -> Self {
        match len {
            0 => U128::new(0),
            1..=127 => {
                (self >> U128::from(128 - len as u128))
                    << U128::from(128 - len as u128)
            }
            128 => self,
            len => panic!("Can't truncate to more than 128 bits: {}", len),
        }
    }

    fn into_ipaddr(self) -> IpAddr {
        IpAddr::V6(std::net::Ipv6Addr::from(u128::from(self)))
    }
}
