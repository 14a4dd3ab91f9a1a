//! A library for storing and retrieving IP prefixes with their associated
//! values, built on a multibit trie with a fixed stride of eight bits.
//!
//! The trie compresses in two directions: node arrays are
//! popcount-compressed, so sparse nodes cost a handful of words, and
//! prefixes whose path has no branching point are stored as path-compressed
//! entries instead of node chains. Mutation is copy-on-write underneath,
//! which makes cloning a table cheap and gives the `*_persist` methods
//! their versioning semantics.
//!
//! The public entry point is [`RoutingTable`]; it consumes
//! [`inetnum::addr::Prefix`] and [`std::net::IpAddr`] and is generic over
//! the stored value type.

pub use crate::table::RoutingTable;
pub use crate::types::af::{AddressFamily, IPv4, IPv6};
pub use crate::types::prefix_record::PrefixRecord;

pub mod table;
pub mod types;

pub(crate) mod trie;
