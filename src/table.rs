use std::fmt;
use std::net::IpAddr;

use inetnum::addr::Prefix;
use log::debug;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_derive::Serialize as SerializeDerive;

use crate::trie::node::TrieNode;
use crate::types::af::{AddressFamily, IPv4, IPv6};
use crate::types::prefix_record::{prefix_string, PrefixRecord};
use crate::types::PrefixId;

//------------ RoutingTable --------------------------------------------------

/// An IP routing table over two fixed-stride tries, one per address family.
///
/// Every stored prefix carries a value of type `V`. Lookups, containment
/// checks and the enumeration iterators borrow; mutation requires
/// `V: Clone` because subtrees may be structurally shared between table
/// versions and are copied right before their first change.
///
/// A table is cheap to clone: the clone shares all subtrees with the
/// original, and either side copies the nodes it touches on its own later
/// writes. The `*_persist` methods build on this to produce a new version
/// while leaving `self` untouched, which is what a multi-reader
/// single-writer setup wants: mutate a clone, then publish it with an
/// atomic pointer swap. The table itself performs no synchronization;
/// concurrent readers are fine as long as no writer runs at the same time.
#[derive(Clone, PartialEq)]
pub struct RoutingTable<V> {
    v4: TrieNode<IPv4, V>,
    v6: TrieNode<IPv6, V>,
    size4: usize,
    size6: usize,
}

enum FamilyPrefix {
    V4(PrefixId<IPv4>),
    V6(PrefixId<IPv6>),
}

// All bits of a prefix beyond its length must be zero; the octets of a
// prefix double as its descent path, so anything else would walk the wrong
// way. Offending input is dropped here, once, for every entry point.
fn family_pfx(prefix: &Prefix) -> Option<FamilyPrefix> {
    let pfx = match prefix.addr() {
        IpAddr::V4(addr) => {
            FamilyPrefix::V4(PrefixId::new(IPv4::from_addr(addr), prefix.len()))
        }
        IpAddr::V6(addr) => {
            FamilyPrefix::V6(PrefixId::new(IPv6::from_addr(addr), prefix.len()))
        }
    };
    let canonical = match &pfx {
        FamilyPrefix::V4(p) => p.is_canonical(),
        FamilyPrefix::V6(p) => p.is_canonical(),
    };
    if !canonical {
        debug!("rejecting non-canonical prefix {}", prefix);
        return None;
    }
    Some(pfx)
}

impl<V> RoutingTable<V> {
    pub fn new() -> Self {
        Self {
            v4: TrieNode::default(),
            v6: TrieNode::default(),
            size4: 0,
            size6: 0,
        }
    }

    /// The number of prefixes in the table.
    pub fn len(&self) -> usize {
        self.size4 + self.size6
    }

    /// The number of IPv4 prefixes in the table.
    pub fn len4(&self) -> usize {
        self.size4
    }

    /// The number of IPv6 prefixes in the table.
    pub fn len6(&self) -> usize {
        self.size6
    }

    pub fn is_empty(&self) -> bool {
        self.size4 == 0 && self.size6 == 0
    }

    //--- exact-match reads --------------------------------------------------

    /// The value stored for exactly `prefix`, if any.
    pub fn get(&self, prefix: &Prefix) -> Option<&V> {
        match family_pfx(prefix)? {
            FamilyPrefix::V4(pfx) => self.v4.get(pfx),
            FamilyPrefix::V6(pfx) => self.v6.get(pfx),
        }
    }

    //--- longest-prefix matching --------------------------------------------

    /// Is `addr` covered by any stored prefix?
    pub fn contains(&self, addr: IpAddr) -> bool {
        match addr {
            IpAddr::V4(addr) => self.v4.contains(IPv4::from_addr(addr)),
            IpAddr::V6(addr) => self.v6.contains(IPv6::from_addr(addr)),
        }
    }

    /// The value of the most specific stored prefix covering `addr`.
    pub fn lookup(&self, addr: IpAddr) -> Option<&V> {
        match addr {
            IpAddr::V4(addr) => self.v4.lookup(IPv4::from_addr(addr)),
            IpAddr::V6(addr) => self.v6.lookup(IPv6::from_addr(addr)),
        }
    }

    /// The value of the most specific stored prefix covering `prefix`
    /// (which may be `prefix` itself).
    pub fn lookup_prefix(&self, prefix: &Prefix) -> Option<&V> {
        self.lookup_prefix_lpm(prefix).map(|(_, value)| value)
    }

    /// Like [`lookup_prefix`][Self::lookup_prefix], but also returns the
    /// matching prefix.
    pub fn lookup_prefix_lpm(
        &self,
        prefix: &Prefix,
    ) -> Option<(Prefix, &V)> {
        match family_pfx(prefix)? {
            FamilyPrefix::V4(pfx) => {
                self.v4.lookup_prefix(pfx).map(|(p, v)| (p.into(), v))
            }
            FamilyPrefix::V6(pfx) => {
                self.v6.lookup_prefix(pfx).map(|(p, v)| (p.into(), v))
            }
        }
    }

    //--- set relations ------------------------------------------------------

    /// Do any two prefixes of `self` and `other` overlap?
    pub fn overlaps(&self, other: &Self) -> bool {
        self.overlaps_v4(other) || self.overlaps_v6(other)
    }

    pub fn overlaps_v4(&self, other: &Self) -> bool {
        self.v4.overlaps(&other.v4, 0)
    }

    pub fn overlaps_v6(&self, other: &Self) -> bool {
        self.v6.overlaps(&other.v6, 0)
    }

    /// Does any stored prefix overlap `prefix`, in either direction?
    pub fn overlaps_prefix(&self, prefix: &Prefix) -> bool {
        match family_pfx(prefix) {
            Some(FamilyPrefix::V4(pfx)) => self.v4.overlaps_prefix_at(pfx, 0),
            Some(FamilyPrefix::V6(pfx)) => self.v6.overlaps_prefix_at(pfx, 0),
            None => false,
        }
    }

    //--- enumeration --------------------------------------------------------

    /// All entries, v4 before v6, in structure order (no further ordering
    /// promise).
    pub fn iter(&self) -> impl Iterator<Item = (Prefix, &V)> {
        self.v4.iter().chain(self.v6.iter())
    }

    /// All entries in CIDR order: address ascending, shorter prefix first
    /// on a tie, v4 before v6.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (Prefix, &V)> {
        self.v4.iter_sorted().chain(self.v6.iter_sorted())
    }

    pub fn iter_v4(&self) -> impl Iterator<Item = (Prefix, &V)> {
        self.v4.iter()
    }

    pub fn iter_v6(&self) -> impl Iterator<Item = (Prefix, &V)> {
        self.v6.iter()
    }

    pub fn iter_v4_sorted(&self) -> impl Iterator<Item = (Prefix, &V)> {
        self.v4.iter_sorted()
    }

    pub fn iter_v6_sorted(&self) -> impl Iterator<Item = (Prefix, &V)> {
        self.v6.iter_sorted()
    }

    /// All stored prefixes covered by `prefix`, in CIDR order, including
    /// `prefix` itself if stored.
    pub fn subnets<'a>(
        &'a self,
        prefix: &Prefix,
    ) -> impl Iterator<Item = (Prefix, &'a V)> {
        match family_pfx(prefix) {
            Some(FamilyPrefix::V4(pfx)) => FamilyIter::V4(self.v4.subnets(pfx)),
            Some(FamilyPrefix::V6(pfx)) => FamilyIter::V6(self.v6.subnets(pfx)),
            None => FamilyIter::Empty,
        }
    }

    /// All stored prefixes covering `prefix`, most specific first,
    /// including `prefix` itself if stored.
    pub fn supernets<'a>(
        &'a self,
        prefix: &Prefix,
    ) -> impl Iterator<Item = (Prefix, &'a V)> {
        match family_pfx(prefix) {
            Some(FamilyPrefix::V4(pfx)) => {
                FamilyIter::V4(self.v4.supernets(pfx))
            }
            Some(FamilyPrefix::V6(pfx)) => {
                FamilyIter::V6(self.v6.supernets(pfx))
            }
            None => FamilyIter::Empty,
        }
    }
}

//------------ RoutingTable: mutation ----------------------------------------

impl<V: Clone> RoutingTable<V> {
    /// Insert `value` for `prefix`. Returns the replaced value if the
    /// prefix was already present. Non-canonical prefixes are dropped.
    pub fn insert(&mut self, prefix: &Prefix, value: V) -> Option<V> {
        match family_pfx(prefix) {
            Some(FamilyPrefix::V4(pfx)) => {
                let old = self.v4.insert_at(pfx, value, 0);
                if old.is_none() {
                    self.size4 += 1;
                }
                old
            }
            Some(FamilyPrefix::V6(pfx)) => {
                let old = self.v6.insert_at(pfx, value, 0);
                if old.is_none() {
                    self.size6 += 1;
                }
                old
            }
            None => None,
        }
    }

    /// Remove `prefix` and return its value, if it was present.
    pub fn remove(&mut self, prefix: &Prefix) -> Option<V> {
        match family_pfx(prefix) {
            Some(FamilyPrefix::V4(pfx)) => {
                let removed = self.v4.remove_at(pfx, 0);
                if removed.is_some() {
                    self.size4 -= 1;
                }
                removed
            }
            Some(FamilyPrefix::V6(pfx)) => {
                let removed = self.v6.remove_at(pfx, 0);
                if removed.is_some() {
                    self.size6 -= 1;
                }
                removed
            }
            None => None,
        }
    }

    /// A mutable borrow of the value stored for exactly `prefix`.
    pub fn get_mut(&mut self, prefix: &Prefix) -> Option<&mut V> {
        match family_pfx(prefix)? {
            FamilyPrefix::V4(pfx) => self.v4.get_mut(pfx),
            FamilyPrefix::V6(pfx) => self.v6.get_mut(pfx),
        }
    }

    /// Insert, update or delete the entry for `prefix` in one traversal.
    /// The callback receives the current value, if any, and returns the
    /// value to store; returning `None` removes the entry. Ownership of
    /// the old value moves through the callback either way.
    pub fn modify<F>(&mut self, prefix: &Prefix, f: F)
    where
        F: FnOnce(Option<V>) -> Option<V>,
    {
        match family_pfx(prefix) {
            Some(FamilyPrefix::V4(pfx)) => {
                let delta = self.v4.modify_at(pfx, 0, f);
                self.size4 = (self.size4 as isize + delta) as usize;
            }
            Some(FamilyPrefix::V6(pfx)) => {
                let delta = self.v6.modify_at(pfx, 0, f);
                self.size6 = (self.size6 as isize + delta) as usize;
            }
            None => {}
        }
    }

    /// Merge all entries of `other` into `self`. On prefixes present in
    /// both, the value from `other` wins.
    pub fn union_with(&mut self, other: &Self) {
        let dup4 = self.v4.union_with(&other.v4, 0);
        self.size4 += other.size4 - dup4;
        let dup6 = self.v6.union_with(&other.v6, 0);
        self.size6 += other.size6 - dup6;
    }

    //--- persistent variants ------------------------------------------------

    // Each of these leaves `self` untouched and returns a new version that
    // shares every subtree the operation did not walk through.

    pub fn insert_persist(&self, prefix: &Prefix, value: V) -> Self {
        let mut new = self.clone();
        new.insert(prefix, value);
        new
    }

    pub fn remove_persist(&self, prefix: &Prefix) -> Self {
        let mut new = self.clone();
        new.remove(prefix);
        new
    }

    pub fn modify_persist<F>(&self, prefix: &Prefix, f: F) -> Self
    where
        F: FnOnce(Option<V>) -> Option<V>,
    {
        let mut new = self.clone();
        new.modify(prefix, f);
        new
    }

    pub fn union_persist(&self, other: &Self) -> Self {
        let mut new = self.clone();
        new.union_with(other);
        new
    }
}

impl<V> Default for RoutingTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for RoutingTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingTable")
            .field("v4_prefixes", &self.size4)
            .field("v6_prefixes", &self.size6)
            .finish()
    }
}

impl<V: Clone> Extend<(Prefix, V)> for RoutingTable<V> {
    fn extend<I: IntoIterator<Item = (Prefix, V)>>(&mut self, iter: I) {
        for (prefix, value) in iter {
            self.insert(&prefix, value);
        }
    }
}

impl<V: Clone> FromIterator<(Prefix, V)> for RoutingTable<V> {
    fn from_iter<I: IntoIterator<Item = (Prefix, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

//------------ FamilyIter ----------------------------------------------------

// Unifies the per-family iterator types behind one return type for the
// methods that dispatch on the probe's family.
enum FamilyIter<I4, I6> {
    V4(I4),
    V6(I6),
    Empty,
}

impl<T, I4, I6> Iterator for FamilyIter<I4, I6>
where
    I4: Iterator<Item = T>,
    I6: Iterator<Item = T>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        match self {
            FamilyIter::V4(iter) => iter.next(),
            FamilyIter::V6(iter) => iter.next(),
            FamilyIter::Empty => None,
        }
    }
}

//------------ Serialization -------------------------------------------------

// A table serializes as its CIDR-ordered sequence of records, with the
// prefix in canonical textual form, and deserializes by re-inserting them.

#[derive(SerializeDerive)]
struct BorrowedRecord<'a, V> {
    #[serde(with = "prefix_string")]
    prefix: Prefix,
    value: &'a V,
}

impl<V: Serialize> Serialize for RoutingTable<V> {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            self.iter_sorted()
                .map(|(prefix, value)| BorrowedRecord { prefix, value }),
        )
    }
}

impl<'de, V: Deserialize<'de> + Clone> Deserialize<'de> for RoutingTable<V> {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self, D::Error> {
        let records = Vec::<PrefixRecord<V>>::deserialize(deserializer)?;
        Ok(records
            .into_iter()
            .map(|record| (record.prefix, record.value))
            .collect())
    }
}
