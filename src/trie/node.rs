use std::sync::Arc;

use arrayvec::ArrayVec;
use log::trace;
use zerocopy::IntoBytes;

use crate::trie::allot::{HOST_ROUTES, PFX_ROUTES};
use crate::trie::art::{host_idx, idx_to_pfx, pfx_bits, pfx_len, pfx_to_idx};
use crate::trie::lpm::LOOKUP;
use crate::trie::sparse256::Sparse256;
use crate::types::{AddressFamily, PrefixId};

//------------ TrieNode ------------------------------------------------------

// One stride of the trie. `prefixes` holds the values for the up-to-255 CBT
// positions of this stride, `children` the up-to-256 slots below it. Both
// are popcount-compressed, so an average node is a few machine words, not
// half a kilobyte.
//
// A node does not know its own position; every method that needs the path
// takes the prefix under consideration (whose octets *are* the path) plus
// the current depth. That keeps nodes free of back pointers and makes
// structural sharing between table versions possible.

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TrieNode<A: AddressFamily, V> {
    pub(crate) prefixes: Sparse256<V>,
    pub(crate) children: Sparse256<Child<A, V>>,
}

// The three things an octet slot can hold. Path compression happens through
// the latter two: a prefix whose remaining path has no branching point is
// stored right here instead of at the bottom of a chain of one-armed nodes.
// A `Fringe` is the special case of a prefix that is exactly the default
// route for the slot's subtree (`bits == (depth + 1) * 8`); its prefix is
// implicit in the path, so only the value is stored.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Child<A: AddressFamily, V> {
    Node(Arc<TrieNode<A, V>>),
    Leaf(LeafNode<A, V>),
    Fringe(V),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LeafNode<A: AddressFamily, V> {
    pub(crate) prefix: PrefixId<A>,
    pub(crate) value: V,
}

/// Is a prefix of length `len` the default route for the subtree hanging
/// off the slot it reaches at `depth`?
#[inline]
pub(crate) const fn is_fringe(depth: usize, len: u8) -> bool {
    len as usize == (depth + 1) * 8
}

/// Rebuild a prefix from a node path and the CBT index it occupies there.
pub(crate) fn prefix_from_path<A: AddressFamily>(
    path: &[u8; 16],
    depth: usize,
    idx: u8,
) -> PrefixId<A> {
    let (octet, _) = idx_to_pfx(idx);
    let mut buf = [0_u8; 16];
    buf[..depth].copy_from_slice(&path[..depth]);
    buf[depth] = octet;
    PrefixId::new(A::from_octets(&buf), pfx_bits(depth, idx))
}

/// Rebuild the implicit prefix of a fringe at `(path, depth, octet)`.
pub(crate) fn fringe_from_path<A: AddressFamily>(
    path: &[u8; 16],
    depth: usize,
    octet: u8,
) -> PrefixId<A> {
    let mut buf = [0_u8; 16];
    buf[..depth].copy_from_slice(&path[..depth]);
    buf[depth] = octet;
    PrefixId::new(A::from_octets(&buf), ((depth + 1) * 8) as u8)
}

// Rebuild a prefix that lives below `pfx`'s path: keep `pfx`'s octets up to
// `depth`, place `byte` there, and cut to `len` bits total.
fn prefix_with_byte<A: AddressFamily>(
    pfx: PrefixId<A>,
    depth: usize,
    byte: u8,
    len: u8,
) -> PrefixId<A> {
    let bits = pfx.bits();
    let mut buf = [0_u8; 16];
    buf[..depth].copy_from_slice(&bits.as_bytes()[..depth]);
    buf[depth] = byte;
    PrefixId::new(A::from_octets(&buf), len)
}

impl<A: AddressFamily, V> Default for TrieNode<A, V> {
    fn default() -> Self {
        Self {
            prefixes: Sparse256::default(),
            children: Sparse256::default(),
        }
    }
}

//------------ TrieNode: reads -----------------------------------------------

impl<A: AddressFamily, V> TrieNode<A, V> {
    pub(crate) fn is_empty(&self) -> bool {
        self.prefixes.is_empty() && self.children.is_empty()
    }

    /// Exact-match retrieval of a stored prefix.
    pub(crate) fn get(&self, pfx: PrefixId<A>) -> Option<&V> {
        let bits = pfx.bits();
        let octets = bits.as_bytes();
        let last = (pfx.len() >> 3) as usize;
        let mut n = self;

        for depth in 0..A::STRIDES {
            let octet = octets[depth];
            if depth == last {
                return n.prefixes.get(pfx_to_idx(octet, pfx.len() & 7));
            }
            match n.children.get(octet)? {
                Child::Node(kid) => n = kid.as_ref(),
                Child::Leaf(leaf) => {
                    return if leaf.prefix == pfx {
                        Some(&leaf.value)
                    } else {
                        None
                    };
                }
                Child::Fringe(value) => {
                    return if is_fringe(depth, pfx.len()) {
                        Some(value)
                    } else {
                        None
                    };
                }
            }
        }
        unreachable!("trie deeper than the address family")
    }

    /// Is `addr` covered by any stored prefix?
    pub(crate) fn contains(&self, addr: A) -> bool {
        let octets = addr.as_bytes();
        let mut n = self;

        for &octet in octets.iter() {
            if n.prefixes
                .bitset()
                .intersects_any(&LOOKUP[host_idx(octet) as usize])
            {
                return true;
            }
            match n.children.get(octet) {
                None => return false,
                Some(Child::Node(kid)) => n = kid.as_ref(),
                Some(Child::Leaf(leaf)) => return leaf.prefix.covers(addr),
                Some(Child::Fringe(_)) => return true,
            }
        }
        false
    }

    /// Longest-prefix match for an address.
    pub(crate) fn lookup(&self, addr: A) -> Option<&V> {
        let octets = addr.as_bytes();
        let mut stack: ArrayVec<(&Self, u8), 16> = ArrayVec::new();
        let mut n = self;

        for &octet in octets.iter() {
            stack.push((n, octet));
            match n.children.get(octet) {
                Some(Child::Node(kid)) => n = kid.as_ref(),
                // a fringe is the most specific route on this path
                Some(Child::Fringe(value)) => return Some(value),
                Some(Child::Leaf(leaf)) => {
                    if leaf.prefix.covers(addr) {
                        return Some(&leaf.value);
                    }
                    break;
                }
                None => break,
            }
        }

        // unwind: the first in-stride match on the way up is the LPM
        while let Some((node, octet)) = stack.pop() {
            if let Some(top) = node
                .prefixes
                .bitset()
                .intersection_top(&LOOKUP[host_idx(octet) as usize])
            {
                return Some(node.prefixes.must_get(top));
            }
        }
        None
    }

    /// Longest-prefix match for a prefix probe: the most specific stored
    /// prefix covering `pfx`, together with its reconstructed identity.
    pub(crate) fn lookup_prefix(
        &self,
        pfx: PrefixId<A>,
    ) -> Option<(PrefixId<A>, &V)> {
        let bits = pfx.bits();
        let octets = bits.as_bytes();
        let last = (pfx.len() >> 3) as usize;
        let mut stack: ArrayVec<(&Self, u8), 16> = ArrayVec::new();
        let mut n = self;

        for depth in 0..A::STRIDES {
            let octet = octets[depth];
            if depth == last {
                let idx = pfx_to_idx(octet, pfx.len() & 7);
                if let Some(top) = n
                    .prefixes
                    .bitset()
                    .intersection_top(&LOOKUP[idx as usize])
                {
                    return Some((
                        pfx.truncate_to_len(pfx_bits(depth, top)),
                        n.prefixes.must_get(top),
                    ));
                }
                break;
            }
            stack.push((n, octet));
            match n.children.get(octet) {
                Some(Child::Node(kid)) => n = kid.as_ref(),
                Some(Child::Leaf(leaf)) => {
                    if leaf.prefix.contains(&pfx) {
                        return Some((leaf.prefix, &leaf.value));
                    }
                    break;
                }
                Some(Child::Fringe(value)) => {
                    return Some((
                        pfx.truncate_to_len(((depth + 1) * 8) as u8),
                        value,
                    ));
                }
                None => break,
            }
        }

        while let Some((node, octet)) = stack.pop() {
            let depth = stack.len();
            if let Some(top) = node
                .prefixes
                .bitset()
                .intersection_top(&LOOKUP[host_idx(octet) as usize])
            {
                return Some((
                    pfx.truncate_to_len(pfx_bits(depth, top)),
                    node.prefixes.must_get(top),
                ));
            }
        }
        None
    }

    /// Does any stored prefix overlap `pfx`, in either direction?
    pub(crate) fn overlaps_prefix_at(
        &self,
        pfx: PrefixId<A>,
        start_depth: usize,
    ) -> bool {
        let bits = pfx.bits();
        let octets = bits.as_bytes();
        let last = (pfx.len() >> 3) as usize;
        let mut n = self;

        for depth in start_depth..A::STRIDES {
            let octet = octets[depth];
            if depth == last {
                let idx = pfx_to_idx(octet, pfx.len() & 7) as usize;
                // a stored ancestor, a stored descendant, or a child slot
                // inside the probe's host range
                return n.prefixes.bitset().intersects_any(&LOOKUP[idx])
                    || n.prefixes.bitset().intersects_any(&PFX_ROUTES[idx])
                    || n.children.bitset().intersects_any(&HOST_ROUTES[idx]);
            }
            if n.prefixes
                .bitset()
                .intersects_any(&LOOKUP[host_idx(octet) as usize])
            {
                return true;
            }
            match n.children.get(octet) {
                None => return false,
                Some(Child::Node(kid)) => n = kid.as_ref(),
                Some(Child::Leaf(leaf)) => {
                    return leaf.prefix.contains(&pfx)
                        || pfx.contains(&leaf.prefix);
                }
                Some(Child::Fringe(_)) => return true,
            }
        }
        unreachable!("trie deeper than the address family")
    }

    /// Do the prefix sets of `self` and `other` overlap anywhere?
    pub(crate) fn overlaps(&self, other: &Self, depth: usize) -> bool {
        let mut buf = [0_u8; 256];

        // routes vs. routes: one ancestor-mask pass per side catches both
        // directions of coverage
        for &idx in self.prefixes.as_slice(&mut buf) {
            if other.prefixes.bitset().intersects_any(&LOOKUP[idx as usize])
            {
                return true;
            }
        }
        for &idx in other.prefixes.as_slice(&mut buf) {
            if self.prefixes.bitset().intersects_any(&LOOKUP[idx as usize]) {
                return true;
            }
        }

        // routes vs. the other side's child slots
        for &idx in self.prefixes.as_slice(&mut buf) {
            if other
                .children
                .bitset()
                .intersects_any(&HOST_ROUTES[idx as usize])
            {
                return true;
            }
        }
        for &idx in other.prefixes.as_slice(&mut buf) {
            if self
                .children
                .bitset()
                .intersects_any(&HOST_ROUTES[idx as usize])
            {
                return true;
            }
        }

        // children occupying the same slot
        let both = self.children.bitset().intersection(other.children.bitset());
        for &octet in both.as_slice(&mut buf) {
            let pair =
                (self.children.must_get(octet), other.children.must_get(octet));
            let overlap = match pair {
                // a fringe covers the whole slot, and every other child
                // kind lives inside the slot
                (Child::Fringe(_), _) | (_, Child::Fringe(_)) => true,
                (Child::Leaf(a), Child::Leaf(b)) => {
                    a.prefix.contains(&b.prefix) || b.prefix.contains(&a.prefix)
                }
                (Child::Node(node), Child::Leaf(leaf))
                | (Child::Leaf(leaf), Child::Node(node)) => {
                    node.overlaps_prefix_at(leaf.prefix, depth + 1)
                }
                (Child::Node(a), Child::Node(b)) => {
                    a.overlaps(b, depth + 1)
                }
            };
            if overlap {
                return true;
            }
        }
        false
    }
}

//------------ TrieNode: writes ----------------------------------------------

// All mutation goes through `Arc::make_mut`: a node that is shared with
// another table version is copied right before it is changed, a uniquely
// owned node is changed in place. That one mechanism gives both the cheap
// in-place updates and the persistent variants their semantics, hence the
// `V: Clone` bound.

impl<A: AddressFamily, V: Clone> TrieNode<A, V> {
    /// Insert `pfx` with `value`, starting the descent at `start_depth`.
    /// Returns the replaced value if the prefix was already present.
    pub(crate) fn insert_at(
        &mut self,
        pfx: PrefixId<A>,
        value: V,
        start_depth: usize,
    ) -> Option<V> {
        let bits = pfx.bits();
        let octets = bits.as_bytes();
        let last = (pfx.len() >> 3) as usize;
        let mut n = self;

        for depth in start_depth..A::STRIDES {
            let octet = octets[depth];
            if depth == last {
                return n
                    .prefixes
                    .insert_at(pfx_to_idx(octet, pfx.len() & 7), value);
            }
            if !n.children.test(octet) {
                let child = if is_fringe(depth, pfx.len()) {
                    Child::Fringe(value)
                } else {
                    Child::Leaf(LeafNode { prefix: pfx, value })
                };
                n.children.insert_at(octet, child);
                return None;
            }
            let descend = match n.children.must_get_mut(octet) {
                Child::Node(_) => true,
                Child::Leaf(leaf) => {
                    if leaf.prefix == pfx {
                        return Some(std::mem::replace(
                            &mut leaf.value,
                            value,
                        ));
                    }
                    false
                }
                Child::Fringe(old) => {
                    if is_fringe(depth, pfx.len()) {
                        return Some(std::mem::replace(old, value));
                    }
                    false
                }
            };
            if !descend {
                // the slot holds a different compressed prefix: grow a
                // subnode and push it one level down
                n.split_slot(octet, depth);
            }
            let Child::Node(arc) = n.children.must_get_mut(octet) else {
                unreachable!()
            };
            n = Arc::make_mut(arc);
        }
        unreachable!("trie deeper than the address family")
    }

    /// Exact-match retrieval with a mutable borrow. Path-copies shared
    /// nodes on the way down, like any other write.
    pub(crate) fn get_mut(&mut self, pfx: PrefixId<A>) -> Option<&mut V> {
        let bits = pfx.bits();
        let octets = bits.as_bytes();
        let last = (pfx.len() >> 3) as usize;
        let mut n = self;

        for depth in 0..A::STRIDES {
            let octet = octets[depth];
            if depth == last {
                return n
                    .prefixes
                    .get_mut(pfx_to_idx(octet, pfx.len() & 7));
            }
            if !n.children.test(octet) {
                return None;
            }
            match n.children.must_get_mut(octet) {
                Child::Node(arc) => n = Arc::make_mut(arc),
                Child::Leaf(leaf) => {
                    return if leaf.prefix == pfx {
                        Some(&mut leaf.value)
                    } else {
                        None
                    };
                }
                Child::Fringe(value) => {
                    return if is_fringe(depth, pfx.len()) {
                        Some(value)
                    } else {
                        None
                    };
                }
            }
        }
        unreachable!("trie deeper than the address family")
    }

    /// Remove `pfx` and return its value. Degenerate nodes left behind on
    /// the path are compressed away on the unwind.
    pub(crate) fn remove_at(
        &mut self,
        pfx: PrefixId<A>,
        depth: usize,
    ) -> Option<V> {
        let bits = pfx.bits();
        let octets = bits.as_bytes();
        let last = (pfx.len() >> 3) as usize;
        let octet = octets[depth];

        if depth == last {
            return self
                .prefixes
                .delete_at(pfx_to_idx(octet, pfx.len() & 7));
        }

        enum Slot {
            Recurse,
            Take,
            Miss,
        }
        let slot = match self.children.get(octet) {
            None => Slot::Miss,
            Some(Child::Node(_)) => Slot::Recurse,
            Some(Child::Leaf(leaf)) => {
                if leaf.prefix == pfx {
                    Slot::Take
                } else {
                    Slot::Miss
                }
            }
            Some(Child::Fringe(_)) => {
                if is_fringe(depth, pfx.len()) {
                    Slot::Take
                } else {
                    Slot::Miss
                }
            }
        };

        match slot {
            Slot::Miss => None,
            Slot::Take => match self.children.delete_at(octet) {
                Some(Child::Leaf(leaf)) => Some(leaf.value),
                Some(Child::Fringe(value)) => Some(value),
                _ => unreachable!(),
            },
            Slot::Recurse => {
                let Child::Node(arc) = self.children.must_get_mut(octet)
                else {
                    unreachable!()
                };
                let removed = Arc::make_mut(arc).remove_at(pfx, depth + 1)?;
                self.compress_child(pfx, octet, depth);
                Some(removed)
            }
        }
    }

    /// Insert, update or delete the slot for `pfx` through a callback. The
    /// callback receives the current value (by value) and decides what the
    /// slot should hold next; `None` deletes. Returns the change in the
    /// number of stored prefixes: -1, 0 or 1.
    pub(crate) fn modify_at<F>(
        &mut self,
        pfx: PrefixId<A>,
        depth: usize,
        f: F,
    ) -> isize
    where
        F: FnOnce(Option<V>) -> Option<V>,
    {
        let bits = pfx.bits();
        let octets = bits.as_bytes();
        let last = (pfx.len() >> 3) as usize;
        let octet = octets[depth];

        if depth == last {
            let idx = pfx_to_idx(octet, pfx.len() & 7);
            return match self.prefixes.delete_at(idx) {
                Some(old) => match f(Some(old)) {
                    Some(new) => {
                        self.prefixes.insert_at(idx, new);
                        0
                    }
                    None => -1,
                },
                None => match f(None) {
                    Some(new) => {
                        self.prefixes.insert_at(idx, new);
                        1
                    }
                    None => 0,
                },
            };
        }

        if !self.children.test(octet) {
            return match f(None) {
                Some(value) => {
                    let child = if is_fringe(depth, pfx.len()) {
                        Child::Fringe(value)
                    } else {
                        Child::Leaf(LeafNode { prefix: pfx, value })
                    };
                    self.children.insert_at(octet, child);
                    1
                }
                None => 0,
            };
        }

        enum Slot {
            Recurse,
            Take,
            Split,
        }
        let slot = match self.children.must_get(octet) {
            Child::Node(_) => Slot::Recurse,
            Child::Leaf(leaf) => {
                if leaf.prefix == pfx {
                    Slot::Take
                } else {
                    Slot::Split
                }
            }
            Child::Fringe(_) => {
                if is_fringe(depth, pfx.len()) {
                    Slot::Take
                } else {
                    Slot::Split
                }
            }
        };

        match slot {
            Slot::Recurse => {
                let Child::Node(arc) = self.children.must_get_mut(octet)
                else {
                    unreachable!()
                };
                let delta = Arc::make_mut(arc).modify_at(pfx, depth + 1, f);
                if delta < 0 {
                    self.compress_child(pfx, octet, depth);
                }
                delta
            }
            Slot::Take => {
                let old = match self.children.delete_at(octet) {
                    Some(Child::Leaf(leaf)) => leaf.value,
                    Some(Child::Fringe(value)) => value,
                    _ => unreachable!(),
                };
                match f(Some(old)) {
                    Some(value) => {
                        let child = if is_fringe(depth, pfx.len()) {
                            Child::Fringe(value)
                        } else {
                            Child::Leaf(LeafNode { prefix: pfx, value })
                        };
                        self.children.insert_at(octet, child);
                        0
                    }
                    None => -1,
                }
            }
            Slot::Split => match f(None) {
                None => 0,
                Some(value) => {
                    self.split_slot(octet, depth);
                    let Child::Node(arc) = self.children.must_get_mut(octet)
                    else {
                        unreachable!()
                    };
                    Arc::make_mut(arc).insert_at(pfx, value, depth + 1);
                    1
                }
            },
        }
    }

    // Replace the leaf or fringe at `octet` with a fresh subnode holding
    // it, so that the descent can continue below.
    fn split_slot(&mut self, octet: u8, depth: usize) {
        trace!("split compressed slot {} at depth {}", octet, depth);
        let old = self
            .children
            .insert_at(octet, Child::Node(Arc::new(TrieNode::default())));
        let Child::Node(arc) = self.children.must_get_mut(octet) else {
            unreachable!()
        };
        let kid = Arc::make_mut(arc);
        match old {
            Some(Child::Leaf(leaf)) => {
                kid.insert_at(leaf.prefix, leaf.value, depth + 1);
            }
            Some(Child::Fringe(value)) => {
                // the fringe becomes the default route of the new subnode
                kid.prefixes.insert_at(1, value);
            }
            _ => unreachable!(),
        }
    }

    // After a removal below the subnode at `octet`, squash it if it has
    // become empty or degenerated into a single compressible entry. `pfx`
    // is the prefix that was just removed; its octets are the path to the
    // subnode. Runs at every level of the unwind, so a whole chain of
    // one-armed nodes collapses back into a leaf at the highest possible
    // level.
    fn compress_child(&mut self, pfx: PrefixId<A>, octet: u8, depth: usize) {
        let Some(Child::Node(arc)) = self.children.get(octet) else {
            return;
        };
        let kid = arc.as_ref();

        match (kid.prefixes.len(), kid.children.len()) {
            (0, 0) => {
                trace!("purge empty node at depth {}", depth + 1);
                self.children.delete_at(octet);
            }
            (0, 1) => {
                // a lone subnode may hold prefixes at several CBT
                // positions that cannot be represented one level up, so
                // only leaves and fringes are pulled up
                if matches!(
                    kid.children.must_get(kid.children.first_set().unwrap()),
                    Child::Node(_)
                ) {
                    return;
                }
                let Some(Child::Node(arc)) = self.children.delete_at(octet)
                else {
                    unreachable!()
                };
                let mut kid =
                    Arc::try_unwrap(arc).unwrap_or_else(|a| (*a).clone());
                let kid_octet = kid.children.first_set().unwrap();
                match kid.children.delete_at(kid_octet) {
                    Some(Child::Leaf(leaf)) => {
                        trace!("pull leaf up to depth {}", depth);
                        self.insert_at(leaf.prefix, leaf.value, depth);
                    }
                    Some(Child::Fringe(value)) => {
                        trace!("pull fringe up to depth {}", depth);
                        let fringe = prefix_with_byte(
                            pfx,
                            depth + 1,
                            kid_octet,
                            ((depth + 2) * 8) as u8,
                        );
                        self.insert_at(fringe, value, depth);
                    }
                    _ => unreachable!(),
                }
            }
            (1, 0) => {
                let Some(Child::Node(arc)) = self.children.delete_at(octet)
                else {
                    unreachable!()
                };
                let mut kid =
                    Arc::try_unwrap(arc).unwrap_or_else(|a| (*a).clone());
                let idx = kid.prefixes.first_set().unwrap();
                let value = kid.prefixes.delete_at(idx).unwrap();
                trace!("pull single prefix up to depth {}", depth);
                let single = prefix_with_byte(
                    pfx,
                    depth + 1,
                    idx_to_pfx(idx).0,
                    ((depth + 1) * 8) as u8 + pfx_len(idx),
                );
                self.insert_at(single, value, depth);
            }
            _ => {}
        }
    }

    /// Merge `other` into `self`; on duplicate prefixes the value from
    /// `other` wins. Returns the number of duplicates, which the caller
    /// needs to keep its size counters straight.
    pub(crate) fn union_with(&mut self, other: &Self, depth: usize) -> usize {
        let mut duplicates = 0;
        let mut buf = [0_u8; 256];

        for &idx in other.prefixes.as_slice(&mut buf) {
            let value = other.prefixes.must_get(idx).clone();
            if self.prefixes.insert_at(idx, value).is_some() {
                duplicates += 1;
            }
        }

        let mut buf = [0_u8; 256];
        for &octet in other.children.as_slice(&mut buf) {
            let other_child = other.children.must_get(octet);
            if !self.children.test(octet) {
                // untouched subtrees are shared, compressed entries cloned
                self.children.insert_at(octet, other_child.clone());
                continue;
            }
            duplicates += self.union_child(octet, other_child, depth);
        }
        duplicates
    }

    // Merge one occupied child slot. The variant pairs that keep the
    // slot's shape are handled directly; everything else pushes the
    // existing leaf or fringe down into a new subnode first and then
    // merges into that.
    fn union_child(
        &mut self,
        octet: u8,
        other_child: &Child<A, V>,
        depth: usize,
    ) -> usize {
        match (self.children.must_get_mut(octet), other_child) {
            (Child::Node(arc), Child::Node(other_node)) => {
                return Arc::make_mut(arc).union_with(other_node, depth + 1);
            }
            (Child::Node(arc), Child::Leaf(leaf)) => {
                return usize::from(
                    Arc::make_mut(arc)
                        .insert_at(leaf.prefix, leaf.value.clone(), depth + 1)
                        .is_some(),
                );
            }
            (Child::Node(arc), Child::Fringe(value)) => {
                return usize::from(
                    Arc::make_mut(arc)
                        .prefixes
                        .insert_at(1, value.clone())
                        .is_some(),
                );
            }
            (Child::Leaf(sl), Child::Leaf(ol)) if sl.prefix == ol.prefix => {
                sl.value = ol.value.clone();
                return 1;
            }
            (Child::Fringe(sv), Child::Fringe(ov)) => {
                *sv = ov.clone();
                return 1;
            }
            _ => {}
        }

        self.split_slot(octet, depth);
        let Child::Node(arc) = self.children.must_get_mut(octet) else {
            unreachable!()
        };
        let kid = Arc::make_mut(arc);
        match other_child {
            Child::Node(other_node) => kid.union_with(other_node, depth + 1),
            Child::Leaf(leaf) => usize::from(
                kid.insert_at(leaf.prefix, leaf.value.clone(), depth + 1)
                    .is_some(),
            ),
            Child::Fringe(value) => {
                usize::from(kid.prefixes.insert_at(1, value.clone()).is_some())
            }
        }
    }
}
