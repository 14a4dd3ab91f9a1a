use arrayvec::ArrayVec;
use inetnum::addr::Prefix;
use zerocopy::IntoBytes;

use crate::trie::allot::{HOST_ROUTES, PFX_ROUTES};
use crate::trie::art::{host_idx, idx_to_range, pfx_bits, pfx_len, pfx_to_idx};
use crate::trie::node::{
    fringe_from_path, prefix_from_path, Child, TrieNode,
};
use crate::types::{AddressFamily, PrefixId};

//------------ Iterators over the trie ---------------------------------------

// All iterators here are plain pull iterators: nothing is precollected
// beyond the per-node index lists, and a consumer may drop them at any
// point. The nodes carry no parent pointers, so every iterator keeps its
// own descent state: a stack of frames, each holding a node, the octet path
// that leads to it and cursors into its prefix and child index lists.

struct Frame<'a, A: AddressFamily, V> {
    node: &'a TrieNode<A, V>,
    path: [u8; 16],
    depth: usize,
    pfx_idxs: Vec<u8>,
    pfx_pos: usize,
    child_octets: Vec<u8>,
    child_pos: usize,
}

impl<'a, A: AddressFamily, V> Frame<'a, A, V> {
    fn new(node: &'a TrieNode<A, V>, path: [u8; 16], depth: usize) -> Self {
        let mut buf = [0_u8; 256];
        let pfx_idxs = node.prefixes.as_slice(&mut buf).to_vec();
        let child_octets = node.children.as_slice(&mut buf).to_vec();
        Frame {
            node,
            path,
            depth,
            pfx_idxs,
            pfx_pos: 0,
            child_octets,
            child_pos: 0,
        }
    }

    // CIDR rank within one stride: covered address first, shorter length on
    // a tie. Child slots keep their natural octet order; the interleave in
    // `SortedIter` does the rest.
    fn sorted(
        node: &'a TrieNode<A, V>,
        path: [u8; 16],
        depth: usize,
    ) -> Self {
        let mut frame = Self::new(node, path, depth);
        frame.sort_prefixes();
        frame
    }

    // A frame restricted to the CBT subtree and host range of `range_idx`,
    // for iteration scoped to one prefix of the node's stride.
    fn scoped(
        node: &'a TrieNode<A, V>,
        path: [u8; 16],
        depth: usize,
        range_idx: u8,
    ) -> Self {
        let mut frame = Self::new(node, path, depth);
        frame
            .pfx_idxs
            .retain(|&idx| PFX_ROUTES[range_idx as usize].test(idx));
        frame
            .child_octets
            .retain(|&octet| HOST_ROUTES[range_idx as usize].test(octet));
        frame.sort_prefixes();
        frame
    }

    fn sort_prefixes(&mut self) {
        self.pfx_idxs
            .sort_unstable_by_key(|&idx| (idx_to_range(idx).0, pfx_len(idx)));
    }
}

//------------ Iter ----------------------------------------------------------

// Structure-order iteration: per node all prefixes in bitset order, then
// all children in slot order. Cheapest complete walk; no ordering promise.

pub(crate) struct Iter<'a, A: AddressFamily, V> {
    stack: Vec<Frame<'a, A, V>>,
}

impl<'a, A: AddressFamily, V> Iterator for Iter<'a, A, V> {
    type Item = (Prefix, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let push;
            {
                let frame = self.stack.last_mut()?;
                let node = frame.node;
                if frame.pfx_pos < frame.pfx_idxs.len() {
                    let idx = frame.pfx_idxs[frame.pfx_pos];
                    frame.pfx_pos += 1;
                    let pfx = prefix_from_path::<A>(
                        &frame.path,
                        frame.depth,
                        idx,
                    );
                    return Some((pfx.into(), node.prefixes.must_get(idx)));
                }
                if frame.child_pos >= frame.child_octets.len() {
                    push = None;
                } else {
                    let octet = frame.child_octets[frame.child_pos];
                    frame.child_pos += 1;
                    match node.children.must_get(octet) {
                        Child::Leaf(leaf) => {
                            return Some((leaf.prefix.into(), &leaf.value));
                        }
                        Child::Fringe(value) => {
                            let pfx = fringe_from_path::<A>(
                                &frame.path,
                                frame.depth,
                                octet,
                            );
                            return Some((pfx.into(), value));
                        }
                        Child::Node(kid) => {
                            let mut path = frame.path;
                            path[frame.depth] = octet;
                            push =
                                Some((kid.as_ref(), path, frame.depth + 1));
                        }
                    }
                }
            }
            match push {
                Some((node, path, depth)) => {
                    self.stack.push(Frame::new(node, path, depth));
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

//------------ SortedIter ----------------------------------------------------

// CIDR-order iteration. Within a node, a stride prefix precedes a child
// subtree if its start octet is less than or equal to the child's slot (on
// an equal start the prefix is shorter than anything inside the slot, so it
// still goes first); child subtrees come in slot order and are emitted
// depth-first through the same machinery.

pub(crate) struct SortedIter<'a, A: AddressFamily, V> {
    stack: Vec<Frame<'a, A, V>>,
}

impl<'a, A: AddressFamily, V> Iterator for SortedIter<'a, A, V> {
    type Item = (Prefix, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let push;
            {
                let frame = self.stack.last_mut()?;
                let node = frame.node;
                let next_pfx = frame.pfx_idxs.get(frame.pfx_pos).copied();
                let next_child =
                    frame.child_octets.get(frame.child_pos).copied();

                let emit = match (next_pfx, next_child) {
                    (Some(idx), Some(octet))
                        if idx_to_range(idx).0 <= octet =>
                    {
                        Some(idx)
                    }
                    (Some(idx), None) => Some(idx),
                    _ => None,
                };
                if let Some(idx) = emit {
                    frame.pfx_pos += 1;
                    let pfx = prefix_from_path::<A>(
                        &frame.path,
                        frame.depth,
                        idx,
                    );
                    return Some((pfx.into(), node.prefixes.must_get(idx)));
                }

                match next_child {
                    None => push = None,
                    Some(octet) => {
                        frame.child_pos += 1;
                        match node.children.must_get(octet) {
                            Child::Leaf(leaf) => {
                                return Some((
                                    leaf.prefix.into(),
                                    &leaf.value,
                                ));
                            }
                            Child::Fringe(value) => {
                                let pfx = fringe_from_path::<A>(
                                    &frame.path,
                                    frame.depth,
                                    octet,
                                );
                                return Some((pfx.into(), value));
                            }
                            Child::Node(kid) => {
                                let mut path = frame.path;
                                path[frame.depth] = octet;
                                push = Some((
                                    kid.as_ref(),
                                    path,
                                    frame.depth + 1,
                                ));
                            }
                        }
                    }
                }
            }
            match push {
                Some((node, path, depth)) => {
                    self.stack.push(Frame::sorted(node, path, depth));
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

//------------ Subnets -------------------------------------------------------

// All stored prefixes covered by a probe prefix, in CIDR order. The descent
// follows the probe's octets; if it ends at a compressed entry, that entry
// is the only possible result. If it reaches the probe's last stride, the
// walk is a sorted iteration scoped to the probe's CBT subtree and host
// range.

pub(crate) struct Subnets<'a, A: AddressFamily, V> {
    head: Option<(Prefix, &'a V)>,
    walk: SortedIter<'a, A, V>,
}

impl<'a, A: AddressFamily, V> Iterator for Subnets<'a, A, V> {
    type Item = (Prefix, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(head) = self.head.take() {
            return Some(head);
        }
        self.walk.next()
    }
}

//------------ Supernets -----------------------------------------------------

// All stored prefixes covering a probe prefix, most specific first. The
// descent along the probe records one level per stride; the emission walks
// the levels from the deepest up, and within each level walks the CBT
// ancestor chain of the level's index by repeated halving. A compressed
// entry that stopped the descent is the deepest cover of all, so it is
// handed out first.

pub(crate) struct Supernets<'a, A: AddressFamily, V> {
    head: Option<(Prefix, &'a V)>,
    levels: ArrayVec<SupernetLevel<'a, A, V>, 16>,
    pfx: PrefixId<A>,
}

struct SupernetLevel<'a, A: AddressFamily, V> {
    node: &'a TrieNode<A, V>,
    depth: usize,
    idx: u16,
}

impl<'a, A: AddressFamily, V> Iterator for Supernets<'a, A, V> {
    type Item = (Prefix, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(head) = self.head.take() {
            return Some(head);
        }
        loop {
            {
                let level = self.levels.last_mut()?;
                let node = level.node;
                while level.idx > 0 {
                    let idx = level.idx as u8;
                    level.idx >>= 1;
                    if node.prefixes.test(idx) {
                        let pfx = self
                            .pfx
                            .truncate_to_len(pfx_bits(level.depth, idx));
                        return Some((
                            pfx.into(),
                            node.prefixes.must_get(idx),
                        ));
                    }
                }
            }
            self.levels.pop();
        }
    }
}

//------------ TrieNode: iterator constructors -------------------------------

impl<A: AddressFamily, V> TrieNode<A, V> {
    pub(crate) fn iter(&self) -> Iter<'_, A, V> {
        Iter {
            stack: vec![Frame::new(self, [0_u8; 16], 0)],
        }
    }

    pub(crate) fn iter_sorted(&self) -> SortedIter<'_, A, V> {
        SortedIter {
            stack: vec![Frame::sorted(self, [0_u8; 16], 0)],
        }
    }

    pub(crate) fn subnets(&self, pfx: PrefixId<A>) -> Subnets<'_, A, V> {
        let bits = pfx.bits();
        let octets = bits.as_bytes();
        let last = (pfx.len() >> 3) as usize;
        let mut path = [0_u8; 16];
        let mut head = None;
        let mut walk = SortedIter { stack: Vec::new() };
        let mut n = self;

        for depth in 0..A::STRIDES {
            let octet = octets[depth];
            if depth == last {
                let range_idx = pfx_to_idx(octet, pfx.len() & 7);
                walk.stack.push(Frame::scoped(n, path, depth, range_idx));
                break;
            }
            match n.children.get(octet) {
                Some(Child::Node(kid)) => {
                    path[depth] = octet;
                    n = kid.as_ref();
                }
                Some(Child::Leaf(leaf)) => {
                    if pfx.contains(&leaf.prefix) {
                        head = Some((leaf.prefix.into(), &leaf.value));
                    }
                    break;
                }
                Some(Child::Fringe(value)) => {
                    let fringe = fringe_from_path::<A>(&path, depth, octet);
                    if pfx.contains(&fringe) {
                        head = Some((fringe.into(), value));
                    }
                    break;
                }
                None => break,
            }
        }
        Subnets { head, walk }
    }

    pub(crate) fn supernets(&self, pfx: PrefixId<A>) -> Supernets<'_, A, V> {
        let bits = pfx.bits();
        let octets = bits.as_bytes();
        let last = (pfx.len() >> 3) as usize;
        let mut levels = ArrayVec::new();
        let mut head = None;
        let mut n = self;

        for depth in 0..A::STRIDES {
            let octet = octets[depth];
            if depth == last {
                levels.push(SupernetLevel {
                    node: n,
                    depth,
                    idx: pfx_to_idx(octet, pfx.len() & 7) as u16,
                });
                break;
            }
            levels.push(SupernetLevel {
                node: n,
                depth,
                idx: host_idx(octet) as u16,
            });
            match n.children.get(octet) {
                Some(Child::Node(kid)) => n = kid.as_ref(),
                Some(Child::Leaf(leaf)) => {
                    if leaf.prefix.contains(&pfx) {
                        head = Some((leaf.prefix.into(), &leaf.value));
                    }
                    break;
                }
                Some(Child::Fringe(value)) => {
                    // depth < last, so the fringe covers the probe
                    let fringe =
                        pfx.truncate_to_len(((depth + 1) * 8) as u8);
                    head = Some((fringe.into(), value));
                    break;
                }
                None => break,
            }
        }
        Supernets { head, levels, pfx }
    }
}
