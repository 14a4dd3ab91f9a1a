//------------ CBT index mapping ---------------------------------------------

// The 256 possible prefixes of a single stride (lengths 0..=7, the aligned
// length 8 lives one level down) form a complete binary tree, indexed
// 1..=255 heap-style: index 1 is the stride's default route, and an index's
// parent is `idx >> 1`. A prefix `octet/len` maps to its tree position with
// the classic base-index recurrence. All functions here are pure and cheap;
// the derived bitmap tables live in the `lpm` and `allot` modules.

/// Map `octet/len` (stride-local, `len` 0..=7) to its CBT index.
#[inline]
pub(crate) const fn pfx_to_idx(octet: u8, len: u8) -> u8 {
    debug_assert!(len < 8);
    if len == 0 {
        1
    } else {
        (octet >> (8 - len)) | (1 << len)
    }
}

/// The index at which an IP lookup for a host octet starts its ancestor
/// chain: the /7 row covering the octet. Full host routes are not stored in
/// the stride itself, so the chain starts one length up.
#[inline]
pub(crate) const fn host_idx(octet: u8) -> u8 {
    (octet >> 1) | 128
}

/// The stride-local prefix length encoded in a CBT index.
#[inline]
pub(crate) const fn pfx_len(idx: u8) -> u8 {
    debug_assert!(idx > 0);
    7 - idx.leading_zeros() as u8
}

/// Map a CBT index back to `(octet, len)`, with the octet value aligned to
/// the top of its 8 bits.
#[inline]
pub(crate) const fn idx_to_pfx(idx: u8) -> (u8, u8) {
    let len = pfx_len(idx);
    if len == 0 {
        (0, 0)
    } else {
        ((idx & ((1 << len) - 1)) << (8 - len), len)
    }
}

/// The closed range of stride-local octet values covered by the prefix at
/// `idx`.
#[inline]
pub(crate) const fn idx_to_range(idx: u8) -> (u8, u8) {
    let (octet, len) = idx_to_pfx(idx);
    (octet, octet | (0xFF >> len))
}

/// The full bit length of the prefix at `idx` in a node at `depth`.
#[inline]
pub(crate) const fn pfx_bits(depth: usize, idx: u8) -> u8 {
    (depth as u8) << 3 | pfx_len(idx)
}
