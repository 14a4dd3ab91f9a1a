use crate::trie::bitset256::BitSet256;

//------------ Allotment tables ----------------------------------------------

// The downward counterparts of the LPM table: per CBT index, everything the
// prefix at that index allots. `PFX_ROUTES[idx]` holds the CBT descendants
// of `idx` among the stride's own positions (including `idx`);
// `HOST_ROUTES[idx]` holds the host octet values the prefix covers, which
// is exactly the set of child slots falling inside it. Overlap checks
// intersect these against the prefix and child bitsets of the other
// operand; the subnet iterator uses them to scope a node walk to a range.

pub(crate) static PFX_ROUTES: [BitSet256; 256] = pfx_routes_tbl();
pub(crate) static HOST_ROUTES: [BitSet256; 256] = host_routes_tbl();

const fn pfx_routes_tbl() -> [BitSet256; 256] {
    let mut tbl = [BitSet256::ZERO; 256];
    let mut idx = 1_usize;
    while idx < 256 {
        let mut words = [0_u64; 4];
        // walk the subtree row by row: [idx..=idx], [2idx..=2idx+1], ...
        let mut lo = idx;
        let mut hi = idx;
        while lo < 256 {
            let mut j = lo;
            while j <= hi && j < 256 {
                words[j >> 6] |= 1 << (j & 63);
                j += 1;
            }
            lo <<= 1;
            hi = (hi << 1) + 1;
        }
        tbl[idx] = BitSet256::from_words(words);
        idx += 1;
    }
    tbl
}

const fn host_routes_tbl() -> [BitSet256; 256] {
    let mut tbl = [BitSet256::ZERO; 256];
    let mut idx = 1_usize;
    while idx < 256 {
        let (first, last) = super::art::idx_to_range(idx as u8);
        let mut words = [0_u64; 4];
        let mut o = first as usize;
        while o <= last as usize {
            words[o >> 6] |= 1 << (o & 63);
            o += 1;
        }
        tbl[idx] = BitSet256::from_words(words);
        idx += 1;
    }
    tbl
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trie::art::{idx_to_range, pfx_len};
    use crate::trie::lpm::LOOKUP;

    #[test]
    fn test_pfx_routes_against_ancestors() {
        // j is a descendant of idx exactly if idx is an ancestor of j
        for idx in 1..=255_u8 {
            for j in 1..=255_u8 {
                assert_eq!(
                    PFX_ROUTES[idx as usize].test(j),
                    LOOKUP[j as usize].test(idx),
                    "idx {} j {}",
                    idx,
                    j
                );
            }
        }
    }

    #[test]
    fn test_host_routes_is_range() {
        for idx in 1..=255_u8 {
            let (first, last) = idx_to_range(idx);
            let expected = last as usize - first as usize + 1;
            assert_eq!(HOST_ROUTES[idx as usize].popcount(), expected);
            assert_eq!(expected, 256 >> pfx_len(idx));
            assert!(HOST_ROUTES[idx as usize].test(first));
            assert!(HOST_ROUTES[idx as usize].test(last));
            if first > 0 {
                assert!(!HOST_ROUTES[idx as usize].test(first - 1));
            }
            if last < 255 {
                assert!(!HOST_ROUTES[idx as usize].test(last + 1));
            }
        }
    }

    #[test]
    fn test_default_route_allots_everything() {
        assert_eq!(PFX_ROUTES[1].popcount(), 255);
        assert_eq!(HOST_ROUTES[1].popcount(), 256);
    }
}
