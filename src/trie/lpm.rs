use crate::trie::bitset256::BitSet256;

//------------ LPM lookup table ----------------------------------------------

// For every CBT index, the set of its ancestors up to and including the
// stride's default route at index 1 (and including the index itself). A
// node resolves its in-stride longest match with a single
// `intersection_top` of its prefix bitset against one of these masks; no
// backtracking happens inside a stride.

pub(crate) static LOOKUP: [BitSet256; 256] = lookup_tbl();

const fn lookup_tbl() -> [BitSet256; 256] {
    let mut tbl = [BitSet256::ZERO; 256];
    let mut idx = 1_usize;
    while idx < 256 {
        let mut words = [0_u64; 4];
        let mut a = idx;
        while a > 0 {
            words[a >> 6] |= 1 << (a & 63);
            a >>= 1;
        }
        tbl[idx] = BitSet256::from_words(words);
        idx += 1;
    }
    tbl
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ancestor_chains() {
        // index 1 is its own only ancestor
        assert_eq!(LOOKUP[1].popcount(), 1);
        assert!(LOOKUP[1].test(1));

        // 200 = 0b11001000: chain 200, 100, 50, 25, 12, 6, 3, 1
        let expected = [200_u8, 100, 50, 25, 12, 6, 3, 1];
        assert_eq!(LOOKUP[200].popcount(), expected.len());
        for a in expected {
            assert!(LOOKUP[200].test(a));
        }
    }

    #[test]
    fn test_depth_equals_chain_length() {
        for idx in 1..=255_u8 {
            let depth = 8 - idx.leading_zeros() as usize;
            assert_eq!(LOOKUP[idx as usize].popcount(), depth);
        }
    }
}
