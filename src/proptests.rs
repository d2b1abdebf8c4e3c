use super::*;

use proptest::prelude::*;
use std::collections::HashSet;

/// Naive reference: every insert kept as a flat record.
struct Model {
    bands: usize,
    height: u8,
    items: Vec<(u16, Vec<u64>)>,
}

impl Model {
    fn candidates(&self, query: &[u64]) -> Vec<Vec<u16>> {
        (0..self.bands)
            .map(|band| {
                self.items
                    .iter()
                    .filter(|(_, fp)| fp[band] == query[band])
                    .map(|(id, _)| *id)
                    .collect()
            })
            .collect()
    }
}

fn to_bits(values: &[u64], height: u8) -> Vec<BitString> {
    values
        .iter()
        .map(|&v| BitString::from_u64(v, usize::from(height)).unwrap())
        .collect()
}

fn validate_index(ix: &BandedIndex<u16>, m: &Model) {
    assert_eq!(ix.bands(), m.bands);
    assert_eq!(ix.height(), m.height);
    assert_eq!(ix.len(), m.items.len());

    let h = usize::from(m.height);
    for (band, trie) in ix.tries().iter().enumerate() {
        let mut paths: HashSet<u64> = HashSet::new();
        let mut prefixes: HashSet<(usize, u64)> = HashSet::new();
        for (_, fp) in &m.items {
            paths.insert(fp[band]);
            for len in 0..=h {
                prefixes.insert((len, fp[band] >> (h - len)));
            }
        }

        assert_eq!(trie.entry_count(), m.items.len());
        assert_eq!(trie.leaf_count(), paths.len(), "band {band}: one leaf per distinct path");
        assert_eq!(
            trie.node_count(),
            prefixes.len(),
            "band {band}: exactly the touched prefixes have nodes"
        );

        let mut prev: Option<u64> = None;
        for (bits, ids) in trie.iter() {
            assert!(!ids.is_empty(), "reachable leaf must hold ids");
            assert!(prev.map_or(true, |p| p < bits.as_u64()), "leaves must iterate in order");
            prev = Some(bits.as_u64());
        }
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(u16, Vec<u64>),
    Search(Vec<u64>),
    Reload,
}

#[derive(Clone, Debug)]
struct Case {
    bands: usize,
    height: u8,
    threshold: usize,
    ops: Vec<Op>,
}

fn case_strategy() -> impl Strategy<Value = Case> {
    (1usize..=4, 1u8..=6)
        .prop_flat_map(|(bands, height)| {
            let fp = prop::collection::vec(0u64..(1u64 << height), bands);
            let op = prop_oneof![
                // Few ids so repeats and shared leaves are common.
                50 => (0u16..16, fp.clone()).prop_map(|(id, fp)| Op::Insert(id, fp)),
                45 => fp.prop_map(Op::Search),
                5 => Just(Op::Reload),
            ];
            (
                Just(bands),
                Just(height),
                1usize..=bands,
                prop::collection::vec(op, 0..=300),
            )
        })
        .prop_map(|(bands, height, threshold, ops)| Case {
            bands,
            height,
            threshold,
            ops,
        })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(case in case_strategy()) {
        let config = IndexConfig::new(case.bands, case.height, case.threshold);
        let s: TrieSearch<u16> = TrieSearch::new(config).unwrap();
        let mut m = Model { bands: case.bands, height: case.height, items: Vec::new() };

        for op in case.ops {
            match op {
                Op::Insert(id, fp) => {
                    s.insert(id, &to_bits(&fp, case.height)).unwrap();
                    m.items.push((id, fp));
                }
                Op::Search(fp) => {
                    let q = to_bits(&fp, case.height);
                    let expected = m.candidates(&fp);
                    prop_assert_eq!(&s.search_candidates(&q).unwrap(), &expected);
                    prop_assert_eq!(s.search(&q).unwrap(), vote(&expected, case.threshold));
                }
                Op::Reload => {
                    let bytes = s.get_persisted_form();
                    s.load_persisted_form(&bytes).unwrap();
                }
            }
        }

        validate_index(&s.snapshot(), &m);
    }

    #[test]
    fn prop_inserted_items_are_found(case in case_strategy()) {
        let mut ix: BandedIndex<u16> = BandedIndex::new(case.bands, case.height).unwrap();
        let mut inserted = Vec::new();
        for op in case.ops {
            if let Op::Insert(id, fp) = op {
                ix.insert(id, &to_bits(&fp, case.height)).unwrap();
                inserted.push((id, fp));
            }
        }
        let ix: BandedIndex<u16> = decode_index(&encode_index(&ix)).unwrap();
        for (id, fp) in inserted {
            let hits = ix.search(&to_bits(&fp, case.height)).unwrap();
            prop_assert!(vote(&hits, case.threshold).contains(&id));
        }
    }

    #[test]
    fn prop_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..=256)) {
        let _ = decode_index::<u16>(&bytes);
        let _ = decode_index::<String>(&bytes);
    }

    #[test]
    fn prop_corrupted_encoding_never_panics(
        case in case_strategy(),
        pos in any::<prop::sample::Index>(),
        byte in any::<u8>(),
    ) {
        let mut ix: BandedIndex<u16> = BandedIndex::new(case.bands, case.height).unwrap();
        for op in case.ops {
            if let Op::Insert(id, fp) = op {
                ix.insert(id, &to_bits(&fp, case.height)).unwrap();
            }
        }
        let mut bytes = encode_index(&ix);
        let at = pos.index(bytes.len());
        bytes[at] = byte;
        if let Ok(back) = decode_index::<u16>(&bytes) {
            let declared = u32::from_le_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]);
            prop_assert_eq!(back.bands(), declared as usize);
        }
    }
}

#[test]
fn exhaustive_small_space() {
    // Every 2-bit fingerprint pair in a 2-band index.
    let mut ix: BandedIndex<u16> = BandedIndex::new(2, 2).unwrap();
    let mut id = 0u16;
    for a in 0..4u64 {
        for b in 0..4u64 {
            ix.insert(id, &to_bits(&[a, b], 2)).unwrap();
            id += 1;
        }
    }
    for trie in ix.tries() {
        assert_eq!(trie.node_count(), 7);
        assert_eq!(trie.leaf_count(), 4);
    }
    for a in 0..4u64 {
        for b in 0..4u64 {
            let hits = ix.search(&to_bits(&[a, b], 2)).unwrap();
            assert_eq!(vote(&hits, 2), vec![(a * 4 + b) as u16]);
            assert_eq!(vote(&hits, 1).len(), 7);
        }
    }
}
