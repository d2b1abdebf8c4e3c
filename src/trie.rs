//! Per-band binary prefix trie.
//!
//! A band trie has a fixed height `H`: every stored path is exactly `H` bits
//! long and ids live only at depth `H`. Nodes are created lazily on insert,
//! so a node exists exactly when some inserted path passes through it. A
//! missing child therefore plays the role of an untouched subtree, and
//! traversal stops at the first one it meets.
//!
//! Interior nodes are stored in one arena and leaves in another; children are
//! referenced by tagged 32-bit indices rather than owning pointers.

use smallvec::SmallVec;

use crate::bits::{BitString, MAX_WIDTH};
use crate::encoding::{put_varint, Reader};
use crate::error::{ConfigError, ParseError, ValidationError};
use crate::id::ItemId;

// =============================================================================
// Pointer type
// =============================================================================

/// Child reference: 32-bit tagged index.
///
/// - Bit 31 = 1: leaf (index into `leaves`)
/// - Bit 31 = 0: interior node (index into `nodes`)
/// - Special: 0xFFFF_FFFF = NULL (untouched)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Ptr(u32);

impl Ptr {
    const LEAF_BIT: u32 = 1u32 << 31;
    const INDEX_MASK: u32 = Self::LEAF_BIT - 1;
    const NULL: Ptr = Ptr(u32::MAX);

    #[inline]
    fn leaf(idx: usize) -> Self {
        debug_assert!(idx < Self::INDEX_MASK as usize);
        Self(idx as u32 | Self::LEAF_BIT)
    }

    #[inline]
    fn node(idx: usize) -> Self {
        debug_assert!(idx < Self::INDEX_MASK as usize);
        Self(idx as u32)
    }

    #[inline]
    fn is_null(self) -> bool {
        self == Self::NULL
    }

    #[inline]
    fn is_leaf(self) -> bool {
        !self.is_null() && (self.0 & Self::LEAF_BIT) != 0
    }

    #[inline]
    fn index(self) -> usize {
        debug_assert!(!self.is_null());
        (self.0 & Self::INDEX_MASK) as usize
    }
}

type Payload<I> = SmallVec<[I; 2]>;

// =============================================================================
// BandTrie
// =============================================================================

/// Binary prefix trie over fixed-height bit-strings for one band.
#[derive(Clone, Debug)]
pub struct BandTrie<I> {
    height: u8,
    root: Ptr,
    /// Interior nodes: `[left, right]` children.
    nodes: Vec<[Ptr; 2]>,
    /// Leaf payloads, in insertion order. Duplicates are kept.
    leaves: Vec<Payload<I>>,
    entries: usize,
}

impl<I: ItemId> BandTrie<I> {
    /// Create an empty trie accepting bit-strings of exactly `height` bits.
    pub fn new(height: u8) -> Result<Self, ConfigError> {
        if height == 0 || usize::from(height) > MAX_WIDTH {
            return Err(ConfigError::Height(height));
        }
        Ok(Self::empty(height))
    }

    pub(crate) fn empty(height: u8) -> Self {
        debug_assert!(height >= 1 && usize::from(height) <= MAX_WIDTH);
        Self {
            height,
            root: Ptr::NULL,
            nodes: Vec::new(),
            leaves: Vec::new(),
            entries: 0,
        }
    }

    #[inline]
    pub fn height(&self) -> u8 {
        self.height
    }

    /// Number of ids stored, counting duplicates.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    /// Number of distinct leaf paths holding at least one id.
    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Number of touched nodes, interior and leaf.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len() + self.leaves.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_null()
    }

    pub fn memory_usage(&self) -> usize {
        let spilled: usize = self
            .leaves
            .iter()
            .filter(|p| p.spilled())
            .map(|p| p.capacity() * std::mem::size_of::<I>())
            .sum();
        self.nodes.capacity() * std::mem::size_of::<[Ptr; 2]>()
            + self.leaves.capacity() * std::mem::size_of::<Payload<I>>()
            + spilled
    }

    pub(crate) fn check_len(&self, bits: &BitString) -> Result<(), ValidationError> {
        if bits.len() != usize::from(self.height) {
            return Err(ValidationError::BitLength {
                band: 0,
                expected: usize::from(self.height),
                got: bits.len(),
            });
        }
        Ok(())
    }

    /// Mark every node along `bits` as touched and append `id` to the leaf.
    pub fn insert(&mut self, bits: &BitString, id: I) -> Result<(), ValidationError> {
        self.check_len(bits)?;
        self.insert_unchecked(bits, id);
        Ok(())
    }

    /// Insert without re-checking the length. Callers must have validated it.
    pub(crate) fn insert_unchecked(&mut self, bits: &BitString, id: I) {
        debug_assert_eq!(bits.len(), usize::from(self.height));

        if self.root.is_null() {
            self.root = Ptr::node(self.alloc_node());
        }

        let last = usize::from(self.height) - 1;
        let mut current = self.root.index();
        for depth in 0..=last {
            let dir = usize::from(bits.bit(depth));
            let mut child = self.nodes[current][dir];
            if child.is_null() {
                child = if depth == last {
                    self.alloc_leaf()
                } else {
                    Ptr::node(self.alloc_node())
                };
                self.nodes[current][dir] = child;
            }
            if depth == last {
                debug_assert!(child.is_leaf());
                self.leaves[child.index()].push(id);
                self.entries += 1;
                return;
            }
            current = child.index();
        }
    }

    /// Follow `bits` from the root and return the ids at the leaf.
    ///
    /// Stops at the first untouched node and returns an empty slice. The
    /// result may also be empty when the full path was never inserted.
    pub fn traverse(&self, bits: &BitString) -> Result<&[I], ValidationError> {
        self.check_len(bits)?;
        Ok(self.traverse_unchecked(bits))
    }

    pub(crate) fn traverse_unchecked(&self, bits: &BitString) -> &[I] {
        let mut ptr = self.root;
        for depth in 0..usize::from(self.height) {
            if ptr.is_null() {
                return &[];
            }
            ptr = self.nodes[ptr.index()][usize::from(bits.bit(depth))];
        }
        if ptr.is_null() {
            return &[];
        }
        debug_assert!(ptr.is_leaf());
        &self.leaves[ptr.index()]
    }

    /// Whether some inserted path starts with the first `prefix_len` bits of
    /// `bits`. A zero-length prefix is touched once anything was inserted.
    pub fn is_touched(&self, bits: &BitString, prefix_len: usize) -> bool {
        let mut ptr = self.root;
        for depth in 0..prefix_len.min(bits.len()).min(usize::from(self.height)) {
            if ptr.is_null() {
                return false;
            }
            ptr = self.nodes[ptr.index()][usize::from(bits.bit(depth))];
        }
        !ptr.is_null()
    }

    /// All stored leaves in ascending bit order.
    pub fn iter(&self) -> Iter<'_, I> {
        let mut stack = Vec::new();
        if !self.root.is_null() {
            stack.push((self.root, 0u8, 0u64));
        }
        Iter { trie: self, stack }
    }

    fn alloc_node(&mut self) -> usize {
        self.nodes.push([Ptr::NULL, Ptr::NULL]);
        self.nodes.len() - 1
    }

    fn alloc_leaf(&mut self) -> Ptr {
        self.leaves.push(SmallVec::new());
        Ptr::leaf(self.leaves.len() - 1)
    }
}

impl<I: ItemId> PartialEq for BandTrie<I> {
    /// Same height and same ids at the same paths. Arena layout is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.height == other.height && self.iter().eq(other.iter())
    }
}

impl<I: ItemId> Eq for BandTrie<I> {}

pub struct Iter<'a, I> {
    trie: &'a BandTrie<I>,
    /// (pointer, depth, path bits so far)
    stack: Vec<(Ptr, u8, u64)>,
}

impl<'a, I: ItemId> Iterator for Iter<'a, I> {
    type Item = (BitString, &'a [I]);

    fn next(&mut self) -> Option<Self::Item> {
        let height = self.trie.height;
        while let Some((ptr, depth, path)) = self.stack.pop() {
            if depth == height {
                let bits = BitString::from_u64(path, usize::from(height)).ok()?;
                return Some((bits, &self.trie.leaves[ptr.index()]));
            }

            let [left, right] = self.trie.nodes[ptr.index()];
            if !right.is_null() {
                self.stack.push((right, depth + 1, (path << 1) | 1));
            }
            if !left.is_null() {
                self.stack.push((left, depth + 1, path << 1));
            }
        }
        None
    }
}

// =============================================================================
// Persistence
// =============================================================================
//
// Pre-order walk. `0` for an empty trie, otherwise `1` followed by the root.
// Interior node: child mask byte (bit 0 = left, bit 1 = right), never zero.
// Leaf: varint id count (never zero), then each id.

const EMPTY_TAG: u8 = 0;
const ROOT_TAG: u8 = 1;
const LEFT_MASK: u8 = 0b01;
const RIGHT_MASK: u8 = 0b10;

impl<I: ItemId> BandTrie<I> {
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        if self.root.is_null() {
            buf.push(EMPTY_TAG);
            return;
        }
        buf.push(ROOT_TAG);

        let mut stack = vec![(self.root, 0u8)];
        while let Some((ptr, depth)) = stack.pop() {
            if depth == self.height {
                let payload = &self.leaves[ptr.index()];
                put_varint(payload.len() as u64, buf);
                for id in payload {
                    id.encode(buf);
                }
                continue;
            }

            let [left, right] = self.nodes[ptr.index()];
            let mut mask = 0u8;
            if !left.is_null() {
                mask |= LEFT_MASK;
            }
            if !right.is_null() {
                mask |= RIGHT_MASK;
                stack.push((right, depth + 1));
            }
            if !left.is_null() {
                stack.push((left, depth + 1));
            }
            buf.push(mask);
        }
    }

    pub(crate) fn decode_from(
        height: u8,
        r: &mut Reader<'_>,
        band: usize,
    ) -> Result<Self, ParseError> {
        let corrupt = |reason| ParseError::CorruptTree { band, reason };
        let mut trie = Self::new(height).map_err(|_| ParseError::InvalidHeight(height))?;

        match r.u8()? {
            EMPTY_TAG => return Ok(trie),
            ROOT_TAG => {}
            _ => return Err(corrupt("bad root tag")),
        }

        // Slots waiting to be filled: (parent node and side, depth).
        let mut stack: Vec<(Option<(usize, usize)>, u8)> = vec![(None, 0)];
        while let Some((slot, depth)) = stack.pop() {
            let ptr = if depth == height {
                let count = r.varint()?;
                if count == 0 {
                    return Err(corrupt("empty leaf"));
                }
                // Every id takes at least one byte.
                if count > r.remaining() as u64 {
                    return Err(ParseError::Truncated {
                        offset: r.position(),
                        needed: (count - r.remaining() as u64) as usize,
                    });
                }
                let leaf = trie.alloc_leaf();
                for _ in 0..count {
                    let id = I::decode(r)?;
                    trie.leaves[leaf.index()].push(id);
                }
                trie.entries += count as usize;
                leaf
            } else {
                let mask = r.u8()?;
                if mask == 0 || mask > (LEFT_MASK | RIGHT_MASK) {
                    return Err(corrupt("bad child mask"));
                }
                let idx = trie.alloc_node();
                if mask & RIGHT_MASK != 0 {
                    stack.push((Some((idx, 1)), depth + 1));
                }
                if mask & LEFT_MASK != 0 {
                    stack.push((Some((idx, 0)), depth + 1));
                }
                Ptr::node(idx)
            };

            match slot {
                None => trie.root = ptr,
                Some((parent, side)) => trie.nodes[parent][side] = ptr,
            }
        }

        Ok(trie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(s: &str) -> BitString {
        BitString::parse(s).unwrap()
    }

    #[test]
    fn test_insert_traverse() {
        let mut t: BandTrie<u64> = BandTrie::new(4).unwrap();
        t.insert(&b("1010"), 1).unwrap();
        t.insert(&b("1011"), 2).unwrap();

        assert_eq!(t.traverse(&b("1010")).unwrap(), &[1]);
        assert_eq!(t.traverse(&b("1011")).unwrap(), &[2]);
        assert!(t.traverse(&b("1001")).unwrap().is_empty());
        assert_eq!(t.entry_count(), 2);
        assert_eq!(t.leaf_count(), 2);
        // root, 1, 10, 101 plus two leaves
        assert_eq!(t.node_count(), 6);
    }

    #[test]
    fn test_duplicates_are_kept_in_order() {
        let mut t: BandTrie<u64> = BandTrie::new(3).unwrap();
        t.insert(&b("001"), 7).unwrap();
        t.insert(&b("001"), 3).unwrap();
        t.insert(&b("001"), 7).unwrap();
        assert_eq!(t.traverse(&b("001")).unwrap(), &[7, 3, 7]);
        assert_eq!(t.leaf_count(), 1);
        assert_eq!(t.entry_count(), 3);
    }

    #[test]
    fn test_untouched_prefix() {
        let mut t: BandTrie<u64> = BandTrie::new(4).unwrap();
        assert!(t.traverse(&b("0000")).unwrap().is_empty());

        t.insert(&b("1100"), 1).unwrap();
        assert!(t.is_touched(&b("1100"), 0));
        assert!(t.is_touched(&b("1111"), 2));
        assert!(!t.is_touched(&b("1111"), 3));
        assert!(!t.is_touched(&b("0000"), 1));
        assert!(t.traverse(&b("0111")).unwrap().is_empty());
        assert!(t.traverse(&b("1101")).unwrap().is_empty());
    }

    #[test]
    fn test_length_mismatch() {
        let mut t: BandTrie<u64> = BandTrie::new(4).unwrap();
        let err = t.insert(&b("101"), 1).unwrap_err();
        assert_eq!(
            err,
            ValidationError::BitLength {
                band: 0,
                expected: 4,
                got: 3
            }
        );
        assert!(t.is_empty());
        assert!(t.traverse(&b("10101")).is_err());
    }

    #[test]
    fn test_invalid_height() {
        assert_eq!(BandTrie::<u64>::new(0).unwrap_err(), ConfigError::Height(0));
        assert_eq!(BandTrie::<u64>::new(65).unwrap_err(), ConfigError::Height(65));
        assert!(BandTrie::<u64>::new(64).is_ok());
    }

    #[test]
    fn test_height_one() {
        let mut t: BandTrie<u64> = BandTrie::new(1).unwrap();
        t.insert(&b("1"), 5).unwrap();
        assert_eq!(t.traverse(&b("1")).unwrap(), &[5]);
        assert!(t.traverse(&b("0")).unwrap().is_empty());
    }

    #[test]
    fn test_iter_sorted() {
        let mut t: BandTrie<u64> = BandTrie::new(3).unwrap();
        t.insert(&b("110"), 1).unwrap();
        t.insert(&b("000"), 2).unwrap();
        t.insert(&b("011"), 3).unwrap();
        t.insert(&b("000"), 4).unwrap();

        let got: Vec<(String, Vec<u64>)> = t
            .iter()
            .map(|(bits, ids)| (bits.to_string(), ids.to_vec()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("000".to_string(), vec![2, 4]),
                ("011".to_string(), vec![3]),
                ("110".to_string(), vec![1]),
            ]
        );
    }

    #[test]
    fn test_blob_layout() {
        let mut t: BandTrie<u64> = BandTrie::new(2).unwrap();
        t.insert(&b("10"), 9).unwrap();
        let mut buf = Vec::new();
        t.encode_into(&mut buf);
        // root tag, root mask (right), node "1" mask (left), leaf: 1 id = 9
        assert_eq!(buf, vec![ROOT_TAG, RIGHT_MASK, LEFT_MASK, 1, 9]);

        let mut empty = Vec::new();
        BandTrie::<u64>::new(2).unwrap().encode_into(&mut empty);
        assert_eq!(empty, vec![EMPTY_TAG]);
    }

    #[test]
    fn test_blob_decode() {
        let mut t: BandTrie<String> = BandTrie::new(5).unwrap();
        t.insert(&b("10101"), "a".into()).unwrap();
        t.insert(&b("10100"), "b".into()).unwrap();
        t.insert(&b("00000"), "c".into()).unwrap();
        t.insert(&b("10101"), "a".into()).unwrap();

        let mut buf = Vec::new();
        t.encode_into(&mut buf);
        let mut r = Reader::new(&buf);
        let back = BandTrie::<String>::decode_from(5, &mut r, 0).unwrap();
        assert_eq!(r.remaining(), 0);
        assert_eq!(back, t);
        assert_eq!(back.entry_count(), 4);
        assert_eq!(back.node_count(), t.node_count());
        assert_eq!(back.traverse(&b("10101")).unwrap(), &["a", "a"]);
    }

    #[test]
    fn test_blob_corrupt() {
        let decode = |bytes: &[u8]| {
            let mut r = Reader::new(bytes);
            BandTrie::<u64>::decode_from(2, &mut r, 3)
        };
        assert_eq!(
            decode(&[7]),
            Err(ParseError::CorruptTree {
                band: 3,
                reason: "bad root tag"
            })
        );
        assert_eq!(
            decode(&[ROOT_TAG, 0]),
            Err(ParseError::CorruptTree {
                band: 3,
                reason: "bad child mask"
            })
        );
        assert_eq!(
            decode(&[ROOT_TAG, LEFT_MASK, LEFT_MASK, 0]),
            Err(ParseError::CorruptTree {
                band: 3,
                reason: "empty leaf"
            })
        );
        assert!(matches!(
            decode(&[ROOT_TAG, LEFT_MASK, LEFT_MASK, 5, 1]),
            Err(ParseError::Truncated { .. })
        ));
        assert!(matches!(
            decode(&[ROOT_TAG, LEFT_MASK | RIGHT_MASK, LEFT_MASK, 1, 1]),
            Err(ParseError::Truncated { .. })
        ));
    }
}
