//! Cross-band voting.

use std::collections::HashMap;

/// Return every id whose total hit count across `bands` is at least
/// `threshold`.
///
/// Each occurrence counts, so an id stored twice in one leaf contributes two
/// hits from that band. Output is in first-seen order: bands in index order,
/// then payload order within a band.
pub fn vote<I, B>(bands: &[B], threshold: usize) -> Vec<I>
where
    I: Clone + Eq + std::hash::Hash,
    B: AsRef<[I]>,
{
    let mut slot: HashMap<&I, usize> = HashMap::new();
    let mut tally: Vec<(&I, usize)> = Vec::new();

    for band in bands {
        for id in band.as_ref() {
            match slot.get(id) {
                Some(&i) => tally[i].1 += 1,
                None => {
                    slot.insert(id, tally.len());
                    tally.push((id, 1));
                }
            }
        }
    }

    tally
        .into_iter()
        .filter(|&(_, hits)| hits >= threshold)
        .map(|(id, _)| id.clone())
        .collect()
}
