//! Merging of the exploitation and exploration streams.
//!
//! Both patterns stop as soon as the stream they ask for is exhausted.

fn interleave_by<T>(exploit: Vec<T>, explore: Vec<T>, takes_exploit: impl Fn(usize) -> bool) -> Vec<T> {
    let total = exploit.len() + explore.len();
    let mut exploit = exploit.into_iter();
    let mut explore = explore.into_iter();
    let mut merged = Vec::with_capacity(total);
    for i in 0..total {
        let next = if takes_exploit(i) { exploit.next() } else { explore.next() };
        match next {
            Some(item) => merged.push(item),
            None => break,
        }
    }
    merged
}

/// One exploit item, then `leaf_size` explore items, repeated.
pub fn interleave_alternating<T>(exploit: Vec<T>, explore: Vec<T>, leaf_size: usize) -> Vec<T> {
    let period = leaf_size.saturating_add(1);
    interleave_by(exploit, explore, |i| i % period == 0)
}

/// `leaf_size` exploit items, then `leaf_size` explore items, repeated.
pub fn interleave_blocks<T>(exploit: Vec<T>, explore: Vec<T>, leaf_size: usize) -> Vec<T> {
    let block = leaf_size.max(1);
    let period = block.saturating_mul(2);
    interleave_by(exploit, explore, |i| i % period < block)
}
