use rand::Rng;

/// Draw `count` distinct items uniformly at random, without replacement.
///
/// Runs a partial Fisher-Yates shuffle: only the first `count` slots are
/// settled, so the cost is O(count) swaps regardless of how many items are
/// left behind. Returns `None` when fewer than `count` items are available.
pub fn draw_distinct<T, R>(mut items: Vec<T>, count: usize, rng: &mut R) -> Option<Vec<T>>
where
    R: Rng + ?Sized,
{
    if items.len() < count {
        return None;
    }

    for i in 0..count {
        let j = rng.random_range(i..items.len());
        items.swap(i, j);
    }

    items.truncate(count);
    Some(items)
}
