/// Number of bits needed to store any id in `0..count`.
///
/// ```text
/// count -> max(1, ceil(log2(count)))
/// ```
pub fn bits_for(count: usize) -> u32 {
    if count <= 2 {
        1
    } else {
        usize::BITS - (count - 1).leading_zeros()
    }
}

/// Packs two ids into one `u64`, smaller id in the low bits.
///
/// ```text
/// (a, b) -> min(a, b) | max(a, b) << bits
/// ```
pub fn pack2(a: u64, b: u64, bits: u32) -> u64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    lo | (hi << bits)
}

/// Packs three ids into one `u64`, sorted ascending from the low bits.
pub fn pack3(ids: [u64; 3], bits: u32) -> u64 {
    let mut ids = ids;
    ids.sort_unstable();
    ids[0] | (ids[1] << bits) | (ids[2] << (2 * bits))
}

/// All non-empty subsets of `items`, each preserving the original order.
pub fn non_empty_subsets<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    assert!(items.len() < 32, "Too many items to enumerate subsets");
    (1u32..(1 << items.len()))
        .map(|mask| {
            items
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, x)| x.clone())
                .collect()
        })
        .collect()
}

/// All permutations of `items` (Heap's algorithm).
pub fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    fn heap<T: Clone>(k: usize, xs: &mut Vec<T>, out: &mut Vec<Vec<T>>) {
        if k <= 1 {
            out.push(xs.clone());
            return;
        }
        heap(k - 1, xs, out);
        for i in 0..k - 1 {
            if k % 2 == 0 {
                xs.swap(i, k - 1);
            } else {
                xs.swap(0, k - 1);
            }
            heap(k - 1, xs, out);
        }
    }

    let mut xs = items.to_vec();
    let mut out = Vec::new();
    heap(xs.len(), &mut xs, &mut out);
    out
}

/// All injective maps from `0..k` into `0..n`, as image vectors.
pub fn injections(k: usize, n: usize) -> Vec<Vec<usize>> {
    fn go(k: usize, n: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in 0..n {
            if !current.contains(&i) {
                current.push(i);
                go(k, n, current, out);
                current.pop();
            }
        }
    }

    let mut out = Vec::new();
    if k <= n {
        go(k, n, &mut Vec::with_capacity(k), &mut out);
    }
    out
}

/// Cartesian product of several choice lists.
pub fn cartesian<T: Clone>(lists: &[Vec<T>]) -> Vec<Vec<T>> {
    lists.iter().fold(vec![Vec::new()], |acc, list| {
        acc.iter()
            .flat_map(|prefix| {
                list.iter().map(move |x| {
                    let mut v = prefix.clone();
                    v.push(x.clone());
                    v
                })
            })
            .collect()
    })
}

/// Is the sorted slice `small` contained in the sorted slice `big`?
pub fn is_sorted_subset<T: Ord>(small: &[T], big: &[T]) -> bool {
    if small.len() > big.len() {
        return false;
    }
    let mut it = big.iter();
    'outer: for x in small {
        for y in it.by_ref() {
            match y.cmp(x) {
                std::cmp::Ordering::Less => continue,
                std::cmp::Ordering::Equal => continue 'outer,
                std::cmp::Ordering::Greater => return false,
            }
        }
        return false;
    }
    true
}

/// Keeps only the entries whose key is minimal.
///
/// Returns the minimal key together with all values that attain it.
pub fn min_ties<K: Ord, V>(items: impl IntoIterator<Item = (K, V)>) -> Option<(K, Vec<V>)> {
    let mut best: Option<(K, Vec<V>)> = None;
    for (key, value) in items {
        match &mut best {
            None => best = Some((key, vec![value])),
            Some((k, vs)) => match key.cmp(k) {
                std::cmp::Ordering::Less => best = Some((key, vec![value])),
                std::cmp::Ordering::Equal => vs.push(value),
                std::cmp::Ordering::Greater => {}
            },
        }
    }
    best
}
