/// Cartesian product of `lists`, in odometer order, truncated after `limit` tuples.
pub(crate) fn bounded_product<T: Clone>(lists: &[Vec<T>], limit: usize) -> Vec<Vec<T>> {
    if lists.is_empty() || lists.iter().any(|l| l.is_empty()) {
        return Vec::new();
    }
    let mut counters = vec![0usize; lists.len()];
    let mut tuples = Vec::new();
    while tuples.len() < limit {
        tuples.push(
            counters
                .iter()
                .zip(lists)
                .map(|(&i, list)| list[i].clone())
                .collect(),
        );
        let mut position = lists.len();
        loop {
            if position == 0 {
                return tuples;
            }
            position -= 1;
            counters[position] += 1;
            if counters[position] < lists[position].len() {
                break;
            }
            counters[position] = 0;
        }
    }
    tuples
}

/// Permutations of `items` in lexicographic order of positions, at most `limit` of them.
pub(crate) fn bounded_permutations<T: Clone>(items: &[T], limit: usize) -> Vec<Vec<T>> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    let mut permutations = Vec::new();
    while permutations.len() < limit {
        permutations.push(order.iter().map(|&i| items[i].clone()).collect());
        if !next_permutation(&mut order) {
            break;
        }
    }
    permutations
}

fn next_permutation(order: &mut [usize]) -> bool {
    let Some(pivot) = (1..order.len()).rev().find(|&i| order[i - 1] < order[i]) else {
        return false;
    };
    let pivot = pivot - 1;
    let Some(successor) = (pivot + 1..order.len()).rev().find(|&j| order[j] > order[pivot]) else {
        return false;
    };
    order.swap(pivot, successor);
    order[pivot + 1..].reverse();
    true
}
