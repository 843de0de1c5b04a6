//! Sequence alignment between source and target token sequences.
//!
//! Classic dynamic-programming longest common subsequence, generalized to
//! arbitrary comparable elements, so the alignment can be tested against
//! classic LCS properties independently of any tagging logic.

/// Longest common subsequence of `a` against `b`.
///
/// Returns `(index_in_a, index_in_b)` pairs, strictly increasing in both
/// components and maximal in number. Elements are considered equal only
/// on exact match; there is no fuzzy matching of any kind.
pub fn longest_common_subsequence<T: Eq>(a: &[T], b: &[T]) -> Vec<(usize, usize)> {
    let n = a.len();
    let m = b.len();
    let width = m + 1;

    // dp[i * width + j] = LCS length of a[i..] and b[j..].
    let mut dp = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            dp[i * width + j] = if a[i] == b[j] {
                dp[(i + 1) * width + j + 1] + 1
            } else {
                dp[(i + 1) * width + j].max(dp[i * width + j + 1])
            };
        }
    }

    // Matching an equal pair at the frontier is always optimal; on ties
    // between skip directions, advancing in `a` keeps the result stable.
    let mut pairs = Vec::with_capacity(dp[0] as usize);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if dp[(i + 1) * width + j] >= dp[i * width + j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_identical_sequences_match_fully() {
        let a = ["the", "cat", "sat"];
        let pairs = longest_common_subsequence(&a, &a);
        assert_eq!(pairs, vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn test_empty_sequences() {
        let a: [&str; 0] = [];
        let b = ["x"];
        assert!(longest_common_subsequence(&a, &b).is_empty());
        assert!(longest_common_subsequence(&b, &a).is_empty());
        assert!(longest_common_subsequence(&a, &a).is_empty());
    }

    #[test]
    fn test_insertion_gap() {
        let a = ["cat", "sat", "."];
        let b = ["the", "cat", "sat", "."];
        let pairs = longest_common_subsequence(&a, &b);
        assert_eq!(pairs, vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn test_deletion_and_match() {
        let a = ["a", "b", "c", "d"];
        let b = ["a", "c", "d"];
        let pairs = longest_common_subsequence(&a, &b);
        assert_eq!(pairs, vec![(0, 0), (2, 1), (3, 2)]);
    }

    #[test]
    fn test_exact_match_only() {
        let a = ["The"];
        let b = ["the"];
        assert!(longest_common_subsequence(&a, &b).is_empty());
    }

    #[test]
    fn test_repeated_elements() {
        let a = ["a", "a", "b", "a"];
        let b = ["a", "b", "a", "a"];
        let pairs = longest_common_subsequence(&a, &b);
        for w in pairs.windows(2) {
            assert!(w[0].0 < w[1].0);
            assert!(w[0].1 < w[1].1);
        }
        for &(i, j) in &pairs {
            assert_eq!(a[i], b[j]);
        }
        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn test_repeated_run_beats_earlier_single_match() {
        // The length-3 run of "b" is the LCS; a greedy block matcher that
        // commits to the early "a b" match would only find 2 pairs.
        let a = ["a", "b", "b", "b"];
        let b = ["b", "b", "a", "b"];
        let pairs = longest_common_subsequence(&a, &b);
        assert_eq!(pairs.len(), 3);
        for &(i, j) in &pairs {
            assert_eq!(a[i], "b");
            assert_eq!(b[j], "b");
        }
    }

    fn is_subsequence(needle: &[u8], hay: &[u8]) -> bool {
        let mut it = hay.iter();
        needle.iter().all(|x| it.any(|y| y == x))
    }

    proptest! {
        #[test]
        fn prop_result_is_common_subsequence(
            a in proptest::collection::vec(0u8..4, 0..24),
            b in proptest::collection::vec(0u8..4, 0..24),
        ) {
            let pairs = longest_common_subsequence(&a, &b);
            for w in pairs.windows(2) {
                prop_assert!(w[0].0 < w[1].0);
                prop_assert!(w[0].1 < w[1].1);
            }
            for &(i, j) in &pairs {
                prop_assert_eq!(a[i], b[j]);
            }
        }

        #[test]
        fn prop_result_is_maximal(
            a in proptest::collection::vec(0u8..3, 0..10),
            b in proptest::collection::vec(0u8..3, 0..12),
        ) {
            let got = longest_common_subsequence(&a, &b).len();
            // Exhaustive check over every subsequence of `a`.
            let mut best = 0;
            for mask in 0u32..(1 << a.len()) {
                let cand: Vec<u8> = a
                    .iter()
                    .enumerate()
                    .filter(|(k, _)| mask >> k & 1 == 1)
                    .map(|(_, &v)| v)
                    .collect();
                if cand.len() > best && is_subsequence(&cand, &b) {
                    best = cand.len();
                }
            }
            prop_assert_eq!(got, best);
        }

        #[test]
        fn prop_identity_alignment_is_complete(
            a in proptest::collection::vec(0u8..4, 0..24),
        ) {
            let pairs = longest_common_subsequence(&a, &a);
            prop_assert_eq!(pairs.len(), a.len());
            for (k, &(i, j)) in pairs.iter().enumerate() {
                prop_assert_eq!((i, j), (k, k));
            }
        }
    }
}
