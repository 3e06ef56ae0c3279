//! Guess scoring
//!
//! Classic MasterMind rule: exact matches are removed first, then each
//! remaining guess entry is paired with at most one remaining secret entry
//! of the same colour. Every entry on either side is consumed at most once,
//! so duplicates never double count.

use core::fmt;

use crate::game::sequence::Sequence;

/// Exact and approximate match counts for one guess
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatchResult {
    /// Right colour, right position
    pub exact: u8,
    /// Right colour, wrong position
    pub approximate: u8,
}

impl MatchResult {
    /// Packed form: `exact` in the high nibble, `approximate` in the low
    pub fn code(self) -> u8 {
        (self.exact << 4) | (self.approximate & 0x0F)
    }

    pub fn from_code(code: u8) -> Self {
        Self {
            exact: code >> 4,
            approximate: code & 0x0F,
        }
    }

    /// Whether every one of `length` positions matched exactly
    pub fn is_solved(self, length: usize) -> bool {
        self.exact as usize == length
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} exact, {} approximate", self.exact, self.approximate)
    }
}

/// Score `guess` against `secret`
///
/// Positions beyond the shorter of the two sequences are ignored.
pub fn count_matches(secret: &Sequence, guess: &Sequence) -> MatchResult {
    let secret = secret.as_slice();
    let guess = guess.as_slice();
    let n = secret.len().min(guess.len());

    let mut secret_used = vec![false; n];
    let mut guess_used = vec![false; n];
    let mut result = MatchResult::default();

    for i in 0..n {
        if secret[i] == guess[i] {
            result.exact += 1;
            secret_used[i] = true;
            guess_used[i] = true;
        }
    }

    for i in 0..n {
        if guess_used[i] {
            continue;
        }
        let partner = (0..n).find(|&j| !secret_used[j] && secret[j] == guess[i]);
        if let Some(j) = partner {
            result.approximate += 1;
            secret_used[j] = true;
            guess_used[i] = true;
        }
    }

    log::debug!("secret [{:?}] vs guess [{:?}]: {}", secret, guess, result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn score(secret: &[u8], guess: &[u8]) -> (u8, u8) {
        let r = count_matches(&Sequence::new(secret.to_vec()), &Sequence::new(guess.to_vec()));
        (r.exact, r.approximate)
    }

    #[test]
    fn test_reversed_guess() {
        assert_eq!(score(&[1, 2, 3], &[3, 2, 1]), (1, 2));
    }

    #[test]
    fn test_duplicates_consumed_once() {
        assert_eq!(score(&[1, 1, 2], &[1, 2, 1]), (1, 2));
        assert_eq!(score(&[1, 2, 2], &[2, 1, 1]), (0, 2));
        assert_eq!(score(&[1, 1, 3], &[1, 3, 1]), (1, 2));
        assert_eq!(score(&[1, 2, 3], &[1, 1, 1]), (1, 0));
        assert_eq!(score(&[1, 1, 1], &[2, 1, 2]), (1, 0));
        assert_eq!(score(&[2, 1, 1], &[1, 2, 2]), (0, 2));
    }

    #[test]
    fn test_exact_and_none() {
        assert_eq!(score(&[2, 2, 2], &[2, 2, 2]), (3, 0));
        assert_eq!(score(&[1, 1, 1], &[2, 3, 2]), (0, 0));
    }

    #[test]
    fn test_blank_guess_never_matches() {
        assert_eq!(score(&[1, 2, 3], &[0, 0, 0]), (0, 0));
        assert_eq!(score(&[1, 2, 3], &[0, 1, 0]), (0, 1));
    }

    #[test]
    fn test_code_packing() {
        let r = MatchResult {
            exact: 1,
            approximate: 2,
        };
        assert_eq!(r.code(), 0x12);
        assert_eq!(MatchResult::from_code(0x12), r);
        assert!(MatchResult::from_code(0x30).is_solved(3));
        assert!(!r.is_solved(3));
    }

    fn sequence(len: usize) -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(0u8..=3, len)
    }

    fn pair() -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
        (1usize..=6).prop_flat_map(|n| (sequence(n), sequence(n)))
    }

    proptest! {
        #[test]
        fn prop_self_match_without_duplicates(seq in Just(vec![1u8, 2, 3, 4, 5, 6]).prop_shuffle(), n in 1usize..=6) {
            let s = &seq[..n];
            prop_assert_eq!(score(s, s), (n as u8, 0));
        }

        #[test]
        fn prop_total_bounded_by_length((s, g) in pair()) {
            let (exact, approximate) = score(&s, &g);
            prop_assert!((exact + approximate) as usize <= s.len());
        }

        #[test]
        fn prop_exact_is_symmetric((s, g) in pair()) {
            prop_assert_eq!(score(&s, &g).0, score(&g, &s).0);
        }

        #[test]
        fn prop_total_is_colour_overlap((s, g) in pair()) {
            let overlap: usize = (0u8..=3)
                .map(|c| {
                    let in_s = s.iter().filter(|&&v| v == c).count();
                    let in_g = g.iter().filter(|&&v| v == c).count();
                    in_s.min(in_g)
                })
                .sum();
            let (exact, approximate) = score(&s, &g);
            prop_assert_eq!((exact + approximate) as usize, overlap);
        }
    }
}
