use std::collections::HashMap;

use rand::Rng;

/// Shuffles a copy of `items` using Fisher–Yates, repeated `passes` times.
///
/// Each pass is a full, independent shuffle of the whole slice. Repeating
/// passes does not make the result "more random" than a single pass; it is
/// kept as a pacing knob for the cut-up chaos level.
///
/// # Notes
/// - `passes == 0` returns the items in their original order.
/// - The input slice is never modified.
pub fn shuffle<T: Clone, R: Rng + ?Sized>(items: &[T], passes: usize, rng: &mut R) -> Vec<T> {
	let mut result = items.to_vec();
	for _ in 0..passes {
		for i in (1..result.len()).rev() {
			let j = rng.random_range(0..=i);
			result.swap(i, j);
		}
	}
	result
}

/// Computes `n!`, saturating at `u128::MAX` once it no longer fits.
pub fn factorial(n: usize) -> u128 {
	(2..=n as u128).fold(1u128, |acc, i| acc.saturating_mul(i))
}

/// Number of distinct orderings of a word multiset (`n! / Π kᵢ!`).
///
/// Computed as a product of binomials so intermediate values stay small.
/// Saturates at `u128::MAX`.
pub fn distinct_orderings(words: &[String]) -> u128 {
	let counts = words.iter().fold(HashMap::<&str, usize>::new(), |mut counts, word| {
		*counts.entry(word.as_str()).or_default() += 1;
		counts
	});

	let mut placed = 0usize;
	let mut total = 1u128;
	for k in counts.into_values() {
		placed += k;
		let binomial = match binomial(placed, k) {
			Some(b) => b,
			None => return u128::MAX,
		};
		total = match total.checked_mul(binomial) {
			Some(t) => t,
			None => return u128::MAX,
		};
	}
	total
}

/// `C(n, k)` with the multiplicative formula, `None` on overflow.
fn binomial(n: usize, k: usize) -> Option<u128> {
	let k = k.min(n - k);
	let mut result = 1u128;
	for i in 1..=k as u128 {
		result = result.checked_mul(n as u128 - k as u128 + i)? / i;
	}
	Some(result)
}
