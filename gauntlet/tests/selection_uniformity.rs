//! Statistical checks that selection favours no subset and no seed position.

use gauntlet::randomness::Entropy;
use gauntlet::selection::ParticipantSelector;
use std::collections::HashMap;

const SAMPLES: u64 = 20_000;

fn chi_squared(observed: impl Iterator<Item = u64>, expected: f64) -> f64 {
    observed
        .map(|o| {
            let diff = o as f64 - expected;
            diff * diff / expected
        })
        .sum()
}

#[test]
fn test_every_subset_equally_likely() {
    // 6 candidates choose 3: 20 subsets, 19 degrees of freedom.
    let mut counts: HashMap<Vec<usize>, u64> = HashMap::new();
    for seed in 0..SAMPLES {
        let mut picked = ParticipantSelector::new(Entropy::from_seed(seed))
            .select(6, 3)
            .expect("enough candidates");
        picked.sort_unstable();
        *counts.entry(picked).or_default() += 1;
    }

    assert_eq!(counts.len(), 20, "every subset must be reachable");
    let stat = chi_squared(counts.values().copied(), SAMPLES as f64 / 20.0);
    // Critical value for p = 0.0001 at 19 degrees of freedom.
    assert!(stat < 51.0, "chi-squared {stat:.2} too large: {counts:?}");
}

#[test]
fn test_every_candidate_equally_likely_in_each_seed() {
    // 8 candidates, 4 seeds: each (seed, candidate) cell expects 1/8.
    let mut cells = [[0u64; 8]; 4];
    for seed in 0..SAMPLES {
        let picked = ParticipantSelector::new(Entropy::from_seed(seed))
            .select(8, 4)
            .expect("enough candidates");
        for (position, candidate) in picked.into_iter().enumerate() {
            cells[position][candidate] += 1;
        }
    }

    for (position, row) in cells.iter().enumerate() {
        let stat = chi_squared(row.iter().copied(), SAMPLES as f64 / 8.0);
        // Critical value for p = 0.0001 at 7 degrees of freedom.
        assert!(
            stat < 29.88,
            "seed {position}: chi-squared {stat:.2} too large: {row:?}"
        );
    }
}
