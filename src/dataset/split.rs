//! Deterministic shuffled train/test split.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of a train/test split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffles `0..n_samples` with `seed` and holds out `ceil(test_size * n)` rows.
///
/// `test_size` is clamped to `[0, 1]`. The same seed always yields the same split.
pub fn train_test_split(n_samples: usize, test_size: f64, seed: u64) -> SplitIndices {
    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n_samples as f64) * test_size.clamp(0.0, 1.0)).ceil() as usize;
    let train = indices.split_off(n_test.min(n_samples));
    SplitIndices {
        train,
        test: indices,
    }
}
