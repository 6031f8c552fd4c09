//! Isolation-forest outlier detector: an ensemble of randomly split trees
//! built on random subsamples. Anomalies isolate in short paths, so the
//! expected path length over the ensemble becomes a normality score.
//!
//! Liu, Ting, Zhou (2008) "Isolation Forest".

use crate::error::PipelineError;
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DEFAULT_SUBSAMPLE: usize = 256;
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

#[derive(Debug, Clone)]
pub struct IsolationForest {
    n_estimators: usize,
    max_samples: Option<usize>,
    contamination: Option<f64>,
    random_state: Option<u64>,
    trees: Vec<Node>,
    /// c(psi): expected path length for the subsample size
    subsample_norm: f64,
    /// Decision boundary on the normality score
    offset: f64,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self::new()
    }
}

impl IsolationForest {
    pub fn new() -> Self {
        Self {
            n_estimators: 100,
            max_samples: None,
            contamination: None,
            random_state: None,
            trees: Vec::new(),
            subsample_norm: 0.0,
            offset: -0.5,
        }
    }

    #[must_use]
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Subsample size per tree; clamped to the sample count at fit time.
    #[must_use]
    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = Some(max_samples);
        self
    }

    /// Expected outlier fraction. When unset, the decision boundary is the
    /// fixed midpoint of the score range instead of a training-score quantile.
    #[must_use]
    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = Some(contamination);
        self
    }

    #[must_use]
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn fit(&mut self, x: &Array2<f64>) -> Result<(), PipelineError> {
        let n = x.nrows();
        if n < 2 || x.ncols() == 0 {
            return Err(PipelineError::Model(format!(
                "isolation forest needs at least 2 samples and 1 feature, got {}x{}",
                n,
                x.ncols()
            )));
        }

        let psi = self.max_samples.unwrap_or(DEFAULT_SUBSAMPLE).min(n);
        let height_limit = (psi as f64).log2().ceil().max(1.0) as usize;
        let mut rng = match self.random_state {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        self.trees.clear();
        for _ in 0..self.n_estimators {
            let sample = rand::seq::index::sample(&mut rng, n, psi).into_vec();
            self.trees
                .push(build_tree(x, &sample, 0, height_limit, &mut rng));
        }
        self.subsample_norm = average_path_length(psi);

        self.offset = match self.contamination {
            None => -0.5,
            Some(share) => {
                let mut scores = self.score_samples(x);
                scores.sort_by(f64::total_cmp);
                quantile(&scores, share)
            }
        };
        Ok(())
    }

    /// Normality scores in [-1, 0]; lower = more anomalous.
    pub fn score_samples(&self, x: &Array2<f64>) -> Vec<f64> {
        x.rows()
            .into_iter()
            .map(|row| self.score_row(row))
            .collect()
    }

    /// Signed distance from the decision boundary; negative = anomalous.
    pub fn decision_function(&self, x: &Array2<f64>) -> Vec<f64> {
        self.score_samples(x)
            .into_iter()
            .map(|score| score - self.offset)
            .collect()
    }

    /// 1 = normal, -1 = anomalous, per the fitted decision boundary.
    pub fn predict(&self, x: &Array2<f64>) -> Vec<i32> {
        self.decision_function(x)
            .into_iter()
            .map(|d| if d < 0.0 { -1 } else { 1 })
            .collect()
    }

    fn score_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        if self.trees.is_empty() || self.subsample_norm <= 0.0 {
            return -0.5;
        }
        let total: f64 = self.trees.iter().map(|tree| path_length(tree, row)).sum();
        let mean_path = total / self.trees.len() as f64;
        -(2f64.powf(-mean_path / self.subsample_norm))
    }
}

fn build_tree(
    x: &Array2<f64>,
    rows: &[usize],
    depth: usize,
    limit: usize,
    rng: &mut StdRng,
) -> Node {
    if rows.len() <= 1 || depth >= limit {
        return Node::Leaf { size: rows.len() };
    }

    // Only features with spread among this node's rows can split it.
    let mut candidates = Vec::new();
    for feature in 0..x.ncols() {
        let (min, max) = spread(x, rows, feature);
        if max > min {
            candidates.push((feature, min, max));
        }
    }
    if candidates.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    let (feature, min, max) = candidates[rng.gen_range(0..candidates.len())];
    let threshold = rng.gen_range(min..max);
    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
        .iter()
        .copied()
        .partition(|&row| x[[row, feature]] < threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(build_tree(x, &left_rows, depth + 1, limit, rng)),
        right: Box::new(build_tree(x, &right_rows, depth + 1, limit, rng)),
    }
}

fn spread(x: &Array2<f64>, rows: &[usize], feature: usize) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &row in rows {
        let v = x[[row, feature]];
        min = min.min(v);
        max = max.max(v);
    }
    (min, max)
}

fn path_length(mut node: &Node, row: ArrayView1<'_, f64>) -> f64 {
    let mut depth = 0.0;
    loop {
        match node {
            Node::Leaf { size } => return depth + average_path_length(*size),
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                node = if row[*feature] < *threshold { left } else { right };
                depth += 1.0;
            }
        }
    }
}

/// Expected path length of an unsuccessful BST search over n points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return -0.5;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (pos - lo as f64) * (sorted[hi] - sorted[lo])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn clustered_with_outliers() -> Array2<f64> {
        array![
            [2.0, 2.0],
            [2.1, 2.0],
            [1.9, 2.1],
            [2.0, 1.9],
            [2.1, 2.1],
            [1.8, 2.0],
            [10.0, 10.0],
            [-10.0, -10.0],
        ]
    }

    #[test]
    fn scores_are_bounded() {
        let data = clustered_with_outliers();
        let mut forest = IsolationForest::new()
            .with_n_estimators(50)
            .with_random_state(42);
        forest.fit(&data).unwrap();

        for score in forest.score_samples(&data) {
            assert!((-1.0..=0.0).contains(&score), "score {score} out of range");
        }
    }

    #[test]
    fn predictions_are_binary_and_aligned() {
        let data = clustered_with_outliers();
        let mut forest = IsolationForest::new()
            .with_n_estimators(50)
            .with_random_state(42);
        forest.fit(&data).unwrap();

        let predictions = forest.predict(&data);
        assert_eq!(predictions.len(), data.nrows());
        for p in predictions {
            assert!(p == 1 || p == -1);
        }
    }

    #[test]
    fn far_outlier_scores_below_cluster() {
        let data = array![[1.0], [1.1], [1.2], [1.0], [100.0]];
        let mut forest = IsolationForest::new()
            .with_n_estimators(50)
            .with_contamination(0.2)
            .with_random_state(42);
        forest.fit(&data).unwrap();

        let scores = forest.score_samples(&data);
        assert!(scores[4] < scores[0]);
    }

    #[test]
    fn contamination_sets_the_boundary_share() {
        let data = clustered_with_outliers();
        let mut forest = IsolationForest::new()
            .with_n_estimators(100)
            .with_contamination(0.25)
            .with_random_state(42);
        forest.fit(&data).unwrap();

        let anomalies = forest.predict(&data).iter().filter(|&&p| p == -1).count();
        assert_eq!(anomalies, 2);
    }

    #[test]
    fn same_seed_same_scores() {
        let data = clustered_with_outliers();
        let mut a = IsolationForest::new().with_random_state(7);
        let mut b = IsolationForest::new().with_random_state(7);
        a.fit(&data).unwrap();
        b.fit(&data).unwrap();
        assert_eq!(a.score_samples(&data), b.score_samples(&data));
    }

    #[test]
    fn max_samples_clamps_to_data() {
        let data = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let mut forest = IsolationForest::new()
            .with_max_samples(1000)
            .with_n_estimators(10)
            .with_random_state(42);
        forest.fit(&data).unwrap();
        assert!(forest.is_fitted());
    }

    #[test]
    fn degenerate_input_is_an_error() {
        let empty = Array2::<f64>::zeros((0, 4));
        let mut forest = IsolationForest::new();
        assert!(forest.fit(&empty).is_err());

        let single = Array2::<f64>::zeros((1, 4));
        assert!(forest.fit(&single).is_err());
    }
}
