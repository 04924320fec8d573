//! Tree-based regressors: CART decision trees, random forests, and
//! gradient boosting.
//!
//! All three share one recursive CART builder. Splits minimize the
//! weighted child variance and leaves predict the mean target of the
//! samples that reached them.

use crate::error::{PulsoError, Result};
use crate::metrics::r_squared;
use crate::primitives::{Matrix, Vector};
use crate::traits::Estimator;
use serde::{Deserialize, Serialize};

/// Leaf node in a regression tree.
///
/// Predicts the mean of the training targets that reached it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeLeaf {
    /// Predicted value (mean of targets in this leaf).
    pub value: f32,
    /// Number of training samples in this leaf.
    pub n_samples: usize,
}

/// Internal split node. Samples with `feature <= threshold` go left.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSplit {
    /// Index of the feature to split on.
    pub feature_idx: usize,
    /// Threshold value for the split.
    pub threshold: f32,
    /// Subtree for samples where feature <= threshold.
    pub left: Box<TreeNode>,
    /// Subtree for samples where feature > threshold.
    pub right: Box<TreeNode>,
}

/// A node in a regression tree (either a split or a leaf).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Internal decision node with a split condition.
    Split(TreeSplit),
    /// Leaf node with a value prediction.
    Leaf(TreeLeaf),
}

impl TreeNode {
    /// Returns the depth of the subtree rooted at this node.
    ///
    /// Leaves have depth 0, splits have depth 1 + max(left, right).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 0,
            TreeNode::Split(split) => 1 + split.left.depth().max(split.right.depth()),
        }
    }
}

/// Decision tree regressor using the CART algorithm.
///
/// Candidate thresholds are midpoints between consecutive distinct feature
/// values; the chosen split is the one with the largest variance reduction.
///
/// # Examples
///
/// ```
/// use pulso::prelude::*;
/// use pulso::tree::DecisionTreeRegressor;
///
/// let x = Matrix::from_vec(6, 1, vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]).unwrap();
/// let y = Vector::from_slice(&[5.0, 5.0, 5.0, 20.0, 20.0, 20.0]);
///
/// let mut tree = DecisionTreeRegressor::new();
/// tree.fit(&x, &y).unwrap();
/// let predictions = tree.predict(&x);
/// assert!((predictions[0] - 5.0).abs() < 1e-6);
/// assert!((predictions[5] - 20.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    tree: Option<TreeNode>,
    n_features: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
}

impl DecisionTreeRegressor {
    /// Creates a regressor with unlimited depth and minimal split constraints.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: None,
            n_features: 0,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }

    /// Sets the maximum depth of the tree (root has depth 0).
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Sets the minimum number of samples required to split a node (>= 2).
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Sets the minimum number of samples required at a leaf (>= 1).
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Returns the root node, or `None` before fitting.
    #[must_use]
    pub fn root(&self) -> Option<&TreeNode> {
        self.tree.as_ref()
    }

    /// Split-based feature importances, normalized to sum to 1.
    ///
    /// Each split credits its feature with the number of training samples
    /// that passed through it. A tree with no splits yields all zeros.
    /// Returns `None` before fitting.
    #[must_use]
    pub fn feature_importances(&self) -> Option<Vec<f32>> {
        let tree = self.tree.as_ref()?;
        let mut importances = vec![0.0; self.n_features];
        accumulate_importances(tree, &mut importances);
        normalize_importances(&mut importances);
        Some(importances)
    }

    /// Predicts the value for a single sample by walking the tree.
    fn predict_one(&self, sample: &[f32]) -> f32 {
        let tree = self.tree.as_ref().expect("Model not fitted. Call fit() first.");

        let mut node = tree;
        loop {
            match node {
                TreeNode::Leaf(leaf) => return leaf.value,
                TreeNode::Split(split) => {
                    if sample[split.feature_idx] <= split.threshold {
                        node = &split.left;
                    } else {
                        node = &split.right;
                    }
                }
            }
        }
    }
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimator for DecisionTreeRegressor {
    /// Fits the tree to training data.
    ///
    /// # Errors
    ///
    /// Returns an error if dimensions don't match or the data is empty.
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        let (n_samples, n_features) = x.shape();
        if n_samples != y.len() {
            return Err(PulsoError::dimension_mismatch(
                "samples",
                n_samples,
                y.len(),
            ));
        }
        if n_samples == 0 {
            return Err("Cannot fit with zero samples".into());
        }

        self.n_features = n_features;
        self.tree = Some(build_tree(
            x,
            y.as_slice(),
            0,
            self.max_depth,
            self.min_samples_split,
            self.min_samples_leaf,
        ));
        Ok(())
    }

    /// Predicts target values for each row of `x`.
    ///
    /// # Panics
    ///
    /// Panics if called before `fit()`.
    fn predict(&self, x: &Matrix<f32>) -> Vector<f32> {
        let (n_samples, n_features) = x.shape();
        let mut predictions = Vec::with_capacity(n_samples);

        let mut sample = vec![0.0; n_features];
        for row in 0..n_samples {
            for (col, slot) in sample.iter_mut().enumerate() {
                *slot = x.get(row, col);
            }
            predictions.push(self.predict_one(&sample));
        }

        Vector::from_vec(predictions)
    }

    /// Computes the R² score on the given data.
    fn score(&self, x: &Matrix<f32>, y: &Vector<f32>) -> f32 {
        let y_pred = self.predict(x);
        r_squared(&y_pred, y)
    }
}

/// Random forest regressor.
///
/// An ensemble of CART trees, each trained on a bootstrap sample of the
/// data. Predictions are averaged across trees. With a fixed
/// `random_state` the forest is fully reproducible: tree `i` draws its
/// bootstrap sample with seed `random_state + i`.
///
/// # Examples
///
/// ```
/// use pulso::prelude::*;
/// use pulso::tree::RandomForestRegressor;
///
/// let x = Matrix::from_vec(5, 1, vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
/// let y = Vector::from_slice(&[2.0, 4.0, 6.0, 8.0, 10.0]);
///
/// let mut forest = RandomForestRegressor::new(10).with_random_state(0);
/// forest.fit(&x, &y).unwrap();
/// assert_eq!(forest.predict(&x).len(), 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTreeRegressor>,
    n_estimators: usize,
    max_depth: Option<usize>,
    random_state: Option<u64>,
    n_features: usize,
}

impl RandomForestRegressor {
    /// Creates a forest with `n_estimators` trees.
    #[must_use]
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            random_state: None,
            n_features: 0,
        }
    }

    /// Sets the maximum depth for each tree.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Sets the seed for bootstrap sampling, making fits reproducible.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Number of fitted trees (0 before fitting).
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Split-based feature importances accumulated over all trees,
    /// normalized to sum to 1. Returns `None` before fitting.
    #[must_use]
    pub fn feature_importances(&self) -> Option<Vec<f32>> {
        if self.trees.is_empty() {
            return None;
        }
        let mut importances = vec![0.0; self.n_features];
        for tree in &self.trees {
            if let Some(root) = tree.root() {
                accumulate_importances(root, &mut importances);
            }
        }
        normalize_importances(&mut importances);
        Some(importances)
    }
}

impl Estimator for RandomForestRegressor {
    /// Trains each tree on an independent bootstrap sample.
    ///
    /// # Errors
    ///
    /// Returns an error if dimensions don't match or the data is empty.
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        let (n_samples, n_features) = x.shape();
        if n_samples != y.len() {
            return Err(PulsoError::dimension_mismatch(
                "samples",
                n_samples,
                y.len(),
            ));
        }
        if n_samples == 0 {
            return Err("Cannot fit with zero samples".into());
        }

        self.n_features = n_features;
        self.trees = Vec::with_capacity(self.n_estimators);

        for i in 0..self.n_estimators {
            let seed = self.random_state.map(|s| s + i as u64);
            let indices = bootstrap_sample(n_samples, seed);
            let (x_boot, y_boot) = subset_by_indices(x, y.as_slice(), &indices);

            let mut tree = DecisionTreeRegressor::new();
            if let Some(depth) = self.max_depth {
                tree = tree.with_max_depth(depth);
            }
            tree.fit(&x_boot, &Vector::from_vec(y_boot))?;
            self.trees.push(tree);
        }

        Ok(())
    }

    /// Averages predictions across all trees.
    ///
    /// # Panics
    ///
    /// Panics if called before `fit()`.
    fn predict(&self, x: &Matrix<f32>) -> Vector<f32> {
        assert!(
            !self.trees.is_empty(),
            "Model not fitted. Call fit() first."
        );

        let n_samples = x.shape().0;
        let mut predictions = vec![0.0; n_samples];

        for tree in &self.trees {
            let tree_preds = tree.predict(x);
            for (pred, &tree_pred) in predictions.iter_mut().zip(tree_preds.as_slice()) {
                *pred += tree_pred;
            }
        }

        let n_trees = self.trees.len() as f32;
        for pred in &mut predictions {
            *pred /= n_trees;
        }

        Vector::from_slice(&predictions)
    }

    /// Computes the R² score on the given data.
    fn score(&self, x: &Matrix<f32>, y: &Vector<f32>) -> f32 {
        let y_pred = self.predict(x);
        r_squared(&y_pred, y)
    }
}

/// Gradient boosting regressor with least-squares loss.
///
/// Boosting starts from the mean target. Each stage fits a shallow CART
/// tree to the residuals of the running prediction and the running
/// prediction moves by `learning_rate` times the stage's output. The fit
/// is deterministic: stage trees use exhaustive splits with no sampling.
///
/// # Examples
///
/// ```
/// use pulso::prelude::*;
/// use pulso::tree::GradientBoostingRegressor;
///
/// let x = Matrix::from_vec(6, 1, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
/// let y = Vector::from_slice(&[2.0, 4.0, 6.0, 8.0, 10.0, 12.0]);
///
/// let mut model = GradientBoostingRegressor::new();
/// model.fit(&x, &y).unwrap();
/// assert!(model.score(&x, &y) > 0.9);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    stages: Vec<DecisionTreeRegressor>,
    n_estimators: usize,
    learning_rate: f32,
    max_depth: usize,
    init_prediction: Option<f32>,
    n_features: usize,
}

impl GradientBoostingRegressor {
    /// Creates a regressor with 100 stages, learning rate 0.1, depth 3.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            init_prediction: None,
            n_features: 0,
        }
    }

    /// Sets the number of boosting stages.
    #[must_use]
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Sets the shrinkage applied to each stage's contribution.
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Sets the maximum depth of each stage tree.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Number of fitted stages (0 before fitting).
    #[must_use]
    pub fn n_stages(&self) -> usize {
        self.stages.len()
    }

    /// Split-based feature importances accumulated over all stage trees,
    /// normalized to sum to 1. Returns `None` before fitting.
    #[must_use]
    pub fn feature_importances(&self) -> Option<Vec<f32>> {
        self.init_prediction?;
        let mut importances = vec![0.0; self.n_features];
        for stage in &self.stages {
            if let Some(root) = stage.root() {
                accumulate_importances(root, &mut importances);
            }
        }
        normalize_importances(&mut importances);
        Some(importances)
    }
}

impl Default for GradientBoostingRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Estimator for GradientBoostingRegressor {
    /// Fits the boosting stages to training data.
    ///
    /// # Errors
    ///
    /// Returns an error if dimensions don't match or the data is empty.
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        let (n_samples, n_features) = x.shape();
        if n_samples != y.len() {
            return Err(PulsoError::dimension_mismatch(
                "samples",
                n_samples,
                y.len(),
            ));
        }
        if n_samples == 0 {
            return Err("Cannot fit with zero samples".into());
        }

        self.n_features = n_features;
        let base = y.mean();
        let mut current = vec![base; n_samples];
        self.stages = Vec::with_capacity(self.n_estimators);

        for _ in 0..self.n_estimators {
            let residuals: Vec<f32> = y
                .as_slice()
                .iter()
                .zip(&current)
                .map(|(&target, &pred)| target - pred)
                .collect();

            let mut stage = DecisionTreeRegressor::new().with_max_depth(self.max_depth);
            stage.fit(x, &Vector::from_vec(residuals))?;

            let correction = stage.predict(x);
            for (pred, &delta) in current.iter_mut().zip(correction.as_slice()) {
                *pred += self.learning_rate * delta;
            }
            self.stages.push(stage);
        }

        self.init_prediction = Some(base);
        Ok(())
    }

    /// Sums the shrunken stage corrections on top of the base prediction.
    ///
    /// # Panics
    ///
    /// Panics if called before `fit()`.
    fn predict(&self, x: &Matrix<f32>) -> Vector<f32> {
        let base = self
            .init_prediction
            .expect("Model not fitted. Call fit() first.");

        let n_samples = x.shape().0;
        let mut predictions = vec![base; n_samples];

        for stage in &self.stages {
            let correction = stage.predict(x);
            for (pred, &delta) in predictions.iter_mut().zip(correction.as_slice()) {
                *pred += self.learning_rate * delta;
            }
        }

        Vector::from_slice(&predictions)
    }

    /// Computes the R² score on the given data.
    fn score(&self, x: &Matrix<f32>, y: &Vector<f32>) -> f32 {
        let y_pred = self.predict(x);
        r_squared(&y_pred, y)
    }
}

// ======================================================================
// CART building blocks
// ======================================================================

/// Mean of a slice, 0.0 when empty.
fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

/// Population variance of target values.
fn variance(values: &[f32]) -> f32 {
    if values.len() <= 1 {
        return 0.0;
    }
    let m = mean(values);
    let sum_squared_diff: f32 = values.iter().map(|&v| (v - m).powi(2)).sum();
    sum_squared_diff / values.len() as f32
}

/// Weighted child variance for a candidate split.
fn weighted_split_mse(y_left: &[f32], y_right: &[f32]) -> f32 {
    let n_left = y_left.len() as f32;
    let n_right = y_right.len() as f32;
    let n_total = n_left + n_right;
    if n_total == 0.0 {
        return 0.0;
    }
    (n_left / n_total) * variance(y_left) + (n_right / n_total) * variance(y_right)
}

/// Sorted distinct values of one feature column.
fn unique_feature_values(x: &Matrix<f32>, feature_idx: usize) -> Vec<f32> {
    let n_samples = x.shape().0;
    let mut values: Vec<f32> = (0..n_samples).map(|i| x.get(i, feature_idx)).collect();
    values.sort_by(f32::total_cmp);
    values.dedup();
    values
}

/// Partitions the targets by a threshold on one feature.
fn split_targets(x: &Matrix<f32>, y: &[f32], feature_idx: usize, threshold: f32) -> (Vec<f32>, Vec<f32>) {
    let mut y_left = Vec::new();
    let mut y_right = Vec::new();
    for (row, &target) in y.iter().enumerate() {
        if x.get(row, feature_idx) <= threshold {
            y_left.push(target);
        } else {
            y_right.push(target);
        }
    }
    (y_left, y_right)
}

/// Variance reduction for a candidate split, if both sides are non-empty
/// and the split actually improves on the parent.
fn split_gain(y_left: &[f32], y_right: &[f32], parent_variance: f32) -> Option<f32> {
    if y_left.is_empty() || y_right.is_empty() {
        return None;
    }
    let gain = parent_variance - weighted_split_mse(y_left, y_right);
    (gain > 0.0).then_some(gain)
}

/// Best (threshold, gain) for a single feature. Candidate thresholds are
/// midpoints between consecutive distinct values.
fn best_split_for_feature(
    x: &Matrix<f32>,
    y: &[f32],
    feature_idx: usize,
    parent_variance: f32,
) -> Option<(f32, f32)> {
    let values = unique_feature_values(x, feature_idx);
    let mut best_threshold = 0.0;
    let mut best_gain = 0.0;

    for pair in values.windows(2) {
        let threshold = (pair[0] + pair[1]) / 2.0;
        let (y_left, y_right) = split_targets(x, y, feature_idx, threshold);
        if let Some(gain) = split_gain(&y_left, &y_right, parent_variance) {
            if gain > best_gain {
                best_gain = gain;
                best_threshold = threshold;
            }
        }
    }

    (best_gain > 0.0).then_some((best_threshold, best_gain))
}

/// Best (feature, threshold) across all features, or `None` if no split
/// reduces the variance.
fn best_split(x: &Matrix<f32>, y: &[f32]) -> Option<(usize, f32)> {
    let (n_samples, n_features) = x.shape();
    if n_samples < 2 {
        return None;
    }

    let parent_variance = variance(y);
    let mut best_gain = 0.0;
    let mut best = None;

    for feature_idx in 0..n_features {
        if let Some((threshold, gain)) = best_split_for_feature(x, y, feature_idx, parent_variance)
        {
            if gain > best_gain {
                best_gain = gain;
                best = Some((feature_idx, threshold));
            }
        }
    }

    best
}

/// Extracts the rows named by `indices` into a new matrix and target vec.
fn subset_by_indices(x: &Matrix<f32>, y: &[f32], indices: &[usize]) -> (Matrix<f32>, Vec<f32>) {
    let n_features = x.shape().1;
    let mut data = Vec::with_capacity(indices.len() * n_features);
    let mut targets = Vec::with_capacity(indices.len());

    for &idx in indices {
        for col in 0..n_features {
            data.push(x.get(idx, col));
        }
        targets.push(y[idx]);
    }

    let subset = Matrix::from_vec(indices.len(), n_features, data)
        .expect("subset dimensions are consistent by construction");
    (subset, targets)
}

fn make_leaf(y: &[f32]) -> TreeNode {
    TreeNode::Leaf(TreeLeaf {
        value: mean(y),
        n_samples: y.len(),
    })
}

fn at_max_depth(depth: usize, max_depth: Option<usize>) -> bool {
    max_depth.is_some_and(|limit| depth >= limit)
}

/// Row indices on each side of a threshold.
fn partition_indices(x: &Matrix<f32>, feature_idx: usize, threshold: f32) -> (Vec<usize>, Vec<usize>) {
    let n_samples = x.shape().0;
    let mut left = Vec::new();
    let mut right = Vec::new();
    for row in 0..n_samples {
        if x.get(row, feature_idx) <= threshold {
            left.push(row);
        } else {
            right.push(row);
        }
    }
    (left, right)
}

/// Builds a regression tree recursively.
///
/// Stops early when a node has too few samples to split, the depth limit
/// is reached, or the targets are already (numerically) constant.
fn build_tree(
    x: &Matrix<f32>,
    y: &[f32],
    depth: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
) -> TreeNode {
    let n_samples = y.len();

    if n_samples < min_samples_split || at_max_depth(depth, max_depth) || variance(y) < 1e-10 {
        return make_leaf(y);
    }

    let Some((feature_idx, threshold)) = best_split(x, y) else {
        return make_leaf(y);
    };

    let (left_indices, right_indices) = partition_indices(x, feature_idx, threshold);
    if left_indices.len() < min_samples_leaf || right_indices.len() < min_samples_leaf {
        return make_leaf(y);
    }

    let (left_x, left_y) = subset_by_indices(x, y, &left_indices);
    let (right_x, right_y) = subset_by_indices(x, y, &right_indices);

    let left_child = build_tree(
        &left_x,
        &left_y,
        depth + 1,
        max_depth,
        min_samples_split,
        min_samples_leaf,
    );
    let right_child = build_tree(
        &right_x,
        &right_y,
        depth + 1,
        max_depth,
        min_samples_split,
        min_samples_leaf,
    );

    TreeNode::Split(TreeSplit {
        feature_idx,
        threshold,
        left: Box::new(left_child),
        right: Box::new(right_child),
    })
}

/// Walks a tree crediting each split's feature with the number of samples
/// that passed through the split.
fn accumulate_importances(node: &TreeNode, importances: &mut [f32]) {
    if let TreeNode::Split(split) = node {
        importances[split.feature_idx] += subtree_samples(node) as f32;
        accumulate_importances(&split.left, importances);
        accumulate_importances(&split.right, importances);
    }
}

/// Total training samples under a node.
fn subtree_samples(node: &TreeNode) -> usize {
    match node {
        TreeNode::Leaf(leaf) => leaf.n_samples,
        TreeNode::Split(split) => subtree_samples(&split.left) + subtree_samples(&split.right),
    }
}

/// Scales an importance vector to sum to 1. A vector of zeros (a tree
/// with no splits) is left unchanged.
fn normalize_importances(importances: &mut [f32]) {
    let total: f32 = importances.iter().sum();
    if total > 0.0 {
        for value in importances.iter_mut() {
            *value /= total;
        }
    }
}

/// Draws `n_samples` row indices uniformly with replacement.
fn bootstrap_sample(n_samples: usize, random_state: Option<u64>) -> Vec<usize> {
    use rand::distributions::{Distribution, Uniform};
    use rand::SeedableRng;

    let dist = Uniform::from(0..n_samples);
    let mut indices = Vec::with_capacity(n_samples);

    if let Some(seed) = random_state {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        for _ in 0..n_samples {
            indices.push(dist.sample(&mut rng));
        }
    } else {
        let mut rng = rand::thread_rng();
        for _ in 0..n_samples {
            indices.push(dist.sample(&mut rng));
        }
    }

    indices
}
