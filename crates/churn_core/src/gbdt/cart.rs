//! CART (Classification and Regression Tree) builder
//!
//! Grows one second-order regression tree per boosting round using
//! histogram split search over pre-binned features. Ties in split gain are
//! broken by (feature index, bin, node id) so the same data always yields
//! the same tree.

use super::binning::FeatureBinner;
use super::tree::{Node, Tree};

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub l2_regularization: f64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            min_samples_leaf: 20,
            l2_regularization: 1.0,
        }
    }
}

/// Deterministic tie-breaker for split selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub bin: usize,
    pub node_id: usize,
}

/// Split candidate with gain and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    bin: usize,
    gain: f64,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn new(feature_idx: usize, bin: usize, gain: f64, node_id: usize) -> Self {
        Self {
            feature_idx,
            bin,
            gain,
            tie_breaker: SplitTieBreaker {
                feature_idx,
                bin,
                node_id,
            },
        }
    }

    fn beats(&self, other: &SplitCandidate) -> bool {
        self.gain > other.gain || (self.gain == other.gain && self.tie_breaker < other.tie_breaker)
    }
}

#[derive(Clone, Copy, Default)]
struct GradStats {
    g: f64,
    h: f64,
    count: usize,
}

impl GradStats {
    fn add(&mut self, g: f64, h: f64) {
        self.g += g;
        self.h += h;
        self.count += 1;
    }

    fn score(&self, lambda: f64) -> f64 {
        self.g * self.g / (self.h + lambda)
    }
}

/// Build a regression tree on gradients/hessians using binned features
pub struct CartBuilder<'a> {
    config: TreeConfig,
    binner: &'a FeatureBinner,
    bins: &'a [Vec<u16>],
    gradients: &'a [f64],
    hessians: &'a [f64],
}

impl<'a> CartBuilder<'a> {
    pub fn new(
        binner: &'a FeatureBinner,
        bins: &'a [Vec<u16>],
        gradients: &'a [f64],
        hessians: &'a [f64],
        config: TreeConfig,
    ) -> Self {
        debug_assert_eq!(gradients.len(), hessians.len());
        Self {
            config,
            binner,
            bins,
            gradients,
            hessians,
        }
    }

    /// Build tree and return it with the given shrinkage weight
    pub fn build(&self, weight: f64) -> Tree {
        let mut nodes = Vec::new();
        let indices: Vec<usize> = (0..self.gradients.len()).collect();

        self.build_node(&indices, 0, &mut nodes);

        Tree::new(nodes, weight)
    }

    /// Recursively build tree nodes, returning the index of the created node
    fn build_node(
        &self,
        indices: &[usize],
        depth: usize,
        nodes: &mut Vec<Node>,
    ) -> i32 {
        let current_idx = nodes.len() as i32;
        let stats = self.sum_stats(indices);

        let split = if depth >= self.config.max_depth
            || indices.len() < 2 * self.config.min_samples_leaf
        {
            None
        } else {
            self.find_best_split(indices, &stats, current_idx as usize)
        };

        let Some(split) = split else {
            nodes.push(Node::leaf(current_idx, self.leaf_value(&stats)));
            return current_idx;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.bins[split.feature_idx][i] as usize <= split.bin);

        // Reserve space for current node
        nodes.push(Node::internal(
            current_idx,
            split.feature_idx as i32,
            self.binner.threshold(split.feature_idx, split.bin),
            -1,
            -1,
        ));

        let left = self.build_node(&left_indices, depth + 1, nodes);
        let right = self.build_node(&right_indices, depth + 1, nodes);

        nodes[current_idx as usize].left = left;
        nodes[current_idx as usize].right = right;

        current_idx
    }

    /// Best split over all features using gradient histograms
    fn find_best_split(
        &self,
        indices: &[usize],
        parent: &GradStats,
        node_id: usize,
    ) -> Option<SplitCandidate> {
        let lambda = self.config.l2_regularization;
        let parent_score = parent.score(lambda);
        let mut best: Option<SplitCandidate> = None;

        for feature_idx in 0..self.binner.n_features() {
            let n_bins = self.binner.n_bins(feature_idx);
            if n_bins < 2 {
                continue;
            }

            let mut histogram = vec![GradStats::default(); n_bins];
            for &i in indices {
                histogram[self.bins[feature_idx][i] as usize]
                    .add(self.gradients[i], self.hessians[i]);
            }

            let mut left = GradStats::default();
            for (bin, bucket) in histogram.iter().enumerate().take(n_bins - 1) {
                left.g += bucket.g;
                left.h += bucket.h;
                left.count += bucket.count;

                let right = GradStats {
                    g: parent.g - left.g,
                    h: parent.h - left.h,
                    count: parent.count - left.count,
                };
                if left.count < self.config.min_samples_leaf
                    || right.count < self.config.min_samples_leaf
                {
                    continue;
                }

                let gain = left.score(lambda) + right.score(lambda) - parent_score;
                if gain <= 0.0 {
                    continue;
                }

                let candidate = SplitCandidate::new(feature_idx, bin, gain, node_id);
                if best.as_ref().map_or(true, |current| candidate.beats(current)) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    fn sum_stats(&self, indices: &[usize]) -> GradStats {
        let mut stats = GradStats::default();
        for &i in indices {
            stats.add(self.gradients[i], self.hessians[i]);
        }
        stats
    }

    /// Newton step: -G / (H + lambda)
    fn leaf_value(&self, stats: &GradStats) -> f64 {
        -stats.g / (stats.h + self.config.l2_regularization)
    }
}
