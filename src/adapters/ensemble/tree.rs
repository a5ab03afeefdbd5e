//! Flattened decision trees exported from the training pipeline.
//!
//! Nodes are stored in a flat array with the root at index 0. A split sends
//! the sample left when `x[feature] <= threshold`. Child indices always point
//! forward, so evaluation terminates without a visited set.

use serde::Deserialize;

use crate::domain::FeatureVector;

/// One node of a flattened tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

/// A single regression or classification tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DecisionTree {
    pub(super) nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Check structure once at load time so `evaluate` can index freely.
    ///
    /// `leaf_width` is the required length of every leaf value.
    pub(super) fn validate(&self, n_features: usize, leaf_width: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!("node {index}: feature {feature} out of range"));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {index}: threshold is not finite"));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(format!("node {index}: invalid child index {child}"));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != leaf_width {
                        return Err(format!(
                            "node {index}: leaf has {} values, expected {leaf_width}",
                            value.len()
                        ));
                    }
                    if value.iter().any(|v| !v.is_finite()) {
                        return Err(format!("node {index}: leaf value is not finite"));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf and return its values.
    ///
    /// Assumes `validate` has passed.
    #[must_use]
    pub(super) fn evaluate(&self, x: &FeatureVector) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if x[*feature] <= *threshold { *left } else { *right };
                }
                TreeNode::Leaf { value } => return value,
            }
        }
    }
}
