use serde::Deserialize;

use crate::error::ModelError;

/// A trained classifier: one feature vector in, one encoded class out.
pub trait Classifier: Send + Sync {
    fn n_features(&self) -> usize;

    /// Every class code `predict` can return.
    fn classes(&self) -> &[i64];

    fn predict(&self, x: &[f64]) -> Result<i64, ModelError>;
}

const LEAF: i64 = -1;

/// One decision tree in the flat parallel-array layout scikit-learn exports.
/// Node `i` is a leaf when `children_left[i] == -1`; otherwise go left when
/// `x[feature[i]] <= threshold[i]`. `value[i]` holds per-class weights.
#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

impl Tree {
    fn check(&self, idx: usize, n_features: usize, n_classes: usize) -> Result<(), ModelError> {
        let bad = |reason: String| ModelError::MalformedTree { tree: idx, reason };
        let n = self.children_left.len();
        if n == 0 {
            return Err(bad("tree has no nodes".into()));
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(bad("node arrays differ in length".into()));
        }
        for i in 0..n {
            let (l, r) = (self.children_left[i], self.children_right[i]);
            if l == LEAF {
                if self.value[i].len() != n_classes {
                    return Err(bad(format!(
                        "leaf {} has {} class weights, expected {}",
                        i,
                        self.value[i].len(),
                        n_classes
                    )));
                }
                if let Some(w) = self.value[i].iter().find(|w| !w.is_finite() || **w < 0.0) {
                    return Err(bad(format!("leaf {} has invalid class weight {}", i, w)));
                }
                continue;
            }
            // children always sit after their parent, so traversal terminates
            for child in [l, r] {
                if child <= i as i64 || child >= n as i64 {
                    return Err(bad(format!("node {} has invalid child {}", i, child)));
                }
            }
            let f = self.feature[i];
            if f < 0 || f as usize >= n_features {
                return Err(bad(format!("node {} splits on unknown feature {}", i, f)));
            }
        }
        Ok(())
    }

    fn leaf_for(&self, x: &[f64]) -> &[f64] {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            node = if x[self.feature[node] as usize] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        &self.value[node]
    }
}

#[derive(Deserialize)]
pub(crate) struct ForestJson {
    pub(crate) n_features: usize,
    pub(crate) classes: Vec<i64>,
    pub(crate) trees: Vec<Tree>,
}

/// Random-forest style classifier: average the normalised leaf distributions of
/// every tree and return the class with the highest mean (first wins on ties).
#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    n_features: usize,
    classes: Vec<i64>,
    trees: Vec<Tree>,
}

impl TreeEnsemble {
    pub fn new(n_features: usize, classes: Vec<i64>, trees: Vec<Tree>) -> Result<Self, ModelError> {
        if classes.is_empty() {
            return Err(ModelError::Backend("model has no classes".into()));
        }
        if trees.is_empty() {
            return Err(ModelError::Backend("model has no trees".into()));
        }
        for (i, t) in trees.iter().enumerate() {
            t.check(i, n_features, classes.len())?;
        }
        Ok(Self {
            n_features,
            classes,
            trees,
        })
    }

    /// Mean class distribution over all trees.
    pub fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>, ModelError> {
        if x.len() != self.n_features {
            return Err(ModelError::FeatureCount {
                got: x.len(),
                expected: self.n_features,
            });
        }
        if let Some(index) = x.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::NonFiniteFeature { index });
        }

        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let leaf = tree.leaf_for(x);
            let total: f64 = leaf.iter().sum();
            if total <= 0.0 {
                continue;
            }
            for (p, w) in proba.iter_mut().zip(leaf) {
                *p += w / total;
            }
        }
        let n = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        Ok(proba)
    }
}

impl Classifier for TreeEnsemble {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn predict(&self, x: &[f64]) -> Result<i64, ModelError> {
        let proba = self.predict_proba(x)?;
        let mut best = 0usize;
        for (i, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = i;
            }
        }
        Ok(self.classes[best])
    }
}
