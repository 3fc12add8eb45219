/*
    Annodiff (Annotation Difference & Agreement Library)

        Licensed under the GNU General Public License v3
*/

//! This module computes chance-corrected inter-annotator agreement (Cohen's kappa) from
//! position-signature-aligned annotations. An [`AgreementStudy`] collects, per annotator,
//! a map from [`PositionKey`] to [`Label`]; for each annotator pair the union of all
//! observed positions is taken, positions one annotator did not annotate default to
//! [`Label::Empty`], and the aligned label sequences feed a [`ContingencyTable`]. The
//! `Empty` sentinel is a legitimate category: a missing annotation is penalized exactly
//! like a disagreeing one.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::config::{Config, Configurable};
use crate::error::AnnoError;
use crate::graph::{FeatureGraph, FeatureValue, NodeHandle};
use crate::types::*;

use sealed::sealed;

/// A categorical label as used in agreement computation. `Empty` is the sentinel for "no
/// annotation at this position" and is a category in its own right.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Label {
    Empty,
    Value(String),
}

impl From<&str> for Label {
    fn from(item: &str) -> Self {
        Self::Value(item.to_string())
    }
}

impl From<String> for Label {
    fn from(item: String) -> Self {
        Self::Value(item)
    }
}

impl From<Option<String>> for Label {
    fn from(item: Option<String>) -> Self {
        match item {
            Some(value) => Self::Value(value),
            None => Self::Empty,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Value(value) => write!(f, "{}", value),
        }
    }
}

/// Identifies one annotation position across annotators: the document and the position
/// signature within it. A structured key, so document ids and signatures can never bleed
/// into one another no matter what characters they contain.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PositionKey {
    pub document: String,
    pub signature: String,
}

impl PositionKey {
    pub fn new(document: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            signature: signature.into(),
        }
    }
}

/// The result of an agreement computation. `NoData` signals the degenerate case where
/// neither annotator produced any observation, which is deliberately distinct from any
/// numeric score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Agreement {
    NoData,
    Kappa(f64),
}

impl Agreement {
    pub fn score(&self) -> Option<f64> {
        match self {
            Self::NoData => None,
            Self::Kappa(value) => Some(*value),
        }
    }
}

impl fmt::Display for Agreement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NoData => Ok(()),
            Self::Kappa(value) => write!(f, "{}", value),
        }
    }
}

/// A square contingency table over the categories observed in a sequence of paired
/// categorical observations (first annotator = rows, second = columns).
#[derive(Debug, Clone)]
pub struct ContingencyTable {
    categories: Vec<Label>,
    counts: Vec<usize>,
    total: usize,
}

impl ContingencyTable {
    /// Builds the table from paired observations
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Label, Label)>,
    {
        let pairs: Vec<(Label, Label)> = pairs.into_iter().collect();
        let mut categories: Vec<Label> = Vec::new();
        for (a, b) in &pairs {
            categories.push(a.clone());
            categories.push(b.clone());
        }
        categories.sort();
        categories.dedup();
        let k = categories.len();
        let mut counts = vec![0usize; k * k];
        for (a, b) in &pairs {
            let row = categories
                .binary_search(a)
                .expect("category must be present");
            let col = categories
                .binary_search(b)
                .expect("category must be present");
            counts[row * k + col] += 1;
        }
        Self {
            total: pairs.len(),
            categories,
            counts,
        }
    }

    /// The categories of the table, in canonical order
    pub fn categories(&self) -> &[Label] {
        &self.categories
    }

    /// Total number of paired observations
    pub fn total(&self) -> usize {
        self.total
    }

    /// The number of observations where the first annotator assigned `a` and the second `b`
    pub fn count(&self, a: &Label, b: &Label) -> usize {
        let k = self.categories.len();
        match (
            self.categories.binary_search(a),
            self.categories.binary_search(b),
        ) {
            (Ok(row), Ok(col)) => self.counts[row * k + col],
            _ => 0,
        }
    }

    /// The fraction of observations both annotators labelled identically
    pub fn observed_agreement(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let k = self.categories.len();
        let diagonal: usize = (0..k).map(|i| self.counts[i * k + i]).sum();
        diagonal as f64 / self.total as f64
    }

    /// The agreement expected by chance, from the marginal distributions
    pub fn expected_agreement(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let k = self.categories.len();
        let mut expected = 0.0;
        for i in 0..k {
            let row: usize = (0..k).map(|j| self.counts[i * k + j]).sum();
            let col: usize = (0..k).map(|j| self.counts[j * k + i]).sum();
            expected += (row as f64) * (col as f64);
        }
        expected / ((self.total as f64) * (self.total as f64))
    }

    /// Cohen's kappa for this table. The two degenerate cases are handled explicitly: an
    /// empty table yields [`Agreement::NoData`], and a table where chance agreement
    /// saturates (both annotators constant and identical, so observed agreement is
    /// necessarily perfect) yields a kappa of 1.0 rather than a division by zero.
    pub fn kappa(&self) -> Agreement {
        if self.total == 0 {
            return Agreement::NoData;
        }
        let observed = self.observed_agreement();
        let expected = self.expected_agreement();
        if (1.0 - expected).abs() < f64::EPSILON {
            return Agreement::Kappa(1.0);
        }
        Agreement::Kappa((observed - expected) / (1.0 - expected))
    }
}

/// Collects the annotations of any number of annotators over a set of documents and
/// computes pairwise agreement. Observations can be recorded directly via
/// [`Self::record()`], or extracted from a [`FeatureGraph`] via [`Self::record_graph()`].
pub struct AgreementStudy {
    annotators: Vec<String>,
    maps: Vec<BTreeMap<PositionKey, Label>>,
    config: Config,
}

#[sealed]
impl TypeInfo for AgreementStudy {
    fn typeinfo() -> Type {
        Type::AgreementStudy
    }
}

impl Configurable for AgreementStudy {
    fn config(&self) -> &Config {
        &self.config
    }
    fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }
    fn set_config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }
}

impl Default for AgreementStudy {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl AgreementStudy {
    pub fn new(config: Config) -> Self {
        Self {
            annotators: Vec::new(),
            maps: Vec::new(),
            config,
        }
    }

    /// Registers an annotator (idempotent) and returns their index
    pub fn add_annotator(&mut self, name: &str) -> usize {
        if let Some(index) = self.annotators.iter().position(|x| x == name) {
            index
        } else {
            self.annotators.push(name.to_string());
            self.maps.push(BTreeMap::new());
            self.annotators.len() - 1
        }
    }

    /// The registered annotators, in registration order
    pub fn annotators(&self) -> &[String] {
        &self.annotators
    }

    /// Records one observation: the given annotator assigned `label` at `key`. A second
    /// record at the same key overwrites the first.
    pub fn record(&mut self, annotator: &str, key: PositionKey, label: impl Into<Label>) {
        let index = self.add_annotator(annotator);
        self.maps[index].insert(key, label.into());
    }

    /// Records all annotations of the given type in one annotator's graph over one
    /// document: each node's position signature becomes the key, the value of
    /// `label_feature` becomes the label (`Null` maps to [`Label::Empty`]). Returns the
    /// number of annotations recorded.
    pub fn record_graph(
        &mut self,
        annotator: &str,
        document: &str,
        graph: &FeatureGraph,
        type_name: &str,
        label_feature: &str,
        leaf_type: Option<&str>,
    ) -> Result<usize, AnnoError> {
        debug(&self.config, || {
            format!(
                "AgreementStudy.record_graph: annotator={} document={} type={}",
                annotator, document, type_name
            )
        });
        let typedef_handle = graph.schema().resolve(type_name)?;
        let typedef = graph.schema().typedef(typedef_handle)?;
        let feature_index = typedef.feature_index(label_feature).ok_or_else(|| {
            AnnoError::UndefinedFeature(
                format!("{}.{}", type_name, label_feature),
                "record_graph",
            )
        })?;
        let leaf_handle = match leaf_type {
            Some(name) => Some(graph.schema().resolve(name)?),
            None => None,
        };

        let handles: Vec<NodeHandle> = graph.nodes_by_type(typedef_handle).map(|(h, _)| h).collect();
        let annotator_index = self.add_annotator(annotator);
        let mut count = 0;
        for handle in handles {
            let signature = graph.position_signature(handle, leaf_handle)?;
            let node = graph.node(handle)?;
            let label = match node.value(feature_index) {
                None | Some(FeatureValue::Null) => Label::Empty,
                Some(FeatureValue::String(s)) => Label::Value(s.clone()),
                Some(FeatureValue::Int(i)) => Label::Value(i.to_string()),
                Some(FeatureValue::Reference(_)) => {
                    return Err(AnnoError::SchemaMismatch(
                        format!(
                            "feature '{}.{}' must be primitive to serve as an agreement label",
                            type_name, label_feature
                        ),
                        "record_graph",
                    ));
                }
            };
            self.maps[annotator_index]
                .insert(PositionKey::new(document, signature.as_str()), label);
            count += 1;
        }
        Ok(count)
    }

    /// Computes agreement between two annotators by name
    pub fn kappa_between(&self, a: &str, b: &str) -> Result<Agreement, AnnoError> {
        let i = self
            .annotators
            .iter()
            .position(|x| x == a)
            .ok_or_else(|| AnnoError::IdError(a.to_string(), "kappa_between: no such annotator"))?;
        let j = self
            .annotators
            .iter()
            .position(|x| x == b)
            .ok_or_else(|| AnnoError::IdError(b.to_string(), "kappa_between: no such annotator"))?;
        Ok(self.kappa_between_indices(i, j))
    }

    fn kappa_between_indices(&self, i: usize, j: usize) -> Agreement {
        let map_a = &self.maps[i];
        let map_b = &self.maps[j];
        //the union of all positions observed by either annotator
        let keys: BTreeSet<&PositionKey> = map_a.keys().chain(map_b.keys()).collect();
        if keys.is_empty() {
            return Agreement::NoData;
        }
        let empty = Label::Empty;
        ContingencyTable::from_pairs(keys.into_iter().map(|key| {
            (
                map_a.get(key).unwrap_or(&empty).clone(),
                map_b.get(key).unwrap_or(&empty).clone(),
            )
        }))
        .kappa()
    }

    /// Computes the full pairwise agreement matrix over all registered annotators. The
    /// matrix is symmetric; pairs are computed in parallel.
    pub fn pairwise(&self) -> AgreementMatrix {
        let n = self.annotators.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (i..n).map(move |j| (i, j)))
            .collect();
        let computed: Vec<(usize, usize, Agreement)> = pairs
            .into_par_iter()
            .map(|(i, j)| (i, j, self.kappa_between_indices(i, j)))
            .collect();
        let mut scores = vec![Agreement::NoData; n * n];
        for (i, j, agreement) in computed {
            scores[i * n + j] = agreement;
            scores[j * n + i] = agreement;
        }
        AgreementMatrix {
            annotators: self.annotators.clone(),
            scores,
        }
    }
}

/// A symmetric matrix of pairwise agreement scores over a set of annotators
#[derive(Debug, Clone)]
pub struct AgreementMatrix {
    annotators: Vec<String>,
    scores: Vec<Agreement>,
}

#[sealed]
impl TypeInfo for AgreementMatrix {
    fn typeinfo() -> Type {
        Type::AgreementMatrix
    }
}

impl AgreementMatrix {
    /// The annotators covered by this matrix, in the order of its rows/columns
    pub fn annotators(&self) -> &[String] {
        &self.annotators
    }

    /// Number of annotators (the matrix is `len` x `len`)
    pub fn len(&self) -> usize {
        self.annotators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotators.is_empty()
    }

    /// The score at the given row/column indices
    pub fn score_at(&self, row: usize, col: usize) -> Agreement {
        self.scores[row * self.annotators.len() + col]
    }

    /// The score for a pair of annotators, by name
    pub fn get(&self, a: &str, b: &str) -> Option<Agreement> {
        let i = self.annotators.iter().position(|x| x == a)?;
        let j = self.annotators.iter().position(|x| x == b)?;
        Some(self.score_at(i, j))
    }
}
