/*
    Annodiff (Annotation Difference & Agreement Library)

        Licensed under the GNU General Public License v3
*/

//! ## Introduction
//!
//! Annodiff is a library for comparing, aligning and reconciling stand-off text
//! annotations contributed by multiple annotators over the same documents. It implements
//! the in-memory comparison core that curation and adjudication tooling is built on:
//!
//! **What can you do with this library?**
//!
//! * Walk two independently sorted lists of annotation spans in lock-step with
//!   [`OverlapIterator`], visiting all overlapping or order-adjacent pairs without a full
//!   cross-product comparison, including the rewind semantics needed because overlap
//!   relations are not monotone.
//! * Build and introspect typed feature-structure graphs ([`FeatureGraph`]) against a
//!   declared [`TypeSchema`], and compute [`PositionSignature`]s: canonical strings that
//!   identify "the same annotation" across annotators by span and transitively referenced
//!   substructure.
//! * Compute chance-corrected inter-annotator agreement (Cohen's kappa) with
//!   [`AgreementStudy`], aligning both annotators on the union of observed positions with
//!   an explicit empty category, and derive full pairwise [`AgreementMatrix`] results
//!   (computed in parallel), exportable as CSV.
//! * Serialize stacked multi-layer span and relation annotations onto a shared token grid
//!   in the WebAnno TSV 3.x format with [`TsvWriter`], including `label[rank]` stacking,
//!   sub-token `.N` addressing and governor-address relation columns.
//!
//! The library performs no I/O of its own beyond optional file output of its results and
//! JSON loading of configuration and schemas; callers supply sorted offset lists, graphs
//! and token grids, and consume iterators, signatures, matrices and text lines.
//!
//! High-level API:
//! * [`OverlapIterator`]
//! * [`FeatureGraph`] and [`FeatureNodeBuilder`]
//! * [`PositionSignature`]
//! * [`AgreementStudy`], [`AgreementMatrix`]
//! * [`TsvSchema`], [`TsvDocument`], [`TsvWriter`]
//!
//! Low-level API:
//! * [`Offset`]
//! * [`TypeSchema`], [`TypeDef`], [`FeatureDef`], [`FeatureRange`]
//! * [`FeatureNode`], [`FeatureValue`]
//! * [`ContingencyTable`], [`Label`], [`PositionKey`]

mod agreement;
mod config;
mod error;
mod file;
mod graph;
mod offset;
mod overlap;
mod schema;
mod signature;
mod store;
mod types;

#[cfg(feature = "csv")]
mod csv;

#[cfg(feature = "tsv")]
mod tsv;

// Our internal crate structure is not very relevant to the outside world,
// expose all structs and traits in the root namespace, and be explicit about it:

pub use agreement::{
    Agreement, AgreementMatrix, AgreementStudy, ContingencyTable, Label, PositionKey,
};
pub use config::{Config, Configurable};
#[cfg(feature = "csv")]
pub use crate::csv::ToCsv;
pub use error::{AnnoError, AnnoResult};
pub use graph::{FeatureGraph, FeatureNode, FeatureNodeBuilder, FeatureValue, NodeHandle};
pub use offset::{is_sorted, Offset};
pub use overlap::OverlapIterator;
pub use schema::{FeatureDef, FeatureRange, TypeDef, TypeDefHandle, TypeSchema};
pub use signature::PositionSignature;
pub use store::{Storable, StoreFor, StoreIter};
#[cfg(feature = "tsv")]
pub use tsv::{
    escape_value, unescape_value, Column, ColumnKind, LayerKind, TokenAddress, TsvDocument,
    TsvSchema, TsvWriter,
};
pub use types::*;

mod tests;
