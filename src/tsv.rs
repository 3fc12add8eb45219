/*
    Annodiff (Annotation Difference & Agreement Library)

        Licensed under the GNU General Public License v3
*/

//! This module serializes stacked multi-layer span and relation annotations onto a shared
//! token grid, in the WebAnno TSV 3.x format: a fixed-width tab-separated grid with stable
//! `sentence-token` addressing, synthetic `.N` sub-token addresses for annotations narrower
//! than a token, and deterministic column ordering derived from a [`TsvSchema`].
//!
//! Being an output format concern, this module is implemented as an extra feature and may
//! be enabled/disabled at compile time.

use crate::types::__seal_type_info;
use regex::Regex;
use sealed::sealed;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::OnceLock;

use crate::config::Config;
use crate::error::AnnoError;
use crate::file::open_file_writer;
use crate::offset::Offset;
use crate::types::{Type, TypeInfo};

/// The kind of an annotation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    /// Annotations spanning text directly
    Span,
    /// Annotations connecting a governor span to a dependent span
    Relation,
}

/// The kind of a rendered column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Renders a feature value
    Value,
    /// Renders the token address of the relation's governor
    RelationRef,
}

/// One column of the rendered grid: a layer, its kind, a feature and the column kind.
/// Columns are produced in a stable, deterministic order by [`TsvSchema::columns()`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub(crate) layer: String,
    pub(crate) layer_kind: LayerKind,
    pub(crate) feature: String,
    pub(crate) kind: ColumnKind,
}

impl Column {
    pub fn layer(&self) -> &str {
        &self.layer
    }
    pub fn layer_kind(&self) -> LayerKind {
        self.layer_kind
    }
    pub fn feature(&self) -> &str {
        &self.feature
    }
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct LayerSchema {
    name: String,
    kind: LayerKind,
    features: Vec<String>,
    /// For relation layers: the base (anchor) layer the relation endpoints attach to
    base: Option<String>,
}

/// The column schema: which layers and features are rendered, and in what order. Span
/// layers always precede relation layers, layers are ordered by name, features keep their
/// declaration order; the resulting column order is therefore stable across serializations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TsvSchema {
    layers: Vec<LayerSchema>,
}

#[sealed]
impl TypeInfo for TsvSchema {
    fn typeinfo() -> Type {
        Type::TsvSchema
    }
}

impl TsvSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern to declare a span layer with its features (declaration order is kept)
    pub fn with_span_layer(mut self, name: impl Into<String>, features: &[&str]) -> Self {
        self.layers.push(LayerSchema {
            name: name.into(),
            kind: LayerKind::Span,
            features: features.iter().map(|f| f.to_string()).collect(),
            base: None,
        });
        self
    }

    /// Builder pattern to declare a relation layer with its features and base layer
    pub fn with_relation_layer(
        mut self,
        name: impl Into<String>,
        features: &[&str],
        base: impl Into<String>,
    ) -> Self {
        self.layers.push(LayerSchema {
            name: name.into(),
            kind: LayerKind::Relation,
            features: features.iter().map(|f| f.to_string()).collect(),
            base: Some(base.into()),
        });
        self
    }

    fn layer(&self, name: &str) -> Option<&LayerSchema> {
        self.layers.iter().find(|l| l.name == name)
    }

    fn ordered_layers(&self) -> Vec<&LayerSchema> {
        let mut spans: Vec<&LayerSchema> = self
            .layers
            .iter()
            .filter(|l| l.kind == LayerKind::Span)
            .collect();
        spans.sort_by(|a, b| a.name.cmp(&b.name));
        let mut relations: Vec<&LayerSchema> = self
            .layers
            .iter()
            .filter(|l| l.kind == LayerKind::Relation)
            .collect();
        relations.sort_by(|a, b| a.name.cmp(&b.name));
        spans.into_iter().chain(relations).collect()
    }

    /// The columns of the rendered grid, in their stable order
    pub fn columns(&self) -> Vec<Column> {
        let mut columns = Vec::new();
        for layer in self.ordered_layers() {
            for feature in &layer.features {
                columns.push(Column {
                    layer: layer.name.clone(),
                    layer_kind: layer.kind,
                    feature: feature.clone(),
                    kind: ColumnKind::Value,
                });
            }
            if layer.kind == LayerKind::Relation {
                columns.push(Column {
                    layer: layer.name.clone(),
                    layer_kind: layer.kind,
                    feature: layer.base.clone().unwrap_or_else(|| layer.name.clone()),
                    kind: ColumnKind::RelationRef,
                });
            }
        }
        columns
    }
}

/// A document prepared for grid serialization: the text and its division into sentences
/// and tokens. Token offsets are absolute (in unicode points, relative to the document
/// text) and must be supplied by the caller's tokenization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsvDocument {
    text: String,
    sentences: Vec<Vec<Offset>>,
}

#[sealed]
impl TypeInfo for TsvDocument {
    fn typeinfo() -> Type {
        Type::TsvDocument
    }
}

impl TsvDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sentences: Vec::new(),
        }
    }

    /// Builder pattern to add a sentence, given by its token offsets (in document order)
    pub fn with_sentence(mut self, tokens: &[(usize, usize)]) -> Self {
        self.sentences
            .push(tokens.iter().map(|&(b, e)| Offset::new(b, e)).collect());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of sentences
    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Returns the slice of the document text covered by the given offset (unicode points)
    fn char_slice(&self, offset: &Offset) -> String {
        self.text
            .chars()
            .skip(offset.begin())
            .take(offset.len())
            .collect()
    }
}

/// A stable address on the token grid: 1-based sentence and token numbers, with an
/// optional 1-based sub-token number for annotations narrower than a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenAddress {
    sentence: usize,
    token: usize,
    subtoken: Option<usize>,
}

impl TokenAddress {
    pub fn new(sentence: usize, token: usize) -> Self {
        Self {
            sentence,
            token,
            subtoken: None,
        }
    }

    pub fn with_subtoken(sentence: usize, token: usize, subtoken: usize) -> Self {
        Self {
            sentence,
            token,
            subtoken: Some(subtoken),
        }
    }

    pub fn sentence(&self) -> usize {
        self.sentence
    }

    pub fn token(&self) -> usize {
        self.token
    }

    pub fn subtoken(&self) -> Option<usize> {
        self.subtoken
    }

    /// Parses an address of the form `1-2` or `1-2.3`
    pub fn parse(input: &str) -> Result<Self, AnnoError> {
        static ADDRESS_PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = ADDRESS_PATTERN
            .get_or_init(|| Regex::new(r"^([0-9]+)-([0-9]+)(?:\.([0-9]+))?$").expect("valid pattern"));
        let captures = pattern.captures(input).ok_or_else(|| {
            AnnoError::AlignmentError(input.to_string(), "not a valid token address")
        })?;
        let parse = |m: &str| {
            m.parse::<usize>().map_err(|_| {
                AnnoError::AlignmentError(input.to_string(), "token address number out of range")
            })
        };
        Ok(Self {
            sentence: parse(&captures[1])?,
            token: parse(&captures[2])?,
            subtoken: match captures.get(3) {
                Some(m) => Some(parse(m.as_str())?),
                None => None,
            },
        })
    }
}

impl fmt::Display for TokenAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.subtoken {
            Some(subtoken) => write!(f, "{}-{}.{}", self.sentence, self.token, subtoken),
            None => write!(f, "{}-{}", self.sentence, self.token),
        }
    }
}

/// Escapes the characters reserved by the TSV grid format with a backslash
pub fn escape_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace("->", "\\->")
        .replace('[', "\\[")
        .replace(']', "\\]")
        .replace('|', "\\|")
        .replace('_', "\\_")
        .replace(';', "\\;")
        .replace('*', "\\*")
        .replace('\t', "\\t")
        .replace('\n', "\\n")
}

/// Reverses [`escape_value()`]
pub fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('t') => out.push('\t'),
                Some('n') => out.push('\n'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[derive(Debug, Clone)]
struct SpanAnnotation {
    layer: String,
    offset: Offset,
    values: Vec<(String, Option<String>)>,
}

#[derive(Debug, Clone)]
struct RelationAnnotation {
    layer: String,
    governor: Offset,
    dependent: Offset,
    values: Vec<(String, Option<String>)>,
}

/// Row key on the grid: sentence index, token index (both 0-based here) and sub-token
/// number (0 for the token row itself, 1-based for sub-token rows)
type RowKey = (usize, usize, usize);

struct Placement {
    rows: SmallVec<[RowKey; 2]>,
    disambiguation: Option<usize>,
}

/// Serializes a set of span and relation annotations over a [`TsvDocument`] into the grid
/// format described by a [`TsvSchema`].
///
/// Stacked annotations (same layer, identical span) render in insertion order as
/// `label[rank]|label[rank]`; a disambiguation rank is attached whenever a stack holds
/// more than one annotation or a span covers more than one token. A present annotation
/// without a value renders `*`, the absence of any annotation renders `_`. Relations
/// render on the dependent's row, with the governor's address in the reference column.
pub struct TsvWriter<'a> {
    schema: &'a TsvSchema,
    document: &'a TsvDocument,
    spans: Vec<SpanAnnotation>,
    relations: Vec<RelationAnnotation>,
}

impl<'a> TsvWriter<'a> {
    pub fn new(schema: &'a TsvSchema, document: &'a TsvDocument) -> Self {
        Self {
            schema,
            document,
            spans: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Adds a span annotation. `values` maps feature names (which must be declared for the
    /// layer) to optional values; a `None` value renders as present-but-valueless (`*`).
    pub fn add_span(
        &mut self,
        layer: &str,
        offset: Offset,
        values: &[(&str, Option<&str>)],
    ) -> Result<(), AnnoError> {
        let layerschema = self.require_layer(layer, LayerKind::Span, "add_span")?;
        for (feature, _) in values {
            if !layerschema.features.iter().any(|f| f == feature) {
                return Err(AnnoError::UndefinedFeature(
                    format!("{}.{}", layer, feature),
                    "add_span",
                ));
            }
        }
        self.spans.push(SpanAnnotation {
            layer: layer.to_string(),
            offset,
            values: values
                .iter()
                .map(|(f, v)| (f.to_string(), v.map(|v| v.to_string())))
                .collect(),
        });
        Ok(())
    }

    /// Adds a relation annotation between a governor span and a dependent span. Both
    /// endpoints must resolve to a token, a token-aligned span, or an already-added
    /// sub-token span by the time the grid is serialized.
    pub fn add_relation(
        &mut self,
        layer: &str,
        governor: Offset,
        dependent: Offset,
        values: &[(&str, Option<&str>)],
    ) -> Result<(), AnnoError> {
        let layerschema = self.require_layer(layer, LayerKind::Relation, "add_relation")?;
        for (feature, _) in values {
            if !layerschema.features.iter().any(|f| f == feature) {
                return Err(AnnoError::UndefinedFeature(
                    format!("{}.{}", layer, feature),
                    "add_relation",
                ));
            }
        }
        self.relations.push(RelationAnnotation {
            layer: layer.to_string(),
            governor,
            dependent,
            values: values
                .iter()
                .map(|(f, v)| (f.to_string(), v.map(|v| v.to_string())))
                .collect(),
        });
        Ok(())
    }

    fn require_layer(
        &self,
        name: &str,
        kind: LayerKind,
        context: &'static str,
    ) -> Result<&LayerSchema, AnnoError> {
        match self.schema.layer(name) {
            Some(layerschema) if layerschema.kind == kind => Ok(layerschema),
            _ => Err(AnnoError::UndefinedType(name.to_string(), context)),
        }
    }

    /// Serializes the grid and returns it as a string
    pub fn to_tsv_string(&self) -> Result<String, AnnoError> {
        let columns = self.schema.columns();
        let tokens = self.token_index();

        //sub-token units per token, in first-seen order
        let mut subtokens: BTreeMap<(usize, usize), Vec<Offset>> = BTreeMap::new();

        //how many annotations stack at each (layer, span)?
        let mut stack_sizes: HashMap<(String, Offset), usize> = HashMap::new();
        for span in &self.spans {
            *stack_sizes
                .entry((span.layer.clone(), span.offset))
                .or_insert(0) += 1;
        }

        //resolve each span onto its grid rows and assign disambiguation ranks (a running
        //per-layer counter, in insertion order)
        let mut counters: HashMap<String, usize> = HashMap::new();
        let mut placements: Vec<Placement> = Vec::with_capacity(self.spans.len());
        for span in &self.spans {
            let rows = self.place_span(&span.offset, &tokens, &mut subtokens)?;
            let stacked = stack_sizes[&(span.layer.clone(), span.offset)] > 1;
            let disambiguation = if stacked || rows.len() > 1 {
                let counter = counters.entry(span.layer.clone()).or_insert(0);
                *counter += 1;
                Some(*counter)
            } else {
                None
            };
            placements.push(Placement {
                rows,
                disambiguation,
            });
        }

        //fill the cells of the grid, span annotations first
        let mut cells: BTreeMap<(RowKey, usize), Vec<String>> = BTreeMap::new();
        for (span, placement) in self.spans.iter().zip(placements.iter()) {
            for (col_idx, column) in columns.iter().enumerate() {
                if column.layer != span.layer || column.kind != ColumnKind::Value {
                    continue;
                }
                let value = span
                    .values
                    .iter()
                    .find(|(f, _)| f == &column.feature)
                    .and_then(|(_, v)| v.as_deref());
                let mut entry = match value {
                    Some(v) => escape_value(v),
                    None => "*".to_string(),
                };
                if let Some(rank) = placement.disambiguation {
                    entry.push_str(&format!("[{}]", rank));
                }
                for row in &placement.rows {
                    cells.entry((*row, col_idx)).or_default().push(entry.clone());
                }
            }
        }

        //then relations: rendered on the dependent's row, the reference column carries the
        //governor's address
        let mut relation_stacks: HashMap<(String, Offset, Offset), usize> = HashMap::new();
        for relation in &self.relations {
            *relation_stacks
                .entry((
                    relation.layer.clone(),
                    relation.governor,
                    relation.dependent,
                ))
                .or_insert(0) += 1;
        }
        let mut relation_counters: HashMap<String, usize> = HashMap::new();
        for relation in &self.relations {
            let (dependent_row, _) = self.locate(&relation.dependent, &tokens, &subtokens)?;
            let (_, governor_address) = self.locate(&relation.governor, &tokens, &subtokens)?;
            let stacked = relation_stacks[&(
                relation.layer.clone(),
                relation.governor,
                relation.dependent,
            )] > 1;
            let rank = if stacked {
                let counter = relation_counters.entry(relation.layer.clone()).or_insert(0);
                *counter += 1;
                Some(*counter)
            } else {
                None
            };
            for (col_idx, column) in columns.iter().enumerate() {
                if column.layer != relation.layer {
                    continue;
                }
                let mut entry = match column.kind {
                    ColumnKind::Value => {
                        let value = relation
                            .values
                            .iter()
                            .find(|(f, _)| f == &column.feature)
                            .and_then(|(_, v)| v.as_deref());
                        match value {
                            Some(v) => escape_value(v),
                            None => "*".to_string(),
                        }
                    }
                    ColumnKind::RelationRef => governor_address.to_string(),
                };
                if let Some(rank) = rank {
                    entry.push_str(&format!("[{}]", rank));
                }
                cells
                    .entry((dependent_row, col_idx))
                    .or_default()
                    .push(entry);
            }
        }

        //render the grid
        let mut out = String::new();
        out.push_str("#FORMAT=WebAnno TSV 3.3\n");
        for layer in self.schema.ordered_layers() {
            match layer.kind {
                LayerKind::Span => {
                    out.push_str(&format!("#T_SP={}", layer.name));
                    for feature in &layer.features {
                        out.push_str(&format!("|{}", feature));
                    }
                }
                LayerKind::Relation => {
                    out.push_str(&format!("#T_RL={}", layer.name));
                    for feature in &layer.features {
                        out.push_str(&format!("|{}", feature));
                    }
                    if let Some(base) = &layer.base {
                        out.push_str(&format!("|BT_{}", base));
                    }
                }
            }
            out.push('\n');
        }

        for (s_idx, sentence) in self.document.sentences.iter().enumerate() {
            if sentence.is_empty() {
                continue;
            }
            let sentence_span = Offset::new(
                sentence.first().expect("non-empty").begin(),
                sentence.last().expect("non-empty").end(),
            );
            let sentence_text = self.document.char_slice(&sentence_span);
            out.push('\n');
            out.push_str(&format!(
                "#Text={}\n",
                sentence_text.replace('\\', "\\\\").replace('\n', "\\n")
            ));
            for (t_idx, token) in sentence.iter().enumerate() {
                self.render_row(
                    &mut out,
                    &columns,
                    &cells,
                    (s_idx, t_idx, 0),
                    TokenAddress::new(s_idx + 1, t_idx + 1),
                    token,
                );
                if let Some(subs) = subtokens.get(&(s_idx, t_idx)) {
                    for (n, sub) in subs.iter().enumerate() {
                        self.render_row(
                            &mut out,
                            &columns,
                            &cells,
                            (s_idx, t_idx, n + 1),
                            TokenAddress::with_subtoken(s_idx + 1, t_idx + 1, n + 1),
                            sub,
                        );
                    }
                }
            }
        }
        Ok(out)
    }

    /// Serializes the grid to the given writer
    pub fn serialize<W: std::io::Write>(&self, mut writer: W) -> Result<(), AnnoError> {
        let out = self.to_tsv_string()?;
        writer
            .write_all(out.as_bytes())
            .map_err(|e| AnnoError::IoError(e, "<writer>".to_string(), "Writing TSV failed"))
    }

    /// Serializes the grid to a file
    pub fn to_file(&self, filename: &str, config: &Config) -> Result<(), AnnoError> {
        let writer = open_file_writer(filename, config)?;
        self.serialize(writer)
    }

    fn render_row(
        &self,
        out: &mut String,
        columns: &[Column],
        cells: &BTreeMap<(RowKey, usize), Vec<String>>,
        row: RowKey,
        address: TokenAddress,
        offset: &Offset,
    ) {
        out.push_str(&format!(
            "{}\t{}\t{}\t",
            address,
            offset,
            self.document.char_slice(offset)
        ));
        for col_idx in 0..columns.len() {
            match cells.get(&(row, col_idx)) {
                Some(entries) => out.push_str(&entries.join("|")),
                None => out.push('_'),
            }
            out.push('\t');
        }
        out.push('\n');
    }

    /// All tokens of the document with their (0-based) sentence and token indices
    fn token_index(&self) -> Vec<(usize, usize, Offset)> {
        let mut tokens = Vec::new();
        for (s_idx, sentence) in self.document.sentences.iter().enumerate() {
            for (t_idx, token) in sentence.iter().enumerate() {
                tokens.push((s_idx, t_idx, *token));
            }
        }
        tokens
    }

    /// Resolves a span onto its grid rows: the covered token rows when the span is aligned
    /// to token boundaries, or a (possibly new) sub-token row when it is narrower than its
    /// covering token. A span that crosses token boundaries without being aligned to them
    /// cannot be placed.
    fn place_span(
        &self,
        offset: &Offset,
        tokens: &[(usize, usize, Offset)],
        subtokens: &mut BTreeMap<(usize, usize), Vec<Offset>>,
    ) -> Result<SmallVec<[RowKey; 2]>, AnnoError> {
        let covered: Vec<&(usize, usize, Offset)> = tokens
            .iter()
            .filter(|(_, _, token)| token.overlaps(offset))
            .collect();
        if covered.is_empty() {
            return Err(AnnoError::AlignmentError(
                offset.to_string(),
                "annotation lies outside the token grid",
            ));
        }
        let aligned = !offset.is_zero_width()
            && covered.first().expect("non-empty").2.begin() == offset.begin()
            && covered.last().expect("non-empty").2.end() == offset.end();
        if aligned {
            return Ok(covered.iter().map(|(s, t, _)| (*s, *t, 0)).collect());
        }
        //sub-token placement: the annotation must fit inside its covering token
        let (s_idx, t_idx, token) = covered.first().expect("non-empty");
        if offset.begin() < token.begin() || offset.end() > token.end() {
            return Err(AnnoError::AlignmentError(
                offset.to_string(),
                "annotation crosses token boundaries without aligning to them",
            ));
        }
        let subs = subtokens.entry((*s_idx, *t_idx)).or_default();
        let n = match subs.iter().position(|o| o == offset) {
            Some(position) => position + 1,
            None => {
                subs.push(*offset);
                subs.len()
            }
        };
        Ok(SmallVec::from_slice(&[(*s_idx, *t_idx, n)]))
    }

    /// Resolves an offset to the grid row and address it is rendered at: an exact or
    /// token-aligned span resolves to its first covered token, an offset matching an
    /// already-registered sub-token unit resolves to that unit's row.
    fn locate(
        &self,
        offset: &Offset,
        tokens: &[(usize, usize, Offset)],
        subtokens: &BTreeMap<(usize, usize), Vec<Offset>>,
    ) -> Result<(RowKey, TokenAddress), AnnoError> {
        let covered: Vec<&(usize, usize, Offset)> = tokens
            .iter()
            .filter(|(_, _, token)| token.overlaps(offset))
            .collect();
        if let (Some(first), Some(last)) = (covered.first(), covered.last()) {
            if !offset.is_zero_width()
                && first.2.begin() == offset.begin()
                && last.2.end() == offset.end()
            {
                let (s_idx, t_idx, _) = **first;
                return Ok((
                    (s_idx, t_idx, 0),
                    TokenAddress::new(s_idx + 1, t_idx + 1),
                ));
            }
            let (s_idx, t_idx, _) = **first;
            if let Some(subs) = subtokens.get(&(s_idx, t_idx)) {
                if let Some(position) = subs.iter().position(|o| o == offset) {
                    return Ok((
                        (s_idx, t_idx, position + 1),
                        TokenAddress::with_subtoken(s_idx + 1, t_idx + 1, position + 1),
                    ));
                }
            }
        }
        Err(AnnoError::AlignmentError(
            offset.to_string(),
            "relation endpoint does not correspond to a token or annotated sub-token unit",
        ))
    }
}
