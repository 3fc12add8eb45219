#![allow(dead_code)]
use annodiff::*;

/// The schema shared by the integration tests: an atomic token layer, a span layer with a
/// label feature, and a dependency layer connecting tokens.
pub fn setup_schema() -> Result<TypeSchema, AnnoError> {
    TypeSchema::new(Config::default())
        .with_type(TypeDef::new("Token"))?
        .with_type(
            TypeDef::new("NamedEntity")
                .with_feature("value", FeatureRange::Str)
                .with_feature("anchor", FeatureRange::Reference("Token".to_string())),
        )?
        .with_type(
            TypeDef::new("Dependency")
                .with_feature("DependencyType", FeatureRange::Str)
                .with_feature("Governor", FeatureRange::Reference("Token".to_string()))
                .with_feature("Dependent", FeatureRange::Reference("Token".to_string())),
        )
}

/// Builds one annotator's graph over one document: a named entity at each given span with
/// the given label (or no label, for valueless annotations)
pub fn setup_graph(entities: &[(usize, usize, Option<&str>)]) -> Result<FeatureGraph, AnnoError> {
    let mut graph = FeatureGraph::new(setup_schema()?, Config::default());
    for (begin, end, value) in entities {
        let mut builder =
            FeatureNodeBuilder::new("NamedEntity").with_span(Offset::new(*begin, *end));
        if let Some(value) = value {
            builder = builder.with_value("value", *value);
        }
        graph.annotate(builder)?;
    }
    Ok(graph)
}

/// The example document used by the grid serialization tests
#[cfg(feature = "tsv")]
pub fn setup_document() -> TsvDocument {
    TsvDocument::new("This is a test .").with_sentence(&[(0, 4), (5, 7), (8, 9), (10, 14), (15, 16)])
}

/// The grid schema used by the serialization tests: one span layer, one relation layer
#[cfg(feature = "tsv")]
pub fn setup_tsv_schema() -> TsvSchema {
    TsvSchema::new()
        .with_span_layer("NamedEntity", &["value"])
        .with_relation_layer("Dependency", &["DependencyType"], "Token")
}
