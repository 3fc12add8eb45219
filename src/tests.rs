#[cfg(test)]
use crate::*;

#[test]
fn offset_ordering() {
    let mut offsets = vec![
        Offset::new(5, 7),
        Offset::new(0, 4),
        Offset::new(0, 2),
        Offset::new(5, 6),
    ];
    offsets.sort();
    assert_eq!(
        offsets,
        vec![
            Offset::new(0, 2),
            Offset::new(0, 4),
            Offset::new(5, 6),
            Offset::new(5, 7),
        ]
    );
    assert!(is_sorted(&offsets));
}

#[test]
fn offset_predicates() {
    let a = Offset::new(0, 4);
    let b = Offset::new(2, 6);
    let c = Offset::new(4, 8);
    assert!(a.overlaps(&b));
    assert!(b.overlaps(&a));
    assert!(!a.overlaps(&c));
    assert!(a.precedes(&c));
    assert!(c.succeeds(&a));
    assert!(Offset::new(0, 8).embeds(&b));
    assert!(!b.embeds(&Offset::new(0, 8)));
    //zero-width offsets overlap what contains them
    let zw = Offset::zero_width(2);
    assert!(zw.is_zero_width());
    assert!(a.overlaps(&zw));
}

#[test]
fn offset_serde() {
    let offset = Offset::new(0, 5);
    let json = serde_json::to_string(&offset).expect("serialization");
    let back: Offset = serde_json::from_str(&json).expect("deserialization");
    assert_eq!(offset, back);
}

#[test]
fn overlapiterator_empty() {
    let a: Vec<Offset> = Vec::new();
    let b = vec![Offset::new(0, 4)];
    let iter = OverlapIterator::new(&a, &b);
    assert!(!iter.has_next());
}

#[test]
#[should_panic]
fn overlapiterator_step_past_exhaustion() {
    let a: Vec<Offset> = Vec::new();
    let b = vec![Offset::new(0, 4)];
    let mut iter = OverlapIterator::new(&a, &b);
    iter.step();
}

#[test]
fn overlapiterator_simple() {
    let a = vec![Offset::new(0, 4), Offset::new(5, 7)];
    let b = vec![Offset::new(0, 7)];
    let mut iter = OverlapIterator::new(&a, &b);
    let mut pairs = Vec::new();
    while iter.has_next() {
        pairs.push((*iter.a(), *iter.b()));
        iter.step();
    }
    assert_eq!(
        pairs,
        vec![
            (Offset::new(0, 4), Offset::new(0, 7)),
            (Offset::new(5, 7), Offset::new(0, 7)),
        ]
    );
    assert_eq!(iter.step_count(), 1);
}

#[test]
fn overlapiterator_rewind() {
    //when B advances, elements of A that were already passed may newly overlap with the
    //new B and must be surfaced again
    let a = vec![Offset::new(0, 2), Offset::new(1, 5), Offset::new(6, 8)];
    let b = vec![Offset::new(0, 1), Offset::new(4, 7), Offset::new(7, 9)];
    let mut iter = OverlapIterator::new(&a, &b);
    let mut pairs = Vec::new();
    while iter.has_next() {
        pairs.push((*iter.a(), *iter.b()));
        iter.step();
    }
    assert_eq!(
        pairs,
        vec![
            (Offset::new(0, 2), Offset::new(0, 1)),
            (Offset::new(1, 5), Offset::new(0, 1)),
            (Offset::new(0, 2), Offset::new(4, 7)), //rewound
            (Offset::new(1, 5), Offset::new(4, 7)),
            (Offset::new(6, 8), Offset::new(4, 7)),
            (Offset::new(1, 5), Offset::new(7, 9)), //rewound
            (Offset::new(6, 8), Offset::new(7, 9)),
        ]
    );
    assert_eq!(iter.step_count(), 6);
}

#[test]
fn overlapiterator_coverage() {
    //every element of both lists is visited at least once
    let a = vec![Offset::new(0, 2), Offset::new(1, 5), Offset::new(6, 8)];
    let b = vec![Offset::new(0, 1), Offset::new(4, 7), Offset::new(7, 9)];
    let mut iter = OverlapIterator::new(&a, &b);
    let mut seen_a = Vec::new();
    let mut seen_b = Vec::new();
    while iter.has_next() {
        seen_a.push(*iter.a());
        seen_b.push(*iter.b());
        iter.step();
    }
    for offset in &a {
        assert!(seen_a.contains(offset), "A element {} was never visited", offset);
    }
    for offset in &b {
        assert!(seen_b.contains(offset), "B element {} was never visited", offset);
    }
}

#[test]
fn overlapiterator_ignore() {
    //an ignored element must never become current again, also not via a rewind
    let a = vec![Offset::new(0, 2), Offset::new(1, 5), Offset::new(6, 8)];
    let b = vec![Offset::new(0, 1), Offset::new(4, 7), Offset::new(7, 9)];
    let mut iter = OverlapIterator::new(&a, &b);
    assert_eq!(iter.a(), &Offset::new(0, 2));
    iter.ignore_a();
    iter.step();
    let mut later = Vec::new();
    while iter.has_next() {
        later.push(*iter.a());
        iter.step();
    }
    assert!(
        !later.contains(&Offset::new(0, 2)),
        "ignored A element was surfaced again"
    );
}

#[test]
fn overlapiterator_termination() {
    //heavily nested overlaps must still terminate in a bounded number of steps
    let a = vec![
        Offset::new(0, 10),
        Offset::new(1, 9),
        Offset::new(2, 8),
        Offset::new(3, 7),
    ];
    let b = vec![Offset::new(0, 3), Offset::new(2, 6), Offset::new(5, 10)];
    let mut iter = OverlapIterator::new(&a, &b);
    let mut rounds = 0;
    while iter.has_next() {
        iter.step();
        rounds += 1;
        assert!(rounds < 1000, "iterator did not terminate");
    }
    assert_eq!(iter.step_count() + 1, rounds); //the final step only marks exhaustion
}

#[test]
fn overlapiterator_zero_width() {
    let a = vec![Offset::zero_width(2)];
    let b = vec![Offset::new(0, 4)];
    let mut iter = OverlapIterator::new(&a, &b);
    assert!(iter.has_next());
    assert!(iter.b().overlaps(iter.a()));
    iter.step();
    assert!(!iter.has_next());
}

#[test]
fn overlapiterator_ties() {
    //ties in begin offset
    let a = vec![Offset::new(0, 2), Offset::new(0, 4)];
    let b = vec![Offset::new(0, 3)];
    let mut iter = OverlapIterator::new(&a, &b);
    let mut seen_a = Vec::new();
    while iter.has_next() {
        seen_a.push(*iter.a());
        iter.step();
    }
    assert!(seen_a.contains(&Offset::new(0, 2)));
    assert!(seen_a.contains(&Offset::new(0, 4)));
}

#[cfg(test)]
fn example_schema() -> TypeSchema {
    TypeSchema::new(Config::default())
        .with_type(TypeDef::new("Token"))
        .expect("adding type")
        .with_type(TypeDef::new("Morph").with_feature("lemma", FeatureRange::Str))
        .expect("adding type")
        .with_type(
            TypeDef::new("NamedEntity")
                .with_feature("value", FeatureRange::Str)
                .with_feature("anchor", FeatureRange::Reference("Token".to_string()))
                .with_feature("morph", FeatureRange::Reference("Morph".to_string())),
        )
        .expect("adding type")
        .with_type(
            TypeDef::new("Relation")
                .with_feature("label", FeatureRange::Str)
                .with_feature("head", FeatureRange::Reference("Relation".to_string())),
        )
        .expect("adding type")
}

#[test]
fn schema_resolution() {
    let schema = example_schema();
    let handle = schema.resolve("NamedEntity").expect("type must resolve");
    let typedef = schema.typedef(handle).expect("typedef must exist");
    assert_eq!(typedef.name(), "NamedEntity");
    assert_eq!(typedef.feature_index("value"), Some(0));
    assert_eq!(typedef.feature_index("anchor"), Some(1));
    assert_eq!(typedef.feature_index("nosuchthing"), None);
    assert!(schema.resolve("NoSuchType").is_err());
}

#[test]
fn schema_duplicate_types() {
    //inserting the exact same definition again is tolerated, a conflicting one is not
    let mut schema = example_schema();
    let first = schema.resolve("Token").expect("type must resolve");
    let again = schema.add_type(TypeDef::new("Token")).expect("identical reinsert");
    assert_eq!(first, again);
    let conflicting = schema.add_type(TypeDef::new("Token").with_feature("x", FeatureRange::Int));
    assert!(matches!(conflicting, Err(AnnoError::DuplicateIdError(..))));
}

#[test]
fn schema_json_roundtrip() {
    let schema = example_schema();
    let json = schema.to_json_string().expect("serialization");
    assert!(json.contains("NamedEntity"));
    let typedefs: Vec<TypeDef> = serde_json::from_str(&json).expect("deserialization");
    assert_eq!(typedefs.len(), 3);
}

#[test]
fn graph_annotate() {
    let mut graph = FeatureGraph::new(example_schema(), Config::default());
    let token = graph
        .annotate(
            FeatureNodeBuilder::new("Token")
                .with_id("t1")
                .with_span(Offset::new(0, 4)),
        )
        .expect("adding token");
    let entity = graph
        .annotate(
            FeatureNodeBuilder::new("NamedEntity")
                .with_span(Offset::new(0, 4))
                .with_value("value", "PER")
                .with_value("anchor", token),
        )
        .expect("adding entity");
    let node = graph.node(entity).expect("node must exist");
    assert_eq!(node.span(), Some(Offset::new(0, 4)));
    assert_eq!(node.value(0), Some(&FeatureValue::String("PER".to_string())));
    //an autogenerated public id was assigned
    assert!(node.id().expect("autogenerated id").starts_with('N'));
}

#[test]
fn graph_reference_by_id() {
    let mut graph = FeatureGraph::new(example_schema(), Config::default());
    graph
        .annotate(
            FeatureNodeBuilder::new("Token")
                .with_id("t1")
                .with_span(Offset::new(0, 4)),
        )
        .expect("adding token");
    let entity = graph
        .annotate(
            FeatureNodeBuilder::new("NamedEntity")
                .with_span(Offset::new(0, 4))
                .with_reference_id("anchor", "t1"),
        )
        .expect("adding entity");
    let node = graph.node(entity).expect("node must exist");
    assert!(matches!(node.value(1), Some(FeatureValue::Reference(_))));
}

#[test]
fn graph_schema_mismatch() {
    let mut graph = FeatureGraph::new(example_schema(), Config::default());
    let result = graph.annotate(
        FeatureNodeBuilder::new("NamedEntity")
            .with_span(Offset::new(0, 4))
            .with_value("value", 42),
    );
    assert!(matches!(result, Err(AnnoError::SchemaMismatch(..))));
}

#[test]
fn graph_undefined_feature() {
    let mut graph = FeatureGraph::new(example_schema(), Config::default());
    let result = graph.annotate(
        FeatureNodeBuilder::new("NamedEntity")
            .with_span(Offset::new(0, 4))
            .with_value("nosuchfeature", "x"),
    );
    assert!(matches!(result, Err(AnnoError::UndefinedFeature(..))));
}

#[test]
fn graph_reference_wrong_type() {
    let mut graph = FeatureGraph::new(example_schema(), Config::default());
    let entity = graph
        .annotate(
            FeatureNodeBuilder::new("NamedEntity")
                .with_span(Offset::new(0, 4))
                .with_value("value", "PER"),
        )
        .expect("adding entity");
    //anchor expects a Token, not a NamedEntity
    let result = graph.annotate(
        FeatureNodeBuilder::new("NamedEntity")
            .with_span(Offset::new(5, 7))
            .with_value("anchor", entity),
    );
    assert!(matches!(result, Err(AnnoError::SchemaMismatch(..))));
}

#[test]
fn signature_deterministic() {
    let build = || {
        let mut graph = FeatureGraph::new(example_schema(), Config::default());
        let token = graph
            .annotate(
                FeatureNodeBuilder::new("Token")
                    .with_id("t1")
                    .with_span(Offset::new(0, 4)),
            )
            .expect("adding token");
        let entity = graph
            .annotate(
                FeatureNodeBuilder::new("NamedEntity")
                    .with_span(Offset::new(0, 4))
                    .with_value("value", "PER")
                    .with_value("anchor", token),
            )
            .expect("adding entity");
        (graph, entity)
    };
    let (graph1, entity1) = build();
    let (graph2, entity2) = build();
    let leaf = graph1.schema().resolve("Token").ok();

    //traversing the same graph twice yields identical signatures
    let sig_a = graph1
        .position_signature(entity1, leaf)
        .expect("signature");
    let sig_b = graph1
        .position_signature(entity1, leaf)
        .expect("signature");
    assert_eq!(sig_a, sig_b);

    //two structurally identical but distinct graph instances yield identical signatures
    let sig_c = graph2
        .position_signature(entity2, leaf)
        .expect("signature");
    assert_eq!(sig_a.as_str(), sig_c.as_str());
}

#[test]
fn signature_differs_by_span() {
    let mut graph = FeatureGraph::new(example_schema(), Config::default());
    let entity1 = graph
        .annotate(
            FeatureNodeBuilder::new("NamedEntity")
                .with_span(Offset::new(0, 4))
                .with_value("value", "PER"),
        )
        .expect("adding entity");
    let entity2 = graph
        .annotate(
            FeatureNodeBuilder::new("NamedEntity")
                .with_span(Offset::new(5, 7))
                .with_value("value", "PER"),
        )
        .expect("adding entity");
    let sig1 = graph.position_signature(entity1, None).expect("signature");
    let sig2 = graph.position_signature(entity2, None).expect("signature");
    assert_ne!(sig1, sig2);
}

#[test]
fn signature_leaf_boundary() {
    //a leaf-type reference is a traversal boundary and contributes nothing: an entity
    //with an anchor token and one without must produce the same signature
    let mut graph = FeatureGraph::new(example_schema(), Config::default());
    let token = graph
        .annotate(
            FeatureNodeBuilder::new("Token")
                .with_id("t1")
                .with_span(Offset::new(0, 4)),
        )
        .expect("adding token");
    let anchored = graph
        .annotate(
            FeatureNodeBuilder::new("NamedEntity")
                .with_span(Offset::new(0, 4))
                .with_value("value", "PER")
                .with_value("anchor", token),
        )
        .expect("adding entity");
    let unanchored = graph
        .annotate(
            FeatureNodeBuilder::new("NamedEntity")
                .with_span(Offset::new(0, 4))
                .with_value("value", "PER"),
        )
        .expect("adding entity");
    let leaf = graph.schema().resolve("Token").ok();
    let sig1 = graph.position_signature(anchored, leaf).expect("signature");
    let sig2 = graph
        .position_signature(unanchored, leaf)
        .expect("signature");
    assert_eq!(sig1, sig2);
}

#[test]
fn signature_same_type_reference() {
    //a reference to a node of the root's own type contributes its position only
    let mut graph = FeatureGraph::new(example_schema(), Config::default());
    let head = graph
        .annotate(
            FeatureNodeBuilder::new("Relation")
                .with_span(Offset::new(5, 7))
                .with_value("label", "b"),
        )
        .expect("adding relation");
    let root = graph
        .annotate(
            FeatureNodeBuilder::new("Relation")
                .with_span(Offset::new(0, 4))
                .with_value("label", "a")
                .with_value("head", head),
        )
        .expect("adding relation");
    let signature = graph.position_signature(root, None).expect("signature");
    assert_eq!(signature.parts(), &["Relation 0-4", "Relation 5-7"]);
    //neither the root's own label nor the referenced relation's label is part of the
    //position, only spans are
    assert!(!signature.as_str().contains("label="));
}

#[test]
fn signature_label_insensitive() {
    //two annotations at the same span with different labels are the *same position*;
    //the signature is the position identity, labels are compared downstream
    let mut graph = FeatureGraph::new(example_schema(), Config::default());
    let per = graph
        .annotate(
            FeatureNodeBuilder::new("NamedEntity")
                .with_span(Offset::new(0, 4))
                .with_value("value", "PER"),
        )
        .expect("adding entity");
    let org = graph
        .annotate(
            FeatureNodeBuilder::new("NamedEntity")
                .with_span(Offset::new(0, 4))
                .with_value("value", "ORG"),
        )
        .expect("adding entity");
    let sig_per = graph.position_signature(per, None).expect("signature");
    let sig_org = graph.position_signature(org, None).expect("signature");
    assert_eq!(sig_per, sig_org);
}

#[test]
fn signature_includes_referenced_values() {
    //primitive values of *referenced* nodes are part of the position identity
    let mut graph = FeatureGraph::new(example_schema(), Config::default());
    let morph1 = graph
        .annotate(
            FeatureNodeBuilder::new("Morph")
                .with_span(Offset::new(0, 4))
                .with_value("lemma", "run"),
        )
        .expect("adding morph");
    let morph2 = graph
        .annotate(
            FeatureNodeBuilder::new("Morph")
                .with_span(Offset::new(0, 4))
                .with_value("lemma", "ran"),
        )
        .expect("adding morph");
    let entity1 = graph
        .annotate(
            FeatureNodeBuilder::new("NamedEntity")
                .with_span(Offset::new(0, 4))
                .with_value("morph", morph1),
        )
        .expect("adding entity");
    let entity2 = graph
        .annotate(
            FeatureNodeBuilder::new("NamedEntity")
                .with_span(Offset::new(0, 4))
                .with_value("morph", morph2),
        )
        .expect("adding entity");
    let sig1 = graph.position_signature(entity1, None).expect("signature");
    let sig2 = graph.position_signature(entity2, None).expect("signature");
    assert!(sig1.as_str().contains("lemma=run"));
    assert_ne!(sig1, sig2);
}

#[test]
fn signature_terminates_on_cycles() {
    let mut graph = FeatureGraph::new(example_schema(), Config::default());
    let first = graph
        .annotate(
            FeatureNodeBuilder::new("Relation")
                .with_span(Offset::new(0, 4))
                .with_value("label", "a"),
        )
        .expect("adding relation");
    let second = graph
        .annotate(
            FeatureNodeBuilder::new("Relation")
                .with_span(Offset::new(5, 7))
                .with_value("label", "b")
                .with_value("head", first),
        )
        .expect("adding relation");
    //close the cycle
    graph
        .set_value(first, "head", second)
        .expect("closing the cycle");
    let signature = graph.position_signature(first, None).expect("signature");
    assert!(!signature.as_str().is_empty());
}

#[test]
fn signature_no_span() {
    let mut graph = FeatureGraph::new(example_schema(), Config::default());
    let entity = graph
        .annotate(FeatureNodeBuilder::new("NamedEntity").with_value("value", "PER"))
        .expect("adding entity");
    let result = graph.position_signature(entity, None);
    assert!(matches!(result, Err(AnnoError::NoSpan(..))));
}

#[test]
fn signature_escaping() {
    //values containing delimiters must not make distinct structures render identically
    let mut graph = FeatureGraph::new(example_schema(), Config::default());
    let morph1 = graph
        .annotate(
            FeatureNodeBuilder::new("Morph")
                .with_span(Offset::new(0, 4))
                .with_value("lemma", "a b"),
        )
        .expect("adding morph");
    let morph2 = graph
        .annotate(
            FeatureNodeBuilder::new("Morph")
                .with_span(Offset::new(0, 4))
                .with_value("lemma", "a;b"),
        )
        .expect("adding morph");
    let entity1 = graph
        .annotate(
            FeatureNodeBuilder::new("NamedEntity")
                .with_span(Offset::new(0, 4))
                .with_value("morph", morph1),
        )
        .expect("adding entity");
    let entity2 = graph
        .annotate(
            FeatureNodeBuilder::new("NamedEntity")
                .with_span(Offset::new(0, 4))
                .with_value("morph", morph2),
        )
        .expect("adding entity");
    let sig1 = graph.position_signature(entity1, None).expect("signature");
    let sig2 = graph.position_signature(entity2, None).expect("signature");
    assert_ne!(sig1, sig2);
}

#[cfg(feature = "digest")]
#[test]
fn signature_digest() {
    let mut graph = FeatureGraph::new(example_schema(), Config::default());
    let entity = graph
        .annotate(
            FeatureNodeBuilder::new("NamedEntity")
                .with_span(Offset::new(0, 4))
                .with_value("value", "PER"),
        )
        .expect("adding entity");
    let signature = graph.position_signature(entity, None).expect("signature");
    let digest = signature.digest();
    assert_eq!(digest.len(), 40); //hex-encoded sha-1
    assert_eq!(digest, signature.digest()); //stable
}

#[test]
fn contingency_table() {
    let mut pairs = Vec::new();
    for _ in 0..20 {
        pairs.push((Label::from("A"), Label::from("A")));
    }
    for _ in 0..15 {
        pairs.push((Label::from("B"), Label::from("B")));
    }
    for _ in 0..5 {
        pairs.push((Label::from("A"), Label::from("B")));
    }
    for _ in 0..10 {
        pairs.push((Label::from("B"), Label::from("A")));
    }
    let table = ContingencyTable::from_pairs(pairs);
    assert_eq!(table.total(), 50);
    assert_eq!(table.count(&Label::from("A"), &Label::from("A")), 20);
    assert_eq!(table.count(&Label::from("B"), &Label::from("A")), 10);
    assert!((table.observed_agreement() - 0.7).abs() < 1e-10);
    assert!((table.expected_agreement() - 0.5).abs() < 1e-10);
    match table.kappa() {
        Agreement::Kappa(value) => assert!((value - 0.4).abs() < 1e-10),
        Agreement::NoData => panic!("expected a score"),
    }
}

#[test]
fn contingency_table_empty() {
    let table = ContingencyTable::from_pairs(Vec::new());
    assert_eq!(table.kappa(), Agreement::NoData);
}

#[test]
fn contingency_table_constant() {
    //both annotators constant and identical: chance agreement saturates but the result
    //must be a clean 1.0, not a division by zero
    let pairs = vec![
        (Label::from("X"), Label::from("X")),
        (Label::from("X"), Label::from("X")),
    ];
    assert_eq!(ContingencyTable::from_pairs(pairs).kappa(), Agreement::Kappa(1.0));
}

#[test]
fn label_ordering() {
    //the empty sentinel sorts before any value
    let mut labels = vec![Label::from("A"), Label::Empty, Label::from("0")];
    labels.sort();
    assert_eq!(labels[0], Label::Empty);
}

#[test]
fn agreement_missing_penalized() {
    //a missing annotation is penalized exactly like a disagreeing label
    let mut study = AgreementStudy::default();
    study.record("alice", PositionKey::new("doc1", "sig1"), "PER");
    study.record("alice", PositionKey::new("doc1", "sig2"), "ORG");
    study.record("bob", PositionKey::new("doc1", "sig1"), "PER");
    study.record("bob", PositionKey::new("doc1", "sig3"), "LOC");
    let agreement = study.kappa_between("alice", "bob").expect("both known");
    match agreement {
        Agreement::Kappa(value) => assert!((value - 1.0 / 7.0).abs() < 1e-10),
        Agreement::NoData => panic!("expected a score"),
    }
}

#[test]
fn agreement_cross_document_keys() {
    //identical signatures in different documents are distinct positions
    let key1 = PositionKey::new("doc1", "sig");
    let key2 = PositionKey::new("doc2", "sig");
    assert_ne!(key1, key2);
}

#[test]
fn agreement_no_data() {
    let mut study = AgreementStudy::default();
    study.add_annotator("alice");
    study.add_annotator("bob");
    assert_eq!(
        study.kappa_between("alice", "bob").expect("both known"),
        Agreement::NoData
    );
    assert!(study.kappa_between("alice", "nosuchuser").is_err());
}
