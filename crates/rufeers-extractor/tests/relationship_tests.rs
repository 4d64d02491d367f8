//! Relationship extraction and evaluation integration tests

use proptest::prelude::*;

use rufeers_core::{DocumentBuilder, ParsedDocument, RelationshipTriple, Token};
use rufeers_extractor::{
    evaluate, extract_relationships, Analyzer, DocumentLoader, SpacyJsonLoader,
};

const KHAN_JSON: &str = r#"{
    "text": "Khan arrested the High Court",
    "ents": [
        {"start": 0, "end": 4, "label": "PERSON"},
        {"start": 14, "end": 28, "label": "LOC"}
    ],
    "tokens": [
        {"id": 0, "start": 0, "end": 4, "dep": "nsubjpass", "head": 1},
        {"id": 1, "start": 5, "end": 13, "dep": "ROOT", "head": 1},
        {"id": 2, "start": 14, "end": 28, "dep": "loc", "head": 1}
    ]
}"#;

#[test]
fn test_end_to_end_khan_scenario() {
    let doc = SpacyJsonLoader.load(KHAN_JSON).unwrap();
    let extracted = extract_relationships(&doc).unwrap();

    assert_eq!(
        extracted,
        vec![RelationshipTriple::new("Khan", "arrested", "the High Court")]
    );

    let ground_truth = vec![RelationshipTriple::from(("Khan", "arrested", "the High Court"))];
    let result = evaluate(&extracted, &ground_truth);
    assert_eq!((result.precision, result.recall, result.f1), (1.0, 1.0, 1.0));
}

#[test]
fn test_end_to_end_report() {
    let doc = SpacyJsonLoader.load(KHAN_JSON).unwrap();
    let report = Analyzer::new().analyze(&doc).unwrap();

    let text = report.report();
    assert!(text.contains("Khan arrested the High Court"));
    assert!(text.contains("Neutral Sentiment"));
}

// ============================================================================
// Property tests
// ============================================================================

/// Straightforward recursive form of the location search
fn reference_search<'d>(doc: &'d ParsedDocument, head: &Token) -> Option<&'d Token> {
    for &child in &head.children {
        let child = doc.token(child)?;
        if child.ent_type.as_deref() == Some("LOC") {
            return Some(child);
        }
        if let Some(found) = reference_search(doc, child) {
            return Some(found);
        }
    }
    None
}

fn reference_extract(doc: &ParsedDocument) -> Vec<RelationshipTriple> {
    let mut out = Vec::new();
    for entity in doc.entities().iter().filter(|e| e.label == "PERSON") {
        let head = doc.head_of(entity.root).unwrap();
        if let Some(location) = reference_search(doc, head) {
            out.push(RelationshipTriple::new(&entity.text, &head.text, &location.text));
        }
    }
    out
}

/// A random tree rooted at token 0 with single-token PERSON/LOC entities
fn arb_document() -> impl Strategy<Value = ParsedDocument> {
    prop::collection::vec((any::<usize>(), 0u8..4), 1..40).prop_map(|layout| {
        let mut builder = DocumentBuilder::new();
        for (i, (raw_head, _)) in layout.iter().enumerate() {
            let head = if i == 0 { 0 } else { raw_head % i };
            builder = builder.word(&format!("w{i}"), head, "dep");
        }
        for (i, (_, label)) in layout.iter().enumerate() {
            match label {
                0 => builder = builder.entity(i..i + 1, "PERSON"),
                1 => builder = builder.entity(i..i + 1, "LOC"),
                _ => {}
            }
        }
        builder.build().unwrap()
    })
}

fn arb_triples() -> impl Strategy<Value = Vec<RelationshipTriple>> {
    prop::collection::vec((0u8..3, 0u8..2, 0u8..3), 0..8).prop_map(|raw| {
        raw.into_iter()
            .map(|(p, a, l)| RelationshipTriple::new(format!("p{p}"), format!("a{a}"), format!("l{l}")))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_matches_recursive_search(doc in arb_document()) {
        prop_assert_eq!(extract_relationships(&doc).unwrap(), reference_extract(&doc));
    }

    #[test]
    fn prop_order_and_at_most_one_per_person(doc in arb_document()) {
        let persons: Vec<&str> = doc
            .entities()
            .iter()
            .filter(|e| e.label == "PERSON")
            .map(|e| e.text.as_str())
            .collect();
        let extracted = extract_relationships(&doc).unwrap();

        // Person texts are unique, so output persons must be a subsequence
        let mut cursor = persons.iter();
        for triple in &extracted {
            prop_assert!(cursor.any(|p| *p == triple.person));
        }
        prop_assert!(extracted.len() <= persons.len());
    }

    #[test]
    fn prop_location_is_labelled_descendant(doc in arb_document()) {
        for triple in extract_relationships(&doc).unwrap() {
            let location = doc.tokens().iter().find(|t| t.text == triple.location).unwrap();
            prop_assert_eq!(location.ent_type.as_deref(), Some("LOC"));
            prop_assert_ne!(&triple.location, &triple.action);

            // Walk up from the location until the action token is reached
            let mut current = location;
            let mut reached = false;
            for _ in 0..doc.len() {
                let head = doc.token(current.head).unwrap();
                if head.text == triple.action {
                    reached = true;
                    break;
                }
                if head.id == current.id {
                    break;
                }
                current = head;
            }
            prop_assert!(reached);
        }
    }

    #[test]
    fn prop_metrics_bounded(extracted in arb_triples(), truth in arb_triples()) {
        let result = evaluate(&extracted, &truth);
        for value in [result.precision, result.recall, result.f1] {
            prop_assert!((0.0..=1.0).contains(&value));
        }

        let swapped = evaluate(&truth, &extracted);
        prop_assert_eq!(result.precision, swapped.recall);
        prop_assert_eq!(result.true_positives, swapped.true_positives);
    }

    #[test]
    fn prop_self_evaluation_is_perfect(triples in arb_triples()) {
        let result = evaluate(&triples, &triples);
        if triples.is_empty() {
            prop_assert_eq!(result.f1, 0.0);
        } else {
            prop_assert_eq!(result.f1, 1.0);
        }
    }
}
