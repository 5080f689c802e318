//! Public-API checks for the worked scoring examples

use anon_core::{ExampleMetadata, Facet, GoldExample, IdentifierClass, Prediction};
use anon_scoring::{
    composite_score, evaluate_system, extract_placeholders, score_pair, CompositeScorer,
    MultiSystemRunner, SystemPredictions,
};

#[test]
fn test_identical_text_is_perfect() {
    let r = score_pair(
        "Pacientas [Vardas] serga.",
        "Pacientas [Vardas] serga.",
        IdentifierClass::Direct,
    );
    assert_eq!((r.true_positive, r.false_positive, r.false_negative), (1, 0, 0));
    assert_eq!(r.f1, 1.0);
}

#[test]
fn test_missed_direct_tag_zeroes_f1() {
    let r = score_pair("[ID] [Vardas]", "[Vardas]", IdentifierClass::Direct);
    assert_eq!((r.true_positive, r.false_positive, r.false_negative), (1, 0, 1));
    assert!(r.missed_direct);
    assert_eq!(r.f1, 0.0);

    // The same pair scored as indirect keeps its raw F1
    let raw = score_pair("[ID] [Vardas]", "[Vardas]", IdentifierClass::Indirect);
    assert!((raw.f1 - 0.667).abs() < 0.001);
}

#[test]
fn test_over_tagging_counts_false_positive() {
    let r = score_pair("[Miestas]", "[Miestas] [Miestas]", IdentifierClass::Indirect);
    assert_eq!((r.true_positive, r.false_positive, r.false_negative), (1, 1, 0));
    assert_eq!(r.precision, 0.5);
    assert_eq!(r.recall, 1.0);
    assert!((r.f1 - 0.667).abs() < 0.001);
}

#[test]
fn test_extractor_keeps_lithuanian_labels() {
    let tags = extract_placeholders("[Vardas_Pavardė], [El. paštas] ir [Tel. numeris]");
    assert_eq!(tags.total(), 3);
    assert!(tags.contains("[El. paštas]"));
}

#[test]
fn test_composite_weighting() {
    assert!((composite_score(1.0, 0.0, 0.8) - 0.8).abs() < 1e-9);
    assert!((composite_score(0.0, 1.0, 0.8) - 0.2).abs() < 1e-9);
    assert!(CompositeScorer::new(-0.1).is_err());
}

#[test]
fn test_corpus_report_with_breakdown() {
    let gold = vec![
        GoldExample::new("a", "[Vardas] gyvena [Miestas].").with_metadata(
            ExampleMetadata::default()
                .with_facet(Facet::PromptType, "Zero-Shot")
                .with_facet(Facet::TextLength, "Short Sentences"),
        ),
        GoldExample::new("b", "[Miestas]")
            .with_class(IdentifierClass::Indirect)
            .with_metadata(ExampleMetadata::default().with_facet(Facet::PromptType, "Few-Shot")),
    ];
    let preds = vec![
        Prediction::new("a", "[Vardas] gyvena [Miestas]."),
        Prediction::new("b", "Vilnius"),
    ];

    let report = evaluate_system(&gold, &preds, &CompositeScorer::default());

    assert_eq!(report.num_direct, 1);
    assert_eq!(report.num_indirect, 1);
    assert_eq!(report.perfect_examples, 1);
    assert!((report.macro_f1 - 0.5).abs() < 1e-9);
    assert!((report.composite - 0.8).abs() < 1e-9);

    let breakdown = report.breakdown.unwrap();
    assert_eq!(breakdown.ratio(Facet::PromptType, "Zero-Shot").as_deref(), Some("1/1"));
    assert_eq!(breakdown.ratio(Facet::PromptType, "Few-Shot").as_deref(), Some("0/1"));
    assert_eq!(breakdown.ratio(Facet::TextLength, "Long Paragraphs").as_deref(), Some("0/0"));
}

#[test]
fn test_runner_reports_every_system() {
    let runner = MultiSystemRunner::new(
        vec![GoldExample::new("1", "[El. paštas]")],
        CompositeScorer::default(),
    );
    let comparison = runner.run(&[
        SystemPredictions::new("chatgpt", vec![Prediction::new("1", "[El. paštas]")]),
        SystemPredictions::new("lt_llama", vec![Prediction::new("1", "[Vardas]")]),
    ]);

    assert_eq!(comparison.systems.len(), 2);
    assert_eq!(comparison.ranking()[0].0, "chatgpt");
    assert_eq!(comparison.system("lt_llama").unwrap().gated_examples, 1);
}
