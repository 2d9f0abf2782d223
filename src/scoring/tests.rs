use super::*;

fn forms(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

fn entry(predicted: &[&str], gold: &[&str]) -> CorpusEntry {
    CorpusEntry {
        predicted: Some(predicted.iter().copied().collect()),
        gold: Some(gold.iter().copied().collect()),
    }
}

#[test]
fn single_document_counts_and_ratios() {
    let counts = score_sets(&forms(&["f1040s1", "f8889"]), &forms(&["f1040s1", "f8949"]));
    assert_eq!(counts, ScoreCounts::new(1, 1, 1));

    let metrics = AggregateMetrics::from_totals(counts);
    assert_eq!(metrics.precision, 0.5);
    assert_eq!(metrics.recall, 0.5);
    assert_eq!(metrics.f1_score, 0.5);
}

#[test]
fn counts_satisfy_set_identities() {
    let cases = [
        (vec!["f8949", "1040f", "f1040sd"], vec!["f8949", "f1040se"]),
        (vec![], vec!["f8889"]),
        (vec!["f1040sa"], vec![]),
        (vec!["f1040sb", "f1040sc"], vec!["f1040sb", "f1040sc"]),
    ];

    for (predicted, gold) in cases {
        let predicted = forms(&predicted);
        let gold = forms(&gold);
        let counts = score_sets(&predicted, &gold);
        assert_eq!(counts.true_positives + counts.false_negatives, gold.len());
        assert_eq!(counts.true_positives + counts.false_positives, predicted.len());
    }
}

#[test]
fn empty_document_contributes_nothing() {
    let vocabulary = Vocabulary::desired_forms();
    let mut entries = BTreeMap::new();
    entries.insert("empty.pdf".to_string(), entry(&[], &[]));

    let score = score_corpus(&entries, &vocabulary);
    assert_eq!(score.per_document["empty.pdf"], ScoreCounts::default());
    assert_eq!(score.metrics.precision, 0.0);
    assert_eq!(score.metrics.recall, 0.0);
    assert_eq!(score.metrics.f1_score, 0.0);

    entries.insert("a.pdf".to_string(), entry(&["f8949"], &["f8949", "1040f"]));
    let score = score_corpus(&entries, &vocabulary);
    assert_eq!(score.metrics.totals, ScoreCounts::new(1, 0, 1));
    assert_eq!(score.metrics.precision, 1.0);
    assert_eq!(score.metrics.recall, 0.5);
}

#[test]
fn corpus_aggregate_is_micro_averaged() {
    let totals = ScoreCounts::new(4, 1, 1) + ScoreCounts::new(6, 1, 2);
    assert_eq!(totals, ScoreCounts::new(10, 2, 3));

    let overall = AggregateMetrics::from_totals(totals).to_overall();
    assert_eq!(overall.total_true_positives, 10);
    assert_eq!(overall.total_false_positives, 2);
    assert_eq!(overall.total_false_negatives, 3);
    assert_eq!(overall.precision, 0.8333);
    assert_eq!(overall.recall, 0.7692);
    assert_eq!(overall.f1_score, 0.8);
}

#[test]
fn micro_average_matches_combined_pseudo_document() {
    let vocabulary = Vocabulary::desired_forms();
    let mut entries = BTreeMap::new();
    entries.insert(
        "a.pdf".to_string(),
        entry(&["1040f", "f8949", "f1040sd"], &["1040f", "f8949", "f1040se"]),
    );
    entries.insert("b.pdf".to_string(), entry(&["f8889"], &["f1040sa", "f1040sb"]));
    let corpus = score_corpus(&entries, &vocabulary);

    // Prefix identifiers per document so the union stays disjoint.
    let mut predicted = BTreeSet::new();
    let mut gold = BTreeSet::new();
    for (name, entry) in &entries {
        for form in entry.predicted.as_ref().unwrap().forms() {
            predicted.insert(format!("{name}:{form}"));
        }
        for form in entry.gold.as_ref().unwrap().forms() {
            gold.insert(format!("{name}:{form}"));
        }
    }
    let combined = AggregateMetrics::from_totals(score_sets(&predicted, &gold));

    assert_eq!(corpus.metrics.totals, combined.totals);
    assert_eq!(corpus.metrics.precision, combined.precision);
    assert_eq!(corpus.metrics.recall, combined.recall);
    assert_eq!(corpus.metrics.f1_score, combined.f1_score);
}

#[test]
fn aggregate_is_order_independent() {
    let parts = [
        ScoreCounts::new(4, 1, 1),
        ScoreCounts::new(6, 1, 2),
        ScoreCounts::new(0, 3, 0),
    ];
    let forward = parts.iter().copied().sum::<ScoreCounts>();
    let backward = parts.iter().rev().copied().sum::<ScoreCounts>();
    assert_eq!(forward, backward);
}

#[test]
fn forms_outside_vocabulary_are_not_scored() {
    let vocabulary = Vocabulary::desired_forms();
    let predicted = ["f8949", "f8879", "f2441"].into_iter().collect::<DetectionResult>();
    let gold = ["f8949", "f8995"].into_iter().collect::<GoldLabel>();

    assert_eq!(
        score_document(&predicted, &gold, &vocabulary),
        ScoreCounts::new(1, 0, 0)
    );
}

#[test]
fn missing_sides_are_label_mismatches_not_errors() {
    let vocabulary = Vocabulary::desired_forms();
    let mut entries = BTreeMap::new();
    entries.insert(
        "unlabeled.pdf".to_string(),
        CorpusEntry {
            predicted: Some(["1040f", "f8949"].into_iter().collect()),
            gold: None,
        },
    );
    entries.insert(
        "unpredicted.pdf".to_string(),
        CorpusEntry {
            predicted: None,
            gold: Some(["f8889"].into_iter().collect()),
        },
    );

    let score = score_corpus(&entries, &vocabulary);
    assert_eq!(score.per_document["unlabeled.pdf"], ScoreCounts::new(0, 2, 0));
    assert_eq!(score.per_document["unpredicted.pdf"], ScoreCounts::new(0, 0, 1));
    assert_eq!(
        score.mismatches,
        vec![
            LabelMismatch::MissingGold {
                document: "unlabeled.pdf".to_string()
            },
            LabelMismatch::MissingPrediction {
                document: "unpredicted.pdf".to_string()
            },
        ]
    );
}

#[test]
fn report_serializes_in_expected_shape() {
    let vocabulary = Vocabulary::desired_forms();
    let mut entries = BTreeMap::new();
    entries.insert("a.pdf".to_string(), entry(&["f1040s1", "f8889"], &["f1040s1", "f8949"]));

    let report = score_corpus(&entries, &vocabulary).report();
    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "overall_metrics": {
                "total_true_positives": 1,
                "total_false_positives": 1,
                "total_false_negatives": 1,
                "precision": 0.5,
                "recall": 0.5,
                "f1_score": 0.5
            },
            "per_file_results": {
                "a.pdf": {"tp": 1, "fp": 1, "fn": 1}
            }
        })
    );
}
