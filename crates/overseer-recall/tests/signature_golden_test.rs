use overseer_recall::{normalize, SignatureNormalizer};
use test_fixtures::load_signature_golden;

#[test]
fn golden_cases_normalize_exactly() {
    let golden = load_signature_golden();
    for case in &golden.cases {
        assert_eq!(normalize(&case.input), case.expected, "case {}", case.name);
    }
}

#[test]
fn equivalence_groups_share_a_signature() {
    let golden = load_signature_golden();
    for group in &golden.equivalent {
        let first = normalize(&group.messages[0]);
        for message in &group.messages[1..] {
            assert_eq!(normalize(message), first, "group {}", group.name);
        }
    }
}

#[test]
fn golden_signatures_are_fixed_points() {
    let golden = load_signature_golden();
    let normalizer = SignatureNormalizer::default();
    for case in &golden.cases {
        assert_eq!(normalizer.normalize(&case.expected), case.expected, "case {}", case.name);
    }
}
