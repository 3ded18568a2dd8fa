use crate::core::matcher::{MatchOutcome, SourceIndex};
use crate::core::normalize::apply_sign;
use crate::core::validate::block_has_items;
use crate::domain::model::{Document, MergeSummary, Polarity};

/// Backfill missing service blocks in `target` from `source`.
///
/// Entries already satisfying the structural contract stay untouched;
/// everything else is resolved through the two-tier matcher and, on a hit,
/// receives a deep copy of the matched source block (optionally
/// sign-adjusted). The input `target` is never mutated; the result is a
/// fresh document plus a summary of what happened, stable across repeated
/// runs on identical input.
pub fn reconcile(
    source: &Document,
    target: &Document,
    polarity: Polarity,
) -> (Document, MergeSummary) {
    let index = SourceIndex::build(source);
    let mut updated = target.clone();
    let mut summary = MergeSummary {
        source_entries: source.beneficiaries.len(),
        target_entries: target.beneficiaries.len(),
        ..MergeSummary::default()
    };

    for entry in &mut updated.beneficiaries {
        if block_has_items(entry.services.as_ref()) {
            summary.already_satisfied += 1;
            continue;
        }

        let matched = match index.lookup(entry) {
            MatchOutcome::Full(found) => {
                summary.full_matches += 1;
                found
            }
            MatchOutcome::Fallback(found) => {
                summary.fallback_matches += 1;
                found
            }
            MatchOutcome::Miss(key) => {
                tracing::debug!("No source entry for beneficiary {}", key);
                summary.unmatched.push(key);
                continue;
            }
        };

        let mut block = matched.services.clone().unwrap_or_default();
        if let Some(factor) = polarity.factor() {
            apply_sign(&mut block, factor);
        }
        entry.services = Some(block);
        summary.modified += 1;
    }

    (updated, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CategoryLines, Scalar, ServiceBlock};

    fn doc(raw: &str) -> Document {
        serde_json::from_str(raw).unwrap()
    }

    fn service_value(document: &Document, entry: usize, category: &str, line: usize) -> Scalar {
        document.beneficiaries[entry]
            .line_at(category, line)
            .unwrap()
            .get("serviceValue")
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_backfill_with_negative_polarity() {
        let source = doc(r#"{"beneficiaries": [
            {"documentTypeCode": "CC", "documentNumber": "123",
             "services": {"consultations": [{"serviceValue": 100}]}}
        ]}"#);
        let target = doc(r#"{"beneficiaries": [
            {"documentTypeCode": "CC", "documentNumber": "123", "services": {}}
        ]}"#);

        let (updated, summary) = reconcile(&source, &target, Polarity::Negative);

        assert_eq!(summary.modified, 1);
        assert_eq!(summary.full_matches, 1);
        assert_eq!(summary.already_satisfied, 0);
        assert!(summary.unmatched.is_empty());
        assert_eq!(
            service_value(&updated, 0, "consultations", 0),
            Scalar::Int(-100)
        );
        // Source values keep their original sign.
        assert_eq!(
            service_value(&source, 0, "consultations", 0),
            Scalar::Int(100)
        );
    }

    #[test]
    fn test_satisfied_entries_are_left_alone() {
        let source = doc(r#"{"beneficiaries": [
            {"documentTypeCode": "CC", "documentNumber": "1",
             "services": {"consultations": [{"serviceValue": 999}]}}
        ]}"#);
        let target = doc(r#"{"beneficiaries": [
            {"documentTypeCode": "CC", "documentNumber": "1",
             "services": {"procedures": [{"serviceValue": 5}]}}
        ]}"#);

        let (updated, summary) = reconcile(&source, &target, Polarity::Keep);

        assert_eq!(summary.already_satisfied, 1);
        assert_eq!(summary.modified, 0);
        assert_eq!(updated, target);
    }

    #[test]
    fn test_unmatched_entries_stay_invalid_and_are_reported() {
        let source = doc(r#"{"beneficiaries": [
            {"documentTypeCode": "CC", "documentNumber": "1",
             "services": {"consultations": [{"serviceValue": 1}]}}
        ]}"#);
        let target = doc(r#"{"beneficiaries": [
            {"documentTypeCode": "CC", "documentNumber": "2", "services": {}}
        ]}"#);

        let (updated, summary) = reconcile(&source, &target, Polarity::Keep);

        assert_eq!(summary.modified, 0);
        assert_eq!(summary.unmatched.len(), 1);
        assert_eq!(summary.unmatched[0].to_string(), "CC/2");
        assert_eq!(updated, target);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let source = doc(r#"{"beneficiaries": [
            {"documentTypeCode": "CC", "documentNumber": "1",
             "services": {"consultations": [{"serviceValue": 10}]}},
            {"documentTypeCode": "CC", "documentNumber": "2",
             "services": {"procedures": [{"serviceValue": 20, "copaymentValue": 2}]}}
        ]}"#);
        let target = doc(r#"{"beneficiaries": [
            {"documentTypeCode": "CC", "documentNumber": "1"},
            {"documentTypeCode": "CC", "documentNumber": "2", "services": {}},
            {"documentTypeCode": "CC", "documentNumber": "9"}
        ]}"#);

        let (first, first_summary) = reconcile(&source, &target, Polarity::Negative);
        assert_eq!(first_summary.modified, 2);

        let (second, second_summary) = reconcile(&source, &first, Polarity::Negative);
        assert_eq!(second_summary.modified, 0);
        assert_eq!(second_summary.already_satisfied, 2);
        assert_eq!(second_summary.unmatched.len(), 1);
        assert_eq!(second, first);
    }

    #[test]
    fn test_copied_block_is_independent_of_source() {
        let source = doc(r#"{"beneficiaries": [
            {"documentTypeCode": "CC", "documentNumber": "1",
             "services": {"consultations": [{"serviceValue": 10}]}}
        ]}"#);
        let target = doc(r#"{"beneficiaries": [
            {"documentTypeCode": "CC", "documentNumber": "1"}
        ]}"#);

        let (mut updated, _) = reconcile(&source, &target, Polarity::Keep);

        // Mutating the copy must not reach back into the source document.
        if let Some(ServiceBlock::Categories(categories)) =
            updated.beneficiaries[0].services.as_mut()
        {
            if let Some(CategoryLines::Lines(lines)) = categories.get_mut("consultations") {
                lines[0].insert("serviceValue".to_string(), Scalar::Int(-555));
            }
        }
        assert_eq!(
            service_value(&source, 0, "consultations", 0),
            Scalar::Int(10)
        );
    }
}
