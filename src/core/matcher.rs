use crate::domain::model::{BeneficiaryEntry, BeneficiaryKey, Document};
use std::collections::HashMap;

/// How a target entry was resolved against the source document. The tier
/// is part of the contract so callers and tests can tell a precise
/// composite-key hit from the looser by-number fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome<'a> {
    /// Composite key `(documentTypeCode, documentNumber)` hit.
    Full(&'a BeneficiaryEntry),
    /// Only the document number matched; type codes disagree between the
    /// two documents.
    Fallback(&'a BeneficiaryEntry),
    /// Neither tier answered; the probed key is kept for diagnostics.
    Miss(BeneficiaryKey),
}

/// Lookup indexes over the source document, built once per pass. Entries
/// missing either key component enter neither index.
pub struct SourceIndex<'a> {
    by_composite: HashMap<(String, String), &'a BeneficiaryEntry>,
    by_number: HashMap<String, &'a BeneficiaryEntry>,
}

impl<'a> SourceIndex<'a> {
    pub fn build(source: &'a Document) -> Self {
        let mut by_composite = HashMap::new();
        let mut by_number = HashMap::new();

        for entry in &source.beneficiaries {
            let key = BeneficiaryKey::of(entry);
            let Some((type_code, number)) = key.composite() else {
                continue;
            };
            by_composite.insert((type_code, number.clone()), entry);
            // Last write wins on duplicate numbers; fallback resolution is
            // ambiguous in that case, so make the overwrite observable.
            if by_number.insert(number.clone(), entry).is_some() {
                tracing::debug!(
                    "Duplicate documentNumber '{}' in source; fallback index keeps the later entry",
                    number
                );
            }
        }

        Self {
            by_composite,
            by_number,
        }
    }

    /// Probe the composite index first, then fall back to the by-number
    /// index. This tolerates minor type-code discrepancies between the two
    /// documents while preferring the precise match.
    pub fn lookup(&self, entry: &BeneficiaryEntry) -> MatchOutcome<'a> {
        let key = BeneficiaryKey::of(entry);

        if let Some(composite) = key.composite() {
            if let Some(found) = self.by_composite.get(&composite) {
                return MatchOutcome::Full(found);
            }
        }

        if let Some(number) = key.number.as_ref() {
            if let Some(found) = self.by_number.get(number) {
                return MatchOutcome::Fallback(found);
            }
        }

        MatchOutcome::Miss(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(raw: &str) -> Document {
        serde_json::from_str(raw).unwrap()
    }

    fn entry(raw: &str) -> BeneficiaryEntry {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_composite_match_beats_fallback() {
        // Two source entries share a number under different type codes.
        let source = doc(r#"{"beneficiaries": [
            {"documentTypeCode": "CC", "documentNumber": "123",
             "services": {"consultations": [{"serviceValue": 1}]}},
            {"documentTypeCode": "TI", "documentNumber": "123",
             "services": {"consultations": [{"serviceValue": 2}]}}
        ]}"#);
        let index = SourceIndex::build(&source);

        let probe = entry(r#"{"documentTypeCode": "CC", "documentNumber": "123"}"#);
        match index.lookup(&probe) {
            MatchOutcome::Full(found) => {
                assert_eq!(
                    found.document_type_code.as_ref().unwrap().key_text().unwrap(),
                    "CC"
                );
            }
            other => panic!("expected a full match, got {:?}", other),
        }
    }

    #[test]
    fn test_fallback_fires_when_type_codes_disagree() {
        let source = doc(r#"{"beneficiaries": [
            {"documentTypeCode": "CC", "documentNumber": "123",
             "services": {"consultations": [{"serviceValue": 1}]}}
        ]}"#);
        let index = SourceIndex::build(&source);

        let probe = entry(r#"{"documentTypeCode": "TI", "documentNumber": "123"}"#);
        assert!(matches!(index.lookup(&probe), MatchOutcome::Fallback(_)));
    }

    #[test]
    fn test_numeric_and_text_numbers_index_the_same() {
        let source = doc(r#"{"beneficiaries": [
            {"documentTypeCode": "CC", "documentNumber": 123}
        ]}"#);
        let index = SourceIndex::build(&source);

        let probe = entry(r#"{"documentTypeCode": "CC", "documentNumber": "123"}"#);
        assert!(matches!(index.lookup(&probe), MatchOutcome::Full(_)));
    }

    #[test]
    fn test_miss_carries_the_probed_key() {
        let source = doc(r#"{"beneficiaries": []}"#);
        let index = SourceIndex::build(&source);

        let probe = entry(r#"{"documentTypeCode": "CC", "documentNumber": "999"}"#);
        match index.lookup(&probe) {
            MatchOutcome::Miss(key) => assert_eq!(key.to_string(), "CC/999"),
            other => panic!("expected a miss, got {:?}", other),
        }
    }

    #[test]
    fn test_entries_without_keys_enter_no_index() {
        let source = doc(r#"{"beneficiaries": [
            {"documentNumber": "77"},
            {"documentTypeCode": "CC"}
        ]}"#);
        let index = SourceIndex::build(&source);

        let probe = entry(r#"{"documentTypeCode": "CC", "documentNumber": "77"}"#);
        assert!(matches!(index.lookup(&probe), MatchOutcome::Miss(_)));
    }

    #[test]
    fn test_fallback_is_last_write_wins() {
        let source = doc(r#"{"beneficiaries": [
            {"documentTypeCode": "CC", "documentNumber": "5",
             "services": {"consultations": [{"serviceValue": 1}]}},
            {"documentTypeCode": "TI", "documentNumber": "5",
             "services": {"consultations": [{"serviceValue": 2}]}}
        ]}"#);
        let index = SourceIndex::build(&source);

        // No composite hit for "CE", so the fallback answers with the later
        // source entry.
        let probe = entry(r#"{"documentTypeCode": "CE", "documentNumber": "5"}"#);
        match index.lookup(&probe) {
            MatchOutcome::Fallback(found) => {
                assert_eq!(
                    found.document_type_code.as_ref().unwrap().key_text().unwrap(),
                    "TI"
                );
            }
            other => panic!("expected a fallback match, got {:?}", other),
        }
    }
}
