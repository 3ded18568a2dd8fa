use crate::domain::model::{
    BeneficiaryKey, CategoryLines, Document, EntryOverview, ServiceBlock,
};

/// Minimum structural contract of a service block: at least one category
/// must hold a non-empty line list. A missing or malformed block fails.
pub fn block_has_items(block: Option<&ServiceBlock>) -> bool {
    match block {
        Some(ServiceBlock::Categories(categories)) => categories
            .values()
            .any(|lines| lines.as_lines().is_some_and(|lines| !lines.is_empty())),
        _ => false,
    }
}

/// Post-merge audit: indices of entries still failing the contract, in
/// document order. Reported as a warning, never blocks output.
pub fn invalid_entry_indices(document: &Document) -> Vec<usize> {
    document
        .beneficiaries
        .iter()
        .enumerate()
        .filter(|(_, entry)| !block_has_items(entry.services.as_ref()))
        .map(|(index, _)| index)
        .collect()
}

/// Per-entry view for the run summary artifact.
pub fn entry_overviews(document: &Document) -> Vec<EntryOverview> {
    document
        .beneficiaries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let mut category_count = 0;
            let mut line_count = 0;
            if let Some(ServiceBlock::Categories(categories)) = entry.services.as_ref() {
                for lines in categories.values() {
                    if let Some(lines) = lines.as_lines() {
                        category_count += 1;
                        line_count += lines.len();
                    }
                }
            }
            EntryOverview {
                index,
                key: BeneficiaryKey::of(entry),
                satisfied: block_has_items(entry.services.as_ref()),
                category_count,
                line_count,
            }
        })
        .collect()
}
