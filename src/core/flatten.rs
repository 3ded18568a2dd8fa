use crate::domain::model::{
    BeneficiaryEntry, Document, EditRow, Scalar, ServiceBlock, ABSENT_LINE_SENTINEL,
    SERVICE_VALUE_FIELD,
};
use std::collections::BTreeSet;

/// Union of every field name observed on any service line of either
/// document. Sorted, so the bulk-edit surface gets a deterministic column
/// order no matter how the documents were assembled.
pub fn field_union(source: Option<&Document>, target: Option<&Document>) -> Vec<String> {
    let mut names = BTreeSet::new();
    for document in [source, target].into_iter().flatten() {
        for entry in &document.beneficiaries {
            let Some(ServiceBlock::Categories(categories)) = entry.services.as_ref() else {
                continue;
            };
            for lines in categories.values() {
                let Some(lines) = lines.as_lines() else {
                    continue;
                };
                for line in lines {
                    names.extend(line.keys().cloned());
                }
            }
        }
    }
    names.into_iter().collect()
}

/// One row per (category, line index) of the entry's block, each carrying
/// every union field (null when the line lacks it) and the list of fields
/// that are blank on that line. Malformed categories contribute nothing.
pub fn flatten_entry(index: usize, entry: &BeneficiaryEntry, union: &[String]) -> Vec<EditRow> {
    let mut rows = Vec::new();
    let Some(ServiceBlock::Categories(categories)) = entry.services.as_ref() else {
        return rows;
    };

    for (category, lines) in categories {
        let Some(lines) = lines.as_lines() else {
            continue;
        };
        for (line_index, line) in lines.iter().enumerate() {
            let mut fields = std::collections::BTreeMap::new();
            let mut missing_fields = Vec::new();
            for name in union {
                let value = line.get(name).cloned().unwrap_or(Scalar::Null);
                if value.is_blank() {
                    missing_fields.push(name.clone());
                }
                fields.insert(name.clone(), value);
            }
            rows.push(EditRow {
                beneficiary_index: index,
                category: category.clone(),
                line_index,
                desired_service_value: Scalar::Null,
                reference_service_value: Scalar::Null,
                fields,
                missing_fields,
            });
        }
    }
    rows
}

/// Whole-document projection backing the bulk-edit surface.
///
/// Target entries that flatten to rows emit them with the current
/// `serviceValue` pre-filled as the desired value (re-applying an unedited
/// template changes nothing) and the positional source counterpart's value
/// attached for reference. Entries with no rows of their own borrow the
/// counterpart's rows instead, desired value left blank and the
/// missing-fields sentinel marking the whole line as absent from the
/// target. Entries with rows on neither side contribute nothing.
pub fn build_template(target: &Document, source: Option<&Document>) -> Vec<EditRow> {
    let union = field_union(source, Some(target));
    let mut rows = Vec::new();

    for (index, entry) in target.beneficiaries.iter().enumerate() {
        let counterpart = source.and_then(|source| source.beneficiaries.get(index));

        let mut own = flatten_entry(index, entry, &union);
        if !own.is_empty() {
            for row in &mut own {
                row.desired_service_value = row
                    .fields
                    .get(SERVICE_VALUE_FIELD)
                    .cloned()
                    .unwrap_or(Scalar::Null);
                row.reference_service_value = counterpart
                    .and_then(|counterpart| counterpart.line_at(&row.category, row.line_index))
                    .and_then(|line| line.get(SERVICE_VALUE_FIELD))
                    .cloned()
                    .unwrap_or(Scalar::Null);
            }
            rows.append(&mut own);
            continue;
        }

        let Some(counterpart) = counterpart else {
            continue;
        };
        let mut borrowed = flatten_entry(index, counterpart, &union);
        for row in &mut borrowed {
            row.reference_service_value = row
                .fields
                .get(SERVICE_VALUE_FIELD)
                .cloned()
                .unwrap_or(Scalar::Null);
            row.desired_service_value = Scalar::Null;
            row.missing_fields = vec![ABSENT_LINE_SENTINEL.to_string()];
        }
        rows.append(&mut borrowed);
    }
    rows
}
