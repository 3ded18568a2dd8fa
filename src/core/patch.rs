use crate::domain::model::{
    CategoryLines, Document, EditRow, PatchIssue, PatchReport, ServiceBlock, ServiceLine,
    SERVICE_VALUE_FIELD,
};

/// Apply bulk-edit rows to `target`, synthesizing missing structure from
/// `source` on demand.
///
/// Rows with a blank desired value are no-ops, so a partially filled
/// template is fine. Every other row is processed independently in input
/// order: problems are accumulated in the report and never abort the
/// batch, and a row that errors leaves its line exactly as it was. Later
/// rows may reference structure created by earlier rows. `source` is only
/// ever read; the returned document is a fresh copy of `target`.
pub fn apply_edits(
    target: &Document,
    source: Option<&Document>,
    rows: &[EditRow],
) -> (Document, PatchReport) {
    let mut updated = target.clone();
    let mut report = PatchReport::default();

    for (position, row) in rows.iter().enumerate() {
        let row_number = position + 1;

        if row.desired_service_value.is_blank() {
            report.skipped += 1;
            continue;
        }

        if row.beneficiary_index >= updated.beneficiaries.len() {
            report.issues.push(PatchIssue::IndexOutOfRange {
                row: row_number,
                index: row.beneficiary_index,
                len: updated.beneficiaries.len(),
            });
            report.skipped += 1;
            continue;
        }

        // Parse before any mutation so a bad cell cannot leave a
        // half-installed synthesized line behind.
        let Some(desired) = row.desired_service_value.to_numeric() else {
            report.issues.push(PatchIssue::DesiredValueNotNumeric {
                row: row_number,
                category: row.category.clone(),
                line: row.line_index,
                value: row.desired_service_value.to_string(),
            });
            report.skipped += 1;
            continue;
        };

        let entry = &updated.beneficiaries[row.beneficiary_index];
        let base_line: Option<ServiceLine> =
            if entry.line_at(&row.category, row.line_index).is_some() {
                None
            } else {
                // Positional correspondence: borrow from the source entry
                // at the same index, same category and line.
                let borrowed = source
                    .and_then(|source| source.beneficiaries.get(row.beneficiary_index))
                    .and_then(|entry| entry.line_at(&row.category, row.line_index))
                    .cloned();
                match borrowed {
                    Some(line) => Some(line),
                    None => {
                        report.issues.push(PatchIssue::NoBaseLine {
                            row: row_number,
                            index: row.beneficiary_index,
                            category: row.category.clone(),
                            line: row.line_index,
                        });
                        report.skipped += 1;
                        continue;
                    }
                }
            };

        let entry = &mut updated.beneficiaries[row.beneficiary_index];
        if let Some(base_line) = base_line {
            // Install the borrowed line, creating or repairing whatever
            // structure is missing on the way down.
            if !matches!(entry.services, Some(ServiceBlock::Categories(_))) {
                entry.services = Some(ServiceBlock::default());
            }
            if let Some(ServiceBlock::Categories(categories)) = entry.services.as_mut() {
                let lines = categories
                    .entry(row.category.clone())
                    .or_insert_with(|| CategoryLines::Lines(Vec::new()));
                if lines.as_lines().is_none() {
                    *lines = CategoryLines::Lines(Vec::new());
                }
                if let Some(lines) = lines.as_lines_mut() {
                    while lines.len() < row.line_index {
                        lines.push(ServiceLine::new());
                    }
                    if row.line_index == lines.len() {
                        lines.push(base_line);
                    } else {
                        lines[row.line_index] = base_line;
                    }
                }
            }
            report.synthesized += 1;
        }

        if let Some(ServiceBlock::Categories(categories)) = entry.services.as_mut() {
            if let Some(line) = categories
                .get_mut(&row.category)
                .and_then(CategoryLines::as_lines_mut)
                .and_then(|lines| lines.get_mut(row.line_index))
            {
                line.insert(SERVICE_VALUE_FIELD.to_string(), desired);
                report.applied += 1;
            }
        }
    }

    (updated, report)
}
