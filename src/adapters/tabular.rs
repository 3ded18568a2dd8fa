use crate::domain::model::{EditRow, Scalar};
use crate::utils::error::{ReconError, Result};
use std::collections::BTreeSet;

/// Column names of the bulk-edit CSV surface. The first four are mandatory
/// on read; everything unrecognized is an open field-union column.
pub const INDEX_COLUMN: &str = "beneficiaryIndex";
pub const CATEGORY_COLUMN: &str = "categoryLabel";
pub const LINE_COLUMN: &str = "lineIndex";
pub const DESIRED_COLUMN: &str = "desiredServiceValue";
pub const REFERENCE_COLUMN: &str = "referenceServiceValue";
pub const MISSING_COLUMN: &str = "missingFields";

const MISSING_SEPARATOR: &str = ";";

/// Render edit rows as CSV. The field-union columns come after the fixed
/// ones, sorted by name, so the same row set always yields the same header.
pub fn rows_to_csv(rows: &[EditRow]) -> Result<Vec<u8>> {
    let union: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.fields.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec![
        INDEX_COLUMN,
        CATEGORY_COLUMN,
        LINE_COLUMN,
        DESIRED_COLUMN,
        REFERENCE_COLUMN,
        MISSING_COLUMN,
    ];
    header.extend(union.iter().copied());
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![
            row.beneficiary_index.to_string(),
            row.category.clone(),
            row.line_index.to_string(),
            row.desired_service_value.to_string(),
            row.reference_service_value.to_string(),
            row.missing_fields.join(MISSING_SEPARATOR),
        ];
        for column in &union {
            let cell = row
                .fields
                .get(*column)
                .map(Scalar::to_string)
                .unwrap_or_default();
            record.push(cell);
        }
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| ReconError::IoError(e.into_error()))
}

/// Parse a bulk-edit CSV back into rows. Mandatory columns are located by
/// header name, so the user may reorder or add columns freely. A header
/// without all four mandatory columns is rejected before any row is read.
pub fn rows_from_csv(data: &[u8]) -> Result<Vec<EditRow>> {
    let mut reader = csv::Reader::from_reader(data);

    let headers = reader.headers()?.clone();
    let column =
        |name: &str| headers.iter().position(|h| h == name);
    let mandatory = |name: &str| {
        column(name).ok_or_else(|| ReconError::ValidationError {
            message: format!("edits file is missing the '{}' column", name),
        })
    };

    let index_col = mandatory(INDEX_COLUMN)?;
    let category_col = mandatory(CATEGORY_COLUMN)?;
    let line_col = mandatory(LINE_COLUMN)?;
    let desired_col = mandatory(DESIRED_COLUMN)?;
    let reference_col = column(REFERENCE_COLUMN);
    let missing_col = column(MISSING_COLUMN);

    let fixed = [
        Some(index_col),
        Some(category_col),
        Some(line_col),
        Some(desired_col),
        reference_col,
        missing_col,
    ];

    let mut rows = Vec::new();
    for (position, record) in reader.records().enumerate() {
        let record = record?;
        let row_number = position + 1;

        let cell = |index: usize| record.get(index).unwrap_or("");
        let index_cell = |index: usize, name: &str| -> Result<usize> {
            cell(index)
                .trim()
                .parse()
                .map_err(|_| ReconError::ValidationError {
                    message: format!(
                        "row {}: '{}' is not a valid {}",
                        row_number,
                        cell(index),
                        name
                    ),
                })
        };

        let mut fields = std::collections::BTreeMap::new();
        for (index, header) in headers.iter().enumerate() {
            if fixed.contains(&Some(index)) {
                continue;
            }
            fields.insert(header.to_string(), parse_cell(cell(index)));
        }

        rows.push(EditRow {
            beneficiary_index: index_cell(index_col, INDEX_COLUMN)?,
            category: cell(category_col).trim().to_string(),
            line_index: index_cell(line_col, LINE_COLUMN)?,
            desired_service_value: parse_cell(cell(desired_col)),
            reference_service_value: reference_col
                .map(|i| parse_cell(cell(i)))
                .unwrap_or(Scalar::Null),
            fields,
            missing_fields: missing_col
                .map(|i| {
                    cell(i)
                        .split(MISSING_SEPARATOR)
                        .map(str::trim)
                        .filter(|part| !part.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        });
    }

    Ok(rows)
}

/// CSV cells are untyped text; integers read back as integers, decimals as
/// floats, everything else stays text. Empty cells are null.
fn parse_cell(cell: &str) -> Scalar {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Scalar::Null;
    }
    if let Ok(v) = trimmed.parse::<i64>() {
        return Scalar::Int(v);
    }
    if let Ok(v) = trimmed.parse::<f64>() {
        if v.is_finite() {
            return Scalar::Float(v);
        }
    }
    Scalar::Text(trimmed.to_string())
}
