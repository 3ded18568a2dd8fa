use crate::domain::model::{
    Scalar, ServiceBlock, COPAYMENT_VALUE_FIELD, SERVICE_VALUE_FIELD,
};

/// Multiply the designated monetary fields of every line by `factor`,
/// in place. This is what turns a positive invoice amount into a negative
/// credit-note amount. Non-numeric or absent fields are left untouched;
/// booleans do not count as numbers.
pub fn apply_sign(block: &mut ServiceBlock, factor: i64) {
    let ServiceBlock::Categories(categories) = block else {
        return;
    };

    for lines in categories.values_mut() {
        let Some(lines) = lines.as_lines_mut() else {
            continue;
        };
        for line in lines {
            for field in [SERVICE_VALUE_FIELD, COPAYMENT_VALUE_FIELD] {
                match line.get_mut(field) {
                    Some(Scalar::Int(value)) => *value *= factor,
                    Some(Scalar::Float(value)) => *value *= factor as f64,
                    _ => {}
                }
            }
        }
    }
}
