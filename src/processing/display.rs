use crate::processing::types::{DisplayField, DisplayRecord};
use fitparser::FitDataRecord;

/// Build UI-friendly records from decoded FIT messages.
pub fn to_display_records(records: &[FitDataRecord]) -> Vec<DisplayRecord> {
    records
        .iter()
        .map(|record| DisplayRecord {
            message_type: format!("{:?}", record.kind()),
            fields: record
                .fields()
                .iter()
                .map(|field| DisplayField {
                    name: field.name().to_string(),
                    value: field.to_string(),
                })
                .collect(),
        })
        .collect()
}

/// First value of the field `name` across `records`, skipping empty values.
pub fn first_field_value<'a>(records: &'a [DisplayRecord], name: &str) -> Option<&'a str> {
    records
        .iter()
        .flat_map(|record| &record.fields)
        .find(|field| field.name == name && !field.value.is_empty())
        .map(|field| field.value.as_str())
}
