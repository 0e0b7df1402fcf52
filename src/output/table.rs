//! Table output formatting

use tabled::{
    Table, Tabled,
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};

/// Format rows as a table
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    if data.is_empty() {
        return "No resources found.".to_string();
    }

    let mut table = Table::new(data);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    table.to_string()
}

/// Format one record as a two-column FIELD / VALUE table
pub fn format_details(fields: &[(&str, String)]) -> String {
    let mut builder = Builder::default();
    for (field, value) in fields {
        builder.push_record([field.to_string(), value.clone()]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}
