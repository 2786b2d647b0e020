//! Boundary formatting for solved allocations: currency strings and the CSV
//! layout consumed by download/export collaborators. Rounding to two decimal
//! places happens here and nowhere inside the model.

use std::io;

use crate::optimizer::Allocation;

pub const CSV_HEADER: [&str; 2] = ["Category", "Allocated Amount"];
pub const UNALLOCATED_LABEL: &str = "Unallocated";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("exported csv was not valid utf-8")]
    Encoding,
}

/// Format an amount as `Kshs 1,234,567.89`.
///
/// Callers hand in bounds-checked allocation values; a non-finite amount
/// here means an upstream invariant broke.
pub fn format_kshs(amount: f64) -> String {
    debug_assert!(amount.is_finite(), "amount must be finite");
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u128;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (position, digit) in whole.chars().enumerate() {
        if position > 0 && (whole.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if negative { "-" } else { "" };
    format!("Kshs {sign}{grouped}.{frac:02}")
}

/// Write the allocation as CSV (`Category,Allocated Amount`), retaining
/// zero-valued categories and appending the unallocated remainder row when
/// the full-allocation policy produced one.
pub fn write_allocation_csv<W: io::Write>(
    allocation: &Allocation,
    writer: W,
) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;
    for (category, amount) in allocation.entries() {
        csv_writer.write_record([category.label().to_string(), format!("{amount:.2}")])?;
    }
    if let Some(unallocated) = allocation.unallocated() {
        csv_writer.write_record([UNALLOCATED_LABEL.to_string(), format!("{unallocated:.2}")])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// CSV export as an owned string, for HTTP responses and CLI output.
pub fn allocation_csv(allocation: &Allocation) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_allocation_csv(allocation, &mut buffer)?;
    String::from_utf8(buffer).map_err(|_| ExportError::Encoding)
}
