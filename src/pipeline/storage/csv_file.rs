use crate::error::Result;
use crate::types::EnrichedBankRecord;
use std::fs;
use std::path::Path;
use tracing::info;

/// Writes the records as CSV, header first, overwriting any existing file.
pub fn write_csv(records: &[EnrichedBankRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

pub fn read_csv(path: &Path) -> Result<Vec<EnrichedBankRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}
