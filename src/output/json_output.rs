//! JSON export

use crate::listing::BusinessRecord;
use crate::ListingsError;
use std::io::Write;

/// Writes records as a pretty-printed JSON array (UTF-8, non-ASCII kept as is)
pub fn write_json<W: Write>(records: &[BusinessRecord], mut writer: W) -> Result<(), ListingsError> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
