use crate::domain::model::{Sheet, Workbook};
use crate::utils::error::Result;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub fn rows_to_csv<I, R>(header: &[String], rows: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| crate::utils::error::TimetableError::IoError(e.into_error()))
}

pub fn sheet_to_csv(sheet: &Sheet) -> Result<Vec<u8>> {
    rows_to_csv(&sheet.columns, &sheet.rows)
}

/// Packs (name, bytes) entries into an in-memory zip.
pub fn zip_entries<'a, I>(entries: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in entries {
        zip.start_file::<_, ()>(name, FileOptions::default())?;
        zip.write_all(data)?;
    }
    // 完成並取回底層 Vec<u8>
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Every sheet as `<name>.csv` plus the workbook as JSON.
pub fn workbook_to_zip(workbook: &Workbook, json_name: &str) -> Result<Vec<u8>> {
    let mut files: Vec<(String, Vec<u8>)> = Vec::with_capacity(workbook.sheets.len() + 1);
    for sheet in &workbook.sheets {
        files.push((sheet.file_name(), sheet_to_csv(sheet)?));
    }
    files.push((json_name.to_string(), serde_json::to_vec_pretty(workbook)?));

    tracing::debug!("Creating ZIP file with {} files", files.len());
    zip_entries(files.iter().map(|(n, d)| (n.as_str(), d.as_slice())))
}
