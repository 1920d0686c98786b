use std::io::Write;
use std::path::PathBuf;

use datatable_core::render::TableModel;
use log::info;

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes the drawn columns (without the select column) and the loaded rows as CSV.
pub fn write_csv<W: Write>(writer: W, model: &TableModel) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    let headers = model.headers();
    wtr.write_record(
        headers
            .iter()
            .filter(|h| !h.column_id.is_select())
            .map(|h| h.kind.label()),
    )?;
    for row in &model.rows {
        wtr.write_record(
            row.cells
                .iter()
                .filter(|c| !c.is_select)
                .map(|c| c.text.as_str()),
        )?;
    }
    wtr.flush()?;
    Ok(())
}

/// Asks for a destination and exports there. `Ok(None)` when the dialog was cancelled.
pub fn export_csv_dialog(model: &TableModel, file_name: &str) -> Result<Option<PathBuf>, ExportError> {
    let Some(path) = rfd::FileDialog::new()
        .set_file_name(file_name)
        .add_filter("CSV", &["csv"])
        .save_file()
    else {
        return Ok(None);
    };
    let file = std::fs::File::create(&path)?;
    write_csv(file, model)?;
    info!("exported {} rows to {path:?}", model.rows.len());
    Ok(Some(path))
}
