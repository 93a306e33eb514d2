//! CSV output sink for harvested records.
//!
//! The sink truncates its destination on creation, writes the fixed column
//! header exactly once, and appends one row per record thereafter. Flushes
//! happen per batch, so a settled worker's records are on disk before the
//! next batch lands.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::Writer;
use tracing::debug;

use entidades_shared::error::{EntidadesError, Result};
use entidades_shared::sink::RecordSink;
use entidades_shared::types::OutputRecord;

/// Column header, written once per run before any data rows.
pub const COLUMNS: [&str; 8] = [
    "Entidad",
    "RUC",
    "Procesos",
    "Monto Contratado",
    "Último Proceso",
    "Ubicación",
    "Teléfono",
    "URL",
];

/// Append-only CSV writer over a freshly truncated file.
pub struct CsvSink {
    writer: Writer<File>,
    path: PathBuf,
}

impl CsvSink {
    /// Create (or truncate) `path` and write the header row.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| EntidadesError::io(&path, e))?;

        let mut writer = Writer::from_writer(file);
        writer
            .write_record(COLUMNS)
            .map_err(|e| EntidadesError::Export(e.to_string()))?;
        writer.flush().map_err(|e| EntidadesError::io(&path, e))?;

        debug!(path = %path.display(), "output sink ready");
        Ok(Self { writer, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for CsvSink {
    fn append_batch(&mut self, records: &[OutputRecord]) -> Result<()> {
        for record in records {
            self.writer
                .write_record([
                    record.entity.name.as_str(),
                    record.entity.tax_id.as_str(),
                    record.entity.process_count.as_str(),
                    record.entity.contracted_amount.as_str(),
                    record.entity.last_process_date.as_str(),
                    record.detail.location.as_str(),
                    record.detail.phone.as_str(),
                    record.entity.url.as_str(),
                ])
                .map_err(|e| EntidadesError::Export(e.to_string()))?;
        }
        self.writer
            .flush()
            .map_err(|e| EntidadesError::io(&self.path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entidades_shared::types::{DetailInfo, EntityStub};

    fn record(name: &str, phone: &str) -> OutputRecord {
        OutputRecord {
            entity: EntityStub {
                url: format!("https://directory.test/entidad/{name}"),
                name: name.to_string(),
                tax_id: "20131380951".into(),
                process_count: "3".into(),
                contracted_amount: "S/ 10.00".into(),
                last_process_date: "2024-06-01".into(),
            },
            detail: DetailInfo {
                location: "LIMA PERU".into(),
                phone: phone.to_string(),
            },
        }
    }

    fn temp_csv(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("entidades-{name}-{}.csv", std::process::id()))
    }

    #[test]
    fn header_is_written_once_before_any_rows() {
        let path = temp_csv("header");
        let mut sink = CsvSink::create(&path).expect("create sink");
        sink.append_batch(&[record("A", "111")]).expect("append");
        sink.append_batch(&[record("B", "222")]).expect("append");

        let content = std::fs::read_to_string(&path).expect("read back");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Entidad,RUC,Procesos,Monto Contratado,Último Proceso,Ubicación,Teléfono,URL"
        );
        assert!(lines[1].starts_with("A,"));
        assert!(lines[2].starts_with("B,"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn create_truncates_previous_output() {
        let path = temp_csv("truncate");
        {
            let mut sink = CsvSink::create(&path).expect("create sink");
            sink.append_batch(&[record("OLD", "000")]).expect("append");
        }
        let sink = CsvSink::create(&path).expect("recreate sink");
        drop(sink);

        let content = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(content.lines().count(), 1);
        assert!(!content.contains("OLD"));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn rows_carry_fields_in_column_order() {
        let path = temp_csv("order");
        let mut sink = CsvSink::create(&path).expect("create sink");
        sink.append_batch(&[record("MUNICIPALIDAD", "4567890")])
            .expect("append");

        let content = std::fs::read_to_string(&path).expect("read back");
        let row = content.lines().nth(1).expect("data row");
        assert_eq!(
            row,
            "MUNICIPALIDAD,20131380951,3,S/ 10.00,2024-06-01,LIMA PERU,4567890,\
             https://directory.test/entidad/MUNICIPALIDAD"
        );

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn empty_batches_leave_only_the_header() {
        let path = temp_csv("empty");
        let mut sink = CsvSink::create(&path).expect("create sink");
        sink.append_batch(&[]).expect("append nothing");

        let content = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(content.lines().count(), 1);

        let _ = std::fs::remove_file(&path);
    }
}
