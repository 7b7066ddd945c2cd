use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use csv::{Writer, WriterBuilder};

use crate::parse::Record;
use crate::Result;

pub const CSV_HEADER: [&str; 2] = ["id", "color"];

/// Append-only destination for flushed records.
pub trait RecordSink: Send {
    fn write_records(&mut self, records: &[Record]) -> Result<()>;
}

/// Writes `id,color` rows to a CSV file that is recreated for every run.
pub struct CsvSink {
    writer: Writer<BufWriter<File>>,
}

impl CsvSink {
    /// Truncates `path` and writes the header row.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));
        writer.write_record(CSV_HEADER)?;
        writer.flush()?;
        Ok(Self { writer })
    }
}

impl RecordSink for CsvSink {
    fn write_records(&mut self, records: &[Record]) -> Result<()> {
        for record in records {
            write_row(&mut self.writer, record)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[inline]
fn write_row(writer: &mut Writer<BufWriter<File>>, record: &Record) -> Result<()> {
    writer.write_record([record.id.to_string().as_str(), record.color.as_str()])?;
    Ok(())
}
