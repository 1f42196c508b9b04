//! Record exporters: JSON for downstream tooling, a text table for humans.

use std::io::{Result, Write};

use crate::domain::setting::SettingRecord;
use crate::ports::RecordExporter;

pub struct JsonExporter {
    pub pretty: bool,
}

impl RecordExporter for JsonExporter {
    fn write(&self, records: &[SettingRecord], out: &mut dyn Write) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *out, records)?;
            out.write_all(b"\n")
        } else {
            serde_json::to_writer(&mut *out, records)?;
            Ok(())
        }
    }
}

/// Tab-separated table, one setting per line.
pub struct TextExporter;

impl TextExporter {
    const HEADER: [&'static str; 6] = ["location", "name", "variable", "type", "default", "properties"];

    pub fn to_lines(records: &[SettingRecord]) -> Vec<String> {
        let mut lines = Vec::with_capacity(records.len() + 1);
        lines.push(Self::HEADER.join("\t"));
        for record in records {
            let columns = [
                format!("{}:{}", record.source_file, record.source_line),
                Self::escape(&record.name),
                Self::escape(&record.raw_name),
                Self::escape(&record.value_type),
                Self::escape(&record.default_value),
                record.properties.join(","),
            ];
            lines.push(columns.join("\t"));
        }
        lines
    }

    fn escape(field: &str) -> String {
        field
            .replace('\\', "\\\\")
            .replace('\t', "\\t")
            .replace('\n', "\\n")
    }
}

impl RecordExporter for TextExporter {
    fn write(&self, records: &[SettingRecord], out: &mut dyn Write) -> Result<()> {
        for line in Self::to_lines(records) {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }
}
