//! Text renderings of the selection.

use serde::{Deserialize, Serialize};

use crate::selection::VideoRecord;

pub const CSV_HEADER: &str = "ID,Link,Channel ID,Title";
const BOM: char = '\u{FEFF}';

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No videos selected")]
    EmptySelection,
    #[error("failed to encode selection: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    /// One URL per line.
    Clipboard,
    /// Internet Download Manager import list.
    Idm,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Clipboard => "txt",
            ExportFormat::Idm => "ef2",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
            ExportFormat::Clipboard | ExportFormat::Idm => "text/plain",
        }
    }

    /// `youtube_export_<date>.<ext>`, with `date` as `YYYY-MM-DD`.
    pub fn suggested_filename(self, date: &str) -> String {
        format!("youtube_export_{date}.{}", self.extension())
    }

    pub fn render(self, records: &[VideoRecord]) -> Result<String, ExportError> {
        if records.is_empty() {
            return Err(ExportError::EmptySelection);
        }
        Ok(match self {
            ExportFormat::Csv => to_csv(records),
            ExportFormat::Json => serde_json::to_string_pretty(records)?,
            ExportFormat::Clipboard => to_url_list(records),
            ExportFormat::Idm => to_idm(records),
        })
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "clipboard" | "copy" | "txt" => Ok(ExportFormat::Clipboard),
            "idm" => Ok(ExportFormat::Idm),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn to_csv(records: &[VideoRecord]) -> String {
    let mut out = String::new();
    out.push(BOM);
    out.push_str(CSV_HEADER);
    for r in records {
        out.push('\n');
        out.push_str(&format!(
            "{},{},{},{}",
            r.id,
            r.url,
            quote(&r.channel_id),
            quote(&r.title)
        ));
    }
    out
}

fn to_url_list(records: &[VideoRecord]) -> String {
    records
        .iter()
        .map(|r| r.url.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn to_idm(records: &[VideoRecord]) -> String {
    records
        .iter()
        .map(|r| format!("<\r\n{}\r\n>", r.url))
        .collect::<Vec<_>>()
        .join("\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<VideoRecord> {
        vec![
            VideoRecord::new(
                "abc123",
                "https://www.youtube.com/watch?v=abc123",
                "He said \"hi\", then left",
                "@creator",
            ),
            VideoRecord::new("xyz789", "https://www.youtube.com/watch?v=xyz789", "Short", ""),
        ]
    }

    #[test]
    fn csv_has_bom_header_and_escaped_quotes() {
        let csv = ExportFormat::Csv.render(&records()).unwrap();
        assert!(csv.starts_with("\u{FEFF}ID,Link,Channel ID,Title\n"));

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            r#"abc123,https://www.youtube.com/watch?v=abc123,"@creator","He said ""hi"", then left""#
        );
        assert_eq!(lines[2], r#"xyz789,https://www.youtube.com/watch?v=xyz789,"","Short""#);
    }

    #[test]
    fn json_is_pretty_array() {
        let json = ExportFormat::Json.render(&records()).unwrap();
        assert!(json.starts_with("[\n  {"));
        let back: Vec<VideoRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, records());
    }

    #[test]
    fn clipboard_is_one_url_per_line() {
        let text = ExportFormat::Clipboard.render(&records()).unwrap();
        assert_eq!(
            text,
            "https://www.youtube.com/watch?v=abc123\nhttps://www.youtube.com/watch?v=xyz789"
        );
    }

    #[test]
    fn idm_blocks_are_crlf_joined() {
        let text = ExportFormat::Idm.render(&records()).unwrap();
        assert_eq!(
            text,
            "<\r\nhttps://www.youtube.com/watch?v=abc123\r\n>\r\n<\r\nhttps://www.youtube.com/watch?v=xyz789\r\n>"
        );
    }

    #[test]
    fn empty_selection_is_an_error_for_every_format() {
        for format in [
            ExportFormat::Csv,
            ExportFormat::Json,
            ExportFormat::Clipboard,
            ExportFormat::Idm,
        ] {
            let err = format.render(&[]).unwrap_err();
            assert!(matches!(err, ExportError::EmptySelection));
            assert_eq!(err.to_string(), "No videos selected");
        }
    }

    #[test]
    fn format_names() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("copy".parse::<ExportFormat>().unwrap(), ExportFormat::Clipboard);
        assert!("xml".parse::<ExportFormat>().is_err());
        assert_eq!(
            serde_json::from_str::<ExportFormat>("\"idm\"").unwrap(),
            ExportFormat::Idm
        );
        assert_eq!(
            ExportFormat::Json.suggested_filename("2026-10-19"),
            "youtube_export_2026-10-19.json"
        );
    }
}
