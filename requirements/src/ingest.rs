//! Requirement ingestion: split raw text into candidate requirement lines and
//! drop the noise typically found in RFP documents.
//!
//! Two entry points mirror the two ways text arrives:
//!
//! - [`split_pasted`] for text typed or pasted by a user. If the filter would
//!   discard everything, the raw entries longer than 3 characters are kept as
//!   a best-effort fallback.
//! - [`split_document`] for imported files. No fallback: an all-noise file
//!   yields nothing.
//!
//! Spreadsheets (`.xlsx`, `.xls`, `.ods`) contribute the first text cell of
//! each row of the first sheet; that cell is split on `;` and newlines like
//! any other document text.

use std::path::Path;
use std::sync::LazyLock;

use calamine::{open_workbook_auto, Data, Reader};
use regex::Regex;
use thiserror::Error;
use tracing::debug;

/// Lines at or below this length are treated as noise.
const MIN_REQUIREMENT_CHARS: usize = 15;
/// Minimum length of a raw entry kept by the pasted-text fallback.
const FALLBACK_MIN_CHARS: usize = 3;

static LINE_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[;\r\n]+").expect("LINE_SPLIT regex should compile"));

/// Layout debris: page numbers, bare numbers, watermarks, tables of contents.
static NOISE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^(page|página|pag)\s*\d+$",
        r"^\d+$",
        r"(?i)^(?:confidential|confidencial)$",
        r"(?i)^(?:table of contents|índice)$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("noise pattern should compile"))
    .collect()
});

/// Commercial and administrative clauses that are not technical requirements.
static NON_TECHNICAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)preço|price|valor|cost|custo|orçamento|budget",
        r"(?i)total.*(?:r\$|usd|\$|€)",
        r"(?i)investimento",
        r"(?i)capex|opex",
        r"(?i)proposal validity|validade da proposta",
        r"(?i)prazo de entrega|delivery time|cronograma|schedule",
        r"(?i)assinatura|signature|representante legal",
        r"(?i)multa|penalty|garantia contratual",
        // e-mail addresses usually mark a contact line
        r"(?i)\b[\w.-]+@[\w.-]+\.\w{2,4}\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("non-technical pattern should compile"))
    .collect()
});

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read spreadsheet {path}: {source}")]
    Spreadsheet {
        path: String,
        #[source]
        source: calamine::Error,
    },

    #[error("spreadsheet {0} has no worksheets")]
    EmptyWorkbook(String),

    #[error("unsupported requirement file '{0}' (expected .txt, .csv, .xlsx, .xls or .ods)")]
    UnsupportedFormat(String),
}

/// Whether a trimmed line looks like a real technical requirement.
pub fn is_requirement_line(line: &str) -> bool {
    line.chars().count() > MIN_REQUIREMENT_CHARS
        && !NOISE_PATTERNS.iter().any(|p| p.is_match(line))
        && !NON_TECHNICAL_PATTERNS.iter().any(|p| p.is_match(line))
}

/// Trim each line and keep only those passing [`is_requirement_line`].
pub fn filter_lines<'a, I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .map(str::trim)
        .filter(|l| is_requirement_line(l))
        .map(str::to_string)
        .collect()
}

fn raw_entries(text: &str) -> Vec<&str> {
    LINE_SPLIT
        .split(text)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

/// Split user-pasted text on `;` or newlines and filter noise.
pub fn split_pasted(text: &str) -> Vec<String> {
    let entries = raw_entries(text);
    if entries.is_empty() {
        return Vec::new();
    }

    let clean = filter_lines(entries.iter().copied());
    if !clean.is_empty() {
        return clean;
    }

    debug!(
        entries = entries.len(),
        "Noise filter removed every pasted entry; keeping raw entries"
    );
    entries
        .into_iter()
        .filter(|e| e.chars().count() > FALLBACK_MIN_CHARS)
        .map(str::to_string)
        .collect()
}

/// Split imported document text on `;` or line breaks and filter noise.
pub fn split_document(text: &str) -> Vec<String> {
    filter_lines(raw_entries(text))
}

/// First text cell of each row, split on `;` and newlines, then filtered.
/// Rows without any text cell are skipped.
pub fn split_sheet_rows<'a, I>(rows: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [Data]>,
{
    let cells: Vec<&str> = rows
        .into_iter()
        .filter_map(|row| {
            row.iter().find_map(|cell| match cell {
                Data::String(text) => Some(text.as_str()),
                _ => None,
            })
        })
        .collect();
    filter_lines(cells.iter().flat_map(|cell| LINE_SPLIT.split(cell)))
}

fn read_spreadsheet(path: &Path) -> Result<Vec<String>, IngestError> {
    let spreadsheet_err = |source| IngestError::Spreadsheet {
        path: path.display().to_string(),
        source,
    };
    let mut workbook = open_workbook_auto(path).map_err(spreadsheet_err)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::EmptyWorkbook(path.display().to_string()))?
        .map_err(spreadsheet_err)?;
    Ok(split_sheet_rows(range.rows()))
}

/// Read a requirement file: plain text (`.txt`, `.csv`) or a spreadsheet.
pub fn read_requirements_file(path: &Path) -> Result<Vec<String>, IngestError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let lines = match ext.as_deref() {
        Some("txt") | Some("csv") => {
            let text = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
                path: path.display().to_string(),
                source,
            })?;
            split_document(&text)
        }
        Some("xlsx") | Some("xls") | Some("ods") => read_spreadsheet(path)?,
        _ => return Err(IngestError::UnsupportedFormat(path.display().to_string())),
    };
    debug!(path = %path.display(), requirements = lines.len(), "Imported requirement file");
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn pasted_text_splits_on_semicolons_and_newlines() {
        let text = "The firewall must support IPsec site-to-site VPN;\n\
                    The solution must provide URL filtering by category\n\n";
        let lines = split_pasted(text);
        assert_eq!(
            lines,
            vec![
                "The firewall must support IPsec site-to-site VPN",
                "The solution must provide URL filtering by category",
            ]
        );
    }

    #[test]
    fn commercial_and_contact_lines_are_dropped() {
        let text = "Preço total da solução em R$ 100.000\n\
                    Contact john.doe@example.com for questions\n\
                    Prazo de entrega de 30 dias corridos\n\
                    Must inspect TLS 1.3 traffic without downgrade";
        assert_eq!(
            split_document(text),
            vec!["Must inspect TLS 1.3 traffic without downgrade"]
        );
    }

    #[test]
    fn short_and_page_lines_are_noise() {
        assert!(!is_requirement_line("Page 12"));
        assert!(!is_requirement_line("123456789012345678"));
        assert!(!is_requirement_line("Sandboxing"));
        assert!(is_requirement_line("Support for sandboxing of unknown files"));
    }

    #[test]
    fn watermark_and_toc_patterns_match_whole_lines_only() {
        assert!(!is_requirement_line("Table of Contents"));
        assert!(is_requirement_line("Confidential data must be encrypted at rest with AES-256"));
        assert!(is_requirement_line("O painel deve exibir a utilização de CPU por índice"));
    }

    #[test]
    fn pasted_fallback_keeps_short_entries() {
        let lines = split_pasted("IPS; DLP; QoS; ab");
        assert!(lines.is_empty());

        let lines = split_pasted("IPS engine; DLP rules; ab");
        assert_eq!(lines, vec!["IPS engine", "DLP rules"]);
    }

    #[test]
    fn document_has_no_fallback() {
        assert!(split_document("IPS engine; DLP rules").is_empty());
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(split_pasted("  \n ; \n").is_empty());
        assert!(split_document("").is_empty());
    }

    #[test]
    fn reads_txt_file() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "Must support high availability in active-passive mode").unwrap();
        writeln!(file, "Página 3").unwrap();
        let lines = read_requirements_file(file.path()).unwrap();
        assert_eq!(lines, vec!["Must support high availability in active-passive mode"]);
    }

    #[test]
    fn sheet_rows_use_first_text_cell_only() {
        let rows = vec![
            vec![
                Data::Float(1.0),
                Data::String("SD-WAN; Must support BGP and OSPF routing".into()),
                Data::String("Ignored second text column with details".into()),
            ],
            vec![Data::Int(2), Data::Empty],
            vec![Data::String("Página 4".into())],
            vec![Data::String("Must provide centralized logging\nall gateways".into())],
        ];
        let lines = split_sheet_rows(rows.iter().map(Vec::as_slice));
        assert_eq!(
            lines,
            vec![
                "Must support BGP and OSPF routing",
                "Must provide centralized logging",
            ]
        );
    }

    #[test]
    fn reads_xlsx_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rfp.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_number(0, 0, 1).unwrap();
        sheet
            .write_string(0, 1, "Must support IPsec VPN with IKEv2; Must support SSL VPN clients")
            .unwrap();
        sheet.write_string(1, 0, "Table of Contents").unwrap();
        sheet
            .write_string(2, 0, "Must integrate with SIEM platforms via syslog")
            .unwrap();
        workbook.save(&path).unwrap();

        let lines = read_requirements_file(&path).unwrap();
        assert_eq!(
            lines,
            vec![
                "Must support IPsec VPN with IKEv2",
                "Must support SSL VPN clients",
                "Must integrate with SIEM platforms via syslog",
            ]
        );
    }

    #[test]
    fn corrupt_spreadsheet_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        writeln!(file, "not a zip archive").unwrap();
        assert!(matches!(
            read_requirements_file(file.path()),
            Err(IngestError::Spreadsheet { .. })
        ));
    }

    #[test]
    fn rejects_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        assert!(matches!(
            read_requirements_file(file.path()),
            Err(IngestError::UnsupportedFormat(_))
        ));
    }
}
