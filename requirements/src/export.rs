//! Compliance matrix export.
//!
//! A read-only projection of the item list into four columns: requirement,
//! verdict, first reference link, and description. Orchestration state
//! (in-flight items, the hardware lock) does not appear in the output.
//! Rendering is a pure function of the items and language. Formats: pretty
//! JSON, a Markdown table, and an XLSX workbook with one "Compliance Matrix"
//! sheet.

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::Serialize;

use crate::domain::Language;
use crate::i18n;
use crate::item::RequirementItem;

const NOT_AVAILABLE: &str = "N/A";

/// Worksheet name of the XLSX export.
pub const XLSX_SHEET_NAME: &str = "Compliance Matrix";
/// Column widths (characters): requirement, verdict, link, description.
const XLSX_COLUMN_WIDTHS: [f64; 4] = [60.0, 10.0, 60.0, 60.0];

/// One row of the exported compliance matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub requirement: String,
    pub verdict: String,
    pub reference: String,
    pub description: String,
}

impl ExportRow {
    pub fn from_item(item: &RequirementItem, lang: Language) -> Self {
        let result = item.result();
        Self {
            requirement: item.text().to_string(),
            verdict: result
                .map(|r| r.verdict.label(lang).to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            reference: result
                .and_then(|r| r.primary_source())
                .map(|s| s.uri.clone())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            description: result.map(|r| r.description.clone()).unwrap_or_default(),
        }
    }
}

/// Project every item, preserving list order.
pub fn project(items: &[RequirementItem], lang: Language) -> Vec<ExportRow> {
    items
        .iter()
        .map(|item| ExportRow::from_item(item, lang))
        .collect()
}

/// Pretty-printed JSON array of rows.
pub fn to_json(items: &[RequirementItem], lang: Language) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&project(items, lang))
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}

/// Markdown table with localized headers.
pub fn to_markdown(items: &[RequirementItem], lang: Language) -> String {
    let h = i18n::matrix_headers(lang);
    let mut out = format!("## {}\n\n", i18n::matrix_title(lang));
    out.push_str(&format!(
        "| {} | {} | {} | {} |\n|---|---|---|---|\n",
        h.requirement, h.verdict, h.reference, h.description
    ));
    for row in project(items, lang) {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            escape_cell(&row.requirement),
            escape_cell(&row.verdict),
            escape_cell(&row.reference),
            escape_cell(&row.description),
        ));
    }
    out
}

/// Single-sheet workbook with localized headers, returned as file bytes.
pub fn to_xlsx(items: &[RequirementItem], lang: Language) -> Result<Vec<u8>, XlsxError> {
    let h = i18n::matrix_headers(lang);
    let bold = Format::new().set_bold();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(XLSX_SHEET_NAME)?;

    let headers = [h.requirement, h.verdict, h.reference, h.description];
    for (col, (header, width)) in headers.iter().zip(XLSX_COLUMN_WIDTHS).enumerate() {
        let col = col as u16;
        sheet.set_column_width(col, width)?;
        sheet.write_string_with_format(0, col, *header, &bold)?;
    }

    for (row, r) in project(items, lang).into_iter().enumerate() {
        let row = row as u32 + 1;
        sheet.write_string(row, 0, r.requirement)?;
        sheet.write_string(row, 1, r.verdict)?;
        sheet.write_string(row, 2, r.reference)?;
        sheet.write_string(row, 3, r.description)?;
    }

    workbook.save_to_buffer()
}

/// Suggested export file stem, e.g. `RFP_Analysis_Check_Point`.
pub fn file_stem(vendor: &str) -> String {
    let sanitized: String = vendor
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("RFP_Analysis_{sanitized}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{AnalysisResult, SourceReference, Verdict};
    use crate::store::ItemStore;

    fn store_with_one_completed() -> ItemStore {
        let mut store = ItemStore::new();
        let ids = store.add_requirements([
            "Must support IPsec VPN | IKEv2",
            "Must provide 10 Gbps threat prevention",
        ]);
        store
            .update(ids[0], |i| {
                i.start_analysis()?;
                i.complete(AnalysisResult {
                    verdict: Verdict::Yes,
                    manufacturer: "Check Point".into(),
                    description: "Supported via\nIKEv2 communities".into(),
                    sources: vec![SourceReference {
                        title: "Technical Documentation".into(),
                        uri: "https://sc1.checkpoint.com/documents/x".into(),
                    }],
                    suggested_model: None,
                })
            })
            .unwrap();
        store
    }

    #[test]
    fn projection_fills_defaults_for_unanalyzed_items() {
        let store = store_with_one_completed();
        let rows = project(store.items(), Language::Pt);
        assert_eq!(rows[0].verdict, "Sim");
        assert_eq!(rows[0].reference, "https://sc1.checkpoint.com/documents/x");
        assert_eq!(rows[1].verdict, "N/A");
        assert_eq!(rows[1].reference, "N/A");
        assert_eq!(rows[1].description, "");
    }

    #[test]
    fn export_is_idempotent() {
        let store = store_with_one_completed();
        assert_eq!(
            to_json(store.items(), Language::En).unwrap(),
            to_json(store.items(), Language::En).unwrap()
        );
        assert_eq!(
            to_markdown(store.items(), Language::En),
            to_markdown(store.items(), Language::En)
        );
    }

    #[test]
    fn markdown_escapes_pipes_and_newlines() {
        let store = store_with_one_completed();
        let md = to_markdown(store.items(), Language::En);
        assert!(md.contains("| Requirement | Compliant? | Reference Link | Technical Description |"));
        assert!(md.contains("IPsec VPN \\| IKEv2"));
        assert!(md.contains("Supported via<br>IKEv2 communities"));
    }

    #[test]
    fn xlsx_has_named_sheet_localized_headers_and_rows() {
        use std::io::Cursor;

        use calamine::{Data, Reader, Xlsx};

        let store = store_with_one_completed();
        let bytes = to_xlsx(store.items(), Language::Pt).unwrap();

        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec![XLSX_SHEET_NAME.to_string()]);
        let range = workbook.worksheet_range(XLSX_SHEET_NAME).unwrap();
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| {
                row.iter()
                    .map(|c| match c {
                        Data::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect();

        assert_eq!(
            rows[0],
            vec!["Requisito", "Atende?", "Link de Referência", "Descrição Técnica"]
        );
        assert_eq!(rows[1][1], "Sim");
        assert_eq!(rows[1][2], "https://sc1.checkpoint.com/documents/x");
        assert_eq!(rows[2][0], "Must provide 10 Gbps threat prevention");
        assert_eq!(rows[2][1], "N/A");
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn file_stem_sanitizes_vendor() {
        assert_eq!(
            file_stem("Check Point (Harmony Email/Avanan)"),
            "RFP_Analysis_Check_Point__Harmony_Email_Avanan_"
        );
    }
}
