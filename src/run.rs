//! Run Orchestration Module
//!
//! 複数の文書を順に抽出し、集約ストアへのマージまたは文書ごとのエクスポートを行うモジュール。
//!
//! 文書は1つずつ、設定の記述順に処理されます。文書単位のエラー（ファイルがない、
//! 構造が壊れているなど）は記録され、実行は残りの文書へ進みます。

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::api::SourceKind;
use crate::builder::Extractor;
use crate::error::CalendarError;
use crate::output::{DocumentExport, ExportNaming};
use crate::parser::{DocxDocument, LayoutDocument};
use crate::sections::DocumentSections;
use crate::store::CalendarStore;
use crate::types::{DocumentExtraction, ExtractionStats};

/// 処理対象の文書
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSpec {
    pub path: PathBuf,
    /// ストア内のメンバーキー（`member_4`など）
    pub member: String,
    pub kind: SourceKind,
}

impl DocumentSpec {
    pub fn new(path: impl Into<PathBuf>, member: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            path: path.into(),
            member: member.into(),
            kind,
        }
    }
}

/// 1文書分の抽出結果（日セルとテキストセクション）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentOutput {
    pub extraction: DocumentExtraction,
    pub sections: DocumentSections,
}

/// 処理に失敗した文書
#[derive(Debug)]
pub struct DocumentFailure {
    pub path: PathBuf,
    pub member: String,
    pub error: CalendarError,
}

/// 実行結果の集計
#[derive(Debug, Default)]
pub struct RunReport {
    pub documents_processed: usize,
    pub failures: Vec<DocumentFailure>,
    pub stats: ExtractionStats,
    /// エクスポートモードで書き込んだファイル
    pub exports: Vec<PathBuf>,
}

impl RunReport {
    pub fn cells_classified(&self) -> usize {
        self.stats.cells_classified
    }

    pub fn invalid_colors(&self) -> usize {
        self.stats.invalid_colors
    }

    /// 理由別の読み飛ばし数（理由の文字列をキーにする）
    pub fn skipped_by_reason(&self) -> BTreeMap<&'static str, usize> {
        let mut skipped = BTreeMap::new();
        for (reason, count) in &self.stats.cells_skipped {
            *skipped.entry(reason.as_str()).or_insert(0) += count;
        }
        skipped
    }

    /// 1文書以上を処理できたか
    pub fn is_success(&self) -> bool {
        self.documents_processed > 0
    }

    fn record_failure(&mut self, document: &DocumentSpec, error: CalendarError) {
        tracing::error!(
            path = %document.path.display(),
            member = %document.member,
            error = %error,
            "failed to process document"
        );
        self.failures.push(DocumentFailure {
            path: document.path.clone(),
            member: document.member.clone(),
            error,
        });
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "documents processed: {}, failed: {}",
            self.documents_processed,
            self.failures.len()
        )?;
        writeln!(f, "cells classified: {}", self.cells_classified())?;

        let skipped = self.skipped_by_reason();
        if skipped.is_empty() {
            writeln!(f, "cells skipped: 0")?;
        } else {
            let parts: Vec<String> = skipped
                .iter()
                .map(|(reason, count)| format!("{}={}", reason, count))
                .collect();
            writeln!(f, "cells skipped: {} ({})", self.stats.total_skipped(), parts.join(", "))?;
        }
        write!(f, "invalid colors: {}", self.invalid_colors())?;

        for failure in &self.failures {
            write!(f, "\n  failed {} ({}): {}", failure.path.display(), failure.member, failure.error)?;
        }
        Ok(())
    }
}

/// 1文書を開いて種類に応じた抽出を行う
pub fn process_document(
    extractor: &Extractor,
    document: &DocumentSpec,
) -> Result<DocumentOutput, CalendarError> {
    let mut output = DocumentOutput::default();

    match document.kind {
        SourceKind::Docx => {
            let docx = DocxDocument::open(&document.path)?;
            output.extraction = extractor.extract_tables(&docx);
        }
        SourceKind::PdfTables => {
            let layout = LayoutDocument::open(&document.path)?;
            output.extraction = extractor.extract_tables(&layout);
        }
        SourceKind::PdfWords => {
            let layout = LayoutDocument::open(&document.path)?;
            output.extraction = extractor.extract_words(&layout);
            output.sections = extractor.extract_sections(&layout);
        }
        SourceKind::PdfText => {
            let layout = LayoutDocument::open(&document.path)?;
            output.sections = extractor.extract_sections(&layout);
        }
    }

    Ok(output)
}

fn log_processed(document: &DocumentSpec, output: &DocumentOutput) {
    let stats = &output.extraction.stats;
    tracing::info!(
        path = %document.path.display(),
        member = %document.member,
        kind = %document.kind,
        cells = stats.cells_classified,
        skipped = stats.total_skipped(),
        invalid_colors = stats.invalid_colors,
        sections = !output.sections.is_empty(),
        "processed document"
    );
}

/// 文書を順に抽出して集約ストアへマージする
///
/// ストアの保存は呼び出し側で実行の最後に一度だけ行います。
pub fn run_aggregate(
    extractor: &Extractor,
    store: &mut CalendarStore,
    year: i32,
    documents: &[DocumentSpec],
) -> RunReport {
    let year_key = year.to_string();
    let mut report = RunReport::default();

    for document in documents {
        let output = match process_document(extractor, document) {
            Ok(output) => output,
            Err(e) => {
                report.record_failure(document, e);
                continue;
            }
        };

        // 抽出が完了してからストアへ書き込む
        let merged = store
            .merge_extraction(&year_key, &document.member, &output.extraction)
            .and_then(|_| store.merge_sections(&year_key, &document.member, &output.sections));
        if let Err(e) = merged {
            report.record_failure(document, e);
            continue;
        }

        log_processed(document, &output);
        report.stats.absorb(&output.extraction.stats);
        report.documents_processed += 1;
    }

    report
}

/// 文書ごとに抽出結果をJSONファイルとして書き出す
pub fn run_export(
    extractor: &Extractor,
    output_dir: &Path,
    naming: &ExportNaming,
    year: i32,
    documents: &[DocumentSpec],
) -> RunReport {
    let mut report = RunReport::default();

    for document in documents {
        let written = process_document(extractor, document).and_then(|output| {
            let export = DocumentExport::new(year, &output.extraction, &output.sections)?;
            let path = export.save(output_dir, naming, &document.path)?;
            Ok((output, path))
        });

        match written {
            Ok((output, path)) => {
                log_processed(document, &output);
                tracing::info!(path = %path.display(), "wrote document export");
                report.stats.absorb(&output.extraction.stats);
                report.documents_processed += 1;
                report.exports.push(path);
            }
            Err(e) => report.record_failure(document, e),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ExtractorBuilder;
    use crate::cell::ParseFailure;
    use crate::color::ColorCategory;
    use crate::months::Month;
    use crate::types::SkipReason;

    const LAYOUT: &str = r#"{
        "pages": [
            {
                "number": 1,
                "tables": [
                    {"rows": [
                        [{"text": "ПН"}],
                        [{"text": "9\n4 ЛИЧНЫЙ ДЕНЬ", "fill": "F59A00"}],
                        [{"text": "30\n2 ЛИЧНЫЙ ДЕНЬ"}],
                        [{"text": "x\n2 ЛИЧНЫЙ ДЕНЬ"}]
                    ]}
                ]
            }
        ]
    }"#;

    fn extractor() -> Extractor {
        ExtractorBuilder::new()
            .with_page_layout(1, 12)
            .with_year(2025)
            .build()
            .unwrap()
    }

    #[test]
    fn test_run_aggregate_continues_after_missing_document() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dir.path().join("calendar_4.json");
        std::fs::write(&dump, LAYOUT).unwrap();

        let documents = vec![
            DocumentSpec::new(dir.path().join("missing.json"), "member_1", SourceKind::PdfTables),
            DocumentSpec::new(&dump, "member_4", SourceKind::PdfTables),
        ];
        let mut store = CalendarStore::new();
        let report = run_aggregate(&extractor(), &mut store, 2025, &documents);

        assert_eq!(report.documents_processed, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].error, CalendarError::SourceNotFound { .. }));
        assert!(report.is_success());

        let record = store.record("2025", "member_4", Month::January, 9).unwrap();
        assert_eq!(record.day_by_color, Some(ColorCategory::Orange));
        assert_eq!(store.members("2025"), vec!["member_4"]);

        assert_eq!(report.cells_classified(), 2);
        assert_eq!(
            report.stats.cells_skipped.get(&SkipReason::Parse(ParseFailure::NonNumeric)),
            Some(&1)
        );
        assert_eq!(report.skipped_by_reason().get("non_numeric"), Some(&1));
    }

    #[test]
    fn test_run_with_no_documents_is_not_success() {
        let mut store = CalendarStore::new();
        let report = run_aggregate(&extractor(), &mut store, 2025, &[]);
        assert!(!report.is_success());
        assert!(store.is_empty());
    }

    #[test]
    fn test_run_export_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let dump = dir.path().join("Год 4 S (2025 КС).json");
        std::fs::write(&dump, LAYOUT).unwrap();
        let out = dir.path().join("out");

        let documents = vec![DocumentSpec::new(&dump, "member_4", SourceKind::PdfTables)];
        let report = run_export(&extractor(), &out, &ExportNaming::default(), 2025, &documents);

        assert_eq!(report.documents_processed, 1);
        assert_eq!(report.exports, vec![out.join("Ncalendar_4.json")]);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report.exports[0]).unwrap()).unwrap();
        assert_eq!(written["year"], serde_json::json!(2025));
        assert_eq!(written["calendar"]["january"]["9"]["personal_day"], serde_json::json!(4));
    }

    #[test]
    fn test_report_display() {
        let mut report = RunReport {
            documents_processed: 2,
            ..RunReport::default()
        };
        report.stats.cells_classified = 10;
        report.stats.skip(ParseFailure::NoMarker);
        report.stats.skip(SkipReason::ImpossibleDate);
        let text = report.to_string();
        assert!(text.contains("documents processed: 2, failed: 0"));
        assert!(text.contains("cells classified: 10"));
        assert!(text.contains("cells skipped: 2 (impossible_date=1, no_marker=1)"));
        assert!(text.ends_with("invalid colors: 0"));
    }
}
