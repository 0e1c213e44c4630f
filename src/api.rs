//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// ソース文書の種類と抽出モード
///
/// 文書の形式と、そこからどのモードで抽出するかの組み合わせを指定します。
///
/// # 使用例
///
/// ```rust
/// use calzero::SourceKind;
///
/// let kind: SourceKind = "pdf-words".parse().unwrap();
/// assert_eq!(kind, SourceKind::PdfWords);
/// assert_eq!(SourceKind::infer("Год 4 S.docx"), Some(SourceKind::Docx));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum SourceKind {
    /// DOCXの表（セルのシェーディング値をトークンとして照合）
    Docx,

    /// PDFページダンプ内の検出済みの表（罫線付きのカレンダー）
    PdfTables,

    /// PDFページダンプの単語座標と塗りつぶし矩形（罫線なしのカレンダー）
    ///
    /// カレンダーページの日セルに加えて、前付けのテキストセクションも抽出します。
    PdfWords,

    /// PDFページダンプのテキストのみ（年・日の意味・凡例・曜日ルール・月の説明）
    PdfText,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Docx => "docx",
            SourceKind::PdfTables => "pdf-tables",
            SourceKind::PdfWords => "pdf-words",
            SourceKind::PdfText => "pdf-text",
        }
    }

    /// 拡張子から推定（`.docx` → `Docx`、`.json` → `PdfTables`）
    pub fn infer(path: impl AsRef<Path>) -> Option<SourceKind> {
        let extension = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "docx" => Some(SourceKind::Docx),
            "json" => Some(SourceKind::PdfTables),
            _ => None,
        }
    }

    /// カレンダーの日セルを抽出するか
    pub fn extracts_cells(&self) -> bool {
        !matches!(self, SourceKind::PdfText)
    }

    /// テキストセクションを抽出するか
    pub fn extracts_sections(&self) -> bool {
        matches!(self, SourceKind::PdfWords | SourceKind::PdfText)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "docx" => Ok(SourceKind::Docx),
            "pdf-tables" => Ok(SourceKind::PdfTables),
            "pdf-words" => Ok(SourceKind::PdfWords),
            "pdf-text" => Ok(SourceKind::PdfText),
            other => Err(CalendarError::Config(format!(
                "Unknown source kind: '{}' (expected docx, pdf-tables, pdf-words or pdf-text)",
                other
            ))),
        }
    }
}
