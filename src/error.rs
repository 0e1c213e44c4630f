//! Error Types Module
//!
//! 文書単位・実行単位で失敗しうる処理のエラー型。
//!
//! セル単位の読み飛ばし（マーカーなし、日付が数値でない等）はここには含まれず、
//! [`crate::ParseFailure`] として値で返され、統計に集計されます。

use std::path::PathBuf;

use thiserror::Error;

/// calzeroのエラー型
///
/// 致命度はバリアントごとに異なります。
///
/// - `SourceNotFound`, `Parse`, `Zip`, `SecurityViolation`: その文書だけを諦め、実行は次の文書へ
/// - `InvalidColor`: そのセルの分類だけを諦める（レコードは`day_by_color = null`）
/// - `SchemaViolation`, `Config`: ストアへ一切書き込まずに実行を中断
///
/// ```rust,no_run
/// use calzero::{CalendarError, CalendarStore};
///
/// match CalendarStore::load("db/y2025.json") {
///     Err(CalendarError::SchemaViolation(reason)) => eprintln!("store rejected: {}", reason),
///     Err(other) => eprintln!("{}", other),
///     Ok(store) => println!("{} year(s)", store.years().count()),
/// }
/// ```
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 設定に書かれた入力文書が存在しない
    #[error("Source document not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// `word/document.xml`がない、XMLやレイアウトダンプが壊れている等
    #[error("Failed to parse source document: {0}")]
    Parse(String),

    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// DOCXコンテナ自体が読めない
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// レイアウトダンプ・ストア・エクスポートのJSONエラー
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 色の成分が3つでない、または0〜255の範囲外
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// 既存の集約ストアがJSONオブジェクトの入れ子として読めない
    #[error("Aggregate store schema violation: {0}")]
    SchemaViolation(String),

    /// ページ範囲・許容誤差・カテゴリ定義などの不整合
    #[error("Configuration error: {0}")]
    Config(String),

    /// DOCXコンテナが上限値やエントリ名の検査に通らない
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}
