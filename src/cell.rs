//! Cell Text Parser Module
//!
//! 日セルの生テキスト（`"<日>\n<パーソナルナンバー> ЛИЧНЫЙ ДЕНЬ"`）を
//! 日付とパーソナルナンバーへ分割する純粋関数を提供します。

use std::fmt;

use crate::color::ColorCategory;
use crate::types::CellRecord;

/// パーソナルナンバーに付随するラベル
pub const PERSONAL_DAY_MARKER: &str = "ЛИЧНЫЙ ДЕНЬ";

/// セルテキストを解析できなかった理由
///
/// `NoMarker`は「日セルではない」という通常の否定結果であり、失敗ではありません。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParseFailure {
    /// マーカーフレーズを含まない
    NoMarker,
    /// 最初の空白より前が2行に分かれていない
    NotTwoLines,
    /// 日付またはパーソナルナンバーが整数でない
    NonNumeric,
    /// 日付が1〜31の範囲外
    DayOutOfRange,
}

impl ParseFailure {
    pub fn reason(&self) -> &'static str {
        match self {
            ParseFailure::NoMarker => "no_marker",
            ParseFailure::NotTwoLines => "not_two_lines",
            ParseFailure::NonNumeric => "non_numeric",
            ParseFailure::DayOutOfRange => "day_out_of_range",
        }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// 解析済みのセル（カテゴリ判定前）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCell {
    pub day: u32,
    pub personal_day: i64,
}

impl ParsedCell {
    /// カテゴリを付与してレコードを生成
    pub fn into_record(self, category: Option<ColorCategory>) -> CellRecord {
        CellRecord {
            day: self.day,
            personal_day: self.personal_day,
            day_by_color: category,
        }
    }
}

/// デフォルトのマーカーでセルテキストを解析
///
/// # 使用例
///
/// ```rust
/// use calzero::{parse_cell, ParseFailure};
///
/// let cell = parse_cell("9\n4 ЛИЧНЫЙ ДЕНЬ").unwrap();
/// assert_eq!((cell.day, cell.personal_day), (9, 4));
///
/// assert_eq!(parse_cell("ПН"), Err(ParseFailure::NoMarker));
/// ```
pub fn parse_cell(raw_text: &str) -> Result<ParsedCell, ParseFailure> {
    parse_cell_with_marker(raw_text, PERSONAL_DAY_MARKER)
}

/// 任意のマーカーでセルテキストを解析
///
/// 1. マーカーを大文字小文字を区別せずに検索（なければ`NoMarker`）
/// 2. タブを空白へ置換し、最初の空白までを「日\nパーソナル」トークンとする
/// 3. 改行で分割し、先頭2行を日付・パーソナルナンバーとする（3行目以降は無視）
pub fn parse_cell_with_marker(raw_text: &str, marker: &str) -> Result<ParsedCell, ParseFailure> {
    if !raw_text.to_lowercase().contains(&marker.to_lowercase()) {
        return Err(ParseFailure::NoMarker);
    }

    let normalized = raw_text.replace('\t', " ");
    let token = normalized
        .trim_start()
        .split(' ')
        .next()
        .unwrap_or_default();

    let mut lines = token.split('\n').map(|line| line.trim_end_matches('\r'));
    let (day_line, personal_line) = match (lines.next(), lines.next()) {
        (Some(day), Some(personal)) => (day, personal),
        _ => return Err(ParseFailure::NotTwoLines),
    };

    if day_line.is_empty() || day_line.len() > 2 || !day_line.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseFailure::NonNumeric);
    }
    let day: u32 = day_line.parse().map_err(|_| ParseFailure::NonNumeric)?;
    if !(1..=31).contains(&day) {
        return Err(ParseFailure::DayOutOfRange);
    }

    let personal_day: i64 = personal_line.parse().map_err(|_| ParseFailure::NonNumeric)?;

    Ok(ParsedCell { day, personal_day })
}
