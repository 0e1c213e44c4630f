//! Word Layout Module
//!
//! 罫線のないカレンダーページで、単語の座標から日セルを組み立てるモジュール。
//!
//! 1. 単語を`y_tolerance`以内の上端座標で行にまとめる
//! 2. 1〜2桁の数字の単語を日付トークンとみなす
//! 3. その下で最初に左端が揃う（`column_tolerance`以内）単語を探し、
//!    それが整数でマーカーの単語が続けばセルとする
//!
//! セル矩形は日付・パーソナルナンバー・マーカーの単語を包む最小矩形です。

use serde::{Deserialize, Serialize};

use crate::error::CalendarError;
use crate::parser::Word;
use crate::types::BoundingBox;

/// 単語座標モードの許容誤差
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WordLayout {
    /// 同じ行とみなす上端座標の差
    pub y_tolerance: f64,

    /// 日付とパーソナルナンバーの左端座標の差
    pub column_tolerance: f64,
}

impl Default for WordLayout {
    fn default() -> Self {
        Self {
            y_tolerance: 3.0,
            column_tolerance: 12.0,
        }
    }
}

impl WordLayout {
    pub(crate) fn validate(&self) -> Result<(), CalendarError> {
        for (name, value) in [
            ("y_tolerance", self.y_tolerance),
            ("column_tolerance", self.column_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CalendarError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// 単語から組み立てた日セル
#[derive(Debug, Clone, PartialEq)]
pub struct WordCell {
    /// セルテキスト（`"<日>\n<パーソナル> <マーカー>"`の形に再構成）
    pub text: String,

    /// 塗りつぶしの解決に使う矩形
    pub bbox: BoundingBox,
}

/// 単語を行にまとめる（行は上から、行内は左から）
pub fn cluster_lines<'a>(words: &'a [Word], y_tolerance: f64) -> Vec<Vec<&'a Word>> {
    let mut sorted: Vec<&Word> = words.iter().collect();
    sorted.sort_by(|a, b| {
        a.bbox
            .top
            .total_cmp(&b.bbox.top)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut lines: Vec<Vec<&Word>> = Vec::new();
    let mut anchor = f64::NEG_INFINITY;

    for word in sorted {
        match lines.last_mut() {
            Some(line) if (word.bbox.top - anchor).abs() <= y_tolerance => line.push(word),
            _ => {
                anchor = word.bbox.top;
                lines.push(vec![word]);
            }
        }
    }

    for line in &mut lines {
        line.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
    }

    lines
}

fn is_day_token(text: &str) -> bool {
    (1..=2).contains(&text.len()) && text.bytes().all(|b| b.is_ascii_digit())
}

/// 行内の`index`以降の単語がマーカーと一致すれば、その単語列を返す
fn marker_after<'a>(line: &[&'a Word], index: usize, marker: &[String]) -> Option<Vec<&'a Word>> {
    let following = line.get(index + 1..index + 1 + marker.len())?;
    let matches = following
        .iter()
        .zip(marker)
        .all(|(word, expected)| word.text.to_lowercase() == *expected);
    matches.then(|| following.to_vec())
}

/// ページの単語から日セルを探す
///
/// 戻り値は日付トークンの行優先・左から右の順です。
pub fn find_day_cells(words: &[Word], layout: &WordLayout, marker: &str) -> Vec<WordCell> {
    let marker_words: Vec<String> = marker.split_whitespace().map(str::to_lowercase).collect();
    if marker_words.is_empty() {
        return Vec::new();
    }

    let lines = cluster_lines(words, layout.y_tolerance);
    let mut cells = Vec::new();

    for (line_index, line) in lines.iter().enumerate() {
        for (word_index, day) in line.iter().enumerate() {
            if !is_day_token(&day.text) {
                continue;
            }
            // マーカーが続く数字はパーソナルナンバー側
            if marker_after(line, word_index, &marker_words).is_some() {
                continue;
            }

            if let Some(cell) = cell_below(&lines[line_index + 1..], day, layout, &marker_words) {
                cells.push(cell);
            }
        }
    }

    cells
}

fn cell_below(
    lines: &[Vec<&Word>],
    day: &Word,
    layout: &WordLayout,
    marker_words: &[String],
) -> Option<WordCell> {
    for line in lines {
        let aligned = line
            .iter()
            .position(|word| (word.bbox.x0 - day.bbox.x0).abs() <= layout.column_tolerance);
        let Some(index) = aligned else {
            continue;
        };

        // 最初に揃った単語で判定し、それより下は見ない
        let personal = line[index];
        if personal.text.parse::<i64>().is_err() {
            return None;
        }
        let marker = marker_after(line, index, marker_words)?;

        let bbox = marker
            .iter()
            .fold(day.bbox.union(&personal.bbox), |acc, word| acc.union(&word.bbox));
        let marker_text: Vec<&str> = marker.iter().map(|word| word.text.as_str()).collect();

        return Some(WordCell {
            text: format!("{}\n{} {}", day.text, personal.text, marker_text.join(" ")),
            bbox,
        });
    }
    None
}
