//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cell::ParseFailure;
use crate::color::ColorCategory;
use crate::months::Month;

/// ページ座標系の矩形 `(x0, top, x1, bottom)`
///
/// `top < bottom`（上から下へ増加する座標系）を前提とします。永続化はされません。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

impl BoundingBox {
    /// 新しい矩形を生成
    pub fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self { x0, top, x1, bottom }
    }

    pub fn width(&self) -> f64 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.bottom - self.top).max(0.0)
    }

    /// 両軸で空でない交差を持つかを判定（包含ではなく重なり）
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.x0 < other.x1 && self.x1 > other.x0 && self.top < other.bottom && self.bottom > other.top
    }

    /// 交差部分の面積（重ならない場合は0）
    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        if !self.overlaps(other) {
            return 0.0;
        }
        let w = self.x1.min(other.x1) - self.x0.max(other.x0);
        let h = self.bottom.min(other.bottom) - self.top.max(other.top);
        w * h
    }

    /// 両方を含む最小の矩形
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            top: self.top.min(other.top),
            x1: self.x1.max(other.x1),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// ソースアダプターから渡される生の色
///
/// JSONでは文字列（`"F59A00"`）または数値配列（`[245, 155, 1]`）として表現されます。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawColor {
    /// 解決済みのシェーディング値（完全一致で照合）
    Token(String),

    /// 近似RGB値（0〜255スケール、許容誤差で照合）
    Components(Vec<f64>),
}

impl RawColor {
    /// RGBトリプルから生成
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        RawColor::Components(vec![r as f64, g as f64, b as f64])
    }

    /// トークン文字列から生成
    pub fn token(token: impl Into<String>) -> Self {
        RawColor::Token(token.into())
    }
}

/// 1日分のセルから抽出された事実
///
/// 一度生成されたら変更されません。同じ (year, member, month, day) キーへの
/// 後続のスキャンによって丸ごと置き換えられます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    /// 日付（1〜31）
    pub day: u32,

    /// パーソナルナンバー（範囲は強制しない）
    pub personal_day: i64,

    /// 背景色から判定したカテゴリ（未判定は`null`）
    pub day_by_color: Option<ColorCategory>,
}

/// セルを読み飛ばした理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    /// セルテキストの解析に失敗
    Parse(ParseFailure),

    /// 月インデックスが0〜11の範囲外
    MonthOutOfRange,

    /// 設定された年にその日付が存在しない（例: 2月30日）
    ImpossibleDate,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Parse(failure) => failure.reason(),
            SkipReason::MonthOutOfRange => "month_out_of_range",
            SkipReason::ImpossibleDate => "impossible_date",
        }
    }
}

impl From<ParseFailure> for SkipReason {
    fn from(failure: ParseFailure) -> Self {
        SkipReason::Parse(failure)
    }
}

/// 1文書分の抽出統計
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// レコードとして出力されたセル数
    pub cells_classified: usize,

    /// 理由別の読み飛ばしセル数
    pub cells_skipped: BTreeMap<SkipReason, usize>,

    /// 不正な色入力の数（セル自体はカテゴリなしで出力される）
    pub invalid_colors: usize,
}

impl ExtractionStats {
    pub(crate) fn skip(&mut self, reason: impl Into<SkipReason>) {
        *self.cells_skipped.entry(reason.into()).or_insert(0) += 1;
    }

    /// 読み飛ばしの合計
    pub fn total_skipped(&self) -> usize {
        self.cells_skipped.values().sum()
    }

    /// 別の統計を加算
    pub fn absorb(&mut self, other: &ExtractionStats) {
        self.cells_classified += other.cells_classified;
        self.invalid_colors += other.invalid_colors;
        for (reason, count) in &other.cells_skipped {
            *self.cells_skipped.entry(*reason).or_insert(0) += count;
        }
    }
}

/// 1文書分の抽出結果
///
/// `records`は文書順（表/ページ順、行優先→列順）に並びます。
/// 集約ストアへは抽出が完了してから順にマージされます。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentExtraction {
    pub records: Vec<(Month, CellRecord)>,
    pub stats: ExtractionStats,
}

impl DocumentExtraction {
    /// 指定した月・日のレコードを検索（同じキーが複数ある場合は最後のもの）
    pub fn find(&self, month: Month, day: u32) -> Option<&CellRecord> {
        self.records
            .iter()
            .rev()
            .find(|(m, record)| *m == month && record.day == day)
            .map(|(_, record)| record)
    }
}
