//! Page/Month Mapper Module
//!
//! 表インデックスまたはページ番号を、カレンダーの月や文書内のセクション
//! （年の説明、日の意味、色の凡例、曜日ルール）に対応付けるモジュール。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// カレンダーの月
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    /// 文書順（0 = january）の全月
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// 0始まりのインデックスから月を取得（0〜11以外は`None`）
    pub fn from_index(index: usize) -> Option<Month> {
        Self::ALL.get(index).copied()
    }

    /// 0始まりのインデックス
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// 1始まりの月番号（`chrono`の日付検証で使用）
    pub fn number(&self) -> u32 {
        self.index() as u32 + 1
    }

    /// 集約ストアのキー名
    pub fn as_str(&self) -> &'static str {
        match self {
            Month::January => "january",
            Month::February => "february",
            Month::March => "march",
            Month::April => "april",
            Month::May => "may",
            Month::June => "june",
            Month::July => "july",
            Month::August => "august",
            Month::September => "september",
            Month::October => "october",
            Month::November => "november",
            Month::December => "december",
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Month {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Month::ALL
            .iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| CalendarError::Config(format!("Unknown month: {}", s)))
    }
}

/// 表インデックスから月を取得
///
/// 文書内のカレンダー表の位置がそのまま月になります（0 → january … 11 → december）。
/// 範囲外は`None`を返し、呼び出し側が警告とともに読み飛ばします。
pub fn month_for_table(table_index: usize) -> Option<Month> {
    Month::from_index(table_index)
}

/// ページが属するセクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSection {
    /// 日の意味の説明（カレンダー開始の5ページ前と4ページ前）
    DayDescriptions,
    /// 色の凡例（3ページ前）
    ColorLegend,
    /// 曜日ごとのルール（2ページ前）
    WeekdayRules,
    /// パーソナルイヤーの題名と説明（1ページ前）
    PersonalYear,
    /// カレンダーページ
    Calendar(Month),
    /// 設定範囲内だが12か月を超える位置（インデックスを保持して警告用に使う）
    OutOfCalendar { index: u32 },
    /// どのセクションにも属さない
    Unmapped,
}

/// カレンダーページの範囲（1始まり、両端を含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLayout {
    pub calendar_start: u32,
    pub calendar_end: u32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            calendar_start: 11,
            calendar_end: 22,
        }
    }
}

impl PageLayout {
    /// 範囲を検証して生成
    ///
    /// # エラー
    ///
    /// 開始ページが0、または開始が終了より大きい場合は`CalendarError::Config`
    pub fn new(calendar_start: u32, calendar_end: u32) -> Result<Self, CalendarError> {
        let layout = Self {
            calendar_start,
            calendar_end,
        };
        layout.validate()?;
        Ok(layout)
    }

    pub(crate) fn validate(&self) -> Result<(), CalendarError> {
        if self.calendar_start == 0 {
            return Err(CalendarError::Config(
                "Page numbers are 1-indexed; calendar_start must be at least 1".to_string(),
            ));
        }
        if self.calendar_start > self.calendar_end {
            return Err(CalendarError::Config(format!(
                "calendar_start ({}) must not exceed calendar_end ({})",
                self.calendar_start, self.calendar_end
            )));
        }
        Ok(())
    }

    /// ページ番号が設定範囲内かを判定
    pub fn contains(&self, page: u32) -> bool {
        (self.calendar_start..=self.calendar_end).contains(&page)
    }

    /// ページ番号からセクションを決定
    ///
    /// カレンダー範囲の前にあるページは開始ページからの固定オフセットで
    /// 非カレンダーセクションへ振り分けられます。
    pub fn section_for_page(&self, page: u32) -> PageSection {
        if self.contains(page) {
            let index = page - self.calendar_start;
            return match Month::from_index(index as usize) {
                Some(month) => PageSection::Calendar(month),
                None => PageSection::OutOfCalendar { index },
            };
        }

        let start = self.calendar_start;
        let at = |offset: u32| start.checked_sub(offset).filter(|p| *p > 0) == Some(page);

        if at(5) || at(4) {
            PageSection::DayDescriptions
        } else if at(3) {
            PageSection::ColorLegend
        } else if at(2) {
            PageSection::WeekdayRules
        } else if at(1) {
            PageSection::PersonalYear
        } else {
            PageSection::Unmapped
        }
    }

    /// 指定セクションのページ番号（存在しない場合は空）
    pub fn pages_for(&self, section: PageSection) -> Vec<u32> {
        let before = |offset: u32| self.calendar_start.checked_sub(offset).filter(|p| *p > 0);
        match section {
            PageSection::DayDescriptions => before(5).into_iter().chain(before(4)).collect(),
            PageSection::ColorLegend => before(3).into_iter().collect(),
            PageSection::WeekdayRules => before(2).into_iter().collect(),
            PageSection::PersonalYear => before(1).into_iter().collect(),
            PageSection::Calendar(month) => {
                let page = self.calendar_start + month.index() as u32;
                if self.contains(page) {
                    vec![page]
                } else {
                    Vec::new()
                }
            }
            PageSection::OutOfCalendar { index } => {
                let page = self.calendar_start + index;
                if self.contains(page) && index >= 12 {
                    vec![page]
                } else {
                    Vec::new()
                }
            }
            PageSection::Unmapped => Vec::new(),
        }
    }
}
