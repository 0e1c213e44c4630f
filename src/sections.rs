//! Text-Flow Sections Module
//!
//! カレンダー以外のページ（年の説明、日の意味、色の凡例、曜日ルール）と
//! 各月ページの説明文を、ページテキストから正規表現で取り出すモジュール。
//! どのページを読むかは[`PageLayout`]の固定オフセットで決まります。

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::color::ColorCategory;
use crate::error::CalendarError;
use crate::months::{Month, PageLayout, PageSection};
use crate::parser::PageSource;

/// 題名が見つからない場合の値
pub const TITLE_NOT_FOUND: &str = "Не найдено";

/// 月の説明が見つからない場合に使うページ先頭の文字数
const MONTH_EXCERPT_CHARS: usize = 500;

/// 曜日（ストアのキーは`mon`〜`sun`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Mon => "mon",
            Weekday::Tue => "tue",
            Weekday::Wed => "wed",
            Weekday::Thu => "thu",
            Weekday::Fri => "fri",
            Weekday::Sat => "sat",
            Weekday::Sun => "sun",
        }
    }

    /// ロシア語の曜日名から変換
    pub fn from_russian(name: &str) -> Option<Weekday> {
        match name {
            "Понедельник" => Some(Weekday::Mon),
            "Вторник" => Some(Weekday::Tue),
            "Среда" => Some(Weekday::Wed),
            "Четверг" => Some(Weekday::Thu),
            "Пятница" => Some(Weekday::Fri),
            "Суббота" => Some(Weekday::Sat),
            "Воскресенье" => Some(Weekday::Sun),
            _ => None,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// パーソナルイヤーの題名と説明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalYear {
    pub title: String,
    pub year_description: String,
}

/// 1文書分のテキストセクション
///
/// 各リストは文書での初出順です。同じキーが再び現れた場合は値だけが置き換わります。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSections {
    pub personal_year: Option<PersonalYear>,
    pub personal_day_descriptions: Vec<(String, String)>,
    pub day_by_color: Vec<(ColorCategory, String)>,
    pub to_do: Vec<(Weekday, String)>,
    pub not_to_do: Vec<(Weekday, String)>,
    pub month_descriptions: Vec<(Month, String)>,
}

impl DocumentSections {
    /// どのセクションも見つからなかったか
    pub fn is_empty(&self) -> bool {
        self.personal_year.is_none()
            && self.personal_day_descriptions.is_empty()
            && self.day_by_color.is_empty()
            && self.to_do.is_empty()
            && self.not_to_do.is_empty()
            && self.month_descriptions.is_empty()
    }
}

/// 初出順を保ったまま値を置き換える
fn upsert<K: PartialEq, V>(entries: &mut Vec<(K, V)>, key: K, value: V) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

/// コンパイル済みの抽出パターン
#[derive(Debug, Clone)]
pub(crate) struct SectionPatterns {
    title: Regex,
    leading_title: Regex,
    block_start: Regex,
    day_block: Regex,
    colors: Vec<(ColorCategory, Regex)>,
    weekday_rule: Regex,
    not_to_do: Regex,
    month_paragraph: Regex,
}

fn compile(pattern: &str) -> Result<Regex, CalendarError> {
    Regex::new(pattern).map_err(|e| CalendarError::Config(format!("Invalid pattern: {}", e)))
}

impl SectionPatterns {
    pub fn new() -> Result<Self, CalendarError> {
        Ok(Self {
            title: compile(r"Год\s+[^\n]+")?,
            leading_title: compile(r"\AГод\s+[^\n]+\n?")?,
            block_start: compile(r"^\s*\d(\s|$)")?,
            day_block: compile(r"(?s)\A(\d)\s*(.+)")?,
            colors: vec![
                (ColorCategory::Red, compile(r"(?i)Красн\w*[:\-–]\s*(.+)")?),
                (ColorCategory::Orange, compile(r"(?i)Оранж\w*[:\-–]\s*(.+)")?),
                (ColorCategory::Green, compile(r"(?i)Зел[её]н\w*[:\-–]\s*(.+)")?),
            ],
            weekday_rule: compile(
                r"(Понедельник|Вторник|Среда|Четверг|Пятница|Суббота|Воскресенье)\s*[:\-–]\s*([^\n]+)",
            )?,
            not_to_do: compile(r"Не\s+[^\n]+")?,
            month_paragraph: compile(r"(Месяц[^\n]+(?:\n.+)+)")?,
        })
    }

    /// 年のページ: 題名と、題名行を除いた説明
    pub fn personal_year(&self, text: &str) -> Option<PersonalYear> {
        if text.is_empty() {
            return None;
        }
        let title = self
            .title
            .find(text)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_else(|| TITLE_NOT_FOUND.to_string());
        let year_description = self.leading_title.replace(text, "").trim().to_string();
        Some(PersonalYear {
            title,
            year_description,
        })
    }

    /// 日の意味: 数字で始まる行ごとにブロックへ分ける
    pub fn day_descriptions(&self, text: &str) -> Vec<(String, String)> {
        let mut blocks: Vec<String> = Vec::new();
        for line in text.split('\n') {
            match blocks.last_mut() {
                Some(block) if !self.block_start.is_match(line) => {
                    block.push('\n');
                    block.push_str(line);
                }
                _ => blocks.push(line.to_string()),
            }
        }

        let mut descriptions = Vec::new();
        for block in &blocks {
            if let Some(caps) = self.day_block.captures(block.trim()) {
                let number = caps[1].to_string();
                let description = caps[2].trim().to_string();
                upsert(&mut descriptions, number, description);
            }
        }
        descriptions
    }

    /// 色の凡例
    pub fn color_legend(&self, text: &str) -> Vec<(ColorCategory, String)> {
        self.colors
            .iter()
            .filter_map(|(category, pattern)| {
                pattern
                    .captures(text)
                    .map(|caps| (*category, caps[1].trim().to_string()))
            })
            .collect()
    }

    /// 曜日ルール（to_do）と、その順に割り当てた「Не …」行（not_to_do）
    pub fn weekday_rules(&self, text: &str) -> (Vec<(Weekday, String)>, Vec<(Weekday, String)>) {
        let mut to_do = Vec::new();
        for caps in self.weekday_rule.captures_iter(text) {
            if let Some(day) = Weekday::from_russian(&caps[1]) {
                upsert(&mut to_do, day, caps[2].trim().to_string());
            }
        }

        let negatives: Vec<&str> = self.not_to_do.find_iter(text).map(|m| m.as_str()).collect();
        let not_to_do = if negatives.is_empty() {
            Vec::new()
        } else {
            to_do
                .iter()
                .enumerate()
                .map(|(i, (day, _))| (*day, negatives.get(i).copied().unwrap_or("").to_string()))
                .collect()
        };

        (to_do, not_to_do)
    }

    /// 月の説明: 「Месяц」で始まる段落、なければページ先頭の抜粋
    pub fn month_description(&self, text: &str) -> Option<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        match self.month_paragraph.captures(text) {
            Some(caps) => Some(caps[1].trim().to_string()),
            None => Some(trimmed.chars().take(MONTH_EXCERPT_CHARS).collect()),
        }
    }

    /// ページソースから全セクションを抽出
    pub fn extract<S: PageSource + ?Sized>(&self, source: &S, layout: &PageLayout) -> DocumentSections {
        let text_of = |section: PageSection| -> String {
            layout
                .pages_for(section)
                .into_iter()
                .map(|page| source.page_text(page))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let mut sections = DocumentSections {
            personal_year: self.personal_year(&text_of(PageSection::PersonalYear)),
            personal_day_descriptions: self.day_descriptions(&text_of(PageSection::DayDescriptions)),
            day_by_color: self.color_legend(&text_of(PageSection::ColorLegend)),
            ..DocumentSections::default()
        };

        let (to_do, not_to_do) = self.weekday_rules(&text_of(PageSection::WeekdayRules));
        sections.to_do = to_do;
        sections.not_to_do = not_to_do;

        for month in Month::ALL {
            if let Some(description) = self.month_description(&text_of(PageSection::Calendar(month))) {
                sections.month_descriptions.push((month, description));
            }
        }

        sections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SourcePage;

    fn patterns() -> SectionPatterns {
        SectionPatterns::new().unwrap()
    }

    struct Pages(Vec<SourcePage>);

    impl PageSource for Pages {
        fn pages(&self) -> &[SourcePage] {
            &self.0
        }
    }

    fn page(number: u32, text: &str) -> SourcePage {
        SourcePage {
            number,
            text: text.to_string(),
            ..SourcePage::default()
        }
    }

    #[test]
    fn test_personal_year() {
        let year = patterns()
            .personal_year("Год 3 — год роста\nОписание года.\nВторая строка.")
            .unwrap();
        assert_eq!(year.title, "Год 3 — год роста");
        assert_eq!(year.year_description, "Описание года.\nВторая строка.");
    }

    #[test]
    fn test_personal_year_without_title() {
        let year = patterns().personal_year("Просто текст").unwrap();
        assert_eq!(year.title, TITLE_NOT_FOUND);
        assert_eq!(year.year_description, "Просто текст");
        assert_eq!(patterns().personal_year(""), None);
    }

    #[test]
    fn test_title_not_at_start_kept_in_description() {
        let year = patterns().personal_year("Введение\nГод 5 перемен").unwrap();
        assert_eq!(year.title, "Год 5 перемен");
        assert_eq!(year.year_description, "Введение\nГод 5 перемен");
    }

    #[test]
    fn test_day_descriptions() {
        let text = "1 Начало нового.\nпродолжение\n2 Партнёрство.\n  3 Творчество.\n9\nЗавершение.";
        let descriptions = patterns().day_descriptions(text);
        assert_eq!(
            descriptions,
            vec![
                ("1".to_string(), "Начало нового.\nпродолжение".to_string()),
                ("2".to_string(), "Партнёрство.".to_string()),
                ("3".to_string(), "Творчество.".to_string()),
                ("9".to_string(), "Завершение.".to_string()),
            ]
        );
    }

    #[test]
    fn test_day_descriptions_repeat_replaces_value() {
        let descriptions = patterns().day_descriptions("1 первый\n2 второй\n1 снова");
        assert_eq!(descriptions[0], ("1".to_string(), "снова".to_string()));
        assert_eq!(descriptions.len(), 2);
    }

    #[test]
    fn test_color_legend() {
        let text = "Значение цветов\nКрасный: осторожность\nоранжевый: активность\nЗелёный- отдых";
        let legend = patterns().color_legend(text);
        assert_eq!(
            legend,
            vec![
                (ColorCategory::Red, "осторожность".to_string()),
                (ColorCategory::Orange, "активность".to_string()),
                (ColorCategory::Green, "отдых".to_string()),
            ]
        );
    }

    #[test]
    fn test_weekday_rules_and_not_to_do() {
        let text = "Понедельник: планировать\nНе спорить\nСреда - встречи\nНе спешить\nПонедельник – отдыхать";
        let (to_do, not_to_do) = patterns().weekday_rules(text);
        assert_eq!(
            to_do,
            vec![
                (Weekday::Mon, "отдыхать".to_string()),
                (Weekday::Wed, "встречи".to_string()),
            ]
        );
        assert_eq!(
            not_to_do,
            vec![
                (Weekday::Mon, "Не спорить".to_string()),
                (Weekday::Wed, "Не спешить".to_string()),
            ]
        );
    }

    #[test]
    fn test_not_to_do_padded_with_empty() {
        let text = "Вторник: читать\nЧетверг: писать\nНе лениться";
        let (_, not_to_do) = patterns().weekday_rules(text);
        assert_eq!(not_to_do[0], (Weekday::Tue, "Не лениться".to_string()));
        assert_eq!(not_to_do[1], (Weekday::Thu, String::new()));

        let (_, none) = patterns().weekday_rules("Пятница: гулять");
        assert!(none.is_empty());
    }

    #[test]
    fn test_month_description() {
        let p = patterns();
        assert_eq!(
            p.month_description("Январь\nМесяц 4 — порядок\nРабота\nДисциплина\n\nПН ВТ"),
            Some("Месяц 4 — порядок\nРабота\nДисциплина".to_string())
        );
        assert_eq!(p.month_description("  \n "), None);

        let long = "а".repeat(700);
        assert_eq!(p.month_description(&long).unwrap().chars().count(), 500);
    }

    #[test]
    fn test_extract_uses_page_offsets() {
        let source = Pages(vec![
            page(6, "1 Начало"),
            page(7, "2 Пара"),
            page(8, "Зеленый: отдых"),
            page(9, "Суббота: гулять\nНе работать"),
            page(10, "Год 7 Мудрость\nГод размышлений."),
            page(11, "Месяц 8 силы\nДействуйте"),
            page(12, ""),
            page(13, "Март без абзаца"),
        ]);
        let sections = patterns().extract(&source, &PageLayout::default());

        assert_eq!(sections.personal_year.as_ref().unwrap().title, "Год 7 Мудрость");
        assert_eq!(sections.personal_day_descriptions.len(), 2);
        assert_eq!(sections.day_by_color, vec![(ColorCategory::Green, "отдых".to_string())]);
        assert_eq!(sections.to_do, vec![(Weekday::Sat, "гулять".to_string())]);
        assert_eq!(sections.not_to_do, vec![(Weekday::Sat, "Не работать".to_string())]);
        assert_eq!(
            sections.month_descriptions,
            vec![
                (Month::January, "Месяц 8 силы\nДействуйте".to_string()),
                (Month::March, "Март без абзаца".to_string()),
            ]
        );
        assert!(!sections.is_empty());
    }

    #[test]
    fn test_extract_empty_document() {
        let sections = patterns().extract(&Pages(Vec::new()), &PageLayout::default());
        assert!(sections.is_empty());
    }
}
