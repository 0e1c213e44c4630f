//! Output Module
//!
//! 1文書分の抽出結果を単独のJSONファイルとして書き出すモジュール。

mod naming;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};

use crate::error::CalendarError;
use crate::sections::DocumentSections;
use crate::store::{write_pretty, CalendarStore, MemberSection};
use crate::types::DocumentExtraction;

pub use naming::ExportNaming;

/// エクスポートのインデント幅
const EXPORT_INDENT: &[u8] = b"  ";

/// スクラッチストア内のメンバーキー
const SCRATCH_MEMBER: &str = "document";

/// 1文書分のエクスポート
///
/// キーの順序は`year`, `personal_year`, `personal_day_descriptions`,
/// `day_by_color`, `to_do`, `not_to_do`, `calendar`で固定です。
/// 見つからなかったセクションは空オブジェクトとして出力されます。
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentExport {
    value: Value,
}

impl DocumentExport {
    /// 抽出結果から組み立てる
    ///
    /// 日セルと月の説明は集約ストアと同じマージ規則（後勝ち）で
    /// `calendar.<month>`にまとめられます。
    pub fn new(
        year: i32,
        extraction: &DocumentExtraction,
        sections: &DocumentSections,
    ) -> Result<Self, CalendarError> {
        let year_key = year.to_string();
        let mut scratch = CalendarStore::new();
        scratch.merge_extraction(&year_key, SCRATCH_MEMBER, extraction)?;
        scratch.merge_sections(&year_key, SCRATCH_MEMBER, sections)?;

        let empty = Map::new();
        let member = scratch.member(&year_key, SCRATCH_MEMBER).unwrap_or(&empty);
        let section = |key: &str| member.get(key).cloned().unwrap_or_else(|| json!({}));

        let mut root = Map::new();
        root.insert("year".to_string(), json!(year));
        for member_section in MemberSection::ALL {
            root.insert(member_section.key().to_string(), section(member_section.key()));
        }
        root.insert("calendar".to_string(), section("calendar"));

        Ok(Self {
            value: Value::Object(root),
        })
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }

    /// 2スペースインデントで書き出す
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), CalendarError> {
        write_pretty(writer, &self.value, EXPORT_INDENT)
    }

    pub fn to_json_string(&self) -> Result<String, CalendarError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8(buffer).map_err(|e| e.utf8_error())?)
    }

    /// `output_dir`に`naming`で決まる名前で保存し、書き込んだパスを返す
    pub fn save(
        &self,
        output_dir: impl AsRef<Path>,
        naming: &ExportNaming,
        source: impl AsRef<Path>,
    ) -> Result<PathBuf, CalendarError> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)?;

        let path = output_dir.join(naming.file_name(source));
        let mut file = fs::File::create(&path)?;
        self.write_to(&mut file)?;
        file.flush()?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorCategory;
    use crate::months::Month;
    use crate::sections::{PersonalYear, Weekday};
    use crate::types::{CellRecord, ExtractionStats};

    fn extraction() -> DocumentExtraction {
        DocumentExtraction {
            records: vec![
                (
                    Month::January,
                    CellRecord {
                        day: 9,
                        personal_day: 4,
                        day_by_color: Some(ColorCategory::Orange),
                    },
                ),
                (
                    Month::January,
                    CellRecord {
                        day: 10,
                        personal_day: 5,
                        day_by_color: None,
                    },
                ),
            ],
            stats: ExtractionStats::default(),
        }
    }

    #[test]
    fn test_export_key_order_and_empty_sections() {
        let export = DocumentExport::new(2025, &DocumentExtraction::default(), &DocumentSections::default())
            .unwrap();
        let keys: Vec<&str> = export
            .as_value()
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            keys,
            vec![
                "year",
                "personal_year",
                "personal_day_descriptions",
                "day_by_color",
                "to_do",
                "not_to_do",
                "calendar"
            ]
        );
        assert_eq!(export.as_value()["year"], json!(2025));
        assert_eq!(export.as_value()["calendar"], json!({}));
    }

    #[test]
    fn test_export_calendar_and_sections() {
        let sections = DocumentSections {
            personal_year: Some(PersonalYear {
                title: "Год 4".to_string(),
                year_description: "Год труда.".to_string(),
            }),
            to_do: vec![(Weekday::Mon, "Планировать".to_string())],
            month_descriptions: vec![(Month::January, "Месяц начала".to_string())],
            ..DocumentSections::default()
        };
        let export = DocumentExport::new(2025, &extraction(), &sections).unwrap();
        let value = export.as_value();

        assert_eq!(value["personal_year"]["title"], json!("Год 4"));
        assert_eq!(value["to_do"]["mon"], json!("Планировать"));
        assert_eq!(
            value["calendar"]["january"]["9"],
            json!({"day": 9, "personal_day": 4, "day_by_color": "orange"})
        );
        assert_eq!(value["calendar"]["january"]["10"]["day_by_color"], Value::Null);
        assert_eq!(
            value["calendar"]["january"]["personal_month_description"],
            json!("Месяц начала")
        );
    }

    #[test]
    fn test_export_two_space_indent_without_escaping() {
        let sections = DocumentSections {
            personal_year: Some(PersonalYear {
                title: "Год 4".to_string(),
                year_description: String::new(),
            }),
            ..DocumentSections::default()
        };
        let export = DocumentExport::new(2025, &DocumentExtraction::default(), &sections).unwrap();
        let json = export.to_json_string().unwrap();
        assert!(json.starts_with("{\n  \"year\": 2025,\n  \"personal_year\": {\n    \"title\": \"Год 4\""));
        assert!(!json.ends_with('\n'));
    }

    #[test]
    fn test_export_save() {
        let dir = tempfile::tempdir().unwrap();
        let export = DocumentExport::new(2025, &extraction(), &DocumentSections::default()).unwrap();
        let path = export
            .save(dir.path().join("out"), &ExportNaming::default(), "Год 7 S (2025 КС).pdf")
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "Ncalendar_7.json");

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, *export.as_value());
    }
}
