//! Calendar Aggregate Store Module
//!
//! 複数年・複数メンバーのカレンダーを保持する集約JSONドキュメント。
//!
//! ```text
//! {
//!     "2025": {
//!         "member_4": {
//!             "calendar": { "january": { "9": {"day": 9, "personal_day": 4, "day_by_color": "orange"} } },
//!             "personal_year": {...},
//!             "personal_day_descriptions": {...},
//!             "day_by_color": {...},
//!             "to_do": {...},
//!             "not_to_do": {...}
//!         }
//!     }
//! }
//! ```
//!
//! 書き込みはキーの追加・置き換えのみで、兄弟キー（他の年・メンバー・月・日、
//! および未知のキー）は削除されません。同じ (年, メンバー, 月, 日) への
//! 書き込みは後勝ちです。
//!
//! 永続化は実行の最後に一度だけ行われます。実行途中で異常終了した場合、
//! その実行で集めたデータは失われます（途中経過のチェックポイントはありません）。

use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tempfile::NamedTempFile;

use crate::error::CalendarError;
use crate::months::Month;
use crate::sections::DocumentSections;
use crate::types::{CellRecord, DocumentExtraction};

/// ストアのインデント幅
const STORE_INDENT: &[u8] = b"    ";

/// カレンダー本体のキー
const CALENDAR_KEY: &str = "calendar";

/// 月の説明のキー（`calendar.<month>`の中）
const MONTH_DESCRIPTION_KEY: &str = "personal_month_description";

/// メンバー配下のセクション
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberSection {
    PersonalYear,
    PersonalDayDescriptions,
    DayByColor,
    ToDo,
    NotToDo,
}

impl MemberSection {
    pub const ALL: [MemberSection; 5] = [
        MemberSection::PersonalYear,
        MemberSection::PersonalDayDescriptions,
        MemberSection::DayByColor,
        MemberSection::ToDo,
        MemberSection::NotToDo,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            MemberSection::PersonalYear => "personal_year",
            MemberSection::PersonalDayDescriptions => "personal_day_descriptions",
            MemberSection::DayByColor => "day_by_color",
            MemberSection::ToDo => "to_do",
            MemberSection::NotToDo => "not_to_do",
        }
    }
}

/// 集約ストア
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalendarStore {
    root: Map<String, Value>,
}

impl CalendarStore {
    /// 空のストア
    pub fn new() -> Self {
        Self::default()
    }

    /// ファイルから読み込む
    ///
    /// ファイルが存在しない場合は空のストアを返します。
    ///
    /// # エラー
    ///
    /// JSONとして不正、または構造が期待と異なる場合は`CalendarError::SchemaViolation`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CalendarError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => {
                let store = Self::from_json_str(&content)?;
                tracing::info!(path = %path.display(), years = store.root.len(), "loaded aggregate store");
                Ok(store)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "aggregate store not found, starting empty");
                Ok(Self::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 任意のリーダーから読み込む
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, CalendarError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Self::from_json_str(&content)
    }

    /// JSON文字列から読み込み、スキーマを検証する
    pub fn from_json_str(json: &str) -> Result<Self, CalendarError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| CalendarError::SchemaViolation(format!("not valid JSON: {}", e)))?;
        let root = match value {
            Value::Object(root) => root,
            other => {
                return Err(CalendarError::SchemaViolation(format!(
                    "root must be an object, found {}",
                    type_name(&other)
                )))
            }
        };
        validate(&root)?;
        Ok(Self { root })
    }

    /// 整形済みJSON（4スペースインデント、末尾改行なし）
    pub fn to_json_string(&self) -> Result<String, CalendarError> {
        let mut out = Vec::new();
        write_pretty(&mut out, &self.root, STORE_INDENT)?;
        Ok(String::from_utf8(out).map_err(|e| e.utf8_error())?)
    }

    /// ファイルへ保存
    ///
    /// 同じディレクトリの一時ファイルへ書き込んでから置き換えるため、
    /// 書き込み途中で中断しても既存のファイルは壊れません。
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CalendarError> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let content = self.to_json_string()?;
        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(content.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| CalendarError::Io(e.error))?;

        tracing::info!(path = %path.display(), "saved aggregate store");
        Ok(())
    }

    /// 1日分のレコードをマージ（同じキーは丸ごと置き換え）
    pub fn merge(
        &mut self,
        year: &str,
        member: &str,
        month: Month,
        record: &CellRecord,
    ) -> Result<(), CalendarError> {
        let days = self.month_mut(year, member, month)?;
        days.insert(record.day.to_string(), record_value(record));
        Ok(())
    }

    /// 1文書分の抽出結果を文書順にマージし、書き込んだ件数を返す
    pub fn merge_extraction(
        &mut self,
        year: &str,
        member: &str,
        extraction: &DocumentExtraction,
    ) -> Result<usize, CalendarError> {
        for (month, record) in &extraction.records {
            self.merge(year, member, *month, record)?;
        }
        Ok(extraction.records.len())
    }

    /// セクションの1項目をマージ
    pub fn merge_section(
        &mut self,
        year: &str,
        member: &str,
        section: MemberSection,
        key: &str,
        value: Value,
    ) -> Result<(), CalendarError> {
        let member_map = self.member_mut(year, member)?;
        let section_map = ensure_object(member_map, section.key())?;
        section_map.insert(key.to_string(), value);
        Ok(())
    }

    /// テキストセクション一式をマージ
    pub fn merge_sections(
        &mut self,
        year: &str,
        member: &str,
        sections: &DocumentSections,
    ) -> Result<(), CalendarError> {
        // 何も見つからなかった文書では空のセクションも作らない
        if sections.is_empty() {
            return Ok(());
        }

        if let Some(personal_year) = &sections.personal_year {
            let section = MemberSection::PersonalYear;
            self.merge_section(year, member, section, "title", json!(personal_year.title))?;
            self.merge_section(
                year,
                member,
                section,
                "year_description",
                json!(personal_year.year_description),
            )?;
        }
        for (number, description) in &sections.personal_day_descriptions {
            let section = MemberSection::PersonalDayDescriptions;
            self.merge_section(year, member, section, number, json!(description))?;
        }
        for (category, meaning) in &sections.day_by_color {
            let section = MemberSection::DayByColor;
            self.merge_section(year, member, section, category.as_str(), json!(meaning))?;
        }
        for (day, rule) in &sections.to_do {
            self.merge_section(year, member, MemberSection::ToDo, day.as_str(), json!(rule))?;
        }
        for (day, rule) in &sections.not_to_do {
            self.merge_section(year, member, MemberSection::NotToDo, day.as_str(), json!(rule))?;
        }
        for (month, description) in &sections.month_descriptions {
            let days = self.month_mut(year, member, *month)?;
            days.insert(MONTH_DESCRIPTION_KEY.to_string(), json!(description));
        }
        Ok(())
    }

    /// 保存済みのレコードを読み出す
    pub fn record(&self, year: &str, member: &str, month: Month, day: u32) -> Option<CellRecord> {
        let value = self
            .member(year, member)?
            .get(CALENDAR_KEY)?
            .get(month.as_str())?
            .get(day.to_string())?;
        serde_json::from_value(value.clone()).ok()
    }

    /// メンバーのオブジェクト
    pub fn member(&self, year: &str, member: &str) -> Option<&Map<String, Value>> {
        self.root.get(year)?.get(member)?.as_object()
    }

    /// 年のキー（文書内の順）
    pub fn years(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    /// 指定した年のメンバーのキー
    pub fn members(&self, year: &str) -> Vec<&str> {
        self.root
            .get(year)
            .and_then(Value::as_object)
            .map(|members| members.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    fn member_mut(&mut self, year: &str, member: &str) -> Result<&mut Map<String, Value>, CalendarError> {
        let year_map = ensure_object(&mut self.root, year)?;
        ensure_object(year_map, member)
    }

    fn month_mut(
        &mut self,
        year: &str,
        member: &str,
        month: Month,
    ) -> Result<&mut Map<String, Value>, CalendarError> {
        let member_map = self.member_mut(year, member)?;
        let calendar = ensure_object(member_map, CALENDAR_KEY)?;
        ensure_object(calendar, month.as_str())
    }
}

/// `map[key]`をオブジェクトとして取得（なければ作成）
///
/// 読み込み時の検証を通ったストアでは置き換えは起きません。
fn ensure_object<'a>(
    map: &'a mut Map<String, Value>,
    key: &str,
) -> Result<&'a mut Map<String, Value>, CalendarError> {
    map.entry(key.to_string())
        .and_modify(|value| {
            if !value.is_object() {
                tracing::warn!(key, found = type_name(value), "replacing non-object value with an empty object");
                *value = Value::Object(Map::new());
            }
        })
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| CalendarError::SchemaViolation(format!("'{}' is not an object", key)))
}

fn record_value(record: &CellRecord) -> Value {
    json!({
        "day": record.day,
        "personal_day": record.personal_day,
        "day_by_color": record.day_by_color.map(|category| category.as_str()),
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 読み込み時のスキーマ検証
fn validate(root: &Map<String, Value>) -> Result<(), CalendarError> {
    let expect_object = |value: &Value, path: &str| -> Result<(), CalendarError> {
        if value.is_object() {
            Ok(())
        } else {
            Err(CalendarError::SchemaViolation(format!(
                "'{}' must be an object, found {}",
                path,
                type_name(value)
            )))
        }
    };

    for (year, members) in root {
        expect_object(members, year)?;
        let Some(members) = members.as_object() else {
            continue;
        };
        for (member, body) in members {
            let member_path = format!("{}.{}", year, member);
            expect_object(body, &member_path)?;
            let Some(body) = body.as_object() else {
                continue;
            };

            if let Some(calendar) = body.get(CALENDAR_KEY) {
                let calendar_path = format!("{}.{}", member_path, CALENDAR_KEY);
                expect_object(calendar, &calendar_path)?;
                if let Some(months) = calendar.as_object() {
                    for (month, days) in months {
                        expect_object(days, &format!("{}.{}", calendar_path, month))?;
                    }
                }
            }

            for section in MemberSection::ALL {
                if let Some(value) = body.get(section.key()) {
                    expect_object(value, &format!("{}.{}", member_path, section.key()))?;
                }
            }
        }
    }
    Ok(())
}

/// 指定インデントで整形して書き込む（非ASCII文字はそのまま）
pub(crate) fn write_pretty<W: Write, T: Serialize + ?Sized>(
    writer: W,
    value: &T,
    indent: &[u8],
) -> Result<(), CalendarError> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent);
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    value.serialize(&mut serializer)?;
    Ok(())
}
