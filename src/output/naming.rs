//! Export File Naming
//!
//! ソースファイル名に埋め込まれた番号からエクスポートファイル名を決める。

use std::path::Path;

use serde::{Deserialize, Serialize};

/// 番号が見つからなかった場合のプレースホルダー
const MISSING_NUMBER: &str = "X";

/// エクスポートファイル名の規則
///
/// ソースファイル名の中で`label`の直後（空白は読み飛ばす）に続く整数を
/// `template`の`{n}`に埋め込みます。
///
/// ```rust
/// use calzero::ExportNaming;
///
/// let naming = ExportNaming::default();
/// assert_eq!(naming.file_name("Год 6 S (2025 КС).pdf"), "Ncalendar_6.json");
/// assert_eq!(naming.file_name("scan.pdf"), "Ncalendar_X.json");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportNaming {
    pub label: String,
    pub template: String,
}

impl Default for ExportNaming {
    fn default() -> Self {
        Self {
            label: "Год".to_string(),
            template: "Ncalendar_{n}.json".to_string(),
        }
    }
}

impl ExportNaming {
    pub fn new(label: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            template: template.into(),
        }
    }

    /// ソースファイル名から番号を取り出す（最初に番号が続くラベルを採用）
    pub fn number(&self, source: impl AsRef<Path>) -> Option<String> {
        if self.label.is_empty() {
            return None;
        }
        let name = source.as_ref().file_name()?.to_string_lossy().into_owned();

        name.match_indices(self.label.as_str()).find_map(|(start, _)| {
            let rest = name[start + self.label.len()..].trim_start();
            let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
            (!digits.is_empty()).then_some(digits)
        })
    }

    pub fn file_name(&self, source: impl AsRef<Path>) -> String {
        let number = self
            .number(source)
            .unwrap_or_else(|| MISSING_NUMBER.to_string());
        self.template.replace("{n}", &number)
    }
}
