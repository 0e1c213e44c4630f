//! Run Configuration Module
//!
//! TOMLファイルから実行設定（年、ストア、ソース文書、色の対応表など）を読み込むモジュール。
//!
//! ```toml
//! year = 2025
//! store = "db/y2025.json"
//! tolerance = 25
//!
//! [pages]
//! start = 11
//! end = 22
//!
//! [export]
//! dir = "json_output"
//!
//! [[categories]]
//! name = "orange"
//! token = "F59A00"
//!
//! [[sources]]
//! path = "docs/Год {n} S (2025 КС).docx"
//! members = [1, 2, 3, 4, 5]
//! ```
//!
//! 相対パスはカレントディレクトリ基準でそのまま使われます。

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::api::SourceKind;
use crate::builder::ExtractorBuilder;
use crate::color::{CategoryPalette, CategorySpec, ColorCategory};
use crate::error::CalendarError;
use crate::output::ExportNaming;
use crate::run::DocumentSpec;
use crate::words::WordLayout;

/// デフォルトのメンバーキーのテンプレート
pub const DEFAULT_MEMBER_KEY: &str = "member_{n}";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// 集約ストアの年キー（日付検証にも使う）
    pub year: i32,
    pub store: Option<PathBuf>,
    pub marker: Option<String>,
    pub tolerance: Option<u8>,
    pub header_rows: Option<usize>,
    pub pages: Option<PagesConfig>,
    pub words: Option<WordLayout>,
    pub export: Option<ExportConfig>,
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PagesConfig {
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    pub dir: Option<PathBuf>,
    pub label: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryConfig {
    pub name: ColorCategory,
    pub token: String,
    /// 省略時はトークンから導出
    pub rgb: Option<[u8; 3]>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// `{n}`をメンバー番号で置き換えるパステンプレート
    pub path: String,
    pub members: Vec<u32>,
    /// 省略時は拡張子から推定
    pub kind: Option<SourceKind>,
    pub member_key: Option<String>,
}

impl RunConfig {
    /// ファイルから読み込む
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CalendarError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CalendarError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, CalendarError> {
        toml::from_str(contents)
            .map_err(|e| CalendarError::Config(format!("Failed to parse config file as TOML: {}", e)))
    }

    /// 年キー（`"2025"`など）
    pub fn year_key(&self) -> String {
        self.year.to_string()
    }

    pub fn store_path(&self) -> Option<&Path> {
        self.store.as_deref()
    }

    pub fn export_dir(&self) -> Option<&Path> {
        self.export.as_ref().and_then(|export| export.dir.as_deref())
    }

    /// エクスポートファイル名の規則（未設定の項目はデフォルト）
    pub fn export_naming(&self) -> ExportNaming {
        let mut naming = ExportNaming::default();
        if let Some(export) = &self.export {
            if let Some(label) = &export.label {
                naming.label = label.clone();
            }
            if let Some(file_name) = &export.file_name {
                naming.template = file_name.clone();
            }
        }
        naming
    }

    /// カテゴリ表（`[[categories]]`が空ならデフォルト）
    pub fn palette(&self) -> Result<CategoryPalette, CalendarError> {
        if self.categories.is_empty() {
            return Ok(CategoryPalette::default());
        }
        let specs = self
            .categories
            .iter()
            .map(|category| match category.rgb {
                Some(rgb) => Ok(CategorySpec {
                    category: category.name,
                    token: category.token.clone(),
                    rgb,
                }),
                None => CategorySpec::from_token(category.name, &category.token),
            })
            .collect::<Result<Vec<_>, CalendarError>>()?;
        CategoryPalette::new(specs)
    }

    /// 設定を反映したビルダー（検証は`build()`で行われる）
    pub fn extractor_builder(&self) -> Result<ExtractorBuilder, CalendarError> {
        let mut builder = ExtractorBuilder::new()
            .with_palette(self.palette()?)
            .with_year(self.year);

        if let Some(marker) = &self.marker {
            builder = builder.with_marker(marker.clone());
        }
        if let Some(tolerance) = self.tolerance {
            builder = builder.with_tolerance(tolerance);
        }
        if let Some(header_rows) = self.header_rows {
            builder = builder.with_header_rows(header_rows);
        }
        if let Some(pages) = self.pages {
            builder = builder.with_page_layout(pages.start, pages.end);
        }
        if let Some(words) = self.words {
            builder = builder.with_word_layout(words);
        }
        Ok(builder)
    }

    /// `[[sources]]`を展開した文書リスト（設定ファイルの記述順）
    pub fn documents(&self) -> Result<Vec<DocumentSpec>, CalendarError> {
        let mut documents = Vec::new();
        for source in &self.sources {
            if source.members.is_empty() {
                return Err(CalendarError::Config(format!(
                    "Source '{}' lists no members",
                    source.path
                )));
            }
            let member_key = source.member_key.as_deref().unwrap_or(DEFAULT_MEMBER_KEY);

            for member in &source.members {
                let n = member.to_string();
                let path = PathBuf::from(source.path.replace("{n}", &n));
                let kind = match source.kind {
                    Some(kind) => kind,
                    None => SourceKind::infer(&path).ok_or_else(|| {
                        CalendarError::Config(format!(
                            "Cannot infer source kind of '{}'; set `kind` explicitly",
                            path.display()
                        ))
                    })?,
                };
                documents.push(DocumentSpec {
                    path,
                    member: member_key.replace("{n}", &n),
                    kind,
                });
            }
        }
        Ok(documents)
    }
}
