//! PDF Layout Adapter Module
//!
//! PDFの読み取り自体は外部ツールに任せ、その結果をJSONのページダンプとして
//! 受け取ります。ダンプは単語座標・塗りつぶし矩形・検出済みの表を含み、
//! 表モードと単語座標モードの両方の入力になります。
//!
//! ```json
//! {
//!   "color_scale": "unit",
//!   "pages": [
//!     {
//!       "number": 11,
//!       "text": "...",
//!       "words": [{"text": "9", "bbox": {"x0": 10, "top": 20, "x1": 16, "bottom": 28}}],
//!       "rects": [{"bbox": {"x0": 0, "top": 15, "x1": 80, "bottom": 60}, "fill": [0.96, 0.6, 0.0]}],
//!       "tables": [{"rows": [[{"text": "ПН"}], [{"text": "9\n4 ЛИЧНЫЙ ДЕНЬ", "fill": "F59A00"}]]}]
//!     }
//!   ]
//! }
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{PageSource, SourcePage, SourceTable, TableSource, Word};
use crate::error::CalendarError;
use crate::geometry::FillRect;
use crate::types::RawColor;

/// 数値配列で表された色のスケール
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScale {
    /// 0〜255
    #[default]
    Byte,
    /// 0〜1（PDFの色空間の値そのまま）
    Unit,
}

impl ColorScale {
    /// 色を0〜255スケールへ変換（トークンはそのまま）
    fn normalize(self, color: RawColor) -> RawColor {
        match (self, color) {
            (ColorScale::Unit, RawColor::Components(values)) => {
                RawColor::Components(values.into_iter().map(|v| v * 255.0).collect())
            }
            (_, color) => color,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LayoutDump {
    #[serde(default)]
    color_scale: ColorScale,
    #[serde(default)]
    pages: Vec<PageDump>,
}

#[derive(Debug, Deserialize)]
struct PageDump {
    number: u32,
    #[serde(default)]
    text: String,
    #[serde(default)]
    words: Vec<Word>,
    #[serde(default)]
    rects: Vec<FillRect>,
    #[serde(default)]
    tables: Vec<SourceTable>,
}

/// PDFのページダンプ
#[derive(Debug, Clone, Default)]
pub struct LayoutDocument {
    pages: Vec<SourcePage>,
    tables: Vec<SourceTable>,
}

impl LayoutDocument {
    /// ファイルパスからダンプを読み込む
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CalendarError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CalendarError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CalendarError> {
        let dump: LayoutDump = serde_json::from_reader(reader)?;
        Ok(Self::from_dump(dump))
    }

    pub fn from_json_str(json: &str) -> Result<Self, CalendarError> {
        let dump: LayoutDump = serde_json::from_str(json)?;
        Ok(Self::from_dump(dump))
    }

    fn from_dump(dump: LayoutDump) -> Self {
        let scale = dump.color_scale;
        let mut page_dumps = dump.pages;
        // 表の文書順はページ順に従う
        page_dumps.sort_by_key(|page| page.number);

        let mut pages = Vec::with_capacity(page_dumps.len());
        let mut tables = Vec::new();

        for page in page_dumps {
            for mut table in page.tables {
                table.page = Some(page.number);
                for cell in table.rows.iter_mut().flatten() {
                    cell.fill = cell.fill.take().map(|fill| scale.normalize(fill));
                }
                tables.push(table);
            }

            let rects = page
                .rects
                .into_iter()
                .map(|rect| FillRect::new(rect.bbox, rect.fill.map(|fill| scale.normalize(fill))))
                .collect();

            pages.push(SourcePage {
                number: page.number,
                text: page.text,
                words: page.words,
                rects,
            });
        }

        tracing::debug!(pages = pages.len(), tables = tables.len(), "loaded page layout dump");

        Self { pages, tables }
    }
}

impl TableSource for LayoutDocument {
    fn tables(&self) -> &[SourceTable] {
        &self.tables
    }
}

impl PageSource for LayoutDocument {
    fn pages(&self) -> &[SourcePage] {
        &self.pages
    }
}
