//! Source Adapter Module
//!
//! ソース文書（DOCX、PDFのページダンプ）を、コアが扱う表・ページ・単語・
//! 塗りつぶし矩形の列挙に変換するアダプター層。
//! コアはここで定義するトレイトのみに依存し、具体的なリーダーには依存しません。

mod docx;
mod layout;

use serde::{Deserialize, Serialize};

use crate::geometry::FillRect;
use crate::types::{BoundingBox, RawColor};

pub use docx::DocxDocument;
pub use layout::{ColorScale, LayoutDocument};

/// 表のセル
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCell {
    /// セルの生テキスト（段落は`\n`で連結）
    #[serde(default)]
    pub text: String,

    /// セルに直接付随する塗りつぶし色
    #[serde(default)]
    pub fill: Option<RawColor>,
}

impl SourceCell {
    pub fn new(text: impl Into<String>, fill: Option<RawColor>) -> Self {
        Self {
            text: text.into(),
            fill,
        }
    }
}

/// 文書内の表（文書順）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceTable {
    /// 表が置かれたページ（1始まり、ページ概念がない形式では`None`）
    #[serde(default)]
    pub page: Option<u32>,

    /// 行優先のセル
    #[serde(default)]
    pub rows: Vec<Vec<SourceCell>>,
}

/// ページ上の単語と座標
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub bbox: BoundingBox,
}

impl Word {
    pub fn new(text: impl Into<String>, bbox: BoundingBox) -> Self {
        Self {
            text: text.into(),
            bbox,
        }
    }
}

/// ページ（単語座標モード・テキストフローモードの入力）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcePage {
    /// ページ番号（1始まり）
    pub number: u32,

    /// ページ全体のテキスト
    pub text: String,

    pub words: Vec<Word>,

    pub rects: Vec<FillRect>,
}

/// 表を列挙できるソース
pub trait TableSource {
    /// 文書順の表
    fn tables(&self) -> &[SourceTable];
}

/// ページを列挙できるソース
pub trait PageSource {
    /// ページ番号順のページ
    fn pages(&self) -> &[SourcePage];

    /// ページ番号からページを取得
    fn page(&self, number: u32) -> Option<&SourcePage> {
        self.pages().iter().find(|page| page.number == number)
    }

    /// ページのテキスト（存在しないページは空文字列）
    fn page_text(&self, number: u32) -> &str {
        self.page(number).map(|page| page.text.as_str()).unwrap_or("")
    }
}
