//! DOCX Table Adapter Module
//!
//! DOCXファイル（ZIPアーカイブ）内の`word/document.xml`をquick-xmlで
//! ストリーミング解析し、トップレベルの表（`w:tbl`）を文書順に取り出します。
//!
//! - セルテキスト: 段落を`\n`で連結、`w:tab`は`\t`、`w:br`/`w:cr`は`\n`
//! - セルの塗りつぶし: `w:tcPr/w:shd/@w:fill`（`auto`は塗りつぶしなし）
//! - 入れ子の表はテキストにも表の列挙にも含めません

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use super::{SourceCell, SourceTable, TableSource};
use crate::error::CalendarError;
use crate::security::ArchiveLimits;
use crate::types::RawColor;

/// 本文XMLのアーカイブ内パス
const DOCUMENT_XML: &str = "word/document.xml";

/// DOCX文書（表のみを保持）
#[derive(Debug, Clone, Default)]
pub struct DocxDocument {
    tables: Vec<SourceTable>,
}

impl DocxDocument {
    /// ファイルパスからDOCXを開く
    ///
    /// # エラー
    ///
    /// * `CalendarError::SourceNotFound` - ファイルが存在しない場合
    /// * `CalendarError::SecurityViolation` - サイズ制限やパス検証に違反した場合
    /// * `CalendarError::Zip` / `CalendarError::Parse` - コンテナやXMLが壊れている場合
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CalendarError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CalendarError::SourceNotFound {
                path: path.to_path_buf(),
            });
        }

        let limits = ArchiveLimits::default();
        let file = File::open(path)?;
        limits.check_input_size(file.metadata()?.len())?;

        Self::read(BufReader::new(file), &limits)
    }

    /// 任意のリーダーからDOCXを読み込む
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, CalendarError> {
        Self::read(reader, &ArchiveLimits::default())
    }

    fn read<R: Read + Seek>(reader: R, limits: &ArchiveLimits) -> Result<Self, CalendarError> {
        let mut archive = ZipArchive::new(reader).map_err(|e| CalendarError::Zip(e.to_string()))?;
        limits.check_archive(&mut archive)?;

        let mut part = archive.by_name(DOCUMENT_XML).map_err(|_| {
            CalendarError::Parse(format!("{} not found in archive", DOCUMENT_XML))
        })?;
        let mut xml = Vec::new();
        part.read_to_end(&mut xml)?;

        Self::from_xml(&xml)
    }

    /// `word/document.xml`の内容から直接構築
    pub fn from_xml(xml: &[u8]) -> Result<Self, CalendarError> {
        let tables = parse_tables(xml)?;
        tracing::debug!(tables = tables.len(), "parsed DOCX document body");
        Ok(Self { tables })
    }
}

impl TableSource for DocxDocument {
    fn tables(&self) -> &[SourceTable] {
        &self.tables
    }
}

/// 解析中のセル
#[derive(Default)]
struct CellState {
    paragraphs: Vec<String>,
    paragraph: Option<String>,
    fill: Option<RawColor>,
}

impl CellState {
    fn push_char(&mut self, c: char) {
        if let Some(paragraph) = self.paragraph.as_mut() {
            paragraph.push(c);
        }
    }

    fn finish(mut self) -> SourceCell {
        // 閉じられていない段落も拾う
        if let Some(paragraph) = self.paragraph.take() {
            self.paragraphs.push(paragraph);
        }
        SourceCell::new(self.paragraphs.join("\n"), self.fill)
    }
}

/// 本文XMLからトップレベルの表を抽出
fn parse_tables(xml: &[u8]) -> Result<Vec<SourceTable>, CalendarError> {
    let mut reader = Reader::from_reader(xml);
    // w:t内の先頭・末尾の空白を保持する
    reader.trim_text(false);

    let mut buf = Vec::new();
    let mut tables = Vec::new();

    let mut table_depth = 0usize;
    let mut table: Option<SourceTable> = None;
    let mut row: Option<Vec<SourceCell>> = None;
    let mut cell: Option<CellState> = None;
    let mut in_tc_pr = false;
    let mut in_run = false;
    let mut in_t = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"tbl" => {
                        table_depth += 1;
                        if table_depth == 1 {
                            table = Some(SourceTable::default());
                        }
                    }
                    // 入れ子の表の中身はすべて無視
                    _ if table_depth != 1 => {}
                    b"tr" => row = Some(Vec::new()),
                    b"tc" => cell = Some(CellState::default()),
                    b"tcPr" => in_tc_pr = true,
                    b"p" => {
                        if let Some(cell) = cell.as_mut() {
                            cell.paragraph = Some(String::new());
                        }
                    }
                    b"r" => in_run = true,
                    b"t" if in_run => in_t = true,
                    b"shd" if in_tc_pr => {
                        if let Some(cell) = cell.as_mut() {
                            cell.fill = read_fill(&e)?;
                        }
                    }
                    b"tab" | b"br" | b"cr" if in_run => {
                        if let Some(cell) = cell.as_mut() {
                            cell.push_char(inline_char(name.as_ref()));
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) if table_depth == 1 => {
                let name = e.local_name();
                match name.as_ref() {
                    b"shd" if in_tc_pr => {
                        if let Some(cell) = cell.as_mut() {
                            cell.fill = read_fill(&e)?;
                        }
                    }
                    b"tab" | b"br" | b"cr" if in_run => {
                        if let Some(cell) = cell.as_mut() {
                            cell.push_char(inline_char(name.as_ref()));
                        }
                    }
                    // 空の段落（<w:p/>）も1行として数える
                    b"p" => {
                        if let Some(cell) = cell.as_mut() {
                            cell.paragraphs.push(String::new());
                        }
                    }
                    b"tc" => {
                        if let Some(row) = row.as_mut() {
                            row.push(SourceCell::new("", None));
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if table_depth == 1 && in_t {
                    if let Some(cell) = cell.as_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| CalendarError::Parse(format!("XML text error: {}", e)))?;
                        if let Some(paragraph) = cell.paragraph.as_mut() {
                            paragraph.push_str(&text);
                        }
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"tbl" => {
                        if table_depth == 1 {
                            if let Some(table) = table.take() {
                                tables.push(table);
                            }
                        }
                        table_depth = table_depth.saturating_sub(1);
                    }
                    _ if table_depth != 1 => {}
                    b"tr" => {
                        if let (Some(table), Some(row)) = (table.as_mut(), row.take()) {
                            table.rows.push(row);
                        }
                    }
                    b"tc" => {
                        if let Some(state) = cell.take() {
                            let finished = state.finish();
                            if let Some(row) = row.as_mut() {
                                row.push(finished);
                            }
                        }
                    }
                    b"tcPr" => in_tc_pr = false,
                    b"p" => {
                        if let Some(cell) = cell.as_mut() {
                            if let Some(paragraph) = cell.paragraph.take() {
                                cell.paragraphs.push(paragraph);
                            }
                        }
                    }
                    b"r" => in_run = false,
                    b"t" => in_t = false,
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CalendarError::Parse(format!(
                    "XML parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(tables)
}

/// ラン内のインライン要素に対応する文字
fn inline_char(local_name: &[u8]) -> char {
    match local_name {
        b"tab" => '\t',
        _ => '\n',
    }
}

/// `w:shd`要素から`w:fill`属性を読み取る
fn read_fill(e: &BytesStart<'_>) -> Result<Option<RawColor>, CalendarError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| CalendarError::Parse(format!("XML attribute error: {}", e)))?;
        if attr.key.local_name().as_ref() == b"fill" {
            let value = attr
                .unescape_value()
                .map_err(|e| CalendarError::Parse(format!("XML attribute error: {}", e)))?;
            let value = value.trim();
            if value.is_empty() || value.eq_ignore_ascii_case("auto") {
                return Ok(None);
            }
            return Ok(Some(RawColor::token(value)));
        }
    }
    Ok(None)
}
