//! Builder Module
//!
//! Fluent Builder APIを提供し、`Extractor`インスタンスを段階的に構築する。

use chrono::NaiveDate;

use crate::cell::{parse_cell_with_marker, ParseFailure, ParsedCell, PERSONAL_DAY_MARKER};
use crate::color::{CategoryPalette, ColorCategory, ColorClassifier, DEFAULT_TOLERANCE};
use crate::error::CalendarError;
use crate::geometry::assign_fills;
use crate::months::{month_for_table, Month, PageLayout, PageSection};
use crate::parser::{PageSource, TableSource};
use crate::sections::{DocumentSections, SectionPatterns};
use crate::types::{BoundingBox, DocumentExtraction, RawColor, SkipReason};
use crate::words::{find_day_cells, WordLayout};

/// 抽出処理の設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct ExtractionConfig {
    /// カテゴリ→色の対応表
    pub palette: CategoryPalette,

    /// RGB照合の許容誤差
    pub tolerance: u8,

    /// 日セルを示すマーカーフレーズ
    pub marker: String,

    /// カレンダーページの範囲
    pub page_layout: PageLayout,

    /// 表の先頭で読み飛ばす見出し行の数
    pub header_rows: usize,

    /// 日付検証に使う年（Noneの場合は検証しない）
    pub year: Option<i32>,

    /// 単語座標モードの許容誤差
    pub word_layout: WordLayout,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            palette: CategoryPalette::default(),
            tolerance: DEFAULT_TOLERANCE,
            marker: PERSONAL_DAY_MARKER.to_string(),
            page_layout: PageLayout::default(),
            header_rows: 1,
            year: None,
            word_layout: WordLayout::default(),
        }
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Extractor`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust,no_run
/// use calzero::ExtractorBuilder;
///
/// # fn main() -> Result<(), calzero::CalendarError> {
/// let extractor = ExtractorBuilder::new()
///     .with_tolerance(15)
///     .with_page_layout(11, 22)
///     .with_year(2025)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ExtractorBuilder {
    /// 内部設定（構築中）
    config: ExtractionConfig,
}

impl ExtractorBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 色: red `FA0701` / orange `F59A00` / green `50A5A0`
    /// - 許容誤差: 25
    /// - マーカー: `ЛИЧНЫЙ ДЕНЬ`
    /// - カレンダーページ: 11〜22
    /// - 見出し行: 1
    /// - 日付検証: なし
    pub fn new() -> Self {
        Self::default()
    }

    /// カテゴリ→色の対応表を指定する
    ///
    /// ```rust,no_run
    /// use calzero::{CategoryPalette, CategorySpec, ColorCategory, ExtractorBuilder};
    ///
    /// # fn main() -> Result<(), calzero::CalendarError> {
    /// let palette = CategoryPalette::new(vec![
    ///     CategorySpec::from_token(ColorCategory::Red, "FF0000")?,
    ///     CategorySpec::from_token(ColorCategory::Orange, "F59B01")?,
    ///     CategorySpec::from_token(ColorCategory::Green, "51A5A0")?,
    /// ])?;
    /// let builder = ExtractorBuilder::new().with_palette(palette);
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_palette(mut self, palette: CategoryPalette) -> Self {
        self.config.palette = palette;
        self
    }

    /// RGB照合の許容誤差（チャンネルごとの絶対差）
    pub fn with_tolerance(mut self, tolerance: u8) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    /// 日セルのマーカーフレーズ（大文字小文字は区別しない）
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.marker = marker.into();
        self
    }

    /// カレンダーページの範囲（1始まり、両端を含む）
    ///
    /// # 制約
    ///
    /// * `start >= 1` かつ `start <= end` でなければならない
    /// * 制約違反の場合、`build()`時に`CalendarError::Config`を返す
    pub fn with_page_layout(mut self, start: u32, end: u32) -> Self {
        self.config.page_layout = PageLayout {
            calendar_start: start,
            calendar_end: end,
        };
        self
    }

    /// 表の先頭で読み飛ばす見出し行（曜日の行）の数
    pub fn with_header_rows(mut self, rows: usize) -> Self {
        self.config.header_rows = rows;
        self
    }

    /// 日付検証に使う年
    ///
    /// 指定すると、その年に存在しない日付（2月30日など）は`impossible_date`として
    /// 読み飛ばされます。
    pub fn with_year(mut self, year: i32) -> Self {
        self.config.year = Some(year);
        self
    }

    /// 単語座標モードの許容誤差
    pub fn with_word_layout(mut self, layout: WordLayout) -> Self {
        self.config.word_layout = layout;
        self
    }

    /// 設定を検証し、`Extractor`インスタンスを生成する
    ///
    /// # 発生し得るエラー
    ///
    /// * `CalendarError::Config(String)`: 設定の検証に失敗した場合
    ///   * RGBターゲットがトークンから許容誤差以上離れている
    ///   * マーカーが空
    ///   * ページ範囲が不正
    ///   * 単語座標の許容誤差が負または非数
    ///   * 年が日付として表現できない
    pub fn build(self) -> Result<Extractor, CalendarError> {
        let config = self.config;

        // 1. 色の対応表の整合性
        config.palette.check_consistency(config.tolerance)?;

        // 2. マーカー
        if config.marker.trim().is_empty() {
            return Err(CalendarError::Config("Marker phrase must not be empty".to_string()));
        }

        // 3. レイアウト
        config.page_layout.validate()?;
        config.word_layout.validate()?;

        // 4. 年
        if let Some(year) = config.year {
            if NaiveDate::from_ymd_opt(year, 1, 1).is_none() {
                return Err(CalendarError::Config(format!("Year {} is out of range", year)));
            }
        }

        // 5. Extractorインスタンス生成
        let patterns = SectionPatterns::new()?;
        Ok(Extractor::new(config, patterns))
    }
}

/// 抽出処理のファサード
///
/// ソース文書（表・ページ）から日セルのレコードとテキストセクションを取り出す
/// メインエントリーポイントです。ストアへの書き込みは行いません。
///
/// # 使用例
///
/// ```rust,no_run
/// use calzero::{CalendarStore, DocxDocument, ExtractorBuilder};
///
/// # fn main() -> Result<(), calzero::CalendarError> {
/// let extractor = ExtractorBuilder::new().build()?;
/// let document = DocxDocument::open("Год 4 S (2025).docx")?;
/// let extraction = extractor.extract_tables(&document);
///
/// let mut store = CalendarStore::load("db/y2025.json")?;
/// store.merge_extraction("2025", "member_4", &extraction)?;
/// store.save("db/y2025.json")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Extractor {
    /// 抽出設定
    config: ExtractionConfig,

    /// 色分類器
    classifier: ColorClassifier,

    /// テキストセクションのパターン
    patterns: SectionPatterns,
}

impl Extractor {
    pub(crate) fn new(config: ExtractionConfig, patterns: SectionPatterns) -> Self {
        Self {
            classifier: ColorClassifier::new(config.palette.clone(), config.tolerance),
            config,
            patterns,
        }
    }

    pub fn page_layout(&self) -> &PageLayout {
        &self.config.page_layout
    }

    pub fn year(&self) -> Option<i32> {
        self.config.year
    }

    pub fn marker(&self) -> &str {
        &self.config.marker
    }

    pub fn classifier(&self) -> &ColorClassifier {
        &self.classifier
    }

    /// 設定済みの分類器で色を分類
    pub fn classify(&self, color: &RawColor) -> Result<Option<ColorCategory>, CalendarError> {
        self.classifier.classify(color)
    }

    /// 設定済みのマーカーでセルテキストを解析
    pub fn parse(&self, raw_text: &str) -> Result<ParsedCell, ParseFailure> {
        parse_cell_with_marker(raw_text, &self.config.marker)
    }

    /// 表モードの抽出（DOCX、罫線付きPDF）
    ///
    /// # 処理フロー
    ///
    /// 1. ページ番号を持つ表のうち、カレンダー範囲外のものを除外
    /// 2. 残った表のi番目をi月とする（12番目以降は警告して読み飛ばし）
    /// 3. 見出し行を除いたセルを行優先で解析・分類
    pub fn extract_tables<S: TableSource + ?Sized>(&self, source: &S) -> DocumentExtraction {
        let layout = &self.config.page_layout;
        let mut extraction = DocumentExtraction::default();

        let tables = source
            .tables()
            .iter()
            .filter(|table| table.page.map_or(true, |page| layout.contains(page)));

        for (index, table) in tables.enumerate() {
            let month = month_for_table(index);
            if month.is_none() {
                tracing::warn!(table = index, "table index beyond december, dropping its cells");
            }

            for row in table.rows.iter().skip(self.config.header_rows) {
                for cell in row {
                    self.process_cell(month, &cell.text, cell.fill.as_ref(), &mut extraction);
                }
            }
        }

        extraction
    }

    /// 単語座標モードの抽出（罫線なしPDF）
    ///
    /// カレンダーページごとに単語から日セルを組み立て、セル矩形に重なる
    /// 塗りつぶし矩形の色で分類します。
    pub fn extract_words<S: PageSource + ?Sized>(&self, source: &S) -> DocumentExtraction {
        let layout = &self.config.page_layout;
        let mut extraction = DocumentExtraction::default();

        for page in source.pages() {
            let month = match layout.section_for_page(page.number) {
                PageSection::Calendar(month) => Some(month),
                PageSection::OutOfCalendar { index } => {
                    tracing::warn!(page = page.number, index, "page beyond december, dropping its cells");
                    None
                }
                _ => continue,
            };

            let cells = find_day_cells(&page.words, &self.config.word_layout, &self.config.marker);
            tracing::debug!(page = page.number, cells = cells.len(), "found day cells on page");

            let boxes: Vec<BoundingBox> = cells.iter().map(|cell| cell.bbox).collect();
            let fills = assign_fills(&page.rects, &boxes);
            for (cell, fill) in cells.iter().zip(fills) {
                self.process_cell(month, &cell.text, fill, &mut extraction);
            }
        }

        extraction
    }

    /// テキストフローモードの抽出（年・日の意味・色の凡例・曜日ルール・月の説明）
    pub fn extract_sections<S: PageSource + ?Sized>(&self, source: &S) -> DocumentSections {
        self.patterns.extract(source, &self.config.page_layout)
    }

    /// 1セル分の解析・検証・分類
    fn process_cell(
        &self,
        month: Option<Month>,
        text: &str,
        fill: Option<&RawColor>,
        extraction: &mut DocumentExtraction,
    ) {
        let stats = &mut extraction.stats;

        let parsed = match self.parse(text) {
            Ok(parsed) => parsed,
            Err(ParseFailure::NoMarker) => {
                stats.skip(ParseFailure::NoMarker);
                return;
            }
            Err(failure) => {
                tracing::debug!(reason = failure.reason(), text, "skipping malformed day cell");
                stats.skip(failure);
                return;
            }
        };

        let Some(month) = month else {
            stats.skip(SkipReason::MonthOutOfRange);
            return;
        };

        if let Some(year) = self.config.year {
            if NaiveDate::from_ymd_opt(year, month.number(), parsed.day).is_none() {
                tracing::warn!(year, %month, day = parsed.day, "day does not exist in month, skipping");
                stats.skip(SkipReason::ImpossibleDate);
                return;
            }
        }

        let category = match fill.map(|color| self.classifier.classify(color)) {
            Some(Ok(category)) => category,
            Some(Err(e)) => {
                tracing::warn!(%month, day = parsed.day, error = %e, "cell color could not be classified");
                stats.invalid_colors += 1;
                None
            }
            None => None,
        };

        stats.cells_classified += 1;
        extraction.records.push((month, parsed.into_record(category)));
    }
}
