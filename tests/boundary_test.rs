//! Boundary Tests for calzero
//!
//! セルテキスト・日付・色の許容誤差・ページ範囲の境界値を公開APIから検証します。

use calzero::{
    assign_fills, parse_cell, resolve_fill, BoundingBox, CalendarError, CategoryPalette, CategorySpec,
    ColorCategory, ColorClassifier, ExtractorBuilder, FillRect, LayoutDocument, Month,
    PageLayout, PageSection, ParseFailure, RawColor, SkipReason,
};

fn layout_with_table(page: u32, cells: &[&str]) -> String {
    let row: Vec<String> = cells
        .iter()
        .map(|text| format!("{{\"text\": {}}}", serde_json::to_string(text).unwrap()))
        .collect();
    format!(
        r#"{{"pages": [{{"number": {}, "tables": [{{"rows": [[{{"text": "ПН"}}], [{}]]}}]}}]}}"#,
        page,
        row.join(", ")
    )
}

#[test]
fn test_day_number_bounds() {
    assert_eq!(parse_cell("1\n4 ЛИЧНЫЙ ДЕНЬ").unwrap().day, 1);
    assert_eq!(parse_cell("31\n4 ЛИЧНЫЙ ДЕНЬ").unwrap().day, 31);
    assert_eq!(parse_cell("0\n4 ЛИЧНЫЙ ДЕНЬ"), Err(ParseFailure::DayOutOfRange));
    assert_eq!(parse_cell("32\n4 ЛИЧНЫЙ ДЕНЬ"), Err(ParseFailure::DayOutOfRange));
    assert_eq!(parse_cell("100\n4 ЛИЧНЫЙ ДЕНЬ"), Err(ParseFailure::NonNumeric));
}

#[test]
fn test_personal_number_has_no_range() {
    assert_eq!(parse_cell("9\n-3 ЛИЧНЫЙ ДЕНЬ").unwrap().personal_day, -3);
    assert_eq!(parse_cell("9\n22 ЛИЧНЫЙ ДЕНЬ").unwrap().personal_day, 22);
}

#[test]
fn test_cell_text_variants() {
    // 3行目以降は無視
    let cell = parse_cell("9\n4\n7 ЛИЧНЫЙ ДЕНЬ").unwrap();
    assert_eq!((cell.day, cell.personal_day), (9, 4));

    // タブ区切り・小文字のマーカー
    let cell = parse_cell("12\n3\tличный день").unwrap();
    assert_eq!((cell.day, cell.personal_day), (12, 3));

    assert_eq!(parse_cell("9 4 ЛИЧНЫЙ ДЕНЬ"), Err(ParseFailure::NotTwoLines));
    assert_eq!(parse_cell(""), Err(ParseFailure::NoMarker));
}

#[test]
fn test_impossible_dates_need_a_year() {
    let json = layout_with_table(11, &["29\n1 ЛИЧНЫЙ ДЕНЬ"]);
    let mut tables = serde_json::from_str::<serde_json::Value>(&json).unwrap();
    // 2月として扱うため、1月の空の表を前に置く
    tables["pages"][0]["tables"]
        .as_array_mut()
        .unwrap()
        .insert(0, serde_json::json!({"rows": []}));
    let document = LayoutDocument::from_json_str(&tables.to_string()).unwrap();

    let leap = ExtractorBuilder::new().with_year(2024).build().unwrap();
    assert!(leap.extract_tables(&document).find(Month::February, 29).is_some());

    let common = ExtractorBuilder::new().with_year(2025).build().unwrap();
    let extraction = common.extract_tables(&document);
    assert!(extraction.records.is_empty());
    assert_eq!(
        extraction.stats.cells_skipped.get(&SkipReason::ImpossibleDate),
        Some(&1)
    );

    let unchecked = ExtractorBuilder::new().build().unwrap();
    assert_eq!(unchecked.extract_tables(&document).records.len(), 1);
}

#[test]
fn test_tables_outside_page_range_are_ignored() {
    let document = LayoutDocument::from_json_str(&layout_with_table(23, &["9\n4 ЛИЧНЫЙ ДЕНЬ"])).unwrap();
    let extractor = ExtractorBuilder::new().build().unwrap();
    assert!(extractor.extract_tables(&document).records.is_empty());

    let document = LayoutDocument::from_json_str(&layout_with_table(22, &["9\n4 ЛИЧНЫЙ ДЕНЬ"])).unwrap();
    assert_eq!(extractor.extract_tables(&document).records.len(), 1);
}

#[test]
fn test_tolerance_edges() {
    let classifier = ColorClassifier::new(CategoryPalette::default(), 25);
    // green target 50A5A0 = (80, 165, 160)
    assert_eq!(
        classifier.classify(&RawColor::Components(vec![105.0, 165.0, 160.0])).unwrap(),
        Some(ColorCategory::Green)
    );
    assert_eq!(
        classifier.classify(&RawColor::Components(vec![106.0, 165.0, 160.0])).unwrap(),
        None
    );

    let strict = ColorClassifier::new(CategoryPalette::default(), 0);
    assert_eq!(strict.classify_rgb([0xF5, 0x9A, 0x00]), Some(ColorCategory::Orange));
    assert_eq!(strict.classify_rgb([0xF5, 0x9A, 0x01]), None);
}

#[test]
fn test_overlapping_tolerances_prefer_priority() {
    let palette = CategoryPalette::new(vec![
        CategorySpec::from_token(ColorCategory::Green, "F08000").unwrap(),
        CategorySpec::from_token(ColorCategory::Orange, "F09000").unwrap(),
        CategorySpec::from_token(ColorCategory::Red, "F0A000").unwrap(),
    ])
    .unwrap();
    let classifier = ColorClassifier::new(palette, 20);

    // 3カテゴリすべての許容範囲内 → red
    assert_eq!(classifier.classify_rgb([0xF0, 0x90, 0x00]), Some(ColorCategory::Red));
    // orangeとgreenのみ → orange
    assert_eq!(classifier.classify_rgb([0xF0, 0x80, 0x00]), Some(ColorCategory::Orange));
}

#[test]
fn test_malformed_components_are_invalid() {
    let classifier = ColorClassifier::default();
    for bad in [
        vec![245.0, 154.0],
        vec![245.0, 154.0, 0.0, 1.0],
        vec![256.0, 0.0, 0.0],
        vec![-1.0, 0.0, 0.0],
        vec![f64::NAN, 0.0, 0.0],
    ] {
        assert!(matches!(
            classifier.classify(&RawColor::Components(bad)),
            Err(CalendarError::InvalidColor(_))
        ));
    }
    assert_eq!(classifier.classify(&RawColor::token("not a color")).unwrap(), None);
}

#[test]
fn test_geometry_tie_keeps_document_order() {
    let target = BoundingBox::new(10.0, 10.0, 20.0, 20.0);
    let rects = vec![
        FillRect::new(BoundingBox::new(0.0, 10.0, 15.0, 20.0), Some(RawColor::token("FA0701"))),
        FillRect::new(BoundingBox::new(15.0, 10.0, 30.0, 20.0), Some(RawColor::token("50A5A0"))),
    ];
    assert_eq!(resolve_fill(&rects, &target), Some(&RawColor::token("FA0701")));

    // 辺が接するだけの矩形は重なりとみなさない
    let touching = vec![FillRect::new(
        BoundingBox::new(20.0, 10.0, 30.0, 20.0),
        Some(RawColor::token("F59A00")),
    )];
    assert_eq!(resolve_fill(&touching, &target), None);
}

#[test]
fn test_page_layout_edges() {
    let layout = PageLayout::new(5, 20).unwrap();
    assert_eq!(layout.section_for_page(5), PageSection::Calendar(Month::January));
    assert_eq!(layout.section_for_page(16), PageSection::Calendar(Month::December));
    assert_eq!(layout.section_for_page(17), PageSection::OutOfCalendar { index: 12 });
    assert_eq!(layout.section_for_page(4), PageSection::PersonalYear);
    assert_eq!(layout.section_for_page(2), PageSection::ColorLegend);
    assert_eq!(layout.section_for_page(1), PageSection::DayDescriptions);
    assert_eq!(layout.section_for_page(21), PageSection::Unmapped);

    // 開始ページが近すぎる場合、前付けのページは存在しない
    let early = PageLayout::new(2, 13).unwrap();
    assert_eq!(early.section_for_page(1), PageSection::PersonalYear);
    assert!(early.pages_for(PageSection::DayDescriptions).is_empty());

    assert!(matches!(PageLayout::new(0, 12), Err(CalendarError::Config(_))));
    assert!(matches!(PageLayout::new(13, 12), Err(CalendarError::Config(_))));
}

#[test]
fn test_fill_straddling_two_day_cells_colors_only_the_larger_overlap() {
    let json = r#"{
        "pages": [{
            "number": 11,
            "words": [
                {"text": "9", "bbox": {"x0": 10, "top": 20, "x1": 16, "bottom": 28}},
                {"text": "10", "bbox": {"x0": 100, "top": 20, "x1": 112, "bottom": 28}},
                {"text": "4", "bbox": {"x0": 10, "top": 32, "x1": 16, "bottom": 40}},
                {"text": "ЛИЧНЫЙ", "bbox": {"x0": 18, "top": 32, "x1": 54, "bottom": 40}},
                {"text": "ДЕНЬ", "bbox": {"x0": 58, "top": 32, "x1": 82, "bottom": 40}},
                {"text": "5", "bbox": {"x0": 100, "top": 32, "x1": 106, "bottom": 40}},
                {"text": "ЛИЧНЫЙ", "bbox": {"x0": 108, "top": 32, "x1": 144, "bottom": 40}},
                {"text": "ДЕНЬ", "bbox": {"x0": 148, "top": 32, "x1": 172, "bottom": 40}}
            ],
            "rects": [
                {"bbox": {"x0": 5, "top": 15, "x1": 104, "bottom": 45}, "fill": [245, 154, 0]}
            ]
        }]
    }"#;
    let document = LayoutDocument::from_json_str(json).unwrap();
    let extraction = ExtractorBuilder::new().build().unwrap().extract_words(&document);

    assert_eq!(extraction.records.len(), 2);
    assert_eq!(
        extraction.find(Month::January, 9).unwrap().day_by_color,
        Some(ColorCategory::Orange)
    );
    assert_eq!(extraction.find(Month::January, 10).unwrap().day_by_color, None);

    // 同じ判定を矩形の集合に直接適用
    let fill = [FillRect::new(
        BoundingBox::new(5.0, 15.0, 104.0, 45.0),
        Some(RawColor::token("F59A00")),
    )];
    let cells = [
        BoundingBox::new(10.0, 20.0, 82.0, 40.0),
        BoundingBox::new(100.0, 20.0, 172.0, 40.0),
    ];
    assert_eq!(
        assign_fills(&fill, &cells),
        vec![Some(&RawColor::token("F59A00")), None]
    );
}
