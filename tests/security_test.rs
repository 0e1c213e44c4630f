//! Security Tests for DOCX containers
//!
//! DOCXコンテナを開く際のセキュリティ対策を検証します。
//! ZIP bomb攻撃、パストラバーサル攻撃などへの対策を確認します。

use std::io::{Cursor, Write};

use calzero::{CalendarError, DocxDocument};
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

const DOCUMENT_XML: &[u8] = br#"<?xml version="1.0"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body/></w:document>"#;

fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip_data = Vec::new();
    {
        let mut zip = ZipWriter::new(Cursor::new(&mut zip_data));
        let options = FileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, body) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(body).unwrap();
        }
        zip.finish().unwrap();
    }
    zip_data
}

/// エントリ数の上限を超えるDOCXは開く前に拒否される
#[test]
fn test_docx_with_too_many_entries() {
    // 2,001個のファイル（上限: 2,000）
    let names: Vec<String> = (0..2_001).map(|i| format!("word/media/file{}.xml", i)).collect();
    let entries: Vec<(&str, &[u8])> = names.iter().map(|name| (name.as_str(), &b"test"[..])).collect();

    let result = DocxDocument::from_reader(Cursor::new(zip_with(&entries)));
    match result {
        Err(CalendarError::SecurityViolation(msg)) => assert!(msg.contains("too many files")),
        other => panic!("Expected SecurityViolation error, got {:?}", other),
    }
}

/// ZIP bomb攻撃のテスト: 展開後のサイズが大きすぎるエントリ
#[test]
#[ignore] // 大きなバッファを作成するため、通常のテストではスキップ
fn test_zip_bomb_large_entry() {
    let large_data = vec![0u8; 104_857_601]; // 100MB + 1バイト
    let data = zip_with(&[("word/document.xml", &large_data[..])]);

    match DocxDocument::from_reader(Cursor::new(data)) {
        Err(CalendarError::SecurityViolation(msg)) => assert!(msg.contains("exceeds maximum size")),
        other => panic!("Expected SecurityViolation error, got {:?}", other),
    }
}

/// 親ディレクトリを指すエントリ名
#[test]
fn test_docx_entry_with_parent_segment() {
    let data = zip_with(&[("word/document.xml", DOCUMENT_XML), ("../etc/passwd", &b"test"[..])]);

    match DocxDocument::from_reader(Cursor::new(data)) {
        Err(CalendarError::SecurityViolation(msg)) => assert!(msg.contains("Invalid ZIP path")),
        other => panic!("Expected SecurityViolation error, got {:?}", other),
    }
}

/// `/`で始まるエントリ名
#[test]
fn test_docx_entry_with_absolute_name() {
    let data = zip_with(&[("word/document.xml", DOCUMENT_XML), ("/etc/passwd", &b"test"[..])]);

    match DocxDocument::from_reader(Cursor::new(data)) {
        Err(CalendarError::SecurityViolation(msg)) => {
            assert!(msg.contains("Invalid ZIP path") && msg.contains("Absolute path"));
        }
        other => panic!("Expected SecurityViolation error, got {:?}", other),
    }
}

/// ドライブレター付きのエントリ名
#[test]
fn test_docx_entry_with_drive_letter() {
    let data = zip_with(&[
        ("word/document.xml", DOCUMENT_XML),
        ("C:\\Windows\\system32", &b"test"[..]),
    ]);

    match DocxDocument::from_reader(Cursor::new(data)) {
        Err(CalendarError::SecurityViolation(msg)) => assert!(msg.contains("Invalid ZIP path")),
        other => panic!("Expected SecurityViolation error, got {:?}", other),
    }
}

/// `word/document.xml`がないアーカイブは構造エラー（セキュリティエラーではない）
#[test]
fn test_missing_document_part() {
    let data = zip_with(&[("word/styles.xml", &b"<w:styles/>"[..])]);

    match DocxDocument::from_reader(Cursor::new(data)) {
        Err(CalendarError::Parse(msg)) => assert!(msg.contains("word/document.xml")),
        other => panic!("Expected Parse error, got {:?}", other),
    }
}

/// 表のない正常なDOCXはレコード0件で読める
#[test]
fn test_docx_without_tables() {
    let data = zip_with(&[
        ("[Content_Types].xml", &b"<Types/>"[..]),
        ("word/document.xml", DOCUMENT_XML),
    ]);

    let document = DocxDocument::from_reader(Cursor::new(data)).unwrap();
    let extractor = calzero::ExtractorBuilder::new().build().unwrap();
    assert!(extractor.extract_tables(&document).records.is_empty());
}
