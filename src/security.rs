//! Security Module
//!
//! DOCXはZIPコンテナなので、`word/document.xml`を読む前にアーカイブ全体を検査します。
//! エントリ数・展開後サイズの上限と、エントリ名の正規化チェックを行います。

use std::io::{Read, Seek};

use zip::ZipArchive;

use crate::error::CalendarError;

/// DOCXコンテナの上限値
///
/// カレンダー文書は数MB程度なので、上限はどれも十分に余裕を持たせています。
#[derive(Debug, Clone)]
pub(crate) struct ArchiveLimits {
    /// ディスク上の`.docx`ファイルのサイズ上限（256MB）
    pub max_input_bytes: u64,
    /// エントリ数の上限
    pub max_entries: usize,
    /// 1エントリあたりの展開後サイズ上限（100MB）
    pub max_entry_bytes: u64,
    /// 全エントリの展開後サイズ合計の上限（512MB）
    pub max_total_bytes: u64,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        const MIB: u64 = 1024 * 1024;
        Self {
            max_input_bytes: 256 * MIB,
            max_entries: 2_000,
            max_entry_bytes: 100 * MIB,
            max_total_bytes: 512 * MIB,
        }
    }
}

fn violation(message: String) -> CalendarError {
    CalendarError::SecurityViolation(message)
}

impl ArchiveLimits {
    pub fn check_input_size(&self, size: u64) -> Result<(), CalendarError> {
        if size <= self.max_input_bytes {
            return Ok(());
        }
        Err(violation(format!(
            "Input file exceeds maximum size: {} > {} bytes",
            size, self.max_input_bytes
        )))
    }

    /// エントリを一つずつ検査します（中身は展開しません）。
    ///
    /// サイズは中央ディレクトリの申告値を使います。
    pub fn check_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
    ) -> Result<(), CalendarError> {
        let entries = archive.len();
        if entries > self.max_entries {
            return Err(violation(format!(
                "DOCX container has too many files: {} > {}",
                entries, self.max_entries
            )));
        }

        let mut total = 0u64;
        for index in 0..entries {
            let entry = archive
                .by_index(index)
                .map_err(|e| CalendarError::Zip(e.to_string()))?;

            check_entry_name(entry.name())
                .map_err(|reason| violation(format!("Invalid ZIP path: {}", reason)))?;

            let size = entry.size();
            if size > self.max_entry_bytes {
                return Err(violation(format!(
                    "Entry '{}' exceeds maximum size: {} > {} bytes",
                    entry.name(),
                    size,
                    self.max_entry_bytes
                )));
            }

            total = total.saturating_add(size);
            if total > self.max_total_bytes {
                return Err(violation(format!(
                    "Decompressed container exceeds maximum size: {} > {} bytes",
                    total, self.max_total_bytes
                )));
            }
        }

        Ok(())
    }
}

/// エントリ名が`word/document.xml`のような相対パスであることを確認します。
pub(crate) fn check_entry_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("entry name is empty".to_string());
    }

    let bytes = name.as_bytes();
    let drive_letter = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    if name.starts_with('/') || drive_letter {
        return Err(format!("Absolute path '{}'", name));
    }
    if name.contains('\\') {
        return Err(format!("backslash separator in '{}'", name));
    }
    if name.split('/').any(|part| part == "..") {
        return Err(format!("parent directory segment in '{}'", name));
    }

    Ok(())
}
