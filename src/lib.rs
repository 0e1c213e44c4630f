//! calzero - Pure-Rust personal calendar extractor
//!
//! This crate extracts yearly "personal calendars" from DOCX tables and PDF page
//! layout dumps. Every day cell is split into its day number and personal number,
//! its fill color is classified into a fixed category (red / orange / green), and
//! the records are merged into one JSON aggregate store keyed by
//! `year → member → calendar → month → day`.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use calzero::{CalendarStore, DocxDocument, ExtractorBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create an extractor with default settings
//!     let extractor = ExtractorBuilder::new().with_year(2025).build()?;
//!
//!     // Extract day cells from the monthly tables of one member's document
//!     let document = DocxDocument::open("Год 4 S (2025 КС).docx")?;
//!     let extraction = extractor.extract_tables(&document);
//!
//!     // Merge into the aggregate store and persist it
//!     let mut store = CalendarStore::load("db/y2025.json")?;
//!     store.merge_extraction("2025", "member_4", &extraction)?;
//!     store.save("db/y2025.json")?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # PDF Sources
//!
//! PDFs are read by an external tool and handed over as a JSON page dump
//! (words, filled rectangles, detected tables and page text):
//!
//! ```rust,no_run
//! use calzero::{ExtractorBuilder, LayoutDocument};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = ExtractorBuilder::new().with_page_layout(11, 22).build()?;
//! let layout = LayoutDocument::open("dumps/calendar_6.json")?;
//!
//! // Borderless calendar pages: cells are rebuilt from word coordinates
//! let extraction = extractor.extract_words(&layout);
//!
//! // Personal year, day meanings, color legend, weekday rules, month descriptions
//! let sections = extractor.extract_sections(&layout);
//! # let _ = (extraction, sections);
//! # Ok(())
//! # }
//! ```
//!
//! # Single Cells
//!
//! ```rust
//! use calzero::{parse_cell, ColorCategory, ColorClassifier, RawColor};
//!
//! let cell = parse_cell("9\n4 ЛИЧНЫЙ ДЕНЬ").unwrap();
//! assert_eq!((cell.day, cell.personal_day), (9, 4));
//!
//! let classifier = ColorClassifier::default();
//! let category = classifier.classify(&RawColor::token("f59a00")).unwrap();
//! assert_eq!(category, Some(ColorCategory::Orange));
//! ```

mod api;
mod builder;
mod cell;
mod color;
mod config;
mod error;
mod geometry;
mod months;
mod output;
mod parser;
mod run;
mod sections;
mod security;
mod store;
mod types;
mod words;

// 公開API
pub use api::SourceKind;
pub use builder::{Extractor, ExtractorBuilder};
pub use cell::{parse_cell, parse_cell_with_marker, ParseFailure, ParsedCell, PERSONAL_DAY_MARKER};
pub use color::{
    decode_hex_token, CategoryPalette, CategorySpec, ColorCategory, ColorClassifier,
    DEFAULT_TOLERANCE,
};
pub use config::{
    CategoryConfig, ExportConfig, PagesConfig, RunConfig, SourceConfig, DEFAULT_MEMBER_KEY,
};
pub use error::CalendarError;
pub use geometry::{assign_fills, resolve_fill, FillRect};
pub use months::{month_for_table, Month, PageLayout, PageSection};
pub use output::{DocumentExport, ExportNaming};
pub use parser::{
    ColorScale, DocxDocument, LayoutDocument, PageSource, SourceCell, SourcePage, SourceTable,
    TableSource, Word,
};
pub use run::{
    process_document, run_aggregate, run_export, DocumentFailure, DocumentOutput, DocumentSpec,
    RunReport,
};
pub use sections::{DocumentSections, PersonalYear, Weekday, TITLE_NOT_FOUND};
pub use store::{CalendarStore, MemberSection};
pub use types::{BoundingBox, CellRecord, DocumentExtraction, ExtractionStats, RawColor, SkipReason};
pub use words::{cluster_lines, find_day_cells, WordCell, WordLayout};
