//! Security findings report export.
//!
//! Converts the rich-text evidence written in the findings tracker into
//! Word blocks and assembles one section per selected finding, ordered by
//! severity, into a single .docx report.

pub mod config;
pub mod convert;
pub mod docx;
pub mod error;
pub mod export;
pub mod finding;
pub mod markup;
pub mod records;
pub mod section;

pub use config::{ExportConfig, PageSetup};
pub use convert::{convert, convert_markup, Block, Inline, ListContext, ListKind, Run, RunStyle};
pub use error::{ExportError, Result};
pub use export::{build_document, export_docx, BodyElement, Document};
pub use finding::{
    EditedFinding, ExportRequest, FindingId, FindingRecord, FindingSource, FindingStore,
    FindingView, Severity,
};
pub use markup::{parse, MarkupNode, NodeKind};
pub use section::{build_section, Section};
