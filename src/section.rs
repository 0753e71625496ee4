//! One document section per finding.

use crate::convert::{convert_markup, Block};
use crate::finding::FindingView;

/// Blocks of a single finding, in render order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub blocks: Vec<Block>,
}

/// Title heading, the fixed metadata paragraphs, then the converted evidence.
pub fn build_section(view: &FindingView) -> Section {
    let mut blocks = vec![
        Block::Heading {
            level: 1,
            text: view.title.clone(),
        },
        Block::paragraph(format!("Resources Affected: {}", view.resources_affected)),
        Block::paragraph(format!("Severity: {}", view.severity)),
        Block::paragraph(format!("Description: {}", view.description)),
        Block::paragraph(format!("Impact: {}", view.impact)),
        Block::paragraph(format!("Recommendations: {}", view.resolution)),
        Block::paragraph("References: "),
        Block::paragraph("Evidence and Reproduction Steps:"),
    ];
    blocks.extend(convert_markup(&view.evidence));
    Section { blocks }
}
