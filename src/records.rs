//! Flat JSON and CSV exports of the resolved findings.
//!
//! Same selection and ordering as the .docx report, one record per finding,
//! evidence left as raw editor markup.

use crate::error::{ExportError, Result};
use crate::export::{resolve_views, sort_by_severity};
use crate::finding::{ExportRequest, FindingId, FindingSource, FindingView};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct FlatFinding<'a> {
    id: FindingId,
    title: &'a str,
    risk_rating: &'a str,
    description: &'a str,
    impact: &'a str,
    resolution: &'a str,
    category: &'a str,
    resources_affected: &'a str,
    evidence: &'a str,
}

impl<'a> From<&'a FindingView> for FlatFinding<'a> {
    fn from(v: &'a FindingView) -> Self {
        Self {
            id: v.id,
            title: &v.title,
            risk_rating: v.severity.as_str(),
            description: &v.description,
            impact: &v.impact,
            resolution: &v.resolution,
            category: &v.category,
            resources_affected: &v.resources_affected,
            evidence: &v.evidence,
        }
    }
}

const CSV_HEADER: [&str; 9] = [
    "ID",
    "Title",
    "Risk Rating",
    "Description",
    "Impact",
    "Resolution",
    "Category",
    "Resources Affected",
    "Evidence",
];

fn ordered_views(request: &ExportRequest, source: &dyn FindingSource) -> Vec<FindingView> {
    let mut views = resolve_views(request, source);
    sort_by_severity(&mut views);
    views
}

/// Pretty-printed JSON array of the selected findings.
pub fn to_json(request: &ExportRequest, source: &dyn FindingSource) -> Result<String> {
    let views = ordered_views(request, source);
    let flat: Vec<FlatFinding<'_>> = views.iter().map(FlatFinding::from).collect();
    Ok(serde_json::to_string_pretty(&flat)?)
}

/// CSV table of the selected findings with a header row.
pub fn to_csv(request: &ExportRequest, source: &dyn FindingSource) -> Result<String> {
    let views = ordered_views(request, source);
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for v in &views {
        let id = v.id.to_string();
        writer.write_record([
            id.as_str(),
            v.title.as_str(),
            v.severity.as_str(),
            v.description.as_str(),
            v.impact.as_str(),
            v.resolution.as_str(),
            v.category.as_str(),
            v.resources_affected.as_str(),
            v.evidence.as_str(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Serialization(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Serialization(e.to_string()))
}
