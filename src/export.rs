//! Report assembly: resolve the selected findings, order them by severity,
//! build one section each and serialize the result.

use crate::config::ExportConfig;
use crate::convert::Block;
use crate::docx;
use crate::error::Result;
use crate::finding::{ExportRequest, FindingSource, FindingView};
use crate::section::{build_section, Section};
use tracing::{debug, info};

/// The assembled report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub sections: Vec<Section>,
}

/// Body content in output order, with a page break between sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyElement<'a> {
    Block(&'a Block),
    PageBreak,
}

impl Document {
    pub fn body(&self) -> Vec<BodyElement<'_>> {
        let mut out = Vec::new();
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                out.push(BodyElement::PageBreak);
            }
            out.extend(section.blocks.iter().map(BodyElement::Block));
        }
        out
    }

    pub fn page_breaks(&self) -> usize {
        self.sections.len().saturating_sub(1)
    }
}

/// Pick exactly one view per requested id.
///
/// An edited copy in the request wins over the canonical record. Either way
/// resources-affected and evidence come from the request maps (empty when
/// absent). Ids found in neither place are dropped.
pub fn resolve_views(request: &ExportRequest, source: &dyn FindingSource) -> Vec<FindingView> {
    let pending: Vec<_> = request
        .findings
        .iter()
        .copied()
        .filter(|id| !request.edited_findings.contains_key(id))
        .collect();
    let canonical = source.lookup_many(&pending);

    let mut views = Vec::with_capacity(request.findings.len());
    for id in &request.findings {
        let view = match request.edited_findings.get(id) {
            Some(edited) => {
                let mut v = edited.to_view();
                v.id = *id;
                Some(v)
            }
            // a duplicated id still yields a section per occurrence
            None => canonical.get(id).cloned(),
        };
        let Some(mut view) = view else {
            debug!(finding_id = id, "finding not found, skipping");
            continue;
        };
        view.resources_affected = request.resources.get(id).cloned().unwrap_or_default();
        view.evidence = request.evidence.get(id).cloned().unwrap_or_default();
        views.push(view);
    }
    views
}

/// Stable sort by severity rank; equal ranks keep request order.
pub fn sort_by_severity(views: &mut [FindingView]) {
    views.sort_by_key(|v| v.severity.rank());
}

/// Resolve, order and build sections for an export request.
pub fn build_document(request: &ExportRequest, source: &dyn FindingSource) -> Document {
    let mut views = resolve_views(request, source);
    sort_by_severity(&mut views);
    info!(
        requested = request.findings.len(),
        resolved = views.len(),
        "building findings document"
    );
    Document {
        sections: views.iter().map(build_section).collect(),
    }
}

/// Build the document and serialize it to .docx bytes.
pub fn export_docx(
    request: &ExportRequest,
    source: &dyn FindingSource,
    config: &ExportConfig,
) -> Result<Vec<u8>> {
    let document = build_document(request, source);
    docx::write_docx(&document, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::{FindingRecord, FindingStore, Severity};
    use pretty_assertions::assert_eq;

    fn store() -> FindingStore {
        FindingStore::from_records(vec![
            FindingRecord::new(1, "A", "Medium"),
            FindingRecord::new(2, "B", "Critical"),
            FindingRecord::new(3, "C", "Medium"),
            FindingRecord::new(4, "D", "Bogus"),
            FindingRecord::new(5, "X", "Low"),
            FindingRecord::new(6, "Z", "Weird"),
        ])
    }

    fn titles(views: &[FindingView]) -> Vec<&str> {
        views.iter().map(|v| v.title.as_str()).collect()
    }

    #[test]
    fn severity_sort_is_stable() {
        let request = ExportRequest::new(vec![1, 2, 3]);
        let mut views = resolve_views(&request, &store());
        sort_by_severity(&mut views);
        assert_eq!(titles(&views), vec!["B", "A", "C"]);
    }

    #[test]
    fn unknown_severities_sort_last_in_request_order() {
        let request = ExportRequest::new(vec![6, 4, 5, 2]);
        let doc = build_document(&request, &store());
        let heads: Vec<String> = doc.sections.iter().map(|s| s.blocks[0].plain_text()).collect();
        assert_eq!(heads, vec!["B", "X", "Z", "D"]);
    }

    #[test]
    fn edited_copy_overrides_canonical_record() {
        let request = ExportRequest::new(vec![5])
            .with_edit(5, FindingRecord::new(5, "Y", "High"))
            .with_resources(5, "db01");
        let views = resolve_views(&request, &store());
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].title, "Y");
        assert_eq!(views[0].severity, Severity::High);
        assert_eq!(views[0].resources_affected, "db01");
    }

    #[test]
    fn edits_apply_even_without_canonical_record() {
        let request =
            ExportRequest::new(vec![42]).with_edit(42, FindingRecord::new(0, "Fresh", "Low"));
        let views = resolve_views(&request, &store());
        assert_eq!(titles(&views), vec!["Fresh"]);
        assert_eq!(views[0].id, 42);
    }

    #[test]
    fn canonical_views_take_request_overlays() {
        let request = ExportRequest::new(vec![1])
            .with_resources(1, "10.0.0.5")
            .with_evidence(1, "<p>proof</p>");
        let views = resolve_views(&request, &store());
        assert_eq!(views[0].resources_affected, "10.0.0.5");
        assert_eq!(views[0].evidence, "<p>proof</p>");
    }

    #[test]
    fn unresolvable_ids_are_dropped() {
        let request = ExportRequest::new(vec![99, 1, 100]);
        let doc = build_document(&request, &store());
        assert_eq!(doc.sections.len(), 1);
    }

    #[test]
    fn page_breaks_sit_between_sections() {
        let request = ExportRequest::new(vec![1, 2, 3]);
        let doc = build_document(&request, &store());
        let body = doc.body();
        let breaks = body
            .iter()
            .filter(|e| matches!(e, BodyElement::PageBreak))
            .count();
        assert_eq!(breaks, 2);
        assert_eq!(doc.page_breaks(), 2);
        assert!(!matches!(body.last(), Some(BodyElement::PageBreak)));
        assert!(matches!(body.first(), Some(BodyElement::Block(_))));
    }

    #[test]
    fn single_finding_has_no_page_break() {
        let doc = build_document(&ExportRequest::new(vec![1]), &store());
        assert_eq!(doc.page_breaks(), 0);
        assert!(doc.body().iter().all(|e| matches!(e, BodyElement::Block(_))));
    }

    #[test]
    fn empty_selection_builds_empty_document() {
        let doc = build_document(&ExportRequest::default(), &store());
        assert_eq!(doc, Document::default());
        assert!(doc.body().is_empty());
    }

    #[test]
    fn each_section_numbers_its_own_lists() {
        let request = ExportRequest::new(vec![1, 3])
            .with_evidence(1, "<ol><li>a</li><li>b</li></ol>")
            .with_evidence(3, "<ol><li>c</li></ol>");
        let doc = build_document(&request, &store());
        let first = doc.sections[0].blocks.last().unwrap();
        assert!(matches!(first, Block::ListItem { ordinal: Some(2), .. }));
        let last = doc.sections[1].blocks.last().unwrap();
        assert!(matches!(last, Block::ListItem { ordinal: Some(1), .. }));
    }
}
