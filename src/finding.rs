//! Finding records, export requests and the canonical lookup seam.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, info};

pub type FindingId = u64;

/// Risk rating of a finding.
///
/// Ratings outside the fixed set are kept verbatim in `Other` and sort
/// after every known rating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Informational,
    Other(String),
}

impl Severity {
    /// Sort rank used when ordering sections; lower comes first.
    pub fn rank(&self) -> u32 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
            Severity::Informational => 4,
            Severity::Other(_) => 999,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
            Severity::Informational => "Informational",
            Severity::Other(s) => s,
        }
    }
}

impl From<&str> for Severity {
    fn from(s: &str) -> Self {
        match s {
            "Critical" => Severity::Critical,
            "High" => Severity::High,
            "Medium" => Severity::Medium,
            "Low" => Severity::Low,
            "Informational" => Severity::Informational,
            other => Severity::Other(other.to_string()),
        }
    }
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        Severity::from(s.as_str())
    }
}

impl From<Severity> for String {
    fn from(s: Severity) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_risk_rating() -> Severity {
    Severity::Medium
}

/// A finding as stored by the tracking application, or as edited in the
/// browser before export. Both arrive in the same JSON shape.
///
/// Import files written by other tools use capitalized keys (`Title`,
/// `Severity`, ...); those are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingRecord {
    #[serde(default)]
    pub id: FindingId,
    #[serde(default, alias = "Title")]
    pub title: String,
    #[serde(default = "default_risk_rating", alias = "Severity")]
    pub risk_rating: Severity,
    #[serde(default, alias = "Description")]
    pub description: String,
    #[serde(default, alias = "Impact")]
    pub impact: String,
    #[serde(default, alias = "Resolution")]
    pub resolution: String,
    #[serde(default, alias = "Category")]
    pub category: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// In-flight user edit of a finding; same shape as the persisted record.
pub type EditedFinding = FindingRecord;

impl FindingRecord {
    pub fn new(id: FindingId, title: &str, risk_rating: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            risk_rating: Severity::from(risk_rating),
            description: String::new(),
            impact: String::new(),
            resolution: String::new(),
            category: None,
            created_at: None,
        }
    }

    /// Normalize into a view. Per-export fields start empty.
    pub fn to_view(&self) -> FindingView {
        FindingView {
            id: self.id,
            title: self.title.clone(),
            severity: self.risk_rating.clone(),
            description: self.description.clone(),
            impact: self.impact.clone(),
            resolution: self.resolution.clone(),
            category: self.category.clone().unwrap_or_default(),
            resources_affected: String::new(),
            evidence: String::new(),
        }
    }
}

/// Normalized finding as consumed by the section builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindingView {
    pub id: FindingId,
    pub title: String,
    pub severity: Severity,
    pub description: String,
    pub impact: String,
    pub resolution: String,
    pub category: String,
    pub resources_affected: String,
    /// Raw editor markup.
    pub evidence: String,
}

/// What the browser posts when the user exports their selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportRequest {
    /// Selected finding ids, in selection order.
    pub findings: Vec<FindingId>,
    /// Per-id "resources affected" text.
    pub resources: BTreeMap<FindingId, String>,
    /// Per-id evidence markup.
    pub evidence: BTreeMap<FindingId, String>,
    /// Per-id edited copies that take precedence over stored records.
    pub edited_findings: BTreeMap<FindingId, EditedFinding>,
}

impl ExportRequest {
    pub fn new(findings: Vec<FindingId>) -> Self {
        Self {
            findings,
            ..Self::default()
        }
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn with_resources(mut self, id: FindingId, text: &str) -> Self {
        self.resources.insert(id, text.to_string());
        self
    }

    pub fn with_evidence(mut self, id: FindingId, markup: &str) -> Self {
        self.evidence.insert(id, markup.to_string());
        self
    }

    pub fn with_edit(mut self, id: FindingId, edited: EditedFinding) -> Self {
        self.edited_findings.insert(id, edited);
        self
    }
}

/// Canonical finding lookup backed by persisted records.
pub trait FindingSource {
    fn lookup(&self, id: FindingId) -> Option<FindingView>;

    /// Fetch all requested ids at once. Missing ids are simply absent.
    fn lookup_many(&self, ids: &[FindingId]) -> HashMap<FindingId, FindingView> {
        ids.iter()
            .filter_map(|id| self.lookup(*id).map(|v| (*id, v)))
            .collect()
    }
}

impl<F> FindingSource for F
where
    F: Fn(FindingId) -> Option<FindingView>,
{
    fn lookup(&self, id: FindingId) -> Option<FindingView> {
        self(id)
    }
}

/// In-memory record store, e.g. loaded from a JSON dump of the findings table.
#[derive(Debug, Clone, Default)]
pub struct FindingStore {
    records: BTreeMap<FindingId, FindingRecord>,
}

impl FindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = FindingRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.id, r)).collect(),
        }
    }

    /// Parse a JSON array of records.
    pub fn from_json(s: &str) -> Result<Self> {
        let records: Vec<FindingRecord> = serde_json::from_str(s)?;
        Ok(Self::from_records(records))
    }

    /// Add the rows of a findings import file (a JSON array) as new records.
    ///
    /// Every accepted row gets a fresh id after the current highest one; ids
    /// in the file are ignored. Rows without a title or a description, or
    /// that do not parse as a finding, are skipped. Returns how many rows
    /// were imported.
    pub fn import_json(&mut self, s: &str) -> Result<usize> {
        let rows: Vec<serde_json::Value> = serde_json::from_str(s)?;
        let mut next_id = self.records.keys().next_back().map_or(1, |id| id + 1);
        let mut imported = 0;

        for (index, row) in rows.into_iter().enumerate() {
            let mut record: FindingRecord = match serde_json::from_value(row) {
                Ok(r) => r,
                Err(e) => {
                    debug!(row = index, error = %e, "skipping unreadable import row");
                    continue;
                }
            };
            if record.title.is_empty() || record.description.is_empty() {
                debug!(row = index, "skipping import row without title or description");
                continue;
            }
            if record.risk_rating.as_str().is_empty() {
                record.risk_rating = default_risk_rating();
            }
            record.id = next_id;
            next_id += 1;
            self.insert(record);
            imported += 1;
        }

        info!(imported, "findings imported");
        Ok(imported)
    }

    pub fn insert(&mut self, record: FindingRecord) {
        self.records.insert(record.id, record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FindingSource for FindingStore {
    fn lookup(&self, id: FindingId) -> Option<FindingView> {
        self.records.get(&id).map(FindingRecord::to_view)
    }
}
