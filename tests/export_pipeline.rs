use findings_docx::{
    build_document, export_docx, Block, BodyElement, ExportConfig, ExportRequest, FindingRecord,
    FindingStore,
};
use std::io::{Cursor, Read, Write};

fn store() -> FindingStore {
    let mut five = FindingRecord::new(5, "Default credentials on admin panel", "Low");
    five.description = "admin/admin accepted".to_string();
    let six = FindingRecord::new(6, "SQL injection in search", "Critical");
    FindingStore::from_records(vec![five, six])
}

fn read_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap();
    let mut out = String::new();
    file.read_to_string(&mut out).unwrap();
    out
}

#[test]
fn two_findings_make_two_sections_in_severity_order() {
    let request = ExportRequest::new(vec![5, 6]);
    let doc = build_document(&request, &store());

    assert_eq!(doc.sections.len(), 2);
    assert_eq!(doc.page_breaks(), 1);
    assert_eq!(
        doc.sections[0].blocks[0],
        Block::Heading {
            level: 1,
            text: "SQL injection in search".to_string()
        }
    );
    assert_eq!(
        doc.sections[1].blocks[0],
        Block::Heading {
            level: 1,
            text: "Default credentials on admin panel".to_string()
        }
    );
    let breaks = doc
        .body()
        .into_iter()
        .filter(|e| *e == BodyElement::PageBreak)
        .count();
    assert_eq!(breaks, 1);
}

#[test]
fn edited_title_reaches_the_package() {
    let request = ExportRequest::from_json(
        r#"{
            "findings": [5],
            "resources": {"5": "https://admin.internal"},
            "evidence": {"5": "<ol><li>Browse to <strong>/admin</strong></li><li>Log in</li></ol>"},
            "edited_findings": {"5": {"id": 5, "title": "Y", "risk_rating": "High",
                "description": "d", "impact": "i", "resolution": "r"}}
        }"#,
    )
    .unwrap();

    let bytes = export_docx(&request, &store(), &ExportConfig::default()).unwrap();
    let xml = read_part(&bytes, "word/document.xml");

    assert!(xml.contains(">Y</w:t>"));
    assert!(!xml.contains("Default credentials"));
    assert!(xml.contains("Resources Affected: https://admin.internal"));
    assert!(xml.contains("Severity: High"));
    assert!(xml.contains(">1. </w:t>"));
    assert!(xml.contains(">2. </w:t>"));
    assert!(xml.contains("<w:b/></w:rPr><w:t xml:space=\"preserve\">/admin</w:t>"));
    assert!(!xml.contains("w:type=\"page\""));
}

#[test]
fn package_contains_expected_parts() {
    let config = ExportConfig {
        title: Some("Acme & Co pentest".to_string()),
        ..ExportConfig::default()
    };
    let bytes = export_docx(&ExportRequest::new(vec![5, 6]), &store(), &config).unwrap();

    let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "word/_rels/document.xml.rels",
            "word/document.xml",
            "word/styles.xml",
        ]
    );
    assert!(read_part(&bytes, "docProps/core.xml").contains("Acme &amp; Co pentest"));
    assert_eq!(
        read_part(&bytes, "word/document.xml")
            .matches("w:type=\"page\"")
            .count(),
        1
    );
}

#[test]
fn export_is_deterministic() {
    let request = ExportRequest::new(vec![6, 5]).with_evidence(6, "<p>' OR 1=1 --</p>");
    let a = export_docx(&request, &store(), &ExportConfig::default()).unwrap();
    let b = export_docx(&request, &store(), &ExportConfig::default()).unwrap();
    assert_eq!(
        read_part(&a, "word/document.xml"),
        read_part(&b, "word/document.xml")
    );
}

#[test]
fn config_file_drives_indentation() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "indent_unit_twips = 400").unwrap();
    let config = ExportConfig::load(file.path()).unwrap();

    let request = ExportRequest::new(vec![5]).with_evidence(5, "<ul><li>a</li></ul>");
    let bytes = export_docx(&request, &store(), &config).unwrap();
    let xml = read_part(&bytes, "word/document.xml");
    assert!(xml.contains("<w:ind w:left=\"400\" w:hanging=\"200\"/>"));
}

#[test]
fn imported_findings_can_be_exported() {
    let mut store = store();
    let imported = store
        .import_json(
            r#"[{"Title": "Clickjacking", "Description": "no frame-ancestors", "Severity": "High"},
                {"Title": "missing description"}]"#,
        )
        .unwrap();
    assert_eq!(imported, 1);

    let doc = build_document(&ExportRequest::new(vec![5, 7]), &store);
    assert_eq!(doc.sections.len(), 2);
    assert_eq!(
        doc.sections[0].blocks[0],
        Block::Heading {
            level: 1,
            text: "Clickjacking".to_string()
        }
    );
}
