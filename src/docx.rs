//! WordprocessingML package writer.
//!
//! Produces a minimal .docx (content types, relationships, document, styles
//! and core properties) from an assembled [`Document`]. List items are laid
//! out with a literal marker and a hanging indent instead of a numbering
//! part, so nested numbered items show no numeral of their own.

use crate::config::ExportConfig;
use crate::convert::{Block, Inline, Run, RunStyle};
use crate::error::Result;
use crate::export::{BodyElement, Document};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn xml_escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // XML 1.0 forbids most C0 controls and the two noncharacters
            c if (c as u32) < 0x20 && c != '\t' && c != '\n' && c != '\r' => {}
            '\u{FFFE}' | '\u{FFFF}' => {}
            _ => out.push(ch),
        }
    }
    out
}

fn run_xml(text: &str, style: RunStyle) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    out.push_str("<w:r>");
    if !style.is_plain() {
        out.push_str("<w:rPr>");
        if style.bold {
            out.push_str("<w:b/>");
        }
        if style.italic {
            out.push_str("<w:i/>");
        }
        if style.underline {
            out.push_str("<w:u w:val=\"single\"/>");
        }
        out.push_str("</w:rPr>");
    }
    out.push_str("<w:t xml:space=\"preserve\">");
    out.push_str(&xml_escape_text(text));
    out.push_str("</w:t></w:r>");
    out
}

fn inlines_xml(runs: &[Inline], out: &mut String) {
    for inline in runs {
        match inline {
            Inline::Run(Run { text, style }) => out.push_str(&run_xml(text, *style)),
            Inline::LineBreak => out.push_str("<w:r><w:br/></w:r>"),
        }
    }
}

fn block_xml(block: &Block, config: &ExportConfig) -> String {
    let mut out = String::new();
    out.push_str("<w:p>");
    match block {
        Block::Heading { level, text } => {
            let level = (*level).clamp(1, 6);
            out.push_str(&format!("<w:pPr><w:pStyle w:val=\"Heading{level}\"/></w:pPr>"));
            out.push_str(&run_xml(text, RunStyle::PLAIN));
        }
        Block::Paragraph { runs } => inlines_xml(runs, &mut out),
        Block::ListItem { runs, .. } => {
            out.push_str("<w:pPr><w:pStyle w:val=\"ListParagraph\"/>");
            if let Some(ind) = block.indent(config.indent_unit_twips) {
                out.push_str(&format!(
                    "<w:ind w:left=\"{}\" w:hanging=\"{}\"/>",
                    ind.left, ind.hanging
                ));
            }
            out.push_str("</w:pPr>");
            if let Some(marker) = block.list_marker(&config.bullet_marker) {
                out.push_str(&run_xml(&marker, RunStyle::PLAIN));
            }
            inlines_xml(runs, &mut out);
        }
    }
    out.push_str("</w:p>");
    out
}

fn page_break_xml() -> &'static str {
    "<w:p><w:r><w:br w:type=\"page\"/></w:r></w:p>"
}

/// The `word/document.xml` part.
pub fn document_xml(document: &Document, config: &ExportConfig) -> String {
    let mut body = String::new();
    for element in document.body() {
        match element {
            BodyElement::Block(b) => body.push_str(&block_xml(b, config)),
            BodyElement::PageBreak => body.push_str(page_break_xml()),
        }
    }

    let page = config.page;
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"
 xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    {body}
    <w:sectPr>
      <w:pgSz w:w="{width}" w:h="{height}"/>
      <w:pgMar w:top="{margin}" w:right="{margin}" w:bottom="{margin}" w:left="{margin}" w:header="708" w:footer="708" w:gutter="0"/>
      <w:cols w:space="708"/>
      <w:docGrid w:linePitch="360"/>
    </w:sectPr>
  </w:body>
</w:document>"#,
        body = body,
        width = page.width,
        height = page.height,
        margin = page.margin,
    )
}

fn content_types_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
  <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
</Types>"#
}

fn rels_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#
}

fn document_rels_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#
}

fn core_xml(title: Option<&str>) -> String {
    let title = title.map(xml_escape_text).unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties"
 xmlns:dc="http://purl.org/dc/elements/1.1/">
  <dc:title>{title}</dc:title>
</cp:coreProperties>"#
    )
}

// (level, font size in half-points, spacing before)
const HEADING_STYLES: [(u8, u32, u32); 6] = [
    (1, 32, 360),
    (2, 28, 240),
    (3, 26, 240),
    (4, 24, 200),
    (5, 22, 200),
    (6, 22, 160),
];

fn styles_xml() -> String {
    let mut out = String::new();
    out.push_str(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:qFormat/>
  </w:style>
"#,
    );
    for (level, size, before) in HEADING_STYLES {
        out.push_str(&format!(
            r#"  <w:style w:type="paragraph" w:styleId="Heading{level}">
    <w:name w:val="heading {level}"/>
    <w:basedOn w:val="Normal"/>
    <w:next w:val="Normal"/>
    <w:uiPriority w:val="9"/>
    <w:qFormat/>
    <w:pPr>
      <w:keepNext/>
      <w:spacing w:before="{before}" w:after="120"/>
      <w:outlineLvl w:val="{outline}"/>
    </w:pPr>
    <w:rPr>
      <w:b/>
      <w:sz w:val="{size}"/>
    </w:rPr>
  </w:style>
"#,
            outline = level - 1,
        ));
    }
    out.push_str(
        r#"  <w:style w:type="paragraph" w:styleId="ListParagraph">
    <w:name w:val="List Paragraph"/>
    <w:basedOn w:val="Normal"/>
    <w:uiPriority w:val="34"/>
    <w:qFormat/>
    <w:pPr>
      <w:contextualSpacing/>
    </w:pPr>
  </w:style>
</w:styles>"#,
    );
    out
}

/// Serialize a document into .docx bytes.
pub fn write_docx(document: &Document, config: &ExportConfig) -> Result<Vec<u8>> {
    config.validate()?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default();

    zip.start_file("[Content_Types].xml", opts)?;
    zip.write_all(content_types_xml().as_bytes())?;

    zip.start_file("_rels/.rels", opts)?;
    zip.write_all(rels_xml().as_bytes())?;

    zip.start_file("docProps/core.xml", opts)?;
    zip.write_all(core_xml(config.title.as_deref()).as_bytes())?;

    zip.start_file("word/document.xml", opts)?;
    zip.write_all(document_xml(document, config).as_bytes())?;

    zip.start_file("word/styles.xml", opts)?;
    zip.write_all(styles_xml().as_bytes())?;

    zip.start_file("word/_rels/document.xml.rels", opts)?;
    zip.write_all(document_rels_xml().as_bytes())?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::convert_markup;
    use crate::section::Section;

    fn doc_of(blocks: Vec<Block>) -> Document {
        Document {
            sections: vec![Section { blocks }],
        }
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            xml_escape_text(r#"<script>"a" & 'b'</script>"#),
            "&lt;script&gt;&quot;a&quot; &amp; &apos;b&apos;&lt;/script&gt;"
        );
        assert_eq!(xml_escape_text("a\u{0001}b"), "ab");
        assert_eq!(xml_escape_text("a\u{FFFE}b\u{FFFF}c\u{FFFD}"), "abc\u{FFFD}");
    }

    #[test]
    fn run_properties_follow_style_flags() {
        assert_eq!(
            run_xml("x", RunStyle::PLAIN),
            "<w:r><w:t xml:space=\"preserve\">x</w:t></w:r>"
        );
        let underlined = run_xml("x", RunStyle::UNDERLINE);
        assert!(underlined.contains("<w:u w:val=\"single\"/>"));
        assert!(!underlined.contains("<w:b/>"));
        assert_eq!(run_xml("", RunStyle::BOLD), "");
    }

    #[test]
    fn numbered_items_get_marker_and_hanging_indent() {
        let config = ExportConfig::default();
        let xml = document_xml(
            &doc_of(convert_markup("<ol><li>first<ol><li>inner</li></ol></li></ol>")),
            &config,
        );
        assert!(xml.contains("<w:ind w:left=\"720\" w:hanging=\"360\"/>"));
        assert!(xml.contains("<w:ind w:left=\"1440\" w:hanging=\"360\"/>"));
        assert!(xml.contains(">1. </w:t>"));
        assert_eq!(xml.matches(". </w:t>").count(), 1);
    }

    #[test]
    fn bullet_marker_is_configurable() {
        let config = ExportConfig {
            bullet_marker: "-".to_string(),
            ..ExportConfig::default()
        };
        let xml = document_xml(&doc_of(convert_markup("<ul><li>a</li></ul>")), &config);
        assert!(xml.contains(">- </w:t>"));
    }

    #[test]
    fn headings_use_heading_styles() {
        let xml = document_xml(
            &doc_of(vec![Block::Heading {
                level: 4,
                text: "T".to_string(),
            }]),
            &ExportConfig::default(),
        );
        assert!(xml.contains("<w:pStyle w:val=\"Heading4\"/>"));
        assert!(styles_xml().contains("w:styleId=\"Heading6\""));
    }

    #[test]
    fn page_breaks_between_sections_only() {
        let document = Document {
            sections: vec![
                Section {
                    blocks: vec![Block::paragraph("a")],
                },
                Section {
                    blocks: vec![Block::paragraph("b")],
                },
                Section {
                    blocks: vec![Block::paragraph("c")],
                },
            ],
        };
        let xml = document_xml(&document, &ExportConfig::default());
        assert_eq!(xml.matches("w:type=\"page\"").count(), 2);
    }

    #[test]
    fn line_breaks_become_br_runs() {
        let xml = document_xml(&doc_of(convert_markup("<p>a<br>b</p>")), &ExportConfig::default());
        assert!(xml.contains("<w:r><w:br/></w:r>"));
    }

    #[test]
    fn writes_a_zip_package() {
        let bytes = write_docx(&doc_of(vec![Block::paragraph("x")]), &ExportConfig::default())
            .unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn invalid_config_fails_serialization() {
        let config = ExportConfig {
            indent_unit_twips: 0,
            ..ExportConfig::default()
        };
        assert!(write_docx(&Document::default(), &config).is_err());
    }
}
