//! Fixture builders for document bytes and sample lesson text.

#![allow(dead_code)]

use std::io::Write;

use lopdf::{dictionary, Document, Object, Stream};

/// Lesson lines that together pass the default content policy.
pub const LESSON_LINES: &[&str] = &[
    "Unit 4: The Water Cycle",
    "Water evaporates from oceans, lakes and rivers when the sun heats it.",
    "The vapour rises, cools and condenses into tiny droplets that form clouds.",
    "When droplets join and grow heavy they fall back as rain, snow or hail.",
    "Precipitation collects in rivers and aquifers and flows back to the sea.",
    "Students will label each stage on a diagram and explain how energy",
    "from the sun drives the whole cycle across a school week of lessons.",
];

/// Too short to pass the default policy.
pub const STUB_LINES: &[&str] = &["Unit 4", "Water cycle notes to follow."];

/// Builds a PDF with one page per entry, one text line per element.
pub fn build_pdf(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.new_object_id();

    doc.objects.insert(
        font_id,
        Object::Dictionary(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        }),
    );
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let content: String = lines
            .iter()
            .enumerate()
            .map(|(i, line)| format!("BT /F1 11 Tf 40 {} Td ({}) Tj ET\n", 720 - 14 * i, line))
            .collect();
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to serialize PDF");
    bytes
}

/// Builds a minimal OOXML package with one paragraph per element.
pub fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p))
        .collect();
    let document = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{}</w:body></w:document>",
        body
    );

    let mut buffer = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buffer);
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("[Content_Types].xml", options)
            .expect("Failed to start content types entry");
        zip.write_all(b"<?xml version=\"1.0\"?><Types/>")
            .expect("Failed to write content types");
        zip.start_file("word/document.xml", options)
            .expect("Failed to start document entry");
        zip.write_all(document.as_bytes())
            .expect("Failed to write document");
        zip.finish().expect("Failed to finish DOCX");
    }
    buffer.into_inner()
}

/// Builds bytes resembling a binary Word file: a compound-file signature and
/// filler around the plain text.
pub fn build_legacy_doc(lines: &[&str]) -> Vec<u8> {
    let mut bytes = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    bytes.extend_from_slice(&[0u8; 32]);
    bytes.extend_from_slice(lines.join("\n").as_bytes());
    bytes.extend_from_slice(&[0u8; 32]);
    bytes
}
