//! Plain-text PDF 1.4 writer.
//!
//! Lays out a title and a body of text lines on A4 pages in Helvetica, using
//! only the standard base-14 font so nothing has to be embedded. Text is not
//! wrapped; lines are split on `\n` and flow onto new pages at the bottom
//! margin. Strings are WinAnsi-encoded, and anything outside Latin-1 becomes `?`.

use std::fmt::Write as _;

const PAGE_WIDTH: f64 = 595.28;
const PAGE_HEIGHT: f64 = 841.89;
const PT_PER_MM: f64 = 72.0 / 25.4;
const FONT_SIZE: f64 = 16.0;
const LINE_HEIGHT: f64 = FONT_SIZE * 1.15;

const LEFT_MM: f64 = 10.0;
const TITLE_TOP_MM: f64 = 10.0;
const BODY_TOP_MM: f64 = 30.0;
const BOTTOM_MM: f64 = 10.0;

/// One positioned line of text, in points from the top-left corner.
#[derive(Debug, Clone, PartialEq)]
struct Line {
    x: f64,
    y: f64,
    text: String,
}

/// Render `title` and `body` to a complete PDF file.
pub fn render(title: &str, body: &str) -> Vec<u8> {
    let pages = layout(title, body);
    write_document(&pages)
}

fn layout(title: &str, body: &str) -> Vec<Vec<Line>> {
    let left = LEFT_MM * PT_PER_MM;
    let bottom = PAGE_HEIGHT - BOTTOM_MM * PT_PER_MM;

    let mut pages = vec![vec![Line {
        x: left,
        y: TITLE_TOP_MM * PT_PER_MM,
        text: title.to_string(),
    }]];
    let mut y = BODY_TOP_MM * PT_PER_MM;

    for text in body.split('\n') {
        if y > bottom {
            pages.push(Vec::new());
            y = TITLE_TOP_MM * PT_PER_MM;
        }
        if let Some(page) = pages.last_mut() {
            page.push(Line {
                x: left,
                y,
                text: text.trim_end_matches('\r').to_string(),
            });
        }
        y += LINE_HEIGHT;
    }
    pages
}

fn write_document(pages: &[Vec<Line>]) -> Vec<u8> {
    // 1: catalog, 2: page tree, 3: font, then a (page, contents) pair per page
    let page_id = |index: usize| 4 + index * 2;
    let kids = (0..pages.len())
        .map(|i| format!("{} 0 R", page_id(i)))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects: Vec<Vec<u8>> = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()).into_bytes(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    ];

    for (index, lines) in pages.iter().enumerate() {
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                page_id(index) + 1
            )
            .into_bytes(),
        );

        let stream = content_stream(lines);
        let mut contents = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        contents.extend_from_slice(&stream);
        contents.extend_from_slice(b"\nendstream");
        objects.push(contents);
    }

    let mut out = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_at = out.len();
    let mut trailer = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = write!(trailer, "{offset:010} 00000 n \n");
    }
    let _ = write!(
        trailer,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
        objects.len() + 1
    );
    out.extend_from_slice(trailer.as_bytes());
    out
}

fn content_stream(lines: &[Line]) -> Vec<u8> {
    let mut stream = Vec::new();
    for line in lines {
        // PDF user space grows upwards from the bottom edge
        let header = format!(
            "BT /F1 {FONT_SIZE} Tf {:.2} {:.2} Td (",
            line.x,
            PAGE_HEIGHT - line.y
        );
        stream.extend_from_slice(header.as_bytes());
        stream.extend(encode_text(&line.text));
        stream.extend_from_slice(b") Tj ET\n");
    }
    stream
}

/// Latin-1 bytes for a PDF literal string, with delimiters escaped.
fn encode_text(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                bytes.push(b'\\');
                bytes.push(c as u8);
            }
            '\t' => bytes.push(b' '),
            c if (c as u32) < 0x20 => {}
            c if (c as u32) <= 0xFF => bytes.push(c as u32 as u8),
            _ => bytes.push(b'?'),
        }
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_document_structure() {
        let pdf = render("Groceries", "eggs\nmilk");

        assert!(pdf.starts_with(b"%PDF-1.4\n"));
        assert!(pdf.ends_with(b"%%EOF\n"));
        assert!(contains(&pdf, b"/BaseFont /Helvetica"));
        assert!(contains(&pdf, b"(Groceries) Tj"));
        assert!(contains(&pdf, b"(eggs) Tj"));
        assert!(contains(&pdf, b"(milk) Tj"));
        assert!(contains(&pdf, b"/Count 1"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let pdf = render("T", "body");
        // Everything after the binary marker comment is ASCII
        let xref_at = pdf.windows(5).position(|w| w == b"xref\n").unwrap();
        let table = std::str::from_utf8(&pdf[xref_at..]).unwrap();

        let startxref: usize = table
            .lines()
            .skip_while(|line| *line != "startxref")
            .nth(1)
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(startxref, xref_at);

        let entries: Vec<usize> = table
            .lines()
            .skip(3)
            .take_while(|line| line.ends_with(" n "))
            .map(|line| line[..10].parse().unwrap())
            .collect();
        assert_eq!(entries.len(), 5);
        for (index, offset) in entries.into_iter().enumerate() {
            assert!(pdf[offset..].starts_with(format!("{} 0 obj", index + 1).as_bytes()));
        }
    }

    #[test]
    fn test_title_and_body_positions() {
        let pages = layout("Title", "first");
        let lines = &pages[0];

        assert!((lines[0].y - 28.35).abs() < 0.01);
        assert!((lines[1].y - 85.04).abs() < 0.01);
        assert!((lines[0].x - 28.35).abs() < 0.01);
    }

    #[test]
    fn test_long_text_spills_onto_new_pages() {
        let body = vec!["line"; 100].join("\n");
        let pages = layout("Long", &body);

        assert_eq!(pages.len(), 3);
        assert_eq!(pages.iter().map(Vec::len).sum::<usize>(), 101);
        let bottom = PAGE_HEIGHT - BOTTOM_MM * PT_PER_MM;
        assert!(pages.iter().flatten().all(|line| line.y <= bottom));
        assert!(contains(&render("Long", &body), b"/Count 3"));
    }

    #[test]
    fn test_text_encoding() {
        assert_eq!(encode_text("a(b)c\\"), b"a\\(b\\)c\\\\".to_vec());
        assert_eq!(encode_text("café"), vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_text("日本"), b"??".to_vec());
    }
}
