//! Minimal single-page PDF writer.
//!
//! Emits a self-contained PDF 1.4 document with one A4 page rendered from a
//! list of positioned text lines. Only the three built-in Helvetica variants
//! are available, which keeps the output free of embedded font programs.

const PAGE_WIDTH: i32 = 595;
const PAGE_HEIGHT: i32 = 842;
const MARGIN: i32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    Oblique,
}

impl Font {
    fn resource_id(self) -> u8 {
        match self {
            Font::Regular => 1,
            Font::Bold => 2,
            Font::Oblique => 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextLine {
    pub x: i32,
    pub y: i32,
    pub size: i32,
    pub font: Font,
    pub text: String,
}

/// Lays text out top to bottom on a single A4 page.
pub struct PageBuilder {
    cursor: i32,
    lines: Vec<TextLine>,
}

impl PageBuilder {
    pub fn new() -> Self {
        Self {
            cursor: PAGE_HEIGHT - MARGIN,
            lines: Vec::new(),
        }
    }

    /// Append a line at the current cursor and advance past it.
    pub fn text(&mut self, font: Font, size: i32, text: &str) -> &mut Self {
        self.cursor -= size + size / 2;
        self.lines.push(TextLine {
            x: MARGIN,
            y: self.cursor,
            size,
            font,
            text: text.to_string(),
        });
        self
    }

    /// Insert vertical whitespace.
    pub fn gap(&mut self, points: i32) -> &mut Self {
        self.cursor -= points;
        self
    }

    pub fn render(&self) -> Vec<u8> {
        render_page(&self.lines)
    }
}

impl Default for PageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize one page of text lines into a complete PDF document.
pub fn render_page(lines: &[TextLine]) -> Vec<u8> {
    let mut content = String::new();
    for line in lines {
        content.push_str(&format!(
            "BT /F{} {} Tf {} {} Td ({}) Tj ET\n",
            line.font.resource_id(),
            line.size,
            line.x,
            line.y,
            escape_text(&line.text)
        ));
    }

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 5 0 R /F2 6 0 R /F3 7 0 R >> >> /Contents 4 0 R >>"
        ),
        format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold >>".to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Oblique >>".to_string(),
    ];

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", index + 1, body));
    }

    // Cross-reference table offsets are byte positions in the final output,
    // so nothing may be inserted before this point afterwards.
    let xref_position = out.len();
    out.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    out.push_str("0000000000 65535 f \n");
    for offset in &offsets {
        out.push_str(&format!("{offset:010} 00000 n \n"));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_position
    ));

    out.into_bytes()
}

/// Escape a string for inclusion in a PDF literal string.
///
/// Backslash and parentheses get escaped, newlines become `\n`, and any
/// non-ASCII or control byte is emitted as an octal escape so the whole
/// document stays ASCII.
fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'\\' => escaped.push_str("\\\\"),
            b'(' => escaped.push_str("\\("),
            b')' => escaped.push_str("\\)"),
            b'\n' => escaped.push_str("\\n"),
            b'\r' => escaped.push_str("\\r"),
            0x20..=0x7e => escaped.push(byte as char),
            other => escaped.push_str(&format!("\\{other:03o}")),
        }
    }
    escaped
}
