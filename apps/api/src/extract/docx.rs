//! Office Open XML (`.docx`) text extraction.
//!
//! Output layout: every body paragraph (runs concatenated, one line each), followed by
//! every table row (run texts space-joined, one line each, row-major). Nested tables are
//! flattened; inner rows are emitted as they close.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::{DocumentFormat, ExtractError, TextExtractor};

const DOCUMENT_PART: &str = "word/document.xml";

pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn extract(&self, bytes: &[u8], max_bytes: usize) -> Result<String, ExtractError> {
        let xml = read_document_part(bytes, max_bytes)?;
        document_text(&xml)
    }
}

fn read_document_part(bytes: &[u8], max_bytes: usize) -> Result<Vec<u8>, ExtractError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::Corrupt(format!("not an office document: {e}")))?;

    let part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractError::Corrupt(format!("missing {DOCUMENT_PART}: {e}")))?;

    let declared = part.size() as usize;
    if declared > max_bytes {
        return Err(ExtractError::TooLarge {
            size: declared,
            limit: max_bytes,
        });
    }

    // The declared size can lie; never inflate past the limit.
    let mut xml = Vec::with_capacity(declared);
    part.take(max_bytes as u64 + 1)
        .read_to_end(&mut xml)
        .map_err(|e| ExtractError::Corrupt(format!("failed to inflate {DOCUMENT_PART}: {e}")))?;
    if xml.len() > max_bytes {
        return Err(ExtractError::TooLarge {
            size: xml.len(),
            limit: max_bytes,
        });
    }

    Ok(xml)
}

#[derive(Default)]
struct DocumentWalker {
    body: String,
    tables: String,
    paragraph: String,
    paragraph_depth: usize,
    table_depth: usize,
    /// Open table rows, innermost last. Each holds the row's run texts.
    rows: Vec<Vec<String>>,
    run: Option<String>,
    run_depth: usize,
    in_text: bool,
}

impl DocumentWalker {
    fn start(&mut self, name: &[u8]) {
        match name {
            b"p" => {
                self.paragraph_depth += 1;
                if self.paragraph_depth == 1 && self.table_depth == 0 {
                    self.paragraph.clear();
                }
            }
            b"r" => {
                self.run_depth += 1;
                if self.run_depth == 1 {
                    self.run = Some(String::new());
                }
            }
            b"t" => self.in_text = true,
            b"tbl" => self.table_depth += 1,
            b"tr" => self.rows.push(Vec::new()),
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"p" => {
                if self.paragraph_depth == 1 && self.table_depth == 0 {
                    self.body.push_str(&self.paragraph);
                    self.body.push('\n');
                    self.paragraph.clear();
                }
                self.paragraph_depth = self.paragraph_depth.saturating_sub(1);
            }
            b"r" => {
                if self.run_depth == 1 {
                    if let Some(run) = self.run.take() {
                        self.finish_run(run);
                    }
                }
                self.run_depth = self.run_depth.saturating_sub(1);
            }
            b"t" => self.in_text = false,
            b"tbl" => self.table_depth = self.table_depth.saturating_sub(1),
            b"tr" => {
                if let Some(row) = self.rows.pop() {
                    self.tables.push_str(&row.join(" "));
                    self.tables.push('\n');
                }
            }
            _ => {}
        }
    }

    /// Self-closing elements: `<w:p/>` is an empty paragraph, `<w:tab/>` a tab.
    fn empty(&mut self, name: &[u8]) {
        match name {
            b"p" if self.paragraph_depth == 0 && self.table_depth == 0 => self.body.push('\n'),
            b"tab" => {
                if let Some(run) = self.run.as_mut() {
                    run.push('\t');
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if !self.in_text {
            return;
        }
        if let Some(run) = self.run.as_mut() {
            run.push_str(text);
        }
    }

    fn finish_run(&mut self, run: String) {
        if self.table_depth == 0 {
            self.paragraph.push_str(&run);
        } else if !run.is_empty() {
            if let Some(row) = self.rows.last_mut() {
                row.push(run);
            }
        }
    }

    fn into_text(self) -> String {
        let mut out = self.body;
        out.push_str(&self.tables);
        out
    }
}

fn document_text(xml: &[u8]) -> Result<String, ExtractError> {
    let mut reader = Reader::from_reader(xml);
    let mut walker = DocumentWalker::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => walker.start(e.local_name().as_ref()),
            Ok(Event::End(e)) => walker.end(e.local_name().as_ref()),
            Ok(Event::Empty(e)) => walker.empty(e.local_name().as_ref()),
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| ExtractError::Corrupt(format!("bad text node: {e}")))?;
                walker.text(&text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ExtractError::Corrupt(format!(
                    "malformed {DOCUMENT_PART} at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
        }
        buf.clear();
    }

    Ok(walker.into_text())
}
