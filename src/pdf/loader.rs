// src/pdf/loader.rs
//! Loads a PDF into positioned text runs using lopdf.
//!
//! Run positions come from the text matrix combined with the current
//! transformation matrix, including text drawn inside form XObjects.
//! Run widths are estimated from the font size, which is enough to place
//! text into header/column/footer bands.

use crate::pdf::{TextPage, TextRun};
use crate::utils::error::DocumentReadError;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;

/// US Letter, used when a page tree carries no MediaBox.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];
/// Average glyph advance as a fraction of the font size.
const GLYPH_WIDTH_RATIO: f64 = 0.5;
/// TJ adjustments beyond this (thousandths of an em) read as a word gap.
const TJ_SPACE_THRESHOLD: f64 = 200.0;
const MAX_PAGE_TREE_DEPTH: usize = 32;
/// Forms may draw forms; stop before self-referencing resources loop forever.
const MAX_FORM_DEPTH: usize = 8;

type Matrix = [f64; 6];
const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

type FontMap<'a> = BTreeMap<Vec<u8>, &'a Dictionary>;

/// Opens a PDF and returns its pages in document order.
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Vec<TextPage>, DocumentReadError> {
    let path = path.as_ref();
    tracing::info!("Opening PDF {}", path.display());
    let doc = Document::load(path).map_err(|e| DocumentReadError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let pages = doc.get_pages();
    let mut loaded = Vec::with_capacity(pages.len());
    for (page_num, page_id) in pages {
        loaded.push(load_page(&doc, page_id, page_num as usize)?);
    }
    tracing::info!("Loaded {} pages from {}", loaded.len(), path.display());
    Ok(loaded)
}

fn load_page(doc: &Document, page_id: ObjectId, page_num: usize) -> Result<TextPage, DocumentReadError> {
    let page_error = |message: String| DocumentReadError::Page { page: page_num, message };

    let [llx, lly, urx, ury] = inherited(doc, page_id, b"MediaBox")
        .and_then(|obj| media_box(doc, obj))
        .unwrap_or(DEFAULT_MEDIA_BOX);
    let fonts = match doc.get_page_fonts(page_id) {
        Ok(fonts) => fonts,
        Err(e) => {
            tracing::warn!("Page {}: could not read font resources ({}), decoding text as Latin-1", page_num, e);
            BTreeMap::new()
        }
    };
    let xobjects = inherited(doc, page_id, b"Resources")
        .and_then(|obj| resolve_dict(doc, obj))
        .and_then(|resources| resources.get(b"XObject").ok())
        .and_then(|obj| resolve_dict(doc, obj));

    let data = doc.get_page_content(page_id).map_err(|e| page_error(e.to_string()))?;
    let content = Content::decode(&data).map_err(|e| page_error(e.to_string()))?;

    let mut state = TextState::new(doc, fonts);
    state.xobjects = xobjects;
    state.run(&content.operations);

    let runs = state
        .runs
        .into_iter()
        // baseline (bottom-left origin) to top edge (top-left origin)
        .map(|raw| TextRun::new(raw.text, raw.x - llx, ((ury - raw.y) - raw.size).max(0.0), raw.size))
        .collect::<Vec<_>>();

    let page = TextPage::new(urx - llx, ury - lly, runs);
    tracing::debug!("Page {}: {} text runs", page_num, page.runs().len());
    Ok(page)
}

/// Looks up a page attribute, walking up the page tree for inherited values.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut dict = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Ok(obj) = dict.get(key) {
            return Some(obj);
        }
        let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
        dict = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, obj)?.as_dict().ok()
}

fn media_box(doc: &Document, obj: &Object) -> Option<[f64; 4]> {
    let values: Vec<f64> = resolve(doc, obj)?.as_array().ok()?.iter().filter_map(number).collect();
    match values.as_slice() {
        [a, b, c, d] => Some([a.min(*c), b.min(*d), a.max(*c), b.max(*d)]),
        _ => None,
    }
}

fn matrix_from(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    let mut matrix = IDENTITY;
    for (slot, operand) in matrix.iter_mut().zip(operands) {
        *slot = number(operand)?;
    }
    Some(matrix)
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn multiply(a: &Matrix, b: &Matrix) -> Matrix {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

struct RawRun {
    text: String,
    x: f64,
    y: f64,
    size: f64,
}

/// Graphics and text-object state for one page's content.
struct TextState<'a> {
    doc: &'a Document,
    fonts: FontMap<'a>,
    xobjects: Option<&'a Dictionary>,
    font: Vec<u8>,
    font_size: f64,
    leading: f64,
    text_matrix: Matrix,
    line_matrix: Matrix,
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    form_depth: usize,
    runs: Vec<RawRun>,
}

impl<'a> TextState<'a> {
    fn new(doc: &'a Document, fonts: FontMap<'a>) -> Self {
        Self {
            doc,
            fonts,
            xobjects: None,
            font: Vec::new(),
            font_size: 12.0,
            leading: 0.0,
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            ctm: IDENTITY,
            ctm_stack: Vec::new(),
            form_depth: 0,
            runs: Vec::new(),
        }
    }

    fn run(&mut self, operations: &[Operation]) {
        for op in operations {
            self.apply(op.operator.as_str(), &op.operands);
        }
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        match operator {
            "q" => self.ctm_stack.push(self.ctm),
            "Q" => match self.ctm_stack.pop() {
                Some(ctm) => self.ctm = ctm,
                None => tracing::warn!("Unbalanced Q in content stream"),
            },
            "cm" => {
                if let Some(m) = matrix_from(operands) {
                    self.ctm = multiply(&m, &self.ctm);
                }
            }
            "Do" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.draw_form(name);
                }
            }
            "BT" => {
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.font = name.clone();
                }
                if let Some(size) = operands.get(1).and_then(number) {
                    self.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    self.leading = leading;
                }
            }
            "Td" | "TD" => {
                let tx = operands.first().and_then(number).unwrap_or(0.0);
                let ty = operands.get(1).and_then(number).unwrap_or(0.0);
                if operator == "TD" {
                    self.leading = -ty;
                }
                self.move_line(tx, ty);
            }
            "Tm" => {
                if let Some(matrix) = matrix_from(operands) {
                    self.text_matrix = matrix;
                    self.line_matrix = matrix;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(operand) = operands.first() {
                    let text = self.decode(operand);
                    self.show(text);
                }
            }
            "'" => {
                self.next_line();
                if let Some(operand) = operands.first() {
                    let text = self.decode(operand);
                    self.show(text);
                }
            }
            "\"" => {
                self.next_line();
                if let Some(operand) = operands.get(2) {
                    let text = self.decode(operand);
                    self.show(text);
                }
            }
            "TJ" => {
                if let Some(Ok(items)) = operands.first().map(Object::as_array) {
                    let mut combined = String::new();
                    for item in items {
                        match number(item) {
                            Some(adjust) if -adjust > TJ_SPACE_THRESHOLD => {
                                if !combined.ends_with(' ') {
                                    combined.push(' ');
                                }
                            }
                            Some(_) => {}
                            None => combined.push_str(&self.decode(item)),
                        }
                    }
                    self.show(combined);
                }
            }
            _ => {}
        }
    }

    /// Runs a form XObject's content under its own matrix and resources.
    fn draw_form(&mut self, name: &[u8]) {
        if self.form_depth >= MAX_FORM_DEPTH {
            tracing::warn!("Form XObjects nested deeper than {}, skipping", MAX_FORM_DEPTH);
            return;
        }
        let doc = self.doc;
        let Some(stream) = self
            .xobjects
            .and_then(|xobjects| xobjects.get(name).ok())
            .and_then(|obj| resolve(doc, obj))
            .and_then(|obj| obj.as_stream().ok())
        else {
            tracing::debug!("XObject {} not found", String::from_utf8_lossy(name));
            return;
        };
        // Images and other non-form XObjects carry no text.
        let is_form = matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(subtype)) if subtype.as_slice() == b"Form");
        if !is_form {
            return;
        }

        let data = stream.decompressed_content().unwrap_or_else(|_| stream.content.clone());
        let content = match Content::decode(&data) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Skipping unreadable form XObject {}: {}", String::from_utf8_lossy(name), e);
                return;
            }
        };
        let form_matrix = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|obj| resolve(doc, obj))
            .and_then(|obj| obj.as_array().ok())
            .and_then(|array| matrix_from(array))
            .unwrap_or(IDENTITY);
        let resources = stream.dict.get(b"Resources").ok().and_then(|obj| resolve_dict(doc, obj));

        // Forms draw in a fresh graphics state nested inside the caller's.
        let saved_ctm = self.ctm;
        let saved_stack_len = self.ctm_stack.len();
        let saved_xobjects = self.xobjects;
        let saved_fonts = resources.map(|res| std::mem::replace(&mut self.fonts, fonts_of(doc, res)));
        if let Some(res) = resources {
            self.xobjects = res.get(b"XObject").ok().and_then(|obj| resolve_dict(doc, obj));
        }

        self.ctm = multiply(&form_matrix, &self.ctm);
        self.form_depth += 1;
        self.run(&content.operations);
        self.form_depth -= 1;

        self.ctm = saved_ctm;
        self.ctm_stack.truncate(saved_stack_len);
        self.xobjects = saved_xobjects;
        if let Some(fonts) = saved_fonts {
            self.fonts = fonts;
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = if self.leading != 0.0 { self.leading } else { self.font_size * 1.2 };
        self.move_line(0.0, -leading);
    }

    fn show(&mut self, text: String) {
        // text space -> user space -> device space
        let trm = multiply(&self.text_matrix, &self.ctm);
        let vertical_scale = (trm[2] * trm[2] + trm[3] * trm[3]).sqrt();
        let size = self.font_size * if vertical_scale > 0.0 { vertical_scale } else { 1.0 };

        if !text.trim().is_empty() {
            self.runs.push(RawRun {
                text: text.trim().to_string(),
                x: trm[4],
                y: trm[5],
                size,
            });
        }
        let tm = self.text_matrix;
        let horizontal_scale = (tm[0] * tm[0] + tm[1] * tm[1]).sqrt();
        let advance = text.chars().count() as f64 * self.font_size * GLYPH_WIDTH_RATIO;
        self.text_matrix[4] += advance * horizontal_scale;
    }

    /// Decodes a string operand with the current font's encoding.
    fn decode(&self, obj: &Object) -> String {
        let Object::String(bytes, _) = obj else {
            return String::new();
        };

        if let Some(font) = self.fonts.get(&self.font) {
            if let Ok(encoding) = font.get_font_encoding(self.doc) {
                if let Ok(text) = Document::decode_text(&encoding, bytes) {
                    return text;
                }
            }
        }

        // Fallback: UTF-16BE with BOM, then Latin-1
        if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
            let utf16: Vec<u16> = bytes[2..]
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            return String::from_utf16_lossy(&utf16);
        }
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Font dictionaries named in a resource dictionary.
fn fonts_of<'a>(doc: &'a Document, resources: &'a Dictionary) -> FontMap<'a> {
    resources
        .get(b"Font")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))
        .map(|fonts| {
            fonts
                .iter()
                .filter_map(|(name, obj)| resolve_dict(doc, obj).map(|dict| (name.clone(), dict)))
                .collect()
        })
        .unwrap_or_default()
}
