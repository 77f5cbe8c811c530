use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::common::{EngineError, Result};

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^--- !u!(\d+) &(\d+)( stripped)?$").expect("Invalid regex"));

static FILEID_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{fileID: (-?\d+)\}").expect("Invalid regex"));

static NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+(\.\d+)?([eE][+-]?\d+)?$").expect("Invalid regex"));

static ARRAY_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)\.Array\.data\[(\d+)\]$").expect("Invalid regex"));

/// Serialized form of a compound property: flow mapping on one line versus an
/// indented child map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyFormat {
    Inline,
    Block,
}

/// Shape of a property's current serialized value, used to type-check
/// incoming edits before any text is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// `{fileID: N}` or `{fileID: N, guid: ..., type: T}`
    Reference,
    /// Flow mapping such as `{x: 0, y: 0, z: 0}`
    InlineStruct,
    /// `[]`
    EmptyArray,
    /// Populated flow sequence `[a, b]`
    InlineArray,
    /// Multiline `- ` sequence
    MultilineArray,
    /// Indented child map
    BlockStruct,
    Numeric,
    Text,
}

/// One `--- !u!<class> &<fileID> [stripped]` chunk of a Unity YAML stream.
///
/// The raw text is kept verbatim from the `---` through the byte before the
/// next separator; all mutators are text-surgical and leave untouched
/// neighbors byte-identical. File ids never leave string form.
#[derive(Debug)]
pub struct Block {
    class_id: u32,
    file_id: String,
    stripped: bool,
    raw: String,
    dirty: bool,
    formats: HashMap<String, PropertyFormat>,
}

impl Clone for Block {
    /// A clone is byte-identical, independent, and never dirty.
    fn clone(&self) -> Self {
        Block {
            class_id: self.class_id,
            file_id: self.file_id.clone(),
            stripped: self.stripped,
            raw: self.raw.clone(),
            dirty: false,
            formats: self.formats.clone(),
        }
    }
}

/// A resolved `key:` line.
#[derive(Debug, Clone, Copy)]
struct KeyHit {
    line_start: usize,
    /// End of line including the trailing newline (or text end).
    line_end: usize,
    /// End of line content, excluding the newline.
    content_end: usize,
    indent: usize,
    /// Byte position right after the ':'.
    value_start: usize,
}

/// Where a property path bottomed out.
enum Leaf {
    /// The value is the rest of a `key:` line.
    Line(KeyHit),
    /// The value is a sub-field span inside a flow mapping.
    InlineField { value_start: usize, value_end: usize },
}

struct ArrayLayout {
    key: KeyHit,
    empty_flow: bool,
    /// Byte span of a populated flow sequence, brackets included.
    inline_span: Option<(usize, usize)>,
    elem_indent: usize,
    /// Per-element byte spans including the trailing newline.
    elements: Vec<(usize, usize)>,
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

impl Block {
    /// Parse a raw chunk. The first line must be a Unity block header; CRLF
    /// input is normalized to LF.
    pub fn parse(chunk: &str) -> Result<Block> {
        let raw = if chunk.contains('\r') {
            chunk.replace("\r\n", "\n")
        } else {
            chunk.to_string()
        };
        let first_line = raw.split('\n').next().unwrap_or("");
        let caps = HEADER_RE.captures(first_line).ok_or_else(|| {
            EngineError::malformed(format!("bad block header: {first_line:?}"))
        })?;
        let class_id: u32 = caps[1]
            .parse()
            .map_err(|_| EngineError::malformed(format!("class id out of range: {first_line:?}")))?;
        Ok(Block {
            class_id,
            file_id: caps[2].to_string(),
            stripped: caps.get(3).is_some(),
            raw,
            dirty: false,
            formats: HashMap::new(),
        })
    }

    pub fn class_id(&self) -> u32 {
        self.class_id
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn is_stripped(&self) -> bool {
        self.stripped
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// The Unity type name from the line after the header, e.g. `GameObject`.
    pub fn type_name(&self) -> Option<&str> {
        let second = self.raw.split('\n').nth(1)?;
        let name = second.split(':').next()?.trim();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    /// Swap the entire raw text. The new text must carry a valid header; the
    /// cached header and format map are rebuilt.
    pub fn replace_raw(&mut self, new_text: &str) -> Result<()> {
        let replacement = Block::parse(new_text)?;
        self.class_id = replacement.class_id;
        self.file_id = replacement.file_id;
        self.stripped = replacement.stripped;
        self.raw = replacement.raw;
        self.formats.clear();
        self.dirty = true;
        Ok(())
    }

    fn body_start(&self) -> usize {
        self.raw.find('\n').map(|i| i + 1).unwrap_or(self.raw.len())
    }

    /// Indent of the block's top-level properties (the lines under the type
    /// name), almost always two spaces.
    fn top_indent(&self) -> usize {
        let mut lines = self.line_spans(self.body_start(), self.raw.len());
        lines.next(); // the `TypeName:` line sits at indent 0
        for (ls, _le, ce) in lines {
            let line = &self.raw[ls..ce];
            if line.trim().is_empty() {
                continue;
            }
            return indent_of(line);
        }
        2
    }

    /// Iterate (line_start, line_end_incl_newline, content_end) within a window.
    fn line_spans(
        &self,
        from: usize,
        to: usize,
    ) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        let raw = &self.raw;
        let mut pos = from;
        std::iter::from_fn(move || {
            if pos >= to {
                return None;
            }
            let ls = pos;
            let le = match raw[ls..to].find('\n') {
                Some(i) => ls + i + 1,
                None => to,
            };
            let ce = if le > ls && raw.as_bytes()[le - 1] == b'\n' {
                le - 1
            } else {
                le
            };
            pos = le;
            Some((ls, le, ce))
        })
    }

    /// Find a line-anchored `key:` within a window. When `required_indent` is
    /// given, only lines at exactly that indent match.
    fn find_key(
        &self,
        from: usize,
        to: usize,
        key: &str,
        required_indent: Option<usize>,
    ) -> Option<KeyHit> {
        for (ls, le, ce) in self.line_spans(from, to) {
            let line = &self.raw[ls..ce];
            let indent = indent_of(line);
            if let Some(req) = required_indent {
                if indent != req {
                    continue;
                }
            }
            let content = &line[indent..];
            if content.starts_with(key) && content[key.len()..].starts_with(':') {
                return Some(KeyHit {
                    line_start: ls,
                    line_end: le,
                    content_end: ce,
                    indent,
                    value_start: ls + indent + key.len() + 1,
                });
            }
        }
        None
    }

    /// Child window of a key: starts at the first following non-empty line
    /// indented deeper than the key, ends where indentation falls back to or
    /// below the key's.
    fn child_window(&self, hit: KeyHit, to: usize) -> Option<(usize, usize, usize)> {
        let mut start = None;
        let mut child_indent = 0;
        let mut end = to;
        for (ls, _le, ce) in self.line_spans(hit.line_end, to) {
            let line = &self.raw[ls..ce];
            if line.trim().is_empty() {
                continue;
            }
            let indent = indent_of(line);
            if start.is_none() {
                if indent > hit.indent {
                    start = Some(ls);
                    child_indent = indent;
                    continue;
                }
                return None;
            }
            if indent <= hit.indent {
                end = ls;
                break;
            }
        }
        start.map(|s| (s, end, child_indent))
    }

    /// Span of a flow mapping starting at the first '{' at or after `from`,
    /// balanced across line breaks.
    fn flow_span(&self, from: usize, to: usize) -> Option<(usize, usize)> {
        let bytes = self.raw.as_bytes();
        let open = self.raw[from..to].find('{')? + from;
        let mut depth = 0usize;
        for (i, &b) in bytes[open..to].iter().enumerate() {
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((open, open + i + 1));
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Locate `key:` at depth 1 of a flow mapping span and return its value
    /// span, stopping at the next depth-1 comma or the closing brace.
    fn inline_field(&self, span: (usize, usize), key: &str) -> Option<(usize, usize)> {
        let (s, e) = span;
        let text = &self.raw[s..e];
        let bytes = text.as_bytes();
        let mut depth = 0usize;
        let mut i = 0usize;
        while i < bytes.len() {
            match bytes[i] {
                b'{' | b'[' => {
                    depth += 1;
                    if depth == 1 {
                        // at an entry boundary right after the opening brace
                        if let Some(found) = self.match_entry_key(text, i + 1, key) {
                            return self.inline_value_span(e, s + found);
                        }
                    }
                    i += 1;
                }
                b'}' | b']' => {
                    depth = depth.saturating_sub(1);
                    i += 1;
                }
                b',' if depth == 1 => {
                    if let Some(found) = self.match_entry_key(text, i + 1, key) {
                        return self.inline_value_span(e, s + found);
                    }
                    i += 1;
                }
                _ => {
                    i += 1;
                }
            }
        }
        None
    }

    /// If `key:` begins (after whitespace) at `pos`, return the byte offset
    /// just past the ':'.
    fn match_entry_key(&self, text: &str, pos: usize, key: &str) -> Option<usize> {
        let rest = &text[pos..];
        let skipped = rest.len() - rest.trim_start().len();
        let candidate = &rest[skipped..];
        if candidate.starts_with(key) && candidate[key.len()..].starts_with(':') {
            Some(pos + skipped + key.len() + 1)
        } else {
            None
        }
    }

    /// Value span of a flow entry: from after the ':' (skipping one space) to
    /// the next depth-1 comma or the closing brace.
    fn inline_value_span(&self, flow_end: usize, after_colon: usize) -> Option<(usize, usize)> {
        let bytes = self.raw.as_bytes();
        let mut vs = after_colon;
        while vs < flow_end && bytes[vs] == b' ' {
            vs += 1;
        }
        let mut depth = 0usize;
        let mut i = vs;
        while i < flow_end {
            match bytes[i] {
                b'{' | b'[' => depth += 1,
                b'}' | b']' => {
                    if depth == 0 {
                        return Some((vs, i));
                    }
                    depth -= 1;
                }
                b',' if depth == 0 => return Some((vs, i)),
                _ => {}
            }
            i += 1;
        }
        None
    }

    /// Split a property path into key segments, peeling a trailing
    /// `.Array.data[i]` into an element index.
    fn split_path(path: &str) -> (Vec<&str>, Option<usize>) {
        if let Some(caps) = ARRAY_PATH_RE.captures(path) {
            let base = caps.get(1).unwrap().as_str();
            let idx: usize = caps[2].parse().unwrap_or(0);
            (base.split('.').collect(), Some(idx))
        } else {
            (path.split('.').collect(), None)
        }
    }

    /// Walk a dotted key chain to its leaf. The inline/block form of each
    /// compound step is pushed onto `trace` for the caller to memoize.
    fn resolve_chain(
        &self,
        segs: &[&str],
        mut trace: Option<&mut Vec<(String, PropertyFormat)>>,
    ) -> Option<Leaf> {
        let mut window = (self.body_start(), self.raw.len());
        let mut required = Some(self.top_indent());
        let mut walked: Vec<&str> = Vec::new();
        for (i, seg) in segs.iter().enumerate() {
            let hit = self.find_key(window.0, window.1, seg, required)?;
            walked.push(seg);
            if i + 1 == segs.len() {
                return Some(Leaf::Line(hit));
            }
            let value = self.raw[hit.value_start..hit.content_end].trim();
            if value.starts_with('{') {
                if let Some(trace) = trace.as_mut() {
                    trace.push((walked.join("."), PropertyFormat::Inline));
                }
                let span = self.flow_span(hit.value_start, self.raw.len())?;
                return self.resolve_inline_chain(span, &segs[i + 1..]);
            }
            if !value.is_empty() {
                return None; // scalar mid-path
            }
            if let Some(trace) = trace.as_mut() {
                trace.push((walked.join("."), PropertyFormat::Block));
            }
            let (start, end, child_indent) = self.child_window(hit, window.1)?;
            window = (start, end);
            required = Some(child_indent);
        }
        None
    }

    fn resolve_inline_chain(&self, span: (usize, usize), segs: &[&str]) -> Option<Leaf> {
        let mut span = span;
        for (i, seg) in segs.iter().enumerate() {
            let (vs, ve) = self.inline_field(span, seg)?;
            if i + 1 == segs.len() {
                return Some(Leaf::InlineField {
                    value_start: vs,
                    value_end: ve,
                });
            }
            if !self.raw[vs..ve].trim_start().starts_with('{') {
                return None;
            }
            span = self.flow_span(vs, ve + 1)?;
        }
        None
    }

    /// Read a property. Returns the trimmed scalar or flow text; an empty
    /// string for a block-style compound; `None` when the key is absent.
    pub fn get_property(&self, path: &str) -> Option<String> {
        let (segs, idx) = Block::split_path(path);
        if let Some(i) = idx {
            let base = segs.join(".");
            return self.array_element(&base, i);
        }
        let leaf = self.resolve_chain(&segs, None)?;
        match leaf {
            Leaf::Line(hit) => Some(self.raw[hit.value_start..hit.content_end].trim().to_string()),
            Leaf::InlineField {
                value_start,
                value_end,
            } => Some(self.raw[value_start..value_end].trim().to_string()),
        }
    }

    /// Detected serialized form of a compound property, memoized per name.
    pub fn property_format(&mut self, path: &str) -> Option<PropertyFormat> {
        if let Some(f) = self.formats.get(path) {
            return Some(*f);
        }
        let (segs, _) = Block::split_path(path);
        let leaf = self.resolve_chain(&segs, None)?;
        let format = match leaf {
            Leaf::InlineField { .. } => PropertyFormat::Inline,
            Leaf::Line(hit) => {
                let value = self.raw[hit.value_start..hit.content_end].trim();
                if value.starts_with('{') {
                    PropertyFormat::Inline
                } else if value.is_empty() && self.child_window(hit, self.raw.len()).is_some() {
                    PropertyFormat::Block
                } else {
                    return None;
                }
            }
        };
        self.formats.insert(path.to_string(), format);
        Some(format)
    }

    /// Classify the current serialized value of a property.
    pub fn property_shape(&self, path: &str) -> Option<ValueShape> {
        let (segs, idx) = Block::split_path(path);
        if idx.is_some() {
            let v = self.get_property(path)?;
            return Some(Block::classify_scalar(&v));
        }
        let leaf = self.resolve_chain(&segs, None)?;
        match leaf {
            Leaf::InlineField {
                value_start,
                value_end,
            } => Some(Block::classify_scalar(self.raw[value_start..value_end].trim())),
            Leaf::Line(hit) => {
                let value = self.raw[hit.value_start..hit.content_end].trim();
                if value == "[]" {
                    return Some(ValueShape::EmptyArray);
                }
                if value.starts_with('[') {
                    return Some(ValueShape::InlineArray);
                }
                if value.starts_with('{') {
                    return Some(if value.contains("fileID:") {
                        ValueShape::Reference
                    } else {
                        ValueShape::InlineStruct
                    });
                }
                if value.is_empty() {
                    if let Some((start, _end, _ci)) = self.child_window(hit, self.raw.len()) {
                        let first = self.raw[start..].trim_start_matches(' ');
                        return Some(if first.starts_with("- ") {
                            ValueShape::MultilineArray
                        } else {
                            ValueShape::BlockStruct
                        });
                    }
                    return Some(ValueShape::Text);
                }
                Some(Block::classify_scalar(value))
            }
        }
    }

    fn classify_scalar(value: &str) -> ValueShape {
        if value.starts_with('{') {
            if value.contains("fileID:") {
                ValueShape::Reference
            } else {
                ValueShape::InlineStruct
            }
        } else if value == "[]" {
            ValueShape::EmptyArray
        } else if value.starts_with('[') {
            ValueShape::InlineArray
        } else if NUMERIC_RE.is_match(value) {
            ValueShape::Numeric
        } else {
            ValueShape::Text
        }
    }

    /// Write a property in place, preserving the detected inline/block form
    /// and all sibling sub-fields.
    pub fn set_property(&mut self, path: &str, value: &str) -> Result<()> {
        let (segs, idx) = Block::split_path(path);
        if let Some(i) = idx {
            let base = segs.join(".");
            return self.set_array_element(&base, i, value);
        }
        let mut trace = Vec::new();
        let leaf = self
            .resolve_chain(&segs, Some(&mut trace))
            .ok_or_else(|| EngineError::not_found("property", path))?;
        match leaf {
            Leaf::Line(hit) => {
                self.raw
                    .replace_range(hit.value_start..hit.content_end, &format!(" {value}"));
            }
            Leaf::InlineField {
                value_start,
                value_end,
            } => {
                self.raw.replace_range(value_start..value_end, value);
            }
        }
        self.formats.extend(trace);
        self.dirty = true;
        Ok(())
    }

    /// Write a top-level property, appending the line when the key is not
    /// serialized yet.
    pub fn set_or_insert_property(&mut self, key: &str, value: &str) -> Result<()> {
        let top = self.top_indent();
        if self
            .find_key(self.body_start(), self.raw.len(), key, Some(top))
            .is_some()
        {
            return self.set_property(key, value);
        }
        if !self.raw.ends_with('\n') {
            self.raw.push('\n');
        }
        let indent = " ".repeat(top);
        self.raw.push_str(&format!("{indent}{key}: {value}\n"));
        self.dirty = true;
        Ok(())
    }

    // --- array operations ---

    fn array_layout(&self, name: &str) -> Option<ArrayLayout> {
        let segs: Vec<&str> = name.split('.').collect();
        let hit = if segs.len() > 1 {
            match self.resolve_chain(&segs, None)? {
                Leaf::Line(h) => h,
                Leaf::InlineField { .. } => return None,
            }
        } else {
            self.find_key(self.body_start(), self.raw.len(), name, None)?
        };
        let value = self.raw[hit.value_start..hit.content_end].trim();
        if value == "[]" {
            return Some(ArrayLayout {
                key: hit,
                empty_flow: true,
                inline_span: None,
                elem_indent: hit.indent,
                elements: Vec::new(),
            });
        }
        if value.starts_with('[') {
            let open = self.raw[hit.value_start..hit.content_end].find('[')? + hit.value_start;
            let close = self.raw[open..hit.content_end].rfind(']')? + open;
            return Some(ArrayLayout {
                key: hit,
                empty_flow: false,
                inline_span: Some((open, close + 1)),
                elem_indent: hit.indent,
                elements: Vec::new(),
            });
        }
        if !value.is_empty() {
            return None;
        }
        // multiline `- ` sequence
        let mut elements: Vec<(usize, usize)> = Vec::new();
        let mut elem_indent = None;
        for (ls, le, ce) in self.line_spans(hit.line_end, self.raw.len()) {
            let line = &self.raw[ls..ce];
            if line.trim().is_empty() {
                continue;
            }
            let indent = indent_of(line);
            let dash = line[indent..].starts_with("- ") || &line[indent..] == "-";
            match elem_indent {
                None => {
                    if dash && indent >= hit.indent {
                        elem_indent = Some(indent);
                        elements.push((ls, le));
                    } else {
                        return None; // no elements and not an array
                    }
                }
                Some(ei) => {
                    if indent > ei {
                        elements.last_mut().expect("element open").1 = le;
                    } else if indent == ei && dash {
                        elements.push((ls, le));
                    } else {
                        break;
                    }
                }
            }
        }
        elem_indent.map(|ei| ArrayLayout {
            key: hit,
            empty_flow: false,
            inline_span: None,
            elem_indent: ei,
            elements,
        })
    }

    /// Item spans at depth 0 inside a populated flow sequence.
    fn inline_items(&self, span: (usize, usize)) -> Vec<(usize, usize)> {
        let (s, e) = span;
        let inner = (s + 1, e - 1);
        let bytes = self.raw.as_bytes();
        let mut items = Vec::new();
        let mut depth = 0usize;
        let mut start = inner.0;
        let mut i = inner.0;
        while i < inner.1 {
            match bytes[i] {
                b'{' | b'[' => depth += 1,
                b'}' | b']' => depth = depth.saturating_sub(1),
                b',' if depth == 0 => {
                    items.push((start, i));
                    start = i + 1;
                }
                _ => {}
            }
            i += 1;
        }
        if !self.raw[start..inner.1].trim().is_empty() || !items.is_empty() {
            items.push((start, inner.1));
        }
        items
            .into_iter()
            .map(|(a, b)| {
                let t = &self.raw[a..b];
                let lead = t.len() - t.trim_start().len();
                let trail = t.len() - t.trim_end().len();
                (a + lead, b - trail)
            })
            .collect()
    }

    /// Number of elements of a sequence property; `Some(0)` for `[]`.
    pub fn get_array_length(&self, name: &str) -> Option<usize> {
        let layout = self.array_layout(name)?;
        if layout.empty_flow {
            return Some(0);
        }
        if let Some(span) = layout.inline_span {
            return Some(self.inline_items(span).len());
        }
        Some(layout.elements.len())
    }

    /// Element text with the `- ` marker and element indentation stripped.
    pub fn array_element(&self, name: &str, index: usize) -> Option<String> {
        let layout = self.array_layout(name)?;
        if let Some(span) = layout.inline_span {
            let items = self.inline_items(span);
            let (a, b) = *items.get(index)?;
            return Some(self.raw[a..b].to_string());
        }
        let (start, end) = *layout.elements.get(index)?;
        Some(self.dedent_element(start, end, layout.elem_indent))
    }

    /// All element texts, normalized as by [`Block::array_element`].
    pub fn array_elements(&self, name: &str) -> Vec<String> {
        let Some(layout) = self.array_layout(name) else {
            return Vec::new();
        };
        if let Some(span) = layout.inline_span {
            return self
                .inline_items(span)
                .iter()
                .map(|&(a, b)| self.raw[a..b].to_string())
                .collect();
        }
        layout
            .elements
            .iter()
            .map(|&(s, e)| self.dedent_element(s, e, layout.elem_indent))
            .collect()
    }

    fn dedent_element(&self, start: usize, end: usize, elem_indent: usize) -> String {
        let text = &self.raw[start..end];
        let mut out = String::new();
        for (i, line) in text.trim_end_matches('\n').split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
            }
            if i == 0 {
                out.push_str(line.trim_start_matches(' ').trim_start_matches("- "));
            } else if line.len() >= elem_indent + 2 {
                out.push_str(&line[elem_indent + 2..]);
            } else {
                out.push_str(line.trim_start_matches(' '));
            }
        }
        out
    }

    fn render_element(value: &str, elem_indent: usize) -> String {
        let indent = " ".repeat(elem_indent);
        let cont = " ".repeat(elem_indent + 2);
        let mut out = String::new();
        for (i, line) in value.split('\n').enumerate() {
            if i == 0 {
                out.push_str(&format!("{indent}- {line}\n"));
            } else {
                out.push_str(&format!("{cont}{line}\n"));
            }
        }
        out
    }

    /// Insert an element at `index` (−1 appends). An empty flow `name: []` is
    /// converted to block form first.
    pub fn insert_array_element(&mut self, name: &str, index: i64, value: &str) -> Result<()> {
        let layout = self
            .array_layout(name)
            .ok_or_else(|| EngineError::not_found("array property", name))?;
        if layout.empty_flow {
            let elem = Block::render_element(value, layout.key.indent);
            let insert_at = layout.key.line_end;
            self.raw
                .replace_range(layout.key.value_start..layout.key.content_end, "");
            // the value span shrank; recompute the insert position
            let removed = layout.key.content_end - layout.key.value_start;
            let mut pos = insert_at - removed;
            if pos == self.raw.len() && !self.raw.ends_with('\n') {
                self.raw.push('\n');
                pos = self.raw.len();
            }
            self.raw.insert_str(pos, &elem);
            self.dirty = true;
            return Ok(());
        }
        if let Some(span) = layout.inline_span {
            let items = self.inline_items(span);
            let insertion = if items.is_empty() {
                (span.0 + 1, value.to_string())
            } else if index < 0 || index as usize >= items.len() {
                (items.last().unwrap().1, format!(", {value}"))
            } else {
                (items[index as usize].0, format!("{value}, "))
            };
            self.raw.insert_str(insertion.0, &insertion.1);
            self.dirty = true;
            return Ok(());
        }
        let elem = Block::render_element(value, layout.elem_indent);
        let pos = if index < 0 || index as usize >= layout.elements.len() {
            layout
                .elements
                .last()
                .map(|&(_, e)| e)
                .unwrap_or(layout.key.line_end)
        } else {
            layout.elements[index as usize].0
        };
        self.raw.insert_str(pos, &elem);
        self.dirty = true;
        Ok(())
    }

    /// Remove the i-th element; removing the last element collapses the
    /// sequence back to `name: []`.
    pub fn remove_array_element(&mut self, name: &str, index: usize) -> Result<()> {
        let layout = self
            .array_layout(name)
            .ok_or_else(|| EngineError::not_found("array property", name))?;
        if let Some(span) = layout.inline_span {
            let items = self.inline_items(span);
            if index >= items.len() {
                return Err(EngineError::not_found(
                    "array element",
                    format!("{name}[{index}]"),
                ));
            }
            if items.len() == 1 {
                self.raw.replace_range(span.0..span.1, "[]");
            } else if index + 1 == items.len() {
                self.raw.replace_range(items[index - 1].1..items[index].1, "");
            } else {
                self.raw.replace_range(items[index].0..items[index + 1].0, "");
            }
            self.dirty = true;
            return Ok(());
        }
        if layout.empty_flow || index >= layout.elements.len() {
            return Err(EngineError::not_found(
                "array element",
                format!("{name}[{index}]"),
            ));
        }
        let (start, end) = layout.elements[index];
        self.raw.replace_range(start..end, "");
        if layout.elements.len() == 1 {
            self.raw
                .replace_range(layout.key.value_start..layout.key.content_end, " []");
        }
        self.dirty = true;
        Ok(())
    }

    /// Replace the i-th element's text wholesale.
    pub fn set_array_element(&mut self, name: &str, index: usize, value: &str) -> Result<()> {
        let layout = self
            .array_layout(name)
            .ok_or_else(|| EngineError::not_found("array property", name))?;
        if let Some(span) = layout.inline_span {
            let items = self.inline_items(span);
            let (a, b) = *items.get(index).ok_or_else(|| {
                EngineError::not_found("array element", format!("{name}[{index}]"))
            })?;
            self.raw.replace_range(a..b, value);
            self.dirty = true;
            return Ok(());
        }
        let (start, end) = *layout.elements.get(index).ok_or_else(|| {
            EngineError::not_found("array element", format!("{name}[{index}]"))
        })?;
        let elem = Block::render_element(value, layout.elem_indent);
        self.raw.replace_range(start..end, &elem);
        self.dirty = true;
        Ok(())
    }

    // --- reference handling ---

    /// Every non-null `{fileID: N}` occurrence in the body, in order, with
    /// duplicates preserved. Guid-qualified references are external and are
    /// not included.
    pub fn extract_file_id_refs(&self) -> Vec<String> {
        FILEID_REF_RE
            .captures_iter(&self.raw[self.body_start()..])
            .map(|c| c[1].to_string())
            .filter(|id| id != "0")
            .collect()
    }

    /// Rewrite one file id in the header anchor and in every `{fileID: N}`
    /// body occurrence. The null reference `"0"` is never remapped.
    pub fn remap_file_id(&mut self, old: &str, new: &str) {
        if old == "0" || old == new {
            return;
        }
        let mut changed = false;
        if self.file_id == old {
            let stripped = if self.stripped { " stripped" } else { "" };
            let new_header = format!("--- !u!{} &{}{}", self.class_id, new, stripped);
            let header_end = self.raw.find('\n').unwrap_or(self.raw.len());
            self.raw.replace_range(..header_end, &new_header);
            self.file_id = new.to_string();
            changed = true;
        }
        let needle = format!("{{fileID: {old}}}");
        if self.raw.contains(&needle) {
            self.raw = self.raw.replace(&needle, &format!("{{fileID: {new}}}"));
            changed = true;
        }
        if changed {
            self.dirty = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSFORM_BLOCK: &str = "--- !u!4 &963194228\n\
Transform:\n  m_ObjectHideFlags: 0\n  m_CorrespondingSourceObject: {fileID: 0}\n  m_PrefabInstance: {fileID: 0}\n  m_PrefabAsset: {fileID: 0}\n  m_GameObject: {fileID: 963194227}\n  m_LocalRotation: {x: 0, y: 0, z: 0, w: 1}\n  m_LocalPosition: {x: 0, y: 1, z: -10}\n  m_LocalScale: {x: 1, y: 1, z: 1}\n  m_Children: []\n  m_Father: {fileID: 0}\n  m_RootOrder: 0\n  m_LocalEulerAnglesHint: {x: 0, y: 0, z: 0}\n";

    const LIGHT_BLOCK: &str = "--- !u!108 &705507994\n\
Light:\n  m_ObjectHideFlags: 0\n  m_GameObject: {fileID: 705507993}\n  m_Enabled: 1\n  serializedVersion: 10\n  m_Type: 1\n  m_Shape: 0\n  m_Color: {r: 1, g: 0.95686275, b: 0.8392157, a: 1}\n  m_Intensity: 1\n  m_Shadows:\n    m_Type: 2\n    m_Resolution: -1\n    m_Strength: 1\n  m_RenderingLayerMask: 1\n  m_Lightmapping: 4\n  m_AreaSize: {x: 1, y: 1}\n  m_BounceIntensity: 1\n";

    const GO_BLOCK: &str = "--- !u!1 &963194227\n\
GameObject:\n  m_ObjectHideFlags: 0\n  serializedVersion: 6\n  m_Component:\n  - component: {fileID: 963194228}\n  - component: {fileID: 963194229}\n  - component: {fileID: 963194230}\n  m_Layer: 0\n  m_Name: Main Camera\n  m_TagString: MainCamera\n  m_Icon: {fileID: 0}\n  m_NavMeshLayer: 0\n  m_StaticEditorFlags: 0\n  m_IsActive: 1\n";

    #[test]
    fn test_parse_header() {
        let block = Block::parse(TRANSFORM_BLOCK).unwrap();
        assert_eq!(block.class_id(), 4);
        assert_eq!(block.file_id(), "963194228");
        assert!(!block.is_stripped());
        assert_eq!(block.type_name(), Some("Transform"));
        assert!(!block.is_dirty());
    }

    #[test]
    fn test_parse_stripped_header() {
        let block = Block::parse("--- !u!1 &123 stripped\nGameObject:\n  m_PrefabInstance: {fileID: 9}\n").unwrap();
        assert!(block.is_stripped());
        assert_eq!(block.file_id(), "123");
    }

    #[test]
    fn test_parse_rejects_bad_header() {
        let result = Block::parse("GameObject:\n  m_Name: X\n");
        assert!(matches!(result, Err(EngineError::MalformedDocument { .. })));
    }

    #[test]
    fn test_get_simple_property() {
        let block = Block::parse(GO_BLOCK).unwrap();
        assert_eq!(block.get_property("m_Name").unwrap(), "Main Camera");
        assert_eq!(block.get_property("m_Layer").unwrap(), "0");
        assert!(block.get_property("m_Missing").is_none());
    }

    #[test]
    fn test_get_dotted_inline_property() {
        let block = Block::parse(TRANSFORM_BLOCK).unwrap();
        assert_eq!(block.get_property("m_LocalPosition.y").unwrap(), "1");
        assert_eq!(block.get_property("m_LocalPosition.z").unwrap(), "-10");
        assert_eq!(block.get_property("m_LocalRotation.w").unwrap(), "1");
    }

    #[test]
    fn test_get_dotted_block_property() {
        let block = Block::parse(LIGHT_BLOCK).unwrap();
        assert_eq!(block.get_property("m_Shadows.m_Type").unwrap(), "2");
        assert_eq!(block.get_property("m_Shadows.m_Resolution").unwrap(), "-1");
    }

    #[test]
    fn test_block_walk_does_not_leak_past_parent() {
        // m_Type exists both at the top level and under m_Shadows; the
        // nested lookup must stay inside the m_Shadows window
        let block = Block::parse(LIGHT_BLOCK).unwrap();
        assert_eq!(block.get_property("m_Type").unwrap(), "1");
        assert_eq!(block.get_property("m_Shadows.m_Type").unwrap(), "2");
    }

    #[test]
    fn test_set_simple_property() {
        let mut block = Block::parse(GO_BLOCK).unwrap();
        block.set_property("m_Name", "Player").unwrap();
        assert!(block.raw().contains("\n  m_Name: Player\n"));
        assert!(block.is_dirty());
    }

    #[test]
    fn test_set_inline_subfield_preserves_siblings() {
        let mut block = Block::parse(TRANSFORM_BLOCK).unwrap();
        block.set_property("m_LocalPosition.x", "5").unwrap();
        assert!(block
            .raw()
            .contains("m_LocalPosition: {x: 5, y: 1, z: -10}"));
    }

    #[test]
    fn test_set_block_subfield() {
        let mut block = Block::parse(LIGHT_BLOCK).unwrap();
        block.set_property("m_Shadows.m_Strength", "0.75").unwrap();
        assert!(block.raw().contains("\n    m_Strength: 0.75\n"));
        // sibling untouched
        assert!(block.raw().contains("\n    m_Resolution: -1\n"));
    }

    #[test]
    fn test_property_format_detection() {
        let mut block = Block::parse(LIGHT_BLOCK).unwrap();
        assert_eq!(
            block.property_format("m_Shadows"),
            Some(PropertyFormat::Block)
        );
        assert_eq!(
            block.property_format("m_Color"),
            Some(PropertyFormat::Inline)
        );
        assert!(block.property_format("m_Intensity").is_none());
    }

    #[test]
    fn test_property_shape() {
        let block = Block::parse(TRANSFORM_BLOCK).unwrap();
        assert_eq!(
            block.property_shape("m_GameObject"),
            Some(ValueShape::Reference)
        );
        assert_eq!(
            block.property_shape("m_LocalPosition"),
            Some(ValueShape::InlineStruct)
        );
        assert_eq!(block.property_shape("m_Children"), Some(ValueShape::EmptyArray));
        assert_eq!(block.property_shape("m_RootOrder"), Some(ValueShape::Numeric));

        let light = Block::parse(LIGHT_BLOCK).unwrap();
        assert_eq!(light.property_shape("m_Shadows"), Some(ValueShape::BlockStruct));

        let go = Block::parse(GO_BLOCK).unwrap();
        assert_eq!(
            go.property_shape("m_Component"),
            Some(ValueShape::MultilineArray)
        );
        assert_eq!(go.property_shape("m_TagString"), Some(ValueShape::Text));
    }

    #[test]
    fn test_array_length() {
        let go = Block::parse(GO_BLOCK).unwrap();
        assert_eq!(go.get_array_length("m_Component"), Some(3));
        let tf = Block::parse(TRANSFORM_BLOCK).unwrap();
        assert_eq!(tf.get_array_length("m_Children"), Some(0));
    }

    #[test]
    fn test_array_element_access() {
        let go = Block::parse(GO_BLOCK).unwrap();
        assert_eq!(
            go.array_element("m_Component", 1).unwrap(),
            "component: {fileID: 963194229}"
        );
        assert!(go.array_element("m_Component", 3).is_none());
    }

    #[test]
    fn test_insert_into_empty_array_converts_to_block_form() {
        let mut tf = Block::parse(TRANSFORM_BLOCK).unwrap();
        tf.insert_array_element("m_Children", -1, "{fileID: 111}")
            .unwrap();
        assert!(tf.raw().contains("\n  m_Children:\n  - {fileID: 111}\n"));
        assert_eq!(tf.get_array_length("m_Children"), Some(1));
    }

    #[test]
    fn test_insert_append_and_positional() {
        let mut go = Block::parse(GO_BLOCK).unwrap();
        go.insert_array_element("m_Component", -1, "component: {fileID: 5}")
            .unwrap();
        assert_eq!(go.get_array_length("m_Component"), Some(4));
        assert_eq!(
            go.array_element("m_Component", 3).unwrap(),
            "component: {fileID: 5}"
        );
        go.insert_array_element("m_Component", 0, "component: {fileID: 7}")
            .unwrap();
        assert_eq!(
            go.array_element("m_Component", 0).unwrap(),
            "component: {fileID: 7}"
        );
        assert_eq!(go.get_array_length("m_Component"), Some(5));
    }

    #[test]
    fn test_remove_array_element() {
        let mut go = Block::parse(GO_BLOCK).unwrap();
        go.remove_array_element("m_Component", 1).unwrap();
        assert_eq!(go.get_array_length("m_Component"), Some(2));
        assert!(!go.raw().contains("963194229"));
    }

    #[test]
    fn test_remove_last_element_collapses_to_empty_flow() {
        let mut tf = Block::parse(TRANSFORM_BLOCK).unwrap();
        tf.insert_array_element("m_Children", -1, "{fileID: 111}")
            .unwrap();
        tf.remove_array_element("m_Children", 0).unwrap();
        assert!(tf.raw().contains("\n  m_Children: []\n"));
        // byte-identical to the original apart from nothing at all
        assert_eq!(tf.raw(), TRANSFORM_BLOCK);
    }

    #[test]
    fn test_multiline_array_elements() {
        let pi = "--- !u!1001 &700000\nPrefabInstance:\n  m_Modification:\n    m_TransformParent: {fileID: 0}\n    m_Modifications:\n    - target: {fileID: 100, guid: a1b2c3d4e5f6789012345678abcdef12, type: 3}\n      propertyPath: m_Name\n      value: MyEnemy\n      objectReference: {fileID: 0}\n    - target: {fileID: 400, guid: a1b2c3d4e5f6789012345678abcdef12, type: 3}\n      propertyPath: m_LocalPosition.x\n      value: 5\n      objectReference: {fileID: 0}\n    m_RemovedComponents: []\n  m_SourcePrefab: {fileID: 100100000, guid: a1b2c3d4e5f6789012345678abcdef12, type: 3}\n";
        let block = Block::parse(pi).unwrap();
        assert_eq!(block.get_array_length("m_Modifications"), Some(2));
        let first = block.array_element("m_Modifications", 0).unwrap();
        assert!(first.starts_with("target:"));
        assert!(first.contains("propertyPath: m_Name"));
        assert!(first.contains("value: MyEnemy"));
    }

    #[test]
    fn test_array_index_path() {
        let mr = "--- !u!23 &55\nMeshRenderer:\n  m_Enabled: 1\n  m_Materials:\n  - {fileID: 2100000, guid: 31321ba15b8f8eb4c954353edc038b1d, type: 2}\n  - {fileID: 0}\n  m_ReceiveShadows: 1\n";
        let mut block = Block::parse(mr).unwrap();
        assert_eq!(
            block.get_property("m_Materials.Array.data[1]").unwrap(),
            "{fileID: 0}"
        );
        block
            .set_property("m_Materials.Array.data[1]", "{fileID: 42}")
            .unwrap();
        assert_eq!(
            block.get_property("m_Materials.Array.data[1]").unwrap(),
            "{fileID: 42}"
        );
        assert!(block.raw().contains("31321ba15b8f8eb4c954353edc038b1d"));
    }

    #[test]
    fn test_extract_file_id_refs_skips_null_and_header() {
        let block = Block::parse(TRANSFORM_BLOCK).unwrap();
        let refs = block.extract_file_id_refs();
        assert_eq!(refs, vec!["963194227"]);
    }

    #[test]
    fn test_remap_file_id_rewrites_header_and_body() {
        let mut block = Block::parse(GO_BLOCK).unwrap();
        block.remap_file_id("963194227", "111");
        assert!(block.raw().starts_with("--- !u!1 &111\n"));
        assert_eq!(block.file_id(), "111");
        block.remap_file_id("963194228", "222");
        assert!(block.raw().contains("- component: {fileID: 222}"));
    }

    #[test]
    fn test_remap_null_is_noop() {
        let mut block = Block::parse(TRANSFORM_BLOCK).unwrap();
        let before = block.raw().to_string();
        block.remap_file_id("0", "999");
        assert_eq!(block.raw(), before);
        assert!(!block.is_dirty());
    }

    #[test]
    fn test_remap_does_not_touch_prefixes() {
        // "96" is a prefix of other ids in the block; nothing may change
        let mut block = Block::parse(GO_BLOCK).unwrap();
        let before = block.raw().to_string();
        block.remap_file_id("96", "12");
        assert_eq!(block.raw(), before);
    }

    #[test]
    fn test_clone_is_byte_identical_and_clean() {
        let mut block = Block::parse(GO_BLOCK).unwrap();
        block.set_property("m_Layer", "5").unwrap();
        assert!(block.is_dirty());
        let copy = block.clone();
        assert_eq!(copy.raw(), block.raw());
        assert!(!copy.is_dirty());
    }

    #[test]
    fn test_replace_raw_reparses_header() {
        let mut block = Block::parse(GO_BLOCK).unwrap();
        block.replace_raw(TRANSFORM_BLOCK).unwrap();
        assert_eq!(block.class_id(), 4);
        assert_eq!(block.file_id(), "963194228");
        assert!(block.is_dirty());
    }

    #[test]
    fn test_replace_raw_rejects_bad_header() {
        let mut block = Block::parse(GO_BLOCK).unwrap();
        assert!(block.replace_raw("Transform:\n  m_RootOrder: 0\n").is_err());
        assert_eq!(block.class_id(), 1);
    }

    #[test]
    fn test_set_or_insert_property_appends_missing_key() {
        let mut block = Block::parse("--- !u!1 &5\nGameObject:\n  m_Name: X\n").unwrap();
        block.set_or_insert_property("m_NavMeshLayer", "3").unwrap();
        assert!(block.raw().ends_with("  m_NavMeshLayer: 3\n"));
        block.set_or_insert_property("m_Name", "Y").unwrap();
        assert!(block.raw().contains("\n  m_Name: Y\n"));
    }

    #[test]
    fn test_large_file_id_survives_as_string() {
        let raw = "--- !u!4 &9007199254740993\nTransform:\n  m_GameObject: {fileID: 9007199254740995}\n  m_Father: {fileID: 0}\n";
        let block = Block::parse(raw).unwrap();
        assert_eq!(block.file_id(), "9007199254740993");
        assert_eq!(block.extract_file_id_refs(), vec!["9007199254740995"]);
        let mut b = block.clone();
        b.remap_file_id("9007199254740995", "9007199254740997");
        assert!(b.raw().contains("{fileID: 9007199254740997}"));
    }

    #[test]
    fn test_crlf_normalized_at_construction() {
        let block = Block::parse("--- !u!1 &5\r\nGameObject:\r\n  m_Name: X\r\n").unwrap();
        assert!(!block.raw().contains('\r'));
        assert_eq!(block.get_property("m_Name").unwrap(), "X");
    }
}
