pub mod block;

pub use block::{Block, PropertyFormat, ValueShape};

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::classes;
use crate::common::{random_file_id, read_unity_file, EngineError, Result};
use crate::writer;

static SENTINEL: &str = "--- !u!";

static COMPONENT_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"component: \{fileID: (-?\d+)\}").expect("Invalid regex"));

static FATHER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"m_Father: \{fileID: (-?\d+)\}").expect("Invalid regex"));

static GAMEOBJECT_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"m_GameObject: \{fileID: (-?\d+)\}").expect("Invalid regex"));

static GUID_SCAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"guid: ([0-9a-fA-F]+)").expect("Invalid regex"));

static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^---").expect("Invalid regex"));

/// The root GameObject/Transform pair of a prefab file.
#[derive(Debug, Clone)]
pub struct PrefabRoot {
    pub go_id: String,
    pub transform_id: String,
    pub name: String,
}

/// A loaded Unity YAML file: optional directive header plus an ordered list
/// of blocks, with an O(1) file-id index maintained alongside.
///
/// Immediately after a load, `header + concat(block.raw)` equals the on-disk
/// content byte for byte (modulo CRLF normalization); untouched blocks stay
/// byte-identical through any sequence of edits.
#[derive(Debug)]
pub struct Document {
    path: Option<PathBuf>,
    header: String,
    blocks: Vec<Block>,
    index: HashMap<String, usize>,
    structure_dirty: bool,
}

impl Document {
    /// Parse a document from text, splitting on line-anchored `--- !u!`
    /// separators. Everything before the first separator is the header.
    pub fn from_string(text: &str, validate: bool) -> Result<Document> {
        let text = if text.contains('\r') {
            text.replace("\r\n", "\n")
        } else {
            text.to_string()
        };
        let bytes = text.as_bytes();
        let mut starts: Vec<usize> = Vec::new();
        let mut pos = 0;
        while let Some(i) = text[pos..].find(SENTINEL) {
            let at = pos + i;
            if at == 0 || bytes[at - 1] == b'\n' {
                starts.push(at);
            }
            pos = at + SENTINEL.len();
        }
        let header = match starts.first() {
            Some(&first) => text[..first].to_string(),
            None => text.clone(),
        };
        let mut blocks = Vec::with_capacity(starts.len());
        for (i, &start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            blocks.push(Block::parse(&text[start..end])?);
        }
        let mut doc = Document {
            path: None,
            header,
            blocks,
            index: HashMap::new(),
            structure_dirty: false,
        };
        doc.rebuild_index();
        if validate {
            doc.validate()?;
        }
        Ok(doc)
    }

    /// Load a document from disk.
    pub fn from_file<P: AsRef<Path>>(path: P, validate: bool) -> Result<Document> {
        let content = read_unity_file(path.as_ref())?;
        let mut doc = Document::from_string(&content, validate)?;
        doc.path = Some(path.as_ref().to_path_buf());
        Ok(doc)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn is_structure_dirty(&self) -> bool {
        self.structure_dirty
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, block) in self.blocks.iter().enumerate() {
            if block.file_id() != "0" {
                self.index.insert(block.file_id().to_string(), i);
            }
        }
    }

    // --- lookup ---

    pub fn find_by_file_id(&self, file_id: &str) -> Option<&Block> {
        self.index.get(file_id).map(|&i| &self.blocks[i])
    }

    pub fn find_by_file_id_mut(&mut self, file_id: &str) -> Option<&mut Block> {
        let i = *self.index.get(file_id)?;
        Some(&mut self.blocks[i])
    }

    pub fn contains_file_id(&self, file_id: &str) -> bool {
        self.index.contains_key(file_id)
    }

    pub fn find_by_class_id(&self, class_id: u32) -> Vec<&Block> {
        self.blocks
            .iter()
            .filter(|b| b.class_id() == class_id)
            .collect()
    }

    /// All class-1 blocks whose `m_Name` line equals the given name.
    pub fn find_game_objects_by_name(&self, name: &str) -> Vec<&Block> {
        let pattern =
            Regex::new(&format!(r"(?m)^\s*m_Name: {}$", regex::escape(name))).expect("Invalid regex");
        self.blocks
            .iter()
            .filter(|b| b.class_id() == classes::GAME_OBJECT && pattern.is_match(b.raw()))
            .collect()
    }

    /// Transform file ids of every GameObject with the given name (the first
    /// entry of each `m_Component` list).
    pub fn find_transforms_by_name(&self, name: &str) -> Vec<String> {
        self.find_game_objects_by_name(name)
            .iter()
            .filter_map(|go| Self::first_component_of(go))
            .collect()
    }

    pub fn first_component_of(go: &Block) -> Option<String> {
        COMPONENT_REF_RE
            .captures(go.raw())
            .map(|c| c[1].to_string())
    }

    /// Every component file id listed in a GameObject's `m_Component`.
    pub fn component_ids_of(&self, go_id: &str) -> Vec<String> {
        let Some(go) = self.find_by_file_id(go_id) else {
            return Vec::new();
        };
        COMPONENT_REF_RE
            .captures_iter(go.raw())
            .map(|c| c[1].to_string())
            .collect()
    }

    /// Resolve an argument that is either a GameObject file id (all digits)
    /// or a GameObject name that must be unique in the document.
    pub fn require_unique_game_object(&self, arg: &str) -> Result<String> {
        if !arg.is_empty() && arg.chars().all(|c| c.is_ascii_digit()) {
            let block = self
                .find_by_file_id(arg)
                .ok_or_else(|| EngineError::not_found("GameObject", arg))?;
            if block.class_id() != classes::GAME_OBJECT {
                return Err(EngineError::not_found_hint(
                    "GameObject",
                    arg,
                    format!("fileID {arg} is class {}, not a GameObject", block.class_id()),
                ));
            }
            return Ok(arg.to_string());
        }
        let matches = self.find_game_objects_by_name(arg);
        match matches.len() {
            0 => Err(EngineError::not_found_hint(
                "GameObject",
                arg,
                "no m_Name line matches; check spelling and case",
            )),
            1 => Ok(matches[0].file_id().to_string()),
            _ => Err(EngineError::AmbiguousName {
                name: arg.to_string(),
                candidates: matches.iter().map(|b| b.file_id().to_string()).collect(),
            }),
        }
    }

    /// Resolve an argument to a Transform file id: a Transform/RectTransform
    /// id passes through, a GameObject id or unique name dereferences to its
    /// first component.
    pub fn require_unique_transform(&self, arg: &str) -> Result<String> {
        if !arg.is_empty() && arg.chars().all(|c| c.is_ascii_digit()) {
            let block = self
                .find_by_file_id(arg)
                .ok_or_else(|| EngineError::not_found("Transform", arg))?;
            if classes::is_hierarchy_provider(block.class_id()) {
                return Ok(arg.to_string());
            }
            if block.class_id() == classes::GAME_OBJECT {
                return self.transform_of_game_object(arg);
            }
            return Err(EngineError::not_found_hint(
                "Transform",
                arg,
                format!(
                    "fileID {arg} is class {}, not a Transform or GameObject",
                    block.class_id()
                ),
            ));
        }
        let go_id = self.require_unique_game_object(arg)?;
        self.transform_of_game_object(&go_id)
    }

    /// First component of a GameObject, which Unity guarantees to be its
    /// Transform (or RectTransform).
    pub fn transform_of_game_object(&self, go_id: &str) -> Result<String> {
        let go = self
            .find_by_file_id(go_id)
            .ok_or_else(|| EngineError::not_found("GameObject", go_id))?;
        let first = Self::first_component_of(go).ok_or_else(|| {
            EngineError::not_found_hint("Transform", go_id, "GameObject has no components")
        })?;
        match self.find_by_file_id(&first) {
            Some(b) if classes::is_hierarchy_provider(b.class_id()) => Ok(first),
            Some(b) => Err(EngineError::policy(format!(
                "first component of GameObject {go_id} is class {}, expected a Transform",
                b.class_id()
            ))),
            None => Err(EngineError::not_found("Transform", first)),
        }
    }

    /// Owning GameObject of a component or Transform.
    pub fn game_object_of(&self, component_id: &str) -> Option<String> {
        let block = self.find_by_file_id(component_id)?;
        GAMEOBJECT_REF_RE
            .captures(block.raw())
            .map(|c| c[1].to_string())
            .filter(|id| id != "0")
    }

    /// Parent Transform id from `m_Father`, `"0"` for roots.
    pub fn parent_of(&self, transform_id: &str) -> Option<String> {
        let block = self.find_by_file_id(transform_id)?;
        FATHER_RE.captures(block.raw()).map(|c| c[1].to_string())
    }

    /// Child Transform ids from `m_Children`, in order.
    pub fn children_of(&self, transform_id: &str) -> Vec<String> {
        let Some(block) = self.find_by_file_id(transform_id) else {
            return Vec::new();
        };
        let id_re = Regex::new(r"\{fileID: (-?\d+)\}").expect("Invalid regex");
        block
            .array_elements("m_Children")
            .iter()
            .filter_map(|e| id_re.captures(e).map(|c| c[1].to_string()))
            .filter(|id| id != "0")
            .collect()
    }

    /// The root GameObject/Transform pair of a prefab: the first non-stripped
    /// Transform with no father. Variant prefabs have no full root; fall back
    /// to the first stripped pair, named from the PrefabInstance.
    pub fn find_prefab_root(&self) -> Result<PrefabRoot> {
        for block in &self.blocks {
            if !classes::is_hierarchy_provider(block.class_id()) || block.is_stripped() {
                continue;
            }
            let tf_id = block.file_id().to_string();
            if self.parent_of(&tf_id).as_deref() == Some("0") {
                let go_id = self.game_object_of(&tf_id).ok_or_else(|| {
                    EngineError::not_found("root GameObject", tf_id.clone())
                })?;
                let name = self
                    .find_by_file_id(&go_id)
                    .and_then(|b| b.get_property("m_Name"))
                    .unwrap_or_default();
                return Ok(PrefabRoot {
                    go_id,
                    transform_id: tf_id,
                    name,
                });
            }
        }
        let go = self
            .blocks
            .iter()
            .find(|b| b.class_id() == classes::GAME_OBJECT && b.is_stripped());
        let tf = self
            .blocks
            .iter()
            .find(|b| classes::is_hierarchy_provider(b.class_id()) && b.is_stripped());
        match (go, tf) {
            (Some(go), Some(tf)) => {
                let name = self
                    .find_by_class_id(classes::PREFAB_INSTANCE)
                    .first()
                    .copied()
                    .and_then(prefab_instance_name)
                    .unwrap_or_else(|| "Variant".to_string());
                Ok(PrefabRoot {
                    go_id: go.file_id().to_string(),
                    transform_id: tf.file_id().to_string(),
                    name,
                })
            }
            _ => Err(EngineError::not_found_hint(
                "prefab root",
                self.path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<memory>".to_string()),
                "no root Transform with m_Father: {fileID: 0} and no stripped pair",
            )),
        }
    }

    // --- id management ---

    pub fn all_file_ids(&self) -> Vec<String> {
        self.blocks
            .iter()
            .map(|b| b.file_id().to_string())
            .filter(|id| id != "0")
            .collect()
    }

    /// Draw a fresh 10-digit file id that collides with nothing in the
    /// document.
    pub fn generate_file_id(&self) -> String {
        loop {
            let id = random_file_id();
            if id != "0" && !self.index.contains_key(&id) {
                return id;
            }
        }
    }

    // --- structural mutation ---

    pub fn append_block(&mut self, block: Block) {
        if block.file_id() != "0" {
            self.index
                .insert(block.file_id().to_string(), self.blocks.len());
        }
        self.blocks.push(block);
        self.structure_dirty = true;
    }

    pub fn append_raw(&mut self, text: &str) -> Result<()> {
        let block = Block::parse(text)?;
        self.append_block(block);
        Ok(())
    }

    pub fn remove_block(&mut self, file_id: &str) -> Result<Block> {
        let i = *self
            .index
            .get(file_id)
            .ok_or_else(|| EngineError::not_found("block", file_id))?;
        let removed = self.blocks.remove(i);
        self.rebuild_index();
        self.structure_dirty = true;
        Ok(removed)
    }

    /// Remove every block whose file id is in the set; returns how many were
    /// removed.
    pub fn remove_blocks(&mut self, ids: &HashSet<String>) -> usize {
        let before = self.blocks.len();
        self.blocks.retain(|b| !ids.contains(b.file_id()));
        let removed = before - self.blocks.len();
        if removed > 0 {
            self.rebuild_index();
            self.structure_dirty = true;
        }
        removed
    }

    /// Rewrite one file id across every block: header anchors and all
    /// `{fileID: N}` body references. `"0"` is never remapped.
    pub fn remap_references(&mut self, old: &str, new: &str) {
        if old == "0" || old == new {
            return;
        }
        let mut header_changed = false;
        for block in &mut self.blocks {
            let was = block.file_id() == old;
            block.remap_file_id(old, new);
            header_changed |= was;
        }
        if header_changed {
            self.rebuild_index();
            self.structure_dirty = true;
        }
    }

    pub fn replace_block(&mut self, index: usize, block: Block) -> Result<()> {
        if index >= self.blocks.len() {
            return Err(EngineError::not_found("block index", index.to_string()));
        }
        self.blocks[index] = block;
        self.rebuild_index();
        self.structure_dirty = true;
        Ok(())
    }

    // --- hierarchy maintenance ---

    /// Register a child Transform in its parent's `m_Children`, converting
    /// `m_Children: []` to block form when needed.
    pub fn add_child_to_parent(&mut self, parent_id: &str, child_id: &str) -> Result<()> {
        let parent = self
            .find_by_file_id_mut(parent_id)
            .ok_or_else(|| EngineError::not_found("parent Transform", parent_id))?;
        parent.insert_array_element("m_Children", -1, &format!("{{fileID: {child_id}}}"))
    }

    /// Drop a child Transform from its parent's `m_Children`; an emptied
    /// list collapses back to `[]`.
    pub fn remove_child_from_parent(&mut self, parent_id: &str, child_id: &str) -> Result<()> {
        let needle = format!("{{fileID: {child_id}}}");
        let parent = self
            .find_by_file_id_mut(parent_id)
            .ok_or_else(|| EngineError::not_found("parent Transform", parent_id))?;
        let elements = parent.array_elements("m_Children");
        let idx = elements
            .iter()
            .position(|e| e.contains(&needle))
            .ok_or_else(|| {
                EngineError::not_found_hint(
                    "child transform",
                    child_id,
                    format!("not listed in m_Children of {parent_id}"),
                )
            })?;
        parent.remove_array_element("m_Children", idx)
    }

    /// Breadth-first closure of a Transform's descendants: every child
    /// Transform, its GameObject, and all of that GameObject's components.
    /// The starting Transform itself is not included.
    pub fn collect_hierarchy(&self, transform_id: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = self.children_of(transform_id).into();
        while let Some(tf_id) = queue.pop_front() {
            if !seen.insert(tf_id.clone()) {
                continue;
            }
            out.push(tf_id.clone());
            if let Some(go_id) = self.game_object_of(&tf_id) {
                if seen.insert(go_id.clone()) {
                    out.push(go_id.clone());
                }
                for comp in self.component_ids_of(&go_id) {
                    if seen.insert(comp.clone()) {
                        out.push(comp);
                    }
                }
            }
            for child in self.children_of(&tf_id) {
                queue.push_back(child);
            }
        }
        debug!(transform_id, count = out.len(), "collected hierarchy closure");
        out
    }

    /// Sibling index a newly inserted Transform should receive under the
    /// given parent (`"0"` for the scene root).
    pub fn calculate_root_order(&self, parent_id: &str) -> usize {
        if parent_id == "0" {
            return self
                .blocks
                .iter()
                .filter(|b| {
                    classes::is_hierarchy_provider(b.class_id())
                        && !b.is_stripped()
                        && self.parent_of(b.file_id()).as_deref() == Some("0")
                })
                .count();
        }
        self.children_of(parent_id).len()
    }

    // --- validation and persistence ---

    /// Structural checks: directive header present, no truncated GUIDs, and
    /// no stray `---` separators that are not Unity block headers.
    pub fn validate(&self) -> Result<()> {
        if !self.header.starts_with("%YAML 1.1") {
            return Err(EngineError::ValidationFailed {
                detail: "header does not start with %YAML 1.1".to_string(),
            });
        }
        let text = self.serialize();
        for caps in GUID_SCAN_RE.captures_iter(&text) {
            let hex = &caps[1];
            if (1..=29).contains(&hex.len()) {
                return Err(EngineError::ValidationFailed {
                    detail: format!("truncated guid '{hex}' ({} hex chars, expected 32)", hex.len()),
                });
            }
        }
        let stray = SEPARATOR_RE
            .find_iter(&text)
            .filter(|m| !text[m.start()..].starts_with(SENTINEL))
            .count();
        if stray > 1 {
            return Err(EngineError::ValidationFailed {
                detail: format!("{stray} separator lines are not Unity block headers"),
            });
        }
        Ok(())
    }

    /// Header plus every block's raw text, in order.
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(
            self.header.len() + self.blocks.iter().map(|b| b.raw().len()).sum::<usize>(),
        );
        out.push_str(&self.header);
        for block in &self.blocks {
            out.push_str(block.raw());
        }
        out
    }

    /// Persist atomically to the given path (or the path the document was
    /// loaded from). Returns the number of bytes written.
    pub fn save(&mut self, path: Option<&Path>) -> Result<u64> {
        let target = path
            .map(Path::to_path_buf)
            .or_else(|| self.path.clone())
            .ok_or_else(|| EngineError::Unavailable {
                what: "save path".to_string(),
                hint: "document was built in memory; pass an explicit path".to_string(),
            })?;
        let content = self.serialize();
        let bytes = writer::write_atomic(&target, &content)?;
        self.path = Some(target);
        for block in &mut self.blocks {
            block.mark_clean();
        }
        self.structure_dirty = false;
        Ok(bytes)
    }
}

/// Display name of a PrefabInstance: the value of its `m_Name` modification
/// entry, when one exists.
///
/// Walks the `m_Modifications` quadruples as array elements; within each
/// element the `propertyPath:` line precedes the `value:` line it governs.
pub fn prefab_instance_name(block: &Block) -> Option<String> {
    block
        .array_elements("m_Modifications")
        .iter()
        .find_map(|entry| {
            let mut targets_name = false;
            let mut value = None;
            for line in entry.lines() {
                if let Some(path) = line.strip_prefix("propertyPath:") {
                    targets_name = path.trim() == "m_Name";
                } else if let Some(v) = line.strip_prefix("value:") {
                    value = Some(v.trim().to_string());
                }
            }
            value.filter(|v| targets_name && !v.is_empty())
        })
}
