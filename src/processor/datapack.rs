//! The assembly target: everything lowering produces besides call-site lines.
//!
//! One `DataPack` lives for one compilation run. Intrinsics and the dispatch
//! lowering mutate it in source order; the writer reads it at the end.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tracing::trace;

/// Folder every generated helper block lives under.
pub const PRIVATE_ROOT: &str = "__private__";
/// Objective holding `$variables`.
pub const VARIABLE_OBJECTIVE: &str = "__variable__";
pub const VARIABLE_SIGN: char = '$';

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockId {
    Index(u32),
    /// Singleton block such as `main`.
    Named(String),
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockId::Index(n) => write!(f, "{n}"),
            BlockId::Named(name) => f.write_str(name),
        }
    }
}

impl From<u32> for BlockId {
    fn from(n: u32) -> Self {
        BlockId::Index(n)
    }
}

impl From<&str> for BlockId {
    fn from(name: &str) -> Self {
        BlockId::Named(name.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockKey {
    pub feature: String,
    pub id: BlockId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub item_type: String,
    /// Serialized structured-data payload.
    pub nbt: String,
}

/// `<type><nbt>`, as accepted by `give` and `item replace`.
impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.item_type, self.nbt)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DataPack {
    namespace: String,
    blocks: BTreeMap<BlockKey, Vec<String>>,
    counters: HashMap<String, u32>,
    objectives: BTreeMap<String, String>,
    tick: Vec<String>,
    load: Vec<String>,
    used: HashSet<String>,
    documents: BTreeMap<(String, String), Value>,
    items: BTreeMap<String, Item>,
    item_tags: u32,
}

impl DataPack {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Declares an objective; repeated declarations are no-ops.
    pub fn add_objective(&mut self, name: &str, criteria: &str) {
        self.objectives
            .entry(name.to_string())
            .or_insert_with(|| criteria.to_string());
    }

    /// Returns the feature's next fresh block id.
    pub fn allocate_block_id(&mut self, feature: &str) -> u32 {
        let counter = self.counters.entry(feature.to_string()).or_insert(0);
        let id = *counter;
        *counter += 1;
        trace!(feature, id, "allocated block id");
        id
    }

    /// Append handle to a block, created empty on first access.
    pub fn block_mut(&mut self, feature: &str, id: impl Into<BlockId>) -> &mut Vec<String> {
        self.blocks
            .entry(BlockKey {
                feature: feature.to_string(),
                id: id.into(),
            })
            .or_default()
    }

    pub fn block(&self, feature: &str, id: impl Into<BlockId>) -> Option<&[String]> {
        self.blocks
            .get(&BlockKey {
                feature: feature.to_string(),
                id: id.into(),
            })
            .map(Vec::as_slice)
    }

    /// Stores `lines` as a block and returns the command that calls it.
    /// Without an id a fresh one is allocated.
    pub fn add_private_function(
        &mut self,
        feature: &str,
        lines: Vec<String>,
        id: Option<BlockId>,
    ) -> String {
        let id = id.unwrap_or_else(|| BlockId::Index(self.allocate_block_id(feature)));
        let call = self.call_function(feature, &id);
        self.blocks.insert(
            BlockKey {
                feature: feature.to_string(),
                id,
            },
            lines,
        );
        call
    }

    /// `<ns>:__private__/<feature>/<id>`
    pub fn private_path(&self, feature: &str, id: &BlockId) -> String {
        format!("{}:{PRIVATE_ROOT}/{feature}/{id}", self.namespace)
    }

    pub fn call_function(&self, feature: &str, id: &BlockId) -> String {
        format!("function {}", self.private_path(feature, id))
    }

    /// True exactly once per identity.
    pub fn first_use(&mut self, identity: &str) -> bool {
        self.used.insert(identity.to_string())
    }

    pub fn add_tick(&mut self, line: impl Into<String>) {
        self.tick.push(line.into());
    }

    pub fn add_load(&mut self, line: impl Into<String>) {
        self.load.push(line.into());
    }

    pub fn put_document(&mut self, category: &str, name: &str, doc: Value) {
        self.documents
            .insert((category.to_string(), name.to_string()), doc);
    }

    pub fn document(&self, category: &str, name: &str) -> Option<&Value> {
        self.documents
            .get(&(category.to_string(), name.to_string()))
    }

    pub fn put_item(&mut self, id: &str, item: Item) {
        self.items.insert(id.to_string(), item);
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    /// Numeric tag identifying a clickable item; starts at 1.
    pub fn allocate_item_tag(&mut self) -> u32 {
        self.item_tags += 1;
        self.item_tags
    }

    pub fn blocks(&self) -> &BTreeMap<BlockKey, Vec<String>> {
        &self.blocks
    }

    pub fn objectives(&self) -> &BTreeMap<String, String> {
        &self.objectives
    }

    pub fn tick(&self) -> &[String] {
        &self.tick
    }

    pub fn load(&self) -> &[String] {
        &self.load
    }

    pub fn documents(&self) -> &BTreeMap<(String, String), Value> {
        &self.documents
    }

    pub fn items(&self) -> &BTreeMap<String, Item> {
        &self.items
    }
}
