//! Editable attribute tree backing the mapping step.
//!
//! Nodes live in an arena and are addressed by [`AttributeId`], assigned once
//! when the editor is seeded. Ids stay valid for the lifetime of the editor
//! because the tree shape never changes after seeding; only values and mapped
//! flags do.

use crate::invoice::model::{Attribute, Position};
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Root attributes shown in the mapping table
pub const DEFAULT_MAPPING_FIELDS: &[&str] = &[
    "VendorName",
    "VendorTaxId",
    "VendorAddress",
    "InvoiceId",
    "InvoiceDate",
    "PurchaseOrder",
    "PurchaseOrderDate",
    "ShippingAddressRecipient",
    "ShippingAddress",
    "CustomerAddressRecipient",
    "CustomerAddress",
    "VendorAddressRecipient",
    "InvoiceTotal",
    "InvoiceTotalInWords",
    "CustomerTaxId",
];

/// Line item fields shown in the children dialog
pub const DEFAULT_ITEM_FIELDS: &[&str] = &[
    "Description",
    "ProductCode",
    "Quantity",
    "Unit",
    "UnitPrice",
    "Amount",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("unknown attribute {0}")]
    UnknownAttribute(String),
    #[error("attribute '{0}' has nested items and no editable value")]
    NotALeaf(String),
    #[error("attribute '{0}' has no nested items")]
    NoChildren(String),
    #[error("invalid attribute selector '{0}' (expected Name or Parent[index].Child)")]
    InvalidSelector(String),
}

/// Allow-lists that decide which attributes the mapping step cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRules {
    pub allowed_fields: Vec<String>,
    pub allowed_item_fields: Vec<String>,
}

impl Default for MappingRules {
    fn default() -> Self {
        Self {
            allowed_fields: DEFAULT_MAPPING_FIELDS.iter().map(|s| s.to_string()).collect(),
            allowed_item_fields: DEFAULT_ITEM_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl MappingRules {
    pub fn is_allowed(&self, name: &str) -> bool {
        self.allowed_fields.iter().any(|f| f == name)
    }

    pub fn is_allowed_item_field(&self, name: &str) -> bool {
        self.allowed_item_fields.iter().any(|f| f == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeId(usize);

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Human-facing address of an attribute, resolved to an [`AttributeId`] once.
///
/// `InvoiceDate` names a root attribute; `Items[1]` names the second child of
/// the root `Items`; `Items[1].Amount` names the `Amount` field of that child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeSelector {
    Root(String),
    Child { parent: String, index: usize },
    Field { parent: String, index: usize, field: String },
}

static SELECTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\[\]\.]+?)(?:\[(\d+)\](?:\.([^\[\]\.]+))?)?$").expect("selector regex is valid")
});

impl FromStr for AttributeSelector {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let caps = SELECTOR_RE
            .captures(trimmed)
            .ok_or_else(|| EditorError::InvalidSelector(s.to_string()))?;

        let name = caps[1].trim().to_string();
        let index = match caps.get(2) {
            Some(m) => m
                .as_str()
                .parse::<usize>()
                .map_err(|_| EditorError::InvalidSelector(s.to_string()))?,
            None => return Ok(AttributeSelector::Root(name)),
        };

        Ok(match caps.get(3) {
            Some(field) => AttributeSelector::Field {
                parent: name,
                index,
                field: field.as_str().trim().to_string(),
            },
            None => AttributeSelector::Child { parent: name, index },
        })
    }
}

impl fmt::Display for AttributeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeSelector::Root(name) => write!(f, "{name}"),
            AttributeSelector::Child { parent, index } => write!(f, "{parent}[{index}]"),
            AttributeSelector::Field { parent, index, field } => {
                write!(f, "{parent}[{index}].{field}")
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    value: Option<String>,
    mapped: bool,
    position: Vec<Position>,
    extra: Map<String, Value>,
    parent: Option<AttributeId>,
    children: Vec<AttributeId>,
}

/// Read-only view of one node
#[derive(Debug, Clone, Copy)]
pub struct AttributeRef<'a> {
    id: AttributeId,
    node: &'a Node,
}

impl<'a> AttributeRef<'a> {
    pub fn id(&self) -> AttributeId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        &self.node.name
    }

    pub fn value(&self) -> Option<&'a str> {
        self.node.value.as_deref()
    }

    pub fn is_mapped(&self) -> bool {
        self.node.mapped
    }

    pub fn positions(&self) -> &'a [Position] {
        &self.node.position
    }

    pub fn children(&self) -> &'a [AttributeId] {
        &self.node.children
    }

    pub fn parent(&self) -> Option<AttributeId> {
        self.node.parent
    }

    pub fn is_leaf(&self) -> bool {
        self.node.children.is_empty()
    }
}

/// Nested items of one parent, opened for editing in a dialog.
///
/// The parent id is captured when the dialog opens, so later edits keep
/// targeting the same items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildrenDialog {
    parent: AttributeId,
}

/// One row of an open children dialog
#[derive(Debug, Clone, PartialEq)]
pub struct DialogRow {
    pub id: AttributeId,
    pub name: String,
    pub value: Option<String>,
    pub mapped: bool,
    /// Allow-listed fields of this item, in tree order
    pub fields: Vec<AttributeId>,
}

impl ChildrenDialog {
    pub fn parent(&self) -> AttributeId {
        self.parent
    }

    pub fn rows(&self, editor: &AttributeEditor) -> Vec<DialogRow> {
        let Some(parent) = editor.get(self.parent) else {
            return Vec::new();
        };
        parent
            .children()
            .iter()
            .filter_map(|&child| editor.get(child))
            .map(|child| DialogRow {
                id: child.id(),
                name: child.name().to_string(),
                value: child.value().map(str::to_string),
                mapped: child.is_mapped(),
                fields: child
                    .children()
                    .iter()
                    .copied()
                    .filter(|&field| {
                        editor
                            .get(field)
                            .map(|f| editor.rules.is_allowed_item_field(f.name()))
                            .unwrap_or(false)
                    })
                    .collect(),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct AttributeEditor {
    nodes: Vec<Node>,
    roots: Vec<AttributeId>,
    rules: MappingRules,
}

impl AttributeEditor {
    /// Seed the editor from an invoice's attribute tree
    pub fn new(attributes: &[Attribute], rules: MappingRules) -> Self {
        let mut editor = Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            rules,
        };
        for attribute in attributes {
            let id = editor.insert(attribute, None);
            editor.roots.push(id);
        }
        editor
    }

    fn insert(&mut self, attribute: &Attribute, parent: Option<AttributeId>) -> AttributeId {
        let id = AttributeId(self.nodes.len());
        self.nodes.push(Node {
            name: attribute.attribute_name.clone(),
            value: attribute.attribute_value.clone(),
            mapped: attribute.is_attribute_mapped,
            position: attribute.position.clone(),
            extra: attribute.extra.clone(),
            parent,
            children: Vec::new(),
        });
        let children: Vec<AttributeId> = attribute
            .children
            .iter()
            .map(|child| self.insert(child, Some(id)))
            .collect();
        self.nodes[id.0].children = children;
        id
    }

    pub fn rules(&self) -> &MappingRules {
        &self.rules
    }

    pub fn roots(&self) -> &[AttributeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: AttributeId) -> Option<AttributeRef<'_>> {
        self.nodes.get(id.0).map(|node| AttributeRef { id, node })
    }

    /// Every node, parents before their children
    pub fn iter(&self) -> impl Iterator<Item = AttributeRef<'_>> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| AttributeRef { id: AttributeId(i), node })
    }

    /// Root attributes the mapping table shows: allow-listed names and parents
    pub fn visible_roots(&self) -> Vec<AttributeRef<'_>> {
        self.roots
            .iter()
            .filter_map(|&id| self.get(id))
            .filter(|attr| self.rules.is_allowed(attr.name()) || !attr.is_leaf())
            .collect()
    }

    pub fn find_root(&self, name: &str) -> Option<AttributeId> {
        self.roots
            .iter()
            .copied()
            .find(|&id| self.nodes[id.0].name == name)
    }

    pub fn resolve(&self, selector: &AttributeSelector) -> Result<AttributeId, EditorError> {
        let unknown = || EditorError::UnknownAttribute(selector.to_string());
        match selector {
            AttributeSelector::Root(name) => self.find_root(name).ok_or_else(unknown),
            AttributeSelector::Child { parent, index } => {
                let parent = self.find_root(parent).ok_or_else(unknown)?;
                self.nodes[parent.0]
                    .children
                    .get(*index)
                    .copied()
                    .ok_or_else(unknown)
            }
            AttributeSelector::Field { parent, index, field } => {
                let parent = self.find_root(parent).ok_or_else(unknown)?;
                let item = self.nodes[parent.0]
                    .children
                    .get(*index)
                    .copied()
                    .ok_or_else(unknown)?;
                self.nodes[item.0]
                    .children
                    .iter()
                    .copied()
                    .find(|&c| self.nodes[c.0].name == *field)
                    .ok_or_else(unknown)
            }
        }
    }

    fn node_mut(&mut self, id: AttributeId) -> Result<&mut Node, EditorError> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| EditorError::UnknownAttribute(id.to_string()))
    }

    /// Replace the value of a leaf attribute
    pub fn set_value(&mut self, id: AttributeId, value: impl Into<String>) -> Result<(), EditorError> {
        let node = self.node_mut(id)?;
        if !node.children.is_empty() {
            return Err(EditorError::NotALeaf(node.name.clone()));
        }
        node.value = Some(value.into());
        tracing::debug!(attribute = %node.name, "attribute value edited");
        Ok(())
    }

    /// Confirm a leaf, as when the user leaves its edit field
    pub fn confirm(&mut self, id: AttributeId) -> Result<(), EditorError> {
        let node = self.node_mut(id)?;
        if !node.children.is_empty() {
            return Err(EditorError::NotALeaf(node.name.clone()));
        }
        node.mapped = true;
        Ok(())
    }

    /// Set a node's mapped flag; a parent pushes the flag down to every descendant
    pub fn set_mapped(&mut self, id: AttributeId, mapped: bool) -> Result<(), EditorError> {
        self.node_mut(id)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current.0];
            node.mapped = mapped;
            stack.extend(node.children.iter().copied());
        }
        Ok(())
    }

    /// Flip a node's mapped flag and return the new value
    pub fn toggle_mapped(&mut self, id: AttributeId) -> Result<bool, EditorError> {
        let mapped = !self.node_mut(id)?.mapped;
        self.set_mapped(id, mapped)?;
        Ok(mapped)
    }

    pub fn select_all(&mut self, checked: bool) {
        for node in &mut self.nodes {
            node.mapped = checked;
        }
    }

    pub fn open_children(&self, id: AttributeId) -> Result<ChildrenDialog, EditorError> {
        let attr = self
            .get(id)
            .ok_or_else(|| EditorError::UnknownAttribute(id.to_string()))?;
        if attr.is_leaf() {
            return Err(EditorError::NoChildren(attr.name().to_string()));
        }
        Ok(ChildrenDialog { parent: id })
    }

    /// Every descendant of `id`, depth-first
    pub fn descendants(&self, id: AttributeId) -> Vec<AttributeId> {
        let mut out = Vec::new();
        let mut stack: Vec<AttributeId> = match self.nodes.get(id.0) {
            Some(node) => node.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        out
    }

    /// Names of allow-listed root attributes still waiting for confirmation
    pub fn unmapped_required(&self) -> Vec<String> {
        self.roots
            .iter()
            .map(|&id| &self.nodes[id.0])
            .filter(|node| self.rules.is_allowed(&node.name) && !node.mapped)
            .map(|node| node.name.clone())
            .collect()
    }

    /// Rebuild the attribute tree with current edits applied
    pub fn to_attributes(&self) -> Vec<Attribute> {
        self.roots.iter().map(|&id| self.build(id)).collect()
    }

    pub fn into_attributes(self) -> Vec<Attribute> {
        self.to_attributes()
    }

    fn build(&self, id: AttributeId) -> Attribute {
        let node = &self.nodes[id.0];
        Attribute {
            attribute_name: node.name.clone(),
            attribute_value: node.value.clone(),
            is_attribute_mapped: node.mapped,
            position: node.position.clone(),
            children: node.children.iter().map(|&c| self.build(c)).collect(),
            extra: node.extra.clone(),
        }
    }
}
