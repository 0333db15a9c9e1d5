//! Wire records of the JSON serialization format.
//!
//! Field names follow the LionWeb serialization format; nodes refer to each
//! other by id and to schema elements by meta-pointer.

use serde::{Deserialize, Serialize};

use crate::model::Id;
use crate::schema::MetaPointer;

/// A flat, id-addressed set of node records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializationChunk {
    pub serialization_format_version: String,
    pub languages: Vec<UsedLanguage>,
    pub nodes: Vec<SerializedNode>,
}

impl SerializationChunk {
    /// Creates an empty chunk of the current format version.
    pub fn empty() -> Self {
        Self {
            serialization_format_version: crate::SERIALIZATION_FORMAT_VERSION.to_string(),
            languages: Vec::new(),
            nodes: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node record by id.
    pub fn node(&self, id: &str) -> Option<&SerializedNode> {
        self.nodes.iter().find(|node| node.id.as_str() == id)
    }
}

/// A language a chunk uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UsedLanguage {
    pub key: String,
    pub version: String,
}

/// One node record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedNode {
    pub id: Id,
    pub classifier: MetaPointer,
    #[serde(default)]
    pub properties: Vec<SerializedProperty>,
    #[serde(default)]
    pub containments: Vec<SerializedContainment>,
    #[serde(default)]
    pub references: Vec<SerializedReference>,
    #[serde(default)]
    pub annotations: Vec<Id>,
    #[serde(default)]
    pub parent: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedProperty {
    pub property: MetaPointer,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedContainment {
    pub containment: MetaPointer,
    pub children: Vec<Id>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedReference {
    pub reference: MetaPointer,
    pub targets: Vec<SerializedReferenceTarget>,
}

/// A reference target: the target's id, if known, and a textual hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedReferenceTarget {
    #[serde(rename = "reference")]
    pub target_id: Option<Id>,
    pub resolve_info: Option<String>,
}
