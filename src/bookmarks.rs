/// Bookmark tree data structures as reported by the host bookmark store
use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` like a missing field
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Kind of a bookmark tree node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkType {
    Folder,
    #[default]
    Bookmark,
    Separator,
}

/// A node of the host bookmark tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: BookmarkType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_added: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<BookmarkNode>>,
}

impl BookmarkNode {
    pub fn children(&self) -> &[BookmarkNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Number of nodes in this subtree, the node itself included
    pub fn subtree_len(&self) -> usize {
        1 + self.children().iter().map(BookmarkNode::subtree_len).sum::<usize>()
    }
}

/// Where a node goes: a parent folder and an optional position inside it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub parent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

impl Destination {
    pub fn append_to(parent_id: impl Into<String>) -> Self {
        Destination {
            parent_id: parent_id.into(),
            index: None,
        }
    }
}

/// Properties for a new bookmark, folder or separator.
///
/// `url` and `index` are left out of the serialized form when absent, so the
/// host applies its own defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDetails {
    pub parent_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<BookmarkType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

impl CreateDetails {
    /// Details that recreate `node` under `destination`, without its id
    pub fn copy_of(node: &BookmarkNode, destination: &Destination) -> Self {
        CreateDetails {
            parent_id: destination.parent_id.clone(),
            title: node.title.clone(),
            kind: Some(node.kind),
            url: node.url.clone(),
            index: destination.index,
        }
    }
}
