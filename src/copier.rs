/// Recursive copy of a bookmark subtree under a new parent
use log::debug;

use crate::bookmarks::{BookmarkNode, CreateDetails, Destination};
use crate::error::{Error, Result};
use crate::host::Bookmarks;

/// What to copy: a snapshot already in hand, or the id of a host node
#[derive(Debug, Clone, PartialEq)]
pub enum CopySource {
    Node(BookmarkNode),
    Id(String),
}

impl CopySource {
    async fn resolve(self, bookmarks: &dyn Bookmarks) -> Result<BookmarkNode> {
        match self {
            CopySource::Node(node) => Ok(node),
            CopySource::Id(id) => {
                let found = bookmarks.get_subtree(&id).await?.into_iter().next();
                found.ok_or(Error::NotFound(id))
            }
        }
    }
}

/// Recreate `source` and all of its descendants under `destination`.
///
/// The copy of the root honours `destination.index`; descendants are appended
/// to their new parent. Creates are issued one at a time in pre-order, so
/// every parent exists before its children and siblings keep their order.
/// Returns the new root node.
pub async fn copy_subtree(
    bookmarks: &dyn Bookmarks,
    source: CopySource,
    destination: &Destination,
) -> Result<BookmarkNode> {
    let root = source.resolve(bookmarks).await?;
    debug!("copying {} ({} nodes) into {}", root.id, root.subtree_len(), destination.parent_id);

    let new_root = bookmarks.create(&CreateDetails::copy_of(&root, destination)).await?;

    let mut pending: Vec<(BookmarkNode, String)> = Vec::new();
    push_children(&mut pending, root.children, &new_root.id);

    while let Some((node, parent_id)) = pending.pop() {
        let created = bookmarks
            .create(&CreateDetails::copy_of(&node, &Destination::append_to(parent_id)))
            .await?;
        push_children(&mut pending, node.children, &created.id);
    }

    Ok(new_root)
}

// Reversed so that popping yields the first child first.
fn push_children(pending: &mut Vec<(BookmarkNode, String)>, children: Option<Vec<BookmarkNode>>, parent_id: &str) {
    if let Some(children) = children {
        pending.extend(children.into_iter().rev().map(|child| (child, parent_id.to_string())));
    }
}
