use super::{
    newtypes::{CommentId, PostId, UserId},
    user::User,
};
use crate::schema::comment;
use chrono::{DateTime, Utc};
use diesel::{Identifiable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maximum nesting depth for replies, roots are at depth zero. Bounds the
/// tree so adversarial nesting cannot exhaust rendering.
pub const MAX_COMMENT_DEPTH: i32 = 50;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = comment, check_for_backend(diesel::pg::Pg))]
pub struct Comment {
    pub id: CommentId,
    pub creator_id: UserId,
    pub post_id: PostId,
    pub parent_id: Option<CommentId>,
    pub content: String,
    pub depth: i32,
    pub deleted: bool,
    pub published: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Queryable)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CommentView {
    pub comment: Comment,
    pub creator: User,
}

/// One comment with its direct replies, as rendered in a post's thread.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct CommentNode {
    pub comment: Comment,
    pub creator: User,
    pub replies: Vec<CommentNode>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CreateCommentParams {
    pub post_id: PostId,
    pub content: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ReplyCommentParams {
    pub parent_id: CommentId,
    pub content: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct EditCommentParams {
    pub id: CommentId,
    pub content: Option<String>,
    pub deleted: Option<bool>,
}

/// Assembles the flat list returned by the store into a forest. Reply lists
/// are derived from the parent back-pointers, so sibling order follows the
/// input order, and a reply whose parent is missing from the batch surfaces
/// as a root. A parent always has a smaller depth than its replies, which
/// makes a single deepest-first pass sufficient, without recursion.
pub fn build_comment_tree(views: Vec<CommentView>) -> Vec<CommentNode> {
    let index: HashMap<CommentId, usize> = views
        .iter()
        .enumerate()
        .map(|(i, v)| (v.comment.id, i))
        .collect();
    let mut nodes: Vec<Option<CommentNode>> = views
        .into_iter()
        .map(|v| {
            Some(CommentNode {
                comment: v.comment,
                creator: v.creator,
                replies: Vec::new(),
            })
        })
        .collect();

    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by_key(|i| {
        std::cmp::Reverse(
            nodes[*i]
                .as_ref()
                .map(|n| n.comment.depth)
                .unwrap_or_default(),
        )
    });

    for i in order {
        let parent = nodes[i]
            .as_ref()
            .and_then(|n| n.comment.parent_id)
            .and_then(|p| index.get(&p).copied());
        let Some(parent) = parent else { continue };
        // the depth invariant rules both out, but a self-reference or an
        // already-moved parent must not lose the node
        if parent == i || nodes[parent].is_none() {
            continue;
        }
        if let Some(node) = nodes[i].take() {
            if let Some(parent_node) = nodes[parent].as_mut() {
                parent_node.replies.push(node);
            }
        }
    }
    nodes.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_user() -> User {
        User {
            id: UserId(1),
            full_name: "test user".to_string(),
            email: "user@example.com".to_string(),
            password_encrypted: None,
            email_verified: true,
            refresh_token: None,
            published: Utc::now(),
            updated: None,
        }
    }

    fn test_comment(id: i32, parent_id: Option<i32>, depth: i32) -> CommentView {
        CommentView {
            comment: Comment {
                id: CommentId(id),
                creator_id: UserId(1),
                post_id: PostId(1),
                parent_id: parent_id.map(CommentId),
                content: format!("comment {id}"),
                depth,
                deleted: false,
                published: Utc::now(),
                updated: None,
            },
            creator: test_user(),
        }
    }

    #[test]
    fn test_replies_attach_to_parent() {
        let tree = build_comment_tree(vec![
            test_comment(1, None, 0),
            test_comment(2, Some(1), 1),
            test_comment(3, Some(2), 2),
        ]);
        assert_eq!(1, tree.len());
        assert_eq!(CommentId(1), tree[0].comment.id);
        assert_eq!(1, tree[0].replies.len());
        assert_eq!(CommentId(2), tree[0].replies[0].comment.id);
        assert_eq!(CommentId(3), tree[0].replies[0].replies[0].comment.id);
    }

    #[test]
    fn test_roots_keep_input_order() {
        let tree = build_comment_tree(vec![
            test_comment(3, None, 0),
            test_comment(2, None, 0),
            test_comment(1, None, 0),
        ]);
        let ids: Vec<_> = tree.iter().map(|n| n.comment.id.0).collect();
        assert_eq!(vec![3, 2, 1], ids);
        assert!(tree.iter().all(|n| n.replies.is_empty()));
    }

    #[test]
    fn test_sibling_replies_keep_input_order() {
        let tree = build_comment_tree(vec![
            test_comment(1, None, 0),
            test_comment(4, Some(1), 1),
            test_comment(3, Some(1), 1),
            test_comment(2, Some(1), 1),
        ]);
        let ids: Vec<_> = tree[0].replies.iter().map(|n| n.comment.id.0).collect();
        assert_eq!(vec![4, 3, 2], ids);
    }

    #[test]
    fn test_reply_with_missing_parent_surfaces_as_root() {
        let tree = build_comment_tree(vec![
            test_comment(1, None, 0),
            test_comment(5, Some(99), 1),
        ]);
        let ids: Vec<_> = tree.iter().map(|n| n.comment.id.0).collect();
        assert_eq!(vec![1, 5], ids);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(Vec::<CommentNode>::new(), build_comment_tree(Vec::new()));
    }
}
