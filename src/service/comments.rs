//! Comment thread assembly.
//!
//! Reply chains can get arbitrarily deep, so everything here walks the tree
//! iteratively over an arena of nodes indexed by comment id; there is no
//! recursion anywhere on the reply chain.

use crate::models::comment::{CommentResponse, CommentWithAuthor};
use crate::models::user::AuthorResponse;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Assemble the nested thread for one video from its active comments.
///
/// `rows` is expected newest-first (both roots and replies keep that order).
/// A row whose parent is not present (deleted or deactivated) is dropped
/// together with its subtree. `total_replies` counts all transitive replies
/// of a node, not just direct ones.
pub fn build_thread(rows: &[CommentWithAuthor], like_counts: &HashMap<Uuid, i64>, liked_by_viewer: &HashSet<Uuid>) -> Vec<CommentResponse> {
    let index_of: HashMap<Uuid, usize> = rows.iter().enumerate().map(|(i, row)| (row.id, i)).collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); rows.len()];
    let mut roots: Vec<usize> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        match row.parent_id {
            None => roots.push(i),
            Some(parent) => {
                if let Some(&p) = index_of.get(&parent) {
                    children[p].push(i);
                }
                // Parent missing from the active set: subtree stays hidden.
            }
        }
    }

    // Explicit post-order over the arena: children are finished before their
    // parent, so counts and assembled responses can be taken in one pass.
    let mut post_order: Vec<usize> = Vec::with_capacity(rows.len());
    for &root in &roots {
        let mut stack: Vec<(usize, bool)> = vec![(root, false)];
        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                post_order.push(node);
            } else {
                stack.push((node, true));
                for &child in children[node].iter().rev() {
                    stack.push((child, false));
                }
            }
        }
    }

    let mut reply_counts: Vec<i64> = vec![0; rows.len()];
    let mut built: Vec<Option<CommentResponse>> = (0..rows.len()).map(|_| None).collect();
    for &node in &post_order {
        let mut replies = Vec::with_capacity(children[node].len());
        let mut total = 0;
        for &child in &children[node] {
            total += 1 + reply_counts[child];
            if let Some(child_response) = built[child].take() {
                replies.push(child_response);
            }
        }
        reply_counts[node] = total;

        let row = &rows[node];
        built[node] = Some(CommentResponse {
            id: row.id,
            author: AuthorResponse {
                profile_id: row.author_profile_id.clone(),
                full_name: row.author_full_name.clone(),
            },
            content: row.content.clone(),
            created_at: row.created_at,
            replies,
            total_replies: total,
            likes_count: like_counts.get(&row.id).copied().unwrap_or(0),
            is_liked_by_user: liked_by_viewer.contains(&row.id),
        });
    }

    roots.iter().filter_map(|&root| built[root].take()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn row(id: Uuid, parent: Option<Uuid>, minutes_ago: i64) -> CommentWithAuthor {
        CommentWithAuthor {
            id,
            video_id: Uuid::new_v4(),
            parent_id: parent,
            content: format!("comment {}", id),
            author_profile_id: "profile_ab12cd34".to_string(),
            author_full_name: "Some Author".to_string(),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn empty_thread_builds_empty() {
        let thread = build_thread(&[], &HashMap::new(), &HashSet::new());
        assert!(thread.is_empty());
    }

    #[test]
    fn counts_direct_and_transitive_replies() {
        // root -> a -> b, root -> c
        let root = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let rows = vec![
            row(root, None, 40),
            row(a, Some(root), 30),
            row(b, Some(a), 20),
            row(c, Some(root), 10),
        ];

        let thread = build_thread(&rows, &HashMap::new(), &HashSet::new());
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].total_replies, 3);
        assert_eq!(thread[0].replies.len(), 2);

        let nested_a = thread[0].replies.iter().find(|r| r.id == a).unwrap();
        assert_eq!(nested_a.total_replies, 1);
        assert_eq!(nested_a.replies[0].id, b);
        assert_eq!(nested_a.replies[0].total_replies, 0);
    }

    #[test]
    fn deep_reply_chain_does_not_grow_the_call_stack() {
        let mut rows = Vec::new();
        let mut parent = None;
        let mut last = Uuid::new_v4();
        for i in 0..10_000 {
            let id = Uuid::new_v4();
            rows.push(row(id, parent, 10_000 - i));
            parent = Some(id);
            last = id;
        }

        let thread = build_thread(&rows, &HashMap::new(), &HashSet::new());
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].total_replies, 9_999);

        // Walk to the leaf iteratively to confirm the full chain survived.
        let mut node = &thread[0];
        let mut depth = 0;
        while let Some(child) = node.replies.first() {
            node = child;
            depth += 1;
        }
        assert_eq!(depth, 9_999);
        assert_eq!(node.id, last);
    }

    #[test]
    fn subtree_of_missing_parent_is_hidden() {
        let root = Uuid::new_v4();
        let ghost = Uuid::new_v4(); // never passed in: deactivated parent
        let orphan = Uuid::new_v4();
        let orphan_child = Uuid::new_v4();
        let rows = vec![row(root, None, 30), row(orphan, Some(ghost), 20), row(orphan_child, Some(orphan), 10)];

        let thread = build_thread(&rows, &HashMap::new(), &HashSet::new());
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].id, root);
        assert_eq!(thread[0].total_replies, 0);
    }

    #[test]
    fn like_data_is_attached_per_node() {
        let root = Uuid::new_v4();
        let reply = Uuid::new_v4();
        let rows = vec![row(root, None, 20), row(reply, Some(root), 10)];

        let like_counts = HashMap::from([(root, 5i64)]);
        let liked = HashSet::from([reply]);

        let thread = build_thread(&rows, &like_counts, &liked);
        assert_eq!(thread[0].likes_count, 5);
        assert!(!thread[0].is_liked_by_user);
        assert_eq!(thread[0].replies[0].likes_count, 0);
        assert!(thread[0].replies[0].is_liked_by_user);
    }

    #[test]
    fn roots_keep_their_incoming_order() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let rows = vec![row(first, None, 1), row(second, None, 2)];

        let thread = build_thread(&rows, &HashMap::new(), &HashSet::new());
        assert_eq!(thread[0].id, first);
        assert_eq!(thread[1].id, second);
    }
}
