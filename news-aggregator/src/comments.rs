use crate::traits::NewsStore;
use crate::types::{AggregatorError, Comment, CommentNode, NewComment, Result, ThreadEntry};
use crate::utils::ids::parse_stored_id;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Rebuilds the reply forest of one post from its flat comment list.
///
/// Roots and every reply list keep the relative order of `comments`. A
/// comment whose parent is not in the list becomes a root. Self references
/// and parent cycles are broken by promoting the earliest comment of the
/// cycle to a root, so every input comment appears exactly once.
///
/// Runs in linear passes with explicit stacks, so thread depth is unbounded.
/// Use [`flatten_thread`] before handing the result to a serializer.
pub fn build_comment_tree(comments: &[Comment]) -> Vec<CommentNode> {
    let count = comments.len();

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(count);
    for (position, comment) in comments.iter().enumerate() {
        index.entry(comment.id.as_str()).or_insert(position);
    }

    let mut parents: Vec<Option<usize>> = comments
        .iter()
        .enumerate()
        .map(|(position, comment)| {
            comment
                .parent_id
                .as_deref()
                .and_then(|parent_id| index.get(parent_id).copied())
                .filter(|&parent| parent != position)
        })
        .collect();

    let children = children_of(&parents);
    let mut reached = vec![false; count];
    for root in (0..count).filter(|&position| parents[position].is_none()) {
        mark_reachable(root, &children, &mut reached);
    }
    for position in 0..count {
        if !reached[position] {
            warn!(
                "Comment {} is part of a reply cycle, showing it as a root",
                comments[position].id
            );
            parents[position] = None;
            mark_reachable(position, &children, &mut reached);
        }
    }

    let children = children_of(&parents);
    let roots: Vec<usize> = (0..count).filter(|&position| parents[position].is_none()).collect();

    // Post-order so every reply is complete before it is moved into its parent.
    let mut order = Vec::with_capacity(count);
    let mut stack: Vec<(usize, bool)> = roots.iter().rev().map(|&root| (root, false)).collect();
    while let Some((position, expanded)) = stack.pop() {
        if expanded {
            order.push(position);
            continue;
        }
        stack.push((position, true));
        stack.extend(children[position].iter().rev().map(|&child| (child, false)));
    }

    let mut slots: Vec<Option<CommentNode>> = comments
        .iter()
        .cloned()
        .map(|comment| Some(CommentNode::new(comment)))
        .collect();

    for position in order {
        let replies: Vec<CommentNode> = children[position]
            .iter()
            .filter_map(|&child| slots[child].take())
            .collect();
        if let Some(node) = slots[position].as_mut() {
            node.replies = replies;
        }
    }

    roots.into_iter().filter_map(|root| slots[root].take()).collect()
}

fn children_of(parents: &[Option<usize>]) -> Vec<Vec<usize>> {
    let mut children = vec![Vec::new(); parents.len()];
    for (position, parent) in parents.iter().enumerate() {
        if let Some(parent) = parent {
            children[*parent].push(position);
        }
    }
    children
}

fn mark_reachable(start: usize, children: &[Vec<usize>], reached: &mut [bool]) {
    if reached[start] {
        return;
    }
    reached[start] = true;
    let mut stack = vec![start];
    while let Some(position) = stack.pop() {
        for &child in &children[position] {
            if !reached[child] {
                reached[child] = true;
                stack.push(child);
            }
        }
    }
}

/// Lays a forest out as depth-first rows, keeping root and reply order.
pub fn flatten_thread(forest: &[CommentNode]) -> Vec<ThreadEntry> {
    let mut rows = Vec::new();
    let mut stack: Vec<(&CommentNode, usize, Option<usize>)> =
        forest.iter().rev().map(|node| (node, 0, None)).collect();

    while let Some((node, depth, parent)) = stack.pop() {
        let position = rows.len();
        rows.push(ThreadEntry {
            comment: node.comment.clone(),
            depth,
            parent,
            reply_count: node.replies.len(),
        });
        stack.extend(
            node.replies
                .iter()
                .rev()
                .map(|reply| (reply, depth + 1, Some(position))),
        );
    }

    rows
}

/// How a client names the post a comment belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsRef {
    Stored(i64),
    External(String),
}

impl NewsRef {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(match parse_stored_id(raw) {
            Some(id) => NewsRef::Stored(id),
            None => NewsRef::External(raw.to_string()),
        })
    }

    /// Accepts either a JSON number or a string.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(number) => number.as_i64().map(NewsRef::Stored),
            serde_json::Value::String(raw) => NewsRef::parse(raw),
            _ => None,
        }
    }
}

/// Read and write side of comment threads.
pub struct CommentBoard {
    store: Arc<dyn NewsStore>,
}

impl CommentBoard {
    pub fn new(store: Arc<dyn NewsStore>) -> Self {
        Self { store }
    }

    /// Flat list, newest first. Unknown external links have no comments yet.
    pub async fn list(&self, news: &NewsRef) -> Result<Vec<Comment>> {
        let news_id = match news {
            NewsRef::Stored(id) => *id,
            NewsRef::External(url) => match self.store.find_post_by_url(url).await? {
                Some(post) => post.id,
                None => return Ok(Vec::new()),
            },
        };
        self.store.list_comments(news_id).await
    }

    pub async fn thread(&self, news: &NewsRef) -> Result<Vec<CommentNode>> {
        let comments = self.list(news).await?;
        Ok(build_comment_tree(&comments))
    }

    /// Attaches a comment, materialising a stored post for an external link
    /// the first time it is discussed.
    pub async fn post(
        &self,
        author_id: &str,
        news: &NewsRef,
        content: &str,
        parent_id: Option<&str>,
        title: Option<&str>,
    ) -> Result<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AggregatorError::Validation("Missing fields".to_string()));
        }

        let news_id = match news {
            NewsRef::Stored(id) => *id,
            NewsRef::External(url) => self.resolve_external(url, title).await?,
        };

        let comment = self
            .store
            .create_comment(NewComment {
                news_id,
                author_id: author_id.to_string(),
                content: content.to_string(),
                parent_id: parent_id
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string),
            })
            .await?;

        info!("User {} commented {} on post {}", author_id, comment.id, news_id);
        Ok(comment)
    }

    async fn resolve_external(&self, url: &str, title: Option<&str>) -> Result<i64> {
        if let Some(post) = self.store.find_post_by_url(url).await? {
            return Ok(post.id);
        }

        let title = title.map(str::trim).filter(|title| !title.is_empty()).ok_or_else(|| {
            AggregatorError::Validation("Title required for new news item".to_string())
        })?;

        Ok(self.store.find_or_create_by_url(url, title).await?.id)
    }
}
