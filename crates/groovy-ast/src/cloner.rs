//! Deep copies of node subtrees.
//!
//! Every copy goes through [`NodeKind::try_map_children`], the exhaustive
//! table over node kinds, so there is no kind a copy can silently skip.

use crate::node::{Ast, NodeId, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CloneError {
    #[error("{0:?} does not exist in the source tree")]
    DanglingNode(NodeId),
}

/// Copy the subtree rooted at `id` into a fresh arena whose root is the copy.
pub fn extract_subtree(ast: &Ast, id: NodeId) -> Result<Ast, CloneError> {
    let mut out = Ast::new();
    let root = copy_into(ast, id, &mut out)?;
    out.set_root(root);
    Ok(out)
}

/// Deep-copy the subtree rooted at `id` inside the same arena. The copy has
/// no parent and shares no node with the original.
pub fn clone_subtree(ast: &mut Ast, id: NodeId) -> Result<NodeId, CloneError> {
    let detached = extract_subtree(ast, id)?;
    copy_into(&detached, detached.root(), ast)
}

fn copy_into(src: &Ast, id: NodeId, dst: &mut Ast) -> Result<NodeId, CloneError> {
    let node = src.get(id).ok_or(CloneError::DanglingNode(id))?;
    let annotations = node
        .annotations
        .iter()
        .map(|&annotation| copy_into(src, annotation, dst))
        .collect::<Result<Vec<_>, _>>()?;
    let kind = node
        .kind
        .try_map_children(&mut |child| copy_into(src, child, dst))?;
    let copy = dst.alloc(kind, node.range, annotations);
    if let Some(target) = dst.get_mut(copy) {
        target.comment = node.comment.clone();
        target.orphan_comments = node.orphan_comments.clone();
    }
    Ok(copy)
}

/// Deep structural equality of two subtrees, possibly in different arenas.
/// Handles, parents and allocation order are ignored.
pub fn structurally_equal(a: &Ast, a_id: NodeId, b: &Ast, b_id: NodeId) -> bool {
    let (Some(left), Some(right)) = (a.get(a_id), b.get(b_id)) else {
        return false;
    };
    if left.range != right.range
        || left.comment != right.comment
        || left.orphan_comments != right.orphan_comments
        || shape(&left.kind) != shape(&right.kind)
    {
        return false;
    }
    let (left_children, right_children) = (left.children(), right.children());
    left_children.len() == right_children.len()
        && left_children
            .iter()
            .zip(&right_children)
            .all(|(&l, &r)| structurally_equal(a, l, b, r))
}

/// The kind with every child handle erased.
fn shape(kind: &NodeKind) -> NodeKind {
    match kind.try_map_children(&mut |_| Ok::<_, std::convert::Infallible>(NodeId::from_raw(0))) {
        Ok(kind) => kind,
        Err(never) => match never {},
    }
}
