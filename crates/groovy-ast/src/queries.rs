use groovy_core::Position;

use crate::node::{Ast, Node, NodeId};

impl Ast {
    /// Every node reachable from the root, in pre-order.
    pub fn get_all_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children().into_iter().rev());
        }
        out
    }

    pub fn get_parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    /// Parents of `id`, innermost first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.get_parent(id), move |&id| self.get_parent(id))
    }

    /// The deepest node whose range contains `position`.
    ///
    /// Children without a range (synthesized nodes) are searched through but
    /// never returned themselves.
    pub fn node_at(&self, position: Position) -> Option<NodeId> {
        let mut best: Option<(usize, NodeId)> = None;
        let mut stack = vec![(0usize, self.root())];
        while let Some((depth, id)) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            match node.range {
                Some(range) if range.contains(position) => {
                    if best.map_or(true, |(best_depth, _)| depth >= best_depth) {
                        best = Some((depth, id));
                    }
                }
                Some(_) => continue,
                None => {}
            }
            stack.extend(node.children().into_iter().rev().map(|child| (depth + 1, child)));
        }
        best.map(|(_, id)| id)
    }
}
