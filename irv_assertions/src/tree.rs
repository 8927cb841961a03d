use log::debug;

use crate::config::*;

impl TreeNode {
    fn new(id: CandidateId) -> TreeNode {
        TreeNode {
            id,
            children: Vec::new(),
            valid: false,
        }
    }

    // The order is read from the winner backwards: the last element is this node.
    fn add_order(&mut self, order: &[CandidateId]) {
        let mut node: &mut TreeNode = self;
        for cid in order.iter().rev().skip(1) {
            let pos = match node.children.iter().position(|c| c.id == *cid) {
                Some(pos) => pos,
                None => {
                    node.children.push(TreeNode::new(*cid));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[pos];
        }
    }

    /// Marks as valid all the nodes along the given order, as far as the tree goes.
    ///
    /// Returns false if the order does not end with this node.
    pub fn mark_valid_path(&mut self, order: &[CandidateId]) -> bool {
        if order.last() != Some(&self.id) {
            return false;
        }
        let mut node: &mut TreeNode = self;
        node.valid = true;
        for cid in order.iter().rev().skip(1) {
            match node.children.iter().position(|c| c.id == *cid) {
                Some(pos) => {
                    node = &mut node.children[pos];
                    node.valid = true;
                }
                None => break,
            }
        }
        true
    }

    pub fn num_leaves(&self) -> usize {
        if self.children.is_empty() {
            1
        } else {
            self.children.iter().map(|c| c.num_leaves()).sum()
        }
    }

    /// The number of layers below this node.
    pub fn height(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.height() + 1)
            .max()
            .unwrap_or(0)
    }

    /// All the paths from this node to the leaves, as elimination order suffixes.
    pub fn leaf_suffixes(&self) -> Vec<Suffix> {
        if self.children.is_empty() {
            return vec![vec![self.id]];
        }
        let mut res: Vec<Suffix> = Vec::new();
        for c in self.children.iter() {
            for mut s in c.leaf_suffixes() {
                s.push(self.id);
                res.push(s);
            }
        }
        res
    }
}

/// Folds elimination orders into prefix trees, one per distinct winner.
///
/// The roots are sorted by candidate. All the nodes start as invalid, see [mark_valid_paths].
pub fn build_trees(orders: &[Suffix]) -> Vec<TreeNode> {
    let mut roots: Vec<TreeNode> = Vec::new();
    for order in orders.iter() {
        let winner = match order.last() {
            Some(w) => *w,
            None => continue,
        };
        let pos = match roots.iter().position(|r| r.id == winner) {
            Some(pos) => pos,
            None => {
                roots.push(TreeNode::new(winner));
                roots.len() - 1
            }
        };
        roots[pos].add_order(order);
    }
    roots.sort_by_key(|r| r.id);
    debug!(
        "build_trees: {} orders -> {} trees",
        orders.len(),
        roots.len()
    );
    roots
}

/// Marks the nodes of the trees that lie on the paths of the given orders.
pub fn mark_valid_paths(trees: &mut [TreeNode], orders: &[Suffix]) {
    for order in orders.iter() {
        for t in trees.iter_mut() {
            if t.mark_valid_path(order) {
                break;
            }
        }
    }
}

/// Builds the trees of the orders, with every node marked as valid.
pub fn build_valid_trees(orders: &[Suffix]) -> Vec<TreeNode> {
    let mut trees = build_trees(orders);
    mark_valid_paths(&mut trees, orders);
    trees
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suffix::*;
    use std::collections::BTreeSet;

    fn s(ids: &[u32]) -> Suffix {
        ids.iter().map(|c| CandidateId(*c)).collect()
    }

    fn all_valid(t: &TreeNode) -> bool {
        t.valid && t.children.iter().all(all_valid)
    }

    #[test]
    fn shared_prefixes_share_nodes() {
        let orders = vec![s(&[2, 1, 0]), s(&[1, 2, 0]), s(&[3, 2, 0]), s(&[0, 1])];
        let trees = build_trees(&orders);
        assert_eq!(trees.len(), 2);
        let t0 = &trees[0];
        assert_eq!(t0.id, CandidateId(0));
        assert_eq!(t0.children.len(), 2);
        assert_eq!(t0.num_leaves(), 3);
        assert_eq!(t0.height(), 2);
        let t1 = &trees[1];
        assert_eq!(t1.id, CandidateId(1));
        assert_eq!(t1.leaf_suffixes(), vec![s(&[0, 1])]);
        assert!(!t0.valid);
    }

    #[test]
    fn roots_are_the_winners_of_the_frontier() {
        let a = Assertion::neb(0, 1);
        let frontier = all_allowed_suffixes(&a, &all_singleton_suffixes(4), 4, false);
        let trees = build_trees(&frontier);
        let roots: BTreeSet<CandidateId> = trees.iter().map(|t| t.id).collect();
        let winners: BTreeSet<CandidateId> = frontier.iter().map(|f| *f.last().unwrap()).collect();
        assert_eq!(roots, winners);
        let mut leaves: Vec<Suffix> = trees.iter().flat_map(|t| t.leaf_suffixes()).collect();
        let mut expected = frontier.clone();
        leaves.sort();
        expected.sort();
        assert_eq!(leaves, expected);
    }

    #[test]
    fn marking_keeps_only_surviving_paths() {
        let before = all_elimination_orders(3);
        let after = all_allowed_suffixes(&Assertion::neb(0, 1), &before, 3, false);
        let mut trees = build_trees(&before);
        mark_valid_paths(&mut trees, &after);
        // 1 wins in the orders [0, 2, 1] and [2, 0, 1], both ruled out.
        let t1 = trees.iter().find(|t| t.id == CandidateId(1)).unwrap();
        assert!(!t1.valid);
        let t2 = trees.iter().find(|t| t.id == CandidateId(2)).unwrap();
        assert!(t2.valid);
        // [0, 1, 2] is ruled out, [1, 0, 2] survives.
        let c0 = t2.children.iter().find(|c| c.id == CandidateId(0)).unwrap();
        let c1 = t2.children.iter().find(|c| c.id == CandidateId(1)).unwrap();
        assert!(c0.valid);
        assert!(c0.children[0].valid);
        assert!(!c1.valid);
        assert!(!c1.children[0].valid);
    }

    #[test]
    fn shorter_trees_are_marked_by_longer_orders() {
        let mut trees = build_trees(&[s(&[0]), s(&[1])]);
        mark_valid_paths(&mut trees, &[s(&[1, 2, 0])]);
        assert!(trees[0].valid);
        assert!(!trees[1].valid);
        assert!(all_valid(&build_valid_trees(&all_elimination_orders(4))[3]));
    }
}
