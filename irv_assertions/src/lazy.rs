use log::{debug, info};

use crate::config::*;
use crate::suffix::{evaluate, EffectOfAssertion};

/// A node of a [LazyTree], materialized on demand.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LazyTreeNode {
    pub id: CandidateId,
    /// This node followed by its ancestors: the elimination order suffix that ends at the root.
    pub path: Suffix,
    /// The candidates that are not on the path yet.
    pub remaining: Vec<CandidateId>,
    /// Positions (in [LazyTree::assertions]) of the assertions that still need more detail.
    pub remaining_assertions: Vec<usize>,
    /// Empty until the node is expanded.
    pub children: Vec<LazyTreeNode>,
    /// Position of the first assertion that contradicts this path, if any.
    pub pruned_by: Option<usize>,
}

impl LazyTreeNode {
    pub fn pruned(&self) -> bool {
        self.pruned_by.is_some()
    }

    pub fn is_expanded(&self) -> bool {
        !self.children.is_empty()
    }

    /// A path that is neither contradicted nor waiting on any assertion: every complete
    /// elimination order ending with it is compatible with all the assertions.
    pub fn is_settled(&self) -> bool {
        !self.pruned() && self.remaining_assertions.is_empty()
    }

    fn child(&self, cid: CandidateId, assertions: &[Assertion]) -> LazyTreeNode {
        let mut path: Suffix = Vec::with_capacity(self.path.len() + 1);
        path.push(cid);
        path.extend_from_slice(&self.path);
        let remaining: Vec<CandidateId> = self
            .remaining
            .iter()
            .filter(|c| **c != cid)
            .cloned()
            .collect();

        let mut remaining_assertions: Vec<usize> = Vec::new();
        let mut pruned_by: Option<usize> = None;
        for a_idx in self.remaining_assertions.iter() {
            match evaluate(&assertions[*a_idx], &path) {
                EffectOfAssertion::Ok => {}
                EffectOfAssertion::NeedsMoreDetail => remaining_assertions.push(*a_idx),
                EffectOfAssertion::Contradiction => {
                    // First in list order wins.
                    pruned_by = Some(*a_idx);
                    break;
                }
            }
        }
        LazyTreeNode {
            id: cid,
            path,
            remaining,
            remaining_assertions,
            children: Vec::new(),
            pruned_by,
        }
    }

    fn expand(&mut self, assertions: &[Assertion]) {
        self.children = self
            .remaining
            .iter()
            .map(|cid| self.child(*cid, assertions))
            .collect();
    }

    fn find(&self, path: &[CandidateId]) -> Option<&LazyTreeNode> {
        let (last, rest) = path.split_last()?;
        if *last != self.id {
            return None;
        }
        let mut node = self;
        for cid in rest.iter().rev() {
            node = node.children.iter().find(|c| c.id == *cid)?;
        }
        Some(node)
    }

    fn find_mut(&mut self, path: &[CandidateId]) -> Option<&mut LazyTreeNode> {
        let (last, rest) = path.split_last()?;
        if *last != self.id {
            return None;
        }
        let mut node = self;
        for cid in rest.iter().rev() {
            node = node.children.iter_mut().find(|c| c.id == *cid)?;
        }
        Some(node)
    }

    fn collect_leaves<'a>(&'a self, res: &mut Vec<&'a LazyTreeNode>) {
        if self.children.is_empty() {
            res.push(self);
        } else {
            for c in self.children.iter() {
                c.collect_leaves(res);
            }
        }
    }
}

/// The tree of the elimination orders that end with a given candidate, expanded one layer
/// at a time at the request of the caller.
///
/// Each node is addressed by its path. The caller owns the tree exclusively.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LazyTree {
    assertions: Vec<Assertion>,
    root: LazyTreeNode,
}

impl LazyTree {
    /// A tree with only its root materialized.
    pub fn new(root: CandidateId, num_candidates: u32, assertions: &[Assertion]) -> LazyTree {
        info!(
            "LazyTree::new: root {} among {} candidates, {} assertions",
            root,
            num_candidates,
            assertions.len()
        );
        let root_node = LazyTreeNode {
            id: root,
            path: vec![root],
            remaining: (0..num_candidates)
                .map(CandidateId)
                .filter(|c| *c != root)
                .collect(),
            remaining_assertions: (0..assertions.len()).collect(),
            children: Vec::new(),
            pruned_by: None,
        };
        LazyTree {
            assertions: assertions.to_vec(),
            root: root_node,
        }
    }

    pub fn root(&self) -> &LazyTreeNode {
        &self.root
    }

    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    /// The assertion at the given position, as referred to by [LazyTreeNode::pruned_by] and
    /// [LazyTreeNode::remaining_assertions].
    pub fn assertion(&self, idx: usize) -> Option<&Assertion> {
        self.assertions.get(idx)
    }

    /// The assertion that pruned a node, if any.
    pub fn pruning_assertion(&self, node: &LazyTreeNode) -> Option<&Assertion> {
        node.pruned_by.and_then(|idx| self.assertion(idx))
    }

    pub fn find_node_by_path(&self, path: &[CandidateId]) -> Option<&LazyTreeNode> {
        self.root.find(path)
    }

    /// Materializes the children of the node at the given path.
    ///
    /// Expanding a node that already has children recomputes them from scratch. A pruned node
    /// is terminal and is not expanded.
    pub fn expand_node(&mut self, path: &[CandidateId]) -> Result<&LazyTreeNode, AuditErrors> {
        let assertions = &self.assertions;
        let node = self
            .root
            .find_mut(path)
            .ok_or_else(|| AuditErrors::NodeNotFound {
                path: path.to_vec(),
            })?;
        if let Some(pruned_by) = node.pruned_by {
            return Err(AuditErrors::NodePruned {
                path: path.to_vec(),
                pruned_by,
            });
        }
        node.expand(assertions);
        debug!(
            "expand_node: {:?}: {} children, {} pruned",
            path,
            node.children.len(),
            node.children.iter().filter(|c| c.pruned()).count()
        );
        Ok(node)
    }

    /// Drops the children of the node at the given path.
    pub fn collapse_node(&mut self, path: &[CandidateId]) -> Result<&LazyTreeNode, AuditErrors> {
        let node = self
            .root
            .find_mut(path)
            .ok_or_else(|| AuditErrors::NodeNotFound {
                path: path.to_vec(),
            })?;
        node.children.clear();
        debug!("collapse_node: {:?}", path);
        Ok(node)
    }

    pub fn leaves(&self) -> Vec<&LazyTreeNode> {
        let mut res: Vec<&LazyTreeNode> = Vec::new();
        self.root.collect_leaves(&mut res);
        res
    }

    /// Expands by one layer every leaf that is neither pruned nor complete.
    ///
    /// Returns the number of expanded nodes.
    pub fn expand_layer(&mut self) -> Result<usize, AuditErrors> {
        let paths: Vec<Suffix> = self
            .leaves()
            .iter()
            .filter(|n| !n.pruned() && !n.remaining.is_empty())
            .map(|n| n.path.clone())
            .collect();
        for p in paths.iter() {
            self.expand_node(p)?;
        }
        info!("expand_layer: expanded {} nodes", paths.len());
        Ok(paths.len())
    }
}
