/// One `<map>` record of the hierarchy descriptor and the records nested in it.
///
/// This is tree shape only; joining records to loaded maps happens in the core crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyNode {
    pub id: u32,
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    pub fn leaf(id: u32) -> Self {
        Self {
            id,
            children: Vec::new(),
        }
    }

    pub fn with_children(id: u32, children: Vec<HierarchyNode>) -> Self {
        Self { id, children }
    }

    /// Ids of this record and everything below it, pre-order.
    pub fn ids(&self) -> Vec<u32> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node.id);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Number of records in this subtree, including this one.
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(HierarchyNode::subtree_size).sum::<usize>()
    }
}
