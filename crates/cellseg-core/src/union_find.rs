//! Equivalence table (disjoint-set forest) over region labels
//!
//! Shared by labeling, label merging and the seeded watershed. Labels are
//! `u32` values starting at 1; entry 0 is reserved for background and is
//! always its own root.
//!
//! Union always makes the numerically smaller root the parent, so the
//! representative of a set is its smallest member and results do not
//! depend on the order in which unions are discovered.

/// Disjoint-set forest mapping each label to its representative
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceTable {
    parent: Vec<u32>,
}

impl Default for EquivalenceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl EquivalenceTable {
    /// Create a table containing only the background entry
    pub fn new() -> Self {
        Self { parent: vec![0] }
    }

    /// Create a table where every label in `1..=max_label` is its own root
    pub fn with_labels(max_label: u32) -> Self {
        Self {
            parent: (0..=max_label).collect(),
        }
    }

    /// Number of entries, background included
    #[inline]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// True if the table holds no label besides background
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parent.len() <= 1
    }

    /// Largest label known to the table
    #[inline]
    pub fn max_label(&self) -> u32 {
        (self.parent.len() - 1) as u32
    }

    /// Allocate the next label as a new singleton set
    pub fn make_label(&mut self) -> u32 {
        let label = self.parent.len() as u32;
        self.parent.push(label);
        label
    }

    /// Make sure `label` (and everything below it) exists as an entry
    pub fn ensure(&mut self, label: u32) {
        while self.parent.len() <= label as usize {
            let next = self.parent.len() as u32;
            self.parent.push(next);
        }
    }

    /// Find the root of `label`, compressing the path behind it
    ///
    /// # Panics
    ///
    /// Panics if `label` was never allocated.
    pub fn find(&mut self, label: u32) -> u32 {
        let mut root = label;
        let mut steps = 0usize;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
            steps += 1;
            debug_assert!(steps <= self.parent.len(), "cycle in equivalence table");
        }
        let mut cur = label;
        while self.parent[cur as usize] != root {
            let next = self.parent[cur as usize];
            self.parent[cur as usize] = root;
            cur = next;
        }
        root
    }

    /// Root of `label` without modifying the table
    pub fn find_immutable(&self, label: u32) -> u32 {
        let mut root = label;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        root
    }

    /// Merge the sets of `a` and `b`, returning the surviving root
    ///
    /// The smaller root becomes the parent of the larger.
    pub fn union(&mut self, a: u32, b: u32) -> u32 {
        let ra = self.find(a);
        let rb = self.find(b);
        let (small, large) = if ra <= rb { (ra, rb) } else { (rb, ra) };
        self.parent[large as usize] = small;
        debug_assert!(small <= large);
        small
    }

    /// True if `a` and `b` belong to the same set
    pub fn same_set(&mut self, a: u32, b: u32) -> bool {
        self.find(a) == self.find(b)
    }

    /// Point every entry directly at its root
    pub fn flatten(&mut self) {
        for label in 0..self.parent.len() as u32 {
            self.find(label);
        }
    }

    /// Number of distinct roots, background excluded
    pub fn root_count(&self) -> usize {
        self.parent
            .iter()
            .enumerate()
            .skip(1)
            .filter(|&(i, &p)| i as u32 == p)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_and_find() {
        let mut t = EquivalenceTable::new();
        let a = t.make_label();
        let b = t.make_label();
        assert_eq!((a, b), (1, 2));
        assert_eq!(t.find(a), 1);
        assert_eq!(t.find(0), 0);
        assert_eq!(t.root_count(), 2);
    }

    #[test]
    fn test_smaller_wins() {
        let mut t = EquivalenceTable::with_labels(5);
        assert_eq!(t.union(5, 3), 3);
        assert_eq!(t.union(4, 5), 3);
        assert_eq!(t.union(2, 4), 2);
        for l in 2..=5 {
            assert_eq!(t.find(l), 2);
        }
        assert_eq!(t.find(1), 1);
        assert_eq!(t.root_count(), 2);
    }

    #[test]
    fn test_union_order_independent() {
        let mut a = EquivalenceTable::with_labels(6);
        a.union(1, 4);
        a.union(6, 4);
        a.union(2, 3);
        let mut b = EquivalenceTable::with_labels(6);
        b.union(3, 2);
        b.union(4, 6);
        b.union(4, 1);
        a.flatten();
        b.flatten();
        assert_eq!(a, b);
    }

    #[test]
    fn test_ensure() {
        let mut t = EquivalenceTable::new();
        t.ensure(4);
        assert_eq!(t.max_label(), 4);
        assert_eq!(t.find_immutable(3), 3);
        assert_eq!(t.make_label(), 5);
    }
}
