use std::collections::BTreeMap;

use crate::hashing::distance::Metric;

/// A Burkhard-Keller tree: a metric-space index for radius-bounded and
/// best-match nearest-neighbour queries over discrete metrics such as
/// Hamming distance.
///
/// The tree is append-only: there is no deletion and no rebalancing, so its
/// shape depends on insertion order. Average descent is O(log n) for
/// well-distributed metric spaces, degrading to O(n) for clustered data.
///
/// Radius queries prune with the triangle-inequality window
/// `[d - radius, d + radius]` over child edge keys. (Both bounds must hold
/// simultaneously; a subtree is visited only when its edge distance lies
/// inside the whole window.)
#[derive(Clone, Debug)]
pub struct BkTree<T: Metric> {
    root: Option<BkTreeNode<T>>,
    len: usize,
}

impl<T: Metric> Default for BkTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
struct BkTreeNode<T> {
    data: T,
    //children keyed by their exact distance from this node's data
    children: BTreeMap<u32, BkTreeNode<T>>,
}

impl<T: Metric> BkTree<T> {
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Insert an element. The first element becomes the root; every other
    /// element descends along matching edge distances until a free slot is
    /// found.
    pub fn add(&mut self, element: T) {
        self.len += 1;

        let Some(root) = self.root.as_mut() else {
            self.root = Some(BkTreeNode {
                data: element,
                children: BTreeMap::new(),
            });
            return;
        };

        let mut node = root;
        loop {
            let dist = node.data.distance(&element);
            //a repeat of an existing element (distance 0 to a stored node)
            //still gets stored, chained under the 0 edge
            match node.children.entry(dist) {
                std::collections::btree_map::Entry::Vacant(slot) => {
                    slot.insert(BkTreeNode {
                        data: element,
                        children: BTreeMap::new(),
                    });
                    return;
                }
                std::collections::btree_map::Entry::Occupied(slot) => {
                    node = slot.into_mut();
                }
            }
        }
    }

    /// Every stored element within `radius` of `target`, with its exact
    /// distance. Unordered.
    pub fn query(&self, target: &T, radius: u32) -> Vec<(&T, u32)> {
        let mut ret = vec![];

        let Some(root) = self.root.as_ref() else {
            return ret;
        };

        let mut pending = vec![root];
        while let Some(node) = pending.pop() {
            let dist = node.data.distance(target);
            if dist <= radius {
                ret.push((&node.data, dist));
            }

            let lower = dist.saturating_sub(radius);
            let upper = dist.saturating_add(radius);
            pending.extend(node.children.range(lower..=upper).map(|(_d, child)| child));
        }

        ret
    }

    /// The stored element closest to `target`, with its distance. Ties are
    /// broken deterministically: subtrees are descended in ascending
    /// edge-distance order, the first equally-close element found becomes
    /// the incumbent, and an incumbent is never displaced by an equal
    /// distance.
    pub fn find_closest(&self, target: &T) -> Option<(&T, u32)> {
        let root = self.root.as_ref()?;

        let mut best: Option<(&T, u32)> = None;

        let mut pending = vec![root];
        while let Some(node) = pending.pop() {
            let dist = node.data.distance(target);
            match best {
                Some((_, best_dist)) if dist >= best_dist => (),
                _ => best = Some((&node.data, dist)),
            }

            let radius = best.map(|(_, d)| d).unwrap_or(u32::MAX);
            let lower = dist.saturating_sub(radius);
            let upper = dist.saturating_add(radius);
            //pushed highest edge first so the stack pops ascending edges
            pending.extend(
                node.children
                    .range(lower..=upper)
                    .rev()
                    .map(|(_d, child)| child),
            );
        }

        best
    }
}
