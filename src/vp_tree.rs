//! Vantage-point tree for exact nearest-centroid queries.
//!
//! Each node holds one reference point and a radius (the median distance from
//! that point to the rest of its subtree). Points closer than the radius go to
//! the left child, the rest to the right. Queries descend with a shrinking
//! search radius and skip any subtree that cannot contain a closer point.
//!
//! The tree is rebuilt over the current centroids before every assignment
//! pass; building is cheap next to assigning the observations.

use std::cmp::Ordering;

use crate::matrix::{column, squared_distance, Scalar};
use crate::random::{discrete_uniform, engine, Engine};

/// Fixed so that the shape of the tree is reproducible everywhere.
const BUILD_SEED: u64 = 1234567890;

#[derive(Debug, Clone)]
struct Node<T> {
    /// Euclidean (not squared) distance separating the two children.
    threshold: T,
    /// Index of the vantage point in the reference set.
    index: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// Nearest-neighbor index over a borrowed column-major reference set.
#[derive(Debug, Clone)]
pub struct VpTree<'a, T> {
    ndim: usize,
    reference: &'a [T],
    nodes: Vec<Node<T>>,
}

impl<'a, T: Scalar> VpTree<'a, T> {
    /// Indexes the first `npoints` columns of `reference`.
    pub fn new(ndim: usize, npoints: usize, reference: &'a [T]) -> Self {
        let mut tree = Self {
            ndim,
            reference,
            nodes: Vec::with_capacity(npoints),
        };
        let mut items: Vec<(usize, T)> = (0..npoints).map(|i| (i, T::zero())).collect();
        let mut rng = engine(BUILD_SEED);
        tree.build(0, npoints, &mut items, &mut rng);
        tree
    }

    fn point(&self, i: usize) -> &'a [T] {
        column(self.reference, self.ndim, i)
    }

    fn build(
        &mut self,
        lower: usize,
        upper: usize,
        items: &mut [(usize, T)],
        rng: &mut Engine,
    ) -> Option<usize> {
        if lower == upper {
            return None;
        }

        let pos = self.nodes.len();
        self.nodes.push(Node {
            threshold: T::zero(),
            index: items[lower].0,
            left: None,
            right: None,
        });

        let gap = upper - lower;
        if gap == 1 {
            return Some(pos);
        }

        // Move an arbitrary vantage point to the front of the slice.
        let pivot = lower + discrete_uniform(rng, gap);
        items.swap(lower, pivot);
        let vantage = self.point(items[lower].0);
        for item in &mut items[lower + 1..upper] {
            item.1 = squared_distance(vantage, self.point(item.0));
        }

        // Partition around the median distance.
        let median = lower + gap / 2;
        items[lower + 1..upper].select_nth_unstable_by(median - lower - 1, |a, b| {
            a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal)
        });

        let threshold = items[median].1.sqrt();
        let index = items[lower].0;
        let left = self.build(lower + 1, median, items, rng);
        let right = self.build(median, upper, items, rng);

        let node = &mut self.nodes[pos];
        node.threshold = threshold;
        node.index = index;
        node.left = left;
        node.right = right;
        Some(pos)
    }

    fn search(&self, node: Option<usize>, target: &[T], closest: &mut usize, tau: &mut T) {
        let node = match node {
            Some(i) => &self.nodes[i],
            None => return,
        };

        let dist = squared_distance(self.point(node.index), target).sqrt();
        if dist < *tau {
            *closest = node.index;
            *tau = dist;
        }

        if node.left.is_none() && node.right.is_none() {
            return;
        }

        if dist < node.threshold {
            // Inside the ball: the left side is the better bet.
            if dist - *tau <= node.threshold {
                self.search(node.left, target, closest, tau);
            }
            if dist + *tau >= node.threshold {
                self.search(node.right, target, closest, tau);
            }
        } else {
            if dist + *tau >= node.threshold {
                self.search(node.right, target, closest, tau);
            }
            if dist - *tau <= node.threshold {
                self.search(node.left, target, closest, tau);
            }
        }
    }

    /// Index of the reference point closest to `query`.
    ///
    /// An empty tree always answers 0.
    pub fn find(&self, query: &[T]) -> usize {
        let mut closest = 0;
        let mut tau = T::max_value();
        let root = if self.nodes.is_empty() { None } else { Some(0) };
        self.search(root, query, &mut closest, &mut tau);
        closest
    }

    /// Index of the reference point closest to `query` and its squared
    /// distance.
    pub fn find_with_distance(&self, query: &[T]) -> (usize, T) {
        let closest = self.find(query);
        if self.nodes.is_empty() {
            return (closest, T::max_value());
        }
        (closest, squared_distance(self.point(closest), query))
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
