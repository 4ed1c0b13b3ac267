// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Static axis-aligned bounding-box tree.
//!
//! The tree is built once from a flat slice of boxes and never mutated;
//! rebuilding means constructing a new tree. Leaf indices match the position
//! of each box in the input slice, so they double as indices into whatever
//! container the boxes were computed from. All queries take `&self` and are
//! safe to run concurrently.
//!
//! Traversal predicates return `bool`: `true` stops the entire remaining
//! search, `false` continues. This lets callers abort as soon as they found
//! what they were looking for.

use crate::{BoundingBox, InfiniteLine, Point, Ray, Segment, Triangle};

#[derive(Debug)]
enum Node<const D: usize> {
    Leaf {
        bbox: BoundingBox<D>,
        element: u32,
    },
    Internal {
        bbox: BoundingBox<D>,
        left: Box<Node<D>>,
        right: Box<Node<D>>,
    },
}

impl<const D: usize> Node<D> {
    fn bbox(&self) -> &BoundingBox<D> {
        match self {
            Node::Leaf { bbox, .. } | Node::Internal { bbox, .. } => bbox,
        }
    }
}

/// A search tree for fast spatial requests over the bounding boxes of
/// elements stored in a single container.
///
/// # Example
///
/// ```
/// use brep_lite_geometry::{AabbTree, BoundingBox, Point3};
///
/// let boxes = vec![
///     BoundingBox::from_min_max(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)),
///     BoundingBox::from_min_max(Point3::new(2.0, 0.0, 0.0), Point3::new(3.0, 1.0, 1.0)),
/// ];
/// let tree = AabbTree::new(&boxes);
///
/// assert_eq!(tree.nb_bboxes(), 2);
/// assert_eq!(tree.containing_boxes(&Point3::new(0.5, 0.5, 0.5)), vec![0]);
/// ```
#[derive(Debug)]
pub struct AabbTree<const D: usize> {
    root: Option<Node<D>>,
    nb_bboxes: u32,
}

impl<const D: usize> AabbTree<D> {
    /// Builds a tree over `bboxes`. An empty slice yields a valid empty tree.
    pub fn new(bboxes: &[BoundingBox<D>]) -> Self {
        if bboxes.is_empty() {
            return Self {
                root: None,
                nb_bboxes: 0,
            };
        }
        let indices: Vec<u32> = (0..bboxes.len() as u32).collect();
        let root = build_recursive(bboxes, indices);
        Self {
            root: Some(root),
            nb_bboxes: bboxes.len() as u32,
        }
    }

    /// Number of boxes in the leaf level. Matches the size of the container
    /// the tree was built from.
    pub fn nb_bboxes(&self) -> u32 {
        self.nb_bboxes
    }

    /// The box enclosing the whole tree, `None` if the tree is empty.
    pub fn bounding_box(&self) -> Option<&BoundingBox<D>> {
        self.root.as_ref().map(Node::bbox)
    }

    /// Returns every leaf index whose box contains `query`.
    pub fn containing_boxes(&self, query: &Point<D>) -> Vec<u32> {
        let mut result = Vec::new();
        if let Some(root) = &self.root {
            containing_recursive(root, query, &mut result);
        }
        result
    }

    /// Branch-and-bound search for the element closest to `query`.
    ///
    /// `eval` computes the exact distance between `query` and the element
    /// behind a leaf box, returning the distance and the nearest point on the
    /// element. Subtrees whose box lies farther than the current best are
    /// pruned. When several elements tie, which one wins is unspecified.
    ///
    /// Returns `None` on an empty tree.
    pub fn closest_element_box<F>(&self, query: &Point<D>, eval: F) -> Option<(u32, Point<D>, f64)>
    where
        F: Fn(&Point<D>, u32) -> (f64, Point<D>),
    {
        let root = self.root.as_ref()?;
        let mut best: Option<(u32, Point<D>, f64)> = None;
        closest_recursive(root, query, &eval, &mut best);
        best
    }

    /// Runs `action` on every leaf element whose box intersects `query`.
    pub fn bbox_intersections<F>(&self, query: &BoundingBox<D>, mut action: F)
    where
        F: FnMut(u32) -> bool,
    {
        if let Some(root) = &self.root {
            filtered_recursive(root, &|bbox| bbox.intersects(query), &mut action);
        }
    }

    /// Runs `action` on every leaf element whose box is hit by `ray`.
    pub fn ray_intersections<F>(&self, ray: &Ray<D>, mut action: F)
    where
        F: FnMut(u32) -> bool,
    {
        if let Some(root) = &self.root {
            filtered_recursive(root, &|bbox| bbox.intersects_ray(ray), &mut action);
        }
    }

    /// Runs `action` on every leaf element whose box is crossed by `line`.
    pub fn line_intersections<F>(&self, line: &InfiniteLine<D>, mut action: F)
    where
        F: FnMut(u32) -> bool,
    {
        if let Some(root) = &self.root {
            filtered_recursive(root, &|bbox| bbox.intersects_line(line), &mut action);
        }
    }

    /// Runs `action` on every leaf element whose box is crossed by `segment`.
    pub fn segment_intersections<F>(&self, segment: &Segment<D>, mut action: F)
    where
        F: FnMut(u32) -> bool,
    {
        if let Some(root) = &self.root {
            filtered_recursive(root, &|bbox| bbox.intersects_segment(segment), &mut action);
        }
    }

    /// Runs `action` on every leaf element whose box overlaps `triangle`'s
    /// bounding box. Candidate filter only: run the exact triangle test in
    /// `action`.
    pub fn triangle_intersections<F>(&self, triangle: &Triangle<D>, mut action: F)
    where
        F: FnMut(u32) -> bool,
    {
        let triangle_box = triangle.bounding_box();
        if let Some(root) = &self.root {
            filtered_recursive(root, &|bbox| bbox.intersects(&triangle_box), &mut action);
        }
    }

    /// Runs `action` on every intersecting pair of element boxes of this
    /// tree. Each unordered pair is reported once; `(i, i)` pairs are never
    /// reported.
    pub fn self_intersections<F>(&self, mut action: F)
    where
        F: FnMut(u32, u32) -> bool,
    {
        if let Some(root) = &self.root {
            self_recursive(root, &mut action);
        }
    }

    /// Runs `action` on every intersecting pair of element boxes between
    /// this tree and `other`. The first index belongs to this tree.
    pub fn other_intersections<F>(&self, other: &AabbTree<D>, mut action: F)
    where
        F: FnMut(u32, u32) -> bool,
    {
        if let (Some(a), Some(b)) = (&self.root, &other.root) {
            pair_recursive(a, b, &mut action);
        }
    }
}

fn build_recursive<const D: usize>(bboxes: &[BoundingBox<D>], indices: Vec<u32>) -> Node<D> {
    let mut bbox = BoundingBox::new();
    for &i in &indices {
        bbox.add_box(&bboxes[i as usize]);
    }

    if indices.len() == 1 {
        return Node::Leaf {
            bbox: bboxes[indices[0] as usize].clone(),
            element: indices[0],
        };
    }

    // Median split along the longest axis of the centroid bounds.
    let mut centroid_bounds = BoundingBox::new();
    for &i in &indices {
        centroid_bounds.add_point(&bboxes[i as usize].center());
    }
    let axis = centroid_bounds.longest_axis();

    let mut sorted = indices;
    sorted.sort_by(|&a, &b| {
        let ca = bboxes[a as usize].center()[axis];
        let cb = bboxes[b as usize].center()[axis];
        ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mid = sorted.len() / 2;
    let right_indices = sorted.split_off(mid);
    let left = build_recursive(bboxes, sorted);
    let right = build_recursive(bboxes, right_indices);

    Node::Internal {
        bbox,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn containing_recursive<const D: usize>(node: &Node<D>, query: &Point<D>, result: &mut Vec<u32>) {
    if !node.bbox().contains(query) {
        return;
    }
    match node {
        Node::Leaf { element, .. } => result.push(*element),
        Node::Internal { left, right, .. } => {
            containing_recursive(left, query, result);
            containing_recursive(right, query, result);
        }
    }
}

fn closest_recursive<const D: usize, F>(
    node: &Node<D>,
    query: &Point<D>,
    eval: &F,
    best: &mut Option<(u32, Point<D>, f64)>,
) where
    F: Fn(&Point<D>, u32) -> (f64, Point<D>),
{
    if let Some((_, _, best_distance)) = best {
        if node.bbox().distance_to(query) > *best_distance {
            return;
        }
    }
    match node {
        Node::Leaf { element, .. } => {
            let (distance, nearest) = eval(query, *element);
            let improves = match best {
                Some((_, _, best_distance)) => distance < *best_distance,
                None => true,
            };
            if improves {
                *best = Some((*element, nearest, distance));
            }
        }
        Node::Internal { left, right, .. } => {
            // Nearer child first tightens the bound earlier.
            let (first, second) = if left.bbox().distance_to(query) <= right.bbox().distance_to(query)
            {
                (left, right)
            } else {
                (right, left)
            };
            closest_recursive(first, query, eval, best);
            closest_recursive(second, query, eval, best);
        }
    }
}

/// Generic filtered traversal. Returns `true` once `action` asked to stop.
fn filtered_recursive<const D: usize, P, F>(node: &Node<D>, overlaps: &P, action: &mut F) -> bool
where
    P: Fn(&BoundingBox<D>) -> bool,
    F: FnMut(u32) -> bool,
{
    if !overlaps(node.bbox()) {
        return false;
    }
    match node {
        Node::Leaf { element, .. } => action(*element),
        Node::Internal { left, right, .. } => {
            filtered_recursive(left, overlaps, action) || filtered_recursive(right, overlaps, action)
        }
    }
}

fn self_recursive<const D: usize, F>(node: &Node<D>, action: &mut F) -> bool
where
    F: FnMut(u32, u32) -> bool,
{
    match node {
        Node::Leaf { .. } => false,
        Node::Internal { left, right, .. } => {
            self_recursive(left, action)
                || self_recursive(right, action)
                || pair_recursive(left, right, action)
        }
    }
}

fn pair_recursive<const D: usize, F>(a: &Node<D>, b: &Node<D>, action: &mut F) -> bool
where
    F: FnMut(u32, u32) -> bool,
{
    if !a.bbox().intersects(b.bbox()) {
        return false;
    }
    match (a, b) {
        (Node::Leaf { element: i, .. }, Node::Leaf { element: j, .. }) => action(*i, *j),
        (Node::Leaf { .. }, Node::Internal { left, right, .. }) => {
            pair_recursive(a, left, action) || pair_recursive(a, right, action)
        }
        (Node::Internal { left, right, .. }, _) => {
            pair_recursive(left, b, action) || pair_recursive(right, b, action)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Point2, Point3, Vector};
    use approx::assert_relative_eq;

    /// Deterministic pseudo-random sequence for synthetic box sets.
    struct Lcg(u64);

    impl Lcg {
        fn next_f64(&mut self) -> f64 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (self.0 >> 11) as f64 / (1u64 << 53) as f64
        }
    }

    fn random_boxes(count: usize, seed: u64) -> Vec<BoundingBox<3>> {
        let mut rng = Lcg(seed);
        (0..count)
            .map(|_| {
                let origin = Point3::new(
                    rng.next_f64() * 10.0,
                    rng.next_f64() * 10.0,
                    rng.next_f64() * 10.0,
                );
                let size = 0.1 + rng.next_f64() * 2.0;
                BoundingBox::from_min_max(
                    origin,
                    Point3::new(origin.x + size, origin.y + size, origin.z + size),
                )
            })
            .collect()
    }

    #[test]
    fn empty_tree() {
        let tree = AabbTree::<3>::new(&[]);
        assert_eq!(tree.nb_bboxes(), 0);
        assert!(tree.bounding_box().is_none());
        assert!(tree.containing_boxes(&Point3::origin()).is_empty());
        assert!(tree
            .closest_element_box(&Point3::origin(), |_, _| (0.0, Point3::origin()))
            .is_none());
    }

    #[test]
    fn containing_boxes_matches_brute_force() {
        let boxes = random_boxes(128, 7);
        let tree = AabbTree::new(&boxes);
        let mut rng = Lcg(99);

        for _ in 0..200 {
            let query = Point3::new(
                rng.next_f64() * 12.0,
                rng.next_f64() * 12.0,
                rng.next_f64() * 12.0,
            );
            let mut expected: Vec<u32> = boxes
                .iter()
                .enumerate()
                .filter(|(_, b)| b.contains(&query))
                .map(|(i, _)| i as u32)
                .collect();
            let mut actual = tree.containing_boxes(&query);
            expected.sort_unstable();
            actual.sort_unstable();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn closest_element_matches_brute_force() {
        let boxes = random_boxes(64, 21);
        let tree = AabbTree::new(&boxes);
        // Element distance: distance to the box center.
        let eval = |query: &Point3, element: u32| {
            let center = boxes[element as usize].center();
            ((center - query).norm(), center)
        };

        let mut rng = Lcg(5);
        for _ in 0..50 {
            let query = Point3::new(
                rng.next_f64() * 12.0,
                rng.next_f64() * 12.0,
                rng.next_f64() * 12.0,
            );
            let (element, nearest, distance) = tree.closest_element_box(&query, eval).unwrap();
            let brute = boxes
                .iter()
                .map(|b| (b.center() - query).norm())
                .fold(f64::INFINITY, f64::min);
            assert_relative_eq!(distance, brute, epsilon = 1e-12);
            assert_relative_eq!(
                (boxes[element as usize].center() - nearest).norm(),
                0.0,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn bbox_intersections_collects_overlaps() {
        let boxes = vec![
            BoundingBox::from_min_max(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)),
            BoundingBox::from_min_max(Point3::new(5.0, 0.0, 0.0), Point3::new(6.0, 1.0, 1.0)),
            BoundingBox::from_min_max(Point3::new(0.5, 0.5, 0.5), Point3::new(1.5, 1.5, 1.5)),
        ];
        let tree = AabbTree::new(&boxes);
        let query =
            BoundingBox::from_min_max(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0));

        let mut found = Vec::new();
        tree.bbox_intersections(&query, |element| {
            found.push(element);
            false
        });
        found.sort_unstable();
        assert_eq!(found, vec![0, 2]);
    }

    #[test]
    fn traversal_stops_on_first_true() {
        let boxes = random_boxes(64, 3);
        let tree = AabbTree::new(&boxes);
        let query = tree.bounding_box().unwrap().clone();

        let mut visited = 0;
        tree.bbox_intersections(&query, |_| {
            visited += 1;
            true
        });
        assert_eq!(visited, 1);
    }

    #[test]
    fn ray_traversal_finds_crossed_boxes() {
        let boxes = vec![
            BoundingBox::from_min_max(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)),
            BoundingBox::from_min_max(Point3::new(3.0, 0.0, 0.0), Point3::new(4.0, 1.0, 1.0)),
            BoundingBox::from_min_max(Point3::new(0.0, 3.0, 0.0), Point3::new(1.0, 4.0, 1.0)),
        ];
        let tree = AabbTree::new(&boxes);
        let ray = Ray::new(Point3::new(-1.0, 0.5, 0.5), Vector::<3>::new(1.0, 0.0, 0.0));

        let mut found = Vec::new();
        tree.ray_intersections(&ray, |element| {
            found.push(element);
            false
        });
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn self_intersections_reports_each_pair_once() {
        let boxes = vec![
            BoundingBox::from_min_max(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0)),
            BoundingBox::from_min_max(Point3::new(1.0, 1.0, 1.0), Point3::new(3.0, 3.0, 3.0)),
            BoundingBox::from_min_max(Point3::new(10.0, 10.0, 10.0), Point3::new(11.0, 11.0, 11.0)),
        ];
        let tree = AabbTree::new(&boxes);

        let mut pairs = Vec::new();
        tree.self_intersections(|i, j| {
            let pair = (i.min(j), i.max(j));
            assert_ne!(i, j);
            pairs.push(pair);
            false
        });
        pairs.sort_unstable();
        pairs.dedup();
        assert_eq!(pairs, vec![(0, 1)]);
    }

    #[test]
    fn self_intersections_match_brute_force() {
        let boxes = random_boxes(48, 13);
        let tree = AabbTree::new(&boxes);

        let mut pairs = Vec::new();
        tree.self_intersections(|i, j| {
            pairs.push((i.min(j), i.max(j)));
            false
        });
        pairs.sort_unstable();

        let mut expected = Vec::new();
        for i in 0..boxes.len() {
            for j in i + 1..boxes.len() {
                if boxes[i].intersects(&boxes[j]) {
                    expected.push((i as u32, j as u32));
                }
            }
        }
        assert_eq!(pairs, expected);
    }

    #[test]
    fn other_intersections_between_two_trees() {
        let a = AabbTree::new(&[BoundingBox::from_min_max(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
        )]);
        let b = AabbTree::new(&[
            BoundingBox::from_min_max(Point3::new(0.5, 0.5, 0.5), Point3::new(2.0, 2.0, 2.0)),
            BoundingBox::from_min_max(Point3::new(5.0, 5.0, 5.0), Point3::new(6.0, 6.0, 6.0)),
        ]);

        let mut pairs = Vec::new();
        a.other_intersections(&b, |i, j| {
            pairs.push((i, j));
            false
        });
        assert_eq!(pairs, vec![(0, 0)]);
    }

    #[test]
    fn two_dimensional_tree() {
        let boxes = vec![
            BoundingBox::<2>::from_min_max(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)),
            BoundingBox::<2>::from_min_max(Point2::new(2.0, 2.0), Point2::new(3.0, 3.0)),
        ];
        let tree = AabbTree::new(&boxes);
        assert_eq!(tree.nb_bboxes(), 2);
        assert_eq!(tree.containing_boxes(&Point2::new(2.5, 2.5)), vec![1]);
    }
}
