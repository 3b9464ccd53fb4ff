//! Spatial index over population cell centers.

use geo::{BoundingRect, Intersects, Point, Rect};
use rstar::{RTree, RTreeObject, AABB};
use tracing::debug;

use crate::models::PopulationCell;

/// Wrapper for R-tree indexing of a cell by its position in the cell slice
#[derive(Clone)]
struct IndexedCell {
    slot: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedCell {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree of cell centers. Lookups return slots into the slice the index was
/// built from.
pub struct CellIndex {
    tree: RTree<IndexedCell>,
}

impl CellIndex {
    pub fn build(cells: &[PopulationCell]) -> Self {
        let indexed: Vec<IndexedCell> = cells
            .iter()
            .enumerate()
            .map(|(slot, cell)| IndexedCell {
                slot,
                envelope: AABB::from_point([cell.x, cell.y]),
            })
            .collect();

        let tree = RTree::bulk_load(indexed);
        debug!("Cell index built with {} entries", tree.size());

        Self { tree }
    }

    /// Slots of all cells lying inside or on the boundary of `area`, ascending
    pub fn locate_within<G>(&self, cells: &[PopulationCell], area: &G) -> Vec<usize>
    where
        G: BoundingRect<f64> + Intersects<Point<f64>>,
    {
        let Some(rect): Option<Rect<f64>> = area.bounding_rect().into() else {
            return Vec::new();
        };
        let query_envelope = AABB::from_corners(
            [rect.min().x, rect.min().y],
            [rect.max().x, rect.max().y],
        );

        // Use R-tree to get candidates via envelope intersection, then filter with exact containment
        let mut slots: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|ic| area.intersects(&cells[ic.slot].point()))
            .map(|ic| ic.slot)
            .collect();
        slots.sort_unstable();
        slots
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn grid() -> Vec<PopulationCell> {
        // 5x5 cells at integer coordinates
        (0..25)
            .map(|i| PopulationCell::new(i, (i % 5) as f64, (i / 5) as f64, 1))
            .collect()
    }

    #[test]
    fn test_boundary_points_included() {
        let cells = grid();
        let index = CellIndex::build(&cells);
        assert_eq!(index.len(), 25);

        let square = polygon![
            (x: 1.0, y: 1.0),
            (x: 3.0, y: 1.0),
            (x: 3.0, y: 3.0),
            (x: 1.0, y: 3.0),
            (x: 1.0, y: 1.0),
        ];
        let slots = index.locate_within(&cells, &square);
        // 3x3 block including the edges and corners
        assert_eq!(slots, vec![6, 7, 8, 11, 12, 13, 16, 17, 18]);
    }

    #[test]
    fn test_bbox_candidates_outside_triangle_excluded() {
        let cells = grid();
        let index = CellIndex::build(&cells);
        let triangle = polygon![
            (x: 0.0, y: 0.0),
            (x: 4.0, y: 0.0),
            (x: 0.0, y: 4.0),
            (x: 0.0, y: 0.0),
        ];
        let slots = index.locate_within(&cells, &triangle);
        for slot in &slots {
            let c = &cells[*slot];
            assert!(c.x + c.y <= 4.0);
        }
        // 5 + 4 + 3 + 2 + 1 points on or under the hypotenuse
        assert_eq!(slots.len(), 15);
    }

    #[test]
    fn test_empty_index() {
        let index = CellIndex::build(&[]);
        assert!(index.is_empty());
    }
}
