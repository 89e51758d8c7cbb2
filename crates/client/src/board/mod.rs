// Board reconciliation: snapshot -> ordered draw plan
//
// Every snapshot throws away the previous plan and rebuilds it in row-major
// order. Paint order equals plan order, so a crash marker always lands on top
// of the block it belongs to.
use protocol::{Board, BoardError, CellStatus, Color, PlayerCode, Position};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{BoardConfig, PaletteConfig};

/// Pixel rectangle covered by one grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub origin: Position,
    pub size: Position,
}

impl Bounds {
    fn cell(row: usize, col: usize, cell_size: f32) -> Self {
        Self {
            origin: Position::new(col as f32 * cell_size, row as f32 * cell_size),
            size: Position::splat(cell_size),
        }
    }

    /// Bottom-right corner.
    pub fn max(&self) -> Position {
        self.origin + self.size
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Coloured square for a head, trail segment or crash site.
    Block {
        status: CellStatus,
        slot: u8,
        color: Color,
        opacity: f32,
        is_self: bool,
    },
    /// Cross drawn over a crash site.
    DeathMarker { color: Color },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawable {
    pub row: usize,
    pub col: usize,
    pub bounds: Bounds,
    pub shape: Shape,
}

/// Everything the renderer needs for one frame, in paint order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawPlan {
    pub rows: usize,
    pub cols: usize,
    pub entities: Vec<Drawable>,
    /// Cell of the local player's head, if it is on the board.
    pub self_head: Option<(usize, usize)>,
}

impl DrawPlan {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Drawables anchored at one cell, in paint order.
    pub fn at(&self, row: usize, col: usize) -> impl Iterator<Item = &Drawable> {
        self.entities.iter().filter(move |d| d.row == row && d.col == col)
    }
}

/// Owns the last accepted draw plan.
pub struct Reconciler {
    board: BoardConfig,
    palette: PaletteConfig,
    dimensions: Option<(usize, usize)>,
    plan: DrawPlan,
    accepted: u64,
}

impl Reconciler {
    pub fn new(board: BoardConfig, palette: PaletteConfig) -> Self {
        Self {
            board,
            palette,
            dimensions: None,
            plan: DrawPlan::default(),
            accepted: 0,
        }
    }

    /// Fix the match dimensions ahead of the first snapshot.
    pub fn fix_dimensions(&mut self, rows: usize, cols: usize) {
        if self.dimensions.is_none() && rows > 0 {
            self.dimensions = Some((rows, cols));
        }
    }

    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.dimensions
    }

    #[inline]
    pub fn plan(&self) -> &DrawPlan {
        &self.plan
    }

    /// Number of snapshots accepted so far.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Decode and apply a transport board. On error the previous plan stays.
    pub fn apply_snapshot(&mut self, value: &Value, self_slot: Option<u8>) -> Result<&DrawPlan, BoardError> {
        let board = Board::decode(value)?;
        self.apply_board(&board, self_slot)
    }

    /// Rebuild the plan from a decoded board. On error the previous plan stays.
    pub fn apply_board(&mut self, board: &Board, self_slot: Option<u8>) -> Result<&DrawPlan, BoardError> {
        if board.rows() > 0 {
            if let Some((expected_rows, expected_cols)) = self.dimensions {
                if (board.rows(), board.cols()) != (expected_rows, expected_cols) {
                    return Err(BoardError::DimensionMismatch {
                        rows: board.rows(),
                        cols: board.cols(),
                        expected_rows,
                        expected_cols,
                    });
                }
            }
        }

        let plan = self.build(board, self_slot)?;

        if self.dimensions.is_none() && board.rows() > 0 {
            info!(rows = board.rows(), cols = board.cols(), "board dimensions fixed");
            self.dimensions = Some((board.rows(), board.cols()));
        }
        debug!(entities = plan.entities.len(), "snapshot reconciled");
        self.plan = plan;
        self.accepted += 1;
        Ok(&self.plan)
    }

    fn build(&self, board: &Board, self_slot: Option<u8>) -> Result<DrawPlan, BoardError> {
        let mut plan = DrawPlan {
            rows: board.rows(),
            cols: board.cols(),
            entities: Vec::new(),
            self_head: None,
        };

        for (row, col, code) in board.occupied() {
            let color = self
                .palette
                .color_for(code.slot)
                .ok_or(BoardError::Unresolvable { row, col, code })?;
            let bounds = Bounds::cell(row, col, self.board.cell_size);
            let is_self = self_slot == Some(code.slot);

            plan.entities.push(Drawable {
                row,
                col,
                bounds,
                shape: Shape::Block {
                    status: code.status,
                    slot: code.slot,
                    color,
                    opacity: self.opacity(code),
                    is_self,
                },
            });

            match code.status {
                CellStatus::Dead => plan.entities.push(Drawable {
                    row,
                    col,
                    bounds,
                    shape: Shape::DeathMarker {
                        color: self.board.marker_color,
                    },
                }),
                CellStatus::Alive if is_self => plan.self_head = Some((row, col)),
                _ => {}
            }
        }

        Ok(plan)
    }

    fn opacity(&self, code: PlayerCode) -> f32 {
        match code.status {
            CellStatus::Alive => 1.0,
            CellStatus::Trail => self.board.trail_opacity,
            CellStatus::Dead => self.board.dead_opacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reconciler() -> Reconciler {
        Reconciler::new(BoardConfig::default(), PaletteConfig::default())
    }

    fn block_count(plan: &DrawPlan) -> usize {
        plan.entities.iter().filter(|d| matches!(d.shape, Shape::Block { .. })).count()
    }

    fn marker_count(plan: &DrawPlan) -> usize {
        plan.entities.iter().filter(|d| matches!(d.shape, Shape::DeathMarker { .. })).count()
    }

    #[test]
    fn test_one_block_per_cell_and_marker_per_crash() {
        let mut r = reconciler();
        let plan = r
            .apply_snapshot(&json!([["p1", "t1", ""], ["d2", "t2", "d3"]]), None)
            .unwrap();
        assert_eq!(block_count(plan), 5);
        assert_eq!(marker_count(plan), 2);
    }

    #[test]
    fn test_marker_follows_its_block() {
        let mut r = reconciler();
        let plan = r.apply_snapshot(&json!([["d1", "p2"]]), None).unwrap();
        let shapes: Vec<&Shape> = plan.entities.iter().map(|d| &d.shape).collect();
        assert!(matches!(shapes[0], Shape::Block { status: CellStatus::Dead, .. }));
        assert!(matches!(shapes[1], Shape::DeathMarker { .. }));
        assert!(matches!(shapes[2], Shape::Block { status: CellStatus::Alive, .. }));
        assert_eq!(plan.entities[1].bounds, plan.entities[0].bounds);
    }

    #[test]
    fn test_paint_order_is_row_major() {
        let mut r = reconciler();
        let plan = r.apply_snapshot(&json!([["", "t1"], ["p1", "t2"]]), None).unwrap();
        let cells: Vec<(usize, usize)> = plan.entities.iter().map(|d| (d.row, d.col)).collect();
        assert_eq!(cells, vec![(0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_bounds_follow_cell_size() {
        let mut r = Reconciler::new(
            BoardConfig {
                cell_size: 20.0,
                ..BoardConfig::default()
            },
            PaletteConfig::default(),
        );
        let plan = r.apply_snapshot(&json!([["", ""], ["", "p1"]]), None).unwrap();
        let bounds = plan.entities[0].bounds;
        assert_eq!(bounds.origin, Position::new(20.0, 20.0));
        assert_eq!(bounds.max(), Position::new(40.0, 40.0));
    }

    #[test]
    fn test_ragged_board_keeps_previous_plan() {
        let mut r = reconciler();
        r.apply_snapshot(&json!([["p1", ""], ["", "p2"]]), None).unwrap();
        let before = r.plan().clone();
        let err = r.apply_snapshot(&json!([["p1", ""], ["t1"]]), None).unwrap_err();
        assert!(matches!(err, BoardError::NotRectangular { .. }));
        assert_eq!(r.plan(), &before);
        assert_eq!(r.accepted(), 1);
    }

    #[test]
    fn test_unknown_code_is_surfaced() {
        let mut r = reconciler();
        assert!(matches!(
            r.apply_snapshot(&json!([["q1"]]), None),
            Err(BoardError::UnknownCode { .. })
        ));
        assert!(r.plan().is_empty());
    }

    #[test]
    fn test_slot_without_colour_is_unresolvable() {
        let mut r = reconciler();
        let err = r.apply_snapshot(&json!([["p1", "t9"]]), None).unwrap_err();
        assert!(matches!(err, BoardError::Unresolvable { row: 0, col: 1, .. }));
    }

    #[test]
    fn test_dimensions_are_fixed_by_first_snapshot() {
        let mut r = reconciler();
        r.apply_snapshot(&json!([["p1", ""]]), None).unwrap();
        assert_eq!(r.dimensions(), Some((1, 2)));
        assert!(matches!(
            r.apply_snapshot(&json!([["p1"], ["t1"]]), None),
            Err(BoardError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_preset_dimensions() {
        let mut r = reconciler();
        r.fix_dimensions(3, 3);
        assert!(r.apply_snapshot(&json!([["p1", ""]]), None).is_err());
        assert!(r.apply_snapshot(&json!([["", "", ""], ["", "p1", ""], ["", "", ""]]), None).is_ok());
    }

    #[test]
    fn test_empty_board_clears_plan() {
        let mut r = reconciler();
        r.apply_snapshot(&json!([["p1"]]), None).unwrap();
        let plan = r.apply_snapshot(&json!([]), None).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_self_head_and_flags() {
        let mut r = reconciler();
        let plan = r.apply_snapshot(&json!([["t1", "p1"], ["p2", ""]]), Some(1)).unwrap();
        assert_eq!(plan.self_head, Some((0, 1)));
        let selfish: Vec<bool> = plan
            .entities
            .iter()
            .map(|d| matches!(d.shape, Shape::Block { is_self: true, .. }))
            .collect();
        assert_eq!(selfish, vec![true, true, false]);
    }

    #[test]
    fn test_opacities() {
        let mut r = reconciler();
        let plan = r.apply_snapshot(&json!([["p1", "t1", "d1"]]), None).unwrap();
        let opacities: Vec<f32> = plan
            .entities
            .iter()
            .filter_map(|d| match d.shape {
                Shape::Block { opacity, .. } => Some(opacity),
                Shape::DeathMarker { .. } => None,
            })
            .collect();
        assert_eq!(opacities, vec![1.0, 0.5, 1.0]);
    }
}
