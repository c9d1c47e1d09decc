//! A* search over the toroidal grid
//!
//! The search is deterministic: among open nodes with equal `f = g + h` the one
//! first inserted into the open set is expanded first, and neighbors are
//! expanded in the grid's east, west, south, north order. Downstream agent
//! behavior (and its tests) rely on both rules.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use super::grid::{Cell, Grid};

/// Open-set entry ordered by `(f, rank)` where `rank` is the node's first
/// insertion order. Wrapped in `Reverse` to turn the max-heap into a min-heap.
type OpenEntry = Reverse<(i32, u64, usize)>;

/// Find a shortest path from `start` to `goal` avoiding `blocked` cells.
///
/// The returned path begins with `start`, ends with `goal`, and every
/// consecutive pair is wrapped-adjacent. `start` itself is never tested
/// against `blocked`; a blocked `goal` is unreachable. Returns `None` when the
/// open set empties without reaching the goal.
///
/// The heuristic is the plain Manhattan distance without seam shortcuts. On a
/// free grid the returned path is never longer than that distance, and equals
/// it whenever no seam crossing is shorter.
pub fn find_path(
    grid: &Grid,
    start: Cell,
    goal: Cell,
    blocked: &HashSet<Cell>,
) -> Option<Vec<Cell>> {
    if start == goal {
        return Some(vec![start]);
    }
    if blocked.contains(&goal) {
        return None;
    }

    let cell_count = grid.cell_count();
    let mut g_score = vec![i32::MAX; cell_count];
    let mut parent: Vec<Option<usize>> = vec![None; cell_count];
    let mut rank: Vec<Option<u64>> = vec![None; cell_count];
    let mut closed = vec![false; cell_count];
    let mut open: BinaryHeap<OpenEntry> = BinaryHeap::new();
    let mut next_rank = 0_u64;

    let start_idx = grid.index(start);
    let goal_idx = grid.index(goal);

    g_score[start_idx] = 0;
    rank[start_idx] = Some(next_rank);
    open.push(Reverse((start.manhattan(goal), next_rank, start_idx)));
    next_rank += 1;

    while let Some(Reverse((_, _, current_idx))) = open.pop() {
        // An improved node is pushed again with a lower f; the older entry
        // surfaces after the node is closed and is dropped here.
        if closed[current_idx] {
            continue;
        }

        if current_idx == goal_idx {
            return Some(reconstruct(grid, &parent, goal_idx));
        }

        closed[current_idx] = true;
        let current = grid.cell_at(current_idx);
        let tentative_g = g_score[current_idx] + 1;

        for neighbor in grid.neighbors(current) {
            let neighbor_idx = grid.index(neighbor);

            if closed[neighbor_idx] || blocked.contains(&neighbor) {
                continue;
            }

            if tentative_g >= g_score[neighbor_idx] {
                continue;
            }

            g_score[neighbor_idx] = tentative_g;
            parent[neighbor_idx] = Some(current_idx);

            // Keep the first-insertion rank so an update does not lose its
            // place among equal-f ties.
            let neighbor_rank = *rank[neighbor_idx].get_or_insert_with(|| {
                let assigned = next_rank;
                next_rank += 1;
                assigned
            });

            let f = tentative_g + neighbor.manhattan(goal);
            open.push(Reverse((f, neighbor_rank, neighbor_idx)));
        }
    }

    None
}

fn reconstruct(grid: &Grid, parent: &[Option<usize>], goal_idx: usize) -> Vec<Cell> {
    let mut path = vec![grid.cell_at(goal_idx)];
    let mut cursor = goal_idx;

    while let Some(previous) = parent[cursor] {
        path.push(grid.cell_at(previous));
        cursor = previous;
    }

    path.reverse();
    path
}
