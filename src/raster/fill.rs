use log::debug;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use rstar::RTree;

use super::RasterGrid;
use crate::error::{HeightError, Result};


/// Replaces every missing cell with the value of the nearest known cell,
/// measured in `(row, col)` index space.
///
/// Ties between equidistant known cells go to the smallest `(row, col)` in
/// lexicographic order, which makes the result independent of tree layout and
/// thread scheduling.
pub fn fill_gaps(grid: &RasterGrid) -> Result<RasterGrid> {
    let (rows, columns) = grid.dimensions();
    let cells = grid.cells();

    let (known, missing): (Vec<usize>, Vec<usize>) =
        (0..cells.len()).partition(|&offset| cells[offset].is_some());

    if known.is_empty() {
        return Err(HeightError::AllCellsMissing);
    }
    if missing.is_empty() {
        return Ok(grid.clone());
    }

    debug!(
        "filling {} of {} cells in a {}x{} grid",
        missing.len(),
        cells.len(),
        rows,
        columns
    );

    let tree: RTree<[i64; 2]> = RTree::bulk_load(
        known
            .iter()
            .map(|&offset| {
                let (row, col) = grid.index_of(offset);
                [row as i64, col as i64]
            })
            .collect(),
    );

    let fills: Vec<(usize, Option<f64>)> = missing
        .into_par_iter()
        .map(|offset| {
            let (row, col) = grid.index_of(offset);
            let source = nearest_known(&tree, [row as i64, col as i64]);
            (offset, source.and_then(|[r, c]| grid.get(r as usize, c as usize)))
        })
        .collect();

    let mut filled = cells.to_vec();
    for (offset, value) in fills {
        filled[offset] = value;
    }

    Ok(grid.with_cells(filled))
}

fn nearest_known(tree: &RTree<[i64; 2]>, query: [i64; 2]) -> Option<[i64; 2]> {
    let mut candidates = tree.nearest_neighbor_iter_with_distance_2(&query);
    let (first, best_distance) = candidates.next()?;

    let mut chosen = *first;
    for (candidate, distance) in candidates {
        if distance > best_distance {
            break;
        }
        if *candidate < chosen {
            chosen = *candidate;
        }
    }

    Some(chosen)
}
