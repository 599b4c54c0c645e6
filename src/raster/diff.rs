use super::RasterGrid;
use crate::error::{HeightError, Result};

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::error::HeightError;
    use crate::raster::{difference, GeoTransform, RasterGrid, DEFAULT_HEIGHT_CEILING};

    fn grid(rows: Vec<Vec<f64>>) -> RasterGrid {
        let rows = rows.into_iter().map(|r| r.into_iter().map(Some).collect()).collect();
        RasterGrid::from_rows(rows, GeoTransform::north_up(0.0, 0.0, 0.5), 28992)
    }

    #[test]
    fn subtracts_terrain_from_surface() {
        let top = grid(vec![vec![15.0, 12.0], vec![10.0, 8.0]]);
        let bottom = grid(vec![vec![5.0, 5.0], vec![5.0, 5.0]]);

        let height = difference(&top, &bottom, DEFAULT_HEIGHT_CEILING).unwrap();

        assert_eq!(height, grid(vec![vec![10.0, 7.0], vec![5.0, 3.0]]));
    }

    #[rstest]
    #[case::negative_is_clamped(3.0, 5.0, 0.0)]
    #[case::outlier_is_rejected_not_capped(2000.0, 0.0, 0.0)]
    #[case::ceiling_itself_is_kept(1005.0, 5.0, 1000.0)]
    #[case::zero_stays_zero(5.0, 5.0, 0.0)]
    fn clamps_single_cells(#[case] top: f64, #[case] bottom: f64, #[case] expected: f64) {
        let height = difference(&grid(vec![vec![top]]), &grid(vec![vec![bottom]]), 1000.0).unwrap();

        assert_eq!(height.cells(), &[Some(expected)]);
    }

    #[test]
    fn every_output_cell_is_zero_or_within_the_ceiling() {
        let top = grid(vec![vec![-20.0, 0.0, 4.0, 60.0, 5000.0, 49.0]]);
        let bottom = grid(vec![vec![0.0, 10.0, 1.0, 1.0, 1.0, -1.0]]);

        let height = difference(&top, &bottom, 50.0).unwrap();

        assert_eq!(height.dimensions(), top.dimensions());
        assert!(height
            .cells()
            .iter()
            .all(|c| matches!(c, Some(v) if *v == 0.0 || (*v > 0.0 && *v <= 50.0))));
    }

    #[test]
    fn unequal_shapes_fail() {
        let top = grid(vec![vec![1.0, 2.0]]);
        let bottom = grid(vec![vec![1.0], vec![2.0]]);

        let err = difference(&top, &bottom, 1000.0).unwrap_err();

        assert!(matches!(
            err,
            HeightError::DimensionMismatch { top: (1, 2), bottom: (2, 1) }
        ));
    }

    #[test]
    fn misaligned_grids_fail() {
        let top = grid(vec![vec![1.0]]);
        let mut bottom = grid(vec![vec![1.0]]);
        bottom.transform.origin_x = 0.5;

        assert!(matches!(
            difference(&top, &bottom, 1000.0),
            Err(HeightError::GeoreferenceMismatch(_))
        ));
    }

    #[test]
    fn unfilled_inputs_fail() {
        let top = grid(vec![vec![1.0, 2.0]]);
        let bottom = top.with_cells(vec![Some(1.0), None]);

        assert!(matches!(
            difference(&top, &bottom, 1000.0),
            Err(HeightError::UnfilledInput("bottom", 1))
        ));
    }
}

pub const DEFAULT_HEIGHT_CEILING: f64 = 1000.0;

/// `top - bottom`, cell by cell. Negative heights become 0 and so do heights
/// above `ceiling`: an outlier is rejected, it is not capped at the ceiling.
///
/// Both grids must be gap-filled and share shape, EPSG code and geotransform.
pub fn difference(top: &RasterGrid, bottom: &RasterGrid, ceiling: f64) -> Result<RasterGrid> {
    if top.dimensions() != bottom.dimensions() {
        return Err(HeightError::DimensionMismatch {
            top: top.dimensions(),
            bottom: bottom.dimensions(),
        });
    }

    top.check_same_georeference(bottom)
        .map_err(HeightError::GeoreferenceMismatch)?;

    for (name, grid) in [("top", top), ("bottom", bottom)] {
        let missing = grid.missing_count();
        if missing > 0 {
            return Err(HeightError::UnfilledInput(name, missing));
        }
    }

    let cells = top
        .cells()
        .iter()
        .zip(bottom.cells())
        .map(|(t, b)| match (t, b) {
            (Some(t), Some(b)) => Some(clamp_height(t - b, ceiling)),
            _ => None,
        })
        .collect();

    Ok(top.with_cells(cells))
}

fn clamp_height(height: f64, ceiling: f64) -> f64 {
    let height = if height < 0.0 { 0.0 } else { height };
    if height > ceiling {
        0.0
    } else {
        height
    }
}
