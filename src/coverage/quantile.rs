//! Equal-frequency binning and descriptive statistics of cell populations.

use crate::models::{PopulationCell, PopulationSummary, WeightBin};

/// Rank order of cells by population, ties broken by ascending cell id
fn rank_order(cells: &[PopulationCell]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..cells.len()).collect();
    order.sort_by_key(|&i| (cells[i].population, cells[i].id));
    order
}

/// Split cells into `classes` ordered groups of near-equal size.
///
/// Returns the class of each cell, aligned with `cells`. Class sizes differ
/// by at most one and a cell never lands in a lower class than a cell with
/// smaller population. Cells with equal population may straddle a class
/// boundary; the one with the smaller id goes to the lower class.
pub fn equal_frequency_classes(cells: &[PopulationCell], classes: usize) -> Vec<usize> {
    let n = cells.len();
    let mut assigned = vec![0; n];
    if classes == 0 {
        return assigned;
    }
    for (rank, slot) in rank_order(cells).into_iter().enumerate() {
        assigned[slot] = rank * classes / n;
    }
    assigned
}

/// Quartile weight bin of each cell, aligned with `cells`
pub fn quartile_bins(cells: &[PopulationCell]) -> Vec<WeightBin> {
    equal_frequency_classes(cells, WeightBin::COUNT)
        .into_iter()
        .map(WeightBin::from_index)
        .collect()
}

/// Count, min, max, mean and median of cell populations
pub fn summarize(cells: &[PopulationCell]) -> PopulationSummary {
    if cells.is_empty() {
        return PopulationSummary::default();
    }

    let mut values: Vec<u64> = cells.iter().map(|c| c.population).collect();
    values.sort_unstable();

    let n = values.len();
    let total: u64 = values.iter().sum();
    let median = if n % 2 == 1 {
        values[n / 2] as f64
    } else {
        (values[n / 2 - 1] as f64 + values[n / 2] as f64) / 2.0
    };

    PopulationSummary {
        cells: n,
        min: values[0],
        max: values[n - 1],
        mean: total as f64 / n as f64,
        median,
    }
}
