use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use hashbrown::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

use crate::config::PopulationConfig;
use crate::models::{CellId, PopulationCell, PopulationGrid};

/// Load a gridded population CSV (plain or `.gz`) into a [`PopulationGrid`].
///
/// Population values are truncated to whole people. Rows with unparsable
/// coordinates, non-finite values or negative population are skipped. Cell
/// ids must be unique; a repeated id is an error.
pub fn load_population(config: &PopulationConfig) -> Result<PopulationGrid> {
    let path = config.csv.as_path();
    info!("Loading population grid from {}", path.display());

    let file = File::open(path)
        .with_context(|| format!("Failed to open population file: {}", path.display()))?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let cells = read_cells(reader, config)?;
    let grid = PopulationGrid::new(config.crs.clone(), cells);
    info!(
        "Loaded {} population cells, total population {}",
        grid.len(),
        grid.total_population()
    );
    Ok(grid)
}

fn read_cells<R: Read>(reader: R, config: &PopulationConfig) -> Result<Vec<PopulationCell>> {
    let delimiter = u8::try_from(config.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .with_context(|| format!("Delimiter must be a single ASCII character: {:?}", config.delimiter))?;

    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("Column '{}' not found", name))
    };
    let x_idx = column(&config.x_column)?;
    let y_idx = column(&config.y_column)?;
    let pop_idx = column(&config.population_column)?;
    let id_idx = config.id_column.as_deref().map(column).transpose()?;

    let mut cells = Vec::new();
    let mut seen: HashMap<CellId, usize> = HashMap::new();
    let mut skipped = 0usize;

    for (row, result) in csv_reader.records().enumerate() {
        let record = result.with_context(|| format!("Malformed population row {}", row + 1))?;

        let id: Option<CellId> = match id_idx {
            Some(idx) => record[idx].parse().ok(),
            None => Some(row as CellId),
        };
        let x = record[x_idx].parse::<f64>().ok().filter(|v| v.is_finite());
        let y = record[y_idx].parse::<f64>().ok().filter(|v| v.is_finite());
        let population = record[pop_idx]
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0);

        match (id, x, y, population) {
            (Some(id), Some(x), Some(y), Some(population)) => {
                if let Some(first) = seen.insert(id, row + 1) {
                    bail!(
                        "Duplicate cell id {} in population row {} (first seen in row {})",
                        id,
                        row + 1,
                        first
                    );
                }
                cells.push(PopulationCell::new(id, x, y, population.trunc() as u64));
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("Skipped {} unusable population rows", skipped);
    }
    Ok(cells)
}
