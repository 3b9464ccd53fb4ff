//! Level-by-level name filtering down to a single region.

use tracing::{debug, info};

use crate::error::SelectionError;
use crate::models::{BoundaryDataset, BoundaryFeature, LevelFilter, Region};

/// Selects one region from a boundary dataset without mutating it
pub struct RegionSelector<'a> {
    dataset: &'a BoundaryDataset,
}

impl<'a> RegionSelector<'a> {
    pub fn new(dataset: &'a BoundaryDataset) -> Self {
        Self { dataset }
    }

    /// Apply each filter in order and return the single remaining region.
    ///
    /// Zero or several matches after the last filter is an error; the first
    /// match is never picked silently.
    pub fn select(&self, path: &[LevelFilter]) -> Result<Region, SelectionError> {
        if path.is_empty() {
            return Err(SelectionError::EmptyPath);
        }

        let mut candidates: Vec<&BoundaryFeature> = self.dataset.features.iter().collect();
        let mut deepest = 0;

        for filter in path {
            let depth = self
                .dataset
                .levels
                .iter()
                .position(|l| *l == filter.level)
                .ok_or_else(|| SelectionError::UnknownLevel {
                    level: filter.level.clone(),
                    available: self.dataset.levels.clone(),
                })?;
            deepest = deepest.max(depth);

            let matching: Vec<&BoundaryFeature> = candidates
                .iter()
                .copied()
                .filter(|f| f.name_at(&filter.level) == Some(filter.name.as_str()))
                .collect();

            if matching.is_empty() {
                let mut names: Vec<String> = candidates
                    .iter()
                    .filter_map(|f| f.name_at(&filter.level))
                    .map(str::to_string)
                    .collect();
                names.sort();
                names.dedup();
                return Err(SelectionError::NotFound {
                    level: filter.level.clone(),
                    name: filter.name.clone(),
                    candidates: names,
                });
            }

            debug!(
                "{}={}: {} of {} boundaries remain",
                filter.level,
                filter.name,
                matching.len(),
                candidates.len()
            );
            candidates = matching;
        }

        let requested: Vec<String> = path.iter().map(|f| f.name.clone()).collect();

        let feature = match candidates.as_slice() {
            [single] => *single,
            _ => {
                return Err(SelectionError::Ambiguous {
                    path: requested,
                    count: candidates.len(),
                })
            }
        };

        let name_path: Vec<String> = self.dataset.levels[..=deepest]
            .iter()
            .filter_map(|level| feature.name_at(level))
            .map(str::to_string)
            .collect();

        let is_empty = feature.geometry.0.is_empty()
            || feature
                .geometry
                .iter()
                .all(|p| p.exterior().0.len() < 4);
        if is_empty {
            return Err(SelectionError::EmptyGeometry { path: name_path });
        }

        info!("Selected region {:?}", name_path);

        Ok(Region {
            name_path,
            crs: self.dataset.crs.clone(),
            geometry: feature.geometry.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Crs;
    use geo::{polygon, MultiPolygon};
    use std::collections::HashMap;

    fn square(x0: f64, y0: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + 1.0, y: y0),
            (x: x0 + 1.0, y: y0 + 1.0),
            (x: x0, y: y0 + 1.0),
            (x: x0, y: y0),
        ]])
    }

    fn feature(state: &str, district: &str, geometry: MultiPolygon<f64>) -> BoundaryFeature {
        let mut names = HashMap::new();
        names.insert("NAME_1".to_string(), state.to_string());
        names.insert("NAME_2".to_string(), district.to_string());
        BoundaryFeature { names, geometry }
    }

    fn dataset() -> BoundaryDataset {
        BoundaryDataset::new(
            Crs::wgs84(),
            vec!["NAME_1".into(), "NAME_2".into()],
            vec![
                feature("West Bengal", "Nadia", square(88.0, 23.0)),
                feature("West Bengal", "Hooghly", square(87.0, 22.0)),
                feature("Bihar", "Aurangabad", square(84.0, 24.0)),
                feature("Maharashtra", "Aurangabad", square(75.0, 19.0)),
                feature("Bihar", "Hollow", MultiPolygon::new(vec![])),
            ],
        )
    }

    #[test]
    fn test_select_full_path() {
        let ds = dataset();
        let region = RegionSelector::new(&ds)
            .select(&[
                LevelFilter::new("NAME_1", "West Bengal"),
                LevelFilter::new("NAME_2", "Nadia"),
            ])
            .unwrap();
        assert_eq!(region.name_path, vec!["West Bengal", "Nadia"]);
        assert_eq!(region.crs, Crs::wgs84());
        assert_eq!(region.geometry, square(88.0, 23.0));
        // source untouched
        assert_eq!(ds.features.len(), 5);
    }

    #[test]
    fn test_duplicate_names_under_different_parents_are_ambiguous() {
        let ds = dataset();
        let err = RegionSelector::new(&ds)
            .select(&[LevelFilter::new("NAME_2", "Aurangabad")])
            .unwrap_err();
        assert_eq!(
            err,
            SelectionError::Ambiguous {
                path: vec!["Aurangabad".into()],
                count: 2
            }
        );
    }

    #[test]
    fn test_parent_filter_disambiguates() {
        let ds = dataset();
        let region = RegionSelector::new(&ds)
            .select(&[
                LevelFilter::new("NAME_1", "Maharashtra"),
                LevelFilter::new("NAME_2", "Aurangabad"),
            ])
            .unwrap();
        assert_eq!(region.name_path, vec!["Maharashtra", "Aurangabad"]);
    }

    #[test]
    fn test_partial_path_fills_parent_names() {
        let ds = dataset();
        let region = RegionSelector::new(&ds)
            .select(&[LevelFilter::new("NAME_2", "Hooghly")])
            .unwrap();
        assert_eq!(region.name_path, vec!["West Bengal", "Hooghly"]);
    }

    #[test]
    fn test_missing_region_lists_candidates() {
        let ds = dataset();
        let err = RegionSelector::new(&ds)
            .select(&[
                LevelFilter::new("NAME_1", "West Bengal"),
                LevelFilter::new("NAME_2", "Nadiya"),
            ])
            .unwrap_err();
        match err {
            SelectionError::NotFound { candidates, .. } => {
                assert_eq!(candidates, vec!["Hooghly", "Nadia"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_state_only_is_ambiguous() {
        let ds = dataset();
        let err = RegionSelector::new(&ds)
            .select(&[LevelFilter::new("NAME_1", "West Bengal")])
            .unwrap_err();
        assert!(matches!(err, SelectionError::Ambiguous { count: 2, .. }));
    }

    #[test]
    fn test_unknown_level_and_empty_path() {
        let ds = dataset();
        let selector = RegionSelector::new(&ds);
        assert!(matches!(
            selector.select(&[LevelFilter::new("NAME_3", "x")]),
            Err(SelectionError::UnknownLevel { .. })
        ));
        assert_eq!(selector.select(&[]).unwrap_err(), SelectionError::EmptyPath);
    }

    #[test]
    fn test_empty_geometry_rejected() {
        let ds = dataset();
        let err = RegionSelector::new(&ds)
            .select(&[
                LevelFilter::new("NAME_1", "Bihar"),
                LevelFilter::new("NAME_2", "Hollow"),
            ])
            .unwrap_err();
        assert!(matches!(err, SelectionError::EmptyGeometry { .. }));
    }
}
