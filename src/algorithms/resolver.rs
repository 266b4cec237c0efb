//! Tie-in network station resolution
//!
//! Fixed-point propagation over a sparse tie-in network. Anchored stations seed
//! the table; each pass walks the tie-in entries in order and places any
//! station whose partner is already known, sighting forwards (`from` known) or
//! backwards (`to` known). Resolution is bounded by a pass count, which must
//! cover the longest dependency chain in the network.

use std::collections::BTreeMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::algorithms::geometry::{shoot, shoot_reversed};
use crate::core::{Point, TieInEntry, DEFAULT_MAX_PASSES};
use crate::validation::{SurveyError, SurveyResult};

/// Resolution state of a single station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum StationState {
    Resolved(Point),
    Unresolved,
}

impl StationState {
    pub fn point(&self) -> Option<&Point> {
        match self {
            StationState::Resolved(point) => Some(point),
            StationState::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, StationState::Resolved(_))
    }
}

/// Mapping of station name to resolution state, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationTable {
    stations: BTreeMap<String, StationState>,
}

impl StationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding only the given anchors
    pub fn seeded(anchors: &BTreeMap<String, Point>) -> Self {
        let stations = anchors
            .iter()
            .map(|(name, point)| {
                let point = point.clone().with_name(name.clone());
                (name.clone(), StationState::Resolved(point))
            })
            .collect();
        Self { stations }
    }

    /// Register a station name, leaving any existing state untouched
    pub fn reference(&mut self, name: &str) {
        if !self.stations.contains_key(name) {
            self.stations.insert(name.to_string(), StationState::Unresolved);
        }
    }

    /// Fix a station's coordinate; returns false if it was already resolved
    pub fn fix(&mut self, name: &str, point: Point) -> bool {
        match self.stations.get(name) {
            Some(StationState::Resolved(_)) => false,
            _ => {
                let point = point.with_name(name);
                self.stations
                    .insert(name.to_string(), StationState::Resolved(point));
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&StationState> {
        self.stations.get(name)
    }

    /// Coordinate of a resolved station
    pub fn point(&self, name: &str) -> Option<&Point> {
        self.stations.get(name).and_then(StationState::point)
    }

    pub fn is_resolved(&self, name: &str) -> bool {
        self.point(name).is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.stations.values().all(StationState::is_resolved)
    }

    /// Names still awaiting a coordinate, sorted
    pub fn unresolved(&self) -> Vec<String> {
        self.stations
            .iter()
            .filter(|(_, state)| !state.is_resolved())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn resolved_points(&self) -> impl Iterator<Item = &Point> {
        self.stations.values().filter_map(StationState::point)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StationState)> {
        self.stations.iter().map(|(name, state)| (name.as_str(), state))
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

/// Summary of a resolution run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// Propagation passes actually executed
    pub passes: usize,
    /// Stations placed by propagation rather than anchoring
    pub resolved_by_propagation: usize,
}

/// Propagates anchor coordinates through a tie-in network
#[derive(Debug, Clone)]
pub struct StationResolver {
    max_passes: usize,
    stop_when_stalled: bool,
}

impl Default for StationResolver {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
            stop_when_stalled: true,
        }
    }
}

impl StationResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Fail as soon as a pass places no new station
    pub fn with_stop_when_stalled(mut self, stop: bool) -> Self {
        self.stop_when_stalled = stop;
        self
    }

    pub fn resolve(
        &self,
        tie_in: &[TieInEntry],
        anchors: &BTreeMap<String, Point>,
    ) -> SurveyResult<StationTable> {
        self.resolve_with_report(tie_in, anchors)
            .map(|(table, _)| table)
    }

    pub fn resolve_with_report(
        &self,
        tie_in: &[TieInEntry],
        anchors: &BTreeMap<String, Point>,
    ) -> SurveyResult<(StationTable, ResolutionReport)> {
        let mut table = StationTable::seeded(anchors);
        for entry in tie_in {
            table.reference(&entry.from);
            table.reference(&entry.to);
        }

        let mut report = ResolutionReport::default();
        while !table.is_complete() {
            if report.passes >= self.max_passes {
                return Err(underdetermined(table, report.passes));
            }
            report.passes += 1;

            let (placed, deferred) = propagate(&mut table, tie_in);
            report.resolved_by_propagation += placed;
            debug!(
                "Resolution pass {}: placed {} station(s), deferred {} shot(s)",
                report.passes, placed, deferred
            );

            if placed == 0 && self.stop_when_stalled && !table.is_complete() {
                debug!("Pass {} made no progress, giving up", report.passes);
                return Err(underdetermined(table, report.passes));
            }
        }

        info!(
            "Georeferenced {} station(s) in {} pass(es)",
            table.len(),
            report.passes
        );
        Ok((table, report))
    }
}

/// One sweep over the tie-in shots; returns (stations placed, shots deferred)
fn propagate(table: &mut StationTable, tie_in: &[TieInEntry]) -> (usize, usize) {
    let mut placed = 0;
    let mut deferred = 0;

    for entry in tie_in {
        let shot = &entry.shot;
        let located = match (table.point(&entry.from), table.point(&entry.to)) {
            (Some(_), Some(_)) => None,
            (Some(from), None) => Some((
                entry.to.as_str(),
                shoot(from, shot.distance, shot.azimuth, shot.inclination),
            )),
            (None, Some(to)) => Some((
                entry.from.as_str(),
                shoot_reversed(to, shot.distance, shot.azimuth, shot.inclination),
            )),
            (None, None) => {
                deferred += 1;
                None
            }
        };

        if let Some((name, point)) = located {
            if table.fix(name, point) {
                placed += 1;
            }
        }
    }

    (placed, deferred)
}

fn underdetermined(table: StationTable, passes: usize) -> SurveyError {
    SurveyError::UnderdeterminedNetwork {
        unresolved: table.unresolved(),
        passes,
        table,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Shot;
    use approx::assert_abs_diff_eq;

    fn anchors(list: &[(&str, f64, f64, f64)]) -> BTreeMap<String, Point> {
        list.iter()
            .map(|&(name, x, y, z)| (name.to_string(), Point::new(x, y, z)))
            .collect()
    }

    fn east(from: &str, to: &str, distance: f64) -> TieInEntry {
        TieInEntry::new(from, to, Shot::new(distance, 90.0, 0.0))
    }

    fn assert_station(table: &StationTable, name: &str, x: f64, y: f64, z: f64) {
        let p = table.point(name).expect("station should be resolved");
        assert_abs_diff_eq!(p.x, x, epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, y, epsilon = 1e-9);
        assert_abs_diff_eq!(p.z, z, epsilon = 1e-9);
        assert_eq!(p.name.as_deref(), Some(name));
    }

    #[test]
    fn test_forward_chain() {
        let tie_in = vec![east("A0", "B0", 5.0), east("B0", "C0", 5.0)];
        let (table, report) = StationResolver::new()
            .resolve_with_report(&tie_in, &anchors(&[("A0", 0.0, 0.0, 0.0)]))
            .unwrap();

        assert!(report.passes <= 2);
        assert_eq!(report.resolved_by_propagation, 2);
        assert_station(&table, "B0", 5.0, 0.0, 0.0);
        assert_station(&table, "C0", 10.0, 0.0, 0.0);
    }

    #[test]
    fn test_backward_sight() {
        let tie_in = vec![east("A0", "B0", 5.0)];
        let table = StationResolver::new()
            .resolve(&tie_in, &anchors(&[("B0", 5.0, 0.0, 0.0)]))
            .unwrap();

        assert_station(&table, "A0", 0.0, 0.0, 0.0);
    }

    #[test]
    fn test_backward_sight_reverses_inclination() {
        let tie_in = vec![TieInEntry::new("A0", "B0", Shot::new(2.0, 0.0, 90.0))];
        let table = StationResolver::new()
            .resolve(&tie_in, &anchors(&[("B0", 0.0, 0.0, 10.0)]))
            .unwrap();

        assert_station(&table, "A0", 0.0, 0.0, 8.0);
    }

    #[test]
    fn test_out_of_order_chain_needs_second_pass() {
        let tie_in = vec![east("B0", "C0", 5.0), east("A0", "B0", 5.0)];
        let fixed = anchors(&[("A0", 0.0, 0.0, 0.0)]);

        let (table, report) = StationResolver::new()
            .resolve_with_report(&tie_in, &fixed)
            .unwrap();
        assert_eq!(report.passes, 2);
        assert_station(&table, "C0", 10.0, 0.0, 0.0);

        let err = StationResolver::new()
            .with_max_passes(1)
            .resolve(&tie_in, &fixed)
            .unwrap_err();
        assert_eq!(err.unresolved_stations(), ["C0"]);
        let partial = err.partial_table().unwrap();
        assert!(partial.is_resolved("B0"));
        assert_eq!(partial.get("C0"), Some(&StationState::Unresolved));
    }

    #[test]
    fn test_disconnected_station_fails() {
        let tie_in = vec![east("A0", "B0", 5.0), east("X0", "Y0", 3.0)];
        let fixed = anchors(&[("A0", 0.0, 0.0, 0.0)]);

        let err = StationResolver::new().resolve(&tie_in, &fixed).unwrap_err();
        match &err {
            SurveyError::UnderdeterminedNetwork { unresolved, passes, table } => {
                assert_eq!(unresolved, &vec!["X0".to_string(), "Y0".to_string()]);
                // the second pass places nothing and stops the run
                assert_eq!(*passes, 2);
                assert!(table.is_resolved("B0"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_exhausts_passes_without_stall_detection() {
        let tie_in = vec![east("X0", "Y0", 3.0)];
        let err = StationResolver::new()
            .with_max_passes(4)
            .with_stop_when_stalled(false)
            .resolve(&tie_in, &anchors(&[("A0", 0.0, 0.0, 0.0)]))
            .unwrap_err();

        match err {
            SurveyError::UnderdeterminedNetwork { passes, .. } => assert_eq!(passes, 4),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_anchor_is_never_overwritten() {
        // the second shot would place B0 at (0, 7, 0) if anchors could move
        let tie_in = vec![
            east("A0", "B0", 5.0),
            TieInEntry::new("A0", "B0", Shot::new(7.0, 0.0, 0.0)),
        ];
        let fixed = anchors(&[("A0", 0.0, 0.0, 0.0), ("B0", 1.0, 2.0, 3.0)]);
        let (table, report) = StationResolver::new()
            .resolve_with_report(&tie_in, &fixed)
            .unwrap();

        assert_eq!(report.passes, 0);
        assert_station(&table, "B0", 1.0, 2.0, 3.0);
    }

    #[test]
    fn test_first_placement_wins() {
        let tie_in = vec![
            east("A0", "B0", 5.0),
            TieInEntry::new("A0", "B0", Shot::new(7.0, 0.0, 0.0)),
        ];
        let table = StationResolver::new()
            .resolve(&tie_in, &anchors(&[("A0", 0.0, 0.0, 0.0)]))
            .unwrap();
        assert_station(&table, "B0", 5.0, 0.0, 0.0);
    }

    #[test]
    fn test_branching_network() {
        let tie_in = vec![
            east("A0", "B0", 5.0),
            TieInEntry::new("B0", "C0", Shot::new(3.0, 0.0, 0.0)),
            TieInEntry::new("D0", "B0", Shot::new(4.0, 180.0, 0.0)),
        ];
        let table = StationResolver::new()
            .resolve(&tie_in, &anchors(&[("A0", 0.0, 0.0, 0.0)]))
            .unwrap();

        assert_eq!(table.len(), 4);
        assert!(table.is_complete());
        assert_station(&table, "C0", 5.0, 3.0, 0.0);
        assert_station(&table, "D0", 5.0, 4.0, 0.0);
    }

    #[test]
    fn test_zero_passes_with_anchors_only() {
        let fixed = anchors(&[("A0", 1.0, 1.0, 1.0)]);
        let table = StationResolver::new()
            .with_max_passes(0)
            .resolve(&[], &fixed)
            .unwrap();
        assert_eq!(table.resolved_points().count(), 1);
        assert!(table.unresolved().is_empty());
    }
}
