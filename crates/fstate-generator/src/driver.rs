//! Sequential epoch driver

use crate::{
    EpochSummary, GeneratorConfig, GeneratorError, Result, RunSummary, Scenario, RUN_SUMMARY_FILE,
};
use chrono::Utc;
use isl_fstate::{
    Constellation, EpochInput, ForwardingStateEngine, ForwardingTable, FstateError, InterfaceMap,
    NodeSpace,
};
use std::fs::{self, File};
use std::io::BufWriter;
use tracing::info;

/// Build the engine for a scenario's static constellation
pub fn build_engine(scenario: &Scenario, config: &GeneratorConfig) -> Result<ForwardingStateEngine> {
    let space = NodeSpace::new(scenario.num_satellites, scenario.num_ground_stations);
    let interfaces = InterfaceMap::from_isls(&space, &scenario.isls).map_err(FstateError::from)?;
    let constellation = Constellation::new(
        space,
        interfaces,
        scenario.gsl_interfaces_or(config.default_gsl_bandwidth),
    )?;
    Ok(ForwardingStateEngine::new(constellation))
}

/// Compute and write every epoch in order, each diffed against the one before.
///
/// Stops at the first epoch failing validation; records of earlier epochs
/// stay on disk.
pub fn run_scenario(scenario: &Scenario, config: &GeneratorConfig) -> Result<RunSummary> {
    let engine = build_engine(scenario, config)?;
    fs::create_dir_all(&config.output_dir)?;

    info!(
        "Generating forwarding state for {} epochs into {:?}",
        scenario.epochs.len(),
        config.output_dir
    );

    let mut previous: Option<ForwardingTable> = None;
    let mut epochs = Vec::with_capacity(scenario.epochs.len());

    for snapshot in &scenario.epochs {
        let t = snapshot.time_since_epoch_ns;
        let graph = scenario.backbone(snapshot);
        let visibility = snapshot.visibility();
        let input = EpochInput {
            time_since_epoch_ns: t,
            graph: &graph,
            visibility: &visibility,
        };

        let state = engine
            .compute_epoch(&input, previous.as_ref())
            .map_err(|source| GeneratorError::Epoch {
                time_since_epoch_ns: t,
                source,
            })?;
        engine.write_epoch(&config.output_dir, &state, config.write_gsl_if_bandwidth)?;

        epochs.push(EpochSummary {
            time_since_epoch_ns: t,
            entries: state.table.len(),
            changed_entries: state.change_count(),
            dropped_entries: state.table.drop_count(),
        });
        previous = Some(state.table);
    }

    let summary = RunSummary {
        num_satellites: scenario.num_satellites,
        num_ground_stations: scenario.num_ground_stations,
        epochs,
        generated_at: Utc::now().to_rfc3339(),
    };

    if config.write_summary {
        let path = config.output_dir.join(RUN_SUMMARY_FILE);
        info!("Writing run summary to {:?}", path);
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, &summary)?;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use isl_fstate::TopologyError;

    /// Line 0-1-2, GS A (3) at satellite 0, GS B (4) at satellite 2.
    /// At the second epoch GS B moves to satellite 1; the third repeats the second.
    const MOVING: &str = r#"{
        "num_satellites": 3,
        "num_ground_stations": 2,
        "isls": [[0, 1], [1, 2]],
        "gsl_interfaces": [
            {"aggregate_max_bandwidth": 10.0},
            {"aggregate_max_bandwidth": 10.0},
            {"aggregate_max_bandwidth": 10.0},
            {"aggregate_max_bandwidth": 2.0},
            {"aggregate_max_bandwidth": 2.0}
        ],
        "epochs": [
            {
                "time_since_epoch_ns": 0,
                "isl_lengths_m": [1.0, 1.0],
                "ground_station_satellites_in_range": [[[5.0, 0]], [[5.0, 2]]]
            },
            {
                "time_since_epoch_ns": 100000000,
                "isl_lengths_m": [1.0, 1.0],
                "ground_station_satellites_in_range": [[[5.0, 0]], [[5.0, 1]]]
            },
            {
                "time_since_epoch_ns": 200000000,
                "isl_lengths_m": [1.0, 1.0],
                "ground_station_satellites_in_range": [[[5.0, 0]], [[5.0, 1]]]
            }
        ]
    }"#;

    fn config(dir: &std::path::Path) -> GeneratorConfig {
        GeneratorConfig {
            output_dir: dir.join("dynamic_state"),
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn test_run_writes_records_per_epoch() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let scenario = Scenario::from_json(MOVING).unwrap();

        let summary = run_scenario(&scenario, &config).unwrap();
        let out = &config.output_dir;

        let bandwidth = fs::read_to_string(out.join("gsl_if_bandwidth_0.txt")).unwrap();
        assert_eq!(
            bandwidth,
            "0,1,10.000000\n1,2,10.000000\n2,1,10.000000\n3,0,2.000000\n4,0,2.000000\n"
        );
        assert_eq!(
            fs::read_to_string(out.join("gsl_if_bandwidth_100000000.txt")).unwrap(),
            ""
        );

        let first = fs::read_to_string(out.join("fstate_0.txt")).unwrap();
        assert_eq!(first.lines().count(), 3 * 2 + 2);
        assert!(first.starts_with("0,3,3,1,0\n"));
        assert!(first.ends_with("3,4,0,0,1\n4,3,2,0,1\n"));

        // Only entries towards GS B and B's own uplink change
        let second = fs::read_to_string(out.join("fstate_100000000.txt")).unwrap();
        assert_eq!(second, "1,4,4,2,0\n2,4,1,0,1\n4,3,1,0,2\n");

        assert_eq!(
            fs::read_to_string(out.join("fstate_200000000.txt")).unwrap(),
            ""
        );

        let changed: Vec<usize> = summary.epochs.iter().map(|e| e.changed_entries).collect();
        assert_eq!(changed, vec![8, 3, 0]);
        assert_eq!(summary.total_changes(), 11);
        assert!(out.join(RUN_SUMMARY_FILE).exists());
    }

    #[test]
    fn test_bundled_scenario_loses_ground_station() {
        let dir = tempfile::tempdir().unwrap();
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data/three_sat_line.json");
        let scenario = Scenario::load(path).unwrap();

        let summary = run_scenario(&scenario, &config(dir.path())).unwrap();

        // GS B (node 4) sees nothing in the last epoch: 3 satellite entries plus both GS pairs
        let dropped: Vec<usize> = summary.epochs.iter().map(|e| e.dropped_entries).collect();
        assert_eq!(dropped, vec![0, 0, 5]);

        let last = fs::read_to_string(config(dir.path()).output_dir.join("fstate_200000000.txt")).unwrap();
        assert!(last.contains("4,3,-1,-1,-1\n"));
        assert!(last.contains("0,4,-1,-1,-1\n"));
    }

    #[test]
    fn test_summary_can_be_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            write_summary: false,
            ..config(dir.path())
        };
        let scenario = Scenario::from_json(MOVING).unwrap();

        run_scenario(&scenario, &config).unwrap();
        assert!(!config.output_dir.join(RUN_SUMMARY_FILE).exists());
    }

    #[test]
    fn test_bandwidth_record_can_be_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            write_gsl_if_bandwidth: false,
            ..config(dir.path())
        };
        let scenario = Scenario::from_json(MOVING).unwrap();

        run_scenario(&scenario, &config).unwrap();

        let out = &config.output_dir;
        assert!(!out.join("gsl_if_bandwidth_0.txt").exists());
        assert!(!out.join("gsl_if_bandwidth_100000000.txt").exists());
        assert!(out.join("fstate_0.txt").exists());
        assert_eq!(
            fs::read_to_string(out.join("fstate_100000000.txt")).unwrap(),
            "1,4,4,2,0\n2,4,1,0,1\n4,3,1,0,2\n"
        );
    }

    #[test]
    fn test_invalid_epoch_reports_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let json = MOVING.replace("[[[5.0, 0]], [[5.0, 1]]]", "[[[5.0, 0]], [[5.0, 9]]]");
        let scenario = Scenario::from_json(&json).unwrap();

        let err = run_scenario(&scenario, &config(dir.path())).unwrap_err();
        match err {
            GeneratorError::Epoch {
                time_since_epoch_ns,
                source: FstateError::Topology(TopologyError::UnknownVisibleSatellite { .. }),
            } => assert_eq!(time_since_epoch_ns, 100000000),
            other => panic!("unexpected error: {other}"),
        }
        // The first epoch completed before the failure
        assert!(dir.path().join("dynamic_state/fstate_0.txt").exists());
    }
}
