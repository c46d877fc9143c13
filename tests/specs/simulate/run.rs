//! `pathlock simulate` specs

use crate::prelude::*;

#[test]
fn simulate_reports_every_rank() {
    pathlock()
        .args(["simulate", "--size", "3", "--rounds", "2", "--hold", "1ms"])
        .passes()
        .stdout_has("Cluster: 3 processes, root 0, 2 rounds each")
        .stdout_has("rank 0: 2 entries")
        .stdout_has("rank 1: 2 entries")
        .stdout_has("rank 2: 2 entries")
        .stdout_has("Access order:")
        .stdout_has("Mutual exclusion held");
}

#[test]
fn single_process_cluster_runs_alone() {
    pathlock()
        .args(["simulate", "--size", "1", "--rounds", "3", "--hold", "0s"])
        .passes()
        .stdout_has("rank 0: 3 entries")
        .stdout_has("Access order: 0 0 0")
        .stdout_has("Token holder: 0");
}

#[test]
fn simulate_with_nonzero_root() {
    pathlock()
        .args([
            "simulate", "--size", "4", "--root", "2", "--rounds", "2", "--hold", "0s",
        ])
        .passes()
        .stdout_has("root 2")
        .stdout_has("rank 3: 2 entries");
}

#[test]
fn simulate_json_summary() {
    let output = pathlock()
        .args([
            "--format", "json", "simulate", "--size", "2", "--rounds", "2", "--hold", "0s",
        ])
        .passes()
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("\"size\": 2"), "{}", text);
    assert!(text.contains("\"order\""), "{}", text);
}
