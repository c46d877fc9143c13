//! Configuration file specs

use crate::prelude::*;

#[test]
fn config_file_sets_cluster() {
    let project = Project::empty();
    let config = project.file(
        "cluster.toml",
        "size = 2\nroot = 1\nrounds = 3\nhold = \"1ms\"\n",
    );

    pathlock()
        .args(["simulate", "--config"])
        .arg(&config)
        .passes()
        .stdout_has("Cluster: 2 processes, root 1, 3 rounds each")
        .stdout_has("rank 1: 3 entries");
}

#[test]
fn flags_override_config_file() {
    let project = Project::empty();
    let config = project.file("cluster.toml", "size = 2\nrounds = 3\nhold = \"0s\"\n");

    pathlock()
        .args(["simulate", "--rounds", "1", "--config"])
        .arg(&config)
        .passes()
        .stdout_has("1 rounds each");
}

#[test]
fn missing_config_file_fails() {
    let project = Project::empty();

    pathlock()
        .args(["simulate", "--config"])
        .arg(project.path("absent.toml"))
        .fails()
        .stderr_has("absent.toml");
}

#[test]
fn invalid_config_file_fails() {
    let project = Project::empty();
    let config = project.file("cluster.toml", "size = \"three\"\n");

    pathlock()
        .args(["simulate", "--config"])
        .arg(&config)
        .fails()
        .stderr_has("failed to parse config");
}
