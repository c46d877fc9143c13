//! Help output specs

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    pathlock()
        .arg("--help")
        .passes()
        .stdout_has("simulate")
        .stdout_has("node");
}

#[test]
fn simulate_help_lists_cluster_flags() {
    pathlock()
        .args(["simulate", "--help"])
        .passes()
        .stdout_has("--size")
        .stdout_has("--rounds")
        .stdout_has("--hold");
}

#[test]
fn version_is_reported() {
    pathlock().arg("--version").passes().stdout_has("pathlock");
}
