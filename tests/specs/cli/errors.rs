//! Error reporting specs

use crate::prelude::*;

#[test]
fn unknown_command_fails() {
    pathlock().arg("elect").fails();
}

#[test]
fn root_outside_cluster_is_rejected() {
    pathlock()
        .args(["simulate", "--size", "3", "--root", "3"])
        .fails()
        .stderr_has("root 3 is outside a cluster of 3");
}

#[test]
fn empty_cluster_is_rejected() {
    pathlock()
        .args(["simulate", "--size", "0"])
        .fails()
        .stderr_has("at least one process");
}

#[test]
fn zero_rounds_is_rejected() {
    pathlock()
        .args(["simulate", "--rounds", "0"])
        .fails()
        .stderr_has("rounds must be at least 1");
}

#[test]
fn unparseable_duration_is_rejected() {
    pathlock().args(["simulate", "--hold", "soon"]).fails();
}
