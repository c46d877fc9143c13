//! `pathlock node` argument specs

use crate::prelude::*;

#[test]
fn node_without_peers_has_no_address() {
    pathlock()
        .args(["node", "--rank", "0"])
        .fails()
        .stderr_has("no peer address for rank 0");
}

#[test]
fn node_rank_outside_peers_is_rejected() {
    pathlock()
        .args(["node", "--rank", "2", "--peers", "127.0.0.1:0,127.0.0.1:0"])
        .fails()
        .stderr_has("rank 2 is outside a cluster of 2");
}

#[test]
fn peer_count_must_match_size() {
    pathlock()
        .args([
            "node", "--rank", "0", "--size", "3", "--peers", "127.0.0.1:0,127.0.0.1:0",
        ])
        .fails()
        .stderr_has("expected 3 peer addresses, got 2");
}
