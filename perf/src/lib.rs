//! Shared helpers for the lattice benchmarks.

use lattice_events::PeerUpdate;

/// Per-process temp path so parallel bench runs never share a region.
pub fn temp_region_path(label: &str) -> String {
    let pid = std::process::id();
    format!("/tmp/lattice_bench_{label}_{pid}")
}

pub fn make_test_update() -> PeerUpdate {
    PeerUpdate::new(1_234_567)
}
