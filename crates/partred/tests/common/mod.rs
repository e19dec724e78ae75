// the reason this is named mod.rs has to do with some complexities of how
// testing is handled
//
// we are following the advice of the rust book
// https://doc.rust-lang.org/book/ch11-03-test-organization.html#submodules-in-integration-tests

#![allow(dead_code)]

use partred::{ExecutionMode, ReduceConfig, ReduceConfigBuilder, TeamKind};

// based on numpy!
// https://numpy.org/doc/stable/reference/generated/numpy.isclose.html
pub fn isclose(actual: f64, ref_val: f64, rtol: f64, atol: f64) -> bool {
    let actual_nan = actual.is_nan();
    let ref_nan = ref_val.is_nan();
    if actual_nan || ref_nan {
        actual_nan && ref_nan
    } else {
        (actual - ref_val).abs() <= (atol + rtol * ref_val.abs())
    }
}

/// route log output through the test harness (so that it only shows up for
/// failing tests). Run with `RUST_LOG=partred=trace` to see per-tile output.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// a labelled configuration. Every backend should produce the same results,
/// so most tests loop over all of these
pub struct NamedConfig {
    pub name: &'static str,
    pub config: ReduceConfig,
}

pub fn all_configs() -> Vec<NamedConfig> {
    vec![
        NamedConfig {
            name: "host-deterministic",
            config: ReduceConfigBuilder::new().deterministic(true).build().unwrap(),
        },
        NamedConfig {
            name: "host-threaded",
            config: ReduceConfigBuilder::new().host_threads(4).build().unwrap(),
        },
        NamedConfig {
            name: "accelerator-serial-team",
            config: ReduceConfigBuilder::new()
                .execution_mode(ExecutionMode::Accelerator)
                .build()
                .unwrap(),
        },
        NamedConfig {
            // small blocks and few of them so that the grid-stride loop and
            // the non-power-of-2 tree reduction both get exercised
            name: "accelerator-threaded-team",
            config: ReduceConfigBuilder::new()
                .execution_mode(ExecutionMode::Accelerator)
                .team_kind(TeamKind::Threaded)
                .particles_per_thread(3)
                .max_threads_per_block(7)
                .max_blocks(5)
                .build()
                .unwrap(),
        },
    ]
}
