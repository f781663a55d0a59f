/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Flowshell: the core of a visual workflow editor.
//!
//! A workflow is a directed graph of typed steps (start, vector search,
//! router, LLM call, tool call, end). The crate keeps that graph, validates
//! node configuration against per-type schemas, derives what a canvas should
//! draw, and records every edit for undo. Windowing and execution live
//! outside; see [`services::runner`] for the hand-off to an engine.

pub mod app;
pub mod graph;
pub mod history;
pub mod input;
pub mod persistence;
pub mod prefs;
pub mod registries;
pub mod render;
pub mod services;
pub mod shell;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install a `tracing` subscriber on stderr. `log` records are bridged into
/// it. Returns `false` when a global subscriber was already set.
#[cfg(feature = "tracing")]
pub fn init_tracing(filter: &str) -> bool {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|e| {
        eprintln!("Ignoring invalid log filter {filter:?}: {e}");
        EnvFilter::new("warn")
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}
