//! Unit test binary — scenario tests driven through canned toolchain
//! doubles, no real processes spawned.

mod mocks;
mod setup_pipeline;
mod startup_sequencer;
