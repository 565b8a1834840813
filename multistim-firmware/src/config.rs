//! Board configuration generated from stimulator.toml by build.rs

use multistim_core::config::{CommandLimits, ParameterDefaults, SequencerSettings};

include!(concat!(env!("OUT_DIR"), "/stimulator_config.rs"));
