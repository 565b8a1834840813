//! Build script for multistim-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates stimulator.toml and turns it into Rust constants

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use multistim_core::config::{
    CommandLimits, ConfigError, ParameterDefaults, SequencerSettings, MAX_PULSES,
};
use multistim_core::timing::Timing;
use multistim_drivers::frame_time_us;
use serde::Deserialize;

/// Layout of stimulator.toml
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StimulatorConfig {
    sequencer: SequencerSettings,
    limits: CommandLimits,
    defaults: DefaultsSection,
    dac: DacSection,
}

/// Boot parameters; tables may be shorter than `MAX_PULSES`
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DefaultsSection {
    frequency_hz: u32,
    pulse_width_units: u32,
    patterns: Vec<u16>,
    amplitudes: Vec<u16>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DacSection {
    resolution_bits: u8,
    bus_khz: u32,
}

/// TIMER clock at prescaler 0
const PULSE_TIMER_HZ: u32 = 16_000_000;

/// I2C clocks TWIM0 supports
const DAC_BUS_KHZ: [u32; 3] = [100, 250, 400];

fn main() {
    setup_linker();
    generate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate stimulator.toml and write `$OUT_DIR/stimulator_config.rs`
fn generate_config() {
    println!("cargo:rerun-if-changed=stimulator.toml");

    let config_path = Path::new("stimulator.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: stimulator.toml not found!                               ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a stimulator.toml configuration file.     ║\n\
            ║  Please create one in the multistim-firmware directory.          ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read stimulator.toml                           ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: StimulatorConfig = match toml::from_str(&config_content) {
        Ok(config) => config,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid stimulator.toml                                  ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let defaults = validate(&config);

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let mut f = File::create(out_dir.join("stimulator_config.rs")).unwrap();
    // Debug output of these plain structs is a valid struct expression
    writeln!(f, "pub const SETTINGS: SequencerSettings = {:?};", config.sequencer).unwrap();
    writeln!(f, "pub const LIMITS: CommandLimits = {:?};", config.limits).unwrap();
    writeln!(f, "pub const DEFAULTS: ParameterDefaults = {:?};", defaults).unwrap();
    writeln!(
        f,
        "pub const DAC_RESOLUTION_BITS: u8 = {};",
        config.dac.resolution_bits
    )
    .unwrap();
    writeln!(f, "pub const DAC_BUS_KHZ: u32 = {};", config.dac.bus_khz).unwrap();

    println!("cargo:warning=stimulator.toml validated successfully");
}

/// Check every section, collecting all problems before failing
fn validate(config: &StimulatorConfig) -> ParameterDefaults {
    let mut errors = Vec::new();

    let bus_khz = config.dac.bus_khz;
    if !DAC_BUS_KHZ.contains(&bus_khz) {
        errors.push(format!("[dac] bus_khz must be one of {:?}, got {}", DAC_BUS_KHZ, bus_khz));
    }
    let frame_us = frame_time_us(bus_khz.saturating_mul(1_000));
    match config.sequencer.validate_for(PULSE_TIMER_HZ, frame_us) {
        Ok(()) => {}
        Err(ConfigError::AdvanceShorterThanTransfer) => errors.push(format!(
            "[sequencer] advance_time_us {} is below the {} us DAC write",
            config.sequencer.advance_time_us, frame_us
        )),
        Err(e) => errors.push(format!("[sequencer] {:?}", e)),
    }
    if let Err(e) = config.limits.validate() {
        errors.push(format!("[limits] {:?}", e));
    }

    let bits = config.dac.resolution_bits;
    if !(1..=12).contains(&bits) {
        errors.push(format!("[dac] resolution_bits must be 1-12, got {}", bits));
    } else if u32::from(config.sequencer.amplitude_max) >= 1 << bits {
        errors.push(format!(
            "[sequencer] amplitude_max {} exceeds a {}-bit DAC",
            config.sequencer.amplitude_max, bits
        ));
    }

    let section = &config.defaults;
    if section.patterns.is_empty() || section.patterns.len() > MAX_PULSES {
        errors.push(format!("[defaults] patterns must hold 1-{} entries", MAX_PULSES));
    }
    if section.amplitudes.len() > MAX_PULSES {
        errors.push(format!("[defaults] amplitudes must hold at most {} entries", MAX_PULSES));
    }
    if let Some(pos) = section.patterns.iter().position(|p| *p == 0) {
        errors.push(format!("[defaults] pattern {} is empty (0x0000)", pos + 1));
    }
    if let Some(a) = section
        .amplitudes
        .iter()
        .find(|a| **a > config.sequencer.amplitude_max)
    {
        errors.push(format!("[defaults] amplitude {} above amplitude_max", a));
    }

    let defaults = ParameterDefaults {
        frequency_hz: section.frequency_hz,
        pulse_width_units: section.pulse_width_units,
        patterns: padded(&section.patterns),
        amplitudes: padded(&section.amplitudes),
    };
    if let Err(e) = defaults.validate(&config.limits) {
        errors.push(format!("[defaults] {:?}", e));
    }

    let timing = Timing::new(&config.sequencer);
    let pulse_count = section.patterns.len().clamp(1, MAX_PULSES) as u8;
    let max_hz = timing.max_frequency_hz(section.pulse_width_units, pulse_count);
    if section.frequency_hz > max_hz {
        errors.push(format!(
            "[defaults] frequency_hz {} leaves no pause, max is {}",
            section.frequency_hz, max_hz
        ));
    }

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Configuration validation failed                          ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    defaults
}

fn padded(values: &[u16]) -> [u16; MAX_PULSES] {
    let mut out = [0; MAX_PULSES];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = *value;
    }
    out
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
