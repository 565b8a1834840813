//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use multistim_core::command::Command;

/// Channel capacity for operator commands
const COMMAND_CHANNEL_SIZE: usize = 4;

/// Operator commands, consumed by the control task
///
/// Whatever transport receives commands (serial, BLE) pushes them here after
/// parsing; at boot `main` queues a single `Start`.
pub static COMMAND_CHANNEL: Channel<CriticalSectionRawMutex, Command, COMMAND_CHANNEL_SIZE> =
    Channel::new();
