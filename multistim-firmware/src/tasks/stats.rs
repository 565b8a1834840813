//! Periodic sequencer statistics
//!
//! Logs the transition rate and the timing summary once a second, and warns
//! when preloads or DAC transfers were missed since the last report.

use defmt::*;
use embassy_time::{Duration, Ticker};
use portable_atomic::Ordering;

use crate::hw::twim::NACKS;
use crate::sequencer::{with_sequencer, PARAMS};

/// Report interval in milliseconds
pub const STATS_INTERVAL_MS: u64 = 1000;

#[embassy_executor::task]
pub async fn stats_task() {
    info!("Stats task started");

    let mut ticker = Ticker::every(Duration::from_millis(STATS_INTERVAL_MS));
    let mut last_transitions = 0u64;
    let mut last_misses = 0u32;
    let mut last_nacks = 0u32;

    loop {
        ticker.next().await;

        let Some((running, phase, transitions, misses)) = with_sequencer(|s| {
            (s.is_running(), s.phase(), s.transition_count(), s.preload_misses())
        }) else {
            continue;
        };

        if running {
            info!(
                "{} transitions/s, phase {:?}, single {} us, active {} us, pause {} us",
                transitions.wrapping_sub(last_transitions),
                phase,
                PARAMS.single_pulse_us(),
                PARAMS.active_time_us(),
                PARAMS.pause_us()
            );
        }

        if misses != last_misses {
            warn!("{} preloads missed", misses.wrapping_sub(last_misses));
        }

        let nacks = NACKS.load(Ordering::Relaxed);
        if nacks != last_nacks {
            warn!("{} DAC writes not acknowledged", nacks.wrapping_sub(last_nacks));
        }

        last_transitions = transitions;
        last_misses = misses;
        last_nacks = nacks;
    }
}
