//! Board LED heartbeat

use embassy_nrf::gpio::Output;
use embassy_time::{Duration, Ticker};
use multistim_drivers::HalPin;
use multistim_hal::OutputPin;

/// Half of the blink period in milliseconds
pub const HEARTBEAT_INTERVAL_MS: u64 = 500;

#[embassy_executor::task]
pub async fn heartbeat_task(mut led: HalPin<Output<'static>>) {
    let mut ticker = Ticker::every(Duration::from_millis(HEARTBEAT_INTERVAL_MS));

    loop {
        ticker.next().await;
        let level = !led.is_set_high();
        led.set_level(level.into());
    }
}
