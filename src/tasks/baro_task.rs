use embassy_time::{Duration, Instant, Ticker};

use crate::ahrs::AhrsCore;
use crate::filter::{pressure_altitude_ft, VerticalSpeed};
use crate::sensors::Barometer;
use crate::tasks::{Handoff, SessionEnd, MAX_READ_RETRIES};

pub struct BaroConfig {
    /// Sample period; also the step the climb-rate filter assumes.
    pub period: Duration,
}

impl Default for BaroConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(100),
        }
    }
}

/// Barometer task. Waits for the supervisor to hand over a connected driver,
/// samples it until it is lost or disabled, then waits for the next one.
pub async fn baro_task<B: Barometer>(core: &AhrsCore, handoff: &Handoff<B>, config: BaroConfig) -> ! {
    loop {
        let baro = handoff.receive().await;
        run_baro_session(core, baro, &config).await;
    }
}

/// Samples one connected barometer until it fails or is disabled.
///
/// Always closes the driver and clears the connected flag before returning,
/// so the supervisor picks the sensor up again.
pub async fn run_baro_session<B: Barometer>(
    core: &AhrsCore,
    mut baro: B,
    config: &BaroConfig,
) -> SessionEnd {
    let mut vsi = VerticalSpeed::new(config.period);
    let mut temperature = core.situation.baro().temperature_c;
    let mut failures: u8 = 0;

    let mut ticker = Ticker::every(config.period);
    let end = loop {
        ticker.next().await;
        if !core.baro.in_use() {
            crate::log_info!("AHRS Info: pressure sensor disabled, closing it");
            break SessionEnd::Disabled;
        }

        // Temperature is informational only; keep the last good value.
        match baro.temperature().await {
            Ok(t) => temperature = t,
            Err(e) => crate::log_warn!("AHRS Error: couldn't read temperature from sensor: {}", e),
        }

        let pressure = match baro.pressure().await {
            Ok(p) => p,
            Err(e) => {
                failures = failures.saturating_add(1);
                crate::log_warn!(
                    "AHRS Error: couldn't read pressure from sensor ({} in a row): {}",
                    failures,
                    e
                );
                if failures > MAX_READ_RETRIES {
                    crate::log_error!(
                        "AHRS Error: couldn't read pressure from sensor {} times, closing it",
                        failures
                    );
                    break SessionEnd::Failed;
                }
                continue;
            }
        };
        failures = 0;

        let altitude = pressure_altitude_ft(pressure);
        let climb = vsi.update(altitude);
        let now = Instant::now();
        core.situation.update_baro(|b| {
            b.last_measurement = Some(now);
            b.temperature_c = temperature;
            b.pressure_altitude_ft = altitude;
            b.vertical_speed_fpm = climb;
        });
    };

    baro.close().await;
    core.baro.set_connected(false);
    end
}
