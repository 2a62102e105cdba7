use log::{error, info, warn};
use tokio::time::{interval, MissedTickBehavior};

use pressure_stream_monitor::display::{
    compute_all, to_gauge_state, PressureUnit, TemperatureBand,
};
use pressure_stream_monitor::utils::format_datetime;
use pressure_stream_monitor::{
    ConnectionManager, MonitorConfig, SensorKind, WsConnector,
};

/// Periodically log what a display would show for the latest readings
async fn summary_loop(manager: &ConnectionManager, config: &MonitorConfig) {
    let mut ticker = interval(config.summary_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        info!("Connection state: {}", manager.connection_state());
        if let Some(connected_at) = manager.connected_at() {
            info!("  Connected since: {}", format_datetime(&connected_at));
        }

        match manager.last_update() {
            Some(last_update) => info!("  Last update: {}", format_datetime(&last_update)),
            None => {
                warn!("No sensor data received yet");
                continue;
            }
        }

        if let Some(pressure) = manager.latest(SensorKind::Pressure) {
            let unit = config.display_unit;
            let values = compute_all(pressure.value, &pressure.unit, None);
            let base = values[&PressureUnit::BASE];
            let gauge = to_gauge_state(base, PressureUnit::BASE.default_range());

            info!(
                "  Pressure: {:.2} {} ({:.1}% of range, {:?})",
                values[&unit],
                unit.label(),
                gauge.percentage,
                gauge.severity
            );
            for (other, value) in values.iter().filter(|(other, _)| **other != unit) {
                info!("    = {:.3} {}", value, other.label());
            }
            info!(
                "  Filtered: ema={:.2} median={:.2} median_ema={:.2}",
                pressure.filtered.ema, pressure.filtered.median, pressure.filtered.median_ema
            );
        }

        if let Some(temperature) = manager.latest(SensorKind::Temperature) {
            info!(
                "  Temperature: {:.1} {} ({})",
                temperature.value,
                temperature.unit,
                TemperatureBand::classify(temperature.value)
            );
        }

        for kind in SensorKind::ALL {
            if let Some(stats) = manager.stats(kind) {
                info!(
                    "  {} window: min {:.2}, max {:.2}, mean {:.2} over {} samples",
                    kind, stats.min, stats.max, stats.mean, stats.samples
                );
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match MonitorConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let mut manager = ConnectionManager::start(config.stream_url.clone(), WsConnector);

    // Run until Ctrl+C
    tokio::select! {
        _ = summary_loop(&manager, &config) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    manager.stop().await;

    Ok(())
}
