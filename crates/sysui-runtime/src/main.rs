//! # SysUI Runtime
//!
//! Composition root: loads settings, brings up the system UI components and
//! feeds broadcasts read from stdin into the event bus.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Read the settings snapshots
//! 3. Build the host (event bus + capabilities) and the component factory
//! 4. `SubsystemRegistry::init`
//! 5. Publish one broadcast per stdin line until EOF or Ctrl+C
//!
//! ## Input Format
//!
//! Each line is either a bare action (`android.intent.action.SCREEN_ON`) or a
//! JSON object (`{"action": "...", "extras": {...}}`). Blank lines are
//! skipped.

use std::sync::Arc;

use anyhow::{Context, Result};
use sysui_bus::{BroadcastEvent, InMemoryEventBus};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sysui_runtime::host::{StaticCapabilities, StaticHost, TracingFactory};
use sysui_runtime::{HostContext, RuntimeConfig, SubsystemRegistry};

fn parse_line(line: &str) -> Result<Option<BroadcastEvent>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if line.starts_with('{') {
        let event = serde_json::from_str(line).context("Invalid broadcast JSON")?;
        return Ok(Some(event));
    }
    Ok(Some(BroadcastEvent::new(line)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env();

    // Initialize logging
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("===========================================");
    info!("  SysUI Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let loaded = config.load_settings().context("Failed to load settings")?;

    let bus = Arc::new(InMemoryEventBus::new());
    let host = Arc::new(StaticHost::new(
        Arc::clone(&bus),
        StaticCapabilities {
            multi_sim: config.multi_sim,
        },
    ));
    let context: Arc<dyn HostContext> = host;

    let registry = SubsystemRegistry::new(Arc::new(TracingFactory::new()));
    let report = registry
        .init(
            Some(context),
            Some(&loaded.settings),
            loaded.quiet_hours.as_ref(),
            loaded.tuner.as_ref(),
        )
        .context("Failed to initialize components")?;

    info!(
        active = report.active().len(),
        subscribed_actions = report.interest.len(),
        "Ready. Reading broadcasts from stdin (Ctrl+C to stop)"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    info!("End of input");
                    break;
                };
                match parse_line(&line) {
                    Ok(Some(event)) => match bus.publish(&event) {
                        Ok(0) => info!(action = %event.action, "No receiver subscribed"),
                        Ok(_) => {}
                        Err(e) => error!(error = %e, "Broadcast delivery failed"),
                    },
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Skipping input line"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    registry.shutdown();
    info!(published = bus.events_published(), "Shutdown complete");

    Ok(())
}
