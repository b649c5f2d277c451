use anyhow::Result;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use worker_harness::{start_ctx, ControlEvent};

/// Demonstration worker: heartbeats while reacting to control events.
/// Drive it with `kill -USR1/-USR2/-HUP/-TERM <pid>`.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    start_ctx(
        |ctx| async move {
            let events = ctx.env().events().clone();
            let mut heartbeat = tokio::time::interval(Duration::from_secs(5));

            loop {
                tokio::select! {
                    _ = heartbeat.tick() => {
                        ctx.debug(format!(
                            "Heartbeat, uptime {} s",
                            ctx.env().uptime().as_secs()
                        ));
                    }
                    event = events.recv_async() => {
                        let Ok(event) = event else { break };
                        match event {
                            ControlEvent::Shutdown => {
                                ctx.info("Shutdown event received, stopping");
                                break;
                            }
                            ControlEvent::Reload => {
                                ctx.info("Reload event received");
                            }
                            ControlEvent::Info => {
                                let stats = ctx.env().stats().await;
                                if let Ok(json) = serde_json::to_string(&stats) {
                                    ctx.info(json);
                                }
                            }
                            ControlEvent::GarbageCollect => {
                                ctx.debug("GarbageCollect event received");
                            }
                        }
                    }
                }
            }

            Ok(())
        },
        true,
    )
    .await?;

    Ok(())
}
