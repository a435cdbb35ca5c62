//! Register a room worker and print counters until Ctrl-C.
//!
//! Run with:
//!   JOBWIRE_URL=ws://localhost:7880/agent JOBWIRE_TOKEN=... \
//!     cargo run --example room-worker

use std::time::Duration;

use jobwire::worker::{connect, JobType};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::var("JOBWIRE_URL")
        .unwrap_or_else(|_| "ws://localhost:7880/agent".to_string());
    let token = std::env::var("JOBWIRE_TOKEN")?;

    let client = connect(&url, &token, JobType::Room).await?;
    client.register().await?;
    eprintln!("Registered as {}", client.identity().worker_id());

    let mut ticker = tokio::time::interval(Duration::from_secs(5));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            end = client.session_ended() => {
                eprintln!("Session ended: {end:?}");
                break;
            }
            _ = ticker.tick() => {
                eprintln!("{:?}", client.state().snapshot());
            }
        }
    }

    client.close().await;
    Ok(())
}
