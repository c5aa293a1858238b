use std::sync::Arc;
use std::time::Duration;

use webhook_trigger::{Dispatcher, DispatcherConfig, HeadlessSurface};

#[tokio::main]
async fn main() {
    let config = DispatcherConfig::new("https://hooks.example/webhook/dispatch")
        .with_request_timeout(Duration::from_secs(5))
        .with_debounce(Duration::from_secs(1));

    let dispatcher = Dispatcher::new(config, Arc::new(HeadlessSurface));

    match dispatcher.trigger_dispatch().await {
        Ok(outcome) => println!(
            "dispatched: accepted={} via={:?}",
            outcome.accepted, outcome.via
        ),
        Err(err) => println!("refused: {}", err),
    }
}
