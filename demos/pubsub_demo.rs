//! Subscription registry demo
//!
//! Run with: cargo run --example pubsub_demo [CLIENTS]
//!
//! Simulates CLIENTS connections (default 8) sending subscribe and
//! unsubscribe messages concurrently. Every other client authenticates and
//! joins the private `notifications` channel. A fan-out pass then delivers
//! one message per channel, and the Prometheus metrics are printed.
//!
//! Set `RUST_LOG=channelize=debug` to see registry activity.

use std::sync::Arc;

use bytes::Bytes;
use channelize::conn::Authenticator;
use channelize::protocol::OutboundMessage;
use channelize::{
    AuthError, Channel, Config, Connection, ConnectionWrapper, Dispatcher, PrometheusCollector,
    SubscriptionRegistry, UserId,
};
use tokio::sync::mpsc;

const DEFAULT_CLIENTS: usize = 8;

/// Accepts tokens of the form `token-<user>`
fn demo_authenticator() -> Authenticator {
    Arc::new(|token: &str| {
        token
            .strip_prefix("token-")
            .filter(|user| !user.is_empty())
            .map(UserId::new)
            .ok_or_else(|| AuthError::InvalidToken(token.to_string()))
    })
}

fn print_usage() {
    eprintln!("Usage: pubsub_demo [CLIENTS]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  CLIENTS    Number of simulated connections (default: {})", DEFAULT_CLIENTS);
}

/// Fan out one message per channel to the current subscribers
async fn fan_out(registry: &SubscriptionRegistry, channels: &[&str]) -> channelize::Result<usize> {
    let mut delivered = 0;
    for name in channels {
        let channel = Channel::from(*name);
        let frame = OutboundMessage::new(channel.clone(), format!("hello {}", name)).encode()?;
        for subscriber in registry.connections(&channel).await {
            if subscriber.send(frame.clone()) {
                delivered += 1;
            }
        }
    }
    Ok(delivered)
}

/// Count the frames waiting in a client's outbound queue
fn drain(rx: &mut mpsc::Receiver<Bytes>) -> usize {
    let mut count = 0;
    while rx.try_recv().is_ok() {
        count += 1;
    }
    count
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let clients = match args.get(1) {
        Some(arg) => match arg.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                eprintln!("Error: invalid client count '{}'", arg);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        },
        None => DEFAULT_CLIENTS,
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pubsub_demo=info".parse()?),
        )
        .init();

    let config = Config::default()
        .private_channel("notifications")
        .max_channels_per_message(8);

    let collector = Arc::new(PrometheusCollector::new(&config.metrics_namespace)?);
    let registry = Arc::new(SubscriptionRegistry::with_collector(collector.clone()));
    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&registry), &config));

    let mut tasks = Vec::with_capacity(clients);
    for i in 0..clients {
        let dispatcher = Arc::clone(&dispatcher);
        let config = config.clone();

        tasks.push(tokio::spawn(async move {
            let (conn, rx) = Connection::new(&config);
            let conn = Arc::new(conn.with_authenticator(demo_authenticator()));

            let subscribe = if i % 2 == 0 {
                format!(
                    r#"{{"type":"subscribe","params":{{"channels":["feed","alerts","notifications"],"token":"token-user{}"}}}}"#,
                    i
                )
            } else {
                r#"{"type":"subscribe","params":{"channels":["feed","alerts"]}}"#.to_string()
            };
            dispatcher.parse_message(&conn, subscribe.as_bytes()).await;

            if i % 3 == 0 {
                dispatcher
                    .parse_message(&conn, br#"{"type":"unsubscribe","params":{"channels":["alerts"]}}"#)
                    .await;
            }

            (conn, rx)
        }));
    }

    let mut connections = Vec::with_capacity(clients);
    for task in tasks {
        connections.push(task.await?);
    }

    let stats = registry.stats().await;
    tracing::info!(
        open = stats.open_connections,
        channels = stats.subscribed_channels,
        private = stats.private_connections,
        "Clients subscribed"
    );

    let delivered = fan_out(&registry, &["feed", "alerts", "notifications"]).await?;
    println!("Delivered {} frames", delivered);

    for (conn, rx) in connections.iter_mut() {
        println!(
            "{} user={:?} channels={:?} received={}",
            conn.id(),
            conn.user_id().map(|u| u.to_string()),
            registry
                .channels(conn.id())
                .await
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>(),
            drain(rx)
        );
    }

    // Transports close
    for (conn, _) in &connections {
        dispatcher.remove(conn.id()).await;
    }

    println!();
    println!("{}", collector.gather_text()?);

    Ok(())
}
