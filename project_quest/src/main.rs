use std::sync::Arc;
use std::time::{Duration, Instant};

use engine_core::TickLoop;
use net::channels::{OutputTx, PlayerRx};
use project_quest::config::{parse_cli_args, ServerConfig};
use project_quest::realm::Realm;
use project_quest::world::World;
use space::{MapProvider, WorldMap};
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    observability::init_logging();

    let config = parse_cli_args();
    tracing::info!("Quest server starting...");

    let map: Arc<dyn MapProvider> = match WorldMap::load(
        &config.world.map_filepath,
        config.world.zone_width,
        config.world.zone_height,
    ) {
        Ok(map) => Arc::new(map),
        Err(e) => {
            tracing::error!(path = %config.world.map_filepath, "Failed to load map: {}", e);
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server_future = run_server(config, map, shutdown_rx);

    tokio::select! {
        _ = wait_for_signal() => {
            tracing::info!("Shutdown signal received, stopping server...");
            let _ = shutdown_tx.send(true);
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        _ = server_future => {}
    }

    tracing::info!("Server stopped.");
}

async fn run_server(config: ServerConfig, map: Arc<dyn MapProvider>, shutdown_rx: watch::Receiver<bool>) {
    let (player_tx, player_rx) = tokio::sync::mpsc::unbounded_channel();
    let (output_tx, output_rx) = tokio::sync::mpsc::unbounded_channel();
    let (router_tx, router_rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(net::output_router::run_output_router(output_rx, router_rx));

    let ws_addr = config.net.ws_addr.clone();
    let ws_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        if let Err(e) = net::ws_server::run_ws_server(
            ws_addr,
            player_tx,
            router_tx,
            ws_shutdown,
        )
        .await
        {
            tracing::error!("WebSocket server error: {}", e);
        }
    });

    // Tick thread (blocking)
    let tick_handle = std::thread::spawn(move || {
        run_tick_thread(player_rx, output_tx, config, map, shutdown_rx);
    });

    let _ = tick_handle.join();
}

fn run_tick_thread(
    mut player_rx: PlayerRx,
    output_tx: OutputTx,
    config: ServerConfig,
    map: Arc<dyn MapProvider>,
    shutdown_rx: watch::Receiver<bool>,
) {
    let worlds = (0..config.world.nb_worlds)
        .map(|index| World::new(config.to_world_config(index), Arc::clone(&map)))
        .collect();
    let mut tick_loop = TickLoop::new(config.to_tick_config(), Realm::new(worlds));
    let tick_duration = tick_loop.config.tick_duration();

    tracing::info!(
        worlds = config.world.nb_worlds,
        capacity = config.world.nb_players_per_world,
        tps = tick_loop.config.tps,
        "Tick loop running (Ctrl+C to stop)"
    );

    loop {
        if *shutdown_rx.borrow() {
            tracing::info!("Tick loop: shutdown signal received");
            tick_loop.sim.close_all("Server is shutting down");
            break;
        }

        let tick_start = Instant::now();

        // 1. Apply network events as they arrived
        while let Ok(event) = player_rx.try_recv() {
            tick_loop.sim.handle_net(event, &output_tx);
        }

        // 2. Timers, regeneration, visibility and outgoing queues
        let metrics = tick_loop.step();
        metrics.log();

        let elapsed = tick_start.elapsed();
        if elapsed < tick_duration {
            std::thread::sleep(tick_duration - elapsed);
        }
    }

    tracing::info!("Tick loop stopped");
}

/// Wait for SIGINT or SIGTERM (Unix) or Ctrl+C (all platforms).
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => { tracing::info!("Received SIGINT"); }
                    _ = sigterm.recv() => { tracing::info!("Received SIGTERM"); }
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("Unix signal handlers unavailable ({}), falling back to Ctrl+C", e);
            }
        }
    }
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C"),
        Err(e) => {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
