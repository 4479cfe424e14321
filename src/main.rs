use actix_web::{web, App, HttpServer};
use clap::Parser;
use std::sync::Arc;

mod models;
mod services;
mod state;
mod api;
mod cli;
mod metrics;

use cli::CommandArgs;
use services::SysinfoProbe;
use state::new_state;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CommandArgs::parse();
    let bind_address = format!("{}:{}", args.address, args.port);
    let sampler_config = args.sampler_config();

    log::info!(
        "Sampler: tick {:?}, {} samples per session, {}s window",
        sampler_config.tick_interval,
        sampler_config.capacity,
        sampler_config.view.window_secs
    );

    let state = new_state(Arc::new(SysinfoProbe::new()), sampler_config);

    print_banner(&args);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(api::configure)
    })
        .bind(&bind_address)?
        .run()
        .await?;

    Ok(())
}

fn print_banner(args: &CommandArgs) {
    println!("╔═══════════════════════════════════════════════════════════╗");
    println!("║      procwatch v{:<42}║", env!("CARGO_PKG_VERSION"));
    println!("║      Process list, kill and live CPU/memory sampling      ║");
    println!("╚═══════════════════════════════════════════════════════════╝");
    println!();
    println!("🚀 Server starting on http://{}:{}", args.address, args.port);
    println!();
    println!("📋 Available endpoints:");
    println!("  GET    /api/process/list?filter=  - List processes");
    println!("  POST   /api/process/kill          - Kill a listed process");
    println!("  POST   /api/session               - Open a sampling session");
    println!("  GET    /api/session               - List sampling sessions");
    println!("  GET    /api/session/{{id}}          - Latest samples of a session");
    println!("  DELETE /api/session/{{id}}          - Close a sampling session");
    println!("  GET    /metrics                   - Prometheus metrics");
    println!("  GET    /health                    - Health check");
    println!("═══════════════════════════════════════════════════════════");
}
