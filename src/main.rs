#![warn(clippy::all)]

#[global_allocator]
static GLOBAL: alloc::TrackingAllocator<mimalloc::MiMalloc> =
    alloc::TrackingAllocator::new(mimalloc::MiMalloc);

pub mod alloc;
pub mod artwork;
pub mod command_handler;
pub mod commands;
pub mod config;
pub mod gateway;
pub mod lavalink_events;
pub mod metrics;
pub mod state;
pub mod utils;

#[tokio::main]
#[tracing::instrument]
async fn main() -> anyhow::Result<()> {
    print_banner();
    crate::gateway::initialize_and_run_bot().await
}

const BANNER: &str = r#"
                 _
  ___ __ _  __| | ___ _ __   ___ ___
 / __/ _` |/ _` |/ _ \ '_ \ / __/ _ \
| (_| (_| | (_| |  __/ | | | (_| __/
 \___\__,_|\__,_|\___|_| |_|\___\___|

Cadence - music that keeps an eye on itself
"#;

fn print_banner() {
    let git_hash = env!("GIT_HASH");
    let build_time = env!("BUILD_TIME");
    let version = env!("APP_VERSION");

    println!("{}", BANNER);
    println!("  Version   : {}", version);
    println!("  Commit    : {}", git_hash);
    println!("  Built at  : {}", build_time);
    println!("--------------------------------------------------------------\n");
}
