mod artwork;
mod cleanup;
mod health;
mod stats;

pub use artwork::ArtworkCommand;
pub use cleanup::CleanupCommand;
pub use health::HealthCommand;
pub use stats::StatsCommand;

pub const SYSTEM_COLOR: u32 = 0x32CD32;
pub const WARNING_COLOR: u32 = 0xFFA500;

fn mib(bytes: u64) -> String {
    format!("{:.1}MB", bytes as f64 / 1024.0 / 1024.0)
}

fn flag(value: bool) -> &'static str {
    if value { "🔴 Yes" } else { "🟢 No" }
}
