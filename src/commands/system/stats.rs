use super::{SYSTEM_COLOR, mib};
use crate::command_handler::{
    Command, CommandContext, CommandResponseBuilder, GlobalState, now_timestamp,
};
use crate::metrics::PerformanceReport;
use crate::utils::duration::format_uptime;
use anyhow::Result;
use async_trait::async_trait;
use twilight_interactions::command::{CommandModel, CreateCommand};
use twilight_model::channel::message::Embed;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder};

#[derive(CommandModel, CreateCommand)]
#[command(name = "stats", desc = "Show performance statistics collected by the bot.")]
pub struct StatsCommand;

#[async_trait]
impl Command for StatsCommand {
    async fn execute(state: GlobalState, cmd_ctx: &CommandContext) -> Result<()> {
        let report = state.metrics.report();
        let embed = build_stats_embed(&report);
        cmd_ctx
            .reply(CommandResponseBuilder::new().embed(embed).build())
            .await?;
        Ok(())
    }
}

fn build_stats_embed(report: &PerformanceReport) -> Embed {
    let memory = match &report.memory {
        Some(stats) => [
            format!("**Current:** {}", mib(stats.current.heap_used)),
            format!("**Peak:** {}", mib(stats.peak.heap_used)),
            format!("**Average:** {}", mib(stats.average_heap_used as u64)),
            format!("**RSS:** {}", mib(stats.current.resident_set_size)),
            format!("**Non-heap:** {}", mib(stats.current.external)),
        ]
        .join("\n"),
        None => "No samples collected yet".to_string(),
    };

    let connections = &report.connections;
    let connection_lines = [
        format!("**Last hour:** {} events", connections.last_hour_events),
        format!("**Connects:** {}", connections.connects),
        format!("**Disconnects:** {}", connections.disconnects),
        format!("**Errors:** {}", connections.errors),
        format!("**Retained:** {}", connections.total_events),
    ]
    .join("\n");

    let errors = if report.errors.is_empty() {
        "None recorded".to_string()
    } else {
        report
            .errors
            .iter()
            .map(|(category, count)| format!("`{}`: {}", category, count))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let points = report.data_points;
    let mut embed = EmbedBuilder::new()
        .title("📊 Performance Statistics")
        .color(SYSTEM_COLOR)
        .description(format!(
            "**Uptime:** {}\n**Monitoring:** {}\n**Data points:** {} memory · {} cpu · {} events",
            format_uptime(report.uptime),
            if report.running { "🟢 Active" } else { "🔴 Stopped" },
            points.memory,
            points.cpu,
            points.connections
        ))
        .field(EmbedFieldBuilder::new("💾 Heap", memory).inline())
        .field(EmbedFieldBuilder::new("🔌 Connections", connection_lines).inline())
        .field(EmbedFieldBuilder::new("❌ Errors", errors));
    if let Some(timestamp) = now_timestamp() {
        embed = embed.timestamp(timestamp);
    }
    embed.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{ConnectionStatistics, DataPoints, ErrorTally};
    use std::time::Duration;

    #[test]
    fn stats_embed_lists_uptime_and_error_categories() {
        let mut errors = ErrorTally::new();
        errors.insert("command".to_string(), 3);
        let report = PerformanceReport {
            uptime: Duration::from_secs(3723),
            memory: None,
            connections: ConnectionStatistics::default(),
            errors,
            running: true,
            data_points: DataPoints::default(),
        };

        let embed = build_stats_embed(&report);

        let description = embed.description.unwrap_or_default();
        assert!(description.contains("1h 2m 3s"));
        assert!(description.contains("Active"));
        assert_eq!(embed.fields[0].value, "No samples collected yet");
        assert_eq!(embed.fields[2].value, "`command`: 3");
    }
}
