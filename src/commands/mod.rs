pub mod music;
pub mod ping;
pub mod system;

use crate::{command_def, command_handler::CommandDefinition};
use once_cell::sync::Lazy;

use music::*;
use ping::PingCommand;
use system::*;

pub static COMMANDS: Lazy<Vec<CommandDefinition>> = Lazy::new(|| {
    vec![
        command_def!(PingCommand),
        command_def!(PlayCommand),
        command_def!(NowPlayingCommand),
        command_def!(QueueCommand),
        command_def!(PauseCommand),
        command_def!(ResumeCommand),
        command_def!(SkipCommand),
        command_def!(StopCommand),
        command_def!(VolumeCommand),
        command_def!(LyricsCommand),
        command_def!(StatsCommand),
        command_def!(HealthCommand),
        command_def!(CleanupCommand),
        command_def!(ArtworkCommand),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn command_names_are_unique() {
        let names: HashSet<_> = COMMANDS.iter().map(|def| def.name).collect();
        assert_eq!(names.len(), COMMANDS.len());
        assert!(names.contains("stats"));
        assert!(names.contains("artwork"));
        assert!(names.contains("lyrics"));
        assert!(names.contains("pause"));
        assert!(names.contains("resume"));
    }
}
