//! Command-line arguments for the mission runner.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Mission;

#[derive(Parser, Debug)]
#[command(
    name = "tern-robotics",
    version,
    about = "Run a differential-drive robot mission in simulation",
    long_about = "Run a differential-drive robot mission against the built-in simulator.\n\n\
                  Settings come from a TOML file and TERN__SECTION__KEY environment overrides."
)]
pub struct Cli {
    /// Configuration file (default: config/default.toml, if present).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Mission to run; overrides the configured one.
    #[arg(long, value_enum)]
    pub mission: Option<Mission>,

    /// Pace ticks to the wall clock instead of running as fast as possible.
    #[arg(long)]
    pub realtime: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["tern-robotics"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.mission.is_none());
        assert!(!cli.realtime && !cli.verbose);
    }

    #[test]
    fn test_mission_names_are_kebab_case() {
        let cli = Cli::try_parse_from(["tern-robotics", "--mission", "figure-eight", "-v"]).unwrap();
        assert_eq!(cli.mission, Some(Mission::FigureEight));
        assert!(cli.verbose);
        assert!(Cli::try_parse_from(["tern-robotics", "--mission", "spiral"]).is_err());
    }

    #[test]
    fn test_command_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
