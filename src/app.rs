//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to the command handlers.

use crate::commands::{self, PlayArgs};
use crate::logging;
use crate::player::ProfileName;
use crate::setup;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process;

/// A terminal audio player with a scrubbable waveform display
#[derive(Parser)]
#[command(name = "wavescrub")]
#[command(version)]
#[command(about = "A terminal audio player with a scrubbable waveform display")]
#[command(long_about = "A terminal audio player with a scrubbable, scroll-following waveform display.\n\nDEFAULT COMMAND:\n    If a SOURCE is given without a command, 'play' is used.\n\nEXAMPLES:\n    # Play a local file\n    $ wavescrub song.mp3\n\n    # Stream a remote file with the centered scrolling profile, looping\n    $ wavescrub play https://example.com/track.ogg --profile smooth --loop\n\n    # Save a source to the download directory\n    $ wavescrub download https://example.com/track.ogg\n\n    # Toggle playback from another terminal\n    $ pkill -USR1 wavescrub")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/wavescrub/wavescrub.toml\n    Logs:               ~/.local/state/wavescrub/wavescrub.log.*"
)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Audio file path or http(s) URL to play (play default command)
    #[arg(value_name = "SOURCE")]
    source: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a source with the waveform player (default)
    ///
    /// Space toggles playback, arrows seek, click the waveform or the
    /// progress bar to jump, m mutes, d downloads, q quits.
    #[command(visible_alias = "p")]
    Play {
        /// Audio file path, file:// URI or http(s) URL
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Visual profile (see `wavescrub profiles`)
        #[arg(short, long, value_enum)]
        profile: Option<ProfileName>,

        /// Start playing as soon as the source is ready
        #[arg(short, long)]
        autoplay: bool,

        /// Restart from the beginning when the source ends
        #[arg(short = 'l', long = "loop")]
        looping: bool,

        /// Hide the download action
        #[arg(long)]
        no_download: bool,
    },

    /// Download a source without playing it
    ///
    /// Saves into the configured download directory unless -o is given.
    /// Prints the saved path.
    #[command(visible_alias = "d")]
    Download {
        /// Audio file path or http(s) URL
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Target directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// List the built-in visual profiles
    Profiles,

    /// Open configuration file in your preferred editor
    ///
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio output devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the output device in wavescrub.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   wavescrub completions bash > wavescrub.bash
    ///   wavescrub completions zsh > _wavescrub
    ///   wavescrub completions fish > wavescrub.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the application based on command-line arguments.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
///
/// # Errors
/// - If setup fails
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Commands that need neither logging nor a config file
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "wavescrub", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::Profiles) => {
            commands::handle_profiles();
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    logging::init_logging()?;
    setup::check_and_run_setup()?;

    match cli.command {
        None => match cli.source {
            Some(source) => commands::handle_play(PlayArgs {
                source,
                ..PlayArgs::default()
            })?,
            None => {
                Cli::command().print_help()?;
                process::exit(2);
            }
        },
        Some(Commands::Play {
            source,
            profile,
            autoplay,
            looping,
            no_download,
        }) => {
            commands::handle_play(PlayArgs {
                source,
                profile,
                autoplay,
                looping,
                no_download,
            })?;
        }
        Some(Commands::Download { source, output }) => {
            commands::handle_download(source, output).await?;
        }
        Some(Commands::Config) => {
            commands::handle_config()?;
        }
        Some(Commands::Completions { .. })
        | Some(Commands::Profiles)
        | Some(Commands::ListDevices)
        | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
