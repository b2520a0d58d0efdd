//! Interactive playback.
//!
//! Runs the waveform player in the terminal. SIGUSR1 toggles play/pause so
//! the player can be driven from a window manager keybinding.

use crate::audio::CpalMedia;
use crate::config::{self, WavescrubConfig};
use crate::player::{
    self, FrameScheduler, IntervalScheduler, MediaElement, PlayerOptions, ProfileName, Visualizer,
};
use crate::ui::{ClickTarget, ErrorScreen, PlayerCommand, PlayerTui, PlayerView};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

const VOLUME_STEP: f64 = 0.1;
const NOTICE_TTL: Duration = Duration::from_secs(4);
const INPUT_POLL: Duration = Duration::from_millis(16);

/// Command-line overrides for the `play` command.
#[derive(Debug, Clone, Default)]
pub struct PlayArgs {
    pub source: String,
    pub profile: Option<ProfileName>,
    pub autoplay: bool,
    pub looping: bool,
    pub no_download: bool,
}

impl PlayArgs {
    /// Player options from the config file with command-line flags on top.
    fn options(&self, config: &WavescrubConfig) -> PlayerOptions {
        let mut options = PlayerOptions::new(self.source.clone());
        options.autoplay = self.autoplay || config.player.autoplay;
        options.looping = self.looping || config.player.looping;
        options.show_download = config.player.show_download && !self.no_download;
        options
    }

    fn profile(&self, config: &WavescrubConfig) -> ProfileName {
        self.profile.unwrap_or(config.player.profile)
    }
}

/// What the loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq)]
enum LoopAction {
    Continue,
    Download,
    Quit,
}

/// Applies one input command to the visualizer.
fn apply_command<M: MediaElement, S: FrameScheduler>(
    visualizer: &mut Visualizer<M, S>,
    command: PlayerCommand,
    click: Option<ClickTarget>,
    seek_step: f64,
) -> LoopAction {
    match command {
        PlayerCommand::Continue => {}
        PlayerCommand::TogglePlay => visualizer.toggle_play_pause(),
        PlayerCommand::Seek(steps) => {
            visualizer.seek_by(f64::from(steps) * seek_step);
        }
        PlayerCommand::VolumeUp => {
            let volume = visualizer.state().volume;
            visualizer.set_volume(volume + VOLUME_STEP);
        }
        PlayerCommand::VolumeDown => {
            let volume = visualizer.state().volume;
            visualizer.set_volume(volume - VOLUME_STEP);
        }
        PlayerCommand::ToggleMute => {
            visualizer.toggle_mute();
        }
        PlayerCommand::Download => {
            if visualizer.can_download() {
                return LoopAction::Download;
            }
        }
        PlayerCommand::Click { .. } => match click {
            Some(ClickTarget::Waveform { x, region }) | Some(ClickTarget::Progress { x, region }) => {
                visualizer.seek_from_click(x, region);
            }
            None => {}
        },
        PlayerCommand::Quit => return LoopAction::Quit,
    }
    LoopAction::Continue
}

/// Display title for a source: its file name, or the source itself.
fn title_for(source: &str) -> String {
    let name = player::download::file_name_for(source, 0);
    if name.starts_with("audio_0") {
        source.to_string()
    } else {
        name
    }
}

fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("wavescrub")
}

fn show_error_screen(message: &str) -> anyhow::Result<()> {
    let mut error_screen = ErrorScreen::new()?;
    error_screen.show_error(message)?;
    error_screen.cleanup()?;
    Ok(())
}

/// Plays `args.source` in the terminal until the user quits.
///
/// # Errors
/// - If the configuration cannot be loaded
/// - If the source is empty
/// - If the terminal cannot be initialized or drawn
pub fn handle_play(args: PlayArgs) -> anyhow::Result<()> {
    tracing::info!("=== wavescrub player started ===");

    let config_data = match config::WavescrubConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            show_error_screen(&format!(
                "Configuration Error:\n\n{err}\n\nPlease check your ~/.config/wavescrub/wavescrub.toml file and try again."
            ))?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    let profile_name = args.profile(&config_data);
    let options = args.options(&config_data);
    tracing::info!(
        "Playing {} with profile={}, autoplay={}, loop={}, device={}",
        options.source,
        profile_name,
        options.autoplay,
        options.looping,
        config_data.audio.device
    );

    let media = CpalMedia::new(config_data.audio.device.clone(), cache_dir());
    let scheduler = IntervalScheduler::new(config_data.display.frame_interval());
    let mut visualizer = match Visualizer::new(
        media,
        scheduler,
        options,
        profile_name.profile(),
        config_data.display.scroll_smoothing(),
    ) {
        Ok(visualizer) => visualizer.on_ended(|| tracing::info!("Playback reached the end")),
        Err(e) => {
            tracing::error!("Failed to create player: {e}");
            show_error_screen(&format!("Player Error:\n\n{e}"))?;
            return Err(e.into());
        }
    };
    visualizer.set_volume(config_data.player.volume);

    let toggle_signal = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&toggle_signal))
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    let mut tui = PlayerTui::new().map_err(|e| anyhow::anyhow!("Failed to initialize UI: {e}"))?;
    let result = run_loop(&mut visualizer, &mut tui, &config_data, &toggle_signal);

    if let Err(e) = tui.cleanup() {
        tracing::warn!("Failed to restore terminal: {e}");
    }
    visualizer.dispose();
    tracing::info!("=== wavescrub player stopped ===");
    result
}

fn run_loop(
    visualizer: &mut Visualizer<CpalMedia, IntervalScheduler>,
    tui: &mut PlayerTui,
    config_data: &WavescrubConfig,
    toggle_signal: &AtomicBool,
) -> anyhow::Result<()> {
    let title = title_for(visualizer.source());
    let download_dir = config_data.download.resolve_directory();
    let seek_step = config_data.display.seek_step_secs;

    let mut pending_download: Option<oneshot::Receiver<anyhow::Result<PathBuf>>> = None;
    let mut notice: Option<(String, Instant)> = None;
    let mut last_frame = Instant::now();

    loop {
        let now = Instant::now();
        let elapsed = now.duration_since(last_frame);
        last_frame = now;

        if toggle_signal.swap(false, Ordering::Relaxed) {
            tracing::info!("Received SIGUSR1: toggling playback");
            visualizer.toggle_play_pause();
        }

        visualizer.pump_events(now);
        visualizer.pump_frame(now);
        let offset = visualizer.follow_viewport(f64::from(tui.waveform_width()), elapsed);

        if let Some(receiver) = pending_download.as_mut() {
            match receiver.try_recv() {
                Ok(Ok(path)) => {
                    notice = Some((format!("Saved to {}", path.display()), now));
                    pending_download = None;
                }
                Ok(Err(e)) => {
                    notice = Some((format!("Download failed: {e}"), now));
                    pending_download = None;
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    tracing::warn!("Download task ended without a result");
                    pending_download = None;
                }
            }
        }
        if notice
            .as_ref()
            .is_some_and(|(_, shown)| now.duration_since(*shown) > NOTICE_TTL)
        {
            notice = None;
        }

        let bars = visualizer.bars();
        let position = visualizer.position();
        let view = PlayerView {
            title: &title,
            profile: visualizer.profile(),
            bars: &bars,
            state: visualizer.state(),
            progress: position.progress,
            scroll_offset: offset,
            can_download: visualizer.can_download() && pending_download.is_none(),
            notice: notice.as_ref().map(|(text, _)| text.as_str()),
        };
        tui.draw(&view)
            .map_err(|e| anyhow::anyhow!("Render failed: {e}"))?;

        let command = tui.handle_input(INPUT_POLL).map_err(|e| {
            tracing::error!("Input handling error: {}", e);
            anyhow::anyhow!("Input handling error: {e}")
        })?;
        let click = match command {
            PlayerCommand::Click { column, row } => tui.hit(column, row),
            _ => None,
        };

        match apply_command(visualizer, command, click, seek_step) {
            LoopAction::Continue => {}
            LoopAction::Quit => break,
            LoopAction::Download if pending_download.is_some() => {}
            LoopAction::Download => {
                let (sender, receiver) = oneshot::channel();
                let source = visualizer.source().to_string();
                let dir = download_dir.clone();
                tokio::spawn(async move {
                    let _ = sender.send(player::download::download(&source, &dir).await);
                });
                pending_download = Some(receiver);
                notice = Some(("Downloading…".to_string(), Instant::now()));
            }
        }
    }

    Ok(())
}
