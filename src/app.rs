use crate::config::Config;
use crate::error::SessionError;
use crate::messages::{CaptureHandle, PlayerEvent, RecordedAudio, RecorderEvent, ShellCommand};
use crate::platform::{
    CpalCapture, FileStore, RecordingsDir, RodioGraph, RodioPlayback, TokioTimer,
};
use crate::services::{Player, PlayerServices, Recorder, RecorderState};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

enum Screen {
    Record,
    Playback { audio: RecordedAudio, player: Player },
}

/// Console stand-in for the record and playback screens
pub struct App {
    config: Config,
    screen: Screen,
    recorder: Recorder,
    store: RecordingsDir,
    output: rodio::OutputStream,
    recorder_rx: mpsc::UnboundedReceiver<RecorderEvent>,
    fault_rx: mpsc::UnboundedReceiver<(CaptureHandle, String)>,
    player_tx: mpsc::UnboundedSender<PlayerEvent>,
    player_rx: mpsc::UnboundedReceiver<PlayerEvent>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let output = rodio::OutputStreamBuilder::open_default_stream()
            .context("Failed to open the default audio output")?;

        let recordings = config.recordings_dir()?;

        let (recorder_tx, recorder_rx) = mpsc::unbounded_channel();
        let (fault_tx, fault_rx) = mpsc::unbounded_channel();
        let (player_tx, player_rx) = mpsc::unbounded_channel();

        let recorder = Recorder::new(
            Box::new(CpalCapture::new(config.audio_format(), fault_tx)),
            Box::new(RecordingsDir::new(recordings.clone())),
            recorder_tx,
        );

        let store = RecordingsDir::new(recordings);
        tracing::info!("Recordings are kept in {:?}", store.root());

        Ok(Self {
            config,
            screen: Screen::Record,
            recorder,
            store,
            output,
            recorder_rx,
            fault_rx,
            player_tx,
            player_rx,
        })
    }

    pub async fn run(mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        self.print_help();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read from stdin")? else {
                        tracing::info!("Input closed, shutting down");
                        break;
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match ShellCommand::parse(&line) {
                        Some(ShellCommand::Quit) => break,
                        Some(command) => self.handle_command(command).await,
                        None => tracing::warn!("Unknown command {:?}, type `help`", line.trim()),
                    }
                }

                Some(event) = self.recorder_rx.recv() => {
                    self.handle_recorder_event(event);
                }

                Some((handle, reason)) = self.fault_rx.recv() => {
                    self.recorder.capture_failed(handle, reason);
                }

                Some(event) = self.player_rx.recv() => {
                    if let Screen::Playback { player, .. } = &mut self.screen {
                        player.handle_event(event);
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl+C, shutting down");
                    break;
                }
            }
        }

        self.shutdown().await;
        Ok(())
    }

    async fn handle_command(&mut self, command: ShellCommand) {
        let on_playback = matches!(self.screen, Screen::Playback { .. });
        match command {
            ShellCommand::Help => return self.print_help(),
            ShellCommand::Back if on_playback => return self.leave_playback(),
            _ => {}
        }

        let result = match (&mut self.screen, command) {
            (Screen::Record, ShellCommand::Record) => self.recorder.start(),
            (Screen::Record, ShellCommand::Pause) => match self.recorder.state() {
                RecorderState::Paused => self.recorder.resume(),
                _ => self.recorder.pause(),
            },
            (Screen::Record, ShellCommand::Resume) => self.recorder.resume(),
            (Screen::Record, ShellCommand::Stop) => self.recorder.stop().await,

            (Screen::Playback { player, .. }, ShellCommand::Slow) => {
                player.play_at_rate(self.config.slow_rate)
            }
            (Screen::Playback { player, .. }, ShellCommand::Fast) => {
                player.play_at_rate(self.config.fast_rate)
            }
            (Screen::Playback { player, .. }, ShellCommand::Chipmunk) => {
                player.play_with_pitch_shift(self.config.chipmunk_cents)
            }
            (Screen::Playback { player, .. }, ShellCommand::DarthVader) => {
                player.play_with_pitch_shift(self.config.darth_vader_cents)
            }
            (Screen::Playback { player, .. }, ShellCommand::Stop) => {
                player.stop();
                player.hide_indicator();
                Ok(())
            }

            (Screen::Record, _) => {
                tracing::warn!("{:?} is only available on the playback screen", command);
                Ok(())
            }
            (Screen::Playback { .. }, _) => {
                tracing::warn!("{:?} is only available on the record screen", command);
                Ok(())
            }
        };

        if let Err(e) = result {
            report(&e);
        }
    }

    fn handle_recorder_event(&mut self, event: RecorderEvent) {
        match event {
            RecorderEvent::Finished(audio) => self.enter_playback(audio),
            RecorderEvent::Failed(failure) => {
                tracing::warn!("Recording was not successful: {}", failure.reason);
                if let Err(e) = self.recorder.reset() {
                    report(&e);
                }
                tracing::info!("Type `record` to try again");
            }
        }
    }

    fn enter_playback(&mut self, audio: RecordedAudio) {
        // Anything still queued belongs to a player that no longer exists
        while self.player_rx.try_recv().is_ok() {}

        let (indicator, indicator_rx) = watch::channel(false);
        watch_indicator(indicator_rx);

        let mixer = self.output.mixer().clone();
        let services = PlayerServices {
            playback: Box::new(RodioPlayback::new(mixer.clone(), self.player_tx.clone())),
            graph: Box::new(RodioGraph::new(mixer, self.player_tx.clone())),
            timer: Box::new(TokioTimer::new(self.player_tx.clone())),
            indicator: Box::new(indicator),
        };

        let player = Player::open(&audio, services, self.config.reverb());
        if player.is_ready() {
            tracing::info!("Playback: {} (slow, fast, chipmunk, vader, stop, back)", audio.title());
        } else if let Some(e) = player.load_error() {
            tracing::warn!("{} cannot be played ({}); type `back` to record again", audio.title(), e);
        }
        self.screen = Screen::Playback { audio, player };
    }

    fn leave_playback(&mut self) {
        let Screen::Playback { audio, mut player } =
            std::mem::replace(&mut self.screen, Screen::Record)
        else {
            return;
        };

        player.stop();
        player.hide_indicator();
        drop(player);

        if self.config.delete_on_leave {
            if let Err(e) = self.store.delete(audio.location()) {
                tracing::warn!("Remove failed for {:?}: {}", audio.location(), e);
            }
        }

        if let Err(e) = self.recorder.reset() {
            report(&e);
        }
        tracing::info!("Record: type `record` to start");
    }

    async fn shutdown(&mut self) {
        if matches!(
            self.recorder.state(),
            RecorderState::Recording | RecorderState::Paused
        ) {
            tracing::info!("Finishing the recording in progress");
            if let Err(e) = self.recorder.stop().await {
                report(&e);
            }
        }
        self.leave_playback();
        tracing::info!("pitchfx shutdown complete");
    }

    fn print_help(&self) {
        let commands = match self.screen {
            Screen::Record => "record, pause, resume, stop",
            Screen::Playback { .. } => "slow, fast, chipmunk, vader, stop, back",
        };
        tracing::info!("Commands: {}, help, quit", commands);
    }
}

fn report(error: &SessionError) {
    tracing::warn!("{}", error);
}

/// Log the stop control appearing and disappearing
fn watch_indicator(mut rx: watch::Receiver<bool>) {
    tokio::task::spawn_local(async move {
        while rx.changed().await.is_ok() {
            if *rx.borrow_and_update() {
                tracing::info!("Playing; type `stop` to stop");
            } else {
                tracing::info!("Playback finished");
            }
        }
    });
}
