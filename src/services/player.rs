use crate::audio::{AudioClip, EffectsChain, ReverbPreset};
use crate::error::{PlaybackError, SessionError};
use crate::messages::{PlaybackId, PlayerEvent, RecordedAudio};
use crate::platform::{EffectsGraph, IndicatorSink, PlaybackService, TimerService};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerState {
    Idle,
    PlayingSimple { rate: f32 },
    PlayingEffected { cents: f32 },
    Stopped,
}

impl PlayerState {
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::PlayingSimple { .. } | Self::PlayingEffected { .. })
    }
}

/// Reverb applied on the effects path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbSettings {
    pub preset: ReverbPreset,
    pub wet_dry_mix: f32,
}

impl Default for ReverbSettings {
    fn default() -> Self {
        Self {
            preset: ReverbPreset::LargeRoom,
            wet_dry_mix: 50.0,
        }
    }
}

pub struct PlayerServices {
    pub playback: Box<dyn PlaybackService>,
    pub graph: Box<dyn EffectsGraph>,
    pub timer: Box<dyn TimerService>,
    pub indicator: Box<dyn IndicatorSink>,
}

/// Plays one recording, either at a different rate or through the effects chain
///
/// The two paths never overlap: every play call tears down whatever was
/// running first. The simple path reports its own end; the effects path is
/// covered by a timer for the clip's duration, with at most one timer armed.
pub struct Player {
    state: PlayerState,
    clip: Option<AudioClip>,
    load_error: Option<PlaybackError>,
    services: PlayerServices,
    reverb: ReverbSettings,
    indicator_visible: bool,
    current: Option<PlaybackId>,
    pending_timer: Option<PlaybackId>,
    next_id: u64,
}

impl Player {
    /// Load the recording up front. A resource that cannot be read leaves the
    /// player without a clip, and every play call then fails with `NoResource`.
    pub fn open(audio: &RecordedAudio, mut services: PlayerServices, reverb: ReverbSettings) -> Self {
        let loaded = AudioClip::open(audio.location()).and_then(|clip| {
            services.playback.load(&clip)?;
            Ok(clip)
        });

        let (clip, load_error) = match loaded {
            Ok(clip) => {
                tracing::info!(
                    "Loaded {} ({:.1}s)",
                    audio.title(),
                    clip.duration().as_secs_f32()
                );
                (Some(clip), None)
            }
            Err(e) => {
                tracing::error!("Cannot play {}: {}", audio.title(), e);
                (None, Some(e))
            }
        };

        Self {
            state: PlayerState::Idle,
            clip,
            load_error,
            services,
            reverb,
            indicator_visible: false,
            current: None,
            pending_timer: None,
            next_id: 0,
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.clip.is_some()
    }

    pub fn load_error(&self) -> Option<&PlaybackError> {
        self.load_error.as_ref()
    }

    pub fn indicator_visible(&self) -> bool {
        self.indicator_visible
    }

    pub fn play_at_rate(&mut self, rate: f32) -> Result<(), SessionError> {
        if self.clip.is_none() {
            return Err(SessionError::NoResource);
        }
        if !rate.is_finite() || rate <= 0.0 {
            return Err(SessionError::InvalidRate(rate));
        }

        self.stop();
        let id = self.next_playback();

        let playback = &mut self.services.playback;
        playback.set_rate(rate);
        playback.rewind();
        if let Err(e) = playback.play(id) {
            playback.stop();
            self.abandon();
            return Err(e.into());
        }

        if self.services.playback.is_playing() {
            tracing::info!("Playing at rate {}", rate);
            self.state = PlayerState::PlayingSimple { rate };
            self.current = Some(id);
            self.set_indicator(true);
        } else {
            self.abandon();
        }
        Ok(())
    }

    /// Pitch shift is in cents: +1200 is an octave up
    pub fn play_with_pitch_shift(&mut self, cents: f32) -> Result<(), SessionError> {
        let Some(clip) = self.clip.clone() else {
            return Err(SessionError::NoResource);
        };
        if !cents.is_finite() {
            return Err(SessionError::InvalidPitch(cents));
        }

        self.stop();

        let chain = match EffectsChain::pitch_and_reverb(
            cents,
            self.reverb.preset,
            self.reverb.wet_dry_mix,
        ) {
            Ok(chain) => chain,
            Err(e) => {
                self.abandon();
                return Err(e.into());
            }
        };

        let id = self.next_playback();
        if let Err(e) = self.services.graph.start(&chain, &clip, id) {
            self.services.graph.stop();
            self.services.graph.reset();
            self.abandon();
            return Err(e.into());
        }

        tracing::info!("Playing with pitch shift of {} cents", cents);
        self.state = PlayerState::PlayingEffected { cents };
        self.current = Some(id);
        self.set_indicator(true);
        self.arm_timer(id, clip.duration());
        Ok(())
    }

    /// Tear down both paths. Safe to call at any time; leaves the indicator alone.
    pub fn stop(&mut self) {
        self.services.playback.stop();

        if !self.services.graph.is_empty() {
            self.services.graph.stop();
            self.services.graph.reset();
        }

        self.cancel_timer();
        self.current = None;

        if self.state.is_playing() {
            tracing::debug!("Playback stopped");
            self.state = PlayerState::Stopped;
        }
    }

    pub fn hide_indicator(&mut self) {
        self.set_indicator(false);
    }

    pub fn handle_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::PlaybackFinished { id } => {
                if self.current == Some(id)
                    && matches!(self.state, PlayerState::PlayingSimple { .. })
                {
                    self.finish();
                }
            }
            PlayerEvent::EffectsFinished { id } => {
                if self.current == Some(id)
                    && matches!(self.state, PlayerState::PlayingEffected { .. })
                {
                    self.cancel_timer();
                    self.finish();
                }
            }
            PlayerEvent::TimerFired { id } => {
                if self.pending_timer != Some(id) {
                    tracing::debug!("Ignoring stale timer {:?}", id);
                    return;
                }
                self.pending_timer = None;
                if self.current == Some(id) {
                    self.finish();
                }
            }
        }
    }

    fn finish(&mut self) {
        tracing::debug!("Playback {:?} finished", self.current);
        self.state = PlayerState::Stopped;
        self.current = None;
        self.set_indicator(false);
    }

    /// A restart that never got going; the previous playback is already gone
    fn abandon(&mut self) {
        self.state = PlayerState::Stopped;
        self.set_indicator(false);
    }

    fn arm_timer(&mut self, id: PlaybackId, after: Duration) {
        self.cancel_timer();
        self.services.timer.schedule_once(after, id);
        self.pending_timer = Some(id);
    }

    fn cancel_timer(&mut self) {
        if let Some(id) = self.pending_timer.take() {
            self.services.timer.invalidate(id);
        }
    }

    fn set_indicator(&mut self, visible: bool) {
        if self.indicator_visible != visible {
            self.indicator_visible = visible;
            self.services.indicator.set_visible(visible);
        }
    }

    fn next_playback(&mut self) -> PlaybackId {
        self.next_id += 1;
        PlaybackId(self.next_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct FakePlayback {
        log: Log,
        playing: bool,
        fail_play: bool,
    }

    impl PlaybackService for FakePlayback {
        fn load(&mut self, _clip: &AudioClip) -> Result<(), PlaybackError> {
            self.log.borrow_mut().push("playback.load".into());
            Ok(())
        }

        fn set_rate(&mut self, rate: f32) {
            self.log.borrow_mut().push(format!("playback.rate {}", rate));
        }

        fn rewind(&mut self) {
            self.log.borrow_mut().push("playback.rewind".into());
        }

        fn play(&mut self, _id: PlaybackId) -> Result<(), PlaybackError> {
            self.log.borrow_mut().push("playback.play".into());
            if self.fail_play {
                return Err(PlaybackError::Output("no device".into()));
            }
            self.playing = true;
            Ok(())
        }

        fn stop(&mut self) {
            if self.playing {
                self.log.borrow_mut().push("playback.stop".into());
            }
            self.playing = false;
        }

        fn is_playing(&self) -> bool {
            self.playing
        }
    }

    struct FakeGraph {
        log: Log,
        built: Rc<RefCell<bool>>,
        fail_start: bool,
    }

    impl EffectsGraph for FakeGraph {
        fn start(
            &mut self,
            chain: &EffectsChain,
            _clip: &AudioClip,
            _id: PlaybackId,
        ) -> Result<(), GraphError> {
            assert!(!*self.built.borrow(), "graph started on top of a live graph");
            self.log
                .borrow_mut()
                .push(format!("graph.start {}", chain.stages().len()));
            *self.built.borrow_mut() = true;
            if self.fail_start {
                return Err(GraphError::EmptyClip);
            }
            Ok(())
        }

        fn stop(&mut self) {
            self.log.borrow_mut().push("graph.stop".into());
        }

        fn reset(&mut self) {
            self.log.borrow_mut().push("graph.reset".into());
            *self.built.borrow_mut() = false;
        }

        fn is_empty(&self) -> bool {
            !*self.built.borrow()
        }
    }

    #[derive(Default)]
    struct TimerLog {
        live: Vec<(PlaybackId, Duration)>,
        cancelled: Vec<PlaybackId>,
    }

    struct FakeTimer {
        state: Rc<RefCell<TimerLog>>,
    }

    impl TimerService for FakeTimer {
        fn schedule_once(&mut self, after: Duration, id: PlaybackId) {
            let mut state = self.state.borrow_mut();
            assert!(state.live.is_empty(), "second timer armed while one is live");
            state.live.push((id, after));
        }

        fn invalidate(&mut self, id: PlaybackId) {
            let mut state = self.state.borrow_mut();
            state.live.retain(|(live, _)| *live != id);
            state.cancelled.push(id);
        }
    }

    struct FakeIndicator {
        changes: Rc<RefCell<Vec<bool>>>,
    }

    impl IndicatorSink for FakeIndicator {
        fn set_visible(&mut self, visible: bool) {
            self.changes.borrow_mut().push(visible);
        }
    }

    struct Harness {
        player: Player,
        log: Log,
        graph_built: Rc<RefCell<bool>>,
        timers: Rc<RefCell<TimerLog>>,
        indicator: Rc<RefCell<Vec<bool>>>,
        _dir: tempfile::TempDir,
    }

    fn write_clip(path: &Path, frames: usize) {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for n in 0..frames {
            writer.write_sample(((n % 40) as i16 - 20) * 500).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn harness_with(
        frames: Option<usize>,
        fail_play: bool,
        fail_graph: bool,
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().join("06032015-140509.wav");
        match frames {
            Some(frames) => write_clip(&location, frames),
            None => std::fs::write(&location, b"not audio").unwrap(),
        }
        let audio = RecordedAudio::new(location, "06032015-140509.wav".into());

        let log: Log = Rc::default();
        let graph_built = Rc::new(RefCell::new(false));
        let timers = Rc::new(RefCell::new(TimerLog::default()));
        let indicator = Rc::new(RefCell::new(Vec::new()));

        let services = PlayerServices {
            playback: Box::new(FakePlayback {
                log: log.clone(),
                playing: false,
                fail_play,
            }),
            graph: Box::new(FakeGraph {
                log: log.clone(),
                built: graph_built.clone(),
                fail_start: fail_graph,
            }),
            timer: Box::new(FakeTimer {
                state: timers.clone(),
            }),
            indicator: Box::new(FakeIndicator {
                changes: indicator.clone(),
            }),
        };

        Harness {
            player: Player::open(&audio, services, ReverbSettings::default()),
            log,
            graph_built,
            timers,
            indicator,
            _dir: dir,
        }
    }

    fn harness() -> Harness {
        harness_with(Some(4000), false, false)
    }

    impl Harness {
        fn take_log(&self) -> Vec<String> {
            std::mem::take(&mut *self.log.borrow_mut())
        }
    }

    #[test]
    fn test_stop_when_idle_is_a_no_op() {
        let mut h = harness();
        h.take_log();
        h.player.stop();
        h.player.stop();
        assert_eq!(h.player.state(), PlayerState::Idle);
        assert!(h.take_log().is_empty());
        assert!(h.indicator.borrow().is_empty());
    }

    #[test]
    fn test_play_at_rate_shows_indicator_until_finished() {
        let mut h = harness();
        h.take_log();
        h.player.play_at_rate(0.5).unwrap();

        assert_eq!(h.player.state(), PlayerState::PlayingSimple { rate: 0.5 });
        assert!(h.player.indicator_visible());
        assert_eq!(
            h.take_log(),
            vec!["playback.rate 0.5", "playback.rewind", "playback.play"]
        );

        // Completion from an older playback is ignored
        h.player.handle_event(PlayerEvent::PlaybackFinished { id: PlaybackId(0) });
        assert!(h.player.indicator_visible());

        h.player.handle_event(PlayerEvent::PlaybackFinished { id: PlaybackId(1) });
        assert_eq!(h.player.state(), PlayerState::Stopped);
        assert_eq!(*h.indicator.borrow(), vec![true, false]);
    }

    #[test]
    fn test_stop_during_fast_playback_then_hide() {
        let mut h = harness();
        h.player.play_at_rate(2.0).unwrap();

        h.player.stop();
        assert!(h.player.indicator_visible(), "stop leaves the indicator to the caller");
        h.player.hide_indicator();
        assert!(!h.player.indicator_visible());
        assert_eq!(h.player.state(), PlayerState::Stopped);

        h.player.play_with_pitch_shift(1200.0).unwrap();
        assert_eq!(
            h.player.state(),
            PlayerState::PlayingEffected { cents: 1200.0 }
        );
        assert_eq!(*h.indicator.borrow(), vec![true, false, true]);
    }

    #[test]
    fn test_rate_playback_tears_down_effects_first() {
        let mut h = harness();
        h.player.play_with_pitch_shift(-1000.0).unwrap();
        assert!(*h.graph_built.borrow());
        h.take_log();

        h.player.play_at_rate(2.0).unwrap();
        assert!(!*h.graph_built.borrow());
        assert_eq!(
            h.take_log(),
            vec![
                "graph.stop",
                "graph.reset",
                "playback.rate 2",
                "playback.rewind",
                "playback.play"
            ]
        );
        assert!(h.timers.borrow().live.is_empty());
    }

    #[test]
    fn test_effects_playback_tears_down_simple_first() {
        let mut h = harness();
        h.player.play_at_rate(0.5).unwrap();
        h.take_log();

        h.player.play_with_pitch_shift(1200.0).unwrap();
        assert_eq!(h.take_log(), vec!["playback.stop", "graph.start 4"]);
    }

    #[test]
    fn test_restarting_effects_cancels_exactly_one_timer() {
        let mut h = harness();
        h.player.play_with_pitch_shift(1200.0).unwrap();
        assert_eq!(h.timers.borrow().live.len(), 1);

        h.player.play_with_pitch_shift(-1000.0).unwrap();
        let timers = h.timers.borrow();
        assert_eq!(timers.cancelled, vec![PlaybackId(1)]);
        assert_eq!(timers.live, vec![(PlaybackId(2), Duration::from_millis(500))]);
    }

    #[test]
    fn test_timer_hides_indicator_once() {
        let mut h = harness();
        h.player.play_with_pitch_shift(-1000.0).unwrap();
        assert_eq!(
            h.timers.borrow().live,
            vec![(PlaybackId(1), Duration::from_millis(500))]
        );

        h.player.handle_event(PlayerEvent::TimerFired { id: PlaybackId(1) });
        assert!(!h.player.indicator_visible());
        assert_eq!(h.player.state(), PlayerState::Stopped);

        // A late graph completion or duplicate expiry changes nothing
        h.player.handle_event(PlayerEvent::EffectsFinished { id: PlaybackId(1) });
        h.player.handle_event(PlayerEvent::TimerFired { id: PlaybackId(1) });
        assert_eq!(*h.indicator.borrow(), vec![true, false]);
    }

    #[test]
    fn test_stale_timer_does_not_hide_new_playback() {
        let mut h = harness();
        h.player.play_with_pitch_shift(1200.0).unwrap();
        h.player.play_with_pitch_shift(1200.0).unwrap();

        h.player.handle_event(PlayerEvent::TimerFired { id: PlaybackId(1) });
        assert!(h.player.indicator_visible());

        h.player.handle_event(PlayerEvent::TimerFired { id: PlaybackId(2) });
        assert!(!h.player.indicator_visible());
    }

    #[test]
    fn test_graph_completion_cancels_timer() {
        let mut h = harness();
        h.player.play_with_pitch_shift(1200.0).unwrap();
        h.player.handle_event(PlayerEvent::EffectsFinished { id: PlaybackId(1) });

        assert!(!h.player.indicator_visible());
        assert!(h.timers.borrow().live.is_empty());
        h.player.handle_event(PlayerEvent::TimerFired { id: PlaybackId(1) });
        assert_eq!(*h.indicator.borrow(), vec![true, false]);
    }

    #[test]
    fn test_stop_invalidates_pending_timer() {
        let mut h = harness();
        h.player.play_with_pitch_shift(1200.0).unwrap();
        h.player.stop();

        assert!(h.timers.borrow().live.is_empty());
        assert!(!*h.graph_built.borrow());
        h.player.handle_event(PlayerEvent::TimerFired { id: PlaybackId(1) });
        assert!(h.player.indicator_visible());
    }

    #[test]
    fn test_unreadable_resource_leaves_player_unusable() {
        let mut h = harness_with(None, false, false);
        assert!(!h.player.is_ready());
        assert!(h.player.load_error().is_some());
        assert_eq!(h.player.play_at_rate(2.0), Err(SessionError::NoResource));
        assert_eq!(
            h.player.play_with_pitch_shift(1200.0),
            Err(SessionError::NoResource)
        );
        assert!(h.take_log().is_empty());
        h.player.stop();
    }

    #[test]
    fn test_invalid_arguments_are_rejected() {
        let mut h = harness();
        assert_eq!(h.player.play_at_rate(0.0), Err(SessionError::InvalidRate(0.0)));
        assert!(matches!(
            h.player.play_at_rate(f32::NAN),
            Err(SessionError::InvalidRate(_))
        ));
        assert!(matches!(
            h.player.play_with_pitch_shift(f32::INFINITY),
            Err(SessionError::InvalidPitch(_))
        ));
        assert_eq!(h.player.state(), PlayerState::Idle);
    }

    #[test]
    fn test_playback_failure_leaves_player_stopped() {
        let mut h = harness_with(Some(4000), true, false);
        assert!(matches!(
            h.player.play_at_rate(2.0),
            Err(SessionError::Playback(_))
        ));
        assert_eq!(h.player.state(), PlayerState::Stopped);
        assert!(!h.player.indicator_visible());
    }

    #[test]
    fn test_graph_failure_is_recoverable() {
        let mut h = harness_with(Some(4000), false, true);
        assert_eq!(
            h.player.play_with_pitch_shift(1200.0),
            Err(SessionError::GraphConstruction(GraphError::EmptyClip))
        );
        assert!(!*h.graph_built.borrow());
        assert!(h.timers.borrow().live.is_empty());
        assert_eq!(h.player.state(), PlayerState::Stopped);

        h.player.stop();
        h.player.play_at_rate(0.5).unwrap();
        assert!(h.player.indicator_visible());
    }

    #[test]
    fn test_failed_effects_restart_hides_indicator() {
        let mut h = harness_with(Some(4000), false, true);
        h.player.play_at_rate(0.5).unwrap();
        assert!(h.player.indicator_visible());

        assert!(matches!(
            h.player.play_with_pitch_shift(1200.0),
            Err(SessionError::GraphConstruction(_))
        ));
        assert_eq!(h.player.state(), PlayerState::Stopped);
        assert!(!h.player.indicator_visible());
        assert_eq!(*h.indicator.borrow(), vec![true, false]);

        h.player.handle_event(PlayerEvent::PlaybackFinished { id: PlaybackId(1) });
        assert_eq!(*h.indicator.borrow(), vec![true, false]);
    }

    #[test]
    fn test_failed_rate_restart_hides_indicator() {
        let mut h = harness_with(Some(4000), true, false);
        h.player.play_with_pitch_shift(-1000.0).unwrap();
        assert!(h.player.indicator_visible());

        assert!(matches!(
            h.player.play_at_rate(2.0),
            Err(SessionError::Playback(_))
        ));
        assert_eq!(h.player.state(), PlayerState::Stopped);
        assert!(!h.player.indicator_visible());
        assert!(h.timers.borrow().live.is_empty());
        assert_eq!(*h.indicator.borrow(), vec![true, false]);
    }
}
