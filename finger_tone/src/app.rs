//! Top-level application state.
//!
//! `AppState` owns the [`Pipeline`], the landmark source (once it has
//! finished loading), and the audio sink (once detection has first been
//! started).  [`run`] drives it from the window at a fixed frame rate.

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::Instant;

use finger_count::{
    segments, FailureKind, FrameOutput, HandObservation, Pipeline, TrailSegment, TrailTracker,
};

use crate::config::{AppConfig, AudioKind, SourceKind};
use crate::error::AppError;
use crate::scheduler::FrameScheduler;
use crate::source::{
    spawn_initializer, InitOutcome, LandmarkSource, ReplayLandmarkSource, SimInput,
    SimLandmarkSource,
};
use crate::synth::{open_sink, AudioSink};
use crate::visualizer::{Scene, UiCommand, Visualizer};

const STATUS_LOADING: &str = "Loading hand model...";
const STATUS_READY:   &str = "Ready. Press SPACE to start detection.";
const STATUS_LIVE:    &str = "Detecting. Press SPACE to stop.";
const STATUS_STOPPED: &str = "Stopped. Press SPACE to start again.";

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    pipeline: Pipeline,

    // ── input ────────────────────────────────────────────────────────────
    source:    Option<Box<dyn LandmarkSource>>,
    init_rx:   Option<Receiver<InitOutcome>>,
    max_hands: usize,

    // ── output ───────────────────────────────────────────────────────────
    audio:        Option<Box<dyn AudioSink>>,
    audio_kind:   AudioKind,
    midi_program: u8,

    // ── last frame, for rendering ────────────────────────────────────────
    hands:    Vec<HandObservation>,
    segments: Vec<TrailSegment>,

    pub status: String,
}

impl AppState {
    /// Starts loading `source` in the background; the app sits in
    /// `LoadingModel` until it reports.
    pub fn new(cfg: &AppConfig, source: Box<dyn LandmarkSource>) -> Self {
        AppState {
            pipeline:     Pipeline::new(TrailTracker::with_window(cfg.trail_window_ms)),
            source:       None,
            init_rx:      Some(spawn_initializer(source)),
            max_hands:    cfg.max_hands,
            audio:        None,
            audio_kind:   cfg.audio,
            midi_program: cfg.midi_program,
            hands:        Vec::new(),
            segments:     Vec::new(),
            status:       STATUS_LOADING.to_string(),
        }
    }

    /// Use `sink` instead of opening the configured backend on first start.
    pub fn with_sink(mut self, sink: Box<dyn AudioSink>) -> Self {
        self.audio = Some(sink);
        self
    }

    fn poll_init(&mut self) {
        let Some(rx) = self.init_rx.as_ref() else { return };
        let outcome = match rx.try_recv() {
            Ok(outcome)                     => outcome,
            Err(TryRecvError::Empty)        => return,
            Err(TryRecvError::Disconnected) => {
                self.init_rx = None;
                self.fail(FailureKind::ModelLoad, "initializer exited without reporting");
                return;
            }
        };
        self.init_rx = None;
        match outcome {
            Ok(source) => {
                self.source = Some(source);
                self.pipeline.model_loaded();
                self.status = STATUS_READY.to_string();
            }
            Err(e) => {
                let kind = e.failure_kind().unwrap_or(FailureKind::ModelLoad);
                self.fail(kind, &e.to_string());
            }
        }
    }

    fn fail(&mut self, kind: FailureKind, detail: &str) {
        self.pipeline.fail(kind, detail);
        self.source = None;
        self.hands.clear();
        self.segments.clear();
        self.status = kind.user_message().to_string();
    }

    // ── per-frame ────────────────────────────────────────────────────────

    /// One frame: pick up the loaded source, pull landmarks, run the
    /// pipeline, and hand any tone to the audio sink.
    pub fn tick(&mut self, now_ms: u64) {
        self.poll_init();

        // Sources are polled every frame so their input queues stay drained.
        let mut raw = match self.source.as_mut().map(|s| s.detect(now_ms)) {
            None          => Vec::new(),
            Some(Ok(raw)) => raw,
            Some(Err(e))  => match e.failure_kind() {
                Some(kind) => {
                    self.fail(kind, &e.to_string());
                    Vec::new()
                }
                None => {
                    tracing::warn!(error = %e, "frame dropped");
                    self.tick_audio(now_ms);
                    return;
                }
            },
        };
        raw.truncate(self.max_hands);

        match self.pipeline.process_frame(&raw, now_ms) {
            FrameOutput::Idle => {
                self.hands.clear();
                self.segments.clear();
            }
            // Keep drawing the last good frame.
            FrameOutput::Skipped(_) => {}
            FrameOutput::Detected { hands, sound, .. } => {
                self.hands    = hands;
                self.segments = segments(self.pipeline.trails());
                if let (Some(event), Some(audio)) = (sound, self.audio.as_mut()) {
                    audio.play(&event);
                }
            }
        }
        self.tick_audio(now_ms);
    }

    fn tick_audio(&mut self, now_ms: u64) {
        if let Some(audio) = self.audio.as_mut() {
            audio.tick(now_ms);
        }
    }

    /// Space bar.  Ignored while loading or after a failure.  The first
    /// start opens the audio sink; starting plays nothing by itself.
    pub fn toggle(&mut self) {
        match self.pipeline.toggle() {
            Some(true) => {
                if self.audio.is_none() {
                    self.audio = Some(open_sink(self.audio_kind, self.midi_program));
                }
                self.status = STATUS_LIVE.to_string();
            }
            Some(false) => {
                self.hands.clear();
                self.segments.clear();
                self.status = STATUS_STOPPED.to_string();
            }
            None => tracing::debug!(mode = %self.pipeline.mode(), "toggle ignored"),
        }
    }

    pub fn scene(&self, now_ms: u64) -> Scene<'_> {
        Scene {
            mode:     self.pipeline.mode(),
            result:   self.pipeline.current(),
            hands:    &self.hands,
            segments: &self.segments,
            sound_on: self.pipeline.is_sound_indicator_on(now_ms),
            status:   &self.status,
        }
    }

    pub fn pipeline(&self) -> &Pipeline { &self.pipeline }
    pub fn hands(&self) -> &[HandObservation] { &self.hands }

    /// Name of the opened audio sink, if one has been opened yet.
    pub fn audio_name(&self) -> Option<&'static str> {
        self.audio.as_ref().map(|a| a.name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Entry point
// ════════════════════════════════════════════════════════════════════════════

/// Build the configured landmark source.  The sender is returned for the
/// simulated source so the window can steer it.
pub fn build_source(
    cfg: &AppConfig,
) -> Result<(Box<dyn LandmarkSource>, Option<Sender<SimInput>>), AppError> {
    match cfg.source {
        SourceKind::Sim => {
            let (tx, rx) = mpsc::channel();
            Ok((Box::new(SimLandmarkSource::new(rx)), Some(tx)))
        }
        SourceKind::Replay => {
            let path: PathBuf = cfg.replay_path.clone().ok_or(AppError::MissingReplayPath)?;
            Ok((Box::new(ReplayLandmarkSource::new(path)), None))
        }
    }
}

pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    cfg.validate()?;
    let (source, sim_tx) = build_source(&cfg)?;

    let mut vis = Visualizer::new(&cfg, sim_tx)?;
    let mut app = AppState::new(&cfg, source);

    let clock     = Instant::now();
    let scheduler = FrameScheduler::new(cfg.frame_rate);

    let frames = scheduler.run(|_| {
        if !vis.is_open() {
            return ControlFlow::Break(());
        }
        let now_ms = clock.elapsed().as_millis() as u64;
        for cmd in vis.poll_input() {
            match cmd {
                UiCommand::Quit            => return ControlFlow::Break(()),
                UiCommand::ToggleDetection => app.toggle(),
            }
        }
        app.tick(now_ms);
        vis.render(&app.scene(now_ms));
        ControlFlow::Continue(())
    });

    tracing::info!(frames, "window closed");
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceError;
    use finger_count::{Landmark, Mode, SoundEvent};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    fn quiet_cfg() -> AppConfig {
        AppConfig { audio: AudioKind::None, ..AppConfig::default() }
    }

    fn sim_app(cfg: &AppConfig) -> (Sender<SimInput>, AppState) {
        let (tx, rx) = mpsc::channel();
        (tx, AppState::new(cfg, Box::new(SimLandmarkSource::new(rx))))
    }

    /// Tick until the initializer has reported.
    fn wait_ready(app: &mut AppState) {
        for i in 0..1000 {
            app.tick(i);
            if app.pipeline().mode() != &Mode::LoadingModel { return; }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("initializer never reported");
    }

    /// Blocks in `initialize` until released.
    struct GatedSource {
        gate: Receiver<()>,
    }

    impl LandmarkSource for GatedSource {
        fn acquire_camera(&mut self) -> Result<(), SourceError> { Ok(()) }
        fn initialize(&mut self) -> Result<(), SourceError> {
            self.gate.recv().map_err(|e| SourceError::ModelLoad(e.to_string()))
        }
        fn detect(&mut self, _: u64) -> Result<Vec<Vec<Landmark>>, SourceError> { Ok(Vec::new()) }
    }

    struct NoCamera;

    impl LandmarkSource for NoCamera {
        fn acquire_camera(&mut self) -> Result<(), SourceError> {
            Err(SourceError::CameraAccess("permission denied".to_string()))
        }
        fn initialize(&mut self) -> Result<(), SourceError> { Ok(()) }
        fn detect(&mut self, _: u64) -> Result<Vec<Vec<Landmark>>, SourceError> { Ok(Vec::new()) }
    }

    /// Every frame is a transient failure.
    struct Flaky;

    impl LandmarkSource for Flaky {
        fn acquire_camera(&mut self) -> Result<(), SourceError> { Ok(()) }
        fn initialize(&mut self) -> Result<(), SourceError> { Ok(()) }
        fn detect(&mut self, _: u64) -> Result<Vec<Vec<Landmark>>, SourceError> {
            Err(SourceError::Frame("decoder hiccup".to_string()))
        }
    }

    /// Keeps every event it is asked to play.
    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<SoundEvent>>>);

    impl Recorder {
        fn played(&self) -> Vec<SoundEvent> { self.0.lock().unwrap().clone() }
    }

    impl AudioSink for Recorder {
        fn play(&mut self, event: &SoundEvent) { self.0.lock().unwrap().push(*event); }
        fn name(&self) -> &'static str { "recorder" }
    }

    #[test]
    fn loads_into_ready_without_audio() {
        let (_tx, mut app) = sim_app(&quiet_cfg());
        wait_ready(&mut app);
        assert_eq!(app.pipeline().mode(), &Mode::Idle);
        assert_eq!(app.status, STATUS_READY);
        assert!(app.hands().is_empty());
        assert_eq!(app.audio_name(), None);
    }

    #[test]
    fn toggle_ignored_while_loading() {
        let (gate_tx, gate_rx) = mpsc::channel();
        let mut app = AppState::new(&quiet_cfg(), Box::new(GatedSource { gate: gate_rx }));
        app.toggle();
        app.tick(0);
        assert_eq!(app.pipeline().mode(), &Mode::LoadingModel);
        assert_eq!(app.audio_name(), None);

        gate_tx.send(()).unwrap();
        wait_ready(&mut app);
        assert_eq!(app.pipeline().mode(), &Mode::Idle);
    }

    #[test]
    fn start_opens_audio_once_and_counts() {
        let (tx, mut app) = sim_app(&quiet_cfg());
        wait_ready(&mut app);

        app.toggle();
        assert!(app.pipeline().mode().is_detecting());
        assert_eq!(app.audio_name(), Some("none"));

        app.tick(1_016);
        assert_eq!(app.pipeline().current().unwrap().finger_count, 5);
        assert_eq!(app.hands().len(), 1);
        assert!(app.scene(1_016).sound_on);

        tx.send(SimInput::Pose { hand: 0, count: 3 }).unwrap();
        app.tick(1_033);
        assert_eq!(app.pipeline().current().unwrap().finger_count, 3);
        assert!(!app.scene(1_033).segments.is_empty());

        app.toggle();
        app.toggle();
        assert_eq!(app.audio_name(), Some("none"));
    }

    #[test]
    fn starting_is_silent_until_a_count_arrives() {
        let rec = Recorder::default();
        let (_tx, app) = sim_app(&quiet_cfg());
        let mut app = app.with_sink(Box::new(rec.clone()));
        wait_ready(&mut app);

        app.toggle();
        assert!(app.pipeline().mode().is_detecting());
        assert_eq!(app.audio_name(), Some("recorder"));
        assert!(rec.played().is_empty());

        app.tick(2_016);
        let played = rec.played();
        assert_eq!(played.len(), 1);
        assert_eq!(played[0], SoundEvent::for_count(5, 2_016));

        app.tick(2_033);
        app.toggle();
        app.toggle();
        assert_eq!(rec.played().len(), 1);
    }

    #[test]
    fn stop_clears_render_state() {
        let (_tx, mut app) = sim_app(&quiet_cfg());
        wait_ready(&mut app);
        app.toggle();
        app.tick(16);
        app.tick(33);
        app.toggle();
        assert_eq!(app.pipeline().mode(), &Mode::Idle);
        assert!(app.hands().is_empty());
        assert!(app.scene(50).segments.is_empty());
        assert!(app.scene(50).result.is_none());

        app.tick(66);
        assert!(app.pipeline().current().is_none());
    }

    #[test]
    fn extra_hands_are_dropped() {
        let cfg = AppConfig { max_hands: 1, ..quiet_cfg() };
        let (tx, mut app) = sim_app(&cfg);
        wait_ready(&mut app);
        tx.send(SimInput::ToggleSecondHand).unwrap();
        app.toggle();
        app.tick(16);
        assert_eq!(app.hands().len(), 1);
        assert_eq!(app.pipeline().current().unwrap().finger_count, 5);
    }

    #[test]
    fn two_hands_add_up() {
        let (tx, mut app) = sim_app(&quiet_cfg());
        wait_ready(&mut app);
        tx.send(SimInput::ToggleSecondHand).unwrap();
        tx.send(SimInput::Pose { hand: 0, count: 3 }).unwrap();
        tx.send(SimInput::Pose { hand: 1, count: 3 }).unwrap();
        app.toggle();
        app.tick(16);
        assert_eq!(app.pipeline().current().unwrap().finger_count, 6);
        assert_eq!(app.pipeline().trails().len(), 2);
    }

    #[test]
    fn camera_failure_is_terminal() {
        let mut app = AppState::new(&quiet_cfg(), Box::new(NoCamera));
        wait_ready(&mut app);
        assert!(matches!(
            app.pipeline().mode(),
            Mode::Error { kind: FailureKind::CameraAccess, .. }
        ));
        assert_eq!(app.status, FailureKind::CameraAccess.user_message());
        app.toggle();
        assert!(app.pipeline().mode().is_error());
    }

    #[test]
    fn transient_frame_errors_keep_detecting() {
        let mut app = AppState::new(&quiet_cfg(), Box::new(Flaky));
        wait_ready(&mut app);
        app.toggle();
        for t in 1..10 { app.tick(t * 16); }
        assert!(app.pipeline().mode().is_detecting());
        assert!(app.pipeline().current().is_none());
    }

    #[test]
    fn replay_needs_a_path() {
        let cfg = AppConfig { source: SourceKind::Replay, ..quiet_cfg() };
        assert!(matches!(build_source(&cfg), Err(AppError::MissingReplayPath)));
        let (_, tx) = build_source(&quiet_cfg()).ok().unwrap();
        assert!(tx.is_some());
    }
}
