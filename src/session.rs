//! Match lifecycle
//!
//! [`GameSession`] owns everything one visit needs: simulation state, the seeded
//! rng, the frame stepper, difficulty provider, lifetime stats, settings, the
//! music sequencer and the commentator. The host drives it with input calls and
//! one [`GameSession::frame`] per animation frame; everything outbound goes
//! through [`Host`].
//!
//! Phases run Idle -> Armed -> Running -> Ended. A manual reset jumps straight
//! to Running from anywhere. Delayed side effects (navigation, return to idle)
//! sit in a timer queue and fire from `frame`, so a given sequence of
//! timestamps always produces the same outcome.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::audio::{AudioSink, Sequencer, Sfx};
use crate::clamp_paddle_y;
use crate::commentary::{Comment, CommentKind, Commentator};
use crate::consts::*;
use crate::platform::{Host, RenderFrame, Storage};
use crate::settings::Settings;
use crate::sim::{BallEvents, FixedStepper, Side, SimulationState, TickInput, tick};
use crate::stats::{MatchResult, Outcome, TennisStats};
use crate::telemetry::{RestoreReason, TelemetryEvent};
use crate::tuning::DifficultyProvider;

/// Where the match lifecycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Idle stance, waiting for the pointer
    Idle,
    /// Pointer is over the court, the next real move serves
    Armed,
    Running,
    /// Final score is showing until the delayed follow-up fires
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DelayedAction {
    Navigate(RestoreReason),
    ReturnToIdle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Timer {
    due_ms: f64,
    action: DelayedAction,
}

/// Pointer tracking for arming and paddle velocity
#[derive(Debug, Clone, Copy, Default)]
struct PointerTrack {
    /// Pointer y when the current arming began
    anchor: Option<f32>,
    /// Paddle top requested by the pointer
    target: Option<f32>,
    /// Last paddle top and when it was seen
    last: Option<(f32, f64)>,
    /// Paddle velocity estimate (px/s)
    velocity: f32,
}

pub struct GameSession<S: Storage> {
    storage: S,
    settings: Settings,
    state: SimulationState,
    rng: Pcg32,
    stepper: FixedStepper,
    difficulty: DifficultyProvider,
    stats: TennisStats,
    sequencer: Sequencer,
    commentator: Commentator,
    phase: MatchPhase,
    timers: Vec<Timer>,
    /// One navigation per match
    navigation_scheduled: bool,
    scored_once: bool,
    match_number: u32,
    match_start_ms: Option<f64>,
    now_ms: f64,
    pointer: PointerTrack,
    last_input_ms: Option<f64>,
    last_result: Option<MatchResult>,
}

impl<S: Storage> GameSession<S> {
    pub fn new(storage: S, settings: Settings) -> Self {
        let seed = settings.seed.unwrap_or_else(rand::random);
        let stats = TennisStats::load(&storage);

        log::info!("CONTROL ROOM · ONLINE");
        log::info!(
            "Session seed {} · policy {} · target {}",
            seed,
            settings.difficulty_policy.as_str(),
            settings.target_score
        );
        if stats.best_rally > 0 {
            log::info!("Best rally: {}", stats.best_rally);
        }

        Self {
            difficulty: DifficultyProvider::new(settings.difficulty_policy),
            sequencer: Sequencer::new(settings.music_tempo),
            commentator: Commentator::new(seed ^ 0x9E37_79B9_7F4A_7C15, settings.idle_hint_ms),
            rng: Pcg32::seed_from_u64(seed),
            state: SimulationState::default(),
            stepper: FixedStepper::new(),
            phase: MatchPhase::Idle,
            timers: Vec::new(),
            navigation_scheduled: false,
            scored_once: false,
            match_number: stats.matches + 1,
            match_start_ms: None,
            now_ms: 0.0,
            pointer: PointerTrack::default(),
            last_input_ms: None,
            last_result: None,
            stats,
            settings,
            storage,
        }
    }

    /// Secondary store for the level counter (session storage on web)
    pub fn with_fallback_storage(mut self, fallback: Box<dyn Storage>) -> Self {
        self.difficulty = DifficultyProvider::new(self.settings.difficulty_policy).with_fallback(fallback);
        self
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn stats(&self) -> &TennisStats {
        &self.stats
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn match_number(&self) -> u32 {
        self.match_number
    }

    /// Result of the most recently finished match
    pub fn last_result(&self) -> Option<&MatchResult> {
        self.last_result.as_ref()
    }

    pub fn sound_enabled(&self) -> bool {
        self.settings.sound_enabled
    }

    // === Input ===

    /// Pointer entered the court or a touch began
    pub fn arm(&mut self, now_ms: f64, host: &mut dyn Host) {
        self.note_input(now_ms);
        if self.phase != MatchPhase::Idle {
            return;
        }
        self.phase = MatchPhase::Armed;
        self.pointer.anchor = None;
        log::info!("SERVE · armed (move to start)");
        host.telemetry(&TelemetryEvent::Armed);
    }

    /// Pointer moved to court-relative `y`
    pub fn pointer_move(&mut self, y: f32, now_ms: f64, host: &mut dyn Host) {
        if self.phase == MatchPhase::Idle {
            self.arm(now_ms, host);
        }
        self.note_input(now_ms);

        let top = clamp_paddle_y(y - PADDLE_HEIGHT / 2.0, self.state.height);
        self.pointer.velocity = match self.pointer.last {
            Some((last_top, last_ms)) if now_ms > last_ms => {
                (top - last_top) / ((now_ms - last_ms) / 1000.0) as f32
            }
            _ => 0.0,
        };
        self.pointer.last = Some((top, now_ms));
        self.pointer.target = Some(top);

        if self.phase != MatchPhase::Running {
            self.state.set_player_y(top);
        }

        if self.phase == MatchPhase::Armed {
            let anchor = *self.pointer.anchor.get_or_insert(y);
            if (y - anchor).abs() >= START_MOVE_THRESHOLD && !self.navigation_pending() {
                self.start_match(now_ms, false, host);
            }
        }
    }

    /// Court was resized
    pub fn resize(&mut self, width: f32, height: f32) {
        self.state
            .resize(width, height, self.phase == MatchPhase::Running);
        if let Some(target) = self.pointer.target {
            self.pointer.target = Some(clamp_paddle_y(target, height));
        }
    }

    /// Restart the match from any phase
    pub fn manual_reset(&mut self, now_ms: f64, host: &mut dyn Host) {
        self.note_input(now_ms);
        self.start_match(now_ms, true, host);
    }

    /// Flip sound on or off. `audio_now` is the audio clock (seconds).
    pub fn toggle_sound(&mut self, audio_now: f64, host: &mut dyn Host) {
        self.settings.sound_enabled = !self.settings.sound_enabled;
        let enabled = self.settings.sound_enabled;

        if enabled {
            self.sequencer.start(audio_now);
            host.play(Sfx::Toggle);
            log::info!("SOUND · enabled");
        } else {
            self.sequencer.stop();
            log::warn!("SOUND · disabled");
        }

        self.settings.save(&mut self.storage);
        host.telemetry(&TelemetryEvent::SoundToggle { enabled });
    }

    /// Queue upcoming music on the host's audio clock
    pub fn schedule_music(&mut self, audio_now: f64, sink: &mut dyn AudioSink) -> usize {
        self.sequencer
            .schedule(audio_now, self.settings.sound_enabled, sink)
    }

    /// Restart the music for a player who left sound on last visit.
    /// Needs the audio clock, so the host calls it after the first gesture.
    pub fn resume_music(&mut self, audio_now: f64) -> bool {
        self.settings.sound_enabled && self.sequencer.start(audio_now)
    }

    // === Frame ===

    /// Advance to `now_ms`: fire due timers, run ticks, offer idle hints, render
    pub fn frame(&mut self, now_ms: f64, host: &mut dyn Host) {
        self.now_ms = now_ms;
        self.fire_timers(now_ms, host);

        if let Some((_, last_ms)) = self.pointer.last
            && now_ms - last_ms > POINTER_STILL_MS
        {
            self.pointer.velocity = 0.0;
        }

        if self.phase == MatchPhase::Running {
            let ticks = self.stepper.advance(now_ms);
            for _ in 0..ticks {
                let input = TickInput {
                    player_y: self.pointer.target,
                    player_vel: self.pointer.velocity,
                };
                let events = tick(&mut self.state, &input, &mut self.rng, self.stepper.dt());
                self.handle_events(events, now_ms, host);
                if self.phase != MatchPhase::Running {
                    break;
                }
            }
        }

        if matches!(self.phase, MatchPhase::Idle | MatchPhase::Armed) {
            let last_input = *self.last_input_ms.get_or_insert(now_ms);
            if let Some(hint) = self.commentator.idle_check(last_input, now_ms) {
                host.telemetry(&TelemetryEvent::IdleHint {
                    idle_ms: now_ms - last_input,
                });
                self.comment(host, hint);
            }
        }

        host.render(&self.render_frame());
    }

    /// Snapshot for the render sink
    pub fn render_frame(&self) -> RenderFrame {
        let elapsed_secs = match (self.phase, self.match_start_ms) {
            (MatchPhase::Running, Some(start)) => ((self.now_ms - start).max(0.0) / 1000.0) as f32,
            _ => 0.0,
        };
        RenderFrame {
            player: self.state.player.pos,
            opponent: self.state.opponent.pos,
            ball: self.state.ball.pos,
            score_you: self.state.score_you,
            score_opponent: self.state.score_opponent,
            match_number: self.match_number,
            elapsed_secs,
            best_rally: self.stats.best_rally.max(self.state.best_rally_this_match),
            wins: self.stats.wins,
            losses: self.stats.losses,
            difficulty: self.state.tuning.label,
        }
    }

    // === Lifecycle ===

    fn start_match(&mut self, now_ms: f64, manual: bool, host: &mut dyn Host) {
        self.timers.clear();
        self.navigation_scheduled = false;
        self.scored_once = false;

        let tuning = self
            .difficulty
            .seed_difficulty(&self.stats, &mut self.storage);
        self.state.reset_match(tuning);
        self.state.place_paddles_on_sides();

        self.match_number = self.stats.matches + 1;
        self.match_start_ms = Some(now_ms);
        self.now_ms = now_ms;
        self.phase = MatchPhase::Running;
        self.stepper.reset();
        self.pointer.velocity = 0.0;
        self.pointer.last = None;

        self.state.serve(Side::Opponent, &mut self.rng);

        log::info!("CONTROL ROOM TENNIS · online · match {}", self.match_number);
        log::info!(
            "DIFFICULTY · {} · level {} · factor {:.2}",
            tuning.label,
            tuning.level,
            tuning.factor
        );
        if manual {
            log::warn!("RESET · manual restart");
            self.cue(host, Sfx::Reset);
        }

        host.telemetry(&TelemetryEvent::MatchStart {
            match_number: self.match_number,
            difficulty: tuning.label,
            level: tuning.level,
            wins: self.stats.wins,
            losses: self.stats.losses,
            best_rally: self.stats.best_rally,
        });
        if let Some(line) = self.commentator.say(CommentKind::MatchStart, now_ms) {
            self.comment(host, line);
        }

        self.stats.save(&mut self.storage);
    }

    fn handle_events(&mut self, events: BallEvents, now_ms: f64, host: &mut dyn Host) {
        if let Some(who) = events.returned_by {
            let rally = self.state.rally;
            log::info!("RETURN · {} · rally {}", side_label(who), rally);
            self.cue(host, Sfx::Hit);
            host.telemetry(&TelemetryEvent::Return { who, rally });
            if let Some(line) = self.commentator.rally(rally, now_ms) {
                self.comment(host, line);
            }
        }

        if let Some(winner) = events.point_to {
            self.point_scored(winner, now_ms, host);
        }
    }

    fn point_scored(&mut self, winner: Side, now_ms: f64, host: &mut dyn Host) {
        self.stats.record_point();
        self.state.credit_point(winner);
        let rally = self.state.rally;

        log::info!("POINT · {} · rally {}", side_label(winner), rally);
        self.cue(host, Sfx::Point);
        host.telemetry(&TelemetryEvent::Point {
            winner,
            you: self.state.score_you,
            opponent: self.state.score_opponent,
            rally,
        });

        let kind = match winner {
            Side::Player => CommentKind::PlayerPoint,
            Side::Opponent => CommentKind::OpponentPoint,
        };
        if let Some(line) = self.commentator.say(kind, now_ms) {
            self.comment(host, line);
        }

        if winner == Side::Player && !self.scored_once {
            self.scored_once = true;
            self.schedule_navigation(
                now_ms + FIRST_POINT_ROUTE_DELAY_MS,
                RestoreReason::ScoredOnce,
            );
        }

        // Serve toward the side that conceded
        self.state.serve(winner.other(), &mut self.rng);

        if self.stats.offer_best_rally(self.state.best_rally_this_match) {
            log::info!("ANALYTICS · new best rally: {}", self.stats.best_rally);
            host.telemetry(&TelemetryEvent::RallyRecord {
                best_rally: self.stats.best_rally,
            });
        }
        self.stats.save(&mut self.storage);

        let target = self.settings.target_score;
        if self.state.score_you >= target || self.state.score_opponent >= target {
            self.end_match(now_ms, host);
        }
    }

    fn end_match(&mut self, now_ms: f64, host: &mut dyn Host) {
        self.phase = MatchPhase::Ended;
        self.stepper.reset();

        let elapsed_ms = self
            .match_start_ms
            .map_or(0.0, |start| (now_ms - start).max(0.0));
        let outcome = if self.state.score_you > self.state.score_opponent {
            Outcome::Win
        } else {
            Outcome::Loss
        };
        let result = MatchResult {
            outcome,
            score_you: self.state.score_you,
            score_opponent: self.state.score_opponent,
            elapsed_ms,
            best_rally_this_match: self.state.best_rally_this_match,
        };
        let broken = self.stats.record_match(&result);

        match outcome {
            Outcome::Win => log::info!(
                "MATCH END · YOU WIN · {}-{} · time {:.2}s",
                result.score_you,
                result.score_opponent,
                elapsed_ms / 1000.0
            ),
            Outcome::Loss => log::warn!(
                "MATCH END · OPPONENT WINS · {}-{} · time {:.2}s",
                result.score_you,
                result.score_opponent,
                elapsed_ms / 1000.0
            ),
        }
        if broken.fastest_win {
            log::info!("ANALYTICS · fastest win: {:.2}s", elapsed_ms / 1000.0);
        }
        self.cue(host, Sfx::Win);

        host.telemetry(&TelemetryEvent::MatchEnd {
            outcome,
            score_you: result.score_you,
            score_opponent: result.score_opponent,
            elapsed_ms,
        });

        let kind = match outcome {
            Outcome::Win => CommentKind::Win,
            Outcome::Loss => CommentKind::Loss,
        };
        if let Some(line) = self.commentator.say(kind, now_ms) {
            self.comment(host, line);
        }
        if let Some(insight) = self.commentator.insight(&self.stats, now_ms) {
            host.telemetry(&TelemetryEvent::Insight {
                matches: self.stats.matches,
                win_rate: self.stats.win_rate(),
            });
            self.comment(host, insight);
        }

        self.stats.save(&mut self.storage);
        self.last_result = Some(result);

        // Idle follows whether or not a navigation goes out first, so a host
        // that stays on the page is never left in Ended
        let due_ms = now_ms + MATCH_END_DELAY_MS;
        self.schedule_navigation(due_ms, RestoreReason::MatchEnd);
        self.timers.push(Timer {
            due_ms,
            action: DelayedAction::ReturnToIdle,
        });
    }

    /// A navigation is queued and has not fired yet
    fn navigation_pending(&self) -> bool {
        self.timers
            .iter()
            .any(|t| matches!(t.action, DelayedAction::Navigate(_)))
    }

    /// Queue the one navigation a match may request
    fn schedule_navigation(&mut self, due_ms: f64, reason: RestoreReason) {
        if self.navigation_scheduled || self.settings.return_route.is_none() {
            return;
        }
        self.navigation_scheduled = true;
        self.timers.push(Timer {
            due_ms,
            action: DelayedAction::Navigate(reason),
        });
    }

    fn fire_timers(&mut self, now_ms: f64, host: &mut dyn Host) {
        if self.timers.is_empty() {
            return;
        }
        let (mut due, pending): (Vec<Timer>, Vec<Timer>) =
            self.timers.drain(..).partition(|t| t.due_ms <= now_ms);
        self.timers = pending;
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));

        for timer in due {
            match timer.action {
                DelayedAction::Navigate(reason) => {
                    let Some(to) = self.settings.return_route.clone() else {
                        continue;
                    };
                    log::info!("ROUTE · RESTORE · {}", to);
                    host.telemetry(&TelemetryEvent::RouteRestore {
                        reason,
                        to: to.clone(),
                    });
                    host.navigate(&to);
                }
                DelayedAction::ReturnToIdle => {
                    if self.phase == MatchPhase::Ended {
                        self.phase = MatchPhase::Idle;
                        self.state.set_idle_positions();
                        self.pointer.anchor = None;
                        self.last_input_ms = Some(now_ms);
                        log::info!("Back to idle");
                    }
                }
            }
        }
    }

    // === Helpers ===

    fn note_input(&mut self, now_ms: f64) {
        self.last_input_ms = Some(now_ms);
        self.commentator.note_input();
    }

    fn cue(&self, host: &mut dyn Host, sfx: Sfx) {
        if self.settings.sound_enabled {
            host.play(sfx);
        }
    }

    fn comment(&self, host: &mut dyn Host, comment: Comment) {
        log::debug!("CHAT · {}", comment.line);
        host.comment(&comment);
    }
}

fn side_label(side: Side) -> &'static str {
    match side {
        Side::Player => "YOU",
        Side::Opponent => "OPPONENT",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioEvent;
    use crate::persistence::LEVEL_COUNTER_KEY;
    use crate::platform::MemoryStorage;
    use glam::Vec2;
    use proptest::prelude::*;

    #[derive(Default)]
    struct RecordingHost {
        frames: Vec<RenderFrame>,
        events: Vec<TelemetryEvent>,
        navigations: Vec<String>,
        sounds: Vec<Sfx>,
        comments: Vec<Comment>,
    }

    impl Host for RecordingHost {
        fn render(&mut self, frame: &RenderFrame) {
            self.frames.push(frame.clone());
        }

        fn telemetry(&mut self, event: &TelemetryEvent) {
            self.events.push(event.clone());
        }

        fn navigate(&mut self, to: &str) {
            self.navigations.push(to.to_string());
        }

        fn play(&mut self, sfx: Sfx) {
            self.sounds.push(sfx);
        }

        fn comment(&mut self, comment: &Comment) {
            self.comments.push(comment.clone());
        }
    }

    impl RecordingHost {
        fn count(&self, name: &str) -> usize {
            self.events.iter().filter(|e| e.name() == name).count()
        }
    }

    fn settings() -> Settings {
        Settings {
            seed: Some(12345),
            ..Settings::default()
        }
    }

    fn session_with(settings: Settings) -> GameSession<MemoryStorage> {
        GameSession::new(MemoryStorage::new(), settings)
    }

    /// Start a match at `now` and burn the first (tickless) frame
    fn started(session: &mut GameSession<MemoryStorage>, host: &mut RecordingHost, now: f64) {
        session.manual_reset(now, host);
        session.frame(now, host);
    }

    /// Put the ball just short of the right edge so the next tick scores for the player
    fn ball_leaving_right(session: &mut GameSession<MemoryStorage>) {
        let w = session.state.width;
        session.state.ball.pos = Vec2::new(w + 38.0, 200.0);
        session.state.ball.vel = Vec2::new(400.0, 0.0);
    }

    fn ball_leaving_left(session: &mut GameSession<MemoryStorage>) {
        session.state.ball.pos = Vec2::new(-38.0, 200.0);
        session.state.ball.vel = Vec2::new(-400.0, 0.0);
    }

    #[test]
    fn test_idle_until_armed_and_moved() {
        let mut session = session_with(settings());
        let mut host = RecordingHost::default();
        assert_eq!(session.phase(), MatchPhase::Idle);

        session.arm(0.0, &mut host);
        assert_eq!(session.phase(), MatchPhase::Armed);
        assert_eq!(host.count("tennis_armed"), 1);

        session.pointer_move(200.0, 10.0, &mut host);
        session.pointer_move(201.0, 20.0, &mut host);
        assert_eq!(session.phase(), MatchPhase::Armed);

        session.pointer_move(202.5, 30.0, &mut host);
        assert_eq!(session.phase(), MatchPhase::Running);
        assert_eq!(host.count("tennis_match_start"), 1);
        assert!(session.state().ball.vel.x > 0.0);
    }

    #[test]
    fn test_pointer_move_arms_from_idle() {
        let mut session = session_with(settings());
        let mut host = RecordingHost::default();
        session.pointer_move(150.0, 0.0, &mut host);
        assert_eq!(session.phase(), MatchPhase::Armed);
        assert_eq!(
            session.state().player.pos.y,
            clamp_paddle_y(150.0 - PADDLE_HEIGHT / 2.0, 420.0)
        );
    }

    #[test]
    fn test_winning_point_ends_match() {
        let mut session = session_with(settings());
        let mut host = RecordingHost::default();
        started(&mut session, &mut host, 1000.0);

        session.state.score_you = 4;
        session.state.score_opponent = 3;
        ball_leaving_right(&mut session);
        session.frame(1010.0, &mut host);

        assert_eq!(session.phase(), MatchPhase::Ended);
        assert_eq!((session.state().score_you, session.state().score_opponent), (5, 3));
        let result = session.last_result().unwrap();
        assert_eq!(result.outcome, Outcome::Win);
        assert_eq!(session.stats().wins, 1);
        assert_eq!(session.stats().matches, 1);
        assert_eq!(host.count("tennis_match_end"), 1);

        // Ended matches no longer tick
        let ball = session.state().ball;
        session.frame(1100.0, &mut host);
        assert_eq!(session.state().ball, ball);
    }

    #[test]
    fn test_point_short_of_target_continues() {
        let mut session = session_with(settings());
        let mut host = RecordingHost::default();
        started(&mut session, &mut host, 0.0);

        session.state.score_you = 3;
        session.state.score_opponent = 3;
        session.state.rally = 7;
        ball_leaving_right(&mut session);
        session.frame(10.0, &mut host);

        assert_eq!(session.phase(), MatchPhase::Running);
        assert_eq!(session.state().score_you, 4);
        assert_eq!(session.state().rally, 0);
        // Serve goes toward the side that conceded
        assert!(session.state().ball.vel.x > 0.0);
        assert_eq!(session.stats().lifetime_points, 1);
    }

    #[test]
    fn test_loss_serves_toward_player() {
        let mut session = session_with(settings());
        let mut host = RecordingHost::default();
        started(&mut session, &mut host, 0.0);

        ball_leaving_left(&mut session);
        session.frame(10.0, &mut host);
        assert_eq!(session.state().score_opponent, 1);
        assert!(session.state().ball.vel.x < 0.0);
    }

    #[test]
    fn test_stats_persisted_after_point_and_end() {
        let mut session = session_with(settings());
        let mut host = RecordingHost::default();
        started(&mut session, &mut host, 0.0);

        ball_leaving_left(&mut session);
        session.frame(10.0, &mut host);
        let saved = TennisStats::load(session.storage());
        assert_eq!(saved.lifetime_points, 1);
        assert_eq!(saved.matches, 0);

        session.state.score_opponent = 4;
        ball_leaving_left(&mut session);
        session.frame(20.0, &mut host);
        let saved = TennisStats::load(session.storage());
        assert_eq!(saved.matches, 1);
        assert_eq!(saved.losses, 1);
        assert_eq!(saved.lifetime_points, 2);
    }

    #[test]
    fn test_best_rally_only_increases() {
        let mut session = session_with(settings());
        let mut host = RecordingHost::default();
        started(&mut session, &mut host, 0.0);
        session.stats.best_rally = 10;

        session.state.best_rally_this_match = 3;
        ball_leaving_left(&mut session);
        session.frame(10.0, &mut host);
        assert_eq!(session.stats().best_rally, 10);
        assert_eq!(host.count("tennis_rally_record"), 0);

        session.state.best_rally_this_match = 12;
        ball_leaving_left(&mut session);
        session.frame(20.0, &mut host);
        assert_eq!(session.stats().best_rally, 12);
        assert_eq!(host.count("tennis_rally_record"), 1);

        // A new match starts its own count, the record stays
        session.manual_reset(30.0, &mut host);
        assert_eq!(session.state().best_rally_this_match, 0);
        assert_eq!(session.stats().best_rally, 12);
        assert_eq!(session.render_frame().best_rally, 12);
    }

    #[test]
    fn test_first_point_navigation_fires_once() {
        let mut session = session_with(Settings {
            return_route: Some("/lobby".to_string()),
            ..settings()
        });
        let mut host = RecordingHost::default();
        started(&mut session, &mut host, 1000.0);

        ball_leaving_right(&mut session);
        session.frame(1010.0, &mut host);
        assert_eq!(session.state().score_you, 1);

        session.frame(1600.0, &mut host);
        assert!(host.navigations.is_empty());
        session.frame(1700.0, &mut host);
        assert_eq!(host.navigations, vec!["/lobby".to_string()]);
        assert!(host.events.contains(&TelemetryEvent::RouteRestore {
            reason: RestoreReason::ScoredOnce,
            to: "/lobby".to_string(),
        }));

        // Further points and the match end do not navigate again
        session.state.score_you = 4;
        ball_leaving_right(&mut session);
        session.frame(1710.0, &mut host);
        assert_eq!(session.phase(), MatchPhase::Ended);
        session.frame(4000.0, &mut host);
        assert_eq!(host.navigations.len(), 1);
        assert_eq!(session.phase(), MatchPhase::Idle);
    }

    #[test]
    fn test_spent_navigation_still_returns_to_idle() {
        let mut session = session_with(Settings {
            return_route: Some("/lobby".to_string()),
            ..settings()
        });
        let mut host = RecordingHost::default();
        started(&mut session, &mut host, 1000.0);

        ball_leaving_right(&mut session);
        session.frame(1010.0, &mut host);
        session.frame(1700.0, &mut host);
        assert_eq!(host.navigations.len(), 1);

        // The host stayed on the page; the opponent takes the match
        session.state.score_opponent = 4;
        ball_leaving_left(&mut session);
        session.frame(1710.0, &mut host);
        assert_eq!(session.phase(), MatchPhase::Ended);

        session.frame(1710.0 + MATCH_END_DELAY_MS - 1.0, &mut host);
        assert_eq!(session.phase(), MatchPhase::Ended);
        session.frame(1710.0 + MATCH_END_DELAY_MS, &mut host);
        assert_eq!(session.phase(), MatchPhase::Idle);
        assert_eq!(host.navigations.len(), 1);

        // And a fresh match can be started by pointer again
        session.arm(3000.0, &mut host);
        session.pointer_move(200.0, 3010.0, &mut host);
        session.pointer_move(205.0, 3020.0, &mut host);
        assert_eq!(session.phase(), MatchPhase::Running);
    }

    #[test]
    fn test_match_end_navigation_after_delay() {
        let mut session = session_with(Settings {
            return_route: Some("/".to_string()),
            ..settings()
        });
        let mut host = RecordingHost::default();
        started(&mut session, &mut host, 0.0);

        session.state.score_opponent = 4;
        ball_leaving_left(&mut session);
        session.frame(10.0, &mut host);
        assert_eq!(session.phase(), MatchPhase::Ended);

        session.frame(1200.0, &mut host);
        assert!(host.navigations.is_empty());
        session.frame(1210.0, &mut host);
        assert_eq!(host.navigations.len(), 1);
        assert!(host.events.contains(&TelemetryEvent::RouteRestore {
            reason: RestoreReason::MatchEnd,
            to: "/".to_string(),
        }));

        // The navigation goes out before the session settles back to idle
        assert_eq!(session.phase(), MatchPhase::Idle);
        assert_eq!(host.navigations.len(), 1);
    }

    #[test]
    fn test_pending_navigation_blocks_pointer_start() {
        let mut session = session_with(Settings {
            return_route: Some("/".to_string()),
            ..settings()
        });
        let mut host = RecordingHost::default();
        session.arm(0.0, &mut host);
        session.navigation_scheduled = true;
        session.timers.push(Timer {
            due_ms: 500.0,
            action: DelayedAction::Navigate(RestoreReason::ScoredOnce),
        });

        session.pointer_move(100.0, 10.0, &mut host);
        session.pointer_move(150.0, 20.0, &mut host);
        assert_eq!(session.phase(), MatchPhase::Armed);

        // Once it has fired, a page that stayed put can play again
        session.frame(500.0, &mut host);
        assert_eq!(host.navigations.len(), 1);
        session.pointer_move(200.0, 510.0, &mut host);
        assert_eq!(session.phase(), MatchPhase::Running);
    }

    #[test]
    fn test_returns_to_idle_without_route() {
        let mut session = session_with(settings());
        let mut host = RecordingHost::default();
        started(&mut session, &mut host, 0.0);

        session.state.score_you = 4;
        ball_leaving_right(&mut session);
        session.frame(10.0, &mut host);
        assert_eq!(session.phase(), MatchPhase::Ended);

        session.frame(1000.0, &mut host);
        assert_eq!(session.phase(), MatchPhase::Ended);
        session.frame(1300.0, &mut host);
        assert_eq!(session.phase(), MatchPhase::Idle);
        assert_eq!(session.state().ball.vel, Vec2::ZERO);
        assert!(host.navigations.is_empty());

        // The next match can start from the pointer again
        session.pointer_move(200.0, 1400.0, &mut host);
        session.pointer_move(210.0, 1410.0, &mut host);
        assert_eq!(session.phase(), MatchPhase::Running);
        assert_eq!(session.match_number(), 2);
    }

    #[test]
    fn test_manual_reset_from_any_phase() {
        let mut session = session_with(Settings {
            return_route: Some("/".to_string()),
            ..settings()
        });
        let mut host = RecordingHost::default();

        session.manual_reset(0.0, &mut host);
        assert_eq!(session.phase(), MatchPhase::Running);

        session.state.score_opponent = 4;
        ball_leaving_left(&mut session);
        session.frame(0.0, &mut host);
        session.frame(10.0, &mut host);
        assert_eq!(session.phase(), MatchPhase::Ended);

        // Reset clears the pending navigation and its guard
        session.manual_reset(100.0, &mut host);
        assert_eq!(session.phase(), MatchPhase::Running);
        assert_eq!((session.state().score_you, session.state().score_opponent), (0, 0));
        session.frame(5000.0, &mut host);
        assert!(host.navigations.is_empty());
    }

    #[test]
    fn test_level_seeded_once_per_session() {
        let mut session = session_with(settings());
        let mut host = RecordingHost::default();

        session.manual_reset(0.0, &mut host);
        assert_eq!(session.state().tuning.level, 1);
        assert_eq!(session.state().tuning.label, "Rookie");
        assert_eq!(
            session.storage().get_item(LEVEL_COUNTER_KEY).as_deref(),
            Some("1")
        );

        session.manual_reset(10.0, &mut host);
        session.manual_reset(20.0, &mut host);
        assert_eq!(
            session.storage().get_item(LEVEL_COUNTER_KEY).as_deref(),
            Some("1")
        );
        assert_eq!(host.count("tennis_match_start"), 3);
    }

    #[test]
    fn test_next_session_advances_level() {
        let mut storage = MemoryStorage::new();
        storage.set_item(LEVEL_COUNTER_KEY, "3");
        let mut session = GameSession::new(storage, settings());
        session.manual_reset(0.0, &mut ());
        assert_eq!(session.state().tuning.level, 4);
    }

    #[test]
    fn test_resume_music_only_when_enabled() {
        let mut music: Vec<AudioEvent> = Vec::new();
        let mut quiet = session_with(settings());
        assert!(!quiet.resume_music(0.5));
        assert_eq!(quiet.schedule_music(0.5, &mut music), 0);

        let mut loud = session_with(Settings {
            sound_enabled: true,
            ..settings()
        });
        assert!(loud.resume_music(0.5));
        // Already running
        assert!(!loud.resume_music(0.6));
        assert!(loud.schedule_music(0.5, &mut music) > 0);
    }

    #[test]
    fn test_sound_gates_cues_and_music() {
        let mut session = session_with(settings());
        let mut host = RecordingHost::default();
        let mut music: Vec<AudioEvent> = Vec::new();

        session.manual_reset(0.0, &mut host);
        assert!(host.sounds.is_empty());
        assert_eq!(session.schedule_music(0.0, &mut music), 0);

        session.toggle_sound(1.0, &mut host);
        assert!(session.sound_enabled());
        assert_eq!(host.sounds, vec![Sfx::Toggle]);
        assert!(session.schedule_music(1.0, &mut music) > 0);
        assert!(host.events.contains(&TelemetryEvent::SoundToggle { enabled: true }));
        // The choice is persisted
        assert!(Settings::load(session.storage()).sound_enabled);

        session.manual_reset(10.0, &mut host);
        assert_eq!(host.sounds.last(), Some(&Sfx::Reset));

        session.toggle_sound(2.0, &mut host);
        let queued = music.len();
        assert_eq!(session.schedule_music(2.0, &mut music), 0);
        assert_eq!(music.len(), queued);
    }

    #[test]
    fn test_player_velocity_decays_when_still() {
        let mut session = session_with(settings());
        let mut host = RecordingHost::default();
        started(&mut session, &mut host, 0.0);

        session.pointer_move(200.0, 100.0, &mut host);
        session.pointer_move(220.0, 110.0, &mut host);
        assert!((session.pointer.velocity - 2000.0).abs() < 1e-2);

        session.frame(150.0, &mut host);
        assert!(session.pointer.velocity > 0.0);
        session.frame(200.0, &mut host);
        assert_eq!(session.pointer.velocity, 0.0);
    }

    #[test]
    fn test_idle_hint_after_quiet_stretch() {
        let mut session = session_with(settings());
        let mut host = RecordingHost::default();

        session.frame(0.0, &mut host);
        session.frame(5000.0, &mut host);
        assert_eq!(host.count("tennis_idle_hint"), 0);
        session.frame(6100.0, &mut host);
        assert_eq!(host.count("tennis_idle_hint"), 1);
        assert_eq!(host.comments.last().unwrap().kind, CommentKind::IdleHint);
        session.frame(9000.0, &mut host);
        assert_eq!(host.count("tennis_idle_hint"), 1);
    }

    #[test]
    fn test_render_frame_fields() {
        let mut session = session_with(settings());
        let mut host = RecordingHost::default();
        session.frame(0.0, &mut host);
        let idle = host.frames.last().unwrap().clone();
        assert_eq!(idle.match_label(), "01");
        assert_eq!(idle.timer_label(), "0.00s");
        assert_eq!(idle.record_label(), "0W · 0L");

        started(&mut session, &mut host, 1000.0);
        session.frame(2500.0, &mut host);
        let running = host.frames.last().unwrap();
        assert_eq!(running.timer_label(), "1.50s");
        assert_eq!(running.difficulty, "Rookie");
    }

    #[test]
    fn test_same_seed_same_match() {
        let run = || {
            let mut session = session_with(settings());
            let mut host = RecordingHost::default();
            started(&mut session, &mut host, 0.0);
            let mut now = 0.0;
            for i in 0..600 {
                now += 16.0;
                session.pointer_move(120.0 + (i % 50) as f32 * 4.0, now, &mut host);
                session.frame(now, &mut host);
            }
            (session.state().ball, session.state().score_you, session.state().score_opponent)
        };
        assert_eq!(run(), run());
    }

    proptest! {
        #[test]
        fn prop_paddles_stay_in_bounds(
            seed in any::<u64>(),
            moves in proptest::collection::vec((-200.0f32..700.0, 1.0f64..40.0), 1..120),
        ) {
            let mut session = session_with(Settings { seed: Some(seed), ..Settings::default() });
            let mut host = ();
            session.manual_reset(0.0, &mut host);
            let mut now = 0.0;
            for (y, gap) in moves {
                now += gap;
                session.pointer_move(y, now, &mut host);
                session.frame(now, &mut host);

                let max = 420.0 - PADDLE_HEIGHT - PADDLE_MARGIN;
                for paddle in [session.state().player, session.state().opponent] {
                    prop_assert!(paddle.pos.y >= PADDLE_MARGIN && paddle.pos.y <= max);
                }
                prop_assert!(session.state().score_you <= 5 && session.state().score_opponent <= 5);
                prop_assert!(session.state().ball.speed() <= session.state().tuning.max_ball_speed * 1.0001);
            }
        }
    }
}
