//! Heads-up display state machine
//!
//! Owns the level countdown, score and flag count, and sequences the win, lose,
//! name entry and leaderboard screens. Side effects the game must perform
//! (sounds, next level, restart) are queued as [`HudEvent`]s.

use crate::audio::{AudioParams, Cue};
use crate::consts::*;
use crate::error::GameError;
use crate::highscores::{Leaderboard, Rank};
use crate::persistence::RankingStore;
use crate::platform::display::{HudDisplay, HudField};
use crate::platform::input::{Key, keys};
use crate::round_to;
use crate::sim::color::{Color, ColorCycle};
use crate::sim::level::LevelParams;

use super::sequencer::{Effect, Sequencer, SequencerEvent};

const TITLE_FONT: u32 = 100;
const BONUS_FONT: u32 = 40;
const PROMPT_FONT: u32 = 24;
const CURRENT_RANK_COLOR: u32 = 0x00ff99;
const WELCOME_DELAY_MS: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStatus {
    InProgress,
    Pause,
    YouWin,
    YouLose,
}

/// Requests from the HUD to the game
#[derive(Debug, Clone, PartialEq)]
pub enum HudEvent {
    Play(Cue, AudioParams),
    /// The player lost control; the car should fall
    TimeUp,
    /// Win screen done, move on to the next level
    LevelCompleted,
    /// Leaderboard dismissed, restart from the first level
    GameOver,
    /// Welcome screen done, start the pending level
    WelcomeDone,
    /// Suspend input until this key is released
    AwaitKey(Key),
    /// Goodbye screen done
    Exit,
}

/// Progress markers posted by HUD sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    WelcomeStart,
    WelcomeDone,
    CompletedShown,
    LevelDone,
    GameOverShown,
    RankingDismissed,
    ExitDone,
}

/// Ranking snapshot taken when the game-over screen ends
#[derive(Debug, Clone)]
struct GameOverContext {
    board: Leaderboard,
    max_score: u32,
}

/// Running countdown. The first tick is scheduled by the first update after
/// the countdown starts, so time spent before that frame is not counted.
#[derive(Debug, Clone, Copy)]
struct Countdown {
    next_tick: Option<f64>,
}

pub struct Hud {
    display: Box<dyn HudDisplay>,
    store: Box<dyn RankingStore>,
    sequencer: Sequencer<Signal>,
    status: Option<LevelStatus>,
    params: Option<LevelParams>,
    total_score: u32,
    found_flags: u32,
    remaining_time: f64,
    countdown: Option<Countdown>,
    now: f64,
    pending_bonus: u32,
    game_over: Option<GameOverContext>,
    awaiting_name: bool,
    highlight: Option<ColorCycle>,
    collisions: u32,
    events: Vec<HudEvent>,
}

impl Hud {
    pub fn new(display: Box<dyn HudDisplay>, store: Box<dyn RankingStore>) -> Self {
        Self {
            display,
            store,
            sequencer: Sequencer::new(),
            status: None,
            params: None,
            total_score: 0,
            found_flags: 0,
            remaining_time: 0.0,
            countdown: None,
            now: 0.0,
            pending_bonus: 0,
            game_over: None,
            awaiting_name: false,
            highlight: None,
            collisions: 0,
            events: Vec::new(),
        }
    }

    pub fn status(&self) -> Option<LevelStatus> {
        self.status
    }

    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    pub fn found_flags(&self) -> u32 {
        self.found_flags
    }

    pub fn remaining_time(&self) -> f64 {
        self.remaining_time
    }

    pub fn is_timer_running(&self) -> bool {
        self.countdown.is_some()
    }

    pub fn is_awaiting_name(&self) -> bool {
        self.awaiting_name
    }

    pub fn collisions(&self) -> u32 {
        self.collisions
    }

    pub fn display_mut(&mut self) -> &mut dyn HudDisplay {
        self.display.as_mut()
    }

    /// Drain queued requests
    pub fn take_events(&mut self) -> Vec<HudEvent> {
        std::mem::take(&mut self.events)
    }

    fn play(&mut self, cue: Cue) {
        self.events.push(HudEvent::Play(cue, cue.default_params()));
    }

    /// Reset counters for a new level and start the countdown
    pub fn init(&mut self, params: &LevelParams) {
        self.params = Some(params.clone());
        self.status = None;
        self.found_flags = 0;
        self.remaining_time = f64::from(params.level_time);
        self.awaiting_name = false;
        self.game_over = None;

        self.display
            .set_field(HudField::Level, &format!("level {}", params.level_name));
        self.update_score();
        self.update_flags();
        self.update_time();

        self.sequencer.start(
            vec![
                Effect::slide_in(format!("level {}", params.level_name)),
                Effect::blink(3),
                Effect::Clear,
            ],
            TITLE_FONT,
        );
        self.start_time();
    }

    /// Restart the current level
    pub fn reset(&mut self) -> Result<(), GameError> {
        let params = self.params.clone().ok_or(GameError::MissingLevelParams)?;
        self.init(&params);
        Ok(())
    }

    /// Press ENTER, then the welcome jingle
    pub fn welcome(&mut self) {
        self.sequencer.start(
            vec![
                Effect::slide_in("Press ENTER to start"),
                Effect::WaitForKey(Key::Enter),
                Effect::Clear,
                Effect::Signal(Signal::WelcomeStart),
            ],
            TITLE_FONT,
        );
    }

    /// Freeze or resume the countdown. Returns whether the level is now paused.
    pub fn pause(&mut self, paused: bool) -> bool {
        if paused && self.status == Some(LevelStatus::InProgress) {
            self.status = Some(LevelStatus::Pause);
            self.stop_time();
            self.display.clear_center();
            let id = self.sequencer.reserve_id();
            self.display.set_center_html(id, TITLE_FONT, "pause");
            let help = self.sequencer.reserve_id();
            self.display.set_center_html(help, PROMPT_FONT, &help_text());
        } else if !paused && self.status == Some(LevelStatus::Pause) {
            self.display.clear_center();
            self.start_time();
        }
        self.status == Some(LevelStatus::Pause)
    }

    /// Flash a short message in the center
    pub fn flash(&mut self, text: &str) {
        self.sequencer.start(
            vec![Effect::text(text), Effect::blink(3), Effect::Clear],
            TITLE_FONT,
        );
    }

    /// The car hit a wall
    pub fn wall_collision(&mut self, label: &str) {
        self.collisions += 1;
        log::info!("Wall {} hit ({} collisions this game)", label, self.collisions);
        self.flash("collision");
    }

    pub fn found_a_flag(&mut self) -> Result<(), GameError> {
        let params = self.params.as_ref().ok_or(GameError::MissingLevelParams)?;
        let (points, total) = (params.points_per_flag, params.no_of_flags);
        self.total_score += points;
        self.update_score();
        self.found_flags += 1;
        self.update_flags();
        log::info!("Flag found: {}/{}", self.found_flags, total);
        if self.found_flags == total {
            self.level_completed();
        }
        Ok(())
    }

    /// Win transition; runs once per level
    pub fn level_completed(&mut self) {
        self.stop_time();
        if self.status != Some(LevelStatus::InProgress) {
            return;
        }
        self.status = Some(LevelStatus::YouWin);
        self.play(Cue::LevelCompleted);

        let level_time = self.params.as_ref().map_or(0, |p| p.level_time);
        let half = f64::from(level_time / 2);
        let bonus = if self.remaining_time > half {
            ((self.remaining_time - half) / 1000.0).floor() as u32
        } else {
            0
        };
        self.total_score += bonus;
        self.pending_bonus = bonus;
        log::info!("Level completed, time bonus {}", bonus);

        self.sequencer.start(
            vec![
                Effect::slide_in("level completed!"),
                Effect::Wait(200.0),
                Effect::Signal(Signal::CompletedShown),
            ],
            TITLE_FONT,
        );
    }

    /// Lose transition; runs once per level
    pub fn game_over(&mut self) {
        self.stop_time();
        if self.status != Some(LevelStatus::InProgress) {
            return;
        }
        self.status = Some(LevelStatus::YouLose);
        log::info!("Game over, score {}", self.total_score);
        self.play(Cue::GameOver);
        self.events.push(HudEvent::TimeUp);

        self.sequencer.start(
            vec![
                Effect::ClearAll,
                Effect::slide_in(format!("GAME OVER\nscore {}", self.total_score)),
                Effect::blink(5),
                Effect::ClearAll,
                Effect::Signal(Signal::GameOverShown),
            ],
            TITLE_FONT,
        );
    }

    /// Goodbye screen, then [`HudEvent::Exit`]. No level is in play afterwards.
    pub fn exit(&mut self) {
        self.status = None;
        self.stop_time();
        self.sequencer.cancel_all();
        self.highlight = None;
        self.sequencer.start(
            vec![
                Effect::ClearAll,
                Effect::slide_in("bye"),
                Effect::Wait(500.0),
                Effect::Signal(Signal::ExitDone),
            ],
            TITLE_FONT,
        );
    }

    /// Record the qualifying run under `name`
    pub fn submit_name(&mut self, name: &str, date: &str) {
        if !self.awaiting_name {
            return;
        }
        self.awaiting_name = false;
        let Some(context) = self.game_over.take() else {
            return;
        };
        let level_name = self
            .params
            .as_ref()
            .map(|p| p.level_name.clone())
            .unwrap_or_default();
        let rank = Rank::new(name, self.total_score, &level_name, date);
        log::info!("New rank: {} with {}", rank.name, rank.score);
        if let Err(e) = self.store.add_rank(rank.clone()) {
            log::error!("Cannot save rank: {}", e);
        }
        self.display.clear_center();
        if self.total_score > context.max_score {
            self.play(Cue::HighestScore);
        }
        self.display_ranking(&context.board, Some(&rank));
    }

    /// Forward a key release to sequences waiting for it
    pub fn key_released(&mut self, key: Key) {
        self.sequencer.key_released(key);
    }

    /// Advance the countdown, the sequences and the leaderboard highlight
    pub fn update(&mut self, now: f64) {
        self.now = now;
        self.tick_countdown(now);

        let events = self.sequencer.update(now, self.display.as_mut());
        for event in events {
            match event {
                SequencerEvent::AwaitKey(key) => self.events.push(HudEvent::AwaitKey(key)),
                SequencerEvent::Signal(signal) => self.on_signal(signal),
            }
        }

        if let Some(cycle) = self.highlight.as_mut() {
            if cycle.refresh(now) {
                self.display.set_rank_highlight(cycle.color);
            }
        }
    }

    fn tick_countdown(&mut self, now: f64) {
        while let Some(countdown) = self.countdown {
            let Some(next_tick) = countdown.next_tick else {
                self.countdown = Some(Countdown {
                    next_tick: Some(now + TIMER_STEP_MS),
                });
                break;
            };
            if next_tick > now {
                break;
            }
            if self.remaining_time > 0.0 {
                self.remaining_time -= TIMER_STEP_MS;
                self.update_time();
                self.countdown = Some(Countdown {
                    next_tick: Some(next_tick + TIMER_STEP_MS),
                });
            } else {
                self.remaining_time = 0.0;
                self.stop_time();
                self.game_over();
            }
        }
    }

    fn on_signal(&mut self, signal: Signal) {
        match signal {
            Signal::WelcomeStart => {
                self.events.push(HudEvent::Play(
                    Cue::Welcome,
                    AudioParams {
                        start_in_ms: WELCOME_DELAY_MS,
                        ..Cue::Welcome.default_params()
                    },
                ));
                self.sequencer.start(
                    vec![
                        Effect::slide_in("welcome"),
                        Effect::blink(3),
                        Effect::Clear,
                        Effect::Signal(Signal::WelcomeDone),
                    ],
                    TITLE_FONT,
                );
            }
            Signal::WelcomeDone => self.events.push(HudEvent::WelcomeDone),
            Signal::CompletedShown => {
                let bonus = std::mem::take(&mut self.pending_bonus);
                let mut effects = Vec::new();
                if bonus > 0 {
                    self.play(Cue::Bonus);
                    effects.push(Effect::text(format!("time bonus {}", bonus)));
                    effects.push(Effect::blink(3));
                }
                effects.push(Effect::ClearAll);
                effects.push(Effect::Signal(Signal::LevelDone));
                self.sequencer.start(effects, BONUS_FONT);
            }
            Signal::LevelDone => {
                self.update_score();
                self.events.push(HudEvent::LevelCompleted);
            }
            Signal::GameOverShown => self.check_ranking(),
            Signal::RankingDismissed => {
                self.highlight = None;
                self.total_score = 0;
                self.collisions = 0;
                self.update_score();
                self.events.push(HudEvent::GameOver);
            }
            Signal::ExitDone => self.events.push(HudEvent::Exit),
        }
    }

    /// Ask for a name if the score makes the board, otherwise show the board
    fn check_ranking(&mut self) {
        let ranking = match self.store.ranking() {
            Ok(ranking) => ranking,
            Err(e) => {
                log::warn!("Ranking unavailable: {}", e);
                Vec::new()
            }
        };
        let board = Leaderboard::from_ranks(ranking);
        let (min_score, max_score) = board.min_max();
        log::debug!("Ranking min/max {}/{}", min_score, max_score);

        if self.total_score > min_score {
            self.play(Cue::HiScore);
            self.awaiting_name = true;
            self.game_over = Some(GameOverContext { board, max_score });
            self.display.show_name_prompt();
        } else {
            self.play(Cue::LowScore);
            self.display_ranking(&board, None);
        }
    }

    fn display_ranking(&mut self, board: &Leaderboard, current: Option<&Rank>) {
        let rows = board.rows(current);
        let id = self.sequencer.reserve_id();
        self.display.show_ranking(id, &rows);
        if rows.iter().any(|r| r.current) {
            let mut cycle = ColorCycle::new(
                Color::from_hex(CURRENT_RANK_COLOR),
                COLOR_CYCLE_MS,
                COLOR_CYCLE_HUE_STEP,
            );
            cycle.refresh(self.now);
            self.display.set_rank_highlight(cycle.color);
            self.highlight = Some(cycle);
        }
        self.sequencer.start(
            vec![
                Effect::text("press ENTER to continue"),
                Effect::blink(3),
                Effect::WaitForKey(Key::Enter),
                Effect::ClearAll,
                Effect::Signal(Signal::RankingDismissed),
            ],
            PROMPT_FONT,
        );
    }

    fn start_time(&mut self) {
        self.status = Some(LevelStatus::InProgress);
        self.countdown = Some(Countdown { next_tick: None });
    }

    fn stop_time(&mut self) {
        self.countdown = None;
    }

    fn update_time(&mut self) {
        let seconds = round_to((self.remaining_time / 1000.0) as f32, 1);
        self.display
            .set_field(HudField::Time, &format!("time {} s", seconds));
    }

    fn update_flags(&mut self) {
        let total = self.params.as_ref().map_or(0, |p| p.no_of_flags);
        self.display
            .set_field(HudField::Flags, &format!("mush {}/{}", self.found_flags, total));
    }

    fn update_score(&mut self) {
        self.display
            .set_field(HudField::Score, &format!("score {}", self.total_score));
    }
}

fn help_text() -> String {
    format!(
        "movement: &#8593 &#8595 &#8592 &#8594<br>stop camera: {}<br>pause: {}<br>",
        keys::STOP_CAMERA.code(),
        keys::PAUSE.code()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryRankingStore;
    use crate::platform::display::RecordingDisplay;

    fn params(flags: u32, time: u32) -> LevelParams {
        LevelParams {
            level_name: "1".into(),
            level_size: 30,
            level_time: time,
            no_of_walls: 0,
            no_of_flags: flags,
            points_per_flag: 10,
            car_speed: 2,
            car_steer_angle: 3,
        }
    }

    fn hud_with(store: MemoryRankingStore) -> (Hud, RecordingDisplay) {
        let display = RecordingDisplay::default();
        let hud = Hud::new(Box::new(display.clone()), Box::new(store));
        (hud, display)
    }

    /// Step the HUD clock, answering key waits with `key`
    fn run(hud: &mut Hud, from: f64, to: f64, key: Option<Key>) -> Vec<HudEvent> {
        let mut events = Vec::new();
        let mut t = from;
        while t <= to {
            hud.update(t);
            for event in hud.take_events() {
                if let (HudEvent::AwaitKey(k), Some(answer)) = (&event, key) {
                    if *k == answer {
                        hud.key_released(answer);
                    }
                }
                events.push(event);
            }
            t += 50.0;
        }
        events
    }

    fn count(events: &[HudEvent], wanted: &HudEvent) -> usize {
        events.iter().filter(|e| *e == wanted).count()
    }

    #[test]
    fn test_init_sets_fields_and_starts_countdown() {
        let (mut hud, display) = hud_with(MemoryRankingStore::default());
        hud.init(&params(2, 20_000));
        assert_eq!(hud.status(), Some(LevelStatus::InProgress));
        assert!(hud.is_timer_running());
        assert_eq!(display.field(HudField::Level).as_deref(), Some("level 1"));
        assert_eq!(display.field(HudField::Flags).as_deref(), Some("mush 0/2"));
        assert_eq!(display.field(HudField::Time).as_deref(), Some("time 20 s"));

        run(&mut hud, 0.0, 1000.0, None);
        assert_eq!(hud.remaining_time(), 19_000.0);
        assert_eq!(display.field(HudField::Time).as_deref(), Some("time 19 s"));
        assert!(display.showed("level 1"));
    }

    #[test]
    fn test_countdown_starts_on_first_update() {
        let (mut hud, _) = hud_with(MemoryRankingStore::default());
        hud.init(&params(2, 20_000));
        hud.update(5000.0);
        assert_eq!(hud.remaining_time(), 20_000.0);
        hud.update(5099.0);
        assert_eq!(hud.remaining_time(), 20_000.0);
        hud.update(5100.0);
        assert_eq!(hud.remaining_time(), 19_900.0);
    }

    #[test]
    fn test_game_over_is_idempotent() {
        let store = MemoryRankingStore::default();
        let (mut hud, _) = hud_with(store.clone());
        hud.init(&params(2, 1000));
        hud.found_a_flag().expect("params");
        assert_eq!(hud.total_score(), 10);

        let mut events = run(&mut hud, 0.0, 1500.0, None);
        assert_eq!(hud.status(), Some(LevelStatus::YouLose));
        hud.game_over();
        hud.level_completed();
        assert_eq!(hud.total_score(), 10);
        assert_eq!(hud.status(), Some(LevelStatus::YouLose));

        events.extend(hud.take_events());
        events.extend(run(&mut hud, 1550.0, 20_000.0, Some(Key::Enter)));
        hud.submit_name("ada", "today");
        events.extend(hud.take_events());
        events.extend(run(&mut hud, 20_050.0, 40_000.0, Some(Key::Enter)));

        assert_eq!(count(&events, &HudEvent::TimeUp), 1);
        assert_eq!(count(&events, &HudEvent::GameOver), 1);
        assert_eq!(count(&events, &HudEvent::LevelCompleted), 0);
        let cue = HudEvent::Play(Cue::GameOver, Cue::GameOver.default_params());
        assert_eq!(count(&events, &cue), 1);
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn test_reset_without_params() {
        let (mut hud, _) = hud_with(MemoryRankingStore::default());
        assert_eq!(hud.reset(), Err(GameError::MissingLevelParams));
        assert_eq!(hud.found_a_flag(), Err(GameError::MissingLevelParams));
    }

    #[test]
    fn test_level_completed_is_idempotent() {
        let (mut hud, _) = hud_with(MemoryRankingStore::default());
        hud.init(&params(2, 20_000));
        hud.found_a_flag().expect("params");
        hud.found_a_flag().expect("params");
        assert_eq!(hud.status(), Some(LevelStatus::YouWin));
        // 20s level, nothing elapsed: bonus is the 10s over half
        assert_eq!(hud.total_score(), 20 + 10);

        hud.level_completed();
        hud.game_over();
        assert_eq!(hud.total_score(), 30);
        assert_eq!(hud.status(), Some(LevelStatus::YouWin));

        let events = run(&mut hud, 0.0, 6000.0, None);
        assert_eq!(count(&events, &HudEvent::LevelCompleted), 1);
        assert_eq!(count(&events, &HudEvent::GameOver), 0);
        let bonus = HudEvent::Play(Cue::Bonus, Cue::Bonus.default_params());
        assert_eq!(count(&events, &bonus), 1);
    }

    #[test]
    fn test_no_bonus_past_half_time() {
        let (mut hud, _) = hud_with(MemoryRankingStore::default());
        hud.init(&params(1, 2000));
        run(&mut hud, 0.0, 1500.0, None);
        hud.found_a_flag().expect("params");
        assert_eq!(hud.total_score(), 10);
    }

    #[test]
    fn test_pause_freezes_countdown() {
        let (mut hud, display) = hud_with(MemoryRankingStore::default());
        hud.init(&params(2, 20_000));
        run(&mut hud, 0.0, 500.0, None);
        assert!(hud.pause(true));
        assert_eq!(hud.status(), Some(LevelStatus::Pause));
        assert!(display.center_texts().iter().any(|t| t == "pause"));
        let frozen = hud.remaining_time();
        run(&mut hud, 550.0, 3000.0, None);
        assert_eq!(hud.remaining_time(), frozen);

        assert!(!hud.pause(false));
        assert_eq!(hud.status(), Some(LevelStatus::InProgress));
        run(&mut hud, 3050.0, 3500.0, None);
        assert!(hud.remaining_time() < frozen);
    }

    #[test]
    fn test_timeout_low_score_leaves_board_unchanged() {
        let ranks = (1..=10).map(|i| Rank::new("p", i * 100, "1", "d")).collect();
        let store = MemoryRankingStore::with_ranks(ranks);
        let before = store.snapshot();
        let (mut hud, display) = hud_with(store.clone());
        hud.init(&params(2, 1000));

        let events = run(&mut hud, 0.0, 20_000.0, Some(Key::Enter));
        assert_eq!(count(&events, &HudEvent::TimeUp), 1);
        assert_eq!(count(&events, &HudEvent::GameOver), 1);
        let low = HudEvent::Play(Cue::LowScore, Cue::LowScore.default_params());
        assert_eq!(count(&events, &low), 1);
        assert_eq!(display.name_prompts(), 0);
        assert_eq!(store.snapshot(), before);
        assert_eq!(display.ranking().len(), RANKING_SIZE);
        assert!(display.ranking().iter().all(|r| !r.current));
    }

    #[test]
    fn test_qualifying_score_prompts_and_records() {
        let store = MemoryRankingStore::with_ranks(vec![Rank::new("old", 5, "1", "d")]);
        let (mut hud, display) = hud_with(store.clone());
        hud.init(&params(3, 20_000));
        hud.found_a_flag().expect("params");
        hud.game_over();
        let events = run(&mut hud, 0.0, 10_000.0, None);
        assert!(hud.is_awaiting_name());
        assert_eq!(display.name_prompts(), 1);
        assert_eq!(count(&events, &HudEvent::GameOver), 0);

        hud.submit_name("", "today");
        let board = store.snapshot();
        assert_eq!(board.ranking[0].name, "unknown");
        assert_eq!(board.ranking[0].score, 10);
        let highest = HudEvent::Play(Cue::HighestScore, Cue::HighestScore.default_params());
        assert_eq!(count(&hud.take_events(), &highest), 1);
        let current: Vec<_> = display.ranking().into_iter().filter(|r| r.current).collect();
        assert_eq!(current.len(), 1);

        let events = run(&mut hud, 10_050.0, 20_000.0, Some(Key::Enter));
        assert!(display.highlights() > 1);
        assert_eq!(count(&events, &HudEvent::GameOver), 1);
        assert_eq!(hud.total_score(), 0);
    }

    #[test]
    fn test_storage_failure_continues_with_empty_board() {
        let store = MemoryRankingStore::default();
        store.set_failing(true);
        let (mut hud, display) = hud_with(store);
        hud.init(&params(2, 20_000));
        hud.found_a_flag().expect("params");
        hud.game_over();
        run(&mut hud, 0.0, 10_000.0, None);
        assert!(hud.is_awaiting_name());
        hud.submit_name("ada", "today");
        assert_eq!(display.ranking().len(), 1);
    }

    #[test]
    fn test_welcome_waits_for_enter() {
        let (mut hud, _) = hud_with(MemoryRankingStore::default());
        hud.welcome();
        let events = run(&mut hud, 0.0, 5000.0, None);
        assert!(events.contains(&HudEvent::AwaitKey(Key::Enter)));
        assert!(!events.contains(&HudEvent::WelcomeDone));

        hud.key_released(Key::Enter);
        let events = run(&mut hud, 5050.0, 10_000.0, None);
        assert_eq!(count(&events, &HudEvent::WelcomeDone), 1);
        assert!(events.iter().any(|e| matches!(e, HudEvent::Play(Cue::Welcome, p) if p.start_in_ms == 200.0)));
    }
}
