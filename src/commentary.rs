//! Personality commentary
//!
//! Picks short lines from per-kind banks with a seeded generator, never repeating
//! the previous line of a kind back to back, and keeps routine chatter spaced
//! out. Also schedules the typewriter reveal for the docked message panel.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::stats::TennisStats;

/// Routine lines closer together than this are dropped (ms)
pub const MIN_SPACING_MS: f64 = 1800.0;
/// A rally line is offered every this many returns
pub const RALLY_MILESTONE: u32 = 6;
/// Insight needs this many finished matches
pub const INSIGHT_MIN_MATCHES: u32 = 3;

/// Typewriter delay per character: base plus up to jitter (ms)
pub const TYPE_BASE_MS: f64 = 22.0;
pub const TYPE_JITTER_MS: f64 = 28.0;
/// Pause between typewriter segments (ms)
pub const SEGMENT_PAUSE_MS: f64 = 360.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentKind {
    MatchStart,
    PlayerPoint,
    OpponentPoint,
    RallyMilestone,
    Win,
    Loss,
    IdleHint,
    Insight,
}

impl CommentKind {
    const COUNT: usize = 8;

    fn slot(self) -> usize {
        self as usize
    }

    /// Lifecycle lines always go out, the rest honor the spacing
    fn is_routine(self) -> bool {
        matches!(
            self,
            CommentKind::PlayerPoint | CommentKind::OpponentPoint | CommentKind::RallyMilestone
        )
    }

    fn bank(self) -> &'static [&'static str] {
        match self {
            CommentKind::MatchStart => &[
                "Okay. Deep breath. Now move.",
                "Systems green. Serve incoming.",
                "Control room online. Keep up.",
            ],
            CommentKind::PlayerPoint => &[
                "That one got past me. Logged.",
                "Fine. Recalibrating.",
                "Lucky angle. Probably.",
            ],
            CommentKind::OpponentPoint => &[
                "That swing was a rumor.",
                "Score update: you got nervous.",
                "Point to the house.",
            ],
            CommentKind::RallyMilestone => &[
                "Now we're talking.",
                "Long rally. My fans are spinning.",
                "Keep it alive.",
            ],
            CommentKind::Win => &[
                "Match to you. I will remember this.",
                "You win this one. Rematch pending.",
            ],
            CommentKind::Loss => &[
                "Match to the control room.",
                "Better luck next boot.",
            ],
            CommentKind::IdleHint => &[
                "If you're tired, blink quick. Then move.",
                "Hover the court to arm a serve.",
                "Still there? Move to start.",
            ],
            CommentKind::Insight => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub kind: CommentKind,
    pub line: String,
    /// Session time the line was produced (ms)
    pub at_ms: f64,
}

#[derive(Debug, Clone)]
pub struct Commentator {
    rng: Pcg32,
    last_pick: [Option<usize>; CommentKind::COUNT],
    last_routine_ms: Option<f64>,
    idle_hint_ms: f64,
    idle_hinted: bool,
}

impl Commentator {
    pub fn new(seed: u64, idle_hint_ms: f64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            last_pick: [None; CommentKind::COUNT],
            last_routine_ms: None,
            idle_hint_ms,
            idle_hinted: false,
        }
    }

    /// Pick a line of `kind`, or None when spacing suppresses it
    pub fn say(&mut self, kind: CommentKind, now_ms: f64) -> Option<Comment> {
        if kind.is_routine() {
            if let Some(last) = self.last_routine_ms
                && now_ms - last < MIN_SPACING_MS
            {
                return None;
            }
            self.last_routine_ms = Some(now_ms);
        }

        let line = self.pick(kind)?;
        Some(Comment {
            kind,
            line: line.to_string(),
            at_ms: now_ms,
        })
    }

    fn pick(&mut self, kind: CommentKind) -> Option<&'static str> {
        let bank = kind.bank();
        if bank.is_empty() {
            return None;
        }

        let last = self.last_pick[kind.slot()];
        let mut index = self.rng.random_range(0..bank.len());
        if bank.len() > 1 && Some(index) == last {
            index = (index + 1 + self.rng.random_range(0..bank.len() - 1)) % bank.len();
        }
        self.last_pick[kind.slot()] = Some(index);
        Some(bank[index])
    }

    /// Line for a rally that just reached a milestone
    pub fn rally(&mut self, rally: u32, now_ms: f64) -> Option<Comment> {
        if rally == 0 || rally % RALLY_MILESTONE != 0 {
            return None;
        }
        self.say(CommentKind::RallyMilestone, now_ms)
    }

    /// Input arrived, allow another idle hint later
    pub fn note_input(&mut self) {
        self.idle_hinted = false;
    }

    /// One hint per quiet stretch once the player has been idle long enough
    pub fn idle_check(&mut self, last_input_ms: f64, now_ms: f64) -> Option<Comment> {
        if self.idle_hinted || now_ms - last_input_ms < self.idle_hint_ms {
            return None;
        }
        self.idle_hinted = true;
        self.say(CommentKind::IdleHint, now_ms)
    }

    /// Post-match read of the lifetime record
    pub fn insight(&self, stats: &TennisStats, now_ms: f64) -> Option<Comment> {
        if stats.matches < INSIGHT_MIN_MATCHES {
            return None;
        }
        let pct = (stats.win_rate() * 100.0).round() as u32;
        let line = match stats.win_rate() {
            r if r >= 0.62 => format!("{}% win rate. I am raising the stakes.", pct),
            r if r >= 0.4 => format!("{}% win rate. Evenly matched, for now.", pct),
            _ => format!("{}% win rate. Watch the ball, not the paddle.", pct),
        };
        Some(Comment {
            kind: CommentKind::Insight,
            line,
            at_ms: now_ms,
        })
    }
}

/// One typewriter update: show the first `chars` characters of `segment`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeFrame {
    pub at_ms: f64,
    pub segment: usize,
    pub chars: usize,
}

/// Reveal schedule for `segments`, relative to the start of typing
///
/// Each segment goes from empty to full one character at a time, then pauses
/// before the next segment starts.
pub fn typewriter_schedule<R: Rng + ?Sized>(segments: &[&str], rng: &mut R) -> Vec<TypeFrame> {
    let mut frames = Vec::new();
    let mut t = 0.0;

    for (segment, text) in segments.iter().enumerate() {
        let len = text.chars().count();
        for chars in 0..=len {
            frames.push(TypeFrame {
                at_ms: t,
                segment,
                chars,
            });
            if chars < len {
                t += TYPE_BASE_MS + rng.random::<f64>() * TYPE_JITTER_MS;
            }
        }
        t += SEGMENT_PAUSE_MS;
    }
    frames
}

/// Prefix of `text` holding `chars` characters
pub fn reveal(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
