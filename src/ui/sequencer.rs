//! Cooperative text effect sequencer
//!
//! A sequence is a list of effects played in order on its own center element.
//! Effects that take time (slide-in, blink, wait) advance on a virtual clock fed
//! by [`Sequencer::update`], so several sequences can run side by side without
//! timers. A sequence suspended on a key resumes when [`Sequencer::key_released`]
//! reports that key.

use std::collections::VecDeque;

use crate::platform::display::{CenterId, HudDisplay};
use crate::platform::input::Key;

/// Default slide-in delay per character
pub const SLIDE_IN_DELAY_MS: f64 = 100.0;
/// Default blink half period
pub const BLINK_DELAY_MS: f64 = 250.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect<S> {
    /// Append text at once
    Text(String),
    /// Replace the element content
    Html(String),
    /// Reveal text one character per `delay_ms`
    SlideIn { text: String, delay_ms: f64 },
    /// Hide and show the element `times` times
    Blink { times: u32, delay_ms: f64 },
    Wait(f64),
    WaitForKey(Key),
    /// Remove this sequence's element
    Clear,
    /// Empty the whole center area
    ClearAll,
    /// Report progress to the owner
    Signal(S),
}

impl<S> Effect<S> {
    pub fn text(text: impl Into<String>) -> Self {
        Effect::Text(text.into())
    }

    pub fn slide_in(text: impl Into<String>) -> Self {
        Effect::SlideIn {
            text: text.into(),
            delay_ms: SLIDE_IN_DELAY_MS,
        }
    }

    pub fn blink(times: u32) -> Self {
        Effect::Blink {
            times,
            delay_ms: BLINK_DELAY_MS,
        }
    }
}

/// Output of an update
#[derive(Debug, Clone, PartialEq)]
pub enum SequencerEvent<S> {
    /// A sequence is suspended until this key is released
    AwaitKey(Key),
    Signal(S),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyWait {
    Idle,
    Requested,
    Released,
}

#[derive(Debug)]
struct Sequence<S> {
    id: CenterId,
    font_size: u32,
    effects: VecDeque<Effect<S>>,
    /// Virtual time at which the current step began
    cursor: f64,
    /// Steps done within the current effect
    progress: u32,
    key: KeyWait,
}

impl<S> Sequence<S> {
    fn next_effect(&mut self) {
        self.effects.pop_front();
        self.progress = 0;
        self.key = KeyWait::Idle;
    }
}

#[derive(Debug)]
pub struct Sequencer<S> {
    sequences: Vec<Sequence<S>>,
    next_id: u32,
    now: f64,
}

impl<S> Default for Sequencer<S> {
    fn default() -> Self {
        Self {
            sequences: Vec::new(),
            next_id: 1,
            now: 0.0,
        }
    }
}

impl<S: Clone> Sequencer<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh center element id, for content managed outside a sequence
    pub fn reserve_id(&mut self) -> CenterId {
        let id = CenterId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Queue a sequence; it starts at the current clock
    pub fn start(&mut self, effects: Vec<Effect<S>>, font_size: u32) -> CenterId {
        let id = self.reserve_id();
        self.sequences.push(Sequence {
            id,
            font_size,
            effects: effects.into(),
            cursor: self.now,
            progress: 0,
            key: KeyWait::Idle,
        });
        id
    }

    /// Drop every pending effect
    pub fn cancel_all(&mut self) {
        self.sequences.clear();
    }

    pub fn is_idle(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Resume sequences waiting for `key`
    pub fn key_released(&mut self, key: Key) {
        for seq in &mut self.sequences {
            if seq.key == KeyWait::Requested
                && matches!(seq.effects.front(), Some(Effect::WaitForKey(k)) if *k == key)
            {
                seq.key = KeyWait::Released;
            }
        }
    }

    /// Advance every sequence to `now`
    pub fn update(&mut self, now: f64, display: &mut dyn HudDisplay) -> Vec<SequencerEvent<S>> {
        self.now = now;
        let mut events = Vec::new();
        for seq in &mut self.sequences {
            Self::advance(seq, now, display, &mut events);
        }
        self.sequences.retain(|seq| !seq.effects.is_empty());
        events
    }

    fn advance(
        seq: &mut Sequence<S>,
        now: f64,
        display: &mut dyn HudDisplay,
        events: &mut Vec<SequencerEvent<S>>,
    ) {
        while let Some(effect) = seq.effects.front() {
            match effect {
                Effect::Text(text) => {
                    display.append_center_text(seq.id, seq.font_size, text);
                }
                Effect::Html(html) => {
                    display.set_center_html(seq.id, seq.font_size, html);
                }
                Effect::SlideIn { text, delay_ms } => {
                    let chars: Vec<char> = text.chars().collect();
                    while (seq.progress as usize) < chars.len() && seq.cursor + delay_ms <= now {
                        seq.cursor += delay_ms;
                        let c = chars[seq.progress as usize];
                        display.append_center_text(seq.id, seq.font_size, &c.to_string());
                        seq.progress += 1;
                    }
                    if (seq.progress as usize) < chars.len() {
                        return;
                    }
                }
                Effect::Blink { times, delay_ms } => {
                    let toggles = times * 2;
                    while seq.progress < toggles && seq.cursor + delay_ms <= now {
                        seq.cursor += delay_ms;
                        seq.progress += 1;
                        let remaining = toggles - seq.progress;
                        display.set_center_visible(seq.id, remaining % 2 == 0);
                    }
                    if seq.progress < toggles {
                        return;
                    }
                }
                Effect::Wait(ms) => {
                    if seq.cursor + ms > now {
                        return;
                    }
                    seq.cursor += ms;
                }
                Effect::WaitForKey(key) => match seq.key {
                    KeyWait::Idle => {
                        events.push(SequencerEvent::AwaitKey(*key));
                        seq.key = KeyWait::Requested;
                        return;
                    }
                    KeyWait::Requested => return,
                    KeyWait::Released => seq.cursor = now,
                },
                Effect::Clear => display.remove_center(seq.id),
                Effect::ClearAll => display.clear_center(),
                Effect::Signal(signal) => events.push(SequencerEvent::Signal(signal.clone())),
            }
            seq.next_effect();
        }
    }
}
