//! HUD display seam: text and element primitives the HUD drives
//!
//! The HUD never touches the DOM. It calls these primitives with content and the
//! sequencer decides the timing.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::sim::color::Color;

/// Fixed HUD corner readouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HudField {
    /// Top left, large
    Level,
    /// Top left
    Score,
    /// Top right, large
    Flags,
    /// Top right
    Time,
}

impl HudField {
    pub const ALL: [HudField; 4] = [HudField::Level, HudField::Score, HudField::Flags, HudField::Time];

    /// DOM anchor id
    pub fn element_id(&self) -> &'static str {
        match self {
            HudField::Level => "level",
            HudField::Score => "totalPoint",
            HudField::Flags => "flag-counter",
            HudField::Time => "time",
        }
    }
}

/// A transient element inside the center area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CenterId(pub u32);

impl CenterId {
    pub fn element_id(&self) -> String {
        format!("tmp-{}", self.0)
    }
}

/// One leaderboard table row
#[derive(Debug, Clone, PartialEq)]
pub struct RankRow {
    pub position: usize,
    pub name: String,
    pub level_name: String,
    pub score: u32,
    /// The row inserted by the run that just ended
    pub current: bool,
}

pub trait HudDisplay {
    fn set_field(&mut self, field: HudField, text: &str);

    /// Append text to a center element, creating it when missing
    fn append_center_text(&mut self, id: CenterId, font_size: u32, text: &str);
    /// Replace the content of a center element, creating it when missing
    fn set_center_html(&mut self, id: CenterId, font_size: u32, html: &str);
    fn set_center_visible(&mut self, id: CenterId, visible: bool);
    fn remove_center(&mut self, id: CenterId);
    /// Empty the whole center area
    fn clear_center(&mut self);

    /// Name input; the entered name comes back through `Game::submit_name`
    fn show_name_prompt(&mut self);
    fn show_ranking(&mut self, id: CenterId, rows: &[RankRow]);
    fn set_rank_highlight(&mut self, color: Color);

    fn set_controls_visible(&mut self, visible: bool);
    fn set_control(&mut self, name: &str, value: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub struct CenterElement {
    pub text: String,
    pub font_size: u32,
    pub visible: bool,
}

#[derive(Debug, Default)]
struct DisplayState {
    fields: HashMap<HudField, String>,
    center: BTreeMap<CenterId, CenterElement>,
    /// Every text ever shown in the center, in order
    history: Vec<String>,
    name_prompts: usize,
    ranking: Vec<RankRow>,
    highlights: Vec<Color>,
    controls_visible: bool,
    controls: BTreeMap<String, String>,
}

/// In-memory display for tests and the headless build. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    inner: Rc<RefCell<DisplayState>>,
}

impl RecordingDisplay {
    pub fn field(&self, field: HudField) -> Option<String> {
        self.inner.borrow().fields.get(&field).cloned()
    }

    /// Current center texts, oldest element first
    pub fn center_texts(&self) -> Vec<String> {
        self.inner
            .borrow()
            .center
            .values()
            .map(|el| el.text.clone())
            .collect()
    }

    pub fn center_element(&self, id: CenterId) -> Option<CenterElement> {
        self.inner.borrow().center.get(&id).cloned()
    }

    /// Whether `text` was ever fully shown in the center
    pub fn showed(&self, text: &str) -> bool {
        self.inner.borrow().history.iter().any(|t| t.contains(text))
    }

    pub fn name_prompts(&self) -> usize {
        self.inner.borrow().name_prompts
    }

    pub fn ranking(&self) -> Vec<RankRow> {
        self.inner.borrow().ranking.clone()
    }

    pub fn highlights(&self) -> usize {
        self.inner.borrow().highlights.len()
    }

    pub fn controls_visible(&self) -> bool {
        self.inner.borrow().controls_visible
    }

    pub fn control(&self, name: &str) -> Option<String> {
        self.inner.borrow().controls.get(name).cloned()
    }
}

impl HudDisplay for RecordingDisplay {
    fn set_field(&mut self, field: HudField, text: &str) {
        self.inner.borrow_mut().fields.insert(field, text.to_string());
    }

    fn append_center_text(&mut self, id: CenterId, font_size: u32, text: &str) {
        let mut state = self.inner.borrow_mut();
        let el = state.center.entry(id).or_insert_with(|| CenterElement {
            text: String::new(),
            font_size,
            visible: true,
        });
        el.text.push_str(text);
        el.font_size = font_size;
        let snapshot = el.text.clone();
        state.history.push(snapshot);
    }

    fn set_center_html(&mut self, id: CenterId, font_size: u32, html: &str) {
        let mut state = self.inner.borrow_mut();
        state.center.insert(
            id,
            CenterElement {
                text: html.to_string(),
                font_size,
                visible: true,
            },
        );
        state.history.push(html.to_string());
    }

    fn set_center_visible(&mut self, id: CenterId, visible: bool) {
        if let Some(el) = self.inner.borrow_mut().center.get_mut(&id) {
            el.visible = visible;
        }
    }

    fn remove_center(&mut self, id: CenterId) {
        self.inner.borrow_mut().center.remove(&id);
    }

    fn clear_center(&mut self) {
        self.inner.borrow_mut().center.clear();
    }

    fn show_name_prompt(&mut self) {
        self.inner.borrow_mut().name_prompts += 1;
    }

    fn show_ranking(&mut self, id: CenterId, rows: &[RankRow]) {
        let mut state = self.inner.borrow_mut();
        state.ranking = rows.to_vec();
        state.center.insert(
            id,
            CenterElement {
                text: format!("ranking ({} rows)", rows.len()),
                font_size: 40,
                visible: true,
            },
        );
    }

    fn set_rank_highlight(&mut self, color: Color) {
        self.inner.borrow_mut().highlights.push(color);
    }

    fn set_controls_visible(&mut self, visible: bool) {
        self.inner.borrow_mut().controls_visible = visible;
    }

    fn set_control(&mut self, name: &str, value: &str) {
        self.inner
            .borrow_mut()
            .controls
            .insert(name.to_string(), value.to_string());
    }
}
