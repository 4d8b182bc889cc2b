//! Platform abstraction layer
//!
//! Seams between the game core and the browser:
//! - Input events and key bindings
//! - Scene graph nodes
//! - HUD display primitives

pub mod display;
pub mod input;
pub mod scene;
