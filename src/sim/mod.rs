//! Simulation module
//!
//! All gameplay logic lives here, free of DOM and renderer dependencies:
//! - Seeded RNG only, so a seed reproduces the same levels
//! - Time comes in through `refresh(time)`, never from a clock
//! - The outside world is reached through the `platform` seams

pub mod buffer;
pub mod camera;
pub mod car;
pub mod color;
pub mod entities;
pub mod game;
pub mod geometry;
pub mod interception;
pub mod level;

pub use buffer::{CircularBuffer, Pr};
pub use car::{Car, CarMode, CarShot};
pub use entities::{Element, EntityId, EntityKind, Flag, Wall};
pub use game::{Collaborators, Game, GameConfig};
pub use geometry::{Aabb, Transform};
pub use interception::{Interceptable, Interception, find_first_interception};
pub use level::{LevelGenerator, LevelParams, generate_levels};
