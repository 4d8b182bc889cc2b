//! Level parameters and procedural level generation

use std::f32::consts::FRAC_PI_2;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::color::Color;
use super::entities::{Element, EntityIds, EntityKind, Flag, Wall};
use super::interception::{Interceptable, find_first_interception};
use crate::consts::*;
use crate::error::GameError;

const WALL_BASE_COLOR: u32 = 0x99ff00;
const WALL_LIGHTNESS_SPREAD: f32 = 0.25;
const FLAG_MIN_COLOR: u32 = 0xff3300;
const FLAG_MAX_COLOR: u32 = 0xff9900;

/// Difficulty knobs for one level. Immutable once the level starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelParams {
    pub level_name: String,
    /// Edge of the square play field, centered on the origin
    pub level_size: u32,
    /// Countdown in milliseconds
    pub level_time: u32,
    pub no_of_walls: u32,
    pub no_of_flags: u32,
    pub points_per_flag: u32,
    pub car_speed: u32,
    /// Degrees per steering tick
    pub car_steer_angle: u32,
}

impl LevelParams {
    /// Parameters for the 1-based level index `i`
    pub fn for_index(i: u32) -> Self {
        let level_size = 20 + 10 * i;
        let no_of_flags = 2 + i / 5;
        Self {
            level_name: i.to_string(),
            level_size,
            level_time: no_of_flags * 10_000,
            no_of_walls: level_size * level_size / 100,
            no_of_flags,
            points_per_flag: 10 * i.div_ceil(5),
            car_speed: 2 + i / 5,
            car_steer_angle: 3 + i / 5,
        }
    }

    pub fn half_size(&self) -> f32 {
        self.level_size as f32 / 2.0
    }

    /// Strictly inside the play field on X and Z
    pub fn is_inside(&self, x: f32, z: f32) -> bool {
        let half = self.half_size();
        x.abs() < half && z.abs() < half
    }
}

/// The progression used by the game: list position `n` holds level index `n + 1`
pub fn generate_levels(count: usize) -> Vec<LevelParams> {
    (1..=count as u32).map(LevelParams::for_index).collect()
}

/// Places walls and flags for a level with reject-and-retry sampling
pub struct LevelGenerator<'a, R: Rng> {
    rng: &'a mut R,
    ids: &'a mut EntityIds,
}

impl<'a, R: Rng> LevelGenerator<'a, R> {
    pub fn new(rng: &'a mut R, ids: &'a mut EntityIds) -> Self {
        Self { rng, ids }
    }

    /// Walls first, then flags. Fails if any element cannot be placed.
    pub fn generate(&mut self, params: &LevelParams) -> Result<Vec<Element>, GameError> {
        let capacity = (params.no_of_walls + params.no_of_flags) as usize;
        let mut elements = Vec::with_capacity(capacity);

        for i in 0..params.no_of_walls {
            let wall = self.place_wall(params, &elements, i)?;
            elements.push(Element::Wall(wall));
        }
        for _ in 0..params.no_of_flags {
            let flag = self.place_flag(params, &elements)?;
            elements.push(Element::Flag(flag));
        }

        log::info!(
            "Level {} generated: size={}, walls={}, flags={}",
            params.level_name,
            params.level_size,
            params.no_of_walls,
            params.no_of_flags
        );
        Ok(elements)
    }

    fn spread(&mut self, size: f32) -> f32 {
        let half = size / 2.0;
        self.rng.random_range(-half..=half)
    }

    fn place_wall(
        &mut self,
        params: &LevelParams,
        placed: &[Element],
        index: u32,
    ) -> Result<Wall, GameError> {
        let width = self.rng.random_range(WALL_MIN_WIDTH..=WALL_MAX_WIDTH) as f32;
        let height = self.rng.random_range(WALL_MIN_HEIGHT..=WALL_MAX_HEIGHT) as f32;
        let lightness = self.spread(WALL_LIGHTNESS_SPREAD);
        let color = Color::from_hex(WALL_BASE_COLOR).offset_hsl(0.0, 0.0, lightness);
        let mut wall =
            Wall::new(self.ids.next_id(), width, height, color).with_label(index.to_string());

        let size = params.level_size as f32;
        for attempt in 1..=MAX_WALL_ATTEMPTS {
            let x = self.spread(size);
            let z = self.spread(size);
            let yaw = self.rng.random_range(0..=3) as f32 * FRAC_PI_2;
            wall.place(x, z, yaw);
            if validate_placement(&wall, placed)? {
                return Ok(wall);
            }
            log::debug!("Wall {} rejected at attempt {}", index, attempt);
        }
        Err(GameError::PlacementExhausted {
            kind: EntityKind::Wall,
            attempts: MAX_WALL_ATTEMPTS,
        })
    }

    fn place_flag(&mut self, params: &LevelParams, placed: &[Element]) -> Result<Flag, GameError> {
        let color = Color::from_hex(self.rng.random_range(FLAG_MIN_COLOR..=FLAG_MAX_COLOR));
        let mut flag = Flag::new(self.ids.next_id(), FLAG_SIZE, color);

        let size = params.level_size as f32;
        for attempt in 1..=MAX_FLAG_ATTEMPTS {
            let x = self.spread(size);
            let z = self.spread(size);
            flag.place(x, z);
            if validate_placement(&flag, placed)? {
                return Ok(flag);
            }
            log::debug!("Flag rejected at attempt {}", attempt);
        }
        Err(GameError::PlacementExhausted {
            kind: EntityKind::Flag,
            attempts: MAX_FLAG_ATTEMPTS,
        })
    }
}

/// Whether `candidate` may be placed among the `placed` elements.
///
/// Walls must stay outside the free center and must not overlap anything.
/// Flags must not overlap anything and must keep a minimum distance from every element.
pub fn validate_placement<C>(candidate: &C, placed: &[Element]) -> Result<bool, GameError>
where
    C: Interceptable + ?Sized,
{
    let position = candidate.position();
    match candidate.kind() {
        EntityKind::Wall => {
            let distance = (position.x.powi(2) + position.z.powi(2)).sqrt();
            if distance <= FREE_CENTER_SIZE {
                return Ok(false);
            }
            Ok(find_first_interception(candidate, placed, position).is_none())
        }
        EntityKind::Flag => {
            if find_first_interception(candidate, placed, position).is_some() {
                log::debug!("Flag placement intercepts an element");
                return Ok(false);
            }
            let too_close = placed
                .iter()
                .any(|el| el.position().distance_squared(position) <= FLAG_MIN_DISTANCE_SQ);
            if too_close {
                log::debug!("Flag placement too close to an element");
            }
            Ok(!too_close)
        }
        kind => Err(GameError::UnsupportedEntity(kind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::car::Car;
    use crate::sim::entities::EntityId;
    use crate::sim::interception::intercept_one;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn generate(params: &LevelParams, seed: u64) -> Result<Vec<Element>, GameError> {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut ids = EntityIds::default();
        LevelGenerator::new(&mut rng, &mut ids).generate(params)
    }

    #[test]
    fn test_progression_formula() {
        let first = LevelParams::for_index(1);
        assert_eq!(first.level_name, "1");
        assert_eq!(first.level_size, 30);
        assert_eq!(first.no_of_walls, 9);
        assert_eq!(first.no_of_flags, 2);
        assert_eq!(first.level_time, 20_000);
        assert_eq!(first.points_per_flag, 10);
        assert_eq!(first.car_speed, 2);
        assert_eq!(first.car_steer_angle, 3);

        let tenth = LevelParams::for_index(10);
        assert_eq!(tenth.level_size, 120);
        assert_eq!(tenth.no_of_walls, 144);
        assert_eq!(tenth.no_of_flags, 4);
        assert_eq!(tenth.level_time, 40_000);
        assert_eq!(tenth.points_per_flag, 20);
        assert_eq!(tenth.car_speed, 4);

        assert_eq!(LevelParams::for_index(6).points_per_flag, 20);
    }

    #[test]
    fn test_generate_levels_monotonic() {
        let levels = generate_levels(LEVEL_COUNT);
        assert_eq!(levels.len(), LEVEL_COUNT);
        for pair in levels.windows(2) {
            assert!(pair[1].level_size > pair[0].level_size);
            assert!(pair[1].no_of_flags >= pair[0].no_of_flags);
        }
    }

    #[test]
    fn test_is_inside_is_strict() {
        let params = LevelParams::for_index(1);
        assert!(params.is_inside(14.9, -14.9));
        assert!(!params.is_inside(15.0, 0.0));
        assert!(!params.is_inside(0.0, -15.0));
    }

    #[test]
    fn test_generates_requested_counts() {
        let params = LevelParams::for_index(3);
        let elements = generate(&params, 42).expect("level");
        let walls = elements.iter().filter(|e| e.as_wall().is_some()).count();
        let flags = elements.iter().filter(|e| e.as_flag().is_some()).count();
        assert_eq!(walls as u32, params.no_of_walls);
        assert_eq!(flags as u32, params.no_of_flags);
    }

    #[test]
    fn test_same_seed_same_level() {
        let params = LevelParams::for_index(2);
        let a = generate(&params, 7).expect("level");
        let b = generate(&params, 7).expect("level");
        let positions = |els: &[Element]| els.iter().map(|e| e.position()).collect::<Vec<_>>();
        assert_eq!(positions(&a), positions(&b));
    }

    #[test]
    fn test_flag_placement_exhausted_on_crowded_level() {
        // A field too small to host two flags apart from each other
        let params = LevelParams {
            level_name: "tiny".into(),
            level_size: 1,
            level_time: 1000,
            no_of_walls: 0,
            no_of_flags: 2,
            points_per_flag: 10,
            car_speed: 1,
            car_steer_angle: 1,
        };
        let err = generate(&params, 1).expect_err("must fail");
        assert_eq!(
            err,
            GameError::PlacementExhausted {
                kind: EntityKind::Flag,
                attempts: MAX_FLAG_ATTEMPTS
            }
        );
    }

    #[test]
    fn test_wall_placement_exhausted_inside_free_center() {
        let params = LevelParams {
            level_name: "center".into(),
            // Every point of the field lies within the free center
            level_size: 6,
            level_time: 1000,
            no_of_walls: 1,
            no_of_flags: 0,
            points_per_flag: 10,
            car_speed: 1,
            car_steer_angle: 1,
        };
        let err = generate(&params, 1).expect_err("must fail");
        assert!(matches!(
            err,
            GameError::PlacementExhausted {
                kind: EntityKind::Wall,
                ..
            }
        ));
    }

    #[test]
    fn test_unsupported_entity() {
        let car = Car::new(EntityId(1));
        assert_eq!(
            validate_placement(&car, &[]),
            Err(GameError::UnsupportedEntity(EntityKind::Car))
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_generated_levels_are_valid(seed in any::<u64>(), index in 1u32..8) {
            let params = LevelParams::for_index(index);
            let elements = generate(&params, seed).expect("level");
            for (i, a) in elements.iter().enumerate() {
                let p = a.position();
                prop_assert!(p.x.abs() <= params.half_size() && p.z.abs() <= params.half_size());
                if let Some(wall) = a.as_wall() {
                    prop_assert!(wall.transform.distance_from_origin_xz() > FREE_CENTER_SIZE);
                }
                for b in elements.iter().skip(i + 1) {
                    prop_assert!(intercept_one(a, b, a.position()).is_none());
                }
            }
        }
    }
}
