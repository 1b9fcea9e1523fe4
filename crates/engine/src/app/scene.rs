use super::input::{ActionStates, InputAction};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    held: ActionStates,
    pressed: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(held: ActionStates, pressed: ActionStates) -> Self {
        Self { held, pressed }
    }

    pub fn quit_requested(&self) -> bool {
        self.pressed.is_down(InputAction::Quit)
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.held.is_down(action)
    }

    /// True when `action` went from released to pressed since the last frame.
    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.held.set(action, is_down);
        self
    }

    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.held.set(action, true);
        self.pressed.set(action, true);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

/// Integer grid cell. `y` grows downward, so "up" is `y - 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    pub fn distance_sq(self, other: GridPos) -> f32 {
        let dx = (i64::from(other.x) - i64::from(self.x)) as f32;
        let dy = (i64::from(other.y) - i64::from(self.y)) as f32;
        dx * dx + dy * dy
    }

    pub fn distance(self, other: GridPos) -> f32 {
        self.distance_sq(other).sqrt()
    }

    pub fn manhattan_distance(self, other: GridPos) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::from_rgba_u32(0xffffffff);

    /// Packs as `0xRRGGBBAA`.
    pub const fn from_rgba_u32(value: u32) -> Self {
        Self {
            r: (value >> 24) as u8,
            g: (value >> 16) as u8,
            b: (value >> 8) as u8,
            a: value as u8,
        }
    }

    pub const fn to_rgba_u32(self) -> u32 {
        (self.r as u32) << 24 | (self.g as u32) << 16 | (self.b as u32) << 8 | self.a as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderableDesc {
    pub color: Color,
    pub debug_name: &'static str,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub position: GridPos,
    pub renderable: RenderableDesc,
    applied_spawn_order: u64,
}

impl Entity {
    pub fn applied_spawn_order(&self) -> u64 {
        self.applied_spawn_order
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Entity store with deferred structural changes.
///
/// `spawn` hands out the id immediately but the entity only becomes visible
/// to queries after [`SceneWorld::apply_pending`]; `despawn` is deferred the
/// same way. Ids are allocated monotonically, so id order is creation order.
#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
    next_applied_spawn_order: u64,
}

impl SceneWorld {
    pub fn spawn(&mut self, position: GridPos, renderable: RenderableDesc) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            position,
            renderable,
            applied_spawn_order: 0,
        });
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.entities.iter().any(|entity| entity.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|entity| entity.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort();
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.entities
                .retain(|entity| pending.binary_search(&entity.id).is_err());
            self.pending_spawns
                .retain(|entity| pending.binary_search(&entity.id).is_err());
            self.pending_despawns.clear();
        }

        if !self.pending_spawns.is_empty() {
            for mut entity in self.pending_spawns.drain(..) {
                entity.applied_spawn_order = self.next_applied_spawn_order;
                self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
                self.entities.push(entity);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
        self.next_applied_spawn_order = 0;
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn position_of(&self, id: EntityId) -> Option<GridPos> {
        self.find_entity(id).map(|entity| entity.position)
    }

    /// (position, color) pairs in spawn order, for whatever draws the grid.
    pub fn renderables(&self) -> impl Iterator<Item = (GridPos, Color)> + '_ {
        self.entities
            .iter()
            .map(|entity| (entity.position, entity.renderable.color))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("scene '{scene}' failed to load: {message}")]
pub struct SceneLoadError {
    pub scene: &'static str,
    pub message: String,
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld) -> Result<(), SceneLoadError>;
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn render(&mut self, world: &SceneWorld);
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
    fn debug_turn_count(&self) -> Option<u64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderable(debug_name: &'static str) -> RenderableDesc {
        RenderableDesc {
            color: Color::WHITE,
            debug_name,
        }
    }

    #[test]
    fn spawn_is_invisible_until_apply_pending() {
        let mut world = SceneWorld::default();
        let id = world.spawn(GridPos::new(1, 2), renderable("a"));

        assert_eq!(world.entity_count(), 0);
        assert!(world.find_entity(id).is_none());

        world.apply_pending();
        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.position_of(id), Some(GridPos::new(1, 2)));
    }

    #[test]
    fn ids_follow_creation_order() {
        let mut world = SceneWorld::default();
        let first = world.spawn(GridPos::default(), renderable("a"));
        let second = world.spawn(GridPos::default(), renderable("b"));
        world.apply_pending();
        let third = world.spawn(GridPos::default(), renderable("c"));
        world.apply_pending();

        assert!(first < second && second < third);
        let order = world
            .entities()
            .iter()
            .map(|entity| entity.applied_spawn_order())
            .collect::<Vec<_>>();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn despawn_is_deferred_and_deduplicated() {
        let mut world = SceneWorld::default();
        let a = world.spawn(GridPos::default(), renderable("a"));
        let b = world.spawn(GridPos::default(), renderable("b"));
        world.apply_pending();

        assert!(world.despawn(a));
        assert!(world.despawn(a));
        assert_eq!(world.entity_count(), 2);

        world.apply_pending();
        assert_eq!(world.entity_count(), 1);
        assert!(world.find_entity(a).is_none());
        assert!(world.find_entity(b).is_some());
        assert!(!world.despawn(a));
    }

    #[test]
    fn despawn_of_pending_spawn_drops_it() {
        let mut world = SceneWorld::default();
        let id = world.spawn(GridPos::default(), renderable("ghost"));
        assert!(world.despawn(id));
        world.apply_pending();
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn renderables_report_position_and_color_in_spawn_order() {
        let mut world = SceneWorld::default();
        world.spawn(
            GridPos::new(3, 4),
            RenderableDesc {
                color: Color::from_rgba_u32(0x44ff44ff),
                debug_name: "heal",
            },
        );
        world.spawn(GridPos::new(-1, 0), renderable("player"));
        world.apply_pending();

        let pairs = world.renderables().collect::<Vec<_>>();
        assert_eq!(
            pairs,
            vec![
                (GridPos::new(3, 4), Color::from_rgba_u32(0x44ff44ff)),
                (GridPos::new(-1, 0), Color::WHITE),
            ]
        );
    }

    #[test]
    fn color_packing_round_trips_channels() {
        let color = Color::from_rgba_u32(0xee00eeff);
        assert_eq!((color.r, color.g, color.b, color.a), (0xee, 0x00, 0xee, 0xff));
        assert_eq!(color.to_rgba_u32(), 0xee00eeff);
    }

    #[test]
    fn grid_distances() {
        let origin = GridPos::new(0, 0);
        assert_eq!(origin.distance(GridPos::new(3, 4)), 5.0);
        assert_eq!(origin.manhattan_distance(GridPos::new(-2, 3)), 5);
        assert_eq!(origin.offset(1, 1), GridPos::new(1, 1));
    }

    #[test]
    fn grid_math_holds_at_the_i32_edges() {
        let far_right = GridPos::new(i32::MAX, 0);
        let far_left = GridPos::new(i32::MIN, 0);

        assert_eq!(far_right.offset(1, 0), far_right);
        assert_eq!(far_left.offset(-1, 0), far_left);
        assert_eq!(far_right.manhattan_distance(far_left), u32::MAX);
        assert!(far_left.distance(far_right) > 4.0e9);
    }
}
