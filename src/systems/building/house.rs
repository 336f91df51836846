use std::collections::HashMap;

use bevy::prelude::*;

use super::*;
use super::assets::{AssetHandle, AssetLibrary};
use super::planner::{plan, PlacementCommand};

// entity hierarchy components
#[derive(Component)]
pub struct House {
    pub request: BuildRequest,
    pub foundation: String,
}

#[derive(Component)]
pub struct Piece {
    pub role: Role,
    pub floor: usize,
    pub asset: String,
}

/// Spawns a `House` parent with one child per placement command.
/// When an asset fails to instantiate, the command's remaining fallback
/// keywords are tried in order; the piece is left out only when none loads.
pub fn spawn_house(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    plan: &BuildingPlan,
    library: &dyn AssetLibrary,
) -> Entity {
    let house_entity = commands.spawn((
        House {
            request: plan.request,
            foundation: plan.foundation.name.clone(),
        },
        Transform::default(),
        Visibility::Visible,
    )).id();

    // variants repeat a lot, build each mesh once
    let mut mesh_cache: HashMap<String, Handle<Mesh>> = HashMap::new();
    let mut material_cache: HashMap<Role, Handle<StandardMaterial>> = HashMap::new();
    let mut pieces = Vec::with_capacity(plan.commands.len());

    for command in &plan.commands {
        let Some((name, mesh)) = load_piece(library, meshes, &mut mesh_cache, command) else {
            warn!("no loadable asset for {:?} on floor {}, piece left out", command.role, command.floor);
            continue;
        };

        let material = material_cache
            .entry(command.role)
            .or_insert_with(|| materials.add(StandardMaterial {
                base_color: role_color(command.role),
                alpha_mode: AlphaMode::Opaque,
                ..default()
            }))
            .clone();

        let piece = commands.spawn((
            Piece {
                role: command.role,
                floor: command.floor,
                asset: name,
            },
            Mesh3d(mesh),
            MeshMaterial3d(material),
            command.transform(),
            Visibility::Visible,
        )).id();
        pieces.push(piece);
    }

    commands.entity(house_entity).add_children(&pieces);
    house_entity
}

// first handle that instantiates: the planned asset, then every match of each later keyword
fn load_piece(
    library: &dyn AssetLibrary,
    meshes: &mut Assets<Mesh>,
    cache: &mut HashMap<String, Handle<Mesh>>,
    command: &PlacementCommand,
) -> Option<(String, Handle<Mesh>)> {
    let (style, details) = (command.asset.style, command.asset.details);
    let later = command
        .fallbacks
        .iter()
        .flat_map(|keyword| library.matching(style, details, keyword));

    for handle in std::iter::once(command.asset.clone()).chain(later) {
        if let Some(mesh) = cache.get(&handle.name) {
            return Some((handle.name, mesh.clone()));
        }
        match library.instantiate(&handle) {
            Ok(mesh) => {
                let mesh = meshes.add(mesh);
                cache.insert(handle.name.clone(), mesh.clone());
                return Some((handle.name, mesh));
            }
            Err(err) => warn!("cannot instantiate {}: {err}", handle.name),
        }
    }
    None
}

pub fn handle_build(
    mut commands: Commands,
    mut events: EventReader<BuildEvent>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    library: Res<BuiltinLibrary>,
    mut last: ResMut<LastPlan>,
    query: Query<Entity, With<House>>,
) {
    // only the latest request in a frame matters
    let Some(event) = events.read().last() else {
        return;
    };

    // cleanup existing house
    for entity in query.iter() {
        commands.entity(entity).try_despawn();
    }

    match plan(&event.request, &*library) {
        Ok(plan) => {
            spawn_house(&mut commands, &mut meshes, &mut materials, &plan, &*library);
            last.plan = Some(plan);
            last.error = None;
        }
        Err(err) => {
            error!("build failed: {err}");
            last.plan = None;
            last.error = Some(err.to_string());
        }
    }
}

pub fn handle_clear(
    mut commands: Commands,
    mut events: EventReader<ClearEvent>,
    mut last: ResMut<LastPlan>,
    query: Query<Entity, With<House>>,
) {
    for _event in events.read() {
        // children are also handled automatically
        for entity in query.iter() {
            commands.entity(entity).try_despawn();
        }
        last.plan = None;
        last.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::building::assets::AssetError;
    use crate::systems::building::Polygon;

    // refuses to build roofs, everything else comes from the builtin set
    struct NoRoofs(BuiltinLibrary);

    impl AssetLibrary for NoRoofs {
        fn matching(&self, style: Style, details: DetailTier, keyword: &str) -> Vec<AssetHandle> {
            self.0.matching(style, details, keyword)
        }

        fn footprint(&self, handle: &AssetHandle) -> Result<Polygon, AssetError> {
            self.0.footprint(handle)
        }

        fn instantiate(&self, handle: &AssetHandle) -> Result<Mesh, AssetError> {
            if handle.name.starts_with("roof") {
                return Err(AssetError::UnknownHandle(handle.name.clone()));
            }
            self.0.instantiate(handle)
        }
    }

    // balcony walls exist in the catalog but never load
    struct BrokenBalconies(BuiltinLibrary);

    impl AssetLibrary for BrokenBalconies {
        fn matching(&self, style: Style, details: DetailTier, keyword: &str) -> Vec<AssetHandle> {
            self.0.matching(style, details, keyword)
        }

        fn footprint(&self, handle: &AssetHandle) -> Result<Polygon, AssetError> {
            self.0.footprint(handle)
        }

        fn instantiate(&self, handle: &AssetHandle) -> Result<Mesh, AssetError> {
            if handle.name.contains("_balcony") {
                return Err(AssetError::UnknownHandle(handle.name.clone()));
            }
            self.0.instantiate(handle)
        }
    }

    fn spawn_into(world: &mut World, plan: &BuildingPlan, library: &dyn AssetLibrary) {
        let mut queue = bevy::ecs::world::CommandQueue::default();
        world.resource_scope(|world, mut meshes: Mut<Assets<Mesh>>| {
            world.resource_scope(|world, mut materials: Mut<Assets<StandardMaterial>>| {
                let mut commands = Commands::new(&mut queue, world);
                spawn_house(&mut commands, &mut meshes, &mut materials, plan, library);
            });
        });
        queue.apply(world);
    }

    fn world() -> World {
        let mut world = World::new();
        world.init_resource::<Assets<Mesh>>();
        world.init_resource::<Assets<StandardMaterial>>();
        world
    }

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<StandardMaterial>>()
            .insert_resource(BuiltinLibrary::new())
            .init_resource::<LastPlan>()
            .add_event::<BuildEvent>()
            .add_event::<ClearEvent>()
            .add_systems(Update, (handle_clear, handle_build).chain());
        app
    }

    fn pieces(app: &mut App) -> usize {
        app.world_mut().query::<&Piece>().iter(app.world()).count()
    }

    fn houses(app: &mut App) -> usize {
        app.world_mut().query::<&House>().iter(app.world()).count()
    }

    #[test]
    fn build_event_spawns_one_piece_per_command() {
        let mut app = app();
        let request = BuildParams { style: Style::Japanese, floors: 2, ..default() }.request();
        app.world_mut().send_event(BuildEvent { request });
        app.update();

        let expected = app.world().resource::<LastPlan>().plan.as_ref().map(|p| p.commands.len());
        assert_eq!(houses(&mut app), 1);
        assert_eq!(Some(pieces(&mut app)), expected);

        // rebuilding replaces the house
        app.world_mut().send_event(BuildEvent { request });
        app.update();
        assert_eq!(houses(&mut app), 1);

        app.world_mut().send_event(ClearEvent);
        app.update();
        assert_eq!(houses(&mut app), 0);
        assert_eq!(pieces(&mut app), 0);
    }

    #[test]
    fn failed_build_is_recorded() {
        let mut app = app();
        let request = BuildParams { style: Style::Japanese, floors: 9, ..default() }.request();
        app.world_mut().send_event(BuildEvent { request });
        app.update();

        let last = app.world().resource::<LastPlan>();
        assert!(last.plan.is_none());
        assert!(last.error.as_deref().is_some_and(|e| e.contains("floors")));
        assert_eq!(houses(&mut app), 0);
    }

    #[test]
    fn instantiate_failures_are_left_out() {
        let mut world = world();
        let library = NoRoofs(BuiltinLibrary::new());
        let request = BuildRequest { style: Style::Khrushchev, details: DetailTier::Low, floors: 2, seed: 3 };
        let plan = plan(&request, &library).unwrap();
        spawn_into(&mut world, &plan, &library);

        let roles: Vec<Role> = world.query::<&Piece>().iter(&world).map(|p| p.role).collect();
        assert_eq!(roles.len(), plan.commands.len() - plan.count(Role::Roof));
        assert!(!roles.contains(&Role::Roof));
    }

    #[test]
    fn unloadable_assets_fall_back_along_the_chain() {
        let library = BrokenBalconies(BuiltinLibrary::new());
        let plan = (1..200)
            .map(|seed| BuildRequest { style: Style::Khrushchev, details: DetailTier::Low, floors: 3, seed })
            .filter_map(|request| plan(&request, &library).ok())
            .find(|plan| plan.count(Role::Balcony) > 0)
            .unwrap();

        let mut world = world();
        spawn_into(&mut world, &plan, &library);

        let pieces: Vec<(Role, String)> = world
            .query::<&Piece>()
            .iter(&world)
            .map(|p| (p.role, p.asset.clone()))
            .collect();
        assert_eq!(pieces.len(), plan.commands.len());

        let balconies: Vec<&String> = pieces.iter().filter(|(r, _)| *r == Role::Balcony).map(|(_, a)| a).collect();
        assert_eq!(balconies.len(), plan.count(Role::Balcony));
        assert!(balconies.iter().all(|name| name.ends_with("_window")));
    }
}
