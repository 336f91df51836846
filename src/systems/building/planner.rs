// building layout: floors, segments and modules turned into placement commands
// pure planning, nothing in here touches the ECS

use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;

use crate::config::*;
use crate::systems::building::Polygon;
use super::assets::{pick, resolve, AssetError, AssetHandle, AssetLibrary};
use super::combination::{Fit, ModuleCatalog};
use super::facade::{
    engawa_keyword, fallback_chain, interfloor_keyword, FacadeSlot, FacadeState, FloorContext,
    LayoutStrategy, Role,
};
use super::footprint::{FootprintMesh, Segment};
use super::style::{dispatch, floor_height, DetailTier, Style};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("no layout strategy for style '{0}'")]
    UnsupportedStyle(String),
    #[error("unknown detail tier '{0}'")]
    UnsupportedDetails(String),
    #[error("{style} supports 1 to {max} floors, got {floors}")]
    InvalidFloorCount { style: Style, floors: usize, max: usize },
    #[error("no usable foundation for {style} / {details}: {source}")]
    NoFoundation {
        style: Style,
        details: DetailTier,
        #[source]
        source: AssetError,
    },
}

/// Everything one generation depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildRequest {
    pub style: Style,
    pub details: DetailTier,
    pub floors: usize,
    pub seed: u64,
}

impl BuildRequest {
    #[cfg(test)]
    pub fn parse(style: &str, details: &str, floors: usize, seed: u64) -> Result<Self, PlanError> {
        Ok(Self {
            style: style.parse()?,
            details: details.parse()?,
            floors,
            seed,
        })
    }
}

/// One asset to spawn. `heading` is the segment angle in the ground plane,
/// `scale` stretches the asset in its local frame.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementCommand {
    pub position: Vec3,
    pub heading: f32,
    pub scale: Vec3,
    pub role: Role,
    /// keyword the asset was found with, after fallbacks
    pub keyword: String,
    pub asset: AssetHandle,
    /// chain entries after `keyword`, tried in order if the asset fails to load
    pub fallbacks: Vec<String>,
    pub floor: usize,
    pub segment: Option<usize>,
    pub module: Option<usize>,
}

impl PlacementCommand {
    pub fn transform(&self) -> Transform {
        // local +X onto the segment direction (x, z)
        Transform {
            translation: self.position,
            rotation: Quat::from_rotation_y(-self.heading),
            scale: self.scale,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SegmentReport {
    pub floor: usize,
    pub index: usize,
    pub segment: Segment,
    pub fit: Option<Fit>,
    /// where the module cursor stopped, equal to the segment end for fitted segments
    pub cursor_end: Vec2,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SkipReport {
    Infeasible {
        floor: usize,
        segment: usize,
        length: f32,
    },
    MissingAsset {
        floor: usize,
        segment: Option<usize>,
        module: Option<usize>,
        role: Role,
        keyword: String,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct BuildingPlan {
    pub request: BuildRequest,
    pub foundation: AssetHandle,
    pub footprint: Polygon,
    pub floor_height: f32,
    pub commands: Vec<PlacementCommand>,
    pub segments: Vec<SegmentReport>,
    pub skipped: Vec<SkipReport>,
}

impl BuildingPlan {
    pub fn count(&self, role: Role) -> usize {
        self.commands.iter().filter(|c| c.role == role).count()
    }

    pub fn floor_commands(&self, floor: usize) -> impl Iterator<Item = &PlacementCommand> {
        self.commands.iter().filter(move |c| c.floor == floor)
    }
}

/// Plans a building with the default module catalog.
pub fn plan(request: &BuildRequest, library: &dyn AssetLibrary) -> Result<BuildingPlan, PlanError> {
    plan_with_catalog(request, library, &ModuleCatalog::default())
}

pub fn plan_with_catalog(
    request: &BuildRequest,
    library: &dyn AssetLibrary,
    catalog: &ModuleCatalog,
) -> Result<BuildingPlan, PlanError> {
    let BuildRequest { style, details, floors, seed } = *request;

    let max = style.max_floors();
    if floors == 0 || floors > max {
        return Err(PlanError::InvalidFloorCount { style, floors, max });
    }

    let strategy = dispatch(style);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut builder = PlanBuilder {
        request,
        library,
        asset_rng: StdRng::seed_from_u64(seed ^ ASSET_STREAM_SALT),
        commands: Vec::new(),
        segments: Vec::new(),
        skipped: Vec::new(),
    };

    let no_foundation = |source| PlanError::NoFoundation { style, details, source };
    let foundation = pick(library, style, details, "base", &mut builder.asset_rng).map_err(no_foundation)?;
    let polygon = library.footprint(&foundation).map_err(no_foundation)?;

    let footprint = FootprintMesh::from_polygon(&polygon, FOUNDATION_THICKNESS);

    let height = floor_height(style, details);
    let interfloor = strategy.has_interfloor(floors);
    let mut state = FacadeState::default();

    for floor in 0..floors {
        let elevation = floor as f32 * height;
        let scale = strategy.floor_scale(floor);
        let segments = footprint.duplicated(elevation, scale).extract_top_segments();
        if segments.is_empty() {
            warn!("floor {floor}: footprint '{}' has no top edges, no walls placed", foundation.name);
        } else {
            debug!("floor {floor}: {} segments at {elevation:.2}m, scale {scale:.3}", segments.len());
        }

        builder.commands.push(PlacementCommand {
            position: Vec3::new(0.0, elevation, 0.0),
            heading: 0.0,
            scale: Vec3::new(scale, 1.0, scale),
            role: Role::Foundation,
            keyword: "base".to_string(),
            asset: foundation.clone(),
            fallbacks: Vec::new(),
            floor,
            segment: None,
            module: None,
        });

        let ctx = FloorContext {
            index: floor,
            wall_elevation: elevation + WALL_BASE_OFFSET,
        };
        state = builder.lay_floor(strategy, catalog, &ctx, &segments, interfloor, state, &mut rng);
    }

    builder.place_roof(&foundation, floors as f32 * height + WALL_BASE_OFFSET, strategy.floor_scale(floors - 1));

    info!(
        "planned {} {} building, {} floors, seed {}: {} commands, {} skipped",
        details,
        style,
        floors,
        seed,
        builder.commands.len(),
        builder.skipped.len(),
    );

    Ok(BuildingPlan {
        request: *request,
        foundation,
        footprint: polygon,
        floor_height: height,
        commands: builder.commands,
        segments: builder.segments,
        skipped: builder.skipped,
    })
}

struct PlanBuilder<'a> {
    request: &'a BuildRequest,
    library: &'a dyn AssetLibrary,
    asset_rng: StdRng,
    commands: Vec<PlacementCommand>,
    segments: Vec<SegmentReport>,
    skipped: Vec<SkipReport>,
}

impl PlanBuilder<'_> {
    fn resolve(&mut self, candidates: &[String]) -> Result<(AssetHandle, String), AssetError> {
        resolve(self.library, self.request.style, self.request.details, candidates, &mut self.asset_rng)
    }

    #[allow(clippy::too_many_arguments)]
    fn lay_floor(
        &mut self,
        strategy: &dyn LayoutStrategy,
        catalog: &ModuleCatalog,
        floor: &FloorContext,
        segments: &[Segment],
        interfloor: bool,
        mut state: FacadeState,
        rng: &mut StdRng,
    ) -> FacadeState {
        for (index, segment) in segments.iter().enumerate() {
            let Some(fit) = catalog.fit(segment.length()) else {
                warn!("floor {}: segment {index} of {:.2}m fits no module combination", floor.index, segment.length());
                self.skipped.push(SkipReport::Infeasible {
                    floor: floor.index,
                    segment: index,
                    length: segment.length(),
                });
                self.segments.push(SegmentReport {
                    floor: floor.index,
                    index,
                    segment: *segment,
                    fit: None,
                    cursor_end: segment.start,
                });
                continue;
            };

            let (slots, next) = strategy.assign_roles(floor, index, &fit.modules, state, rng);
            state = next;

            let cursor_end = self.fill_segment(floor, index, segment, &fit, &slots, interfloor);
            self.segments.push(SegmentReport {
                floor: floor.index,
                index,
                segment: *segment,
                fit: Some(fit),
                cursor_end,
            });
        }
        state
    }

    // walks the cursor from the segment start, one module at a time
    fn fill_segment(
        &mut self,
        floor: &FloorContext,
        index: usize,
        segment: &Segment,
        fit: &Fit,
        slots: &[FacadeSlot],
        interfloor: bool,
    ) -> Vec2 {
        let style = self.request.style;
        let direction = segment.direction();
        let heading = segment.heading();
        let scale = Vec3::new(fit.scale, 1.0, 1.0);
        let mut cursor = segment.start;

        for (module, (&length, slot)) in fit.modules.iter().zip(slots).enumerate() {
            let position = Vec3::new(cursor.x, floor.wall_elevation, cursor.y);
            cursor += direction * length * fit.scale;

            let command = |role: Role, keyword: String, asset: AssetHandle, fallbacks: Vec<String>, position: Vec3| PlacementCommand {
                position,
                heading,
                scale,
                role,
                keyword,
                asset,
                fallbacks,
                floor: floor.index,
                segment: Some(index),
                module: Some(module),
            };

            let chain = fallback_chain(slot.role, &slot.keyword, style);
            let (asset, keyword) = match self.resolve(&chain) {
                Ok(found) => found,
                Err(err) => {
                    self.report_missing(floor.index, Some(index), Some(module), slot.role, err);
                    continue;
                }
            };
            let fallbacks = after(&chain, &keyword);
            self.commands.push(command(slot.role, keyword, asset, fallbacks, position));

            if interfloor {
                match self.resolve(&[interfloor_keyword(length)]) {
                    Ok((asset, keyword)) => self.commands.push(command(Role::Interfloor, keyword, asset, Vec::new(), position)),
                    Err(err) => self.report_missing(floor.index, Some(index), Some(module), Role::Interfloor, err),
                }
            }

            if slot.engawa {
                let deck = position - Vec3::Y * ENGAWA_DROP;
                match self.resolve(&[engawa_keyword(length)]) {
                    Ok((asset, keyword)) => self.commands.push(command(Role::Engawa, keyword, asset, Vec::new(), deck)),
                    Err(err) => self.report_missing(floor.index, Some(index), Some(module), Role::Engawa, err),
                }
            }
        }

        cursor
    }

    fn place_roof(&mut self, foundation: &AssetHandle, elevation: f32, scale: f32) {
        let floors = self.request.floors;
        let prefix = self.request.style.roof_prefix();
        let tier = self.request.details.keyword();

        let mut candidates = Vec::with_capacity(3);
        if let Some(id) = foundation_id(&foundation.name) {
            candidates.push(format!("roof_{prefix}_{tier}_{id}"));
        }
        candidates.push(format!("roof_{prefix}_{tier}"));
        candidates.push("roof".to_string());

        match self.resolve(&candidates) {
            Ok((asset, keyword)) => self.commands.push(PlacementCommand {
                position: Vec3::new(0.0, elevation, 0.0),
                heading: 0.0,
                scale: Vec3::new(scale, 1.0, scale),
                role: Role::Roof,
                fallbacks: after(&candidates, &keyword),
                keyword,
                asset,
                floor: floors,
                segment: None,
                module: None,
            }),
            Err(err) => self.report_missing(floors, None, None, Role::Roof, err),
        }
    }

    fn report_missing(
        &mut self,
        floor: usize,
        segment: Option<usize>,
        module: Option<usize>,
        role: Role,
        err: AssetError,
    ) {
        warn!("floor {floor}: skipping {} piece, {err}", role.label());
        let keyword = match err {
            AssetError::NotFound { keyword, .. } => keyword,
            other => other.to_string(),
        };
        self.skipped.push(SkipReport::MissingAsset { floor, segment, module, role, keyword });
    }
}

// chain entries following the one that matched
fn after(chain: &[String], keyword: &str) -> Vec<String> {
    chain.iter().skip_while(|c| *c != keyword).skip(1).cloned().collect()
}

/// Trailing id of a foundation name, `base_japanese_low_2` -> `2`.
pub fn foundation_id(name: &str) -> Option<&str> {
    let parts: Vec<&str> = name.split('_').collect();
    if parts.len() >= 3 { parts.last().copied() } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use approx::assert_relative_eq;

    use crate::systems::building::assets::BuiltinLibrary;

    /// Library with one foundation and a fixed list of names.
    struct StubLibrary {
        style: Style,
        polygon: Polygon,
        names: Vec<&'static str>,
    }

    impl AssetLibrary for StubLibrary {
        fn matching(&self, style: Style, details: DetailTier, keyword: &str) -> Vec<AssetHandle> {
            if style != self.style {
                return Vec::new();
            }
            self.names
                .iter()
                .filter(|name| name.contains(keyword))
                .map(|name| AssetHandle { style, details, name: name.to_string() })
                .collect()
        }

        fn footprint(&self, handle: &AssetHandle) -> Result<Polygon, AssetError> {
            if handle.name.starts_with("base") {
                Ok(self.polygon.clone())
            } else {
                Err(AssetError::NoFootprint(handle.name.clone()))
            }
        }

        fn instantiate(&self, handle: &AssetHandle) -> Result<Mesh, AssetError> {
            Err(AssetError::UnknownHandle(handle.name.clone()))
        }
    }

    fn rect(w: f32, d: f32) -> Polygon {
        vec![Vec2::new(0.0, 0.0), Vec2::new(w, 0.0), Vec2::new(w, d), Vec2::new(0.0, d)]
    }

    fn request(style: Style, floors: usize, seed: u64) -> BuildRequest {
        BuildRequest { style, details: DetailTier::Low, floors, seed }
    }

    fn wall_roles(plan: &BuildingPlan, floor: usize) -> HashMap<(usize, usize), Role> {
        plan.floor_commands(floor)
            .filter(|c| matches!(c.role, Role::Plain | Role::Door | Role::Window | Role::Balcony))
            .filter_map(|c| Some(((c.segment?, c.module?), c.role)))
            .collect()
    }

    #[test]
    fn same_request_same_plan() {
        let library = BuiltinLibrary::new();
        for style in Style::ALL {
            let req = request(style, style.max_floors().min(4), 4242);
            let a = plan(&req, &library).unwrap();
            let b = plan(&req, &library).unwrap();
            assert_eq!(a.commands, b.commands);
            assert_eq!(format!("{:?}", a.commands), format!("{:?}", b.commands));
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let library = BuiltinLibrary::new();
        let a = plan(&request(Style::Khrushchev, 3, 1), &library).unwrap();
        let b = plan(&request(Style::Khrushchev, 3, 2), &library).unwrap();
        assert_ne!(a.commands, b.commands);
    }

    #[test]
    fn soviet_roles_propagate_through_the_plan() {
        let library = BuiltinLibrary::new();
        for seed in 0..20 {
            let plan = plan(&request(Style::Khrushchev, 5, seed), &library).unwrap();
            let ground = wall_roles(&plan, 0);
            let second = wall_roles(&plan, 1);
            assert!(!second.is_empty());

            for (key, role) in &second {
                assert_ne!(*role, Role::Door);
                if ground.get(key) == Some(&Role::Door) {
                    assert_eq!(*role, Role::Window);
                }
            }
            for floor in 2..5 {
                assert_eq!(wall_roles(&plan, floor), second, "seed {seed} floor {floor}");
            }
        }
    }

    #[test]
    fn cursor_ends_at_segment_end() {
        let library = BuiltinLibrary::new();
        for style in Style::ALL {
            let plan = plan(&request(style, 2, 9), &library).unwrap();
            for report in plan.segments.iter().filter(|r| r.fit.is_some()) {
                assert!(report.cursor_end.distance(report.segment.end) < 1e-3, "{style}: {report:?}");
            }
        }
    }

    #[test]
    fn skipped_modules_still_advance_the_cursor() {
        // 7.3m edges want 2.4m modules, which this library lacks
        let library = StubLibrary {
            style: Style::Test,
            polygon: rect(7.3, 6.0),
            names: vec!["base_test_low_1", "wall10"],
        };
        let plan = plan(&request(Style::Test, 1, 5), &library).unwrap();

        assert!(plan.skipped.iter().any(|s| matches!(s, SkipReport::MissingAsset { keyword, .. } if keyword.starts_with("wall12"))));
        for report in &plan.segments {
            assert!(report.cursor_end.distance(report.segment.end) < 1e-3);
        }

        let walls: Vec<_> = plan.commands.iter()
            .filter(|c| matches!(c.role, Role::Plain | Role::Door | Role::Window))
            .collect();
        assert!(!walls.is_empty());
        for wall in walls {
            assert_eq!(wall.asset.name, "wall10");
            let report = plan.segments.iter().find(|r| Some(r.index) == wall.segment).unwrap();
            let fit = report.fit.as_ref().unwrap();
            let offset = wall.module.unwrap() as f32 * fit.modules[0] * fit.scale;
            let expected = report.segment.start + report.segment.direction() * offset;
            assert_relative_eq!(wall.position.x, expected.x, epsilon = 1e-4);
            assert_relative_eq!(wall.position.z, expected.y, epsilon = 1e-4);
            assert_relative_eq!(wall.position.y, WALL_BASE_OFFSET);
        }
    }

    #[test]
    fn infeasible_edges_are_reported_not_fatal() {
        // the 1.1m notch rounds to one 2.0m module at scale 0.55
        let notched = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(6.0, 0.0),
            Vec2::new(6.0, 4.8),
            Vec2::new(4.9, 4.8),
            Vec2::new(0.0, 4.8),
        ];
        let library = StubLibrary {
            style: Style::Test,
            polygon: notched,
            names: vec!["base_test_low_1", "wall10", "wall12", "wall15", "roof_test_low_1"],
        };
        let plan = plan(&request(Style::Test, 1, 1), &library).unwrap();

        let infeasible: Vec<_> = plan.skipped.iter()
            .filter(|s| matches!(s, SkipReport::Infeasible { .. }))
            .collect();
        assert_eq!(infeasible.len(), 1);
        assert_eq!(plan.segments.len(), 5);
        assert_eq!(plan.count(Role::Roof), 1);
    }

    #[test]
    fn request_validation() {
        let library = BuiltinLibrary::new();
        assert_eq!(
            plan(&request(Style::Japanese, 6, 1), &library),
            Err(PlanError::InvalidFloorCount { style: Style::Japanese, floors: 6, max: 5 }),
        );
        assert!(matches!(plan(&request(Style::Test, 0, 1), &library), Err(PlanError::InvalidFloorCount { .. })));
        assert!(matches!(BuildRequest::parse("gothic", "low", 1, 1), Err(PlanError::UnsupportedStyle(_))));
        assert_eq!(BuildRequest::parse("Stalinist", "HIGH", 3, 7).unwrap().details, DetailTier::High);
    }

    #[test]
    fn missing_foundation_is_fatal() {
        let library = StubLibrary { style: Style::Brezhnev, polygon: rect(4.0, 4.0), names: vec!["wall10"] };
        assert!(matches!(
            plan(&request(Style::Brezhnev, 1, 1), &library),
            Err(PlanError::NoFoundation { source: AssetError::NotFound { .. }, .. })
        ));
    }

    #[test]
    fn edgeless_footprint_still_gets_slabs_and_roof() {
        let flat = StubLibrary {
            style: Style::Test,
            polygon: vec![Vec2::ZERO; 3],
            names: vec!["base_test_low_1", "wall10", "roof_test_low_1"],
        };
        let plan = plan(&request(Style::Test, 3, 1), &flat).unwrap();

        assert_eq!(plan.count(Role::Foundation), 3);
        assert_eq!(plan.count(Role::Roof), 1);
        assert!(plan.commands.iter().all(|c| c.module.is_none()));
        assert!(plan.segments.is_empty());
    }

    #[test]
    fn commands_remember_the_rest_of_their_chain() {
        let library = StubLibrary {
            style: Style::Test,
            polygon: rect(6.0, 6.0),
            names: vec!["base_test_low_3", "wall10", "roof_test_low_3", "roof_test_low"],
        };
        let plan = plan(&request(Style::Test, 1, 1), &library).unwrap();

        let roof = plan.commands.iter().find(|c| c.role == Role::Roof).unwrap();
        assert_eq!(roof.keyword, "roof_test_low_3");
        assert_eq!(roof.fallbacks, vec!["roof_test_low".to_string(), "roof".to_string()]);

        for wall in plan.commands.iter().filter(|c| c.module.is_some() && c.role != Role::Engawa) {
            assert_eq!(wall.keyword, "wall10");
            assert!(wall.fallbacks.is_empty());
        }
        assert_eq!(after(&["a".to_string(), "b".to_string()], "a"), vec!["b".to_string()]);
    }

    #[test]
    fn roof_sits_on_top_and_matches_foundation() {
        let library = BuiltinLibrary::new();
        let plan = plan(&request(Style::Stalinist, 4, 77), &library).unwrap();
        let roof = plan.commands.iter().find(|c| c.role == Role::Roof).unwrap();

        assert_relative_eq!(roof.position.y, 4.0 * 3.2 + WALL_BASE_OFFSET, epsilon = 1e-4);
        let id = foundation_id(&plan.foundation.name).unwrap();
        assert_eq!(roof.asset.name, format!("roof_sta_low_{id}"));
        assert_eq!(roof.floor, 4);
    }

    #[test]
    fn roof_falls_back_to_generic_keyword() {
        let library = StubLibrary {
            style: Style::Test,
            polygon: rect(6.0, 6.0),
            names: vec!["base_test_low_3", "wall15", "roof_test_low"],
        };
        let plan = plan(&request(Style::Test, 1, 1), &library).unwrap();
        let roof = plan.commands.iter().find(|c| c.role == Role::Roof).unwrap();
        assert_eq!(roof.keyword, "roof_test_low");
    }

    #[test]
    fn japanese_floors_taper_and_band() {
        let library = BuiltinLibrary::new();
        let plan = plan(&request(Style::Japanese, 3, 12), &library).unwrap();

        let foundations: Vec<_> = plan.commands.iter().filter(|c| c.role == Role::Foundation).collect();
        assert_eq!(foundations.len(), 3);
        for (floor, command) in foundations.iter().enumerate() {
            assert_relative_eq!(command.scale.x, TAPER_FACTOR.powi(floor as i32), epsilon = 1e-6);
            assert_relative_eq!(command.position.y, floor as f32 * 2.7, epsilon = 1e-5);
        }
        assert!(plan.count(Role::Interfloor) > 0);
        assert!(plan.commands.iter()
            .filter(|c| c.role == Role::Engawa)
            .all(|c| c.floor == 0 && (c.position.y - (WALL_BASE_OFFSET - ENGAWA_DROP)).abs() < 1e-5));

        let single = super::plan(&request(Style::Japanese, 1, 12), &library).unwrap();
        assert_eq!(single.count(Role::Interfloor), 0);
    }

    #[test]
    fn transform_maps_local_x_onto_segment() {
        let segment = Segment::new(Vec2::new(1.0, 1.0), Vec2::new(1.0, 5.0));
        let command = PlacementCommand {
            position: Vec3::new(1.0, 0.2, 1.0),
            heading: segment.heading(),
            scale: Vec3::new(1.1, 1.0, 1.0),
            role: Role::Plain,
            keyword: "wall10".to_string(),
            asset: AssetHandle { style: Style::Test, details: DetailTier::Low, name: "wall10".to_string() },
            fallbacks: Vec::new(),
            floor: 0,
            segment: Some(0),
            module: Some(0),
        };
        let end = command.transform().transform_point(Vec3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(end.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(end.z, 1.0 + 2.2, epsilon = 1e-5);
    }

    #[test]
    fn foundation_ids() {
        assert_eq!(foundation_id("base_japanese_low_2"), Some("2"));
        assert_eq!(foundation_id("base_x"), None);
    }
}
