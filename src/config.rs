// Configuration file, All measurements in real-world meters (1 unit = 1 meter)
// This controls the initial build parameters and the layout tuning constants

pub const INITIAL_SEED: u64 = 101;
pub const INITIAL_FLOORS: usize = 1;
pub const SEED_MAX: u64 = 999_999_999;

// Module catalog (meters), one facade module is one of these lengths
pub const WALL_LENGTHS: [f32; 3] = [2.0, 2.4, 3.0];
pub const SCALE_TOLERANCE: f32 = 0.25;     // accepted |scale - 1| when stretching modules
pub const MODULE_KEYWORD_FACTOR: f32 = 5.0; // wall12 = 2.4m, asset names use fifths of a meter

// Footprint extraction
pub const TOP_EDGE_TOLERANCE: f32 = 0.001;
pub const FOUNDATION_THICKNESS: f32 = 0.2;  // slab height, walls stand on top of it

// Floor layout
pub const DEFAULT_FLOOR_HEIGHT: f32 = 2.7;
pub const WALL_BASE_OFFSET: f32 = 0.2;      // walls start this far above the floor elevation
pub const LOWEST_TIER_ELEVATION: f32 = 0.21; // walls at or below this are on the street level
pub const ENGAWA_DROP: f32 = 0.2;           // engawa decks sit below the wall base
pub const TAPER_FACTOR: f32 = 0.9;          // per-floor footprint scale for tapering styles

// Facade role probabilities (uniform draw in [0, 1))
pub const DOOR_THRESHOLD: f32 = 0.80;       // r > this -> door
pub const WINDOW_THRESHOLD: f32 = 0.40;     // r > this -> window
pub const BALCONY_CHANCE: f32 = 0.25;       // second floor, r < this -> balcony
pub const UPPER_WINDOW_THRESHOLD: f32 = 0.5; // veranda style upper floors, r > this -> window
pub const ENGAWA_CONTINUE_CHANCE: f32 = 0.8;
pub const ENGAWA_START_CHANCE: f32 = 0.2;

// Separates the asset variant stream from the role stream
pub const ASSET_STREAM_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

// Placeholder module geometry
pub const WALL_DEPTH: f32 = 0.2;
pub const ENGAWA_DEPTH: f32 = 0.9;
pub const INTERFLOOR_HEIGHT: f32 = 0.15;
pub const ROOF_RISE: f32 = 1.6;
