/// Application constants

// Replay validation window
pub const MAX_SESSION_MS: i64 = 120_000; // one batch may cover at most 2 minutes
pub const MILLISECONDS_HUMANLY_POSSIBLE: i64 = 50;
pub const MAX_CLOCK_SKEW_MS: i64 = 60_000; // events this far ahead of "now" are rejected
pub const MAX_EVENT_AGE_MS: i64 = 300_000; // events older than 5 minutes are rejected
pub const GATHER_COOLDOWN_MS: i64 = 1_000; // same-kind cadence floor for chop/mine

// Anti-fraud gate
pub const MAX_FLAGGED_ACTIONS: i32 = 50;
pub const CAPTCHA_PERIOD_SECONDS: i64 = 7_200;

// Settlement
pub const SETTLEMENT_DEADLINE_SECONDS: i64 = 300;

// Withdraw tax tiers (basis points), keyed by requested SFL amount
pub const WITHDRAW_TAX_TIERS: [(u64, u32); 4] = [(10, 3000), (100, 2500), (1000, 2000), (5000, 1500)];
pub const WITHDRAW_TAX_FLOOR_BPS: u32 = 1000;

// Land expansion: plot ranges unlocked by holding the named item
pub const BASE_FIELD_COUNT: u32 = 5;
pub const TIER_TWO_FIELD_COUNT: u32 = 10; // requires Pumpkin Soup
pub const TIER_THREE_FIELD_COUNT: u32 = 16; // requires Sauerkraut
pub const MAX_FIELD_COUNT: u32 = 22; // requires Roasted Cauliflower

// Resource node recovery (seconds)
pub const TREE_RECOVERY_SECONDS: i64 = 7_200;
pub const STONE_RECOVERY_SECONDS: i64 = 14_400;
pub const IRON_RECOVERY_SECONDS: i64 = 28_800;
pub const GOLD_RECOVERY_SECONDS: i64 = 86_400;

// Profession level thresholds; index = level - 1
pub const LEVEL_EXPERIENCE: [i64; 10] = [0, 5, 20, 50, 100, 175, 280, 450, 700, 1000];

// API version
pub const API_VERSION: &str = "v1";
