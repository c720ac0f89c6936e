use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::game::units::Unit;

/// Every item the game tracks in an inventory. A closed enum: an unknown
/// item name is a deserialization error, never a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemName {
    // Crops
    Sunflower,
    Potato,
    Pumpkin,
    Carrot,
    Cabbage,
    Beetroot,
    Cauliflower,
    Parsnip,
    Radish,
    Wheat,
    // Seeds
    SunflowerSeed,
    PotatoSeed,
    PumpkinSeed,
    CarrotSeed,
    CabbageSeed,
    BeetrootSeed,
    CauliflowerSeed,
    ParsnipSeed,
    RadishSeed,
    WheatSeed,
    // Foods
    PumpkinSoup,
    Sauerkraut,
    RoastedCauliflower,
    // Tools
    Axe,
    Pickaxe,
    StonePickaxe,
    IronPickaxe,
    // Raw resources
    Wood,
    Stone,
    Iron,
    Gold,
    // Skills (permanent inventory flags)
    GreenThumb,
    BarnManager,
    SeedSpecialist,
    Wrangler,
    Lumberjack,
    Prospector,
    Logger,
    GoldRush,
    // Limited collectibles (minted against on-chain supply)
    SunflowerStatue,
    PotatoStatue,
    ChristmasTree,
    Scarecrow,
    FarmCat,
    FarmDog,
    Gnome,
    ChickenCoop,
    GoldenCauliflower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Crop,
    Seed,
    Food,
    Tool,
    Resource,
    Skill,
    Collectible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profession {
    Farming,
    Gathering,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropDetails {
    pub harvest_seconds: i64,
    pub sell_price: Decimal,
    pub experience: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub token_amount: Decimal,
    pub ingredients: Vec<(ItemName, Decimal)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillRequirement {
    pub profession: Profession,
    pub level: u8,
    pub sibling: ItemName,
    pub prerequisite: Option<ItemName>,
}

use ItemName::*;

pub const ALL_ITEMS: [ItemName; 48] = [
    Sunflower,
    Potato,
    Pumpkin,
    Carrot,
    Cabbage,
    Beetroot,
    Cauliflower,
    Parsnip,
    Radish,
    Wheat,
    SunflowerSeed,
    PotatoSeed,
    PumpkinSeed,
    CarrotSeed,
    CabbageSeed,
    BeetrootSeed,
    CauliflowerSeed,
    ParsnipSeed,
    RadishSeed,
    WheatSeed,
    PumpkinSoup,
    Sauerkraut,
    RoastedCauliflower,
    Axe,
    Pickaxe,
    StonePickaxe,
    IronPickaxe,
    Wood,
    Stone,
    Iron,
    Gold,
    GreenThumb,
    BarnManager,
    SeedSpecialist,
    Wrangler,
    Lumberjack,
    Prospector,
    Logger,
    GoldRush,
    SunflowerStatue,
    PotatoStatue,
    ChristmasTree,
    Scarecrow,
    FarmCat,
    FarmDog,
    Gnome,
    ChickenCoop,
    GoldenCauliflower,
];

/// Items mintable through the supply-checked mint path only.
pub const LIMITED_ITEMS: [ItemName; 9] = [
    SunflowerStatue,
    PotatoStatue,
    ChristmasTree,
    Scarecrow,
    FarmCat,
    FarmDog,
    Gnome,
    ChickenCoop,
    GoldenCauliflower,
];

impl ItemName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sunflower => "Sunflower",
            Potato => "Potato",
            Pumpkin => "Pumpkin",
            Carrot => "Carrot",
            Cabbage => "Cabbage",
            Beetroot => "Beetroot",
            Cauliflower => "Cauliflower",
            Parsnip => "Parsnip",
            Radish => "Radish",
            Wheat => "Wheat",
            SunflowerSeed => "Sunflower Seed",
            PotatoSeed => "Potato Seed",
            PumpkinSeed => "Pumpkin Seed",
            CarrotSeed => "Carrot Seed",
            CabbageSeed => "Cabbage Seed",
            BeetrootSeed => "Beetroot Seed",
            CauliflowerSeed => "Cauliflower Seed",
            ParsnipSeed => "Parsnip Seed",
            RadishSeed => "Radish Seed",
            WheatSeed => "Wheat Seed",
            PumpkinSoup => "Pumpkin Soup",
            Sauerkraut => "Sauerkraut",
            RoastedCauliflower => "Roasted Cauliflower",
            Axe => "Axe",
            Pickaxe => "Pickaxe",
            StonePickaxe => "Stone Pickaxe",
            IronPickaxe => "Iron Pickaxe",
            Wood => "Wood",
            Stone => "Stone",
            Iron => "Iron",
            Gold => "Gold",
            GreenThumb => "Green Thumb",
            BarnManager => "Barn Manager",
            SeedSpecialist => "Seed Specialist",
            Wrangler => "Wrangler",
            Lumberjack => "Lumberjack",
            Prospector => "Prospector",
            Logger => "Logger",
            GoldRush => "Gold Rush",
            SunflowerStatue => "Sunflower Statue",
            PotatoStatue => "Potato Statue",
            ChristmasTree => "Christmas Tree",
            Scarecrow => "Scarecrow",
            FarmCat => "Farm Cat",
            FarmDog => "Farm Dog",
            Gnome => "Gnome",
            ChickenCoop => "Chicken Coop",
            GoldenCauliflower => "Golden Cauliflower",
        }
    }

    pub fn from_name(name: &str) -> Option<ItemName> {
        ALL_ITEMS.iter().copied().find(|item| item.as_str() == name)
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Sunflower | Potato | Pumpkin | Carrot | Cabbage | Beetroot | Cauliflower | Parsnip
            | Radish | Wheat => ItemKind::Crop,
            SunflowerSeed | PotatoSeed | PumpkinSeed | CarrotSeed | CabbageSeed | BeetrootSeed
            | CauliflowerSeed | ParsnipSeed | RadishSeed | WheatSeed => ItemKind::Seed,
            PumpkinSoup | Sauerkraut | RoastedCauliflower => ItemKind::Food,
            Axe | Pickaxe | StonePickaxe | IronPickaxe => ItemKind::Tool,
            Wood | Stone | Iron | Gold => ItemKind::Resource,
            GreenThumb | BarnManager | SeedSpecialist | Wrangler | Lumberjack | Prospector
            | Logger | GoldRush => ItemKind::Skill,
            SunflowerStatue | PotatoStatue | ChristmasTree | Scarecrow | FarmCat | FarmDog
            | Gnome | ChickenCoop | GoldenCauliflower => ItemKind::Collectible,
        }
    }

    /// Tools and raw resources settle as 18-decimal fixed point; everything
    /// else has no fractional on-chain representation.
    pub fn unit(&self) -> Unit {
        match self.kind() {
            ItemKind::Tool | ItemKind::Resource => Unit::Fixed18,
            _ => Unit::Whole,
        }
    }

    /// The ERC-1155 token id this item settles under.
    pub fn token_id(&self) -> u64 {
        match self {
            Sunflower => 1,
            Potato => 2,
            Pumpkin => 3,
            Carrot => 4,
            Cabbage => 5,
            Beetroot => 6,
            Cauliflower => 7,
            Parsnip => 8,
            Radish => 9,
            Wheat => 10,
            SunflowerSeed => 101,
            PotatoSeed => 102,
            PumpkinSeed => 103,
            CarrotSeed => 104,
            CabbageSeed => 105,
            BeetrootSeed => 106,
            CauliflowerSeed => 107,
            ParsnipSeed => 108,
            RadishSeed => 109,
            WheatSeed => 110,
            PumpkinSoup => 201,
            Sauerkraut => 202,
            RoastedCauliflower => 203,
            Axe => 301,
            Pickaxe => 302,
            StonePickaxe => 303,
            IronPickaxe => 304,
            SunflowerStatue => 401,
            PotatoStatue => 402,
            ChristmasTree => 403,
            Scarecrow => 404,
            FarmCat => 405,
            FarmDog => 406,
            Gnome => 407,
            ChickenCoop => 408,
            GoldenCauliflower => 409,
            Wood => 601,
            Stone => 602,
            Iron => 603,
            Gold => 604,
            GreenThumb => 701,
            BarnManager => 702,
            SeedSpecialist => 703,
            Wrangler => 704,
            Lumberjack => 705,
            Prospector => 706,
            Logger => 707,
            GoldRush => 708,
        }
    }

    pub fn crop_details(&self) -> Option<CropDetails> {
        let details = match self {
            Sunflower => CropDetails {
                harvest_seconds: 60,
                sell_price: d(2, 2),
                experience: 1,
            },
            Potato => CropDetails {
                harvest_seconds: 300,
                sell_price: d(14, 2),
                experience: 2,
            },
            Pumpkin => CropDetails {
                harvest_seconds: 1_800,
                sell_price: d(4, 1),
                experience: 3,
            },
            Carrot => CropDetails {
                harvest_seconds: 3_600,
                sell_price: d(8, 1),
                experience: 4,
            },
            Cabbage => CropDetails {
                harvest_seconds: 7_200,
                sell_price: d(15, 1),
                experience: 5,
            },
            Beetroot => CropDetails {
                harvest_seconds: 14_400,
                sell_price: d(28, 1),
                experience: 6,
            },
            Cauliflower => CropDetails {
                harvest_seconds: 28_800,
                sell_price: d(425, 2),
                experience: 7,
            },
            Parsnip => CropDetails {
                harvest_seconds: 43_200,
                sell_price: d(65, 1),
                experience: 8,
            },
            Radish => CropDetails {
                harvest_seconds: 86_400,
                sell_price: d(95, 1),
                experience: 10,
            },
            Wheat => CropDetails {
                harvest_seconds: 86_400,
                sell_price: d(7, 0),
                experience: 10,
            },
            _ => return None,
        };
        Some(details)
    }

    /// Which crop a planted seed grows into.
    pub fn seed_yields(&self) -> Option<ItemName> {
        match self {
            SunflowerSeed => Some(Sunflower),
            PotatoSeed => Some(Potato),
            PumpkinSeed => Some(Pumpkin),
            CarrotSeed => Some(Carrot),
            CabbageSeed => Some(Cabbage),
            BeetrootSeed => Some(Beetroot),
            CauliflowerSeed => Some(Cauliflower),
            ParsnipSeed => Some(Parsnip),
            RadishSeed => Some(Radish),
            WheatSeed => Some(Wheat),
            _ => None,
        }
    }
}

impl fmt::Display for ItemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ItemName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ItemName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        ItemName::from_name(&name)
            .ok_or_else(|| de::Error::custom(format!("unknown item: {name}")))
    }
}

/// The market recipe table. Seeds cost tokens only; tools and foods also
/// consume ingredients; limited collectibles are craftable solely through
/// the supply-checked mint path.
pub fn recipe_of(item: ItemName) -> Option<Recipe> {
    let recipe = match item {
        SunflowerSeed => Recipe {
            token_amount: d(1, 2),
            ingredients: vec![],
        },
        PotatoSeed => Recipe {
            token_amount: d(1, 1),
            ingredients: vec![],
        },
        PumpkinSeed => Recipe {
            token_amount: d(2, 1),
            ingredients: vec![],
        },
        CarrotSeed => Recipe {
            token_amount: d(5, 1),
            ingredients: vec![],
        },
        CabbageSeed => Recipe {
            token_amount: d(1, 0),
            ingredients: vec![],
        },
        BeetrootSeed => Recipe {
            token_amount: d(2, 0),
            ingredients: vec![],
        },
        CauliflowerSeed => Recipe {
            token_amount: d(3, 0),
            ingredients: vec![],
        },
        ParsnipSeed => Recipe {
            token_amount: d(5, 0),
            ingredients: vec![],
        },
        RadishSeed => Recipe {
            token_amount: d(7, 0),
            ingredients: vec![],
        },
        WheatSeed => Recipe {
            token_amount: d(5, 0),
            ingredients: vec![],
        },
        Axe => Recipe {
            token_amount: d(5, 1),
            ingredients: vec![],
        },
        Pickaxe => Recipe {
            token_amount: d(1, 0),
            ingredients: vec![(Wood, d(2, 0))],
        },
        StonePickaxe => Recipe {
            token_amount: d(2, 0),
            ingredients: vec![(Wood, d(3, 0)), (Stone, d(3, 0))],
        },
        IronPickaxe => Recipe {
            token_amount: d(5, 0),
            ingredients: vec![(Wood, d(3, 0)), (Iron, d(3, 0))],
        },
        PumpkinSoup => Recipe {
            token_amount: d(3, 0),
            ingredients: vec![(Pumpkin, d(5, 0))],
        },
        Sauerkraut => Recipe {
            token_amount: d(25, 0),
            ingredients: vec![(Cabbage, d(10, 0))],
        },
        RoastedCauliflower => Recipe {
            token_amount: d(150, 0),
            ingredients: vec![(Cauliflower, d(30, 0))],
        },
        SunflowerStatue => Recipe {
            token_amount: d(5, 0),
            ingredients: vec![(Sunflower, d(100, 0))],
        },
        PotatoStatue => Recipe {
            token_amount: Decimal::ZERO,
            ingredients: vec![(Potato, d(100, 0))],
        },
        ChristmasTree => Recipe {
            token_amount: d(50, 0),
            ingredients: vec![(Wood, d(100, 0))],
        },
        Scarecrow => Recipe {
            token_amount: d(10, 0),
            ingredients: vec![(Wheat, d(50, 0))],
        },
        FarmCat => Recipe {
            token_amount: d(50, 0),
            ingredients: vec![],
        },
        FarmDog => Recipe {
            token_amount: d(75, 0),
            ingredients: vec![],
        },
        Gnome => Recipe {
            token_amount: d(10, 0),
            ingredients: vec![],
        },
        ChickenCoop => Recipe {
            token_amount: d(50, 0),
            ingredients: vec![(Wood, d(10, 0)), (Stone, d(10, 0))],
        },
        GoldenCauliflower => Recipe {
            token_amount: d(100, 0),
            ingredients: vec![(Cauliflower, d(60, 0))],
        },
        _ => return None,
    };
    Some(recipe)
}

/// Skill tree: each profession forks at level 5 and again at level 10, and
/// each fork is mutually exclusive with its sibling.
pub fn skill_requirement(skill: ItemName) -> Option<SkillRequirement> {
    let requirement = match skill {
        GreenThumb => SkillRequirement {
            profession: Profession::Farming,
            level: 5,
            sibling: BarnManager,
            prerequisite: None,
        },
        BarnManager => SkillRequirement {
            profession: Profession::Farming,
            level: 5,
            sibling: GreenThumb,
            prerequisite: None,
        },
        SeedSpecialist => SkillRequirement {
            profession: Profession::Farming,
            level: 10,
            sibling: Wrangler,
            prerequisite: Some(GreenThumb),
        },
        Wrangler => SkillRequirement {
            profession: Profession::Farming,
            level: 10,
            sibling: SeedSpecialist,
            prerequisite: Some(BarnManager),
        },
        Lumberjack => SkillRequirement {
            profession: Profession::Gathering,
            level: 5,
            sibling: Prospector,
            prerequisite: None,
        },
        Prospector => SkillRequirement {
            profession: Profession::Gathering,
            level: 5,
            sibling: Lumberjack,
            prerequisite: None,
        },
        Logger => SkillRequirement {
            profession: Profession::Gathering,
            level: 10,
            sibling: GoldRush,
            prerequisite: Some(Lumberjack),
        },
        GoldRush => SkillRequirement {
            profession: Profession::Gathering,
            level: 10,
            sibling: Logger,
            prerequisite: Some(Prospector),
        },
        _ => return None,
    };
    Some(requirement)
}

/// Per-session craftable stock. Refreshed when a new on-chain session
/// begins; crafts of stocked items are rejected once the entry hits zero.
pub fn initial_stock() -> BTreeMap<ItemName, Decimal> {
    BTreeMap::from([
        (SunflowerSeed, d(400, 0)),
        (PotatoSeed, d(200, 0)),
        (PumpkinSeed, d(100, 0)),
        (CarrotSeed, d(100, 0)),
        (CabbageSeed, d(90, 0)),
        (BeetrootSeed, d(80, 0)),
        (CauliflowerSeed, d(70, 0)),
        (ParsnipSeed, d(50, 0)),
        (RadishSeed, d(40, 0)),
        (WheatSeed, d(40, 0)),
        (Axe, d(50, 0)),
        (Pickaxe, d(30, 0)),
        (StonePickaxe, d(10, 0)),
        (IronPickaxe, d(5, 0)),
        (PumpkinSoup, d(1, 0)),
        (Sauerkraut, d(1, 0)),
        (RoastedCauliflower, d(1, 0)),
    ])
}

fn d(mantissa: i64, scale: u32) -> Decimal {
    Decimal::new(mantissa, scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_names_round_trip_through_strings() {
        for item in ALL_ITEMS {
            assert_eq!(ItemName::from_name(item.as_str()), Some(item));
        }
    }

    #[test]
    fn unknown_item_name_is_rejected() {
        assert_eq!(ItemName::from_name("Moon Cheese"), None);
        let parsed: Result<ItemName, _> = serde_json::from_str("\"Moon Cheese\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn token_ids_are_unique() {
        let mut seen = std::collections::BTreeSet::new();
        for item in ALL_ITEMS {
            assert!(seen.insert(item.token_id()), "duplicate id for {item}");
        }
    }

    #[test]
    fn tools_and_resources_are_fixed18() {
        assert_eq!(Axe.unit(), Unit::Fixed18);
        assert_eq!(Wood.unit(), Unit::Fixed18);
        assert_eq!(Sunflower.unit(), Unit::Whole);
        assert_eq!(SunflowerSeed.unit(), Unit::Whole);
        assert_eq!(Scarecrow.unit(), Unit::Whole);
        assert_eq!(GreenThumb.unit(), Unit::Whole);
    }

    #[test]
    fn every_seed_yields_its_crop() {
        for item in ALL_ITEMS {
            if item.kind() == ItemKind::Seed {
                let crop = item.seed_yields().expect("seed without crop");
                assert_eq!(crop.kind(), ItemKind::Crop);
            }
        }
    }

    #[test]
    fn limited_items_all_have_recipes() {
        for item in LIMITED_ITEMS {
            assert_eq!(item.kind(), ItemKind::Collectible);
            assert!(recipe_of(item).is_some());
        }
    }

    #[test]
    fn skills_form_mutually_exclusive_pairs() {
        for item in ALL_ITEMS {
            if item.kind() == ItemKind::Skill {
                let req = skill_requirement(item).expect("skill without requirement");
                let sibling = skill_requirement(req.sibling).expect("dangling sibling");
                assert_eq!(sibling.sibling, item);
                assert_eq!(sibling.level, req.level);
                assert_eq!(sibling.profession, req.profession);
            }
        }
    }
}
