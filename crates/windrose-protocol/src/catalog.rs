use serde::{Deserialize, Serialize};

/// Closed set of terrain types. The wire uses `snake_case` names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Grassland,
    Plains,
    Desert,
    Tundra,
    Hills,
    Mountain,
    River,
    Coastal,
    FrozenCoastal,
    Ocean,
    FrozenOcean,
}

impl Terrain {
    pub const COUNT: usize = 11;

    /// Whether a city may claim ground here. Water, ice, peaks and river
    /// channels cannot be settled or owned.
    pub fn is_settleable(self) -> bool {
        !matches!(
            self,
            Terrain::Ocean
                | Terrain::FrozenOcean
                | Terrain::Mountain
                | Terrain::Coastal
                | Terrain::FrozenCoastal
                | Terrain::River
        )
    }

    /// Whether an improvement may stand here.
    pub fn is_buildable(self) -> bool {
        !matches!(
            self,
            Terrain::Ocean | Terrain::FrozenOcean | Terrain::Mountain
        )
    }
}

/// Closed set of improvement kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementKind {
    Settlement,
    Encampment,
    Farm,
    Mine,
    Campus,
    Forest,
    Worksite,
}

impl ImprovementKind {
    pub const COUNT: usize = 7;
}

/// Closed set of unit kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Settler,
    Builder,
    Scout,
    Warrior,
    Slinger,
    Galley,
}

impl UnitKind {
    pub const COUNT: usize = 6;
}

/// Closed set of knowledge branches a tile can accumulate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeBranch {
    Agriculture,
    Masonry,
    Seafaring,
    Astronomy,
}

impl KnowledgeBranch {
    pub const COUNT: usize = 4;

    pub const ALL: [KnowledgeBranch; Self::COUNT] = [
        KnowledgeBranch::Agriculture,
        KnowledgeBranch::Masonry,
        KnowledgeBranch::Seafaring,
        KnowledgeBranch::Astronomy,
    ];
}

/// What a unit is for, controlling which actions apply to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionClass {
    Civilian,
    Melee,
    Ranged,
    Recon,
}

/// Which movement-cost column applies to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementClass {
    Land,
    Water,
    Air,
}

/// The three errand families an improvement can host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrandKind {
    Construction,
    UnitTraining,
    Research,
}
