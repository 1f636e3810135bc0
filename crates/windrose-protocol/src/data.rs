use serde::{Deserialize, Serialize};

use crate::{CivId, Coord, ImprovementKind, Terrain, UnitId, UnitKind, Yield};

/// One civ's view of a tile.
///
/// For a currently-visible tile every field is live; for a tile that is
/// merely discovered, `unit` is omitted and `visible` is false. Tiles the
/// civ has never seen are not represented at all (`None` at the call site).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileData {
    pub terrain: Terrain,
    pub elevation: i32,
    #[serde(rename = "yield")]
    pub yields: Yield,
    pub owner: Option<CivId>,
    pub improvement: Option<ImprovementData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<UnitData>,
    pub visible: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementData {
    pub kind: ImprovementKind,
    pub pillaged: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitData {
    pub id: UnitId,
    pub kind: UnitKind,
    pub owner: CivId,
    pub coords: Coord,
    pub hp: i32,
    pub movement_left: i32,
}

/// Public facts about a civ, broadcast once at game start.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CivData {
    pub id: CivId,
    pub color: String,
}
