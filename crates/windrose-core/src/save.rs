use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use windrose_protocol::{
    CityId, CivId, Coord, ImprovementKind, KnowledgeBranch, Terrain, TraderId, UnitId, UnitKind,
    Yield,
};

use crate::improvement::{Improvement, WorkErrand};
use crate::trader::{Heading, Route, Trader};
use crate::{City, Civilization, EntityStore, Map, Registry, ResourceStore, TileKnowledge, Unit, World};

/// A shape the importer cannot reconstruct. Fatal at load time: no partial
/// state is ever published.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SaveError {
    #[error("tile grid does not match the declared dimensions")]
    BadDimensions,
    #[error("tile watcher table does not match the civ roster")]
    BadWatchers,
    #[error("trader route is shorter than two tiles")]
    DegenerateRoute,
    #[error("trader route endpoint is outside the map at {x},{y}")]
    DanglingRoute { x: i32, y: i32 },
    #[error("trader endpoint has no improvement at {x},{y}")]
    MissingEndpoint { x: i32, y: i32 },
    #[error("two units share the tile at {x},{y}")]
    OccupiedSlot { x: i32, y: i32 },
    #[error("unit stands outside the map at {x},{y}")]
    UnplacedUnit { x: i32, y: i32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldExport {
    pub width: u32,
    pub height: u32,
    pub turn: u32,
    pub civs: Vec<CivExport>,
    pub map: MapExport,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapExport {
    pub tiles: Vec<TileExport>,
    pub cities: Vec<CityExport>,
    pub traders: Vec<TraderExport>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileExport {
    pub terrain: Terrain,
    pub height: i32,
    pub base_yield: Yield,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvement: Option<ImprovementExport>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub knowledge: BTreeMap<KnowledgeBranch, i32>,
    pub seen_by: u32,
    pub watchers: Vec<i32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementExport {
    pub kind: ImprovementKind,
    pub pillaged: bool,
    pub base_yield: Yield,
    pub store_value: Yield,
    pub store_capacity: Yield,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errand: Option<WorkErrand>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityExport {
    pub id: CityId,
    pub name: String,
    pub owner: CivId,
    pub center: Coord,
    pub owned: Vec<Coord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CivExport {
    pub id: CivId,
    pub color: String,
    pub units: Vec<UnitExport>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitExport {
    pub id: UnitId,
    pub kind: UnitKind,
    pub owner: CivId,
    pub coords: Option<Coord>,
    pub hp: i32,
    pub moves_left: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraderExport {
    pub id: TraderId,
    pub owner: CivId,
    pub path: Vec<Coord>,
    pub distance: i32,
    pub capacity: Yield,
    pub carried: Yield,
    pub expired: bool,
    pub position: usize,
    pub heading: Heading,
}

/// Export the whole simulation. Entity arenas serialize in slot order so
/// the output is deterministic.
pub fn export_world(world: &World) -> WorldExport {
    let map = &world.map;
    let tiles = (0..map.len())
        .map(|index| {
            let tile = map.tile(index).expect("index in bounds");
            let (seen_by, watchers) = tile.visibility_state();
            TileExport {
                terrain: tile.terrain,
                height: tile.height,
                base_yield: tile.base_yield,
                improvement: tile.improvement.as_ref().map(|imp| ImprovementExport {
                    kind: imp.kind,
                    pillaged: imp.pillaged,
                    base_yield: imp.base_yield,
                    store_value: imp.store.value(),
                    store_capacity: imp.store.capacity(),
                    errand: imp.errand.clone(),
                }),
                knowledge: tile.knowledge.entries(),
                seen_by,
                watchers: watchers.to_vec(),
            }
        })
        .collect();

    let cities = world
        .cities
        .iter_ordered()
        .map(|(id, city)| CityExport {
            id,
            name: city.name.clone(),
            owner: city.owner,
            center: city.center,
            owned: city
                .claimed_indices()
                .iter()
                .filter_map(|&index| map.coord_at(index as usize))
                .collect(),
        })
        .collect();

    let traders = map
        .traders
        .iter_ordered()
        .map(|(id, trader)| TraderExport {
            id,
            owner: trader.owner,
            path: trader.route.path.clone(),
            distance: trader.route.distance,
            capacity: trader.capacity,
            carried: trader.carried,
            expired: trader.expired,
            position: trader.position(),
            heading: trader.heading(),
        })
        .collect();

    let civs = world
        .civs
        .iter()
        .map(|civ| CivExport {
            id: civ.id,
            color: civ.color.clone(),
            units: civ
                .units
                .iter()
                .filter_map(|&id| world.units.get(id).map(|unit| (id, unit)))
                .map(|(id, unit)| UnitExport {
                    id,
                    kind: unit.kind,
                    owner: unit.owner,
                    coords: unit.coords,
                    hp: unit.hp,
                    moves_left: unit.moves_left,
                })
                .collect(),
        })
        .collect();

    WorldExport {
        width: map.width(),
        height: map.height(),
        turn: world.turn,
        civs,
        map: MapExport {
            tiles,
            cities,
            traders,
        },
    }
}

/// Reconstruct a world from an export, bit-equivalently: city ownership is
/// re-applied over each city's owned coords, units re-occupy their slots,
/// and traders reattach to the improvements at their route endpoints.
pub fn import_world(export: WorldExport, registry: Registry) -> Result<World, SaveError> {
    let civ_count = export.civs.len();
    let expected = (export.width as usize) * (export.height as usize);
    if export.map.tiles.len() != expected {
        return Err(SaveError::BadDimensions);
    }

    let terrain: Vec<Terrain> = export.map.tiles.iter().map(|t| t.terrain).collect();
    let mut map = Map::new(export.width, export.height, civ_count, terrain, &registry);

    for (index, tile_export) in export.map.tiles.into_iter().enumerate() {
        if tile_export.watchers.len() != civ_count {
            return Err(SaveError::BadWatchers);
        }
        let tile = map.tile_mut(index).ok_or(SaveError::BadDimensions)?;
        tile.height = tile_export.height;
        tile.base_yield = tile_export.base_yield;
        tile.knowledge = TileKnowledge::from_entries(tile_export.knowledge);
        tile.restore_visibility(tile_export.seen_by, tile_export.watchers);
        tile.improvement = tile_export.improvement.map(|imp| Improvement {
            kind: imp.kind,
            pillaged: imp.pillaged,
            base_yield: imp.base_yield,
            store: ResourceStore::with_value(imp.store_value, imp.store_capacity),
            errand: imp.errand,
            consumers: Vec::new(),
            suppliers: Vec::new(),
        });
    }

    // Cities: rebuild the arena, then re-run ownership with overwrite off
    // so the first claim wins exactly as it did originally.
    let mut city_entries = Vec::new();
    for city_export in export.map.cities {
        let mut city = City::new(city_export.name, city_export.owner, city_export.center);
        for &coord in &city_export.owned {
            if let Some(index) = map.index_of(coord) {
                city.claim_index(index);
            }
        }
        city_entries.push((city_export.id, city, city_export.owned));
    }
    let cities = EntityStore::from_entries(
        city_entries
            .iter()
            .map(|(id, city, _)| (*id, city.clone()))
            .collect(),
    );
    for (id, _, owned) in &city_entries {
        for &coord in owned {
            map.set_tile_owner(coord, *id, false);
        }
    }

    // Civs and units.
    let mut civs = Vec::with_capacity(civ_count);
    let mut unit_entries: Vec<(UnitId, Unit)> = Vec::new();
    for civ_export in export.civs {
        let mut civilization = Civilization::new(civ_export.id);
        civilization.color = civ_export.color;
        for unit_export in civ_export.units {
            civilization.units.push(unit_export.id);
            let mut unit = Unit::new(unit_export.kind, unit_export.owner, &registry);
            unit.coords = unit_export.coords;
            unit.hp = unit_export.hp;
            unit.moves_left = unit_export.moves_left;
            unit_entries.push((unit_export.id, unit));
        }
        civs.push(civilization);
    }
    for (id, unit) in &unit_entries {
        let Some(coords) = unit.coords else {
            continue;
        };
        let Some(index) = map.index_of(coords) else {
            return Err(SaveError::UnplacedUnit {
                x: coords.x,
                y: coords.y,
            });
        };
        let tile = map.tile_mut(index).ok_or(SaveError::BadDimensions)?;
        if tile.unit.is_some() {
            return Err(SaveError::OccupiedSlot {
                x: coords.x,
                y: coords.y,
            });
        }
        tile.unit = Some(*id);
    }
    let units = EntityStore::from_entries(unit_entries);

    // Traders reattach through their route endpoints.
    let mut trader_entries = Vec::new();
    for trader_export in export.map.traders {
        if trader_export.path.len() < 2 {
            return Err(SaveError::DegenerateRoute);
        }
        let first = trader_export.path[0];
        let last = *trader_export.path.last().expect("len checked");
        let producer = map.index_of(first).ok_or(SaveError::DanglingRoute {
            x: first.x,
            y: first.y,
        })?;
        let sink = map.index_of(last).ok_or(SaveError::DanglingRoute {
            x: last.x,
            y: last.y,
        })?;
        for (index, coord) in [(producer, first), (sink, last)] {
            if map
                .tile(index)
                .and_then(|tile| tile.improvement.as_ref())
                .is_none()
            {
                return Err(SaveError::MissingEndpoint {
                    x: coord.x,
                    y: coord.y,
                });
            }
        }

        let mut trader = Trader::new(
            trader_export.owner,
            Route {
                path: trader_export.path,
                distance: trader_export.distance,
            },
            producer,
            sink,
            trader_export.capacity,
        );
        trader.carried = trader_export.carried;
        trader.expired = trader_export.expired;
        trader.restore_progress(trader_export.position, trader_export.heading);

        let id = trader_export.id;
        if let Some(imp) = map
            .tile_mut(producer)
            .and_then(|tile| tile.improvement.as_mut())
        {
            imp.consumers.push(id);
        }
        if let Some(imp) = map.tile_mut(sink).and_then(|tile| tile.improvement.as_mut()) {
            imp.suppliers.push(id);
        }
        trader_entries.push((id, trader));
    }
    map.traders = EntityStore::from_entries(trader_entries);

    // Reconstruction pushed ownership notices; a fresh world starts with an
    // empty queue.
    map.take_updates();

    Ok(World {
        registry,
        map,
        civs,
        units,
        cities,
        turn: export.turn,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use windrose_protocol::ImprovementKind;

    fn populated_world() -> World {
        let registry = Registry::standard();
        let terrain = vec![Terrain::Grassland; 100];
        let map = Map::new(10, 10, 2, terrain, &registry);
        let mut world = World::new(map, registry);

        world
            .settle_city(CivId(0), Coord::new(4, 4), "Kestrel".into())
            .unwrap();
        world
            .spawn_unit(CivId(0), UnitKind::Scout, Coord::new(6, 6))
            .unwrap();
        world
            .map
            .get_mut(Coord::new(4, 4))
            .unwrap()
            .improvement
            .as_mut()
            .unwrap()
            .store
            .incr(Yield::food(8));
        world
            .start_construction(CivId(0), Coord::new(4, 5), ImprovementKind::Farm)
            .unwrap();
        world.run_turn();
        world.map.take_updates();
        world
    }

    #[test]
    fn round_trip_is_bit_equivalent() {
        let world = populated_world();
        let first = export_world(&world);
        let reimported = import_world(first.clone(), Registry::standard()).unwrap();
        let second = export_world(&reimported);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }

    #[test]
    fn traders_reattach_to_their_endpoints() {
        let world = populated_world();
        let export = export_world(&world);
        assert!(!export.map.traders.is_empty());

        let reimported = import_world(export, Registry::standard()).unwrap();
        for (id, trader) in reimported.map.traders.iter_ordered() {
            let producer = reimported
                .map
                .tile(trader.producer)
                .and_then(|t| t.improvement.as_ref())
                .expect("producer improvement");
            assert!(producer.consumers.contains(&id));
            let sink = reimported
                .map
                .tile(trader.sink)
                .and_then(|t| t.improvement.as_ref())
                .expect("sink improvement");
            assert!(sink.suppliers.contains(&id));
        }
    }

    #[test]
    fn bad_dimensions_are_fatal() {
        let world = populated_world();
        let mut export = export_world(&world);
        export.map.tiles.pop();
        assert!(matches!(
            import_world(export, Registry::standard()),
            Err(SaveError::BadDimensions)
        ));
    }

    #[test]
    fn dangling_trader_endpoint_is_fatal() {
        let world = populated_world();
        let mut export = export_world(&world);
        if let Some(trader) = export.map.traders.first_mut() {
            trader.path[0] = Coord::new(0, 99);
        }
        assert!(matches!(
            import_world(export, Registry::standard()),
            Err(SaveError::DanglingRoute { .. })
        ));
    }
}
