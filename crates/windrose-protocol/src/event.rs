use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{CivData, CivId, Coord, TileData};

/// All sim → client events.
///
/// The wire shape is fixed: every event encodes as a two-element array
/// `[name, args]` where `args` is itself an array, e.g.
/// `["tileUpdate", [{"x":3,"y":4}, {...}]]`. The hand-written serde impls
/// below produce exactly that shape for any self-describing format.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// `["beginGame", [[width, height], civCount]]`
    BeginGame { size: (u32, u32), civ_count: u32 },
    /// `["civData", [{"<civId>": CivData}]]`
    CivData { civs: BTreeMap<CivId, CivData> },
    /// `["setMap", [[TileData | null, ...]]]` — row-major, one slot per tile.
    SetMap { tiles: Vec<Option<TileData>> },
    /// `["beginTurn", []]`
    BeginTurn,
    /// `["endTurn", []]`
    EndTurn,
    /// `["tileUpdate", [coords, TileData | null]]`
    TileUpdate { at: Coord, tile: Option<TileData> },
    /// `["unitPositions", [[coords, ...]]]`
    UnitPositions { coords: Vec<Coord> },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::BeginGame { .. } => "beginGame",
            Event::CivData { .. } => "civData",
            Event::SetMap { .. } => "setMap",
            Event::BeginTurn => "beginTurn",
            Event::EndTurn => "endTurn",
            Event::TileUpdate { .. } => "tileUpdate",
            Event::UnitPositions { .. } => "unitPositions",
        }
    }
}

impl Serialize for Event {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(self.name())?;
        match self {
            Event::BeginGame { size, civ_count } => {
                pair.serialize_element(&(size, civ_count))?;
            }
            Event::CivData { civs } => {
                pair.serialize_element(&(civs,))?;
            }
            Event::SetMap { tiles } => {
                pair.serialize_element(&(tiles,))?;
            }
            Event::BeginTurn | Event::EndTurn => {
                pair.serialize_element(&EMPTY_ARGS)?;
            }
            Event::TileUpdate { at, tile } => {
                pair.serialize_element(&(at, tile))?;
            }
            Event::UnitPositions { coords } => {
                pair.serialize_element(&(coords,))?;
            }
        }
        pair.end()
    }
}

const EMPTY_ARGS: [u8; 0] = [];

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EventVisitor;

        impl<'de> Visitor<'de> for EventVisitor {
            type Value = Event;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a [name, args] event pair")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Event, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let name: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;

                fn args<'de, A, T>(seq: &mut A) -> Result<T, A::Error>
                where
                    A: SeqAccess<'de>,
                    T: Deserialize<'de>,
                {
                    seq.next_element()?
                        .ok_or_else(|| de::Error::custom("missing event args"))
                }

                let event = match name.as_str() {
                    "beginGame" => {
                        let (size, civ_count): ((u32, u32), u32) = args(&mut seq)?;
                        Event::BeginGame { size, civ_count }
                    }
                    "civData" => {
                        let (civs,): (BTreeMap<CivId, CivData>,) = args(&mut seq)?;
                        Event::CivData { civs }
                    }
                    "setMap" => {
                        let (tiles,): (Vec<Option<TileData>>,) = args(&mut seq)?;
                        Event::SetMap { tiles }
                    }
                    "beginTurn" => {
                        let _: de::IgnoredAny = args(&mut seq)?;
                        Event::BeginTurn
                    }
                    "endTurn" => {
                        let _: de::IgnoredAny = args(&mut seq)?;
                        Event::EndTurn
                    }
                    "tileUpdate" => {
                        let (at, tile): (Coord, Option<TileData>) = args(&mut seq)?;
                        Event::TileUpdate { at, tile }
                    }
                    "unitPositions" => {
                        let (coords,): (Vec<Coord>,) = args(&mut seq)?;
                        Event::UnitPositions { coords }
                    }
                    other => {
                        return Err(de::Error::unknown_variant(
                            other,
                            &[
                                "beginGame",
                                "civData",
                                "setMap",
                                "beginTurn",
                                "endTurn",
                                "tileUpdate",
                                "unitPositions",
                            ],
                        ))
                    }
                };
                Ok(event)
            }
        }

        deserializer.deserialize_seq(EventVisitor)
    }
}
