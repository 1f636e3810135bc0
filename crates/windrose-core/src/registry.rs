use windrose_protocol::{
    ImprovementKind, KnowledgeBranch, MovementClass, PromotionClass, Terrain, UnitKind, Yield,
};

/// Static facts about one terrain type.
#[derive(Clone, Copy, Debug)]
pub struct TerrainSpec {
    pub base_yield: Yield,
    pub height: i32,
    /// Movement cost to enter, per movement class: `[land, water]`.
    /// 0 means impassable. Air movement always costs 1 and skips the table.
    pub movement_cost: [i32; 2],
}

/// Static facts about one improvement kind.
#[derive(Clone, Copy, Debug)]
pub struct ImprovementSpec {
    pub yields: Yield,
    pub store_capacity: Yield,
    pub height: i32,
    pub natural: bool,
    /// What a worksite errand must accumulate to become this improvement.
    /// `None` means it cannot be constructed (settled, natural or the
    /// worksite itself).
    pub build_cost: Option<Yield>,
}

/// Static facts about one unit kind.
#[derive(Clone, Copy, Debug)]
pub struct UnitSpec {
    pub promotion: PromotionClass,
    pub movement: MovementClass,
    pub hp: i32,
    pub moves: i32,
    pub vision_range: i32,
    pub attack_range: Option<i32>,
    pub train_cost: Yield,
}

/// Static facts about one knowledge branch.
#[derive(Clone, Copy, Debug)]
pub struct KnowledgeSpec {
    /// Points a single tile can accumulate in this branch.
    pub max_points: i32,
    pub research_cost: Yield,
    /// Points credited to the hosting tile when a research errand completes.
    pub completion_points: i32,
}

/// Read-only rules tables, built once and injected into the world.
#[derive(Clone, Debug)]
pub struct Registry {
    terrains: [TerrainSpec; Terrain::COUNT],
    improvements: [ImprovementSpec; ImprovementKind::COUNT],
    units: [UnitSpec; UnitKind::COUNT],
    knowledge: [KnowledgeSpec; KnowledgeBranch::COUNT],
}

impl Registry {
    /// The standard rule set.
    pub fn standard() -> Self {
        use ImprovementKind as I;
        use Terrain as T;
        use UnitKind as U;

        let mut terrains = [TerrainSpec {
            base_yield: Yield::zero(),
            height: 0,
            movement_cost: [0, 0],
        }; T::COUNT];
        let mut terrain = |t: T, spec: TerrainSpec| terrains[t as usize] = spec;
        terrain(
            T::Grassland,
            TerrainSpec {
                base_yield: Yield::food(2),
                height: 0,
                movement_cost: [1, 0],
            },
        );
        terrain(
            T::Plains,
            TerrainSpec {
                base_yield: Yield::food(1) + Yield::production(1),
                height: 0,
                movement_cost: [1, 0],
            },
        );
        terrain(
            T::Desert,
            TerrainSpec {
                base_yield: Yield::zero(),
                height: 0,
                movement_cost: [1, 0],
            },
        );
        terrain(
            T::Tundra,
            TerrainSpec {
                base_yield: Yield::food(1),
                height: 0,
                movement_cost: [1, 0],
            },
        );
        terrain(
            T::Hills,
            TerrainSpec {
                base_yield: Yield::production(2),
                height: 1,
                movement_cost: [2, 0],
            },
        );
        terrain(
            T::Mountain,
            TerrainSpec {
                base_yield: Yield::zero(),
                height: 3,
                movement_cost: [0, 0],
            },
        );
        terrain(
            T::River,
            TerrainSpec {
                base_yield: Yield::food(2) + Yield::gold(1),
                height: 0,
                movement_cost: [2, 0],
            },
        );
        terrain(
            T::Coastal,
            TerrainSpec {
                base_yield: Yield::food(1) + Yield::gold(1),
                height: 0,
                movement_cost: [0, 1],
            },
        );
        terrain(
            T::FrozenCoastal,
            TerrainSpec {
                base_yield: Yield::zero(),
                height: 0,
                movement_cost: [0, 0],
            },
        );
        terrain(
            T::Ocean,
            TerrainSpec {
                base_yield: Yield::food(1),
                height: 0,
                movement_cost: [0, 1],
            },
        );
        terrain(
            T::FrozenOcean,
            TerrainSpec {
                base_yield: Yield::zero(),
                height: 0,
                movement_cost: [0, 0],
            },
        );

        let mut improvements = [ImprovementSpec {
            yields: Yield::zero(),
            store_capacity: Yield::zero(),
            height: 0,
            natural: false,
            build_cost: None,
        }; I::COUNT];
        let mut improvement = |i: I, spec: ImprovementSpec| improvements[i as usize] = spec;
        improvement(
            I::Settlement,
            ImprovementSpec {
                yields: Yield::food(1) + Yield::production(1),
                store_capacity: Yield {
                    food: 20,
                    production: 20,
                    gold: 10,
                    science: 10,
                },
                height: 1,
                natural: false,
                build_cost: None,
            },
        );
        improvement(
            I::Encampment,
            ImprovementSpec {
                yields: Yield::production(1),
                store_capacity: Yield {
                    food: 10,
                    production: 10,
                    gold: 5,
                    science: 5,
                },
                height: 1,
                natural: false,
                build_cost: Some(Yield::production(8)),
            },
        );
        improvement(
            I::Farm,
            ImprovementSpec {
                yields: Yield::food(3),
                store_capacity: Yield::food(10),
                height: 0,
                natural: false,
                build_cost: Some(Yield::food(5)),
            },
        );
        improvement(
            I::Mine,
            ImprovementSpec {
                yields: Yield::production(3),
                store_capacity: Yield::production(10),
                height: 0,
                natural: false,
                build_cost: Some(Yield::production(6)),
            },
        );
        improvement(
            I::Campus,
            ImprovementSpec {
                yields: Yield::science(2),
                store_capacity: Yield::science(10) + Yield::gold(5),
                height: 1,
                natural: false,
                build_cost: Some(Yield::production(10)),
            },
        );
        improvement(
            I::Forest,
            ImprovementSpec {
                yields: Yield::zero(),
                store_capacity: Yield::production(5),
                height: 2,
                natural: true,
                build_cost: None,
            },
        );
        improvement(
            I::Worksite,
            ImprovementSpec {
                yields: Yield::zero(),
                store_capacity: Yield::zero(),
                height: 0,
                natural: false,
                build_cost: None,
            },
        );

        let mut units = [UnitSpec {
            promotion: PromotionClass::Civilian,
            movement: MovementClass::Land,
            hp: 0,
            moves: 0,
            vision_range: 0,
            attack_range: None,
            train_cost: Yield::zero(),
        }; U::COUNT];
        let mut unit = |u: U, spec: UnitSpec| units[u as usize] = spec;
        unit(
            U::Settler,
            UnitSpec {
                promotion: PromotionClass::Civilian,
                movement: MovementClass::Land,
                hp: 10,
                moves: 2,
                vision_range: 2,
                attack_range: None,
                train_cost: Yield::food(10) + Yield::production(10),
            },
        );
        unit(
            U::Builder,
            UnitSpec {
                promotion: PromotionClass::Civilian,
                movement: MovementClass::Land,
                hp: 10,
                moves: 2,
                vision_range: 2,
                attack_range: None,
                train_cost: Yield::food(5) + Yield::production(5),
            },
        );
        unit(
            U::Scout,
            UnitSpec {
                promotion: PromotionClass::Recon,
                movement: MovementClass::Land,
                hp: 10,
                moves: 3,
                vision_range: 2,
                attack_range: None,
                train_cost: Yield::production(5),
            },
        );
        unit(
            U::Warrior,
            UnitSpec {
                promotion: PromotionClass::Melee,
                movement: MovementClass::Land,
                hp: 20,
                moves: 2,
                vision_range: 2,
                attack_range: Some(1),
                train_cost: Yield::production(8) + Yield::food(2),
            },
        );
        unit(
            U::Slinger,
            UnitSpec {
                promotion: PromotionClass::Ranged,
                movement: MovementClass::Land,
                hp: 15,
                moves: 2,
                vision_range: 2,
                attack_range: Some(2),
                train_cost: Yield::production(7),
            },
        );
        unit(
            U::Galley,
            UnitSpec {
                promotion: PromotionClass::Melee,
                movement: MovementClass::Water,
                hp: 20,
                moves: 3,
                vision_range: 2,
                attack_range: Some(1),
                train_cost: Yield::production(10),
            },
        );

        let knowledge = [
            // Agriculture
            KnowledgeSpec {
                max_points: 40,
                research_cost: Yield::science(5),
                completion_points: 10,
            },
            // Masonry
            KnowledgeSpec {
                max_points: 40,
                research_cost: Yield::science(6),
                completion_points: 10,
            },
            // Seafaring
            KnowledgeSpec {
                max_points: 30,
                research_cost: Yield::science(8),
                completion_points: 8,
            },
            // Astronomy
            KnowledgeSpec {
                max_points: 60,
                research_cost: Yield::science(10),
                completion_points: 12,
            },
        ];

        Self {
            terrains,
            improvements,
            units,
            knowledge,
        }
    }

    #[inline]
    pub fn terrain(&self, t: Terrain) -> &TerrainSpec {
        &self.terrains[t as usize]
    }

    #[inline]
    pub fn improvement(&self, kind: ImprovementKind) -> &ImprovementSpec {
        &self.improvements[kind as usize]
    }

    #[inline]
    pub fn unit(&self, kind: UnitKind) -> &UnitSpec {
        &self.units[kind as usize]
    }

    #[inline]
    pub fn knowledge(&self, branch: KnowledgeBranch) -> &KnowledgeSpec {
        &self.knowledge[branch as usize]
    }

    /// Cost to enter a tile of terrain `t` for the given movement class, or
    /// `None` when impassable. Air movement costs 1 everywhere.
    pub fn movement_cost(&self, t: Terrain, mode: MovementClass) -> Option<i32> {
        let cost = match mode {
            MovementClass::Air => return Some(1),
            MovementClass::Land => self.terrain(t).movement_cost[0],
            MovementClass::Water => self.terrain(t).movement_cost[1],
        };
        (cost > 0).then_some(cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mountains_are_impassable_except_by_air() {
        let registry = Registry::standard();
        assert_eq!(
            registry.movement_cost(Terrain::Mountain, MovementClass::Land),
            None
        );
        assert_eq!(
            registry.movement_cost(Terrain::Mountain, MovementClass::Water),
            None
        );
        assert_eq!(
            registry.movement_cost(Terrain::Mountain, MovementClass::Air),
            Some(1)
        );
    }

    #[test]
    fn natural_improvements_have_no_build_cost() {
        let registry = Registry::standard();
        let forest = registry.improvement(ImprovementKind::Forest);
        assert!(forest.natural);
        assert!(forest.build_cost.is_none());
        assert!(forest.yields.is_zero());
    }

    #[test]
    fn constructed_improvements_have_costs_and_capacity() {
        let registry = Registry::standard();
        for kind in [
            ImprovementKind::Farm,
            ImprovementKind::Mine,
            ImprovementKind::Campus,
            ImprovementKind::Encampment,
        ] {
            let spec = registry.improvement(kind);
            assert!(spec.build_cost.is_some(), "{kind:?}");
            assert!(!spec.store_capacity.is_zero(), "{kind:?}");
        }
    }
}
