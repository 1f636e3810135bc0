use serde::{Deserialize, Serialize};

use crate::{Coord, ImprovementKind, KnowledgeBranch, UnitId, UnitKind};

/// All player → server actions. Every action is validated in full before
/// any state is touched; an action that fails a gate is dropped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    SettleCity {
        at: Coord,
        name: String,
    },
    BuildImprovement {
        at: Coord,
        kind: ImprovementKind,
    },
    StartConstruction {
        at: Coord,
        target: ImprovementKind,
    },
    TrainUnit {
        at: Coord,
        kind: UnitKind,
    },
    StartResearch {
        at: Coord,
        branch: KnowledgeBranch,
    },
    MoveUnit {
        unit: UnitId,
        to: Coord,
    },
    EndTurn,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_round_trip_as_tagged_json() {
        let action = Action::StartConstruction {
            at: Coord::new(3, 3),
            target: ImprovementKind::Farm,
        };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"type\":\"startConstruction\""));
        assert_eq!(serde_json::from_str::<Action>(&json).unwrap(), action);
    }
}
