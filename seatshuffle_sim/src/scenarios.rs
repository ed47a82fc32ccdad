//! Verification scenarios for the shuffle engine.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    /// Two students, two seats, both orderings admissible
    Pair,

    /// Three students, two seats, both modes refuse
    Mismatch,

    /// 34 students on a 6x7 grid with an aisle, full shuffle bijection
    Classroom,

    /// Step through a whole roster to Complete
    Incremental,

    /// Reset from every phase returns to Idle
    Reset,

    /// Full shuffle lands each student in each seat ~1/n of the time
    Uniformity,

    /// Same uniformity check for the incremental mode
    StepUniformity,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Pair,
            ScenarioId::Mismatch,
            ScenarioId::Classroom,
            ScenarioId::Incremental,
            ScenarioId::Reset,
            ScenarioId::Uniformity,
            ScenarioId::StepUniformity,
        ]
    }

    /// Returns the fast, non-statistical scenarios.
    pub fn structural() -> Vec<ScenarioId> {
        Self::all()
            .into_iter()
            .filter(|s| !s.is_statistical())
            .collect()
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Pair => "pair",
            ScenarioId::Mismatch => "mismatch",
            ScenarioId::Classroom => "classroom",
            ScenarioId::Incremental => "incremental",
            ScenarioId::Reset => "reset",
            ScenarioId::Uniformity => "uniformity",
            ScenarioId::StepUniformity => "step_uniformity",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Pair => "[A, B] on [[1,1]] yields exactly A|B or B|A",
            ScenarioId::Mismatch => "3 students on 2 seats: SeatCountMismatch(3, 2), grid left blank",
            ScenarioId::Classroom => "34 students on a 6x7 grid with an aisle, every seat filled once",
            ScenarioId::Incremental => "n steps fill every seat, then step is rejected",
            ScenarioId::Reset => "reset from Idle, Stepping and Complete returns to Idle",
            ScenarioId::Uniformity => "full shuffle occupancy converges to 1/n",
            ScenarioId::StepUniformity => "incremental occupancy converges to 1/n",
        }
    }

    /// Returns true if this scenario samples many runs.
    pub fn is_statistical(&self) -> bool {
        matches!(self, ScenarioId::Uniformity | ScenarioId::StepUniformity)
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pair" => Ok(ScenarioId::Pair),
            "mismatch" => Ok(ScenarioId::Mismatch),
            "classroom" => Ok(ScenarioId::Classroom),
            "incremental" | "step" => Ok(ScenarioId::Incremental),
            "reset" => Ok(ScenarioId::Reset),
            "uniformity" => Ok(ScenarioId::Uniformity),
            "step_uniformity" | "stepuniformity" => Ok(ScenarioId::StepUniformity),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for scenario in ScenarioId::all() {
            assert_eq!(scenario.name().parse::<ScenarioId>(), Ok(scenario));
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("Step_Uniformity".parse::<ScenarioId>(), Ok(ScenarioId::StepUniformity));
        assert_eq!("step".parse::<ScenarioId>(), Ok(ScenarioId::Incremental));
        assert!("chaos".parse::<ScenarioId>().is_err());
    }

    #[test]
    fn test_structural_excludes_statistical() {
        let structural = ScenarioId::structural();
        assert_eq!(structural.len(), 5);
        assert!(structural.iter().all(|s| !s.is_statistical()));
    }
}
