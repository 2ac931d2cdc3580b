use std::fmt;

/// States of the per-round state machine.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Phase {
    Preround,
    Initiative,
    InitiativeChance,
    InitiativeFocus,
    Fight,
    RoundEnd,
    Reserve,
    GameOver,
}

impl Phase {
    pub fn keyword(self) -> &'static str {
        match self {
            Phase::Preround => "preround",
            Phase::Initiative => "initiative",
            Phase::InitiativeChance => "chance",
            Phase::InitiativeFocus => "focus",
            Phase::Fight => "fight",
            Phase::RoundEnd => "round-end",
            Phase::Reserve => "reserve",
            Phase::GameOver => "gameover",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

impl TryFrom<&str> for Phase {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "preround" => Ok(Phase::Preround),
            "initiative" => Ok(Phase::Initiative),
            "chance" => Ok(Phase::InitiativeChance),
            "focus" => Ok(Phase::InitiativeFocus),
            "fight" => Ok(Phase::Fight),
            "round-end" => Ok(Phase::RoundEnd),
            "reserve" => Ok(Phase::Reserve),
            "gameover" => Ok(Phase::GameOver),
            other => Err(format!("unknown phase: {other}")),
        }
    }
}
