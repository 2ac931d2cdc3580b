/// Log categories a caller can independently gate via the `debug CAT 0|1`
/// protocol command. Each is just a boolean checked before an otherwise-free
/// `log::trace!` call — the actual filtering still goes through `log`/
/// `env_logger`, this just adds a second, coarser axis on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Search,
    Attack,
    Initiative,
    Parse,
}

impl LogCategory {
    pub fn keyword(self) -> &'static str {
        match self {
            LogCategory::Search => "search",
            LogCategory::Attack => "attack",
            LogCategory::Initiative => "initiative",
            LogCategory::Parse => "parse",
        }
    }
}

impl TryFrom<&str> for LogCategory {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "search" => Ok(LogCategory::Search),
            "attack" => Ok(LogCategory::Attack),
            "initiative" => Ok(LogCategory::Initiative),
            "parse" => Ok(LogCategory::Parse),
            other => Err(format!("unknown debug category: {other}")),
        }
    }
}

/// The four category gates plus the per-ply counters BMAI threads through
/// its rollout loop. One instance lives on the `Driver` for the whole
/// session; `Bmai::choose` takes it by `&mut` reference.
#[derive(Debug, Default, Clone)]
pub struct Stats {
    search: bool,
    attack: bool,
    initiative: bool,
    parse: bool,
    pub sims_run: u64,
    pub moves_culled: u64,
    pub moves_considered: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, cat: LogCategory, on: bool) {
        match cat {
            LogCategory::Search => self.search = on,
            LogCategory::Attack => self.attack = on,
            LogCategory::Initiative => self.initiative = on,
            LogCategory::Parse => self.parse = on,
        }
    }

    pub fn enabled(&self, cat: LogCategory) -> bool {
        match cat {
            LogCategory::Search => self.search,
            LogCategory::Attack => self.attack,
            LogCategory::Initiative => self.initiative,
            LogCategory::Parse => self.parse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_default_off() {
        let stats = Stats::new();
        assert!(!stats.enabled(LogCategory::Search));
    }

    #[test]
    fn set_then_enabled_round_trips() {
        let mut stats = Stats::new();
        stats.set(LogCategory::Attack, true);
        assert!(stats.enabled(LogCategory::Attack));
        assert!(!stats.enabled(LogCategory::Search));
    }

    #[test]
    fn keyword_parses_back() {
        for cat in [LogCategory::Search, LogCategory::Attack, LogCategory::Initiative, LogCategory::Parse] {
            assert_eq!(LogCategory::try_from(cat.keyword()).unwrap(), cat);
        }
    }
}
