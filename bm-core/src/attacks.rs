use std::fmt;

/// The six kinds of attack a die may be able to perform or be vulnerable to.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum AttackKind {
    Power,
    Skill,
    Speed,
    Berserk,
    Shadow,
    Trip,
}

impl AttackKind {
    pub const ALL: [AttackKind; 6] = [
        AttackKind::Power,
        AttackKind::Skill,
        AttackKind::Speed,
        AttackKind::Berserk,
        AttackKind::Shadow,
        AttackKind::Trip,
    ];

    /// 1-attacker-to-1-target kinds.
    pub fn is_one_to_one(self) -> bool {
        matches!(self, AttackKind::Power | AttackKind::Shadow | AttackKind::Trip)
    }

    /// N-attackers-to-1-target kind.
    pub fn is_many_to_one(self) -> bool {
        matches!(self, AttackKind::Skill)
    }

    /// 1-attacker-to-N-targets kinds.
    pub fn is_one_to_many(self) -> bool {
        matches!(self, AttackKind::Berserk | AttackKind::Speed)
    }

    fn bit(self) -> u8 {
        match self {
            AttackKind::Power => 1 << 0,
            AttackKind::Skill => 1 << 1,
            AttackKind::Speed => 1 << 2,
            AttackKind::Berserk => 1 << 3,
            AttackKind::Shadow => 1 << 4,
            AttackKind::Trip => 1 << 5,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            AttackKind::Power => "power",
            AttackKind::Skill => "skill",
            AttackKind::Speed => "speed",
            AttackKind::Berserk => "berserk",
            AttackKind::Shadow => "shadow",
            AttackKind::Trip => "trip",
        }
    }
}

impl fmt::Display for AttackKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

impl TryFrom<&str> for AttackKind {
    type Error = String;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "power" => Ok(AttackKind::Power),
            "skill" => Ok(AttackKind::Skill),
            "speed" => Ok(AttackKind::Speed),
            "berserk" => Ok(AttackKind::Berserk),
            "shadow" => Ok(AttackKind::Shadow),
            "trip" => Ok(AttackKind::Trip),
            other => Err(format!("unknown attack kind: {other}")),
        }
    }
}

/// A bitset over [`AttackKind`], used both as "attacks this die can perform"
/// and, with the same representation, as "attack kinds this die is
/// vulnerable to" (scenario 4's `valid.can_be_attacked`).
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq)]
pub struct AttackMask(u8);

impl AttackMask {
    pub fn empty() -> Self {
        AttackMask(0)
    }

    pub fn all() -> Self {
        AttackKind::ALL.iter().fold(AttackMask::empty(), |acc, k| acc.with(*k))
    }

    pub fn with(self, kind: AttackKind) -> Self {
        AttackMask(self.0 | kind.bit())
    }

    pub fn without(self, kind: AttackKind) -> Self {
        AttackMask(self.0 & !kind.bit())
    }

    pub fn contains(self, kind: AttackKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn can_perform(self, kind: AttackKind) -> bool {
        self.contains(kind)
    }

    /// Alias used at vulnerability call sites, matching the wording of
    /// scenario 4 (`valid.can_be_attacked(skill)`).
    pub fn can_be_attacked(self, kind: AttackKind) -> bool {
        self.contains(kind)
    }

    pub fn iter(self) -> impl Iterator<Item = AttackKind> {
        AttackKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}
