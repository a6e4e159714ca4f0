use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::catalog::{
    AttackStyle, CatalogKey, DefenderType, DefenseStyle, Formation, ForwardType, Line,
    MidfielderType, StatLine,
};
use crate::error::TacticError;

const KEY_SEPARATOR: char = '|';

/// A full configuration for one side. Identity is the tuple of its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawTactic")]
pub struct Tactic {
    pub attack_formation: Formation,
    pub defense_formation: Formation,
    pub attack_strategy: AttackStyle,
    pub defense_strategy: DefenseStyle,
    pub forward_archetype: ForwardType,
    pub midfielder_archetype: MidfielderType,
    pub defender_archetype: DefenderType,
}

/// One independently mutable field of a [`Tactic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gene {
    AttackFormation,
    DefenseFormation,
    AttackStrategy,
    DefenseStrategy,
    ForwardArchetype,
    MidfielderArchetype,
    DefenderArchetype,
}

impl Gene {
    pub const ALL: [Self; 7] = [
        Self::AttackFormation,
        Self::DefenseFormation,
        Self::AttackStrategy,
        Self::DefenseStrategy,
        Self::ForwardArchetype,
        Self::MidfielderArchetype,
        Self::DefenderArchetype,
    ];
}

impl Tactic {
    /// Deterministic map key: every field joined with `|` in declaration order.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Copy of `self` with `gene` taken from `other`.
    #[must_use]
    pub fn with_gene_from(self, other: &Tactic, gene: Gene) -> Self {
        let mut child = self;
        match gene {
            Gene::AttackFormation => child.attack_formation = other.attack_formation,
            Gene::DefenseFormation => child.defense_formation = other.defense_formation,
            Gene::AttackStrategy => child.attack_strategy = other.attack_strategy,
            Gene::DefenseStrategy => child.defense_strategy = other.defense_strategy,
            Gene::ForwardArchetype => child.forward_archetype = other.forward_archetype,
            Gene::MidfielderArchetype => child.midfielder_archetype = other.midfielder_archetype,
            Gene::DefenderArchetype => child.defender_archetype = other.defender_archetype,
        }
        child
    }

    /// Stat multipliers for a player standing in `line`.
    pub fn stats_for(&self, line: Line) -> StatLine {
        match line {
            Line::Goalkeeper => StatLine::NEUTRAL,
            Line::Defense => self.defender_archetype.stats(),
            Line::Midfield => self.midfielder_archetype.stats(),
            Line::Attack => self.forward_archetype.stats(),
        }
    }
}

impl fmt::Display for Tactic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}|{}|{}|{}",
            self.attack_formation,
            self.defense_formation,
            self.attack_strategy,
            self.defense_strategy,
            self.forward_archetype,
            self.midfielder_archetype,
            self.defender_archetype
        )
    }
}

impl FromStr for Tactic {
    type Err = TacticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(KEY_SEPARATOR).map(str::trim).collect();
        let [af, df, atk, def, fw, mf, dfe] = parts.as_slice() else {
            return Err(TacticError::MalformedKey(s.to_string()));
        };
        Ok(Self {
            attack_formation: af.parse()?,
            defense_formation: df.parse()?,
            attack_strategy: atk.parse()?,
            defense_strategy: def.parse()?,
            forward_archetype: fw.parse()?,
            midfielder_archetype: mf.parse()?,
            defender_archetype: dfe.parse()?,
        })
    }
}

/// String-keyed tactic as it arrives over the wire, before catalog validation.
///
/// Accepts the short field names used by older clients (`atkFormation`, `fwType`, ...)
/// and a single `formation` for both phases. Missing archetypes fall back to the first
/// entry of their catalog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTactic {
    #[serde(alias = "atkFormation", alias = "formation")]
    pub attack_formation: Option<String>,
    #[serde(alias = "defFormation")]
    pub defense_formation: Option<String>,
    #[serde(alias = "atkStrategy", alias = "attack")]
    pub attack_strategy: Option<String>,
    #[serde(alias = "defStrategy", alias = "defense")]
    pub defense_strategy: Option<String>,
    #[serde(alias = "fwType")]
    pub forward_archetype: Option<String>,
    #[serde(alias = "mfType")]
    pub midfielder_archetype: Option<String>,
    #[serde(alias = "dfType")]
    pub defender_archetype: Option<String>,
}

fn required<T>(value: Option<&str>) -> Result<T, TacticError>
where
    T: CatalogKey + FromStr<Err = TacticError>,
{
    value
        .ok_or(TacticError::MissingField(T::FIELD))?
        .parse()
}

fn or_first<T>(value: Option<&str>) -> Result<T, TacticError>
where
    T: CatalogKey + FromStr<Err = TacticError>,
{
    match value {
        Some(key) => key.parse(),
        None => Ok(T::ALL[0]),
    }
}

impl TryFrom<RawTactic> for Tactic {
    type Error = TacticError;

    fn try_from(raw: RawTactic) -> Result<Self, Self::Error> {
        let attack_formation: Formation = required(raw.attack_formation.as_deref())?;
        let defense_formation = match raw.defense_formation.as_deref() {
            Some(key) => key.parse()?,
            None => attack_formation,
        };
        Ok(Self {
            attack_formation,
            defense_formation,
            attack_strategy: required(raw.attack_strategy.as_deref())?,
            defense_strategy: required(raw.defense_strategy.as_deref())?,
            forward_archetype: or_first(raw.forward_archetype.as_deref())?,
            midfielder_archetype: or_first(raw.midfielder_archetype.as_deref())?,
            defender_archetype: or_first(raw.defender_archetype.as_deref())?,
        })
    }
}
