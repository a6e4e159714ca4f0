//! The searchable tactic space: the cartesian product of one value list per gene.
//!
//! Tactics are enumerated by mixed-radix index with the attacking formation as the most
//! significant digit and the defender archetype as the least significant one.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{
    AttackStyle, CatalogKey, DefenderType, DefenseStyle, Formation, ForwardType, Gene,
    MidfielderType, Tactic,
};
use crate::error::SearchError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TacticSpace {
    /// Shared by the attacking and defending formation genes.
    pub formations: Vec<Formation>,
    pub attack_strategies: Vec<AttackStyle>,
    pub defense_strategies: Vec<DefenseStyle>,
    pub forward_archetypes: Vec<ForwardType>,
    pub midfielder_archetypes: Vec<MidfielderType>,
    pub defender_archetypes: Vec<DefenderType>,
}

impl Default for TacticSpace {
    fn default() -> Self {
        Self::full()
    }
}

fn pick<T: Copy, R: Rng + ?Sized>(values: &[T], rng: &mut R) -> T {
    values[rng.random_range(0..values.len())]
}

fn position<T: PartialEq>(values: &[T], value: &T) -> Option<usize> {
    values.iter().position(|candidate| candidate == value)
}

fn check_values<T: CatalogKey>(values: &[T]) -> Result<(), SearchError> {
    if values.is_empty() {
        return Err(SearchError::InvalidConfig(format!(
            "tactic space has no {} values",
            T::FIELD
        )));
    }
    for (i, value) in values.iter().enumerate() {
        if values[..i].contains(value) {
            return Err(SearchError::InvalidConfig(format!(
                "duplicate {} '{}' in tactic space",
                T::FIELD,
                value.key()
            )));
        }
    }
    Ok(())
}

impl TacticSpace {
    /// Every catalog entry for every gene.
    pub fn full() -> Self {
        Self {
            formations: Formation::ALL.to_vec(),
            attack_strategies: AttackStyle::ALL.to_vec(),
            defense_strategies: DefenseStyle::ALL.to_vec(),
            forward_archetypes: ForwardType::ALL.to_vec(),
            midfielder_archetypes: MidfielderType::ALL.to_vec(),
            defender_archetypes: DefenderType::ALL.to_vec(),
        }
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        check_values(&self.formations)?;
        check_values(&self.attack_strategies)?;
        check_values(&self.defense_strategies)?;
        check_values(&self.forward_archetypes)?;
        check_values(&self.midfielder_archetypes)?;
        check_values(&self.defender_archetypes)
    }

    fn radices(&self) -> [usize; 7] {
        [
            self.formations.len(),
            self.formations.len(),
            self.attack_strategies.len(),
            self.defense_strategies.len(),
            self.forward_archetypes.len(),
            self.midfielder_archetypes.len(),
            self.defender_archetypes.len(),
        ]
    }

    /// Number of distinct tactics in the space.
    pub fn len(&self) -> usize {
        self.radices().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Tactic> {
        if index >= self.len() {
            return None;
        }
        let mut digits = [0usize; 7];
        let mut rest = index;
        for (digit, radix) in digits.iter_mut().zip(self.radices()).rev() {
            *digit = rest % radix;
            rest /= radix;
        }
        let [af, df, atk, def, fw, mf, dfe] = digits;
        Some(Tactic {
            attack_formation: self.formations[af],
            defense_formation: self.formations[df],
            attack_strategy: self.attack_strategies[atk],
            defense_strategy: self.defense_strategies[def],
            forward_archetype: self.forward_archetypes[fw],
            midfielder_archetype: self.midfielder_archetypes[mf],
            defender_archetype: self.defender_archetypes[dfe],
        })
    }

    /// Enumeration index of `tactic`, or `None` if any field lies outside this space.
    pub fn index_of(&self, tactic: &Tactic) -> Option<usize> {
        let digits = [
            position(&self.formations, &tactic.attack_formation)?,
            position(&self.formations, &tactic.defense_formation)?,
            position(&self.attack_strategies, &tactic.attack_strategy)?,
            position(&self.defense_strategies, &tactic.defense_strategy)?,
            position(&self.forward_archetypes, &tactic.forward_archetype)?,
            position(&self.midfielder_archetypes, &tactic.midfielder_archetype)?,
            position(&self.defender_archetypes, &tactic.defender_archetype)?,
        ];
        Some(
            digits
                .iter()
                .zip(self.radices())
                .fold(0, |acc, (digit, radix)| acc * radix + digit),
        )
    }

    pub fn contains(&self, tactic: &Tactic) -> bool {
        self.index_of(tactic).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = Tactic> + '_ {
        (0..self.len()).filter_map(move |index| self.get(index))
    }

    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Tactic {
        Tactic {
            attack_formation: pick(&self.formations, rng),
            defense_formation: pick(&self.formations, rng),
            attack_strategy: pick(&self.attack_strategies, rng),
            defense_strategy: pick(&self.defense_strategies, rng),
            forward_archetype: pick(&self.forward_archetypes, rng),
            midfielder_archetype: pick(&self.midfielder_archetypes, rng),
            defender_archetype: pick(&self.defender_archetypes, rng),
        }
    }

    /// Redraws one gene of `tactic` uniformly from this space.
    #[must_use]
    pub fn redraw_gene<R: Rng + ?Sized>(&self, tactic: Tactic, gene: Gene, rng: &mut R) -> Tactic {
        let mut out = tactic;
        match gene {
            Gene::AttackFormation => out.attack_formation = pick(&self.formations, rng),
            Gene::DefenseFormation => out.defense_formation = pick(&self.formations, rng),
            Gene::AttackStrategy => out.attack_strategy = pick(&self.attack_strategies, rng),
            Gene::DefenseStrategy => out.defense_strategy = pick(&self.defense_strategies, rng),
            Gene::ForwardArchetype => out.forward_archetype = pick(&self.forward_archetypes, rng),
            Gene::MidfielderArchetype => {
                out.midfielder_archetype = pick(&self.midfielder_archetypes, rng);
            }
            Gene::DefenderArchetype => {
                out.defender_archetype = pick(&self.defender_archetypes, rng);
            }
        }
        out
    }
}
