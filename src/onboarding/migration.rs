//! Migration Table
//!
//! Maps a step id persisted under an older sequence definition onto the
//! semantically equivalent step of the current sequence. Each schema version
//! bump ships one [`VersionTable`]; the [`Migrator`] chains them so a store
//! several versions behind is walked forward hop by hop.
//!
//! Migration is a pure function. Writing the result back (new id together
//! with the bumped version) is the controller's job.

use crate::error::{OnboardingError, Result};
use crate::onboarding::step::Step;

/// Schema version of the sequence in [`crate::onboarding::step::SEQUENCE`]
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Old-id → new-id mapping for a single version transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionTable {
    /// Version the ids on the left were written under; maps to `from_version + 1`
    pub from_version: u32,
    pub entries: &'static [(u32, u32)],
}

impl VersionTable {
    pub const fn new(from_version: u32, entries: &'static [(u32, u32)]) -> Self {
        Self {
            from_version,
            entries,
        }
    }

    pub fn lookup(&self, old_id: u32) -> Option<u32> {
        self.entries
            .iter()
            .find(|(old, _)| *old == old_id)
            .map(|(_, new)| *new)
    }
}

/// v0 sequence: welcome, introduction, usecases, permissions, instructions, complete.
/// v1 moved permissions ahead of the new provider steps and pushed usecases behind them.
pub const V0_TO_V1: VersionTable = VersionTable::new(
    0,
    &[
        (0, 0), // welcome
        (1, 1), // introduction
        (2, 5), // usecases
        (3, 2), // permissions
        (4, 6), // instructions
        (5, 7), // complete
    ],
);

pub const BUILTIN_TABLES: &[VersionTable] = &[V0_TO_V1];

/// A validated chain of version tables ending at `current_version`
#[derive(Debug, Clone)]
pub struct Migrator {
    current_version: u32,
    tables: Vec<VersionTable>,
}

impl Default for Migrator {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Migrator {
    /// The chain shipped with this build
    pub fn builtin() -> Self {
        Self {
            current_version: CURRENT_SCHEMA_VERSION,
            tables: BUILTIN_TABLES.to_vec(),
        }
    }

    /// Build a chain, checking that the tables cover every version from the
    /// oldest supported one up to `current_version` without gaps, and that the
    /// final hop only targets ids of the current sequence.
    pub fn new(current_version: u32, mut tables: Vec<VersionTable>) -> Result<Self> {
        tables.sort_by_key(|t| t.from_version);

        if let Some(first) = tables.first() {
            for (offset, table) in tables.iter().enumerate() {
                let expected = u32::try_from(offset)
                    .ok()
                    .and_then(|offset| first.from_version.checked_add(offset))
                    .ok_or_else(|| {
                        OnboardingError::InvalidMigration(format!(
                            "chain from version {} overflows the version range",
                            first.from_version
                        ))
                    })?;
                if table.from_version != expected {
                    return Err(OnboardingError::InvalidMigration(format!(
                        "expected a table from version {}, found one from version {}",
                        expected, table.from_version
                    )));
                }
            }
        }

        match tables.last() {
            Some(last) => {
                let upgrades_to = last.from_version.checked_add(1).ok_or_else(|| {
                    OnboardingError::InvalidMigration(format!(
                        "table from version {} has no successor version",
                        last.from_version
                    ))
                })?;
                if upgrades_to != current_version {
                    return Err(OnboardingError::InvalidMigration(format!(
                        "last table upgrades to version {}, current version is {}",
                        upgrades_to, current_version
                    )));
                }
                if let Some((old, new)) = last
                    .entries
                    .iter()
                    .find(|(_, new)| Step::from_id(*new).is_none())
                {
                    return Err(OnboardingError::InvalidMigration(format!(
                        "table from version {} maps {} to unknown step id {}",
                        last.from_version, old, new
                    )));
                }
            }
            None if current_version > 0 => {
                return Err(OnboardingError::InvalidMigration(
                    "no tables for a non-zero schema version".to_string(),
                ));
            }
            None => {}
        }

        Ok(Self {
            current_version,
            tables,
        })
    }

    pub fn current_version(&self) -> u32 {
        self.current_version
    }

    pub fn is_stale(&self, stored_version: u32) -> bool {
        stored_version < self.current_version
    }

    fn table_for(&self, version: u32) -> Option<&VersionTable> {
        self.tables.iter().find(|t| t.from_version == version)
    }

    /// Map `stored_step_id` written under `stored_version` onto the current sequence.
    ///
    /// Current or newer versions pass through untouched. Any id without a
    /// mapping, or a version older than the oldest table, lands on the first step.
    pub fn migrate(&self, stored_version: u32, stored_step_id: u32) -> u32 {
        if stored_version >= self.current_version {
            return stored_step_id;
        }

        let mut step_id = stored_step_id;
        for version in stored_version..self.current_version {
            match self.table_for(version).and_then(|t| t.lookup(step_id)) {
                Some(next) => step_id = next,
                None => {
                    tracing::warn!(
                        from_version = version,
                        step_id,
                        "No migration entry for persisted step, falling back to first step"
                    );
                    return Step::first().id();
                }
            }
        }
        step_id
    }
}

/// [`Migrator::migrate`] against the built-in chain
pub fn migrate(stored_version: u32, stored_step_id: u32) -> u32 {
    Migrator::builtin().migrate(stored_version, stored_step_id)
}
