//! Pipeline rollup: per-contact assured/probable revenue and mission
//! counts, derived by scanning every mission linked to the contact.
//!
//! The rollup is always recomputed from scratch; nothing is cached and
//! nothing is invalidated. Missing amounts and probabilities count as zero.

use serde::Serialize;

use crate::db::DbMission;
use crate::types::MissionStatus;

/// Aggregated revenue figures for one contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Rollup {
    /// Sum of amounts of won missions (status project or finished).
    pub assured: f64,
    /// Sum of `amount * probability / 100` over open missions.
    pub probable: f64,
    pub opportunity: u32,
    pub project: u32,
    pub nogo: u32,
    pub finished: u32,
}

impl Rollup {
    /// Compute the rollup for `contact_code` over a set of missions.
    /// Missions not linked to the contact are skipped.
    pub fn compute(contact_code: &str, missions: &[DbMission]) -> Rollup {
        let mut rollup = Rollup::default();
        for mission in missions {
            if !mission.contacts.iter().any(|c| c == contact_code) {
                continue;
            }
            match mission.status {
                MissionStatus::Opportunity => rollup.opportunity += 1,
                MissionStatus::Project => rollup.project += 1,
                MissionStatus::NoGo => rollup.nogo += 1,
                MissionStatus::Finished => rollup.finished += 1,
            }
            if mission.status == MissionStatus::NoGo {
                continue;
            }
            let amount = mission.amount.unwrap_or(0.0);
            if mission.status.is_assured() {
                rollup.assured += amount;
            } else {
                let probability = mission.probability.unwrap_or(0) as f64;
                rollup.probable += amount * probability / 100.0;
            }
        }
        rollup
    }
}
