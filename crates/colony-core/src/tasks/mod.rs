//! Concrete colonist activities
//!
//! Each module provides a work policy plus a constructor that wraps it in
//! the right bracket and returns a ready-to-run [`Activity`].

pub mod collect_resources;
pub mod dig_local;
pub mod maintenance;
pub mod research;
pub mod sleep;
pub mod teach;
pub mod toggle_power;

pub use collect_resources::{CollectResources, COLLECTING_RESOURCES};
pub use dig_local::{DigLocal, DIGGING};
pub use maintenance::{MaintainStructure, MAINTAINING};
pub use research::{PerformResearch, RESEARCHING};
pub use sleep::{Sleep, SLEEPING};
pub use teach::{TeachSkill, TEACHING};
pub use toggle_power::{ToggleFuelPowerSource, TOGGLING_POWER};

use crate::activity::{Activity, IndoorActivity, OutdoorActivity, SiteHazard, WorkPolicy};
use crate::components::StructureId;
use crate::config::SimConfig;
use crate::context::{AccidentTarget, ActivityContext};

/// Work-rate multiplier for a skill level.
///
/// Unskilled colonists work at half speed; each level past the first adds 20%.
pub fn skill_rate_modifier(skill: u32) -> f64 {
    match skill {
        0 => 0.5,
        1 => 1.0,
        level => 1.0 + 0.2 * f64::from(level),
    }
}

/// Run `work` at a structure: an EVA when the structure stands outside,
/// indoor work otherwise. Unknown structures yield an already-complete
/// activity.
///
/// Outside, accidents fall on the suit at the EVA rate; indoors they fall on
/// the structure at the maintenance rate.
pub(crate) fn at_structure<W: WorkPolicy + 'static>(
    work: W,
    id: &StructureId,
    config: &SimConfig,
    ctx: &mut dyn ActivityContext,
) -> Activity {
    match ctx.structure_site(id) {
        Some(site) if site.outside => {
            OutdoorActivity::new(work, site.location, config.eva, config.walking)
                .eva_variant()
                .with_site_hazard(SiteHazard::new(
                    AccidentTarget::Suit,
                    config.accidents.eva_base_rate,
                ))
                .start(ctx)
        }
        Some(site) => IndoorActivity::new(work, site.location, config.walking)
            .with_site_hazard(SiteHazard::new(
                AccidentTarget::Structure(id.clone()),
                config.accidents.maintenance_base_rate,
            ))
            .start(ctx),
        None => {
            let here = ctx.position();
            Activity::abandoned(
                Box::new(IndoorActivity::new(work, here, config.walking)),
                ctx,
            )
        }
    }
}
