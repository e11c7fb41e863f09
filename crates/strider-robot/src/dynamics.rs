//! Mass and inertia of the loaded model, and validated writes to them.

use strider_core::{
    BodyId, ConfigError, DynamicsParam, LinkId, SimError, SimulatorLink, StriderError,
};

use crate::links::LinkLayout;

/// Masses and inertia diagonals as loaded from the robot model.
///
/// Leg entries list the leg links first, then the motor links.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelDynamics {
    pub base_masses: Vec<f32>,
    pub leg_masses: Vec<f32>,
    pub base_inertias: Vec<[f32; 3]>,
    pub leg_inertias: Vec<[f32; 3]>,
}

impl ModelDynamics {
    pub fn record<S: SimulatorLink>(
        sim: &S,
        body: BodyId,
        layout: &LinkLayout,
    ) -> Result<Self, SimError> {
        let read = |ids: &[LinkId]| -> Result<(Vec<f32>, Vec<[f32; 3]>), SimError> {
            let mut masses = Vec::with_capacity(ids.len());
            let mut inertias = Vec::with_capacity(ids.len());
            for &id in ids {
                let info = sim.dynamics_info(body, id)?;
                masses.push(info.mass);
                inertias.push(info.local_inertia_diagonal);
            }
            Ok((masses, inertias))
        };
        let (base_masses, base_inertias) = read(&layout.chassis)?;
        let (leg_masses, leg_inertias) = read(&layout.leg_and_motor())?;
        Ok(Self {
            base_masses,
            leg_masses,
            base_inertias,
            leg_inertias,
        })
    }
}

/// Set the mass of each link in `links`.
pub fn write_masses<S: SimulatorLink>(
    sim: &mut S,
    body: BodyId,
    links: &[LinkId],
    masses: &[f32],
    what: &'static str,
) -> Result<(), StriderError> {
    ConfigError::check_len(what, links.len(), masses.len())?;
    for (&link, &mass) in links.iter().zip(masses) {
        sim.set_dynamics_param(body, link, DynamicsParam::Mass(mass))?;
    }
    Ok(())
}

/// Set the inertia diagonal of each link in `links`.
///
/// Every value is checked before the first write.
pub fn write_inertias<S: SimulatorLink>(
    sim: &mut S,
    body: BodyId,
    links: &[LinkId],
    inertias: &[[f32; 3]],
    what: &'static str,
) -> Result<(), StriderError> {
    ConfigError::check_len(what, links.len(), inertias.len())?;
    if let Some(index) = inertias.iter().position(|i| i.iter().any(|v| *v < 0.0)) {
        return Err(ConfigError::NegativeInertia { what, index }.into());
    }
    for (&link, &inertia) in links.iter().zip(inertias) {
        sim.set_dynamics_param(body, link, DynamicsParam::LocalInertiaDiagonal(inertia))?;
    }
    Ok(())
}

/// Set one dynamics parameter on every link in `links`.
pub fn write_all<S: SimulatorLink>(
    sim: &mut S,
    body: BodyId,
    links: &[LinkId],
    param: DynamicsParam,
) -> Result<(), SimError> {
    for &link in links {
        sim.set_dynamics_param(body, link, param)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
