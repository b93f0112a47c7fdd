/*
    upfg, Unified Powered Flight Guidance for ascent vehicles
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::cosmic::STD_GRAVITY;
use crate::errors::{GuidanceError, InvalidStageSpecSnafu};
use crate::io::ConfigRepr;
use serde::{Deserialize, Serialize};
use snafu::ensure;
use std::fmt;

/// Defines an engine with a vacuum isp and a nominal thrust.
#[allow(non_snake_case)]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Engine {
    /// The thrust is to be provided in Newtons
    pub thrust_N: f64,
    /// The Isp is to be provided in seconds
    pub isp_s: f64,
}

impl Engine {
    #[allow(non_snake_case)]
    pub fn new(thrust_N: f64, isp_s: f64) -> Self {
        Self { thrust_N, isp_s }
    }

    /// Returns the exhaust velocity v_e in meters per second
    pub fn exhaust_velocity_m_s(&self) -> f64 {
        self.isp_s * STD_GRAVITY
    }

    /// Returns the propellant mass flow in kg/s at the provided throttle fraction
    pub fn mass_flow_kg_s(&self, throttle: f64) -> f64 {
        self.thrust_N * throttle / self.exhaust_velocity_m_s()
    }
}

/// How a stage is flown by guidance.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThrustMode {
    /// Full thrust until cutoff, acceleration grows as mass depletes
    #[default]
    ConstantThrust,
    /// Throttled down to hold the acceleration at the stage's g-limit
    ConstantAcceleration,
    /// Unpowered, contributes no velocity
    Coast,
}

/// Combined performance of all the engines of a stage.
#[allow(non_snake_case)]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StagePerformance {
    pub thrust_N: f64,
    pub mass_flow_kg_s: f64,
    /// Effective exhaust velocity, i.e. thrust over total mass flow
    pub exhaust_velocity_m_s: f64,
}

/// A stage of the launch vehicle, as seen by guidance.
///
/// The first stage of a stage list is the one currently burning. Its `total_mass_kg` is the mass at
/// ignition: guidance uses the navigated mass instead for acceleration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    #[serde(default)]
    pub mode: ThrustMode,
    pub engines: Vec<Engine>,
    /// Total mass at ignition, including upper stages and payload, in kg
    pub total_mass_kg: f64,
    /// Usable propellant, in kg
    pub prop_mass_kg: f64,
    /// Acceleration limit in multiples of standard gravity, only used in constant acceleration
    #[serde(default)]
    pub g_limit: f64,
    /// Minimum throttle, as a fraction (or as a percentage if greater than one)
    #[serde(default)]
    pub min_throttle: f64,
    /// Nominal throttle, as a fraction (or as a percentage if greater than one)
    #[serde(default = "full_throttle")]
    pub throttle: f64,
}

fn full_throttle() -> f64 {
    1.0
}

fn as_fraction(value: f64) -> f64 {
    if value > 1.0 {
        value / 100.0
    } else {
        value
    }
}

impl Stage {
    /// Initializes a constant thrust stage at full throttle.
    pub fn new(engines: Vec<Engine>, total_mass_kg: f64, prop_mass_kg: f64) -> Self {
        Self {
            mode: ThrustMode::ConstantThrust,
            engines,
            total_mass_kg,
            prop_mass_kg,
            g_limit: 0.0,
            min_throttle: 0.0,
            throttle: 1.0,
        }
    }

    /// Initializes a constant thrust stage from its dry and propellant masses.
    pub fn from_dry_mass(engines: Vec<Engine>, dry_mass_kg: f64, prop_mass_kg: f64) -> Self {
        Self::new(engines, dry_mass_kg + prop_mass_kg, prop_mass_kg)
    }

    /// Switches this stage to constant acceleration at `g_limit` times standard gravity.
    pub fn with_acceleration_limit(mut self, g_limit: f64, min_throttle: f64) -> Self {
        self.mode = ThrustMode::ConstantAcceleration;
        self.g_limit = g_limit;
        self.min_throttle = min_throttle;
        self
    }

    /// Turns this stage into a coast phase.
    pub fn coasting(mut self) -> Self {
        self.mode = ThrustMode::Coast;
        self
    }

    /// Adds payload mass carried through this stage's burn.
    pub fn with_payload(mut self, payload_kg: f64) -> Self {
        self.total_mass_kg += payload_kg;
        self
    }

    pub fn dry_mass_kg(&self) -> f64 {
        self.total_mass_kg - self.prop_mass_kg
    }

    pub fn throttle_fraction(&self) -> f64 {
        as_fraction(self.throttle)
    }

    pub fn min_throttle_fraction(&self) -> f64 {
        as_fraction(self.min_throttle)
    }

    /// Acceleration limit in m/s^2
    pub fn acceleration_limit_m_s2(&self) -> f64 {
        self.g_limit * STD_GRAVITY
    }

    /// Returns the combined thrust, mass flow and effective exhaust velocity of all engines.
    #[allow(non_snake_case)]
    pub fn performance(&self) -> StagePerformance {
        let throttle = self.throttle_fraction();
        let mut thrust_N = 0.0;
        let mut mass_flow_kg_s = 0.0;
        for engine in &self.engines {
            let flow = engine.mass_flow_kg_s(throttle);
            thrust_N += engine.exhaust_velocity_m_s() * flow;
            mass_flow_kg_s += flow;
        }
        StagePerformance {
            thrust_N,
            mass_flow_kg_s,
            exhaust_velocity_m_s: thrust_N / mass_flow_kg_s,
        }
    }

    /// Acceleration at the provided mass, in m/s^2
    pub fn acceleration_m_s2(&self, mass_kg: f64) -> f64 {
        match self.mode {
            ThrustMode::ConstantThrust => self.performance().thrust_N / mass_kg,
            ThrustMode::ConstantAcceleration => self.acceleration_limit_m_s2(),
            ThrustMode::Coast => 0.0,
        }
    }

    /// Characteristic time τ = v_e / a, i.e. the time to burn the whole mass at the current flow.
    pub fn characteristic_time_s(&self, mass_kg: f64) -> f64 {
        self.performance().exhaust_velocity_m_s / self.acceleration_m_s2(mass_kg)
    }

    /// Propellant limited burn time, in seconds.
    ///
    /// In constant acceleration, the engines throttle down as the mass depletes: once the minimum
    /// throttle is reached, the rest of the propellant is burned at minimum throttle.
    pub fn max_burn_time_s(&self) -> f64 {
        let perf = self.performance();
        match self.mode {
            ThrustMode::ConstantThrust => self.prop_mass_kg / perf.mass_flow_kg_s,
            ThrustMode::ConstantAcceleration => {
                let tau_limit = perf.exhaust_velocity_m_s / self.acceleration_limit_m_s2();
                let max_burn_time =
                    tau_limit * (self.total_mass_kg / self.dry_mass_kg()).ln();
                let min_throttle = self.min_throttle_fraction();
                if min_throttle <= 0.0 {
                    return max_burn_time;
                }
                let violation_time = -tau_limit * min_throttle.ln();
                if violation_time < max_burn_time {
                    let burned_kg =
                        self.total_mass_kg * (1.0 - (-violation_time / tau_limit).exp());
                    violation_time
                        + (self.prop_mass_kg - burned_kg) / (perf.mass_flow_kg_s * min_throttle)
                } else {
                    max_burn_time
                }
            }
            ThrustMode::Coast => 0.0,
        }
    }

    /// Checks the physical consistency of this stage, `index` is only used in the error.
    pub fn validate(&self, index: usize) -> Result<(), GuidanceError> {
        ensure!(
            self.total_mass_kg.is_finite() && self.total_mass_kg > 0.0,
            InvalidStageSpecSnafu {
                stage: index,
                reason: format!("total mass must be positive, got {} kg", self.total_mass_kg)
            }
        );
        ensure!(
            self.prop_mass_kg.is_finite() && self.prop_mass_kg >= 0.0,
            InvalidStageSpecSnafu {
                stage: index,
                reason: format!(
                    "propellant mass must be non-negative, got {} kg",
                    self.prop_mass_kg
                )
            }
        );
        ensure!(
            self.prop_mass_kg < self.total_mass_kg,
            InvalidStageSpecSnafu {
                stage: index,
                reason: format!(
                    "propellant mass ({} kg) must be less than total mass ({} kg)",
                    self.prop_mass_kg, self.total_mass_kg
                )
            }
        );
        if self.mode == ThrustMode::Coast {
            return Ok(());
        }
        ensure!(
            !self.engines.is_empty(),
            InvalidStageSpecSnafu {
                stage: index,
                reason: "no engines defined"
            }
        );
        for engine in &self.engines {
            ensure!(
                engine.isp_s.is_finite() && engine.isp_s > 0.0,
                InvalidStageSpecSnafu {
                    stage: index,
                    reason: format!("exhaust velocity must be positive, isp is {} s", engine.isp_s)
                }
            );
            ensure!(
                engine.thrust_N.is_finite() && engine.thrust_N > 0.0,
                InvalidStageSpecSnafu {
                    stage: index,
                    reason: format!("thrust must be positive, got {} N", engine.thrust_N)
                }
            );
        }
        let throttle = self.throttle_fraction();
        ensure!(
            throttle > 0.0 && throttle <= 1.0,
            InvalidStageSpecSnafu {
                stage: index,
                reason: format!("throttle must be within (0; 1], got {throttle}")
            }
        );
        let min_throttle = self.min_throttle_fraction();
        ensure!(
            (0.0..1.0).contains(&min_throttle),
            InvalidStageSpecSnafu {
                stage: index,
                reason: format!("minimum throttle must be within [0; 1), got {min_throttle}")
            }
        );
        if self.mode == ThrustMode::ConstantAcceleration {
            ensure!(
                self.g_limit.is_finite() && self.g_limit > 0.0,
                InvalidStageSpecSnafu {
                    stage: index,
                    reason: format!(
                        "constant acceleration requires a positive g-limit, got {}",
                        self.g_limit
                    )
                }
            );
        }
        Ok(())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let perf = self.performance();
        write!(
            f,
            "{:?} stage: {:.1} kg ({:.1} kg propellant), {} engine(s), {:.3} kN @ {:.1} m/s",
            self.mode,
            self.total_mass_kg,
            self.prop_mass_kg,
            self.engines.len(),
            perf.thrust_N * 1e-3,
            perf.exhaust_velocity_m_s
        )
    }
}

/// A launch vehicle, i.e. an ordered list of stages, first stage first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(default)]
    pub name: String,
    pub stages: Vec<Stage>,
}

impl Vehicle {
    pub fn new(name: &str, stages: Vec<Stage>) -> Self {
        Self {
            name: name.to_string(),
            stages,
        }
    }

    /// Validates every stage
    pub fn validate(&self) -> Result<(), GuidanceError> {
        for (i, stage) in self.stages.iter().enumerate() {
            stage.validate(i)?;
        }
        Ok(())
    }

    /// Returns the stages left once `consumed` stages have been jettisoned.
    pub fn remaining_stages(&self, consumed: usize) -> &[Stage] {
        &self.stages[consumed.min(self.stages.len())..]
    }
}

impl ConfigRepr for Stage {}
impl ConfigRepr for Vehicle {}
