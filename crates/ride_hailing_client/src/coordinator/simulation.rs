/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use crate::common::types::Point;
use crate::common::utils::{distance_between_in_km, step_towards};

/// Simulated movement of a vehicle marker toward a target coordinate, in
/// lieu of real location telemetry. Each tick nudges the position one step
/// per axis; arrival is declared exactly once.
#[derive(Debug, Clone)]
pub struct MovementSimulation {
    position: Point,
    target: Point,
    step_degrees: f64,
    arrival_threshold_km: f64,
    arrived: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct SimulationTick {
    pub position: Point,
    /// True only on the tick that first brings the position within the
    /// arrival threshold of the target.
    pub arrived_now: bool,
}

impl MovementSimulation {
    pub fn new(start: Point, target: Point, step_degrees: f64, arrival_threshold_km: f64) -> Self {
        MovementSimulation {
            position: start,
            target,
            step_degrees,
            arrival_threshold_km,
            arrived: false,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn target(&self) -> Point {
        self.target
    }

    pub fn has_arrived(&self) -> bool {
        self.arrived
    }

    /// Points the simulation at the next leg and re-arms arrival detection.
    pub fn retarget(&mut self, target: Point) {
        self.target = target;
        self.arrived = false;
    }

    pub fn tick(&mut self) -> SimulationTick {
        if self.arrived {
            return SimulationTick {
                position: self.position,
                arrived_now: false,
            };
        }

        self.position = step_towards(&self.position, &self.target, self.step_degrees);

        let arrived_now =
            distance_between_in_km(&self.position, &self.target) < self.arrival_threshold_km;
        self.arrived = arrived_now;

        SimulationTick {
            position: self.position,
            arrived_now,
        }
    }
}
