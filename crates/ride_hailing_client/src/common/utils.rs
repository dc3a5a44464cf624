/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use super::types::*;
use std::f64::consts::PI;

fn deg2rad(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

/// Haversine great-circle distance.
pub fn distance_between_in_meters(latlong1: &Point, latlong2: &Point) -> f64 {
    // Radius of Earth in meters
    let r: f64 = 6371000.0;

    let Latitude(lat1) = latlong1.lat;
    let Longitude(lon1) = latlong1.lon;
    let Latitude(lat2) = latlong2.lat;
    let Longitude(lon2) = latlong2.lon;

    let dlat = deg2rad(lat2 - lat1);
    let dlon = deg2rad(lon2 - lon1);

    let rlat1 = deg2rad(lat1);
    let rlat2 = deg2rad(lat2);

    let sq = |x: f64| x * x;

    let a = sq((dlat / 2.0).sin()) + sq((dlon / 2.0).sin()) * rlat1.cos() * rlat2.cos();
    let c = 2.0 * a.sqrt().asin();

    r * c
}

pub fn distance_between_in_km(latlong1: &Point, latlong2: &Point) -> f64 {
    distance_between_in_meters(latlong1, latlong2) / 1000.0
}

/// Advances `current` one simulation step toward `target`, independently per
/// axis. An axis within one step of the target snaps onto it and holds.
pub fn step_towards(current: &Point, target: &Point, step_degrees: f64) -> Point {
    let advance_axis = |current: f64, target: f64| -> f64 {
        let delta = target - current;
        if delta.abs() <= step_degrees {
            target
        } else if delta > 0.0 {
            current + step_degrees
        } else {
            current - step_degrees
        }
    };

    Point {
        lat: Latitude(advance_axis(current.lat.inner(), target.lat.inner())),
        lon: Longitude(advance_axis(current.lon.inner(), target.lon.inner())),
    }
}
