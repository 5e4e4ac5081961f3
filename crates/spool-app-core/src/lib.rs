// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scheduler-side services for the spool planner (config, ports, planning).
//! Keeps host adapters thin: they implement the ports and call the service.

pub mod config;
pub mod planning;
pub mod ports;

pub use planning::{JobPlan, PlanningService, ServiceError};
