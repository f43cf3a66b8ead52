//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the cache is live.
//!
//! # Tasks
//! - Maintenance: sweeps expired entries from every tier and decays
//!   predictive access scores at configured intervals

mod maintenance;

pub use maintenance::{spawn_maintenance_task, MaintenanceTask};
