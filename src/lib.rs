//! Scheduling and resource-network synthesis for flexible manufacturing
//! systems.
//!
//! The crate turns a static process plan (workpieces, processing stations,
//! transport units) into a conflict-free execution timeline, then derives
//! from that timeline a place/transition network exposing the same
//! resource-contention and buffer-capacity structure for formal-model
//! consumers.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `PlanData` (immutable input), `Schedule`
//!   (computed timelines), plan steps and intervals
//! - **`dispatching`**: Production and transport dispatch rules
//! - **`scheduler`**: The discrete-event engine (Standard and Extended modes)
//! - **`network`**: Schedule → place/transition network synthesis
//! - **`codec`**: Line-oriented flat-file persistence of `PlanData`
//! - **`validation`**: Input integrity checks run before scheduling
//!
//! # Data Flow
//!
//! Strictly one way: `PlanData` → `Schedule` → `ResourceNetwork`.
//! Both engines are single-threaded, deterministic, and perform no I/O.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Murata (1989), "Petri Nets: Properties, Analysis and Applications"

pub mod codec;
pub mod dispatching;
pub mod models;
pub mod network;
pub mod scheduler;
pub mod validation;
