//! # Modemnet Simulation
//!
//! Scenario runner for the modem packet networks.
//!
//! - **World** (`world.rs`): named computers, each with one modem, plus the
//!   networks they share
//! - **Oracle** (`oracle.rs`): a from-scratch BFS over the cable graph used to
//!   check the incremental engine
//! - **Scenarios** (`scenarios.rs`): the A-B-C split, a wireless range sweep,
//!   and random cable churn
//!
//! ## Example: A-B-C Scenario
//!
//! ```rust
//! use modemnet_modem::ModemConfig;
//! use modemnet_simulation::scenarios::run_abc_scenario;
//!
//! let report = run_abc_scenario(ModemConfig::default()).unwrap();
//! assert!(report.passed);
//! ```

pub mod oracle;
pub mod scenarios;
pub mod world;

pub use oracle::CableOracle;
pub use scenarios::{AbcReport, ChurnReport, Phase, Probe, RangeReport};
pub use world::{Payload, Received, World};
