//! Pre-defined scenarios run against the real engines
//!
//! Every scenario returns a serialisable report with a `passed` flag so the
//! binary can print it and tests can assert on it.

use std::collections::BTreeSet;

use anyhow::Result;
use modemnet_core::{DVec3, Location, PacketNetwork};
use modemnet_modem::{ModemConfig, ModemKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::oracle::CableOracle;
use crate::world::{World, overworld};

const CHANNEL: i32 = 1;

/// Who heard a transmission in one phase of a scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Phase {
    pub label: String,
    pub sender: String,
    pub heard_by: Vec<String>,
    pub expected: Vec<String>,
}

impl Phase {
    pub fn passed(&self) -> bool {
        self.heard_by == self.expected
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AbcReport {
    pub phases: Vec<Phase>,
    pub passed: bool,
}

/// Transmit once and record who heard it
fn phase(world: &mut World, label: &str, sender: &str, expected: &[&str]) -> Result<Phase> {
    world.send(sender, CHANNEL, CHANNEL, json!({ "phase": label }))?;
    let heard_by: Vec<String> = world.drain_all()?.into_keys().collect();
    let phase = Phase {
        label: label.to_string(),
        sender: sender.to_string(),
        heard_by,
        expected: expected.iter().map(|s| s.to_string()).collect(),
    };
    if phase.passed() {
        info!(phase = label, heard_by = ?phase.heard_by, "Phase passed");
    } else {
        warn!(phase = label, heard_by = ?phase.heard_by, expected = ?phase.expected, "Phase failed");
    }
    Ok(phase)
}

/// The A-B-C scenario
///
/// ```text
/// A ---- B ---- C      A reaches B and C, however far apart they are
/// A ---- B    C        after the B-C cut A reaches only B
/// ```
pub fn run_abc_scenario(config: ModemConfig) -> Result<AbcReport> {
    info!("=== Running A-B-C Scenario ===");
    let mut world = World::new(config);
    let segment = "abc";

    // Far beyond any wireless range of each other
    world.add_computer("A", ModemKind::Wired, overworld(0.0, 64.0, 0.0), &[CHANNEL])?;
    world.add_computer("B", ModemKind::Wired, overworld(5000.0, 64.0, 0.0), &[CHANNEL])?;
    world.add_computer("C", ModemKind::Wired, overworld(0.0, 64.0, 9000.0), &[CHANNEL])?;
    for name in ["A", "B", "C"] {
        world.plug(name, segment)?;
    }
    world.cable(segment, "A", "B")?;
    world.cable(segment, "B", "C")?;

    let mut phases = vec![phase(&mut world, "connected", "A", &["B", "C"])?];

    world.cut(segment, "B", "C")?;
    phases.push(phase(&mut world, "after cut", "A", &["B"])?);
    phases.push(phase(&mut world, "isolated", "C", &[])?);

    world.cable(segment, "A", "C")?;
    phases.push(phase(&mut world, "rejoined", "B", &["A", "C"])?);

    let passed = phases.iter().all(Phase::passed);
    info!(passed, "A-B-C scenario finished");
    Ok(AbcReport { phases, passed })
}

/// One listener in a range sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Probe {
    pub distance: f64,
    pub heard: bool,
    pub expected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RangeReport {
    pub altitude: f64,
    pub range: f64,
    pub probes: Vec<Probe>,
    /// Same-position listener in another dimension never hears a plain radio
    pub other_dimension_heard: bool,
    pub passed: bool,
}

/// Sweep listeners outwards from a wireless sender at `altitude`
pub fn run_range_sweep(config: ModemConfig, altitude: f64, step: f64, count: usize) -> Result<RangeReport> {
    info!(altitude, step, count, "=== Running range sweep ===");
    let mut world = World::new(config);
    let region = "overworld";

    world.add_computer("sender", ModemKind::Wireless, overworld(0.0, altitude, 0.0), &[])?;
    world.tune("sender", region)?;
    let range = world.modem("sender")?.range();

    let mut listeners = Vec::with_capacity(count);
    for i in 1..=count {
        let distance = step * i as f64;
        let name = format!("listener{:03}", i);
        world.add_computer(&name, ModemKind::Wireless, overworld(distance, altitude, 0.0), &[CHANNEL])?;
        world.tune(&name, region)?;
        listeners.push((name, distance));
    }
    world.add_computer(
        "nether",
        ModemKind::Wireless,
        Location::new(DVec3::new(0.0, altitude, 0.0), "nether"),
        &[CHANNEL],
    )?;
    world.tune("nether", region)?;

    world.send("sender", CHANNEL, CHANNEL, json!("sweep"))?;
    let inboxes = world.drain_all()?;

    let probes: Vec<Probe> = listeners
        .into_iter()
        .map(|(name, distance)| Probe {
            distance,
            heard: inboxes.contains_key(&name),
            expected: distance <= range,
        })
        .collect();
    let other_dimension_heard = inboxes.contains_key("nether");
    let passed = !other_dimension_heard && probes.iter().all(|p| p.heard == p.expected);

    info!(range, heard = probes.iter().filter(|p| p.heard).count(), passed, "Range sweep finished");
    Ok(RangeReport {
        altitude,
        range,
        probes,
        other_dimension_heard,
        passed,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct ChurnReport {
    pub steps: usize,
    pub seed: u64,
    pub transmissions: usize,
    pub mismatches: Vec<Phase>,
    pub cables: usize,
    pub passed: bool,
}

/// Random plug/unplug/cable/cut churn on one segment, checked against a BFS oracle
pub fn run_churn(config: ModemConfig, steps: usize, seed: u64, nodes: usize) -> Result<ChurnReport> {
    info!(steps, seed, nodes, "=== Running cable churn ===");
    let mut rng = StdRng::seed_from_u64(seed);
    let mut world = World::new(config);
    let mut oracle = CableOracle::new();
    let segment = "churn";

    let names: Vec<String> = (0..nodes.max(2)).map(|i| format!("n{:02}", i)).collect();
    for (i, name) in names.iter().enumerate() {
        // Spread out so distance could never explain a delivery
        let location = overworld(i as f64 * 1000.0, 64.0, 0.0);
        world.add_computer(name, ModemKind::Wired, location, &[CHANNEL])?;
        if i % 2 == 0 {
            world.plug(name, segment)?;
            oracle.plug(name);
        }
    }

    let mut transmissions = 0;
    let mut mismatches = Vec::new();
    for step in 0..steps {
        let a = &names[rng.random_range(0..names.len())];
        let b = &names[rng.random_range(0..names.len())];
        match rng.random_range(0..12) {
            0 => {
                world.plug(a, segment)?;
                oracle.plug(a);
            }
            1 => {
                let network = world.segment(segment);
                world.modem(a)?.detach(network.id());
                oracle.unplug(a);
            }
            2..=5 => {
                world.cable(segment, a, b)?;
                oracle.cable(a, b);
            }
            6..=8 => {
                world.cut(segment, a, b)?;
                oracle.cut(a, b);
            }
            _ => {
                transmissions += 1;
                let label = format!("step {}", step);
                let expected: BTreeSet<String> = oracle.reachable(a);
                let expected: Vec<&str> = expected.iter().map(String::as_str).collect();
                let result = phase(&mut world, &label, a, &expected)?;
                if !result.passed() {
                    mismatches.push(result);
                }
            }
        }
    }

    let cables = world.segment(segment).edge_count();
    let passed = mismatches.is_empty() && cables == oracle.cable_count();
    info!(transmissions, mismatches = mismatches.len(), passed, "Cable churn finished");
    Ok(ChurnReport {
        steps,
        seed,
        transmissions,
        mismatches,
        cables,
        passed,
    })
}
