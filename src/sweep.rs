//! Multi-tick scenario driver.
//!
//! This module plays the host role around the containment engines: it owns
//! the shared grid and a set of bodies, moves the bodies every tick, refreshes
//! each body's engine and runs the pairwise collision checks.
//!
//! The sweep provides:
//! - One grid built at start-up and shared read-only by every engine
//! - Constant-velocity motion per body
//! - A [`TickReport`] per tick with inside counts and colliding pairs
//! - Progress tracking and output file generation

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use serde::Serialize;

use crate::collision::CollisionStatus;
use crate::containment::ContainmentEngine;
use crate::geom::Body;
use crate::grid::SpatialGrid;
use crate::output;
use crate::settings::Settings;
use crate::vector::Vec3;


/// Outcome of a single tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    pub tick: usize,
    pub inside_counts: Vec<usize>,               // per body, in configuration order
    pub colliding_pairs: Vec<(String, String)>, // body names
}

/// A set of moving bodies evaluated against one shared grid.
///
/// **Context**: The containment engines are passive. Something has to own the
/// grid, advance the bodies and call `update` once per tick, then compare the
/// resulting point sets pairwise.
///
/// **How it Works**: Each tick updates every engine from its body's current
/// snapshot, checks every unordered pair of bodies for a shared inside
/// sample, records a [`TickReport`] and finally moves each body by its
/// velocity ready for the next tick.
#[derive(Debug)]
pub struct Sweep {
    pub settings: Settings,
    grid: SpatialGrid,
    bodies: Vec<Body>,
    velocities: Vec<Vec3>,
    engines: Vec<ContainmentEngine>,
    reports: Vec<TickReport>,
}

impl Sweep {
    /// Builds the grid, the bodies and one attached engine per body.
    pub fn new(settings: Settings) -> Result<Self> {
        let grid = SpatialGrid::new(settings.grid.size, settings.grid.delta)?;

        let mut bodies = Vec::with_capacity(settings.bodies.len());
        let mut velocities = Vec::with_capacity(settings.bodies.len());
        for body in &settings.bodies {
            bodies.push(body.build()?);
            velocities.push(body.velocity);
        }

        let engines = bodies
            .iter()
            .map(|_| {
                let mut engine = ContainmentEngine::new(settings.containment);
                engine.attach();
                engine
            })
            .collect();

        log::info!(
            "sweep with {} bodies on a {}^3 grid",
            bodies.len(),
            grid.size()
        );

        Ok(Self {
            settings,
            grid,
            bodies,
            velocities,
            engines,
            reports: Vec::new(),
        })
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn engines(&self) -> &[ContainmentEngine] {
        &self.engines
    }

    pub fn reports(&self) -> &[TickReport] {
        &self.reports
    }

    pub fn inside_points(&self, body: usize) -> &[Vec3] {
        self.engines[body].inside_points()
    }

    /// Evaluates the current poses, then advances every body by one tick.
    pub fn step(&mut self) -> Result<&TickReport> {
        let tick = self.reports.len();

        for (engine, body) in self.engines.iter_mut().zip(&self.bodies) {
            engine
                .update(&self.grid, &body.snapshot())
                .with_context(|| format!("could not update body '{}'", body.name))?;
        }

        let colliding_pairs = (0..self.bodies.len())
            .tuple_combinations()
            .filter(|&(i, j)| {
                CollisionStatus::between(&self.engines[i], &self.engines[j]).is_colliding()
            })
            .map(|(i, j)| (self.bodies[i].name.clone(), self.bodies[j].name.clone()))
            .collect_vec();

        for (a, b) in &colliding_pairs {
            log::debug!("tick {}: '{}' and '{}' collide", tick, a, b);
        }

        for (body, velocity) in self.bodies.iter_mut().zip(&self.velocities) {
            body.pose.position += *velocity;
        }

        self.reports.push(TickReport {
            tick,
            inside_counts: self.engines.iter().map(|e| e.inside_points().len()).collect(),
            colliding_pairs,
        });

        self.reports.last().context("no tick report recorded")
    }

    /// Runs the configured number of ticks with a progress bar.
    pub fn run(&mut self) -> Result<()> {
        let start = Instant::now();
        let n = self.settings.sweep.ticks;

        let pb = ProgressBar::new(n as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] {bar:40.green/blue} {pos:>5}/{len:5} {msg} ETA: {eta_precise}",
            )?
            .progress_chars("█▇▆▅▄▃▂▁"),
        );
        pb.set_message("tick".to_string());

        for _ in 0..n {
            self.step()?;
            pb.inc(1);
        }
        pb.finish_and_clear();

        let collisions = self
            .reports
            .iter()
            .filter(|r| !r.colliding_pairs.is_empty())
            .count();
        log::info!(
            "{} ticks in {:?}, {} with collisions",
            n,
            start.elapsed(),
            collisions
        );

        Ok(())
    }

    /// Writes the latest inside points of each body and the tick report to `dir`.
    pub fn writeup(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir).with_context(|| format!("could not create {:?}", dir))?;

        for (body, engine) in self.bodies.iter().zip(&self.engines) {
            let path = dir.join(format!("{}_inside.dat", body.name));
            output::write_points(&path, engine.inside_points())?;
        }
        output::write_report(&dir.join("report.json"), &self.reports)?;

        log::info!("results written to {:?}", dir);
        Ok(())
    }
}
