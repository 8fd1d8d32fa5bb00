use anyhow::{Context, Result};
use bedload_common::{SimulationConfig, Snapshot};
use bedload_engine::Simulation;
use clap::Parser;
use log::{debug, error, info, trace, warn};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

/// Command-line arguments for the engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the run configuration
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the configured RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the configured iteration count
    #[arg(long)]
    iterations: Option<u32>,
}

/// One row of the final particle table.
#[derive(Serialize)]
struct ParticleRow {
    id: i64,
    x: f64,
    elevation: f64,
    active: bool,
    age: u32,
    loop_age: u32,
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();
    let args = Args::parse();

    info!("Starting bedload engine...");

    // --- Load Configuration ---
    let mut config = SimulationConfig::load(&args.config)?;
    if let Some(seed) = args.seed {
        config.run.seed = seed;
    }
    if let Some(iterations) = args.iterations {
        config.run.iterations = iterations;
        config.validate()?;
    }

    // --- Initialize Simulation ---
    let mut sim = Simulation::new(config)?;
    debug!("Simulation Parameters: {:#?}", sim.params());

    let total_iterations = sim.params().iterations;
    let mut record_interval = sim.config().run.record_interval;
    if record_interval == 0 {
        warn!("record_interval is 0. Recording only the initial and final states.");
        record_interval = u32::MAX;
    }

    info!("Recording initial snapshot...");
    sim.record_snapshot()?;

    info!("Starting simulation loop for {} iterations...", total_iterations);
    let start_time = Instant::now();
    let mut previous_print_time = start_time;

    for iteration in 0..total_iterations {
        let step_start_time = Instant::now();
        let report = match sim.step() {
            Ok(report) => report,
            Err(e) => {
                error!("Error during iteration {}: {}", iteration + 1, e);
                anyhow::bail!("Simulation step failed.");
            }
        };
        let step_duration = step_start_time.elapsed();

        let current_time = Instant::now();
        let should_print_status = current_time.duration_since(previous_print_time).as_secs_f64() >= 5.0;
        let is_record_step = (iteration + 1) % record_interval == 0;
        let is_last_step = iteration + 1 == total_iterations;

        if should_print_status || is_last_step {
            info!(
                "Iteration [{}/{}] | Entrained: {} | Exited: {} | Flux: {:?} | Step Time: {:6.2} ms | Elapsed: {:.2} s",
                iteration + 1,
                total_iterations,
                report.selected.len(),
                report.exited.len(),
                report.flux,
                step_duration.as_secs_f64() * 1000.0,
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = current_time;
        } else {
            trace!(
                "Iteration [{}/{}] completed in {:.2} ms",
                iteration + 1,
                total_iterations,
                step_duration.as_secs_f64() * 1000.0
            );
        }

        if is_record_step || is_last_step {
            sim.record_snapshot()?;
        }
    }

    info!("Simulation finished in {:.3} seconds.", start_time.elapsed().as_secs_f64());

    // --- Save Recorded Data ---
    let output = sim.config().output.clone();

    if output.save_flux {
        let filename = format!("{}_flux.csv", output.base_filename);
        match write_flux_csv(&filename, &sim) {
            Ok(()) => info!("Flux matrix saved to {}", filename),
            Err(e) => error!("Error saving flux CSV '{}': {:#}", filename, e),
        }
    }

    if output.save_stats {
        let format = output.format.as_deref().unwrap_or("json");
        if let Err(e) = write_snapshots(&output.base_filename, format, sim.get_recorded_snapshots()) {
            error!("Error saving snapshots: {:#}", e);
        }
    } else {
        info!("Skipping saving snapshots as per config (save_stats is false).");
    }

    if output.save_positions {
        let filename = format!("{}_final_particles.csv", output.base_filename);
        match write_particles_csv(&filename, &sim) {
            Ok(()) => info!("Final particle state saved to {}", filename),
            Err(e) => error!("Error saving CSV file '{}': {:#}", filename, e),
        }
    } else {
        info!("Skipping saving final positions as per config.");
    }

    info!("Simulation Complete.");
    Ok(())
}

/// One row per iteration, one column per subregion.
fn write_flux_csv(filename: &str, sim: &Simulation) -> Result<()> {
    let mut writer = csv::Writer::from_path(filename)?;
    let mut header = vec!["iteration".to_string()];
    header.extend(sim.subregions().iter().map(|s| s.name().to_string()));
    writer.write_record(&header)?;

    let matrix = sim.flux_matrix();
    for iteration in 0..sim.params().iterations as usize {
        let mut row = vec![iteration.to_string()];
        row.extend(matrix.iter().map(|flux| flux[iteration].to_string()));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_particles_csv(filename: &str, sim: &Simulation) -> Result<()> {
    let mut writer = csv::Writer::from_path(filename)?;
    for p in sim.model_particles() {
        writer.serialize(ParticleRow {
            id: p.id.0,
            x: p.x,
            elevation: p.elevation,
            active: p.active,
            age: p.age,
            loop_age: p.loop_age,
        })?;
    }
    writer.flush()?;
    Ok(())
}

fn write_snapshots(base_filename: &str, format: &str, snapshots: &[Snapshot]) -> Result<()> {
    match format {
        "bincode" => {
            // Binary format (much more compact)
            let filename = format!("{}_snapshots.bin", base_filename);
            let file = File::create(&filename).with_context(|| format!("creating '{}'", filename))?;
            bincode::serialize_into(BufWriter::new(file), snapshots)?;
            info!("All snapshots saved to {} (binary format)", filename);
        }
        "messagepack" => {
            // MessagePack format (compact and cross-platform)
            let filename = format!("{}_snapshots.msgpack", base_filename);
            let file = File::create(&filename).with_context(|| format!("creating '{}'", filename))?;
            rmp_serde::encode::write(&mut BufWriter::new(file), snapshots)?;
            info!("All snapshots saved to {} (MessagePack format)", filename);
        }
        other => {
            if other != "json" {
                error!("Unknown output format: {}. Using JSON instead.", other);
            }
            let filename = format!("{}_snapshots.json", base_filename);
            let file = File::create(&filename).with_context(|| format!("creating '{}'", filename))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, snapshots)?;
            writer.flush()?;
            info!("All snapshots saved to {}", filename);
        }
    }
    Ok(())
}
