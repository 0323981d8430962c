use std::ops::ControlFlow;
use std::path::PathBuf;
use std::thread;

use anyhow::{ensure, Result};
use bloch_sim::measurement::MAX_BATCH_SIZE;
use bloch_sim::{Config, Gate, Preset, Session, Template};
use clap::{Parser, Subcommand};
use log::info;

#[derive(Parser, Debug)]
#[command(name = "bloch-sim", version, about = "Single-qubit simulator with Bloch sphere projection")]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Seed for the measurement RNG.
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Log at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plays a circuit from |0> and prints every intermediate state.
    Run {
        /// Gate ids (h, x, y, z, s, t).
        #[arg(required = true)]
        gates: Vec<Gate>,
        /// Measure the final state this many times.
        #[arg(long)]
        shots: Option<usize>,
        /// Wait the configured step delay between gates.
        #[arg(long)]
        animate: bool,
    },
    /// Single-steps a circuit, restarting when the end is reached.
    Step {
        #[arg(required = true)]
        gates: Vec<Gate>,
        #[arg(long, default_value_t = 1)]
        times: usize,
    },
    /// Plays one of the built-in circuits.
    Template {
        /// bell, superposition, flip or random.
        name: Template,
        #[arg(long)]
        shots: Option<usize>,
    },
    /// Prints the Bloch vector and screen point for the given angles.
    Project {
        #[arg(long, allow_hyphen_values = true)]
        theta: f64,
        #[arg(long, allow_hyphen_values = true)]
        phi: f64,
    },
    /// Prepares a preset state and measures it.
    Measure {
        #[arg(long, default_value = "plus")]
        preset: Preset,
        /// Batch size; a single collapsing measurement when omitted.
        #[arg(long)]
        shots: Option<usize>,
        /// Batch-measure using the configured batch size.
        #[arg(long, conflicts_with = "shots")]
        batch: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let mut session = Session::from_config(&config);

    match cli.command {
        Command::Run {
            gates,
            shots,
            animate,
        } => {
            gates.into_iter().for_each(|gate| {
                session.append(gate);
            });
            play(&mut session, &config, animate);
            finish(&mut session, shots)?;
        }
        Command::Step { gates, times } => {
            gates.into_iter().for_each(|gate| {
                session.append(gate);
            });
            for _ in 0..times {
                let status = session.step_once();
                println!(
                    "cursor {} | {} | {}",
                    session.circuit().cursor(),
                    session.state(),
                    status
                );
            }
            print_snapshot(&session)?;
        }
        Command::Template { name, shots } => {
            session.load_template(name);
            let gates = session
                .circuit()
                .steps()
                .iter()
                .map(|step| step.label.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            info!("template {}: {}", name, gates);
            play(&mut session, &config, false);
            finish(&mut session, shots)?;
        }
        Command::Project { theta, phi } => {
            session.set_spherical(theta, phi);
            let state = *session.state();
            let unit = bloch_sim::BlochProjector::unit().project_state(&state);
            let projection = session.projector().project_state(&state);
            println!("{}", state);
            println!(
                "bloch (x, y, z) = ({:.3}, {:.3}, {:.3})",
                unit.vector.x, unit.vector.y, unit.vector.z
            );
            println!(
                "screen (x, y) = ({:.1}, {:.1})",
                projection.screen.x, projection.screen.y
            );
        }
        Command::Measure {
            preset,
            shots,
            batch,
        } => {
            session.set_preset(preset);
            println!("{}", session.state());
            match shots.or(batch.then_some(config.batch_size)) {
                Some(n) => {
                    let counts = session.measure_batch(checked_batch(n)?);
                    println!("{} zeros, {} ones", counts.count0, counts.count1);
                }
                None => {
                    let measurement = session.measure_once();
                    println!(
                        "collapsed to |{}> (p = {:.3})",
                        measurement.outcome.bit(),
                        measurement.probability
                    );
                }
            }
            print_snapshot(&session)?;
        }
    }

    Ok(())
}

fn play(session: &mut Session, config: &Config, animate: bool) {
    let delay = config.step_delay();
    let status = session.play_all(|event| {
        println!("step {} [{}] {}", event.index + 1, event.gate, event.state);
        if animate {
            thread::sleep(delay);
        }
        ControlFlow::Continue(())
    });
    println!("{}", status);
}

fn finish(session: &mut Session, shots: Option<usize>) -> Result<()> {
    if let Some(n) = shots {
        let counts = session.measure_batch(checked_batch(n)?);
        println!("{} zeros, {} ones", counts.count0, counts.count1);
    }
    print_snapshot(session)
}

fn checked_batch(n: usize) -> Result<usize> {
    ensure!(
        (1..=MAX_BATCH_SIZE).contains(&n),
        "batch size must be between 1 and {}, got {}",
        MAX_BATCH_SIZE,
        n
    );
    Ok(n)
}

fn print_snapshot(session: &Session) -> Result<()> {
    let json = session.render(|snapshot| serde_json::to_string_pretty(snapshot))?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_batch() {
        assert_eq!(100, checked_batch(100).unwrap());
        assert_eq!(MAX_BATCH_SIZE, checked_batch(MAX_BATCH_SIZE).unwrap());
        assert!(checked_batch(0).is_err());
        assert!(checked_batch(MAX_BATCH_SIZE + 1).is_err());
    }

    #[test]
    fn test_cli_parses_measure() {
        let cli = Cli::try_parse_from(["bloch-sim", "measure", "--preset", "minus", "--shots", "10"])
            .unwrap();
        match cli.command {
            Command::Measure { preset, shots, .. } => {
                assert_eq!(Preset::Minus, preset);
                assert_eq!(Some(10), shots);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
