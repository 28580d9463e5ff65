use std::path::{Path, PathBuf};

use afn_core::units::{degc, mps, pa};
use afn_graph::NodeKind;
use afn_project::{NetworkRuntime, NodeKindDef, ProjectDef, ProjectResult};
use afn_sim::{Environment, ZoneConditions};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "afn")]
#[command(about = "Airflow network solver for multizone buildings", long_about = None)]
struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate project file syntax and structure
    Validate {
        /// Path to the project file (.yaml, .yml or .json)
        project_path: PathBuf,
    },
    /// Solve one timestep and print pressures and flows
    Solve {
        /// Path to the project file (.yaml, .yml or .json)
        project_path: PathBuf,
        #[command(flatten)]
        weather: WeatherArgs,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct WeatherArgs {
    /// Wind speed at the weather station [m/s]
    #[arg(long, default_value_t = 0.0)]
    wind_speed: f64,
    /// Direction the wind blows from [deg clockwise from north]
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    wind_direction: f64,
    /// Outdoor dry-bulb temperature [°C]
    #[arg(long, default_value_t = 20.0, allow_negative_numbers = true)]
    outdoor_temp: f64,
    /// Outdoor humidity ratio [kg/kg]
    #[arg(long, default_value_t = 0.0)]
    humidity_ratio: f64,
    /// Barometric pressure [Pa]
    #[arg(long, default_value_t = 101_325.0)]
    barometric: f64,
    /// Temperature for every zone, overriding the project values [°C]
    #[arg(long, allow_negative_numbers = true)]
    zone_temp: Option<f64>,
}

impl WeatherArgs {
    fn environment(&self) -> Environment {
        Environment {
            outdoor_dry_bulb: degc(self.outdoor_temp),
            humidity_ratio: self.humidity_ratio,
            barometric_pressure: pa(self.barometric),
            wind_speed: mps(self.wind_speed),
            wind_direction_deg: self.wind_direction,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Validate { project_path } => cmd_validate(project_path),
        Commands::Solve {
            project_path,
            weather,
            json,
        } => cmd_solve(project_path, weather, *json),
    };
    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_validate(project_path: &Path) -> ProjectResult<bool> {
    println!("Validating project: {}", project_path.display());
    let project = afn_project::load(project_path)?;
    // Building catches parameter errors the schema checks cannot see.
    afn_project::build_network(&project)?;
    println!(
        "✓ Project '{}' is valid ({} nodes, {} components, {} links)",
        project.name,
        project.nodes.len(),
        project.components.len(),
        project.links.len()
    );
    Ok(true)
}

fn cmd_solve(project_path: &Path, weather: &WeatherArgs, json: bool) -> ProjectResult<bool> {
    let project = afn_project::load(project_path)?;
    let mut runtime = afn_project::build_network(&project)?;
    let env = weather.environment();
    runtime.network.update_boundaries(&env)?;

    if let Some(t) = weather.zone_temp {
        for node in project.nodes.iter().filter(|n| n.kind != NodeKindDef::External) {
            let Some(id) = runtime.node(&node.name) else {
                continue;
            };
            let w = node.humidity_ratio.unwrap_or(0.0);
            runtime
                .network
                .set_zone_conditions(id, &ZoneConditions::new(degc(t), w))?;
        }
    }

    let report = runtime.network.simulate_timestep()?;
    info!(status = report.status.as_str(), "solve finished");
    let output = SolveOutput::collect(&project, &runtime);

    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        output.print();
    }
    runtime.network.diagnostics().log_summary();
    Ok(report.status.is_success())
}

#[derive(Serialize)]
struct SolveOutput {
    project: String,
    status: &'static str,
    iterations: usize,
    max_residual_kg_s: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    controller_control: Option<f64>,
    nodes: Vec<NodeOutput>,
    links: Vec<LinkOutput>,
}

#[derive(Serialize)]
struct NodeOutput {
    name: String,
    kind: NodeKind,
    pressure_pa: f64,
}

#[derive(Serialize)]
struct LinkOutput {
    name: String,
    from: String,
    to: String,
    mass_flow_kg_s: f64,
    forward_kg_s: f64,
    reverse_kg_s: f64,
    pressure_drop_pa: f64,
}

impl SolveOutput {
    fn collect(project: &ProjectDef, runtime: &NetworkRuntime) -> Self {
        let afn = &runtime.network;
        let network = afn.context().network();
        let name_of = |id| {
            network
                .node(id)
                .map_or_else(String::new, |n| n.name.clone())
        };
        let nodes = network
            .nodes()
            .iter()
            .map(|n| NodeOutput {
                name: n.name.clone(),
                kind: n.kind,
                pressure_pa: afn.node_pressure(n.id).map_or(f64::NAN, |p| p.value),
            })
            .collect();
        let links = network
            .links()
            .iter()
            .map(|l| {
                let flow = afn.link_flow(l.id).copied().unwrap_or_default();
                LinkOutput {
                    name: l.name.clone(),
                    from: name_of(l.from_node()),
                    to: name_of(l.to_node()),
                    mass_flow_kg_s: flow.net,
                    forward_kg_s: flow.forward,
                    reverse_kg_s: flow.reverse,
                    pressure_drop_pa: flow.pressure_drop,
                }
            })
            .collect();
        let report = afn.last_report().copied();
        Self {
            project: project.name.clone(),
            status: report.map_or("not run", |r| r.status.as_str()),
            iterations: report.map_or(0, |r| r.iterations),
            max_residual_kg_s: report.map_or(0.0, |r| r.max_residual),
            controller_control: afn.last_controller_outcome().map(|o| o.control),
            nodes,
            links,
        }
    }

    fn print(&self) {
        println!("Project: {}", self.project);
        println!(
            "Status: {} after {} iterations (max residual {:.3e} kg/s)",
            self.status, self.iterations, self.max_residual_kg_s
        );
        if let Some(u) = self.controller_control {
            println!("Pressure controller signal: {u:.4}");
        }
        println!();
        println!("{:<28} {:<14} {:>12}", "Node", "Kind", "P [Pa]");
        for n in &self.nodes {
            println!("{:<28} {:<14} {:>12.4}", n.name, n.kind.as_str(), n.pressure_pa);
        }
        println!();
        println!(
            "{:<28} {:>14} {:>14} {:>14} {:>12}",
            "Link", "Flow [kg/s]", "Fwd [kg/s]", "Rev [kg/s]", "dP [Pa]"
        );
        for l in &self.links {
            println!(
                "{:<28} {:>14.6} {:>14.6} {:>14.6} {:>12.4}",
                l.name, l.mass_flow_kg_s, l.forward_kg_s, l.reverse_kg_s, l.pressure_drop_pa
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_negative_weather_values() {
        let cli = Cli::try_parse_from([
            "afn",
            "solve",
            "house.yaml",
            "--outdoor-temp",
            "-5",
            "--wind-direction",
            "-45",
            "--zone-temp",
            "-1.5",
        ])
        .unwrap();
        let Commands::Solve { weather, .. } = cli.command else {
            panic!("expected solve");
        };
        assert_eq!(weather.outdoor_temp, -5.0);
        assert_eq!(weather.wind_direction, -45.0);
        assert_eq!(weather.zone_temp, Some(-1.5));
    }

    #[test]
    fn weather_defaults() {
        let cli = Cli::try_parse_from(["afn", "solve", "house.yaml"]).unwrap();
        let Commands::Solve { weather, json, .. } = cli.command else {
            panic!("expected solve");
        };
        assert!(!json);
        let env = weather.environment();
        assert_eq!(env.wind_direction_deg, 0.0);
        assert_eq!(weather.barometric, 101_325.0);
        assert_eq!(weather.zone_temp, None);
    }
}
