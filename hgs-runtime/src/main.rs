use anyhow::{anyhow, Result};
use clap::{arg, Command};
use hgs_search::{compute_neighbours, Arena, LocalSearch, NeighbourhoodParams, SearchParams};
use hgs_structs::{ProblemData, Solution};
use hgs_utils::{dejsonify, jsonify, load_overrides, read_json_arg};
use serde::Serialize;
use std::{fs, path::PathBuf};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

fn cli() -> Command {
    Command::new("hgs-runtime")
        .about("Computes neighbourhoods and improves solutions")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("compute_neighbours")
                .about("Computes granular neighbourhoods for every client")
                .arg(
                    arg!(<PROBLEM> "Problem json string, path to json file, or '-' for stdin")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--params [PARAMS] "Neighbourhood parameter overrides as json string or path to json file")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--output [OUTPUT_FILE] "If set, the neighbourhoods will be saved to this file path")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("improve")
                .about("Runs the local search on a solution")
                .arg(
                    arg!(<PROBLEM> "Problem json string, path to json file, or '-' for stdin")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(<SOLUTION> "Solution json string or path to json file")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--neighbourhood [PARAMS] "Neighbourhood parameter overrides as json string or path to json file")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--search [PARAMS] "Search parameter overrides as json string or path to json file")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(--output [OUTPUT_FILE] "If set, the improved solution will be saved to this file path")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("verify_solution")
                .about("Verifies a solution against a problem")
                .arg(
                    arg!(<PROBLEM> "Problem json string, path to json file, or '-' for stdin")
                        .value_parser(clap::value_parser!(String)),
                )
                .arg(
                    arg!(<SOLUTION> "Solution json string or path to json file")
                        .value_parser(clap::value_parser!(String)),
                ),
        )
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(env_filter),
        )
        .init();
}

fn main() {
    init_logging();
    let matches = cli().get_matches();

    if let Err(e) = match matches.subcommand() {
        Some(("compute_neighbours", sub_m)) => run_compute_neighbours(
            sub_m.get_one::<String>("PROBLEM").unwrap().clone(),
            sub_m.get_one::<String>("params").cloned(),
            sub_m.get_one::<PathBuf>("output").cloned(),
        ),
        Some(("improve", sub_m)) => run_improve(
            sub_m.get_one::<String>("PROBLEM").unwrap().clone(),
            sub_m.get_one::<String>("SOLUTION").unwrap().clone(),
            sub_m.get_one::<String>("neighbourhood").cloned(),
            sub_m.get_one::<String>("search").cloned(),
            sub_m.get_one::<PathBuf>("output").cloned(),
        ),
        Some(("verify_solution", sub_m)) => run_verify_solution(
            sub_m.get_one::<String>("PROBLEM").unwrap().clone(),
            sub_m.get_one::<String>("SOLUTION").unwrap().clone(),
        ),
        _ => Err(anyhow!("Invalid subcommand")),
    } {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_problem(problem: &str) -> Result<ProblemData> {
    dejsonify::<ProblemData>(&read_json_arg(problem)?)
        .map_err(|e| anyhow!("Failed to parse problem: {}", e))
}

fn load_solution(solution: &str) -> Result<Solution> {
    dejsonify::<Solution>(&read_json_arg(solution)?)
        .map_err(|e| anyhow!("Failed to parse solution: {}", e))
}

fn write_output<T: Serialize>(output: &T, output_file: Option<PathBuf>) -> Result<()> {
    let json = jsonify(output)?;
    match output_file {
        Some(path) => {
            fs::write(&path, json)?;
            info!("output written to {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub fn run_compute_neighbours(
    problem: String,
    params: Option<String>,
    output_file: Option<PathBuf>,
) -> Result<()> {
    let data = load_problem(&problem)?;
    let params = NeighbourhoodParams::initialize(&load_overrides(params.as_deref())?)?;
    let neighbours = compute_neighbours(&data, &params);
    info!(
        "computed neighbourhoods for {} clients ({} depots)",
        data.num_clients(),
        data.num_depots()
    );
    write_output(&neighbours, output_file)
}

#[derive(Serialize)]
struct ImproveOutput {
    solution: Solution,
    stats: hgs_search::SearchStats,
}

pub fn run_improve(
    problem: String,
    solution: String,
    neighbourhood: Option<String>,
    search: Option<String>,
    output_file: Option<PathBuf>,
) -> Result<()> {
    let data = load_problem(&problem)?;
    let solution = load_solution(&solution)?;
    let neighbourhood = NeighbourhoodParams::initialize(&load_overrides(neighbourhood.as_deref())?)?;
    let search = SearchParams::initialize(&load_overrides(search.as_deref())?)?;

    let mut arena = Arena::new(&data);
    let routes = arena.load(&solution)?;
    let mut local_search = LocalSearch::new(&data, &neighbourhood, search)?;
    let stats = local_search.run(&mut arena)?;
    let improved = arena.solution(&routes)?;
    for route in routes {
        arena.release_route(route);
    }
    improved.verify(&data)?;

    write_output(
        &ImproveOutput {
            solution: improved,
            stats,
        },
        output_file,
    )
}

pub fn run_verify_solution(problem: String, solution: String) -> Result<()> {
    let data = load_problem(&problem)?;
    let solution = load_solution(&solution)?;
    solution.verify(&data)?;
    println!("Solution is valid");
    Ok(())
}
