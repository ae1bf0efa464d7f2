use battle_forecast::{run, CliOptions, Overrides};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn usage() -> ! {
    eprintln!(
        "Usage: battle-forecast --scenario scenario.json [--rules rules.json] [--seed SEED] \
[--max-depth N] [--time-ms MS] [--output forecast.json] [--score-only]"
    );
    std::process::exit(1);
}

fn parse_args() -> anyhow::Result<CliOptions> {
    let mut scenario_path = None;
    let mut rules_path = None;
    let mut output_path = None;
    let mut overrides = Overrides::default();
    let mut score_only = false;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--scenario" => {
                scenario_path = Some(args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--scenario requires a path (e.g. --scenario scenario.json)")
                })?);
            }
            "--rules" => {
                rules_path = Some(args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--rules requires a path (e.g. --rules rules.json)")
                })?);
            }
            "--seed" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--seed requires a number"))?;
                overrides.seed = Some(val.parse()?);
            }
            "--max-depth" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--max-depth requires a number"))?;
                overrides.max_depth = Some(val.parse()?);
            }
            "--time-ms" => {
                let val = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--time-ms requires milliseconds"))?;
                overrides.time_budget_ms = Some(val.parse()?);
            }
            "--output" => {
                output_path = Some(args.next().map(PathBuf::from).ok_or_else(|| {
                    anyhow::anyhow!("--output requires a path (e.g. --output forecast.json)")
                })?);
            }
            "--score-only" => score_only = true,
            "--help" | "-h" => usage(),
            other => return Err(anyhow::anyhow!("Unknown argument {other}")),
        }
    }

    let Some(scenario_path) = scenario_path else {
        usage();
    };
    Ok(CliOptions {
        scenario_path,
        rules_path,
        output_path,
        overrides,
        score_only,
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let opts = parse_args()?;
    run(opts)
}
