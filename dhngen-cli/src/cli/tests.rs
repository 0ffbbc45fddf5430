//! Unit tests for argument parsing, execution and rendering.

use super::commands::run_command;
use super::{
    BackfillArg, Cli, CliError, Command, ExecutionSummary, GenerateCommand, render_summary,
    run_cli,
};

use clap::Parser;
use dhngen_core::{BackfillBoundary, GenerationError, ParamsError};
use dhngen_test_support::tracing::RecordingLayer;
use rstest::{fixture, rstest};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn parse(extra: &[&str]) -> GenerateCommand {
    let args = ["dhngen", "generate"].into_iter().chain(extra.iter().copied());
    match Cli::try_parse_from(args).expect("arguments must parse").command {
        Command::Generate(generate) => generate,
    }
}

#[fixture]
fn small() -> GenerateCommand {
    parse(&["--regions", "3", "--nodes-per-region", "15", "--seed", "11"])
}

fn render(summary: &ExecutionSummary) -> String {
    let mut buffer = Vec::new();
    render_summary(summary, &mut buffer).expect("rendering to memory cannot fail");
    String::from_utf8(buffer).expect("output is UTF-8")
}

#[test]
fn defaults_mirror_the_generator_defaults() {
    let command = parse(&[]);
    assert_eq!(command.central_producer_probability, 0.5);
    assert_eq!(command.region_producer_probability, 0.2);
    assert_eq!(command.inter_region_pipe_probability, 0.1);
    assert_eq!(command.nodes_per_region, 100);
    assert_eq!(command.regions, 4);
    assert_eq!(command.max_diameter, 12);
    assert_eq!(command.min_cycle_length, 3);
    assert_eq!(command.target_ratio, 1.01);
    assert_eq!(command.min_producer_distance, 3);
    assert_eq!(command.producers, 3);
    assert_eq!(command.max_degree, 3);
    assert_eq!(command.jump_step, 1);
    assert_eq!(command.edge_weight_mean, 1.5);
    assert_eq!(command.edge_weight_std, 0.2);
    assert_eq!(command.min_pipe_diameter, 0.05);
    assert_eq!(command.max_pipe_diameter, 0.5);
    assert_eq!(command.min_pipe_h, 0.8);
    assert_eq!(command.max_pipe_h, 4.0);
    assert_eq!(command.max_attempts, 32);
    assert_eq!(command.backfill, BackfillArg::from(BackfillBoundary::default()));
    assert_eq!(command.seed, None);
    assert!(!command.one_based);
}

#[rstest]
#[case("exclusive", BackfillBoundary::Exclusive)]
#[case("inclusive", BackfillBoundary::Inclusive)]
fn backfill_flag_maps_to_boundary(#[case] raw: &str, #[case] expected: BackfillBoundary) {
    let command = parse(&["--backfill", raw]);
    assert_eq!(BackfillBoundary::from(command.backfill), expected);
}

#[rstest]
#[case(&["generate", "--backfill", "sometimes"])]
#[case(&["generate", "--regions", "many"])]
#[case(&["generate", "--unknown"])]
#[case(&["render"])]
fn rejects_malformed_arguments(#[case] args: &[&str]) {
    let args = std::iter::once("dhngen").chain(args.iter().copied());
    assert!(Cli::try_parse_from(args).is_err());
}

#[rstest]
fn same_seed_renders_identical_output(small: GenerateCommand) -> TestResult {
    let first = run_command(&small)?;
    let second = run_command(&small)?;
    assert_eq!(first.seed, 11);
    assert_eq!(render(&first), render(&second));
    Ok(())
}

#[rstest]
fn summary_lists_every_node_and_pipe(small: GenerateCommand) -> TestResult {
    let summary = run_cli(Cli {
        command: Command::Generate(small),
    })?;
    let output = render(&summary);
    let stats = summary.topology.stats();

    assert!(output.starts_with("seed: 11\n"));
    assert!(output.contains(&format!("nodes: {}\n", stats.nodes)));
    assert!(output.contains(&format!("pipes: {}\n", stats.pipes)));
    assert!(output.contains("\nid\tx\ty\tproducer\tregion\n"));
    assert!(output.contains("\nsource\ttarget\tweight\tlength\tdiameter\th\n"));

    let rows = output.lines().filter(|line| line.split('\t').count() >= 4).count();
    // Both header rows plus one row per node and per pipe.
    assert_eq!(rows, stats.nodes + stats.pipes + 2);
    Ok(())
}

#[rstest]
fn pipe_rows_carry_diameter_and_convective_coefficient(small: GenerateCommand) -> TestResult {
    let mut command = small;
    command.min_pipe_diameter = 0.25;
    command.max_pipe_diameter = 0.25;
    command.min_pipe_h = 2.0;
    command.max_pipe_h = 2.0;
    let summary = run_command(&command)?;
    let output = render(&summary);

    let pipe_rows: Vec<&str> = output
        .lines()
        .skip_while(|line| !line.starts_with("source\t"))
        .skip(1)
        .collect();
    assert_eq!(pipe_rows.len(), summary.topology.stats().pipes);
    assert!(
        pipe_rows.iter().all(|row| row.ends_with("\t0.2500\t2.0000")),
        "unexpected pipe rows: {pipe_rows:?}"
    );
    Ok(())
}

#[rstest]
fn one_based_output_shifts_ids(small: GenerateCommand) -> TestResult {
    let mut command = small;
    command.one_based = true;
    command.central_producer_probability = 1.0;
    let summary = run_command(&command)?;
    let output = render(&summary);

    let first_node = output
        .lines()
        .skip_while(|line| !line.starts_with("id\t"))
        .nth(1)
        .expect("node table has rows");
    assert!(first_node.starts_with("1\t"));
    assert!(first_node.ends_with("\t1\t-"), "central node row: {first_node}");
    let producers = output
        .lines()
        .find_map(|line| line.strip_prefix("producers: "))
        .expect("producer line");
    assert!(producers.split(' ').any(|id| id == "1"));
    Ok(())
}

#[rstest]
#[case::probability(&["--central-producer-probability", "1.5"], "PARAMS_INVALID_PROBABILITY")]
#[case::degree(&["--max-degree", "1"], "PARAMS_DEGREE_TOO_SMALL")]
#[case::jump(&["--jump-step", "0"], "PARAMS_ZERO_JUMP_STEP")]
#[case::attempts(&["--max-attempts", "0"], "PARAMS_ZERO_BUDGET")]
#[case::diameter(&["--min-pipe-diameter", "0.6"], "PARAMS_INVALID_RANGE")]
#[case::convective(&["--min-pipe-h", "0"], "PARAMS_INVALID_RANGE")]
fn invalid_flags_surface_params_errors(#[case] flags: &[&str], #[case] code: &str) {
    let err = run_command(&parse(flags)).expect_err("parameters must be rejected");
    assert!(matches!(err, CliError::Params(_)));
    assert_eq!(err.code(), code);
}

#[test]
fn generation_errors_keep_their_code() {
    let err = CliError::from(GenerationError::RetriesExhausted { attempts: 2 });
    assert_eq!(err.code(), "GENERATION_RETRIES_EXHAUSTED");
    assert_eq!(err.to_string(), "no connected network after 2 assembly attempts");
    let err = CliError::from(ParamsError::NoRegions);
    assert_eq!(err.code(), "PARAMS_NO_REGIONS");
}

#[rstest]
fn run_cli_emits_tracing_fields(small: GenerateCommand) -> TestResult {
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let cli = Cli {
        command: Command::Generate(small),
    };

    let summary = tracing::subscriber::with_default(subscriber, || run_cli(cli))?;
    assert_eq!(summary.seed, 11);

    let run = layer.span("cli.run").expect("cli.run span must exist");
    assert_eq!(run.fields.get("command"), Some(&"generate".to_owned()));

    let execute = layer.span("cli.execute").expect("cli.execute span must exist");
    assert_eq!(execute.fields.get("seed"), Some(&"11".to_owned()));
    assert_eq!(execute.fields.get("regions"), Some(&"3".to_owned()));
    assert_eq!(execute.fields.get("nodes_per_region"), Some(&"15".to_owned()));

    assert!(layer.span("core.generate").is_some());
    assert!(layer.has_event(Level::INFO, "command completed"));
    Ok(())
}

#[rstest]
fn failed_runs_record_the_error_on_the_span() {
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let command = parse(&["--regions", "0"]);

    let err = tracing::subscriber::with_default(subscriber, || run_command(&command))
        .expect_err("zero regions must fail");
    assert!(matches!(err, CliError::Params(ParamsError::NoRegions)));

    let events = layer.events();
    assert!(events.iter().any(|event| {
        event.level == Level::ERROR
            && event.span.as_deref() == Some("cli.execute")
            && event
                .fields
                .get("error")
                .is_some_and(|value| value == "region_count must be at least 1")
    }));
}
