use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use stepparity::api::*;
use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::EnvFilter;

mod provenance;

#[derive(Parser)]
#[command(name = "stepparity")]
#[command(about = "Infer foot parity (which foot hits which note) for dance-pad charts")]
struct Cmd {
    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    action: Action,
}

#[derive(Args)]
struct ChartArgs {
    /// Chart JSON: {"type": <pad>, "bpm": .., "offset": .., "notes": [..]}
    #[arg(long)]
    chart: PathBuf,
    /// Pad type; defaults to the chart's own
    #[arg(long)]
    layout: Option<String>,
    /// Flat JSON object of weight name -> value
    #[arg(long)]
    weights: Option<PathBuf>,
    /// JSON object of beat -> per-column foot ordinals
    #[arg(long)]
    overrides: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Action {
    /// Analyze a chart and write the parity result ([[foot ordinal]] per row)
    Analyze {
        #[command(flatten)]
        input: ChartArgs,
        #[arg(long)]
        out: PathBuf,
        /// Also write the step graph export
        #[arg(long)]
        graph: Option<PathBuf>,
        /// Also write the annotation payload (selected nodes, overrides, parities)
        #[arg(long)]
        annotations: Option<PathBuf>,
        /// Also write the chart with per-note annotations
        #[arg(long)]
        annotated: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Print technique counts (XO, FS, SS, JA, BR, DS) of a chart
    Techs {
        #[command(flatten)]
        input: ChartArgs,
    },
    /// Print the default cost weights
    Weights,
    /// Write a seeded random chart
    Sample {
        #[arg(long, default_value = "dance-single")]
        layout: String,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 64)]
        steps: usize,
        #[arg(long, default_value_t = 150.0)]
        bpm: f64,
        /// Output path; stdout if omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print a small provenance JSON block
    Report,
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let level = match cmd.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    SubscriberBuilder::default()
        .with_target(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
    match cmd.action {
        Action::Analyze {
            input,
            out,
            graph,
            annotations,
            annotated,
            pretty,
        } => analyze(input, out, graph, annotations, annotated, pretty),
        Action::Techs { input } => techs(input),
        Action::Weights => weights(),
        Action::Sample {
            layout,
            seed,
            steps,
            bpm,
            out,
        } => sample(layout, seed, steps, bpm, out),
        Action::Report => report(),
    }
}

type Engine = ParityEngine<Chart, ConstantBpm>;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}

/// Load the chart, build the engine, apply weights, analyze, then apply overrides.
fn prepare(input: &ChartArgs) -> Result<Engine> {
    let mut chart: Chart = read_json(&input.chart)?;
    chart.notes.sort_by(|a, b| a.beat.total_cmp(&b.beat));
    let timing = chart.timing();
    assign_seconds(&mut chart.notes, &timing);

    let layout_name = input.layout.clone().unwrap_or_else(|| chart.layout.clone());
    let layout = StageLayout::by_name(&layout_name)
        .with_context(|| format!("known layouts: {}", StageLayout::catalog().join(", ")))?;
    let mut engine = ParityEngine::new(chart, timing, layout);

    if let Some(path) = &input.weights {
        let update: BTreeMap<String, f64> = read_json(path)?;
        let changed = engine.update_weights(&update)?;
        tracing::info!(changed, "weights applied");
    }
    engine.analyze()?;

    if let Some(path) = &input.overrides {
        let by_beat: BTreeMap<String, Vec<Foot>> = read_json(path)?;
        for (key, feet) in by_beat {
            let beat: f64 = key
                .parse()
                .with_context(|| format!("override key {key:?} is not a beat"))?;
            if !engine.update_row_override(beat, feet)? {
                tracing::warn!(beat, "override not applicable; skipped");
            }
        }
    }
    Ok(engine)
}

fn analyze(
    input: ChartArgs,
    out: PathBuf,
    graph: Option<PathBuf>,
    annotations: Option<PathBuf>,
    annotated: Option<PathBuf>,
    pretty: bool,
) -> Result<()> {
    let engine = prepare(&input)?;
    let analysis = engine
        .analysis()
        .ok_or_else(|| anyhow!("{} has no judged notes", input.chart.display()))?;
    tracing::info!(
        rows = analysis.rows.len(),
        nodes = analysis.graph.len(),
        cost = analysis.graph.path_cost(&analysis.selected_nodes),
        overrides = engine.overrides().len(),
        "analyzed"
    );

    write_file(&out, &engine.serialize_parity_data(pretty)?)?;
    let mut extra: Vec<&Path> = Vec::new();
    if let Some(path) = &graph {
        write_file(path, &engine.serialize_step_graph()?)?;
        extra.push(path);
    }
    if let Some(path) = &annotations {
        let payload = engine
            .annotation_payload()
            .ok_or_else(|| anyhow!("no analysis to annotate"))?;
        write_file(path, &payload.to_json()?)?;
        extra.push(path);
    }
    if let Some(path) = &annotated {
        let doc = if pretty {
            serde_json::to_string_pretty(engine.source())?
        } else {
            serde_json::to_string(engine.source())?
        };
        write_file(path, &doc)?;
        extra.push(path);
    }

    let mut payload = provenance::Payload::new(
        "analyze",
        json!({
            "layout": engine.layout().name(),
            "weights": engine.weights(),
            "override_beats": engine.overrides().len(),
        }),
    )
    .input(&input.chart);
    for p in [&input.weights, &input.overrides].into_iter().flatten() {
        payload = payload.input(p);
    }
    let prov = provenance::write_sidecar(&out, &extra, payload)?;
    tracing::info!(out = %out.display(), provenance = %prov.display(), "written");
    Ok(())
}

fn techs(input: ChartArgs) -> Result<()> {
    let engine = prepare(&input)?;
    let tech = engine
        .tech()
        .ok_or_else(|| anyhow!("{} has no judged notes", input.chart.display()))?;
    let obj = json!({
        "layout": engine.layout().name(),
        "rows": engine.parities().len(),
        "counts": tech.counts,
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

fn weights() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&Engine::default_weights())?);
    Ok(())
}

fn sample(layout: String, seed: u64, steps: usize, bpm: f64, out: Option<PathBuf>) -> Result<()> {
    let pad = StageLayout::by_name(&layout)?;
    let params = ChartGenParams {
        steps,
        bpm,
        ..Default::default()
    };
    let notes = random_chart(params, pad.column_count(), seed)?;
    tracing::info!(layout, seed, notes = notes.len(), "sampled");
    let chart = Chart {
        layout,
        bpm,
        offset: 0.0,
        notes,
    };
    let doc = serde_json::to_string_pretty(&chart)?;
    match out {
        Some(path) => write_file(&path, &doc),
        None => {
            println!("{doc}");
            Ok(())
        }
    }
}

fn report() -> Result<()> {
    let mut obj = provenance::base_block();
    obj["layouts"] = json!(StageLayout::catalog());
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_chart(dir: &Path) -> PathBuf {
        let path = dir.join("chart.json");
        let chart = json!({
            "type": "dance-single",
            "bpm": 120.0,
            "notes": [
                {"col": 3, "beat": 1.0, "type": "Tap"},
                {"col": 0, "beat": 0.0, "type": "Tap"}
            ]
        });
        fs::write(&path, chart.to_string()).unwrap();
        path
    }

    fn args(chart: PathBuf) -> ChartArgs {
        ChartArgs {
            chart,
            layout: None,
            weights: None,
            overrides: None,
        }
    }

    #[test]
    fn prepare_sorts_times_and_analyzes() {
        let dir = tempdir().unwrap();
        let engine = prepare(&args(write_chart(dir.path()))).unwrap();
        assert_eq!(engine.source().notes[0].beat, 0.0);
        assert_eq!(engine.source().notes[1].second, 0.5);
        assert_eq!(engine.parities().len(), 2);
    }

    #[test]
    fn analyze_writes_parity_graph_and_sidecar() {
        let dir = tempdir().unwrap();
        let chart = write_chart(dir.path());
        let overrides = dir.path().join("overrides.json");
        fs::write(&overrides, r#"{"1": [0, 0, 0, 1]}"#).unwrap();
        let out = dir.path().join("out").join("parity.json");
        let graph = dir.path().join("graph.json");
        let mut input = args(chart);
        input.overrides = Some(overrides);
        analyze(input, out.clone(), Some(graph.clone()), None, None, false).unwrap();

        let parity: Vec<Vec<u8>> = serde_json::from_slice(&fs::read(&out).unwrap()).unwrap();
        assert_eq!(parity, vec![vec![3, 0, 0, 0], vec![0, 0, 0, 1]]);
        assert!(graph.exists());
        let prov = dir.path().join("out").join("parity.provenance.json");
        let doc: serde_json::Value = serde_json::from_slice(&fs::read(prov).unwrap()).unwrap();
        assert_eq!(doc["params"]["override_beats"], 1);
        assert_eq!(doc["outputs"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn unknown_layout_is_reported() {
        let dir = tempdir().unwrap();
        let mut input = args(write_chart(dir.path()));
        input.layout = Some("pump-single".into());
        let err = prepare(&input).err().unwrap();
        assert!(format!("{err:#}").contains("dance-double"));
    }
}
