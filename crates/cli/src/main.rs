use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use trim_engine::timecode::{Timecode, TimecodeFormat};
use trim_engine::{
    build_preview_edges, compute_preview_geometry, compute_shared_delta, find_best_roll_pair,
    pick_edges, roll_zone_predicate, BoundaryModel, Clip, ClipSource, PickGeometry, PickResult,
    RationalTime, RollCandidate, SelectedEdge, TrackId, TrackSnapshot, TrimConfig,
    TrimConstraints, Viewport,
};

#[derive(Parser)]
#[command(name = "trimctl")]
#[command(about = "Headless driver for the timeline trim engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,

    /// Trim configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    zones: ZoneOverrides,
}

/// Single-field overrides on top of the configuration file.
#[derive(Args)]
struct ZoneOverrides {
    /// Maximum cursor distance to a boundary, in pixels
    #[arg(long, global = true)]
    edge_zone: Option<f64>,

    /// Width of the roll zone centred on a boundary, in pixels
    #[arg(long, global = true)]
    roll_zone: Option<f64>,

    /// Minimum on-screen width of an element whose edges can be picked
    #[arg(long, global = true)]
    min_width: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick the edge or roll pair under the cursor
    Pick {
        /// Scenario file path
        scenario: PathBuf,

        /// Cursor x in pixels (overrides the scenario)
        #[arg(long, allow_hyphen_values = true)]
        cursor: Option<f64>,
    },

    /// Find the best roll pair among the edges near the cursor
    RollPair {
        /// Scenario file path
        scenario: PathBuf,

        /// Cursor x in pixels (overrides the scenario)
        #[arg(long, allow_hyphen_values = true)]
        cursor: Option<f64>,
    },

    /// Clamp a drag delta across the selected edges and print the preview
    Drag {
        /// Scenario file path
        scenario: PathBuf,

        /// Requested delta in frames at the viewport rate (overrides the scenario)
        #[arg(long, allow_hyphen_values = true)]
        delta: Option<i64>,

        /// Cursor x used to pick edges when the scenario lists none
        #[arg(long, allow_hyphen_values = true)]
        cursor: Option<f64>,
    },
}

/// One track as the host would hand it over, plus the pointer state.
#[derive(Deserialize)]
struct Scenario {
    #[serde(default)]
    track: Option<TrackId>,
    viewport: Viewport,
    viewport_width: f64,
    #[serde(default)]
    cursor_x: Option<f64>,
    clips: Vec<Clip>,
    #[serde(default)]
    drag: DragScenario,
}

#[derive(Deserialize, Default)]
struct DragScenario {
    #[serde(default)]
    edges: Vec<SelectedEdge>,
    #[serde(default)]
    lead: Option<SelectedEdge>,
    #[serde(default)]
    delta: Option<RationalTime>,
    #[serde(default)]
    constraints: TrimConstraints,
}

/// The scenario resolved against a clip source.
struct Track {
    id: TrackId,
    clips: Vec<Clip>,
    viewport: Viewport,
    width: f64,
}

impl Scenario {
    fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse scenario {}", path.display()))
    }

    fn track(&self) -> Result<Track> {
        let snapshot = TrackSnapshot::from_clips(self.clips.iter().cloned());
        let id = match &self.track {
            Some(id) => id.clone(),
            None => snapshot
                .track_ids()
                .min()
                .cloned()
                .context("Scenario has no clips")?,
        };
        let viewport = Viewport::new(self.viewport.start, self.viewport.duration)
            .context("Invalid viewport")?;
        Ok(Track {
            clips: snapshot.clips_for_track(&id),
            id,
            viewport,
            width: self.viewport_width,
        })
    }

    fn cursor(&self, flag: Option<f64>) -> Result<f64> {
        flag.or(self.cursor_x)
            .context("No cursor position: pass --cursor or set cursor_x")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref(), &cli.zones)?;

    match cli.command {
        Commands::Pick { scenario, cursor } => pick_command(&scenario, cursor, &config),
        Commands::RollPair { scenario, cursor } => roll_pair_command(&scenario, cursor, &config),
        Commands::Drag {
            scenario,
            delta,
            cursor,
        } => drag_command(&scenario, delta, cursor, &config),
    }
}

fn load_config(path: Option<&Path>, zones: &ZoneOverrides) -> Result<TrimConfig> {
    let mut config = match path {
        Some(path) => TrimConfig::from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TrimConfig::default(),
    };
    if zones.edge_zone.is_some() {
        config.pick.edge_zone_px = zones.edge_zone;
    }
    if zones.roll_zone.is_some() {
        config.pick.roll_zone_px = zones.roll_zone;
    }
    if zones.min_width.is_some() {
        config.pick.min_edge_selectable_width_px = zones.min_width;
    }
    debug!(?config, "trim config loaded");
    Ok(config)
}

fn timecode(time: &RationalTime) -> String {
    Timecode::from_time(time, TimecodeFormat::recommended_for(time.fps)).to_string()
}

fn pick(track: &Track, cursor_x: f64, config: &TrimConfig) -> Result<PickResult> {
    let geometry = PickGeometry::new(&track.viewport, track.width);
    pick_edges(&track.clips, cursor_x, Some(geometry), &config.pick)
        .context("Edge pick failed")
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn pick_command(path: &Path, cursor: Option<f64>, config: &TrimConfig) -> Result<()> {
    let scenario = Scenario::load(path)?;
    let track = scenario.track()?;
    let cursor_x = scenario.cursor(cursor)?;

    let result = pick(&track, cursor_x, config)?;
    match &result.boundary {
        Some(boundary) if !result.is_empty() => info!(
            "Picked {} edge(s) at {} on track {}{}",
            result.selection.len(),
            timecode(&boundary.time),
            track.id,
            if result.roll_used { " (roll)" } else { "" }
        ),
        _ => info!("No editable edge under x={}", cursor_x),
    }

    print_json(&json!({
        "track": track.id,
        "cursor_x": cursor_x,
        "boundary_timecode": result.boundary.as_ref().map(|b| timecode(&b.time)),
        "result": result,
    }))
}

fn roll_pair_command(path: &Path, cursor: Option<f64>, config: &TrimConfig) -> Result<()> {
    let scenario = Scenario::load(path)?;
    let track = scenario.track()?;
    let cursor_x = scenario.cursor(cursor)?;
    let zones = config.zones()?;

    let model = BoundaryModel::build(&track.clips, &track.viewport, track.width);
    let clips = &track.clips;
    let candidates: Vec<RollCandidate> = model
        .boundaries()
        .iter()
        .filter(|b| (b.pixel_x - cursor_x).abs() <= zones.edge_zone_px)
        .flat_map(|b| {
            let distance = (b.pixel_x - cursor_x).abs();
            [&b.left, &b.right]
                .into_iter()
                .flatten()
                .filter_map(move |edge| {
                    let clip = clips.iter().find(|c| c.id == edge.clip_id)?;
                    Some(RollCandidate::new(clip.clone(), edge.edge_type, distance))
                })
        })
        .collect();
    debug!(candidates = candidates.len(), "roll candidates gathered");

    let found = find_best_roll_pair(
        &candidates,
        cursor_x,
        track.width,
        roll_zone_predicate(&track.viewport, zones.roll_zone_px),
    );
    match &found {
        Some(found) => info!(
            "Roll pair {} / {} at {}",
            found.pair.left.key(),
            found.pair.right.key(),
            timecode(&found.pair.edit_time)
        ),
        None => info!("No roll pair near x={}", cursor_x),
    }

    print_json(&json!({
        "track": track.id,
        "cursor_x": cursor_x,
        "candidates": candidates,
        "selection": found.as_ref().map(|f| &f.selection),
        "pair": found.as_ref().map(|f| &f.pair),
        "score": found.as_ref().map(|f| f.score),
    }))
}

fn drag_command(
    path: &Path,
    delta_frames: Option<i64>,
    cursor: Option<f64>,
    config: &TrimConfig,
) -> Result<()> {
    let scenario = Scenario::load(path)?;
    let track = scenario.track()?;
    let drag = &scenario.drag;

    let (edges, picked_lead) = if drag.edges.is_empty() {
        let result = pick(&track, scenario.cursor(cursor)?, config)?;
        (result.selection, result.dragged_edge)
    } else {
        (drag.edges.clone(), None)
    };
    if edges.is_empty() {
        bail!("Nothing to drag: the scenario lists no edges and the cursor picks none");
    }
    let lead = drag
        .lead
        .clone()
        .or(picked_lead)
        .or_else(|| edges.first().cloned());

    let delta = match (delta_frames, drag.delta) {
        (Some(frames), _) => RationalTime::new(frames, track.viewport.duration.fps),
        (None, Some(delta)) => delta,
        (None, None) => bail!("No drag delta: pass --delta or set drag.delta"),
    };

    let shared = compute_shared_delta(&edges, delta, &drag.constraints, lead.as_ref());
    let preview = build_preview_edges(
        &edges,
        delta,
        &drag.constraints,
        &config.colors,
        lead.as_ref(),
    );
    info!(
        "Requested {} -> applied {} across {} edge(s)",
        timecode(&delta),
        timecode(&shared.delta),
        preview.len()
    );

    let geometry: Vec<_> = preview
        .iter()
        .filter_map(|edge| {
            let clip = track.clips.iter().find(|c| c.id == edge.clip_id)?;
            let geometry = compute_preview_geometry(clip, Some(edge.edge_type), edge.delta, None);
            Some(json!({
                "clip_id": edge.clip_id,
                "start": geometry.start,
                "start_timecode": timecode(&geometry.start),
                "duration": geometry.duration,
                "edge_type": geometry.edge_type,
            }))
        })
        .collect();

    print_json(&json!({
        "track": track.id,
        "lead": lead,
        "requested": delta,
        "applied": shared.delta,
        "applied_timecode": timecode(&shared.delta),
        "range": shared.range,
        "empty_range": shared.is_empty_range(),
        "edges": preview,
        "geometry": geometry,
    }))
}
