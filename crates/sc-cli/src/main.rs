//! SC command line: load a JSON scene, optionally auto-arrange it and route
//! connectors on the background worker, and print the result as JSON.
//!
//! ```text
//! sc-cli <scene.json> [--config <config.json>] [--arrange] [--connectors]
//!        [--iterations N] [--timeout-ms N]
//! ```
//!
//! Set `RUST_LOG=debug` to watch task dispatch and resolution.

use sc_compute::{BridgeStats, ConnectorGeometry};
use sc_core::{
    CameraState, CanvasConfig, ConfigError, Connection, CullStats, Node, NodeId, Surface,
};
use sc_editor::{HostEvent, SpatialCanvas};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use thiserror::Error;

const USAGE: &str = "usage: sc-cli <scene.json> [--config <config.json>] [--arrange] \
                     [--connectors] [--iterations N] [--timeout-ms N]";

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}\n{USAGE}")]
    Usage(String),
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid scene: {0}")]
    Scene(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ─── Arguments ───────────────────────────────────────────────────────────

#[derive(Debug, Default, PartialEq)]
struct Args {
    scene: PathBuf,
    config: Option<PathBuf>,
    arrange: bool,
    connectors: bool,
    iterations: Option<u32>,
    timeout_ms: Option<u64>,
}

fn parse_args(args: &[String]) -> Result<Args, CliError> {
    let mut parsed = Args::default();
    let mut scene = None;
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--arrange" => parsed.arrange = true,
            "--connectors" => parsed.connectors = true,
            "--config" => parsed.config = Some(PathBuf::from(value(&mut it, arg)?)),
            "--iterations" => parsed.iterations = Some(number(&mut it, arg)?),
            "--timeout-ms" => parsed.timeout_ms = Some(number(&mut it, arg)?),
            flag if flag.starts_with("--") => {
                return Err(CliError::Usage(format!("unknown flag `{flag}`")));
            }
            path if scene.is_none() => scene = Some(PathBuf::from(path)),
            extra => return Err(CliError::Usage(format!("unexpected argument `{extra}`"))),
        }
    }
    parsed.scene = scene.ok_or_else(|| CliError::Usage("missing scene file".into()))?;
    Ok(parsed)
}

fn value<'a>(it: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<&'a String, CliError> {
    it.next()
        .ok_or_else(|| CliError::Usage(format!("`{flag}` needs a value")))
}

fn number<'a, T: std::str::FromStr>(
    it: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<T, CliError> {
    let raw = value(it, flag)?;
    raw.parse()
        .map_err(|_| CliError::Usage(format!("`{flag}` expects a number, got `{raw}`")))
}

// ─── Scene I/O ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneFile {
    nodes: Vec<Node>,
    #[serde(default)]
    connections: Vec<Connection>,
    #[serde(default)]
    camera: Option<CameraState>,
    #[serde(default)]
    surface: Option<Surface>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    nodes: &'a [Node],
    connectors: &'a [ConnectorGeometry],
    camera: CameraState,
    visible: Vec<NodeId>,
    cull: CullStats,
    updates: usize,
    bridge: BridgeStats,
}

fn read(path: &PathBuf) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.clone(),
        source,
    })
}

fn load_config(args: &Args) -> Result<CanvasConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => CanvasConfig::from_json(&read(path)?)?,
        None => CanvasConfig::default(),
    };
    if let Some(iterations) = args.iterations {
        config.layout_iterations = iterations;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.task_timeout_ms = timeout_ms;
    }
    config.validate()?;
    Ok(config)
}

// ─── Run ─────────────────────────────────────────────────────────────────

fn run(args: &Args) -> Result<String, CliError> {
    let config = load_config(args)?;
    let scene: SceneFile = serde_json::from_str(&read(&args.scene)?)?;
    let surface = scene.surface.unwrap_or_default();
    let poll_limit = config.task_timeout() + Duration::from_secs(1);
    log::debug!(
        "sc-cli: {} nodes, {} connections from {}",
        scene.nodes.len(),
        scene.connections.len(),
        args.scene.display()
    );

    let mut canvas = SpatialCanvas::new(config, surface, Vec::<HostEvent>::new())?;
    canvas.viewport_mut().set_animations_enabled(false);
    canvas.set_scene(scene.nodes, scene.connections);
    if let Some(camera) = scene.camera {
        canvas.viewport_mut().set_camera(camera);
    }

    if args.arrange {
        canvas.request_auto_arrange();
    }
    if args.connectors {
        canvas.request_connectors();
    }

    // Timeouts bound every task, so this loop always ends.
    let started = std::time::Instant::now();
    while canvas.has_pending_work() && started.elapsed() < poll_limit {
        canvas.tick(0.0);
        std::thread::sleep(Duration::from_millis(1));
    }

    let visible = canvas.visible_nodes();
    let report = Report {
        nodes: canvas.nodes(),
        connectors: canvas.connectors(),
        camera: canvas.viewport().camera(),
        visible: visible.paint_order().iter().map(|n| n.id).collect(),
        cull: visible.stats,
        updates: canvas.host().len(),
        bridge: canvas.bridge_stats(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = parse_args(&args).and_then(|args| run(&args));
    match result {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("sc-cli: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_flags_in_any_order() {
        let args = parse_args(&strings(&[
            "--arrange",
            "scene.json",
            "--iterations",
            "40",
            "--timeout-ms",
            "250",
            "--connectors",
        ]))
        .unwrap();
        assert_eq!(
            args,
            Args {
                scene: PathBuf::from("scene.json"),
                config: None,
                arrange: true,
                connectors: true,
                iterations: Some(40),
                timeout_ms: Some(250),
            }
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(parse_args(&[]), Err(CliError::Usage(_))));
        assert!(matches!(
            parse_args(&strings(&["a.json", "--iterations", "many"])),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            parse_args(&strings(&["a.json", "--timeout-ms"])),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            parse_args(&strings(&["a.json", "--verbose"])),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            parse_args(&strings(&["a.json", "b.json"])),
            Err(CliError::Usage(_))
        ));
    }

    #[test]
    fn overrides_feed_validation() {
        let args = Args {
            timeout_ms: Some(0),
            ..Args::default()
        };
        assert!(matches!(load_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn scene_file_accepts_optional_view() {
        let scene: SceneFile = serde_json::from_str(
            r#"{"nodes":[{"id":"a","x":0,"y":0,"width":10,"height":10}],
                "surface":{"width":1024,"height":768}}"#,
        )
        .unwrap();
        assert_eq!(scene.nodes.len(), 1);
        assert!(scene.connections.is_empty());
        assert_eq!(scene.surface, Some(Surface::new(1024.0, 768.0)));
        assert_eq!(scene.camera, None);
    }
}
