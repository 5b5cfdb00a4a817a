use anyhow::Context as _;
use clap::{Parser, Subcommand};
use modelview_assets::import_model;
use modelview_common::AssetLocation;
use modelview_render::DebugTextRenderer;
use modelview_ui::Action;
use modelview_viewer::{ResizeListeners, Viewer, ViewerConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "modelview-cli", about = "CLI tool for the model viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print node, mesh and animation counts of a model
    Inspect {
        /// glTF or GLB file, or an http(s) URL
        model: String,
    },
    /// Load a model headlessly and print one debug frame
    Frame {
        /// glTF or GLB file, or an http(s) URL
        model: String,
        /// Animation frame to seek to before rendering
        #[arg(short, long)]
        frame: Option<f32>,
        /// Reset the camera before rendering
        #[arg(long)]
        reset_camera: bool,
        /// Viewer configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the default viewer configuration as JSON
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("modelview-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", modelview_common::crate_info());
            println!("assets: {}", modelview_assets::crate_info());
            println!("scene: {}", modelview_scene::crate_info());
            println!("render: {}", modelview_render::crate_info());
            println!("ui: {}", modelview_ui::crate_info());
            println!("viewer: {}", modelview_viewer::crate_info());
        }
        Commands::Inspect { model } => {
            let location = AssetLocation::parse(&model);
            let data = import_model(&location)
                .with_context(|| format!("failed to import {location}"))?;
            println!("{}", data.summary());
            for (i, node) in data.nodes.iter().enumerate() {
                let parent = node
                    .parent
                    .map_or_else(|| "-".to_string(), |p| p.to_string());
                let mesh = node.mesh.map_or_else(|| "-".to_string(), |m| m.to_string());
                println!("  node {i} '{}' parent={parent} mesh={mesh}", node.name);
            }
        }
        Commands::Frame {
            model,
            frame,
            reset_camera,
            config,
        } => {
            let mut config = match config {
                Some(path) => ViewerConfig::load(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => ViewerConfig::default(),
            };
            config.asset = AssetLocation::parse(&model);
            config.autoplay = false;

            let (width, height) = (config.window.width, config.window.height);
            let mut listeners = ResizeListeners::new();
            let mut viewer = Viewer::mount(
                config,
                DebugTextRenderer::new(width, height),
                width,
                height,
                &mut listeners,
            );
            let result = import_model(viewer.asset_location());
            if !viewer.on_model_imported(result) {
                viewer.unmount(&mut listeners);
                anyhow::bail!("model could not be loaded");
            }
            if let Some(frame) = frame {
                viewer.dispatch(Action::SeekFrame(frame));
            }
            if reset_camera {
                viewer.dispatch(Action::ResetCamera);
            }
            print!("{}", viewer.frame(0.0));
            viewer.unmount(&mut listeners);
        }
        Commands::Config => {
            println!("{}", ViewerConfig::default().to_json()?);
        }
    }

    Ok(())
}
