use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};

use lectio::orchestrate::{DirectoryAssets, JsonContentSource, PipelineRenderer};
use lectio::text::{FixedAdvanceMetrics, FontFace, FontMetrics, resolve_font_path};
use lectio::{ContentItem, ItemState, MediaAssetBundle, RenderConfig, Scheduler};

#[derive(Parser, Debug)]
#[command(name = "lectio", version)]
struct Cli {
    /// Render config JSON. Defaults apply to every field it omits.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the caption word positions of an item as JSON.
    Layout(LayoutArgs),
    /// Render a single still frame as a PNG.
    Frame(FrameArgs),
    /// Render one item to a video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Render every reading of a date from a content file.
    Batch(BatchArgs),
}

#[derive(Parser, Debug)]
struct LayoutArgs {
    /// Content item JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Measure with a fixed per-character advance instead of the font.
    #[arg(long)]
    approximate: bool,

    /// Output path; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Content item JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Media root holding `<item id>/` directories.
    #[arg(long)]
    assets: PathBuf,

    /// Narration progress in `[0, 1]`.
    #[arg(long, default_value_t = 0.0)]
    progress: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Content item JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Media root holding `<item id>/` directories.
    #[arg(long)]
    assets: PathBuf,

    /// Output video path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// JSON file mapping dates to content items.
    #[arg(long)]
    content: PathBuf,

    /// Date key to render.
    #[arg(long)]
    date: String,

    /// Media root holding `<item id>/` directories.
    #[arg(long)]
    assets: PathBuf,

    /// Directory receiving `<item id>.<ext>`.
    #[arg(long)]
    out_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let cfg = load_config(cli.config.as_deref())?;
    match cli.cmd {
        Command::Layout(args) => cmd_layout(args, &cfg),
        Command::Frame(args) => cmd_frame(args, cfg),
        Command::Render(args) => cmd_render(args, &cfg).await,
        Command::Batch(args) => cmd_batch(args, cfg).await,
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<RenderConfig> {
    let cfg = match path {
        Some(p) => RenderConfig::from_path(p)?,
        None => RenderConfig::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

fn item_bundle(item: &ContentItem, assets: &Path) -> anyhow::Result<MediaAssetBundle> {
    let dir = DirectoryAssets::new(assets);
    let mut bundle = MediaAssetBundle::empty(item.id.clone());
    bundle.images = dir.find_images(item)?;
    bundle.audio = Some(dir.find_audio(item)?);
    Ok(bundle)
}

fn cmd_layout(args: LayoutArgs, cfg: &RenderConfig) -> anyhow::Result<()> {
    let item = ContentItem::from_path(&args.in_path)?;
    let mut metrics: Box<dyn FontMetrics> = if args.approximate {
        Box::new(FixedAdvanceMetrics::approximate(cfg.caption_font_size))
    } else {
        let path = resolve_font_path(cfg.font_path.as_deref())?;
        Box::new(FontFace::from_path(&path, cfg.caption_font_size)?)
    };
    let map = lectio::layout(
        &item.body_text,
        cfg.caption_max_width,
        f64::from(cfg.canvas.width),
        cfg.line_height,
        metrics.as_mut(),
    );
    let json = serde_json::to_string_pretty(&map).context("serialize word positions")?;
    match args.out {
        Some(out) => {
            std::fs::write(&out, json).with_context(|| format!("write '{}'", out.display()))?;
            eprintln!("wrote {} ({} words)", out.display(), map.len());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs, cfg: RenderConfig) -> anyhow::Result<()> {
    let item = ContentItem::from_path(&args.in_path)?;
    let bundle = item_bundle(&item, &args.assets)?;
    let mut painter = lectio::Compositor::new(cfg.clone())?;
    let frame = lectio::render_still(&mut painter, &item, &bundle, &cfg, args.progress)?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let png = frame.to_png()?;
    std::fs::write(&args.out, png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

async fn cmd_render(args: RenderArgs, cfg: &RenderConfig) -> anyhow::Result<()> {
    let item = ContentItem::from_path(&args.in_path)?;
    let bundle = item_bundle(&item, &args.assets)?;
    let video = lectio::render(&item, &bundle, cfg).await?;
    video.write_to(&args.out)?;

    eprintln!(
        "wrote {} ({} frames, {:.1}s, {})",
        args.out.display(),
        video.frame_count,
        video.duration.as_secs_f64(),
        video.mime
    );
    Ok(())
}

async fn cmd_batch(args: BatchArgs, cfg: RenderConfig) -> anyhow::Result<()> {
    let source = JsonContentSource::from_path(&args.content)?;
    let generator = Arc::new(DirectoryAssets::new(&args.assets));
    let renderer = Arc::new(PipelineRenderer::new(cfg));
    let mut scheduler = Scheduler::new(generator, renderer);
    scheduler.load_date(&source, &args.date).await?;
    scheduler.run_until_idle().await;

    let mut failed = 0usize;
    for rec in scheduler.records() {
        match (&rec.state, &rec.bundle.rendered_video) {
            (ItemState::VideoReady, Some(video)) => {
                let out = args
                    .out_dir
                    .join(format!("{}.{}", rec.item.id, video.container.extension()));
                video.write_to(&out)?;
                eprintln!("wrote {}", out.display());
            }
            (state, _) => {
                failed += 1;
                eprintln!(
                    "{}: {} ({})",
                    rec.item.id,
                    state.name(),
                    rec.failures.last().map(String::as_str).unwrap_or("no result")
                );
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} items did not render", scheduler.records().len());
    }
    Ok(())
}
