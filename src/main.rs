use anyhow::{bail, Context, Result};
use avatar_fx::config::Config;
use avatar_fx::{EffectId, EffectPipeline};
use clap::Parser;
use std::path::PathBuf;

/// avatar-fx - apply an effect to a remote avatar and save it as PNG
#[derive(Parser, Debug)]
#[command(name = "avatar-fx")]
#[command(version, about, long_about = None)]
struct Args {
    /// Source image URL (http or https)
    #[arg(short, long, required_unless_present = "list")]
    url: Option<String>,

    /// Effect name, e.g. sepia or pro_enhance
    #[arg(short, long, default_value = "none")]
    effect: String,

    /// Output file (default: avatar_<effect>.png)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print every effect name and exit
    #[arg(long)]
    list: bool,

    /// Print Prometheus metrics to stdout after rendering
    #[arg(long)]
    metrics: bool,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn print_effects() {
    for effect in EffectId::ALL {
        println!("{:<18} {}", effect.as_str(), effect.display_name());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.list {
        print_effects();
        return Ok(());
    }

    let config = load_config(args.config.as_ref())?;
    avatar_fx::logging::init_subscriber(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let Some(url) = args.url.as_deref() else {
        bail!("--url is required");
    };
    let effect: EffectId = args.effect.parse()?;

    tracing::info!(
        config_file = ?args.config,
        url = url,
        effect = effect.as_str(),
        fetch_timeout_secs = config.fetcher.timeout_secs,
        max_bytes = config.fetcher.max_bytes,
        "Configuration loaded successfully"
    );

    let pipeline = EffectPipeline::from_config(&config)?;
    let rendered = pipeline.render(url, effect).await?;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(rendered.file_name()));
    tokio::fs::write(&output, &rendered.data)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(
        output = %output.display(),
        width = rendered.width,
        height = rendered.height,
        bytes = rendered.content_length(),
        "Saved {}",
        effect.display_name()
    );

    if args.metrics {
        print!("{}", avatar_fx::metrics::export_text());
    }

    Ok(())
}
