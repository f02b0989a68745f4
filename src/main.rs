use anyhow::{Context, Result};
use clap::Parser;
use geointel::app::{GeoIntel, LocateRequest};
use geointel::credentials::Credentials;
use geointel::host::{stage_upload, PublicEndpoint};
use geointel::models::Config;
use geointel::source::ImageSource;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "geointel")]
#[command(about = "Estimate where a photo was taken from EXIF, reverse image search and visual analysis")]
struct CliArgs {
    /// Local image path or http(s) URL.
    #[arg(value_name = "IMAGE")]
    image: String,

    /// Free-text context passed to the model.
    #[arg(long)]
    context: Option<String>,

    /// Suspected location, e.g. a country or city.
    #[arg(long)]
    guess: Option<String>,

    /// Gemini API key (overrides GEMINI_API_KEY).
    #[arg(long)]
    gemini_key: Option<String>,

    /// SerpAPI key (overrides SERPAPI_KEY). Enables reverse image search.
    #[arg(long)]
    serpapi_key: Option<String>,

    /// Disable reverse image search even when a key is configured.
    #[arg(long)]
    no_search: bool,

    /// Gemini model ID.
    #[arg(long)]
    model: Option<String>,

    /// Public base URL under which local images are served.
    #[arg(long)]
    public_base_url: Option<String>,

    /// Port of the public static file server.
    #[arg(long)]
    http_port: Option<u16>,

    /// Copy local images here under a unique name before analysis.
    #[arg(long)]
    uploads_dir: Option<PathBuf>,

    /// Publish local images through Imgur instead of the static server.
    #[arg(long)]
    imgur: bool,
}

/// Layer command-line flags over the environment configuration.
fn apply_args(mut config: Config, args: &CliArgs) -> Config {
    let overrides = Credentials::new(
        args.gemini_key.as_deref().unwrap_or_default(),
        args.serpapi_key.as_deref().unwrap_or_default(),
        "",
    );
    config.credentials = config.credentials.with_overrides(&overrides);
    if args.no_search {
        config.credentials.serpapi_key = None;
    }

    if let Some(model) = &args.model {
        config.gemini_model = model.clone();
    }

    match (&args.public_base_url, &mut config.public_endpoint) {
        (Some(base), endpoint) => {
            let port = args.http_port.or(endpoint.as_ref().and_then(|e| e.port));
            *endpoint = Some(PublicEndpoint::new(base.clone(), port));
        }
        (None, Some(endpoint)) if args.http_port.is_some() => {
            endpoint.port = args.http_port;
        }
        _ => {}
    }

    if let Some(dir) = &args.uploads_dir {
        config.uploads_dir = Some(dir.clone());
    }
    if args.imgur {
        config.use_imgur = true;
    }

    config
}

async fn resolve_image(config: &Config, reference: &str) -> Result<ImageSource> {
    let source = ImageSource::parse(reference);
    match (&source, &config.uploads_dir) {
        (ImageSource::Local(path), Some(dir)) => {
            let staged = stage_upload(dir, path)
                .await
                .with_context(|| format!("Failed to stage {}", path.display()))?;
            Ok(ImageSource::Local(staged))
        }
        _ => Ok(source),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geointel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => apply_args(config, &args),
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let app = match GeoIntel::from_config(&config) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    let image = match resolve_image(&config, &args.image).await {
        Ok(image) => image,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    let mut request = LocateRequest::new(image);
    request.context_info = args.context.clone();
    request.location_guess = args.guess.clone();

    let result = app.locate(&request).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    if result.is_error() {
        warn!("Analysis finished with an error");
        std::process::exit(1);
    }

    info!("Analysis complete");
    Ok(())
}
