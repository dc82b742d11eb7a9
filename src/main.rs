use clap::{Parser, Subcommand};
use image_compressor::config::{self, AppConfig};
use image_compressor::convert::{ConversionRequest, ConversionResult, Converter};
use image_compressor::download::{DownloadTarget, download_filename};
use image_compressor::imaging::RustBackend;
use image_compressor::media_type::{FileDescriptor, resolve_type};
use image_compressor::progress::ProgressEvent;
use image_compressor::{output, server};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "image-compressor")]
#[command(about = "Convert and compress images between WebP, JPEG, PNG and ICO")]
#[command(version)]
struct Cli {
    /// Config file (optional; defaults apply when it does not exist)
    #[arg(long, default_value = "image-compressor.toml", global = true)]
    config: PathBuf,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Image file path or http(s) URL
    input: String,

    /// Override the input MIME type instead of resolving it
    #[arg(long)]
    input_type: Option<String>,

    /// Output MIME type (default from config)
    #[arg(long)]
    to: Option<String>,

    /// Compression level 0.0-1.0; 1.0 disables compression
    #[arg(long)]
    compression: Option<f32>,

    /// Directory to save the converted file into
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// File name for the converted file (default: input stem + new extension)
    #[arg(long)]
    filename: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one image and save the result
    Convert(ConvertArgs),
    /// Run the GET /api/image?url= passthrough endpoint
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// List supported types and extensions
    Types,
    /// Print a stock config file with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Convert(args) => {
            let config = config::load_config(&cli.config)?;
            run_convert(args, &config).await?;
        }
        Command::Serve { bind, port } => {
            let config = config::load_config(&cli.config)?;
            let bind = bind.unwrap_or(config.server.bind);
            let port = port.unwrap_or(config.server.port);
            server::start_server(&bind, port).await?;
        }
        Command::Types => output::print_type_table(),
        Command::GenConfig => print!("{}", config::stock_config_toml()),
    }

    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

async fn run_convert(args: ConvertArgs, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (mut file, bytes) = read_input(&args.input).await?;
    if let Some(input_type) = args.input_type {
        file.declared_type = input_type;
    }

    let input_type = resolve_type(&file).to_string();
    let output_type = args
        .to
        .unwrap_or_else(|| config.conversion.output_type.clone());
    let compression = args.compression.unwrap_or(config.conversion.compression);
    let input_len = bytes.len();

    let request = ConversionRequest::builder(bytes, input_type.clone())
        .output_type(output_type.clone())
        .compression_level(compression)
        .build()?;

    println!(
        "{}",
        output::format_conversion_header(&file.name, &input_type, &output_type, compression)
    );

    let (tx, rx) = std::sync::mpsc::channel::<ProgressEvent>();
    let printer = std::thread::spawn(move || {
        for event in rx {
            println!("{}", output::format_progress_event(&event));
        }
    });
    let result = tokio::task::spawn_blocking(move || {
        let converter = Converter::new(RustBackend::new());
        converter.convert(&request, Some(&tx))
    })
    .await?;
    printer
        .join()
        .map_err(|_| "progress printer panicked")?;

    match result {
        ConversionResult::Success { output_bytes } => {
            let filename = args
                .filename
                .unwrap_or_else(|| download_filename(&file.name, &output_type));
            let directory = args
                .output_dir
                .unwrap_or_else(|| PathBuf::from(&config.download.directory));
            let path = DownloadTarget::new(directory).trigger_download(&output_bytes, &filename)?;
            println!("{}", output::format_saved(&path, input_len, output_bytes.len()));
            Ok(())
        }
        ConversionResult::Failure { error_message } => {
            Err(output::format_failure(&error_message).into())
        }
    }
}

/// Load the input as bytes plus what the resolver needs to know about it.
async fn read_input(input: &str) -> Result<(FileDescriptor, Vec<u8>), Box<dyn std::error::Error>> {
    if input.starts_with("http://") || input.starts_with("https://") {
        let fetched = server::fetch_remote(&reqwest::Client::new(), input).await?;
        let declared_type = fetched
            .content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_string())
            .unwrap_or_default();
        let name = reqwest::Url::parse(input)
            .ok()
            .and_then(|url| url.path_segments()?.next_back().map(str::to_string))
            .filter(|segment| !segment.is_empty())
            .unwrap_or_else(|| "image".to_string());
        return Ok((FileDescriptor::new(declared_type, name), fetched.bytes));
    }

    let path = PathBuf::from(input);
    let bytes = std::fs::read(&path)?;
    Ok((FileDescriptor::from_path(&path), bytes))
}
