mod logging;

use clap::{Parser, Subcommand};
use imgop::config;
use imgop::toolchain::MagickToolchain;
use imgop::{Envelope, Handler, Request};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "imgop")]
#[command(about = "Run image operations through ImageMagick")]
#[command(long_about = "\
Run image operations through ImageMagick

A request is a JSON object:

  {
    \"operation\": \"resize\",          # ping | identify | getDimensions |
                                      # resize | thumbnail | convert | getSample
    \"payload\": \"<base64 image>\",     # required by identify/getDimensions/resize
    \"inputExtension\": \"jpg\",         # default png
    \"outputExtension\": \"png\",        # default png (resize), none (convert)
    \"width\": 200, \"height\": 100,     # resize; neither set = 100px wide thumbnail
    \"customArgs\": [\"-flip\"]          # extra identify/convert arguments
  }

The result (text, or base64 image bytes) is printed to stdout.

Run 'imgop gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = defaults)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Handle one request read from a file or stdin
    Handle {
        /// Request JSON file; omit or use '-' for stdin
        event: Option<PathBuf>,

        /// Print a JSON envelope ({"result"} or {"errorType","errorMessage"})
        #[arg(long)]
        envelope: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Handle { event, envelope } => {
            logging::init(cli.verbose, cli.json_logs);
            let config = config::load_config(&cli.config)?;
            let request: Request = serde_json::from_str(&read_event(event.as_deref())?)?;

            let handler = Handler::new(MagickToolchain::new(&config.toolchain), &config);
            let completion = handler.handle(request);

            if envelope {
                println!("{}", serde_json::to_string(&Envelope::from(&completion))?);
                if completion.is_err() {
                    std::process::exit(1);
                }
            } else {
                println!("{}", completion?);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn read_event(path: Option<&Path>) -> std::io::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
