use clap::{Parser, Subcommand};
use edgemap::{config, output, process};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "edgemap")]
#[command(about = "Sobel edge maps for a batch of images")]
#[command(long_about = "\
Sobel edge maps for a batch of images

Each input is written to <output dir>/<name>edge.<ext> in the same format
as the source. Images are processed one after another; the rows of each
image are spread over all CPU cores.

Rendering:
  default        edge-intensity map, rescaled so the strongest edge is 255
  -t N           pixels whose magnitude exceeds N in any channel are
                 brightened to full intensity, others left as they are
  -t N -b        edges pure white, everything else pure black

Run 'edgemap gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute edge maps for the given image files
    Detect(DetectArgs),
    /// Print a stock config file with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct DetectArgs {
    /// Output directory [default: $HOME/Edge-detection/finished]
    #[arg(short = 'l', long = "location")]
    output_dir: Option<PathBuf>,

    /// Enable thresholding at this rescaled magnitude (0-255; negative marks every pixel)
    #[arg(short = 't', long, allow_negative_numbers = true)]
    threshold: Option<i32>,

    /// Binary output: white edges on black (requires --threshold)
    #[arg(short = 'b', long)]
    binary: bool,

    /// Maximum worker threads per image (default: all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Config file, overridden by the flags above
    #[arg(long)]
    config: Option<PathBuf>,

    /// Images to process
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Detect(args) => {
            let overrides = config::Overrides {
                output_dir: args.output_dir,
                threshold: args.threshold,
                binary: args.binary,
                threads: args.threads,
            };
            let edge_config = config::load_config(args.config.as_deref(), &overrides)?;
            let settings = edge_config.resolve();
            for notice in &settings.notices {
                println!("{}", output::format_notice(notice));
            }

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = process::process(&args.inputs, &settings, Some(tx));
            printer.join().ok();

            let result = result?;
            println!("{}", output::format_summary(&result));
            if result.failed() > 0 {
                std::process::exit(1);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
