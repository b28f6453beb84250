use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framestore::{ColorRequest, ReadOptions, SequenceReader, SequenceWriter, WriteOptions};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framestore info frames.tar::img_%03d.png --json\n  framestore convert clip.pngv out.tar.gz::frame_%04d.png --progress\n  framestore convert movie.mp4 shots/frame_%05d.jpg --first 100 --last 200 --step 10\n  framestore completions zsh > _framestore";

#[derive(Debug, Parser)]
#[command(
    name = "framestore",
    version,
    about = "Inspect and convert image sequences stored in containers, archives, files, and videos",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar where supported.
    #[arg(long, global = true)]
    progress: bool,

    /// Color handling for decoded frames (auto, color, gray).
    #[arg(long, global = true, default_value = "auto")]
    color: String,

    /// Keep 16-bit samples instead of truncating them to 8 bits.
    #[arg(long, global = true)]
    native_depth: bool,

    /// ffmpeg executable used for video inputs.
    #[arg(long, global = true)]
    ffmpeg: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the frame range and size of a sequence.
    #[command(
        about = "Print sequence information",
        visible_alias = "probe",
        after_help = "Examples:\n  framestore info clip.pngv\n  framestore info frames.tgz::img_%03d.png --json"
    )]
    Info {
        /// Input sequence path.
        input: String,

        /// First frame to consider.
        #[arg(long, allow_negative_numbers = true)]
        first: Option<i64>,

        /// Last frame to consider.
        #[arg(long, allow_negative_numbers = true)]
        last: Option<i64>,

        /// Output information as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Copy frames from one sequence into a new one.
    #[command(
        about = "Convert a sequence to another storage",
        after_help = "Examples:\n  framestore convert movie.mp4 clip.pngv\n  framestore convert a.pngv out.tar::img_%04d.png --merge b.pngv --merge c.pngv"
    )]
    Convert {
        /// Input sequence path.
        input: String,
        /// Output sequence path.
        output: String,
        /// First frame to copy.
        #[arg(long, allow_negative_numbers = true)]
        first: Option<i64>,
        /// Last frame to copy.
        #[arg(long, allow_negative_numbers = true)]
        last: Option<i64>,
        /// Copy every Nth frame.
        #[arg(long, default_value_t = 1)]
        step: u64,
        /// Additional inputs appended after the main input.
        #[arg(long)]
        merge: Vec<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

fn read_options(global: &GlobalOptions) -> Result<ReadOptions, Box<dyn std::error::Error>> {
    let color: ColorRequest = global.color.parse()?;
    let mut options = ReadOptions::new()
        .with_color(color)
        .with_native_depth(global.native_depth);
    if let Some(binary) = &global.ffmpeg {
        options = options.with_ffmpeg_binary(binary);
    }
    Ok(options)
}

fn frame_numbers(first: i64, last: i64, step: u64) -> Vec<i64> {
    if last < first {
        return Vec::new();
    }
    (first..=last).step_by(step.max(1) as usize).collect()
}

fn progress_bar(enabled: bool, total: usize) -> Result<Option<ProgressBar>, Box<dyn std::error::Error>> {
    if !enabled {
        return Ok(None);
    }
    let bar = ProgressBar::new(total as u64);
    let style = ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
    bar.set_style(style.progress_chars("##-"));
    Ok(Some(bar))
}

/// Copy the listed frames of `reader` into `writer`. Returns the number of
/// frames written and the number that failed.
fn copy_frames(
    reader: &mut SequenceReader,
    writer: &mut SequenceWriter,
    frames: &[i64],
    keep_numbers: bool,
    bar: Option<&ProgressBar>,
) -> (u64, u64) {
    let mut written = 0_u64;
    let mut failed = 0_u64;
    for &frame in frames {
        let result = reader.read(frame).and_then(|image| {
            let position = keep_numbers.then_some(frame);
            writer.write(&image, position)
        });
        match result {
            Ok(()) => written += 1,
            Err(error) => {
                failed += 1;
                let message = format!("frame {frame}: {error}");
                match bar {
                    Some(bar) => bar.println(format!("{} {}", "warning:".yellow().bold(), message.yellow())),
                    None => eprintln!("{} {}", "warning:".yellow().bold(), message.yellow()),
                }
            }
        }
        if let Some(bar) = bar {
            bar.inc(1);
        }
    }
    (written, failed)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match cli.command {
        Commands::Info {
            input,
            first,
            last,
            json,
        } => {
            let options = read_options(&cli.global)?;
            let reader = SequenceReader::open(&input, first, last, &options)?;
            let (width, height) = reader.size();
            if json {
                let payload = json!({
                    "input": input,
                    "backend": reader.kind(),
                    "first": reader.first(),
                    "last": reader.last(),
                    "next": reader.next(),
                    "frame_count": (reader.last() - reader.first() + 1).max(0),
                    "width": width,
                    "height": height,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("{} {}", "input".cyan().bold(), input);
                println!("Backend: {}", reader.kind());
                println!("Frames: {}..={}", reader.first(), reader.last());
                println!("Size: {width}x{height}");
            }
        }
        Commands::Convert {
            input,
            output,
            first,
            last,
            step,
            merge,
        } => {
            let options = read_options(&cli.global)?;
            let mut reader = SequenceReader::open(&input, first, last, &options)?;
            let (width, height) = reader.size();
            let color = !matches!(options.color(), ColorRequest::Gray);
            let write_options = WriteOptions::new()
                .with_frame_size(width, height)
                .with_color(color);
            let mut writer = SequenceWriter::open(&output, &write_options)?;

            let frames = frame_numbers(reader.first(), reader.last(), step);
            let bar = progress_bar(cli.global.progress, frames.len())?;
            let (mut written, mut failed) =
                copy_frames(&mut reader, &mut writer, &frames, true, bar.as_ref());
            if let Some(bar) = bar {
                bar.finish_with_message("done");
            }
            reader.close();

            for extra in &merge {
                let mut reader = SequenceReader::open(extra, None, None, &options)?;
                let frames = frame_numbers(reader.first(), reader.last(), step);
                let bar = progress_bar(cli.global.progress, frames.len())?;
                let (extra_written, extra_failed) =
                    copy_frames(&mut reader, &mut writer, &frames, false, bar.as_ref());
                if let Some(bar) = bar {
                    bar.finish_with_message(format!("merged {extra}"));
                }
                written += extra_written;
                failed += extra_failed;
            }
            writer.close()?;

            if failed > 0 {
                println!(
                    "{} {}",
                    "partial:".yellow().bold(),
                    format!("Wrote {written} frame(s) to {output}, {failed} failed").yellow()
                );
            } else {
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!("Wrote {written} frame(s) to {output}").green()
                );
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framestore", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, frame_numbers};
    use clap::Parser;

    #[test]
    fn frame_numbers_step_and_bounds() {
        assert_eq!(frame_numbers(0, 4, 1), vec![0, 1, 2, 3, 4]);
        assert_eq!(frame_numbers(0, 9, 4), vec![0, 4, 8]);
        assert_eq!(frame_numbers(5, 5, 3), vec![5]);
        assert!(frame_numbers(3, 2, 1).is_empty());
        assert_eq!(frame_numbers(0, 2, 0), vec![0, 1, 2]);
    }

    #[test]
    fn parse_convert_arguments() {
        let cli = Cli::try_parse_from([
            "framestore",
            "convert",
            "in.pngv",
            "out.tar::img_%03d.png",
            "--first",
            "-2",
            "--step",
            "3",
            "--merge",
            "b.pngv",
            "--color",
            "gray",
        ])
        .unwrap();
        assert_eq!(cli.global.color, "gray");
        match cli.command {
            Commands::Convert {
                input,
                output,
                first,
                last,
                step,
                merge,
            } => {
                assert_eq!(input, "in.pngv");
                assert_eq!(output, "out.tar::img_%03d.png");
                assert_eq!(first, Some(-2));
                assert_eq!(last, None);
                assert_eq!(step, 3);
                assert_eq!(merge, vec!["b.pngv".to_string()]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
