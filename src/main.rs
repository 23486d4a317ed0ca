use clap::{Parser, Subcommand};
use hpv::{verify_file, EngineOptions, Event, LoopMode, StreamManager};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "hpv", about = "Inspect and play .hpv video containers")]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the header summary of one or more files
    Info {
        #[arg(required = true, num_args = 1..)]
        input: Vec<PathBuf>,
    },
    /// Check the frame table and decompress every frame
    Verify {
        input: PathBuf,
    },
    /// Play files headlessly and report delivered frames
    Play {
        #[arg(required = true, num_args = 1..)]
        input: Vec<PathBuf>,
        /// Playback speed; negative plays in reverse
        #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
        speed: f64,
        /// none, loop or palindrome
        #[arg(long, default_value = "loop")]
        loop_mode: String,
        #[arg(long, default_value_t = 5)]
        seconds: u64,
        /// Engine options as JSON
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input } => {
            for path in &input {
                let mut f = std::fs::File::open(path)?;
                let header = hpv::Header::read(&mut f)?;
                println!("── {} ─────────────────────────────────────────", path.display());
                println!("  Version        {}", header.version);
                println!("  Dimensions     {}x{}", header.width, header.height);
                println!("  Frame rate     {} fps", header.frame_rate);
                println!("  Frames         {}", header.frame_count);
                println!("  Compression    {} ({})", header.compression_type, header.compression_type as u32);
                println!("  Frame size     {} B", header.bytes_per_frame());
                println!("  Table checksum {:#010x}", header.crc_frame_sizes);
                if let Err(e) = header.validate() {
                    println!("  Invalid        {e}");
                }
            }
        }

        // ── Verify ───────────────────────────────────────────────────────────
        Commands::Verify { input } => {
            let report = verify_file(&input)?;
            println!("Verified: {}", report.path.display());
            println!("  Frames ok      {}/{}", report.frames_ok(), report.header.frame_count);
            println!("  Compressed     {} B", report.compressed_bytes);
            println!("  Decoded        {} B", report.decoded_bytes);
            println!("  Ratio          {:.3}", report.ratio());
            println!("  Elapsed        {:?}", report.elapsed);
            for f in &report.faults {
                println!("  frame {:>6}    {}", f.frame, f.error);
            }
            if !report.is_ok() {
                return Err(format!("{} corrupt frame(s)", report.faults.len()).into());
            }
        }

        // ── Play ─────────────────────────────────────────────────────────────
        Commands::Play { input, speed, loop_mode, seconds, config } => {
            let options = match config {
                Some(path) => EngineOptions::from_json_file(path)?,
                None       => EngineOptions::default(),
            };
            let mode = parse_loop_mode(&loop_mode);

            let mut mgr = StreamManager::with_options(options);
            mgr.add_listener(|e: &Event| println!("  event  {e}"));

            let mut ids = Vec::new();
            for path in &input {
                let id = mgr.open_stream(path)?;
                if let Some(engine) = mgr.engine(id) {
                    engine.set_loop_mode(mode);
                    engine.set_speed(speed)?;
                    println!("  open   {}", engine.summary());
                }
                ids.push(id);
            }
            for &id in &ids {
                if let Some(engine) = mgr.engine(id) {
                    engine.play()?;
                }
            }

            let mut delivered = vec![0u64; mgr.len()];
            let deadline = Instant::now() + Duration::from_secs(seconds);
            while Instant::now() < deadline {
                for (count, fresh) in delivered.iter_mut().zip(mgr.update()) {
                    if fresh {
                        *count += 1;
                    }
                }
                mgr.process_events();
                std::thread::sleep(Duration::from_millis(1));
            }
            mgr.process_events();

            for engine in mgr.engines() {
                let stats = engine.decode_stats();
                println!(
                    "  stream {}  {:>6} frames  last decode {:?}  {}",
                    engine.id(),
                    delivered[engine.id() as usize],
                    stats.decode_total(),
                    engine.file_name(),
                );
            }
            mgr.close_all();
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn parse_loop_mode(s: &str) -> LoopMode {
    LoopMode::from_name(s).unwrap_or_else(|| {
        eprintln!("Unknown loop mode '{}', defaulting to loop", s);
        LoopMode::Loop
    })
}
