use beat_sequencer::audio::mixer::VoiceMixer;
use beat_sequencer::messaging::channels::{NotificationConsumer, drain_notifications};
use beat_sequencer::{
    AudioEngine, ExportFormat, ExportRequest, FileStore, Instrument, KeyValueStore, ManualClock,
    MemoryStore, SequencerConfig, SequencerController, StepCount, Theme,
    create_notification_channel,
};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const NOTIFICATION_RINGBUFFER_CAPACITY: usize = 64;
const DEFAULT_CONFIG_FILE: &str = "beat_sequencer.ron";

#[derive(Parser)]
#[command(name = "beat_sequencer", version, about = "Step sequencer with procedural drums and WAV export")]
struct Cli {
    /// RON configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Do not read or write the pattern store
    #[arg(long, global = true)]
    no_persist: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the stored pattern on the default output device
    Play {
        #[arg(default_value_t = 8.0)]
        seconds: f64,
    },
    /// Render the pattern to beat-<millis>.wav
    Export {
        #[arg(default_value_t = 1)]
        loops: u32,
        #[arg(default_value = "wav")]
        format: ExportFormat,
    },
    /// Toggle one grid cell
    Toggle { instrument: Instrument, step: usize },
    /// Set the tempo (BPM)
    Tempo { bpm: u32 },
    /// Change the step count (clears the grid)
    Steps {
        #[arg(value_parser = parse_step_count)]
        count: StepCount,
    },
    /// Set the UI theme (toggles when omitted)
    Theme { theme: Option<Theme> },
    /// Print the stored pattern
    Show,
}

fn parse_step_count(s: &str) -> Result<StepCount, String> {
    let value: usize = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    StepCount::try_from(value)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = SequencerConfig::load_or_default(&cli.config)?;

    let store: Box<dyn KeyValueStore> = if cli.no_persist {
        Box::new(MemoryStore::new())
    } else {
        Box::new(FileStore::open(config.store_path()))
    };

    let (notification_tx, mut notification_rx) =
        create_notification_channel(NOTIFICATION_RINGBUFFER_CAPACITY);
    let notification_tx = Arc::new(Mutex::new(notification_tx));

    if let Commands::Play { seconds } = cli.command {
        let mut engine = AudioEngine::start(&config, notification_tx.clone())?;
        let sink = engine.take_sink().ok_or("Audio sink already taken")?;
        let sample_rate = engine.sample_rate() as u32;

        let mut controller = SequencerController::new(
            config,
            store,
            Arc::new(engine.clock()),
            Box::new(sink),
            sample_rate,
            notification_tx,
        );
        print_pattern(&controller);
        play_for(&mut controller, &engine, seconds, &mut notification_rx)?;
        return Ok(());
    }

    // Everything else runs headless
    let sample_rate = config.fallback_sample_rate;
    let headless_sink = VoiceMixer::new(sample_rate as f32, config.master_gain);
    let mut controller = SequencerController::new(
        config,
        store,
        Arc::new(ManualClock::new(0.0)),
        Box::new(headless_sink),
        sample_rate,
        notification_tx,
    );

    let result = match cli.command {
        Commands::Play { .. } => Ok(()),
        Commands::Export { loops, format } => controller
            .export_to_dir(ExportRequest::new(format, loops))
            .map(|path| {
                println!(
                    "Exported {} ({} loops @ {} Hz)",
                    path.display(),
                    loops,
                    controller.exporter().sample_rate()
                )
            })
            .map_err(Into::into),
        Commands::Toggle { instrument, step } => controller
            .toggle_cell(instrument, step)
            .map(|active| println!("{} step {}: {}", instrument, step, if active { "on" } else { "off" }))
            .map_err(Into::into),
        Commands::Tempo { bpm } => controller
            .set_tempo(bpm)
            .map(|tempo| println!("Tempo: {}", tempo))
            .map_err(Into::into),
        Commands::Steps { count } => controller
            .set_step_count(count)
            .map(|()| println!("Steps: {}", count))
            .map_err(Into::into),
        Commands::Theme { theme } => {
            let theme = match theme {
                Some(theme) => {
                    controller.set_theme(theme);
                    theme
                }
                None => controller.toggle_theme(),
            };
            println!("Theme: {}", theme);
            Ok(())
        }
        Commands::Show => {
            print_pattern(&controller);
            Ok(())
        }
    };

    report_notifications(&mut notification_rx);
    result
}

fn play_for(
    controller: &mut SequencerController,
    engine: &AudioEngine,
    seconds: f64,
    notification_rx: &mut NotificationConsumer,
) -> Result<(), Box<dyn std::error::Error>> {
    controller.play()?;

    let step_count = controller.snapshot().step_count().len();
    let deadline = Instant::now() + Duration::from_secs_f64(seconds.max(0.0));
    while Instant::now() < deadline {
        let step = controller.current_step();
        let bar: String = (0..step_count)
            .map(|i| if i == step { '#' } else { '.' })
            .collect();
        print!("\r{} level {:.2}", bar, engine.output_level.get());
        let _ = std::io::stdout().flush();

        report_notifications(notification_rx);
        std::thread::sleep(Duration::from_millis(30));
    }
    println!();

    controller.stop();
    println!(
        "{} notes scheduled",
        controller.transport().status().events_scheduled()
    );
    // Let already scheduled notes ring out
    let tail = Instrument::ALL
        .into_iter()
        .map(Instrument::tail_seconds)
        .fold(0.0, f64::max);
    std::thread::sleep(Duration::from_secs_f64(tail + 0.1));
    report_notifications(notification_rx);
    Ok(())
}

fn print_pattern(controller: &SequencerController) {
    let state = controller.snapshot();
    println!(
        "{} | {} steps | {} active | theme {}",
        state.tempo(),
        state.step_count(),
        state.grid().active_cell_count(),
        controller.theme()
    );
    for instrument in Instrument::ALL {
        let row: String = (0..state.step_count().len())
            .map(|step| if state.grid().is_active(instrument, step) { 'x' } else { '.' })
            .collect();
        println!("{:<7} {}", instrument.name(), row);
    }
}

fn report_notifications(notification_rx: &mut NotificationConsumer) {
    for notification in drain_notifications(notification_rx) {
        println!("{}", notification);
    }
}
