use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use midi_visualiser_core::{
    AppConfig, ControlInput, FrameClock, FramePresenter, FramePublisher, FrameStatus, FrameTick,
    FrameUniforms, HostUniformBuffer, PacketList, ParameterSet, ParameterStore, RenderLoop,
    StatusFilter,
};
use tracing_subscriber::EnvFilter;

mod sources;

use sources::MidiSources;

fn main() -> midi_visualiser_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Live {
            pipeline,
            fps,
            port_filter,
            frames,
        } => {
            let mut config = pipeline.load()?;
            if let Some(fps) = fps {
                config.render.frames_per_second = fps;
            }
            if port_filter.is_some() {
                config.midi.port_filter = port_filter;
            }
            config.validate()?;
            run_live(&config, frames)
        }
        Commands::Ports => run_ports(),
        Commands::Replay { input, pipeline } => run_replay(&input, &pipeline.load()?),
    }
}

fn run_live(config: &AppConfig, frame_limit: Option<u64>) -> midi_visualiser_core::Result<()> {
    tracing::info!(
        fps = config.render.frames_per_second,
        filter = ?config.midi.port_filter,
        "starting live mode"
    );

    let store = Arc::new(ParameterStore::with_initial(config.initial));
    let sources = MidiSources::connect(&config.midi, &store)?;
    tracing::info!(sources = sources.len(), "listening for control changes");

    let mut stop = Some(spawn_stop_watcher());
    let mut render = RenderLoop::new(Arc::clone(&store));
    let mut buffer = HostUniformBuffer::allocated();
    let mut presenter = TracePresenter::new(config.render.report_interval_frames);
    let mut clock = FrameClock::new(config.render.frames_per_second, Instant::now());

    let result = loop {
        if frame_limit.is_some_and(|limit| render.frames() >= limit) {
            break Ok(());
        }

        let tick = clock.tick(Instant::now());
        if let Err(err) = render.render_frame(&tick, &mut buffer, &mut presenter) {
            break Err(err);
        }

        let wait = clock.time_until_next(Instant::now());
        let signal = match &stop {
            Some(stop_rx) => stop_rx.recv_timeout(wait),
            None => {
                thread::sleep(wait);
                Err(RecvTimeoutError::Timeout)
            }
        };
        match signal {
            Ok(()) => break Ok(()),
            // stdin closed: keep rendering, pace with plain sleeps
            Err(RecvTimeoutError::Disconnected) => stop = None,
            Err(RecvTimeoutError::Timeout) => {}
        }
    };

    // Release every MIDI registration before the store goes away.
    for (port, stats) in sources.close() {
        tracing::info!(
            %port,
            packets = stats.packets,
            events = stats.events,
            applied = stats.applied,
            "closed MIDI input"
        );
    }
    tracing::info!(
        frames = render.frames(),
        deferred = render.publisher().frames_deferred(),
        writes = store.generation(),
        "stopped live mode"
    );
    result
}

fn run_ports() -> midi_visualiser_core::Result<()> {
    let names = sources::port_names(&AppConfig::live_defaults().midi.client_name)?;
    if names.is_empty() {
        println!("no MIDI input ports found");
    }
    for (index, name) in names.iter().enumerate() {
        println!("{index}: {name}");
    }
    Ok(())
}

fn run_replay(input: &Path, config: &AppConfig) -> midi_visualiser_core::Result<()> {
    tracing::info!(?input, "replaying captured packets");

    let text = std::fs::read_to_string(input)?;
    let packets = PacketList::parse_hex_lines(&text)?;

    let store = Arc::new(ParameterStore::with_initial(config.initial));
    let mut control = ControlInput::new(&store).with_filter(config.midi.status_filter);
    control.handle_packets(packets.iter());

    let stats = control.stats();
    tracing::info!(
        packets = stats.packets,
        events = stats.events,
        applied = stats.applied,
        "replay complete"
    );

    let mut buffer = HostUniformBuffer::allocated();
    let uniforms = match FramePublisher::new(store).prepare_frame(&mut buffer) {
        FrameStatus::Published(uniforms) => uniforms,
        FrameStatus::Deferred => {
            return Err(midi_visualiser_core::MidiVizError::msg(
                "uniform buffer was not available",
            ))
        }
    };

    let report = serde_json::to_string_pretty(&ParameterSet::from(uniforms))?;
    println!("{report}");
    Ok(())
}

/// Signals a stop when a line is entered on stdin. A closed stdin drops the
/// sender without signalling, so a supervised process keeps running.
fn spawn_stop_watcher() -> Receiver<()> {
    let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let mut line = String::new();
        if let Ok(read) = std::io::stdin().lock().read_line(&mut line) {
            if read > 0 {
                let _ = stop_tx.send(());
            }
        }
    });
    stop_rx
}

/// Stands in for the draw call: reports what the shader would receive.
struct TracePresenter {
    report_interval: u64,
    last: Option<FrameUniforms>,
}

impl TracePresenter {
    fn new(report_interval: u64) -> Self {
        Self {
            report_interval,
            last: None,
        }
    }
}

impl FramePresenter for TracePresenter {
    fn present(
        &mut self,
        tick: &FrameTick,
        uniforms: &FrameUniforms,
    ) -> midi_visualiser_core::Result<()> {
        let frame = tick.index;
        if self.last.as_ref() != Some(uniforms) {
            tracing::debug!(
                frame,
                size = uniforms.size,
                red = uniforms.red,
                green = uniforms.green,
                blue = uniforms.blue,
                "uniforms changed"
            );
            self.last = Some(*uniforms);
        }

        if self.report_interval > 0 && frame % self.report_interval == 0 {
            tracing::info!(
                frame,
                elapsed_ms = tick.elapsed.as_millis() as u64,
                delta_ms = tick.delta.as_secs_f64() * 1000.0,
                size = uniforms.size,
                red = uniforms.red,
                green = uniforms.green,
                blue = uniforms.blue,
                "frame uniforms"
            );
        }
        Ok(())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "MIDI controlled GPU visualiser", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect to MIDI inputs and drive the frame loop.
    Live {
        #[command(flatten)]
        pipeline: PipelineArgs,
        /// Frames per second for the render loop.
        #[arg(long)]
        fps: Option<u32>,
        /// Only connect MIDI ports whose name contains this text.
        #[arg(short, long)]
        port_filter: Option<String>,
        /// Stop after rendering this many frames.
        #[arg(long)]
        frames: Option<u64>,
    },
    /// List the available MIDI input ports.
    Ports,
    /// Feed a captured packet file through the pipeline and print the
    /// resulting parameters as JSON.
    Replay {
        /// File with one packet per line as hex bytes, e.g. `B0 0D 7F`.
        input: PathBuf,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Which MIDI status bytes are read as controller messages.
    #[arg(long, value_enum)]
    status_filter: Option<StatusArg>,
}

impl PipelineArgs {
    fn load(&self) -> midi_visualiser_core::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::live_defaults(),
        };
        if let Some(filter) = self.status_filter {
            config.midi.status_filter = filter.into();
        }
        Ok(config)
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StatusArg {
    ControlChange,
    AnyChannelVoice,
}

impl From<StatusArg> for StatusFilter {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::ControlChange => StatusFilter::ControlChange,
            StatusArg::AnyChannelVoice => StatusFilter::AnyChannelVoice,
        }
    }
}
