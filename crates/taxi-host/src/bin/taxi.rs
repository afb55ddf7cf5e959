use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taxi_host::frames::{self, FrameAssembler, FrameGeometry, FrameWriter};
use taxi_host::icd::{SyncSettings, TaxiDataTopic};
use taxi_host::{error, Error, UsbClient};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Utility for the TAXI capture front end")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start receipt of TAXI data on the primary bulk pipe
    Start,
    /// Halt TAXI communications
    Stop,
    /// Show the session state and synchronizer settings
    Status,
    /// Change the frame synchronizer settings (only while idle)
    Config {
        /// Quiet time on the strobe that marks a frame gap, in microseconds
        #[arg(long)]
        window_us: Option<u32>,
        /// Number of gaps to wait for before arming capture
        #[arg(long)]
        passes: Option<u8>,
        /// Give up on a single gap after this many milliseconds
        #[arg(long, conflicts_with = "no_timeout")]
        timeout_ms: Option<u32>,
        /// Wait for a gap for as long as it takes
        #[arg(long)]
        no_timeout: bool,
    },
    /// Start a session and write every received frame to disk until Ctrl-C
    Receive {
        #[arg(short, long, default_value = "frames")]
        output_dir: PathBuf,
    },
    /// Split a raw capture log into frame files
    Extract {
        #[arg(short, long, default_value = "log.bin")]
        input: PathBuf,
        #[arg(short, long, default_value = "frames")]
        output_dir: PathBuf,
    },
}

fn connect() -> Result<UsbClient, Error> {
    UsbClient::try_new().map_err(|e| Error::NotFound(e.to_string()))
}

async fn receive(client: &UsbClient, output_dir: PathBuf) -> Result<(), Error> {
    let mut writer = FrameWriter::create(&output_dir)?;
    let mut assembler = FrameAssembler::new(FrameGeometry::default());
    let mut sub = client
        .client
        .subscribe_multi::<TaxiDataTopic>(64)
        .await
        .map_err(|_| Error::StreamClosed)?;

    client.start_receive().await?;
    tracing::info!("receiving, press Ctrl-C to stop");

    let mut expected = None;
    let result = 'recv: loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            chunk = sub.recv() => {
                let Ok(chunk) = chunk else { break Err(Error::StreamClosed) };
                if expected.is_some_and(|seq| seq != chunk.seq) {
                    tracing::warn!(expected = ?expected, got = chunk.seq, "capture chunks dropped");
                }
                expected = Some(chunk.seq.wrapping_add(1));
                for frame in assembler.push(&chunk.data) {
                    match writer.write(&frame) {
                        Ok(path) => tracing::debug!(path = %path.display(), "frame written"),
                        Err(e) => break 'recv Err(e.into()),
                    }
                }
            }
        }
    };

    let stopped = client.stop().await;
    let stats = assembler.stats();
    println!(
        "{} frames written to {} ({} rejected)",
        writer.written(),
        output_dir.display(),
        stats.rejected
    );
    error::keep_first(result, stopped)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    match args.command {
        Command::Start => {
            connect()?.start_receive().await?;
            println!("TAXI receive started.");
        }
        Command::Stop => {
            connect()?.stop().await?;
            println!("TAXI stopped.");
        }
        Command::Status => {
            let client = connect()?;
            let state = client.status().await.map_err(Error::from)?;
            let config = client.get_config().await.map_err(Error::from)?;
            println!("session: {:?}", state);
            print_config(&config);
        }
        Command::Config { window_us, passes, timeout_ms, no_timeout } => {
            let client = connect()?;
            let mut config = client.get_config().await.map_err(Error::from)?;
            if let Some(window_us) = window_us {
                config.window_us = window_us;
            }
            if let Some(passes) = passes {
                config.passes = passes;
            }
            if no_timeout {
                config.timeout_ms = None;
            } else if timeout_ms.is_some() {
                config.timeout_ms = timeout_ms;
            }
            client.set_config(config).await?;
            print_config(&config);
        }
        Command::Receive { output_dir } => {
            let client = connect()?;
            receive(&client, output_dir).await?;
        }
        Command::Extract { input, output_dir } => {
            let mut writer = FrameWriter::create(&output_dir)?;
            let stats =
                frames::extract(&input, &mut writer, FrameGeometry::default())?;
            println!(
                "{}: {} frames, {} rejected, {} bytes skipped",
                input.display(),
                stats.frames,
                stats.rejected,
                stats.discarded
            );
        }
    }
    Ok(())
}

fn print_config(config: &SyncSettings) {
    println!("window: {} us", config.window_us);
    println!("passes: {}", config.passes);
    match config.timeout_ms {
        Some(ms) => println!("timeout: {} ms", ms),
        None => println!("timeout: none"),
    }
}
