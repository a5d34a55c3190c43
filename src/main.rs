//! Entry point for `stopwait`.
//!
//! Parses CLI arguments and dispatches into either **send** or **recv**
//! mode.  All actual protocol work is delegated to library modules; `main.rs`
//! owns only process setup (logging, argument parsing, file I/O).

use std::fs::File;
use std::io::BufWriter;
use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use stopwait::channel::UdpChannel;
use stopwait::transfer::{self, SendConfig};

/// Stop-and-wait reliable file transfer over UDP.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Transfer a file to a receiving peer.
    Send {
        /// Local address to bind (e.g. 0.0.0.0:0).
        #[arg(short, long, default_value = "0.0.0.0:0")]
        bind: String,
        /// Remote receiver address (e.g. 127.0.0.1:9000).
        #[arg(short, long)]
        peer: String,
        /// File to transfer.
        #[arg(short, long)]
        file: PathBuf,
        /// Channel MTU in bytes, header included.
        #[arg(long, default_value_t = 1472)]
        mtu: usize,
        /// Give up on a packet after this many retransmissions
        /// (default: retry forever).
        #[arg(long)]
        max_retries: Option<u32>,
    },
    /// Receive a transfer into a file.
    Recv {
        /// Local address to listen on.
        #[arg(short, long, default_value = "0.0.0.0:9000")]
        bind: String,
        /// Output file for the received bytes.
        #[arg(short, long)]
        out: PathBuf,
        /// Channel MTU in bytes, header included.
        #[arg(long, default_value_t = 1472)]
        mtu: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();

    match cli.mode {
        Mode::Send {
            bind,
            peer,
            file,
            mtu,
            max_retries,
        } => {
            let bind: SocketAddr = bind.parse()?;
            let peer: SocketAddr = peer.parse()?;
            let data = std::fs::read(&file)?;

            let chan = UdpChannel::connect(bind, peer).await?;
            log::info!(
                "sending {} byte(s) from {} to {peer}",
                data.len(),
                file.display()
            );

            let mut config = SendConfig::new(mtu);
            if let Some(limit) = max_retries {
                config = config.with_retry_limit(limit);
            }

            transfer::send(&chan, &data, &config).await?;
            chan.close().await?;
            log::info!("transfer complete");
        }
        Mode::Recv { bind, out, mtu } => {
            let bind: SocketAddr = bind.parse()?;
            let chan = UdpChannel::bind(bind).await?;
            log::info!("listening on {}", chan.local_addr()?);

            let mut sink = BufWriter::new(File::create(&out)?);
            let received = transfer::recv(&chan, &mut sink, mtu).await?;
            log::info!("received {received} byte(s) into {}", out.display());
        }
    }

    Ok(())
}
