use std::error::Error;
use std::future::Future;
use std::io::{stdout, Write};
use std::path::PathBuf;

use bpaf::Bpaf;
use streamdock293::keymap::KEY_COUNT;
use streamdock293::{consts, Resize, StreamDock293};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::listen::run_listen;
use crate::lock::DeviceLock;

mod config;
mod listen;
mod lock;

fn valid_key(key: &u8) -> bool {
    (1..=KEY_COUNT).contains(key)
}

#[derive(Clone, Debug, Bpaf)]
enum Command {
    /// Print the firmware version
    #[bpaf(command)]
    Version,
    /// Wake the display from standby
    #[bpaf(command)]
    Wake,
    /// Clear every key, or a single key
    #[bpaf(command)]
    Clear {
        /// Logical key to clear (1-15)
        #[bpaf(
            short,
            long,
            argument::<u8>("KEY"),
            guard(valid_key, "key must be between 1 and 15"),
            optional
        )]
        key: Option<u8>,
    },
    /// Set the backlight brightness
    #[bpaf(command)]
    Brightness {
        /// Brightness value, defaults to the configured level
        #[bpaf(positional::<u8>("VALUE"), optional)]
        value: Option<u8>,
    },
    /// Commit pending images to the display
    #[bpaf(command)]
    Refresh,
    /// Upload a key icon
    #[bpaf(command)]
    Key {
        /// Logical key (1-15), numbered left to right, top to bottom
        #[bpaf(positional("KEY"), guard(valid_key, "key must be between 1 and 15"))]
        key: u8,
        /// Path to image to re-encode and upload
        #[bpaf(positional("PATH"), guard(|p| p.exists(), "file not found"))]
        path: PathBuf,
    },
    /// Upload the boot logo
    #[bpaf(command)]
    Boot {
        /// Path to image to re-encode and upload
        #[bpaf(positional("PATH"), guard(|p| p.exists(), "file not found"))]
        path: PathBuf,
    },
    /// Print key presses and swap icons using the configured images
    #[bpaf(command)]
    Listen,
}

#[derive(Clone, Debug, Bpaf)]
#[bpaf(options, version, descr(env!("CARGO_PKG_DESCRIPTION")))]
struct Cli {
    /// Use nearest neighbor interpolation when resizing, otherwise uses bilinear
    #[bpaf(short('n'), long("nearest"))]
    nearest: bool,
    #[bpaf(external(command))]
    command: Command,
}

async fn run(cli: Cli, config: Config) -> Result<(), Box<dyn Error>> {
    let resize = if cli.nearest || config.media.use_nearest_neighbor {
        Resize::Nearest
    } else {
        Resize::Smooth
    };
    let _lock = DeviceLock::acquire(consts::VENDOR_ID, consts::PRODUCT_ID)?;
    let dock = StreamDock293::open()?
        .with_resize(resize)
        .with_report_size(config.device.report_size);

    match cli.command {
        Command::Version => println!("{}", dock.firmware_version().await?),
        Command::Wake => dock.wake_screen().await?,
        Command::Clear { key: None } => {
            dock.clear_screen().await?;
            println!("cleared all keys");
        },
        Command::Clear { key: Some(key) } => {
            dock.clear_key_icon(key).await?;
            println!("cleared key {key}");
        },
        Command::Brightness { value } => {
            let value = value.unwrap_or(config.device.brightness);
            dock.set_brightness(value).await?;
            println!("set brightness to {value}");
        },
        Command::Refresh => dock.refresh().await?,
        Command::Key { key, path } => {
            dock.set_key_icon(key, path).await?;
            println!("uploaded icon to key {key}");
        },
        Command::Boot { path } => {
            print!("uploading boot image ... ");
            stdout().flush()?;
            dock.set_boot_image(path).await?;
            println!("done");
        },
        Command::Listen => run_listen(&dock, &config.device, &config.listen, resize).await?,
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    // Level is overridden by `RUST_LOG`
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = cli().run();
    let config = Config::load()?;
    block_on_detached(run(cli, config))?
}

/// Drive `future` to completion, then drop the runtime without joining
/// blocking tasks. A key read parked in hidapi stays blocked until the next
/// report, and waiting on it would stall exit after ctrl-c.
fn block_on_detached<F: Future>(future: F) -> std::io::Result<F::Output> {
    let rt = tokio::runtime::Runtime::new()?;
    let output = rt.block_on(future);
    rt.shutdown_background();
    Ok(output)
}
