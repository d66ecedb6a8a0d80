//! The `monochrome handle` and `monochrome process` commands.

use clap::Args;
use monochrome_core::{event, Config, InvocationResult, ObjectLocation};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::local_processor;

/// Arguments for the `handle` command.
#[derive(Args, Debug)]
pub struct HandleArgs {
    /// Notification payload file, or `-` to read stdin
    #[arg(default_value = "-")]
    pub event: PathBuf,

    /// Pretty-print the invocation result
    #[arg(long)]
    pub pretty: bool,
}

/// Arguments for the `process` command.
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Bucket holding the source image
    #[arg(short, long)]
    pub bucket: String,

    /// Key of the source image
    #[arg(short, long)]
    pub key: String,

    /// Pretty-print the invocation result
    #[arg(long)]
    pub pretty: bool,
}

/// Execute the handle command.
pub async fn execute_handle(args: HandleArgs, config: &Config) -> anyhow::Result<ExitCode> {
    let payload = read_payload(&args.event)?;
    let processor = local_processor(config);
    let result = processor.handle_event(&payload).await;
    report(&result, args.pretty)
}

/// Execute the process command.
pub async fn execute_process(args: ProcessArgs, config: &Config) -> anyhow::Result<ExitCode> {
    let payload = event::notification_for(&ObjectLocation::new(args.bucket, args.key));
    let processor = local_processor(config);
    let result = processor.handle_value(&payload).await;
    report(&result, args.pretty)
}

fn read_payload(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut payload = String::new();
        std::io::stdin().read_to_string(&mut payload)?;
        Ok(payload)
    } else {
        std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!(
                "Cannot read event file {:?}: {e}\n\n  Hint: Check the file path and try again.",
                path
            )
        })
    }
}

/// Print the invocation result on stdout and map it to the exit code.
fn report(result: &InvocationResult, pretty: bool) -> anyhow::Result<ExitCode> {
    println!("{}", render(result, pretty)?);
    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn render(result: &InvocationResult, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(result)
    } else {
        serde_json::to_string(result)
    }
}
