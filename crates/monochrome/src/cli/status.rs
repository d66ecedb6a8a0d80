//! The `monochrome status` command.

use clap::Args;
use monochrome_core::{Config, LocalRecordStore, RecordStore};
use std::process::ExitCode;

/// Arguments for the `status` command.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Record id (the source object key)
    pub id: String,
}

/// Execute the status command.
pub async fn execute(args: StatusArgs, config: &Config) -> anyhow::Result<ExitCode> {
    let store = LocalRecordStore::new(config.records_dir());
    match store.get(&args.id).await? {
        Some(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("No record for {:?}", args.id);
            Ok(ExitCode::FAILURE)
        }
    }
}
