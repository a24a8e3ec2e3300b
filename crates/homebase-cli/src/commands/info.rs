//! Info command - show detected hardware and selected parameters.

use homebase_system::{GenerationConfig, HardwareProfile, HostSettings, OptionValue};
use indexmap::IndexMap;
use serde::Serialize;

/// Everything `info --json` prints.
#[derive(Serialize)]
struct InfoReport<'a> {
    server: &'a str,
    profile: &'a HardwareProfile,
    config: &'a GenerationConfig,
    runtime_options: IndexMap<String, OptionValue>,
}

pub(crate) fn run(settings: &HostSettings, server: &str, json: bool) -> miette::Result<()> {
    if json {
        let report = InfoReport {
            server,
            profile: settings.profile(),
            config: settings.config(),
            runtime_options: settings.runtime_options(),
        };
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| miette::miette!("Failed to serialize info: {}", e))?;
        println!("{}", text);
        return Ok(());
    }

    let profile = settings.profile();
    let config = settings.config();

    println!("Homebase");
    println!("========");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Server:  {}", server);
    println!();

    println!("System Information:");
    println!("  OS:           {}", profile.os_family);
    println!("  Architecture: {}", profile.architecture);
    println!("  Device Type:  {}", profile.accelerator_kind);
    match profile.cpu_count {
        Some(count) => println!("  CPUs:         {}", count),
        None => println!("  CPUs:         unknown"),
    }
    println!();

    println!("Generation Parameters:");
    println!("  Threads:      {}", config.thread_count);
    println!("  Context size: {}", config.context_size);
    println!("  Batch size:   {}", config.batch_size);
    println!("  Parallel:     {}", config.parallel_requests);
    for (key, value) in &config.accelerator_options {
        println!("  {:<13} {}", format!("{}:", key), value);
    }
    println!();

    println!("Server Options:");
    for (key, value) in settings.runtime_options() {
        println!("  {} = {}", key, value);
    }
    println!();

    println!("Performance Tips:");
    println!("  - Lower context size for faster responses");
    if !profile.accelerator_kind.is_gpu() {
        println!("  - Use a GPU for better performance");
    }
    println!("  - Lower temperature (0.1-0.5) for factual answers,");
    println!("    higher (0.7-1.0) for creative tasks");

    Ok(())
}
