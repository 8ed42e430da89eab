use clap::Parser;

use srexport::cli::Cli;
use srexport::config::Config;
use srexport::export::run_export;
use srexport::prompt::StdinPrompter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::try_from(cli)?;
    let summary = run_export(&config, &mut StdinPrompter)?;
    if config.print_summary {
        let serialized = serde_json::to_string_pretty(&summary)?;
        println!("{}", serialized);
    }
    Ok(())
}
