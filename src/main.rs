use std::process::ExitCode;

use clap::Parser;
use epitrace::runner::{run_with_args, BaseArgs};

fn main() -> ExitCode {
    let args = BaseArgs::parse();
    match run_with_args(&args) {
        Ok(summary) => {
            for (sample, (last_day, infected)) in summary
                .last_days
                .iter()
                .zip(&summary.total_infected)
                .enumerate()
            {
                println!("{}: sample {sample} ended on day {last_day} with {infected} infected", summary.title);
            }
            println!("Reports written to {}", summary.daily_report.display());
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
