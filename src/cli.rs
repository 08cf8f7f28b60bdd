use std::io::{self, BufRead, Write};

use console::style;
use log::error;

use crate::{config::Config, error::ApiError, error::Result, services::LibrarianService};

/// Interactive loop over the same pipeline the HTTP endpoint uses: one
/// recommendation (or rejection) per line of input. `quit`/`exit` ends it.
pub async fn run(config: &Config) -> Result<()> {
    let librarian = LibrarianService::from_config(config).await?;

    println!("{}", style("Smart Librarian (type 'quit' to exit)").bold());

    let stdin = io::stdin();
    loop {
        print!("\nYou: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        match librarian.recommend(line).await {
            Ok(recommendation) => {
                println!("\n{}", style("Librarian:").bold());
                println!(
                    "{} {}",
                    style("Recommendation:").cyan(),
                    style(&recommendation.title).bold()
                );
                println!("{}", recommendation.reason);
                println!("\n{}", recommendation.summary);
            }
            // Rejections carry their user-facing message directly.
            Err(
                err @ (ApiError::EmptyInput
                | ApiError::InappropriateInput
                | ApiError::GibberishInput
                | ApiError::NoCandidates
                | ApiError::NoCloseMatch),
            ) => {
                println!("{} {}", style("Librarian:").bold(), err);
            }
            Err(err) => {
                error!("Request failed: {}", err);
                println!(
                    "{}",
                    style("Something went wrong; please try again.").red()
                );
            }
        }
    }

    Ok(())
}
