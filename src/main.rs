//! stencil's main application entry point.
//! Parses the command line, runs the template action and prints what was
//! generated.

use stencil::{
    action::FetchTemplateAction,
    cli::{get_args, Args},
    error::{default_error_handler, Result},
    logger::init_logger,
};

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Builds the run input from the input document, values and flags
/// 2. Configures the action with the workspace and base URL
/// 3. Fetches and renders the skeleton
/// 4. Prints one line per produced entry
fn run(args: Args) -> Result<()> {
    let input = args.to_input()?;

    let mut action = FetchTemplateAction::new(&args.workspace);
    if let Some(base_url) = &args.base_url {
        action = action.with_base_url(base_url);
    }

    let report = action.run(input)?;
    for entry in &report.entries {
        println!("{}: '{}'", entry.action, entry.target.display());
    }

    println!("Template generation completed successfully ({} entries).", report.entries.len());
    Ok(())
}
