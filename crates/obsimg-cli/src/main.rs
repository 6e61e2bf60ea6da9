//! obs-img - Open Build Service image utilities

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use obsimg_core::ResolveError;
use tracing_subscriber::EnvFilter;

use obsimg_cli::cmd;
use obsimg_cli::config::Settings;
use obsimg_cli::input::LineInput;
use obsimg_cli::ui::Theme;
use obsimg_cli::{Cli, Commands, LICENSE, PackageCommands};

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.license {
        println!("{LICENSE}");
        return ExitCode::SUCCESS;
    }
    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        return ExitCode::from(2);
    };

    let settings = match Settings::load(command.shared()) {
        Ok(settings) => settings,
        Err(e) => return report(&e, &Theme::new(command.shared().no_color)),
    };

    // RUST_LOG wins over the verbosity flags and the config file
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = match &command {
        Commands::Download(args) => {
            cmd::download::download(args, &settings, &mut LineInput::stdin())
        }
        Commands::Packages { command } => match command {
            PackageCommands::List {
                licenses,
                names,
                json,
                ..
            } => cmd::packages::list(&settings, licenses, names, *json),
            PackageCommands::Show {
                package_name, json, ..
            } => cmd::packages::show(&settings, package_name, *json),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e, &Theme::new(settings.no_color)),
    }
}

/// Print `err` and pick the exit status for it.
fn report(err: &anyhow::Error, theme: &Theme) -> ExitCode {
    let resolve = err.downcast_ref::<ResolveError>();

    if resolve.is_some_and(ResolveError::is_not_ready) {
        let icon = theme.paint(theme.icons.warning, theme.colors.warning);
        eprintln!("{icon} {err}");
    } else {
        let icon = theme.paint(theme.icons.error, theme.colors.error);
        eprintln!("{icon} {err:#}");
    }

    let code = resolve.map_or(1, ResolveError::exit_code);
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
