use crate::estimate::{run_estimate, run_locations, EstimateArgs, LocationsArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use harpro::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "harpro",
    about = "Estimate house prices from location and size, or serve the estimate API",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// List islands, provinces, or cities from the location hierarchy
    Locations(LocationsArgs),
    /// Run one estimate end to end against the prediction service
    Estimate(EstimateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Locations(args) => run_locations(args),
        Command::Estimate(args) => run_estimate(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["harpro"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn estimate_flags_use_form_field_names() {
        let cli = Cli::try_parse_from([
            "harpro",
            "estimate",
            "--pulau",
            "Jawa",
            "--provinsi",
            "Yogyakarta",
            "--kota",
            "Sleman",
            "--luas-tanah",
            "120",
            "--luas-bangunan",
            "80",
            "--kamar-tidur",
            "3",
            "--agree",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Estimate(args)) => {
                assert_eq!(args.pulau, "Jawa");
                assert_eq!(args.luas_tanah, 120.0);
                assert_eq!(args.kamar_tidur, 3);
                assert_eq!(args.kamar_mandi, 1);
                assert_eq!(args.parkir, 0);
                assert!(args.agree);
            }
            other => panic!("expected estimate command, got {other:?}"),
        }
    }

    #[test]
    fn serve_accepts_overrides() {
        let cli = Cli::try_parse_from(["harpro", "serve", "--port", "8081"]).expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => assert_eq!(args.port, Some(8081)),
            other => panic!("expected serve command, got {other:?}"),
        }
    }
}
