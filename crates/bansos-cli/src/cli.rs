//! Command-line definition

use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

pub(crate) fn command() -> Command {
    Command::new("bansos")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Bansos e-KYC mock backend")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .env("BANSOS_CONFIG")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .global(true)
                .env("BANSOS_DATA_DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Directory of the file-backed store"),
        )
        .subcommand(
            Command::new("db")
                .about("Shared mock database")
                .subcommand_required(true)
                .subcommand(Command::new("init").about("Load the database, generating it if absent"))
                .subcommand(Command::new("reset").about("Delete the database and portal state"))
                .subcommand(Command::new("summary").about("Print record counts")),
        )
        .subcommand(
            Command::new("accounts")
                .about("List portal accounts")
                .arg(
                    Arg::new("phone")
                        .long("phone")
                        .help("Show only the account with this phone number"),
                ),
        )
        .subcommand(
            Command::new("onboard")
                .about("Run the onboarding wizard with mock captures, resuming saved progress")
                .arg(
                    Arg::new("phone")
                        .long("phone")
                        .default_value("08123450009")
                        .help("Applicant phone number"),
                )
                .arg(
                    Arg::new("email")
                        .long("email")
                        .default_value("warga@contoh.id")
                        .help("Applicant email"),
                )
                .arg(
                    Arg::new("fail-submit")
                        .long("fail-submit")
                        .action(ArgAction::SetTrue)
                        .help("Make the submission service report a network error"),
                ),
        )
        .subcommand(
            Command::new("peers")
                .about("Show the bridge peers a page would connect to")
                .arg(
                    Arg::new("origin")
                        .long("origin")
                        .required(true)
                        .help("URL of the local page"),
                )
                .arg(
                    Arg::new("peer")
                        .long("peer")
                        .action(ArgAction::Append)
                        .help("Additional peer origin"),
                ),
        )
        .subcommand(
            Command::new("session")
                .about("Citizen portal session")
                .subcommand_required(true)
                .subcommand(
                    Command::new("create")
                        .about("Sign in")
                        .arg(Arg::new("phone").required(true)),
                )
                .subcommand(Command::new("show").about("Print the active session"))
                .subcommand(Command::new("clear").about("Sign out")),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_is_consistent() {
        command().debug_assert();
    }

    #[test]
    fn peers_collects_repeated_flags() {
        let m = command()
            .try_get_matches_from([
                "bansos",
                "peers",
                "--origin",
                "http://localhost:3000",
                "--peer",
                "http://a:1",
                "--peer",
                "http://b:2",
            ])
            .unwrap();
        let (_, args) = m.subcommand().unwrap();
        let peers: Vec<&String> = args.get_many::<String>("peer").unwrap().collect();
        assert_eq!(peers, ["http://a:1", "http://b:2"]);
    }

    #[test]
    fn session_create_needs_phone() {
        assert!(command()
            .try_get_matches_from(["bansos", "session", "create"])
            .is_err());
    }

    #[test]
    fn data_dir_is_global() {
        let m = command()
            .try_get_matches_from(["bansos", "db", "summary", "--data-dir", "/tmp/x"])
            .unwrap();
        assert_eq!(
            m.get_one::<PathBuf>("data-dir"),
            Some(&PathBuf::from("/tmp/x"))
        );
    }
}
