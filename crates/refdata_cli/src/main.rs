//! Command-line summary of a reference-data database.
//!
//! # Responsibility
//! - Open (and migrate) a reference-data database and print a short
//!   hierarchy summary.
//!
//! Without `--db` an in-memory database is used.

use clap::Parser;
use refdata_core::db::migrations::current_user_version;
use refdata_core::{
    core_version, init_logging_from_config, open_db, open_db_in_memory, CoreConfig, QueryService,
    SqliteReferenceStore,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "refdata")]
#[command(about = "Reference-data hierarchy summary", long_about = None)]
struct Cli {
    /// SQLite database file, created and migrated when missing.
    #[arg(long)]
    db: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match cli.config.as_deref() {
        Some(path) => CoreConfig::from_path(path)?,
        None => CoreConfig::default(),
    };
    init_logging_from_config(&config.logging)?;

    let conn = match cli.db.as_deref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let store = SqliteReferenceStore::new(&conn, config.naming.match_mode);
    let query = QueryService::new(store, config);

    println!("refdata_core version={}", core_version());
    println!("schema version={}", current_user_version(&conn)?);
    println!("departments={}", query.departments()?.len());
    println!("scopes={}", query.scopes()?.len());
    println!("main_titles={}", query.main_titles()?.len());
    println!("product_types={}", query.product_types()?.len());
    println!("service_features={}", query.service_features()?.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{run, Cli};
    use clap::Parser;

    #[test]
    fn both_flags_are_optional() {
        let cli = Cli::try_parse_from(["refdata"]).unwrap();
        assert!(cli.db.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn positional_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["refdata", "store.db"]).is_err());
    }

    #[test]
    fn runs_against_a_new_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("refdata.db");
        let cli = Cli::try_parse_from(["refdata", "--db", db.to_str().unwrap()]).unwrap();

        run(cli).unwrap();
        assert!(db.exists());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("absent.toml");
        let cli = Cli::try_parse_from(["refdata", "--config", config.to_str().unwrap()]).unwrap();

        assert!(run(cli).is_err());
    }
}
