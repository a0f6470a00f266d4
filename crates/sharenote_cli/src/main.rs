//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `sharenote_core` linkage and configuration loading.
//! - Walk one share/search scenario against the configured database and
//!   print deterministic results.

use sharenote_core::db::open_db;
use sharenote_core::{
    init_logging_from_config, CoreConfig, PrincipalId, SearchQuery, SqliteNoteService,
    SqlitePrincipalDirectory,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    println!("sharenote_core ping={}", sharenote_core::ping());
    println!("sharenote_core version={}", sharenote_core::core_version());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_run module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::from_env()?;
    if init_logging_from_config(&config)? {
        println!("logging level={} dir={:?}", config.log_level, config.log_dir);
    }

    let conn = open_db(&config.db_path)?;
    println!("database path={}", config.db_path.display());

    let owner = PrincipalId::new("demo-owner");
    let reader = PrincipalId::new("demo-reader");
    let directory = SqlitePrincipalDirectory::try_new(&conn)?;
    directory.register(&owner, "Demo Owner")?;
    directory.register(&reader, "Demo Reader")?;

    let service = SqliteNoteService::try_from_connection(&conn)?;
    let note = service.create_note(&owner, "Groceries", "milk, eggs")?;
    service.share_note(&owner, note.id, &reader)?;

    for visible in service.list_visible(&reader)? {
        println!(
            "visible principal={} note_id={} provenance={}",
            reader,
            visible.note.id,
            visible.provenance.as_str()
        );
    }

    let hits = service.search(&reader, &SearchQuery::new("milk"))?;
    println!("search principal={} query=milk hits={}", reader, hits.len());

    if let Err(err) = service.update_note(&reader, note.id, "Groceries", "bread") {
        println!("update principal={} status={}", reader, err.status_code());
    }

    service.delete_note(&owner, note.id)?;
    println!(
        "after delete principal={} visible={}",
        reader,
        service.list_visible(&reader)?.len()
    );
    Ok(())
}
