use std::io::Write;

use log::info;
use serde::Serialize;
use serde_json::json;

use faxqueue::config::{load_config, resolve_config_path, validate_config};
use faxqueue::queue::SubmitRequest;
use faxqueue::{
    listing, AddressBook, Archive, ArchiveKind, Config, Database, DocumentSource, JobQueue,
    SqliteAddressBook,
};

use crate::args::{ArchiveArg, CleanupAction, Cli, Command, ContactsCommand};
use crate::error::{CliError, Result};

impl From<ArchiveArg> for ArchiveKind {
    fn from(arg: ArchiveArg) -> Self {
        match arg {
            ArchiveArg::Success => ArchiveKind::Success,
            ArchiveArg::Failure => ArchiveKind::Failure,
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out).map_err(|e| CliError::Usage(format!("stdout: {}", e)))?;
    Ok(())
}

fn load(cli: &Cli) -> Result<Config> {
    let mut config = match resolve_config_path(cli.config.as_deref()) {
        Some(path) => {
            info!("Using configuration {}", path.display());
            load_config(&path).map_err(CliError::lib)?
        }
        None => Config::default(),
    };
    if let Some(base) = &cli.base {
        config.base_directory = base.to_string_lossy().into_owned();
        validate_config(&config).map_err(CliError::lib)?;
    }
    Ok(config)
}

fn address_book(config: &Config) -> Result<SqliteAddressBook> {
    let db = Database::open(&config.database_file()).map_err(CliError::lib)?;
    Ok(SqliteAddressBook::new(db, config.country_code.clone()))
}

pub fn run(cli: Cli) -> Result<()> {
    let config = load(&cli)?;
    let queue = JobQueue::from_config(&config);
    let archive = Archive::new(queue.layout());

    match cli.command {
        Command::Init => {
            queue.layout().ensure_directories().map_err(CliError::lib)?;
            queue.sources().ensure_directories().map_err(CliError::lib)?;
            address_book(&config)?;
            info!("Spool ready at {}", config.base_directory);
            print_json(&json!({ "base_directory": config.base_directory }))
        }

        Command::Sources { bucket: None } => {
            let buckets: Vec<_> = queue
                .sources()
                .bucket_names()
                .map(|name| {
                    json!({
                        "name": name,
                        "directory": queue.sources().directory(name).ok(),
                    })
                })
                .collect();
            print_json(&buckets)
        }

        Command::Sources {
            bucket: Some(bucket),
        } => {
            let files = queue.sources().list(&bucket).map_err(CliError::lib)?;
            print_json(&files)
        }

        Command::Submit(args) => {
            let book = address_book(&config)?;
            let request = SubmitRequest {
                src: args.src,
                files: args.files,
                recipient_name: args.name,
                recipient_number: args.number,
                contact_id: args.contact,
                ecm: args.ecm,
                resolution: args.resolution,
                save_contact: args.save_contact,
            };
            let report = queue.submit(&request, Some(&book));
            print_json(&report)?;
            if report.notices.has_errors() {
                return Err(CliError::Reported(report.notices.err.join(" ")));
            }
            Ok(())
        }

        Command::Cancel { job_id, stage } => {
            let receipt = queue
                .request_cancel(&job_id, &stage)
                .map_err(CliError::lib)?;
            print_json(&receipt)
        }

        Command::Status { limit } => {
            let limit = limit.unwrap_or(config.limits.max_active_jobs);
            print_json(&listing::status_snapshot(queue.layout(), limit))
        }

        Command::Archive { kind, limit } => {
            let kind = ArchiveKind::from(kind);
            let default_limit = match kind {
                ArchiveKind::Success => config.limits.max_archive_list,
                ArchiveKind::Failure => config.limits.max_fail_list,
            };
            print_json(&archive.list(kind, limit.unwrap_or(default_limit)))
        }

        Command::Fetch { kind, name } => {
            let kind = ArchiveKind::from(kind);
            if name.to_ascii_lowercase().ends_with(".pdf") {
                let path = archive.open_artifact(kind, &name).map_err(CliError::lib)?;
                print_json(&json!({ "path": path }))
            } else {
                let path = archive.open_record(kind, &name).map_err(CliError::lib)?;
                let record: serde_json::Value =
                    faxqueue::storage::read_json(&path).map_err(CliError::lib)?;
                print_json(&record)
            }
        }

        Command::Cleanup { action, names } => {
            let report = match action {
                CleanupAction::Delete => archive.delete_failures(&names),
                CleanupAction::Adopt => archive.adopt_failures(&names),
            };
            print_json(&report)?;
            if report.failed() > 0 {
                return Err(CliError::Reported(format!(
                    "{} of {} item(s) failed",
                    report.failed(),
                    names.len()
                )));
            }
            Ok(())
        }

        Command::Contacts(command) => {
            let book = address_book(&config)?;
            match command {
                ContactsCommand::List => print_json(&book.list().map_err(CliError::lib)?),
                ContactsCommand::Save {
                    id,
                    name,
                    number,
                    note,
                } => {
                    let id = book
                        .upsert(id, &name, &number, &note)
                        .map_err(CliError::lib)?;
                    let contact = book.get(id).map_err(CliError::lib)?;
                    print_json(&contact)
                }
                ContactsCommand::Delete { id } => {
                    let deleted = book.delete(id).map_err(CliError::lib)?;
                    print_json(&json!({ "id": id, "deleted": deleted }))?;
                    if !deleted {
                        return Err(CliError::Usage(format!("Contact {} not found", id)));
                    }
                    Ok(())
                }
            }
        }
    }
}
