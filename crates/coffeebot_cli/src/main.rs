//! Coffeebot command line entry point.
//!
//! # Responsibility
//! - Load config, start logging, open the store and run one command.
//! - Flatten core errors into one stderr line and a failing exit code.
//!
//! Generate and dispatch are separate commands so each can run on its own
//! schedule; the scheduler must not overlap two runs of the same command.

mod args;

use args::{Cli, Command, CycleArgs, SignupArgs};
use chrono::{Local, NaiveDate};
use clap::Parser;
use coffeebot_core::db::open_db;
use coffeebot_core::{
    init_logging, AssignmentRepository, CoffeebotConfig, HistoryRepository, LogNotifier, Notifier,
    NotifyMode, OutboxNotifier, OutboxRepository, PairingService, Participant, ParticipantRow,
    RosterRepository, SqliteAssignmentRepository, SqliteHistoryRepository,
    SqliteOutboxRepository, SqliteRosterRepository,
};
use log::info;
use rusqlite::Connection;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("coffeebot: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = load_config(&cli)?;
    init_logging(&config.logging.level, config.logging.dir.as_deref())?;
    info!(
        "event=cli_start module=cli status=ok version={}",
        coffeebot_core::core_version()
    );

    let conn = open_db(&config.storage.database_path).map_err(|err| err.to_string())?;

    match cli.command {
        Command::Init => {
            println!(
                "initialized {}",
                config.storage.database_path.display()
            );
            Ok(())
        }
        Command::Signup(args) => signup(&conn, args),
        Command::Remove { email } => {
            SqliteRosterRepository::new(&conn)
                .remove_participant(&email)
                .map_err(|err| err.to_string())?;
            println!("removed {email}");
            Ok(())
        }
        Command::Snooze { email, until } => {
            SqliteRosterRepository::new(&conn)
                .set_suppress_until(&email, until.as_deref())
                .map_err(|err| err.to_string())?;
            match until {
                Some(until) => println!("{email} sits out through {until}"),
                None => println!("{email} is back in rotation"),
            }
            Ok(())
        }
        Command::Roster { json } => roster(&conn, json),
        Command::Generate(args) => generate(&conn, &config, &args),
        Command::Dispatch(args) => dispatch(&conn, &config, &args),
        Command::Next => {
            let keys = SqliteAssignmentRepository::new(&conn)
                .read_all()
                .map_err(|err| err.to_string())?;
            for key in keys {
                println!("{key}");
            }
            Ok(())
        }
        Command::History { limit } => {
            let entries = SqliteHistoryRepository::new(&conn)
                .list_entries(limit)
                .map_err(|err| err.to_string())?;
            for entry in entries {
                println!("{}\t{}\t{}", entry.pairing_date, entry.group_key, entry.cycle_id);
            }
            Ok(())
        }
        Command::Outbox {
            limit,
            mark_delivered,
        } => outbox(&conn, limit, mark_delivered),
    }
}

fn load_config(cli: &Cli) -> Result<CoffeebotConfig, String> {
    let mut config = CoffeebotConfig::load(&cli.config).map_err(|err| err.to_string())?;
    if let Some(db) = cli.db.as_ref() {
        config.storage.database_path = db.clone();
    }
    if let Some(level) = cli.log_level.as_ref() {
        config.logging.level = level.clone();
    }
    if let Some(dir) = cli.log_dir.as_ref() {
        config.logging.dir = Some(dir.clone());
    }
    config.validate().map_err(|err| err.to_string())?;
    Ok(config)
}

fn signup(conn: &Connection, args: SignupArgs) -> Result<(), String> {
    let participant = Participant::from_row(ParticipantRow {
        name: Some(args.name),
        email: Some(args.email),
        timezone: args.timezone,
        suppress_until: args.suppress_until,
        cadence: args.cadence,
        topics: args.topics,
    });
    let repo = SqliteRosterRepository::new(conn);
    let existed = repo
        .get_participant(&participant.email)
        .map_err(|err| err.to_string())?
        .is_some();
    repo.upsert_participant(&participant)
        .map_err(|err| err.to_string())?;

    let verb = if existed { "updated" } else { "signed up" };
    println!("{verb} {} <{}>", participant.name, participant.email);
    Ok(())
}

fn roster(conn: &Connection, json: bool) -> Result<(), String> {
    let participants = SqliteRosterRepository::new(conn)
        .list_participants()
        .map_err(|err| err.to_string())?;

    if json {
        let rendered =
            serde_json::to_string_pretty(&participants).map_err(|err| err.to_string())?;
        println!("{rendered}");
        return Ok(());
    }

    for participant in participants {
        println!(
            "{}\t{}\t{}\tevery {} week(s)\t{}\t{}",
            participant.email,
            participant.name,
            participant.timezone,
            participant.cadence,
            participant.suppress_until.as_deref().unwrap_or("-"),
            participant.topics
        );
    }
    Ok(())
}

fn pairing_service<'conn>(
    conn: &'conn Connection,
    config: &CoffeebotConfig,
) -> PairingService<
    SqliteRosterRepository<'conn>,
    SqliteHistoryRepository<'conn>,
    SqliteAssignmentRepository<'conn>,
> {
    PairingService::new(
        SqliteRosterRepository::new(conn),
        SqliteHistoryRepository::new(conn),
        SqliteAssignmentRepository::new(conn),
    )
    .with_options(config.pairing.options())
}

fn cycle_date(args: &CycleArgs) -> NaiveDate {
    args.date.unwrap_or_else(|| Local::now().date_naive())
}

fn generate(conn: &Connection, config: &CoffeebotConfig, args: &CycleArgs) -> Result<(), String> {
    let mut rng = config.pairing.random_source();
    let report = pairing_service(conn, config)
        .generate_assignment(cycle_date(args), rng.as_mut())
        .map_err(|err| err.to_string())?;

    println!(
        "week {}: {} eligible, {} group(s), {} repeat(s)",
        report.week_number,
        report.eligible_count,
        report.outcome.groups.len(),
        report.outcome.repeated_keys.len()
    );
    for key in report.outcome.keys() {
        println!("{key}");
    }
    Ok(())
}

fn dispatch(conn: &Connection, config: &CoffeebotConfig, args: &CycleArgs) -> Result<(), String> {
    let notifier: Box<dyn Notifier + '_> = match config.notify.mode {
        NotifyMode::Outbox => Box::new(OutboxNotifier::new(SqliteOutboxRepository::new(conn))),
        NotifyMode::Log => Box::new(LogNotifier),
    };
    let mut rng = config.pairing.random_source();

    let report = pairing_service(conn, config)
        .dispatch_notifications(
            notifier.as_ref(),
            cycle_date(args),
            &config.notify.sender_name,
            rng.as_mut(),
        )
        .map_err(|err| err.to_string())?;

    println!("dispatched {} group(s)", report.delivered.len());
    Ok(())
}

fn outbox(conn: &Connection, limit: Option<u32>, mark_delivered: Option<i64>) -> Result<(), String> {
    let repo = SqliteOutboxRepository::new(conn);
    if let Some(id) = mark_delivered {
        repo.mark_delivered(id).map_err(|err| err.to_string())?;
        println!("marked {id} delivered");
        return Ok(());
    }

    for record in repo.list_pending(limit).map_err(|err| err.to_string())? {
        println!(
            "#{} to {} from {}: {}",
            record.id,
            record.message.recipients.join(", "),
            record.message.sender_name,
            record.message.subject
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{dispatch, generate, pairing_service};
    use crate::args::CycleArgs;
    use chrono::NaiveDate;
    use coffeebot_core::db::open_db_in_memory;
    use coffeebot_core::{
        AssignmentRepository, CoffeebotConfig, HistoryRepository, NotifyMode, OutboxRepository,
        Participant, RosterRepository, SeededRandom, SqliteAssignmentRepository,
        SqliteHistoryRepository, SqliteOutboxRepository, SqliteRosterRepository,
    };

    fn cycle() -> CycleArgs {
        CycleArgs {
            date: NaiveDate::from_ymd_opt(2024, 6, 20),
        }
    }

    fn seeded_config() -> CoffeebotConfig {
        let mut config = CoffeebotConfig::default();
        config.pairing.seed = Some(7);
        config
    }

    fn seed_roster(conn: &rusqlite::Connection) {
        let roster = SqliteRosterRepository::new(conn);
        for name in ["foo", "bar", "bam", "baz"] {
            roster
                .upsert_participant(&Participant::new(name, format!("{name}@gmail.com")))
                .unwrap();
        }
    }

    #[test]
    fn generate_then_dispatch_queues_one_message_per_group() {
        let conn = open_db_in_memory().unwrap();
        seed_roster(&conn);
        let config = seeded_config();

        generate(&conn, &config, &cycle()).unwrap();
        assert_eq!(SqliteAssignmentRepository::new(&conn).read_all().unwrap().len(), 2);

        dispatch(&conn, &config, &cycle()).unwrap();
        assert_eq!(SqliteOutboxRepository::new(&conn).list_pending(None).unwrap().len(), 2);
        assert_eq!(SqliteHistoryRepository::new(&conn).load_keys().unwrap().len(), 2);
    }

    #[test]
    fn log_mode_dispatch_records_history_without_queueing() {
        let conn = open_db_in_memory().unwrap();
        seed_roster(&conn);
        let mut config = seeded_config();
        config.notify.mode = NotifyMode::Log;

        generate(&conn, &config, &cycle()).unwrap();
        dispatch(&conn, &config, &cycle()).unwrap();

        assert!(SqliteOutboxRepository::new(&conn).list_pending(None).unwrap().is_empty());
        assert_eq!(SqliteHistoryRepository::new(&conn).load_keys().unwrap().len(), 2);
    }

    #[test]
    fn pairing_service_borrows_only_the_connection() {
        let conn = open_db_in_memory().unwrap();
        seed_roster(&conn);
        let service = {
            let config = seeded_config();
            pairing_service(&conn, &config)
        };

        let report = service
            .generate_assignment(cycle().date.unwrap(), &mut SeededRandom::new(1))
            .unwrap();
        assert_eq!(report.eligible_count, 4);
    }
}
