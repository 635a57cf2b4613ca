use chrono::NaiveDate;
use coffeebot_core::db::open_db_in_memory;
use coffeebot_core::{
    AssignmentRepository, HistoryRepository, OutboxRepository, OutgoingMessage, Participant,
    ParticipantValidationError, RepoError, RosterRepository, SqliteAssignmentRepository,
    SqliteHistoryRepository, SqliteOutboxRepository, SqliteRosterRepository,
};
use uuid::Uuid;

fn participant(name: &str) -> Participant {
    Participant::new(name, format!("{name}@gmail.com"))
}

#[test]
fn roster_lists_in_signup_order_and_roundtrips_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::new(&conn);

    let mut foo = participant("foo");
    foo.timezone = "UTC+1".to_string();
    foo.cadence = 2;
    foo.suppress_until = Some("2024/07/01".to_string());
    foo.topics = "rust, coffee".to_string();
    repo.upsert_participant(&foo).unwrap();
    repo.upsert_participant(&participant("bar")).unwrap();
    repo.upsert_participant(&participant("bam")).unwrap();

    let roster = repo.list_participants().unwrap();
    let emails: Vec<&str> = roster.iter().map(|p| p.email.as_str()).collect();
    assert_eq!(emails, vec!["foo@gmail.com", "bar@gmail.com", "bam@gmail.com"]);
    assert_eq!(roster[0], foo);
    assert_eq!(roster[1].timezone, "UNKNOWN");
    assert_eq!(roster[1].cadence, 1);
}

#[test]
fn roster_upsert_replaces_existing_entry() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::new(&conn);

    repo.upsert_participant(&participant("foo")).unwrap();
    let mut renamed = participant("foo");
    renamed.name = "Foo Fighter".to_string();
    renamed.cadence = 3;
    repo.upsert_participant(&renamed).unwrap();

    let roster = repo.list_participants().unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].name, "Foo Fighter");
    assert_eq!(roster[0].cadence, 3);
}

#[test]
fn roster_rejects_invalid_participants() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::new(&conn);

    let mut invalid = participant("foo");
    invalid.cadence = 0;
    let err = repo.upsert_participant(&invalid).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ParticipantValidationError::NonPositiveCadence(_))
    ));
    assert!(repo.list_participants().unwrap().is_empty());
}

#[test]
fn roster_remove_and_snooze_report_missing_participants() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteRosterRepository::new(&conn);
    repo.upsert_participant(&participant("foo")).unwrap();

    repo.set_suppress_until("foo@gmail.com", Some("2030/01/01"))
        .unwrap();
    assert_eq!(
        repo.get_participant("foo@gmail.com")
            .unwrap()
            .unwrap()
            .suppress_until
            .as_deref(),
        Some("2030/01/01")
    );
    repo.set_suppress_until("foo@gmail.com", Some("  ")).unwrap();
    assert_eq!(
        repo.get_participant("foo@gmail.com")
            .unwrap()
            .unwrap()
            .suppress_until,
        None
    );

    repo.remove_participant("foo@gmail.com").unwrap();
    assert!(repo.get_participant("foo@gmail.com").unwrap().is_none());

    let err = repo.remove_participant("foo@gmail.com").unwrap_err();
    assert!(matches!(err, RepoError::NotFound(email) if email == "foo@gmail.com"));
    let err = repo.set_suppress_until("ghost@gmail.com", None).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[test]
fn history_appends_and_loads_distinct_keys() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteHistoryRepository::new(&conn);
    let cycle_id = Uuid::new_v4();
    let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();

    repo.append("bar@gmail.com,foo@gmail.com", date, cycle_id)
        .unwrap();
    repo.append("bam@gmail.com,baz@gmail.com", date, cycle_id)
        .unwrap();
    repo.append("bar@gmail.com,foo@gmail.com", date, cycle_id)
        .unwrap();

    let keys = repo.load_keys().unwrap();
    assert_eq!(keys.len(), 2);
    assert!(keys.contains("bam@gmail.com,baz@gmail.com"));

    let entries = repo.list_entries(Some(2)).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].group_key, "bar@gmail.com,foo@gmail.com");
    assert_eq!(entries[0].pairing_date, "2024/6/3");
    assert_eq!(entries[0].cycle_id, cycle_id);
    assert_eq!(repo.list_entries(None).unwrap().len(), 3);
}

#[test]
fn assignment_replace_all_overwrites_previous_assignment() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAssignmentRepository::new(&conn);

    repo.replace_all(&[
        "bar@gmail.com,foo@gmail.com".to_string(),
        "bam@gmail.com,baz@gmail.com".to_string(),
    ])
    .unwrap();
    repo.replace_all(&[
        "baz@gmail.com,foo@gmail.com".to_string(),
        "bam@gmail.com,bar@gmail.com".to_string(),
    ])
    .unwrap();

    assert_eq!(
        repo.read_all().unwrap(),
        vec!["baz@gmail.com,foo@gmail.com", "bam@gmail.com,bar@gmail.com"]
    );

    repo.replace_all(&[]).unwrap();
    assert!(repo.read_all().unwrap().is_empty());
}

#[test]
fn outbox_queues_and_marks_messages_delivered() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteOutboxRepository::new(&conn);
    let message = OutgoingMessage {
        sender_name: "Coffeebot".to_string(),
        recipients: vec!["bar@gmail.com".to_string(), "foo@gmail.com".to_string()],
        subject: "Coffee Time with bar & foo!".to_string(),
        body: "Hey bar & foo!".to_string(),
    };

    let first = repo.enqueue(&message).unwrap();
    let second = repo.enqueue(&message).unwrap();

    let pending = repo.list_pending(None).unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].id, first);
    assert_eq!(pending[0].message, message);

    repo.mark_delivered(first).unwrap();
    let pending = repo.list_pending(Some(10)).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, second);

    let err = repo.mark_delivered(first).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}
