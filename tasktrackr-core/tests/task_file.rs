use std::fs;

use tasktrackr_core::{LoadOutcome, Priority, Task, TaskStore, time};
use tempfile::TempDir;

fn at(s: &str) -> chrono::NaiveDateTime {
    time::parse_input(s).unwrap()
}

/// Every field written by `add` comes back unchanged from a fresh load.
#[test]
fn add_then_load_round_trips_every_field() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");

    let full = Task::new("Renew passport", "photos + form DS-82, señor ñ")
        .unwrap()
        .with_due_date(at("2026-05-01 17:00"))
        .with_priority(Priority::High)
        .with_reminder(at("2026-04-28 09:30"));
    let bare = Task::new("stretch", "").unwrap().with_priority(Priority::Low);

    let mut store = TaskStore::new(&path);
    store.add(full.clone()).unwrap();
    store.add(bare.clone()).unwrap();
    store.toggle_completion(1).unwrap();

    let (reloaded, report) = TaskStore::open(&path);
    assert!(matches!(report.outcome, LoadOutcome::Loaded));
    assert!(report.skipped.is_empty());
    assert_eq!(reloaded.get(0), Some(&full));

    let mut bare_done = bare;
    bare_done.toggle_completed();
    assert_eq!(reloaded.get(1), Some(&bare_done));

    // Non-ASCII is written literally.
    assert!(fs::read_to_string(&path).unwrap().contains("ñ"));
}

#[test]
fn one_bad_record_among_two_good_ones_is_skipped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");
    fs::write(
        &path,
        r#"[
  {
    "title": "first",
    "description": "",
    "due_date": null,
    "priority": "low",
    "reminder": false,
    "reminder_time": null,
    "completed": false,
    "created_at": "2026-01-02T10:00:00.000001"
  },
  {
    "description": "no title here",
    "created_at": "2026-01-02T10:00:00"
  },
  {
    "title": "third",
    "description": "x",
    "due_date": "2026-02-01T09:00:00",
    "priority": "extreme",
    "reminder": true,
    "reminder_time": "2026-01-31T09:00:00",
    "completed": true,
    "created_at": "2026-01-02T11:00:00"
  }
]"#,
    )
    .unwrap();

    let (store, report) = TaskStore::open(&path);
    assert_eq!(report.loaded, 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].position, 1);

    let titles: Vec<&str> = store.list(true).into_iter().map(Task::title).collect();
    assert_eq!(titles, vec!["first", "third"]);

    let third = store.get(1).unwrap();
    assert_eq!(third.priority(), Priority::Medium);
    assert!(third.reminder());
    assert!(third.is_completed());
    assert_eq!(third.due_date(), Some(at("2026-02-01 09:00")));
}

#[test]
fn non_array_file_loads_empty_and_is_not_overwritten_by_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");
    fs::write(&path, r#"{"title": "not in an array"}"#).unwrap();

    let (store, report) = TaskStore::open(&path);
    assert!(store.is_empty());
    let backup = match report.outcome {
        LoadOutcome::Malformed { backup, .. } => backup,
        other => panic!("expected a malformed load, got {other:?}"),
    };
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        r#"{"title": "not in an array"}"#
    );

    let backup = backup.unwrap();
    assert!(backup.starts_with(dir.path()));
    assert!(
        backup
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("tasks.json.malformed-")
    );
}

/// A file that is not valid UTF-8 is backed up before the next write replaces it.
#[test]
fn non_utf8_file_is_backed_up_before_the_next_save() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.json");
    let original: &[u8] = b"[{\"title\": \"caf\xe9\", \"created_at\": \"2026-01-02T10:00:00\"}]";
    fs::write(&path, original).unwrap();

    let (mut store, report) = TaskStore::open(&path);
    assert!(store.is_empty());
    let backup = match report.outcome {
        LoadOutcome::Malformed { backup, .. } => backup,
        other => panic!("expected a malformed load, got {other:?}"),
    };
    let backup = backup.expect("backup written");

    store.add(Task::new("new", "").unwrap()).unwrap();

    assert_eq!(fs::read(&backup).unwrap(), original);
    let (reloaded, _) = TaskStore::open(&path);
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.get(0).unwrap().title(), "new");
}
