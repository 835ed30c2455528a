//! Integration tests for recording invocations into compile_commands.json.

use dcc_build::{
    record, BuildError, CompileCommands, Config, Invocation, MismatchPolicy, RecordOutcome,
    WorkingDirectory, DATABASE_FILE_NAME,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn cwd(path: &str) -> WorkingDirectory {
    WorkingDirectory::from_path(path).expect("Failed to build working directory")
}

fn load(db: &TempDir) -> CompileCommands {
    CompileCommands::from_file(&db.path().join(DATABASE_FILE_NAME)).expect("Failed to load database")
}

fn run(db: &TempDir, dir: &str, compiler: &str, list: &[&str]) -> dcc_build::Result<RecordOutcome> {
    let invocation = Invocation::new(db.path(), compiler, args(list));
    record(&invocation, &cwd(dir), &Config::default())
}

/// gcc with include, define, compile-only and output flags records one entry.
#[test]
fn test_scenario_a() {
    let db = TempDir::new().unwrap();
    run(&db, "/home/u", "gcc", &["-I/usr/include", "-DX=1", "-c", "foo.c", "-o", "foo.o"]).unwrap();

    let cmds = load(&db);
    assert_eq!(cmds.len(), 1);
    let entry = &cmds.commands()[0];
    assert_eq!(entry.file, PathBuf::from("/home/u/foo.c"));
    assert_eq!(entry.directory, PathBuf::from("/home/u"));
    assert_eq!(
        entry.command.as_deref(),
        Some("gcc -I/usr/include -DX=1 -c foo.c -o foo.o")
    );
}

/// Re-running with a different output updates the entry instead of adding one.
#[test]
fn test_scenario_b() {
    let db = TempDir::new().unwrap();
    run(&db, "/home/u", "gcc", &["-I/usr/include", "-DX=1", "-c", "foo.c", "-o", "foo.o"]).unwrap();
    run(&db, "/home/u", "gcc", &["-I/usr/include", "-DX=1", "-c", "foo.c", "-o", "bar.o"]).unwrap();

    let cmds = load(&db);
    assert_eq!(cmds.len(), 1);
    assert_eq!(
        cmds.commands()[0].command.as_deref(),
        Some("gcc -I/usr/include -DX=1 -c foo.c -o bar.o")
    );
}

/// Two sources in one invocation share the same command.
#[test]
fn test_scenario_c() {
    let db = TempDir::new().unwrap();
    run(&db, "/w", "cc", &["-c", "a.c", "b.c"]).unwrap();

    let cmds = load(&db);
    assert_eq!(cmds.len(), 2);
    assert_eq!(cmds.commands()[0].file, PathBuf::from("/w/a.c"));
    assert_eq!(cmds.commands()[1].file, PathBuf::from("/w/b.c"));
    for entry in cmds.commands() {
        assert_eq!(entry.command.as_deref(), Some("cc -c a.c b.c"));
    }
}

#[test]
fn test_idempotent() {
    let db = TempDir::new().unwrap();
    let argv = ["-c", "a.c", "/abs/b.c"];
    run(&db, "/w", "cc", &argv).unwrap();
    let first = std::fs::read_to_string(db.path().join(DATABASE_FILE_NAME)).unwrap();
    run(&db, "/w", "cc", &argv).unwrap();
    let second = std::fs::read_to_string(db.path().join(DATABASE_FILE_NAME)).unwrap();

    assert_eq!(first, second);
    assert_eq!(load(&db).len(), 2);
}

/// Entries from other files keep their position and content.
#[test]
fn test_existing_entries_preserved() {
    let db = TempDir::new().unwrap();
    run(&db, "/w", "cc", &["-c", "a.c"]).unwrap();
    run(&db, "/w", "cc", &["-c", "b.c"]).unwrap();
    run(&db, "/w", "cc", &["-O2", "-c", "a.c"]).unwrap();

    let cmds = load(&db);
    let files: Vec<_> = cmds.commands().iter().map(|c| c.file.clone()).collect();
    assert_eq!(files, vec![PathBuf::from("/w/a.c"), PathBuf::from("/w/b.c")]);
    assert_eq!(cmds.commands()[0].command.as_deref(), Some("cc -O2 -c a.c"));
    assert_eq!(cmds.commands()[1].command.as_deref(), Some("cc -c b.c"));
}

/// The written file is an array of objects with exactly three string fields.
#[test]
fn test_round_trip_shape() {
    let db = TempDir::new().unwrap();
    run(&db, "/w", "cc", &["-c", "a.c", "b.c"]).unwrap();
    run(&db, "/w", "c++", &["-std=c++17", "-c", "x.cc"]).unwrap();

    let text = std::fs::read_to_string(db.path().join(DATABASE_FILE_NAME)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).expect("database is not valid JSON");
    let entries = value.as_array().expect("database is not an array");
    assert_eq!(entries.len(), 3);
    for entry in entries {
        let obj = entry.as_object().expect("entry is not an object");
        assert_eq!(obj.len(), 3);
        for key in ["directory", "file", "command"] {
            assert!(obj[key].is_string(), "{} is not a string", key);
        }
    }
}

#[test]
fn test_no_sources_leaves_database_absent() {
    let db = TempDir::new().unwrap();
    let outcome = run(&db, "/w", "cc", &["--version"]).unwrap();
    assert_eq!(outcome, RecordOutcome::NoSources);

    let outcome = run(&db, "/w", "cc", &["-E", "-", "-o", "/dev/null"]).unwrap();
    assert_eq!(outcome, RecordOutcome::NoSources);

    assert!(!db.path().join(DATABASE_FILE_NAME).exists());
}

#[test]
fn test_empty_file_is_empty_database() {
    let db = TempDir::new().unwrap();
    std::fs::write(db.path().join(DATABASE_FILE_NAME), "").unwrap();
    run(&db, "/w", "cc", &["-c", "a.c"]).unwrap();
    assert_eq!(load(&db).len(), 1);
}

/// A corrupt database is reported and never overwritten.
#[test]
fn test_corrupt_database_untouched() {
    let db = TempDir::new().unwrap();
    let path = db.path().join(DATABASE_FILE_NAME);
    std::fs::write(&path, "[{\"file\": ").unwrap();

    let err = run(&db, "/w", "cc", &["-c", "a.c"]).unwrap_err();
    assert!(matches!(err, BuildError::DatabaseParse { .. }));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[{\"file\": ");
}

#[test]
fn test_missing_database_directory() {
    let db = TempDir::new().unwrap();
    let invocation = Invocation::new(db.path().join("nope"), "cc", args(&["-c", "a.c"]));
    let err = record(&invocation, &cwd("/w"), &Config::default()).unwrap_err();
    assert!(matches!(err, BuildError::DatabaseOpen { .. }));
}

#[test]
fn test_missing_database_directory_without_lock() {
    let db = TempDir::new().unwrap();
    let invocation = Invocation::new(db.path().join("nope"), "cc", args(&["-c", "a.c"]));
    let mut config = Config::default();
    config.database.lock = false;

    let err = record(&invocation, &cwd("/w"), &config).unwrap_err();
    assert!(matches!(err, BuildError::DatabaseWrite { .. }));
}

/// The default policy reports the conflict and writes nothing at all.
#[test]
fn test_directory_mismatch_reported() {
    let db = TempDir::new().unwrap();
    run(&db, "/build/one", "cc", &["-c", "/src/a.c"]).unwrap();
    let before = std::fs::read_to_string(db.path().join(DATABASE_FILE_NAME)).unwrap();

    let err = run(&db, "/build/two", "cc", &["-c", "/src/b.c", "/src/a.c"]).unwrap_err();
    match err {
        BuildError::DirectoryMismatch { file, recorded, current } => {
            assert_eq!(file, Path::new("/src/a.c"));
            assert_eq!(recorded, Path::new("/build/one"));
            assert_eq!(current, Path::new("/build/two"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let after = std::fs::read_to_string(db.path().join(DATABASE_FILE_NAME)).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_directory_mismatch_skipped() {
    let db = TempDir::new().unwrap();
    run(&db, "/build/one", "cc", &["-c", "/src/a.c"]).unwrap();

    let mut config = Config::default();
    config.database.on_directory_mismatch = MismatchPolicy::Skip;
    let invocation = Invocation::new(db.path(), "cc", args(&["-O2", "-c", "/src/a.c", "/src/b.c"]));
    let outcome = record(&invocation, &cwd("/build/two"), &config).unwrap();

    match outcome {
        RecordOutcome::Recorded { summary, .. } => {
            assert_eq!(summary.skipped, 1);
            assert_eq!(summary.added, 1);
        }
        RecordOutcome::NoSources => panic!("expected sources"),
    }

    let cmds = load(&db);
    assert_eq!(cmds.len(), 2);
    let a = cmds.find_command(Path::new("/src/a.c")).unwrap();
    assert_eq!(a.directory, PathBuf::from("/build/one"));
    assert_eq!(a.command.as_deref(), Some("cc -c /src/a.c"));
    let b = cmds.find_command(Path::new("/src/b.c")).unwrap();
    assert_eq!(b.directory, PathBuf::from("/build/two"));
}

/// Entries written by other tools keep their extra fields.
#[test]
fn test_foreign_entries_survive() {
    let db = TempDir::new().unwrap();
    std::fs::write(
        db.path().join(DATABASE_FILE_NAME),
        r#"[
  {"directory": "/other", "file": "/other/x.cc", "arguments": ["c++", "-c", "x.cc"], "output": "x.o"}
]"#,
    )
    .unwrap();

    run(&db, "/w", "cc", &["-c", "a.c"]).unwrap();

    let text = std::fs::read_to_string(db.path().join(DATABASE_FILE_NAME)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value[0]["arguments"][0], "c++");
    assert_eq!(value[0]["output"], "x.o");
    assert_eq!(value[1]["file"], "/w/a.c");
}

/// Concurrent recorders under the lock lose no entries.
#[cfg(unix)]
#[test]
fn test_concurrent_records_all_land() {
    let db = TempDir::new().unwrap();
    let db_path = db.path().to_path_buf();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let db_path = db_path.clone();
            std::thread::spawn(move || {
                let source = format!("f{}.c", i);
                let invocation = Invocation::new(&db_path, "cc", vec!["-c".to_string(), source]);
                record(&invocation, &cwd("/w"), &Config::default()).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(load(&db).len(), 8);
}

/// A new database gets the same mode as any other file created under the
/// current umask.
#[cfg(unix)]
#[test]
fn test_new_database_follows_umask() {
    use std::os::unix::fs::PermissionsExt;

    let db = TempDir::new().unwrap();
    let reference = db.path().join("reference");
    std::fs::File::create(&reference).unwrap();
    let expected = std::fs::metadata(&reference).unwrap().permissions().mode();

    run(&db, "/w", "cc", &["-c", "a.c"]).unwrap();
    let mode = std::fs::metadata(db.path().join(DATABASE_FILE_NAME))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, expected & 0o777);
}

#[cfg(unix)]
#[test]
fn test_existing_database_keeps_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let db = TempDir::new().unwrap();
    let path = db.path().join(DATABASE_FILE_NAME);
    std::fs::write(&path, "[]").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();

    run(&db, "/w", "cc", &["-c", "a.c"]).unwrap();
    assert_eq!(load(&db).len(), 1);
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

/// Spellings that differ as strings are distinct files.
#[test]
fn test_unnormalized_paths_kept_distinct() {
    let db = TempDir::new().unwrap();
    run(&db, "/w", "cc", &["-c", "a.c"]).unwrap();
    run(&db, "/w", "cc", &["-c", "./a.c"]).unwrap();

    let cmds = load(&db);
    assert_eq!(cmds.len(), 2);
    assert_eq!(cmds.commands()[0].file, PathBuf::from("/w/a.c"));
    assert_eq!(cmds.commands()[1].file.as_os_str(), "/w/./a.c");
}
