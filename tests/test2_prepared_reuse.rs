#![cfg(feature = "sqlite")]

use std::time::Duration;

use sql_shim::backend::Row;
use sql_shim::sqlite::SqliteConnection;
use sql_shim::{Session, SqlShimError};

fn seeded_session() -> Result<Session<SqliteConnection>, Box<dyn std::error::Error>> {
    let db = Session::new(SqliteConnection::open_in_memory()?);
    db.ddl("CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT)")?;
    Ok(db)
}

#[test]
fn prepared_exec_rebinds_on_every_call() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_session()?;
    let insert = db.prepare_exec("INSERT INTO users (name) VALUES (?)")?;
    for name in ["Adam", "Eve", "Kain"] {
        assert_eq!(insert.exec(&[name.into()])?, 1);
    }
    insert.close()?;

    let names: Vec<String> = db
        .query(
            |row| row.get_text(0),
            "SELECT name FROM users ORDER BY id ASC",
            &[],
        )?
        .collect::<Result<_, _>>()?;
    assert_eq!(names, ["Adam", "Eve", "Kain"]);
    Ok(())
}

#[test]
fn prepared_query_one_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_session()?;
    let insert = db.prepare_exec("INSERT INTO users (name) VALUES (?)")?;
    insert.exec(&["Adam".into()])?;
    insert.exec(&["Eve".into()])?;

    let by_id = db.prepare_query(
        |row| row.get_text(0),
        "SELECT name FROM users WHERE id = ?",
    )?;
    assert_eq!(by_id.query_one(&[1_i64.into()])?, "Adam");
    assert_eq!(by_id.query_one(&[2_i64.into()])?, "Eve");
    assert!(matches!(
        by_id.query_one(&[99_i64.into()]),
        Err(SqlShimError::NoRows)
    ));

    by_id.close()?;
    insert.close()?;
    Ok(())
}

#[test]
fn prepared_query_streams_lazily_per_call() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_session()?;
    let insert = db.prepare_exec("INSERT INTO users (name) VALUES (?)")?;
    for name in ["Adam", "Eve"] {
        insert.exec(&[name.into()])?;
    }

    let all_names = db.prepare_query(
        |row| row.get_text(0),
        "SELECT name FROM users ORDER BY id ASC",
    )?;
    {
        let stream = all_names.query(&[])?;
        let names: Vec<String> = stream.collect::<Result<_, _>>()?;
        assert_eq!(names, ["Adam", "Eve"]);
    }
    // The statement survives the stream and can be queried again.
    {
        let mut stream = all_names.query(&[])?;
        assert_eq!(stream.try_next()?, "Adam");
        stream.close()?;
    }
    all_names.close()?;
    Ok(())
}

#[test]
fn open_stream_makes_the_statement_busy() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_session()?;
    let insert = db.prepare_exec("INSERT INTO users (name) VALUES (?)")?;
    insert.exec(&["Adam".into()])?;

    let names = db
        .prepare_query(|row| row.get_text(0), "SELECT name FROM users")?
        .with_lock_timeout(Duration::from_millis(50));

    let mut open = names.query(&[])?;
    // The open stream holds the statement guard: any other operation on the
    // same prepared query times out.
    assert!(matches!(
        names.query_one(&[]),
        Err(SqlShimError::Busy { .. })
    ));
    assert!(matches!(names.query(&[]), Err(SqlShimError::Busy { .. })));

    open.close()?;
    drop(open);
    assert_eq!(names.query_one(&[])?, "Adam");
    names.close()?;
    Ok(())
}

#[test]
fn dropping_a_stream_also_releases_the_guard() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_session()?;
    db.exec("INSERT INTO users (name) VALUES (?)", &["Adam".into()])?;

    let names = db
        .prepare_query(|row| row.get_text(0), "SELECT name FROM users")?
        .with_lock_timeout(Duration::from_millis(50));

    let open = names.query(&[])?;
    drop(open);
    assert_eq!(names.query_one(&[])?, "Adam");
    names.close()?;
    Ok(())
}

#[test]
fn lock_timeout_is_configurable() -> Result<(), Box<dyn std::error::Error>> {
    let db = seeded_session()?;
    let names = db.prepare_query(|row| row.get_text(0), "SELECT name FROM users")?;
    assert_eq!(names.lock_timeout(), sql_shim::DEFAULT_LOCK_TIMEOUT);

    let names = names.with_lock_timeout(Duration::from_millis(10));
    assert_eq!(names.lock_timeout(), Duration::from_millis(10));
    names.close()?;
    Ok(())
}
