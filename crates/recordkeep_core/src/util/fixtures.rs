//! Synthetic user records for seeding stores and demos.
//!
//! Generated users carry their own numeric `id`; `RecordStore::add` replaces
//! it with a store id like any other reserved key.

use chrono::Local;
use log::info;
use serde_json::{json, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const CREATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Builds one user with fields derived from `user_id`.
///
/// Every third user is inactive and every fifth is an admin.
pub fn generate_user(user_id: u64) -> Value {
    let created_at = Local::now().naive_local().format(CREATED_AT_FORMAT).to_string();
    let role = if user_id % 5 == 0 { "admin" } else { "user" };
    json!({
        "id": user_id,
        "username": format!("test_user_{user_id}"),
        "email": format!("user{user_id}@test.com"),
        "created_at": created_at,
        "active": user_id % 3 != 0,
        "role": role,
    })
}

/// Users `1..=count` in order.
pub fn generate_batch(count: u64) -> Vec<Value> {
    (1..=count).map(generate_user).collect()
}

/// Writes `users` as a pretty-printed JSON array.
pub fn write_json<W: Write>(writer: W, users: &[Value]) -> serde_json::Result<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, users)?;
    writer.flush().map_err(serde_json::Error::io)
}

/// Writes `users` to `path`, replacing any existing file.
pub fn save_to_json(path: impl AsRef<Path>, users: &[Value]) -> serde_json::Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(serde_json::Error::io)?;
    write_json(file, users)?;
    info!(
        "event=fixtures_save module=util status=ok path={} total={}",
        path.display(),
        users.len()
    );
    Ok(())
}
