//! Dispatch of parsed commands to the core services.

use crate::args::{Command, FieldArgs};
use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use userbook_core::{
    CreateUserInput, ListUsersQuery, QueryEngine, RecordWriter, SqliteUserRepository,
    UpdateUserInput, UserServiceError,
};

/// Runs one command. The outer error is a usage/setup failure; the inner one
/// is the operation's own failure.
pub fn execute(conn: &Connection, command: Command) -> Result<Result<Value, UserServiceError>> {
    let repo = SqliteUserRepository::try_new(conn).context("store is not ready")?;

    let outcome = match command {
        Command::List {
            page,
            limit,
            search,
        } => QueryEngine::new(repo)
            .list(&ListUsersQuery {
                page,
                limit,
                search,
            })
            .map(|page| to_json(&page)),
        Command::Create { fields } => {
            let input: CreateUserInput = parse_fields(fields)?;
            RecordWriter::new(repo)
                .create(input)
                .map(|created| to_json(&created))
        }
        Command::Update { id, fields } => {
            let input: UpdateUserInput = parse_fields(fields)?;
            RecordWriter::new(repo)
                .update(&id, input)
                .map(|updated| to_json(&updated))
        }
        Command::Delete { id } => RecordWriter::new(repo)
            .delete(&id)
            .map(|deleted| to_json(&deleted)),
    };

    // A body that fails to serialize is a driver failure, not an operation outcome.
    match outcome {
        Ok(body) => body.map(Ok),
        Err(err) => Ok(Err(err)),
    }
}

/// Process exit code for an operation failure.
pub fn exit_code(err: &UserServiceError) -> u8 {
    match err {
        UserServiceError::Internal(_) => 1,
        UserServiceError::Validation(_) => 2,
        UserServiceError::Conflict => 3,
        UserServiceError::InvalidId(_) => 4,
        UserServiceError::NotFound(_) => 5,
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).context("failed to serialize response")
}

fn parse_fields<T: DeserializeOwned>(fields: FieldArgs) -> Result<T> {
    let body = match fields.json {
        Some(raw) => {
            let body: Value = serde_json::from_str(&raw).context("invalid --json payload")?;
            if !body.is_object() {
                bail!("--json payload must be an object");
            }
            body
        }
        None => {
            let mut body = Map::new();
            for (key, value) in [
                ("name", fields.name),
                ("age", fields.age),
                ("email", fields.email),
                ("address", fields.address),
            ] {
                if let Some(value) = value {
                    body.insert(key.to_string(), Value::String(value));
                }
            }
            Value::Object(body)
        }
    };

    serde_json::from_value(body).context("invalid record fields")
}
