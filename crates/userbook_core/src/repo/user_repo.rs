//! User store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide find/count/lookup/insert/update/delete over the `users` table.
//! - Evaluate field constraints at write time and enforce email uniqueness
//!   through the store's unique index.
//!
//! # Invariants
//! - Write paths validate the full (merged) record before any SQL mutation.
//! - Listing order is insertion order (`rowid ASC`), so pagination is stable.
//! - Read paths reject malformed persisted rows instead of masking them.

use crate::db::functions::{install_search_functions, CONTAINS_FOLDED_FN};
use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::user::{User, UserDraft, UserId, UserPatch, UserValidationError};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    age,
    email,
    address
FROM users";

const USER_COLUMNS: &[&str] = &["uuid", "name", "age", "email", "address"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for user persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Record failed field constraints; nothing was written.
    Validation(UserValidationError),
    /// The unique email index rejected the write.
    DuplicateEmail,
    Db(DbError),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateEmail => write!(f, "email already exists"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted user data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UserValidationError> for RepoError {
    fn from(value: UserValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Record selection predicate for find/count.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UserFilter {
    /// Matches every record.
    #[default]
    All,
    /// Matches records whose `name`, `email`, or `address` contains the
    /// needle, ignoring case. The needle is stored lowercased.
    Contains(String),
}

impl UserFilter {
    /// Builds a case-insensitive substring filter; blank terms match all.
    pub fn contains(term: &str) -> Self {
        let trimmed = term.trim();
        if trimmed.is_empty() {
            Self::All
        } else {
            Self::Contains(trimmed.to_lowercase())
        }
    }

    fn where_clause(&self) -> (String, Vec<Value>) {
        match self {
            Self::All => (String::new(), Vec::new()),
            Self::Contains(needle) => (
                format!(
                    " WHERE {CONTAINS_FOLDED_FN}(name, ?1)
                       OR {CONTAINS_FOLDED_FN}(email, ?1)
                       OR {CONTAINS_FOLDED_FN}(address, ?1)"
                ),
                vec![Value::Text(needle.clone())],
            ),
        }
    }
}

/// Exact-email probe used for uniqueness checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmailLookup<'a> {
    pub email: &'a str,
    /// Record to ignore, so an update does not conflict with itself.
    pub exclude_id: Option<UserId>,
}

/// Document-store contract used by the query and write services.
pub trait UserRepository {
    /// Returns up to `limit` records matching `filter` after skipping `skip`.
    fn find_users(&self, filter: &UserFilter, skip: u64, limit: u32) -> RepoResult<Vec<User>>;
    /// Counts all records matching `filter`.
    fn count_users(&self, filter: &UserFilter) -> RepoResult<u64>;
    /// Fetches one page and the total match count together.
    fn find_page(
        &self,
        filter: &UserFilter,
        skip: u64,
        limit: u32,
    ) -> RepoResult<(Vec<User>, u64)> {
        let users = self.find_users(filter, skip, limit)?;
        let total = self.count_users(filter)?;
        Ok((users, total))
    }
    /// Finds the record holding exactly `lookup.email`, if any.
    fn find_one(&self, lookup: &EmailLookup<'_>) -> RepoResult<Option<User>>;
    /// Gets one record by id.
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Validates and inserts a new record; the store assigns its id.
    fn insert_user(&self, draft: &UserDraft) -> RepoResult<User>;
    /// Merges `patch` over the stored record, validates, and persists.
    ///
    /// Returns `Ok(None)` when no record has that id.
    fn update_user(&self, id: UserId, patch: &UserPatch) -> RepoResult<Option<User>>;
    /// Removes a record and returns what was removed.
    fn delete_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Parses a store identifier; `None` when the text is not a valid id.
    fn parse_id(&self, value: &str) -> Option<UserId>;
}

impl<R: UserRepository + ?Sized> UserRepository for &R {
    fn find_users(&self, filter: &UserFilter, skip: u64, limit: u32) -> RepoResult<Vec<User>> {
        (**self).find_users(filter, skip, limit)
    }

    fn count_users(&self, filter: &UserFilter) -> RepoResult<u64> {
        (**self).count_users(filter)
    }

    fn find_page(
        &self,
        filter: &UserFilter,
        skip: u64,
        limit: u32,
    ) -> RepoResult<(Vec<User>, u64)> {
        (**self).find_page(filter, skip, limit)
    }

    fn find_one(&self, lookup: &EmailLookup<'_>) -> RepoResult<Option<User>> {
        (**self).find_one(lookup)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        (**self).get_user(id)
    }

    fn insert_user(&self, draft: &UserDraft) -> RepoResult<User> {
        (**self).insert_user(draft)
    }

    fn update_user(&self, id: UserId, patch: &UserPatch) -> RepoResult<Option<User>> {
        (**self).update_user(id, patch)
    }

    fn delete_user(&self, id: UserId) -> RepoResult<Option<User>> {
        (**self).delete_user(id)
    }

    fn parse_id(&self, value: &str) -> Option<UserId> {
        (**self).parse_id(value)
    }
}

/// SQLite-backed user repository.
#[derive(Clone, Copy)]
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` on a foreign schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_user_connection_ready(conn)?;
        install_search_functions(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn find_users(&self, filter: &UserFilter, skip: u64, limit: u32) -> RepoResult<Vec<User>> {
        select_page(self.conn, filter, skip, limit)
    }

    fn count_users(&self, filter: &UserFilter) -> RepoResult<u64> {
        count_matching(self.conn, filter)
    }

    fn find_page(
        &self,
        filter: &UserFilter,
        skip: u64,
        limit: u32,
    ) -> RepoResult<(Vec<User>, u64)> {
        // One deferred read transaction so page and total see the same snapshot.
        let tx = self.conn.unchecked_transaction()?;
        let users = select_page(&tx, filter, skip, limit)?;
        let total = count_matching(&tx, filter)?;
        tx.commit()?;
        Ok((users, total))
    }

    fn find_one(&self, lookup: &EmailLookup<'_>) -> RepoResult<Option<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}
             WHERE email = ?1
               AND (?2 IS NULL OR uuid <> ?2)
             LIMIT 1;"
        ))?;

        let exclude = lookup.exclude_id.map(|id| id.to_string());
        let mut rows = stmt.query(params![lookup.email, exclude])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }

        Ok(None)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        get_user_by_id(self.conn, id)
    }

    fn insert_user(&self, draft: &UserDraft) -> RepoResult<User> {
        let fields = draft.validate()?;
        let id = Uuid::new_v4();

        self.conn
            .execute(
                "INSERT INTO users (
                    uuid,
                    name,
                    age,
                    email,
                    address
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    id.to_string(),
                    fields.name.as_str(),
                    fields.age,
                    fields.email.as_str(),
                    fields.address.as_deref(),
                ],
            )
            .map_err(map_write_error)?;

        Ok(fields.into_user(id))
    }

    fn update_user(&self, id: UserId, patch: &UserPatch) -> RepoResult<Option<User>> {
        let tx = self.conn.unchecked_transaction()?;
        let Some(existing) = get_user_by_id(&tx, id)? else {
            return Ok(None);
        };

        let fields = existing.merge(patch).validate()?;
        tx.execute(
            "UPDATE users
             SET
                name = ?1,
                age = ?2,
                email = ?3,
                address = ?4
             WHERE uuid = ?5;",
            params![
                fields.name.as_str(),
                fields.age,
                fields.email.as_str(),
                fields.address.as_deref(),
                id.to_string(),
            ],
        )
        .map_err(map_write_error)?;
        tx.commit()?;

        Ok(Some(fields.into_user(id)))
    }

    fn delete_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self.conn.prepare(
            "DELETE FROM users
             WHERE uuid = ?1
             RETURNING uuid, name, age, email, address;",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }

        Ok(None)
    }

    fn parse_id(&self, value: &str) -> Option<UserId> {
        Uuid::parse_str(value).ok()
    }
}

fn select_page(
    conn: &Connection,
    filter: &UserFilter,
    skip: u64,
    limit: u32,
) -> RepoResult<Vec<User>> {
    let (where_sql, mut bind_values) = filter.where_clause();
    let mut sql = format!("{USER_SELECT_SQL}{where_sql} ORDER BY rowid ASC");

    let limit_index = bind_values.len() + 1;
    sql.push_str(&format!(" LIMIT ?{limit_index} OFFSET ?{}", limit_index + 1));
    bind_values.push(Value::Integer(i64::from(limit)));
    bind_values.push(Value::Integer(i64::try_from(skip).unwrap_or(i64::MAX)));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut users = Vec::new();

    while let Some(row) = rows.next()? {
        users.push(parse_user_row(row)?);
    }

    Ok(users)
}

fn count_matching(conn: &Connection, filter: &UserFilter) -> RepoResult<u64> {
    let (where_sql, bind_values) = filter.where_clause();
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM users{where_sql};"),
        params_from_iter(bind_values),
        |row| row.get(0),
    )?;

    u64::try_from(total).map_err(|_| RepoError::InvalidData(format!("negative count `{total}`")))
}

fn get_user_by_id(conn: &Connection, id: UserId) -> RepoResult<Option<User>> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} WHERE uuid = ?1;"))?;

    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_user_row(row)?));
    }

    Ok(None)
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in users.uuid"))
    })?;

    Ok(User {
        id,
        name: row.get("name")?,
        age: row.get("age")?,
        email: row.get("email")?,
        address: row.get("address")?,
    })
}

fn map_write_error(err: rusqlite::Error) -> RepoError {
    let err = DbError::Sqlite(err);
    if err.is_unique_violation() {
        RepoError::DuplicateEmail
    } else {
        RepoError::Db(err)
    }
}

fn ensure_user_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version < expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "users")? {
        return Err(RepoError::MissingRequiredTable("users"));
    }

    for &column in USER_COLUMNS {
        if !table_has_column(conn, "users", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "users",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2);",
        [table, column],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
