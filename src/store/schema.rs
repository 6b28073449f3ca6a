//! store::schema
//!
//! SQLite schema for the maintainer registry.
//!
//! Every statement is idempotent so the schema can be applied on each open.
//! Maintainer e-mail uniqueness is case-insensitive and only enforced for
//! real addresses; any number of maintainers may carry the
//! `EMAIL_MISSING` placeholder.

use rusqlite::Connection;

pub(crate) const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS companies (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE CHECK (name <> ''),
        parent_id INTEGER REFERENCES projects(id),
        maturity TEXT,
        maintainer_ref TEXT NOT NULL DEFAULT '',
        mailing_list TEXT NOT NULL DEFAULT 'MML_MISSING'
    );

    CREATE TABLE IF NOT EXISTS maintainers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL DEFAULT 'EMAIL_MISSING',
        github_account TEXT NOT NULL DEFAULT 'GITHUB_MISSING',
        status TEXT NOT NULL DEFAULT 'Active',
        company_id INTEGER REFERENCES companies(id),
        import_warnings TEXT NOT NULL DEFAULT ''
    );

    CREATE UNIQUE INDEX IF NOT EXISTS maintainers_email
        ON maintainers(email COLLATE NOCASE)
        WHERE email <> 'EMAIL_MISSING';

    CREATE TABLE IF NOT EXISTS maintainer_projects (
        maintainer_id INTEGER NOT NULL REFERENCES maintainers(id) ON DELETE CASCADE,
        project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        PRIMARY KEY (maintainer_id, project_id)
    );

    CREATE TABLE IF NOT EXISTS services (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT ''
    );

    CREATE TABLE IF NOT EXISTS service_teams (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        service_id INTEGER NOT NULL REFERENCES services(id) ON DELETE CASCADE,
        remote_id INTEGER NOT NULL,
        remote_name TEXT,
        UNIQUE (project_id, service_id)
    );

    CREATE TABLE IF NOT EXISTS audit_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER REFERENCES projects(id) ON DELETE SET NULL,
        maintainer_id INTEGER REFERENCES maintainers(id) ON DELETE SET NULL,
        service_id INTEGER REFERENCES services(id) ON DELETE SET NULL,
        action TEXT NOT NULL,
        message TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
";

/// Apply the registry schema.
pub(crate) fn apply(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applying_twice_is_harmless() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn).unwrap();
        apply(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 7);
    }

    #[test]
    fn empty_project_name_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn).unwrap();
        let result = conn.execute("INSERT INTO projects (name) VALUES ('')", []);
        assert!(result.is_err());
    }

    #[test]
    fn placeholder_emails_may_repeat() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn).unwrap();
        conn.execute("INSERT INTO maintainers (name) VALUES ('a')", [])
            .unwrap();
        conn.execute("INSERT INTO maintainers (name) VALUES ('b')", [])
            .unwrap();

        conn.execute(
            "INSERT INTO maintainers (name, email) VALUES ('c', 'c@x.org')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO maintainers (name, email) VALUES ('d', 'C@X.org')",
            [],
        );
        assert!(dup.is_err());
    }
}
