//! Database schema and migrations for atelier.
//!
//! Migrations are applied sequentially when the database is opened; the
//! schema_version table tracks which have already run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: identities table - owned by the identity provider
    r#"
-- Identities: credentials and login bookkeeping.
CREATE TABLE identities (
    id          TEXT PRIMARY KEY,                -- stable UUID
    email       TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password    TEXT NOT NULL,                   -- Argon2 hash
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    last_login  TEXT
);

CREATE INDEX idx_identities_email ON identities(email);
"#,
    // v2: profiles table - display/role metadata keyed by identity
    r#"
-- Profiles: admin-panel metadata joined onto an identity.
CREATE TABLE profiles (
    identity_id TEXT PRIMARY KEY REFERENCES identities(id) ON DELETE CASCADE,
    full_name   TEXT NOT NULL,
    role        TEXT NOT NULL DEFAULT 'user',    -- 'master', 'admin', 'editor', 'writer', 'user'
    avatar_url  TEXT,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_profiles_role ON profiles(role);
"#,
];
