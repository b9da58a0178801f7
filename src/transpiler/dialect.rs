use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::transpiler::sql::generic::GenericDialect;
use crate::transpiler::sql::mysql::MySqlDialect;
use crate::transpiler::sql::oracle::OracleDialect;
use crate::transpiler::sql::postgres::PostgresDialect;
use crate::transpiler::sql::sqlite::SqliteDialect;
use crate::transpiler::sql::sqlserver::SqlServerDialect;
use crate::transpiler::traits::SqlDialect;

/// Supported SQL Dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Generic,
    Oracle,
    Postgres,
    #[serde(rename = "mysql")]
    MySQL,
    #[serde(rename = "sqlite")]
    SQLite,
    SqlServer,
}

impl Dialect {
    pub const ALL: [Dialect; 6] = [
        Dialect::Generic,
        Dialect::Oracle,
        Dialect::Postgres,
        Dialect::MySQL,
        Dialect::SQLite,
        Dialect::SqlServer,
    ];

    /// Shared, immutable provider for this dialect.
    pub fn provider(&self) -> Arc<dyn SqlDialect> {
        match self {
            Dialect::Generic => Arc::new(GenericDialect),
            Dialect::Oracle => Arc::new(OracleDialect::new()),
            Dialect::Postgres => Arc::new(PostgresDialect),
            Dialect::MySQL => Arc::new(MySqlDialect),
            Dialect::SQLite => Arc::new(SqliteDialect),
            Dialect::SqlServer => Arc::new(SqlServerDialect),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Generic => "generic",
            Dialect::Oracle => "oracle",
            Dialect::Postgres => "postgres",
            Dialect::MySQL => "mysql",
            Dialect::SQLite => "sqlite",
            Dialect::SqlServer => "sqlserver",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generic" | "ansi" => Ok(Dialect::Generic),
            "oracle" => Ok(Dialect::Oracle),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySQL),
            "sqlite" => Ok(Dialect::SQLite),
            "sqlserver" | "mssql" => Ok(Dialect::SqlServer),
            other => Err(format!("unknown dialect '{}'", other)),
        }
    }
}
