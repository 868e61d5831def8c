// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use crate::response::HttpResponse;
use crate::types::TargetDbms;

pub mod boolean;
pub mod delay;

pub use boolean::BlindBooleanOracle;
pub use delay::TimeDelayOracle;

/// Classic SQL error signatures. A match in the syntax-error step's response
/// corroborates a blind finding and upgrades its confidence.
const SQL_ERROR_PATTERNS: &[&str] = &[
    "SQL syntax",
    "mysql_fetch",
    "ORA-",
    "PostgreSQL",
    "Microsoft SQL Server",
    "SQLite",
    "syntax error",
    "Warning: mysql",
    "pg_query",
    "mysqli",
    "SQLSTATE",
    "SQL Server",
    "OleDbException",
    "SqlException",
    "PDOException",
    "org.postgresql",
    "oracle.jdbc",
    "SQL error",
    "database error",
];

pub(crate) fn has_sql_error_indicators(body: &str) -> bool {
    SQL_ERROR_PATTERNS.iter().any(|pattern| body.contains(pattern))
}

/// Narrow the delay-statement catalog when a response leaks a database
/// banner. Returns Unknown when nothing identifiable is present.
pub fn detect_dbms_hint(response: &HttpResponse) -> TargetDbms {
    let body_lower = response.body.to_lowercase();
    let headers_str = format!("{:?}", response.headers).to_lowercase();

    if body_lower.contains("mysql") || body_lower.contains("mariadb") || headers_str.contains("mysql")
    {
        return TargetDbms::MySql;
    }
    if body_lower.contains("postgresql") || body_lower.contains("pg_") {
        return TargetDbms::PostgreSql;
    }
    if body_lower.contains("microsoft sql") || body_lower.contains("mssql") {
        return TargetDbms::Mssql;
    }
    if body_lower.contains("ora-") || body_lower.contains("oracle") {
        return TargetDbms::Oracle;
    }
    TargetDbms::Unknown
}
