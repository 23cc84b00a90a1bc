//! Maps store-native constraint violations onto [`DataError`].
//!
//! Pure and stateless; every repository mutation funnels its driver errors
//! through [`classify`].

use sqlx::error::DatabaseError;
use sqlx::postgres::PgDatabaseError;

use crate::error::DataError;

/// SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE for `foreign_key_violation`.
pub const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Constraint family recognised from a SQLSTATE code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Unique or primary key collision.
    Unique,
    /// Missing or still-referenced foreign key target.
    ForeignKey,
    /// Anything else, including errors without a code.
    Other,
}

impl Violation {
    /// Recognise a SQLSTATE code.
    #[must_use]
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some(UNIQUE_VIOLATION) => Self::Unique,
            Some(FOREIGN_KEY_VIOLATION) => Self::ForeignKey,
            _ => Self::Other,
        }
    }
}

/// Violations an entity insert reports to callers.
pub const INSERT_VIOLATIONS: &[Violation] = &[Violation::Unique];
/// Violations an entity update reports to callers.
pub const UPDATE_VIOLATIONS: &[Violation] = &[];
/// Violations an entity delete reports to callers.
pub const DELETE_VIOLATIONS: &[Violation] = &[Violation::ForeignKey];
/// Violations an association replacement reports to callers.
pub const REPLACE_VIOLATIONS: &[Violation] = &[Violation::ForeignKey];

/// Identifies the row a failed statement was acting on.
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    /// Operation label used in the opaque internal error.
    pub operation: &'static str,
    /// Entity kind label.
    pub kind: &'static str,
    /// Name of the row (or owning profile for association writes).
    pub name: &'a str,
    /// Violations this operation surfaces; any other one is unexpected.
    pub surfaces: &'static [Violation],
}

/// Translate a driver error into the caller-facing taxonomy.
#[must_use]
pub fn classify(subject: Subject<'_>, error: sqlx::Error) -> DataError {
    let (code, detail) = match &error {
        sqlx::Error::Database(db) => (
            db.code().map(|code| code.into_owned()),
            constraint_detail(db.as_ref()),
        ),
        _ => (None, None),
    };
    let violation = Violation::from_code(code.as_deref());
    if !subject.surfaces.contains(&violation) {
        return DataError::unexpected(subject.operation, subject.kind, error);
    }
    match violation {
        Violation::Unique => DataError::DuplicateKey {
            kind: subject.kind,
            name: subject.name.to_string(),
        },
        Violation::ForeignKey => DataError::ReferentialConstraint {
            kind: subject.kind,
            name: subject.name.to_string(),
            detail,
        },
        Violation::Other => DataError::unexpected(subject.operation, subject.kind, error),
    }
}

fn constraint_detail(error: &dyn DatabaseError) -> Option<String> {
    error
        .try_downcast_ref::<PgDatabaseError>()
        .and_then(PgDatabaseError::detail)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::ErrorKind;
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct CodedError(&'static str);

    impl fmt::Display for CodedError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "coded failure {}", self.0)
        }
    }

    impl StdError for CodedError {}

    impl DatabaseError for CodedError {
        fn message(&self) -> &str {
            "coded failure"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    fn subject() -> Subject<'static> {
        Subject {
            operation: "insert",
            kind: "Proxy",
            name: "corp",
            surfaces: &[Violation::Unique, Violation::ForeignKey],
        }
    }

    fn coded(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(CodedError(code)))
    }

    #[test]
    fn codes_map_to_violations() {
        assert_eq!(Violation::from_code(Some("23505")), Violation::Unique);
        assert_eq!(Violation::from_code(Some("23503")), Violation::ForeignKey);
        assert_eq!(Violation::from_code(Some("42P01")), Violation::Other);
        assert_eq!(Violation::from_code(None), Violation::Other);
    }

    #[test]
    fn unique_violation_becomes_duplicate_key() {
        let err = classify(
            subject(),
            sqlx::Error::Database(Box::new(CodedError(UNIQUE_VIOLATION))),
        );
        assert!(matches!(
            err,
            DataError::DuplicateKey { kind: "Proxy", ref name } if name == "corp"
        ));
    }

    #[test]
    fn foreign_key_violation_becomes_referential_constraint() {
        let err = classify(
            subject(),
            sqlx::Error::Database(Box::new(CodedError(FOREIGN_KEY_VIOLATION))),
        );
        assert!(matches!(
            err,
            DataError::ReferentialConstraint { detail: None, .. }
        ));
    }

    #[test]
    fn uncoded_failures_are_unexpected() {
        let err = classify(subject(), sqlx::Error::PoolTimedOut);
        assert!(matches!(
            err,
            DataError::UnexpectedPersistence {
                operation: "insert",
                kind: "Proxy",
                ..
            }
        ));

        let other = classify(subject(), coded("40001"));
        assert!(matches!(other, DataError::UnexpectedPersistence { .. }));
    }

    #[test]
    fn violations_outside_the_operation_contract_are_unexpected() {
        let replace = Subject {
            operation: "replace_all",
            kind: "Wireless",
            name: "office",
            surfaces: REPLACE_VIOLATIONS,
        };
        assert!(matches!(
            classify(replace, coded(UNIQUE_VIOLATION)),
            DataError::UnexpectedPersistence {
                operation: "replace_all",
                kind: "Wireless",
                ..
            }
        ));
        assert!(matches!(
            classify(replace, coded(FOREIGN_KEY_VIOLATION)),
            DataError::ReferentialConstraint { kind: "Wireless", .. }
        ));

        let update = Subject {
            operation: "update",
            surfaces: UPDATE_VIOLATIONS,
            ..replace
        };
        assert!(matches!(
            classify(update, coded(FOREIGN_KEY_VIOLATION)),
            DataError::UnexpectedPersistence {
                operation: "update",
                ..
            }
        ));
        assert!(matches!(
            classify(update, coded(UNIQUE_VIOLATION)),
            DataError::UnexpectedPersistence { .. }
        ));

        let insert = Subject {
            operation: "insert",
            surfaces: INSERT_VIOLATIONS,
            ..replace
        };
        assert!(matches!(
            classify(insert, coded(FOREIGN_KEY_VIOLATION)),
            DataError::UnexpectedPersistence {
                operation: "insert",
                ..
            }
        ));
        assert!(matches!(
            classify(insert, coded(UNIQUE_VIOLATION)),
            DataError::DuplicateKey { .. }
        ));
    }
}
