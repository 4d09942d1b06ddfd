use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::html;
use snafu::Snafu;
use std::{num::ParseIntError, path::PathBuf};
use uuid::Uuid;

pub type RosterResult<T> = Result<T, RosterError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RosterError {
    #[snafu(display("Error opening database"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Error migrating DB schema"))]
    MigrateError { source: sqlx::migrate::MigrateError },
    #[snafu(display("Stored data under key {:?} could not be read, starting empty", key))]
    StorageCorrupt {
        source: serde_json::Error,
        key: String,
    },
    #[snafu(display("Error serialising student records"))]
    SerialiseRecords { source: serde_json::Error },
    #[snafu(display("Unable to find student with ID: {}", id))]
    RecordNotFound { id: Uuid },
    #[snafu(display("No student is selected"))]
    NothingSelected,
    #[snafu(display("A student with ID number {:?} already exists", id_number))]
    DuplicateIdentifier { id_number: String },
    #[snafu(display("Unable to read seed asset at {}", path.display()))]
    SeedRead {
        source: std::io::Error,
        path: PathBuf,
    },
    #[snafu(display("Unable to parse seed asset at {}", path.display()))]
    SeedParse {
        source: serde_json::Error,
        path: PathBuf,
    },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse IP port"))]
    ParsePort { source: ParseIntError },
    #[snafu(display("Unknown storage backend {:?}, expected `postgres` or `memory`", found))]
    UnknownStorageBackend { found: String },
    #[snafu(display("Unknown seed policy {:?}, expected `if_empty` or `overwrite`", found))]
    UnknownSeedPolicy { found: String },
}

impl RosterError {
    /// Failures that leave the roster untouched and are shown to the user rather than failing the request.
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::StorageCorrupt { .. }
                | Self::RecordNotFound { .. }
                | Self::NothingSelected
                | Self::DuplicateIdentifier { .. }
        )
    }
}

impl IntoResponse for RosterError {
    #[allow(clippy::match_same_arms)]
    fn into_response(self) -> Response {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found
        const BI: StatusCode = StatusCode::BAD_REQUEST; //bad input
        const CF: StatusCode = StatusCode::CONFLICT;

        let status_code = match &self {
            Self::OpenDatabase { .. } | Self::MigrateError { .. } => ISE,
            Self::MakeQuery { source } => match source {
                sqlx::Error::RowNotFound => NF,
                _ => ISE,
            },
            Self::StorageCorrupt { .. } => ISE,
            Self::SerialiseRecords { .. } => ISE,
            Self::RecordNotFound { .. } => NF,
            Self::NothingSelected => BI,
            Self::DuplicateIdentifier { .. } => CF,
            Self::SeedRead { .. } | Self::SeedParse { .. } => ISE,
            Self::BadEnvVar { .. } | Self::ParsePort { .. } => ISE,
            Self::UnknownStorageBackend { .. } | Self::UnknownSeedPolicy { .. } => ISE,
        };

        error!(?self, "Error!");
        let body = html! {
            div class="bg-red-100 border border-red-400 text-red-700 px-4 py-3 rounded relative mb-4" role="alert" {
                strong class="font-bold" {"Roster Error "}
                span {(self.to_string())}
            }
        };
        (status_code, Html(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_failures_are_recoverable() {
        assert!(RosterError::NothingSelected.is_recoverable());
        assert!(
            RosterError::RecordNotFound { id: Uuid::new_v4() }.is_recoverable()
        );
        assert!(
            RosterError::DuplicateIdentifier {
                id_number: "1234567".into()
            }
            .is_recoverable()
        );
        assert!(
            !RosterError::UnknownSeedPolicy {
                found: "sometimes".into()
            }
            .is_recoverable()
        );
    }

    #[test]
    fn status_codes_follow_failure_kind() {
        let not_found = RosterError::RecordNotFound { id: Uuid::new_v4() }.into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let duplicate = RosterError::DuplicateIdentifier {
            id_number: "1234567".into(),
        }
        .into_response();
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);
    }
}
