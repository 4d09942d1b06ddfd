//! The student form: field values, validation rules, and "touched" tracking.
//!
//! Validation is a plain table from each [`FieldName`] to the [`Rule`]s it must
//! satisfy. Errors are only shown for fields the user has left or submitted.

use crate::data::student::{StudentFields, StudentRecord};
use bitflags::bitflags;
use email_address::EmailAddress;
use std::{fmt, str::FromStr};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldName {
    FirstName,
    LastName,
    IdNumber,
    Phone,
    Email,
}

impl FieldName {
    pub const ALL: [Self; 5] = [
        Self::FirstName,
        Self::LastName,
        Self::IdNumber,
        Self::Phone,
        Self::Email,
    ];

    ///the name used for the HTML input and in the JSON documents
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::IdNumber => "idNumber",
            Self::Phone => "phone",
            Self::Email => "email",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FirstName => "First Name",
            Self::LastName => "Last Name",
            Self::IdNumber => "ID Number",
            Self::Phone => "Phone",
            Self::Email => "Email",
        }
    }

    pub const fn rules(self) -> &'static [Rule] {
        match self {
            Self::FirstName | Self::LastName => &[Rule::Required, Rule::MinLength(2)],
            Self::IdNumber => &[Rule::Required, Rule::MinLength(7), Rule::MaxLength(10)],
            Self::Phone => &[Rule::Required, Rule::MinLength(7), Rule::MaxLength(11)],
            Self::Email => &[Rule::Required, Rule::Email],
        }
    }

    const fn flag(self) -> TouchedFields {
        match self {
            Self::FirstName => TouchedFields::FIRST_NAME,
            Self::LastName => TouchedFields::LAST_NAME,
            Self::IdNumber => TouchedFields::ID_NUMBER,
            Self::Phone => TouchedFields::PHONE,
            Self::Email => TouchedFields::EMAIL,
        }
    }
}

impl FromStr for FieldName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or(())
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    Required,
    TooShort { min: usize, actual: usize },
    TooLong { max: usize, actual: usize },
    InvalidEmail,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "This field is required"),
            Self::TooShort { min, actual } => {
                write!(f, "Must be at least {min} characters (currently {actual})")
            }
            Self::TooLong { max, actual } => {
                write!(f, "Must be at most {max} characters (currently {actual})")
            }
            Self::InvalidEmail => write!(f, "Must be a valid email address"),
        }
    }
}

/// A predicate over a field value, paired with the error it produces.
///
/// Length and email rules accept the empty string; emptiness is `Required`'s job.
///
/// Lengths count characters (Unicode scalar values), not UTF-16 code units, so
/// a name written in an astral-plane script or with emoji is counted the way a
/// reader counts it and may pass where a UTF-16 count would not.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Email,
}

impl Rule {
    pub fn check(self, value: &str) -> Option<ValidationError> {
        let actual = value.chars().count();
        match self {
            Self::Required => value.is_empty().then_some(ValidationError::Required),
            Self::MinLength(min) => {
                (actual != 0 && actual < min).then_some(ValidationError::TooShort { min, actual })
            }
            Self::MaxLength(max) => {
                (actual > max).then_some(ValidationError::TooLong { max, actual })
            }
            Self::Email => (!value.is_empty() && !EmailAddress::is_valid(value))
                .then_some(ValidationError::InvalidEmail),
        }
    }
}

pub fn validate(field: FieldName, value: &str) -> Vec<ValidationError> {
    field
        .rules()
        .iter()
        .filter_map(|rule| rule.check(value))
        .collect()
}

bitflags! {
    #[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
    pub struct TouchedFields: u8 {
        const FIRST_NAME = 0b0000_0001;
        const LAST_NAME =  0b0000_0010;
        const ID_NUMBER =  0b0000_0100;
        const PHONE =      0b0000_1000;
        const EMAIL =      0b0001_0000;
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordForm {
    values: StudentFields,
    touched: TouchedFields,
}

impl RecordForm {
    pub fn value(&self, field: FieldName) -> &str {
        match field {
            FieldName::FirstName => &self.values.first_name,
            FieldName::LastName => &self.values.last_name,
            FieldName::IdNumber => &self.values.id_number,
            FieldName::Phone => &self.values.phone,
            FieldName::Email => &self.values.email,
        }
    }

    pub fn set_value(&mut self, field: FieldName, value: impl Into<String>) {
        let slot = match field {
            FieldName::FirstName => &mut self.values.first_name,
            FieldName::LastName => &mut self.values.last_name,
            FieldName::IdNumber => &mut self.values.id_number,
            FieldName::Phone => &mut self.values.phone,
            FieldName::Email => &mut self.values.email,
        };
        *slot = value.into();
    }

    pub fn set_values(&mut self, values: StudentFields) {
        self.values = values;
    }

    pub fn fields(&self) -> StudentFields {
        self.values.clone()
    }

    pub fn touch(&mut self, field: FieldName) {
        self.touched |= field.flag();
    }

    pub fn touch_all(&mut self) {
        self.touched = TouchedFields::all();
    }

    pub const fn is_touched(&self, field: FieldName) -> bool {
        self.touched.contains(field.flag())
    }

    pub fn errors(&self, field: FieldName) -> Vec<ValidationError> {
        validate(field, self.value(field))
    }

    ///errors to display: empty until the field has been touched
    pub fn visible_errors(&self, field: FieldName) -> Vec<ValidationError> {
        if self.is_touched(field) {
            self.errors(field)
        } else {
            vec![]
        }
    }

    pub fn is_form_valid(&self) -> bool {
        FieldName::ALL
            .into_iter()
            .all(|field| self.errors(field).is_empty())
    }

    /// Whether the named field should be flagged as invalid in the UI.
    ///
    /// An unknown name is flagged too, which almost always means a template and
    /// [`FieldName`] have drifted apart.
    pub fn shows_error(&self, name: &str) -> bool {
        let Ok(field) = name.parse::<FieldName>() else {
            warn!(?name, "Asked to validate a field the form does not have");
            return true;
        };

        self.is_touched(field) && !self.errors(field).is_empty()
    }

    pub fn fill(&mut self, record: &StudentRecord) {
        self.values = record.fields.clone();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
