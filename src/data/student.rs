use maud::Render;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type StudentId = Uuid;

/// A roster entry as it is persisted and seeded.
///
/// Seed documents do not carry an `id`, so one is generated when it is missing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    #[serde(default = "Uuid::new_v4")]
    pub id: StudentId,
    #[serde(flatten)]
    pub fields: StudentFields,
}

impl StudentRecord {
    pub fn new(fields: StudentFields) -> Self {
        Self {
            id: Uuid::new_v4(),
            fields,
        }
    }
}

/// The five user-editable values of a student, as submitted by the form.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StudentFields {
    pub first_name: String,
    pub last_name: String,
    pub id_number: String,
    pub phone: String,
    pub email: String,
}

impl Render for StudentRecord {
    fn render_to(&self, buffer: &mut String) {
        self.fields.first_name.render_to(buffer);
        buffer.push(' ');
        self.fields.last_name.render_to(buffer);
    }
}
