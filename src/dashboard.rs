use crate::{
    data::student::{StudentFields, StudentId},
    error::{NothingSelectedSnafu, RecordNotFoundSnafu, RosterError, RosterResult},
    form::{FieldName, RecordForm},
    store::RecordStore,
};
use snafu::OptionExt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Submission {
    Accepted,
    ///the form had errors, which are now visible; nothing was stored
    Invalid,
}

/// Everything behind the single roster page: the store, the form, and the
/// record currently selected for editing.
#[derive(Debug)]
pub struct Dashboard {
    store: RecordStore,
    form: RecordForm,
    selection: Option<StudentId>,
    ///shown once on the next full page render
    pending_notice: Option<RosterError>,
}

impl Dashboard {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            form: RecordForm::default(),
            selection: None,
            pending_notice: None,
        }
    }

    /// Keeps a failure that happened outside any request, like a corrupt
    /// roster at startup, until the page can show it.
    pub fn report(&mut self, e: RosterError) {
        self.pending_notice = Some(e);
    }

    pub fn take_notice(&mut self) -> Option<RosterError> {
        self.pending_notice.take()
    }

    pub async fn load(&mut self) -> RosterResult<()> {
        self.store.load().await
    }

    pub const fn store(&self) -> &RecordStore {
        &self.store
    }

    pub const fn form(&self) -> &RecordForm {
        &self.form
    }

    pub const fn selection(&self) -> Option<StudentId> {
        self.selection
    }

    pub fn search(&mut self, term: impl Into<String>) {
        self.store.search(term);
    }

    ///returns `false` when `name` isn't a field of the form
    pub fn touch(&mut self, name: &str, value: impl Into<String>) -> bool {
        let Ok(field) = name.parse::<FieldName>() else {
            return false;
        };
        self.form.set_value(field, value);
        self.form.touch(field);
        true
    }

    pub fn select(&mut self, id: StudentId) -> RosterResult<()> {
        let record = self.store.get(id).context(RecordNotFoundSnafu { id })?;
        self.form.fill(record);
        self.selection = Some(id);
        Ok(())
    }

    pub fn reset_form(&mut self) {
        self.form.reset();
        self.selection = None;
    }

    pub async fn submit(&mut self, fields: StudentFields) -> RosterResult<Submission> {
        if !self.take_form_values(fields) {
            return Ok(Submission::Invalid);
        }

        let fields = self.form.fields();
        info!(?fields, "Submitting new student");
        self.store.add(fields).await?;
        self.reset_form();
        Ok(Submission::Accepted)
    }

    /// Writes the form values over the selected record.
    ///
    /// Once the values pass validation the form and selection are cleared,
    /// even when the selected record turns out to be gone.
    pub async fn save_changes(&mut self, fields: StudentFields) -> RosterResult<Submission> {
        if !self.take_form_values(fields) {
            return Ok(Submission::Invalid);
        }

        let selection = self.selection;
        let fields = self.form.fields();
        self.reset_form();

        let id = selection.context(NothingSelectedSnafu)?;
        self.store.update(id, fields).await?;
        Ok(Submission::Accepted)
    }

    pub async fn delete_student(&mut self) -> RosterResult<()> {
        let selection = self.selection;
        self.reset_form();

        let id = selection.context(NothingSelectedSnafu)?;
        self.store.delete(id).await
    }

    fn take_form_values(&mut self, fields: StudentFields) -> bool {
        self.form.set_values(fields);
        self.form.touch_all();
        self.form.is_form_valid()
    }
}
