use crate::{
    dashboard::{Dashboard, Submission},
    data::{
        IdForm,
        student::{StudentFields, StudentId, StudentRecord},
    },
    error::RosterResult,
    form::{FieldName, RecordForm},
    maud_conveniences::{
        SelectableRow, alert, errors_list, form_submit_button, render_table, title,
    },
    state::RosterState,
    store::RecordStore,
};
use axum::{
    Form,
    extract::{Query, State},
};
use maud::{Markup, html};
use serde::Deserialize;
use std::collections::HashMap;

const BUTTON_CLASSES: &str = "font-bold py-2 px-4 rounded focus:outline-none focus:shadow-outline disabled:opacity-50";

///turns the failures the user can recover from into a notice, and passes the rest on
fn notice_for<T>(result: RosterResult<T>) -> RosterResult<Option<Markup>> {
    match result {
        Ok(_) => Ok(None),
        Err(e) if e.is_recoverable() => {
            warn!(?e, "Roster action had no effect");
            Ok(Some(alert(e.to_string())))
        }
        Err(e) => Err(e),
    }
}

pub fn render_dashboard(dashboard: &Dashboard, notice: Option<Markup>) -> Markup {
    let selected = dashboard
        .selection()
        .and_then(|id| dashboard.store().get(id));

    html! {
        div id="dashboard" class="mx-auto bg-gray-800 p-8 rounded shadow-md max-w-6xl w-full flex flex-col space-y-4" {
            (title("Student Roster"))
            @if let Some(notice) = notice {
                (notice)
            }
            div class="container flex flex-row justify-center space-x-8" {
                div class="w-1/3" {
                    (render_form(dashboard.form(), selected))
                }
                div class="w-2/3 flex flex-col space-y-4" {
                    input type="search" name="search" placeholder="Search by ID number" value=(dashboard.store().search_term())
                        hx-get="/internal/students" hx-trigger="input changed delay:300ms, search" hx-target="#student_table" hx-swap="outerHTML"
                        class="shadow appearance-none border rounded w-full py-2 px-3 leading-tight focus:outline-none focus:shadow-outline bg-gray-700 border-gray-600" {}
                    (render_student_table(dashboard.store(), dashboard.selection()))
                }
            }
        }
    }
}

pub fn render_form(form: &RecordForm, selected: Option<&StudentRecord>) -> Markup {
    let has_selection = selected.is_some();

    html! {
        @if let Some(student) = selected {
            p class="text-gray-300 mb-2" {
                "Editing "
                span class="font-semibold" {(student)}
            }
        }
        form id="student_form" hx-post="/students" hx-trigger="submit" hx-target="#dashboard" hx-swap="outerHTML" class="p-4" {
            @for field in FieldName::ALL {
                (render_field(form, field))
            }

            div class="flex items-center justify-between space-x-2" {
                (form_submit_button(Some("Add Student")))
                button type="button" hx-put="/students" hx-target="#dashboard" hx-swap="outerHTML" disabled[!has_selection] class={"bg-green-600 hover:bg-green-800 " (BUTTON_CLASSES)} {
                    "Save Changes"
                }
                button type="button" hx-delete="/students" hx-target="#dashboard" hx-swap="outerHTML" disabled[!has_selection] class={"bg-red-600 hover:bg-red-800 " (BUTTON_CLASSES)} {
                    "Delete"
                }
                button type="button" hx-post="/internal/form/reset" hx-target="#dashboard" hx-swap="outerHTML" class={"bg-slate-600 hover:bg-slate-800 " (BUTTON_CLASSES)} {
                    "Reset"
                }
            }
        }
    }
}

pub fn render_field(form: &RecordForm, field: FieldName) -> Markup {
    let name = field.as_str();
    let input_type = match field {
        FieldName::Email => "email",
        FieldName::Phone => "tel",
        _ => "text",
    };
    let border = if form.shows_error(name) {
        "border-red-500"
    } else {
        "border-gray-600"
    };

    html! {
        div id={"field_" (name)} class="mb-4" {
            label for=(name) class="block text-sm font-bold mb-2 text-gray-300" {(field.label())}
            input type=(input_type) id=(name) name=(name) value=(form.value(field))
                hx-post="/internal/form/touch" hx-trigger="blur" hx-vals={"{\"field\": \"" (name) "\"}"} hx-target={"#field_" (name)} hx-swap="outerHTML"
                class={"shadow appearance-none border rounded w-full py-2 px-3 leading-tight focus:outline-none focus:shadow-outline bg-gray-700 " (border)} {}
            (errors_list(&form.visible_errors(field)))
        }
    }
}

pub fn render_student_table(store: &RecordStore, selection: Option<StudentId>) -> Markup {
    let rows = store
        .filtered()
        .iter()
        .map(|student| SelectableRow {
            select_url: format!("/internal/students/select?id={}", student.id),
            selected: selection == Some(student.id),
            cells: [
                html! {(student.fields.first_name)},
                html! {(student.fields.last_name)},
                html! {(student.fields.id_number)},
                html! {(student.fields.phone)},
                html! {a href={"mailto:" (student.fields.email)} class="text-blue-200 underline" {(student.fields.email)}},
            ],
        })
        .collect::<Vec<_>>();

    html! {
        div id="student_table" {
            p class="text-sm text-gray-400 mb-2" {
                "Showing " (rows.len()) " of " (store.records().len()) " students"
            }
            @if rows.is_empty() {
                p class="text-gray-300 italic" {"No students match."}
            } @else {
                (render_table(
                    ["First Name", "Last Name", "ID Number", "Phone", "Email"],
                    rows,
                    "#dashboard",
                ))
            }
        }
    }
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    search: String,
}

pub async fn internal_get_students(
    State(state): State<RosterState>,
    Query(SearchQuery { search }): Query<SearchQuery>,
) -> Markup {
    let mut dashboard = state.dashboard().await;
    dashboard.search(search);
    render_student_table(dashboard.store(), dashboard.selection())
}

pub async fn internal_get_select_student(
    State(state): State<RosterState>,
    Query(IdForm { id }): Query<IdForm>,
) -> RosterResult<Markup> {
    let mut dashboard = state.dashboard().await;
    let notice = notice_for(dashboard.select(id))?;
    Ok(render_dashboard(&dashboard, notice))
}

pub async fn post_new_student(
    State(state): State<RosterState>,
    Form(fields): Form<StudentFields>,
) -> RosterResult<Markup> {
    let mut dashboard = state.dashboard().await;
    let result = dashboard.submit(fields).await;
    let notice = match result {
        Ok(Submission::Accepted) => Some(alert("Student added.")),
        Ok(Submission::Invalid) => None,
        Err(e) => notice_for::<()>(Err(e))?,
    };
    Ok(render_dashboard(&dashboard, notice))
}

pub async fn put_student_changes(
    State(state): State<RosterState>,
    Form(fields): Form<StudentFields>,
) -> RosterResult<Markup> {
    let mut dashboard = state.dashboard().await;
    let result = dashboard.save_changes(fields).await;
    let notice = match result {
        Ok(Submission::Accepted) => Some(alert("Changes saved.")),
        Ok(Submission::Invalid) => None,
        Err(e) => notice_for::<()>(Err(e))?,
    };
    Ok(render_dashboard(&dashboard, notice))
}

pub async fn delete_student(State(state): State<RosterState>) -> RosterResult<Markup> {
    let mut dashboard = state.dashboard().await;
    let notice = match dashboard.delete_student().await {
        Ok(()) => Some(alert("Student deleted.")),
        Err(e) => notice_for::<()>(Err(e))?,
    };
    Ok(render_dashboard(&dashboard, notice))
}

pub async fn internal_post_touch_field(
    State(state): State<RosterState>,
    Form(mut values): Form<HashMap<String, String>>,
) -> Markup {
    let Some(name) = values.remove("field") else {
        warn!("Blur event arrived without a field name");
        return html! {};
    };
    let Ok(field) = name.parse::<FieldName>() else {
        warn!(?name, "Blur event for a field the form does not have");
        return html! {};
    };
    let value = values.remove(&name).unwrap_or_default();

    let mut dashboard = state.dashboard().await;
    dashboard.touch(&name, value);
    render_field(dashboard.form(), field)
}

pub async fn internal_post_reset_form(State(state): State<RosterState>) -> Markup {
    let mut dashboard = state.dashboard().await;
    dashboard.reset_form();
    render_dashboard(&dashboard, None)
}
