use crate::form::ValidationError;
use maud::{Markup, Render, html};

pub struct SelectableRow<const N: usize> {
    pub select_url: String,
    pub selected: bool,
    pub cells: [Markup; N],
}

pub fn render_table<const N: usize>(
    titles: [&'static str; N],
    rows: Vec<SelectableRow<N>>,
    target: &str,
) -> Markup {
    html! {
        div class="overflow-x-auto" {
            table class="min-w-full bg-gray-800 rounded shadow-md" {
                thead class="bg-gray-700" {
                    tr {
                        @for title in titles {
                            th class="py-2 px-4 text-left font-semibold text-gray-300" {(title)}
                        }
                    }
                }
                tbody {
                    @for row in rows {
                        @let class = if row.selected {
                            "cursor-pointer hover:bg-gray-600 bg-gray-700"
                        } else {
                            "cursor-pointer hover:bg-gray-600"
                        };
                        tr hx-get=(row.select_url) hx-target=(target) hx-swap="outerHTML" class=(class) {
                            @for col in row.cells {
                                td class="py-2 px-4 border-b border-gray-600 text-gray-200" {(col)}
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn title(s: impl Render) -> Markup {
    html! {
        h1 class="text-2xl font-semibold mb-4" {(s)}
    }
}

pub fn alert(s: impl Render) -> Markup {
    html! {
        div class="bg-yellow-100 border border-yellow-400 text-yellow-800 px-4 py-3 rounded relative mb-4" role="alert" {
            (s)
        }
    }
}

pub fn errors_list(errors: &[ValidationError]) -> Markup {
    html! {
        @if !errors.is_empty() {
            ul class="text-red-400 text-xs mt-1" {
                @for error in errors {
                    li {(error.to_string())}
                }
            }
        }
    }
}

pub fn form_submit_button(text: Option<&str>) -> Markup {
    html! {
        button type="submit" class="bg-blue-500 hover:bg-blue-700 font-bold py-2 px-4 rounded focus:outline-none focus:shadow-outline" {
            (text.unwrap_or("Submit"))
        }
    }
}
