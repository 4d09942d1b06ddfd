use crate::{
    maud_conveniences::alert, routes::students::render_dashboard, state::RosterState,
};
use axum::extract::State;
use maud::{Markup, html};

pub async fn get_index_route(State(state): State<RosterState>) -> Markup {
    let dashboard = {
        let mut dashboard = state.dashboard().await;
        let notice = dashboard.take_notice().map(|e| alert(e.to_string()));
        render_dashboard(&dashboard, notice)
    };

    state.render(html! {
        (dashboard)
    })
}
