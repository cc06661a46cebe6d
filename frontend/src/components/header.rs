use yew::prelude::*;

/// Renders the application header
pub fn render_header() -> Html {
    html! {
        <header class="app-header">
            <h1>{"Lung Cancer Detector"}</h1>
            <hr />
        </header>
    }
}
