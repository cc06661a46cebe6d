use shared::ClassLabel;
use strum::IntoEnumIterator;
use yew::prelude::*;

/// Collapsible panel describing each category. Rendered on every page.
pub fn render_about_panel() -> Html {
    html! {
        <details class="about-panel">
            <summary>{"ℹ️ About Cancer Types"}</summary>
            <p><strong>{"Lung Cancer Types:"}</strong></p>
            <ul>
                { for ClassLabel::iter().map(|label| html! {
                    <li>
                        <strong>{ label.to_string() }</strong>
                        { format!(": {}", label.description()) }
                    </li>
                })}
            </ul>
        </details>
    }
}
