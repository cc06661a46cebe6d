use yew::prelude::*;

pub fn render_error_message(message: &str, hint: Option<&str>) -> Html {
    html! {
        <div class="error-message">
            <p>{ message }</p>
            {
                if let Some(hint) = hint {
                    html! { <p class="error-hint">{ hint }</p> }
                } else {
                    html! {}
                }
            }
        </div>
    }
}
