use yew::prelude::*;

/// Settings column. The checkbox belongs to the upload form so its state
/// travels with every analysis request.
pub fn render_sidebar(show_confidence: bool) -> Html {
    html! {
        <aside class="sidebar">
            <h2>{"Settings"}</h2>
            <label class="setting">
                <input
                    type="checkbox"
                    id="show-confidence"
                    name="show_confidence"
                    value="on"
                    form="upload-form"
                    checked={show_confidence}
                />
                <span>{"Show confidence score"}</span>
            </label>
            <hr />
            <p class="note">
                <strong>{"Note:"}</strong>
                {" This tool assists but doesn't replace professional diagnosis."}
            </p>
        </aside>
    }
}
