use crate::props::UploadView;
use yew::prelude::*;

pub fn render_preview_area(upload: &UploadView) -> Html {
    let Some(src) = &upload.preview_src else {
        return html! {};
    };

    html! {
        <figure class="preview">
            <img src={src.clone()} alt={upload.file_name.clone()} title={upload.file_name.clone()} />
            <figcaption>{"Uploaded CT Scan"}</figcaption>
        </figure>
    }
}
