use yew::prelude::*;

pub const ACCEPTED_TYPES: &str = ".jpg,.jpeg,.png,image/jpeg,image/png";

pub fn render_upload_section() -> Html {
    html! {
        <div class="upload-section">
            <form id="upload-form" method="post" action="/" enctype="multipart/form-data">
                <label for="file-input" class="upload-label">{"Upload CT scan image"}</label>
                <div class="upload-area">
                    <input type="file" id="file-input" name="image" accept={ACCEPTED_TYPES} />
                    <p class="file-types">{"Supported formats: JPG, JPEG, PNG"}</p>
                </div>
                <button type="submit" class="analyze-btn">{"Analyze"}</button>
            </form>
        </div>
    }
}
