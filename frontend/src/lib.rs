mod components;
pub mod props;

use components::about::render_about_panel;
use components::header::render_header;
use components::preview_area::render_preview_area;
use components::results::render_results;
use components::sidebar::render_sidebar;
use components::upload_section::render_upload_section;
use components::utils::render_error_message;
use yew::prelude::*;

pub use props::{AnalysisOutcome, PageProps, UploadView};

pub const PAGE_TITLE: &str = "Lung Cancer Detector";

/// The whole page. Rendered once per request, never hydrated.
pub struct App;

impl Component for App {
    type Message = ();
    type Properties = PageProps;

    fn create(_ctx: &Context<Self>) -> Self {
        Self
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let props = ctx.props();
        html! {
            <div class="container">
                { render_sidebar(props.show_confidence) }

                <main class="main-content">
                    { render_header() }
                    { render_upload_section() }
                    { self.render_analysis(props) }
                    { render_about_panel() }
                </main>
            </div>
        }
    }
}

impl App {
    fn render_analysis(&self, props: &PageProps) -> Html {
        let Some(upload) = &props.upload else {
            return html! {};
        };

        html! {
            <section class="analysis">
                { render_preview_area(upload) }
                <div class="analysis-result">
                    {
                        match &upload.outcome {
                            AnalysisOutcome::Success(prediction) => {
                                render_results(prediction)
                            }
                            AnalysisOutcome::Failure { message, hint } => {
                                render_error_message(message, hint.as_deref())
                            }
                        }
                    }
                </div>
            </section>
        }
    }
}

/// Renders a complete HTML document for the given page state.
pub async fn render_page(props: PageProps) -> String {
    log::debug!(
        "Rendering page (upload: {}, show_confidence: {})",
        props.upload.is_some(),
        props.show_confidence
    );

    let body = yew::ServerRenderer::<App>::with_props(move || props)
        .hydratable(false)
        .render()
        .await;

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>{PAGE_TITLE}</title>
    <link rel="icon" href="data:image/svg+xml,<svg xmlns=%22http://www.w3.org/2000/svg%22 viewBox=%220 0 100 100%22><text y=%22.9em%22 font-size=%2290%22>🫁</text></svg>" />
    <link rel="stylesheet" href="/static/style.css" />
</head>
<body>
{body}
</body>
</html>"#
    )
}
