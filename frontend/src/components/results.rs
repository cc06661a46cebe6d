use shared::{ClassLabel, Prediction};
use strum::IntoEnumIterator;
use yew::prelude::*;

/// The confidence block is always emitted. The stylesheet hides it while the
/// sidebar checkbox is unchecked, so toggling acts on the result on screen.
pub fn render_results(prediction: &Prediction) -> Html {
    let verdict_class = if prediction.is_normal() { "normal" } else { "abnormal" };

    html! {
        <div class={classes!("results-box", verdict_class)}>
            <h3 class="report-title">{"🧪 Diagnosis Report"}</h3>

            <div class="result-item">
                <h5>{"Prediction"}</h5>
                <p id="predicted-label">{ prediction.predicted_class.to_string() }</p>
            </div>

            <div class="confidence-item">
                <div class="result-item">
                    <h5>{"Confidence"}</h5>
                    <div class="confidence-meter">
                        <div class="meter">
                            <div class="meter-fill" style={format!("width: {:.2}%", prediction.confidence)}></div>
                        </div>
                        <p class="meter-value">{ prediction.confidence_display() }</p>
                    </div>
                </div>
                { render_class_breakdown(prediction) }
            </div>

            if prediction.is_normal() {
                <div class="success-banner">{"No signs of malignancy detected"}</div>
            }
        </div>
    }
}

fn render_class_breakdown(prediction: &Prediction) -> Html {
    html! {
        <details class="detailed-results">
            <summary>{"Per-class probabilities"}</summary>
            <div class="result-bars">
                { for ClassLabel::iter().zip(prediction.probabilities.iter()).map(|(label, &p)| {
                    let percentage = p * 100.0;
                    html! {
                        <div class="result-row">
                            <div class="result-label">{ label.to_string() }</div>
                            <div class="result-bar-container">
                                <div class="result-bar" style={format!("width: {:.1}%", percentage)}></div>
                            </div>
                            <div class="result-percent">{ format!("{:.1}%", percentage) }</div>
                        </div>
                    }
                })}
            </div>
        </details>
    }
}
