//! HTML pages served by the web interface

use crate::pipeline::PipelineOutcome;
use crate::types::FEATURE_NAMES;
use axum::http::StatusCode;

const STYLE: &str = "body { font-family: sans-serif; max-width: 860px; margin: 2em auto; color: #222; }
label { display: inline-block; width: 120px; }
.field { margin: 0.4em 0; }
.high { color: #c0003c; }
.low { color: #006bbf; }
img { max-width: 100%; border: 1px solid #ddd; margin: 0.5em 0; }
textarea { width: 100%; }";

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{STYLE}\n</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        escape_html(title)
    )
}

/// Input form with one field per feature
pub fn index() -> String {
    let fields: String = FEATURE_NAMES
        .iter()
        .map(|name| {
            let step = if *name == "bmi" { "any" } else { "1" };
            format!(
                "<div class=\"field\"><label for=\"{name}\">{name}</label>\
                 <input type=\"number\" step=\"{step}\" id=\"{name}\" name=\"{name}\" required></div>\n"
            )
        })
        .collect();

    layout(
        "Insurance Risk Prediction",
        &format!(
            "<h1>Insurance Risk Prediction</h1>\n<form method=\"post\" action=\"/predict\">\n{fields}<button type=\"submit\">Predict</button>\n</form>"
        ),
    )
}

/// Links shown on the result page
#[derive(Debug, Clone)]
pub struct ResultLinks {
    pub bar_chart: String,
    pub force_chart: String,
    pub download: String,
}

pub fn result(outcome: &PipelineOutcome, links: &ResultLinks) -> String {
    let label_class = outcome.prediction.risk_label.as_str();
    let body = format!(
        "<h1>Prediction Result</h1>
<p class=\"{label_class}\"><strong>Predicted Risk: {risk}, Estimated Charges: {cost}</strong></p>
<p>Confidence Score: {confidence}</p>
<h2>Why</h2>
<p>{rationale}</p>
<h2>Recommendation</h2>
<p>{recommendation}</p>
<h2>Feature Contributions</h2>
<img src=\"{bar}\" alt=\"Feature contribution bar chart\">
<img src=\"{force}\" alt=\"Cumulative feature contribution chart\">
<p><a href=\"{download}\">Download PDF report</a></p>
<h2>Feedback</h2>
<form method=\"post\" action=\"/feedback\">
<textarea name=\"feedback\" rows=\"4\"></textarea>
<button type=\"submit\">Send feedback</button>
</form>
<p><a href=\"/\">New prediction</a></p>",
        risk = escape_html(&outcome.display.risk),
        cost = escape_html(&outcome.display.cost),
        confidence = escape_html(&outcome.display.confidence),
        rationale = escape_html(&outcome.explanation.rationale),
        recommendation = escape_html(&outcome.explanation.recommendation),
        bar = escape_html(&links.bar_chart),
        force = escape_html(&links.force_chart),
        download = escape_html(&links.download),
    );
    layout("Prediction Result", &body)
}

pub fn thanks() -> String {
    layout(
        "Thank You",
        "<h1>Thank you!</h1>\n<p>Your feedback has been recorded.</p>\n<p><a href=\"/\">Back to the form</a></p>",
    )
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    layout(
        "Error",
        &format!(
            "<h1>{}</h1>\n<p>{}</p>\n<p><a href=\"/\">Back to the form</a></p>",
            status.as_u16(),
            escape_html(message)
        ),
    )
}
