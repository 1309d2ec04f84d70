//! Server-rendered HTML pages.

use crate::error::AppError;
use crate::pipeline::RequestResult;
use std::fmt::Write;

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; color: #222; }
h1 { font-size: 1.6rem; }
.images { display: flex; gap: 1rem; flex-wrap: wrap; }
.images figure { flex: 1 1 420px; margin: 0; }
.images img { max-width: 100%; border: 1px solid #ccc; }
table { border-collapse: collapse; margin: 1rem 0; }
th, td { border: 1px solid #ccc; padding: 0.3rem 0.7rem; text-align: left; }
.total { font-size: 1.3rem; font-weight: bold; }
.error { color: #a00; }
"#;

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        escape(title)
    )
}

/// Escape text for HTML element content and double-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn upload_form() -> String {
    page(
        "Food Calorie Estimator",
        r#"<h1>Food Calorie Estimator</h1>
<p>Upload a photo of your meal to detect food items and estimate total calories.</p>
<form action="/upload" method="post" enctype="multipart/form-data">
  <input type="file" name="image" accept="image/*" required>
  <button type="submit">Analyze</button>
</form>"#,
    )
}

pub fn result_page(result: &RequestResult) -> String {
    let mut body = String::new();
    body.push_str("<h1>Analysis Result</h1>\n");
    let _ = writeln!(
        body,
        "<p class=\"total\">Total estimated calories: {} kcal</p>",
        result.total_calories
    );

    let _ = write!(
        body,
        "<div class=\"images\">\n\
         <figure><img src=\"{}\" alt=\"Detected food\"><figcaption>Detected</figcaption></figure>\n\
         <figure><img src=\"{}\" alt=\"Original upload\"><figcaption>Original</figcaption></figure>\n\
         </div>\n",
        escape(&result.result_image_url),
        escape(&result.original_image_url),
    );

    if result.detections.is_empty() {
        body.push_str("<p>No food items were detected.</p>\n");
    } else {
        body.push_str(
            "<table>\n<tr><th>Food</th><th>Confidence</th><th>Box (x1, y1, x2, y2)</th><th>Calories</th></tr>\n",
        );
        for d in &result.detections {
            let _ = writeln!(
                body,
                "<tr><td>{}</td><td>{:.2}</td><td>{}, {}, {}, {}</td><td>{} kcal</td></tr>",
                escape(&d.label),
                d.confidence,
                d.bbox.x1,
                d.bbox.y1,
                d.bbox.x2,
                d.bbox.y2,
                d.calories
            );
        }
        body.push_str("</table>\n");
    }

    body.push_str("<p><a href=\"/\">Analyze another photo</a></p>");
    page("Analysis Result", &body)
}

pub fn error_page(err: &AppError) -> String {
    let body = format!(
        "<h1>Something went wrong</h1>\n<p class=\"error\">{}</p>\n<p><a href=\"/\">Try another photo</a></p>",
        escape(&err.to_string())
    );
    page("Error", &body)
}
