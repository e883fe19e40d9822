// src/termsheet/html.rs
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::termsheet::download::DownloadArtifact;
use crate::termsheet::view::{Card, TabBody, Table, TermSheetView};

const APP_TITLE: &str = "Termsheet Parser";

// Yellow/black theme; tabs are radio buttons so no script is needed.
const STYLE: &str = r#"
:root { --primary-yellow: #F7D358; --secondary-yellow: #F1C232; --light-yellow: #FFF2CC;
        --black: #000000; --dark-gray: #333333; --white: #FFFFFF; --light-gray: #F8F8F8; }
body { font-family: system-ui, sans-serif; background: var(--white); color: var(--dark-gray); margin: 0 auto; max-width: 1200px; padding: 1rem; }
h1, h2, h3, h4 { color: var(--black); }
.main-header { background: var(--primary-yellow); padding: 2rem; border-radius: .5rem; margin-bottom: 2rem; text-align: center; box-shadow: 0 4px 6px rgba(0,0,0,.1); }
.main-header h1 { margin: 0; font-size: 2.5rem; }
.upload-area { background: var(--light-gray); border: 2px dashed var(--secondary-yellow); border-radius: .5rem; padding: 2rem; text-align: center; margin-bottom: 2rem; }
button, .download-button { background: var(--secondary-yellow); color: var(--black); font-weight: bold; border: none; padding: .5rem 2rem; border-radius: .25rem; cursor: pointer; text-decoration: none; display: inline-block; }
button:hover, .download-button:hover { background: var(--primary-yellow); }
.success { background: #E6F4EA; border-left: 5px solid #34A853; padding: .75rem 1rem; border-radius: .25rem; }
.error { background: #FCE8E6; border-left: 5px solid #D93025; padding: .75rem 1rem; border-radius: .25rem; }
.tabs > input { display: none; }
.tabs > label { display: inline-block; background: var(--light-gray); border: 1px solid #E0E0E0; border-bottom: none; border-radius: 4px 4px 0 0; padding: 10px 20px; cursor: pointer; }
.tabs > input:checked + label { background: var(--light-yellow); border-color: var(--secondary-yellow); border-top: 3px solid var(--secondary-yellow); }
.tab-panel { display: none; padding-top: 1rem; }
#tab-0:checked ~ #panel-0, #tab-1:checked ~ #panel-1, #tab-2:checked ~ #panel-2,
#tab-3:checked ~ #panel-3, #tab-4:checked ~ #panel-4 { display: block; }
.data-card { border-left: 5px solid var(--secondary-yellow); border-radius: .5rem; padding: 1.5rem; margin-bottom: 1rem; box-shadow: 0 4px 6px rgba(0,0,0,.05); }
.data-card h3 { margin-top: 0; border-bottom: 2px solid var(--light-yellow); padding-bottom: .5rem; }
.properties { display: grid; grid-template-columns: 1fr 1fr; gap: .25rem 2rem; }
.property-label { font-weight: bold; }
.property-value.important { font-size: 1.1rem; font-weight: bold; }
table { border-collapse: collapse; width: 100%; margin-top: .5rem; }
th, td { border: 1px solid #E0E0E0; padding: .4rem .6rem; text-align: left; }
th { background: var(--light-yellow); }
pre { background: var(--light-gray); padding: 1rem; overflow-x: auto; }
.footer { text-align: center; margin-top: 2rem; padding: 1rem; background: var(--light-yellow); border-radius: .5rem; }
"#;

fn page(body: &str) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n", APP_TITLE, STYLE));
    html.push_str(&format!("<div class=\"main-header\"><h1>{}</h1></div>\n", APP_TITLE));
    html.push_str("<p>Easily extract structured data from complex financial product term sheets</p>\n");
    html.push_str(body);
    html.push_str("\n</body>\n</html>");
    html
}

fn upload_form(current_file: Option<&str>) -> String {
    let mut form = String::from(
        "<form class=\"upload-area\" action=\"/extract\" method=\"post\" enctype=\"multipart/form-data\">\n",
    );
    form.push_str("<input type=\"file\" name=\"file\" accept=\".pdf,application/pdf\" required>\n");
    form.push_str("<button type=\"submit\">Extract Data</button>\n");
    if let Some(name) = current_file {
        form.push_str(&format!("<p>File uploaded: <strong>{}</strong></p>\n", encode_text(name)));
    }
    form.push_str("</form>\n");
    form
}

/// Landing page with the upload form.
pub fn render_upload_page() -> String {
    let mut body = upload_form(None);
    body.push_str(
        "<div style=\"text-align:center;padding:2rem;color:#666\">\
         <h3>Upload a termsheet PDF file to get started</h3>\
         <p>This tool will extract structured data from your termsheet into a well-organized format</p></div>",
    );
    page(&body)
}

/// Upload form followed by an inline error message.
pub fn render_error_page(upload_name: Option<&str>, message: &str) -> String {
    let mut body = upload_form(upload_name);
    body.push_str(&format!("<div class=\"error\">{}</div>\n", encode_text(message)));
    page(&body)
}

fn render_table(table: &Table) -> String {
    let mut html = String::new();
    if let Some(title) = table.title {
        html.push_str(&format!("<h4>{}</h4>\n", encode_text(title)));
    }
    html.push_str("<table>\n<thead><tr>");
    for header in &table.headers {
        html.push_str(&format!("<th>{}</th>", encode_text(header)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", encode_text(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

fn render_card(card: &Card) -> String {
    let mut html = format!("<div class=\"data-card\">\n<h3>{}</h3>\n", encode_text(card.title));
    if !card.properties.is_empty() {
        html.push_str("<div class=\"properties\">\n");
        for p in &card.properties {
            let class = if p.important { "property-value important" } else { "property-value" };
            html.push_str(&format!(
                "<div><span class=\"property-label\">{}:</span> <span class=\"{}\">{}</span></div>\n",
                encode_text(p.label),
                class,
                encode_text(&p.value)
            ));
        }
        html.push_str("</div>\n");
    }
    if let Some(table) = &card.table {
        html.push_str(&render_table(table));
    }
    html.push_str("</div>\n");
    html
}

/// Full results page: download link, then one panel per tab.
pub fn render_result_page(upload_name: &str, view: &TermSheetView, artifact: &DownloadArtifact) -> String {
    let mut body = upload_form(Some(upload_name));
    body.push_str("<p class=\"success\">Extraction complete!</p>\n");
    body.push_str(&format!(
        "<p><a class=\"download-button\" href=\"{}\" download=\"{}\">Download JSON</a></p>\n",
        artifact.data_url(),
        encode_double_quoted_attribute(&artifact.filename)
    ));

    body.push_str("<div class=\"tabs\">\n");
    for (i, tab) in view.tabs.iter().enumerate() {
        let checked = if i == 0 { " checked" } else { "" };
        body.push_str(&format!(
            "<input type=\"radio\" name=\"tabs\" id=\"tab-{i}\"{checked}><label for=\"tab-{i}\">{}</label>\n",
            encode_text(tab.title)
        ));
    }
    for (i, tab) in view.tabs.iter().enumerate() {
        body.push_str(&format!("<section class=\"tab-panel\" id=\"panel-{}\">\n", i));
        match &tab.body {
            TabBody::Cards(cards) => {
                for card in cards {
                    body.push_str(&render_card(card));
                }
            }
            TabBody::Raw(raw) => {
                body.push_str(&format!(
                    "<div class=\"data-card\">\n<h3>Raw JSON Data</h3>\n<pre>{}</pre>\n</div>\n",
                    encode_text(raw)
                ));
            }
        }
        body.push_str("</section>\n");
    }
    body.push_str("</div>\n");
    body.push_str(&format!("<div class=\"footer\">{} | Powered by LlamaExtract</div>\n", APP_TITLE));

    page(&body)
}
