//! HTML email body formatting.

use herald_common::types::{FeatureEntry, FieldChange, Stage};

/// Which body variant to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    NewFeature,
    UpdatedFeature,
}

/// Escape text interpolated into HTML email bodies.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

/// Determine the shipping milestone string to display.
///
/// Uses the earliest desktop milestone when one exists, otherwise the
/// earliest android milestone with an android suffix.
pub fn determine_milestone_string(ship_stages: &[Stage]) -> String {
    let first_desktop = ship_stages.iter().filter_map(|s| s.desktop_first).min();
    let first_android = ship_stages.iter().filter_map(|s| s.android_first).min();

    match (first_desktop, first_android) {
        (Some(desktop), _) => desktop.to_string(),
        (None, Some(android)) => format!("{android} (android)"),
        (None, None) => "unspecified".to_string(),
    }
}

/// Render the changed-properties list.
fn format_changes(changes: &[FieldChange]) -> String {
    let mut formatted = String::new();
    for change in changes {
        let old_val = change.old_val.as_deref().unwrap_or("None");
        let new_val = change.new_val.as_deref().unwrap_or("None");
        formatted.push_str(&format!(
            "<li><b>{}:</b> <br/><b>old:</b> {} <br/><b>new:</b> {}<br/></li><br/>",
            change.prop_name,
            escape_html(old_val),
            escape_html(new_val),
        ));
    }
    if formatted.is_empty() {
        formatted.push_str("<li>None</li>");
    }
    formatted
}

/// Doc links pointing at MDN, kept as a separate section in the body.
fn mdn_doc_links(fe: &FeatureEntry) -> Vec<&str> {
    fe.doc_links
        .iter()
        .filter(|link| {
            url::Url::parse(link)
                .ok()
                .and_then(|u| u.host_str().map(|h| h == "developer.mozilla.org"))
                .unwrap_or(false)
        })
        .map(String::as_str)
        .collect()
}

/// Return the HTML body shared by every recipient of one notification event.
///
/// The per-recipient reason footer is appended later by the aggregator.
pub fn format_email_body(
    kind: BodyKind,
    fe: &FeatureEntry,
    ship_stages: &[Stage],
    changes: &[FieldChange],
    updater_email: Option<&str>,
    site_url: &str,
) -> String {
    let milestone = determine_milestone_string(ship_stages);
    let status = fe.impl_status.label();
    let updater = updater_email
        .or(fe.updater_email.as_deref())
        .unwrap_or("unknown");
    let creator = fe.creator_email.as_deref().unwrap_or("unknown");

    let heading = match kind {
        BodyKind::NewFeature => "New feature tracked",
        BodyKind::UpdatedFeature => "Feature updated",
    };

    let mut body = format!(
        "<p>{heading}</p>\n\
         <h4><a href=\"{site_url}feature/{id}\">{name}</a></h4>\n\
         <p>{summary}</p>\n\
         <p><b>Implementation status:</b> {status}</p>\n\
         <p><b>Milestone:</b> {milestone}</p>\n\
         <p><b>Created by:</b> {creator} <b>Updated by:</b> {updater}</p>\n",
        id = fe.id,
        name = escape_html(&fe.name),
        summary = escape_html(&fe.summary),
    );

    body.push_str(&format!(
        "<h5>Changes:</h5>\n<ul>\n{}\n</ul>\n",
        format_changes(changes)
    ));

    let moz_links = mdn_doc_links(fe);
    if !moz_links.is_empty() {
        body.push_str("<p>MDN documentation:</p>\n<ul>\n");
        for link in moz_links {
            body.push_str(&format!("<li><a href=\"{link}\">{link}</a></li>\n"));
        }
        body.push_str("</ul>\n");
    }

    body
}
