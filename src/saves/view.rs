//! HTML fragment for the save/load dialog listing.

use chrono::{DateTime, Local, Utc};

use crate::i18n::Localization;
use crate::routes::util::escape_html;
use crate::saves::SaveRecord;

/// Local wall-clock label used both for listings and default save names.
pub fn time_label(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Render the listing body. Records are expected in display order.
pub fn render_save_list(records: &[SaveRecord], i18n: &Localization) -> String {
    if records.is_empty() {
        return format!(
            r#"<p class="save-empty">{}</p>"#,
            escape_html(&i18n.get("saves.empty"))
        );
    }
    let load = escape_html(&i18n.get("saves.load"));
    let delete = escape_html(&i18n.get("saves.delete"));
    let mut h = String::with_capacity(256 * records.len());
    h.push_str(r#"<ul class="save-list">"#);
    for record in records {
        let id = escape_html(&record.id);
        h.push_str(&format!(
            r#"<li class="save-item" data-save-id="{id}"><span class="save-name">{name}</span><span class="save-time">{time}</span><button class="pixel-button" onclick="storyClient.loadSave('{id}')">{load}</button><button class="pixel-button danger" onclick="storyClient.deleteSave('{id}')">{delete}</button></li>"#,
            id = id,
            name = escape_html(&record.name),
            time = time_label(record.timestamp),
            load = load,
            delete = delete,
        ));
    }
    h.push_str("</ul>");
    h
}
