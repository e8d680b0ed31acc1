//! Plain-text rendering of conversation messages and their widgets.
//!
//! Rendering only reads core types; it never changes routing, protocol, or
//! conversation state.

use crate::core::message::{Message, Role, WidgetInstance};
use crate::mcp::types::ContentItem;
use base64::Engine as _;
use serde_json::{Map, Value};

/// Default list widgets show at most this many resource cards.
pub const MAX_RESOURCE_CARDS: usize = 10;
pub const NO_RESULTS: &str = "No results found";
const APP_WIDGET_SCHEME: &str = "ui://";
const DEFAULT_WIDGET_PREFIX: &str = "ui://default/";
const CARD_INDENT: &str = "   ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetView<'a> {
    /// An app-supplied template this client cannot host; shown as a placeholder.
    Custom(&'a str),
    DefaultList,
}

impl<'a> WidgetView<'a> {
    pub fn for_widget(widget: &'a WidgetInstance) -> Self {
        let uri = widget.widget_uri.as_str();
        if uri.starts_with(APP_WIDGET_SCHEME) && !uri.starts_with(DEFAULT_WIDGET_PREFIX) {
            WidgetView::Custom(uri)
        } else {
            WidgetView::DefaultList
        }
    }
}

pub fn render_message(message: &Message) -> Vec<String> {
    let mut lines = Vec::new();
    match message.role {
        Role::User => {
            let mut content = message.content.lines();
            lines.push(format!("You: {}", content.next().unwrap_or_default()));
            lines.extend(content.map(|line| format!("     {line}")));
        }
        Role::Assistant => {
            if let Some(source) = &message.source_name {
                lines.push(format!("[{source}]"));
            }
            lines.extend(message.content.lines().map(str::to_string));
            for widget in message.widgets() {
                lines.push(String::new());
                lines.extend(render_widget(widget));
            }
        }
        Role::System => {
            lines.extend(message.content.lines().map(|line| format!("* {line}")));
        }
    }
    lines
}

pub fn render_widget(widget: &WidgetInstance) -> Vec<String> {
    match WidgetView::for_widget(widget) {
        WidgetView::Custom(uri) => vec![format!("Custom widget: {uri}")],
        WidgetView::DefaultList => render_default_list(&widget.data),
    }
}

/// Widget data is either a content list or an object carrying one under
/// `content`. Anything else has nothing to show.
fn content_items(data: &Value) -> Vec<ContentItem> {
    let items: &[Value] = match data {
        Value::Array(items) => items.as_slice(),
        Value::Object(object) => match object.get("content") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };
    items.iter().map(ContentItem::from_value).collect()
}

fn render_default_list(data: &Value) -> Vec<String> {
    let items = content_items(data);
    let mut lines = Vec::new();
    let mut resources = Vec::new();

    for item in &items {
        match item {
            ContentItem::Text { text } => lines.extend(text.lines().map(str::to_string)),
            ContentItem::Image {
                data,
                uri,
                mime_type,
            } => lines.extend(describe_image(
                data.as_deref(),
                uri.as_deref(),
                mime_type.as_deref(),
            )),
            ContentItem::Resource { resource, .. } => {
                if let Some(resource) = resource.as_ref().filter(|r| !r.data.is_empty()) {
                    resources.push(&resource.data);
                }
            }
            ContentItem::Unsupported => {}
        }
    }

    if lines.is_empty() && resources.is_empty() {
        return vec![NO_RESULTS.to_string()];
    }

    for (index, resource) in resources.into_iter().take(MAX_RESOURCE_CARDS).enumerate() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.extend(render_card(index + 1, resource));
    }
    lines
}

fn describe_image(data: Option<&str>, uri: Option<&str>, mime_type: Option<&str>) -> Option<String> {
    let kind = mime_type.unwrap_or("image");
    if let Some(uri) = uri {
        return Some(format!("[{kind}: {uri}]"));
    }
    let encoded = data?;
    match base64::prelude::BASE64_STANDARD.decode(encoded.trim()) {
        Ok(bytes) => Some(format!("[{kind}, {} bytes]", bytes.len())),
        Err(_) => Some(format!("[{kind}, unreadable data]")),
    }
}

fn string_field<'a>(resource: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    resource
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn render_card(number: usize, resource: &Map<String, Value>) -> Vec<String> {
    let title = string_field(resource, "name")
        .or_else(|| string_field(resource, "title"))
        .unwrap_or("Untitled");
    let mut lines = vec![format!("{number}. {title}")];

    if let Some(description) = string_field(resource, "description") {
        lines.extend(description.lines().map(|line| format!("{CARD_INDENT}{line}")));
    }

    let mut details = Vec::new();
    if let Some(site) = string_field(resource, "site") {
        details.push(site.to_string());
    }
    let category = match resource.get("recipeCategory") {
        Some(Value::Array(categories)) => categories.first().and_then(Value::as_str),
        Some(Value::String(category)) => Some(category.as_str()),
        _ => None,
    };
    if let Some(category) = category {
        details.push(category.to_string());
    }
    if let Some(total_time) = string_field(resource, "totalTime") {
        details.push(total_time.to_string());
    }
    match resource.get("aggregateRating").and_then(|r| r.get("ratingValue")) {
        Some(Value::Number(rating)) => details.push(format!("★ {rating}")),
        Some(Value::String(rating)) if !rating.is_empty() => details.push(format!("★ {rating}")),
        _ => {}
    }
    if !details.is_empty() {
        lines.push(format!("{CARD_INDENT}{}", details.join(" · ")));
    }

    if let Some(url) = string_field(resource, "url") {
        lines.push(format!("{CARD_INDENT}{url}"));
    }
    lines
}
