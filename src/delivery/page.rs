use crate::models::{Ad, AdKind};

pub const MAIN_CONTAINER_ID: &str = "main-ad-container";
pub const SECONDARY_CONTAINER_ID: &str = "secondary-ad-container";

/// Fixed-position slot styling for one placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub container_id: &'static str,
    pub style: &'static str,
    pub image_max_width: u32,
    pub image_max_height: u32,
    pub close_size: u32,
}

impl Placement {
    pub fn for_kind(kind: AdKind) -> &'static Placement {
        match kind {
            AdKind::Main => &MAIN_PLACEMENT,
            AdKind::Secondary => &SECONDARY_PLACEMENT,
        }
    }
}

/// Centered overlay.
pub const MAIN_PLACEMENT: Placement = Placement {
    container_id: MAIN_CONTAINER_ID,
    style: "position: fixed; top: 50%; left: 50%; transform: translate(-50%, -50%); \
            z-index: 10000; background: white; border-radius: 8px; \
            box-shadow: 0 4px 20px rgba(0,0,0,0.3); padding: 10px; display: none;",
    image_max_width: 500,
    image_max_height: 400,
    close_size: 25,
};

/// Bottom-right corner.
pub const SECONDARY_PLACEMENT: Placement = Placement {
    container_id: SECONDARY_CONTAINER_ID,
    style: "position: fixed; bottom: 20px; right: 20px; z-index: 9999; \
            background: white; border-radius: 8px; \
            box-shadow: 0 2px 10px rgba(0,0,0,0.2); padding: 8px; display: none; \
            max-width: 300px;",
    image_max_width: 250,
    image_max_height: 200,
    close_size: 20,
};

/// The parts of a host page the delivery controller touches.
///
/// Implementations bind the page's DOM (or a headless stand-in). Handlers
/// for the rendered controls are not attached here: the host forwards
/// clicks to [`super::AdDelivery::dispatch`] using the container id.
pub trait HostPage {
    /// Location protocol including the colon, e.g. "https:" or "file:".
    fn protocol(&self) -> String;

    /// Hostname reported with click events.
    fn hostname(&self) -> String;

    fn has_container(&self, id: &str) -> bool;

    /// Append a hidden container with the given inline style.
    fn mount_container(&mut self, placement: &Placement);

    /// Replace the container's content.
    fn render(&mut self, id: &str, markup: &str);

    fn set_visible(&mut self, id: &str, visible: bool);

    /// Open `link` in a new browsing context.
    fn open_new_context(&mut self, link: &str);
}

/// Markup for one ad: a close control and the clickable image. Controls are
/// tagged with data attributes instead of inline handlers.
pub fn ad_markup(ad: &Ad, placement: &Placement, image_url: &str) -> String {
    let size = placement.close_size;
    format!(
        concat!(
            r#"<div style="position: relative;">"#,
            r#"<button type="button" data-ad-action="close" data-ad-id="{id}" "#,
            r#"style="position: absolute; top: -5px; right: -5px; background: #ff4444; "#,
            r#"color: white; border: none; border-radius: 50%; width: {size}px; height: {size}px; "#,
            r#"cursor: pointer; line-height: 1;">&times;</button>"#,
            r#"<img src="{src}" alt="ad" data-ad-action="click" data-ad-id="{id}" "#,
            r#"style="max-width: {w}px; max-height: {h}px; display: block; cursor: pointer;">"#,
            r#"</div>"#
        ),
        id = ad.id,
        size = size,
        src = escape_attr(image_url),
        w = placement.image_max_width,
        h = placement.image_max_height,
    )
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}
