//! Ad delivery on third-party host pages.
//!
//! One [`AdDelivery`] runs one load cycle: mount the two hidden slots,
//! report a page view, fetch a random main/secondary pair and show whatever
//! arrived. Each slot then moves `Hidden → Shown → Closed` exactly once;
//! events on a slot that is not showing are ignored. Every backend call is
//! best-effort and only ever logged on failure.

pub mod page;

use std::collections::HashMap;

use crate::{
    api::DeliveryApi,
    models::{Ad, AdKind, AdPair},
};

pub use page::{HostPage, Placement, MAIN_CONTAINER_ID, SECONDARY_CONTAINER_ID};

#[derive(Debug, Clone, PartialEq)]
pub enum SlotState {
    Hidden,
    Shown(Ad),
    /// Closed or clicked; terminal for this load cycle
    Closed,
}

/// A control event forwarded by the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdEvent {
    /// The ad image was clicked
    Click,
    /// The close control was clicked
    Close,
}

/// Result of [`AdDelivery::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    /// Local-file page; nothing mounted or reported
    Skipped,
    /// Slots mounted; `shown` counts the ads rendered
    Started { shown: usize },
}

#[derive(Debug)]
struct Slot {
    kind: AdKind,
    state: SlotState,
}

pub struct AdDelivery<P, A> {
    page: P,
    api: A,
    /// Container id → slot; the only route from page events to handlers
    slots: HashMap<&'static str, Slot>,
}

impl<P: HostPage, A: DeliveryApi> AdDelivery<P, A> {
    pub fn new(page: P, api: A) -> Self {
        Self {
            page,
            api,
            slots: HashMap::new(),
        }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn slot_state(&self, kind: AdKind) -> Option<&SlotState> {
        self.slots
            .get(Placement::for_kind(kind).container_id)
            .map(|slot| &slot.state)
    }

    /// Run the load cycle.
    pub async fn init(&mut self) -> InitStatus {
        if self.page.protocol() == "file:" {
            tracing::info!("local file page, not showing ads");
            return InitStatus::Skipped;
        }

        self.mount_containers();

        let domain = self.page.hostname();
        let (view, pair) = tokio::join!(
            self.api.record_page_view(),
            self.api.random_pair(Some(domain.as_str()))
        );

        if let Err(e) = view {
            tracing::warn!("failed to record page view: {}", e);
        }

        let pair = match pair {
            Ok(resp) => resp.into_pair(),
            Err(e) => {
                tracing::warn!("failed to load ads: {}", e);
                None
            }
        };

        let shown = match pair {
            Some(pair) => self.show_pair(pair),
            None => {
                tracing::debug!("no ad pair for {}", domain);
                0
            }
        };
        InitStatus::Started { shown }
    }

    /// Append both slot containers if missing and register their handlers.
    /// Safe to call repeatedly.
    pub fn mount_containers(&mut self) {
        for kind in [AdKind::Main, AdKind::Secondary] {
            let placement = Placement::for_kind(kind);
            if !self.page.has_container(placement.container_id) {
                self.page.mount_container(placement);
            }
            self.slots.entry(placement.container_id).or_insert(Slot {
                kind,
                state: SlotState::Hidden,
            });
        }
    }

    fn show_pair(&mut self, pair: AdPair) -> usize {
        let AdPair { main, secondary } = pair;
        [(AdKind::Main, main), (AdKind::Secondary, secondary)]
            .into_iter()
            .filter_map(|(kind, ad)| ad.map(|ad| self.show(kind, ad)))
            .filter(|shown| *shown)
            .count()
    }

    fn show(&mut self, kind: AdKind, ad: Ad) -> bool {
        let placement = Placement::for_kind(kind);
        let Some(slot) = self.slots.get_mut(placement.container_id) else {
            return false;
        };
        if slot.state != SlotState::Hidden {
            return false;
        }

        let markup = page::ad_markup(&ad, placement, &self.api.asset_url(&ad.img_url));
        self.page.render(placement.container_id, &markup);
        self.page.set_visible(placement.container_id, true);
        slot.state = SlotState::Shown(ad);
        true
    }

    /// Handle a control event from the container `container_id`. Returns
    /// whether anything happened.
    pub async fn dispatch(&mut self, container_id: &str, event: AdEvent) -> bool {
        let Some(slot) = self.slots.get_mut(container_id) else {
            tracing::debug!("event for unknown container '{}'", container_id);
            return false;
        };
        let ad = match std::mem::replace(&mut slot.state, SlotState::Closed) {
            SlotState::Shown(ad) => ad,
            other => {
                slot.state = other;
                return false;
            }
        };
        let kind = slot.kind;

        self.page.set_visible(container_id, false);
        let follow = match event {
            AdEvent::Click => true,
            AdEvent::Close => ad.x_redirect_enabled,
        };
        tracing::debug!("{:?} on {} ad {} (follow: {})", event, kind.as_str(), ad.id, follow);

        if follow {
            self.click_through(&ad).await;
        }
        true
    }

    /// Shorthand for dispatching to a placement's container.
    pub async fn handle(&mut self, kind: AdKind, event: AdEvent) -> bool {
        self.dispatch(Placement::for_kind(kind).container_id, event)
            .await
    }

    /// Report the click, then open the link whether or not the report landed.
    async fn click_through(&mut self, ad: &Ad) {
        let domain = self.page.hostname();
        if let Err(e) = self.api.record_click(ad.id, &domain).await {
            tracing::warn!("failed to record click for ad {}: {}", ad.id, e);
        }
        self.page.open_new_context(&ad.link);
    }
}
