// src/disclosure.rs
//! Hover/focus disclosure panels. Each trigger/panel pair is an explicit
//! state machine with one cancelable delayed hide, driven by its own task.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Duration, Instant};
use tracing::debug;

use crate::dom::Document;
use crate::page::ACTIVE_CLASS;

pub const HIDE_DELAY: Duration = Duration::from_millis(140);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Interaction {
    PointerEnter,
    PointerLeave,
    FocusIn,
    FocusOut,
    Wheel,
}

impl Interaction {
    pub fn reveals(self) -> bool {
        matches!(
            self,
            Interaction::PointerEnter | Interaction::FocusIn | Interaction::Wheel
        )
    }
}

/// Which node of the pair an interaction landed on. Both behave the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    Trigger,
    Panel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disclosure {
    Hidden,
    Visible,
    /// Still visible; becomes `Hidden` at `deadline` unless revealed again.
    Hiding { deadline: Instant },
}

impl Disclosure {
    pub fn is_visible(self) -> bool {
        !matches!(self, Disclosure::Hidden)
    }

    pub fn deadline(self) -> Option<Instant> {
        match self {
            Disclosure::Hiding { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// A reveal cancels any pending hide. A hide (re)arms the single
    /// pending deadline.
    pub fn on_interaction(self, interaction: Interaction, now: Instant, delay: Duration) -> Self {
        if interaction.reveals() {
            return Disclosure::Visible;
        }
        match self {
            Disclosure::Hidden => Disclosure::Hidden,
            Disclosure::Visible | Disclosure::Hiding { .. } => Disclosure::Hiding {
                deadline: now + delay,
            },
        }
    }

    pub fn on_tick(self, now: Instant) -> Self {
        match self {
            Disclosure::Hiding { deadline } if now >= deadline => Disclosure::Hidden,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelId {
    Vault,
    Swap,
    Burn,
}

impl PanelId {
    pub const ALL: [PanelId; 3] = [PanelId::Vault, PanelId::Swap, PanelId::Burn];

    pub fn as_str(self) -> &'static str {
        match self {
            PanelId::Vault => "vault",
            PanelId::Swap => "swap",
            PanelId::Burn => "burn",
        }
    }

    pub fn trigger_id(self) -> String {
        format!("{}-details-trigger", self.as_str())
    }

    pub fn panel_id(self) -> String {
        format!("{}-details-panel", self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("disclosure driver has stopped")]
pub struct DriverStopped;

/// Handle to one running pair.
#[derive(Debug, Clone)]
pub struct DisclosureHandle {
    events: mpsc::UnboundedSender<Interaction>,
    visible: watch::Receiver<bool>,
}

impl DisclosureHandle {
    pub fn spawn(name: &'static str, hide_delay: Duration) -> Self {
        let (events, rx) = mpsc::unbounded_channel();
        let (tx, visible) = watch::channel(false);
        tokio::spawn(drive(name, rx, tx, hide_delay));
        Self { events, visible }
    }

    pub fn send(&self, interaction: Interaction) -> Result<(), DriverStopped> {
        self.events.send(interaction).map_err(|_| DriverStopped)
    }

    pub fn is_visible(&self) -> bool {
        *self.visible.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.visible.clone()
    }
}

async fn drive(
    name: &'static str,
    mut events: mpsc::UnboundedReceiver<Interaction>,
    visible: watch::Sender<bool>,
    hide_delay: Duration,
) {
    let mut state = Disclosure::Hidden;

    loop {
        let next = match state.deadline() {
            Some(deadline) => tokio::select! {
                ev = events.recv() => ev,
                _ = sleep_until(deadline) => {
                    state = state.on_tick(Instant::now());
                    publish(&visible, state);
                    debug!("{} panel hidden", name);
                    continue;
                }
            },
            None => events.recv().await,
        };

        let Some(interaction) = next else {
            break;
        };
        state = state.on_interaction(interaction, Instant::now(), hide_delay);
        debug!("{} panel {:?} → {:?}", name, interaction, state);
        publish(&visible, state);
    }
}

// Only notify on real visibility changes.
fn publish(visible: &watch::Sender<bool>, state: Disclosure) {
    visible.send_if_modified(|current| {
        let next = state.is_visible();
        let changed = *current != next;
        *current = next;
        changed
    });
}

/// The wired pairs of a page. A pair whose trigger or panel is missing from
/// the markup is never wired.
#[derive(Debug, Clone, Default)]
pub struct DisclosurePanels {
    handles: BTreeMap<PanelId, DisclosureHandle>,
}

impl DisclosurePanels {
    pub fn wire(markup: &Document, hide_delay: Duration) -> Self {
        let handles = PanelId::ALL
            .into_iter()
            .filter(|id| markup.contains(&id.trigger_id()) && markup.contains(&id.panel_id()))
            .map(|id| (id, DisclosureHandle::spawn(id.as_str(), hide_delay)))
            .collect();
        Self { handles }
    }

    pub fn get(&self, id: PanelId) -> Option<&DisclosureHandle> {
        self.handles.get(&id)
    }

    pub fn states(&self) -> BTreeMap<PanelId, bool> {
        self.handles
            .iter()
            .map(|(id, h)| (*id, h.is_visible()))
            .collect()
    }

    /// Marks each wired panel `active` according to its current state.
    pub fn apply(&self, doc: &mut Document) {
        for (id, handle) in &self.handles {
            if let Some(panel) = doc.element_mut(&id.panel_id()) {
                if handle.is_visible() {
                    panel.add_class(ACTIVE_CLASS);
                } else {
                    panel.remove_class(ACTIVE_CLASS);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;
    use crate::page;
    use tokio::time::sleep;

    #[test]
    fn reveal_cancels_pending_hide() {
        let t0 = Instant::now();
        let state = Disclosure::Hidden
            .on_interaction(Interaction::PointerEnter, t0, HIDE_DELAY)
            .on_interaction(Interaction::PointerLeave, t0, HIDE_DELAY);
        assert_eq!(state.deadline(), Some(t0 + HIDE_DELAY));

        let state = state.on_interaction(Interaction::Wheel, t0 + Duration::from_millis(50), HIDE_DELAY);
        assert_eq!(state, Disclosure::Visible);
        assert_eq!(state.on_tick(t0 + Duration::from_secs(5)), Disclosure::Visible);
    }

    #[test]
    fn hide_fires_only_after_delay() {
        let t0 = Instant::now();
        let state = Disclosure::Visible.on_interaction(Interaction::FocusOut, t0, HIDE_DELAY);
        assert!(state.on_tick(t0 + Duration::from_millis(139)).is_visible());
        assert_eq!(state.on_tick(t0 + HIDE_DELAY), Disclosure::Hidden);
    }

    #[test]
    fn second_hide_rearms_single_deadline() {
        let t0 = Instant::now();
        let later = t0 + Duration::from_millis(100);
        let state = Disclosure::Visible
            .on_interaction(Interaction::PointerLeave, t0, HIDE_DELAY)
            .on_interaction(Interaction::FocusOut, later, HIDE_DELAY);
        assert_eq!(state.deadline(), Some(later + HIDE_DELAY));
        assert!(state.on_tick(t0 + HIDE_DELAY).is_visible());
    }

    #[test]
    fn hide_while_hidden_stays_hidden() {
        let state = Disclosure::Hidden.on_interaction(Interaction::PointerLeave, Instant::now(), HIDE_DELAY);
        assert_eq!(state, Disclosure::Hidden);
    }

    #[tokio::test(start_paused = true)]
    async fn reenter_within_delay_never_flickers() {
        let handle = DisclosureHandle::spawn("test", HIDE_DELAY);
        let mut visible = handle.subscribe();

        handle.send(Interaction::PointerEnter).unwrap();
        sleep(Duration::from_millis(10)).await;
        assert!(*visible.borrow_and_update());

        handle.send(Interaction::PointerLeave).unwrap();
        sleep(Duration::from_millis(100)).await;
        handle.send(Interaction::PointerEnter).unwrap();
        sleep(Duration::from_millis(500)).await;

        assert!(handle.is_visible());
        assert!(!visible.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn leave_alone_hides_after_delay() {
        let handle = DisclosureHandle::spawn("test", HIDE_DELAY);

        handle.send(Interaction::FocusIn).unwrap();
        sleep(Duration::from_millis(10)).await;
        handle.send(Interaction::FocusOut).unwrap();

        sleep(Duration::from_millis(100)).await;
        assert!(handle.is_visible());

        sleep(Duration::from_millis(60)).await;
        assert!(!handle.is_visible());
    }

    #[tokio::test]
    async fn wires_only_complete_pairs() {
        let mut markup = page::markup();
        markup
            .element_mut(&PanelId::Swap.trigger_id())
            .unwrap()
            .id = None;

        let panels = DisclosurePanels::wire(&markup, HIDE_DELAY);
        assert!(panels.get(PanelId::Vault).is_some());
        assert!(panels.get(PanelId::Swap).is_none());
        assert!(panels.get(PanelId::Burn).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn apply_marks_visible_panels_active() {
        let panels = DisclosurePanels::wire(&page::markup(), HIDE_DELAY);
        panels.get(PanelId::Burn).unwrap().send(Interaction::Wheel).unwrap();
        sleep(Duration::from_millis(1)).await;

        let mut doc = page::markup();
        panels.apply(&mut doc);

        let burn: &Element = doc.element(&PanelId::Burn.panel_id()).unwrap();
        assert!(burn.has_class(ACTIVE_CLASS));
        assert!(!doc
            .element(&PanelId::Vault.panel_id())
            .unwrap()
            .has_class(ACTIVE_CLASS));
        assert_eq!(panels.states().get(&PanelId::Burn), Some(&true));
    }
}
