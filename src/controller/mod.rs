//! The selection controller: a two-state (Hidden/Visible) machine driven by
//! named transition functions. A thin host adapter owns the real event source
//! and the real clocks; methods that arm a timer hand back a [`TimerRequest`]
//! and the host calls [`Controller::on_timer`] when it elapses.

mod timer;

pub use timer::{TimerKind, TimerRequest, TimerSlot, TimerToken};

use std::time::Duration;

use crate::clipboard::ClipboardBackend;
use crate::decoder::{self, DecodeResult};
use crate::notification::Notifier;
use crate::settings::{Settings, SettingsContext, SettingsMessage};
use crate::surface::{PresentationSurface, SurfaceAction};

/// Delay between a pointer release and selection evaluation.
pub const SELECTION_DEBOUNCE: Duration = Duration::from_millis(80);
/// Delay before a selection-change event is checked for a collapsed selection.
pub const COLLAPSE_DEBOUNCE: Duration = Duration::from_millis(120);
/// Delay before an open preview closes itself after a scroll.
pub const AUTO_HIDE_DELAY: Duration = Duration::from_millis(400);

/// Read access to the live text selection.
pub trait SelectionSource {
    /// The current selection, or `None` when it is collapsed.
    fn current_selection(&self) -> Option<String>;
}

/// Visibility state plus the text currently on display. Invariant: when
/// `is_visible` is true the surface is rendering exactly `last_shown`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PanelState {
    pub is_visible: bool,
    pub last_shown: String,
}

/// What the shared debounce slot evaluates when it fires. Pointer releases
/// and selection changes coalesce into the same slot on purpose: the later
/// event wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceCheck {
    EvaluateSelection,
    CollapsedOnly,
}

pub struct Controller<Sel, Sur, Clip, Not> {
    settings: SettingsContext,
    selection: Sel,
    surface: Sur,
    clipboard: Clip,
    notifier: Not,
    panel: PanelState,
    debounce: TimerSlot,
    debounce_check: DebounceCheck,
    auto_hide: TimerSlot,
}

impl<Sel, Sur, Clip, Not> Controller<Sel, Sur, Clip, Not>
where
    Sel: SelectionSource,
    Sur: PresentationSurface,
    Clip: ClipboardBackend,
    Not: Notifier,
{
    pub fn new(
        settings: SettingsContext,
        selection: Sel,
        surface: Sur,
        clipboard: Clip,
        notifier: Not,
    ) -> Self {
        Self {
            settings,
            selection,
            surface,
            clipboard,
            notifier,
            panel: PanelState::default(),
            debounce: TimerSlot::new(TimerKind::SelectionDebounce),
            debounce_check: DebounceCheck::EvaluateSelection,
            auto_hide: TimerSlot::new(TimerKind::AutoHide),
        }
    }

    pub fn panel(&self) -> &PanelState {
        &self.panel
    }

    pub fn settings(&self) -> Settings {
        self.settings.current()
    }

    /// Mouseup. Releases landing on the preview's own chrome while it is
    /// open never re-trigger selection handling.
    pub fn on_pointer_release(&mut self, inside_surface: bool) -> Option<TimerRequest> {
        if inside_surface && self.panel.is_visible {
            return None;
        }
        if !self.settings.current().enable_popup {
            return None;
        }

        self.debounce_check = DebounceCheck::EvaluateSelection;
        Some(self.debounce.schedule(SELECTION_DEBOUNCE))
    }

    /// Selection drags under an open preview are ignored; while hidden they
    /// arm the collapsed-selection check.
    pub fn on_selection_change(&mut self) -> Option<TimerRequest> {
        if self.panel.is_visible {
            return None;
        }

        self.debounce_check = DebounceCheck::CollapsedOnly;
        Some(self.debounce.schedule(COLLAPSE_DEBOUNCE))
    }

    pub fn on_scroll(&mut self) -> Option<TimerRequest> {
        if !self.panel.is_visible {
            return None;
        }
        Some(self.auto_hide.schedule(AUTO_HIDE_DELAY))
    }

    pub fn on_outside_click(&mut self) {
        if self.panel.is_visible {
            self.hide();
        }
    }

    pub fn on_escape(&mut self) {
        self.hide();
    }

    pub fn on_settings_changed(&mut self, settings: Settings) {
        tracing::debug!(?settings, "settings snapshot updated");
        self.settings.apply(settings);
        if !settings.enable_popup && self.panel.is_visible {
            self.hide();
        }
    }

    pub fn on_settings_message(&mut self, message: SettingsMessage) {
        let SettingsMessage::SettingsUpdated { settings } = message;
        self.on_settings_changed(settings);
    }

    pub fn on_surface_action(&mut self, action: SurfaceAction) {
        if !self.panel.is_visible {
            return;
        }
        match action {
            SurfaceAction::Close => self.hide(),
            SurfaceAction::Copy => self.copy_shown_text(),
            SurfaceAction::ToggleWrap => self.surface.toggle_wrap(),
        }
    }

    /// Delivery point for elapsed [`TimerRequest`]s. Stale tokens are no-ops.
    pub fn on_timer(&mut self, token: TimerToken) {
        match token.kind() {
            TimerKind::SelectionDebounce => {
                if !self.debounce.try_fire(token) {
                    return;
                }
                match self.debounce_check {
                    DebounceCheck::EvaluateSelection => self.evaluate_selection(),
                    DebounceCheck::CollapsedOnly => self.hide_if_collapsed(),
                }
            }
            TimerKind::AutoHide => {
                if self.auto_hide.try_fire(token) {
                    self.hide();
                }
            }
        }
    }

    fn evaluate_selection(&mut self) {
        if !self.settings.current().enable_popup {
            tracing::debug!("popup rendering disabled; dropping selection evaluation");
            self.hide();
            return;
        }

        let raw = match self.selection.current_selection() {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => {
                self.hide();
                return;
            }
        };

        match decoder::decode(&raw) {
            None => {
                tracing::trace!(len = raw.len(), "selection has no decodable literal");
                self.hide();
            }
            Some(DecodeResult { decoded, method }) => {
                if self.panel.is_visible && decoded == self.panel.last_shown {
                    // Same text while dragging; repositioning is enough and
                    // re-rendering would flicker.
                    self.surface.reposition();
                    return;
                }
                tracing::debug!(?method, chars = decoded.chars().count(), "showing preview");
                self.show(decoded);
            }
        }
    }

    fn hide_if_collapsed(&mut self) {
        if self.panel.is_visible {
            return;
        }
        let collapsed = self
            .selection
            .current_selection()
            .is_none_or(|raw| raw.trim().is_empty());
        if collapsed {
            self.hide();
        }
    }

    fn show(&mut self, decoded: String) {
        self.auto_hide.cancel();
        self.surface.render(&decoded);
        self.surface.set_visible(true);
        self.panel.last_shown = decoded;
        self.panel.is_visible = true;
    }

    fn hide(&mut self) {
        self.auto_hide.cancel();
        if !self.panel.is_visible {
            return;
        }
        tracing::debug!("hiding preview");
        self.panel.is_visible = false;
        self.surface.set_visible(false);
    }

    fn copy_shown_text(&mut self) {
        match self.clipboard.write_text(&self.panel.last_shown) {
            Ok(()) => self.notifier.flash("Copied!"),
            Err(err) => {
                tracing::warn!(?err, "clipboard write failed");
                self.notifier.flash("Copy failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::clipboard::{ClipboardError, ClipboardResult};

    #[derive(Debug, Default)]
    struct SurfaceLog {
        rendered: Vec<String>,
        visible: bool,
        repositions: usize,
        wrap_toggles: usize,
    }

    #[derive(Clone, Default)]
    struct FakeSurface(Rc<RefCell<SurfaceLog>>);

    impl PresentationSurface for FakeSurface {
        fn render(&mut self, text: &str) {
            self.0.borrow_mut().rendered.push(text.to_string());
        }

        fn set_visible(&mut self, visible: bool) {
            self.0.borrow_mut().visible = visible;
        }

        fn reposition(&mut self) {
            self.0.borrow_mut().repositions += 1;
        }

        fn toggle_wrap(&mut self) {
            self.0.borrow_mut().wrap_toggles += 1;
        }
    }

    #[derive(Clone, Default)]
    struct FakeSelection(Rc<RefCell<Option<String>>>);

    impl FakeSelection {
        fn set(&self, text: &str) {
            *self.0.borrow_mut() = Some(text.to_string());
        }

        fn collapse(&self) {
            *self.0.borrow_mut() = None;
        }
    }

    impl SelectionSource for FakeSelection {
        fn current_selection(&self) -> Option<String> {
            self.0.borrow().clone()
        }
    }

    #[derive(Clone, Default)]
    struct FakeClipboard {
        fail: bool,
        writes: Rc<RefCell<Vec<String>>>,
    }

    impl ClipboardBackend for FakeClipboard {
        fn write_text(&self, text: &str) -> ClipboardResult<()> {
            if self.fail {
                return Err(ClipboardError::CommandFailed {
                    status: "exit status 1".to_string(),
                });
            }
            self.writes.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct FakeNotifier(Rc<RefCell<Vec<String>>>);

    impl Notifier for FakeNotifier {
        fn flash(&self, message: &str) {
            self.0.borrow_mut().push(message.to_string());
        }
    }

    struct Harness {
        controller: Controller<FakeSelection, FakeSurface, FakeClipboard, FakeNotifier>,
        selection: FakeSelection,
        surface: Rc<RefCell<SurfaceLog>>,
        clipboard_writes: Rc<RefCell<Vec<String>>>,
        flashes: Rc<RefCell<Vec<String>>>,
    }

    fn harness() -> Harness {
        harness_with(Settings::default(), false)
    }

    fn harness_with(settings: Settings, clipboard_fails: bool) -> Harness {
        let selection = FakeSelection::default();
        let surface = FakeSurface::default();
        let surface_log = surface.0.clone();
        let clipboard = FakeClipboard {
            fail: clipboard_fails,
            writes: Rc::default(),
        };
        let clipboard_writes = clipboard.writes.clone();
        let notifier = FakeNotifier::default();
        let flashes = notifier.0.clone();

        Harness {
            controller: Controller::new(
                SettingsContext::new(settings),
                selection.clone(),
                surface,
                clipboard,
                notifier,
            ),
            selection,
            surface: surface_log,
            clipboard_writes,
            flashes,
        }
    }

    impl Harness {
        fn select_and_release(&mut self, text: &str) {
            self.selection.set(text);
            let request = self
                .controller
                .on_pointer_release(false)
                .expect("release should arm the debounce");
            self.controller.on_timer(request.token);
        }
    }

    const ESCAPED: &str = r#"log: "Hello\nWorld""#;

    #[test]
    fn release_then_debounce_fire_shows_decoded_preview() {
        let mut h = harness();
        h.select_and_release(ESCAPED);

        assert!(h.controller.panel().is_visible);
        assert_eq!(h.controller.panel().last_shown, "Hello\nWorld");
        assert_eq!(h.surface.borrow().rendered, vec!["Hello\nWorld"]);
        assert!(h.surface.borrow().visible);
    }

    #[test]
    fn stale_debounce_token_is_ignored_after_reschedule() {
        let mut h = harness();
        h.selection.set(ESCAPED);

        let first = h.controller.on_pointer_release(false).expect("first arm");
        let second = h.controller.on_pointer_release(false).expect("second arm");

        h.controller.on_timer(first.token);
        assert!(!h.controller.panel().is_visible);

        h.controller.on_timer(second.token);
        assert!(h.controller.panel().is_visible);
        assert_eq!(h.surface.borrow().rendered.len(), 1);
    }

    #[test]
    fn identical_decoded_text_repositions_without_rerender() {
        let mut h = harness();
        h.select_and_release(ESCAPED);
        h.select_and_release(&format!("  {ESCAPED} trailing context"));

        assert!(h.controller.panel().is_visible);
        assert_eq!(h.surface.borrow().rendered.len(), 1);
        assert_eq!(h.surface.borrow().repositions, 1);
    }

    #[test]
    fn different_decoded_text_rerenders() {
        let mut h = harness();
        h.select_and_release(ESCAPED);
        h.select_and_release(r#"now "a\tb" instead"#);

        assert_eq!(
            h.surface.borrow().rendered,
            vec!["Hello\nWorld".to_string(), "a\tb".to_string()]
        );
        assert_eq!(h.controller.panel().last_shown, "a\tb");
    }

    #[test]
    fn undecodable_selection_hides_the_preview() {
        let mut h = harness();
        h.select_and_release(ESCAPED);
        h.select_and_release("nothing quoted here");

        assert!(!h.controller.panel().is_visible);
        assert!(!h.surface.borrow().visible);
    }

    #[test]
    fn collapsed_selection_at_fire_time_hides() {
        let mut h = harness();
        h.select_and_release(ESCAPED);

        h.selection.collapse();
        let request = h.controller.on_pointer_release(false).expect("arm");
        h.controller.on_timer(request.token);

        assert!(!h.controller.panel().is_visible);
    }

    #[test]
    fn escape_hides_from_any_state() {
        let mut h = harness();
        h.controller.on_escape();
        assert!(!h.controller.panel().is_visible);

        h.select_and_release(ESCAPED);
        h.controller.on_escape();
        assert!(!h.controller.panel().is_visible);
        assert!(!h.surface.borrow().visible);
    }

    #[test]
    fn outside_click_hides_only_when_visible() {
        let mut h = harness();
        h.controller.on_outside_click();
        assert!(!h.surface.borrow().visible);

        h.select_and_release(ESCAPED);
        h.controller.on_outside_click();
        assert!(!h.controller.panel().is_visible);
    }

    #[test]
    fn pointer_release_inside_open_preview_is_ignored() {
        let mut h = harness();
        h.select_and_release(ESCAPED);
        assert!(h.controller.on_pointer_release(true).is_none());

        // While hidden the same flag does not suppress handling.
        h.controller.on_escape();
        assert!(h.controller.on_pointer_release(true).is_some());
    }

    #[test]
    fn scroll_is_ignored_while_hidden() {
        let mut h = harness();
        assert!(h.controller.on_scroll().is_none());
    }

    #[test]
    fn scroll_auto_hide_fires_once_from_the_second_scheduling() {
        let mut h = harness();
        h.select_and_release(ESCAPED);

        let first = h.controller.on_scroll().expect("first scroll arms");
        let second = h.controller.on_scroll().expect("second scroll re-arms");

        h.controller.on_timer(first.token);
        assert!(h.controller.panel().is_visible);

        h.controller.on_timer(second.token);
        assert!(!h.controller.panel().is_visible);
    }

    #[test]
    fn new_preview_cancels_a_pending_auto_hide() {
        let mut h = harness();
        h.select_and_release(ESCAPED);
        let pending = h.controller.on_scroll().expect("scroll arms auto-hide");

        h.select_and_release(r#"next "a\tb""#);
        h.controller.on_timer(pending.token);

        assert!(h.controller.panel().is_visible);
        assert_eq!(h.controller.panel().last_shown, "a\tb");
    }

    #[test]
    fn debounce_scheduling_leaves_auto_hide_pending() {
        let mut h = harness();
        h.select_and_release(ESCAPED);
        let auto_hide = h.controller.on_scroll().expect("scroll arms auto-hide");

        // Arm the debounce but never fire it; the auto-hide must still win.
        h.selection.set(ESCAPED);
        let _ = h.controller.on_pointer_release(false).expect("arm");

        h.controller.on_timer(auto_hide.token);
        assert!(!h.controller.panel().is_visible);
    }

    #[test]
    fn selection_change_is_ignored_while_visible() {
        let mut h = harness();
        h.select_and_release(ESCAPED);
        assert!(h.controller.on_selection_change().is_none());
    }

    #[test]
    fn selection_change_collapsed_check_stays_hidden() {
        let mut h = harness();
        h.selection.collapse();
        let request = h
            .controller
            .on_selection_change()
            .expect("hidden state arms the collapsed check");
        assert_eq!(request.delay, COLLAPSE_DEBOUNCE);

        h.controller.on_timer(request.token);
        assert!(!h.controller.panel().is_visible);
    }

    #[test]
    fn pointer_release_is_ignored_when_popups_disabled() {
        let mut h = harness_with(
            Settings {
                enable_popup: false,
                enable_debug: false,
            },
            false,
        );
        h.selection.set(ESCAPED);
        assert!(h.controller.on_pointer_release(false).is_none());
    }

    #[test]
    fn disabling_popups_while_visible_hides_immediately() {
        let mut h = harness();
        h.select_and_release(ESCAPED);

        h.controller.on_settings_changed(Settings {
            enable_popup: false,
            enable_debug: false,
        });

        assert!(!h.controller.panel().is_visible);
        assert!(!h.surface.borrow().visible);
        assert!(!h.controller.settings().enable_popup);
    }

    #[test]
    fn settings_message_updates_the_cached_snapshot() {
        let mut h = harness();
        h.select_and_release(ESCAPED);

        let message: SettingsMessage = serde_json::from_str(
            r#"{"type":"SETTINGS_UPDATED","settings":{"enablePopup":false,"enableDebug":true}}"#,
        )
        .expect("message should parse");
        h.controller.on_settings_message(message);

        assert!(!h.controller.panel().is_visible);
        assert!(h.controller.settings().enable_debug);
    }

    #[test]
    fn copy_action_writes_shown_text_and_flashes() {
        let mut h = harness();
        h.select_and_release(ESCAPED);
        h.controller.on_surface_action(SurfaceAction::Copy);

        assert_eq!(h.clipboard_writes.borrow().as_slice(), ["Hello\nWorld"]);
        assert_eq!(h.flashes.borrow().as_slice(), ["Copied!"]);
        assert!(h.controller.panel().is_visible);
    }

    #[test]
    fn copy_failure_flashes_without_touching_visibility() {
        let mut h = harness_with(Settings::default(), true);
        h.select_and_release(ESCAPED);
        h.controller.on_surface_action(SurfaceAction::Copy);

        assert_eq!(h.flashes.borrow().as_slice(), ["Copy failed"]);
        assert!(h.controller.panel().is_visible);
    }

    #[test]
    fn close_and_wrap_actions_route_to_their_effects() {
        let mut h = harness();
        h.select_and_release(ESCAPED);

        h.controller.on_surface_action(SurfaceAction::ToggleWrap);
        assert_eq!(h.surface.borrow().wrap_toggles, 1);
        assert!(h.controller.panel().is_visible);

        h.controller.on_surface_action(SurfaceAction::Close);
        assert!(!h.controller.panel().is_visible);
    }

    #[test]
    fn surface_actions_are_ignored_while_hidden() {
        let mut h = harness();
        h.controller.on_surface_action(SurfaceAction::Copy);
        assert!(h.clipboard_writes.borrow().is_empty());
        assert!(h.flashes.borrow().is_empty());
    }
}
