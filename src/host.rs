//! Thin terminal adapter around the controller, used by [`crate::run`] to
//! validate the selection flow end to end without a live document. Each input
//! line plays the role of a selected text block; `:commands` stand in for the
//! preview's buttons. The terminal has no macrotask queue, so due timers run
//! eagerly right after the event that armed them.

use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use crate::clipboard::{ClipboardBackend, WlCopyBackend};
use crate::controller::{Controller, SelectionSource};
use crate::notification::{DesktopNotifier, Notifier};
use crate::settings::SettingsContext;
use crate::surface::{PresentationSurface, SurfaceAction};

/// Selection feed shared between the session loop and the controller.
#[derive(Debug, Clone, Default)]
pub struct SharedSelection(Rc<RefCell<Option<String>>>);

impl SharedSelection {
    pub fn set(&self, text: Option<String>) {
        *self.0.borrow_mut() = text;
    }
}

impl SelectionSource for SharedSelection {
    fn current_selection(&self) -> Option<String> {
        self.0.borrow().clone()
    }
}

/// Prints the preview into the session's output stream. Wrap toggling is
/// accepted and ignored; the terminal already wraps.
pub struct TerminalSurface<W: Write> {
    out: Rc<RefCell<W>>,
}

impl<W: Write> PresentationSurface for TerminalSurface<W> {
    fn render(&mut self, text: &str) {
        let mut out = self.out.borrow_mut();
        if let Err(err) = writeln!(out, "── decoded preview ──\n{text}\n─────────────────────") {
            tracing::warn!(?err, "failed to write preview");
        }
    }

    fn set_visible(&mut self, visible: bool) {
        if visible {
            return;
        }
        let mut out = self.out.borrow_mut();
        if let Err(err) = writeln!(out, "(preview closed)") {
            tracing::warn!(?err, "failed to write preview state");
        }
    }
}

pub fn run_session<R: BufRead, W: Write>(
    input: R,
    output: W,
    settings: SettingsContext,
) -> io::Result<()> {
    run_session_with(input, output, settings, WlCopyBackend, DesktopNotifier)
}

pub fn run_session_with<R, W, Clip, Not>(
    input: R,
    output: W,
    settings: SettingsContext,
    clipboard: Clip,
    notifier: Not,
) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    Clip: ClipboardBackend,
    Not: Notifier,
{
    let selection = SharedSelection::default();
    let out = Rc::new(RefCell::new(output));
    let surface = TerminalSurface { out: out.clone() };
    let mut controller = Controller::new(settings, selection.clone(), surface, clipboard, notifier);

    for line in input.lines() {
        let line = line?;
        match line.trim() {
            ":quit" => break,
            ":close" => controller.on_surface_action(SurfaceAction::Close),
            ":copy" => controller.on_surface_action(SurfaceAction::Copy),
            ":wrap" => controller.on_surface_action(SurfaceAction::ToggleWrap),
            ":esc" => controller.on_escape(),
            "" => {
                selection.set(None);
                if let Some(request) = controller.on_selection_change() {
                    controller.on_timer(request.token);
                }
            }
            text => {
                selection.set(Some(text.to_string()));
                if let Some(request) = controller.on_pointer_release(false) {
                    controller.on_timer(request.token);
                }
                if !controller.panel().is_visible {
                    writeln!(out.borrow_mut(), "(no decodable literal in selection)")?;
                }
            }
        }
    }

    Ok(())
}
