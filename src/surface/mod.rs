/// User actions reported back by the presentation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceAction {
    Close,
    Copy,
    ToggleWrap,
}

/// Rendering seam. The controller decides what to show and when; the surface
/// decides how text is laid out, scrolled, and styled.
pub trait PresentationSurface {
    fn render(&mut self, text: &str);
    fn set_visible(&mut self, visible: bool);

    /// Refresh placement for a preview that is already showing this text.
    /// Surfaces with a fixed position can ignore it.
    fn reposition(&mut self) {}

    /// Presentation preference flip; not part of the visibility machine.
    fn toggle_wrap(&mut self) {}
}
