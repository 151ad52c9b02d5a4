//! UI Renderer Trait
//!
//! Defines the interface that all frontends must implement.

use anyhow::Result;

use super::events::AppEvent;

/// Trait that all UI renderers must implement
///
/// The engine never draws anything itself; a renderer subscribes to the
/// event channel and applies each [`AppEvent`] in arrival order.
pub trait UiRenderer {
    /// Apply one event to the display
    fn render(&mut self, event: &AppEvent) -> Result<()>;

    /// Drain and apply every event in `events`
    fn render_all<'a, I>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a AppEvent>,
        Self: Sized,
    {
        for event in events {
            self.render(event)?;
        }
        Ok(())
    }
}
