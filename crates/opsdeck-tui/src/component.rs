//! Component trait — the building block for every screen.

use color_eyre::eyre::Result;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{Frame, layout::Rect};
use tokio::sync::mpsc::UnboundedSender;

use crate::action::Action;

/// Every screen implements Component.
///
/// Lifecycle: `init` → (`handle_key_event` | `handle_mouse_event` | `update` | `render`)*
pub trait Component: Send {
    /// Called once when the component is mounted.
    /// Receives the action sender for dispatching actions to the app loop.
    fn init(&mut self, _action_tx: UnboundedSender<Action>) -> Result<()> {
        Ok(())
    }

    /// Handle a keyboard event. Return an Action to dispatch, or None.
    fn handle_key_event(&mut self, _key: KeyEvent) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Handle a mouse event. Return an Action to dispatch, or None.
    fn handle_mouse_event(&mut self, _mouse: MouseEvent) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Process a dispatched action. May return a follow-up action.
    fn update(&mut self, _action: &Action) -> Result<Option<Action>> {
        Ok(None)
    }

    /// Render into the provided frame area.
    fn render(&self, frame: &mut Frame, area: Rect);

    /// Whether the screen currently captures raw input (an open form,
    /// modal, or detail view). While true, global keybindings other than
    /// Ctrl+C are suspended.
    fn wants_input(&self) -> bool {
        false
    }

    /// Whether this component currently holds input focus.
    #[allow(dead_code)]
    fn focused(&self) -> bool {
        false
    }

    /// Set focus state.
    fn set_focused(&mut self, _focused: bool) {}

    /// Unique identifier for this component (for focus management).
    #[allow(dead_code)]
    fn id(&self) -> &str;
}
