//! Bookkeeping for window handles across site steps.
//!
//! The browser reports new tabs only when asked, so the one portable way
//! to find a tab that a click opened is a set difference against the
//! handles known beforehand. The registry owns that known set, plus which
//! handle is the origin tab and which one currently holds focus.

use fantoccini::wd::WindowHandle;

/// Tracks every handle an orchestration run knows about.
///
/// Handles can die underneath the registry (a portal or the operator may
/// close a tab); lookups against a dead handle are a miss, never a fault.
#[derive(Debug, Clone)]
pub struct TabRegistry {
    known: Vec<WindowHandle>,
    origin: WindowHandle,
    focused: WindowHandle,
}

impl TabRegistry {
    /// Starts tracking from the session's first tab, which becomes both
    /// the origin and the initial focus.
    pub fn new(origin: WindowHandle) -> Self {
        Self {
            known: vec![origin.clone()],
            focused: origin.clone(),
            origin,
        }
    }

    /// The first tab of the session, or `None` once it was closed.
    pub fn origin(&self) -> Option<&WindowHandle> {
        self.known.contains(&self.origin).then_some(&self.origin)
    }

    /// The handle subsequent page actions target.
    pub fn focused(&self) -> &WindowHandle {
        &self.focused
    }

    pub fn known(&self) -> &[WindowHandle] {
        &self.known
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    pub fn contains(&self, handle: &WindowHandle) -> bool {
        self.known.contains(handle)
    }

    /// Registers a tab this run opened deliberately.
    pub fn adopt(&mut self, handle: WindowHandle) {
        if !self.known.contains(&handle) {
            self.known.push(handle);
        }
    }

    /// Handles present in `live` but not yet known. Does not register them.
    pub fn fresh(&self, live: &[WindowHandle]) -> Vec<WindowHandle> {
        live.iter()
            .filter(|handle| !self.known.contains(handle))
            .cloned()
            .collect()
    }

    /// Registers and returns every handle in `live` that was unknown.
    /// This is the new-tab detection used after a click that spawns a
    /// browsing context on its own.
    pub fn discover(&mut self, live: &[WindowHandle]) -> Vec<WindowHandle> {
        let found = self.fresh(live);
        self.known.extend(found.iter().cloned());
        found
    }

    /// Forgets a closed tab. Unknown handles are ignored.
    pub fn remove(&mut self, handle: &WindowHandle) {
        self.known.retain(|known| known != handle);
    }

    /// Moves focus to a known handle. Returns `false` (and keeps the prior
    /// focus) when the handle is not known, e.g. because the tab is gone.
    pub fn set_focused(&mut self, handle: WindowHandle) -> bool {
        if self.known.contains(&handle) {
            self.focused = handle;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(name: &str) -> WindowHandle {
        WindowHandle::try_from(name.to_string()).unwrap()
    }

    #[test]
    fn origin_starts_known_and_focused() {
        let registry = TabRegistry::new(handle("origin"));
        assert_eq!(registry.origin(), Some(&handle("origin")));
        assert_eq!(registry.focused(), &handle("origin"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn discover_reports_only_unknown_handles() {
        let mut registry = TabRegistry::new(handle("origin"));
        registry.adopt(handle("second"));

        let live = [handle("origin"), handle("second"), handle("popup")];
        let found = registry.discover(&live);

        assert_eq!(found, vec![handle("popup")]);
        assert!(registry.contains(&handle("popup")));
        // A second sweep over the same handles finds nothing new.
        assert!(registry.discover(&live).is_empty());
    }

    #[test]
    fn fresh_does_not_register() {
        let registry = TabRegistry::new(handle("origin"));
        let found = registry.fresh(&[handle("origin"), handle("popup")]);
        assert_eq!(found, vec![handle("popup")]);
        assert!(!registry.contains(&handle("popup")));
    }

    #[test]
    fn adopt_is_idempotent() {
        let mut registry = TabRegistry::new(handle("origin"));
        registry.adopt(handle("second"));
        registry.adopt(handle("second"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn removing_the_origin_makes_origin_a_miss() {
        let mut registry = TabRegistry::new(handle("origin"));
        registry.adopt(handle("result"));
        registry.set_focused(handle("result"));

        registry.remove(&handle("origin"));

        assert_eq!(registry.origin(), None);
        assert_eq!(registry.focused(), &handle("result"));
    }

    #[test]
    fn focus_onto_unknown_handle_is_a_miss() {
        let mut registry = TabRegistry::new(handle("origin"));
        assert!(!registry.set_focused(handle("gone")));
        assert_eq!(registry.focused(), &handle("origin"));
    }

    #[test]
    fn focused_is_always_a_known_handle() {
        let mut registry = TabRegistry::new(handle("origin"));
        registry.adopt(handle("a"));
        registry.adopt(handle("b"));
        registry.set_focused(handle("b"));
        assert!(registry.known().contains(registry.focused()));
    }

    #[test]
    fn focus_settles_on_the_result_tab_before_the_landing_tab_goes() {
        // The close-own-tab dance: focus must move onto the result tab
        // before the landing tab is forgotten, so a failure in between
        // never leaves focus on a removed handle.
        let mut registry = TabRegistry::new(handle("landing"));
        registry.adopt(handle("result"));
        assert!(registry.set_focused(handle("result")));

        registry.remove(&handle("landing"));

        assert!(registry.known().contains(registry.focused()));
        assert_eq!(registry.focused(), &handle("result"));
    }

    #[test]
    fn discovery_tolerates_externally_closed_tabs() {
        // The operator may close earlier tabs mid-run; a live set smaller
        // than the known set must not confuse the diff.
        let mut registry = TabRegistry::new(handle("origin"));
        registry.adopt(handle("a"));
        registry.adopt(handle("b"));

        let live = [handle("origin"), handle("result")];
        assert_eq!(registry.discover(&live), vec![handle("result")]);
    }

    #[test]
    fn remove_of_unknown_handle_is_ignored() {
        let mut registry = TabRegistry::new(handle("origin"));
        registry.remove(&handle("never-seen"));
        assert_eq!(registry.len(), 1);
    }
}
