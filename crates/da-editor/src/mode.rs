//! Interaction modes and the toolbar state they start in.
//!
//! A mode is a coarse restriction chosen by the host page; the toolbar is
//! what the user is doing right now. Exactly one toolbar flag is raised after
//! the first transition, enforced by [`ToolbarFlags::set_only`].

/// Host-selected restriction on which toolbars are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Full,
    Stamping,
    Drawing,
}

impl InteractionMode {
    /// Parse a host string. Anything unrecognized is `Full`.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "stamping" => Self::Stamping,
            "drawing" => Self::Drawing,
            _ => Self::Full,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Stamping => "stamping",
            Self::Drawing => "drawing",
        }
    }

    /// The toolbar a mode switches to when it is entered.
    pub fn default_toolbar(self) -> Toolbar {
        match self {
            Self::Stamping => Toolbar::Stamps,
            Self::Drawing => Toolbar::Drawing,
            Self::Full => Toolbar::Selection,
        }
    }

    /// Whether the UI should offer `toolbar` in this mode. Advisory only.
    pub fn reaches(self, toolbar: Toolbar) -> bool {
        match self {
            Self::Full => true,
            Self::Stamping => toolbar == Toolbar::Stamps,
            Self::Drawing => toolbar == Toolbar::Drawing,
        }
    }
}

/// Active tool category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toolbar {
    Selection,
    Drawing,
    Text,
    Shapes,
    Stamps,
}

impl Toolbar {
    pub const ALL: [Toolbar; 5] = [
        Toolbar::Selection,
        Toolbar::Drawing,
        Toolbar::Text,
        Toolbar::Shapes,
        Toolbar::Stamps,
    ];

    fn index(self) -> usize {
        match self {
            Toolbar::Selection => 0,
            Toolbar::Drawing => 1,
            Toolbar::Text => 2,
            Toolbar::Shapes => 3,
            Toolbar::Stamps => 4,
        }
    }

    /// Pointer-up on this toolbar goes through object generation.
    pub fn generates_objects(self) -> bool {
        matches!(self, Toolbar::Text | Toolbar::Shapes | Toolbar::Stamps)
    }
}

/// Per-toolbar "selected" flags as shown by the toolbar buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToolbarFlags([bool; 5]);

impl ToolbarFlags {
    /// Lower every flag, then raise `toolbar`'s.
    pub fn set_only(&mut self, toolbar: Toolbar) {
        self.0 = [false; 5];
        self.0[toolbar.index()] = true;
    }

    pub fn is_selected(&self, toolbar: Toolbar) -> bool {
        self.0[toolbar.index()]
    }

    /// The raised toolbar, if any transition has happened yet.
    pub fn current(&self) -> Option<Toolbar> {
        Toolbar::ALL.into_iter().find(|t| self.is_selected(*t))
    }

    /// Number of raised flags.
    pub fn count(&self) -> usize {
        self.0.iter().filter(|f| **f).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_mode_names_are_full() {
        assert_eq!(InteractionMode::from_name("stamping"), InteractionMode::Stamping);
        assert_eq!(InteractionMode::from_name("drawing"), InteractionMode::Drawing);
        assert_eq!(InteractionMode::from_name("full"), InteractionMode::Full);
        assert_eq!(InteractionMode::from_name("Stamping"), InteractionMode::Full);
        assert_eq!(InteractionMode::from_name(""), InteractionMode::Full);
    }

    #[test]
    fn default_toolbars() {
        assert_eq!(InteractionMode::Stamping.default_toolbar(), Toolbar::Stamps);
        assert_eq!(InteractionMode::Drawing.default_toolbar(), Toolbar::Drawing);
        assert_eq!(InteractionMode::Full.default_toolbar(), Toolbar::Selection);
    }

    #[test]
    fn reachable_toolbars() {
        assert!(Toolbar::ALL.iter().all(|t| InteractionMode::Full.reaches(*t)));
        assert!(InteractionMode::Stamping.reaches(Toolbar::Stamps));
        assert!(!InteractionMode::Stamping.reaches(Toolbar::Text));
        assert!(!InteractionMode::Drawing.reaches(Toolbar::Shapes));
    }

    #[test]
    fn exactly_one_flag_after_transitions() {
        let mut flags = ToolbarFlags::default();
        assert_eq!(flags.count(), 0);
        assert_eq!(flags.current(), None);

        for toolbar in [Toolbar::Shapes, Toolbar::Text, Toolbar::Shapes, Toolbar::Selection] {
            flags.set_only(toolbar);
            assert_eq!(flags.count(), 1);
            assert!(flags.is_selected(toolbar));
            assert_eq!(flags.current(), Some(toolbar));
        }
    }
}
