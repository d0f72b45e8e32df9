//! Shape and stamp menus.
//!
//! Both menus are lists of [`MenuEntry`] with a "checked" flag; clicking an
//! entry checks it and unchecks every other entry of the same menu.

use crate::mode::Toolbar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Line,
    Circle,
    Ellipse,
    Square,
    Rectangle,
    Triangle,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::Line,
        ShapeKind::Circle,
        ShapeKind::Ellipse,
        ShapeKind::Square,
        ShapeKind::Rectangle,
        ShapeKind::Triangle,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ShapeKind::Line => "Line",
            ShapeKind::Circle => "Circle",
            ShapeKind::Ellipse => "Ellipse",
            ShapeKind::Square => "Square",
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Triangle => "Triangle",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    /// Element id, e.g. `shapeLine`.
    pub fn id(self) -> String {
        format!("shape{}", self.label())
    }

    /// CSS classes, e.g. `toolbar-shape toolbar-shape-line`.
    pub fn class(self) -> String {
        format!(
            "toolbar-shape toolbar-shape-{}",
            self.label().to_lowercase()
        )
    }
}

/// What the next pointer-up on the Shapes or Stamps toolbar produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Shape(ShapeKind),
    /// Stamp key, see [`stamp_key`].
    Stamp(String),
}

impl MenuItem {
    pub fn toolbar(&self) -> Toolbar {
        match self {
            MenuItem::Shape(_) => Toolbar::Shapes,
            MenuItem::Stamp(_) => Toolbar::Stamps,
        }
    }
}

/// Which menu a click came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKind {
    Shapes,
    Stamps,
}

/// Stamp key: label lowercased, spaces replaced with `-`.
pub fn stamp_key(label: &str) -> String {
    label.to_lowercase().replace(' ', "-")
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuEntry {
    pub id: String,
    pub label: String,
    pub class: String,
    pub checked: bool,
    pub item: MenuItem,
    /// Stamp SVG source. Always `None` for shapes.
    pub svg: Option<String>,
}

impl MenuEntry {
    pub fn shape(kind: ShapeKind) -> Self {
        Self {
            id: kind.id(),
            label: kind.label().into(),
            class: kind.class(),
            checked: false,
            item: MenuItem::Shape(kind),
            svg: None,
        }
    }

    pub fn stamp(label: &str, svg: &str) -> Self {
        let key = stamp_key(label);
        Self {
            id: format!("stamp{key}"),
            label: label.into(),
            class: format!("toolbar-stamp toolbar-stamp-{key}"),
            checked: false,
            item: MenuItem::Stamp(key),
            svg: Some(svg.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Menu {
    entries: Vec<MenuEntry>,
}

impl Menu {
    /// The fixed shapes menu.
    pub fn shapes() -> Self {
        Self {
            entries: ShapeKind::ALL.into_iter().map(MenuEntry::shape).collect(),
        }
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&MenuEntry> {
        self.entries.last()
    }

    pub fn push(&mut self, entry: MenuEntry) {
        self.entries.push(entry);
    }

    /// Check the first entry labelled `label` and uncheck the rest.
    /// Returns its item. At most one entry is checked afterwards, even
    /// when labels repeat.
    pub fn resolve_click(&mut self, label: &str) -> Option<MenuItem> {
        let mut picked = None;
        for entry in &mut self.entries {
            entry.checked = picked.is_none() && entry.label == label;
            if entry.checked {
                picked = Some(entry.item.clone());
            }
        }
        picked
    }

    pub fn clear_checked(&mut self) {
        for entry in &mut self.entries {
            entry.checked = false;
        }
    }

    pub fn checked(&self) -> Option<&MenuEntry> {
        self.entries.iter().find(|e| e.checked)
    }

    /// SVG source of the stamp with `key`.
    pub fn find_stamp(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| matches!(&e.item, MenuItem::Stamp(k) if k == key))
            .and_then(|e| e.svg.as_deref())
    }
}
