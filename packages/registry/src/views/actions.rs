//! Navigation actions and which of them a viewer may see.
//!
//! Actions never mutate anything in place; each one resolves to a [`Navigation`]
//! target that the hosting app maps to a route.

use backend::Family;

/// Where an action leads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Navigation {
    Families,
    FamilyDetail(i64),
    /// The add-member flow, optionally pre-filled with a family.
    AddMember(Option<i64>),
    Login,
}

/// Per-row actions in the families table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RowAction {
    ViewFamily,
    AddMember,
}

impl RowAction {
    pub fn label(&self) -> &'static str {
        match self {
            RowAction::ViewFamily => "View Family",
            RowAction::AddMember => "Add Member",
        }
    }

    pub fn target(&self, family_id: i64) -> Navigation {
        match self {
            RowAction::ViewFamily => Navigation::FamilyDetail(family_id),
            RowAction::AddMember => Navigation::AddMember(Some(family_id)),
        }
    }
}

const ADMIN_ROW_ACTIONS: &[RowAction] = &[RowAction::ViewFamily, RowAction::AddMember];

/// Row actions available to the viewer. Empty unless admin.
pub fn visible_actions(is_admin: bool) -> &'static [RowAction] {
    if is_admin {
        ADMIN_ROW_ACTIONS
    } else {
        &[]
    }
}

/// Page-level actions outside the table rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PageAction {
    AddFamily,
    AddMember(i64),
    BackToFamilies,
}

impl PageAction {
    pub fn label(&self) -> &'static str {
        match self {
            PageAction::AddFamily => "Add New Family",
            PageAction::AddMember(_) => "Add Member",
            PageAction::BackToFamilies => "Back to Families",
        }
    }

    pub fn target(&self) -> Navigation {
        match self {
            PageAction::AddFamily => Navigation::AddMember(None),
            PageAction::AddMember(id) => Navigation::AddMember(Some(*id)),
            PageAction::BackToFamilies => Navigation::Families,
        }
    }
}

pub fn families_toolbar(is_admin: bool) -> Vec<PageAction> {
    if is_admin {
        vec![PageAction::AddFamily]
    } else {
        Vec::new()
    }
}

/// Header actions of the family detail page. "Add Member" needs a loaded family.
pub fn family_detail_toolbar(family: Option<&Family>, is_admin: bool) -> Vec<PageAction> {
    let mut actions = vec![PageAction::BackToFamilies];
    if let (Some(family), true) = (family, is_admin) {
        actions.push(PageAction::AddMember(family.id));
    }
    actions
}
