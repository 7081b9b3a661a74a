use crate::behaviors::HIDDEN_CLASS;
use crate::dom::NodeId;
use crate::error::Result;
use crate::page::Page;

const LONG_SLOTS_PREFIX: &str = "slots-2h30-";
const SHORT_SLOTS_PREFIX: &str = "slots-1h15-";

/// Room key of a toggle id: the substring after the last `-`
/// (`toggle-horarios-12` -> `12`).
pub fn room_key(toggle_id: &str) -> &str {
    toggle_id.rsplit('-').next().unwrap_or(toggle_id)
}

pub(crate) fn apply_toggle(page: &mut Page, toggle: NodeId) -> Result<()> {
    let toggle_id = page.dom.attr(toggle, "id").unwrap_or_default();
    let key = room_key(&toggle_id);

    let long_slots = page.dom.by_id(&format!("{LONG_SLOTS_PREFIX}{key}"));
    let short_slots = page.dom.by_id(&format!("{SHORT_SLOTS_PREFIX}{key}"));

    // Both containers or nothing: a half-wired room is left untouched.
    let (Some(long_slots), Some(short_slots)) = (long_slots, short_slots) else {
        return Ok(());
    };

    if page.dom.checked(toggle)? {
        page.dom.class_add(long_slots, HIDDEN_CLASS)?;
        page.dom.class_remove(short_slots, HIDDEN_CLASS)
    } else {
        page.dom.class_remove(long_slots, HIDDEN_CLASS)?;
        page.dom.class_add(short_slots, HIDDEN_CLASS)
    }
}
