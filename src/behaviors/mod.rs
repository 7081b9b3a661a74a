mod phone;
mod registration;
mod rooms;

pub use phone::format_phone;
pub use registration::{
    ACCEPT_TERMS_MESSAGE, PASSWORD_MISMATCH_MESSAGE, REQUIRED_FIELDS, mismatch_warning_visible,
    required_field_message,
};
pub use rooms::room_key;

use crate::dom::NodeId;
use crate::error::Result;
use crate::page::{EventState, Page};

pub(crate) const HIDDEN_CLASS: &str = "hidden";

/// A page behavior registered on a single element for a single event type.
///
/// Behaviors are plain data so the listener store stays cloneable and
/// re-registration of the same wiring can be deduped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Behavior {
    FormatPhone,
    CheckPasswordMatch {
        password: NodeId,
        confirm: NodeId,
        warning: NodeId,
    },
    ValidateRegistration {
        form: NodeId,
    },
    HideErrorModal {
        modal: NodeId,
    },
    ToggleRoomSlots,
}

pub(crate) fn run(page: &mut Page, behavior: &Behavior, event: &mut EventState) -> Result<()> {
    match behavior {
        Behavior::FormatPhone => phone::reformat_target(page, event.target()),
        Behavior::CheckPasswordMatch {
            password,
            confirm,
            warning,
        } => registration::refresh_mismatch_warning(page, *password, *confirm, *warning),
        Behavior::ValidateRegistration { form } => registration::intercept_submit(page, *form, event),
        Behavior::HideErrorModal { modal } => page.dom.class_add(*modal, HIDDEN_CLASS),
        Behavior::ToggleRoomSlots => rooms::apply_toggle(page, event.target()),
    }
}

/// Wires every page behavior whose collaborator markup is present. Each
/// feature is independent; missing elements disable that feature silently.
pub fn install(page: &mut Page) -> Result<()> {
    install_phone_mask(page)?;
    install_registration_form(page)?;
    install_room_toggles(page)?;
    Ok(())
}

pub fn install_phone_mask(page: &mut Page) -> Result<()> {
    if let Some(input) = page.dom.by_id("whatsapp-input") {
        page.add_behavior(input, "input", Behavior::FormatPhone);
    }
    Ok(())
}

pub fn install_registration_form(page: &mut Page) -> Result<()> {
    let Some(form) = page.dom.by_id("register-form") else {
        return Ok(());
    };

    if let (Some(password), Some(confirm), Some(warning)) = (
        page.dom.by_id("password"),
        page.dom.by_id("password2"),
        page.dom.by_id("password-match-error"),
    ) {
        let check = Behavior::CheckPasswordMatch {
            password,
            confirm,
            warning,
        };
        page.add_behavior(password, "input", check.clone());
        page.add_behavior(confirm, "input", check);
    }

    page.add_behavior(form, "submit", Behavior::ValidateRegistration { form });

    if let (Some(close_btn), Some(modal)) = (
        page.dom.by_id("close-modal-btn"),
        page.dom.by_id("error-modal"),
    ) {
        page.add_behavior(close_btn, "click", Behavior::HideErrorModal { modal });
    }

    Ok(())
}

/// Safe to call again after rooms are added to the markup; toggles that are
/// already wired are left alone.
pub fn install_room_toggles(page: &mut Page) -> Result<()> {
    let toggles = page.dom.query_selector_all(".toggle-horarios")?;
    for toggle in toggles {
        page.add_behavior(toggle, "change", Behavior::ToggleRoomSlots);
    }
    Ok(())
}
