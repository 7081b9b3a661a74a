mod behaviors;
mod dom;
mod error;
mod html;
mod page;
mod selector;

pub use behaviors::{
    ACCEPT_TERMS_MESSAGE, PASSWORD_MISMATCH_MESSAGE, REQUIRED_FIELDS, format_phone, install,
    install_phone_mask, install_registration_form, install_room_toggles,
    mismatch_warning_visible, required_field_message, room_key,
};
pub use error::{Error, Result};
pub use page::{Page, Submission};
