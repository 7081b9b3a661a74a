use std::collections::HashMap;

use crate::behaviors::HIDDEN_CLASS;
use crate::dom::{Dom, NodeId, is_checkbox_input};
use crate::error::Result;
use crate::page::{EventState, Page};

/// Required registration fields, in the order their errors are reported.
/// Declarative on purpose: validation iterates this table, not the markup.
pub const REQUIRED_FIELDS: [(&str, &str); 8] = [
    ("nome_completo", "Nome Completo"),
    ("cro", "Número do CRO"),
    ("cpf", "CPF"),
    ("whatsapp", "WhatsApp"),
    ("data_nascimento", "Data de Nascimento"),
    ("email", "E-mail"),
    ("password", "Senha"),
    ("password2", "Confirmação de Senha"),
];

pub const PASSWORD_MISMATCH_MESSAGE: &str = "As senhas não conferem.";
pub const ACCEPT_TERMS_MESSAGE: &str = "Você precisa aceitar os termos de uso.";

pub fn required_field_message(label: &str) -> String {
    format!("O campo \"{label}\" é obrigatório.")
}

/// The live warning is shown iff the confirmation differs from the password
/// and is non-empty.
pub fn mismatch_warning_visible(password: &str, confirm: &str) -> bool {
    password != confirm && !confirm.is_empty()
}

pub(crate) fn refresh_mismatch_warning(
    page: &mut Page,
    password: NodeId,
    confirm: NodeId,
    warning: NodeId,
) -> Result<()> {
    let password_value = page.dom.value(password)?;
    let confirm_value = page.dom.value(confirm)?;
    if mismatch_warning_visible(&password_value, &confirm_value) {
        page.dom.class_remove(warning, HIDDEN_CLASS)
    } else {
        page.dom.class_add(warning, HIDDEN_CLASS)
    }
}

pub(crate) fn collect_errors(dom: &Dom, form: NodeId) -> Vec<String> {
    let mut errors = Vec::new();

    for (name, label) in REQUIRED_FIELDS {
        // A field absent from the markup is skipped, not reported.
        let Some(field) = dom.form_control_by_name(form, name) else {
            continue;
        };
        let value = dom.element(field).map(|e| e.value.clone()).unwrap_or_default();
        if value.trim().is_empty() {
            errors.push(required_field_message(label));
        }
    }

    if field_value(dom, form, "password") != field_value(dom, form, "password2") {
        errors.push(PASSWORD_MISMATCH_MESSAGE.to_string());
    }

    let terms_accepted = dom
        .form_control_by_name(form, "accept_terms")
        .map(|field| is_checkbox_input(dom, field) && dom.element(field).is_some_and(|e| e.checked))
        .unwrap_or(false);
    if !terms_accepted {
        errors.push(ACCEPT_TERMS_MESSAGE.to_string());
    }

    errors
}

fn field_value(dom: &Dom, form: NodeId, name: &str) -> String {
    dom.form_control_by_name(form, name)
        .and_then(|field| dom.element(field))
        .map(|element| element.value.clone())
        .unwrap_or_default()
}

pub(crate) fn intercept_submit(page: &mut Page, form: NodeId, event: &mut EventState) -> Result<()> {
    // The intercepted path always blocks the default submission; the raw
    // path below is the only way a valid attempt goes out.
    event.prevent_default();

    let errors = collect_errors(&page.dom, form);
    if errors.is_empty() {
        return page.submit_form_native(form);
    }

    let (Some(list), Some(modal)) = (page.dom.by_id("error-list"), page.dom.by_id("error-modal"))
    else {
        return Ok(());
    };

    page.dom.remove_children(list);
    for message in &errors {
        let item = page.dom.create_element(list, "li".to_string(), HashMap::new());
        page.dom.set_text_content(item, message)?;
    }
    page.dom.class_remove(modal, HIDDEN_CLASS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_rule_tracks_confirmation_field_only() {
        assert!(!mismatch_warning_visible("", ""));
        assert!(!mismatch_warning_visible("abc", ""));
        assert!(!mismatch_warning_visible("abc", "abc"));
        assert!(mismatch_warning_visible("abc", "abd"));
        assert!(mismatch_warning_visible("", "abc"));
    }

    #[test]
    fn required_field_message_quotes_the_label() {
        assert_eq!(
            required_field_message("Nome Completo"),
            "O campo \"Nome Completo\" é obrigatório."
        );
    }
}
