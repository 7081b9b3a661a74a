use booking_forms::{Error, Page, Result};

#[test]
fn unclosed_list_items_still_produce_siblings() -> Result<()> {
    let page = Page::from_html(
        r#"
        <ul id="error-list">
          <li>primeiro
          <li>segundo
        </ul>
        "#,
    )?;

    let items = page.texts("#error-list li")?;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].trim(), "primeiro");
    assert_eq!(items[1].trim(), "segundo");
    Ok(())
}

#[test]
fn comments_doctype_and_entities_are_handled() -> Result<()> {
    let page = Page::from_html(
        r#"
        <!DOCTYPE html>
        <!-- cabe&ccedil;alho -->
        <p id="msg">Jo&atilde;o &amp; Maria &lt;3</p>
        "#,
    )?;

    // Unknown named entities pass through untouched; known ones decode.
    page.assert_text("#msg", "Jo&atilde;o & Maria <3")?;
    Ok(())
}

#[test]
fn bare_attributes_read_as_boolean_flags() -> Result<()> {
    let page = Page::from_html(r#"<input id="terms" type="checkbox" checked disabled>"#)?;
    page.assert_checked("#terms", true)?;
    Ok(())
}

#[test]
fn typing_into_disabled_or_readonly_inputs_is_ignored() -> Result<()> {
    let mut page = Page::from_html(
        r#"
        <input id="frozen" value="fixo" disabled>
        <input id="sealed" value="selado" readonly>
        "#,
    )?;

    page.type_text("#frozen", "novo")?;
    page.type_text("#sealed", "novo")?;

    page.assert_value("#frozen", "fixo")?;
    page.assert_value("#sealed", "selado")?;
    Ok(())
}

#[test]
fn script_bodies_are_inert_text() -> Result<()> {
    let page = Page::from_html(
        r#"
        <div id="alvo">antes</div>
        <script>document.getElementById("alvo").textContent = "depois";</script>
        "#,
    )?;

    page.assert_text("#alvo", "antes")?;
    Ok(())
}

#[test]
fn textarea_values_come_from_their_text() -> Result<()> {
    let page = Page::from_html(r#"<textarea id="obs" name="obs">anotado</textarea>"#)?;
    page.assert_value("#obs", "anotado")?;
    Ok(())
}

#[test]
fn selector_groups_and_attribute_selectors_match() -> Result<()> {
    let page = Page::from_html(
        r#"
        <form id="register-form">
          <input type="text" name="cpf" value="1">
          <input type="text" name="cro" value="2">
        </form>
        "#,
    )?;

    page.assert_value("input[name=cpf]", "1")?;
    page.assert_value(r#"input[name="cro"]"#, "2")?;
    page.assert_exists("#register-form input, #register-form textarea")?;
    Ok(())
}

#[test]
fn unsupported_selector_syntax_is_reported() -> Result<()> {
    let page = Page::from_html("<div></div>")?;
    match page.assert_exists("div > span") {
        Err(Error::UnsupportedSelector(selector)) => assert_eq!(selector, "div > span"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    Ok(())
}

#[test]
fn missing_selector_is_reported() -> Result<()> {
    let page = Page::from_html("<div></div>")?;
    match page.assert_exists("#nao-existe") {
        Err(Error::SelectorNotFound(selector)) => assert_eq!(selector, "#nao-existe"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    Ok(())
}

#[test]
fn typing_into_a_non_input_is_a_type_mismatch() -> Result<()> {
    let mut page = Page::from_html(r#"<div id="caixa"></div>"#)?;
    match page.type_text("#caixa", "oi") {
        Err(Error::TypeMismatch { actual, .. }) => assert_eq!(actual, "div"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    Ok(())
}

#[test]
fn assertion_failures_carry_a_dom_snippet() -> Result<()> {
    let page = Page::from_html(r#"<p id="msg">real</p>"#)?;
    match page.assert_text("#msg", "esperado") {
        Err(Error::AssertionFailed {
            expected,
            actual,
            dom_snippet,
            ..
        }) => {
            assert_eq!(expected, "esperado");
            assert_eq!(actual, "real");
            assert!(dom_snippet.contains("real"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    Ok(())
}

#[test]
fn appended_fragments_are_reachable_by_id() -> Result<()> {
    let mut page = Page::from_html(r#"<section id="salas"></section>"#)?;
    page.append_html("#salas", r#"<div id="nova-sala">Sala 3</div>"#)?;
    page.assert_text("#nova-sala", "Sala 3")?;
    Ok(())
}

#[test]
fn trace_records_events_and_native_submissions() -> Result<()> {
    let mut page = Page::from_html(
        r#"<form id="register-form" action="/auth/register" method="post"></form>"#,
    )?;
    page.enable_trace(true);

    page.dispatch("#register-form", "submit")?;
    page.submit_native("#register-form")?;

    let logs = page.take_trace_logs();
    assert!(logs.iter().any(|line| line.starts_with("[event] submit")));
    assert!(
        logs.iter()
            .any(|line| line.starts_with("[submit] native action=/auth/register"))
    );
    Ok(())
}

#[test]
fn trace_log_limit_drops_the_oldest_lines() -> Result<()> {
    let mut page = Page::from_html(r#"<button id="b">ok</button>"#)?;
    page.enable_trace(true);
    page.set_trace_log_limit(2)?;

    for _ in 0..5 {
        page.dispatch("#b", "click")?;
    }

    assert_eq!(page.take_trace_logs().len(), 2);
    Ok(())
}
