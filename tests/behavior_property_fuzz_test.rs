use booking_forms::{Page, format_phone, mismatch_warning_visible};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::{FileFailurePersistence, TestCaseResult};

const BEHAVIOR_PROPTEST_REGRESSION_FILE: &str =
    "tests/proptest-regressions/behavior_property_fuzz_test.txt";
const DEFAULT_BEHAVIOR_PROPTEST_CASES: u32 = 128;

fn behavior_proptest_cases() -> u32 {
    std::env::var("BOOKING_FORMS_PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_BEHAVIOR_PROPTEST_CASES)
}

fn digit_string_strategy() -> BoxedStrategy<String> {
    vec(proptest::char::range('0', '9'), 0..=14)
        .prop_map(|digits| digits.into_iter().collect())
        .boxed()
}

fn raw_phone_strategy() -> BoxedStrategy<String> {
    vec(
        prop_oneof![
            proptest::char::range('0', '9'),
            Just('('),
            Just(')'),
            Just('-'),
            Just(' '),
            Just('+'),
            Just('.'),
            Just('a'),
        ],
        0..=20,
    )
    .prop_map(|chars| chars.into_iter().collect())
    .boxed()
}

fn password_strategy() -> BoxedStrategy<String> {
    vec(proptest::char::range('a', 'f'), 0..=4)
        .prop_map(|chars| chars.into_iter().collect())
        .boxed()
}

fn expected_format(digits: &str) -> String {
    let mut out = String::new();
    if !digits.is_empty() {
        out.push('(');
        out.push_str(&digits[..digits.len().min(2)]);
    }
    if digits.len() > 2 {
        out.push_str(") ");
        out.push_str(&digits[2..digits.len().min(7)]);
    }
    if digits.len() > 7 {
        out.push('-');
        out.push_str(&digits[7..digits.len().min(11)]);
    }
    out
}

fn assert_password_warning_matches_rule(password: &str, confirm: &str) -> TestCaseResult {
    let html = r#"
    <form id="register-form">
      <input type="password" name="password" id="password">
      <input type="password" name="password2" id="password2">
      <p id="password-match-error" class="hidden">As senhas não conferem.</p>
    </form>
    "#;
    let mut page = Page::open(html)
        .map_err(|err| proptest::test_runner::TestCaseError::fail(format!("{err:?}")))?;

    page.type_text("#password", password)
        .map_err(|err| proptest::test_runner::TestCaseError::fail(format!("{err:?}")))?;
    page.type_text("#password2", confirm)
        .map_err(|err| proptest::test_runner::TestCaseError::fail(format!("{err:?}")))?;

    let hidden = page
        .is_hidden("#password-match-error")
        .map_err(|err| proptest::test_runner::TestCaseError::fail(format!("{err:?}")))?;
    prop_assert_eq!(hidden, !mismatch_warning_visible(password, confirm));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: behavior_proptest_cases(),
        failure_persistence: Some(Box::new(
            FileFailurePersistence::Direct(BEHAVIOR_PROPTEST_REGRESSION_FILE),
        )),
        .. ProptestConfig::default()
    })]

    #[test]
    fn formatting_matches_the_concatenation_rule(digits in digit_string_strategy()) {
        let formatted = format_phone(&digits).map_err(|err| {
            proptest::test_runner::TestCaseError::fail(format!("{err:?}"))
        })?;
        prop_assert_eq!(formatted, expected_format(&digits));
    }

    #[test]
    fn formatting_is_idempotent_on_its_own_output(raw in raw_phone_strategy()) {
        let once = format_phone(&raw).map_err(|err| {
            proptest::test_runner::TestCaseError::fail(format!("{err:?}"))
        })?;
        let twice = format_phone(&once).map_err(|err| {
            proptest::test_runner::TestCaseError::fail(format!("{err:?}"))
        })?;
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn warning_visibility_equals_the_mismatch_rule(
        password in password_strategy(),
        confirm in password_strategy(),
    ) {
        assert_password_warning_matches_rule(&password, &confirm)?;
    }
}
