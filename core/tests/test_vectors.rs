//! Check script parsing and form decoding against JSON test vectors stored
//! in `test-vectors/`.
//!
//! Comparing parsed JSON values (not raw strings) avoids false negatives from
//! formatting differences.

use fetchp_core::script::parse_invocation;
use fetchp_core::FormData;

// ---------------------------------------------------------------------------
// Scripts
// ---------------------------------------------------------------------------

#[test]
fn script_test_vectors() {
    let raw = include_str!("../../test-vectors/scripts.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let source = case["source"].as_str().unwrap();
        let result = parse_invocation(source);

        if let Some(expected_error) = case.get("expected_error") {
            match expected_error.as_str().unwrap() {
                "NotAnInvocation" => assert!(result.is_none(), "{name}: expected no invocation"),
                other => panic!("{name}: unknown expected_error: {other}"),
            }
        } else {
            let inv = result.unwrap_or_else(|| panic!("{name}: expected an invocation"));
            assert_eq!(inv.callee, case["expected_callee"].as_str().unwrap(), "{name}: callee");
            assert_eq!(inv.argument.as_ref(), Some(&case["expected_argument"]), "{name}: argument");
        }
    }
}

// ---------------------------------------------------------------------------
// Form data
// ---------------------------------------------------------------------------

#[test]
fn form_test_vectors() {
    let raw = include_str!("../../test-vectors/form.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let form = FormData::decode(case["input"].as_str().unwrap());

        let expected: Vec<(String, String)> = case["expected"]
            .as_array()
            .unwrap()
            .iter()
            .map(|pair| {
                let arr = pair.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        let actual: Vec<(String, String)> = form
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(actual, expected, "{name}: fields");
    }
}
