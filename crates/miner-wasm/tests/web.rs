//! Browser-side tests, run with `wasm-pack test --headless --firefox`.

#![cfg(target_arch = "wasm32")]

use js_sys::{Array, Reflect};
use keccak_miner_wasm::miner::{verify_nonce, Miner};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn start_command(difficulty: u32) -> JsValue {
    let command = js_sys::Object::new();
    let set = |key: &str, value: JsValue| {
        Reflect::set(&command, &JsValue::from_str(key), &value).unwrap();
    };
    set("challengeId", JsValue::from_str("1"));
    set("claimantAddress", JsValue::from_str("0x0000000000000000000000000000000000000001"));
    set("referenceTimestamp", JsValue::from_f64(1000.0));
    set("chainId", JsValue::from_str("97"));
    set("difficulty", JsValue::from_f64(difficulty as f64));
    command.into()
}

fn get(value: &JsValue, key: &str) -> JsValue {
    Reflect::get(value, &JsValue::from_str(key)).unwrap()
}

#[wasm_bindgen_test]
fn unknown_scheme_is_rejected() {
    assert!(Miner::new("sha3").is_err());
}

#[wasm_bindgen_test]
fn batches_until_solution() {
    let mut miner = Miner::new("packed").unwrap();
    miner.set_start_nonce(0.0).unwrap();
    miner.set_progress_interval(0);
    miner.start(start_command(1)).unwrap();
    assert!(miner.is_mining());

    let mut solution = None;
    for _ in 0..100 {
        let report = miner.mine_batch(Some(64)).unwrap();
        let events: Array = get(&report, "events").into();
        if let Some(event) = events.iter().find(|e| get(e, "type") == "solution") {
            solution = Some(event);
            break;
        }
    }

    let solution = solution.expect("difficulty 1 should be solved within 6400 probes");
    assert!(!miner.is_mining());

    let nonce = get(&solution, "nonce").as_f64().unwrap();
    let digest = get(&solution, "digest").as_string().unwrap();
    assert!(digest.starts_with("0x00"));

    let check = miner.verify(nonce).unwrap();
    assert_eq!(get(&check, "valid"), JsValue::TRUE);
    assert_eq!(get(&check, "digest").as_string().unwrap(), digest);

    let check = verify_nonce(start_command(1), "packed", nonce).unwrap();
    assert_eq!(get(&check, "valid"), JsValue::TRUE);
}

#[wasm_bindgen_test]
fn stop_silences_batches() {
    let mut miner = Miner::new("two-stage").unwrap();
    miner.set_progress_interval(1);
    miner.start(start_command(32)).unwrap();
    miner.mine_batch(Some(10)).unwrap();

    miner.stop();
    miner.stop();

    let report = miner.mine_batch(Some(10)).unwrap();
    let events: Array = get(&report, "events").into();
    assert_eq!(events.length(), 0);
    assert_eq!(get(&report, "running"), JsValue::FALSE);
}

#[wasm_bindgen_test]
fn wide_address_is_rejected() {
    let mut miner = Miner::new("packed").unwrap();
    let command = start_command(1);
    Reflect::set(
        &command,
        &JsValue::from_str("claimantAddress"),
        &JsValue::from_str("0x000000000000000000000000000000000000000001"),
    )
    .unwrap();
    assert!(miner.start(command).is_err());
    assert!(!miner.is_mining());
}
