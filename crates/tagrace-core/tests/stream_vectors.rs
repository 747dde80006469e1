//! Stream message vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use tagrace_core::protocol::stream::{decode_message, StreamMessage};

use vector_loader::TestVector;

fn load(name: &str) -> TestVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}

#[test]
fn stream_vectors() {
    let files = [
        "tweet_hashtags.json",
        "tweet_extended.json",
        "stall_warning.json",
        "disconnect.json",
        "delete_notice.json",
        "not_json.json",
        "not_object.json",
    ];

    for f in files {
        let v = load(f);
        let res = decode_message(&v.bytes());

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.client_code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let msg = res.expect("expected ok message");
        let ex = v.expect.expect("missing expect block");
        assert_eq!(msg.kind(), ex["kind"].as_str().unwrap(), "vector={}", v.description);

        match msg {
            StreamMessage::Tweet(t) => {
                let want: Vec<String> = ex["hashtags"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|h| h.as_str().unwrap().to_string())
                    .collect();
                assert_eq!(t.hashtags, want, "vector={}", v.description);
                if let Some(id) = ex.get("id").and_then(|i| i.as_str()) {
                    assert_eq!(t.id.as_deref(), Some(id), "vector={}", v.description);
                }
            }
            StreamMessage::StallWarning(w) => {
                assert_eq!(w.code, ex["code"].as_str().unwrap(), "vector={}", v.description);
                assert_eq!(
                    w.percent_full.map(u64::from),
                    ex["percent_full"].as_u64(),
                    "vector={}",
                    v.description
                );
            }
            StreamMessage::Disconnect(d) => {
                assert_eq!(d.code.map(u64::from), ex["code"].as_u64(), "vector={}", v.description);
            }
            StreamMessage::Other => {}
        }
    }
}
