#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use tagrace_core::protocol::frame::LineFramer;

#[test]
fn splits_crlf_lines_across_chunks() {
    let mut f = LineFramer::default();
    f.push(b"{\"a\":1}\r\n{\"b\"");
    assert_eq!(f.next_line().unwrap().unwrap().as_ref(), b"{\"a\":1}");
    assert!(f.next_line().unwrap().is_none());

    f.push(b":2}\r\n");
    assert_eq!(f.next_line().unwrap().unwrap().as_ref(), b"{\"b\":2}");
    assert!(f.next_line().unwrap().is_none());
    assert_eq!(f.pending(), 0);
}

#[test]
fn skips_keep_alive_lines() {
    let mut f = LineFramer::default();
    f.push(b"\r\n\r\n\n{\"x\":0}\n\r\n");
    assert_eq!(f.next_line().unwrap().unwrap().as_ref(), b"{\"x\":0}");
    assert!(f.next_line().unwrap().is_none());
}

#[test]
fn oversized_partial_line_is_dropped() {
    let mut f = LineFramer::new(8);
    f.push(b"0123456789");
    let err = f.next_line().expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "STREAM_FAILED");
    assert_eq!(f.pending(), 0);

    f.push(b"ok\n");
    assert_eq!(f.next_line().unwrap().unwrap().as_ref(), b"ok");
}

#[test]
fn oversized_complete_line_is_dropped() {
    let mut f = LineFramer::new(8);
    f.push(b"0123456789abcdef\r\nok\r\n");
    let err = f.next_line().expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "STREAM_FAILED");
    assert_eq!(f.next_line().unwrap().unwrap().as_ref(), b"ok");
    assert!(f.next_line().unwrap().is_none());
}

#[test]
fn line_at_the_cap_passes() {
    let mut f = LineFramer::new(8);
    f.push(b"01234567\r\n");
    assert_eq!(f.next_line().unwrap().unwrap().as_ref(), b"01234567");
}

#[test]
fn line_trickled_in_small_chunks() {
    let mut f = LineFramer::new(64);
    let chunks: [&[u8]; 5] = [b"{\"te", b"xt\":", b"\"hi\"", b"}\r", b"\n{"];
    for chunk in chunks {
        f.push(chunk);
        if chunk.contains(&b'\n') {
            assert_eq!(f.next_line().unwrap().unwrap().as_ref(), b"{\"text\":\"hi\"}");
        }
        assert!(f.next_line().unwrap().is_none());
    }
    assert_eq!(f.pending(), 1);

    f.push(b"}\n");
    assert_eq!(f.next_line().unwrap().unwrap().as_ref(), b"{}");
}
