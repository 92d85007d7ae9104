#![no_std]
#![no_main]

mod common;

use easy_nrf52::config::SERIAL_LINE_MAX;
use easy_nrf52::core::line::LineBuffer;
use proptest::prelude::*;

fn feed(buf: &mut LineBuffer, bytes: &[u8]) -> bool {
    bytes.iter().fold(false, |done, &b| buf.push(b) || done)
}

#[defmt_test::tests]
mod tests {
    use defmt::{assert, assert_eq};

    use super::*;
    use crate::common::*;

    #[init]
    fn init() {
        ensure_heap_initialized();
    }

    #[test]
    fn test_newline_completes_line() {
        let mut buf = LineBuffer::new();
        assert!(!feed(&mut buf, b"vers"));
        assert!(!buf.is_available());
        assert!(buf.push(b'\n'));
        assert_eq!(buf.line(), Some(&b"vers"[..]));
    }

    #[test]
    fn test_carriage_return_ignored() {
        let mut buf = LineBuffer::new();
        assert!(feed(&mut buf, b"sc\ran\r\n"));
        assert_eq!(buf.line(), Some(&b"scan"[..]));
    }

    #[test]
    fn test_input_dropped_while_line_pending() {
        let mut buf = LineBuffer::new();
        feed(&mut buf, b"mac\n");
        assert!(!feed(&mut buf, b"vers\n"));
        assert_eq!(buf.line(), Some(&b"mac"[..]));
    }

    #[test]
    fn test_take_into_resets() {
        let mut buf = LineBuffer::new();
        feed(&mut buf, b"help\n");
        let mut dest = [0u8; 16];
        assert_eq!(buf.take_into(&mut dest), 4);
        assert_eq!(buf_str(&dest), "help");
        assert!(!buf.is_available());
        assert!(buf.line().is_none());
        assert_eq!(buf.take_into(&mut dest), 0);
    }

    #[test]
    fn test_take_into_leaves_room_for_terminator() {
        let mut buf = LineBuffer::new();
        feed(&mut buf, b"abcdef\n");
        let mut dest = [0u8; 4];
        assert_eq!(buf.take_into(&mut dest), 3);
        assert_eq!(&dest[..3], b"abc");
    }

    #[test]
    fn test_full_buffer_completes_line() {
        let mut buf = LineBuffer::new();
        for _ in 0..SERIAL_LINE_MAX {
            assert!(!buf.push(b'x'));
        }
        assert!(buf.push(b'y'));
        let line = buf.line().unwrap();
        assert_eq!(line.len(), SERIAL_LINE_MAX);
        assert!(line.iter().all(|&b| b == b'x'));
    }

    #[test]
    fn test_empty_line() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(b'\n'));
        assert_eq!(buf.line(), Some(&b""[..]));
        buf.clear();
        assert!(!buf.is_available());
    }

    #[test]
    fn test_chunk_with_several_lines() {
        let mut buf = LineBuffer::new();
        let mut lines: heapless::Vec<heapless::Vec<u8, SERIAL_LINE_MAX>, 4> = heapless::Vec::new();
        let count = buf.feed(b"vers\r\nmac\nsc", |line| {
            let _ = lines.push(heapless::Vec::from_slice(line).unwrap());
        });
        assert_eq!(count, 2);
        assert_eq!(&lines[0][..], b"vers");
        assert_eq!(&lines[1][..], b"mac");
        assert!(!buf.is_available());

        let count = buf.feed(b"an\n", |line| {
            let _ = lines.push(heapless::Vec::from_slice(line).unwrap());
        });
        assert_eq!(count, 1);
        assert_eq!(&lines[2][..], b"scan");
    }

    #[test]
    fn test_chunk_overflow_starts_next_line() {
        let mut buf = LineBuffer::new();
        let mut chunk = [b'x'; SERIAL_LINE_MAX + 4];
        chunk[SERIAL_LINE_MAX + 1] = b'a';
        chunk[SERIAL_LINE_MAX + 2] = b'b';
        chunk[SERIAL_LINE_MAX + 3] = b'\n';
        let mut lengths: heapless::Vec<usize, 4> = heapless::Vec::new();
        let count = buf.feed(&chunk, |line| {
            let _ = lengths.push(line.len());
        });
        assert_eq!(count, 2);
        assert_eq!(&lengths[..], &[SERIAL_LINE_MAX, 2]);
    }

    proptest! {
        #[test]
        fn test_line_is_input_without_cr(text in prop::collection::vec(prop_oneof![Just(b'\r'), 0x20u8..0x7F], 0..60)) {
            let mut buf = LineBuffer::new();
            feed(&mut buf, &text);
            prop_assert!(buf.push(b'\n'));
            let expected: heapless::Vec<u8, 64> = text.iter().copied().filter(|&b| b != b'\r').collect();
            prop_assert_eq!(buf.line().unwrap(), &expected[..]);
        }
    }
}
