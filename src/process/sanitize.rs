//! Output sanitisation for captured command streams

/// Maximum number of stderr bytes kept for error reporting
pub const MAX_STDERR_BYTES: usize = 512;

/// Truncation marker appended when stderr has been cut
const TRUNCATION_MARKER: &[u8] = b"...";

/// Remove carriage returns from captured output when `strip` is set.
///
/// The flag is `true` on Windows hosts, where command output uses CRLF line
/// endings and downstream parsers expect linefeed-delimited text. Taking the
/// flag as a parameter keeps the transform testable on any host.
pub fn remove_carriage_returns(bytes: Vec<u8>, strip: bool) -> Vec<u8> {
    if !strip {
        return bytes;
    }

    bytes.into_iter().filter(|b| *b != b'\r').collect()
}

/// Whether the current platform uses carriage-return line endings
pub fn platform_strips_carriage_returns() -> bool {
    cfg!(windows)
}

/// Truncate captured stderr for inclusion in error reports.
///
/// Two independent cuts apply: the buffer is capped at [`MAX_STDERR_BYTES`],
/// and anything past the first newline is dropped so only the first line
/// survives. A `...` marker is appended whenever content was lost. A newline
/// as the very last byte is trimmed without counting as lost content.
pub fn truncate_stderr(mut buf: Vec<u8>) -> Vec<u8> {
    let mut did_truncate = false;

    if buf.len() > MAX_STDERR_BYTES {
        buf.truncate(MAX_STDERR_BYTES);
        did_truncate = true;
    }

    if let Some(i) = buf.iter().position(|b| *b == b'\n') {
        if i > 0 {
            if i < buf.len() - 1 {
                did_truncate = true;
            }
            buf.truncate(i);
        }
    }

    if did_truncate {
        buf.extend_from_slice(TRUNCATION_MARKER);
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_under_cap_single_line() {
        let buf = b"short error".to_vec();
        assert_eq!(truncate_stderr(buf), b"short error".to_vec());
    }

    #[test]
    fn test_truncate_over_cap() {
        let buf = vec![b'x'; MAX_STDERR_BYTES + 100];
        let out = truncate_stderr(buf);
        assert_eq!(out.len(), MAX_STDERR_BYTES + 3);
        assert!(out.ends_with(b"..."));
        assert!(out[..MAX_STDERR_BYTES].iter().all(|b| *b == b'x'));
    }

    #[test]
    fn test_truncate_first_line_only() {
        let buf = b"first line\nsecond line\n".to_vec();
        assert_eq!(truncate_stderr(buf), b"first line...".to_vec());
    }

    #[test]
    fn test_trailing_newline_trimmed_without_marker() {
        let buf = b"only line\n".to_vec();
        assert_eq!(truncate_stderr(buf), b"only line".to_vec());
    }

    #[test]
    fn test_leading_newline_left_alone() {
        let buf = b"\n".to_vec();
        assert_eq!(truncate_stderr(buf), b"\n".to_vec());
    }

    #[test]
    fn test_truncate_over_cap_then_first_line() {
        let mut buf = vec![b'y'; 40];
        buf.push(b'\n');
        buf.extend(vec![b'z'; MAX_STDERR_BYTES]);
        let out = truncate_stderr(buf);
        let mut expected = vec![b'y'; 40];
        expected.extend_from_slice(b"...");
        assert_eq!(out, expected);
    }

    #[test]
    fn test_remove_carriage_returns_enabled() {
        let buf = b"line one\r\nline two\r\n".to_vec();
        assert_eq!(
            remove_carriage_returns(buf, true),
            b"line one\nline two\n".to_vec()
        );
    }

    #[test]
    fn test_remove_carriage_returns_disabled() {
        let buf = b"line one\r\n".to_vec();
        assert_eq!(remove_carriage_returns(buf, false), b"line one\r\n".to_vec());
    }
}
