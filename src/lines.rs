//! Line and offset arithmetic over raw source text.
//!
//! All offsets are byte offsets into the original text. Every function here
//! clamps at the text boundaries instead of erroring; callers rely on that
//! when queries reach past the first or last line.

/// Move a byte position backward or forward by `num_lines` newline boundaries.
///
/// Negative `num_lines` walks backward one byte at a time, counting crossed
/// `\n` bytes, stopping when enough were crossed or the start of text is hit.
/// Positive values walk forward symmetrically. `trim_newline` steps one byte
/// back toward the origin afterwards so the boundary newline itself is
/// excluded from the resulting range; the step applies even when the walk
/// clamped at a text boundary. Zero is a no-op.
pub fn move_position_by_lines(
    code: &str,
    num_lines: i64,
    position: usize,
    trim_newline: bool,
) -> usize {
    let bytes = code.as_bytes();

    if num_lines < 0 {
        let mut remaining = num_lines.unsigned_abs();
        let mut pos = position.min(bytes.len()).saturating_sub(1);
        while pos > 0 && remaining > 0 {
            pos -= 1;
            if bytes[pos] == b'\n' {
                remaining -= 1;
            }
        }
        // step past the crossed newline so the range excludes it
        if trim_newline {
            pos += 1;
        }
        pos.min(bytes.len())
    } else if num_lines > 0 {
        let mut remaining = num_lines as u64;
        let mut pos = position.min(bytes.len()) + 1;
        while pos < bytes.len() && remaining > 0 {
            if bytes[pos] == b'\n' {
                remaining -= 1;
            }
            pos += 1;
        }
        if trim_newline {
            pos -= 1;
        }
        pos.min(bytes.len())
    } else {
        position.min(bytes.len())
    }
}

/// Widen a raw `[start, end)` range to full line boundaries.
///
/// `start` scans back to the byte after the nearest preceding newline (or 0),
/// preserving the matched line's indentation; `end` scans forward to the next
/// newline (or end of text). The bounding newlines are never included.
pub fn widen_to_line_bounds(code: &str, start: usize, end: usize) -> (usize, usize) {
    let bytes = code.as_bytes();

    let mut s = start.min(bytes.len());
    while s > 0 && bytes[s - 1] != b'\n' {
        s -= 1;
    }

    let mut e = end.min(bytes.len());
    while e < bytes.len() && bytes[e] != b'\n' {
        e += 1;
    }

    (s, e)
}

/// Step backward over the contiguous run of whitespace immediately before
/// `position`, landing right after the nearest non-whitespace byte (or at 0).
pub fn rewind_whitespace(code: &str, position: usize) -> usize {
    let bytes = code.as_bytes();
    let mut pos = position.min(bytes.len());
    while pos > 0 && matches!(bytes[pos - 1], b' ' | b'\t' | b'\n' | b'\r') {
        pos -= 1;
    }
    pos
}

/// 1-indexed line number of the byte offset `offset`.
pub fn line_of_offset(code: &str, offset: usize) -> usize {
    let clamped = offset.min(code.len());
    code.as_bytes()[..clamped].iter().filter(|&&b| b == b'\n').count() + 1
}
