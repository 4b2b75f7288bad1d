//! Stream iteration smoke program.
//!
//! Reads characters one at a time from an input stream, whitespace
//! included, until a newline or until the buffer is full.

use std::io::{self, BufRead, Read, Write};

use stdprobe_harness::{TestHarness, raise};
use thiserror::Error;

/// Characters read before stopping.
pub const BUFFER_LEN: usize = 5;

/// An input stream failed mid-iteration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stream read failed: {kind}")]
pub struct StreamFault {
    pub kind: io::ErrorKind,
}

/// Read up to `limit` bytes, stopping early at `'\n'` or end of input.
///
/// Whitespace other than the newline is kept. Invalid UTF-8 is replaced
/// lossily.
pub fn read_prefix<R: Read>(reader: R, limit: usize) -> io::Result<String> {
    let mut buffer = Vec::with_capacity(limit);
    let mut bytes = reader.bytes();
    while buffer.len() < limit {
        let Some(byte) = bytes.next() else {
            break;
        };
        let byte = byte?;
        if byte == b'\n' {
            break;
        }
        buffer.push(byte);
    }
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Like [`read_prefix`], but signals a [`StreamFault`] on I/O failure.
pub fn read_prefix_or_fault<R: Read>(reader: R, limit: usize) -> String {
    read_prefix(reader, limit).unwrap_or_else(|err| raise(StreamFault { kind: err.kind() }))
}

/// Run the interactive program: prompt on `out`, read from `input`, echo.
pub fn run<R: BufRead, W: Write>(input: R, out: &mut W) -> io::Result<String> {
    writeln!(out, "Beginning streamiter tests")?;
    writeln!(out, "please enter at least {} characters:", BUFFER_LEN + 1)?;
    out.flush()?;
    let read = read_prefix(input, BUFFER_LEN)?;
    writeln!(out, "Read: {read}")?;
    Ok(read)
}

/// A reader that fails every read with `kind`.
#[derive(Debug, Clone, Copy)]
pub struct FailingReader {
    pub kind: io::ErrorKind,
}

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(self.kind, "injected read failure"))
    }
}

/// Harness checks over the program's observable behavior.
pub fn check(h: &mut TestHarness) {
    h.assert_returns(
        || read_prefix(&b"abcdefgh\n"[..], BUFFER_LEN).ok(),
        Some("abcde".to_string()),
    );
    h.assert_returns(
        || read_prefix(&b"ab\ncdef"[..], BUFFER_LEN).ok(),
        Some("ab".to_string()),
    );
    h.assert_returns(
        || read_prefix(&b"a b c d"[..], BUFFER_LEN).ok(),
        Some("a b c".to_string()),
    );
    h.assert_returns(
        || read_prefix(&b""[..], BUFFER_LEN).ok(),
        Some(String::new()),
    );
    h.assert_returns(
        || {
            let reader = FailingReader {
                kind: io::ErrorKind::BrokenPipe,
            };
            read_prefix(reader, BUFFER_LEN).map_err(|err| err.kind())
        },
        Err(io::ErrorKind::BrokenPipe),
    );
    h.assert_throws::<StreamFault, _, _>(|| {
        read_prefix_or_fault(
            FailingReader {
                kind: io::ErrorKind::UnexpectedEof,
            },
            BUFFER_LEN,
        )
    });
    h.assert_returns(
        || {
            let mut out = Vec::new();
            run(&b"xyz\n"[..], &mut out).ok()?;
            String::from_utf8(out).ok()
        },
        Some(
            "Beginning streamiter tests\nplease enter at least 6 characters:\nRead: xyz\n"
                .to_string(),
        ),
    );
}
