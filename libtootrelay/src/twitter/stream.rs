//! Decoding of the newline-delimited user stream.
//!
//! Twitter writes one JSON object per `\r\n`-terminated line and sends blank
//! lines as keep-alives.

use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, warn};

use crate::error::TwitterError;
use crate::twitter::types::StreamMessage;

/// The user stream as seen by the daemon loop
pub type MessageStream =
    Pin<Box<dyn Stream<Item = Result<StreamMessage, TwitterError>> + Send>>;

/// Longest line kept while waiting for its terminator
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

struct Decoder<S> {
    chunks: S,
    buffer: Vec<u8>,
    /// Bytes of `buffer` already searched for a newline
    scanned: usize,
    /// Set while skipping the rest of an oversized line
    discarding: bool,
    finished: bool,
}

/// Turn a byte stream into stream messages.
///
/// Lines that are not valid JSON or do not fit the expected shape are logged
/// and skipped, as are lines longer than [`MAX_LINE_BYTES`]. A transport
/// error is yielded once and ends the stream.
pub fn decode_messages<S, E>(chunks: S) -> impl Stream<Item = Result<StreamMessage, TwitterError>>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Into<TwitterError>,
{
    let decoder = Decoder {
        chunks,
        buffer: Vec::new(),
        scanned: 0,
        discarding: false,
        finished: false,
    };

    stream::unfold(decoder, |mut decoder| async move {
        loop {
            let unscanned = &decoder.buffer[decoder.scanned..];
            if let Some(offset) = unscanned.iter().position(|&b| b == b'\n') {
                let end = decoder.scanned + offset;
                let line: Vec<u8> = decoder.buffer.drain(..=end).collect();
                decoder.scanned = 0;

                if decoder.discarding {
                    decoder.discarding = false;
                    continue;
                }
                match parse_line(&line) {
                    Some(message) => return Some((Ok(message), decoder)),
                    None => continue,
                }
            }
            decoder.scanned = decoder.buffer.len();

            if decoder.buffer.len() > MAX_LINE_BYTES {
                if !decoder.discarding {
                    warn!(limit = MAX_LINE_BYTES, "Dropping oversized stream message");
                }
                decoder.discarding = true;
                decoder.buffer.clear();
                decoder.scanned = 0;
            }

            if decoder.finished {
                // Flush a final unterminated line, if any
                let rest = std::mem::take(&mut decoder.buffer);
                if rest.is_empty() || decoder.discarding {
                    return None;
                }
                return parse_line(&rest).map(|message| (Ok(message), decoder));
            }

            match decoder.chunks.next().await {
                Some(Ok(chunk)) => decoder.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    decoder.buffer.clear();
                    decoder.scanned = 0;
                    decoder.finished = true;
                    return Some((Err(e.into()), decoder));
                }
                None => decoder.finished = true,
            }
        }
    })
}

/// Parse one line; `None` for keep-alives and undecodable lines.
fn parse_line(line: &[u8]) -> Option<StreamMessage> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();

    if text.is_empty() {
        debug!("Received keep-alive");
        return None;
    }

    let decoded = serde_json::from_str(text).and_then(StreamMessage::from_value);
    match decoded {
        Ok(message) => Some(message),
        Err(e) => {
            warn!(error = %e, data = %text, "Skipping undecodable stream message");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    const TWEET_LINE: &str = r#"{"id_str":"1","text":"hello","retweeted":false,"user":{"id_str":"7","screen_name":"alice"}}"#;

    fn chunks(parts: &[&str]) -> impl Stream<Item = Result<Bytes, TwitterError>> + Unpin {
        let owned: Vec<Result<Bytes, TwitterError>> = parts
            .iter()
            .map(|p| Ok(Bytes::from(p.to_string())))
            .collect();
        stream::iter(owned)
    }

    fn collect(parts: &[&str]) -> Vec<Result<StreamMessage, TwitterError>> {
        block_on(decode_messages(chunks(parts)).collect())
    }

    #[test]
    fn test_decodes_one_message_per_line() {
        let friends = "{\"friends\":[1,2]}\r\n";
        let tweet = format!("{}\r\n", TWEET_LINE);
        let messages = collect(&[friends, tweet.as_str()]);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].as_ref().unwrap().kind(), "friends");
        assert_eq!(messages[1].as_ref().unwrap().kind(), "tweet");
    }

    #[test]
    fn test_reassembles_lines_split_across_chunks() {
        let (head, tail) = TWEET_LINE.split_at(20);
        let tail = format!("{}\r\n", tail);
        let messages = collect(&[head, tail.as_str()]);

        assert_eq!(messages.len(), 1);
        match messages[0].as_ref().unwrap() {
            StreamMessage::Tweet(tweet) => assert_eq!(tweet.text, "hello"),
            other => panic!("Expected tweet, got {:?}", other),
        }
    }

    #[test]
    fn test_skips_keep_alives() {
        let tweet = format!("{}\r\n", TWEET_LINE);
        let messages = collect(&["\r\n", "\r\n", tweet.as_str(), "\r\n"]);

        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_skips_undecodable_lines() {
        let tweet = format!("{}\r\n", TWEET_LINE);
        let messages = collect(&["{not json\r\n", tweet.as_str()]);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].as_ref().unwrap().kind(), "tweet");
    }

    #[test]
    fn test_flushes_unterminated_final_line() {
        let messages = collect(&[TWEET_LINE]);
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn test_transport_error_ends_stream() {
        let tweet = format!("{}\r\n", TWEET_LINE);
        let parts: Vec<Result<Bytes, TwitterError>> = vec![
            Ok(Bytes::from(tweet.clone())),
            Err(TwitterError::Stream("connection reset".to_string())),
            Ok(Bytes::from(tweet)),
        ];
        let messages: Vec<_> = block_on(decode_messages(stream::iter(parts)).collect());

        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_ok());
        assert!(matches!(messages[1], Err(TwitterError::Stream(_))));
    }

    #[test]
    fn test_reassembles_byte_by_byte_chunks() {
        let line = format!("{}\r\n", TWEET_LINE);
        let parts: Vec<String> = line.chars().map(String::from).collect();
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        let messages = collect(&parts);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].as_ref().unwrap().kind(), "tweet");
    }

    #[test]
    fn test_drops_oversized_line_and_resumes() {
        let filler = "a".repeat(MAX_LINE_BYTES / 2 + 1);
        let tweet = format!("{}\r\n", TWEET_LINE);
        let messages = collect(&[
            filler.as_str(),
            filler.as_str(),
            filler.as_str(),
            "tail of the same line\r\n",
            tweet.as_str(),
        ]);

        assert_eq!(messages.len(), 1);
        match messages[0].as_ref().unwrap() {
            StreamMessage::Tweet(tweet) => assert_eq!(tweet.text, "hello"),
            other => panic!("Expected tweet, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_oversized_line_is_not_flushed() {
        let filler = "a".repeat(MAX_LINE_BYTES + 1);
        let messages = collect(&[filler.as_str()]);
        assert!(messages.is_empty());
    }

    #[test]
    fn test_empty_stream() {
        let messages = collect(&[]);
        assert!(messages.is_empty());
    }
}
