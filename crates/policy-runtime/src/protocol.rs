//! # Line Protocol Loop
//!
//! ```text
//! stdin ──line──→ parse_line ──Request──→ Pipeline ──reply──→ stdout (flushed)
//!                     │
//!                     ├── Ignored / Blank ──→ (no reply)
//!                     ├── Malformed, id recovered ──→ reject "error: malformed request"
//!                     └── Malformed, no id ──→ (skipped, counted)
//! ```
//!
//! Requests are handled strictly one at a time: the next line is not read
//! until the previous reply is flushed. Lines are read as raw bytes so that a
//! line with invalid UTF-8 is skipped like any other undecodable line.

use shared_types::{parse_line, InboundLine, PolicyReply, ProtocolError};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::policies::Pipeline;

/// Reject message sent for a malformed request whose event id is known.
pub const MALFORMED_REQUEST: &str = "error: malformed request";

/// Line counts for one loop run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopReport {
    pub lines: u64,
    pub replies: u64,
    pub ignored: u64,
    pub malformed: u64,
}

/// Serves requests from `reader` until EOF.
///
/// Only I/O errors on the host streams end the loop early.
pub async fn serve<R, W>(mut reader: R, mut writer: W, pipeline: &mut Pipeline) -> io::Result<LoopReport>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut report = LoopReport::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        report.lines += 1;

        let inbound = match std::str::from_utf8(&buf) {
            Ok(line) => parse_line(line),
            Err(e) => InboundLine::Malformed {
                event_id: None,
                error: ProtocolError::InvalidUtf8(e.to_string()),
            },
        };

        let reply = match inbound {
            InboundLine::Request(request) => pipeline.evaluate(&request).await,
            InboundLine::Blank => continue,
            InboundLine::Ignored { request_type } => {
                report.ignored += 1;
                debug!(request_type = %request_type, "Ignoring non-decision request");
                continue;
            }
            InboundLine::Malformed { event_id, error } => {
                report.malformed += 1;
                vg_telemetry::record_malformed_line();
                match event_id {
                    Some(id) => {
                        warn!(id = %id, error = %error, "Malformed request; rejecting");
                        PolicyReply::reject(id, MALFORMED_REQUEST)
                    }
                    None => {
                        warn!(error = %error, "Malformed request without event id; skipping");
                        continue;
                    }
                }
            }
        };

        write_reply(&mut writer, &reply).await?;
        vg_telemetry::record_decision(reply.action.as_str());
        report.replies += 1;
    }

    debug!(lines = report.lines, replies = report.replies, "Host closed input");
    Ok(report)
}

async fn write_reply<W>(writer: &mut W, reply: &PolicyReply) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = reply.to_line().map_err(io::Error::other)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::AllowListPolicy;
    use shared_types::{Action, PolicyReply};

    async fn run(input: &str, pipeline: &mut Pipeline) -> (Vec<PolicyReply>, LoopReport) {
        let mut output = Vec::new();
        let report = serve(input.as_bytes(), &mut output, pipeline).await.unwrap();
        let replies = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        (replies, report)
    }

    fn new_line(id: &str, kind: u32) -> String {
        format!(
            r#"{{"type":"new","event":{{"id":"{id}","pubkey":"abc","kind":{kind},"created_at":1,"tags":[],"content":"hi","sig":"s"}},"receivedAt":1,"sourceType":"IP4","sourceInfo":"127.0.0.1"}}"#
        )
    }

    #[tokio::test]
    async fn test_one_reply_per_new_request_in_order() {
        let mut pipeline = Pipeline::new().with(AllowListPolicy::default());
        let input = format!("{}\n{}\n{}\n", new_line("a", 1), new_line("b", 9735), new_line("c", 7));

        let (replies, report) = run(&input, &mut pipeline).await;

        assert_eq!(
            replies,
            vec![
                PolicyReply::accept("a"),
                PolicyReply::reject("b", "blocked: not authorized"),
                PolicyReply::accept("c"),
            ]
        );
        assert_eq!(report.replies, 3);
    }

    #[tokio::test]
    async fn test_non_new_and_blank_lines_get_no_reply() {
        let mut pipeline = Pipeline::new();
        let input = format!(
            "\n   \n{}\n{}\n",
            r#"{"type":"lookback","event":{"id":"x"}}"#,
            new_line("a", 1)
        );

        let (replies, report) = run(&input, &mut pipeline).await;

        assert_eq!(replies, vec![PolicyReply::accept("a")]);
        assert_eq!(report.ignored, 1);
        assert_eq!(report.lines, 4);
    }

    #[tokio::test]
    async fn test_malformed_lines_do_not_stop_the_loop() {
        let mut pipeline = Pipeline::new();
        let input = format!(
            "{}\n{}\n{}\n",
            "not json at all",
            r#"{"type":"new","event":{"id":"bad","kind":"one"}}"#,
            new_line("a", 1)
        );

        let (replies, report) = run(&input, &mut pipeline).await;

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].id, "bad");
        assert_eq!(replies[0].action, Action::Reject);
        assert_eq!(replies[0].msg, MALFORMED_REQUEST);
        assert_eq!(replies[1], PolicyReply::accept("a"));
        assert_eq!(report.malformed, 2);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_skipped() {
        let mut pipeline = Pipeline::new();
        let mut input = br#"{"type":"new","event":{"id":"bad","content":""#.to_vec();
        input.extend_from_slice(b"\xff\xfe\"}}\n");
        input.extend_from_slice(new_line("a", 1).as_bytes());
        input.push(b'\n');

        let mut output = Vec::new();
        let report = serve(input.as_slice(), &mut output, &mut pipeline).await.unwrap();

        let replies: Vec<PolicyReply> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(replies, vec![PolicyReply::accept("a")]);
        assert_eq!(report.lines, 2);
        assert_eq!(report.malformed, 1);
    }

    #[tokio::test]
    async fn test_decisions_reach_final_metrics() {
        let _ = vg_telemetry::register_metrics();
        let mut pipeline = Pipeline::new().with(AllowListPolicy::default());
        run(&format!("{}\n", new_line("z", 9735)), &mut pipeline).await;

        let text = vg_telemetry::encode_metrics().unwrap();
        assert!(text.contains("vg_policy_decisions_total{action=\"reject\"}"));
    }

    #[tokio::test]
    async fn test_crlf_line_endings_are_accepted() {
        let mut pipeline = Pipeline::new();
        let input = format!("{}\r\n", new_line("a", 1));
        let (replies, _) = run(&input, &mut pipeline).await;
        assert_eq!(replies, vec![PolicyReply::accept("a")]);
    }

    #[tokio::test]
    async fn test_final_line_without_newline_is_served() {
        let mut pipeline = Pipeline::new();
        let (replies, _) = run(&new_line("last", 1), &mut pipeline).await;
        assert_eq!(replies, vec![PolicyReply::accept("last")]);
    }
}
