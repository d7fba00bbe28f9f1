//! Session State Machine Tests
//!
//! These tests verify:
//! - Greeting handling and version parsing
//! - Response buffering and terminators
//! - Error lines
//! - Command list batching
//! - Disconnect behavior

use mpdwire::protocol::{Grammar, LineFramer, ProtocolVersion, Response};
use mpdwire::session::{Framing, ReplyHandle, Session, SessionState};
use mpdwire::{MpdError, ServerAck};

// =============================================================================
// Helper Functions
// =============================================================================

fn ready_session() -> Session {
    let mut session = Session::new();
    session.on_line("OK MPD 0.23.5".to_string()).unwrap();
    session
}

fn feed(session: &mut Session, raw: &[&str]) {
    for line in raw {
        session.on_line(line.to_string()).unwrap();
    }
}

fn take(handle: &ReplyHandle) -> mpdwire::Result<Response> {
    handle.try_take().expect("reply should be resolved")
}

fn command_text(reply: mpdwire::Result<Response>) -> String {
    match reply {
        Err(MpdError::Command { text }) => text,
        other => panic!("Expected command error, got {:?}", other),
    }
}

// =============================================================================
// Greeting Tests
// =============================================================================

#[test]
fn test_greeting_sets_version() {
    let mut session = Session::new();
    assert_eq!(session.state(), &SessionState::AwaitingGreeting);
    assert!(!session.is_ready());

    session.on_line("OK MPD 0.23.5".to_string()).unwrap();

    assert!(session.is_ready());
    assert_eq!(session.state(), &SessionState::Idle);
    let version = session.version().unwrap();
    assert_eq!(version.as_str(), "0.23.5");
    assert_eq!(version.numbers(), Some((0, 23, 5)));
}

#[test]
fn test_first_line_must_be_greeting() {
    let mut session = Session::new();
    assert!(matches!(session.on_line("OK".to_string()), Err(MpdError::Protocol(_))));
    assert!(!session.is_ready());
}

#[test]
fn test_second_greeting_is_rejected() {
    let mut session = ready_session();
    assert!(matches!(
        session.on_line("OK MPD 0.24.0".to_string()),
        Err(MpdError::Protocol(_))
    ));
    assert_eq!(session.version().unwrap().as_str(), "0.23.5");
}

#[test]
fn test_version_parsing() {
    assert_eq!(ProtocolVersion::parse("0.21").numbers(), Some((0, 21, 0)));
    assert_eq!(ProtocolVersion::parse(" 0.22.4 ").as_str(), "0.22.4");
    assert_eq!(ProtocolVersion::parse("git-1234").numbers(), None);
    assert_eq!(ProtocolVersion::parse("1.2.3.4").numbers(), None);

    let version = ProtocolVersion::parse("0.23.5");
    assert!(version.at_least(0, 21, 0));
    assert!(version.at_least(0, 23, 5));
    assert!(!version.at_least(0, 24, 0));
    assert!(!ProtocolVersion::parse("dev").at_least(0, 0, 0));
}

// =============================================================================
// Plain Response Tests
// =============================================================================

#[test]
fn test_data_lines_buffer_until_ok() {
    let mut session = ready_session();
    let handle = session.submit("status", Grammar::Object);

    feed(&mut session, &["volume: 50", "state: play"]);
    assert!(matches!(session.state(), SessionState::Buffering(lines) if lines.len() == 2));
    assert!(!handle.is_ready());

    feed(&mut session, &["OK"]);
    assert_eq!(session.state(), &SessionState::Idle);

    let status = take(&handle).unwrap().into_object().unwrap();
    assert_eq!(status.get_str("volume"), Some("50"));
    assert_eq!(status.get_str("state"), Some("play"));
}

#[test]
fn test_bare_ok_resolves_empty_reply() {
    let mut session = ready_session();
    let handle = session.submit("play", Grammar::Nothing);

    feed(&mut session, &["OK"]);
    assert!(matches!(take(&handle), Ok(Response::Nothing)));
    assert_eq!(session.pending(), 0);
}

#[test]
fn test_unsolicited_ok_is_protocol_error() {
    let mut session = ready_session();
    assert!(matches!(session.on_line("OK".to_string()), Err(MpdError::Protocol(_))));
    assert_eq!(session.state(), &SessionState::Idle);
}

#[test]
fn test_list_ok_outside_batch_is_protocol_error() {
    let mut session = ready_session();
    let handle = session.submit("ping", Grammar::Nothing);

    assert!(session.on_line("list_OK".to_string()).is_err());
    feed(&mut session, &["OK"]);
    assert!(take(&handle).is_ok());
}

#[test]
fn test_resolution_order_independent_of_chunking() {
    let wire = b"volume: 1\nOK\nId: 7\nOK\nOK\ncommand: a\ncommand: b\nOK\n";

    for chunk in 1..wire.len() {
        let mut session = ready_session();
        let handles = [
            session.submit("status", Grammar::Object),
            session.submit("addid", Grammar::Item),
            session.submit("ping", Grammar::Nothing),
            session.submit("commands", Grammar::List),
        ];

        let mut framer = LineFramer::new();
        let mut resolved = Vec::new();
        for piece in wire.chunks(chunk) {
            framer.push(piece);
            while let Some(line) = framer.next_line() {
                session.on_line(line).unwrap();
                for (i, handle) in handles.iter().enumerate() {
                    if handle.is_ready() && !resolved.contains(&i) {
                        resolved.push(i);
                    }
                }
            }
        }

        assert_eq!(resolved, vec![0, 1, 2, 3], "chunk size {}", chunk);
        assert!(matches!(take(&handles[1]), Ok(Response::Item(Some(ref id))) if id == "7"));
        assert_eq!(take(&handles[3]).unwrap().into_list().unwrap(), vec!["a", "b"]);
    }
}

// =============================================================================
// Error Line Tests
// =============================================================================

#[test]
fn test_error_line_fails_only_oldest() {
    let mut session = ready_session();
    let first = session.submit("play", Grammar::Nothing);
    let second = session.submit("status", Grammar::Object);
    let third = session.submit("ping", Grammar::Nothing);

    feed(&mut session, &["ACK [2@0] {play} Bad song index"]);

    assert_eq!(command_text(take(&first)), "[2@0] {play} Bad song index");
    assert!(!second.is_ready());
    assert!(!third.is_ready());
    assert_eq!(session.pending(), 2);

    feed(&mut session, &["state: stop", "OK", "OK"]);
    assert_eq!(take(&second).unwrap().into_object().unwrap().get_str("state"), Some("stop"));
    assert!(take(&third).is_ok());
}

#[test]
fn test_error_line_discards_partial_data() {
    let mut session = ready_session();
    let first = session.submit("lsinfo", Grammar::Database);
    let second = session.submit("ping", Grammar::Nothing);

    feed(&mut session, &["directory: a", "ACK [50@0] {lsinfo} No such directory", "OK"]);

    assert!(take(&first).is_err());
    assert!(matches!(take(&second), Ok(Response::Nothing)));
    assert_eq!(session.state(), &SessionState::Idle);
}

#[test]
fn test_error_line_with_nothing_pending() {
    let mut session = ready_session();
    assert!(matches!(
        session.on_line("ACK [5@0] {} unknown command".to_string()),
        Err(MpdError::Protocol(_))
    ));
}

#[test]
fn test_server_ack_parse() {
    let ack = ServerAck::parse("[50@2] {lsinfo} No such directory").unwrap();
    assert_eq!(ack.code, 50);
    assert_eq!(ack.list_index, 2);
    assert_eq!(ack.command, "lsinfo");
    assert_eq!(ack.message, "No such directory");

    let ack = ServerAck::parse("[5@0] {} unknown command \"fly\"").unwrap();
    assert_eq!(ack.command, "");
    assert_eq!(ack.message, "unknown command \"fly\"");

    assert!(ServerAck::parse("something else").is_none());
    assert!(ServerAck::parse("[x@0] {a} b").is_none());
}

// =============================================================================
// Command List Tests
// =============================================================================

fn submit_batch(session: &mut Session) -> (ReplyHandle, ReplyHandle, ReplyHandle) {
    let status = session.submit_framed("status", Grammar::Object, Framing::ListItem);
    let song = session.submit_framed("currentsong", Grammar::Object, Framing::ListItem);
    let end = session.submit("command_list_end", Grammar::Nothing);
    (status, song, end)
}

#[test]
fn test_batch_items_resolve_on_list_ok() {
    let mut session = ready_session();
    let (status, song, end) = submit_batch(&mut session);

    feed(&mut session, &["volume: 20"]);
    assert!(matches!(session.state(), SessionState::InBatch(lines) if lines.len() == 1));

    feed(&mut session, &["list_OK"]);
    assert!(status.is_ready());
    assert!(!song.is_ready());
    assert_eq!(session.state(), &SessionState::InBatch(Vec::new()));

    feed(&mut session, &["file: a.ogg", "Title: A", "list_OK"]);
    assert!(song.is_ready());
    assert!(!end.is_ready());

    feed(&mut session, &["OK"]);
    assert!(matches!(take(&end), Ok(Response::Nothing)));
    assert_eq!(session.state(), &SessionState::Idle);

    assert_eq!(take(&status).unwrap().into_object().unwrap().get_str("volume"), Some("20"));
    assert_eq!(take(&song).unwrap().into_object().unwrap().get_str("title"), Some("A"));
}

#[test]
fn test_batch_after_plain_command() {
    let mut session = ready_session();
    let before = session.submit("ping", Grammar::Nothing);
    let (status, song, end) = submit_batch(&mut session);
    let after = session.submit("stats", Grammar::Object);

    feed(&mut session, &[
        "OK",
        "list_OK",
        "list_OK",
        "OK",
        "uptime: 10",
        "OK",
    ]);

    assert!(take(&before).is_ok());
    assert!(take(&status).unwrap().into_object().unwrap().is_empty());
    assert!(take(&song).unwrap().into_object().unwrap().is_empty());
    assert!(take(&end).is_ok());
    assert_eq!(take(&after).unwrap().into_object().unwrap().get_str("uptime"), Some("10"));
}

#[test]
fn test_empty_batch() {
    let mut session = ready_session();
    let end = session.submit("command_list_end", Grammar::Nothing);

    feed(&mut session, &["OK"]);
    assert!(take(&end).is_ok());
    assert_eq!(session.state(), &SessionState::Idle);
}

#[test]
fn test_error_mid_batch_aborts_rest_of_list() {
    let mut session = ready_session();
    let first = session.submit_framed("play", Grammar::Nothing, Framing::ListItem);
    let (status, song, end) = submit_batch(&mut session);
    let after = session.submit("ping", Grammar::Nothing);

    feed(&mut session, &["list_OK", "ACK [50@1] {status} boom"]);

    assert!(take(&first).is_ok());
    assert_eq!(command_text(take(&status)), "[50@1] {status} boom");
    assert_eq!(command_text(take(&song)), "[50@1] {status} boom");
    assert_eq!(command_text(take(&end)), "[50@1] {status} boom");
    assert!(!after.is_ready());
    assert_eq!(session.state(), &SessionState::Idle);

    feed(&mut session, &["OK"]);
    assert!(matches!(take(&after), Ok(Response::Nothing)));
}

#[test]
fn test_error_on_first_batch_item() {
    let mut session = ready_session();
    let (status, song, end) = submit_batch(&mut session);

    feed(&mut session, &["ACK [5@0] {status} nope"]);

    assert!(status.is_ready() && song.is_ready() && end.is_ready());
    assert_eq!(session.pending(), 0);
}

#[test]
fn test_batch_closed_with_unanswered_items() {
    let mut session = ready_session();
    let (status, song, end) = submit_batch(&mut session);

    feed(&mut session, &["list_OK", "OK"]);

    assert!(take(&status).is_ok());
    assert!(matches!(take(&song), Err(MpdError::Protocol(_))));
    assert!(take(&end).is_ok());
    assert_eq!(session.pending(), 0);
}

#[test]
fn test_batch_item_parse_error_stays_local() {
    let mut session = ready_session();
    let list = session.submit_framed("list", Grammar::List, Framing::ListItem);
    let ping = session.submit_framed("ping", Grammar::Nothing, Framing::ListItem);
    let end = session.submit("command_list_end", Grammar::Nothing);

    feed(&mut session, &["A: 1", "B: 2", "list_OK", "list_OK", "OK"]);

    assert!(matches!(take(&list), Err(MpdError::Protocol(_))));
    assert!(take(&ping).is_ok());
    assert!(take(&end).is_ok());
}

// =============================================================================
// Disconnect Tests
// =============================================================================

#[test]
fn test_disconnect_fails_all_pending_once() {
    let mut session = ready_session();
    let handles = [
        session.submit("status", Grammar::Object),
        session.submit("currentsong", Grammar::Object),
        session.submit("ping", Grammar::Nothing),
    ];
    feed(&mut session, &["volume: 3"]);

    assert_eq!(session.disconnect("server went away"), 3);

    for handle in &handles {
        assert!(matches!(take(handle), Err(MpdError::Connection(_))));
        assert!(!handle.is_ready());
    }

    assert_eq!(session.disconnect("again"), 0);
    assert_eq!(session.state(), &SessionState::AwaitingGreeting);
    assert!(session.version().is_none());
}

#[test]
fn test_session_reusable_after_disconnect() {
    let mut session = ready_session();
    session.disconnect("reconnecting");

    session.on_line("OK MPD 0.24.0".to_string()).unwrap();
    assert_eq!(session.version().unwrap().as_str(), "0.24.0");

    let handle = session.submit("ping", Grammar::Nothing);
    feed(&mut session, &["OK"]);
    assert!(take(&handle).is_ok());
}
