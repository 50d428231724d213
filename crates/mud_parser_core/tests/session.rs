mod common;

use common::CollectSink;
use mud_parser_core::{Parser, ParserError, ParserSession};

#[tokio::test]
async fn test_session_parses_chunks_in_order() {
    let session = ParserSession::spawn(Parser::default(), CollectSink::new());
    session.send("\x1b[1mHel", true).unwrap();
    session.send("lo\nwor", true).unwrap();
    session.send("ld\n", true).unwrap();
    session.send("typed\n", false).unwrap();

    let (parser, sink) = session.shutdown().await.unwrap();
    assert_eq!(sink.texts(), vec!["Hello", "world", "typed"]);
    assert!(sink.lines[1].remote);
    assert!(!sink.lines[2].remote);
    assert_eq!(sink.done, 4);
    assert_eq!(parser.pending_len(), 0);
    assert_eq!(parser.text_length(), 18);
}

#[tokio::test]
async fn test_session_with_no_input() {
    let session = ParserSession::spawn(Parser::default(), CollectSink::new());
    let (parser, sink) = session.shutdown().await.unwrap();
    assert!(sink.lines.is_empty());
    assert!(parser.at_end_of_line());
}

#[tokio::test]
async fn test_sink_panic_surfaces_as_task_error() {
    struct Exploding;
    impl mud_parser_core::ParserSink for Exploding {
        fn add_line(&mut self, _line: mud_parser_core::ParserLine) {
            panic!("sink failure");
        }
    }

    let session = ParserSession::spawn(Parser::default(), Exploding);
    session.send("boom\n", true).unwrap();
    assert!(matches!(session.shutdown().await, Err(ParserError::Task(_))));
}
