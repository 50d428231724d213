//! Async driver that feeds network chunks to a [`Parser`] on a tokio task.
//!
//! Chunks are queued on an unbounded channel and parsed one at a time, yielding
//! to the runtime between chunks so a flood of server output does not starve
//! other tasks. The parser and sink come back out of [`ParserSession::shutdown`].

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::{Parser, ParserError, ParserSink};

pub struct ParserSession<S: ParserSink + Send + 'static> {
    sender: mpsc::UnboundedSender<(String, bool)>,
    task: JoinHandle<(Parser, S)>,
}

impl<S: ParserSink + Send + 'static> ParserSession<S> {
    /// Moves `parser` and `sink` onto a new task. Must be called from within a tokio runtime.
    pub fn spawn(parser: Parser, sink: S) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<(String, bool)>();
        let task = tokio::spawn(async move {
            let mut parser = parser;
            let mut sink = sink;
            while let Some((text, remote)) = receiver.recv().await {
                parser.enqueue(text, remote);
                while parser.parse_next(&mut sink) {
                    tokio::task::yield_now().await;
                }
            }
            log::debug!("parser session finished, {} characters displayed", parser.text_length());
            (parser, sink)
        });
        Self { sender, task }
    }

    pub fn send(&self, text: impl Into<String>, remote: bool) -> Result<(), ParserError> {
        self.sender.send((text.into(), remote)).map_err(|_| ParserError::SessionClosed)
    }

    /// Parses everything sent so far, then returns the parser and sink.
    pub async fn shutdown(self) -> Result<(Parser, S), ParserError> {
        drop(self.sender);
        Ok(self.task.await?)
    }
}
