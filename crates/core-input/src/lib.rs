//! Input sources and the reader thread feeding the compositor loop.
//!
//! An [`EventSource`] yields [`Event`]s one at a time, blocking until the next
//! one is available. [`spawn_reader`] drives a source on a dedicated thread and
//! forwards everything it produces into the loop's bounded input channel.
//!
//! Reader invariants:
//! * Events are forwarded in the order the source produced them.
//! * A full channel blocks the reader; nothing is dropped.
//! * The reader exits after forwarding an [`Event::Error`] or when the
//!   receiving side has hung up.

mod terminal_source;
pub use terminal_source::{CrosstermEventSource, map_event};

use core_events::{Event, INPUT_EVENTS_FORWARDED, INPUT_SEND_FAILURES};
use core_terminal::InputMode;
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::Ordering;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, trace};

/// Blocking producer of input events.
pub trait EventSource: Send + 'static {
    /// Block until the next event. A source that can no longer produce
    /// events reports it as [`Event::Error`].
    fn poll_event(&mut self) -> Event;

    /// Adjust how Escape and Alt chords are decoded. Sources without the
    /// distinction ignore it.
    fn set_input_mode(&mut self, _mode: InputMode) {}
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn poll_event(&mut self) -> Event {
        (**self).poll_event()
    }

    fn set_input_mode(&mut self, mode: InputMode) {
        (**self).set_input_mode(mode)
    }
}

/// Source backed by a channel. Embedders and tests push scripted events
/// through the paired sender.
pub struct ChannelEventSource {
    rx: Receiver<Event>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<Event>) -> Self {
        Self { rx }
    }

    /// Unbounded channel plus the source reading from it.
    pub fn pair() -> (Sender<Event>, Self) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (tx, Self::new(rx))
    }
}

impl EventSource for ChannelEventSource {
    fn poll_event(&mut self) -> Event {
        match self.rx.recv() {
            Ok(ev) => ev,
            Err(_) => Event::Error("event source closed".into()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    SourceError,
    ChannelClosed,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::SourceError => "source_error",
            ExitReason::ChannelClosed => "channel_closed",
        }
    }
}

/// Pump `source` into `sender` until an error event has been forwarded or
/// the receiver is gone.
pub fn forward_events<S: EventSource + ?Sized>(source: &mut S, sender: &Sender<Event>) -> ExitReason {
    loop {
        let event = source.poll_event();
        let fatal = matches!(event, Event::Error(_));
        trace!(target: "input.event", kind = event.kind(), "forward");
        if sender.send(event).is_err() {
            INPUT_SEND_FAILURES.fetch_add(1, Ordering::Relaxed);
            return ExitReason::ChannelClosed;
        }
        INPUT_EVENTS_FORWARDED.fetch_add(1, Ordering::Relaxed);
        if fatal {
            return ExitReason::SourceError;
        }
    }
}

/// Run `source` on its own thread, forwarding into `sender`.
pub fn spawn_reader<S>(mut source: S, sender: Sender<Event>) -> std::io::Result<JoinHandle<()>>
where
    S: EventSource,
{
    thread::Builder::new()
        .name("panekit-input".into())
        .spawn(move || {
            let span = tracing::debug_span!(target: "input.thread", "input_reader");
            let _enter = span.enter();
            info!(target: "input.thread", "input_reader_started");
            let reason = forward_events(&mut source, &sender);
            debug!(target: "input.thread", reason = reason.as_str(), "input_reader_exit");
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::Key;
    use crossbeam_channel::bounded;
    use pretty_assertions::assert_eq;
    use std::fmt;
    use std::sync::{Arc, Mutex};
    use tracing::Subscriber;
    use tracing::dispatcher::Dispatch;
    use tracing::field::{Field, Visit};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
    use tracing_subscriber::registry::Registry;

    fn scripted(events: impl IntoIterator<Item = Event>) -> ChannelEventSource {
        let (tx, src) = ChannelEventSource::pair();
        for ev in events {
            tx.send(ev).unwrap();
        }
        src
    }

    #[test]
    fn forwards_in_order_then_reports_closed_source() {
        let (tx, rx) = bounded(8);
        let mut src = scripted([Event::key('a'), Event::key(Key::Enter), Event::Resize(80, 24)]);
        assert_eq!(forward_events(&mut src, &tx), ExitReason::SourceError);
        let got: Vec<Event> = rx.try_iter().collect();
        assert_eq!(
            got,
            vec![
                Event::key('a'),
                Event::key(Key::Enter),
                Event::Resize(80, 24),
                Event::Error("event source closed".into()),
            ]
        );
    }

    #[test]
    fn stops_after_error_event() {
        let (tx, rx) = bounded(8);
        let (in_tx, mut src) = ChannelEventSource::pair();
        in_tx.send(Event::key('a')).unwrap();
        in_tx.send(Event::Error("tty gone".into())).unwrap();
        in_tx.send(Event::key('b')).unwrap();
        assert_eq!(forward_events(&mut src, &tx), ExitReason::SourceError);
        let got: Vec<Event> = rx.try_iter().collect();
        assert_eq!(got, vec![Event::key('a'), Event::Error("tty gone".into())]);
    }

    #[test]
    fn stops_when_receiver_dropped() {
        let (tx, rx) = bounded(1);
        drop(rx);
        let mut src = scripted([Event::key('x')]);
        assert_eq!(forward_events(&mut src, &tx), ExitReason::ChannelClosed);
    }

    #[test]
    fn reader_thread_forwards_and_exits() {
        let (in_tx, src) = ChannelEventSource::pair();
        let (out_tx, out_rx) = bounded(4);
        let handle = spawn_reader(src, out_tx).unwrap();
        in_tx.send(Event::key('z')).unwrap();
        assert_eq!(out_rx.recv().unwrap(), Event::key('z'));
        drop(in_tx);
        assert!(matches!(out_rx.recv().unwrap(), Event::Error(_)));
        handle.join().unwrap();
    }

    #[derive(Clone, Default)]
    struct Capture {
        events: Arc<Mutex<Vec<(String, Vec<(String, String)>)>>>,
    }

    #[derive(Default)]
    struct FieldCollector {
        fields: Vec<(String, String)>,
    }

    impl Visit for FieldCollector {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.fields
                .push((field.name().to_string(), format!("{:?}", value)));
        }
    }

    impl<S> Layer<S> for Capture
    where
        S: Subscriber,
    {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let mut collector = FieldCollector::default();
            event.record(&mut collector);
            self.events
                .lock()
                .unwrap()
                .push((event.metadata().target().to_string(), collector.fields));
        }
    }

    #[test]
    fn forward_trace_omits_key_payload() {
        let capture = Capture::default();
        let events = capture.events.clone();
        let dispatch = Dispatch::new(Registry::default().with(capture));

        tracing::dispatcher::with_default(&dispatch, || {
            let (tx, _rx) = bounded(4);
            let mut src = scripted([Event::key('p')]);
            forward_events(&mut src, &tx);
        });

        let events = events.lock().unwrap();
        let (_, fields) = events
            .iter()
            .find(|(target, _)| target == "input.event")
            .expect("missing input.event trace");
        assert!(fields.iter().any(|(name, v)| name == "kind" && v.contains("key")));
        assert!(fields.iter().all(|(_, v)| !v.contains("'p'")));
    }
}
