use core_events::{Event, Key, Modifier};
use core_gui::{Gui, GuiError};
use core_input::ChannelEventSource;
use core_terminal::MemorySurface;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::Subscriber;
use tracing::dispatcher::Dispatch;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::Registry;

type Captured = Arc<Mutex<Vec<(String, Vec<(String, String)>)>>>;

#[derive(Clone, Default)]
struct Capture {
    events: Captured,
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
fn masked_input_never_reaches_the_log() {
    let capture = Capture::default();
    let events = capture.events.clone();
    let dispatch = Dispatch::new(Registry::default().with(capture));

    let (tx, src) = ChannelEventSource::pair();
    let mut gui = Gui::new(MemorySurface::new(40, 10), src);
    let v = gui.set_view("password", 0, 0, 30, 2).unwrap().into_view();
    v.set_editable(true);
    v.set_mask(Some('*'));
    gui.set_current_view("password").unwrap();
    gui.set_keybinding("", Key::Enter, Modifier::empty(), |_, _| Err(GuiError::Quit));
    for ch in ['Ж', '§', 'Ж'] {
        tx.send(Event::key(ch)).unwrap();
    }
    tx.send(Event::key(Key::Enter)).unwrap();

    let err = tracing::dispatcher::with_default(&dispatch, || gui.main_loop());
    assert!(err.is_quit());
    assert_eq!(gui.view("password").unwrap().buffer(), "Ж§Ж");

    let events = events.lock().unwrap();
    assert!(
        events
            .iter()
            .any(|(target, fields)| target == "gui.keys"
                && fields.iter().any(|(name, v)| name == "trigger" && v.contains("rune")))
    );
    for (_, fields) in events.iter() {
        assert!(fields.iter().all(|(_, v)| !v.contains('Ж') && !v.contains('§')));
    }
}
