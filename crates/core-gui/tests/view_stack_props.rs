use core_gui::Gui;
use core_input::ChannelEventSource;
use core_terminal::MemorySurface;
use proptest::prelude::*;

fn gui() -> Gui {
    let (_tx, src) = ChannelEventSource::pair();
    Gui::new(MemorySurface::new(80, 24), src)
}

fn bounds() -> impl Strategy<Value = (i32, i32, i32, i32)> {
    (-10i32..90, -10i32..30, 1i32..40, 1i32..20).prop_map(|(x0, y0, w, h)| (x0, y0, x0 + w, y0 + h))
}

/// Distances from a point to the four edges of a view strictly containing it.
fn around() -> impl Strategy<Value = (i32, i32, i32, i32)> {
    (1i32..20, 1i32..10, 1i32..20, 1i32..10)
}

proptest! {
    #[test]
    fn set_view_is_an_idempotent_update(
        name in "[a-z]{1,8}",
        updates in proptest::collection::vec(bounds(), 1..8),
    ) {
        let mut g = gui();
        for (i, &(x0, y0, x1, y1)) in updates.iter().enumerate() {
            let slot = g.set_view(&name, x0, y0, x1, y1).unwrap();
            prop_assert_eq!(slot.is_new(), i == 0);
            prop_assert_eq!(g.view_position(&name).unwrap(), (x0, y0, x1, y1));
            prop_assert_eq!(g.views().len(), 1);
        }
    }

    #[test]
    fn topmost_view_wins_hit_tests(
        (x, y) in (0i32..80, 0i32..24),
        a in around(),
        b in around(),
    ) {
        let mut g = gui();
        g.set_view("a", x - a.0, y - a.1, x + a.2, y + a.3).unwrap();
        g.set_view("b", x - b.0, y - b.1, x + b.2, y + b.3).unwrap();
        prop_assert_eq!(g.view_by_position(x, y).unwrap().name(), "b");
        g.set_view_on_top("a").unwrap();
        prop_assert_eq!(g.view_by_position(x, y).unwrap().name(), "a");
    }
}
